//! Prompt composition.
//!
//! Everything here is pure: the same options always produce the same text.

use crate::models::{GenerationOptions, Platform, SubjectType};

const MERCADO_LIVRE_TEMPLATE: &str = "Generate a high-quality, professional product photograph suitable for an e-commerce marketplace such as Mercado Livre. The product must be the main focus, presented on a clean, neutral or white background that highlights its features. Make sure the lighting is bright and even, avoiding harsh shadows.";

const FACEBOOK_TEMPLATE: &str = "Create a realistic and appealing lifestyle image for Facebook Marketplace. The product should be shown in a natural, easily recognizable setting. If a person is included, they should interact with the product authentically. The overall feel should be friendly and trustworthy.";

const INSTAGRAM_TEMPLATE: &str = "Produce a vibrant, aesthetically pleasing image for an Instagram post. The style should be modern and engaging, suited to a social media feed. Use a visually interesting composition, good lighting and a color palette that stands out. The image should look aspirational and high quality.";

const TIKTOK_TEMPLATE: &str = "Create an attention-grabbing product image optimized for a short TikTok video. The image should be vibrant, high-energy and visually stimulating. Consider a bold background or a style that looks like a frame from a viral video. If a person is included, they should look like they are having fun or demonstrating the product in a quick, engaging way.";

const PERSON_CLAUSE: &str =
    "The image must feature a person happily using or interacting with the product.";
const OBJECT_CLAUSE: &str = "The image must feature only the product, with no people.";

pub fn base_template(platform: Platform) -> &'static str {
    match platform {
        Platform::MercadoLivre => MERCADO_LIVRE_TEMPLATE,
        Platform::Facebook => FACEBOOK_TEMPLATE,
        Platform::Instagram => INSTAGRAM_TEMPLATE,
        Platform::TikTok => TIKTOK_TEMPLATE,
    }
}

pub fn subject_clause(subject_type: SubjectType) -> &'static str {
    match subject_type {
        SubjectType::PersonWithProduct => PERSON_CLAUSE,
        SubjectType::Object => OBJECT_CLAUSE,
    }
}

/// Builds the instruction sent alongside the source image.
///
/// With `include_custom_instruction = false` the user's own text is left
/// out, which is what the refinement call wants as context.
pub fn compose(options: &GenerationOptions, include_custom_instruction: bool) -> String {
    let mut prompt = String::from(base_template(options.platform));

    prompt.push(' ');
    prompt.push_str(subject_clause(options.subject_type));

    let custom = options.custom_instruction.as_str();
    if include_custom_instruction && !custom.trim().is_empty() {
        prompt.push_str(" Additionally: ");
        prompt.push_str(custom);
        prompt.push('.');
    }

    prompt.push_str(" The image aspect ratio must be ");
    prompt.push_str(options.aspect_ratio.as_str());
    prompt.push('.');

    prompt
}

/// Directive for the text model that rewrites the user's instruction.
pub fn refinement_directive(current_instruction: &str, context: &str) -> String {
    format!(
        "You are an AI assistant specialized in writing prompts for image generation. Your task is to improve the user's prompt.\n\
         - The overall context is: \"{context}\".\n\
         - The user provided the following additional instructions: \"{current_instruction}\".\n\
         - Rewrite and expand the user's instructions to be more descriptive, vivid and detailed, incorporating the context.\n\
         - Return ONLY the improved prompt text, without any introduction or explanation.\n\
         - If the user's prompt is empty, create a creative prompt based on the context alone."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AspectRatio;

    fn keyword(platform: Platform) -> &'static str {
        match platform {
            Platform::MercadoLivre => "Mercado Livre",
            Platform::Facebook => "Facebook Marketplace",
            Platform::Instagram => "Instagram",
            Platform::TikTok => "TikTok",
        }
    }

    #[test]
    fn test_compose_is_deterministic() {
        let options = GenerationOptions::new()
            .with_platform(Platform::Instagram)
            .with_custom_instruction("wooden table, sunset light");
        assert_eq!(compose(&options, true), compose(&options, true));
        assert_eq!(compose(&options, false), compose(&options, false));
    }

    #[test]
    fn test_every_combination_is_covered() {
        for platform in Platform::ALL {
            for subject in SubjectType::ALL {
                for ratio in AspectRatio::ALL {
                    let options = GenerationOptions::new()
                        .with_platform(platform)
                        .with_subject_type(subject)
                        .with_aspect_ratio(ratio);
                    let prompt = compose(&options, true);

                    assert!(prompt.contains(keyword(platform)), "{}", prompt);
                    assert!(prompt.contains(subject_clause(subject)), "{}", prompt);
                    assert!(
                        prompt.ends_with(&format!("aspect ratio must be {}.", ratio.as_str())),
                        "{}",
                        prompt
                    );
                }
            }
        }
    }

    #[test]
    fn test_subject_clauses_are_exclusive() {
        let person = compose(
            &GenerationOptions::new().with_subject_type(SubjectType::PersonWithProduct),
            true,
        );
        assert!(person.contains(PERSON_CLAUSE));
        assert!(!person.contains(OBJECT_CLAUSE));

        let object = compose(&GenerationOptions::new(), true);
        assert!(object.contains(OBJECT_CLAUSE));
        assert!(!object.contains(PERSON_CLAUSE));
    }

    #[test]
    fn test_custom_instruction_included_verbatim() {
        let options = GenerationOptions::new().with_custom_instruction("Zebra-striped velvet backdrop");
        let prompt = compose(&options, true);
        assert!(prompt.contains(" Additionally: Zebra-striped velvet backdrop."));
        assert!(prompt.find("Additionally").unwrap() < prompt.find("aspect ratio").unwrap());
    }

    #[test]
    fn test_custom_instruction_excluded_from_context() {
        let options = GenerationOptions::new().with_custom_instruction("Zebra-striped velvet backdrop");
        let context = compose(&options, false);
        assert!(!context.contains("Zebra-striped velvet backdrop"));
        assert!(!context.contains("Additionally"));
    }

    #[test]
    fn test_blank_custom_instruction_is_skipped() {
        let plain = compose(&GenerationOptions::new(), true);
        let blank = compose(&GenerationOptions::new().with_custom_instruction("   "), true);
        assert_eq!(plain, blank);
        assert!(!plain.contains("Additionally"));
    }

    #[test]
    fn test_refinement_directive() {
        let directive = refinement_directive("blue sky", "CONTEXT TEXT");
        assert!(directive.contains("\"CONTEXT TEXT\""));
        assert!(directive.contains("\"blue sky\""));
        assert!(directive.contains("Return ONLY the improved prompt text"));
        assert!(directive.contains("If the user's prompt is empty"));

        let empty = refinement_directive("", "CONTEXT TEXT");
        assert!(empty.contains("additional instructions: \"\""));
    }
}
