use prodshot::{
    download,
    logger::{self, LoggerConfig},
    source, Config, GeminiClient, GenerationOptions, Platform, Session, SubjectType,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logger::init_with_config(LoggerConfig::new().with_app_target(module_path!()))?;
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded"),
        Err(_) => log::warn!("⚠️  No .env file found"),
    }

    let image_path = std::env::args()
        .nth(1)
        .ok_or("usage: product_shot <image-file>")?;

    let config = Config::from_env();
    let client = GeminiClient::new(config.gemini)?;

    let mut session = Session::new();
    session
        .with_options(
            GenerationOptions::new()
                .with_platform(Platform::Instagram)
                .with_subject_type(SubjectType::PersonWithProduct)
                .with_custom_instruction("sunny cafe terrace")
                .with_requested_count(2),
        )?
        .with_source(source::from_file(&image_path).await?)?;

    let refined = session.refine(&client).await?;
    println!("Refined instruction: {}", refined);

    let images = session.generate(&client).await?;
    for path in download::save_all(images, "generated").await? {
        println!("Saved {}", path.display());
    }

    Ok(())
}
