use crate::{
    error::Result,
    gemini::ImageClient,
    logger::Timer,
    models::{GeneratedImage, SourceImage},
};
use futures::future::join_all;
use uuid::Uuid;

/// Issues `count` concurrent generations of the same prompt and source.
///
/// Every call runs to completion; nothing is cancelled when a sibling
/// fails. Results keep submission order. If any call failed, the whole
/// batch fails with the first failure in submission order and none of the
/// successful images are returned.
pub async fn generate_batch(
    client: &ImageClient,
    prompt: &str,
    source: &SourceImage,
    count: usize,
) -> Result<Vec<GeneratedImage>> {
    let batch_id = Uuid::new_v4();
    let _timer = Timer::new(&format!("batch {} ({} images)", batch_id, count));

    let calls = (0..count).map(|_| client.generate(prompt, source));
    let outcomes = join_all(calls).await;

    let failures = outcomes.iter().filter(|outcome| outcome.is_err()).count();
    if failures > 0 {
        log::warn!(
            "Batch {} failed: {} of {} generations failed",
            batch_id,
            failures,
            count
        );
    } else {
        log::info!("Batch {} produced {} images", batch_id, count);
    }

    outcomes.into_iter().collect()
}
