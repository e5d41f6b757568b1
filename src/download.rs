use crate::{
    error::Result,
    models::{GeneratedImage, ImageFormat},
};
use std::path::{Path, PathBuf};

pub const DEFAULT_FILE_STEM: &str = "generated-image";

/// `generated-image-<n>.<ext>`, numbered from 1.
pub fn default_file_name(index: usize, image: &GeneratedImage) -> String {
    let extension = image
        .format()
        .unwrap_or(ImageFormat::Png)
        .extension();
    format!("{}-{}.{}", DEFAULT_FILE_STEM, index + 1, extension)
}

pub async fn save_image(image: &GeneratedImage, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let bytes = image.decode()?;
    tokio::fs::write(path, &bytes).await?;
    log::info!("💾 Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

pub async fn save_all(images: &[GeneratedImage], dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;

    let mut paths = Vec::with_capacity(images.len());
    for (index, image) in images.iter().enumerate() {
        let path = dir.join(default_file_name(index, image));
        save_image(image, &path).await?;
        paths.push(path);
    }
    Ok(paths)
}
