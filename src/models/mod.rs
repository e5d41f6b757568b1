pub mod gemini;
pub mod image;
pub mod options;

pub use gemini::*;
pub use image::*;
pub use options::*;
