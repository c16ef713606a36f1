//! Image size probing without decoding pixel data.

use handmeasure_core::ImageSize;
use log::warn;
use std::path::Path;

/// Read the dimensions from the image header.
pub fn image_size(path: impl AsRef<Path>) -> Result<ImageSize, image::ImageError> {
    let (width, height) = image::image_dimensions(path)?;
    Ok(ImageSize::new(width, height))
}

/// Like [`image_size`], falling back to `fallback` when the file is missing
/// or unreadable.
pub fn image_size_or(path: impl AsRef<Path>, fallback: ImageSize) -> ImageSize {
    let path = path.as_ref();
    image_size(path).unwrap_or_else(|err| {
        warn!(
            "cannot read size of {}: {err}; assuming {}x{}",
            path.display(),
            fallback.width,
            fallback.height
        );
        fallback
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_png_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blank.png");
        image::RgbImage::new(12, 7).save(&path).expect("save png");
        assert_eq!(image_size(&path).expect("size"), ImageSize::new(12, 7));
    }

    #[test]
    fn missing_file_uses_fallback() {
        let fallback = ImageSize::new(1920, 1080);
        assert_eq!(image_size_or("/nonexistent/hand.jpg", fallback), fallback);
    }
}
