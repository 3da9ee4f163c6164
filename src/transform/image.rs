//! Raster image stages.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageResult};

use crate::pipeline::{FileTransform, StageError, VirtualFile};

fn decode(file: &VirtualFile) -> Result<DynamicImage, StageError> {
    image::load_from_memory(&file.contents).map_err(|e| StageError::new(e.to_string()))
}

fn encode_error(e: image::ImageError) -> StageError {
    StageError::new(format!("encode failed: {e}"))
}

/// `webp` stage: lossless WebP next to the original (`a.png` → `a.webp`).
pub struct ToWebp;

impl FileTransform for ToWebp {
    fn name(&self) -> &'static str {
        "webp"
    }

    fn transform(&self, file: VirtualFile) -> Result<VirtualFile, StageError> {
        let image = decode(&file)?;
        let mut out = Vec::new();
        DynamicImage::ImageRgba8(image.to_rgba8())
            .write_with_encoder(WebPEncoder::new_lossless(&mut out))
            .map_err(encode_error)?;
        Ok(file.with_contents(out).with_extension("webp"))
    }
}

/// `optimize-image` stage: re-encodes PNG with maximum compression and
/// JPEG at the configured quality, keeping whichever of original and
/// re-encoded is smaller.
pub struct OptimizeImage {
    jpeg_quality: u8,
}

impl OptimizeImage {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    fn encode_png(image: &DynamicImage) -> ImageResult<Vec<u8>> {
        let mut out = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
        image.write_with_encoder(encoder)?;
        Ok(out)
    }

    fn encode_jpeg(&self, image: &DynamicImage) -> ImageResult<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
        DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
        Ok(out.into_inner())
    }
}

impl FileTransform for OptimizeImage {
    fn name(&self) -> &'static str {
        "optimize-image"
    }

    fn transform(&self, file: VirtualFile) -> Result<VirtualFile, StageError> {
        let encoded = match file.ext().as_deref() {
            Some("png") => Self::encode_png(&decode(&file)?),
            Some("jpg" | "jpeg") => self.encode_jpeg(&decode(&file)?),
            _ => return Ok(file),
        }
        .map_err(encode_error)?;

        if encoded.len() < file.contents.len() {
            Ok(file.with_contents(encoded))
        } else {
            Ok(file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageEncoder, ImageFormat, Rgb, RgbImage};
    use std::path::Path;

    /// An uncompressed-ish PNG that re-encodes smaller.
    fn sample_png() -> Vec<u8> {
        let img = RgbImage::from_fn(64, 64, |x, _| Rgb([(x * 4) as u8, 10, 200]));
        let mut out = Vec::new();
        PngEncoder::new_with_quality(&mut out, CompressionType::Fast, FilterType::NoFilter)
            .write_image(img.as_raw(), 64, 64, image::ExtendedColorType::Rgb8)
            .unwrap();
        out
    }

    fn sample_jpeg() -> Vec<u8> {
        let img = RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 0]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Jpeg)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_webp_renames_and_decodes() {
        let file = VirtualFile::generated("images/photo.png", sample_png());
        let out = ToWebp.transform(file).unwrap();

        assert_eq!(out.rel, Path::new("images/photo.webp"));
        let format = image::guess_format(&out.contents).unwrap();
        assert_eq!(format, ImageFormat::WebP);
        let decoded = image::load_from_memory(&out.contents).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 64));
    }

    #[test]
    fn test_optimize_png_never_grows() {
        let original = sample_png();
        let out = OptimizeImage::new(80)
            .transform(VirtualFile::generated("a.png", original.clone()))
            .unwrap();
        assert!(out.contents.len() <= original.len());
        assert_eq!(image::guess_format(&out.contents).unwrap(), ImageFormat::Png);
        assert_eq!(out.rel, Path::new("a.png"));
    }

    #[test]
    fn test_optimize_jpeg_keeps_format() {
        let original = sample_jpeg();
        let out = OptimizeImage::new(40)
            .transform(VirtualFile::generated("b.JPG", original.clone()))
            .unwrap();
        assert!(out.contents.len() <= original.len());
        assert_eq!(image::guess_format(&out.contents).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_corrupt_image_fails() {
        let err = ToWebp
            .transform(VirtualFile::generated("bad.png", b"not a png".to_vec()))
            .unwrap_err();
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_optimize_passes_through_other_formats() {
        let svg = b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>".to_vec();
        let out = OptimizeImage::new(80)
            .transform(VirtualFile::generated("icon.svg", svg.clone()))
            .unwrap();
        assert_eq!(out.contents, svg);
    }
}
