// src/imaging/mod.rs - Upload validation and image pre-processing
//
// Two derived variants of every upload:
//   enhanced - grayscale + histogram equalization, shown to the student
//   binary   - grayscale + Gaussian blur + Otsu threshold, fed to OCR
//
// Both are fixed pipelines of imageproc filters.

pub mod ocr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{DynamicImage, GrayImage, ImageFormat};
use imageproc::contrast::{self, ThresholdType};
use imageproc::filter;
use std::io::Cursor;
use std::path::Path;

use crate::infra::errors::TutorError;

pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

const BLUR_SIGMA: f32 = 1.0;

/// Reject uploads whose file name doesn't carry an image extension.
pub fn validate_filename(name: &str) -> Result<(), TutorError> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(TutorError::unsupported_file()),
    }
}

pub fn decode(bytes: &[u8]) -> Result<DynamicImage, TutorError> {
    if bytes.is_empty() {
        return Err(TutorError::Image("tệp rỗng".into()));
    }
    image::load_from_memory(bytes).map_err(|e| TutorError::Image(e.to_string()))
}

/// Grayscale plus histogram equalization, for display.
pub fn enhance(img: &DynamicImage) -> GrayImage {
    contrast::equalize_histogram(&img.to_luma8())
}

/// Grayscale, Gaussian blur, Otsu threshold. Text ends up black on white.
pub fn binarize(img: &DynamicImage) -> GrayImage {
    let blurred = filter::gaussian_blur_f32(&img.to_luma8(), BLUR_SIGMA);
    let level = contrast::otsu_level(&blurred);
    contrast::threshold(&blurred, level, ThresholdType::Binary)
}

pub fn encode_png(gray: &GrayImage) -> Result<Vec<u8>, TutorError> {
    let mut buf = Vec::new();
    DynamicImage::ImageLuma8(gray.clone())
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| TutorError::Image(e.to_string()))?;
    Ok(buf)
}

/// Re-encode as JPEG so the bytes match the MIME type sent to the provider.
pub fn to_jpeg(img: &DynamicImage) -> Result<Vec<u8>, TutorError> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .map_err(|e| TutorError::Image(e.to_string()))?;
    Ok(buf)
}

pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

/// Everything derived from one upload.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub jpeg: Vec<u8>,
    pub enhanced_png: Vec<u8>,
    pub binary: GrayImage,
}

impl ProcessedImage {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TutorError> {
        let img = decode(bytes)?;
        Ok(Self {
            jpeg: to_jpeg(&img)?,
            enhanced_png: encode_png(&enhance(&img))?,
            binary: binarize(&img),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Low-contrast test card: left half gray 100, right half gray 140.
    fn two_tone() -> DynamicImage {
        let img = RgbImage::from_fn(32, 16, |x, _| {
            if x < 16 {
                Rgb([100, 100, 100])
            } else {
                Rgb([140, 140, 140])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn test_validate_filename() {
        assert!(validate_filename("bai_tap.PNG").is_ok());
        assert!(validate_filename("anh.jpeg").is_ok());
        assert!(validate_filename("de_thi.webp").is_ok());
        assert!(validate_filename("bai_tap.pdf").is_err());
        assert!(validate_filename("khong_duoi").is_err());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode(b"").is_err());
        assert!(decode(b"definitely not an image").is_err());
    }

    #[test]
    fn test_enhance_spreads_contrast() {
        let enhanced = enhance(&two_tone());
        let left = enhanced.get_pixel(0, 0)[0];
        let right = enhanced.get_pixel(31, 0)[0];
        assert_eq!(right, 255);
        assert!(right > left && right - left > 40, "left {left} right {right}");
        assert_eq!(enhanced.dimensions(), (32, 16));
    }

    #[test]
    fn test_binarize_is_black_and_white() {
        let binary = binarize(&two_tone());
        assert!(binary.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(binary.get_pixel(0, 8)[0], 0);
        assert_eq!(binary.get_pixel(31, 8)[0], 255);
    }

    #[test]
    fn test_processed_image_round_trip() {
        let processed = ProcessedImage::from_bytes(&png_bytes(&two_tone())).unwrap();
        assert_eq!(image::guess_format(&processed.jpeg).unwrap(), ImageFormat::Jpeg);
        assert_eq!(
            image::guess_format(&processed.enhanced_png).unwrap(),
            ImageFormat::Png
        );
        assert_eq!(processed.binary.dimensions(), (32, 16));
    }

    #[test]
    fn test_data_url() {
        assert_eq!(data_url("image/png", b"ABC"), "data:image/png;base64,QUJD");
    }
}
