// src/imaging/ocr.rs - Text extraction via Tesseract (feature `ocr`)

use image::GrayImage;

use crate::infra::errors::TutorError;

/// Vietnamese first; English catches formulas and loanwords.
pub const OCR_LANGUAGES: &str = "vie+eng";

pub fn is_available() -> bool {
    cfg!(feature = "ocr")
}

#[cfg(feature = "ocr")]
pub fn extract_text(binary: &GrayImage) -> Result<String, TutorError> {
    let png = super::encode_png(binary)?;
    let mut engine = leptess::LepTess::new(None, OCR_LANGUAGES)
        .map_err(|e| TutorError::Image(format!("tesseract init: {e:?}")))?;
    engine
        .set_image_from_mem(&png)
        .map_err(|e| TutorError::Image(format!("leptonica: {e:?}")))?;
    let text = engine
        .get_utf8_text()
        .map_err(|e| TutorError::Image(format!("tesseract output: {e}")))?;
    Ok(text.trim().to_string())
}

#[cfg(not(feature = "ocr"))]
pub fn extract_text(_binary: &GrayImage) -> Result<String, TutorError> {
    Err(TutorError::OcrUnavailable)
}
