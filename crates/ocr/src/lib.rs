//! Recognition stages: image normalization, text extraction, field parsing.

pub mod extract;
pub mod preprocess;
pub mod recognizer;

pub use extract::{FieldParser, ParsedFields, MAX_LINE_ITEMS, UNKNOWN_MERCHANT};
pub use preprocess::{preprocess, ProcessedImage, MAX_DIMENSION};
pub use recognizer::{
    extract_text, ExtractedText, MockOcr, OcrEngine, OcrError, DEFAULT_LANGUAGES,
};
#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractOcr;
