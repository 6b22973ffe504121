use serde::{Deserialize, Serialize};

use crate::preprocess::ProcessedImage;

/// Korean receipts regularly mix in English brand names, so both models
/// are loaded by default.
pub const DEFAULT_LANGUAGES: &str = "kor+eng";

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("Could not encode image for recognition: {0}")]
    ImageEncode(String),
    #[error("Text recognition failed: {0}")]
    Engine(String),
}

/// A text recognition backend. Inference may take seconds on device, so
/// the call is async; implementations wrapping blocking libraries should
/// run them on a blocking pool.
#[async_trait::async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image_png: &[u8]) -> Result<String, OcrError>;
}

/// Raw recognizer output, line structure preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    raw: String,
}

impl ExtractedText {
    pub fn new(raw: impl Into<String>) -> Self {
        ExtractedText { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn lines(&self) -> std::str::Lines<'_> {
        self.raw.lines()
    }

    /// True when recognition produced nothing but whitespace.
    pub fn is_empty(&self) -> bool {
        self.raw.trim().is_empty()
    }
}

/// Run recognition over a preprocessed image.
pub async fn extract_text<E>(engine: &E, image: &ProcessedImage) -> Result<ExtractedText, OcrError>
where
    E: OcrEngine + ?Sized,
{
    let png = image
        .to_png_bytes()
        .map_err(|e| OcrError::ImageEncode(e.to_string()))?;
    let raw = engine.recognize(&png).await?;
    tracing::debug!(chars = raw.chars().count(), "text recognized");
    Ok(ExtractedText::new(raw))
}

// ── Mock engine (deterministic, used for tests) ───────────────────────────────

enum MockReply {
    Text(String),
    Failure(String),
}

/// Engine that replays a scripted result instead of running inference.
pub struct MockOcr {
    reply: MockReply,
}

impl MockOcr {
    /// Always recognizes `text`.
    pub fn new(text: impl Into<String>) -> Self {
        MockOcr {
            reply: MockReply::Text(text.into()),
        }
    }

    /// Always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        MockOcr {
            reply: MockReply::Failure(message.into()),
        }
    }
}

#[async_trait::async_trait]
impl OcrEngine for MockOcr {
    async fn recognize(&self, _image_png: &[u8]) -> Result<String, OcrError> {
        match &self.reply {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Failure(message) => Err(OcrError::Engine(message.clone())),
        }
    }
}

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{OcrEngine, OcrError, DEFAULT_LANGUAGES};

    /// Tesseract-backed engine. `LepTess` is blocking and not `Sync`, so a
    /// fresh instance runs per call on the blocking pool; the async caller
    /// stays cancellable while inference is in flight.
    pub struct TesseractOcr {
        data_path: Option<String>,
        languages: String,
    }

    impl TesseractOcr {
        pub fn new(data_path: Option<String>, languages: impl Into<String>) -> Self {
            TesseractOcr {
                data_path,
                languages: languages.into(),
            }
        }

        pub fn korean() -> Self {
            Self::new(None, DEFAULT_LANGUAGES)
        }
    }

    #[async_trait::async_trait]
    impl OcrEngine for TesseractOcr {
        async fn recognize(&self, image_png: &[u8]) -> Result<String, OcrError> {
            let data_path = self.data_path.clone();
            let languages = self.languages.clone();
            let bytes = image_png.to_vec();
            tokio::task::spawn_blocking(move || {
                let mut engine = leptess::LepTess::new(data_path.as_deref(), &languages)
                    .map_err(|e| OcrError::Engine(e.to_string()))?;
                engine
                    .set_image_from_mem(&bytes)
                    .map_err(|e| OcrError::Engine(e.to_string()))?;
                engine
                    .get_utf8_text()
                    .map_err(|e| OcrError::Engine(e.to_string()))
            })
            .await
            .map_err(|e| OcrError::Engine(e.to_string()))?
        }
    }
}
