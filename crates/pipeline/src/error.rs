use serde::{Deserialize, Serialize};
use std::fmt;

use jeonpyo_capture::CaptureError;
use jeonpyo_core::ReceiptRecord;
use jeonpyo_ocr::OcrError;

use crate::stage::Stage;

/// Failure classes a run can settle with. Exhaustive and stable; consumers
/// branch on these, not on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidImage,
    DeviceUnavailable,
    ExtractionFailed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidImage => "invalid_image",
            ErrorKind::DeviceUnavailable => "device_unavailable",
            ErrorKind::ExtractionFailed => "extraction_failed",
        };
        f.write_str(name)
    }
}

/// A failure inside one stage of a run.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("Text extraction failed: {0}")]
    ExtractionFailed(String),
}

impl StageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StageError::InvalidImage(_) => ErrorKind::InvalidImage,
            StageError::DeviceUnavailable(_) => ErrorKind::DeviceUnavailable,
            StageError::ExtractionFailed(_) => ErrorKind::ExtractionFailed,
        }
    }

    /// Stage the failure is attributed to.
    pub fn stage(&self) -> Stage {
        match self {
            StageError::InvalidImage(_) | StageError::DeviceUnavailable(_) => Stage::Acquiring,
            StageError::ExtractionFailed(_) => Stage::Extracting,
        }
    }
}

impl From<CaptureError> for StageError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::InvalidImage(e) => StageError::InvalidImage(e.to_string()),
            CaptureError::DeviceUnavailable(reason) => StageError::DeviceUnavailable(reason),
        }
    }
}

impl From<OcrError> for StageError {
    fn from(err: OcrError) -> Self {
        StageError::ExtractionFailed(err.to_string())
    }
}

/// Error returned by a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The controller is not idle: a run is in flight, or a finished run
    /// has not been cleared with `reset`.
    #[error("Pipeline is busy")]
    Busy,
    /// The run was cancelled by a reset or by the user backing out of the
    /// capture. No record is produced.
    #[error("Run cancelled")]
    Cancelled,
    /// A stage failed. A placeholder record was minted so downstream
    /// consumers see the failure in their ledgers.
    #[error("Stage {stage} failed: {error}")]
    Stage {
        stage: Stage,
        error: StageError,
        record: Box<ReceiptRecord>,
    },
}

impl PipelineError {
    /// The placeholder record for a stage failure.
    pub fn record(&self) -> Option<&ReceiptRecord> {
        match self {
            PipelineError::Stage { record, .. } => Some(record),
            _ => None,
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            PipelineError::Stage { error, .. } => Some(error.kind()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_errors_attribute_to_acquisition() {
        let err: StageError = CaptureError::DeviceUnavailable("in use".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::DeviceUnavailable);
        assert_eq!(err.stage(), Stage::Acquiring);

        let decode = image::load_from_memory(b"junk").unwrap_err();
        let err: StageError = CaptureError::InvalidImage(decode).into();
        assert_eq!(err.kind(), ErrorKind::InvalidImage);
        assert_eq!(err.stage(), Stage::Acquiring);
    }

    #[test]
    fn ocr_errors_attribute_to_extraction() {
        let err: StageError = OcrError::Engine("model not loaded".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
        assert_eq!(err.stage(), Stage::Extracting);
        assert!(err.to_string().contains("model not loaded"));

        let err: StageError = OcrError::ImageEncode("png writer".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::ExtractionFailed);
    }

    #[test]
    fn kinds_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::InvalidImage).unwrap(),
            "\"invalid_image\""
        );
        assert_eq!(ErrorKind::DeviceUnavailable.to_string(), "device_unavailable");
    }

    #[test]
    fn only_stage_failures_carry_a_record() {
        assert!(PipelineError::Busy.record().is_none());
        assert!(PipelineError::Cancelled.record().is_none());
        assert!(PipelineError::Busy.kind().is_none());
    }
}
