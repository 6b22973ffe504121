//! Receipt processing pipeline.
//!
//! [`PipelineController`] drives one receipt at a time through
//! acquisition, preprocessing, recognition, parsing and classification,
//! emitting a classified [`jeonpyo_core::ReceiptRecord`] per run. Progress
//! is reported through [`ProgressObserver`]; the single-flight state
//! machine is observable through [`PipelineState`].

pub mod controller;
pub mod error;
pub mod progress;
pub mod stage;

pub use controller::PipelineController;
pub use error::{ErrorKind, PipelineError, StageError};
pub use progress::{NoopObserver, ProgressObserver, SharedObserver};
pub use stage::{PipelineState, Stage};
