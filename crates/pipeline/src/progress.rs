use std::sync::Arc;

use jeonpyo_core::ReceiptRecord;

use crate::error::StageError;
use crate::stage::Stage;

/// Observer for run progress. Every method has a no-op default, so
/// implementors override only the events they care about. Callbacks run on
/// the pipeline's task; keep them short.
pub trait ProgressObserver: Send + Sync {
    /// A stage began. `index` is 1-based out of `total`.
    fn on_stage(&self, stage: Stage, index: usize, total: usize) {
        let _ = (stage, index, total);
    }

    /// The run settled with a completed record.
    fn on_completed(&self, record: &ReceiptRecord) {
        let _ = record;
    }

    /// The run settled with a failure at `stage`.
    fn on_failed(&self, stage: Stage, error: &StageError) {
        let _ = (stage, error);
    }
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {}

/// Shared observer handle as stored by the controller.
pub type SharedObserver = Arc<dyn ProgressObserver>;
