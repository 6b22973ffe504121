//! The pipeline controller: one receipt at a time through acquisition,
//! preprocessing, recognition, parsing and classification.
//!
//! Cancellation is cooperative. [`PipelineController::reset`] bumps a
//! generation counter on a watch channel; the run in flight observes the
//! bump at its next stage boundary or suspension point, resolves with
//! [`PipelineError::Cancelled`] and returns the state machine to idle.
//! Dropping the run future outright (task abort) is also safe: a drop
//! guard releases the state machine, and scoped camera sessions release
//! the device.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use jeonpyo_capture::{
    acquire_from_bytes, acquire_from_camera, CameraDevice, CameraFacing, RawImage,
};
use jeonpyo_classify::ClassifierTable;
use jeonpyo_core::{
    CoverageScore, LinkId, ReceiptRecord, RecordId, RecordStatus, ScorePolicy, SCORE_CEIL,
    SCORE_FLOOR,
};
use jeonpyo_ocr::{extract_text, preprocess, FieldParser, OcrEngine};

use crate::error::{PipelineError, StageError};
use crate::progress::{NoopObserver, SharedObserver};
use crate::stage::{PipelineState, Stage};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives receipt processing end to end. Generic over the recognition
/// engine; everything else is configured through the builder methods.
pub struct PipelineController<E> {
    engine: E,
    classifier: ClassifierTable,
    score: Box<dyn ScorePolicy>,
    observer: SharedObserver,
    parser: FieldParser,
    state: Mutex<PipelineState>,
    cancel: watch::Sender<u64>,
}

impl<E: OcrEngine> PipelineController<E> {
    /// Controller with the stock classifier table, coverage-based
    /// confidence and no observer.
    pub fn new(engine: E) -> Self {
        let (cancel, _) = watch::channel(0);
        PipelineController {
            engine,
            classifier: ClassifierTable::builtin(),
            score: Box::new(CoverageScore),
            observer: Arc::new(NoopObserver),
            parser: FieldParser::new(),
            state: Mutex::new(PipelineState::Idle),
            cancel,
        }
    }

    pub fn with_classifier(mut self, classifier: ClassifierTable) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_score_policy(mut self, score: impl ScorePolicy + 'static) -> Self {
        self.score = Box::new(score);
        self
    }

    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> PipelineState {
        *lock(&self.state)
    }

    /// Cancel any run in flight and return to idle. A run in flight
    /// resolves with [`PipelineError::Cancelled`] and clears the state as
    /// it unwinds; otherwise the state clears immediately.
    pub fn reset(&self) {
        self.cancel
            .send_modify(|generation| *generation = generation.wrapping_add(1));
        let mut state = lock(&self.state);
        if !state.is_running() {
            *state = PipelineState::Idle;
        }
        tracing::debug!("pipeline reset");
    }

    /// Process a receipt image already in memory. The controller must be
    /// idle; a run in flight or an uncleared terminal state rejects with
    /// [`PipelineError::Busy`].
    pub async fn run_from_bytes(
        &self,
        bytes: &[u8],
        link: LinkId,
    ) -> Result<ReceiptRecord, PipelineError> {
        let mut run = self.begin()?;
        tracing::info!(link = %link, bytes = bytes.len(), "processing receipt from byte buffer");
        run.enter(Stage::Acquiring)?;
        let raw = match acquire_from_bytes(bytes) {
            Ok(raw) => raw,
            Err(err) => return Err(self.fail(run, err.into(), link)),
        };
        self.finish(run, raw, link).await
    }

    /// Capture from a live camera and process the captured frame. The
    /// device is held only for the acquisition stage. The user backing out
    /// of the capture resolves as [`PipelineError::Cancelled`].
    pub async fn run_from_camera(
        &self,
        device: &dyn CameraDevice,
        link: LinkId,
    ) -> Result<ReceiptRecord, PipelineError> {
        let mut run = self.begin()?;
        tracing::info!(link = %link, "processing receipt from camera");
        run.enter(Stage::Acquiring)?;
        let acquired = run
            .guard(acquire_from_camera(device, CameraFacing::Rear))
            .await?;
        let raw = match acquired {
            Ok(Some(raw)) => raw,
            Ok(None) => return Err(run.cancel_now()),
            Err(err) => return Err(self.fail(run, err.into(), link)),
        };
        self.finish(run, raw, link).await
    }

    fn begin(&self) -> Result<RunToken<'_>, PipelineError> {
        let cancel = self.cancel.subscribe();
        let generation = *cancel.borrow();
        {
            let mut state = lock(&self.state);
            if *state != PipelineState::Idle {
                return Err(PipelineError::Busy);
            }
            *state = PipelineState::Running {
                stage: Stage::Acquiring,
            };
        }
        Ok(RunToken {
            state: &self.state,
            observer: &self.observer,
            cancel,
            generation,
            settled: false,
        })
    }

    async fn finish(
        &self,
        mut run: RunToken<'_>,
        raw: RawImage,
        link: LinkId,
    ) -> Result<ReceiptRecord, PipelineError> {
        tracing::debug!(
            digest = raw.digest_hex(),
            width = raw.width(),
            height = raw.height(),
            "image acquired"
        );

        run.enter(Stage::Preprocessing)?;
        let processed = preprocess(&raw);

        run.enter(Stage::Extracting)?;
        let extracted = match run.guard(extract_text(&self.engine, &processed)).await? {
            Ok(text) => text,
            Err(err) => return Err(self.fail(run, err.into(), link)),
        };

        run.enter(Stage::Parsing)?;
        let fields = self.parser.parse(&extracted);

        run.enter(Stage::Classifying)?;
        let label = self
            .classifier
            .classify(&fields.merchant, &fields.items.join("\n"));
        let confidence = self
            .score
            .score(&fields.coverage)
            .clamp(SCORE_FLOOR, SCORE_CEIL);

        let record = ReceiptRecord {
            id: RecordId::generate(),
            merchant: fields.merchant,
            amount: fields.amount,
            date: fields.date,
            items: fields.items,
            link_id: link,
            department: label.department,
            category: label.category,
            confidence,
            status: RecordStatus::Completed,
        };
        tracing::info!(
            id = %record.id,
            merchant = %record.merchant,
            department = %record.department,
            category = %record.category,
            confidence = record.confidence,
            "receipt processed"
        );
        run.complete(&record)?;
        Ok(record)
    }

    fn fail(&self, run: RunToken<'_>, error: StageError, link: LinkId) -> PipelineError {
        let stage = error.stage();
        tracing::warn!(%stage, %error, "run failed");
        if !run.fail(stage, &error) {
            return PipelineError::Cancelled;
        }
        let record = ReceiptRecord::failed(link);
        PipelineError::Stage {
            stage,
            error,
            record: Box::new(record),
        }
    }
}

/// Tracks one run through the state machine. Settling (complete, fail,
/// cancel) consumes or flags the token; if the run future is dropped
/// before settling, the drop guard returns the state to idle.
struct RunToken<'a> {
    state: &'a Mutex<PipelineState>,
    observer: &'a SharedObserver,
    cancel: watch::Receiver<u64>,
    generation: u64,
    settled: bool,
}

impl RunToken<'_> {
    fn cancelled(&self) -> bool {
        *self.cancel.borrow() != self.generation
    }

    /// Advance to `stage`, or resolve cancelled if a reset intervened.
    fn enter(&mut self, stage: Stage) -> Result<(), PipelineError> {
        if self.cancelled() {
            return Err(self.cancel_now());
        }
        *lock(self.state) = PipelineState::Running { stage };
        tracing::debug!(%stage, "stage started");
        self.observer.on_stage(stage, stage.index(), Stage::COUNT);
        Ok(())
    }

    /// Await `fut`, resolving cancelled instead if a reset arrives first.
    /// Dropping `fut` mid-flight is what releases stage-held resources.
    async fn guard<F, T>(&mut self, fut: F) -> Result<T, PipelineError>
    where
        F: std::future::Future<Output = T>,
    {
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.changed() => None,
            out = fut => Some(out),
        };
        match outcome {
            Some(out) => Ok(out),
            None => Err(self.cancel_now()),
        }
    }

    /// Settle as cancelled and release the state machine.
    fn cancel_now(&mut self) -> PipelineError {
        *lock(self.state) = PipelineState::Idle;
        self.settled = true;
        tracing::info!("run cancelled");
        PipelineError::Cancelled
    }

    /// Settle as completed, unless a reset claimed the run first.
    fn complete(mut self, record: &ReceiptRecord) -> Result<(), PipelineError> {
        let mut state = lock(self.state);
        if self.cancelled() {
            *state = PipelineState::Idle;
            drop(state);
            self.settled = true;
            return Err(PipelineError::Cancelled);
        }
        *state = PipelineState::Completed;
        drop(state);
        self.settled = true;
        self.observer.on_completed(record);
        Ok(())
    }

    /// Settle as failed, unless a reset claimed the run first. Returns
    /// whether the failure stood.
    fn fail(mut self, stage: Stage, error: &StageError) -> bool {
        let mut state = lock(self.state);
        if self.cancelled() {
            *state = PipelineState::Idle;
            drop(state);
            self.settled = true;
            return false;
        }
        *state = PipelineState::Failed {
            stage,
            kind: error.kind(),
        };
        drop(state);
        self.settled = true;
        self.observer.on_failed(stage, error);
        true
    }
}

impl Drop for RunToken<'_> {
    fn drop(&mut self) {
        if !self.settled {
            *lock(self.state) = PipelineState::Idle;
            tracing::debug!("run dropped before settling");
        }
    }
}
