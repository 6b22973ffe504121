use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::source::{acquire_from_bytes, CaptureError, RawImage};

/// Which camera to prefer when a device exposes more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    /// Preferred for receipt capture.
    Rear,
    Front,
}

/// A video capture device. The device is a singleton exclusive resource:
/// `open` must fail while a session from a previous `open` is still alive.
#[async_trait::async_trait]
pub trait CameraDevice: Send + Sync {
    /// Request exclusive access and start a live preview session.
    /// Denied permission or a missing device yields `DeviceUnavailable`.
    async fn open(&self, facing: CameraFacing) -> Result<Box<dyn CameraSession>, CaptureError>;
}

/// An open preview session. Implementations must release the underlying
/// device when the session is dropped, so that release holds on every exit
/// path, including a caller future dropped mid-await.
#[async_trait::async_trait]
pub trait CameraSession: Send + fmt::Debug {
    /// Suspend until the user triggers a capture, then yield one encoded
    /// frame. `None` means the user cancelled instead of capturing.
    async fn next_frame(&mut self) -> Result<Option<Vec<u8>>, CaptureError>;
}

/// Acquire a receipt image from a live camera: open the device, wait for one
/// captured frame, decode it, release the device. Returns `None` when the
/// capture was cancelled. The session is scoped to this call, so the device
/// is released no matter how the call exits.
pub async fn acquire_from_camera(
    device: &dyn CameraDevice,
    facing: CameraFacing,
) -> Result<Option<RawImage>, CaptureError> {
    let mut session = device.open(facing).await?;
    tracing::debug!(?facing, "camera session opened");
    let frame = session.next_frame().await?;
    match frame {
        Some(bytes) => {
            tracing::debug!(bytes = bytes.len(), "frame captured");
            acquire_from_bytes(&bytes).map(Some)
        }
        None => {
            tracing::debug!("capture cancelled before a frame was taken");
            Ok(None)
        }
    }
}

// ── Mock device (always available, used for tests) ────────────────────────────

#[derive(Debug, Clone)]
enum CameraScript {
    Frame(Vec<u8>),
    Cancel,
    /// Never yields; the caller has to abandon the wait.
    Pending,
}

/// Scriptable in-memory camera. Enforces exclusive access and records
/// open/release activity so tests can assert on device lifecycle.
pub struct MockCamera {
    script: CameraScript,
    deny: Option<String>,
    open: Arc<AtomicBool>,
    opens: Arc<AtomicUsize>,
    facings: Mutex<VecDeque<CameraFacing>>,
}

impl MockCamera {
    /// Yields `frame` once per session.
    pub fn with_frame(frame: Vec<u8>) -> Self {
        Self::scripted(CameraScript::Frame(frame), None)
    }

    /// The user cancels instead of capturing.
    pub fn cancelling() -> Self {
        Self::scripted(CameraScript::Cancel, None)
    }

    /// The capture trigger never arrives; `next_frame` stays pending.
    pub fn pending() -> Self {
        Self::scripted(CameraScript::Pending, None)
    }

    /// Access is denied outright.
    pub fn denied(reason: impl Into<String>) -> Self {
        Self::scripted(CameraScript::Cancel, Some(reason.into()))
    }

    fn scripted(script: CameraScript, deny: Option<String>) -> Self {
        MockCamera {
            script,
            deny,
            open: Arc::new(AtomicBool::new(false)),
            opens: Arc::new(AtomicUsize::new(0)),
            facings: Mutex::new(VecDeque::new()),
        }
    }

    /// Whether a session currently holds the device.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// How many sessions have been opened over the device's lifetime.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Facing hints passed to `open`, oldest first.
    pub fn requested_facings(&self) -> Vec<CameraFacing> {
        self.facings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }
}

#[async_trait::async_trait]
impl CameraDevice for MockCamera {
    async fn open(&self, facing: CameraFacing) -> Result<Box<dyn CameraSession>, CaptureError> {
        if let Some(reason) = &self.deny {
            return Err(CaptureError::DeviceUnavailable(reason.clone()));
        }
        if self.open.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::DeviceUnavailable(
                "device already in use".to_string(),
            ));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.facings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(facing);
        Ok(Box::new(MockSession {
            script: Some(self.script.clone()),
            open: Arc::clone(&self.open),
        }))
    }
}

#[derive(Debug)]
struct MockSession {
    script: Option<CameraScript>,
    open: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl CameraSession for MockSession {
    async fn next_frame(&mut self) -> Result<Option<Vec<u8>>, CaptureError> {
        match self.script.take() {
            Some(CameraScript::Frame(bytes)) => Ok(Some(bytes)),
            Some(CameraScript::Cancel) | None => Ok(None),
            Some(CameraScript::Pending) => std::future::pending().await,
        }
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.open.store(false, Ordering::SeqCst);
    }
}
