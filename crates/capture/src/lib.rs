//! Receipt image acquisition.
//!
//! Two ways into the pipeline: decode bytes that already exist (gallery
//! pick, file import) with [`acquire_from_bytes`], or drive a live camera
//! through the [`CameraDevice`] trait with [`acquire_from_camera`]. Either
//! path yields a [`RawImage`] carrying the decoded pixels and a content
//! digest for logging and dedup.

pub mod camera;
pub mod digest;
pub mod source;

pub use camera::{acquire_from_camera, CameraDevice, CameraFacing, CameraSession, MockCamera};
pub use digest::{sha256_bytes, to_hex};
pub use source::{acquire_from_bytes, CaptureError, RawImage};
