// SPDX-License-Identifier: GPL-3.0-only

//! Camera source and decode engine abstraction
//!
//! The session controller depends only on the two traits here, so tests can
//! substitute fake enumerators and engines without touching real hardware.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │    Host (CLI/UI)    │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │   ScanController    │  ← State machine, resource lifecycle
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ CameraSource trait  │  ← Enumeration + engine creation
//! │ DecodeEngine trait  │  ← start / event channel / stop
//! └──────────┬──────────┘
//!            │
//!            ▼
//!       ┌─────────┐
//!       │  V4L2   │  ← Concrete implementation
//!       └─────────┘
//! ```

pub mod decode;
pub mod v4l2;

use tokio::sync::mpsc;

use crate::constants::DEFAULT_SYMBOLOGIES;
use crate::errors::ScanResult;
use crate::types::{CameraDevice, DetectionResult, ScanRegion, Symbology};

/// Asynchronous event delivered by a decode engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The engine confirmed start; frames are being decoded
    Ready,
    /// A barcode was decoded from the stream
    Detection(DetectionResult),
    /// A fatal initialization or mid-stream failure
    Error(crate::errors::ScanError),
}

/// Receiving half of an engine's event channel
///
/// The session controller owns the receiver for exactly one session and
/// drops it on every terminal transition, so detections cannot leak into a
/// stopped session.
pub type EngineEvents = mpsc::Receiver<EngineEvent>;

/// Sending half of an engine's event channel
pub type EngineEventSender = mpsc::Sender<EngineEvent>;

/// Options handed to the engine at session start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Symbologies the engine should recognize
    pub symbologies: Vec<Symbology>,
    /// Which part of the frame to search
    pub region: ScanRegion,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            symbologies: DEFAULT_SYMBOLOGIES.to_vec(),
            region: ScanRegion::default(),
        }
    }
}

/// Decode engine consumed as a black box
///
/// Start is synchronous up to resource allocation; confirmation arrives as
/// [`EngineEvent::Ready`] on the returned channel, initialization failures as
/// [`EngineEvent::Error`]. `stop` releases the camera and must be idempotent:
/// stopping an engine that never started, or stopping twice, must not raise.
pub trait DecodeEngine: Send {
    /// Begin continuous decoding against the given device
    fn start(&mut self, device: &CameraDevice, options: &EngineOptions)
    -> ScanResult<EngineEvents>;

    /// Release the camera stream; safe to call in any state
    fn stop(&mut self);
}

/// Injected camera capability
///
/// Bundles device listing with engine creation so the whole camera stack can
/// be swapped out in one place.
pub trait CameraSource: Send + Sync {
    /// List available video input devices, in platform order
    ///
    /// An empty list is a valid result (zero cameras), distinct from
    /// [`crate::errors::ScanError::NoCameraAccess`] when listing itself is
    /// refused.
    fn list_cameras(&self) -> ScanResult<Vec<CameraDevice>>;

    /// Create a fresh decode engine for one session
    fn create_engine(&self) -> Box<dyn DecodeEngine>;
}
