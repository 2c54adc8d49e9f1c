// SPDX-License-Identifier: GPL-3.0-only

//! Live barcode acquisition pipeline
//!
//! Turns a live camera video stream into a decoded barcode value, or a
//! graceful manual-entry fallback, while keeping the camera resource safe
//! across start/detect/error/close transitions.
//!
//! # Architecture
//!
//! - [`session`]: the scan session controller and its state machine
//! - [`source`]: camera source and decode engine abstraction, plus the
//!   bundled V4L2 implementation
//! - [`devices`]: device enumeration and camera selection policy
//! - [`manual`]: the fallback entry path
//! - [`config`]: user configuration handling
//! - [`errors`]: the scan failure taxonomy
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use barscan::{ScanController, ScanConfig};
//! use barscan::source::v4l2::V4l2Source;
//!
//! # async fn scan() {
//! let config = ScanConfig::load();
//! let mut controller = ScanController::new(Arc::new(V4l2Source), config.engine_options());
//! let outcome = controller.run().await;
//! # let _ = outcome;
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod devices;
pub mod errors;
pub mod manual;
pub mod session;
pub mod source;
pub mod types;

// Re-export commonly used types
pub use config::ScanConfig;
pub use errors::{ScanError, ScanResult};
pub use session::{CloseHandle, ScanController, SessionOutcome, SessionState};
pub use types::{CameraDevice, CameraRole, DetectionResult, ScanRegion, Symbology};
