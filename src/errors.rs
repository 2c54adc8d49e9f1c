// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scan pipeline
//!
//! Every camera- or engine-level failure is normalized into [`ScanError`]
//! at the session controller boundary. Cancellation is not an error and is
//! reported through the session outcome instead.

use std::fmt;

/// Result type alias using ScanError
pub type ScanResult<T> = Result<T, ScanError>;

/// Classified scan failure, terminal for the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Zero video input devices found (a valid empty enumeration)
    NoCameraAvailable,
    /// The platform refused device listing or stream access
    NoCameraAccess(String),
    /// The decode engine failed to initialize against the chosen device
    EngineStartFailure(String),
    /// The engine reported an unexpected mid-session failure
    StreamTerminated(String),
    /// A session is already active on this controller
    SessionActive,
}

impl ScanError {
    /// Whether the host should offer manual entry instead of a retry
    ///
    /// Camera absence and permission problems will not resolve on their own,
    /// so the fallback entry path is the useful recovery. Engine and stream
    /// failures may be transient.
    pub fn suggests_manual_entry(&self) -> bool {
        matches!(
            self,
            ScanError::NoCameraAvailable | ScanError::NoCameraAccess(_)
        )
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::NoCameraAvailable => write!(f, "No camera devices found"),
            ScanError::NoCameraAccess(msg) => write!(f, "Camera access denied: {}", msg),
            ScanError::EngineStartFailure(msg) => {
                write!(f, "Decode engine failed to start: {}", msg)
            }
            ScanError::StreamTerminated(msg) => write!(f, "Camera stream terminated: {}", msg),
            ScanError::SessionActive => write!(f, "A scan session is already active"),
        }
    }
}

impl std::error::Error for ScanError {}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => ScanError::NoCameraAccess(err.to_string()),
            _ => ScanError::EngineStartFailure(err.to_string()),
        }
    }
}
