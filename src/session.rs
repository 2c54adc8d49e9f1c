// SPDX-License-Identifier: GPL-3.0-only

//! Scan session controller
//!
//! Owns one decode session at a time: enumerates devices, starts the decode
//! engine, accepts the first detection, and tears the session down exactly
//! once on success, error, or cancellation.
//!
//! The camera resource is held if and only if the controller is in
//! `Initializing` or `Scanning`. Every path out of those states releases the
//! engine before the session outcome is produced; the concrete engines also
//! release on `Drop` as a last-resort guard.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::devices;
use crate::errors::ScanError;
use crate::source::{CameraSource, DecodeEngine, EngineEvent, EngineEvents, EngineOptions};
use crate::types::{CameraDevice, DetectionResult};

/// Lifecycle state of a scan session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No resources held; initial state
    #[default]
    Idle,
    /// Devices enumerated, engine start requested but not yet confirmed
    Initializing,
    /// Engine is actively decoding frames
    Scanning,
    /// Exactly one detection accepted; engine stop in progress
    Detected,
    /// A classified failure occurred; resources released
    Failed,
    /// Terminal; resources released
    Stopped,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Initializing => write!(f, "initializing"),
            SessionState::Scanning => write!(f, "scanning"),
            SessionState::Detected => write!(f, "detected"),
            SessionState::Failed => write!(f, "failed"),
            SessionState::Stopped => write!(f, "stopped"),
        }
    }
}

/// How a session ended; delivered exactly once per session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The first valid detection of the session
    Detected(DetectionResult),
    /// The host closed the session before a result was produced; not an error
    Cancelled,
    /// A classified failure; the host may offer retry or manual entry
    Failed(ScanError),
}

/// Cancel intent for a running session
///
/// Cloneable and cheap; calling [`close`](CloseHandle::close) while no
/// session is running is a no-op. Honored within one scheduler tick from any
/// non-terminal state.
#[derive(Debug, Clone)]
pub struct CloseHandle {
    tx: mpsc::Sender<()>,
}

impl CloseHandle {
    /// Request an immediate transition to `Stopped` with resource release
    pub fn close(&self) {
        // Full buffer means a close is already pending; nothing to add
        let _ = self.tx.try_send(());
    }
}

/// Owns one live decode attempt at a time
pub struct ScanController {
    source: Arc<dyn CameraSource>,
    options: EngineOptions,
    preferred_camera: Option<String>,
    state: SessionState,
    close_tx: mpsc::Sender<()>,
    close_rx: mpsc::Receiver<()>,
    active_device: Option<CameraDevice>,
}

impl ScanController {
    pub fn new(source: Arc<dyn CameraSource>, options: EngineOptions) -> Self {
        let (close_tx, close_rx) = mpsc::channel(1);
        Self {
            source,
            options,
            preferred_camera: None,
            state: SessionState::Idle,
            close_tx,
            close_rx,
            active_device: None,
        }
    }

    /// Prefer the device with this path during selection
    pub fn with_preferred_camera(mut self, path: Option<String>) -> Self {
        self.preferred_camera = path;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Device chosen for the current or most recent session
    pub fn active_device(&self) -> Option<&CameraDevice> {
        self.active_device.as_ref()
    }

    /// Handle through which the host expresses close intent
    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            tx: self.close_tx.clone(),
        }
    }

    /// Run one complete scan session to its outcome
    ///
    /// Enumerates devices, starts the engine, and waits for the first
    /// detection, a failure, or a close request. The camera is released on
    /// every exit path before the outcome is returned. At most one session
    /// may run per controller; a second call returns
    /// [`ScanError::SessionActive`].
    pub async fn run(&mut self) -> SessionOutcome {
        if self.state != SessionState::Idle {
            warn!(state = %self.state, "Refusing to start a second session");
            return SessionOutcome::Failed(ScanError::SessionActive);
        }
        // Close requests sent while Idle are no-ops; drop any stale ones so
        // they cannot cancel the session that is only now starting
        while self.close_rx.try_recv().is_ok() {}

        self.transition(SessionState::Initializing);

        // Re-enumerate every session; availability changes between scans
        let cameras = match self.source.list_cameras() {
            Ok(cameras) => cameras,
            Err(e) => return self.fail(None, e),
        };
        let device = match devices::select_camera(&cameras, self.preferred_camera.as_deref()) {
            Some(device) => device.clone(),
            None => return self.fail(None, ScanError::NoCameraAvailable),
        };
        info!(device = %device, role = %device.role, "Camera selected");
        self.active_device = Some(device.clone());

        let mut engine = self.source.create_engine();
        let mut events = match engine.start(&device, &self.options) {
            Ok(events) => events,
            Err(e) => return self.fail(Some(engine), e),
        };

        // Initializing: suspend until the engine confirms start or fails
        loop {
            tokio::select! {
                biased;
                _ = self.close_rx.recv() => return self.cancel(engine, events),
                event = events.recv() => match event {
                    Some(EngineEvent::Ready) => break,
                    // An engine that detects before confirming start has
                    // started; accept the result rather than discard it
                    Some(EngineEvent::Detection(result)) => {
                        return self.detected(engine, events, result);
                    }
                    Some(EngineEvent::Error(e)) => return self.fail(Some(engine), e),
                    None => {
                        return self.fail(
                            Some(engine),
                            ScanError::StreamTerminated(
                                "engine closed event channel before start".to_string(),
                            ),
                        );
                    }
                },
            }
        }

        self.transition(SessionState::Scanning);

        // Scanning: wait indefinitely for the next event, processing one at
        // a time; the first detection wins
        loop {
            tokio::select! {
                biased;
                _ = self.close_rx.recv() => return self.cancel(engine, events),
                event = events.recv() => match event {
                    Some(EngineEvent::Detection(result)) => {
                        return self.detected(engine, events, result);
                    }
                    Some(EngineEvent::Error(e)) => return self.fail(Some(engine), e),
                    Some(EngineEvent::Ready) => {
                        debug!("Duplicate ready event ignored");
                    }
                    None => {
                        return self.fail(
                            Some(engine),
                            ScanError::StreamTerminated(
                                "engine closed event channel".to_string(),
                            ),
                        );
                    }
                },
            }
        }
    }

    /// Accept the first detection and tear the session down
    fn detected(
        &mut self,
        mut engine: Box<dyn DecodeEngine>,
        events: EngineEvents,
        result: DetectionResult,
    ) -> SessionOutcome {
        self.transition(SessionState::Detected);
        // Dropping the receiver first guarantees no later event of this
        // session can be observed, even while the engine stop is in flight
        drop(events);
        engine.stop();
        info!(result = %result, "Detection accepted");
        self.transition(SessionState::Stopped);
        SessionOutcome::Detected(result)
    }

    /// Honor a close request from any non-terminal state
    fn cancel(
        &mut self,
        mut engine: Box<dyn DecodeEngine>,
        events: EngineEvents,
    ) -> SessionOutcome {
        debug!(state = %self.state, "Close requested, stopping session");
        drop(events);
        // Stop failures are the engine's to log; they never reach the host
        engine.stop();
        self.transition(SessionState::Stopped);
        SessionOutcome::Cancelled
    }

    /// Normalize a failure, releasing the engine if one was created
    fn fail(&mut self, engine: Option<Box<dyn DecodeEngine>>, error: ScanError) -> SessionOutcome {
        self.transition(SessionState::Failed);
        if let Some(mut engine) = engine {
            // Attempt release even when start never fully completed
            engine.stop();
        }
        warn!(error = %error, "Scan session failed");
        self.transition(SessionState::Stopped);
        SessionOutcome::Failed(error)
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = %self.state, to = %next, "Session state transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_starts_idle() {
        struct NoSource;
        impl CameraSource for NoSource {
            fn list_cameras(&self) -> crate::errors::ScanResult<Vec<CameraDevice>> {
                Ok(Vec::new())
            }
            fn create_engine(&self) -> Box<dyn DecodeEngine> {
                unreachable!("no engine for an empty source")
            }
        }

        let controller = ScanController::new(Arc::new(NoSource), EngineOptions::default());
        assert_eq!(controller.state(), SessionState::Idle);
        assert!(controller.active_device().is_none());
    }

    #[tokio::test]
    async fn empty_enumeration_fails_without_engine_start() {
        struct NoSource;
        impl CameraSource for NoSource {
            fn list_cameras(&self) -> crate::errors::ScanResult<Vec<CameraDevice>> {
                Ok(Vec::new())
            }
            fn create_engine(&self) -> Box<dyn DecodeEngine> {
                panic!("engine must not be created when enumeration is empty");
            }
        }

        let mut controller = ScanController::new(Arc::new(NoSource), EngineOptions::default());
        let outcome = controller.run().await;
        assert_eq!(
            outcome,
            SessionOutcome::Failed(ScanError::NoCameraAvailable)
        );
        assert_eq!(controller.state(), SessionState::Stopped);
    }
}
