// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the scan session controller
//!
//! A scripted camera source and engine stand in for real hardware, so every
//! lifecycle path can be driven deterministically: first-wins detection,
//! release on every exit, idempotent teardown, and cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use barscan::errors::{ScanError, ScanResult};
use barscan::session::{ScanController, SessionOutcome, SessionState};
use barscan::source::{CameraSource, DecodeEngine, EngineEvent, EngineEvents, EngineOptions};
use barscan::types::{CameraDevice, DetectionResult, Symbology};

/// Start/stop call counters shared between a fake source and the test
#[derive(Clone, Default)]
struct Counters {
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl Counters {
    fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

/// Engine that replays a scripted event sequence
struct FakeEngine {
    script: Vec<EngineEvent>,
    hold_open: bool,
    start_error: Option<ScanError>,
    counters: Counters,
    keep_tx: Option<mpsc::Sender<EngineEvent>>,
}

impl DecodeEngine for FakeEngine {
    fn start(
        &mut self,
        _device: &CameraDevice,
        _options: &EngineOptions,
    ) -> ScanResult<EngineEvents> {
        self.counters.starts.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.start_error.take() {
            return Err(error);
        }

        let (tx, rx) = mpsc::channel(16);
        // All scripted events land in the same tick, before the controller
        // reads any of them
        for event in self.script.drain(..) {
            tx.try_send(event).expect("script fits in channel");
        }
        if self.hold_open {
            // Keep the channel alive so the session stays in Scanning
            self.keep_tx = Some(tx);
        }
        Ok(rx)
    }

    fn stop(&mut self) {
        self.counters.stops.fetch_add(1, Ordering::SeqCst);
        self.keep_tx = None;
    }
}

/// Source serving a fixed device list and scripted engines
struct FakeSource {
    devices: ScanResult<Vec<CameraDevice>>,
    script: Vec<EngineEvent>,
    hold_open: bool,
    start_error: Option<ScanError>,
    counters: Counters,
}

impl FakeSource {
    fn with_camera() -> Self {
        Self {
            devices: Ok(vec![CameraDevice::new("/dev/video0", "Back Camera")]),
            script: Vec::new(),
            hold_open: false,
            start_error: None,
            counters: Counters::default(),
        }
    }

    fn scripted(mut self, script: Vec<EngineEvent>) -> Self {
        self.script = script;
        self
    }

    fn holding_open(mut self) -> Self {
        self.hold_open = true;
        self
    }
}

impl CameraSource for FakeSource {
    fn list_cameras(&self) -> ScanResult<Vec<CameraDevice>> {
        self.devices.clone()
    }

    fn create_engine(&self) -> Box<dyn DecodeEngine> {
        Box::new(FakeEngine {
            script: self.script.clone(),
            hold_open: self.hold_open,
            start_error: self.start_error.clone(),
            counters: self.counters.clone(),
            keep_tx: None,
        })
    }
}

fn detection(value: &str) -> EngineEvent {
    EngineEvent::Detection(DetectionResult::new(value, Symbology::Ean13))
}

fn controller_for(source: FakeSource) -> (ScanController, Counters) {
    let counters = source.counters.clone();
    (
        ScanController::new(Arc::new(source), EngineOptions::default()),
        counters,
    )
}

#[tokio::test]
async fn first_detection_wins_over_same_tick_duplicates() {
    let source = FakeSource::with_camera()
        .scripted(vec![
            EngineEvent::Ready,
            detection("9780141036144"),
            detection("9780141036151"),
        ])
        .holding_open();
    let (mut controller, counters) = controller_for(source);

    let outcome = controller.run().await;

    assert_eq!(
        outcome,
        SessionOutcome::Detected(DetectionResult::new("9780141036144", Symbology::Ean13))
    );
    assert_eq!(counters.stops(), 1, "engine stopped exactly once");
    assert_eq!(controller.state(), SessionState::Stopped);
}

#[tokio::test]
async fn empty_device_list_fails_before_engine_start() {
    let mut source = FakeSource::with_camera();
    source.devices = Ok(Vec::new());
    let (mut controller, counters) = controller_for(source);

    let outcome = controller.run().await;

    assert_eq!(outcome, SessionOutcome::Failed(ScanError::NoCameraAvailable));
    assert_eq!(counters.starts(), 0, "engine start never attempted");
    assert_eq!(controller.state(), SessionState::Stopped);
}

#[tokio::test]
async fn denied_enumeration_surfaces_no_camera_access() {
    let mut source = FakeSource::with_camera();
    source.devices = Err(ScanError::NoCameraAccess("permission denied".into()));
    let (mut controller, counters) = controller_for(source);

    let outcome = controller.run().await;

    assert!(matches!(
        outcome,
        SessionOutcome::Failed(ScanError::NoCameraAccess(_))
    ));
    assert_eq!(counters.starts(), 0);
}

#[tokio::test]
async fn close_while_scanning_cancels_and_releases() {
    let source = FakeSource::with_camera()
        .scripted(vec![EngineEvent::Ready])
        .holding_open();
    let (mut controller, counters) = controller_for(source);
    let close = controller.close_handle();

    let session = tokio::spawn(async move { (controller.run().await, controller) });
    // Give the session time to reach Scanning before closing
    tokio::time::sleep(Duration::from_millis(50)).await;
    close.close();

    let (outcome, controller) = session.await.expect("session task completed");
    assert_eq!(outcome, SessionOutcome::Cancelled);
    assert_eq!(counters.stops(), 1, "engine stopped exactly once");
    assert_eq!(controller.state(), SessionState::Stopped);
}

#[tokio::test]
async fn engine_start_failure_still_releases() {
    let mut source = FakeSource::with_camera();
    source.start_error = Some(ScanError::EngineStartFailure("device busy".into()));
    let (mut controller, counters) = controller_for(source);

    let outcome = controller.run().await;

    assert!(matches!(
        outcome,
        SessionOutcome::Failed(ScanError::EngineStartFailure(_))
    ));
    assert_eq!(counters.stops(), 1, "release attempted despite failed start");
}

#[tokio::test]
async fn engine_error_event_fails_session() {
    let source = FakeSource::with_camera()
        .scripted(vec![
            EngineEvent::Ready,
            EngineEvent::Error(ScanError::StreamTerminated("camera unplugged".into())),
        ])
        .holding_open();
    let (mut controller, counters) = controller_for(source);

    let outcome = controller.run().await;

    assert!(matches!(
        outcome,
        SessionOutcome::Failed(ScanError::StreamTerminated(_))
    ));
    assert_eq!(counters.stops(), 1);
}

#[tokio::test]
async fn closed_event_channel_is_stream_termination() {
    // hold_open not set: the script sender drops right after Ready
    let source = FakeSource::with_camera().scripted(vec![EngineEvent::Ready]);
    let (mut controller, counters) = controller_for(source);

    let outcome = controller.run().await;

    assert!(matches!(
        outcome,
        SessionOutcome::Failed(ScanError::StreamTerminated(_))
    ));
    assert_eq!(counters.stops(), 1);
}

#[tokio::test]
async fn close_from_idle_is_a_no_op() {
    let source = FakeSource::with_camera()
        .scripted(vec![EngineEvent::Ready, detection("4006381333931")])
        .holding_open();
    let (mut controller, _counters) = controller_for(source);

    // Closing before the session starts must not cancel the next session
    controller.close_handle().close();

    let outcome = controller.run().await;
    assert_eq!(
        outcome,
        SessionOutcome::Detected(DetectionResult::new("4006381333931", Symbology::Ean13))
    );
}

#[tokio::test]
async fn close_after_stopped_is_a_no_op() {
    let source = FakeSource::with_camera()
        .scripted(vec![EngineEvent::Ready, detection("4006381333931")])
        .holding_open();
    let (mut controller, counters) = controller_for(source);

    let _ = controller.run().await;
    controller.close_handle().close();
    controller.close_handle().close();

    assert_eq!(controller.state(), SessionState::Stopped);
    assert_eq!(counters.stops(), 1, "no extra release from late closes");
}

#[tokio::test]
async fn second_session_on_same_controller_is_rejected() {
    let source = FakeSource::with_camera()
        .scripted(vec![EngineEvent::Ready, detection("4006381333931")])
        .holding_open();
    let (mut controller, counters) = controller_for(source);

    let first = controller.run().await;
    assert!(matches!(first, SessionOutcome::Detected(_)));

    let second = controller.run().await;
    assert_eq!(second, SessionOutcome::Failed(ScanError::SessionActive));
    assert_eq!(counters.starts(), 1, "engine only ever started once");
}

#[tokio::test]
async fn detection_before_ready_is_accepted() {
    // An engine may detect on its very first frame, before the controller
    // processes the start confirmation
    let source = FakeSource::with_camera()
        .scripted(vec![detection("5012345678900")])
        .holding_open();
    let (mut controller, counters) = controller_for(source);

    let outcome = controller.run().await;

    assert_eq!(
        outcome,
        SessionOutcome::Detected(DetectionResult::new("5012345678900", Symbology::Ean13))
    );
    assert_eq!(counters.stops(), 1);
}

#[tokio::test]
async fn active_device_reflects_selection() {
    let source = FakeSource {
        devices: Ok(vec![
            CameraDevice::new("/dev/video0", "Front Camera"),
            CameraDevice::new("/dev/video2", "Back Camera"),
        ]),
        script: vec![EngineEvent::Ready, detection("9780141036144")],
        hold_open: true,
        start_error: None,
        counters: Counters::default(),
    };
    let (mut controller, _counters) = controller_for(source);

    let _ = controller.run().await;

    let device = controller.active_device().expect("device recorded");
    assert_eq!(device.label, "Back Camera");
}
