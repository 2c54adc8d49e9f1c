// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera source and decode engine
//!
//! The engine runs a capture loop on a dedicated thread: memory-mapped YUYV
//! streaming, luma extraction, and decode attempts at a sampling interval.
//! Events flow back to the session controller over a bounded channel; the
//! thread observes a stop signal and is joined on `stop()`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

use crate::constants::{
    CAPTURE_BUFFER_COUNT, CAPTURE_HEIGHT, CAPTURE_WIDTH, DECODE_SAMPLE_INTERVAL,
    ENGINE_EVENT_CAPACITY, MAX_CAPTURE_ERRORS,
};
use crate::devices;
use crate::errors::{ScanError, ScanResult};
use crate::source::decode::FrameDecoder;
use crate::source::{CameraSource, DecodeEngine, EngineEvent, EngineEventSender, EngineEvents, EngineOptions};
use crate::types::CameraDevice;

/// Camera source backed by the V4L2 subsystem
#[derive(Debug, Default)]
pub struct V4l2Source;

impl CameraSource for V4l2Source {
    fn list_cameras(&self) -> ScanResult<Vec<CameraDevice>> {
        devices::enumerate_v4l2()
    }

    fn create_engine(&self) -> Box<dyn DecodeEngine> {
        Box::new(V4l2Engine::new())
    }
}

/// Decode engine streaming from a V4L2 device
pub struct V4l2Engine {
    stop_signal: Arc<AtomicBool>,
    capture_thread: Option<JoinHandle<()>>,
}

impl V4l2Engine {
    pub fn new() -> Self {
        Self {
            stop_signal: Arc::new(AtomicBool::new(false)),
            capture_thread: None,
        }
    }
}

impl Default for V4l2Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeEngine for V4l2Engine {
    fn start(
        &mut self,
        device: &CameraDevice,
        options: &EngineOptions,
    ) -> ScanResult<EngineEvents> {
        if self.capture_thread.is_some() {
            return Err(ScanError::EngineStartFailure(
                "engine already started".to_string(),
            ));
        }

        info!(device = %device, "Starting capture loop");
        let (tx, rx) = mpsc::channel(ENGINE_EVENT_CAPACITY);
        self.stop_signal.store(false, Ordering::SeqCst);

        let stop_signal = Arc::clone(&self.stop_signal);
        let path = device.path.clone();
        let decoder = FrameDecoder::new(options);

        let handle = std::thread::spawn(move || {
            capture_loop(&path, decoder, tx, stop_signal);
        });
        self.capture_thread = Some(handle);

        Ok(rx)
    }

    fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        if let Some(handle) = self.capture_thread.take() {
            debug!("Waiting for capture thread to finish");
            if handle.join().is_err() {
                warn!("Capture thread panicked during stop");
            }
        }
    }
}

impl Drop for V4l2Engine {
    fn drop(&mut self) {
        // Last-resort release; normal paths stop explicitly
        if self.capture_thread.is_some() {
            debug!("V4l2Engine dropped while running, stopping");
            self.stop();
        }
    }
}

/// Capture loop body; runs on a dedicated thread until stopped
fn capture_loop(
    path: &str,
    decoder: FrameDecoder,
    tx: EngineEventSender,
    stop_signal: Arc<AtomicBool>,
) {
    let (dev, width, height) = match configure_device(path) {
        Ok(configured) => configured,
        Err(e) => {
            warn!(path, error = %e, "Capture setup failed");
            let _ = tx.blocking_send(EngineEvent::Error(e));
            return;
        }
    };
    let mut stream = match Stream::with_buffers(&dev, Type::VideoCapture, CAPTURE_BUFFER_COUNT) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(path, error = %e, "Failed to create stream");
            let _ = tx.blocking_send(EngineEvent::Error(ScanError::EngineStartFailure(format!(
                "failed to create stream: {}",
                e
            ))));
            return;
        }
    };

    if tx.blocking_send(EngineEvent::Ready).is_err() {
        debug!(path, "Session gone before capture started");
        return;
    }
    info!(path, "Capture loop started");

    let mut last_decode: Option<Instant> = None;
    let mut consecutive_errors = 0u32;

    while !stop_signal.load(Ordering::SeqCst) {
        let (buf, _meta) = match stream.next() {
            Ok(frame) => frame,
            Err(e) => {
                consecutive_errors += 1;
                warn!(path, error = %e, consecutive_errors, "Failed to capture frame");
                if consecutive_errors >= MAX_CAPTURE_ERRORS {
                    let _ = tx.blocking_send(EngineEvent::Error(ScanError::StreamTerminated(
                        e.to_string(),
                    )));
                    break;
                }
                continue;
            }
        };
        consecutive_errors = 0;

        // Sample frames rather than decoding every one
        let due = last_decode
            .map(|t| t.elapsed() >= DECODE_SAMPLE_INTERVAL)
            .unwrap_or(true);
        if !due {
            continue;
        }
        last_decode = Some(Instant::now());

        let luma = extract_yuyv_luma(buf, width, height);
        if let Some(result) = decoder.decode_luma(&luma, width, height) {
            if tx.blocking_send(EngineEvent::Detection(result)).is_err() {
                // Receiver dropped: the session ended and no further
                // events are honored
                break;
            }
        }
    }

    info!(path, "Capture loop exiting");
}

/// Open the device and negotiate YUYV at the capture resolution
///
/// Returns the device along with the dimensions the driver actually granted;
/// drivers are free to adjust the requested resolution.
fn configure_device(path: &str) -> ScanResult<(Device, u32, u32)> {
    let dev = Device::with_path(path)
        .map_err(|e| ScanError::EngineStartFailure(format!("failed to open {}: {}", path, e)))?;

    let fourcc_yuyv = FourCC::new(b"YUYV");
    let format = Format::new(CAPTURE_WIDTH, CAPTURE_HEIGHT, fourcc_yuyv);
    let actual = dev
        .set_format(&format)
        .map_err(|e| ScanError::EngineStartFailure(format!("failed to set format: {}", e)))?;

    if actual.fourcc != fourcc_yuyv {
        return Err(ScanError::EngineStartFailure(format!(
            "device produces {} rather than YUYV",
            actual.fourcc
        )));
    }
    info!(
        path,
        width = actual.width,
        height = actual.height,
        fourcc = %actual.fourcc,
        "Capture format configured"
    );

    Ok((dev, actual.width, actual.height))
}

/// Extract the Y channel from packed YUYV data
///
/// YUYV lays out pixel pairs as `Y0 U Y1 V`; every even byte is luma.
fn extract_yuyv_luma(buf: &[u8], width: u32, height: u32) -> Vec<u8> {
    let expected = (width * height * 2) as usize;
    let packed = &buf[..buf.len().min(expected)];
    packed.iter().step_by(2).copied().collect()
}
