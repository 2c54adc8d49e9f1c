// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

use crate::types::Symbology;

/// Label substrings that mark a world-facing camera (matched case-insensitively)
pub const REAR_LABEL_KEYWORDS: [&str; 2] = ["back", "rear"];

/// Symbologies recognized when no configuration overrides them
///
/// The retail set covers the product barcodes the inventory tracker deals
/// with; QR is included so the bundled live engine participates out of the
/// box.
pub const DEFAULT_SYMBOLOGIES: [Symbology; 5] = [
    Symbology::Ean13,
    Symbology::Ean8,
    Symbology::UpcA,
    Symbology::UpcE,
    Symbology::QrCode,
];

/// Default inset for the centered scan window (percent per edge)
pub const DEFAULT_CENTER_INSET_PERCENT: u8 = 25;

/// Bound on the engine event channel; detections are sparse so a small
/// buffer is plenty, and back-pressure on a stalled host is desirable
pub const ENGINE_EVENT_CAPACITY: usize = 16;

/// Capture resolution requested from the camera
pub const CAPTURE_WIDTH: u32 = 640;
pub const CAPTURE_HEIGHT: u32 = 480;

/// Number of memory-mapped capture buffers
pub const CAPTURE_BUFFER_COUNT: u32 = 4;

/// Minimum time between decode attempts; frames arriving faster than this
/// are captured but not analyzed
pub const DECODE_SAMPLE_INTERVAL: Duration = Duration::from_millis(150);

/// Frames are downscaled to this maximum dimension before decoding
pub const DECODE_MAX_DIMENSION: u32 = 640;

/// Consecutive capture failures tolerated before the stream is declared dead
pub const MAX_CAPTURE_ERRORS: u32 = 10;
