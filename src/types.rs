// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for the scan pipeline

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CENTER_INSET_PERCENT, REAR_LABEL_KEYWORDS};

/// Role hint for a camera, inferred from its label
///
/// Mobile and convertible devices usually expose the sensor position in the
/// device name. The hint drives camera preference only; it is never required
/// to be accurate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraRole {
    /// User-facing camera
    Front,
    /// World-facing camera, preferred for barcode scanning
    Rear,
    /// No position information in the label
    #[default]
    Unknown,
}

impl CameraRole {
    /// Infer the role from a human-readable device label
    pub fn from_label(label: &str) -> Self {
        let lower = label.to_lowercase();
        if REAR_LABEL_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            CameraRole::Rear
        } else if lower.contains("front") {
            CameraRole::Front
        } else {
            CameraRole::Unknown
        }
    }
}

impl std::fmt::Display for CameraRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraRole::Front => write!(f, "front"),
            CameraRole::Rear => write!(f, "rear"),
            CameraRole::Unknown => write!(f, "unknown"),
        }
    }
}

/// Represents a video input device
///
/// Enumerated once per session start and discarded when the session ends;
/// device availability can change between scans, so lists are never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    /// Opaque device handle (e.g., /dev/video0)
    pub path: String,
    /// Human-readable label
    pub label: String,
    /// Position hint inferred from the label
    pub role: CameraRole,
}

impl CameraDevice {
    /// Create a device, inferring the role from the label
    pub fn new(path: impl Into<String>, label: impl Into<String>) -> Self {
        let label = label.into();
        let role = CameraRole::from_label(&label);
        Self {
            path: path.into(),
            label,
            role,
        }
    }
}

impl std::fmt::Display for CameraDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.label, self.path)
    }
}

/// Barcode encoding standard the pipeline can be configured to recognize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symbology {
    /// EAN-13, the common retail product code
    Ean13,
    /// EAN-8, short-form retail code
    Ean8,
    /// UPC-A
    UpcA,
    /// UPC-E
    UpcE,
    /// QR code
    QrCode,
    /// Sentinel for values entered through the fallback entry path
    Manual,
}

impl std::fmt::Display for Symbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbology::Ean13 => write!(f, "EAN-13"),
            Symbology::Ean8 => write!(f, "EAN-8"),
            Symbology::UpcA => write!(f, "UPC-A"),
            Symbology::UpcE => write!(f, "UPC-E"),
            Symbology::QrCode => write!(f, "QR"),
            Symbology::Manual => write!(f, "manual"),
        }
    }
}

/// A decoded barcode value plus the symbology that matched
///
/// Produced either by a decode engine or by the fallback entry path; hosts
/// consume both through the same contract and never branch on origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResult {
    /// The decoded barcode string, never empty
    pub value: String,
    /// Which symbology matched
    pub symbology: Symbology,
}

impl DetectionResult {
    pub fn new(value: impl Into<String>, symbology: Symbology) -> Self {
        Self {
            value: value.into(),
            symbology,
        }
    }
}

impl std::fmt::Display for DetectionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.value, self.symbology)
    }
}

/// Which part of the frame the decode engine searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScanRegion {
    /// Search the entire frame
    #[default]
    FullFrame,
    /// Search a centered window, insetting the given percentage on each edge
    CenterCrop {
        /// Percentage of width/height trimmed from each edge (0-49)
        inset_percent: u8,
    },
}

impl ScanRegion {
    /// Centered crop with the default inset
    pub fn center() -> Self {
        ScanRegion::CenterCrop {
            inset_percent: DEFAULT_CENTER_INSET_PERCENT,
        }
    }

    /// Resolve the region to pixel bounds `(x, y, width, height)` for a frame
    ///
    /// Insets of 50% or more would produce an empty window and are clamped
    /// down to keep at least a 2% slice of the frame.
    pub fn bounds(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        match self {
            ScanRegion::FullFrame => (0, 0, width, height),
            ScanRegion::CenterCrop { inset_percent } => {
                let inset = (*inset_percent).min(49) as u32;
                let x = width * inset / 100;
                let y = height * inset / 100;
                let w = width - 2 * x;
                let h = height - 2 * y;
                (x, y, w.max(1), h.max(1))
            }
        }
    }
}
