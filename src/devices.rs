// SPDX-License-Identifier: GPL-3.0-only

//! Device enumeration and camera selection
//!
//! Enumeration walks `/sys/class/video4linux` for device labels and confirms
//! capture capability through a V4L2 querycap, skipping metadata-only nodes.
//! Selection prefers an explicitly requested device, then a rear-labelled
//! camera, then the first entry.

use std::io;
use std::path::Path;

use tracing::{debug, warn};
use v4l::capability::Flags;
use v4l::prelude::*;

use crate::errors::{ScanError, ScanResult};
use crate::types::{CameraDevice, CameraRole};

/// Enumerate V4L2 capture devices
///
/// Returns `Ok(vec![])` when no cameras are present. Fails with
/// [`ScanError::NoCameraAccess`] when the device class cannot be listed or
/// every present device refuses to open with a permission error.
pub fn enumerate_v4l2() -> ScanResult<Vec<CameraDevice>> {
    enumerate_v4l2_at("/sys/class/video4linux")
}

fn enumerate_v4l2_at(sysfs_root: &str) -> ScanResult<Vec<CameraDevice>> {
    let entries = match std::fs::read_dir(sysfs_root) {
        Ok(entries) => entries,
        // Missing class directory means no video subsystem at all, which is
        // "zero cameras", not a permission problem.
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(ScanError::NoCameraAccess(e.to_string())),
    };

    let mut names: Vec<String> = entries
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("video"))
        .collect();
    // Deterministic order: video0, video1, ...
    names.sort_by_key(|name| {
        name.trim_start_matches("video")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });

    let mut devices = Vec::new();
    let mut denied = 0usize;
    let mut candidates = 0usize;

    for name in names {
        let dev_path = format!("/dev/{}", name);
        candidates += 1;

        let dev = match Device::with_path(&dev_path) {
            Ok(dev) => dev,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                warn!(path = %dev_path, "Permission denied opening device");
                denied += 1;
                continue;
            }
            Err(e) => {
                debug!(path = %dev_path, error = %e, "Skipping unopenable device");
                continue;
            }
        };

        let caps = match dev.query_caps() {
            Ok(caps) => caps,
            Err(e) => {
                debug!(path = %dev_path, error = %e, "querycap failed");
                continue;
            }
        };
        if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
            debug!(path = %dev_path, "Not a capture device");
            continue;
        }

        // Prefer the sysfs name; fall back to the querycap card string.
        let label = read_sysfs_name(sysfs_root, &name).unwrap_or_else(|| caps.card.clone());

        debug!(path = %dev_path, label = %label, "Found capture device");
        devices.push(CameraDevice::new(dev_path, label));
    }

    if devices.is_empty() && denied > 0 && denied == candidates {
        return Err(ScanError::NoCameraAccess(format!(
            "all {} video devices refused to open",
            denied
        )));
    }

    Ok(devices)
}

/// Read the device label from sysfs (e.g. /sys/class/video4linux/video0/name)
fn read_sysfs_name(sysfs_root: &str, node: &str) -> Option<String> {
    let path = Path::new(sysfs_root).join(node).join("name");
    let name = std::fs::read_to_string(path).ok()?;
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Select the camera to scan with
///
/// A device whose path matches `preferred` wins; otherwise the first
/// rear-labelled device; otherwise the first entry. `None` for an empty list.
pub fn select_camera<'a>(
    devices: &'a [CameraDevice],
    preferred: Option<&str>,
) -> Option<&'a CameraDevice> {
    if let Some(path) = preferred
        && let Some(device) = devices.iter().find(|d| d.path == path)
    {
        return Some(device);
    }
    devices
        .iter()
        .find(|d| d.role == CameraRole::Rear)
        .or_else(|| devices.first())
}

/// Cycle to the device after `current` in enumeration order
///
/// Used by hosts that offer a camera-switch control. Wraps around; returns
/// `None` when the list is empty.
pub fn next_camera<'a>(devices: &'a [CameraDevice], current: &str) -> Option<&'a CameraDevice> {
    if devices.is_empty() {
        return None;
    }
    let index = devices.iter().position(|d| d.path == current);
    match index {
        Some(i) => devices.get((i + 1) % devices.len()),
        None => devices.first(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(path: &str, label: &str) -> CameraDevice {
        CameraDevice::new(path, label)
    }

    #[test]
    fn selects_back_camera_by_label() {
        let devices = vec![
            device("/dev/video0", "Front Camera"),
            device("/dev/video2", "Back Camera"),
        ];
        let selected = select_camera(&devices, None).unwrap();
        assert_eq!(selected.label, "Back Camera");
    }

    #[test]
    fn selects_first_without_role_hints() {
        let devices = vec![
            device("/dev/video0", "Camera 0"),
            device("/dev/video2", "Camera 1"),
        ];
        let selected = select_camera(&devices, None).unwrap();
        assert_eq!(selected.label, "Camera 0");
    }

    #[test]
    fn empty_list_selects_nothing() {
        assert!(select_camera(&[], None).is_none());
    }

    #[test]
    fn preferred_path_overrides_role() {
        let devices = vec![
            device("/dev/video0", "Front Camera"),
            device("/dev/video2", "Back Camera"),
        ];
        let selected = select_camera(&devices, Some("/dev/video0")).unwrap();
        assert_eq!(selected.path, "/dev/video0");
    }

    #[test]
    fn missing_preferred_falls_back_to_policy() {
        let devices = vec![
            device("/dev/video0", "Front Camera"),
            device("/dev/video2", "Back Camera"),
        ];
        let selected = select_camera(&devices, Some("/dev/video9")).unwrap();
        assert_eq!(selected.label, "Back Camera");
    }

    #[test]
    fn next_camera_cycles_and_wraps() {
        let devices = vec![
            device("/dev/video0", "Camera 0"),
            device("/dev/video2", "Camera 1"),
        ];
        assert_eq!(
            next_camera(&devices, "/dev/video0").unwrap().path,
            "/dev/video2"
        );
        assert_eq!(
            next_camera(&devices, "/dev/video2").unwrap().path,
            "/dev/video0"
        );
        assert_eq!(
            next_camera(&devices, "/dev/video7").unwrap().path,
            "/dev/video0"
        );
        assert!(next_camera(&[], "/dev/video0").is_none());
    }

    #[test]
    fn missing_sysfs_root_is_zero_cameras() {
        let result = enumerate_v4l2_at("/nonexistent/video4linux");
        assert_eq!(result, Ok(Vec::new()));
    }
}
