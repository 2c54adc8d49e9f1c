// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands, acting as a reference host for the scan pipeline
//!
//! - Listing available cameras
//! - Running a live scan session
//! - Manual barcode entry

use std::sync::Arc;

use barscan::manual::{self, StdinPrompt};
use barscan::source::CameraSource;
use barscan::source::v4l2::V4l2Source;
use barscan::{ScanConfig, ScanController, ScanRegion, SessionOutcome};

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = V4l2Source.list_cameras()?;

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {} ({})", index, camera.label, camera.path);
        println!("      Role: {}", camera.role);
    }

    Ok(())
}

/// Run one scan session against the selected camera
///
/// A decoded value is printed to stdout. On failure the user is offered
/// manual entry, so the command always ends with either a value or an
/// explicit cancellation.
pub fn run_scan(camera: Option<String>, center: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ScanConfig::load();
    if center {
        config.scan_region = ScanRegion::center();
    }

    let preferred = camera.or_else(|| config.last_camera_path.clone());
    let mut controller = ScanController::new(Arc::new(V4l2Source), config.engine_options())
        .with_preferred_camera(preferred);

    // Ctrl-C maps to the host's close intent, not process death
    let close = controller.close_handle();
    ctrlc::set_handler(move || close.close())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    println!("Point the camera at the barcode. Press Ctrl-C to cancel.");
    let outcome = runtime.block_on(controller.run());

    match outcome {
        SessionOutcome::Detected(result) => {
            println!("{}", result);
            if let Some(device) = controller.active_device() {
                config.last_camera_path = Some(device.path.clone());
                if let Err(e) = config.save() {
                    eprintln!("Warning: could not save config: {}", e);
                }
            }
            Ok(())
        }
        SessionOutcome::Cancelled => {
            println!("Scan cancelled.");
            Ok(())
        }
        SessionOutcome::Failed(error) => {
            eprintln!("Scan failed: {}", error);
            if error.suggests_manual_entry() {
                eprintln!("Check that a camera is connected and accessible.");
            }
            // Every failure offers the fallback entry path
            match manual::request_manual_value(&mut StdinPrompt) {
                Some(result) => {
                    println!("{}", result);
                    Ok(())
                }
                None => {
                    println!("Scan cancelled.");
                    Ok(())
                }
            }
        }
    }
}

/// Manual barcode entry without touching the camera
pub fn manual_entry() -> Result<(), Box<dyn std::error::Error>> {
    match manual::request_manual_value(&mut StdinPrompt) {
        Some(result) => println!("{}", result),
        None => println!("Entry cancelled."),
    }
    Ok(())
}
