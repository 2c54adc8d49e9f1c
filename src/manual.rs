// SPDX-License-Identifier: GPL-3.0-only

//! Fallback entry path
//!
//! Manual barcode entry used when camera access fails or is unavailable.
//! Produces the same [`DetectionResult`] contract as a decode engine, tagged
//! with the [`Symbology::Manual`] sentinel, so hosts never branch on origin.
//! Invalid input is treated as cancellation, never as an error and never as
//! an empty barcode value.

use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::types::{DetectionResult, Symbology};

/// Blocking prompt-style interaction, abstracted for testing
pub trait Prompt {
    /// Show the message and collect one line of input
    ///
    /// `Ok(None)` means the user dismissed the prompt (e.g. EOF).
    fn request(&mut self, message: &str) -> io::Result<Option<String>>;
}

/// Prompt reading from standard input
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn request(&mut self, message: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{}: ", message)?;
        stdout.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None); // EOF
        }
        Ok(Some(line))
    }
}

/// Request a barcode value through the fallback entry path
///
/// Returns `None` for cancellation: a dismissed prompt, an I/O problem, or
/// empty/whitespace-only input. Never returns an empty barcode value.
pub fn request_manual_value<P: Prompt>(prompt: &mut P) -> Option<DetectionResult> {
    let input = match prompt.request("Enter barcode manually") {
        Ok(Some(input)) => input,
        Ok(None) => {
            debug!("Manual entry dismissed");
            return None;
        }
        Err(e) => {
            debug!(error = %e, "Manual entry prompt failed, treating as cancelled");
            return None;
        }
    };

    let value = input.trim();
    if value.is_empty() {
        debug!("Empty manual entry treated as cancelled");
        return None;
    }

    Some(DetectionResult::new(value, Symbology::Manual))
}
