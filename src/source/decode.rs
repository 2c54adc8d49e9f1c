// SPDX-License-Identifier: GPL-3.0-only

//! Frame decoding
//!
//! Converts captured luma frames into decoded barcode values. Frames are
//! cropped to the configured scan region and downscaled before detection to
//! keep per-frame cost bounded at camera rates.

use image::GrayImage;
use tracing::{debug, trace};

use crate::constants::DECODE_MAX_DIMENSION;
use crate::source::EngineOptions;
use crate::types::{DetectionResult, ScanRegion, Symbology};

/// Decodes barcode content from grayscale frames
///
/// The detection stack is QR-based; when the requested symbology set does
/// not include [`Symbology::QrCode`] the decoder recognizes nothing and
/// every frame passes through undetected.
pub struct FrameDecoder {
    region: ScanRegion,
    decode_qr: bool,
    max_dimension: u32,
}

impl FrameDecoder {
    pub fn new(options: &EngineOptions) -> Self {
        Self {
            region: options.region,
            decode_qr: options.symbologies.contains(&Symbology::QrCode),
            max_dimension: DECODE_MAX_DIMENSION,
        }
    }

    /// Attempt to decode one frame of 8-bit luma data
    ///
    /// `luma` must hold `width * height` bytes. Returns the first decoded
    /// value, if any.
    pub fn decode_luma(&self, luma: &[u8], width: u32, height: u32) -> Option<DetectionResult> {
        if !self.decode_qr {
            return None;
        }
        if luma.len() < (width as usize) * (height as usize) {
            debug!(
                len = luma.len(),
                width, height, "Frame shorter than dimensions, skipping"
            );
            return None;
        }

        let start = std::time::Instant::now();

        let (x, y, w, h) = self.region.bounds(width, height);
        let cropped = crop_luma(luma, width, x, y, w, h);

        // Downscale large frames; codes big enough to scan survive it
        let (scaled, sw, sh) = if w > self.max_dimension || h > self.max_dimension {
            let scale = (w as f32 / self.max_dimension as f32)
                .max(h as f32 / self.max_dimension as f32);
            let dw = (w as f32 / scale) as u32;
            let dh = (h as f32 / scale) as u32;
            (downscale_luma(&cropped, w, h, dw, dh), dw, dh)
        } else {
            (cropped, w, h)
        };

        let img = GrayImage::from_raw(sw, sh, scaled)?;
        let mut prepared = rqrr::PreparedImage::prepare(img);
        let grids = prepared.detect_grids();
        trace!(
            grids = grids.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "Frame analyzed"
        );

        for grid in grids {
            match grid.decode() {
                Ok((_meta, content)) if !content.trim().is_empty() => {
                    debug!(content = %content, "Decoded code from frame");
                    return Some(DetectionResult::new(content, Symbology::QrCode));
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "Grid detected but decode failed"),
            }
        }
        None
    }
}

/// Extract a window from a packed luma buffer
fn crop_luma(luma: &[u8], stride: u32, x: u32, y: u32, w: u32, h: u32) -> Vec<u8> {
    let stride = stride as usize;
    let (x, w) = (x as usize, w as usize);
    let mut out = Vec::with_capacity(w * h as usize);
    for row in y..(y + h) {
        let start = row as usize * stride + x;
        let end = start + w;
        if end <= luma.len() {
            out.extend_from_slice(&luma[start..end]);
        }
    }
    out
}

/// Nearest-neighbour downscale; adequate for detection input
fn downscale_luma(luma: &[u8], src_w: u32, src_h: u32, dst_w: u32, dst_h: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity((dst_w * dst_h) as usize);
    for y in 0..dst_h {
        let sy = (y as u64 * src_h as u64 / dst_h as u64) as usize;
        for x in 0..dst_w {
            let sx = (x as u64 * src_w as u64 / dst_w as u64) as usize;
            out.push(
                luma.get(sy * src_w as usize + sx)
                    .copied()
                    .unwrap_or(0),
            );
        }
    }
    out
}
