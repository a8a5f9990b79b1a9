// SPDX-License-Identifier: GPL-3.0-only

//! Decoding, sizing and the fused resize + filter draw
//!
//! The capture path never builds a full-resolution filtered buffer: the
//! decoded source is drawn straight into a bounded render target, and the
//! kernel runs on each destination pixel as it is produced.

use super::resources::{ResourceKind, ResourceLedger, Tracked};
use crate::errors::{PipelineError, PipelineResult};
use crate::filters::{LinearRgb, Paint, transfer};
use image::{DynamicImage, ImageReader, Limits, RgbaImage};
use rayon::prelude::*;
use std::io::Cursor;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static DECODE_LUT: LazyLock<[f32; 256]> = LazyLock::new(transfer::decode_table);

/// Scale `(width, height)` down so neither side exceeds `ceiling`
///
/// Aspect ratio is preserved to within rounding; images already inside the
/// ceiling are returned unchanged, never scaled up.
pub fn bounded_size(width: u32, height: u32, ceiling: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= ceiling || longest == 0 {
        return (width, height);
    }
    let scale = ceiling as f64 / longest as f64;
    scale_dimensions(width, height, scale)
}

/// Largest size with the source aspect ratio that fits the box (may scale up)
pub fn fit_size(width: u32, height: u32, box_width: u32, box_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }
    let scale = (box_width as f64 / width as f64).min(box_height as f64 / height as f64);
    scale_dimensions(width, height, scale)
}

fn scale_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    (w, h)
}

fn limits(memory_limit: Option<u64>) -> Limits {
    let mut limits = Limits::default();
    limits.max_alloc = memory_limit;
    limits
}

/// Decode an encoded photo from disk to RGBA
pub fn decode_path(
    path: &Path,
    memory_limit: Option<u64>,
    ledger: &ResourceLedger,
) -> PipelineResult<Tracked<RgbaImage>> {
    let mut reader = ImageReader::open(path)?.with_guessed_format()?;
    reader.limits(limits(memory_limit));
    track_decoded(reader.decode()?, ledger)
}

/// Decode an encoded photo from memory to RGBA
pub fn decode_bytes(
    bytes: &[u8],
    memory_limit: Option<u64>,
    ledger: &ResourceLedger,
) -> PipelineResult<Tracked<RgbaImage>> {
    let mut reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    reader.limits(limits(memory_limit));
    track_decoded(reader.decode()?, ledger)
}

fn track_decoded(
    image: DynamicImage,
    ledger: &ResourceLedger,
) -> PipelineResult<Tracked<RgbaImage>> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PipelineError::Decode("image has no pixels".to_string()));
    }
    let rgba = image.into_rgba8();
    debug!(width = rgba.width(), height = rgba.height(), "Decoded source image");
    let bytes = rgba.as_raw().len();
    Ok(ledger.track(ResourceKind::DecodedSource, rgba, bytes))
}

/// Off-screen RGBA surface
#[derive(Debug)]
pub struct RenderTarget {
    pub width: u32,
    pub height: u32,
    pixels: Vec<u8>,
}

impl RenderTarget {
    /// Allocate a cleared surface, failing instead of aborting on memory pressure
    pub fn allocate(
        width: u32,
        height: u32,
        memory_limit: Option<u64>,
        ledger: &ResourceLedger,
    ) -> PipelineResult<Tracked<RenderTarget>> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| {
                PipelineError::Allocation(format!("{}x{} surface is too large", width, height))
            })?;

        if let Some(limit) = memory_limit
            && len as u64 > limit
        {
            return Err(PipelineError::Allocation(format!(
                "{}x{} surface needs {} bytes, limit is {}",
                width, height, len, limit
            )));
        }

        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|e| PipelineError::Allocation(e.to_string()))?;
        pixels.resize(len, 0);

        Ok(ledger.track(
            ResourceKind::RenderTarget,
            RenderTarget {
                width,
                height,
                pixels,
            },
            len,
        ))
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Fused resize + filter of `source` into this target
    pub fn draw(&mut self, source: &RgbaImage, paint: &Paint<'_>) {
        draw_scaled(source, &mut self.pixels, self.width, self.height, paint);
    }

    /// Read the rendered pixels back as an image for encoding
    ///
    /// Alpha is dropped when the output format cannot carry it.
    pub fn snapshot(
        &self,
        keep_alpha: bool,
        ledger: &ResourceLedger,
    ) -> PipelineResult<Tracked<DynamicImage>> {
        let rgba = RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| PipelineError::Encode("render target size mismatch".to_string()))?;
        let image = if keep_alpha {
            DynamicImage::ImageRgba8(rgba)
        } else {
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).into_rgb8())
        };
        let bytes = image.as_bytes().len();
        Ok(ledger.track(ResourceKind::Snapshot, image, bytes))
    }
}

/// Source span covered by each destination index along one axis
fn spans(src_len: u32, dst_len: u32) -> Vec<(usize, usize)> {
    let scale = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|i| {
            if scale <= 1.0 {
                // Upscaling: nearest source pixel to the destination center
                let c = (((i as f64 + 0.5) * scale) as usize).min(src_len as usize - 1);
                (c, c + 1)
            } else {
                let start = ((i as f64 * scale) as usize).min(src_len as usize - 1);
                let end = (((i + 1) as f64 * scale) as usize).clamp(start + 1, src_len as usize);
                (start, end)
            }
        })
        .collect()
}

/// Draw `source` into a `width`x`height` RGBA buffer, shading with `paint`
///
/// Each destination pixel is the box average of the source pixels it covers,
/// taken in linear light, passed through the kernel before it is stored.
/// Alpha is averaged as stored. Rows are produced in parallel.
pub fn draw_scaled(source: &RgbaImage, dst: &mut [u8], width: u32, height: u32, paint: &Paint<'_>) {
    if width == 0 || height == 0 || source.width() == 0 || source.height() == 0 {
        return;
    }
    let columns = spans(source.width(), width);
    let rows = spans(source.height(), height);
    let src = source.as_raw();
    let src_stride = source.width() as usize * 4;
    let row_bytes = width as usize * 4;
    let lut = &*DECODE_LUT;

    dst.par_chunks_exact_mut(row_bytes)
        .zip(rows.par_iter())
        .for_each(|(out_row, &(y0, y1))| {
            for (out_px, &(x0, x1)) in out_row.chunks_exact_mut(4).zip(columns.iter()) {
                let mut light = [0f32; 3];
                let mut alpha = 0u64;
                for y in y0..y1 {
                    let line = &src[y * src_stride + x0 * 4..y * src_stride + x1 * 4];
                    for px in line.chunks_exact(4) {
                        for c in 0..3 {
                            light[c] += lut[px[c] as usize];
                        }
                        alpha += px[3] as u64;
                    }
                }
                let count = ((y1 - y0) * (x1 - x0)) as u64;
                let n = count as f32;
                let mut avg = LinearRgb {
                    r: light[0] / n,
                    g: light[1] / n,
                    b: light[2] / n,
                    a: 0.0,
                }
                .to_srgb()
                .to_rgba8();
                avg[3] = ((alpha + count / 2) / count) as u8;
                out_px.copy_from_slice(&paint.shade(avg));
            }
        });
}
