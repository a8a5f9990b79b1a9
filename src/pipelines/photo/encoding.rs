// SPDX-License-Identifier: GPL-3.0-only

//! Async photo encoding
//!
//! - JPEG (with quality control)
//! - PNG (lossless, keeps alpha)
//!
//! Encoding runs on the blocking pool so the caller's task is never stalled.

use super::resources::Tracked;
use crate::config::{PhotoOutputFormat, PhotoQuality};
use crate::errors::{PipelineError, PipelineResult};
use crate::storage::MediaType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::{debug, info};

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingFormat {
    /// JPEG format (lossy compression)
    Jpeg,
    /// PNG format (lossless compression)
    Png,
}

impl EncodingFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "jpg",
            EncodingFormat::Png => "png",
        }
    }

    pub fn media_type(&self) -> MediaType {
        match self {
            EncodingFormat::Jpeg => MediaType::Jpeg,
            EncodingFormat::Png => MediaType::Png,
        }
    }

    /// Whether the format stores an alpha channel
    pub fn supports_alpha(&self) -> bool {
        matches!(self, EncodingFormat::Png)
    }
}

impl From<PhotoOutputFormat> for EncodingFormat {
    fn from(format: PhotoOutputFormat) -> Self {
        match format {
            PhotoOutputFormat::Jpeg => EncodingFormat::Jpeg,
            PhotoOutputFormat::Png => EncodingFormat::Png,
        }
    }
}

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression)
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }
}

impl From<PhotoQuality> for EncodingQuality {
    fn from(quality: PhotoQuality) -> Self {
        match quality {
            PhotoQuality::Low => EncodingQuality::Low,
            PhotoQuality::Medium => EncodingQuality::Medium,
            PhotoQuality::High => EncodingQuality::High,
            PhotoQuality::Maximum => EncodingQuality::Maximum,
        }
    }
}

/// Encoded image data ready for saving
#[derive(Debug)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub format: EncodingFormat,
    pub width: u32,
    pub height: u32,
}

/// Photo encoder
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    format: EncodingFormat,
    quality: EncodingQuality,
}

impl PhotoEncoder {
    /// Create a new encoder with JPEG format and high quality
    pub fn new() -> Self {
        Self {
            format: EncodingFormat::Jpeg,
            quality: EncodingQuality::High,
        }
    }

    pub fn with_settings(format: EncodingFormat, quality: EncodingQuality) -> Self {
        Self { format, quality }
    }

    pub fn format(&self) -> EncodingFormat {
        self.format
    }

    /// Encode a snapshot on the blocking pool
    ///
    /// The snapshot is released as soon as encoding finishes, on success or
    /// failure.
    pub async fn encode(&self, snapshot: Tracked<DynamicImage>) -> PipelineResult<EncodedImage> {
        info!(
            width = snapshot.width(),
            height = snapshot.height(),
            format = ?self.format,
            "Starting encoding"
        );

        let format = self.format;
        let quality = self.quality;

        tokio::task::spawn_blocking(move || {
            let (width, height) = (snapshot.width(), snapshot.height());
            let data = match format {
                EncodingFormat::Jpeg => Self::encode_jpeg(&snapshot, quality)?,
                EncodingFormat::Png => Self::encode_png(&snapshot)?,
            };
            drop(snapshot);

            debug!(size = data.len(), "Encoding complete");

            Ok(EncodedImage {
                data,
                format,
                width,
                height,
            })
        })
        .await?
    }

    /// Encode image as JPEG
    fn encode_jpeg(image: &DynamicImage, quality: EncodingQuality) -> PipelineResult<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        let rgb = image.to_rgb8();

        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, quality.jpeg_quality());

        encoder
            .encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )
            .map_err(|e| PipelineError::Encode(format!("JPEG encoding failed: {}", e)))?;

        Ok(buffer)
    }

    /// Encode image as PNG
    fn encode_png(image: &DynamicImage) -> PipelineResult<Vec<u8>> {
        let mut buffer = Vec::new();

        image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| PipelineError::Encode(format!("PNG encoding failed: {}", e)))?;

        Ok(buffer)
    }
}

impl Default for PhotoEncoder {
    fn default() -> Self {
        Self::new()
    }
}
