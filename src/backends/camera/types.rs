// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use serde::{Deserialize, Serialize};

/// Which way a camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraPosition {
    #[default]
    Back,
    Front,
    External,
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDevice {
    /// Stable device identity (used to key the format selection cache)
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub position: CameraPosition,
}

/// One advertised camera operating mode
///
/// Collaborators report these with inconsistent field presence across
/// devices and OS versions; every absent field reads as 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapabilityDescriptor {
    #[serde(alias = "videoWidth")]
    pub width: u32,
    #[serde(alias = "videoHeight")]
    pub height: u32,
    #[serde(alias = "minFrameRate")]
    pub min_fps: f64,
    #[serde(alias = "maxFrameRate")]
    pub max_fps: f64,
}

impl CapabilityDescriptor {
    pub const fn new(width: u32, height: u32, min_fps: f64, max_fps: f64) -> Self {
        Self {
            width,
            height,
            min_fps,
            max_fps,
        }
    }

    /// Pixel count
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether `target` lies in `[min_fps, max_fps]`
    pub fn supports_fps(&self, target: f64) -> bool {
        self.min_fps <= target && target <= self.max_fps
    }

    /// Whether this is a fixed-rate mode running at exactly `target`
    pub fn is_fixed_rate_at(&self, target: f64) -> bool {
        self.min_fps == target && self.max_fps == target
    }

    pub fn fits_within(&self, max_width: u32, max_height: u32) -> bool {
        self.width <= max_width && self.height <= max_height
    }

    /// Parse a capability list as reported by the camera collaborator
    pub fn parse_list(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for CapabilityDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} @ {}-{}fps",
            self.width, self.height, self.min_fps, self.max_fps
        )
    }
}

/// Pixel layout requested from the camera
///
/// Planar chroma-subsampled layouts halve the bytes moved per frame, so they
/// come first in [`PixelFormat::PREFERENCE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Planar 4:2:0 (separate Y, U, V planes)
    Yuv420,
    /// Semi-planar 4:2:0 (Y plane + interleaved UV plane)
    Nv12,
    /// Packed 32-bit RGBA
    Rgba,
}

impl PixelFormat {
    pub const PREFERENCE: [PixelFormat; 3] =
        [PixelFormat::Yuv420, PixelFormat::Nv12, PixelFormat::Rgba];

    pub fn bytes_per_pixel(&self) -> f32 {
        match self {
            PixelFormat::Yuv420 | PixelFormat::Nv12 => 1.5,
            PixelFormat::Rgba => 4.0,
        }
    }

    pub fn is_chroma_subsampled(&self) -> bool {
        !matches!(self, PixelFormat::Rgba)
    }
}

/// Operating mode sent back to the camera collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingModeRequest {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Acceptable pixel formats, most preferred first
    pub pixel_formats: Vec<PixelFormat>,
}

impl std::fmt::Display for OperatingModeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} @ {}fps", self.width, self.height, self.fps)
    }
}
