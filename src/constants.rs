// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Target frame rate for live preview
pub const DEFAULT_TARGET_FPS: f64 = 30.0;

/// Live preview resolution bound
///
/// Kept well below sensor-native resolution so the per-pixel kernel fits in
/// one inter-frame interval.
pub const LIVE_MAX_WIDTH: u32 = 854;
pub const LIVE_MAX_HEIGHT: u32 = 480;

/// Longest side of the working surface for captured photos
pub const PROCESSING_CEILING: u32 = 1920;

/// Rough per-pixel cost of the kernel on a single core, used for budget checks
pub const KERNEL_NS_PER_PIXEL: f64 = 25.0;

/// How long the frame loop waits for a frame before re-checking its stop signal
pub const FRAME_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Prefix for temporary and saved photo files
pub const FILE_PREFIX: &str = "tritan";

/// Subdirectory of the pictures directory used by the default photo library
pub const LIBRARY_SUBDIR: &str = "tritan";

/// sRGB transfer function breakpoints (IEC 61966-2-1)
pub mod srgb {
    pub const DECODE_THRESHOLD: f32 = 0.04045;
    pub const ENCODE_THRESHOLD: f32 = 0.003_130_8;
    pub const LINEAR_SLOPE: f32 = 12.92;
    pub const OFFSET: f32 = 0.055;
    pub const SCALE: f32 = 1.055;
    pub const GAMMA: f32 = 2.4;
}
