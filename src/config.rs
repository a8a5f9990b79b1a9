// SPDX-License-Identifier: GPL-3.0-only

//! Runtime configuration
//!
//! Configuration lives in memory only; the embedding application builds it
//! (or deserializes it from wherever it keeps settings) and hands it in.

use crate::constants::{
    DEFAULT_TARGET_FPS, KERNEL_NS_PER_PIXEL, LIVE_MAX_HEIGHT, LIVE_MAX_WIDTH, PROCESSING_CEILING,
};
use crate::filters::SimulationFidelity;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Output format for captured photos
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum PhotoOutputFormat {
    #[default]
    Jpeg,
    Png,
}

/// JPEG quality preset
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum PhotoQuality {
    Low,
    Medium,
    #[default]
    High,
    Maximum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Live preview frame rate target
    pub target_fps: f64,
    /// Live preview resolution bound
    pub live_max_width: u32,
    pub live_max_height: u32,
    /// Longest side of the working surface for captured photos
    pub processing_ceiling: u32,
    /// Kernel cost estimate used for frame budget checks
    pub kernel_ns_per_pixel: f64,
    /// Simulation tier for live frames
    pub live_fidelity: SimulationFidelity,
    /// Simulation tier for gallery previews and captured photos
    pub still_fidelity: SimulationFidelity,
    pub output_format: PhotoOutputFormat,
    pub output_quality: PhotoQuality,
    /// Where filtered photos are staged before the library takes them;
    /// `None` uses the system temporary directory
    pub temp_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            live_max_width: LIVE_MAX_WIDTH,
            live_max_height: LIVE_MAX_HEIGHT,
            processing_ceiling: PROCESSING_CEILING,
            kernel_ns_per_pixel: KERNEL_NS_PER_PIXEL,
            live_fidelity: SimulationFidelity::Brettel,
            still_fidelity: SimulationFidelity::Brettel,
            output_format: PhotoOutputFormat::default(),
            output_quality: PhotoQuality::default(),
            temp_dir: None,
        }
    }
}

impl Config {
    /// Replace nonsensical values with defaults
    pub fn validated(mut self) -> Self {
        let defaults = Config::default();
        if !(self.target_fps.is_finite() && self.target_fps > 0.0) {
            warn!(target_fps = self.target_fps, "Invalid target fps, using default");
            self.target_fps = defaults.target_fps;
        }
        if self.live_max_width == 0 || self.live_max_height == 0 {
            warn!("Invalid live preview bound, using default");
            self.live_max_width = defaults.live_max_width;
            self.live_max_height = defaults.live_max_height;
        }
        if self.processing_ceiling == 0 {
            warn!("Invalid processing ceiling, using default");
            self.processing_ceiling = defaults.processing_ceiling;
        }
        if !(self.kernel_ns_per_pixel.is_finite() && self.kernel_ns_per_pixel >= 0.0) {
            self.kernel_ns_per_pixel = defaults.kernel_ns_per_pixel;
        }
        self
    }

    /// Staging directory for filtered photos
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.target_fps, 30.0);
        assert_eq!((config.live_max_width, config.live_max_height), (854, 480));
        assert_eq!(config.processing_ceiling, 1920);
        assert_eq!(config.output_format, PhotoOutputFormat::Jpeg);
    }

    #[test]
    fn test_validated_replaces_nonsense() {
        let config = Config {
            target_fps: f64::NAN,
            live_max_width: 0,
            processing_ceiling: 0,
            kernel_ns_per_pixel: -1.0,
            ..Config::default()
        }
        .validated();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"target_fps": 24.0, "still_fidelity": "GammaAffine"}"#)
                .unwrap();
        assert_eq!(config.target_fps, 24.0);
        assert_eq!(config.still_fidelity, SimulationFidelity::GammaAffine);
        assert_eq!(config.processing_ceiling, PROCESSING_CEILING);
    }

    #[test]
    fn test_temp_dir_fallback() {
        assert_eq!(Config::default().temp_dir(), std::env::temp_dir());
    }
}
