// SPDX-License-Identifier: GPL-3.0-only

//! Tritan Camera - tritanopia simulation for camera and gallery images
//!
//! Shows what a tritanope (no working short-wavelength cones) sees, on live
//! camera frames, on gallery previews and on captured photos.
//!
//! # Architecture
//!
//! - [`filters`]: the per-pixel color transform and the paint that carries it
//! - [`backends`]: camera collaborator traits, operating-mode selection, frame lifecycle
//! - [`pipelines`]: live frame processing and the still-image pipeline
//! - [`storage`]: temporary files and the photo library
//! - [`config`]: runtime configuration
//! - [`logging`]: tracing subscriber setup

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod filters;
pub mod logging;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use config::{Config, PhotoOutputFormat, PhotoQuality};
pub use errors::{FrameError, PipelineError, PipelineResult};
pub use filters::{Paint, SimulationFidelity, TritanKernel};
pub use pipelines::live::{FrameStreamProcessor, LiveSession, LiveState};
pub use pipelines::photo::{CaptureController, CaptureOutcome, CapturePipeline, PreviewImage};
pub use storage::{DirectoryLibrary, MediaType, PhotoLibrary};
