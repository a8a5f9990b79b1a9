// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! The camera itself is an external collaborator. This module defines what
//! the pipelines need from it and the pieces that sit directly on that seam:
//!
//! ```text
//! ┌─────────────────────┐
//! │   CameraBackend     │  ← enumerate, capabilities, configure
//! └──────────┬──────────┘
//!            │ capabilities
//!            ▼
//! ┌─────────────────────┐
//! │  format_selection   │  ← operating mode, cached per session
//! └──────────┬──────────┘
//!            │ frames
//!            ▼
//! ┌─────────────────────┐
//! │ frame / frame_loop  │  ← scoped release, dedicated delivery thread
//! └─────────────────────┘
//! ```

pub mod format_selection;
pub mod frame;
pub mod frame_loop;
pub mod permissions;
pub mod types;

pub use format_selection::{
    FormatSelection, FormatSelectionCache, FrameBudget, select_camera, select_format,
};
pub use frame::{Frame, FrameGuard, FramePool, PoolStats, PooledFrame};
pub use frame_loop::{ChannelFrameSource, FrameLoopController, FramePoll, FrameSource};
pub use permissions::{PermissionGate, PermissionProvider, PermissionStatus, ScreenState};
pub use types::*;

use thiserror::Error;

/// Result type for camera backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Camera backend errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("No camera devices found")]
    NoCameraFound,
    #[error("Camera does not advertise any operating mode")]
    NoFormats,
    #[error("Camera rejected operating mode: {0}")]
    ConfigurationRejected(String),
    #[error("Camera permission denied")]
    PermissionDenied,
    #[error("Backend error: {0}")]
    Other(String),
}

/// What the pipelines need from the camera collaborator
pub trait CameraBackend: Send {
    /// Enumerate available cameras
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Advertised operating modes of a device, in the device's natural order
    fn capabilities(&self, device: &CameraDevice) -> Vec<CapabilityDescriptor>;

    /// Switch the device to an operating mode
    fn configure(&mut self, device: &CameraDevice, request: &OperatingModeRequest)
    -> BackendResult<()>;
}
