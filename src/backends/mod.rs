// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera access
//!
//! - [`camera`]: camera collaborator seam, operating-mode selection, frame
//!   lifecycle and the live frame loop

pub mod camera;
