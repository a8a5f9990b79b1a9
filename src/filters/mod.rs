// SPDX-License-Identifier: GPL-3.0-only

//! Tritanopia color transform
//!
//! The kernel is shared by every path that shows or stores pixels: live
//! frames, gallery previews and captured photos all shade through a [`Paint`]
//! bound to a [`TritanKernel`].

pub mod matrices;
pub mod paint;
pub mod transfer;
pub mod tritan;

pub use paint::Paint;
pub use transfer::{LinearRgb, Srgb};
pub use tritan::{SimulationFidelity, TritanKernel};
