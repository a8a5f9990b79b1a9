// SPDX-License-Identifier: GPL-3.0-only

//! Paint handle passed to render and draw steps

use super::tritan::{SimulationFidelity, TritanKernel};

/// Attaches the tritan kernel to a render or draw operation
///
/// A paint borrows a kernel and is `Copy`, so one can be built per frame
/// without reconstructing any shader state.
#[derive(Debug, Clone, Copy)]
pub struct Paint<'k> {
    kernel: Option<&'k TritanKernel>,
}

impl<'k> Paint<'k> {
    /// Paint that applies the given kernel
    pub fn with_kernel(kernel: &'k TritanKernel) -> Self {
        Self {
            kernel: Some(kernel),
        }
    }

    /// Paint that draws pixels unchanged
    pub fn plain() -> Self {
        Self { kernel: None }
    }

    pub fn fidelity(&self) -> Option<SimulationFidelity> {
        self.kernel.map(TritanKernel::fidelity)
    }

    /// Shade one packed RGBA8 pixel
    #[inline]
    pub fn shade(&self, px: [u8; 4]) -> [u8; 4] {
        match self.kernel {
            Some(kernel) => kernel.simulate_rgba8(px),
            None => px,
        }
    }

    /// Shade a packed RGBA8 surface in place on the calling thread
    pub fn apply(&self, pixels: &mut [u8]) {
        if let Some(kernel) = self.kernel {
            kernel.apply_rgba8(pixels);
        }
    }
}

impl Paint<'static> {
    /// Paint bound to the process-wide kernel for a tier
    pub fn shared(fidelity: SimulationFidelity) -> Self {
        Self::with_kernel(TritanKernel::shared(fidelity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_paint_is_passthrough() {
        let mut pixels = vec![10u8, 20, 30, 40, 200, 100, 50, 255];
        let before = pixels.clone();
        Paint::plain().apply(&mut pixels);
        assert_eq!(pixels, before);
        assert_eq!(Paint::plain().fidelity(), None);
    }

    #[test]
    fn test_shared_paint_filters() {
        let paint = Paint::shared(SimulationFidelity::GammaAffine);
        assert_eq!(paint.fidelity(), Some(SimulationFidelity::GammaAffine));
        // Pure blue turns teal under the affine matrix
        let out = paint.shade([0, 0, 255, 77]);
        assert!(out[1] > 100 && out[2] > 100);
        assert_eq!(out[3], 77);
    }
}
