// SPDX-License-Identifier: GPL-3.0-only

//! Tritanopia simulation kernel
//!
//! Four fidelity tiers share one contract: gamma-encoded RGBA in, gamma-encoded
//! RGBA out, alpha untouched, RGB within [0, 1]. They trade accuracy against
//! per-pixel cost and are not expected to agree pixel for pixel.
//!
//! ```text
//! Brettel / Mean:  sRGB -> linear -> LMS -> rebuild S -> linear -> clamp -> sRGB
//! LinearMatrix:    sRGB -> linear -> 3x3 -> clamp -> sRGB
//! GammaAffine:     sRGB -> 4x5 affine -> clamp
//! ```

use super::matrices::{
    self, BRETTEL_ANCHOR_CYAN, BRETTEL_ANCHOR_RED, GAMMA_TRITAN, LINEAR_TRITAN, LMS_TO_RGB,
    RGB_TO_LMS,
};
use super::transfer::{self, LinearRgb, Srgb};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Simulation quality/cost tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SimulationFidelity {
    /// Piecewise projection onto two half-planes in LMS space
    #[default]
    Brettel,
    /// Short-cone response replaced by the mean of long and medium
    ///
    /// White's S is not the mean of its L and M, so grays pick a slight tint.
    Mean,
    /// Single linear-light 3x3 matrix
    LinearMatrix,
    /// Single gamma-space affine matrix, cheapest
    GammaAffine,
}

impl SimulationFidelity {
    pub const ALL: [SimulationFidelity; 4] = [
        SimulationFidelity::Brettel,
        SimulationFidelity::Mean,
        SimulationFidelity::LinearMatrix,
        SimulationFidelity::GammaAffine,
    ];

    fn index(self) -> usize {
        match self {
            SimulationFidelity::Brettel => 0,
            SimulationFidelity::Mean => 1,
            SimulationFidelity::LinearMatrix => 2,
            SimulationFidelity::GammaAffine => 3,
        }
    }

    /// Whether this tier works in linear light
    pub fn is_linear(self) -> bool {
        !matches!(self, SimulationFidelity::GammaAffine)
    }
}

impl std::fmt::Display for SimulationFidelity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationFidelity::Brettel => write!(f, "Brettel"),
            SimulationFidelity::Mean => write!(f, "LMS mean"),
            SimulationFidelity::LinearMatrix => write!(f, "Linear matrix"),
            SimulationFidelity::GammaAffine => write!(f, "Gamma affine"),
        }
    }
}

/// Half-plane normals for the Brettel projection, in LMS
#[derive(Debug, Clone, Copy)]
struct BrettelPlanes {
    /// LMS of linear white
    white: [f32; 3],
    /// Plane through white and the cyan anchor
    cyan_normal: [f32; 3],
    /// Plane through white and the red anchor
    red_normal: [f32; 3],
}

impl BrettelPlanes {
    fn new() -> Self {
        let white = matrices::mul_vec(&RGB_TO_LMS, [1.0, 1.0, 1.0]);
        let cyan = matrices::mul_vec(&RGB_TO_LMS, BRETTEL_ANCHOR_CYAN);
        let red = matrices::mul_vec(&RGB_TO_LMS, BRETTEL_ANCHOR_RED);
        Self {
            white,
            cyan_normal: matrices::cross(white, cyan),
            red_normal: matrices::cross(white, red),
        }
    }

    /// S response on the half-plane that owns `(l, m)`
    ///
    /// The side is decided by the plane through white and the S axis, so it
    /// never depends on the S value being replaced.
    #[inline]
    fn project_s(&self, l: f32, m: f32) -> f32 {
        let side = self.white[1] * l - self.white[0] * m;
        let n = if side <= 0.0 {
            &self.cyan_normal
        } else {
            &self.red_normal
        };
        -(n[0] * l + n[1] * m) / n[2]
    }
}

/// Stateless per-pixel tritanopia kernel
///
/// Construction precomputes the Brettel planes and an 8-bit decode table;
/// after that the kernel is read-only and can be shared across threads.
#[derive(Debug, Clone)]
pub struct TritanKernel {
    fidelity: SimulationFidelity,
    planes: BrettelPlanes,
    decode_lut: [f32; 256],
}

static SHARED: LazyLock<[TritanKernel; 4]> =
    LazyLock::new(|| SimulationFidelity::ALL.map(TritanKernel::new));

impl TritanKernel {
    pub fn new(fidelity: SimulationFidelity) -> Self {
        Self {
            fidelity,
            planes: BrettelPlanes::new(),
            decode_lut: transfer::decode_table(),
        }
    }

    /// Process-wide kernel for a tier, built once on first use
    pub fn shared(fidelity: SimulationFidelity) -> &'static TritanKernel {
        &SHARED[fidelity.index()]
    }

    pub fn fidelity(&self) -> SimulationFidelity {
        self.fidelity
    }

    /// Simulate one gamma-encoded color
    pub fn simulate(&self, color: Srgb) -> Srgb {
        match self.fidelity {
            SimulationFidelity::GammaAffine => simulate_gamma_affine(color),
            _ => self.simulate_linear(color.to_linear()).to_srgb(),
        }
    }

    /// Simulate one linear-light color
    ///
    /// The linear tiers leave the result unclamped. The gamma tier encodes,
    /// applies its affine map and decodes again, so its result is in range.
    pub fn simulate_linear(&self, color: LinearRgb) -> LinearRgb {
        let rgb = color.rgb();
        let out = match self.fidelity {
            SimulationFidelity::Brettel => {
                let [l, m, _] = matrices::mul_vec(&RGB_TO_LMS, rgb);
                matrices::mul_vec(&LMS_TO_RGB, [l, m, self.planes.project_s(l, m)])
            }
            SimulationFidelity::Mean => {
                let [l, m, _] = matrices::mul_vec(&RGB_TO_LMS, rgb);
                matrices::mul_vec(&LMS_TO_RGB, [l, m, (l + m) * 0.5])
            }
            SimulationFidelity::LinearMatrix => matrices::mul_vec(&LINEAR_TRITAN, rgb),
            SimulationFidelity::GammaAffine => {
                return simulate_gamma_affine(color.to_srgb()).to_linear();
            }
        };
        color.with_rgb(out)
    }

    /// Simulate one packed 8-bit RGBA pixel
    #[inline]
    pub fn simulate_rgba8(&self, px: [u8; 4]) -> [u8; 4] {
        if self.fidelity.is_linear() {
            let linear = LinearRgb {
                r: self.decode_lut[px[0] as usize],
                g: self.decode_lut[px[1] as usize],
                b: self.decode_lut[px[2] as usize],
                a: 0.0,
            };
            let mut out = self.simulate_linear(linear).to_srgb().to_rgba8();
            out[3] = px[3];
            out
        } else {
            let mut out = simulate_gamma_affine(Srgb::from_rgba8(px)).to_rgba8();
            out[3] = px[3];
            out
        }
    }

    /// Filter packed RGBA8 pixels in place on the calling thread
    ///
    /// Trailing bytes that do not form a whole pixel are left untouched.
    pub fn apply_rgba8(&self, pixels: &mut [u8]) {
        let whole = pixels.len() / 4 * 4;
        let texels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut pixels[..whole]);
        for px in texels {
            *px = self.simulate_rgba8(*px);
        }
    }

    /// Filter packed RGBA8 pixels in place using the rayon pool
    pub fn apply_rgba8_par(&self, pixels: &mut [u8]) {
        pixels.par_chunks_exact_mut(4 * 1024).for_each(|chunk| {
            self.apply_rgba8(chunk);
        });
        let tail = pixels.len() / (4 * 1024) * (4 * 1024);
        self.apply_rgba8(&mut pixels[tail..]);
    }
}

#[inline]
fn simulate_gamma_affine(color: Srgb) -> Srgb {
    let out = matrices::apply_color_matrix(&GAMMA_TRITAN, [color.r, color.g, color.b, color.a]);
    Srgb {
        r: out[0].clamp(0.0, 1.0),
        g: out[1].clamp(0.0, 1.0),
        b: out[2].clamp(0.0, 1.0),
        a: color.a,
    }
}
