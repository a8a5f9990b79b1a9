// SPDX-License-Identifier: GPL-3.0-only

//! sRGB transfer functions and color-space-tagged color types
//!
//! Gamma-encoded and linear-light colors are separate types so a value can
//! only cross between the two spaces through [`decode`] and [`encode`].

use crate::constants::srgb::{
    DECODE_THRESHOLD, ENCODE_THRESHOLD, GAMMA, LINEAR_SLOPE, OFFSET, SCALE,
};

/// Gamma-encoded (display) RGBA color, components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Srgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Linear-light RGBA color
///
/// RGB may leave [0, 1] between transform steps; alpha is carried untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Srgb {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from packed 8-bit RGBA
    #[inline]
    pub fn from_rgba8(px: [u8; 4]) -> Self {
        Self {
            r: px[0] as f32 / 255.0,
            g: px[1] as f32 / 255.0,
            b: px[2] as f32 / 255.0,
            a: px[3] as f32 / 255.0,
        }
    }

    /// Quantize to packed 8-bit RGBA (rounded, saturating)
    #[inline]
    pub fn to_rgba8(self) -> [u8; 4] {
        [
            quantize(self.r),
            quantize(self.g),
            quantize(self.b),
            quantize(self.a),
        ]
    }

    #[inline]
    pub fn rgb(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    #[inline]
    pub fn with_rgb(self, rgb: [f32; 3]) -> Self {
        Self {
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
            a: self.a,
        }
    }

    /// Decode to linear light
    #[inline]
    pub fn to_linear(self) -> LinearRgb {
        LinearRgb {
            r: decode(self.r),
            g: decode(self.g),
            b: decode(self.b),
            a: self.a,
        }
    }
}

impl LinearRgb {
    #[inline]
    pub fn rgb(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    #[inline]
    pub fn with_rgb(self, rgb: [f32; 3]) -> Self {
        Self {
            r: rgb[0],
            g: rgb[1],
            b: rgb[2],
            a: self.a,
        }
    }

    /// Clamp RGB to the displayable range and encode back to sRGB
    #[inline]
    pub fn to_srgb(self) -> Srgb {
        Srgb {
            r: encode(self.r.clamp(0.0, 1.0)),
            g: encode(self.g.clamp(0.0, 1.0)),
            b: encode(self.b.clamp(0.0, 1.0)),
            a: self.a,
        }
    }
}

/// sRGB EOTF: gamma-encoded [0, 1] to linear [0, 1]
#[inline]
pub fn decode(v: f32) -> f32 {
    if v <= DECODE_THRESHOLD {
        v / LINEAR_SLOPE
    } else {
        ((v + OFFSET) / SCALE).powf(GAMMA)
    }
}

/// sRGB OETF: linear [0, 1] to gamma-encoded [0, 1]
#[inline]
pub fn encode(l: f32) -> f32 {
    if l <= ENCODE_THRESHOLD {
        l * LINEAR_SLOPE
    } else {
        SCALE * l.powf(1.0 / GAMMA) - OFFSET
    }
}

#[inline]
fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Linear value for every 8-bit code, indexed by the code
pub fn decode_table() -> [f32; 256] {
    let mut table = [0.0; 256];
    for (code, slot) in table.iter_mut().enumerate() {
        *slot = decode(code as f32 / 255.0);
    }
    table
}
