// SPDX-License-Identifier: GPL-3.0-only

//! Fixed color matrices for tritanopia simulation
//!
//! All matrices are row-major and act on column vectors: `out = M * v`.

/// Row-major 3x3 matrix
pub type Mat3 = [[f32; 3]; 3];

/// Linear RGB to cone response (L, M, S)
pub const RGB_TO_LMS: Mat3 = [
    [0.305_873, 0.623_405, 0.045_369],
    [0.157_713, 0.769_720, 0.088_073_5],
    [0.019_300, 0.119_200, 0.950_500],
];

/// Cone response back to linear RGB; inverse of [`RGB_TO_LMS`]
pub const LMS_TO_RGB: Mat3 = [
    [5.618_07, -4.574_25, 0.155_692],
    [-1.154_64, 2.258_20, -0.154_132],
    [0.030_725_1, -0.190_315, 1.068_25],
];

/// Linear-light tritan approximation (Giorgianni & Madden), no LMS round trip
///
/// Blue is rebuilt from green and blue; red picks up a small green/blue
/// difference term. Rows sum to one so neutrals pass through.
pub const LINEAR_TRITAN: Mat3 = [
    [1.0, 0.152, -0.152],
    [0.0, 0.865, 0.135],
    [0.0, 0.865, 0.135],
];

/// Gamma-space 4x5 affine color matrix (RGBA rows, last column is the offset)
pub type ColorMatrix = [[f32; 5]; 4];

/// Coarse tritan preview applied directly to gamma-encoded values
pub const GAMMA_TRITAN: ColorMatrix = [
    [0.95, 0.05, 0.0, 0.0, 0.0],
    [0.0, 0.433, 0.567, 0.0, 0.0],
    [0.0, 0.475, 0.525, 0.0, 0.0],
    [0.0, 0.0, 0.0, 1.0, 0.0],
];

/// Linear RGB anchors of the two half-planes used for Brettel projection
///
/// This is a simplified Brettel: the published construction anchors its
/// half-planes at the 485 nm and 660 nm spectral stimuli, here they are the
/// display primaries closest to those hues, red and cyan. Each plane runs
/// through white and one anchor, and only the S cone response is replaced.
pub const BRETTEL_ANCHOR_RED: [f32; 3] = [1.0, 0.0, 0.0];
pub const BRETTEL_ANCHOR_CYAN: [f32; 3] = [0.0, 1.0, 1.0];

#[inline]
pub fn mul_vec(m: &Mat3, v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

pub fn mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

#[inline]
pub fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Largest absolute deviation of `m` from the identity
pub fn identity_error(m: &Mat3) -> f32 {
    let mut worst: f32 = 0.0;
    for (i, row) in m.iter().enumerate() {
        for (j, &cell) in row.iter().enumerate() {
            let expected = if i == j { 1.0 } else { 0.0 };
            worst = worst.max((cell - expected).abs());
        }
    }
    worst
}

/// Apply a 4x5 color matrix to gamma-encoded RGBA
#[inline]
pub fn apply_color_matrix(m: &ColorMatrix, rgba: [f32; 4]) -> [f32; 4] {
    let mut out = [0.0; 4];
    for (row, slot) in m.iter().zip(out.iter_mut()) {
        *slot = row[0] * rgba[0] + row[1] * rgba[1] + row[2] * rgba[2] + row[3] * rgba[3] + row[4];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_lms_matrices_are_inverses() {
        assert!(identity_error(&mul(&RGB_TO_LMS, &LMS_TO_RGB)) < 1e-5);
        assert!(identity_error(&mul(&LMS_TO_RGB, &RGB_TO_LMS)) < 1e-5);
    }

    #[test]
    fn test_neutral_rows() {
        for row in LINEAR_TRITAN {
            assert_abs_diff_eq!(row.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        }
        for row in &GAMMA_TRITAN[..3] {
            assert_abs_diff_eq!(row[..3].iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_alpha_row_is_identity() {
        let out = apply_color_matrix(&GAMMA_TRITAN, [0.2, 0.4, 0.6, 0.8]);
        assert_eq!(out[3], 0.8);
    }

    #[test]
    fn test_cross_is_orthogonal() {
        let a = [0.97, 1.01, 1.09];
        let b = [0.3, 0.15, 0.02];
        let n = cross(a, b);
        let dot = |x: [f32; 3], y: [f32; 3]| x[0] * y[0] + x[1] * y[1] + x[2] * y[2];
        assert_abs_diff_eq!(dot(n, a), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(dot(n, b), 0.0, epsilon = 1e-6);
    }
}
