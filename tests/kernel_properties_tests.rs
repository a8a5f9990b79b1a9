// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the tritan color transform

use approx::assert_abs_diff_eq;
use tritan_camera::filters::{Paint, SimulationFidelity, Srgb, TritanKernel};

/// Gradient image with varying alpha
fn gradient(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[
                (x * 255 / width) as u8,
                (y * 255 / height) as u8,
                ((x + y) * 255 / (width + height)) as u8,
                ((x * 7 + y * 13) % 256) as u8,
            ]);
        }
    }
    pixels
}

#[test]
fn test_filtering_twice_keeps_alpha_and_succeeds() {
    for fidelity in SimulationFidelity::ALL {
        let kernel = TritanKernel::shared(fidelity);
        let original = gradient(64, 48);

        let mut once = original.clone();
        kernel.apply_rgba8_par(&mut once);
        let mut twice = once.clone();
        kernel.apply_rgba8_par(&mut twice);

        for (a, b) in original.chunks_exact(4).zip(twice.chunks_exact(4)) {
            assert_eq!(a[3], b[3], "{fidelity} changed alpha");
        }
    }
}

#[test]
fn test_float_output_in_range_after_second_pass() {
    let steps = [0.0, 0.1, 0.35, 0.6, 0.9, 1.0];
    for fidelity in SimulationFidelity::ALL {
        let kernel = TritanKernel::new(fidelity);
        for &r in &steps {
            for &g in &steps {
                for &b in &steps {
                    let input = Srgb::new(r, g, b, 0.42);
                    let out = kernel.simulate(kernel.simulate(input));
                    assert_eq!(out.a, 0.42);
                    for c in [out.r, out.g, out.b] {
                        assert!((0.0..=1.0).contains(&c), "{fidelity}: {c} out of range");
                    }
                }
            }
        }
    }
}

#[test]
fn test_grays_keep_red_and_green() {
    for fidelity in [
        SimulationFidelity::Brettel,
        SimulationFidelity::LinearMatrix,
        SimulationFidelity::GammaAffine,
    ] {
        let kernel = TritanKernel::shared(fidelity);
        for level in 0..=20 {
            let v = level as f32 / 20.0;
            let out = kernel.simulate(Srgb::new(v, v, v, 1.0));
            assert_abs_diff_eq!(out.r, v, epsilon = 1e-3);
            assert_abs_diff_eq!(out.g, v, epsilon = 1e-3);
        }
    }
}

#[test]
fn test_parallel_and_serial_paths_agree() {
    let kernel = TritanKernel::shared(SimulationFidelity::Brettel);
    // Odd length exercises the tail handling
    let mut serial = gradient(129, 33);
    let mut parallel = serial.clone();
    kernel.apply_rgba8(&mut serial);
    kernel.apply_rgba8_par(&mut parallel);
    assert_eq!(serial, parallel);
}

#[test]
fn test_paint_matches_kernel() {
    let paint = Paint::shared(SimulationFidelity::GammaAffine);
    let kernel = TritanKernel::shared(SimulationFidelity::GammaAffine);
    let mut via_paint = gradient(10, 10);
    let mut via_kernel = via_paint.clone();
    paint.apply(&mut via_paint);
    kernel.apply_rgba8(&mut via_kernel);
    assert_eq!(via_paint, via_kernel);
}
