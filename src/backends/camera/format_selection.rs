// SPDX-License-Identifier: GPL-3.0-only

//! Operating-mode selection and preference logic
//!
//! Picks one (resolution, frame-rate) mode from a device's advertised
//! capabilities, trading sharpness against the time the kernel needs per
//! frame.

use super::types::{
    CameraDevice, CameraPosition, CapabilityDescriptor, OperatingModeRequest, PixelFormat,
};
use std::cmp::Ordering;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Result of operating-mode selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatSelection {
    pub descriptor: CapabilityDescriptor,
    pub target_fps: f64,
    /// No descriptor supports the target rate; preview runs at whatever the
    /// chosen mode delivers
    pub degraded: bool,
}

impl FormatSelection {
    /// Request to send to the camera for this selection
    pub fn to_request(&self) -> OperatingModeRequest {
        OperatingModeRequest::from_selection(self)
    }
}

impl OperatingModeRequest {
    /// Build the camera request for a selection
    ///
    /// A degraded selection asks for the closest rate the mode can deliver.
    pub fn from_selection(selection: &FormatSelection) -> Self {
        let descriptor = &selection.descriptor;
        let fps = if selection.degraded {
            selection
                .target_fps
                .clamp(descriptor.min_fps, descriptor.max_fps.max(descriptor.min_fps))
        } else {
            selection.target_fps
        };
        Self {
            width: descriptor.width,
            height: descriptor.height,
            fps,
            pixel_formats: PixelFormat::PREFERENCE.to_vec(),
        }
    }
}

/// Fixed-rate modes matching the target exactly sort first
fn fixed_rate_first(a: &CapabilityDescriptor, b: &CapabilityDescriptor, target: f64) -> Ordering {
    b.is_fixed_rate_at(target).cmp(&a.is_fixed_rate_at(target))
}

/// Select an operating mode for live preview
///
/// 1. Modes supporting `target_fps` within the resolution bound: largest area
///    wins.
/// 2. Otherwise modes supporting `target_fps` at any resolution: smallest area
///    wins, to protect the frame budget.
/// 3. Otherwise the first advertised mode, flagged as degraded.
///
/// In steps 1 and 2 a fixed-rate mode at exactly `target_fps` beats a
/// variable-rate mode of the same area. Sorting is stable, so any remaining
/// ties keep the device's list order.
///
/// Returns `None` only for an empty capability list.
pub fn select_format(
    capabilities: &[CapabilityDescriptor],
    target_fps: f64,
    max_width: u32,
    max_height: u32,
) -> Option<FormatSelection> {
    let first = capabilities.first()?;

    let mut bounded: Vec<&CapabilityDescriptor> = capabilities
        .iter()
        .filter(|c| c.supports_fps(target_fps) && c.fits_within(max_width, max_height))
        .collect();

    if !bounded.is_empty() {
        bounded.sort_by(|a, b| {
            b.area()
                .cmp(&a.area())
                .then_with(|| fixed_rate_first(a, b, target_fps))
        });
        let descriptor = *bounded[0];
        info!(
            mode = %descriptor,
            target_fps,
            bound = format!("{}x{}", max_width, max_height),
            "Selected operating mode within resolution bound"
        );
        return Some(FormatSelection {
            descriptor,
            target_fps,
            degraded: false,
        });
    }

    let mut relaxed: Vec<&CapabilityDescriptor> = capabilities
        .iter()
        .filter(|c| c.supports_fps(target_fps))
        .collect();

    if !relaxed.is_empty() {
        relaxed.sort_by(|a, b| {
            a.area()
                .cmp(&b.area())
                .then_with(|| fixed_rate_first(a, b, target_fps))
        });
        let descriptor = *relaxed[0];
        info!(
            mode = %descriptor,
            target_fps,
            "No mode within resolution bound, selected smallest mode at target rate"
        );
        return Some(FormatSelection {
            descriptor,
            target_fps,
            degraded: false,
        });
    }

    warn!(
        target_fps,
        fallback = %first,
        "No operating mode supports the target frame rate, falling back to first mode"
    );
    Some(FormatSelection {
        descriptor: *first,
        target_fps,
        degraded: true,
    })
}

/// Time available to process one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameBudget {
    pub fps: f64,
}

impl FrameBudget {
    pub fn new(fps: f64) -> Self {
        Self { fps }
    }

    /// Inter-frame interval; zero for a non-positive rate
    pub fn interval(&self) -> Duration {
        if self.fps > 0.0 {
            Duration::from_secs_f64(1.0 / self.fps)
        } else {
            Duration::ZERO
        }
    }

    /// Estimated kernel time for a frame of `area` pixels
    pub fn estimated_render_time(area: u64, ns_per_pixel: f64) -> Duration {
        Duration::from_secs_f64(area as f64 * ns_per_pixel * 1e-9)
    }

    /// Whether a mode's estimated kernel cost fits in the interval
    pub fn fits(&self, descriptor: &CapabilityDescriptor, ns_per_pixel: f64) -> bool {
        let interval = self.interval();
        interval.is_zero() || Self::estimated_render_time(descriptor.area(), ns_per_pixel) <= interval
    }
}

/// Cache key: selection is recomputed only when one of these changes
#[derive(Debug, Clone, PartialEq)]
struct SelectionKey {
    device_id: String,
    target_fps: f64,
    max_width: u32,
    max_height: u32,
}

/// Per-session cache of the selected operating mode
#[derive(Debug, Default)]
pub struct FormatSelectionCache {
    key: Option<SelectionKey>,
    selection: Option<FormatSelection>,
    /// Number of times selection actually ran
    computations: u64,
}

impl FormatSelectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached selection, re-selecting if device or constraints changed
    ///
    /// `ns_per_pixel` is the kernel cost estimate checked against the frame
    /// budget; exceeding it is logged, not rejected.
    pub fn select(
        &mut self,
        device: &CameraDevice,
        capabilities: &[CapabilityDescriptor],
        target_fps: f64,
        max_width: u32,
        max_height: u32,
        ns_per_pixel: f64,
    ) -> Option<FormatSelection> {
        let key = SelectionKey {
            device_id: device.id.clone(),
            target_fps,
            max_width,
            max_height,
        };

        if self.key.as_ref() == Some(&key) {
            debug!(device = %device.id, "Reusing cached operating mode");
            return self.selection;
        }

        let selection = select_format(capabilities, target_fps, max_width, max_height);
        if let Some(selection) = &selection {
            let budget = FrameBudget::new(selection.descriptor.max_fps.min(target_fps).max(0.0));
            if !budget.fits(&selection.descriptor, ns_per_pixel) {
                warn!(
                    mode = %selection.descriptor,
                    budget_ms = budget.interval().as_secs_f64() * 1000.0,
                    estimate_ms = FrameBudget::estimated_render_time(
                        selection.descriptor.area(),
                        ns_per_pixel
                    )
                    .as_secs_f64()
                        * 1000.0,
                    "Selected mode may exceed the frame budget"
                );
            }
        }

        self.key = Some(key);
        self.selection = selection;
        self.computations += 1;
        selection
    }

    /// Forget the cached selection (e.g. the device went away)
    pub fn invalidate(&mut self) {
        self.key = None;
        self.selection = None;
    }

    pub fn computations(&self) -> u64 {
        self.computations
    }
}

/// Pick the camera used for live preview: first back-facing device, else the first
pub fn select_camera(devices: &[CameraDevice]) -> Option<&CameraDevice> {
    devices
        .iter()
        .find(|d| d.position == CameraPosition::Back)
        .or_else(|| devices.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_list() -> Vec<CapabilityDescriptor> {
        vec![
            CapabilityDescriptor::new(1920, 1080, 24.0, 30.0),
            CapabilityDescriptor::new(640, 480, 15.0, 30.0),
            CapabilityDescriptor::new(854, 480, 20.0, 20.0),
        ]
    }

    fn device(id: &str, position: CameraPosition) -> CameraDevice {
        CameraDevice {
            id: id.to_string(),
            name: format!("Camera {}", id),
            position,
        }
    }

    #[test]
    fn test_largest_mode_within_bound() {
        let selection = select_format(&sample_list(), 20.0, 854, 480).unwrap();
        assert_eq!(
            selection.descriptor,
            CapabilityDescriptor::new(854, 480, 20.0, 20.0)
        );
        assert!(!selection.degraded);
    }

    #[test]
    fn test_fixed_rate_breaks_area_tie() {
        let list = vec![
            CapabilityDescriptor::new(640, 480, 15.0, 30.0),
            CapabilityDescriptor::new(640, 480, 20.0, 20.0),
        ];
        let selection = select_format(&list, 20.0, 854, 480).unwrap();
        assert!(selection.descriptor.is_fixed_rate_at(20.0));
    }

    #[test]
    fn test_relaxed_bound_prefers_smallest() {
        let list = vec![
            CapabilityDescriptor::new(3840, 2160, 24.0, 30.0),
            CapabilityDescriptor::new(1920, 1080, 24.0, 30.0),
            CapabilityDescriptor::new(320, 240, 5.0, 10.0),
        ];
        let selection = select_format(&list, 30.0, 854, 480).unwrap();
        assert_eq!(selection.descriptor.width, 1920);
        assert!(!selection.degraded);
    }

    #[test]
    fn test_unsupported_rate_falls_back_to_first() {
        let selection = select_format(&sample_list(), 60.0, 854, 480).unwrap();
        assert_eq!(selection.descriptor, sample_list()[0]);
        assert!(selection.degraded);
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(select_format(&[], 30.0, 854, 480), None);
    }

    #[test]
    fn test_degraded_request_clamps_rate() {
        let selection = select_format(&sample_list(), 60.0, 854, 480).unwrap();
        let request = selection.to_request();
        assert_eq!(request.fps, 30.0);
        assert_eq!((request.width, request.height), (1920, 1080));
        assert_eq!(request.pixel_formats[0], PixelFormat::Yuv420);
    }

    #[test]
    fn test_cache_recomputes_only_on_change() {
        let list = sample_list();
        let back = device("0", CameraPosition::Back);
        let mut cache = FormatSelectionCache::new();

        let a = cache.select(&back, &list, 20.0, 854, 480, 1.0);
        let b = cache.select(&back, &list, 20.0, 854, 480, 1.0);
        assert_eq!(a, b);
        assert_eq!(cache.computations(), 1);

        cache.select(&back, &list, 30.0, 854, 480, 1.0);
        assert_eq!(cache.computations(), 2);

        let front = device("1", CameraPosition::Front);
        cache.select(&front, &list, 30.0, 854, 480, 1.0);
        assert_eq!(cache.computations(), 3);

        cache.invalidate();
        cache.select(&front, &list, 30.0, 854, 480, 1.0);
        assert_eq!(cache.computations(), 4);
    }

    #[test]
    fn test_frame_budget() {
        let budget = FrameBudget::new(30.0);
        assert_eq!(budget.interval(), Duration::from_secs_f64(1.0 / 30.0));
        let vga = CapabilityDescriptor::new(854, 480, 30.0, 30.0);
        let uhd = CapabilityDescriptor::new(3840, 2160, 30.0, 30.0);
        assert!(budget.fits(&vga, 25.0));
        assert!(!budget.fits(&uhd, 25.0));
        assert_eq!(FrameBudget::new(0.0).interval(), Duration::ZERO);
    }

    #[test]
    fn test_select_camera_prefers_back() {
        let devices = vec![
            device("front", CameraPosition::Front),
            device("back", CameraPosition::Back),
        ];
        assert_eq!(select_camera(&devices).unwrap().id, "back");

        let only_front = vec![device("front", CameraPosition::Front)];
        assert_eq!(select_camera(&only_front).unwrap().id, "front");
        assert!(select_camera(&[]).is_none());
    }
}
