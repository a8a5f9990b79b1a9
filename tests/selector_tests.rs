// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for operating-mode selection

use tritan_camera::backends::camera::{
    CameraDevice, CameraPosition, CapabilityDescriptor, FormatSelectionCache, PixelFormat,
    select_format,
};

fn capability_list() -> Vec<CapabilityDescriptor> {
    vec![
        CapabilityDescriptor::new(1920, 1080, 24.0, 30.0),
        CapabilityDescriptor::new(640, 480, 15.0, 30.0),
        CapabilityDescriptor::new(854, 480, 20.0, 20.0),
    ]
}

#[test]
fn test_largest_mode_within_bound_wins() {
    let selection = select_format(&capability_list(), 20.0, 854, 480).unwrap();
    assert_eq!(
        selection.descriptor,
        CapabilityDescriptor::new(854, 480, 20.0, 20.0)
    );
    assert!(!selection.degraded);
}

#[test]
fn test_unsupported_rate_falls_back_to_first_mode() {
    let selection = select_format(&capability_list(), 60.0, 854, 480).unwrap();
    assert_eq!(
        selection.descriptor,
        CapabilityDescriptor::new(1920, 1080, 24.0, 30.0)
    );
    assert!(selection.degraded);
}

#[test]
fn test_selection_is_deterministic() {
    let caps = capability_list();
    for target in [15.0, 20.0, 24.0, 30.0, 60.0] {
        let first = select_format(&caps, target, 854, 480);
        for _ in 0..10 {
            assert_eq!(select_format(&caps, target, 854, 480), first);
        }
    }
}

#[test]
fn test_collaborator_json_with_missing_fields() {
    let json = r#"[
        {"width": 1280, "height": 720, "maxFps": 30},
        {"videoWidth": 640, "videoHeight": 480, "minFrameRate": 15, "maxFrameRate": 30}
    ]"#;
    let caps = CapabilityDescriptor::parse_list(json).unwrap();
    assert_eq!(caps[0].min_fps, 0.0);

    let selection = select_format(&caps, 30.0, 854, 480).unwrap();
    assert_eq!((selection.descriptor.width, selection.descriptor.height), (640, 480));

    let request = selection.to_request();
    assert_eq!(request.fps, 30.0);
    assert_eq!(request.pixel_formats.first(), Some(&PixelFormat::Yuv420));
}

#[test]
fn test_cache_recomputes_only_on_key_change() {
    let caps = capability_list();
    let back = CameraDevice {
        id: "0".into(),
        name: "Back".into(),
        position: CameraPosition::Back,
    };
    let front = CameraDevice {
        id: "1".into(),
        name: "Front".into(),
        position: CameraPosition::Front,
    };
    let mut cache = FormatSelectionCache::new();

    cache.select(&back, &caps, 20.0, 854, 480, 0.0);
    cache.select(&back, &caps, 20.0, 854, 480, 0.0);
    assert_eq!(cache.computations(), 1);

    cache.select(&back, &caps, 30.0, 854, 480, 0.0);
    cache.select(&front, &caps, 30.0, 854, 480, 0.0);
    assert_eq!(cache.computations(), 3);
}
