use ripplepad_lib::animator::{RippleColor, RippleStyle};
use ripplepad_lib::{ConfigError, LogLevel, PadConfig, PixelMap, RGB8};

#[test]
fn test_empty_object_is_default() {
    let config: PadConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, PadConfig::default());
    assert_eq!(config.pixel_order, PixelMap::LANDSCAPE);
    assert_eq!(config.ripple_color, RippleColor::Fixed { color: RGB8::new(82, 150, 14) });
    assert_eq!(config.timing.frame_period_ms, 100);
    assert_eq!(config.timing.ripple_age_ratio, 2);
}

#[test]
fn test_serialized_default_reads_back() {
    let json = serde_json::to_string(&PadConfig::default()).unwrap();
    let config: PadConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(config, PadConfig::default());
}

#[test]
fn test_partial_override() {
    let json = r#"{
        "log_level": "debug",
        "gradient_steps": 80,
        "ripple_color": {"kind": "cycle", "boost": 51},
        "ripple_style": "intensity",
        "timing": {"frame_period_ms": 40}
    }"#;
    let config: PadConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.ripple_color, RippleColor::Cycle { boost: 51 });
    assert_eq!(config.ripple_style, RippleStyle::Intensity);
    assert_eq!(config.timing.frame_period_ms, 40);
    assert_eq!(config.timing.key_poll_ms, 10);

    let baked = config.bake().unwrap();
    assert_eq!(baked.animator.palette(true).len(), 80);
    assert_eq!(baked.timing.ripple_age_period_ms(), 80);
}

#[test]
fn test_gradient_from_json() {
    let json = r#"{
        "muted_gradient": [
            {"position": 0.2, "color": {"r": 10, "g": 0, "b": 0}},
            {"position": 0.7, "color": {"r": 0, "g": 10, "b": 0}}
        ],
        "gradient_steps": 10
    }"#;
    let config: PadConfig = serde_json::from_str(json).unwrap();
    let baked = config.bake().unwrap();
    assert_eq!(baked.animator.palette(true).colors()[2], RGB8::new(10, 0, 0));
    assert_eq!(baked.animator.palette(true).colors()[7], RGB8::new(0, 10, 0));
}

#[test]
fn test_bad_gradient_fails_bake() {
    let json = r#"{
        "unmuted_gradient": [
            {"position": 0.8, "color": {"r": 1, "g": 1, "b": 1}},
            {"position": 0.3, "color": {"r": 2, "g": 2, "b": 2}}
        ]
    }"#;
    let config: PadConfig = serde_json::from_str(json).unwrap();
    assert_eq!(
        config.bake().unwrap_err(),
        ConfigError::StopsNotIncreasing { index: 1 }
    );
}

#[test]
fn test_short_pixel_order_rejected_by_parser() {
    let json = r#"{"pixel_order": [0, 1, 2]}"#;
    assert!(serde_json::from_str::<PadConfig>(json).is_err());
}
