use super::*;

#[test]
fn fps_from_period_matches_timer_rate() {
    let fps = Fps::from_period_ms(50).unwrap();
    assert_eq!(fps, Fps { num: 1000, den: 50 });
    assert!((fps.as_f64() - 20.0).abs() < 1e-9);
    assert!(Fps::from_period_ms(0).is_err());
}

#[test]
fn with_alpha_rounds_to_nearest_byte() {
    assert_eq!(Rgba8::black().with_alpha(0.05).a, 13);
    assert_eq!(Rgba8::black().with_alpha(2.0).a, 255);
    assert_eq!(Rgba8::black().with_alpha(-1.0).a, 0);
}

#[test]
fn viewport_rect_and_byte_len() {
    let v = Viewport::new(320, 100);
    assert_eq!(v.rect(), Rect::new(0.0, 0.0, 320.0, 100.0));
    assert_eq!(v.byte_len(), 320 * 100 * 4);
}
