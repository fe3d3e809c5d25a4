//! Pointer-to-image coordinate mapping and zoom stepping.
//!
//! All functions are pure. The zoom scale is always kept inside
//! [`MIN_SCALE`, `MAX_SCALE`].

use serde::{Deserialize, Serialize};

/// Smallest allowed zoom scale.
pub const MIN_SCALE: f64 = 0.5;

/// Largest allowed zoom scale.
pub const MAX_SCALE: f64 = 3.0;

/// Scale after a zoom reset.
pub const DEFAULT_SCALE: f64 = 1.0;

/// Factor applied by one zoom-in step.
pub const ZOOM_IN_FACTOR: f64 = 1.2;

/// Factor applied by one zoom-out step.
pub const ZOOM_OUT_FACTOR: f64 = 0.8;

/// A position in either pointer (device) or image space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Map a pointer position to image space at the given zoom scale.
pub fn to_image_space(pointer: Point, scale: f64) -> Point {
    let scale = clamp_scale(scale);
    Point {
        x: pointer.x / scale,
        y: pointer.y / scale,
    }
}

/// Clamp a scale into the allowed range. Non-finite input resets to the default.
pub fn clamp_scale(scale: f64) -> f64 {
    if !scale.is_finite() {
        return DEFAULT_SCALE;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

pub fn zoom_in(scale: f64) -> f64 {
    clamp_scale((scale * ZOOM_IN_FACTOR).min(MAX_SCALE))
}

pub fn zoom_out(scale: f64) -> f64 {
    clamp_scale((scale * ZOOM_OUT_FACTOR).max(MIN_SCALE))
}

pub fn reset_zoom() -> f64 {
    DEFAULT_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_space_divides_by_scale() {
        let p = to_image_space(Point::new(200.0, 100.0), 2.0);
        assert_eq!(p, Point::new(100.0, 50.0));
    }

    #[test]
    fn image_space_identity_at_default_scale() {
        let p = Point::new(37.5, 12.25);
        assert_eq!(to_image_space(p, DEFAULT_SCALE), p);
    }

    #[test]
    fn image_space_is_deterministic() {
        let p = Point::new(10.0, 10.0);
        assert_eq!(to_image_space(p, 1.5), to_image_space(p, 1.5));
    }

    #[test]
    fn zoom_in_steps_by_factor() {
        assert!((zoom_in(1.0) - 1.2).abs() < 1e-9);
    }

    #[test]
    fn zoom_out_steps_by_factor() {
        assert!((zoom_out(1.0) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn repeated_zoom_in_stays_at_max() {
        let mut scale = DEFAULT_SCALE;
        for _ in 0..50 {
            scale = zoom_in(scale);
            assert!(scale <= MAX_SCALE);
        }
        assert_eq!(scale, MAX_SCALE);
        assert_eq!(zoom_in(MAX_SCALE), MAX_SCALE);
    }

    #[test]
    fn repeated_zoom_out_stays_at_min() {
        let mut scale = DEFAULT_SCALE;
        for _ in 0..50 {
            scale = zoom_out(scale);
            assert!(scale >= MIN_SCALE);
        }
        assert_eq!(scale, MIN_SCALE);
        assert_eq!(zoom_out(MIN_SCALE), MIN_SCALE);
    }

    #[test]
    fn reset_returns_default() {
        assert_eq!(reset_zoom(), 1.0);
    }

    #[test]
    fn clamp_handles_out_of_range_and_nan() {
        assert_eq!(clamp_scale(10.0), MAX_SCALE);
        assert_eq!(clamp_scale(0.01), MIN_SCALE);
        assert_eq!(clamp_scale(f64::NAN), DEFAULT_SCALE);
    }
}
