// Copyright 2020 @TwoCookingMice

use super::constants::{Float, Vector3f};

/// Linear RGB radiance / reflectance triple.
pub type RGBSpectrum = Vector3f;

pub fn rgb(r: Float, g: Float, b: Float) -> RGBSpectrum {
    RGBSpectrum::new(r, g, b)
}

pub fn black() -> RGBSpectrum {
    RGBSpectrum::zeros()
}

pub fn white() -> RGBSpectrum {
    RGBSpectrum::new(1.0, 1.0, 1.0)
}

/// Rec. 709 relative luminance.
pub fn luminance(c: &RGBSpectrum) -> Float {
    0.2126 * c.x + 0.7152 * c.y + 0.0722 * c.z
}

pub fn max_component(c: &RGBSpectrum) -> Float {
    c.x.max(c.y).max(c.z)
}

pub fn is_black(c: &RGBSpectrum) -> bool {
    c.x == 0.0 && c.y == 0.0 && c.z == 0.0
}

pub fn is_finite(c: &RGBSpectrum) -> bool {
    c.x.is_finite() && c.y.is_finite() && c.z.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_luminance_of_white_is_one() {
        assert!((luminance(&white()) - 1.0).abs() < 1e-6);
        assert_eq!(luminance(&black()), 0.0);
    }

    #[test]
    fn test_component_helpers() {
        let c = rgb(0.2, 0.9, 0.4);
        assert!((max_component(&c) - 0.9).abs() < 1e-6);
        assert!(!is_black(&c));
        assert!(is_black(&black()));
        assert!(is_finite(&c));
        assert!(!is_finite(&rgb(std::f32::NAN, 0.0, 0.0)));
    }
}
