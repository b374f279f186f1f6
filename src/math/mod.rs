pub mod polygon_3d;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f32>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f32>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f32 = 1e-6;

/// Converts a flat byte weight (`0..=255`) to the unit float stored in layers.
#[inline]
#[must_use]
pub fn unit_float_from_u8(value: u8) -> f32 {
    f32::from(value) / 255.0
}

/// Converts a unit float back to a byte weight, rounding and clamping.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn unit_float_to_u8(value: f32) -> u8 {
    (value * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}

/// Packs a point into a plain array for attribute storage.
#[inline]
#[must_use]
pub fn to_array(p: &Point3) -> [f32; 3] {
    [p.x, p.y, p.z]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_weights_survive_unit_float_round_trip() {
        for value in 0..=u8::MAX {
            assert_eq!(unit_float_to_u8(unit_float_from_u8(value)), value);
        }
    }

    #[test]
    fn unit_float_clamps_out_of_range() {
        assert_eq!(unit_float_to_u8(-1.0), 0);
        assert_eq!(unit_float_to_u8(2.0), 255);
    }
}
