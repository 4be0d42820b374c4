//! Platform constants and small numeric helpers.
//!
//! Geometry values for the drive base, for callers computing kinematics on
//! top of decoded encoder packets. The kinematics itself lives outside this
//! crate.

use std::f32::consts::PI;

/// Distance between the drive wheels, meters.
pub const AXLE_LENGTH_M: f32 = 0.235;

/// Encoder ticks per wheel revolution.
pub const TICKS_PER_REV: f32 = 508.8;

/// Encoder counters roll over past this value.
pub const MAX_ENCODER_TICKS: u32 = 65_535;

/// Drive wheel diameter, meters.
pub const WHEEL_DIAMETER_M: f32 = 0.078;

/// Maximum commanded wheel velocity, meters per second.
pub const MAX_VELOCITY_MPS: f32 = 0.5;

/// Wrap an angle in radians into `[-PI, PI]`.
pub fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle;
    while a < -PI {
        a += 2.0 * PI;
    }
    while a > PI {
        a -= 2.0 * PI;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_angle_identity_in_range() {
        assert_eq!(normalize_angle(0.0), 0.0);
        assert_eq!(normalize_angle(1.5), 1.5);
        assert_eq!(normalize_angle(-1.5), -1.5);
    }

    #[test]
    fn test_normalize_angle_wraps() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-5);
        assert!((normalize_angle(-3.0 * PI) + PI).abs() < 1e-5);
        assert!((normalize_angle(2.0 * PI)).abs() < 1e-5);
    }

    #[test]
    fn test_normalize_angle_large_magnitude() {
        let wrapped = normalize_angle(100.0);
        assert!((-PI..=PI).contains(&wrapped));
    }
}
