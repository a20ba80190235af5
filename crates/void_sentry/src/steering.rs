//! Yaw steering for the agent body

use glam::{Quat, Vec3};

/// Directions shorter than this are ignored when turning
const MIN_TURN_DIRECTION_SQ: f32 = 0.01;

/// Rotation whose forward (+Z) axis points along `direction` on the ground plane
pub fn planar_look_rotation(direction: Vec3) -> Option<Quat> {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    if flat.length_squared() <= MIN_TURN_DIRECTION_SQ {
        return None;
    }
    let flat = flat.normalize();
    Some(Quat::from_rotation_y(flat.x.atan2(flat.z)))
}

/// Blend `facing` toward `direction` by `delta_time * rate`
///
/// Vertical components are dropped; near-zero directions leave the facing
/// unchanged.
pub fn turn_towards(facing: Quat, direction: Vec3, delta_time: f32, rate: f32) -> Quat {
    match planar_look_rotation(direction) {
        Some(target) => facing.slerp(target, (delta_time * rate).clamp(0.0, 1.0)),
        None => facing,
    }
}

/// Oscillating look-around yaw for one tick
///
/// Yaw speed follows `sin(clock * frequency) * turn_rate` degrees per second.
pub fn look_around(facing: Quat, clock: f32, delta_time: f32, turn_rate: f32, frequency: f32) -> Quat {
    let degrees = (clock * frequency).sin() * turn_rate * delta_time;
    (Quat::from_rotation_y(degrees.to_radians()) * facing).normalize()
}

/// Forward (+Z) direction of a facing
pub fn forward(facing: Quat) -> Vec3 {
    facing * Vec3::Z
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_planar_look_rotation() {
        let rotation = planar_look_rotation(Vec3::new(1.0, 5.0, 0.0)).unwrap();
        let fwd = forward(rotation);
        assert_relative_eq!(fwd.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(fwd.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(fwd.z, 0.0, epsilon = 1e-5);

        assert!(planar_look_rotation(Vec3::new(0.0, 3.0, 0.05)).is_none());
    }

    #[test]
    fn test_turn_towards_full_rate_snaps() {
        let facing = turn_towards(Quat::IDENTITY, Vec3::X, 1.0, 6.0);
        assert_relative_eq!(forward(facing).x, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_turn_towards_partial() {
        let facing = turn_towards(Quat::IDENTITY, Vec3::X, 0.05, 4.0);
        let fwd = forward(facing);
        assert!(fwd.x > 0.0 && fwd.x < 1.0);
        assert!(fwd.z > 0.0);
    }

    #[test]
    fn test_turn_towards_ignores_tiny_direction() {
        let facing = turn_towards(Quat::IDENTITY, Vec3::new(0.01, 0.0, 0.0), 1.0, 6.0);
        assert_eq!(facing, Quat::IDENTITY);
    }

    #[test]
    fn test_look_around_rotates_about_y() {
        let clock = std::f32::consts::FRAC_PI_4;
        let facing = look_around(Quat::IDENTITY, clock, 0.5, 60.0, 2.0);
        let fwd = forward(facing);
        // sin(pi/2) * 60 deg/s * 0.5 s = 30 degrees
        assert_relative_eq!(fwd.x, 30f32.to_radians().sin(), epsilon = 1e-5);
        assert_relative_eq!(fwd.y, 0.0, epsilon = 1e-5);
    }
}
