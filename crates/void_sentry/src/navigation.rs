//! Navigation service interface
//!
//! Path planning lives outside the sentry core. The agent only issues
//! destinations and reads back progress through [`Navigator`].

use glam::Vec3;

/// Slack added to the stopping distance when testing for arrival
pub const ARRIVAL_TOLERANCE: f32 = 0.1;

/// Navigation agent driven by the sentry
///
/// The navigator moves the body but never rotates it; facing is owned by
/// the sentry.
pub trait Navigator {
    /// Request a path to `point`
    fn set_destination(&mut self, point: Vec3);

    /// Whether a requested path is still being computed
    fn is_path_pending(&self) -> bool;

    /// Distance left along the current path
    fn remaining_distance(&self) -> f32;

    /// Distance from the destination at which the agent stops
    fn stopping_distance(&self) -> f32;

    /// Velocity the agent wants to move at this frame
    fn desired_velocity(&self) -> Vec3;

    /// Drop the current path and hold position
    fn stop(&mut self) {}
}

/// Whether the navigator has reached its destination
pub fn has_arrived(nav: &dyn Navigator) -> bool {
    !nav.is_path_pending() && nav.remaining_distance() <= nav.stopping_distance() + ARRIVAL_TOLERANCE
}

/// Whether the navigator is still heading for a point it must get within
/// `stop_distance` of
pub fn is_approaching(nav: &dyn Navigator, stop_distance: f32) -> bool {
    nav.is_path_pending() || nav.remaining_distance() > stop_distance
}
