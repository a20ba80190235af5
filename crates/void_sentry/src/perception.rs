//! Line-of-sight perception
//!
//! Visibility is decided by range, field of view, then a two-pass raycast:
//! a full hit list walked past the agent's own shapes, and an obstacle-only
//! fallback for targets with no collidable body.

use crate::config::VisionConfig;
use crate::sensor::{EntityId, SelfShapes, SensorQuery, SurfaceMask};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Eye pose used for sight checks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Eye {
    /// World position of the eye
    pub position: Vec3,
    /// Forward direction of the eye
    pub forward: Vec3,
}

impl Eye {
    /// Create a new eye pose
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }
}

/// The entity an agent is tracking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedTarget {
    /// Target entity (root of its body hierarchy)
    pub entity: EntityId,
    /// Target position this tick
    pub position: Vec3,
}

impl TrackedTarget {
    /// Create a new tracked target
    pub fn new(entity: EntityId, position: Vec3) -> Self {
        Self { entity, position }
    }
}

/// Sight cone parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SightParams {
    /// Maximum sight distance
    pub range: f32,
    /// Full field of view (degrees)
    pub field_of_view: f32,
    /// Surfaces used by the obstacle-only fallback
    pub obstacle_mask: SurfaceMask,
}

impl SightParams {
    /// Create sight parameters with the default obstacle mask
    pub fn new(range: f32, field_of_view: f32) -> Self {
        Self {
            range,
            field_of_view,
            obstacle_mask: SurfaceMask::default(),
        }
    }

    /// Set the obstacle mask
    pub fn with_obstacle_mask(mut self, mask: SurfaceMask) -> Self {
        self.obstacle_mask = mask;
        self
    }

    /// Check range and field of view only (no raycasts)
    pub fn in_sight_cone(&self, eye: &Eye, point: Vec3) -> bool {
        let to_point = point - eye.position;
        if to_point.length() > self.range {
            return false;
        }
        angle_between(eye.forward, to_point).to_degrees() <= self.field_of_view * 0.5
    }
}

impl From<&VisionConfig> for SightParams {
    fn from(config: &VisionConfig) -> Self {
        Self {
            range: config.sight_range,
            field_of_view: config.field_of_view,
            obstacle_mask: config.obstacle_mask,
        }
    }
}

/// Whether `target` can be seen from `eye`
pub fn is_target_visible(
    sensor: &dyn SensorQuery,
    eye: &Eye,
    target: &TrackedTarget,
    sight: &SightParams,
    self_shapes: &SelfShapes,
) -> bool {
    if !sight.in_sight_cone(eye, target.position) {
        return false;
    }

    let to_target = target.position - eye.position;
    let distance = to_target.length();
    let Some(direction) = to_target.try_normalize() else {
        // Eye inside the target: nothing can sit in between
        return true;
    };

    let mut hits = sensor.query_all_along_segment(eye.position, direction, distance);
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    if let Some(hit) = hits.iter().find(|h| !self_shapes.contains(h.shape)) {
        return sensor.is_part_of(hit.owner, target.entity);
    }

    // Bodiless target: only scenery can block the line
    sensor
        .query_first_along_segment(eye.position, direction, distance, sight.obstacle_mask)
        .is_none()
}

/// Angle between two vectors (radians), zero if either is degenerate
pub fn angle_between(a: Vec3, b: Vec3) -> f32 {
    let mag = a.length() * b.length();
    if mag == 0.0 {
        return 0.0;
    }
    (a.dot(b) / mag).clamp(-1.0, 1.0).acos()
}
