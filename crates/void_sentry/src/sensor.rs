//! Spatial sensor queries (line-of-sight raycasts)
//!
//! The sentry core never intersects geometry itself. Hosts implement
//! [`SensorQuery`] over their physics world and the perception code walks
//! the returned hits.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Identifier of an entity in the host world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Identifier of a single collision shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShapeId(pub u64);

/// A surface layer identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceLayer(pub u32);

impl SurfaceLayer {
    /// Default layer
    pub const DEFAULT: Self = Self(0);
    /// Static level geometry (walls, floors)
    pub const ENVIRONMENT: Self = Self(1);
    /// Props and furniture that block sight
    pub const PROPS: Self = Self(2);
    /// Agents
    pub const AGENTS: Self = Self(3);

    /// Get the layer as a bitmask; layers 32 and above have no bit
    pub fn as_mask(&self) -> u32 {
        1u32.checked_shl(self.0).unwrap_or(0)
    }
}

/// Bitmask selecting which surface layers a query may hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceMask(pub u32);

impl SurfaceMask {
    /// Hits every layer
    pub const ALL: Self = Self(u32::MAX);
    /// Hits nothing
    pub const NONE: Self = Self(0);

    /// Build a mask from a list of layers
    pub fn from_layers(layers: &[SurfaceLayer]) -> Self {
        Self(layers.iter().fold(0u32, |acc, l| acc | l.as_mask()))
    }

    /// Add a layer to the mask
    pub fn with_layer(mut self, layer: SurfaceLayer) -> Self {
        self.0 |= layer.as_mask();
        self
    }

    /// Whether the mask includes a layer
    pub fn contains(&self, layer: SurfaceLayer) -> bool {
        self.0 & layer.as_mask() != 0
    }
}

impl Default for SurfaceMask {
    fn default() -> Self {
        Self::from_layers(&[SurfaceLayer::ENVIRONMENT, SurfaceLayer::PROPS])
    }
}

/// A single intersection along a sensor segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorHit {
    /// Distance from the segment origin
    pub distance: f32,
    /// The shape that was hit
    pub shape: ShapeId,
    /// Entity owning the shape
    pub owner: EntityId,
}

impl SensorHit {
    /// Create a new hit
    pub fn new(distance: f32, shape: ShapeId, owner: EntityId) -> Self {
        Self {
            distance,
            shape,
            owner,
        }
    }
}

/// Spatial query service provided by the host
///
/// `direction` is always normalized and queries never report trigger volumes.
pub trait SensorQuery {
    /// All solid intersections along the segment, sorted ascending by distance
    fn query_all_along_segment(&self, origin: Vec3, direction: Vec3, max_distance: f32)
        -> Vec<SensorHit>;

    /// The first intersection against surfaces selected by `mask`
    fn query_first_along_segment(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: SurfaceMask,
    ) -> Option<SensorHit>;

    /// Whether `owner` is `root` itself or one of its descendants
    fn is_part_of(&self, owner: EntityId, root: EntityId) -> bool {
        owner == root
    }
}

/// The agent's own collision shapes, excluded from sensing
///
/// Filled once when the agent is built and never changed afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelfShapes {
    shapes: HashSet<ShapeId>,
}

impl SelfShapes {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a shape belongs to the agent
    pub fn contains(&self, shape: ShapeId) -> bool {
        self.shapes.contains(&shape)
    }

    /// Number of shapes
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl FromIterator<ShapeId> for SelfShapes {
    fn from_iter<I: IntoIterator<Item = ShapeId>>(iter: I) -> Self {
        Self {
            shapes: iter.into_iter().collect(),
        }
    }
}
