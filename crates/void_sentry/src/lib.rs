//! Void Sentry - Guard Perception and Behavior Core
//!
//! This crate drives guard NPCs: line-of-sight perception, a detection meter,
//! a patrol/investigate/chase/attack state machine and noise reactions. Path
//! planning, physics queries and damage application stay with the host behind
//! the [`Navigator`], [`SensorQuery`] and [`DamageSink`] traits.
//!
//! # Features
//!
//! - Two-pass line-of-sight checks that skip the agent's own shapes
//! - Hysteresis detection meter with one-shot escalation
//! - Tag-dispatched behavior states with cancellable timed tasks
//! - Melee cooldown gating
//! - Noise broadcast bus, including impact noise from thrown objects
//!
//! # Example
//!
//! ```ignore
//! use void_sentry::prelude::*;
//!
//! let mut guard = GuardAgent::builder(nav)
//!     .with_route(waypoints)
//!     .with_self_shapes(body_shapes)
//!     .build();
//!
//! let mut input = TickInput::new(body_position, &physics, &mut health)
//!     .with_target(TrackedTarget::new(player, player_position));
//! guard.update(dt, &mut input);
//! ```

pub mod agent;
pub mod combat;
pub mod config;
pub mod detection;
pub mod error;
pub mod navigation;
pub mod noise;
pub mod perception;
pub mod sensor;
pub mod state_machine;
mod states;
pub mod steering;
pub mod timed_task;

pub mod prelude {
    pub use crate::agent::{GuardAgent, GuardAgentBuilder, TickInput};
    pub use crate::combat::{CombatController, DamageInfo, DamageSink, DamageType, NullDamageSink};
    pub use crate::config::{
        ChaseConfig, CombatConfig, CooldownPolicy, DetectionConfig, InvestigateConfig,
        PatrolConfig, SentryConfig, VisionConfig,
    };
    pub use crate::detection::{DetectionMeter, DetectionReading};
    pub use crate::error::{Result, SentryError};
    pub use crate::navigation::{has_arrived, Navigator};
    pub use crate::noise::{ImpactNoise, NoiseBus, NoiseEmitter, NoiseEvent, NoiseListener};
    pub use crate::perception::{is_target_visible, Eye, SightParams, TrackedTarget};
    pub use crate::sensor::{
        EntityId, SelfShapes, SensorHit, SensorQuery, ShapeId, SurfaceLayer, SurfaceMask,
    };
    pub use crate::state_machine::{GuardState, StateMachine, StateTag};
    pub use crate::timed_task::{TaskKind, TaskOutcome, TaskSlot, TimedTask};
}

pub use prelude::*;
