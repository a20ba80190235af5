//! Guard behavior states and the machine that tracks them

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Behavior state of a guard
///
/// Only states that need extra data carry a payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum GuardState {
    /// Walking the patrol route
    #[default]
    Patrol,
    /// Target glimpsed; confirming before a chase
    Suspicious,
    /// Walking to a point of interest and looking around
    Investigate { destination: Vec3 },
    /// Rushing to a loud noise
    Alert { destination: Vec3 },
    /// Pursuing the target
    Chase,
    /// In melee range of the target
    Attack,
    /// Hand-back to the route; resolves into Patrol with a cleared meter on the next update
    ReturnToPatrol,
}

/// Payload-free tag of a [`GuardState`], used as the dispatch key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateTag {
    Patrol,
    Suspicious,
    Investigate,
    Alert,
    Chase,
    Attack,
    ReturnToPatrol,
}

impl GuardState {
    /// Tag of this state
    pub fn tag(&self) -> StateTag {
        match self {
            GuardState::Patrol => StateTag::Patrol,
            GuardState::Suspicious => StateTag::Suspicious,
            GuardState::Investigate { .. } => StateTag::Investigate,
            GuardState::Alert { .. } => StateTag::Alert,
            GuardState::Chase => StateTag::Chase,
            GuardState::Attack => StateTag::Attack,
            GuardState::ReturnToPatrol => StateTag::ReturnToPatrol,
        }
    }

    /// Destination carried by Investigate and Alert
    pub fn destination(&self) -> Option<Vec3> {
        match self {
            GuardState::Investigate { destination } | GuardState::Alert { destination } => {
                Some(*destination)
            }
            _ => None,
        }
    }

    /// Whether the guard is fully engaged and ignores noise
    pub fn is_engaged(&self) -> bool {
        matches!(
            self.tag(),
            StateTag::Alert | StateTag::Chase | StateTag::Attack
        )
    }
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Tracks the current and previous guard state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMachine {
    /// Current state
    current: GuardState,
    /// Previous state
    previous: Option<GuardState>,
    /// Number of transitions taken
    transitions: u64,
}

impl StateMachine {
    /// Create a new state machine
    pub fn new(initial: GuardState) -> Self {
        Self {
            current: initial,
            previous: None,
            transitions: 0,
        }
    }

    /// Get current state
    pub fn current(&self) -> &GuardState {
        &self.current
    }

    /// Get previous state
    pub fn previous(&self) -> Option<&GuardState> {
        self.previous.as_ref()
    }

    /// Tag of the current state
    pub fn tag(&self) -> StateTag {
        self.current.tag()
    }

    /// Check if in a specific state
    pub fn is_in(&self, tag: StateTag) -> bool {
        self.current.tag() == tag
    }

    /// Number of transitions taken since creation
    pub fn transition_count(&self) -> u64 {
        self.transitions
    }

    /// Switch to a state, returning the one left
    pub fn force_transition(&mut self, to: GuardState) -> GuardState {
        log::debug!("Guard state {} -> {}", self.current.tag(), to.tag());
        let from = std::mem::replace(&mut self.current, to);
        self.previous = Some(from);
        self.transitions += 1;
        from
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(GuardState::Patrol)
    }
}
