//! Guard agent: owns the perception, detection and behavior state of one NPC
//!
//! The host drives an agent with [`GuardAgent::update`] once per tick and
//! feeds it noise through [`NoiseListener`]. Per tick the agent:
//! 1. advances its clock and the attack cooldown
//! 2. evaluates target visibility once
//! 3. updates the detection meter (escalation forces Chase)
//! 4. polls the running timed task
//! 5. runs the handler of the current state

use crate::combat::{CombatController, DamageSink};
use crate::config::SentryConfig;
use crate::detection::DetectionMeter;
use crate::navigation::Navigator;
use crate::noise::{NoiseEvent, NoiseListener};
use crate::perception::{is_target_visible, Eye, SightParams, TrackedTarget};
use crate::sensor::{EntityId, SelfShapes, SensorQuery, ShapeId};
use crate::state_machine::{GuardState, StateMachine, StateTag};
use crate::states;
use crate::steering;
use crate::timed_task::{TaskAction, TaskKind, TaskOutcome, TaskPoll, TaskSlot, TimedTask};
use glam::{Quat, Vec3};

/// Per-tick world view handed to the agent by the host
pub struct TickInput<'a> {
    /// Current position of the agent body
    pub position: Vec3,
    /// Tracked target, if one exists this tick
    pub target: Option<TrackedTarget>,
    /// Spatial queries for line of sight
    pub sensor: &'a dyn SensorQuery,
    /// Receiver of melee damage
    pub damage: &'a mut dyn DamageSink,
}

impl<'a> TickInput<'a> {
    /// Create tick input with no target
    pub fn new(position: Vec3, sensor: &'a dyn SensorQuery, damage: &'a mut dyn DamageSink) -> Self {
        Self {
            position,
            target: None,
            sensor,
            damage,
        }
    }

    /// Set the tracked target
    pub fn with_target(mut self, target: TrackedTarget) -> Self {
        self.target = Some(target);
        self
    }
}

/// Builder for [`GuardAgent`]
pub struct GuardAgentBuilder<N: Navigator> {
    navigator: N,
    config: SentryConfig,
    id: Option<EntityId>,
    route: Vec<Vec3>,
    self_shapes: SelfShapes,
    position: Vec3,
    facing: Quat,
    has_eye: bool,
}

impl<N: Navigator> GuardAgentBuilder<N> {
    /// Set tuning (sanitized on build)
    pub fn with_config(mut self, config: SentryConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the agent's own entity
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the patrol route
    pub fn with_route(mut self, route: impl IntoIterator<Item = Vec3>) -> Self {
        self.route = route.into_iter().collect();
        self
    }

    /// Set the agent's own collision shapes
    pub fn with_self_shapes(mut self, shapes: impl IntoIterator<Item = ShapeId>) -> Self {
        self.self_shapes = shapes.into_iter().collect();
        self
    }

    /// Set the spawn position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set the spawn facing
    pub fn with_facing(mut self, facing: Quat) -> Self {
        self.facing = facing;
        self
    }

    /// Build an agent with no eye; it never sees the target
    pub fn without_eye(mut self) -> Self {
        self.has_eye = false;
        self
    }

    /// Build the agent in Patrol, heading for the first waypoint
    pub fn build(self) -> GuardAgent<N> {
        let config = self.config.sanitized();
        let mut agent = GuardAgent {
            id: self.id,
            sight: SightParams::from(&config.vision),
            meter: DetectionMeter::from(&config.detection),
            combat: CombatController::new(&config.combat),
            config,
            navigator: self.navigator,
            machine: StateMachine::new(GuardState::Patrol),
            tasks: TaskSlot::new(),
            route: self.route,
            patrol_index: 0,
            self_shapes: self.self_shapes,
            has_eye: self.has_eye,
            position: self.position,
            facing: self.facing,
            clock: 0.0,
            suspicious_timer: 0.0,
            lost_sight_timer: 0.0,
            last_known_target_position: None,
            investigate_destination: None,
            target_visible: false,
        };
        agent.issue_patrol_destination();
        agent
    }
}

/// A guard NPC
pub struct GuardAgent<N: Navigator> {
    pub(crate) id: Option<EntityId>,
    pub(crate) config: SentryConfig,
    pub(crate) sight: SightParams,
    pub(crate) navigator: N,
    pub(crate) machine: StateMachine,
    pub(crate) meter: DetectionMeter,
    pub(crate) combat: CombatController,
    pub(crate) tasks: TaskSlot,
    pub(crate) route: Vec<Vec3>,
    pub(crate) patrol_index: usize,
    pub(crate) self_shapes: SelfShapes,
    pub(crate) has_eye: bool,
    pub(crate) position: Vec3,
    pub(crate) facing: Quat,
    /// Accumulated agent time
    pub(crate) clock: f32,
    pub(crate) suspicious_timer: f32,
    pub(crate) lost_sight_timer: f32,
    pub(crate) last_known_target_position: Option<Vec3>,
    pub(crate) investigate_destination: Option<Vec3>,
    /// Visibility computed this tick
    pub(crate) target_visible: bool,
}

impl<N: Navigator> GuardAgent<N> {
    /// Start building an agent around a navigator
    pub fn builder(navigator: N) -> GuardAgentBuilder<N> {
        GuardAgentBuilder {
            navigator,
            config: SentryConfig::default(),
            id: None,
            route: Vec::new(),
            self_shapes: SelfShapes::new(),
            position: Vec3::ZERO,
            facing: Quat::IDENTITY,
            has_eye: true,
        }
    }

    /// Create an agent with a config and patrol route
    pub fn new(navigator: N, config: SentryConfig, route: Vec<Vec3>) -> Self {
        Self::builder(navigator).with_config(config).with_route(route).build()
    }

    /// Advance the agent by one tick
    pub fn update(&mut self, delta_time: f32, input: &mut TickInput<'_>) {
        let delta_time = delta_time.max(0.0);
        self.clock += delta_time;
        self.position = input.position;

        let attacking = self.machine.is_in(StateTag::Attack);
        self.combat.tick_cooldown(delta_time, attacking);

        self.target_visible = self.sense(input);
        if let Some(target) = input.target {
            let reading = self.meter.update(self.target_visible, delta_time);
            if reading.escalated {
                log::debug!("Detection escalated at meter {:.2}", reading.meter);
                self.begin_chase(Some(target));
            }
        }

        self.poll_task(delta_time);

        let handler = states::handler_for::<N>(self.machine.tag());
        handler(self, input, delta_time);
    }

    /// React to a noise that reached the agent
    pub fn on_noise(&mut self, event: &NoiseEvent) {
        if self.machine.current().is_engaged() {
            return;
        }

        self.investigate_destination = Some(event.position);
        if event.intensity >= self.config.investigate.loud_noise_alert_threshold {
            log::debug!("Loud noise ({:.2}) at {}", event.intensity, event.position);
            self.transition(GuardState::Alert {
                destination: event.position,
            });
            self.navigator.set_destination(event.position);
        } else {
            log::debug!("Noise ({:.2}) at {}", event.intensity, event.position);
            self.begin_investigate(event.position);
        }
    }

    /// Put the agent into `state` as if it had transitioned there itself
    pub fn force_state(&mut self, state: GuardState) {
        match state {
            GuardState::Patrol => self.return_to_patrol(),
            // Resolved into Patrol by the next update
            GuardState::ReturnToPatrol => self.transition(state),
            GuardState::Suspicious => self.begin_suspicious(),
            GuardState::Investigate { destination } => self.begin_investigate(destination),
            GuardState::Alert { destination } => {
                self.investigate_destination = Some(destination);
                self.transition(state);
                self.navigator.set_destination(destination);
            }
            GuardState::Chase => self.begin_chase(None),
            GuardState::Attack => self.begin_attack(),
        }
    }

    /// Clear detection and resume the route at the current waypoint
    pub fn return_to_patrol(&mut self) {
        self.transition(GuardState::Patrol);
        self.meter.reset();
        self.issue_patrol_destination();
    }

    /// Agent's own entity
    pub fn id(&self) -> Option<EntityId> {
        self.id
    }

    /// Current state
    pub fn state(&self) -> &GuardState {
        self.machine.current()
    }

    /// Previous state
    pub fn previous_state(&self) -> Option<&GuardState> {
        self.machine.previous()
    }

    /// Check if in a specific state
    pub fn is_in(&self, tag: StateTag) -> bool {
        self.machine.is_in(tag)
    }

    /// Detection meter
    pub fn meter(&self) -> &DetectionMeter {
        &self.meter
    }

    /// Combat controller
    pub fn combat(&self) -> &CombatController {
        &self.combat
    }

    /// Effective (sanitized) tuning
    pub fn config(&self) -> &SentryConfig {
        &self.config
    }

    /// Navigator driven by this agent
    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Mutable navigator, for hosts that step it between ticks
    pub fn navigator_mut(&mut self) -> &mut N {
        &mut self.navigator
    }

    pub fn suspicious_timer(&self) -> f32 {
        self.suspicious_timer
    }

    pub fn lost_sight_timer(&self) -> f32 {
        self.lost_sight_timer
    }

    pub fn patrol_index(&self) -> usize {
        self.patrol_index
    }

    pub fn route(&self) -> &[Vec3] {
        &self.route
    }

    pub fn last_known_target_position(&self) -> Option<Vec3> {
        self.last_known_target_position
    }

    pub fn investigate_destination(&self) -> Option<Vec3> {
        self.investigate_destination
    }

    /// Kind of the running timed task
    pub fn active_task(&self) -> Option<TaskKind> {
        self.tasks.kind()
    }

    /// Whether the target was visible on the last tick
    pub fn target_visible(&self) -> bool {
        self.target_visible
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn facing(&self) -> Quat {
        self.facing
    }

    /// Eye pose derived from position, eye height and facing
    pub fn eye(&self) -> Option<Eye> {
        if !self.has_eye {
            return None;
        }
        let position = self.position + Vec3::Y * self.config.vision.eye_height;
        Some(Eye::new(position, steering::forward(self.facing)))
    }

    fn sense(&self, input: &TickInput<'_>) -> bool {
        let (Some(eye), Some(target)) = (self.eye(), input.target.as_ref()) else {
            return false;
        };
        is_target_visible(input.sensor, &eye, target, &self.sight, &self.self_shapes)
    }

    fn poll_task(&mut self, delta_time: f32) {
        let Some(poll) = self.tasks.poll(&self.navigator, delta_time) else {
            return;
        };

        match poll {
            TaskPoll::Running(TaskAction::Idle) => {}
            TaskPoll::Running(TaskAction::LookAround) => {
                let investigate = &self.config.investigate;
                self.facing = steering::look_around(
                    self.facing,
                    self.clock,
                    delta_time,
                    investigate.look_turn_rate,
                    investigate.look_frequency,
                );
            }
            TaskPoll::Finished(TaskOutcome::Completed(TaskKind::PatrolDwell)) => {
                self.advance_patrol_point();
            }
            TaskPoll::Finished(TaskOutcome::Completed(TaskKind::Investigate))
            | TaskPoll::Finished(TaskOutcome::Completed(TaskKind::AlertLook)) => {
                self.return_to_patrol();
            }
            TaskPoll::Finished(TaskOutcome::Cancelled(_)) => {}
        }
    }

    /// Record a state change, cancelling the outstanding task
    pub(crate) fn transition(&mut self, to: GuardState) {
        self.tasks.cancel();
        self.machine.force_transition(to);
    }

    /// Drop back to Patrol; an alert look keeps sweeping until it completes
    pub(crate) fn relax_to_patrol(&mut self) {
        if !self.tasks.is_running(TaskKind::AlertLook) {
            self.tasks.cancel();
        }
        self.machine.force_transition(GuardState::Patrol);
    }

    pub(crate) fn start_task(&mut self, task: TimedTask) {
        self.tasks.start(task);
    }

    pub(crate) fn begin_suspicious(&mut self) {
        self.transition(GuardState::Suspicious);
        self.suspicious_timer = self.config.investigate.suspicious_delay;
    }

    pub(crate) fn begin_investigate(&mut self, destination: Vec3) {
        self.transition(GuardState::Investigate { destination });
        self.investigate_destination = Some(destination);
        self.navigator.set_destination(destination);
        self.start_task(TimedTask::investigate(&self.config));
    }

    pub(crate) fn begin_chase(&mut self, target: Option<TrackedTarget>) {
        self.transition(GuardState::Chase);
        self.lost_sight_timer = 0.0;
        if let Some(target) = target {
            self.last_known_target_position = Some(target.position);
            self.navigator.set_destination(target.position);
        }
    }

    pub(crate) fn begin_attack(&mut self) {
        self.transition(GuardState::Attack);
        self.navigator.stop();
    }

    pub(crate) fn issue_patrol_destination(&mut self) {
        if let Some(waypoint) = self.route.get(self.patrol_index) {
            self.navigator.set_destination(*waypoint);
        }
    }

    fn advance_patrol_point(&mut self) {
        if self.route.is_empty() {
            return;
        }
        self.patrol_index = (self.patrol_index + 1) % self.route.len();
        log::trace!("Patrol waypoint {}", self.patrol_index);
        self.issue_patrol_destination();
    }
}

impl<N: Navigator> NoiseListener for GuardAgent<N> {
    fn listener_position(&self) -> Vec3 {
        self.position
    }

    fn on_noise(&mut self, event: &NoiseEvent) {
        GuardAgent::on_noise(self, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::NullDamageSink;
    use crate::sensor::{SensorHit, SurfaceMask};

    #[derive(Default)]
    struct StillNav {
        destinations: Vec<Vec3>,
        stops: usize,
    }

    impl Navigator for StillNav {
        fn set_destination(&mut self, point: Vec3) {
            self.destinations.push(point);
        }

        fn is_path_pending(&self) -> bool {
            false
        }

        fn remaining_distance(&self) -> f32 {
            100.0
        }

        fn stopping_distance(&self) -> f32 {
            0.0
        }

        fn desired_velocity(&self) -> Vec3 {
            Vec3::ZERO
        }

        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    struct OpenField;

    impl SensorQuery for OpenField {
        fn query_all_along_segment(&self, _: Vec3, _: Vec3, _: f32) -> Vec<SensorHit> {
            Vec::new()
        }

        fn query_first_along_segment(&self, _: Vec3, _: Vec3, _: f32, _: SurfaceMask) -> Option<SensorHit> {
            None
        }
    }

    #[test]
    fn test_spawn_issues_first_waypoint() {
        let route = vec![Vec3::new(5.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 5.0)];
        let agent = GuardAgent::new(StillNav::default(), SentryConfig::default(), route);

        assert!(agent.is_in(StateTag::Patrol));
        assert_eq!(agent.navigator().destinations, vec![Vec3::new(5.0, 0.0, 0.0)]);
        assert_eq!(agent.meter().value(), 0.0);
        assert_eq!(agent.patrol_index(), 0);
    }

    #[test]
    fn test_empty_route_issues_nothing() {
        let agent = GuardAgent::new(StillNav::default(), SentryConfig::default(), Vec::new());
        assert!(agent.navigator().destinations.is_empty());
    }

    #[test]
    fn test_build_sanitizes_config() {
        let mut config = SentryConfig::default();
        config.vision.field_of_view = 720.0;
        let agent = GuardAgent::builder(StillNav::default()).with_config(config).build();
        assert_eq!(agent.config().vision.field_of_view, 360.0);
    }

    #[test]
    fn test_eye_follows_position_and_facing() {
        let agent = GuardAgent::builder(StillNav::default())
            .with_position(Vec3::new(1.0, 0.0, 2.0))
            .build();
        let eye = agent.eye().unwrap();
        assert_eq!(eye.position, Vec3::new(1.0, 1.6, 2.0));
        assert_eq!(eye.forward, Vec3::Z);

        let blind = GuardAgent::builder(StillNav::default()).without_eye().build();
        assert!(blind.eye().is_none());
    }

    #[test]
    fn test_transition_cancels_task() {
        let mut agent = GuardAgent::new(StillNav::default(), SentryConfig::default(), Vec::new());
        agent.on_noise(&NoiseEvent::new(Vec3::new(3.0, 0.0, 0.0), 10.0, 0.2));
        assert_eq!(agent.active_task(), Some(TaskKind::Investigate));

        agent.force_state(GuardState::Chase);
        assert_eq!(agent.active_task(), None);
        assert_eq!(agent.previous_state().map(GuardState::tag), Some(StateTag::Investigate));
    }

    #[test]
    fn test_force_attack_stops_navigation() {
        let mut agent = GuardAgent::new(StillNav::default(), SentryConfig::default(), Vec::new());
        agent.force_state(GuardState::Attack);
        assert!(agent.is_in(StateTag::Attack));
        assert_eq!(agent.navigator().stops, 1);
    }

    #[test]
    fn test_no_target_keeps_meter_still() {
        let mut agent = GuardAgent::new(StillNav::default(), SentryConfig::default(), Vec::new());
        let mut sink = NullDamageSink;
        let mut input = TickInput::new(Vec3::ZERO, &OpenField, &mut sink);

        for _ in 0..10 {
            agent.update(0.1, &mut input);
        }
        assert_eq!(agent.meter().value(), 0.0);
        assert!(!agent.target_visible());
        assert!(agent.is_in(StateTag::Patrol));
    }

    #[test]
    fn test_return_to_patrol_state_resolves_on_update() {
        let route = vec![Vec3::X];
        let mut agent = GuardAgent::new(StillNav::default(), SentryConfig::default(), route);
        agent.force_state(GuardState::Chase);
        agent.force_state(GuardState::ReturnToPatrol);
        assert!(agent.is_in(StateTag::ReturnToPatrol));

        let mut sink = NullDamageSink;
        let mut input = TickInput::new(Vec3::ZERO, &OpenField, &mut sink);
        agent.update(0.1, &mut input);

        assert!(agent.is_in(StateTag::Patrol));
        assert_eq!(agent.previous_state(), Some(&GuardState::ReturnToPatrol));
        assert_eq!(agent.meter().value(), 0.0);
        assert_eq!(agent.navigator().destinations, vec![Vec3::X, Vec3::X]);
    }
}
