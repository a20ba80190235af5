//! Per-state update handlers, dispatched by state tag

use crate::agent::{GuardAgent, TickInput};
use crate::navigation::{has_arrived, Navigator};
use crate::state_machine::StateTag;
use crate::steering;
use crate::timed_task::{TaskKind, TimedTask};

/// Update function of a single state
pub(crate) type StateUpdate<N> = fn(&mut GuardAgent<N>, &mut TickInput<'_>, f32);

/// Look up the handler for a state
pub(crate) fn handler_for<N: Navigator>(tag: StateTag) -> StateUpdate<N> {
    match tag {
        StateTag::Patrol => patrol::<N>,
        StateTag::Suspicious => suspicious::<N>,
        StateTag::Investigate => investigate::<N>,
        StateTag::Alert => alert::<N>,
        StateTag::Chase => chase::<N>,
        StateTag::Attack => attack::<N>,
        StateTag::ReturnToPatrol => return_to_patrol::<N>,
    }
}

fn patrol<N: Navigator>(agent: &mut GuardAgent<N>, _input: &mut TickInput<'_>, dt: f32) {
    if agent.target_visible {
        agent.begin_suspicious();
        return;
    }
    if agent.route.is_empty() {
        return;
    }

    let heading = agent.navigator.desired_velocity();
    agent.facing = steering::turn_towards(agent.facing, heading, dt, agent.config.patrol.turn_rate);

    // Arrivals are ignored while dwelling or finishing an alert look
    if has_arrived(&agent.navigator) && !agent.tasks.is_active() {
        agent.start_task(TimedTask::patrol_dwell(&agent.config));
    }
}

fn suspicious<N: Navigator>(agent: &mut GuardAgent<N>, input: &mut TickInput<'_>, dt: f32) {
    if agent.target_visible {
        agent.suspicious_timer = (agent.suspicious_timer - dt).max(0.0);
        if agent.suspicious_timer <= 0.0 {
            agent.begin_chase(input.target);
        }
    } else {
        agent.relax_to_patrol();
    }
}

fn investigate<N: Navigator>(agent: &mut GuardAgent<N>, _input: &mut TickInput<'_>, dt: f32) {
    let Some(destination) = agent.machine.current().destination() else {
        return;
    };

    // Look-around owns the facing once the approach is over
    if agent.tasks.is_running(TaskKind::Investigate) && !has_arrived(&agent.navigator) {
        let heading = destination - agent.position;
        agent.facing =
            steering::turn_towards(agent.facing, heading, dt, agent.config.investigate.turn_rate);
    }
}

fn alert<N: Navigator>(agent: &mut GuardAgent<N>, _input: &mut TickInput<'_>, _dt: f32) {
    if has_arrived(&agent.navigator) {
        agent.begin_suspicious();
        agent.start_task(TimedTask::alert_look(&agent.config));
    }
}

fn chase<N: Navigator>(agent: &mut GuardAgent<N>, input: &mut TickInput<'_>, dt: f32) {
    let chase = agent.config.chase.clone();

    let Some(target) = input.target else {
        return;
    };

    let distance = agent.position.distance(target.position);
    if distance <= agent.combat.attack_range() {
        agent.begin_attack();
        return;
    }

    if agent.target_visible {
        agent.lost_sight_timer = 0.0;
        agent.last_known_target_position = Some(target.position);
        agent.navigator.set_destination(target.position);
        let heading = target.position - agent.position;
        agent.facing = steering::turn_towards(agent.facing, heading, dt, chase.turn_rate);
    } else {
        agent.lost_sight_timer += dt;
        if agent.lost_sight_timer > chase.lose_sight_time || distance > chase.max_chase_distance {
            give_up_chase(agent);
        }
    }
}

fn give_up_chase<N: Navigator>(agent: &mut GuardAgent<N>) {
    let destination = agent.last_known_target_position.unwrap_or(agent.position);
    log::debug!("Lost the target, investigating {}", destination);
    agent.begin_investigate(destination);
}

fn attack<N: Navigator>(agent: &mut GuardAgent<N>, input: &mut TickInput<'_>, dt: f32) {
    let Some(target) = input.target else {
        return;
    };

    let heading = target.position - agent.position;
    agent.facing = steering::turn_towards(agent.facing, heading, dt, agent.config.chase.turn_rate);

    let distance = heading.length();
    let combat = &agent.config.combat;
    if distance > combat.attack_range + combat.attack_range_margin {
        agent.begin_chase(Some(target));
        return;
    }

    agent
        .combat
        .try_attack(agent.id, target.entity, distance, &mut *input.damage);
}

fn return_to_patrol<N: Navigator>(agent: &mut GuardAgent<N>, input: &mut TickInput<'_>, dt: f32) {
    agent.return_to_patrol();
    patrol(agent, input, dt);
}
