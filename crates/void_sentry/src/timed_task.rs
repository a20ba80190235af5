//! Cancellable timed tasks
//!
//! Every "wait, then act" behavior of the agent (patrol dwell, investigate
//! approach and look-around, alert look-around) is a [`TimedTask`]: a list of
//! steps polled once per tick. Tasks never block. The owning state decides
//! what completion means; cancellation drops the task without running that
//! completion.

use crate::config::SentryConfig;
use crate::navigation::{is_approaching, Navigator};
use serde::{Deserialize, Serialize};

/// Which behavior a task belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Pause at a patrol waypoint
    PatrolDwell,
    /// Walk to an investigation point, then look around
    Investigate,
    /// Short look-around after a loud-noise response
    AlertLook,
}

/// A single step of a task
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TaskStep {
    /// Wait for a fixed time
    Wait { duration: f32 },
    /// Wait until the navigator is within `stop_distance`, at most `timeout`
    Approach { stop_distance: f32, timeout: f32 },
    /// Sweep the head back and forth for a fixed time
    LookAround { duration: f32 },
}

/// What the owner should do this tick while a task runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// Nothing special
    Idle,
    /// Apply a look-around sweep
    LookAround,
}

/// How a task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// All steps finished; the owner runs its completion action
    Completed(TaskKind),
    /// Stopped early; no completion action
    Cancelled(TaskKind),
}

/// Result of polling a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPoll {
    /// Still running
    Running(TaskAction),
    /// Finished this tick
    Finished(TaskOutcome),
}

/// A tick-polled task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedTask {
    kind: TaskKind,
    steps: Vec<TaskStep>,
    /// Index of the running step
    current: usize,
    /// Time spent in the running step
    elapsed: f32,
}

impl TimedTask {
    /// Create a task from a list of steps
    pub fn new(kind: TaskKind, steps: Vec<TaskStep>) -> Self {
        Self {
            kind,
            steps,
            current: 0,
            elapsed: 0.0,
        }
    }

    /// Dwell at a patrol waypoint
    pub fn patrol_dwell(config: &SentryConfig) -> Self {
        Self::new(
            TaskKind::PatrolDwell,
            vec![TaskStep::Wait {
                duration: config.patrol.stop_delay,
            }],
        )
    }

    /// Approach an investigation point (bounded), then look around
    pub fn investigate(config: &SentryConfig) -> Self {
        let investigate = &config.investigate;
        Self::new(
            TaskKind::Investigate,
            vec![
                TaskStep::Approach {
                    stop_distance: investigate.stop_distance,
                    timeout: investigate.approach_timeout,
                },
                TaskStep::LookAround {
                    duration: investigate.look_duration,
                },
            ],
        )
    }

    /// Short look-around with no approach phase
    pub fn alert_look(config: &SentryConfig) -> Self {
        Self::new(
            TaskKind::AlertLook,
            vec![TaskStep::LookAround {
                duration: config.investigate.suspicious_look_duration,
            }],
        )
    }

    /// Task kind
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// The running step, if any remain
    pub fn current_step(&self) -> Option<&TaskStep> {
        self.steps.get(self.current)
    }

    /// Advance by one tick
    ///
    /// Finished steps hand over to the next step within the same tick.
    pub fn poll(&mut self, nav: &dyn Navigator, delta_time: f32) -> TaskPoll {
        loop {
            let Some(step) = self.steps.get(self.current).copied() else {
                return TaskPoll::Finished(TaskOutcome::Completed(self.kind));
            };

            match step {
                TaskStep::Wait { duration } => {
                    self.elapsed += delta_time;
                    if self.elapsed < duration {
                        return TaskPoll::Running(TaskAction::Idle);
                    }
                }
                TaskStep::Approach {
                    stop_distance,
                    timeout,
                } => {
                    if is_approaching(nav, stop_distance) && self.elapsed < timeout {
                        self.elapsed += delta_time;
                        return TaskPoll::Running(TaskAction::Idle);
                    }
                }
                TaskStep::LookAround { duration } => {
                    if self.elapsed < duration {
                        self.elapsed += delta_time;
                        return TaskPoll::Running(TaskAction::LookAround);
                    }
                }
            }

            self.current += 1;
            self.elapsed = 0.0;
        }
    }
}

/// Holder enforcing at most one running task per agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSlot {
    active: Option<TimedTask>,
}

impl TaskSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a task, cancelling whatever was running
    pub fn start(&mut self, task: TimedTask) -> Option<TaskOutcome> {
        let cancelled = self.cancel();
        log::trace!("Starting {:?} task", task.kind());
        self.active = Some(task);
        cancelled
    }

    /// Cancel the running task without completing it
    pub fn cancel(&mut self) -> Option<TaskOutcome> {
        self.active.take().map(|task| {
            log::trace!("Cancelled {:?} task", task.kind());
            TaskOutcome::Cancelled(task.kind())
        })
    }

    /// Poll the running task; the slot empties when it finishes
    pub fn poll(&mut self, nav: &dyn Navigator, delta_time: f32) -> Option<TaskPoll> {
        let task = self.active.as_mut()?;
        let poll = task.poll(nav, delta_time);
        if let TaskPoll::Finished(outcome) = poll {
            log::trace!("Finished task: {:?}", outcome);
            self.active = None;
        }
        Some(poll)
    }

    /// Kind of the running task
    pub fn kind(&self) -> Option<TaskKind> {
        self.active.as_ref().map(TimedTask::kind)
    }

    /// Whether a task of `kind` is running
    pub fn is_running(&self, kind: TaskKind) -> bool {
        self.kind() == Some(kind)
    }

    /// Whether any task is running
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }
}
