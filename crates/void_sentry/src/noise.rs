//! Noise stimuli and their broadcast bus
//!
//! Emitters push [`NoiseEvent`]s through a cloneable [`NoiseEmitter`]; the
//! host drains the [`NoiseBus`] between ticks and every listener within the
//! noise radius hears each event once.

use crossbeam_channel::{Receiver, Sender};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A transient noise stimulus
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseEvent {
    /// Source position
    pub position: Vec3,
    /// Audible radius
    pub radius: f32,
    /// Loudness in `[0, 1]`
    pub intensity: f32,
}

impl NoiseEvent {
    /// Create a noise event; intensity is clamped to `[0, 1]`
    pub fn new(position: Vec3, radius: f32, intensity: f32) -> Self {
        Self {
            position,
            radius: radius.max(0.0),
            intensity: intensity.clamp(0.0, 1.0),
        }
    }

    /// Whether a listener at `point` is within the radius
    pub fn reaches(&self, point: Vec3) -> bool {
        self.position.distance_squared(point) <= self.radius * self.radius
    }
}

/// Anything that reacts to noise
pub trait NoiseListener {
    /// Where the listener hears from
    fn listener_position(&self) -> Vec3;

    /// Handle a noise that reached the listener
    fn on_noise(&mut self, event: &NoiseEvent);
}

/// Cloneable handle used by noise sources
#[derive(Debug, Clone)]
pub struct NoiseEmitter {
    sender: Sender<NoiseEvent>,
}

impl NoiseEmitter {
    /// Queue a noise for the next dispatch
    pub fn broadcast(&self, position: Vec3, radius: f32, intensity: f32) {
        self.emit(NoiseEvent::new(position, radius, intensity));
    }

    /// Queue a prepared noise event
    pub fn emit(&self, event: NoiseEvent) {
        // The bus owns the receiver; a dropped bus means nobody is listening
        let _ = self.sender.send(event);
    }
}

/// Broadcast channel for noise events
#[derive(Debug)]
pub struct NoiseBus {
    sender: Sender<NoiseEvent>,
    receiver: Receiver<NoiseEvent>,
}

impl NoiseBus {
    /// Create a new bus
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// Create an emitter bound to this bus
    pub fn emitter(&self) -> NoiseEmitter {
        NoiseEmitter {
            sender: self.sender.clone(),
        }
    }

    /// Queue a noise directly on the bus
    pub fn broadcast(&self, position: Vec3, radius: f32, intensity: f32) {
        let _ = self.sender.send(NoiseEvent::new(position, radius, intensity));
    }

    /// Deliver every queued noise to the listeners it reaches
    ///
    /// Returns the number of deliveries. Listener order is the slice order
    /// and carries no meaning.
    pub fn dispatch<L: NoiseListener>(&self, listeners: &mut [L]) -> usize {
        let mut deliveries = 0;
        for event in self.receiver.try_iter() {
            for listener in listeners.iter_mut() {
                if event.reaches(listener.listener_position()) {
                    listener.on_noise(&event);
                    deliveries += 1;
                }
            }
        }
        deliveries
    }

    /// Drop all queued noise without delivering it
    pub fn clear(&self) {
        while self.receiver.try_recv().is_ok() {}
    }

    /// Number of queued events
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

impl Default for NoiseBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps impact speed of a thrown object to a noise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactNoise {
    /// Radius of a slow impact
    pub base_radius: f32,
    /// Impacts slower than this make no noise
    pub min_impact_speed: f32,
    /// Speed that produces the loudest noise
    pub max_impact_speed: f32,
    /// Extra radius at full speed, as a multiple of `base_radius`
    pub max_radius_multiplier: f32,
}

impl Default for ImpactNoise {
    fn default() -> Self {
        Self {
            base_radius: 4.0,
            min_impact_speed: 1.0,
            max_impact_speed: 15.0,
            max_radius_multiplier: 2.0,
        }
    }
}

impl ImpactNoise {
    /// Noise caused by an impact at `speed`, if loud enough to matter
    pub fn noise_for(&self, position: Vec3, speed: f32) -> Option<NoiseEvent> {
        if speed < self.min_impact_speed {
            return None;
        }

        let span = self.max_impact_speed - self.min_impact_speed;
        let t = if span > 0.0 {
            ((speed - self.min_impact_speed) / span).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let radius = self.base_radius * (1.0 + self.max_radius_multiplier * t);
        Some(NoiseEvent::new(position, radius, t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Ear {
        position: Vec3,
        heard: Vec<NoiseEvent>,
    }

    impl Ear {
        fn at(x: f32) -> Self {
            Self {
                position: Vec3::new(x, 0.0, 0.0),
                heard: Vec::new(),
            }
        }
    }

    impl NoiseListener for Ear {
        fn listener_position(&self) -> Vec3 {
            self.position
        }

        fn on_noise(&mut self, event: &NoiseEvent) {
            self.heard.push(*event);
        }
    }

    #[test]
    fn test_event_clamps_intensity() {
        assert_eq!(NoiseEvent::new(Vec3::ZERO, 1.0, 3.0).intensity, 1.0);
        assert_eq!(NoiseEvent::new(Vec3::ZERO, 1.0, -0.5).intensity, 0.0);
        assert_eq!(NoiseEvent::new(Vec3::ZERO, -1.0, 0.5).radius, 0.0);
    }

    #[test]
    fn test_dispatch_reaches_only_in_range() {
        let bus = NoiseBus::new();
        let emitter = bus.emitter();
        let mut ears = vec![Ear::at(1.0), Ear::at(5.0), Ear::at(20.0)];

        emitter.broadcast(Vec3::ZERO, 5.0, 0.4);
        assert_eq!(bus.pending_count(), 1);
        assert_eq!(bus.dispatch(&mut ears), 2);

        assert_eq!(ears[0].heard.len(), 1);
        assert_eq!(ears[1].heard.len(), 1);
        assert!(ears[2].heard.is_empty());
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_each_event_delivered_once() {
        let bus = NoiseBus::new();
        let mut ears = vec![Ear::at(0.0)];

        bus.broadcast(Vec3::ZERO, 2.0, 0.1);
        bus.broadcast(Vec3::X, 2.0, 0.2);
        assert_eq!(bus.dispatch(&mut ears), 2);
        assert_eq!(bus.dispatch(&mut ears), 0);
        assert_eq!(ears[0].heard.len(), 2);
    }

    #[test]
    fn test_emitter_from_other_thread() {
        let bus = NoiseBus::new();
        let emitter = bus.emitter();
        std::thread::spawn(move || emitter.broadcast(Vec3::ZERO, 3.0, 1.0))
            .join()
            .unwrap();

        let mut ears = vec![Ear::at(1.0)];
        assert_eq!(bus.dispatch(&mut ears), 1);
    }

    #[test]
    fn test_clear() {
        let bus = NoiseBus::new();
        bus.broadcast(Vec3::ZERO, 3.0, 1.0);
        bus.clear();
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_impact_noise_scaling() {
        let impact = ImpactNoise::default();
        assert!(impact.noise_for(Vec3::ZERO, 0.5).is_none());

        let soft = impact.noise_for(Vec3::ZERO, 1.0).unwrap();
        assert_eq!(soft.intensity, 0.0);
        assert_eq!(soft.radius, 4.0);

        let mid = impact.noise_for(Vec3::ZERO, 8.0).unwrap();
        assert_relative_eq!(mid.intensity, 0.5, epsilon = 1e-6);
        assert_relative_eq!(mid.radius, 8.0, epsilon = 1e-5);

        let hard = impact.noise_for(Vec3::ZERO, 40.0).unwrap();
        assert_eq!(hard.intensity, 1.0);
        assert_eq!(hard.radius, 12.0);
    }
}
