//! Sentry configuration

use crate::error::{Result, SentryError};
use crate::sensor::SurfaceMask;
use serde::{Deserialize, Serialize};

/// Sight configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Maximum sight distance
    pub sight_range: f32,
    /// Full field of view cone (degrees)
    pub field_of_view: f32,
    /// Eye height above the agent origin
    pub eye_height: f32,
    /// Surfaces that occlude a target with no collidable body
    pub obstacle_mask: SurfaceMask,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            sight_range: 12.0,
            field_of_view: 110.0,
            eye_height: 1.6,
            obstacle_mask: SurfaceMask::default(),
        }
    }
}

/// Detection meter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Meter value that forces a chase
    pub threshold: f32,
    /// Meter gain per second while the target is visible
    pub gain: f32,
    /// Meter decay per second while the target is hidden
    pub lose: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: 2.0,
            gain: 1.2,
            lose: 1.0,
        }
    }
}

/// Patrol configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    /// Dwell time at each waypoint (seconds)
    pub stop_delay: f32,
    /// Turn rate while walking the route
    pub turn_rate: f32,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            stop_delay: 1.0,
            turn_rate: 6.0,
        }
    }
}

/// Hearing, investigation and suspicion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestigateConfig {
    /// Distance at which an investigation counts as arrived
    pub stop_distance: f32,
    /// Look-around duration after reaching an investigation point
    pub look_duration: f32,
    /// Look-around duration after a loud-noise response
    pub suspicious_look_duration: f32,
    /// Noise intensity at or above which the agent responds with Alert
    pub loud_noise_alert_threshold: f32,
    /// Continuous sighting needed in Suspicious before chasing
    pub suspicious_delay: f32,
    /// Upper bound on the approach wait
    pub approach_timeout: f32,
    /// Turn rate while walking to an investigation point
    pub turn_rate: f32,
    /// Peak look-around yaw speed (degrees per second)
    pub look_turn_rate: f32,
    /// Look-around oscillation frequency (radians per second)
    pub look_frequency: f32,
}

impl Default for InvestigateConfig {
    fn default() -> Self {
        Self {
            stop_distance: 0.6,
            look_duration: 3.0,
            suspicious_look_duration: 1.5,
            loud_noise_alert_threshold: 0.9,
            suspicious_delay: 3.0,
            approach_timeout: 10.0,
            turn_rate: 4.0,
            look_turn_rate: 60.0,
            look_frequency: 2.0,
        }
    }
}

/// Chase configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaseConfig {
    /// Time without sight before giving up the chase
    pub lose_sight_time: f32,
    /// Distance beyond which a hidden target is abandoned
    pub max_chase_distance: f32,
    /// Turn rate toward the target
    pub turn_rate: f32,
}

impl Default for ChaseConfig {
    fn default() -> Self {
        Self {
            lose_sight_time: 4.0,
            max_chase_distance: 25.0,
            turn_rate: 6.0,
        }
    }
}

/// When the attack cooldown counts down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CooldownPolicy {
    /// Every tick, whatever the current state
    #[default]
    Global,
    /// Only while in the Attack state
    WhileAttacking,
}

/// Melee combat configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Distance at which the agent attacks
    pub attack_range: f32,
    /// Extra distance tolerated before Attack falls back to Chase
    pub attack_range_margin: f32,
    /// Damage per hit
    pub attack_damage: f32,
    /// Seconds between hits
    pub attack_cooldown: f32,
    /// Cooldown countdown policy
    pub cooldown_policy: CooldownPolicy,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            attack_range: 2.0,
            attack_range_margin: 0.5,
            attack_damage: 10.0,
            attack_cooldown: 1.5,
            cooldown_policy: CooldownPolicy::Global,
        }
    }
}

/// Complete tuning for a sentry agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentryConfig {
    pub vision: VisionConfig,
    pub detection: DetectionConfig,
    pub patrol: PatrolConfig,
    pub investigate: InvestigateConfig,
    pub chase: ChaseConfig,
    pub combat: CombatConfig,
}

/// Smallest detection threshold that keeps the meter meaningful
pub(crate) const MIN_DETECTION_THRESHOLD: f32 = 0.01;

impl SentryConfig {
    /// Parse a configuration from JSON, filling missing fields with defaults
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Set sight range and field of view
    pub fn with_sight(mut self, range: f32, field_of_view: f32) -> Self {
        self.vision.sight_range = range;
        self.vision.field_of_view = field_of_view;
        self
    }

    /// Set detection meter tuning
    pub fn with_detection(mut self, threshold: f32, gain: f32, lose: f32) -> Self {
        self.detection = DetectionConfig {
            threshold,
            gain,
            lose,
        };
        self
    }

    /// Set the cooldown policy
    pub fn with_cooldown_policy(mut self, policy: CooldownPolicy) -> Self {
        self.combat.cooldown_policy = policy;
        self
    }

    /// Report every out-of-range tunable
    pub fn validate(&self) -> Result<()> {
        let issues = self.clone().clamp_all();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(SentryError::InvalidConfig(issues.join("; ")))
        }
    }

    /// Copy with every tunable clamped into a safe range
    ///
    /// A bad tunable never fails agent construction; each clamp is logged.
    pub fn sanitized(&self) -> Self {
        let mut config = self.clone();
        for issue in config.clamp_all() {
            log::warn!("Sentry config clamped: {}", issue);
        }
        config
    }

    fn clamp_all(&mut self) -> Vec<String> {
        let defaults = SentryConfig::default();
        let mut issues = Vec::new();
        let mut clamp = |name: &str, value: &mut f32, fallback: f32, min: f32, max: f32| {
            if !value.is_finite() {
                issues.push(format!("{} is not finite, using {}", name, fallback));
                *value = fallback;
            } else if *value < min || *value > max {
                let clamped = (*value).clamp(min, max);
                issues.push(format!("{} = {} out of range, using {}", name, *value, clamped));
                *value = clamped;
            }
        };

        let v = &mut self.vision;
        let d = &defaults.vision;
        clamp("vision.sight_range", &mut v.sight_range, d.sight_range, 0.0, f32::MAX);
        clamp("vision.field_of_view", &mut v.field_of_view, d.field_of_view, 0.0, 360.0);
        clamp("vision.eye_height", &mut v.eye_height, d.eye_height, f32::MIN, f32::MAX);

        let v = &mut self.detection;
        let d = &defaults.detection;
        clamp(
            "detection.threshold",
            &mut v.threshold,
            d.threshold,
            MIN_DETECTION_THRESHOLD,
            f32::MAX,
        );
        clamp("detection.gain", &mut v.gain, d.gain, 0.0, f32::MAX);
        clamp("detection.lose", &mut v.lose, d.lose, 0.0, f32::MAX);

        let v = &mut self.patrol;
        let d = &defaults.patrol;
        clamp("patrol.stop_delay", &mut v.stop_delay, d.stop_delay, 0.0, f32::MAX);
        clamp("patrol.turn_rate", &mut v.turn_rate, d.turn_rate, 0.0, f32::MAX);

        let v = &mut self.investigate;
        let d = &defaults.investigate;
        clamp("investigate.stop_distance", &mut v.stop_distance, d.stop_distance, 0.0, f32::MAX);
        clamp("investigate.look_duration", &mut v.look_duration, d.look_duration, 0.0, f32::MAX);
        clamp(
            "investigate.suspicious_look_duration",
            &mut v.suspicious_look_duration,
            d.suspicious_look_duration,
            0.0,
            f32::MAX,
        );
        clamp(
            "investigate.loud_noise_alert_threshold",
            &mut v.loud_noise_alert_threshold,
            d.loud_noise_alert_threshold,
            0.0,
            1.0,
        );
        clamp(
            "investigate.suspicious_delay",
            &mut v.suspicious_delay,
            d.suspicious_delay,
            0.0,
            f32::MAX,
        );
        clamp(
            "investigate.approach_timeout",
            &mut v.approach_timeout,
            d.approach_timeout,
            0.0,
            f32::MAX,
        );
        clamp("investigate.turn_rate", &mut v.turn_rate, d.turn_rate, 0.0, f32::MAX);
        clamp("investigate.look_turn_rate", &mut v.look_turn_rate, d.look_turn_rate, 0.0, f32::MAX);
        clamp("investigate.look_frequency", &mut v.look_frequency, d.look_frequency, 0.0, f32::MAX);

        let v = &mut self.chase;
        let d = &defaults.chase;
        clamp("chase.lose_sight_time", &mut v.lose_sight_time, d.lose_sight_time, 0.0, f32::MAX);
        clamp(
            "chase.max_chase_distance",
            &mut v.max_chase_distance,
            d.max_chase_distance,
            0.0,
            f32::MAX,
        );
        clamp("chase.turn_rate", &mut v.turn_rate, d.turn_rate, 0.0, f32::MAX);

        let v = &mut self.combat;
        let d = &defaults.combat;
        clamp("combat.attack_range", &mut v.attack_range, d.attack_range, 0.0, f32::MAX);
        clamp(
            "combat.attack_range_margin",
            &mut v.attack_range_margin,
            d.attack_range_margin,
            0.0,
            f32::MAX,
        );
        clamp("combat.attack_damage", &mut v.attack_damage, d.attack_damage, 0.0, f32::MAX);
        clamp("combat.attack_cooldown", &mut v.attack_cooldown, d.attack_cooldown, 0.0, f32::MAX);

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SentryConfig::default();
        assert_eq!(config.vision.sight_range, 12.0);
        assert_eq!(config.vision.field_of_view, 110.0);
        assert_eq!(config.detection.threshold, 2.0);
        assert_eq!(config.detection.gain, 1.2);
        assert_eq!(config.investigate.loud_noise_alert_threshold, 0.9);
        assert_eq!(config.combat.cooldown_policy, CooldownPolicy::Global);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sanitize_clamps_negatives() {
        let mut config = SentryConfig::default().with_sight(-5.0, 400.0);
        config.detection.threshold = -1.0;
        config.combat.attack_cooldown = -2.0;
        config.investigate.loud_noise_alert_threshold = 1.5;

        assert!(matches!(config.validate(), Err(SentryError::InvalidConfig(_))));

        let clean = config.sanitized();
        assert_eq!(clean.vision.sight_range, 0.0);
        assert_eq!(clean.vision.field_of_view, 360.0);
        assert_eq!(clean.detection.threshold, MIN_DETECTION_THRESHOLD);
        assert_eq!(clean.combat.attack_cooldown, 0.0);
        assert_eq!(clean.investigate.loud_noise_alert_threshold, 1.0);
        assert!(clean.validate().is_ok());
    }

    #[test]
    fn test_sanitize_replaces_non_finite() {
        let mut config = SentryConfig::default();
        config.chase.lose_sight_time = f32::NAN;
        config.patrol.stop_delay = f32::INFINITY;

        let clean = config.sanitized();
        assert_eq!(clean.chase.lose_sight_time, 4.0);
        assert_eq!(clean.patrol.stop_delay, 1.0);
    }

    #[test]
    fn test_from_json_partial() {
        let config = SentryConfig::from_json(
            r#"{
                "vision": { "sight_range": 20.0 },
                "combat": { "cooldown_policy": "WhileAttacking" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.vision.sight_range, 20.0);
        assert_eq!(config.vision.field_of_view, 110.0);
        assert_eq!(config.combat.cooldown_policy, CooldownPolicy::WhileAttacking);
        assert_eq!(config.chase, ChaseConfig::default());
    }

    #[test]
    fn test_from_json_malformed() {
        let result = SentryConfig::from_json("{ not json");
        assert!(matches!(result, Err(SentryError::Config(_))));
    }

    #[test]
    fn test_json_roundtrip_preserves_tuning() {
        let config = SentryConfig::default().with_detection(3.0, 0.5, 0.25);
        let text = config.to_json().unwrap();
        assert_eq!(SentryConfig::from_json(&text).unwrap(), config);
    }
}
