//! Game configuration: world size, speeds, radii and timings.
//!
//! Every field has a default matching the classic arcade tuning, and every
//! struct is `#[serde(default)]`, so a JSON override file only needs the
//! fields it changes:
//!
//! ```json
//! { "seeker": { "flashlight_radius": 200 }, "hiders": { "count": 5 } }
//! ```

use serde::{Deserialize, Serialize};

use crate::geometry::{Rect, Vec2};
use crate::ConfigError;

/// Play area size in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

impl WorldConfig {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Tuning for the player-controlled seeker ("It").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeekerConfig {
    /// Pixels per second, also the diagonal speed.
    pub speed: f32,
    /// Capture eligibility radius, also the radius of the light circle.
    pub flashlight_radius: f32,
    /// The seeker spawns this far below the world centre.
    pub start_offset_y: f32,
    pub contact_radius: f32,
}

impl Default for SeekerConfig {
    fn default() -> Self {
        Self {
            speed: 180.0,
            flashlight_radius: 150.0,
            start_offset_y: 120.0,
            contact_radius: 16.0,
        }
    }
}

/// Tuning for the AI hiders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HiderConfig {
    pub count: u8,
    /// Pixels per second along the hider's heading.
    pub speed: f32,
    /// Maximum heading change per millisecond, in radians.
    pub turn_rate: f32,
    /// Hiders spawn at least this far from every world edge.
    pub spawn_margin: f32,
    pub contact_radius: f32,
    pub label_offset_y: f32,
    /// Alpha of a hider outside the flashlight.
    pub hidden_alpha: f32,
}

impl Default for HiderConfig {
    fn default() -> Self {
        Self {
            count: 3,
            speed: 60.0,
            turn_rate: 0.002,
            spawn_margin: 50.0,
            contact_radius: 16.0,
            label_offset_y: 20.0,
            hidden_alpha: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanConfig {
    pub contact_radius: f32,
}

impl Default for CanConfig {
    fn default() -> Self {
        Self {
            contact_radius: 12.0,
        }
    }
}

/// The jail zone. Jailed hiders are kept `inset` pixels away from its edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JailConfig {
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
    pub inset: f32,
}

impl Default for JailConfig {
    fn default() -> Self {
        Self {
            center: Vec2::new(650.0, 50.0),
            width: 120.0,
            height: 200.0,
            inset: 10.0,
        }
    }
}

impl JailConfig {
    pub fn rect(&self) -> Rect {
        Rect::new(self.center, self.width, self.height)
    }
}

/// Full configuration for one game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub world: WorldConfig,
    /// Length of the "Hide!" phase before the seeker may move.
    pub countdown_secs: f32,
    pub seeker: SeekerConfig,
    pub hiders: HiderConfig,
    pub can: CanConfig,
    pub jail: JailConfig,
    pub capture_message_secs: f32,
    pub capture_message_offset_y: f32,
    /// Delay between a hider touching the can and everyone being released.
    pub jailbreak_delay_secs: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            countdown_secs: 3.0,
            seeker: SeekerConfig::default(),
            hiders: HiderConfig::default(),
            can: CanConfig::default(),
            jail: JailConfig::default(),
            capture_message_secs: 1.0,
            capture_message_offset_y: 30.0,
            jailbreak_delay_secs: 0.1,
        }
    }
}

impl GameConfig {
    /// Checks that the configuration can produce a playable session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("world.width", self.world.width)?;
        positive("world.height", self.world.height)?;
        timing("countdown_secs", self.countdown_secs)?;
        positive("seeker.speed", self.seeker.speed)?;
        positive("seeker.flashlight_radius", self.seeker.flashlight_radius)?;
        positive("seeker.contact_radius", self.seeker.contact_radius)?;
        positive("hiders.speed", self.hiders.speed)?;
        positive("hiders.turn_rate", self.hiders.turn_rate)?;
        positive("hiders.contact_radius", self.hiders.contact_radius)?;
        positive("can.contact_radius", self.can.contact_radius)?;
        timing("capture_message_secs", self.capture_message_secs)?;
        timing("jailbreak_delay_secs", self.jailbreak_delay_secs)?;

        if self.hiders.count == 0 {
            return Err(ConfigError::NoHiders);
        }
        if !(0.0..=1.0).contains(&self.hiders.hidden_alpha) {
            return Err(ConfigError::OutOfRange {
                field: "hiders.hidden_alpha",
                value: self.hiders.hidden_alpha,
                min: 0.0,
                max: 1.0,
            });
        }

        let jail = &self.jail;
        if jail.inset < 0.0 || jail.width <= 2.0 * jail.inset || jail.height <= 2.0 * jail.inset {
            return Err(ConfigError::JailTooSmall {
                width: jail.width,
                height: jail.height,
                inset: jail.inset,
            });
        }

        let margin = self.hiders.spawn_margin;
        if margin < 0.0 || self.world.width < 2.0 * margin || self.world.height < 2.0 * margin {
            return Err(ConfigError::NoSpawnArea {
                margin,
                width: self.world.width,
                height: self.world.height,
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

/// Longest countdown, message lifetime or jailbreak delay, in seconds.
pub const MAX_TIMING_SECS: f32 = 3600.0;

fn timing(field: &'static str, value: f32) -> Result<(), ConfigError> {
    positive(field, value)?;
    if value <= MAX_TIMING_SECS {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min: 0.0,
            max: MAX_TIMING_SECS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(GameConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_default_jail_sits_top_right() {
        let rect = GameConfig::default().jail.rect();
        assert_eq!(rect.center, Vec2::new(650.0, 50.0));
        assert_eq!(rect.width, 120.0);
        assert_eq!(rect.height, 200.0);
    }

    #[test]
    fn test_zero_hiders_rejected() {
        let mut cfg = GameConfig::default();
        cfg.hiders.count = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::NoHiders));
    }

    #[test]
    fn test_negative_speed_rejected() {
        let mut cfg = GameConfig::default();
        cfg.seeker.speed = -1.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::NotPositive { field: "seeker.speed", .. })
        ));
    }

    #[test]
    fn test_jail_smaller_than_inset_rejected() {
        let mut cfg = GameConfig::default();
        cfg.jail.width = 20.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::JailTooSmall { .. })));
    }

    #[test]
    fn test_spawn_margin_too_large_rejected() {
        let mut cfg = GameConfig::default();
        cfg.hiders.spawn_margin = 400.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::NoSpawnArea { .. })));
    }

    #[test]
    fn test_hidden_alpha_out_of_range_rejected() {
        let mut cfg = GameConfig::default();
        cfg.hiders.hidden_alpha = 1.5;
        assert!(matches!(cfg.validate(), Err(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn test_huge_timings_rejected() {
        let mut cfg = GameConfig::default();
        cfg.capture_message_secs = 1e30;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange { field: "capture_message_secs", .. })
        ));

        let mut cfg = GameConfig::default();
        cfg.jailbreak_delay_secs = f32::INFINITY;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange { field: "jailbreak_delay_secs", .. })
        ));

        let mut cfg = GameConfig::default();
        cfg.countdown_secs = MAX_TIMING_SECS + 1.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::OutOfRange { .. })));

        let mut cfg = GameConfig::default();
        cfg.jailbreak_delay_secs = MAX_TIMING_SECS;
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn test_partial_json_override_keeps_defaults() {
        let cfg: GameConfig = serde_json::from_str(
            r#"{ "seeker": { "flashlight_radius": 200 }, "hiders": { "count": 5 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.seeker.flashlight_radius, 200.0);
        assert_eq!(cfg.seeker.speed, 180.0);
        assert_eq!(cfg.hiders.count, 5);
        assert_eq!(cfg.world, WorldConfig::default());
    }
}
