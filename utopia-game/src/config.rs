use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunable rules of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Days already spent when the game starts. Non-zero for expert play.
    #[serde(default)]
    pub expert_start_day: u32,
    #[serde(default = "EngineConfig::default_doomsday")]
    pub doomsday: u32,
    /// Ceiling the doomsday may be pushed back to.
    #[serde(default = "EngineConfig::default_max_days")]
    pub max_days: u32,
    #[serde(default = "EngineConfig::default_event_days")]
    pub event_days: Vec<u32>,
    #[serde(default = "EngineConfig::default_max_hp")]
    pub max_hp: i32,
    #[serde(default = "EngineConfig::default_component_cap")]
    pub component_cap: u8,
    /// Largest amount a single search modifier may subtract.
    #[serde(default = "EngineConfig::default_max_interrupt_offset")]
    pub max_interrupt_offset: i32,
}

impl EngineConfig {
    #[must_use]
    pub const fn default_doomsday() -> u32 {
        15
    }

    #[must_use]
    pub const fn default_max_days() -> u32 {
        22
    }

    #[must_use]
    pub fn default_event_days() -> Vec<u32> {
        vec![2, 5, 8, 11, 14, 17, 20]
    }

    #[must_use]
    pub const fn default_max_hp() -> i32 {
        6
    }

    #[must_use]
    pub const fn default_component_cap() -> u8 {
        4
    }

    #[must_use]
    pub const fn default_max_interrupt_offset() -> i32 {
        10
    }

    /// Default rules with an expert head start.
    #[must_use]
    pub fn with_expert_start_day(mut self, day: u32) -> Self {
        self.expert_start_day = day;
        self
    }

    /// Parse and validate a configuration from JSON. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the JSON is malformed or violates a bound.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::check_min("doomsday", self.doomsday, 1)?;
        Self::check_min(
            "max_hp",
            u32::try_from(self.max_hp).unwrap_or(0),
            1,
        )?;
        Self::check_min("component_cap", u32::from(self.component_cap), 1)?;
        Self::check_min(
            "max_interrupt_offset",
            u32::try_from(self.max_interrupt_offset).unwrap_or(0),
            1,
        )?;
        if self.doomsday > self.max_days {
            return Err(ConfigError::DoomsdayAboveCeiling {
                doomsday: self.doomsday,
                max_days: self.max_days,
            });
        }
        if self.expert_start_day >= self.doomsday {
            return Err(ConfigError::StartAfterDoomsday {
                start: self.expert_start_day,
                doomsday: self.doomsday,
            });
        }
        let increasing = self.event_days.windows(2).all(|w| w[0] < w[1]);
        let bounded = self.event_days.iter().all(|d| *d < self.max_days);
        if !increasing || !bounded {
            return Err(ConfigError::EventDays {
                max_days: self.max_days,
            });
        }
        Ok(())
    }

    fn check_min(field: &'static str, value: u32, min: u32) -> Result<(), ConfigError> {
        if value < min {
            return Err(ConfigError::MinViolation { field, min, value });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            expert_start_day: 0,
            doomsday: Self::default_doomsday(),
            max_days: Self::default_max_days(),
            event_days: Self::default_event_days(),
            max_hp: Self::default_max_hp(),
            component_cap: Self::default_component_cap(),
            max_interrupt_offset: Self::default_max_interrupt_offset(),
        }
    }
}
