use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// What a single day advance produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickResult {
    Nothing,
    EventDay,
    Doomsday,
}

/// Day counter running toward doomsday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clock {
    pub current: u32,
    pub doomsday: u32,
    pub max_days: u32,
    pub events: Vec<u32>,
    /// Latched once doomsday is reached.
    #[serde(default)]
    pub triggered: bool,
}

impl Default for Clock {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl Clock {
    #[must_use]
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self {
            current: cfg.expert_start_day,
            doomsday: cfg.doomsday,
            max_days: cfg.max_days,
            events: cfg.event_days.clone(),
            triggered: false,
        }
    }

    pub fn tick(&mut self) -> TickResult {
        self.current += 1;
        if self.current >= self.doomsday {
            self.triggered = true;
            TickResult::Doomsday
        } else if self.events.contains(&self.current) {
            TickResult::EventDay
        } else {
            TickResult::Nothing
        }
    }

    /// Push doomsday back one day, up to the ceiling.
    pub fn extend(&mut self) -> bool {
        if self.doomsday < self.max_days {
            self.doomsday += 1;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub const fn days_remaining(&self) -> u32 {
        self.doomsday.saturating_sub(self.current)
    }
}
