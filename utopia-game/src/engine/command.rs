use serde::{Deserialize, Serialize};

use crate::state::Interrupt;

/// Answer to a pending interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Resolution {
    Bool(bool),
    Offset(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionEntry {
    pub name: String,
    pub resolution: Resolution,
}

impl ResolutionEntry {
    #[must_use]
    pub fn accept(interrupt: Interrupt) -> Self {
        Self {
            name: interrupt.as_str().to_string(),
            resolution: Resolution::Bool(true),
        }
    }

    #[must_use]
    pub fn decline(interrupt: Interrupt) -> Self {
        Self {
            name: interrupt.as_str().to_string(),
            resolution: Resolution::Bool(false),
        }
    }

    #[must_use]
    pub fn offset(interrupt: Interrupt, amount: i32) -> Self {
        Self {
            name: interrupt.as_str().to_string(),
            resolution: Resolution::Offset(amount),
        }
    }
}

/// Everything a player can send to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    Search { location: u8 },
    Resolve { resolutions: Vec<ResolutionEntry> },
    Assign { value: u8, slot: String },
    Again,
    Leave,
    Camp { days: u32 },
}

impl Command {
    #[must_use]
    pub const fn search(location: u8) -> Self {
        Self::Search { location }
    }

    #[must_use]
    pub fn assign(value: u8, slot: impl Into<String>) -> Self {
        Self::Assign {
            value,
            slot: slot.into(),
        }
    }

    #[must_use]
    pub const fn resolve(resolutions: Vec<ResolutionEntry>) -> Self {
        Self::Resolve { resolutions }
    }

    #[must_use]
    pub const fn camp(days: u32) -> Self {
        Self::Camp { days }
    }

    /// Event name used in rejection messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Search { .. } => "SEARCH",
            Self::Resolve { .. } => "RESOLVE",
            Self::Assign { .. } => "ASSIGN",
            Self::Again => "AGAIN",
            Self::Leave => "LEAVE",
            Self::Camp { .. } => "CAMP",
        }
    }
}
