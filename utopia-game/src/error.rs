//! Error types for the rules engine.
//!
//! `EngineError` covers everything a caller can cause and recover from by
//! resending a corrected command. `InvariantViolation` is a fault inside the
//! engine itself and is surfaced through `EngineError::Fault`.
use thiserror::Error;

use crate::constants::Item;

/// Rejection of a submitted command. The engine is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("location {0} does not exist (expected 1-6)")]
    InvalidLocation(u8),
    #[error("malformed resolution: {0}")]
    MalformedResolution(String),
    #[error("interrupt `{0}` is not pending")]
    UnknownInterrupt(String),
    #[error("malformed assignment: {0}")]
    MalformedAssignment(String),
    #[error("no outstanding die shows {0}")]
    InvalidDie(u8),
    #[error("`{0}` is not a slot label (expected one of A B C D W X Y Z)")]
    InvalidSlot(String),
    #[error("slot {0} already holds a die")]
    SlotOccupied(char),
    #[error("camping needs at least one day")]
    InvalidCampDuration,
    #[error("event {event} is not accepted in state {state}")]
    UnexpectedEvent { state: String, event: &'static str },
    #[error("the game is over")]
    GameOver,
    #[error("internal engine fault: {0}")]
    Fault(#[from] InvariantViolation),
}

impl EngineError {
    /// True when the error reports a bug in the engine rather than bad input.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Fault(_))
    }
}

/// Broken engine invariant. Never caused by well-formed play.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("no scratch pad for the current activity")]
    MissingScratch,
    #[error("scratch pad is a {found} pad, expected {expected}")]
    WrongScratchVariant {
        expected: &'static str,
        found: &'static str,
    },
    #[error("no current location")]
    MissingLocation,
    #[error("search has no raw result yet")]
    MissingResult,
    #[error("raw result {0} cannot be mapped to an encounter level")]
    ResultOutOfRange(i32),
    #[error("dice still outstanding when rolling")]
    DiceOutstanding,
    #[error("the dowsing rod needs a result between 11 and 99 (got {0})")]
    ExactFindOutOfRange(i32),
    #[error("content tables have no {0}")]
    MissingContent(String),
    #[error("item {item} could not be used: {source}")]
    ItemUse { item: Item, source: ItemError },
    #[error("automatic transitions did not settle after {0} steps")]
    RunawayTransitions(usize),
    #[error("state {phase} does not match scratch pad {scratch}")]
    PhaseScratchMismatch { phase: String, scratch: &'static str },
}

/// Failure of `Character::use_item`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("not carried")]
    NotCarried,
    #[error("already spent")]
    Inactive,
    #[error("cannot be used directly")]
    NotUsable,
}

/// Invalid engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: u32,
        value: u32,
    },
    #[error("doomsday {doomsday} exceeds the ceiling of {max_days} days")]
    DoomsdayAboveCeiling { doomsday: u32, max_days: u32 },
    #[error("expert start day {start} leaves no time before doomsday {doomsday}")]
    StartAfterDoomsday { start: u32, doomsday: u32 },
    #[error("event days must be strictly increasing and below {max_days}")]
    EventDays { max_days: u32 },
    #[error("config could not be parsed: {0}")]
    Parse(String),
}

/// Invalid content tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    #[error("content could not be parsed: {0}")]
    Parse(String),
    #[error("expected {expected} {table}, found {found}")]
    Count {
        table: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("location at position {index} has id {id}")]
    LocationId { index: usize, id: u8 },
    #[error("{location}: encounter {index} has level {level}")]
    EncounterLevel {
        location: String,
        index: usize,
        level: u8,
    },
    #[error("hit range for level {level} is not ordered within 1-6")]
    HitRange { level: usize },
    #[error("search modifier for {0} names an unknown location")]
    ModifierLocation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::Tool;

    #[test]
    fn faults_are_distinguished_from_input_errors() {
        let fault: EngineError = InvariantViolation::DiceOutstanding.into();
        assert!(fault.is_fault());
        assert!(!EngineError::InvalidLocation(9).is_fault());
        assert!(!EngineError::GameOver.is_fault());
    }

    #[test]
    fn messages_name_the_offending_input() {
        assert_eq!(
            EngineError::InvalidSlot("ZZ".into()).to_string(),
            "`ZZ` is not a slot label (expected one of A B C D W X Y Z)"
        );
        let fault = InvariantViolation::ItemUse {
            item: Tool::DowsingRod.into(),
            source: ItemError::Inactive,
        };
        assert_eq!(
            fault.to_string(),
            "item Dowsing Rod could not be used: already spent"
        );
    }
}
