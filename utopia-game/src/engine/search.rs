//! Searching a location: setup, dice placement and outcome grants.
use crate::constants::Artifact;
use crate::data::{ContentTables, LocationDef};
use crate::error::{EngineError, InvariantViolation};
use crate::state::{GameState, Interrupt, ScratchPad, SearchPad, Slot, TrackerMark};

use super::interrupts::{eligible_search_interrupts, exact_find_applies};

/// What a final search result earns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Artifact,
    Component,
    Fight,
}

impl Outcome {
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            0..=10 => Self::Artifact,
            11..=99 => Self::Component,
            _ => Self::Fight,
        }
    }
}

/// A validated `Assign`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Placement {
    pub first_die: bool,
    pub slot: Slot,
    pub value: u8,
}

pub(crate) fn location_def(
    content: &ContentTables,
    id: u8,
) -> Result<&LocationDef, InvariantViolation> {
    content
        .location(id)
        .ok_or_else(|| InvariantViolation::MissingContent(format!("location {id}")))
}

/// Fresh pad for an attempt, queueing the Seal of Balance when it can be used.
fn open_pad(state: &GameState, tracker_position: u8) -> SearchPad {
    let mut pad = SearchPad::new(tracker_position);
    let seal_ready = state
        .character
        .fetch_artifact(Artifact::SealOfBalance)
        .is_some_and(|seal| seal.active && !seal.used);
    if seal_ready {
        pad.interrupts.push(Interrupt::SealOfBalance);
    }
    pad
}

/// Start searching `location`. Returning to the last searched location resumes its tracker.
///
/// # Errors
///
/// Fails if the location is missing from the content tables.
pub(crate) fn begin_search(
    state: &mut GameState,
    content: &ContentTables,
    location: u8,
) -> Result<(), InvariantViolation> {
    let name = location_def(content, location)?.name.clone();
    let tracker = state
        .last_tracker
        .filter(|mark| mark.location == location)
        .map_or(0, |mark| mark.position);
    let pad = open_pad(state, tracker);
    state.location = Some(location);
    state.last_tracker = Some(TrackerMark {
        location,
        position: tracker,
    });
    state.scratch = Some(ScratchPad::Search(pad));
    state.push_log(format!("You search {name}."));
    Ok(())
}

/// New attempt at the current location.
///
/// # Errors
///
/// Fails without a location or a previous search pad.
pub(crate) fn restart_search(
    state: &mut GameState,
    content: &ContentTables,
) -> Result<(), InvariantViolation> {
    let location = state.current_location()?;
    let tracker = state.shared_pad()?.tracker_position;
    let name = location_def(content, location)?.name.clone();
    let pad = open_pad(state, tracker);
    state.scratch = Some(ScratchPad::Search(pad));
    state.push_log(format!("You search {name} again."));
    Ok(())
}

/// Draw two fresh dice for placement.
///
/// # Errors
///
/// Fails if dice from the previous roll are still waiting.
pub(crate) fn roll_search_dice(state: &mut GameState) -> Result<(), InvariantViolation> {
    if state.search_pad()?.has_outstanding_dice() {
        return Err(InvariantViolation::DiceOutstanding);
    }
    let first = state.roll_die();
    let second = state.roll_die();
    let pad = state.search_pad_mut()?;
    pad.die1 = Some(first);
    pad.die2 = Some(second);
    state.push_log(format!("You roll {first} and {second}."));
    Ok(())
}

/// Check an `Assign` against the outstanding dice and free slots.
///
/// # Errors
///
/// `MalformedAssignment`, `InvalidDie`, `InvalidSlot` or `SlotOccupied`.
pub(crate) fn plan_placement(
    pad: &SearchPad,
    value: u8,
    label: &str,
) -> Result<Placement, EngineError> {
    if label.trim().is_empty() {
        return Err(EngineError::MalformedAssignment(
            "a slot label is required".to_string(),
        ));
    }
    let first_die = if pad.die1 == Some(value) {
        true
    } else if pad.die2 == Some(value) {
        false
    } else {
        return Err(EngineError::InvalidDie(value));
    };
    let slot: Slot = label
        .parse()
        .map_err(|()| EngineError::InvalidSlot(label.to_string()))?;
    if pad.slot(slot).is_some() {
        return Err(EngineError::SlotOccupied(slot.letter()));
    }
    Ok(Placement {
        first_die,
        slot,
        value,
    })
}

/// # Errors
///
/// Fails without a search pad.
pub(crate) fn place_die(
    state: &mut GameState,
    placement: Placement,
) -> Result<(), InvariantViolation> {
    let pad = state.search_pad_mut()?;
    if placement.first_die {
        pad.die1 = None;
    } else {
        pad.die2 = None;
    }
    pad.slots[placement.slot.index()] = Some(placement.value);
    Ok(())
}

/// Work out the raw result on first entry and queue the search interrupts it allows.
/// A pending Dowsing Rod is withdrawn once the result leaves its window.
///
/// # Errors
///
/// Fails if the required slots are not all filled.
pub(crate) fn prepare_resolution(
    state: &mut GameState,
    content: &ContentTables,
) -> Result<(), InvariantViolation> {
    let pad = state.search_pad_mut()?;
    if pad.raw_result.is_none() {
        let raw = pad.compute_raw().ok_or(InvariantViolation::MissingResult)?;
        pad.raw_result = Some(raw);
        state.push_log(format!("Your search result is {raw}."));
    }
    let eligible = eligible_search_interrupts(state, content)?;
    let pad = state.search_pad_mut()?;
    if let Some(raw) = pad.raw_result
        && !exact_find_applies(raw)
    {
        pad.interrupts.retain(|i| *i != Interrupt::DowsingRod);
    }
    pad.interrupts.extend(eligible);
    Ok(())
}

/// # Errors
///
/// Fails without a raw result or location.
pub(crate) fn grant_artifact(
    state: &mut GameState,
    content: &ContentTables,
) -> Result<(), InvariantViolation> {
    let raw = state
        .search_pad()?
        .raw_result
        .ok_or(InvariantViolation::MissingResult)?;
    let location = location_def(content, state.current_location()?)?;
    if state.character.has_artifact(location.artifact) {
        let count = if raw == 0 { 2 } else { 1 };
        state.character.give_component(location.component, count);
        state.push_log(format!(
            "You already own the {}; you find {count} {} instead.",
            location.artifact, location.component
        ));
    } else {
        let active = raw == 0;
        state.character.grant_artifact(location.artifact, active);
        if active {
            state.push_log(format!("You find the {}, ready for use!", location.artifact));
        } else {
            state.push_log(format!(
                "You find the {}, but it needs activating.",
                location.artifact
            ));
        }
    }
    Ok(())
}

/// # Errors
///
/// Fails without a location.
pub(crate) fn grant_component(
    state: &mut GameState,
    content: &ContentTables,
) -> Result<(), InvariantViolation> {
    let location = location_def(content, state.current_location()?)?;
    state.character.give_component(location.component, 1);
    state.push_log(format!("You find some {}.", location.component));
    Ok(())
}
