use crate::clock::TickResult;
use crate::constants::{LOCATION_COUNT, WorldEvent};
use crate::data::ContentTables;
use crate::error::InvariantViolation;
use crate::state::{GameState, TrackerMark};

/// Advance the clock one day and react to what it reports.
pub(crate) fn advance_day(state: &mut GameState) -> TickResult {
    let result = state.clock.tick();
    state.character.restore_daily_artifacts();
    match result {
        TickResult::EventDay => {
            reassign_events(state);
            state.push_log(format!("Day {}: the world shifts.", state.clock.current));
        }
        TickResult::Doomsday => {
            state.push_log(format!("Day {}: doomsday arrives.", state.clock.current));
        }
        TickResult::Nothing => {
            state.push_log(format!("Day {} begins.", state.clock.current));
        }
    }
    log::debug!("day {} -> {result:?}", state.clock.current);
    result
}

/// Advance up to `days` days, stopping early once doomsday is reached.
pub(crate) fn advance_days(state: &mut GameState, days: u32) {
    for _ in 0..days {
        if advance_day(state) == TickResult::Doomsday {
            break;
        }
    }
}

/// One die per world event, in a fixed order. Several events may land together.
fn reassign_events(state: &mut GameState) {
    let mut events: [Vec<WorldEvent>; LOCATION_COUNT] = Default::default();
    for event in WorldEvent::ALL {
        let die = state.roll_die();
        events[usize::from(die - 1)].push(event);
    }
    state.location_events = events;
}

/// Step the location's tracker after a completed search action.
///
/// A `-1` marker on the vacated position costs a day.
///
/// # Errors
///
/// Fails when there is no location or search data.
pub(crate) fn advance_tracker(
    state: &mut GameState,
    content: &ContentTables,
) -> Result<(), InvariantViolation> {
    let location_id = state.current_location()?;
    let location = content
        .location(location_id)
        .ok_or_else(|| InvariantViolation::MissingContent(format!("location {location_id}")))?;
    let pad = state.shared_pad_mut()?;
    let vacated = usize::from(pad.tracker_position) % location.tracker.len();
    let position = u8::try_from((vacated + 1) % location.tracker.len()).unwrap_or(0);
    pad.tracker_position = position;
    state.last_tracker = Some(TrackerMark {
        location: location_id,
        position,
    });
    if location.tracker[vacated] == -1 {
        advance_day(state);
    }
    Ok(())
}
