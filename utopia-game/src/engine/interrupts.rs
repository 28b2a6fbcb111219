//! Interrupt queueing and batch resolution.
use crate::constants::{Artifact, Item, Tool, WorldEvent};
use crate::data::ContentTables;
use crate::error::{EngineError, InvariantViolation};
use crate::state::{GameState, Interrupt, RAW_MIN, SearchPad, Status};

use super::command::{Resolution, ResolutionEntry};

/// A validated answer, ready to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Answer {
    Accept(Interrupt),
    Decline(Interrupt),
    Subtract(Interrupt, i32),
}

/// Search interrupts that are eligible now and have not come up yet this attempt.
///
/// # Errors
///
/// Fails when the search has no location or raw result.
pub(crate) fn eligible_search_interrupts(
    state: &GameState,
    content: &ContentTables,
) -> Result<Vec<Interrupt>, InvariantViolation> {
    let pad = state.search_pad()?;
    let location = state.current_location()?;
    let raw = pad.raw_result.ok_or(InvariantViolation::MissingResult)?;
    let hero = &state.character;

    let mut eligible = Vec::new();
    if hero.tool_is_active(Tool::DowsingRod) && exact_find_applies(raw) {
        eligible.push(Interrupt::DowsingRod);
    }
    if state.events_at(location).contains(&WorldEvent::GoodFortune)
        && !pad.accepted(Interrupt::SealOfBalance)
    {
        eligible.push(Interrupt::GoodFortune);
    }
    for artifact in content.search_modifiers_at(location) {
        if let Some(interrupt) = Interrupt::for_modifier(artifact)
            && hero.artifact_is_active(artifact)
        {
            eligible.push(interrupt);
        }
    }
    eligible.retain(|i| !pad.is_settled(*i));
    Ok(eligible)
}

pub(crate) const fn exact_find_applies(raw: i32) -> bool {
    raw > 10 && raw < 100
}

/// Check a whole batch against the pending queue without touching anything.
///
/// # Errors
///
/// `MalformedResolution` for an empty batch, a wrong answer kind or an
/// oversized offset or a Dowsing Rod pushed out of its window earlier in the
/// batch, `UnknownInterrupt` for names that are not pending, and a fault when
/// a pending Dowsing Rod is already outside its window.
pub(crate) fn validate_batch(
    pad: &SearchPad,
    entries: &[ResolutionEntry],
    max_offset: i32,
) -> Result<Vec<Answer>, EngineError> {
    if entries.is_empty() {
        return Err(EngineError::MalformedResolution(
            "no resolutions given".to_string(),
        ));
    }
    let mut answers = Vec::with_capacity(entries.len());
    let mut seen: Vec<Interrupt> = Vec::with_capacity(entries.len());
    let mut raw = pad.raw_result;
    for entry in entries {
        let interrupt: Interrupt = entry
            .name
            .parse()
            .ok()
            .filter(|i| pad.is_pending(*i) && !seen.contains(i))
            .ok_or_else(|| EngineError::UnknownInterrupt(entry.name.clone()))?;
        seen.push(interrupt);
        let answer = match (entry.resolution, interrupt.takes_offset()) {
            (Resolution::Bool(false), _) => Answer::Decline(interrupt),
            (Resolution::Bool(true), false) => Answer::Accept(interrupt),
            (Resolution::Offset(amount), true) => {
                if amount.unsigned_abs() > max_offset.unsigned_abs() {
                    return Err(EngineError::MalformedResolution(format!(
                        "{interrupt} may subtract at most {max_offset} (got {amount})"
                    )));
                }
                Answer::Subtract(interrupt, amount.abs())
            }
            (Resolution::Bool(true), true) => {
                return Err(EngineError::MalformedResolution(format!(
                    "{interrupt} needs an amount to subtract"
                )));
            }
            (Resolution::Offset(_), false) => {
                return Err(EngineError::MalformedResolution(format!(
                    "{interrupt} is answered with true or false"
                )));
            }
        };
        match answer {
            Answer::Accept(Interrupt::DowsingRod) => {
                let current = raw.ok_or(InvariantViolation::MissingResult)?;
                if !exact_find_applies(current) {
                    if raw == pad.raw_result {
                        return Err(InvariantViolation::ExactFindOutOfRange(current).into());
                    }
                    return Err(EngineError::MalformedResolution(format!(
                        "{interrupt} no longer applies once the result is {current}"
                    )));
                }
                raw = Some(1);
            }
            Answer::Subtract(_, amount) => {
                raw = raw.map(|r| (r - amount).max(RAW_MIN));
            }
            _ => {}
        }
        answers.push(answer);
    }
    Ok(answers)
}

/// Apply answers produced by [`validate_batch`].
///
/// # Errors
///
/// Fails if the aggregate no longer matches what was validated.
pub(crate) fn apply_answers(
    state: &mut GameState,
    answers: &[Answer],
) -> Result<(), InvariantViolation> {
    for answer in answers {
        match *answer {
            Answer::Accept(interrupt) => {
                if let Some(item) = consumed_item(interrupt) {
                    state
                        .character
                        .use_item(item)
                        .map_err(|source| InvariantViolation::ItemUse { item, source })?;
                }
                let pad = state.shared_pad_mut()?;
                pad.statuses.push(Status::Accepted { interrupt });
                if interrupt == Interrupt::DowsingRod {
                    pad.raw_result = Some(1);
                }
                pad.interrupts.retain(|i| *i != interrupt);
                state.push_log(format!("You use the {interrupt}."));
            }
            Answer::Decline(interrupt) => {
                let pad = state.shared_pad_mut()?;
                pad.ignored.push(interrupt);
                pad.interrupts.retain(|i| *i != interrupt);
            }
            Answer::Subtract(interrupt, amount) => {
                let pad = state.shared_pad_mut()?;
                pad.raw_result = pad.raw_result.map(|r| (r - amount).max(RAW_MIN));
                pad.statuses.push(Status::Offset { interrupt, amount });
                pad.interrupts.retain(|i| *i != interrupt);
                let raw = pad.raw_result;
                if let Some(raw) = raw {
                    state.push_log(format!(
                        "The {interrupt} lowers your result by {amount} to {raw}."
                    ));
                }
            }
        }
    }
    Ok(())
}

const fn consumed_item(interrupt: Interrupt) -> Option<Item> {
    match interrupt {
        Interrupt::DowsingRod => Some(Item::Tool(Tool::DowsingRod)),
        Interrupt::ParalysisWand => Some(Item::Tool(Tool::ParalysisWand)),
        Interrupt::SealOfBalance => Some(Item::Artifact(Artifact::SealOfBalance)),
        Interrupt::GoodFortune
        | Interrupt::HermeticMirror
        | Interrupt::ScryingLens
        | Interrupt::ShimmeringMoonlace => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::state::ScratchPad;

    fn pad_with(raw: i32, pending: &[Interrupt]) -> SearchPad {
        let mut pad = SearchPad::new(0);
        pad.raw_result = Some(raw);
        pad.interrupts.extend(pending.iter().copied());
        pad
    }

    fn state_at(location: u8, pad: SearchPad) -> GameState {
        let content = ContentTables::load_from_static();
        let mut state = GameState::new("interrupts", &EngineConfig::default(), &content);
        state.location = Some(location);
        state.scratch = Some(ScratchPad::Search(pad));
        state
    }

    #[test]
    fn search_interrupts_follow_fixed_order() {
        let content = ContentTables::load_from_static();
        let mut state = state_at(2, pad_with(42, &[]));
        state.location_events[1].push(WorldEvent::GoodFortune);
        state.character.grant_artifact(Artifact::HermeticMirror, true);
        let eligible = eligible_search_interrupts(&state, &content).unwrap();
        assert_eq!(
            eligible,
            vec![
                Interrupt::DowsingRod,
                Interrupt::GoodFortune,
                Interrupt::HermeticMirror
            ]
        );
    }

    #[test]
    fn modifiers_only_apply_at_their_locations() {
        let content = ContentTables::load_from_static();
        let mut state = state_at(5, pad_with(250, &[]));
        state.character.grant_artifact(Artifact::HermeticMirror, true);
        state.character.grant_artifact(Artifact::ScryingLens, false);
        assert!(eligible_search_interrupts(&state, &content).unwrap().is_empty());
        state.location = Some(3);
        assert!(eligible_search_interrupts(&state, &content).unwrap().is_empty());
        state.character.fetch_artifact_mut(Artifact::ScryingLens).unwrap().active = true;
        assert_eq!(
            eligible_search_interrupts(&state, &content).unwrap(),
            vec![Interrupt::ScryingLens]
        );
    }

    #[test]
    fn accepted_seal_blocks_good_fortune() {
        let content = ContentTables::load_from_static();
        let mut pad = pad_with(300, &[]);
        pad.statuses.push(Status::Accepted {
            interrupt: Interrupt::SealOfBalance,
        });
        let mut state = state_at(1, pad);
        state.location_events[0].push(WorldEvent::GoodFortune);
        assert!(eligible_search_interrupts(&state, &content).unwrap().is_empty());
    }

    #[test]
    fn declined_interrupts_are_not_offered_again() {
        let content = ContentTables::load_from_static();
        let mut pad = pad_with(50, &[]);
        pad.ignored.push(Interrupt::DowsingRod);
        let state = state_at(6, pad);
        assert!(eligible_search_interrupts(&state, &content).unwrap().is_empty());
    }

    #[test]
    fn batch_validation_rejects_bad_shapes() {
        let pad = pad_with(150, &[Interrupt::GoodFortune, Interrupt::HermeticMirror]);
        assert!(matches!(
            validate_batch(&pad, &[], 10),
            Err(EngineError::MalformedResolution(_))
        ));
        assert_eq!(
            validate_batch(&pad, &[ResolutionEntry::accept(Interrupt::DowsingRod)], 10),
            Err(EngineError::UnknownInterrupt("Dowsing Rod".into()))
        );
        let unknown = ResolutionEntry {
            name: "Lucky Coin".into(),
            resolution: Resolution::Bool(true),
        };
        assert_eq!(
            validate_batch(&pad, &[unknown], 10),
            Err(EngineError::UnknownInterrupt("Lucky Coin".into()))
        );
        assert!(matches!(
            validate_batch(&pad, &[ResolutionEntry::offset(Interrupt::GoodFortune, 11)], 10),
            Err(EngineError::MalformedResolution(_))
        ));
        assert!(matches!(
            validate_batch(&pad, &[ResolutionEntry::accept(Interrupt::GoodFortune)], 10),
            Err(EngineError::MalformedResolution(_))
        ));
        let twice = [
            ResolutionEntry::offset(Interrupt::GoodFortune, 1),
            ResolutionEntry::offset(Interrupt::GoodFortune, 1),
        ];
        assert_eq!(
            validate_batch(&pad, &twice, 10),
            Err(EngineError::UnknownInterrupt("Good Fortune".into()))
        );
    }

    #[test]
    fn offsets_subtract_magnitude() {
        let pad = pad_with(150, &[Interrupt::GoodFortune]);
        let answers =
            validate_batch(&pad, &[ResolutionEntry::offset(Interrupt::GoodFortune, -7)], 10)
                .unwrap();
        assert_eq!(answers, vec![Answer::Subtract(Interrupt::GoodFortune, 7)]);
        let mut state = state_at(1, pad);
        apply_answers(&mut state, &answers).unwrap();
        let pad = state.search_pad().unwrap();
        assert_eq!(pad.raw_result, Some(143));
        assert!(pad.interrupts.is_empty());
        assert!(pad.is_settled(Interrupt::GoodFortune));
    }

    #[test]
    fn dowsing_rod_outside_window_is_a_fault() {
        let pad = pad_with(102, &[Interrupt::DowsingRod, Interrupt::GoodFortune]);
        let err = validate_batch(&pad, &[ResolutionEntry::accept(Interrupt::DowsingRod)], 10)
            .unwrap_err();
        assert!(err.is_fault());
    }

    #[test]
    fn offset_then_dowsing_rod_in_one_batch_is_malformed() {
        let pad = pad_with(15, &[Interrupt::DowsingRod, Interrupt::GoodFortune]);
        let err = validate_batch(
            &pad,
            &[
                ResolutionEntry::offset(Interrupt::GoodFortune, 10),
                ResolutionEntry::accept(Interrupt::DowsingRod),
            ],
            10,
        )
        .unwrap_err();
        assert!(!err.is_fault());
        assert!(matches!(err, EngineError::MalformedResolution(_)));
    }

    #[test]
    fn dowsing_rod_sets_result_and_is_spent() {
        let pad = pad_with(57, &[Interrupt::DowsingRod]);
        let answers =
            validate_batch(&pad, &[ResolutionEntry::accept(Interrupt::DowsingRod)], 10).unwrap();
        let mut state = state_at(4, pad);
        apply_answers(&mut state, &answers).unwrap();
        assert_eq!(state.search_pad().unwrap().raw_result, Some(1));
        assert!(!state.character.tool_is_active(Tool::DowsingRod));
    }
}
