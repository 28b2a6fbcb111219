//! Automatic transitions.
//!
//! [`next_transition`] only reads the aggregate. The engine loops it until it
//! returns `None`, running the attached action and then the entry action of
//! every state it enters.
use crate::error::InvariantViolation;
use crate::state::GameState;

use super::phase::{AssignPhase, FightPhase, LocalIdle, Phase, ResolvePhase, RoundPhase, SearchPhase};
use super::search::Outcome;

/// Side effect run while moving between two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    /// A search action finished: step the tracker.
    CompleteSearch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Transition {
    pub target: Phase,
    pub action: Option<Action>,
}

impl Transition {
    const fn to(target: Phase) -> Self {
        Self {
            target,
            action: None,
        }
    }

    const fn completing(target: Phase) -> Self {
        Self {
            target,
            action: Some(Action::CompleteSearch),
        }
    }
}

/// The next automatic step from `phase`, if any.
///
/// # Errors
///
/// Fails when the aggregate does not carry what `phase` needs.
pub(crate) fn next_transition(
    phase: Phase,
    state: &GameState,
) -> Result<Option<Transition>, InvariantViolation> {
    if phase.is_game_over() {
        return Ok(None);
    }
    if state.is_terminal() {
        return Ok(Some(Transition::to(Phase::GameOver)));
    }
    let next = match phase {
        Phase::Idle | Phase::GameOver | Phase::Activating | Phase::Linking | Phase::Final => None,
        Phase::Unconscious => Some(Transition::to(Phase::Idle)),
        Phase::Searching(search) => searching(search, state)?,
    };
    Ok(next)
}

fn searching(
    phase: SearchPhase,
    state: &GameState,
) -> Result<Option<Transition>, InvariantViolation> {
    let next = match phase {
        SearchPhase::SettingUp => {
            if state.search_pad()?.interrupts.is_empty() {
                Some(Transition::to(Phase::assigning(AssignPhase::Rolling)))
            } else {
                Some(Transition::to(Phase::searching(
                    SearchPhase::InterruptingSetup,
                )))
            }
        }
        SearchPhase::InterruptingSetup => state
            .search_pad()?
            .interrupts
            .is_empty()
            .then(|| Transition::to(Phase::searching(SearchPhase::SettingUp))),
        SearchPhase::Assigning(assign) => assigning(assign, state)?,
        SearchPhase::Resolving(resolve) => resolving(resolve, state)?,
        SearchPhase::Fighting(fight) => fighting(fight, state)?,
        SearchPhase::Idle(LocalIdle::Waiting) => None,
        SearchPhase::Idle(LocalIdle::Leaving) => Some(Transition::to(Phase::Idle)),
        SearchPhase::Idle(LocalIdle::Camping) => Some(Transition::to(Phase::IDLE_AT_LOCATION)),
    };
    Ok(next)
}

fn assigning(
    phase: AssignPhase,
    state: &GameState,
) -> Result<Option<Transition>, InvariantViolation> {
    let next = match phase {
        AssignPhase::Rolling => Some(Phase::assigning(AssignPhase::Waiting)),
        AssignPhase::Waiting => None,
        AssignPhase::Processing => {
            let pad = state.search_pad()?;
            if pad.is_full() {
                Some(Phase::resolving(ResolvePhase::SettingUp))
            } else if pad.has_outstanding_dice() {
                Some(Phase::assigning(AssignPhase::Waiting))
            } else {
                Some(Phase::assigning(AssignPhase::Rolling))
            }
        }
    };
    Ok(next.map(Transition::to))
}

fn resolving(
    phase: ResolvePhase,
    state: &GameState,
) -> Result<Option<Transition>, InvariantViolation> {
    let next = match phase {
        ResolvePhase::SettingUp => {
            if state.search_pad()?.interrupts.is_empty() {
                Some(Transition::to(Phase::resolving(ResolvePhase::Deciding)))
            } else {
                Some(Transition::to(Phase::resolving(ResolvePhase::Interrupting)))
            }
        }
        ResolvePhase::Interrupting => state
            .search_pad()?
            .interrupts
            .is_empty()
            .then(|| Transition::to(Phase::resolving(ResolvePhase::SettingUp))),
        ResolvePhase::Deciding => {
            let raw = state
                .search_pad()?
                .raw_result
                .ok_or(InvariantViolation::MissingResult)?;
            let target = match Outcome::from_raw(raw) {
                Outcome::Artifact => Phase::resolving(ResolvePhase::GrantingArtifact),
                Outcome::Component => Phase::resolving(ResolvePhase::GrantingComponent),
                Outcome::Fight => Phase::fighting(FightPhase::SettingUp),
            };
            Some(Transition::to(target))
        }
        ResolvePhase::GrantingArtifact | ResolvePhase::GrantingComponent => {
            Some(Transition::completing(Phase::IDLE_AT_LOCATION))
        }
    };
    Ok(next)
}

fn fighting(
    phase: FightPhase,
    state: &GameState,
) -> Result<Option<Transition>, InvariantViolation> {
    let pad = state.fight_pad()?;
    let next = match phase {
        FightPhase::SettingUp => {
            if pad.search.interrupts.is_empty() {
                Some(Transition::to(Phase::round(RoundPhase::SettingUp)))
            } else {
                Some(Transition::to(Phase::fighting(FightPhase::InterruptingSetup)))
            }
        }
        FightPhase::InterruptingSetup => {
            if !pad.search.interrupts.is_empty() {
                None
            } else if pad.evaded() {
                Some(Transition::completing(Phase::IDLE_AT_LOCATION))
            } else {
                Some(Transition::to(Phase::round(RoundPhase::SettingUp)))
            }
        }
        FightPhase::Rolling(RoundPhase::SettingUp) => {
            if pad.search.interrupts.is_empty() {
                Some(Transition::to(Phase::round(RoundPhase::Resolving)))
            } else {
                Some(Transition::to(Phase::round(RoundPhase::InterruptingFight)))
            }
        }
        FightPhase::Rolling(RoundPhase::InterruptingFight) => pad
            .search
            .interrupts
            .is_empty()
            .then(|| Transition::to(Phase::round(RoundPhase::Resolving))),
        FightPhase::Rolling(RoundPhase::Resolving) => {
            if state.character.hp == 0 {
                Some(Transition::to(Phase::Unconscious))
            } else if pad.defeated {
                Some(Transition::to(Phase::round(RoundPhase::Looting)))
            } else {
                Some(Transition::to(Phase::round(RoundPhase::SettingUp)))
            }
        }
        FightPhase::Rolling(RoundPhase::Looting) => {
            Some(Transition::completing(Phase::IDLE_AT_LOCATION))
        }
    };
    Ok(next)
}
