//! The rules engine: a hierarchical state machine over [`GameState`].
//!
//! Every submitted [`Command`] is validated against the current phase before
//! anything changes. Accepted commands apply their effect, enter their target
//! phase and then settle through automatic transitions until the machine needs
//! more input. A rejected command leaves the engine exactly as it was.
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::data::ContentTables;
use crate::error::{ConfigError, EngineError, InvariantViolation};
use crate::seed::generate_seed_text;
use crate::state::{GameState, ScratchPad};

pub mod command;
mod days;
pub mod fight;
mod interrupts;
pub mod phase;
pub mod search;
mod transitions;

pub use command::{Command, Resolution, ResolutionEntry};
pub use phase::{AssignPhase, FightPhase, LocalIdle, Phase, ResolvePhase, RoundPhase, SearchPhase};

use interrupts::Answer;
use search::Placement;
use transitions::{Action, Transition};

/// Automatic steps allowed while settling a single command.
pub const MAX_MICRO_STEPS: usize = 10_000;

/// Public view of the engine after a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub state_path: String,
    pub phase: Phase,
    pub state: GameState,
}

impl Snapshot {
    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.state.log
    }
}

/// Effect of an accepted command.
#[derive(Debug, Clone)]
enum Effect {
    BeginSearch(u8),
    Answers(Vec<Answer>),
    Place(Placement),
    Restart,
    Leave,
    Camp(u32),
}

#[derive(Debug, Clone)]
pub struct Engine {
    phase: Phase,
    state: GameState,
    config: EngineConfig,
    content: Arc<ContentTables>,
}

impl Engine {
    /// New game with the bundled content. A missing seed is generated.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the expert start day leaves no time before doomsday.
    pub fn new(seed: Option<&str>, expert_start_day: u32) -> Result<Self, ConfigError> {
        Self::with_config(
            seed,
            EngineConfig::default().with_expert_start_day(expert_start_day),
            ContentTables::load_from_static(),
        )
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if `config` is invalid.
    pub fn with_config(
        seed: Option<&str>,
        config: EngineConfig,
        content: Arc<ContentTables>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = seed.map_or_else(generate_seed_text, str::to_string);
        let state = GameState::new(&seed, &config, &content);
        log::debug!("new game with seed {seed}");
        Ok(Self {
            phase: Phase::Idle,
            state,
            config,
            content,
        })
    }

    /// Continue from a snapshot with the default rules and bundled content.
    ///
    /// # Errors
    ///
    /// Fails when the snapshot's phase and scratch pad disagree.
    pub fn resume(snapshot: Snapshot) -> Result<Self, EngineError> {
        Self::resume_with(
            snapshot,
            EngineConfig::default(),
            ContentTables::load_from_static(),
        )
    }

    /// # Errors
    ///
    /// Fails when the snapshot's phase and scratch pad disagree.
    pub fn resume_with(
        snapshot: Snapshot,
        config: EngineConfig,
        content: Arc<ContentTables>,
    ) -> Result<Self, EngineError> {
        check_scratch(snapshot.phase, &snapshot.state)?;
        let mut engine = Self {
            phase: snapshot.phase,
            state: snapshot.state,
            config,
            content,
        };
        engine.settle()?;
        Ok(engine)
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn content(&self) -> &ContentTables {
        &self.content
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state_path: self.phase.path(),
            phase: self.phase,
            state: self.state.clone(),
        }
    }

    /// Process one command.
    ///
    /// # Errors
    ///
    /// Any rejection leaves the engine untouched.
    pub fn submit(&mut self, command: Command) -> Result<Snapshot, EngineError> {
        if self.phase.is_game_over() {
            return Err(EngineError::GameOver);
        }
        let (effect, target) = self.plan(&command)?;
        let mut next = self.clone();
        next.apply(effect)?;
        next.enter(target)?;
        next.settle()?;
        *self = next;
        Ok(self.snapshot())
    }

    /// Force the alternate ending.
    ///
    /// # Errors
    ///
    /// Returns `GameOver` if the game already ended.
    pub fn trigger_special_ending(&mut self) -> Result<Snapshot, EngineError> {
        if self.phase.is_game_over() {
            return Err(EngineError::GameOver);
        }
        let mut next = self.clone();
        next.state.special_ending = true;
        next.settle()?;
        *self = next;
        Ok(self.snapshot())
    }

    fn unexpected(&self, command: &Command) -> EngineError {
        EngineError::UnexpectedEvent {
            state: self.phase.path(),
            event: command.name(),
        }
    }

    fn plan(&self, command: &Command) -> Result<(Effect, Phase), EngineError> {
        match (command, self.phase) {
            (Command::Search { location }, Phase::Idle) => {
                if self.content.location(*location).is_none() {
                    return Err(EngineError::InvalidLocation(*location));
                }
                Ok((
                    Effect::BeginSearch(*location),
                    Phase::searching(SearchPhase::SettingUp),
                ))
            }
            (Command::Resolve { resolutions }, phase) => {
                let target = match phase {
                    Phase::Searching(SearchPhase::InterruptingSetup) => {
                        Phase::searching(SearchPhase::SettingUp)
                    }
                    Phase::Searching(SearchPhase::Resolving(ResolvePhase::Interrupting)) => {
                        Phase::resolving(ResolvePhase::SettingUp)
                    }
                    Phase::Searching(SearchPhase::Fighting(
                        FightPhase::InterruptingSetup
                        | FightPhase::Rolling(RoundPhase::InterruptingFight),
                    )) => phase,
                    _ => return Err(self.unexpected(command)),
                };
                let pad = self.state.shared_pad()?;
                let answers =
                    interrupts::validate_batch(pad, resolutions, self.config.max_interrupt_offset)?;
                Ok((Effect::Answers(answers), target))
            }
            (Command::Assign { value, slot }, Phase::Searching(SearchPhase::Assigning(AssignPhase::Waiting))) => {
                let placement = search::plan_placement(self.state.search_pad()?, *value, slot)?;
                Ok((
                    Effect::Place(placement),
                    Phase::assigning(AssignPhase::Processing),
                ))
            }
            (Command::Again, Phase::Searching(SearchPhase::Idle(LocalIdle::Waiting))) => Ok((
                Effect::Restart,
                Phase::searching(SearchPhase::SettingUp),
            )),
            (Command::Leave, Phase::Searching(SearchPhase::Idle(LocalIdle::Waiting))) => {
                Ok((Effect::Leave, Phase::local_idle(LocalIdle::Leaving)))
            }
            (Command::Camp { days }, Phase::Searching(SearchPhase::Idle(LocalIdle::Waiting))) => {
                if *days == 0 {
                    return Err(EngineError::InvalidCampDuration);
                }
                Ok((Effect::Camp(*days), Phase::local_idle(LocalIdle::Camping)))
            }
            _ => Err(self.unexpected(command)),
        }
    }

    fn apply(&mut self, effect: Effect) -> Result<(), InvariantViolation> {
        match effect {
            Effect::BeginSearch(location) => {
                search::begin_search(&mut self.state, &self.content, location)?;
            }
            Effect::Answers(answers) => interrupts::apply_answers(&mut self.state, &answers)?,
            Effect::Place(placement) => search::place_die(&mut self.state, placement)?,
            Effect::Restart => search::restart_search(&mut self.state, &self.content)?,
            Effect::Leave => {}
            Effect::Camp(days) => {
                let heal = i32::try_from(days).unwrap_or(i32::MAX);
                self.state.character.heal(heal);
                self.state.push_log(format!("You camp for {days} day(s)."));
                days::advance_days(&mut self.state, days);
            }
        }
        Ok(())
    }

    /// Move to `target` and run its entry action.
    fn enter(&mut self, target: Phase) -> Result<(), InvariantViolation> {
        log::debug!("{} -> {}", self.phase, target);
        self.phase = target;
        let state = &mut self.state;
        let content = &self.content;
        match target {
            Phase::GameOver => {
                state.scratch = None;
                state.game_over = true;
                let reason = if state.special_ending {
                    "The world is saved by other means."
                } else if state.character.hp < 0 {
                    "You have perished."
                } else {
                    "Doomsday has come."
                };
                state.push_log(format!("Game over. {reason}"));
                log::info!("game {} over on day {}", state.seed, state.clock.current);
            }
            Phase::Unconscious => {
                let max_hp = state.character.max_hp;
                state.character.hp = max_hp;
                state.scratch = None;
                state.location = None;
                state.push_log("You fall unconscious and are carried back to safety.");
                days::advance_days(state, u32::try_from(max_hp).unwrap_or(0));
            }
            Phase::Searching(SearchPhase::Assigning(AssignPhase::Rolling)) => {
                search::roll_search_dice(state)?;
            }
            Phase::Searching(SearchPhase::Resolving(ResolvePhase::SettingUp)) => {
                search::prepare_resolution(state, content)?;
            }
            Phase::Searching(SearchPhase::Resolving(ResolvePhase::GrantingArtifact)) => {
                search::grant_artifact(state, content)?;
            }
            Phase::Searching(SearchPhase::Resolving(ResolvePhase::GrantingComponent)) => {
                search::grant_component(state, content)?;
            }
            Phase::Searching(SearchPhase::Fighting(FightPhase::SettingUp)) => {
                fight::setup_fight(state, content)?;
            }
            Phase::Searching(SearchPhase::Fighting(FightPhase::Rolling(RoundPhase::SettingUp))) => {
                fight::begin_round(state)?;
            }
            Phase::Searching(SearchPhase::Fighting(FightPhase::Rolling(RoundPhase::Resolving))) => {
                fight::resolve_round(state)?;
            }
            Phase::Searching(SearchPhase::Fighting(FightPhase::Rolling(RoundPhase::Looting))) => {
                fight::loot(state, content)?;
            }
            Phase::Searching(SearchPhase::Idle(LocalIdle::Leaving)) => {
                state.scratch = None;
                state.location = None;
                state.push_log("You head back to the workshop.");
            }
            _ => {}
        }
        Ok(())
    }

    fn run(&mut self, action: Action) -> Result<(), InvariantViolation> {
        match action {
            Action::CompleteSearch => days::advance_tracker(&mut self.state, &self.content),
        }
    }

    fn settle(&mut self) -> Result<(), InvariantViolation> {
        for _ in 0..MAX_MICRO_STEPS {
            let Some(Transition { target, action }) =
                transitions::next_transition(self.phase, &self.state)?
            else {
                return Ok(());
            };
            if let Some(action) = action {
                self.run(action)?;
            }
            self.enter(target)?;
        }
        Err(InvariantViolation::RunawayTransitions(MAX_MICRO_STEPS))
    }
}

/// Check that a phase carries the scratch pad it relies on.
fn check_scratch(phase: Phase, state: &GameState) -> Result<(), InvariantViolation> {
    let scratch = state.scratch.as_ref();
    let agrees = match phase {
        Phase::Searching(SearchPhase::Fighting(_)) => {
            matches!(scratch, Some(ScratchPad::Fight(_)))
        }
        Phase::Searching(SearchPhase::Idle(_)) => {
            matches!(scratch, Some(ScratchPad::Search(_) | ScratchPad::Fight(_)))
        }
        Phase::Searching(_) => matches!(scratch, Some(ScratchPad::Search(_))),
        Phase::Idle | Phase::Unconscious | Phase::GameOver => true,
        Phase::Activating => matches!(scratch, Some(ScratchPad::Activate)),
        Phase::Linking => matches!(scratch, Some(ScratchPad::Link)),
        Phase::Final => true,
    };
    let located = !matches!(phase, Phase::Searching(_)) || state.location.is_some();
    if agrees && located {
        Ok(())
    } else {
        Err(InvariantViolation::PhaseScratchMismatch {
            phase: phase.path(),
            scratch: scratch.map_or("none", ScratchPad::kind),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{SearchPad, Slot};

    fn engine() -> Engine {
        Engine::new(Some("testing"), 0).unwrap()
    }

    #[test]
    fn fresh_engine_is_idle() {
        let engine = engine();
        let snap = engine.snapshot();
        assert_eq!(snap.state_path, "idle");
        assert_eq!(snap.state.seed, "testing");
        assert_eq!(snap.log().len(), 1);
    }

    #[test]
    fn missing_seed_is_generated() {
        let engine = Engine::new(None, 0).unwrap();
        assert_eq!(engine.state().seed.len(), crate::seed::SEED_LEN);
    }

    #[test]
    fn expert_start_must_leave_time() {
        assert!(Engine::new(Some("x"), 3).is_ok());
        assert!(matches!(
            Engine::new(Some("x"), 15),
            Err(ConfigError::StartAfterDoomsday { .. })
        ));
    }

    #[test]
    fn search_rolls_two_dice_and_waits() {
        let mut engine = engine();
        let snap = engine.submit(Command::search(1)).unwrap();
        assert_eq!(snap.state_path, "searching.assigning.waiting");
        let pad = snap.state.search_pad().unwrap();
        assert!(pad.die1.is_some() && pad.die2.is_some());
        assert_eq!(snap.state.location, Some(1));
    }

    #[test]
    fn rejected_commands_change_nothing() {
        let mut engine = engine();
        let before = engine.snapshot();
        assert_eq!(
            engine.submit(Command::search(7)),
            Err(EngineError::InvalidLocation(7))
        );
        assert_eq!(
            engine.submit(Command::search(0)),
            Err(EngineError::InvalidLocation(0))
        );
        assert_eq!(
            engine.submit(Command::Again),
            Err(EngineError::UnexpectedEvent {
                state: "idle".into(),
                event: "AGAIN"
            })
        );
        assert_eq!(engine.snapshot(), before);

        engine.submit(Command::search(2)).unwrap();
        let before = engine.snapshot();
        let pad = before.state.search_pad().unwrap();
        let missing = (1..=6)
            .find(|v| Some(*v) != pad.die1 && Some(*v) != pad.die2)
            .unwrap();
        assert_eq!(
            engine.submit(Command::assign(missing, "A")),
            Err(EngineError::InvalidDie(missing))
        );
        let die = pad.die1.unwrap();
        assert_eq!(
            engine.submit(Command::assign(die, "Q")),
            Err(EngineError::InvalidSlot("Q".into()))
        );
        assert!(matches!(
            engine.submit(Command::assign(die, "")),
            Err(EngineError::MalformedAssignment(_))
        ));
        assert!(matches!(
            engine.submit(Command::resolve(vec![])),
            Err(EngineError::UnexpectedEvent { .. })
        ));
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn assigning_moves_dice_into_slots() {
        let mut engine = engine();
        let snap = engine.submit(Command::search(1)).unwrap();
        let pad = snap.state.search_pad().unwrap();
        let (first, second) = (pad.die1.unwrap(), pad.die2.unwrap());
        let snap = engine.submit(Command::assign(first, "a")).unwrap();
        assert_eq!(snap.state_path, "searching.assigning.waiting");
        assert_eq!(snap.state.search_pad().unwrap().slot(Slot::A), Some(first));
        let snap = engine.submit(Command::assign(second, "x")).unwrap();
        let pad = snap.state.search_pad().unwrap();
        assert_eq!(pad.slot(Slot::X), Some(second));
        assert!(pad.die1.is_some() && pad.die2.is_some());
        assert_eq!(
            engine.submit(Command::assign(pad.die1.unwrap(), "A")),
            Err(EngineError::SlotOccupied('A'))
        );
    }

    #[test]
    fn special_ending_ends_the_game() {
        let mut engine = engine();
        let snap = engine.trigger_special_ending().unwrap();
        assert_eq!(snap.state_path, "gameOver");
        assert!(snap.state.game_over);
        assert_eq!(engine.submit(Command::search(1)), Err(EngineError::GameOver));
        assert_eq!(engine.trigger_special_ending(), Err(EngineError::GameOver));
    }

    #[test]
    fn resume_rejects_mismatched_scratch() {
        let engine = engine();
        let mut snap = engine.snapshot();
        snap.phase = Phase::round(RoundPhase::SettingUp);
        snap.state.location = Some(1);
        snap.state.scratch = Some(ScratchPad::Search(SearchPad::new(0)));
        let err = Engine::resume(snap).unwrap_err();
        assert!(err.is_fault());
    }
}
