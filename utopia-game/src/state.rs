use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use crate::character::Character;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::constants::{Artifact, Component, LOCATION_COUNT, WorldEvent};
use crate::data::{ContentTables, HitRange};
use crate::error::InvariantViolation;
use crate::rng::{DiceRng, RngState};

/// Lowest and highest possible raw search result.
pub const RAW_MIN: i32 = -555;
pub const RAW_MAX: i32 = 555;

/// Decisions the player is asked to make mid-activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interrupt {
    #[serde(rename = "Seal of Balance")]
    SealOfBalance,
    #[serde(rename = "Dowsing Rod")]
    DowsingRod,
    #[serde(rename = "Good Fortune")]
    GoodFortune,
    #[serde(rename = "Hermetic Mirror")]
    HermeticMirror,
    #[serde(rename = "Scrying Lens")]
    ScryingLens,
    #[serde(rename = "Shimmering Moonlace")]
    ShimmeringMoonlace,
    #[serde(rename = "Paralysis Wand")]
    ParalysisWand,
}

impl Interrupt {
    pub const ALL: [Self; 7] = [
        Self::SealOfBalance,
        Self::DowsingRod,
        Self::GoodFortune,
        Self::HermeticMirror,
        Self::ScryingLens,
        Self::ShimmeringMoonlace,
        Self::ParalysisWand,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SealOfBalance => "Seal of Balance",
            Self::DowsingRod => "Dowsing Rod",
            Self::GoodFortune => "Good Fortune",
            Self::HermeticMirror => "Hermetic Mirror",
            Self::ScryingLens => "Scrying Lens",
            Self::ShimmeringMoonlace => "Shimmering Moonlace",
            Self::ParalysisWand => "Paralysis Wand",
        }
    }

    /// Interrupts answered with an amount to subtract rather than yes or no.
    #[must_use]
    pub const fn takes_offset(self) -> bool {
        matches!(
            self,
            Self::GoodFortune | Self::HermeticMirror | Self::ScryingLens
        )
    }

    #[must_use]
    pub const fn for_modifier(artifact: Artifact) -> Option<Self> {
        match artifact {
            Artifact::HermeticMirror => Some(Self::HermeticMirror),
            Artifact::ScryingLens => Some(Self::ScryingLens),
            _ => None,
        }
    }
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interrupt {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|i| i.as_str() == s).ok_or(())
    }
}

/// Effects in force for the current attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Status {
    Accepted { interrupt: Interrupt },
    Offset { interrupt: Interrupt, amount: i32 },
    /// Void Gate against a spirit encounter.
    SpiritAdvantage,
}

impl Status {
    #[must_use]
    pub const fn interrupt(&self) -> Option<Interrupt> {
        match self {
            Self::Accepted { interrupt } | Self::Offset { interrupt, .. } => Some(*interrupt),
            Self::SpiritAdvantage => None,
        }
    }
}

/// The eight places a die can be written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    A,
    B,
    C,
    D,
    W,
    X,
    Y,
    Z,
}

impl Slot {
    pub const ALL: [Self; 8] = [
        Self::A,
        Self::B,
        Self::C,
        Self::D,
        Self::W,
        Self::X,
        Self::Y,
        Self::Z,
    ];

    /// Slots that make up the two three-digit numbers.
    pub const REQUIRED: [Self; 6] = [Self::A, Self::B, Self::C, Self::X, Self::Y, Self::Z];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::W => 'W',
            Self::X => 'X',
            Self::Y => 'Y',
            Self::Z => 'Z',
        }
    }
}

impl FromStr for Slot {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::ALL
                .into_iter()
                .find(|slot| slot.letter() == c.to_ascii_uppercase())
                .ok_or(()),
            _ => Err(()),
        }
    }
}

/// Per-attempt working data of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SearchPad {
    pub tracker_position: u8,
    #[serde(default)]
    pub interrupts: SmallVec<[Interrupt; 4]>,
    #[serde(default)]
    pub statuses: Vec<Status>,
    #[serde(default)]
    pub ignored: SmallVec<[Interrupt; 4]>,
    #[serde(default)]
    pub slots: [Option<u8>; 8],
    #[serde(default)]
    pub die1: Option<u8>,
    #[serde(default)]
    pub die2: Option<u8>,
    #[serde(default)]
    pub raw_result: Option<i32>,
}

impl SearchPad {
    #[must_use]
    pub fn new(tracker_position: u8) -> Self {
        Self {
            tracker_position,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn slot(&self, slot: Slot) -> Option<u8> {
        self.slots[slot.index()]
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        Slot::REQUIRED.iter().all(|s| self.slot(*s).is_some())
    }

    #[must_use]
    pub const fn has_outstanding_dice(&self) -> bool {
        self.die1.is_some() || self.die2.is_some()
    }

    /// `ABC - XYZ` once all six required slots hold a die.
    #[must_use]
    pub fn compute_raw(&self) -> Option<i32> {
        let digit = |slot| self.slot(slot).map(i32::from);
        let top = digit(Slot::A)? * 100 + digit(Slot::B)? * 10 + digit(Slot::C)?;
        let bottom = digit(Slot::X)? * 100 + digit(Slot::Y)? * 10 + digit(Slot::Z)?;
        Some(top - bottom)
    }

    #[must_use]
    pub fn is_pending(&self, interrupt: Interrupt) -> bool {
        self.interrupts.contains(&interrupt)
    }

    #[must_use]
    pub fn accepted(&self, interrupt: Interrupt) -> bool {
        self.statuses
            .iter()
            .any(|s| matches!(s, Status::Accepted { interrupt: i } if *i == interrupt))
    }

    #[must_use]
    pub fn has_status(&self, status: Status) -> bool {
        self.statuses.contains(&status)
    }

    /// Pending, already answered, or declined during this attempt.
    #[must_use]
    pub fn is_settled(&self, interrupt: Interrupt) -> bool {
        self.is_pending(interrupt)
            || self.ignored.contains(&interrupt)
            || self
                .statuses
                .iter()
                .any(|s| s.interrupt() == Some(interrupt))
    }

    /// Forget any answer to `interrupt` so it can be asked again.
    pub fn reset_interrupt(&mut self, interrupt: Interrupt) {
        self.statuses.retain(|s| s.interrupt() != Some(interrupt));
        self.ignored.retain(|i| *i != interrupt);
        self.interrupts.retain(|i| *i != interrupt);
    }
}

/// Which encounter is being fought.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterRef {
    pub location: u8,
    pub level: u8,
    pub name: String,
    pub spirit: bool,
}

/// A search that turned into a fight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightPad {
    pub search: SearchPad,
    pub encounter_level: u8,
    pub encounter: EncounterRef,
    pub hit_range: HitRange,
    #[serde(default)]
    pub defeated: bool,
}

impl FightPad {
    /// The fight was skipped with the Shimmering Moonlace.
    #[must_use]
    pub fn evaded(&self) -> bool {
        self.search.accepted(Interrupt::ShimmeringMoonlace)
    }
}

/// Working data of the activity in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScratchPad {
    Search(SearchPad),
    Fight(FightPad),
    Activate,
    Link,
}

impl ScratchPad {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Search(_) => "search",
            Self::Fight(_) => "fight",
            Self::Activate => "activate",
            Self::Link => "link",
        }
    }

    /// Search data shared by search and fight pads.
    #[must_use]
    pub const fn search(&self) -> Option<&SearchPad> {
        match self {
            Self::Search(pad) => Some(pad),
            Self::Fight(fight) => Some(&fight.search),
            Self::Activate | Self::Link => None,
        }
    }

    pub const fn search_mut(&mut self) -> Option<&mut SearchPad> {
        match self {
            Self::Search(pad) => Some(pad),
            Self::Fight(fight) => Some(&mut fight.search),
            Self::Activate | Self::Link => None,
        }
    }
}

/// One entry of the crafting ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub prerequisite: Option<Artifact>,
    pub component: Component,
    #[serde(default)]
    pub value: Option<i32>,
}

/// Where the last search happened and how far its tracker had moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerMark {
    pub location: u8,
    pub position: u8,
}

/// Everything that makes up a game in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub seed: String,
    pub rng_state: RngState,
    #[serde(default)]
    pub location: Option<u8>,
    #[serde(default)]
    pub scratch: Option<ScratchPad>,
    /// Survives leaving the location so a return visit resumes the tracker.
    #[serde(default)]
    pub last_tracker: Option<TrackerMark>,
    pub character: Character,
    pub clock: Clock,
    #[serde(default)]
    pub log: Vec<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub location_events: [Vec<WorldEvent>; LOCATION_COUNT],
    #[serde(default)]
    pub game_over: bool,
    /// Set from outside to force the alternate ending.
    #[serde(default)]
    pub special_ending: bool,
}

impl GameState {
    #[must_use]
    pub fn new(seed: &str, cfg: &EngineConfig, content: &ContentTables) -> Self {
        Self {
            seed: seed.to_string(),
            rng_state: DiceRng::from_seed_text(seed).export(),
            location: None,
            scratch: None,
            last_tracker: None,
            character: Character::from_config(cfg),
            clock: Clock::from_config(cfg),
            log: vec![format!("Game started with the following seed: {seed}")],
            links: content
                .links
                .iter()
                .map(|def| Link {
                    prerequisite: def.prerequisite,
                    component: def.component,
                    value: None,
                })
                .collect(),
            location_events: Default::default(),
            game_over: false,
            special_ending: false,
        }
    }

    /// Roll one die, advancing the stored generator state.
    pub fn roll_die(&mut self) -> u8 {
        let mut rng = DiceRng::import(&self.rng_state);
        let value = rng.roll_die();
        self.rng_state = rng.export();
        value
    }

    pub fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }

    #[must_use]
    pub fn num_linked(&self) -> usize {
        self.links.iter().filter(|l| l.value.is_some()).count()
    }

    #[must_use]
    pub fn events_at(&self, location: u8) -> &[WorldEvent] {
        usize::from(location)
            .checked_sub(1)
            .and_then(|i| self.location_events.get(i))
            .map_or(&[][..], Vec::as_slice)
    }

    /// Death, the alternate ending, or doomsday.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.character.hp < 0 || self.special_ending || self.clock.triggered
    }

    /// # Errors
    ///
    /// Fails when no location is being explored.
    pub fn current_location(&self) -> Result<u8, InvariantViolation> {
        self.location.ok_or(InvariantViolation::MissingLocation)
    }

    /// # Errors
    ///
    /// Fails when there is no search or fight pad.
    pub fn shared_pad(&self) -> Result<&SearchPad, InvariantViolation> {
        let scratch = self
            .scratch
            .as_ref()
            .ok_or(InvariantViolation::MissingScratch)?;
        scratch
            .search()
            .ok_or(InvariantViolation::WrongScratchVariant {
                expected: "search",
                found: scratch.kind(),
            })
    }

    /// # Errors
    ///
    /// Fails when there is no search or fight pad.
    pub fn shared_pad_mut(&mut self) -> Result<&mut SearchPad, InvariantViolation> {
        let scratch = self
            .scratch
            .as_mut()
            .ok_or(InvariantViolation::MissingScratch)?;
        let found = scratch.kind();
        scratch
            .search_mut()
            .ok_or(InvariantViolation::WrongScratchVariant {
                expected: "search",
                found,
            })
    }

    /// # Errors
    ///
    /// Fails unless the scratch pad is a search pad.
    pub fn search_pad(&self) -> Result<&SearchPad, InvariantViolation> {
        match &self.scratch {
            Some(ScratchPad::Search(pad)) => Ok(pad),
            Some(other) => Err(InvariantViolation::WrongScratchVariant {
                expected: "search",
                found: other.kind(),
            }),
            None => Err(InvariantViolation::MissingScratch),
        }
    }

    /// # Errors
    ///
    /// Fails unless the scratch pad is a search pad.
    pub fn search_pad_mut(&mut self) -> Result<&mut SearchPad, InvariantViolation> {
        match &mut self.scratch {
            Some(ScratchPad::Search(pad)) => Ok(pad),
            Some(other) => Err(InvariantViolation::WrongScratchVariant {
                expected: "search",
                found: other.kind(),
            }),
            None => Err(InvariantViolation::MissingScratch),
        }
    }

    /// # Errors
    ///
    /// Fails unless the scratch pad is a fight pad.
    pub fn fight_pad(&self) -> Result<&FightPad, InvariantViolation> {
        match &self.scratch {
            Some(ScratchPad::Fight(pad)) => Ok(pad),
            Some(other) => Err(InvariantViolation::WrongScratchVariant {
                expected: "fight",
                found: other.kind(),
            }),
            None => Err(InvariantViolation::MissingScratch),
        }
    }

    /// # Errors
    ///
    /// Fails unless the scratch pad is a fight pad.
    pub fn fight_pad_mut(&mut self) -> Result<&mut FightPad, InvariantViolation> {
        match &mut self.scratch {
            Some(ScratchPad::Fight(pad)) => Ok(pad),
            Some(other) => Err(InvariantViolation::WrongScratchVariant {
                expected: "fight",
                found: other.kind(),
            }),
            None => Err(InvariantViolation::MissingScratch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_state() -> GameState {
        GameState::new(
            "testing",
            &EngineConfig::default(),
            &ContentTables::load_from_static(),
        )
    }

    #[test]
    fn new_state_starts_idle_with_links() {
        let state = fresh_state();
        assert_eq!(state.links.len(), 6);
        assert_eq!(state.num_linked(), 0);
        assert_eq!(state.links[1].prerequisite, Some(Artifact::SealOfBalance));
        assert!(state.location_events.iter().all(Vec::is_empty));
        assert!(!state.is_terminal());
        assert_eq!(
            state.log,
            vec!["Game started with the following seed: testing".to_string()]
        );
    }

    #[test]
    fn rolling_persists_the_generator() {
        let mut a = fresh_state();
        let mut b = fresh_state();
        let first = (a.roll_die(), a.roll_die());
        assert_ne!(a.rng_state, b.rng_state);
        assert_eq!(first, (b.roll_die(), b.roll_die()));
        assert_eq!(a.rng_state, b.rng_state);
    }

    #[test]
    fn raw_result_reads_two_three_digit_numbers() {
        let mut pad = SearchPad::new(0);
        for (slot, value) in [
            (Slot::A, 2),
            (Slot::B, 4),
            (Slot::C, 3),
            (Slot::X, 2),
            (Slot::Y, 4),
        ] {
            pad.slots[slot.index()] = Some(value);
        }
        assert!(!pad.is_full());
        assert_eq!(pad.compute_raw(), None);
        pad.slots[Slot::Z.index()] = Some(2);
        assert!(pad.is_full());
        assert_eq!(pad.compute_raw(), Some(1));
    }

    #[test]
    fn slot_labels_parse_case_insensitively() {
        assert_eq!("a".parse::<Slot>(), Ok(Slot::A));
        assert_eq!(" Z ".parse::<Slot>(), Ok(Slot::Z));
        assert_eq!("w".parse::<Slot>(), Ok(Slot::W));
        assert!("E".parse::<Slot>().is_err());
        assert!("AB".parse::<Slot>().is_err());
        assert_eq!(Slot::X.index(), 5);
    }

    #[test]
    fn settled_interrupts_cover_every_answer() {
        let mut pad = SearchPad::new(0);
        assert!(!pad.is_settled(Interrupt::GoodFortune));
        pad.interrupts.push(Interrupt::GoodFortune);
        assert!(pad.is_settled(Interrupt::GoodFortune));
        pad.interrupts.clear();
        pad.ignored.push(Interrupt::DowsingRod);
        pad.statuses.push(Status::Offset {
            interrupt: Interrupt::HermeticMirror,
            amount: 3,
        });
        assert!(pad.is_settled(Interrupt::DowsingRod));
        assert!(pad.is_settled(Interrupt::HermeticMirror));
        pad.reset_interrupt(Interrupt::DowsingRod);
        assert!(!pad.is_settled(Interrupt::DowsingRod));
    }

    #[test]
    fn scratch_variants_are_checked() {
        let mut state = fresh_state();
        assert_eq!(state.search_pad(), Err(InvariantViolation::MissingScratch));
        state.scratch = Some(ScratchPad::Search(SearchPad::new(2)));
        assert_eq!(state.shared_pad().unwrap().tracker_position, 2);
        assert!(matches!(
            state.fight_pad(),
            Err(InvariantViolation::WrongScratchVariant {
                expected: "fight",
                found: "search"
            })
        ));
        state.scratch = Some(ScratchPad::Activate);
        assert!(state.shared_pad().is_err());
    }

    #[test]
    fn aggregate_survives_json() {
        let mut state = fresh_state();
        state.location = Some(3);
        state.scratch = Some(ScratchPad::Search(SearchPad::new(1)));
        state.location_events[2].push(WorldEvent::FoulWeather);
        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
        assert_eq!(back.events_at(3), &[WorldEvent::FoulWeather]);
        assert!(back.events_at(0).is_empty());
    }
}
