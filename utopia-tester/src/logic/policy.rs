use std::fmt;

use clap::ValueEnum;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use utopia_game::{
    AssignPhase, Command, ContentTables, EngineConfig, GameState, Interrupt, LocalIdle, Phase,
    ResolutionEntry, SearchPad, SearchPhase, Slot, Snapshot,
};

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub command: Command,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(command: Command, rationale: Option<String>) -> Self {
        Self { command, rationale }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Where to search from the workshop.
    fn pick_location(&mut self, state: &GameState, content: &ContentTables) -> PolicyDecision;

    /// Place one of the outstanding dice.
    fn place_die(&mut self, pad: &SearchPad) -> PolicyDecision;

    /// Answer the first pending interrupt.
    fn answer(&mut self, pad: &SearchPad, interrupt: Interrupt) -> PolicyDecision;

    /// Again, leave or camp once a search action is done.
    fn after_search(&mut self, state: &GameState, content: &ContentTables) -> PolicyDecision;
}

/// Route a snapshot to the policy hook for its phase. `None` once nothing is expected.
pub fn decide(
    policy: &mut dyn PlayerPolicy,
    snapshot: &Snapshot,
    content: &ContentTables,
) -> Option<PolicyDecision> {
    let state = &snapshot.state;
    match snapshot.phase {
        Phase::Idle => Some(policy.pick_location(state, content)),
        Phase::Searching(SearchPhase::Assigning(AssignPhase::Waiting)) => {
            state.search_pad().ok().map(|pad| policy.place_die(pad))
        }
        Phase::Searching(SearchPhase::Idle(LocalIdle::Waiting)) => {
            Some(policy.after_search(state, content))
        }
        Phase::Searching(_) => {
            let pad = state.shared_pad().ok()?;
            let interrupt = *pad.interrupts.first()?;
            Some(policy.answer(pad, interrupt))
        }
        _ => None,
    }
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum GameplayStrategy {
    Greedy,
    Random,
}

impl GameplayStrategy {
    pub const ALL: [Self; 2] = [Self::Greedy, Self::Random];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GameplayStrategy::Greedy => "Greedy",
            GameplayStrategy::Random => "Random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            GameplayStrategy::Greedy => Box::new(GreedyPolicy),
            GameplayStrategy::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const fn exact_find_applies(raw: i32) -> bool {
    raw > 10 && raw < 100
}

fn outstanding_dice(pad: &SearchPad) -> Vec<u8> {
    let mut dice: Vec<u8> = pad.die1.into_iter().chain(pad.die2).collect();
    dice.dedup();
    dice
}

fn free_slots(pad: &SearchPad) -> Vec<Slot> {
    Slot::ALL
        .into_iter()
        .filter(|s| pad.slot(*s).is_none())
        .collect()
}

fn resolve_one(entry: ResolutionEntry) -> Command {
    Command::resolve(vec![entry])
}

/// Aims every search at a small positive result and spends items where they help.
struct GreedyPolicy;

const TARGET_RAW: f64 = 5.0;
const UNKNOWN_DIE: f64 = 3.5;

/// Expected raw result with unfilled slots counted at the mean face.
fn estimate_raw(slots: &[Option<u8>; 8]) -> f64 {
    let digit = |slot: Slot| slots[slot.index()].map_or(UNKNOWN_DIE, f64::from);
    let top = digit(Slot::A) * 100.0 + digit(Slot::B) * 10.0 + digit(Slot::C);
    let bottom = digit(Slot::X) * 100.0 + digit(Slot::Y) * 10.0 + digit(Slot::Z);
    top - bottom
}

impl PlayerPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn pick_location(&mut self, state: &GameState, content: &ContentTables) -> PolicyDecision {
        let target = content
            .locations
            .iter()
            .find(|loc| !state.character.has_artifact(loc.artifact))
            .or_else(|| content.locations.first());
        let (id, reason) = target.map_or((1, "fallback".to_string()), |loc| {
            (loc.id, format!("seeking {}", loc.artifact))
        });
        PolicyDecision::new(Command::search(id), Some(reason))
    }

    fn place_die(&mut self, pad: &SearchPad) -> PolicyDecision {
        let mut best: Option<(f64, u8, Slot)> = None;
        for value in outstanding_dice(pad) {
            for slot in free_slots(pad) {
                let mut slots = pad.slots;
                slots[slot.index()] = Some(value);
                let score = (estimate_raw(&slots) - TARGET_RAW).abs();
                if best.is_none_or(|(current, _, _)| score < current) {
                    best = Some((score, value, slot));
                }
            }
        }
        let (score, value, slot) = best.unwrap_or((0.0, pad.die1.unwrap_or(1), Slot::A));
        PolicyDecision::new(
            Command::assign(value, slot.letter().to_string()),
            Some(format!("expected distance {score:.1}")),
        )
    }

    fn answer(&mut self, pad: &SearchPad, interrupt: Interrupt) -> PolicyDecision {
        let raw = pad.raw_result.unwrap_or_default();
        let (entry, reason) = match interrupt {
            Interrupt::DowsingRod if exact_find_applies(raw) => {
                (ResolutionEntry::accept(interrupt), "exact find")
            }
            Interrupt::GoodFortune | Interrupt::HermeticMirror | Interrupt::ScryingLens
                if raw > 10 =>
            {
                let amount = raw.min(EngineConfig::default_max_interrupt_offset());
                (ResolutionEntry::offset(interrupt, amount), "lower the result")
            }
            Interrupt::ShimmeringMoonlace | Interrupt::ParalysisWand => {
                (ResolutionEntry::accept(interrupt), "avoid damage")
            }
            _ => (ResolutionEntry::decline(interrupt), "no benefit"),
        };
        PolicyDecision::new(resolve_one(entry), Some(reason.to_string()))
    }

    fn after_search(&mut self, state: &GameState, content: &ContentTables) -> PolicyDecision {
        let hero = &state.character;
        if hero.hp <= 2 {
            let days = u32::try_from(hero.max_hp - hero.hp).unwrap_or(1).max(1);
            return PolicyDecision::new(Command::camp(days), Some("recover".to_string()));
        }
        let found = state
            .location
            .and_then(|id| content.location(id))
            .is_some_and(|loc| hero.has_artifact(loc.artifact));
        if found {
            PolicyDecision::new(Command::Leave, Some("artifact found".to_string()))
        } else {
            PolicyDecision::new(Command::Again, Some("keep searching".to_string()))
        }
    }
}

/// Uniform choice among valid commands, seeded for reproducibility.
struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_location(&mut self, _state: &GameState, content: &ContentTables) -> PolicyDecision {
        let id = content
            .locations
            .choose(&mut self.rng)
            .map_or(1, |loc| loc.id);
        PolicyDecision::new(Command::search(id), None)
    }

    fn place_die(&mut self, pad: &SearchPad) -> PolicyDecision {
        let value = outstanding_dice(pad)
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(1);
        let slot = free_slots(pad)
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Slot::A);
        PolicyDecision::new(Command::assign(value, slot.letter().to_string()), None)
    }

    fn answer(&mut self, pad: &SearchPad, interrupt: Interrupt) -> PolicyDecision {
        let raw = pad.raw_result.unwrap_or_default();
        let accept = self.rng.gen_bool(0.5);
        let entry = if !accept || (interrupt == Interrupt::DowsingRod && !exact_find_applies(raw))
        {
            ResolutionEntry::decline(interrupt)
        } else if interrupt.takes_offset() {
            let max = EngineConfig::default_max_interrupt_offset();
            ResolutionEntry::offset(interrupt, self.rng.gen_range(1..=max))
        } else {
            ResolutionEntry::accept(interrupt)
        };
        PolicyDecision::new(resolve_one(entry), None)
    }

    fn after_search(&mut self, _state: &GameState, _content: &ContentTables) -> PolicyDecision {
        let command = match self.rng.gen_range(0..4) {
            0 | 1 => Command::Again,
            2 => Command::Leave,
            _ => Command::camp(self.rng.gen_range(1..=3)),
        };
        PolicyDecision::new(command, None)
    }
}
