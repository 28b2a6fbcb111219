use std::hash::Hasher;
use std::sync::Arc;

use thiserror::Error;
use twox_hash::XxHash64;
use utopia_game::{
    Artifact, Command, ContentTables, Engine, EngineConfig, EngineError, Snapshot,
};

use crate::logic::policy::{GameplayStrategy, PlayerPolicy, decide};

/// Configuration for a simulation session.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub seed: String,
    pub strategy: GameplayStrategy,
    pub command_cap: usize,
}

impl SimulationConfig {
    #[must_use]
    pub fn new(strategy: GameplayStrategy, seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            strategy,
            command_cap: 5_000,
        }
    }

    #[must_use]
    pub fn with_command_cap(mut self, command_cap: usize) -> Self {
        self.command_cap = command_cap;
        self
    }
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("engine fault after {command:?}: {source}")]
    Fault {
        command: Command,
        #[source]
        source: EngineError,
    },
    #[error("policy sent {command:?} in {state}: {source}")]
    Rejected {
        command: Command,
        state: String,
        #[source]
        source: EngineError,
    },
    #[error("invalid configuration: {0}")]
    Config(#[from] utopia_game::ConfigError),
}

/// One accepted command and why the policy chose it.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub day: u32,
    pub state_path: String,
    pub command: Command,
    pub policy_name: String,
    pub rationale: Option<String>,
}

/// Outcome of a finished or halted playthrough.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: String,
    pub strategy: GameplayStrategy,
    pub decisions: Vec<DecisionRecord>,
    pub final_snapshot: Snapshot,
    pub game_ended: bool,
    pub digest: u64,
}

impl SimulationSummary {
    #[must_use]
    pub fn commands(&self) -> Vec<Command> {
        self.decisions.iter().map(|d| d.command.clone()).collect()
    }

    #[must_use]
    pub fn days_elapsed(&self) -> u32 {
        self.final_snapshot.state.clock.current
    }

    #[must_use]
    pub fn artifacts_found(&self) -> usize {
        Artifact::ALL
            .into_iter()
            .filter(|a| self.final_snapshot.state.character.has_artifact(*a))
            .count()
    }
}

/// `XxHash64` of the snapshot's JSON form.
#[must_use]
pub fn snapshot_digest(snapshot: &Snapshot) -> u64 {
    let bytes = serde_json::to_vec(snapshot).unwrap_or_default();
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(&bytes);
    hasher.finish()
}

/// Seed for a policy's own generator, derived from the game seed.
#[must_use]
pub fn policy_seed(seed: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(0x5EED);
    hasher.write(seed.as_bytes());
    hasher.finish()
}

/// Drives one engine with one policy until game over or the command cap.
pub struct SimulationSession {
    engine: Engine,
    content: Arc<ContentTables>,
    config: SimulationConfig,
}

impl SimulationSession {
    /// # Errors
    ///
    /// Fails if the default rules do not validate.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        let content = ContentTables::load_from_static();
        let engine = Engine::with_config(
            Some(config.seed.as_str()),
            EngineConfig::default(),
            Arc::clone(&content),
        )?;
        Ok(Self {
            engine,
            content,
            config,
        })
    }

    /// # Errors
    ///
    /// Returns the first command the engine refused.
    pub fn run(mut self) -> Result<SimulationSummary, SimulationError> {
        let mut policy = self
            .config
            .strategy
            .create_policy(policy_seed(&self.config.seed));
        let mut decisions = Vec::new();
        while decisions.len() < self.config.command_cap {
            let snapshot = self.engine.snapshot();
            let Some(decision) = decide(policy.as_mut(), &snapshot, &self.content) else {
                break;
            };
            self.submit(&snapshot, decision.command.clone())?;
            log::trace!(
                "{} {} -> {:?}",
                policy.name(),
                snapshot.state_path,
                decision.command
            );
            decisions.push(DecisionRecord {
                day: snapshot.state.clock.current,
                state_path: snapshot.state_path,
                command: decision.command,
                policy_name: policy.name().to_string(),
                rationale: decision.rationale,
            });
        }
        let final_snapshot = self.engine.snapshot();
        Ok(SimulationSummary {
            seed: self.config.seed,
            strategy: self.config.strategy,
            game_ended: final_snapshot.state.game_over,
            digest: snapshot_digest(&final_snapshot),
            decisions,
            final_snapshot,
        })
    }

    fn submit(&mut self, before: &Snapshot, command: Command) -> Result<(), SimulationError> {
        match self.engine.submit(command.clone()) {
            Ok(_) => Ok(()),
            Err(source) if source.is_fault() => Err(SimulationError::Fault { command, source }),
            Err(source) => Err(SimulationError::Rejected {
                command,
                state: before.state_path.clone(),
                source,
            }),
        }
    }
}

/// Replay `commands` on a fresh engine and digest the result.
///
/// # Errors
///
/// Fails if any recorded command is refused on replay.
pub fn replay_digest(seed: &str, commands: Vec<Command>) -> Result<u64, SimulationError> {
    let config = SimulationConfig::new(GameplayStrategy::Greedy, seed);
    let mut session = SimulationSession::new(config)?;
    for command in commands {
        let before = session.engine.snapshot();
        session.submit(&before, command)?;
    }
    Ok(snapshot_digest(&session.engine.snapshot()))
}
