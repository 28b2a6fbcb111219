//! Utopia Engine rules engine
//!
//! Platform-agnostic core of a solo dice game: a hierarchical state machine
//! over the game aggregate, plus the character, clock, content tables and the
//! seeded dice everything draws from. No UI or platform dependencies.

pub mod character;
pub mod clock;
pub mod config;
pub mod constants;
pub mod data;
pub mod engine;
pub mod error;
pub mod rng;
pub mod seed;
pub mod state;

use std::sync::Arc;

pub use character::{ArtifactSlot, Character, ToolSlot, TreasureSlot};
pub use clock::{Clock, TickResult};
pub use config::EngineConfig;
pub use constants::{Artifact, Component, Item, Tool, Treasure, WorldEvent};
pub use data::{ContentTables, EncounterDef, HitRange, LinkDef, LocationDef, SearchModifier};
pub use engine::{
    AssignPhase, Command, Engine, FightPhase, LocalIdle, Phase, Resolution, ResolutionEntry,
    ResolvePhase, RoundPhase, SearchPhase, Snapshot,
};
pub use error::{ConfigError, ContentError, EngineError, InvariantViolation, ItemError};
pub use rng::{DiceRng, RngState};
pub use seed::generate_seed_text;
pub use state::{
    EncounterRef, FightPad, GameState, Interrupt, Link, ScratchPad, SearchPad, Slot, Status,
    TrackerMark,
};

/// Source of the static tables and rules.
/// Platform-specific implementations should provide this
pub trait ContentLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load location, hit-range and link tables.
    ///
    /// # Errors
    ///
    /// Returns an error if the tables cannot be loaded or fail validation.
    fn load_content(&self) -> Result<ContentTables, Self::Error>;

    /// Load the rule configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config(&self) -> Result<EngineConfig, Self::Error>;
}

/// Loader backed by the tables compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledContent;

impl ContentLoader for BundledContent {
    type Error = ContentError;

    fn load_content(&self) -> Result<ContentTables, Self::Error> {
        Ok(ContentTables::load_from_static().as_ref().clone())
    }

    fn load_config(&self) -> Result<EngineConfig, Self::Error> {
        Ok(EngineConfig::default())
    }
}

/// Trait for abstracting save/load operations
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    fn save_game(&self, save_name: &str, snapshot: &Snapshot) -> Result<(), Self::Error>;

    /// Load a snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded.
    fn load_game(&self, save_name: &str) -> Result<Option<Snapshot>, Self::Error>;

    /// Delete a saved game
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Creates engines from loaded content and moves their snapshots in and out of storage.
pub struct GameEngine<L, S>
where
    L: ContentLoader,
    S: GameStorage,
{
    content_loader: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: ContentLoader,
    S: GameStorage,
{
    pub const fn new(content_loader: L, storage: S) -> Self {
        Self {
            content_loader,
            storage,
        }
    }

    fn load_rules(&self) -> anyhow::Result<(EngineConfig, Arc<ContentTables>)>
    where
        L::Error: Into<anyhow::Error>,
    {
        let config = self.content_loader.load_config().map_err(Into::into)?;
        let content = self.content_loader.load_content().map_err(Into::into)?;
        Ok((config, Arc::new(content)))
    }

    /// Start a new game. A missing seed is generated.
    ///
    /// # Errors
    ///
    /// Returns an error if the content or configuration cannot be loaded or is invalid.
    pub fn create_game(&self, seed: Option<&str>) -> anyhow::Result<Engine>
    where
        L::Error: Into<anyhow::Error>,
    {
        let (config, content) = self.load_rules()?;
        Ok(Engine::with_config(seed, config, content)?)
    }

    /// Save the current snapshot of `engine`.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    pub fn save_game(&self, save_name: &str, engine: &Engine) -> Result<(), S::Error> {
        self.storage.save_game(save_name, &engine.snapshot())
    }

    /// Load a saved game and resume it against freshly loaded content.
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be read or does not describe a consistent game.
    pub fn load_game(&self, save_name: &str) -> anyhow::Result<Option<Engine>>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        let Some(snapshot) = self.storage.load_game(save_name).map_err(Into::into)? else {
            return Ok(None);
        };
        let (config, content) = self.load_rules()?;
        Ok(Some(Engine::resume_with(snapshot, config, content)?))
    }

    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_game(&self, save_name: &str) -> Result<(), S::Error> {
        self.storage.delete_save(save_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Copy, Default)]
    struct ExpertLoader;

    impl ContentLoader for ExpertLoader {
        type Error = ContentError;

        fn load_content(&self) -> Result<ContentTables, Self::Error> {
            BundledContent.load_content()
        }

        fn load_config(&self) -> Result<EngineConfig, Self::Error> {
            Ok(EngineConfig::default().with_expert_start_day(4))
        }
    }

    #[derive(Clone, Default)]
    struct MemoryStorage {
        saves: Rc<RefCell<HashMap<String, Snapshot>>>,
    }

    impl GameStorage for MemoryStorage {
        type Error = Infallible;

        fn save_game(&self, save_name: &str, snapshot: &Snapshot) -> Result<(), Self::Error> {
            self.saves
                .borrow_mut()
                .insert(save_name.to_string(), snapshot.clone());
            Ok(())
        }

        fn load_game(&self, save_name: &str) -> Result<Option<Snapshot>, Self::Error> {
            Ok(self.saves.borrow().get(save_name).cloned())
        }

        fn delete_save(&self, save_name: &str) -> Result<(), Self::Error> {
            self.saves.borrow_mut().remove(save_name);
            Ok(())
        }
    }

    #[test]
    fn engine_creates_and_roundtrips_games() {
        let engine = GameEngine::new(BundledContent, MemoryStorage::default());
        let mut game = engine.create_game(Some("slot")).unwrap();
        game.submit(Command::search(3)).unwrap();
        engine.save_game("slot-one", &game).unwrap();

        let loaded = engine.load_game("slot-one").unwrap().expect("save exists");
        assert_eq!(loaded.snapshot(), game.snapshot());
        assert!(engine.load_game("missing-slot").unwrap().is_none());

        engine.delete_game("slot-one").unwrap();
        assert!(engine.load_game("slot-one").unwrap().is_none());
    }

    #[test]
    fn loader_config_reaches_the_game() {
        let engine = GameEngine::new(ExpertLoader, MemoryStorage::default());
        let game = engine.create_game(None).unwrap();
        assert_eq!(game.state().clock.current, 4);
        assert_eq!(game.state().seed.len(), seed::SEED_LEN);
    }

    #[test]
    fn inconsistent_saves_are_rejected() {
        let storage = MemoryStorage::default();
        let engine = GameEngine::new(BundledContent, storage.clone());
        let game = engine.create_game(Some("broken")).unwrap();
        let mut snapshot = game.snapshot();
        snapshot.phase = Phase::assigning(AssignPhase::Waiting);
        storage.save_game("broken", &snapshot).unwrap();
        assert!(engine.load_game("broken").is_err());
    }
}
