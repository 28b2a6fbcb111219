use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

use crate::constants::{Artifact, Component, LOCATION_COUNT, Treasure};
use crate::error::ContentError;

/// Number of encounter levels (and therefore encounters per location).
pub const ENCOUNTER_LEVELS: usize = 5;

/// One entry of a location's encounter roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterDef {
    pub name: String,
    pub level: u8,
    #[serde(default)]
    pub spirit: bool,
}

/// Die faces that hurt the player and faces that defeat the encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitRange {
    pub enemy_min: u8,
    pub enemy_max: u8,
    pub player_min: u8,
    pub player_max: u8,
}

impl HitRange {
    #[must_use]
    pub const fn enemy_hits(&self, die: u8) -> bool {
        die >= self.enemy_min && die <= self.enemy_max
    }

    #[must_use]
    pub const fn player_hits(&self, die: u8) -> bool {
        die >= self.player_min && die <= self.player_max
    }

    /// Narrow the enemy range by one face, never below a single face.
    #[must_use]
    pub const fn shrink_enemy(mut self) -> Self {
        if self.enemy_max > self.enemy_min {
            self.enemy_max -= 1;
        }
        self
    }

    /// Widen the player range by one face downwards.
    #[must_use]
    pub const fn widen_player(mut self) -> Self {
        if self.player_min > 1 {
            self.player_min -= 1;
        }
        self
    }
}

/// Static description of an explorable location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationDef {
    pub id: u8,
    pub name: String,
    pub tracker: [i8; 6],
    pub component: Component,
    pub artifact: Artifact,
    pub treasure: Treasure,
    pub encounters: Vec<EncounterDef>,
}

impl LocationDef {
    /// Encounter for a level in `1..=5`.
    #[must_use]
    pub fn encounter(&self, level: u8) -> Option<&EncounterDef> {
        self.encounters.iter().find(|e| e.level == level)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDef {
    #[serde(default)]
    pub prerequisite: Option<Artifact>,
    pub component: Component,
}

/// Artifact that may lower search results at two locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchModifier {
    pub artifact: Artifact,
    pub locations: [u8; 2],
}

/// Immutable lookup tables the engine consults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTables {
    pub locations: Vec<LocationDef>,
    pub hit_ranges: Vec<HitRange>,
    pub links: Vec<LinkDef>,
    #[serde(default)]
    pub search_modifiers: Vec<SearchModifier>,
}

static STATIC_CONTENT: OnceLock<Arc<ContentTables>> = OnceLock::new();

impl ContentTables {
    /// Parse and validate content from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` if the JSON is malformed or the tables are inconsistent.
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        let tables: Self =
            serde_json::from_str(json).map_err(|err| ContentError::Parse(err.to_string()))?;
        tables.validate()?;
        Ok(tables)
    }

    /// Shared copy of the tables bundled with the crate.
    #[must_use]
    pub fn load_from_static() -> Arc<Self> {
        STATIC_CONTENT
            .get_or_init(|| {
                Arc::new(
                    Self::from_json(include_str!("../assets/content.json"))
                        .expect("valid bundled content"),
                )
            })
            .clone()
    }

    /// Check table sizes, ids and level ordering.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.locations.len() != LOCATION_COUNT {
            return Err(ContentError::Count {
                table: "locations",
                expected: LOCATION_COUNT,
                found: self.locations.len(),
            });
        }
        for (index, location) in self.locations.iter().enumerate() {
            if usize::from(location.id) != index + 1 {
                return Err(ContentError::LocationId {
                    index,
                    id: location.id,
                });
            }
            if location.encounters.len() != ENCOUNTER_LEVELS {
                return Err(ContentError::Count {
                    table: "encounters",
                    expected: ENCOUNTER_LEVELS,
                    found: location.encounters.len(),
                });
            }
            for (slot, encounter) in location.encounters.iter().enumerate() {
                if usize::from(encounter.level) != slot + 1 {
                    return Err(ContentError::EncounterLevel {
                        location: location.name.clone(),
                        index: slot,
                        level: encounter.level,
                    });
                }
            }
        }
        if self.hit_ranges.len() != ENCOUNTER_LEVELS {
            return Err(ContentError::Count {
                table: "hit ranges",
                expected: ENCOUNTER_LEVELS,
                found: self.hit_ranges.len(),
            });
        }
        for (index, range) in self.hit_ranges.iter().enumerate() {
            let ordered = range.enemy_min >= 1
                && range.enemy_min <= range.enemy_max
                && range.player_min <= range.player_max
                && range.player_max <= 6;
            if !ordered {
                return Err(ContentError::HitRange { level: index + 1 });
            }
        }
        if self.links.len() != LOCATION_COUNT {
            return Err(ContentError::Count {
                table: "links",
                expected: LOCATION_COUNT,
                found: self.links.len(),
            });
        }
        for modifier in &self.search_modifiers {
            if modifier
                .locations
                .iter()
                .any(|id| self.location(*id).is_none())
            {
                return Err(ContentError::ModifierLocation(
                    modifier.artifact.to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Location by its 1-based id.
    #[must_use]
    pub fn location(&self, id: u8) -> Option<&LocationDef> {
        self.locations.iter().find(|loc| loc.id == id)
    }

    /// Hit range for an encounter level in `1..=5`.
    #[must_use]
    pub fn hit_range(&self, level: u8) -> Option<HitRange> {
        let index = usize::from(level).checked_sub(1)?;
        self.hit_ranges.get(index).copied()
    }

    /// Artifacts allowed to lower results at a location.
    pub fn search_modifiers_at(&self, id: u8) -> impl Iterator<Item = Artifact> + '_ {
        self.search_modifiers
            .iter()
            .filter(move |m| m.locations.contains(&id))
            .map(|m| m.artifact)
    }
}
