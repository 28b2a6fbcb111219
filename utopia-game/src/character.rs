use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::constants::{Artifact, Component, Item, Tool, Treasure};
use crate::error::ItemError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSlot {
    pub name: Tool,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSlot {
    pub name: Artifact,
    pub active: bool,
    /// Set once the daily use is spent. Only meaningful for the Seal of Balance.
    #[serde(default)]
    pub used: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasureSlot {
    pub name: Treasure,
    pub active: bool,
}

/// The explorer: health plus everything carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub hp: i32,
    pub max_hp: i32,
    pub tools: Vec<ToolSlot>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactSlot>,
    #[serde(default)]
    pub treasures: Vec<TreasureSlot>,
    #[serde(default)]
    pub components: BTreeMap<Component, u8>,
    #[serde(default = "EngineConfig::default_component_cap")]
    pub component_cap: u8,
}

impl Default for Character {
    fn default() -> Self {
        Self::new(
            EngineConfig::default_max_hp(),
            EngineConfig::default_component_cap(),
        )
    }
}

impl Character {
    /// Full health and the three starting tools.
    #[must_use]
    pub fn new(max_hp: i32, component_cap: u8) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            tools: Tool::ALL
                .into_iter()
                .map(|name| ToolSlot { name, active: true })
                .collect(),
            artifacts: Vec::new(),
            treasures: Vec::new(),
            components: BTreeMap::new(),
            component_cap,
        }
    }

    #[must_use]
    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self::new(cfg.max_hp, cfg.component_cap)
    }

    /// Lose health. Going below zero is allowed and means death.
    pub fn harm(&mut self, amount: i32) {
        self.hp = self.hp.saturating_sub(amount);
    }

    pub fn heal(&mut self, amount: i32) {
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
    }

    /// Spend a tool, or the daily use of the Seal of Balance.
    ///
    /// # Errors
    ///
    /// `NotCarried` when the item is absent, `Inactive` for a spent tool and
    /// `NotUsable` for any item without a direct use.
    pub fn use_item(&mut self, item: Item) -> Result<(), ItemError> {
        match item {
            Item::Tool(tool) => {
                let slot = self
                    .tools
                    .iter_mut()
                    .find(|t| t.name == tool)
                    .ok_or(ItemError::NotCarried)?;
                if !slot.active {
                    return Err(ItemError::Inactive);
                }
                slot.active = false;
                Ok(())
            }
            Item::Artifact(Artifact::SealOfBalance) => {
                let slot = self
                    .fetch_artifact_mut(Artifact::SealOfBalance)
                    .ok_or(ItemError::NotCarried)?;
                slot.used = true;
                Ok(())
            }
            Item::Artifact(_) | Item::Treasure(_) => Err(ItemError::NotUsable),
        }
    }

    /// Add to a component stack, clamped to the cap.
    pub fn give_component(&mut self, component: Component, count: u8) {
        let cap = self.component_cap;
        let entry = self.components.entry(component).or_insert(0);
        *entry = entry.saturating_add(count).min(cap);
    }

    /// Remove from a component stack. Returns false and changes nothing if short.
    pub fn take_component(&mut self, component: Component, count: u8) -> bool {
        match self.components.get_mut(&component) {
            Some(held) if *held >= count => {
                *held -= count;
                true
            }
            _ => false,
        }
    }

    /// Add an artifact unless already held.
    pub fn grant_artifact(&mut self, name: Artifact, active: bool) {
        if !self.has_artifact(name) {
            self.artifacts.push(ArtifactSlot {
                name,
                active,
                used: false,
            });
        }
    }

    pub fn grant_treasure(&mut self, name: Treasure) {
        if !self.has_treasure(name) {
            self.treasures.push(TreasureSlot { name, active: true });
        }
    }

    /// A new day gives the Seal of Balance its use back.
    pub fn restore_daily_artifacts(&mut self) {
        if let Some(seal) = self.fetch_artifact_mut(Artifact::SealOfBalance) {
            seal.used = false;
        }
    }

    #[must_use]
    pub fn has_artifact(&self, name: Artifact) -> bool {
        self.artifacts.iter().any(|a| a.name == name)
    }

    #[must_use]
    pub fn artifact_is_active(&self, name: Artifact) -> bool {
        self.artifacts.iter().any(|a| a.name == name && a.active)
    }

    #[must_use]
    pub fn fetch_artifact(&self, name: Artifact) -> Option<&ArtifactSlot> {
        self.artifacts.iter().find(|a| a.name == name)
    }

    pub fn fetch_artifact_mut(&mut self, name: Artifact) -> Option<&mut ArtifactSlot> {
        self.artifacts.iter_mut().find(|a| a.name == name)
    }

    #[must_use]
    pub fn has_treasure(&self, name: Treasure) -> bool {
        self.treasures.iter().any(|t| t.name == name)
    }

    #[must_use]
    pub fn treasure_is_active(&self, name: Treasure) -> bool {
        self.treasures.iter().any(|t| t.name == name && t.active)
    }

    #[must_use]
    pub fn tool_is_active(&self, name: Tool) -> bool {
        self.tools.iter().any(|t| t.name == name && t.active)
    }

    #[must_use]
    pub fn has_component(&self, component: Component) -> bool {
        self.components.contains_key(&component)
    }

    #[must_use]
    pub fn component_count(&self, component: Component) -> u8 {
        self.components.get(&component).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn num_active_artifacts(&self) -> usize {
        self.artifacts.iter().filter(|a| a.active).count()
    }

    #[must_use]
    pub fn num_inactive_artifacts(&self) -> usize {
        self.artifacts.iter().filter(|a| !a.active).count()
    }

    #[must_use]
    pub fn num_inactive_tools(&self) -> usize {
        self.tools.iter().filter(|t| !t.active).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harm_goes_negative_but_heal_is_capped() {
        let mut hero = Character::default();
        hero.harm(8);
        assert_eq!(hero.hp, -2);
        hero.heal(20);
        assert_eq!(hero.hp, 6);
    }

    #[test]
    fn extreme_amounts_saturate() {
        let mut hero = Character::default();
        hero.heal(i32::MAX);
        assert_eq!(hero.hp, hero.max_hp);
        hero.harm(i32::MAX);
        hero.harm(i32::MAX);
        assert_eq!(hero.hp, i32::MIN);
        hero.heal(i32::MAX);
        assert_eq!(hero.hp, -1);
    }

    #[test]
    fn tools_are_single_use() {
        let mut hero = Character::default();
        assert_eq!(hero.num_inactive_tools(), 0);
        assert_eq!(hero.use_item(Tool::DowsingRod.into()), Ok(()));
        assert!(!hero.tool_is_active(Tool::DowsingRod));
        assert_eq!(
            hero.use_item(Tool::DowsingRod.into()),
            Err(ItemError::Inactive)
        );
        assert_eq!(hero.num_inactive_tools(), 1);
    }

    #[test]
    fn seal_of_balance_is_marked_used_but_stays_active() {
        let mut hero = Character::default();
        assert_eq!(
            hero.use_item(Artifact::SealOfBalance.into()),
            Err(ItemError::NotCarried)
        );
        hero.grant_artifact(Artifact::SealOfBalance, true);
        assert_eq!(hero.use_item(Artifact::SealOfBalance.into()), Ok(()));
        let seal = hero.fetch_artifact(Artifact::SealOfBalance).unwrap();
        assert!(seal.used);
        assert!(seal.active);
        hero.restore_daily_artifacts();
        assert!(!hero.fetch_artifact(Artifact::SealOfBalance).unwrap().used);
    }

    #[test]
    fn other_items_have_no_direct_use() {
        let mut hero = Character::default();
        hero.grant_artifact(Artifact::VoidGate, true);
        hero.grant_treasure(Treasure::IcePlate);
        assert_eq!(
            hero.use_item(Artifact::VoidGate.into()),
            Err(ItemError::NotUsable)
        );
        assert_eq!(
            hero.use_item(Treasure::IcePlate.into()),
            Err(ItemError::NotUsable)
        );
    }

    #[test]
    fn components_stay_between_zero_and_cap() {
        let mut hero = Character::default();
        assert!(!hero.has_component(Component::Lead));
        hero.give_component(Component::Lead, 9);
        assert_eq!(hero.component_count(Component::Lead), 4);
        hero.give_component(Component::Lead, 1);
        assert_eq!(hero.component_count(Component::Lead), 4);
        assert!(!hero.take_component(Component::Lead, 5));
        assert_eq!(hero.component_count(Component::Lead), 4);
        assert!(hero.take_component(Component::Lead, 4));
        assert_eq!(hero.component_count(Component::Lead), 0);
        assert!(hero.has_component(Component::Lead));
        assert!(!hero.take_component(Component::Wax, 1));
    }

    #[test]
    fn artifact_counts_split_on_activity() {
        let mut hero = Character::default();
        hero.grant_artifact(Artifact::HermeticMirror, true);
        hero.grant_artifact(Artifact::ScryingLens, false);
        hero.grant_artifact(Artifact::HermeticMirror, false);
        assert_eq!(hero.artifacts.len(), 2);
        assert_eq!(hero.num_active_artifacts(), 1);
        assert_eq!(hero.num_inactive_artifacts(), 1);
        assert!(hero.artifact_is_active(Artifact::HermeticMirror));
        assert!(!hero.artifact_is_active(Artifact::ScryingLens));
        assert!(hero.has_artifact(Artifact::ScryingLens));
    }

    #[test]
    fn treasures_are_append_only() {
        let mut hero = Character::default();
        hero.grant_treasure(Treasure::TheMoltenShard);
        hero.grant_treasure(Treasure::TheMoltenShard);
        assert_eq!(hero.treasures.len(), 1);
        assert!(hero.treasure_is_active(Treasure::TheMoltenShard));
        assert!(!hero.has_treasure(Treasure::IcePlate));
    }
}
