//! Names of every tool, artifact, treasure, component and world event.
//!
//! Serialized forms use the in-game names ("Seal of Balance", "Silver", ...)
//! so saved aggregates and content assets stay human readable.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of explorable locations.
pub const LOCATION_COUNT: usize = 6;
/// Faces on every die the engine rolls.
pub const DIE_FACES: u8 = 6;

/// Starting kit. Each tool works once and never comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tool {
    #[serde(rename = "Paralysis Wand")]
    ParalysisWand,
    #[serde(rename = "Dowsing Rod")]
    DowsingRod,
    #[serde(rename = "Focus Charm")]
    FocusCharm,
}

impl Tool {
    pub const ALL: [Self; 3] = [Self::ParalysisWand, Self::DowsingRod, Self::FocusCharm];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParalysisWand => "Paralysis Wand",
            Self::DowsingRod => "Dowsing Rod",
            Self::FocusCharm => "Focus Charm",
        }
    }
}

/// One artifact is hidden in each location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Artifact {
    #[serde(rename = "Seal of Balance")]
    SealOfBalance,
    #[serde(rename = "Hermetic Mirror")]
    HermeticMirror,
    #[serde(rename = "Void Gate")]
    VoidGate,
    #[serde(rename = "Golden Chassis")]
    GoldenChassis,
    #[serde(rename = "Scrying Lens")]
    ScryingLens,
    #[serde(rename = "Crystal Battery")]
    CrystalBattery,
}

impl Artifact {
    pub const ALL: [Self; 6] = [
        Self::SealOfBalance,
        Self::HermeticMirror,
        Self::VoidGate,
        Self::GoldenChassis,
        Self::ScryingLens,
        Self::CrystalBattery,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SealOfBalance => "Seal of Balance",
            Self::HermeticMirror => "Hermetic Mirror",
            Self::VoidGate => "Void Gate",
            Self::GoldenChassis => "Golden Chassis",
            Self::ScryingLens => "Scrying Lens",
            Self::CrystalBattery => "Crystal Battery",
        }
    }
}

/// Legendary treasures, dropped only by level 5 encounters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Treasure {
    #[serde(rename = "Ice Plate")]
    IcePlate,
    #[serde(rename = "Bracelet of Ios")]
    BraceletOfIos,
    #[serde(rename = "Shimmering Moonlace")]
    ShimmeringMoonlace,
    #[serde(rename = "Scale of the Infinity Wurm")]
    ScaleOfTheInfinityWurm,
    #[serde(rename = "The Ancient Record")]
    TheAncientRecord,
    #[serde(rename = "The Molten Shard")]
    TheMoltenShard,
}

impl Treasure {
    pub const ALL: [Self; 6] = [
        Self::IcePlate,
        Self::BraceletOfIos,
        Self::ShimmeringMoonlace,
        Self::ScaleOfTheInfinityWurm,
        Self::TheAncientRecord,
        Self::TheMoltenShard,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IcePlate => "Ice Plate",
            Self::BraceletOfIos => "Bracelet of Ios",
            Self::ShimmeringMoonlace => "Shimmering Moonlace",
            Self::ScaleOfTheInfinityWurm => "Scale of the Infinity Wurm",
            Self::TheAncientRecord => "The Ancient Record",
            Self::TheMoltenShard => "The Molten Shard",
        }
    }
}

/// Stackable crafting components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Component {
    Silver,
    Quartz,
    Silica,
    Gum,
    Wax,
    Lead,
}

impl Component {
    pub const ALL: [Self; 6] = [
        Self::Silver,
        Self::Quartz,
        Self::Silica,
        Self::Gum,
        Self::Wax,
        Self::Lead,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Silver => "Silver",
            Self::Quartz => "Quartz",
            Self::Silica => "Silica",
            Self::Gum => "Gum",
            Self::Wax => "Wax",
            Self::Lead => "Lead",
        }
    }
}

/// Events scattered over the map on every event day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WorldEvent {
    #[serde(rename = "Active Monsters")]
    ActiveMonsters,
    #[serde(rename = "Good Fortune")]
    GoodFortune,
    #[serde(rename = "Fleeting Visions")]
    FleetingVisions,
    #[serde(rename = "Foul Weather")]
    FoulWeather,
}

impl WorldEvent {
    /// Draw order used when the events are reassigned.
    pub const ALL: [Self; 4] = [
        Self::ActiveMonsters,
        Self::GoodFortune,
        Self::FleetingVisions,
        Self::FoulWeather,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ActiveMonsters => "Active Monsters",
            Self::GoodFortune => "Good Fortune",
            Self::FleetingVisions => "Fleeting Visions",
            Self::FoulWeather => "Foul Weather",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Treasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for WorldEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tool {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|v| v.as_str() == s).ok_or(())
    }
}

impl FromStr for Artifact {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|v| v.as_str() == s).ok_or(())
    }
}

impl FromStr for Treasure {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|v| v.as_str() == s).ok_or(())
    }
}

impl FromStr for Component {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|v| v.as_str() == s).ok_or(())
    }
}

impl FromStr for WorldEvent {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|v| v.as_str() == s).ok_or(())
    }
}

/// Any item a character can try to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Item {
    Tool(Tool),
    Artifact(Artifact),
    Treasure(Treasure),
}

impl Item {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tool(tool) => tool.as_str(),
            Self::Artifact(artifact) => artifact.as_str(),
            Self::Treasure(treasure) => treasure.as_str(),
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Tool> for Item {
    fn from(value: Tool) -> Self {
        Self::Tool(value)
    }
}

impl From<Artifact> for Item {
    fn from(value: Artifact) -> Self {
        Self::Artifact(value)
    }
}

impl From<Treasure> for Item {
    fn from(value: Treasure) -> Self {
        Self::Treasure(value)
    }
}
