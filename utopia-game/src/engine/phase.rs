use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Searching(SearchPhase),
    Unconscious,
    GameOver,
    Activating,
    Linking,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchPhase {
    SettingUp,
    InterruptingSetup,
    Assigning(AssignPhase),
    Resolving(ResolvePhase),
    Fighting(FightPhase),
    Idle(LocalIdle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignPhase {
    Rolling,
    Waiting,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvePhase {
    SettingUp,
    Interrupting,
    Deciding,
    GrantingArtifact,
    GrantingComponent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FightPhase {
    SettingUp,
    InterruptingSetup,
    Rolling(RoundPhase),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    SettingUp,
    InterruptingFight,
    Resolving,
    Looting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalIdle {
    Waiting,
    Leaving,
    Camping,
}

impl Phase {
    pub const IDLE_AT_LOCATION: Self = Self::Searching(SearchPhase::Idle(LocalIdle::Waiting));

    #[must_use]
    pub const fn searching(phase: SearchPhase) -> Self {
        Self::Searching(phase)
    }

    #[must_use]
    pub const fn assigning(phase: AssignPhase) -> Self {
        Self::Searching(SearchPhase::Assigning(phase))
    }

    #[must_use]
    pub const fn resolving(phase: ResolvePhase) -> Self {
        Self::Searching(SearchPhase::Resolving(phase))
    }

    #[must_use]
    pub const fn fighting(phase: FightPhase) -> Self {
        Self::Searching(SearchPhase::Fighting(phase))
    }

    #[must_use]
    pub const fn round(phase: RoundPhase) -> Self {
        Self::Searching(SearchPhase::Fighting(FightPhase::Rolling(phase)))
    }

    #[must_use]
    pub const fn local_idle(phase: LocalIdle) -> Self {
        Self::Searching(SearchPhase::Idle(phase))
    }

    #[must_use]
    pub const fn is_game_over(self) -> bool {
        matches!(self, Self::GameOver)
    }

    #[must_use]
    pub const fn is_fighting(self) -> bool {
        matches!(self, Self::Searching(SearchPhase::Fighting(_)))
    }

    /// Dot-separated path such as `searching.fighting.rolling.looting`.
    #[must_use]
    pub fn path(self) -> String {
        self.segments().join(".")
    }

    fn segments(self) -> Vec<&'static str> {
        match self {
            Self::Idle => vec!["idle"],
            Self::Unconscious => vec!["unconscious"],
            Self::GameOver => vec!["gameOver"],
            Self::Activating => vec!["activating"],
            Self::Linking => vec!["linking"],
            Self::Final => vec!["final"],
            Self::Searching(search) => {
                let mut parts = vec!["searching"];
                parts.extend(search.segments());
                parts
            }
        }
    }
}

impl SearchPhase {
    fn segments(self) -> Vec<&'static str> {
        match self {
            Self::SettingUp => vec!["settingUp"],
            Self::InterruptingSetup => vec!["interruptingSetup"],
            Self::Assigning(inner) => vec!["assigning", inner.segment()],
            Self::Resolving(inner) => vec!["resolving", inner.segment()],
            Self::Fighting(FightPhase::SettingUp) => vec!["fighting", "settingUp"],
            Self::Fighting(FightPhase::InterruptingSetup) => {
                vec!["fighting", "interruptingSetup"]
            }
            Self::Fighting(FightPhase::Rolling(round)) => {
                vec!["fighting", "rolling", round.segment()]
            }
            Self::Idle(inner) => vec!["idle", inner.segment()],
        }
    }
}

impl AssignPhase {
    const fn segment(self) -> &'static str {
        match self {
            Self::Rolling => "rolling",
            Self::Waiting => "waiting",
            Self::Processing => "processing",
        }
    }
}

impl ResolvePhase {
    const fn segment(self) -> &'static str {
        match self {
            Self::SettingUp => "settingUp",
            Self::Interrupting => "interrupting",
            Self::Deciding => "deciding",
            Self::GrantingArtifact => "grantingArtifact",
            Self::GrantingComponent => "grantingComponent",
        }
    }
}

impl RoundPhase {
    const fn segment(self) -> &'static str {
        match self {
            Self::SettingUp => "settingUp",
            Self::InterruptingFight => "interruptingFight",
            Self::Resolving => "resolving",
            Self::Looting => "looting",
        }
    }
}

impl LocalIdle {
    const fn segment(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Leaving => "leaving",
            Self::Camping => "camping",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
