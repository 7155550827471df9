//! Command kind taxonomy
//!
//! Single source of truth for what each decoded command kind means: its
//! category and whether it builds something, is a combat action, or touches
//! the economy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of a decoded command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    BuildSquad,
    ConstructEntity,
    BuildGlobalUpgrade,
    UseAbility,
    UseBattlegroupAbility,
    SelectBattlegroup,
    SelectBattlegroupAbility,
    CancelConstruction,
    CancelProduction,
    AiTakeover,
    #[serde(other)]
    Unknown,
}

/// Logical grouping of command kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandCategory {
    Build,
    Combat,
    Control,
    Cancel,
    Other,
}

/// Static properties of one command kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandDefinition {
    pub kind: CommandKind,
    pub category: CommandCategory,
    pub description: &'static str,
    /// Creates or unlocks something
    pub is_buildable: bool,
    pub is_combat: bool,
    /// Spends or refunds resources
    pub is_economic: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown command kind '{0}'")]
pub struct ParseKindError(pub String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown command category '{0}'")]
pub struct ParseCategoryError(pub String);

const fn def(
    kind: CommandKind,
    category: CommandCategory,
    description: &'static str,
    is_buildable: bool,
    is_combat: bool,
    is_economic: bool,
) -> CommandDefinition {
    CommandDefinition {
        kind,
        category,
        description,
        is_buildable,
        is_combat,
        is_economic,
    }
}

use CommandCategory as Cat;
use CommandKind as K;

/// Definitions in `CommandKind::ALL` order
static DEFINITIONS: [CommandDefinition; CommandKind::COUNT] = [
    def(K::BuildSquad, Cat::Build, "Build a squad/unit", true, false, true),
    def(K::ConstructEntity, Cat::Build, "Construct a building", true, false, true),
    def(K::BuildGlobalUpgrade, Cat::Build, "Research a technology upgrade", true, false, true),
    def(K::UseAbility, Cat::Combat, "Use a unit ability", false, true, false),
    def(K::UseBattlegroupAbility, Cat::Combat, "Use a battlegroup ability", false, true, false),
    def(K::SelectBattlegroup, Cat::Build, "Select a battlegroup", true, false, true),
    def(K::SelectBattlegroupAbility, Cat::Build, "Select a battlegroup ability", true, false, true),
    def(K::CancelConstruction, Cat::Cancel, "Cancel building construction", false, false, true),
    def(K::CancelProduction, Cat::Cancel, "Cancel unit production", false, false, true),
    def(K::AiTakeover, Cat::Control, "AI takes control of player", false, false, false),
    def(K::Unknown, Cat::Other, "Unknown command type", false, false, false),
];

impl CommandKind {
    pub const COUNT: usize = 11;

    pub const ALL: [CommandKind; CommandKind::COUNT] = [
        K::BuildSquad,
        K::ConstructEntity,
        K::BuildGlobalUpgrade,
        K::UseAbility,
        K::UseBattlegroupAbility,
        K::SelectBattlegroup,
        K::SelectBattlegroupAbility,
        K::CancelConstruction,
        K::CancelProduction,
        K::AiTakeover,
        K::Unknown,
    ];

    /// Position in `ALL`, also the slot in a filter mask
    pub fn index(&self) -> usize {
        match self {
            K::BuildSquad => 0,
            K::ConstructEntity => 1,
            K::BuildGlobalUpgrade => 2,
            K::UseAbility => 3,
            K::UseBattlegroupAbility => 4,
            K::SelectBattlegroup => 5,
            K::SelectBattlegroupAbility => 6,
            K::CancelConstruction => 7,
            K::CancelProduction => 8,
            K::AiTakeover => 9,
            K::Unknown => 10,
        }
    }

    /// Wire name used by the decoder
    pub fn as_str(&self) -> &'static str {
        match self {
            K::BuildSquad => "build_squad",
            K::ConstructEntity => "construct_entity",
            K::BuildGlobalUpgrade => "build_global_upgrade",
            K::UseAbility => "use_ability",
            K::UseBattlegroupAbility => "use_battlegroup_ability",
            K::SelectBattlegroup => "select_battlegroup",
            K::SelectBattlegroupAbility => "select_battlegroup_ability",
            K::CancelConstruction => "cancel_construction",
            K::CancelProduction => "cancel_production",
            K::AiTakeover => "ai_takeover",
            K::Unknown => "unknown",
        }
    }

    /// Map any decoder string to a kind; unrecognized names become `Unknown`
    pub fn from_name_lossy(name: &str) -> Self {
        name.parse().unwrap_or(K::Unknown)
    }

    pub fn definition(&self) -> &'static CommandDefinition {
        &DEFINITIONS[self.index()]
    }

    pub fn category(&self) -> CommandCategory {
        self.definition().category
    }

    /// Generic name shown for build-relevant commands that carry no
    /// identifier to resolve
    pub fn placeholder_name(&self) -> Option<&'static str> {
        match self {
            K::ConstructEntity => Some("Building"),
            K::BuildGlobalUpgrade => Some("Global Upgrade"),
            K::SelectBattlegroup => Some("Battlegroup Selection"),
            K::SelectBattlegroupAbility => Some("Battlegroup Ability Selection"),
            _ => None,
        }
    }
}

/// Taxonomy lookup; total over every kind
pub fn definition_of(kind: CommandKind) -> &'static CommandDefinition {
    kind.definition()
}

/// All definitions in declaration order
pub fn definitions() -> &'static [CommandDefinition] {
    &DEFINITIONS
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        CommandKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}

impl CommandCategory {
    pub const ALL: [CommandCategory; 5] = [
        Cat::Build,
        Cat::Combat,
        Cat::Control,
        Cat::Cancel,
        Cat::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Cat::Build => "build",
            Cat::Combat => "combat",
            Cat::Control => "control",
            Cat::Cancel => "cancel",
            Cat::Other => "other",
        }
    }

    /// Kinds belonging to this category, in `CommandKind::ALL` order
    pub fn kinds(&self) -> Vec<CommandKind> {
        DEFINITIONS
            .iter()
            .filter(|d| d.category == *self)
            .map(|d| d.kind)
            .collect()
    }
}

impl fmt::Display for CommandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        CommandCategory::ALL
            .into_iter()
            .find(|cat| cat.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}
