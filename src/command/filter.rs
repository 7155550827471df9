//! Command filtering
//!
//! A `CommandFilter` is an immutable inclusion mask with one slot per
//! `CommandKind`. Filters are built from presets, explicit kinds, categories
//! or predicates over the taxonomy and combine by union.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::kind::{definitions, CommandCategory, CommandDefinition, CommandKind};
use super::Command;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown filter preset '{0}'")]
    UnknownPreset(String),

    #[error("unknown command kind '{0}'")]
    UnknownKind(String),

    #[error("unknown command category '{0}'")]
    UnknownCategory(String),

    #[error("preset name '{0}' is already taken")]
    DuplicatePreset(String),

    #[error("custom preset has an empty name")]
    UnnamedPreset,
}

/// Named set of included command kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterPreset {
    /// Units, buildings, upgrades and battlegroup selections
    Build,
    /// Combat abilities
    Combat,
    /// Every kind flagged economic in the taxonomy
    Economic,
    All,
    /// Squad production and upgrades
    ArmyBuilding,
    /// Building placement and its cancellation
    Construction,
    /// Battlegroup selections and abilities
    Battlegroup,
    /// Anything combat or economic
    CombatAndEconomic,
}

impl FilterPreset {
    pub const ALL: [FilterPreset; 8] = [
        FilterPreset::Build,
        FilterPreset::Combat,
        FilterPreset::Economic,
        FilterPreset::All,
        FilterPreset::ArmyBuilding,
        FilterPreset::Construction,
        FilterPreset::Battlegroup,
        FilterPreset::CombatAndEconomic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FilterPreset::Build => "build",
            FilterPreset::Combat => "combat",
            FilterPreset::Economic => "economic",
            FilterPreset::All => "all",
            FilterPreset::ArmyBuilding => "army_building",
            FilterPreset::Construction => "construction",
            FilterPreset::Battlegroup => "battlegroup",
            FilterPreset::CombatAndEconomic => "combat_and_economic",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FilterPreset::Build => "Units, buildings, upgrades, and battlegroup selections",
            FilterPreset::Combat => "Combat abilities and tactical actions",
            FilterPreset::Economic => "All economy-affecting commands",
            FilterPreset::All => "All command types",
            FilterPreset::ArmyBuilding => "Squad building and upgrades only",
            FilterPreset::Construction => "All construction activities",
            FilterPreset::Battlegroup => "Battlegroup selections and abilities",
            FilterPreset::CombatAndEconomic => "Commands that affect combat or economy",
        }
    }

    /// Kinds included by this preset
    pub fn kinds(&self) -> Vec<CommandKind> {
        use CommandKind as K;
        match self {
            FilterPreset::Build => vec![
                K::BuildSquad,
                K::ConstructEntity,
                K::BuildGlobalUpgrade,
                K::SelectBattlegroup,
                K::SelectBattlegroupAbility,
            ],
            FilterPreset::Combat => vec![K::UseAbility, K::UseBattlegroupAbility],
            FilterPreset::Economic => kinds_matching(|d| d.is_economic),
            FilterPreset::All => CommandKind::ALL.to_vec(),
            FilterPreset::ArmyBuilding => vec![K::BuildSquad, K::BuildGlobalUpgrade],
            FilterPreset::Construction => vec![K::ConstructEntity, K::CancelConstruction],
            FilterPreset::Battlegroup => vec![
                K::SelectBattlegroup,
                K::SelectBattlegroupAbility,
                K::UseBattlegroupAbility,
            ],
            FilterPreset::CombatAndEconomic => kinds_matching(|d| d.is_combat || d.is_economic),
        }
    }
}

impl fmt::Display for FilterPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterPreset {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        FilterPreset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(needle))
            .ok_or_else(|| FilterError::UnknownPreset(s.to_string()))
    }
}

fn kinds_matching(predicate: impl Fn(&CommandDefinition) -> bool) -> Vec<CommandKind> {
    definitions()
        .iter()
        .filter(|d| predicate(d))
        .map(|d| d.kind)
        .collect()
}

/// Inclusion mask over command kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommandFilter {
    mask: [bool; CommandKind::COUNT],
}

impl CommandFilter {
    /// Filter that includes nothing
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_preset(preset: FilterPreset) -> Self {
        Self::from_kinds(&preset.kinds())
    }

    pub fn from_kinds(kinds: &[CommandKind]) -> Self {
        let mut mask = [false; CommandKind::COUNT];
        for kind in kinds {
            mask[kind.index()] = true;
        }
        Self { mask }
    }

    pub fn from_category(category: CommandCategory) -> Self {
        Self::from_kinds(&category.kinds())
    }

    pub fn from_predicate(predicate: impl Fn(&CommandDefinition) -> bool) -> Self {
        Self::from_kinds(&kinds_matching(predicate))
    }

    /// Kinds included by either filter
    pub fn union(self, other: CommandFilter) -> Self {
        let mut mask = self.mask;
        for (slot, included) in mask.iter_mut().zip(other.mask) {
            *slot |= included;
        }
        Self { mask }
    }

    pub fn with_preset(self, preset: FilterPreset) -> Self {
        self.union(Self::from_preset(preset))
    }

    pub fn with_kinds(self, kinds: &[CommandKind]) -> Self {
        self.union(Self::from_kinds(kinds))
    }

    pub fn with_category(self, category: CommandCategory) -> Self {
        self.union(Self::from_category(category))
    }

    pub fn with_predicate(self, predicate: impl Fn(&CommandDefinition) -> bool) -> Self {
        self.union(Self::from_predicate(predicate))
    }

    pub fn includes(&self, kind: CommandKind) -> bool {
        self.mask[kind.index()]
    }

    /// Included kinds in `CommandKind::ALL` order
    pub fn included_kinds(&self) -> Vec<CommandKind> {
        CommandKind::ALL
            .into_iter()
            .filter(|kind| self.includes(*kind))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.iter().all(|included| !included)
    }

    /// True when every kind included here is also included by `other`
    pub fn is_subset_of(&self, other: &CommandFilter) -> bool {
        self.mask
            .iter()
            .zip(other.mask.iter())
            .all(|(mine, theirs)| !mine || *theirs)
    }

    /// Copy out the commands this filter includes, preserving order
    pub fn apply(&self, commands: &[Command]) -> Vec<Command> {
        commands
            .iter()
            .filter(|cmd| self.includes(cmd.kind))
            .cloned()
            .collect()
    }
}

/// User-defined preset: a named set of command kinds
///
/// Kind names are checked when the owning `FilterSpec` is built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomPreset {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kinds: Vec<String>,
}

impl CustomPreset {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kinds: &[CommandKind]) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kinds: kinds.iter().map(|kind| kind.as_str().to_string()).collect(),
        }
    }

    pub fn filter(&self) -> Result<CommandFilter, FilterError> {
        let kinds = self
            .kinds
            .iter()
            .map(|name| parse_kind(name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CommandFilter::from_kinds(&kinds))
    }
}

fn parse_kind(name: &str) -> Result<CommandKind, FilterError> {
    name.parse()
        .map_err(|_| FilterError::UnknownKind(name.to_string()))
}

/// Filter specification as it appears in configuration files
///
/// Names are validated by `build`; an empty spec means the build preset.
/// Custom presets only define names. They add kinds once listed in `presets`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSpec {
    pub presets: Vec<String>,
    pub kinds: Vec<String>,
    pub categories: Vec<String>,
    pub custom: Vec<CustomPreset>,
}

impl FilterSpec {
    pub fn is_unspecified(&self) -> bool {
        self.presets.is_empty() && self.kinds.is_empty() && self.categories.is_empty()
    }

    /// Resolve the named presets, kinds and categories into one filter
    pub fn build(&self) -> Result<CommandFilter, FilterError> {
        let custom = self.custom_filters()?;
        if self.is_unspecified() {
            return Ok(CommandFilter::from_preset(FilterPreset::Build));
        }

        let mut filter = CommandFilter::empty();
        for name in &self.presets {
            let needle = name.trim();
            filter = match custom.iter().find(|(n, _)| n.eq_ignore_ascii_case(needle)) {
                Some((_, preset)) => filter.union(*preset),
                None => filter.with_preset(name.parse()?),
            };
        }
        for name in &self.kinds {
            filter = filter.with_kinds(&[parse_kind(name)?]);
        }
        for name in &self.categories {
            let category: CommandCategory = name
                .parse()
                .map_err(|_| FilterError::UnknownCategory(name.clone()))?;
            filter = filter.with_category(category);
        }
        Ok(filter)
    }

    /// Validate the custom presets; names may not shadow built-ins or repeat
    fn custom_filters(&self) -> Result<Vec<(&str, CommandFilter)>, FilterError> {
        let mut resolved: Vec<(&str, CommandFilter)> = Vec::with_capacity(self.custom.len());
        for preset in &self.custom {
            let name = preset.name.trim();
            if name.is_empty() {
                return Err(FilterError::UnnamedPreset);
            }
            let taken = name.parse::<FilterPreset>().is_ok()
                || resolved.iter().any(|(n, _)| n.eq_ignore_ascii_case(name));
            if taken {
                return Err(FilterError::DuplicatePreset(preset.name.clone()));
            }
            resolved.push((name, preset.filter()?));
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CommandKind as K;

    #[test]
    fn test_build_preset() {
        let filter = CommandFilter::from_preset(FilterPreset::Build);
        assert!(filter.includes(K::BuildSquad));
        assert!(filter.includes(K::ConstructEntity));
        assert!(filter.includes(K::BuildGlobalUpgrade));
        assert!(filter.includes(K::SelectBattlegroup));
        assert!(!filter.includes(K::UseAbility));
        assert!(!filter.includes(K::Unknown));
    }

    #[test]
    fn test_economic_preset_follows_flags() {
        let filter = CommandFilter::from_preset(FilterPreset::Economic);
        for def in definitions() {
            assert_eq!(filter.includes(def.kind), def.is_economic, "{}", def.kind);
        }
    }

    #[test]
    fn test_all_preset() {
        let all = CommandFilter::from_preset(FilterPreset::All);
        assert_eq!(all.included_kinds(), CommandKind::ALL.to_vec());
    }

    #[test]
    fn test_build_is_strict_subset_of_all() {
        let build = CommandFilter::from_kinds(&FilterPreset::Build.kinds());
        let all = CommandFilter::from_preset(FilterPreset::All);
        assert!(build.is_subset_of(&all));
        assert_ne!(build, all);
    }

    #[test]
    fn test_composition_is_additive() {
        let filter = CommandFilter::from_kinds(&[K::BuildSquad])
            .with_category(CommandCategory::Cancel)
            .with_predicate(|d| d.is_combat);
        assert_eq!(
            filter.included_kinds(),
            vec![
                K::BuildSquad,
                K::UseAbility,
                K::UseBattlegroupAbility,
                K::CancelConstruction,
                K::CancelProduction,
            ]
        );
    }

    #[test]
    fn test_empty_filter() {
        let filter = CommandFilter::empty();
        assert!(filter.is_empty());
        assert!(filter.is_subset_of(&CommandFilter::from_kinds(&[K::Unknown])));
        assert!(CommandFilter::from_kinds(&[]).is_empty());
    }

    #[test]
    fn test_apply_preserves_order() {
        let commands = vec![
            Command::new(3000, K::UseAbility),
            Command::new(1000, K::BuildSquad),
            Command::new(2000, K::ConstructEntity),
        ];
        let kept = CommandFilter::from_preset(FilterPreset::Build).apply(&commands);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].timestamp, 1000);
        assert_eq!(kept[1].timestamp, 2000);
    }

    #[test]
    fn test_unspecified_spec_defaults_to_build() {
        let filter = FilterSpec::default().build().unwrap();
        assert_eq!(filter, CommandFilter::from_preset(FilterPreset::Build));
    }

    #[test]
    fn test_spec_union() {
        let spec = FilterSpec {
            presets: vec!["combat".into()],
            kinds: vec!["ai_takeover".into()],
            categories: vec!["cancel".into()],
            ..Default::default()
        };
        let filter = spec.build().unwrap();
        assert_eq!(filter.included_kinds().len(), 5);
        assert!(filter.includes(K::AiTakeover));
        assert!(!filter.includes(K::BuildSquad));
    }

    #[test]
    fn test_spec_rejects_unknown_names() {
        let bad_preset = FilterSpec {
            presets: vec!["everything".into()],
            ..Default::default()
        };
        assert_eq!(
            bad_preset.build(),
            Err(FilterError::UnknownPreset("everything".into()))
        );

        let bad_kind = FilterSpec {
            kinds: vec!["build_tank".into()],
            ..Default::default()
        };
        assert_eq!(bad_kind.build(), Err(FilterError::UnknownKind("build_tank".into())));

        let bad_category = FilterSpec {
            categories: vec!["economy".into()],
            ..Default::default()
        };
        assert_eq!(
            bad_category.build(),
            Err(FilterError::UnknownCategory("economy".into()))
        );
    }

    #[test]
    fn test_custom_preset_by_name() {
        let spec = FilterSpec {
            presets: vec!["Openers".into(), "combat".into()],
            custom: vec![CustomPreset::new(
                "openers",
                "First squads and buildings",
                &[K::BuildSquad, K::ConstructEntity],
            )],
            ..Default::default()
        };
        assert_eq!(
            spec.build().unwrap().included_kinds(),
            vec![K::BuildSquad, K::ConstructEntity, K::UseAbility, K::UseBattlegroupAbility]
        );
    }

    #[test]
    fn test_custom_preset_needs_reference() {
        let spec = FilterSpec {
            custom: vec![CustomPreset::new("abilities", "", &[K::UseAbility])],
            ..Default::default()
        };
        assert_eq!(spec.build(), Ok(CommandFilter::from_preset(FilterPreset::Build)));
    }

    #[test]
    fn test_custom_preset_validation() {
        let bad_kind = FilterSpec {
            custom: vec![CustomPreset {
                name: "tanks".into(),
                description: String::new(),
                kinds: vec!["build_tank".into()],
            }],
            ..Default::default()
        };
        assert_eq!(bad_kind.build(), Err(FilterError::UnknownKind("build_tank".into())));

        let shadows_builtin = FilterSpec {
            custom: vec![CustomPreset::new("Combat", "", &[K::BuildSquad])],
            ..Default::default()
        };
        assert_eq!(
            shadows_builtin.build(),
            Err(FilterError::DuplicatePreset("Combat".into()))
        );

        let repeated = FilterSpec {
            custom: vec![
                CustomPreset::new("mine", "", &[K::BuildSquad]),
                CustomPreset::new("MINE", "", &[K::UseAbility]),
            ],
            ..Default::default()
        };
        assert_eq!(repeated.build(), Err(FilterError::DuplicatePreset("MINE".into())));

        let unnamed = FilterSpec {
            custom: vec![CustomPreset::new(" ", "", &[K::BuildSquad])],
            ..Default::default()
        };
        assert_eq!(unnamed.build(), Err(FilterError::UnnamedPreset));
    }

    #[test]
    fn test_preset_names_parse() {
        for preset in FilterPreset::ALL {
            assert_eq!(preset.name().parse::<FilterPreset>(), Ok(preset));
            assert!(!preset.description().is_empty());
        }
    }
}
