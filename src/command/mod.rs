//! Decoded commands and their classification
//!
//! `Command` is one record of a player's decoded command stream. `kind`
//! classifies it against the static taxonomy, `filter` selects which kinds
//! make it into a build order.

pub mod filter;
pub mod kind;

pub use filter::{CommandFilter, CustomPreset, FilterError, FilterPreset, FilterSpec};
pub use kind::{definition_of, CommandCategory, CommandDefinition, CommandKind};

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityIndex, Pbgid, Timestamp};

/// One decoded player action, plus the names enrichment attaches to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub timestamp: Timestamp,
    #[serde(rename = "command_type", alias = "command_kind")]
    pub kind: CommandKind,
    /// Decoder debug text, carried through untouched
    #[serde(default)]
    pub details: String,
    #[serde(
        rename = "pbgid",
        alias = "numeric_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub numeric_id: Option<String>,
    #[serde(
        rename = "index",
        alias = "entity_index",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub entity_index: Option<EntityIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_name: Option<String>,
}

impl Command {
    pub fn new(timestamp: Timestamp, kind: CommandKind) -> Self {
        Self {
            timestamp,
            kind,
            details: String::new(),
            numeric_id: None,
            entity_index: None,
            unit_name: None,
            building_name: None,
        }
    }

    pub fn with_numeric_id(mut self, id: impl Into<String>) -> Self {
        self.numeric_id = Some(id.into());
        self
    }

    pub fn with_index(mut self, index: impl Into<EntityIndex>) -> Self {
        self.entity_index = Some(index.into());
        self
    }

    /// The identifier as a PBGID; `None` when absent or malformed
    pub fn pbgid(&self) -> Option<Pbgid> {
        self.numeric_id.as_deref().and_then(Pbgid::parse)
    }

    pub fn definition(&self) -> &'static CommandDefinition {
        self.kind.definition()
    }

    /// Set the unit name unless one is already present. Returns whether the
    /// name was written.
    pub fn set_unit_name(&mut self, name: impl Into<String>) -> bool {
        write_once(&mut self.unit_name, name.into())
    }

    /// Set the building name unless one is already present. Returns whether
    /// the name was written.
    pub fn set_building_name(&mut self, name: impl Into<String>) -> bool {
        write_once(&mut self.building_name, name.into())
    }

    /// The name a front end should show for this command, if any
    pub fn display_name(&self) -> Option<&str> {
        self.unit_name
            .as_deref()
            .or(self.building_name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

fn write_once(slot: &mut Option<String>, value: String) -> bool {
    if value.is_empty() || slot.as_deref().is_some_and(|existing| !existing.is_empty()) {
        return false;
    }
    *slot = Some(value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_json_shape() {
        let json = r#"{
            "timestamp": 64000,
            "command_type": "construct_entity",
            "details": "PCMD_PlaceAndConstructEntities",
            "pbgid": "198236",
            "index": "7"
        }"#;
        let cmd: Command = serde_json::from_str(json).unwrap();
        assert_eq!(cmd.kind, CommandKind::ConstructEntity);
        assert_eq!(cmd.pbgid(), Some(Pbgid(198236)));
        assert_eq!(cmd.entity_index.as_deref(), Some("7"));
        assert!(cmd.unit_name.is_none());

        let out = serde_json::to_value(&cmd).unwrap();
        assert_eq!(out["command_type"], "construct_entity");
        assert_eq!(out["index"], "7");
        assert!(out.get("unit_name").is_none());
    }

    #[test]
    fn test_field_aliases() {
        let json = r#"{"timestamp": 5, "command_kind": "build_squad", "numeric_id": "1", "entity_index": "2"}"#;
        let cmd: Command = serde_json::from_str(json).unwrap();
        assert_eq!(cmd.kind, CommandKind::BuildSquad);
        assert_eq!(cmd.numeric_id.as_deref(), Some("1"));
        assert_eq!(cmd.entity_index.as_deref(), Some("2"));
    }

    #[test]
    fn test_malformed_id_is_absent() {
        let cmd = Command::new(0, CommandKind::BuildSquad).with_numeric_id("squad-12");
        assert_eq!(cmd.pbgid(), None);
    }

    #[test]
    fn test_names_are_write_once() {
        let mut cmd = Command::new(0, CommandKind::BuildSquad);
        assert!(cmd.set_unit_name("Grenadier Squad"));
        assert!(!cmd.set_unit_name("Pioneer Squad"));
        assert_eq!(cmd.unit_name.as_deref(), Some("Grenadier Squad"));

        assert!(!cmd.set_building_name(""));
        assert!(cmd.building_name.is_none());

        let mut blank = Command::new(0, CommandKind::ConstructEntity);
        blank.building_name = Some(String::new());
        assert!(blank.set_building_name("Mechanized Kompanie"));
        assert_eq!(blank.display_name(), Some("Mechanized Kompanie"));
    }
}
