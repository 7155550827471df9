//! Decoded replay document
//!
//! The shape the external decoder emits: match metadata, teams, players with
//! their command streams, and chat. Every field defaults when missing so
//! partially-filled documents still load.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::command::Command;
use crate::core::error::Result;
use crate::core::types::Timestamp;

/// Faction text used when a player's faction is unknown
pub const UNKNOWN_FACTION: &str = "Unknown Faction";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayData {
    pub success: bool,
    pub error_message: Option<String>,

    // Match information
    pub map_name: String,
    pub map_filename: String,
    pub duration_seconds: u32,
    pub duration_ticks: u32,
    pub game_version: Option<u16>,
    pub timestamp: Option<String>,
    pub game_type: Option<String>,
    pub matchhistory_id: Option<String>,

    pub teams: Vec<Team>,
    pub winning_team: Option<u32>,
    pub players: Vec<Player>,
    pub messages: Vec<GameMessage>,
}

impl ReplayData {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn player(&self, player_id: u32) -> Option<&Player> {
        self.players.iter().find(|p| p.player_id == player_id)
    }

    /// Match length as `mm:ss`
    pub fn duration(&self) -> String {
        crate::core::types::format_timestamp(self.duration_seconds.saturating_mul(1000))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Team {
    pub team_id: u32,
    pub players: Vec<PlayerInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerInfo {
    pub player_id: u32,
    pub player_name: String,
    pub team_id: u32,
    pub faction: Option<String>,
    pub is_human: bool,
    pub steam_id: Option<String>,
    pub profile_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Player {
    pub player_id: u32,
    pub player_name: String,
    pub team_id: u32,
    pub faction: Option<String>,
    pub is_human: bool,
    pub steam_id: Option<String>,
    pub profile_id: Option<String>,
    pub battlegroup_id: Option<String>,
    /// Full command stream in arrival order
    pub commands: Vec<Command>,
    /// Filtered build-order view of `commands`
    pub build_commands: Vec<Command>,
    pub chat_messages: Vec<GameMessage>,
}

impl Player {
    /// Faction for display, `"Unknown Faction"` when missing or blank
    pub fn faction_or_unknown(&self) -> &str {
        self.faction
            .as_deref()
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(UNKNOWN_FACTION)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameMessage {
    pub timestamp: Timestamp,
    pub player_id: Option<u32>,
    pub content: String,
    pub message_type: String,
}
