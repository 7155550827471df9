//! Replay enrichment
//!
//! `replay` is the decoded replay document; `pipeline` fills in unit and
//! building names and rebuilds each player's build-order view.

pub mod pipeline;
pub mod replay;

pub use pipeline::{build_index_correlation, fallback_building_name, EnrichReport, EnrichmentPipeline};
pub use replay::{GameMessage, Player, PlayerInfo, ReplayData, Team, UNKNOWN_FACTION};
