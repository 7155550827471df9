//! Enrichment pipeline
//!
//! Attaches display names to a player's decoded commands in two passes: first
//! an entity-index correlation table is built over the whole stream, then
//! every command is resolved by its kind. Commands are never dropped or
//! reordered, and names already present are left alone.

use ahash::AHashMap;
use derive_more::AddAssign;
use rayon::prelude::*;
use std::path::Path;

use super::replay::{Player, ReplayData, UNKNOWN_FACTION};
use crate::blueprints::{BlueprintResolver, DatabaseCache};
use crate::command::{Command, CommandFilter, CommandKind};
use crate::core::config::EnrichConfig;
use crate::core::error::Result;
use crate::core::types::{EntityIndex, Pbgid};
use crate::entity::EntityTracker;

/// What one enrichment pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, AddAssign)]
pub struct EnrichReport {
    /// Unit name slots filled from the blueprint databases or static tables
    pub units_resolved: usize,
    /// Building names resolved from an id (own or correlated)
    pub buildings_resolved: usize,
    /// Building names taken from tracker inference
    pub buildings_inferred: usize,
    /// Building names made up from faction and index
    pub fallback_names: usize,
    /// Category placeholders for commands without an id
    pub placeholders: usize,
    /// Commands with an id that nothing resolved
    pub misses: usize,
}

/// Map each entity index to the last numeric id seen alongside it
pub fn build_index_correlation(commands: &[Command]) -> AHashMap<EntityIndex, String> {
    let mut correlation = AHashMap::new();
    for cmd in commands {
        if let (Some(index), Some(id)) = (&cmd.entity_index, &cmd.numeric_id) {
            correlation.insert(index.clone(), id.clone());
        }
    }
    correlation
}

/// Positional name for a construction nothing else could identify
pub fn fallback_building_name(faction: &str, index: Option<&str>) -> String {
    match index {
        Some(index) => format!("{} Building (Structure #{})", faction, index),
        None => format!("{} Building", faction),
    }
}

/// Enrichment for one run. Holds a resolver over shared reference data;
/// per-stream state (correlation table, tracker) is created inside each call.
#[derive(Debug, Clone)]
pub struct EnrichmentPipeline {
    resolver: Option<BlueprintResolver>,
    config: EnrichConfig,
    filter: CommandFilter,
}

impl EnrichmentPipeline {
    /// A pipeline without a resolver passes commands through unenriched.
    /// Fails only on an invalid config.
    pub fn new(resolver: Option<BlueprintResolver>, config: EnrichConfig) -> Result<Self> {
        config.validate()?;
        let filter = config.filter.build()?;
        Ok(Self {
            resolver,
            config,
            filter,
        })
    }

    /// Load reference data from `data_dir`. A load failure is logged and
    /// yields a passthrough pipeline rather than an error.
    pub fn load(data_dir: &Path, config: EnrichConfig) -> Result<Self> {
        let resolver = match BlueprintResolver::load(data_dir, &config.locale) {
            Ok(resolver) => Some(resolver),
            Err(e) => {
                tracing::warn!("Enrichment disabled, reference data unavailable: {}", e);
                None
            }
        };
        Self::new(resolver, config)
    }

    /// Like `load`, but reuses databases already held by `cache`
    pub fn from_cache(
        cache: &DatabaseCache,
        data_dir: &Path,
        config: EnrichConfig,
    ) -> Result<Self> {
        let resolver = match cache.resolver(data_dir, &config.locale) {
            Ok(resolver) => Some(resolver),
            Err(e) => {
                tracing::warn!("Enrichment disabled, reference data unavailable: {}", e);
                None
            }
        };
        Self::new(resolver, config)
    }

    pub fn is_passthrough(&self) -> bool {
        self.resolver.is_none()
    }

    pub fn resolver(&self) -> Option<&BlueprintResolver> {
        self.resolver.as_ref()
    }

    pub fn config(&self) -> &EnrichConfig {
        &self.config
    }

    pub fn filter(&self) -> &CommandFilter {
        &self.filter
    }

    /// Enrich one player's full command stream in place
    pub fn enrich_commands(&self, commands: &mut [Command], faction: Option<&str>) -> EnrichReport {
        let mut report = EnrichReport::default();
        let Some(resolver) = &self.resolver else {
            return report;
        };
        let faction = faction
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .unwrap_or(UNKNOWN_FACTION);

        let correlation = build_index_correlation(commands);
        let tracker = self.config.entity_tracking.then(|| {
            let mut tracker = EntityTracker::from_config(faction, &self.config);
            tracker.track_all(commands.iter());
            tracker.finalize_tracking();
            tracker
        });

        for cmd in commands.iter_mut() {
            match cmd.kind {
                CommandKind::BuildSquad | CommandKind::UseAbility => {
                    let name = cmd
                        .pbgid()
                        .and_then(|id| resolver.friendly_name(id))
                        .map(str::to_string);
                    record_unit(cmd, name, &mut report);
                }
                CommandKind::SelectBattlegroup => {
                    let name = cmd.pbgid().and_then(|id| resolver.battlegroup_name(id));
                    record_unit(cmd, name.map(str::to_string), &mut report);
                }
                CommandKind::BuildGlobalUpgrade => {
                    let name = cmd.pbgid().and_then(|id| resolver.upgrade_name(id));
                    record_unit(cmd, name.map(str::to_string), &mut report);
                }
                CommandKind::ConstructEntity => {
                    name_construction(
                        cmd,
                        resolver,
                        &correlation,
                        tracker.as_ref(),
                        faction,
                        &mut report,
                    );
                }
                _ => {}
            }

            if cmd.numeric_id.is_none() {
                if let Some(placeholder) = cmd.kind.placeholder_name() {
                    let written = if cmd.kind == CommandKind::ConstructEntity {
                        cmd.set_building_name(placeholder)
                    } else {
                        cmd.set_unit_name(placeholder)
                    };
                    if written {
                        report.placeholders += 1;
                    }
                }
            }
        }

        report
    }

    /// Enrich a player's commands and rebuild its filtered build-order view
    pub fn enrich_player(&self, player: &mut Player) -> EnrichReport {
        let faction = player.faction.clone();
        let report = self.enrich_commands(&mut player.commands, faction.as_deref());
        player.build_commands = self.filter.apply(&player.commands);
        tracing::debug!(
            "Player {} ({}): {:?}, {} of {} commands in build order",
            player.player_id,
            player.faction_or_unknown(),
            report,
            player.build_commands.len(),
            player.commands.len()
        );
        report
    }

    /// Enrich every player of a replay. Players are independent streams and
    /// run in parallel over the same read-only reference data.
    pub fn enrich_replay(&self, replay: &mut ReplayData) -> EnrichReport {
        if self.is_passthrough() {
            tracing::warn!("Passing replay through without enrichment");
        }
        replay
            .players
            .par_iter_mut()
            .map(|player| self.enrich_player(player))
            .reduce(EnrichReport::default, |mut total, report| {
                total += report;
                total
            })
    }
}

fn record_unit(cmd: &mut Command, name: Option<String>, report: &mut EnrichReport) {
    match name {
        Some(name) => {
            if cmd.set_unit_name(name) {
                report.units_resolved += 1;
            }
        }
        None if cmd.numeric_id.is_some() => report.misses += 1,
        None => {}
    }
}

fn name_construction(
    cmd: &mut Command,
    resolver: &BlueprintResolver,
    correlation: &AHashMap<EntityIndex, String>,
    tracker: Option<&EntityTracker>,
    faction: &str,
    report: &mut EnrichReport,
) {
    let resolve = |id: Option<Pbgid>| {
        id.and_then(|id| resolver.resolve(id))
            .map(|info| info.name.clone())
    };

    // own id, then whatever id the same index carried elsewhere
    let resolved = resolve(cmd.pbgid()).or_else(|| {
        let correlated = cmd
            .entity_index
            .as_ref()
            .and_then(|index| correlation.get(index))
            .and_then(|id| Pbgid::parse(id));
        resolve(correlated)
    });
    if let Some(name) = resolved {
        if cmd.set_building_name(name) {
            report.buildings_resolved += 1;
        }
        return;
    }
    if cmd.numeric_id.is_some() {
        report.misses += 1;
    }

    let inferred = tracker
        .zip(cmd.entity_index.as_deref())
        .and_then(|(tracker, index)| tracker.inferred_building(index))
        .map(|inferred| inferred.name());
    if let Some(name) = inferred {
        if cmd.set_building_name(name) {
            report.buildings_inferred += 1;
        }
        return;
    }

    let fallback = fallback_building_name(faction, cmd.entity_index.as_deref());
    if cmd.set_building_name(fallback) {
        report.fallback_names += 1;
    }
}
