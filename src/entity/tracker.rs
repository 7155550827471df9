//! Entity tracking and building inference
//!
//! The decoder reports constructions by entity index, often without the
//! blueprint id of what was built. The tracker follows every indexed entity
//! through one player's command stream and infers a building's type from the
//! units produced by it, or by the player's other entities shortly after it
//! was placed.
//!
//! Per entity the state only moves forward:
//! `Tracked -> BuildingConfirmed -> BuildingInferred`. Once an inference is
//! made it is never recomputed.

use ahash::AHashMap;

use super::production::{building_for_unit, BuildingType};
use crate::command::{Command, CommandKind};
use crate::core::config::{EnrichConfig, DEFAULT_CORRELATION_WINDOW_MS};
use crate::core::types::{EntityIndex, Pbgid, Timestamp};

/// One command as recorded in an entity's history
#[derive(Debug, Clone, PartialEq)]
pub struct EntityCommand {
    pub timestamp: Timestamp,
    pub kind: CommandKind,
    pub numeric_id: Option<String>,
    pub details: String,
}

impl EntityCommand {
    pub fn pbgid(&self) -> Option<Pbgid> {
        self.numeric_id.as_deref().and_then(Pbgid::parse)
    }
}

impl From<&Command> for EntityCommand {
    fn from(cmd: &Command) -> Self {
        Self {
            timestamp: cmd.timestamp,
            kind: cmd.kind,
            numeric_id: cmd.numeric_id.clone(),
            details: cmd.details.clone(),
        }
    }
}

/// How an inference was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evidence {
    /// A unit was produced from the entity itself
    Direct,
    /// Another tracked entity produced a unit inside the correlation window
    Correlated,
}

/// Result of building inference for one entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferredBuilding {
    pub building: BuildingType,
    /// Unit whose production gave it away
    pub unit: Pbgid,
    pub evidence: Evidence,
}

impl InferredBuilding {
    pub fn id(&self) -> String {
        self.building.id()
    }

    pub fn name(&self) -> String {
        self.building.name()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Tracked,
    BuildingConfirmed,
    BuildingInferred,
}

/// A single indexed entity and its activity
#[derive(Debug, Clone)]
pub struct TrackedEntity {
    pub index: EntityIndex,
    pub first_seen: Timestamp,
    pub last_seen: Timestamp,
    pub history: Vec<EntityCommand>,
    /// Time of the first `construct_entity` for this index
    pub construction_time: Option<Timestamp>,
    pub inferred: Option<InferredBuilding>,
}

impl TrackedEntity {
    fn new(index: EntityIndex, timestamp: Timestamp) -> Self {
        Self {
            index,
            first_seen: timestamp,
            last_seen: timestamp,
            history: Vec::new(),
            construction_time: None,
            inferred: None,
        }
    }

    pub fn state(&self) -> EntityState {
        if self.inferred.is_some() {
            EntityState::BuildingInferred
        } else if self.construction_time.is_some() {
            EntityState::BuildingConfirmed
        } else {
            EntityState::Tracked
        }
    }

    pub fn is_building(&self) -> bool {
        self.construction_time.is_some()
    }

    pub fn inferred_building_name(&self) -> Option<String> {
        self.inferred.map(|inferred| inferred.name())
    }
}

/// A `build_squad` from some tracked entity's history
#[derive(Debug, Clone, Copy)]
struct ProductionRecord {
    timestamp: Timestamp,
    unit: Pbgid,
}

/// Tracks the entities of one player's command stream.
///
/// A tracker carries per-stream state and is built fresh for every stream;
/// it is never shared between players or runs.
#[derive(Debug, Clone)]
pub struct EntityTracker {
    faction: String,
    correlation_window_ms: Timestamp,
    /// Entities in first-seen order
    entities: Vec<TrackedEntity>,
    by_index: AHashMap<EntityIndex, usize>,
    /// `build_squad` entries of all entity histories, in arrival order
    production: Vec<ProductionRecord>,
}

impl EntityTracker {
    pub fn new(faction: impl Into<String>) -> Self {
        Self {
            faction: faction.into(),
            correlation_window_ms: DEFAULT_CORRELATION_WINDOW_MS,
            entities: Vec::new(),
            by_index: AHashMap::new(),
            production: Vec::new(),
        }
    }

    pub fn from_config(faction: impl Into<String>, config: &EnrichConfig) -> Self {
        Self::new(faction).with_correlation_window(config.correlation_window_ms)
    }

    pub fn with_correlation_window(mut self, window_ms: Timestamp) -> Self {
        self.correlation_window_ms = window_ms;
        self
    }

    pub fn faction(&self) -> &str {
        &self.faction
    }

    pub fn correlation_window_ms(&self) -> Timestamp {
        self.correlation_window_ms
    }

    /// Feed one command, in stream order
    pub fn track(&mut self, cmd: &Command) {
        // Commands without an index belong to no entity and are not evidence
        let Some(index) = cmd.entity_index.as_ref() else {
            return;
        };

        if cmd.kind == CommandKind::BuildSquad {
            if let Some(unit) = cmd.pbgid() {
                self.production.push(ProductionRecord {
                    timestamp: cmd.timestamp,
                    unit,
                });
            }
        }

        let pos = match self.by_index.get(index) {
            Some(&pos) => pos,
            None => {
                let pos = self.entities.len();
                self.entities
                    .push(TrackedEntity::new(index.clone(), cmd.timestamp));
                self.by_index.insert(index.clone(), pos);
                pos
            }
        };

        let entity = &mut self.entities[pos];
        entity.last_seen = cmd.timestamp;
        entity.history.push(EntityCommand::from(cmd));
        if cmd.kind == CommandKind::ConstructEntity && entity.construction_time.is_none() {
            entity.construction_time = Some(cmd.timestamp);
        }

        infer_building(
            entity,
            &self.faction,
            &self.production,
            self.correlation_window_ms,
        );
    }

    pub fn track_all<'a>(&mut self, commands: impl IntoIterator<Item = &'a Command>) {
        for cmd in commands {
            self.track(cmd);
        }
    }

    /// Re-run inference for every entity once the whole stream is in.
    /// Returns how many entities were newly inferred; calling it again
    /// returns 0 and changes nothing.
    pub fn finalize_tracking(&mut self) -> usize {
        let mut newly_inferred = 0;
        for entity in &mut self.entities {
            let before = entity.inferred.is_some();
            infer_building(
                entity,
                &self.faction,
                &self.production,
                self.correlation_window_ms,
            );
            if !before && entity.inferred.is_some() {
                newly_inferred += 1;
            }
        }
        newly_inferred
    }

    pub fn entity(&self, index: &str) -> Option<&TrackedEntity> {
        self.by_index.get(index).map(|&pos| &self.entities[pos])
    }

    pub fn entities(&self) -> impl Iterator<Item = &TrackedEntity> {
        self.entities.iter()
    }

    /// Confirmed buildings in first-seen order
    pub fn buildings(&self) -> impl Iterator<Item = &TrackedEntity> {
        self.entities.iter().filter(|e| e.is_building())
    }

    pub fn inferred_building(&self, index: &str) -> Option<&InferredBuilding> {
        self.entity(index).and_then(|e| e.inferred.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

fn infer_building(
    entity: &mut TrackedEntity,
    faction: &str,
    production: &[ProductionRecord],
    window_ms: Timestamp,
) {
    if entity.inferred.is_some() {
        return;
    }
    let Some(constructed_at) = entity.construction_time else {
        return;
    };

    // Units built from the entity itself; HQ counts here
    let direct = entity
        .history
        .iter()
        .filter(|c| c.kind == CommandKind::BuildSquad)
        .filter_map(|c| c.pbgid())
        .find_map(|unit| building_for_unit(faction, unit).map(|building| (building, unit)));
    if let Some((building, unit)) = direct {
        tracing::debug!(
            "Entity {} inferred as {} from its own production of {}",
            entity.index,
            building,
            unit
        );
        entity.inferred = Some(InferredBuilding {
            building,
            unit,
            evidence: Evidence::Direct,
        });
        return;
    }

    // Units any tracked entity produced right after placing it; HQ is the
    // starting building and never a correlated answer
    let window_end = constructed_at.saturating_add(window_ms);
    let correlated = production
        .iter()
        .filter(|p| p.timestamp >= constructed_at && p.timestamp <= window_end)
        .find_map(|p| {
            building_for_unit(faction, p.unit)
                .filter(|building| !building.is_headquarters())
                .map(|building| (building, p.unit))
        });
    if let Some((building, unit)) = correlated {
        tracing::debug!(
            "Entity {} inferred as {} from production of {} within {}ms",
            entity.index,
            building,
            unit,
            window_ms
        );
        entity.inferred = Some(InferredBuilding {
            building,
            unit,
            evidence: Evidence::Correlated,
        });
    }
}
