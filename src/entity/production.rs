//! Faction production table - which building produces which unit
//!
//! Used by the tracker to infer the type of a constructed building from the
//! units it (or the player) starts producing. Only the Afrika Korps roster is
//! mapped so far; the other factions are known but empty, so their lookups
//! miss instead of erroring.

use serde::Serialize;
use std::fmt;

use crate::core::types::Pbgid;

/// Building type a unit is produced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BuildingType {
    /// The starting building every player begins with
    Headquarters,
    /// A constructible building, by blueprint id
    Blueprint(Pbgid),
}

impl BuildingType {
    /// Identifier as used in production tables: `"HQ"` or the decimal pbgid
    pub fn id(&self) -> String {
        match self {
            BuildingType::Headquarters => "HQ".to_string(),
            BuildingType::Blueprint(pbgid) => pbgid.key(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            BuildingType::Headquarters => "Headquarters".to_string(),
            BuildingType::Blueprint(Pbgid(198236)) => "Light Support Kompanie".to_string(),
            BuildingType::Blueprint(Pbgid(198237)) => "Mechanized Kompanie".to_string(),
            BuildingType::Blueprint(pbgid) => format!("Unknown Building (ID: {})", pbgid),
        }
    }

    pub fn is_headquarters(&self) -> bool {
        matches!(self, BuildingType::Headquarters)
    }
}

impl fmt::Display for BuildingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Table entry for a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Producer {
    Known(BuildingType),
    /// Unit is listed but its building has not been identified yet
    Unidentified,
}

const LIGHT_SUPPORT_KOMPANIE: BuildingType = BuildingType::Blueprint(Pbgid(198236));
const MECHANIZED_KOMPANIE: BuildingType = BuildingType::Blueprint(Pbgid(198237));

/// Normalized faction key: lower-case with separators removed, so
/// `"AfrikaKorps"`, `"Afrika Korps"` and `"afrika_korps"` agree
pub fn faction_key(faction: &str) -> String {
    faction
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Raw table lookup for a faction and unit
pub fn producer_of(faction: &str, unit: Pbgid) -> Option<Producer> {
    match faction_key(faction).as_str() {
        "afrikakorps" => afrika_korps(unit),
        // Known factions without a mapped roster yet
        "wehrmacht" | "americans" | "british" => None,
        _ => None,
    }
}

/// Building a unit identifies, skipping unidentified entries
pub fn building_for_unit(faction: &str, unit: Pbgid) -> Option<BuildingType> {
    match producer_of(faction, unit)? {
        Producer::Known(building) => Some(building),
        Producer::Unidentified => None,
    }
}

fn afrika_korps(unit: Pbgid) -> Option<Producer> {
    let producer = match unit.0 {
        // Panzergrenadier Squad, Panzerpioneer Squad, Kradschützen Motorcycle Team
        198340 | 198341 | 198355 => Producer::Known(BuildingType::Headquarters),

        // MG34 Team, Panzerjäger Squad, 2.5-tonne Medical Truck, Flakvierling Half-track
        198347 | 198342 | 2072237 | 2063111 => Producer::Known(LIGHT_SUPPORT_KOMPANIE),

        // StuG III D, Marder III, Panzer III
        2033664 | 198357 | 198361 => Producer::Known(MECHANIZED_KOMPANIE),

        // Walking Stuka
        198413 => Producer::Unidentified,

        _ => return None,
    };
    Some(producer)
}
