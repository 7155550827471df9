//! Blueprint reference data
//!
//! Loads the unit and building databases plus the locale table, and resolves
//! decoder identifiers to display information. Battlegroup and upgrade names
//! come from fixed tables in `tables`.

pub mod registry;
pub mod schema;
pub mod tables;

pub use registry::{
    faction_display_name, BlueprintDatabase, BlueprintKind, BlueprintResolver, DatabaseCache,
    LoadStats, UnitCategory, UnitInfo,
};
pub use tables::{battlegroup_name, upgrade_name};
