//! Entity tracking for one player's command stream
//!
//! `tracker` follows indexed entities and infers building types; `production`
//! holds the faction tables mapping units to the buildings that produce them.

pub mod production;
pub mod tracker;

pub use production::{building_for_unit, BuildingType, Producer};
pub use tracker::{
    EntityCommand, EntityState, EntityTracker, Evidence, InferredBuilding, TrackedEntity,
};
