//! Replay Enrich - build orders from decoded replay command streams
//!
//! Takes the per-player command streams an external replay decoder produces
//! and attaches human-readable unit and building names, inferring building
//! types from production where the decoder gives only an entity index.

pub mod blueprints;
pub mod command;
pub mod core;
pub mod enrich;
pub mod entity;
