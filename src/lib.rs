//! A Rust library for turning OpenStreetMap building footprints into 3D geometry.
//!
//! This library provides a trait-based architecture for fetching OSM features and
//! extruding them into render-ready meshes on a local meter plane. Buildings stream
//! in tile by tile around a moving viewpoint, with footprints deduplicated across
//! overlapping fetches and `building:part` outlines reconciled with their parents.

pub mod building;
pub mod config;
pub mod error;
pub mod feature;
pub mod loader;
pub mod projection;
pub mod provider;

pub use building::*;
pub use config::*;
pub use error::*;
pub use feature::*;
pub use loader::*;
pub use projection::*;
pub use provider::*;
