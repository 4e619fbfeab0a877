//! Build-time evidence collector for component versions.
//!
//! Gathers facts about the current git checkout, merges them with
//! `component.toml` and the process environment, and submits the resolved
//! component-version record (plus license, readme, API-spec, SBOM, and
//! provenance artifacts) to a registry.

pub mod attrs;
pub mod config;
pub mod evidence;
pub mod facts;
pub mod files;
pub mod image;
pub mod model;
pub mod registry;
pub mod resolve;
pub mod runner;
