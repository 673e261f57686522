//! Spritecheck - verification for community pixel-art submissions
//!
//! This library provides functionality to:
//! - Parse `AnimData.xml` animation descriptors and sprite archives
//! - Build deduplicated frame tables from sprite sheets and marker sheets
//! - Verify sprite and portrait submissions, fresh or recolored
//! - Enforce locked sub-assets against the currently accepted asset
//! - Draft recolors of new art from a known original/recolor pair

pub mod catalog;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod frames;
pub mod geometry;
pub mod markers;
pub mod output;
pub mod palette;
pub mod portrait;
pub mod quantize;
pub mod recolor;
pub mod registry;
pub mod sprite;
pub mod telemetry;
pub mod verify;
