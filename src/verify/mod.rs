//! Submission verification
//!
//! Every entry point takes fully materialized bytes or images and returns
//! either a list of human-readable notes or a single [`ValidationFailure`].
//! Findings of one category are collected across the whole submission
//! before failing, so one rejection lists every offending pixel or name.

mod locked;
mod outcome;
mod portrait;
mod sprite;

pub use locked::{check_locked_portrait, check_locked_regions, check_locked_sprite, RecolorPair, Submission};
pub use outcome::{AckFlags, FailureKind, ValidationFailure};
pub use portrait::{verify_portrait, verify_portrait_recolor};
pub use sprite::{check_sheet_layout, verify_sprite, verify_sprite_recolor};

use crate::config::{SpritecheckConfig, DEFAULT_MAX_COLORS};
use crate::palette::PaletteScan;
use crate::registry::{AnimRegistry, PortraitLayout};

use outcome::summarize_positions;

/// Rules applied to sprite archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteRules {
    pub registry: AnimRegistry,
    pub max_colors: usize,
}

impl Default for SpriteRules {
    fn default() -> Self {
        Self { registry: AnimRegistry::standard(), max_colors: DEFAULT_MAX_COLORS }
    }
}

impl SpriteRules {
    pub fn from_config(config: &SpritecheckConfig) -> Self {
        Self { registry: AnimRegistry::from_config(&config.sprite), max_colors: config.sprite.max_colors }
    }
}

/// Rules applied to portrait sheets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortraitRules {
    pub layout: PortraitLayout,
    pub max_colors: usize,
}

impl Default for PortraitRules {
    fn default() -> Self {
        Self { layout: PortraitLayout::standard(), max_colors: DEFAULT_MAX_COLORS }
    }
}

impl PortraitRules {
    pub fn from_config(config: &SpritecheckConfig) -> Self {
        Self { layout: PortraitLayout::from_config(&config.portrait), max_colors: config.portrait.max_colors }
    }
}

/// Positions listed per rejected region before the rest are counted.
const POSITION_LIMIT: usize = 8;

/// Semi-transparent pixels per named region, fatal when any exist.
fn reject_semi_transparent<'a>(
    scans: impl IntoIterator<Item = (&'a str, &'a PaletteScan)>,
) -> Result<(), ValidationFailure> {
    let findings: Vec<String> = scans
        .into_iter()
        .filter(|(_, scan)| scan.has_defects())
        .map(|(name, scan)| format!("{}: {}", name, summarize_positions(&scan.semi_transparent, POSITION_LIMIT)))
        .collect();
    if findings.is_empty() {
        return Ok(());
    }
    Err(ValidationFailure::new(
        FailureKind::SemiTransparent,
        format!("Semi-transparent pixels found; alpha must be 0 or 255:{}", outcome::join_findings(&findings)),
    ))
}
