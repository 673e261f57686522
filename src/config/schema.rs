//! Configuration schema types for `spritecheck.toml`
//!
//! Defines the structure and validation rules for verification settings.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::registry::{STANDARD_ANIMATIONS, STANDARD_EMOTIONS, STANDARD_INDEXED, STANDARD_TIERS};

/// Palette cap shared by sprites and portraits unless overridden.
pub const DEFAULT_MAX_COLORS: usize = 15;

/// Sprite submission rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteConfig {
    /// Maximum distinct opaque colors across all animation sheets
    #[serde(default = "default_max_colors")]
    pub max_colors: usize,
    /// Every legal animation name
    #[serde(default = "default_known_animations")]
    pub known_animations: Vec<String>,
    /// Fixed index slots (index -> exact name)
    #[serde(default = "default_indexed")]
    pub indexed: BTreeMap<String, String>,
    /// Completion tiers; tier 0 is required for every submission
    #[serde(default = "default_tiers")]
    pub completion_tiers: Vec<Vec<String>>,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            max_colors: default_max_colors(),
            known_animations: default_known_animations(),
            indexed: default_indexed(),
            completion_tiers: default_tiers(),
        }
    }
}

fn default_max_colors() -> usize {
    DEFAULT_MAX_COLORS
}

fn default_known_animations() -> Vec<String> {
    STANDARD_ANIMATIONS.iter().map(|s| s.to_string()).collect()
}

fn default_indexed() -> BTreeMap<String, String> {
    STANDARD_INDEXED.iter().map(|(i, name)| (i.to_string(), name.to_string())).collect()
}

fn default_tiers() -> Vec<Vec<String>> {
    STANDARD_TIERS.iter().map(|tier| tier.iter().map(|s| s.to_string()).collect()).collect()
}

/// Portrait sheet layout and rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortraitConfig {
    /// Edge length of one square tile in pixels
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    /// Tiles per row
    #[serde(default = "default_columns")]
    pub columns: u32,
    /// Emotion names in sheet order
    #[serde(default = "default_emotions")]
    pub emotions: Vec<String>,
    /// Maximum distinct opaque colors per tile
    #[serde(default = "default_max_colors")]
    pub max_colors: usize,
}

impl Default for PortraitConfig {
    fn default() -> Self {
        Self {
            tile_size: default_tile_size(),
            columns: default_columns(),
            emotions: default_emotions(),
            max_colors: default_max_colors(),
        }
    }
}

fn default_tile_size() -> u32 {
    40
}

fn default_columns() -> u32 {
    5
}

fn default_emotions() -> Vec<String> {
    STANDARD_EMOTIONS.iter().map(|s| s.to_string()).collect()
}

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Append rejected verifications to a local JSONL log
    #[serde(default)]
    pub collect_errors: bool,
    /// Path of the JSONL log
    #[serde(default = "default_error_log")]
    pub error_log: PathBuf,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { collect_errors: false, error_log: default_error_log() }
    }
}

fn default_error_log() -> PathBuf {
    PathBuf::from(".spritecheck-errors.jsonl")
}

/// Root configuration structure for `spritecheck.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpritecheckConfig {
    #[serde(default)]
    pub sprite: SpriteConfig,
    #[serde(default)]
    pub portrait: PortraitConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "portrait.tile_size")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl SpritecheckConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: String, message: &str| {
            errors.push(ConfigValidationError { field, message: message.to_string() });
        };

        if self.sprite.max_colors == 0 {
            push("sprite.max_colors".to_string(), "must be a positive integer");
        }
        if self.sprite.completion_tiers.first().map_or(true, |t| t.is_empty()) {
            push("sprite.completion_tiers".to_string(), "tier 0 must name at least one animation");
        }
        for (key, name) in &self.sprite.indexed {
            match key.parse::<i32>() {
                Ok(i) if i >= 0 => {}
                _ => push(format!("sprite.indexed.{}", key), "index must be a non-negative integer"),
            }
            if name.is_empty() {
                push(format!("sprite.indexed.{}", key), "name must be non-empty");
            }
        }
        let mut seen = BTreeSet::new();
        for name in &self.sprite.known_animations {
            if !seen.insert(name.to_lowercase()) {
                push("sprite.known_animations".to_string(), "names must be unique ignoring case");
                break;
            }
        }

        if self.portrait.tile_size == 0 {
            push("portrait.tile_size".to_string(), "must be a positive integer");
        }
        if self.portrait.columns == 0 {
            push("portrait.columns".to_string(), "must be a positive integer");
        }
        if self.portrait.emotions.is_empty() {
            push("portrait.emotions".to_string(), "must list at least one emotion");
        }
        if self.portrait.max_colors == 0 {
            push("portrait.max_colors".to_string(), "must be a positive integer");
        }

        errors
    }
}
