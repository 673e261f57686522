//! Catalog tree of species, forms and variants with per-asset state
//!
//! Nodes own their children outright and are addressed by a path of small
//! integers (species, form, shiny, gender...). The verification core only
//! reads from here: which sub-assets are locked, and which completion phase
//! a newly accepted asset puts a node in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::descriptor::AnimDescriptor;
use crate::portrait::PortraitSheet;
use crate::registry::AnimRegistry;

/// The two kinds of art a node can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Sprite,
    Portrait,
}

impl AssetKind {
    pub const ALL: [AssetKind; 2] = [AssetKind::Sprite, AssetKind::Portrait];
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Sprite => write!(f, "sprite"),
            AssetKind::Portrait => write!(f, "portrait"),
        }
    }
}

/// How complete an asset is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Required pieces are missing
    #[default]
    Incomplete,
    /// Usable, but not everything is drawn
    Exists,
    /// Every known piece is present
    Full,
}

/// Bookkeeping for one asset kind of one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetState {
    pub phase: Phase,
    pub credit_primary: String,
    pub credit_secondary: Vec<String>,
    /// Sub-asset name -> locked
    pub files: BTreeMap<String, bool>,
    pub bounty: BTreeMap<String, u32>,
    pub pending: BTreeMap<String, u64>,
    /// Shared art: path of the node whose asset this one mirrors
    pub links: Vec<Vec<u16>>,
}

impl AssetState {
    pub fn is_locked(&self, name: &str) -> bool {
        self.files.iter().any(|(file, locked)| *locked && file.eq_ignore_ascii_case(name))
    }
}

/// A node in the catalog tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogNode {
    pub name: String,
    pub assets: BTreeMap<AssetKind, AssetState>,
    pub children: BTreeMap<u16, CatalogNode>,
}

impl CatalogNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Descendant at `path`; the empty path is this node.
    pub fn get(&self, path: &[u16]) -> Option<&CatalogNode> {
        match path.split_first() {
            None => Some(self),
            Some((index, rest)) => self.children.get(index)?.get(rest),
        }
    }

    pub fn get_mut(&mut self, path: &[u16]) -> Option<&mut CatalogNode> {
        match path.split_first() {
            None => Some(self),
            Some((index, rest)) => self.children.get_mut(index)?.get_mut(rest),
        }
    }

    /// Attach (or replace) a child, returning the one it replaced.
    pub fn insert_child(&mut self, index: u16, child: CatalogNode) -> Option<CatalogNode> {
        self.children.insert(index, child)
    }

    pub fn asset(&self, kind: AssetKind) -> Option<&AssetState> {
        self.assets.get(&kind)
    }

    pub fn asset_mut(&mut self, kind: AssetKind) -> &mut AssetState {
        self.assets.entry(kind).or_default()
    }

    /// Names of the locked sub-assets of one kind.
    pub fn locked_names(&self, kind: AssetKind) -> std::collections::BTreeSet<String> {
        self.asset(kind)
            .map(|state| state.files.iter().filter(|(_, locked)| **locked).map(|(name, _)| name.clone()).collect())
            .unwrap_or_default()
    }
}

/// Phase of a sprite from the animations its descriptor lists.
pub fn sprite_phase(descriptor: &AnimDescriptor, registry: &AnimRegistry) -> Phase {
    let tiers = registry.tiers();
    let has_all = |names: &[String]| names.iter().all(|name| descriptor.contains(name));
    if !tiers.first().map_or(true, |required| has_all(required)) {
        return Phase::Incomplete;
    }
    if tiers.iter().all(|tier| has_all(tier)) {
        Phase::Full
    } else {
        Phase::Exists
    }
}

/// Phase of a portrait sheet from its present tiles.
///
/// The first emotion (Normal) is required; all unflipped emotions make it
/// full. Flipped tiles don't count toward completion.
pub fn portrait_phase(sheet: &PortraitSheet<'_>) -> Phase {
    if !sheet.is_present(0, false) {
        return Phase::Incomplete;
    }
    if (0..sheet.layout.emotion_count()).all(|e| sheet.is_present(e, false)) {
        Phase::Full
    } else {
        Phase::Exists
    }
}
