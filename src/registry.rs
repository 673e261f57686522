//! Fixed vocabularies: animation names, index slots, completion tiers,
//! facing directions and portrait emotions
//!
//! The standard tables describe the shared catalog's sprite format. They can
//! be replaced through `spritecheck.toml` (see [`crate::config`]).

use std::collections::BTreeMap;
use std::fmt;

use crate::config::{PortraitConfig, SpriteConfig};
use crate::geometry::Rect;

/// Every animation name a descriptor may use.
pub const STANDARD_ANIMATIONS: &[&str] = &[
    "Walk", "Attack", "Kick", "Shoot", "Strike", "Sleep", "Hurt", "Idle", "Swing", "Double",
    "Hop", "Charge", "Rotate", "EventSleep", "Wake", "Eat", "Tumble", "Pose", "Pull", "Pain",
    "Float", "DeepBreath", "Nod", "Sit", "LookUp", "Sink", "Trip", "Laying", "LeapForth", "Head",
    "Cringe", "LostBalance", "TumbleBack", "Faint", "HitGround", "Appeal", "Dance", "Twirl",
    "TailWhip", "Sing", "Sound", "Rumble", "FlapAround", "Gas", "Shock", "Emit", "SpAttack",
    "Withdraw", "RearUp", "Swell", "Swallow", "Slide", "Special0", "Special1", "Special2",
    "Special3",
];

/// Index slots whose name is fixed by the runtime that plays these sprites.
pub const STANDARD_INDEXED: &[(i32, &str)] = &[
    (0, "Walk"),
    (1, "Attack"),
    (2, "Kick"),
    (3, "Shoot"),
    (4, "Strike"),
    (5, "Sleep"),
    (6, "Hurt"),
    (7, "Idle"),
    (8, "Swing"),
    (9, "Double"),
    (10, "Hop"),
    (11, "Charge"),
    (12, "Rotate"),
];

/// Tier 0 is required for any sprite; all tiers together make it complete.
pub const STANDARD_TIERS: &[&[&str]] = &[
    &["Walk", "Attack", "Hurt", "Idle", "Sleep"],
    &[
        "Kick", "Shoot", "Strike", "Swing", "Double", "Hop", "Charge", "Rotate", "EventSleep",
        "Wake", "Eat", "Tumble", "Pose", "Pull", "Pain", "Float", "DeepBreath", "Nod", "Sit",
        "LookUp", "Sink", "Trip", "Laying", "LeapForth", "Head", "Cringe", "LostBalance",
        "TumbleBack", "Faint", "HitGround",
    ],
];

/// Portrait emotions in sheet order.
pub const STANDARD_EMOTIONS: &[&str] = &[
    "Normal", "Happy", "Pain", "Angry", "Worried", "Sad", "Crying", "Shouting", "Teary-Eyed",
    "Determined", "Joyous", "Inspired", "Surprised", "Dizzy", "Special0", "Special1", "Sigh",
    "Stunned", "Special2", "Special3",
];

/// Suffix naming the flipped version of an emotion.
pub const FLIP_SUFFIX: &str = "^";

/// The eight facing directions, in sheet row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Down,
    DownRight,
    Right,
    UpRight,
    Up,
    UpLeft,
    Left,
    DownLeft,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Down,
        Direction::DownRight,
        Direction::Right,
        Direction::UpRight,
        Direction::Up,
        Direction::UpLeft,
        Direction::Left,
        Direction::DownLeft,
    ];

    /// Direction of a sheet row. Single-row sheets face down.
    pub fn from_row(row: u32) -> Option<Direction> {
        Self::ALL.get(row as usize).copied()
    }

    /// Rows that are horizontal mirrors of a right-facing row.
    pub fn is_left_facing(self) -> bool {
        matches!(self, Direction::UpLeft | Direction::Left | Direction::DownLeft)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Down => "Down",
            Direction::DownRight => "DownRight",
            Direction::Right => "Right",
            Direction::UpRight => "UpRight",
            Direction::Up => "Up",
            Direction::UpLeft => "UpLeft",
            Direction::Left => "Left",
            Direction::DownLeft => "DownLeft",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legal animation names, fixed index slots and completion tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimRegistry {
    /// lowercase name -> canonical spelling
    known: BTreeMap<String, String>,
    indexed: BTreeMap<i32, String>,
    tiers: Vec<Vec<String>>,
}

impl Default for AnimRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl AnimRegistry {
    /// The catalog's standard vocabulary.
    pub fn standard() -> Self {
        Self::new(
            STANDARD_ANIMATIONS.iter().map(|s| s.to_string()),
            STANDARD_INDEXED.iter().map(|(i, s)| (*i, s.to_string())),
            STANDARD_TIERS.iter().map(|tier| tier.iter().map(|s| s.to_string()).collect()),
        )
    }

    pub fn new(
        known: impl IntoIterator<Item = String>,
        indexed: impl IntoIterator<Item = (i32, String)>,
        tiers: impl IntoIterator<Item = Vec<String>>,
    ) -> Self {
        let indexed: BTreeMap<i32, String> = indexed.into_iter().collect();
        let tiers: Vec<Vec<String>> = tiers.into_iter().collect();
        let mut known: BTreeMap<String, String> =
            known.into_iter().map(|name| (name.to_lowercase(), name)).collect();
        // Indexed and tier names are always legal.
        for name in indexed.values().chain(tiers.iter().flatten()) {
            known.entry(name.to_lowercase()).or_insert_with(|| name.clone());
        }
        Self { known, indexed, tiers }
    }

    pub fn from_config(config: &SpriteConfig) -> Self {
        Self::new(
            config.known_animations.iter().cloned(),
            config.indexed.iter().filter_map(|(k, v)| k.parse::<i32>().ok().map(|i| (i, v.clone()))),
            config.completion_tiers.iter().cloned(),
        )
    }

    /// Canonical spelling of a name, matched case-insensitively.
    pub fn canonical_name(&self, name: &str) -> Option<&str> {
        self.known.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.canonical_name(name).is_some()
    }

    /// The exact name an index slot must carry, if the slot is fixed.
    pub fn expected_name(&self, index: i32) -> Option<&str> {
        self.indexed.get(&index).map(String::as_str)
    }

    /// Names every sprite must provide.
    pub fn required(&self) -> &[String] {
        self.tiers.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn tiers(&self) -> &[Vec<String>] {
        &self.tiers
    }
}

/// Fixed tile grid of a portrait sheet: emotions in row-major order,
/// followed by their flipped versions in the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortraitLayout {
    pub tile_size: u32,
    pub columns: u32,
    emotions: Vec<String>,
}

impl Default for PortraitLayout {
    fn default() -> Self {
        Self::standard()
    }
}

impl PortraitLayout {
    pub fn standard() -> Self {
        Self::new(40, 5, STANDARD_EMOTIONS.iter().map(|s| s.to_string()).collect())
    }

    pub fn new(tile_size: u32, columns: u32, emotions: Vec<String>) -> Self {
        Self { tile_size, columns: columns.max(1), emotions }
    }

    pub fn from_config(config: &PortraitConfig) -> Self {
        Self::new(config.tile_size, config.columns, config.emotions.clone())
    }

    pub fn emotions(&self) -> &[String] {
        &self.emotions
    }

    pub fn emotion_count(&self) -> usize {
        self.emotions.len()
    }

    /// Rows taken by one half (non-flipped or flipped) of the sheet.
    pub fn half_rows(&self) -> u32 {
        (self.emotions.len() as u32).div_ceil(self.columns)
    }

    /// Total tile slots, both halves, padding included.
    pub fn slot_count(&self) -> u32 {
        self.half_rows() * self.columns * 2
    }

    /// Expected sheet dimensions in pixels.
    pub fn sheet_size(&self) -> (u32, u32) {
        (self.columns * self.tile_size, self.half_rows() * 2 * self.tile_size)
    }

    /// Slot of an emotion, or of its flipped version.
    pub fn slot(&self, emotion: usize, flipped: bool) -> u32 {
        let base = if flipped { self.half_rows() * self.columns } else { 0 };
        base + emotion as u32
    }

    /// Pixel rectangle of a slot.
    pub fn tile_rect(&self, slot: u32) -> Rect {
        let col = slot % self.columns;
        let row = slot / self.columns;
        Rect::new(col * self.tile_size, row * self.tile_size, self.tile_size, self.tile_size)
    }

    /// Display name of an emotion slot (`Happy`, `Happy^`).
    pub fn tile_name(&self, emotion: usize, flipped: bool) -> String {
        let base = self.emotions.get(emotion).map(String::as_str).unwrap_or("?");
        if flipped {
            format!("{}{}", base, FLIP_SUFFIX)
        } else {
            base.to_string()
        }
    }

    /// Every (emotion index, flipped) pair in slot order.
    pub fn tiles(&self) -> impl Iterator<Item = (usize, bool)> + '_ {
        let n = self.emotions.len();
        (0..n).map(|e| (e, false)).chain((0..n).map(|e| (e, true)))
    }

    /// Resolve a tile name, case-insensitively, to (emotion, flipped).
    pub fn find_tile(&self, name: &str) -> Option<(usize, bool)> {
        let (base, flipped) = match name.strip_suffix(FLIP_SUFFIX) {
            Some(base) => (base, true),
            None => (name, false),
        };
        self.emotions.iter().position(|e| e.eq_ignore_ascii_case(base)).map(|e| (e, flipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_name_case_insensitive() {
        let reg = AnimRegistry::standard();
        assert_eq!(reg.canonical_name("walk"), Some("Walk"));
        assert_eq!(reg.canonical_name("EVENTSLEEP"), Some("EventSleep"));
        assert_eq!(reg.canonical_name("Moonwalk"), None);
    }

    #[test]
    fn test_expected_index_names() {
        let reg = AnimRegistry::standard();
        assert_eq!(reg.expected_name(0), Some("Walk"));
        assert_eq!(reg.expected_name(7), Some("Idle"));
        assert_eq!(reg.expected_name(40), None);
    }

    #[test]
    fn test_tier_names_are_known() {
        let reg = AnimRegistry::new(vec![], vec![(0, "Walk".to_string())], vec![vec![
            "Idle".to_string(),
        ]]);
        assert!(reg.is_known("walk"));
        assert!(reg.is_known("idle"));
        assert_eq!(reg.required(), &["Idle".to_string()]);
    }

    #[test]
    fn test_direction_rows() {
        assert_eq!(Direction::from_row(0), Some(Direction::Down));
        assert_eq!(Direction::from_row(6), Some(Direction::Left));
        assert_eq!(Direction::from_row(8), None);
        assert!(Direction::Left.is_left_facing());
        assert!(!Direction::Right.is_left_facing());
    }

    #[test]
    fn test_portrait_layout_geometry() {
        let layout = PortraitLayout::standard();
        assert_eq!(layout.half_rows(), 4);
        assert_eq!(layout.sheet_size(), (200, 320));
        assert_eq!(layout.slot(0, true), 20);
        assert_eq!(layout.tile_rect(21), Rect::new(40, 160, 40, 40));
        assert_eq!(layout.tile_name(1, true), "Happy^");
    }

    #[test]
    fn test_portrait_find_tile() {
        let layout = PortraitLayout::standard();
        assert_eq!(layout.find_tile("happy"), Some((1, false)));
        assert_eq!(layout.find_tile("Teary-Eyed^"), Some((8, true)));
        assert_eq!(layout.find_tile("Bored"), None);
    }

    #[test]
    fn test_portrait_layout_pads_partial_rows() {
        let layout = PortraitLayout::new(
            10,
            4,
            vec!["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string(), "E".to_string()],
        );
        assert_eq!(layout.half_rows(), 2);
        assert_eq!(layout.slot(0, true), 8);
        assert_eq!(layout.sheet_size(), (40, 40));
    }
}
