//! Acknowledgement flags and the rejection type shared by every check

use image::RgbaImage;
use std::fmt;
use std::fmt::Write as _;
use thiserror::Error;

use crate::descriptor::DescriptorError;
use crate::frames::BuilderError;
use crate::sprite::ArchiveError;

/// Overrides a submitter states explicitly to get past escapable checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AckFlags {
    /// Outline (opaque black) pixels were recolored on purpose
    pub lineart: bool,
    /// Portrait tiles may exceed the per-tile color cap
    pub overcolor: bool,
    /// Identical frames with different markers are intended
    pub multioffset: bool,
    /// Flipped portraits are deliberately incomplete
    pub noflip: bool,
    /// Exact change in palette size a recolor introduces
    pub colormod: i32,
    /// Exact palette size of a sprite over the cap
    pub colors: Option<usize>,
}

/// Category of a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    Archive,
    Descriptor,
    MissingAnimation,
    WrongIndexName,
    Layout,
    Dimensions,
    Builder,
    SemiTransparent,
    PartialTile,
    OffsetAmbiguity,
    PaletteOverflow,
    TileOverflow,
    AuxiliaryChanged,
    Silhouette,
    LineArt,
    ColorDelta,
    FlipWithoutOriginal,
    MissingFlip,
    LockedRegion,
}

impl FailureKind {
    /// The acknowledgement that lets a submission past this failure, if any.
    pub fn escape_flag(self) -> Option<&'static str> {
        match self {
            FailureKind::OffsetAmbiguity => Some("multioffset"),
            FailureKind::PaletteOverflow => Some("colors"),
            FailureKind::TileOverflow => Some("overcolor"),
            FailureKind::LineArt => Some("lineart"),
            FailureKind::ColorDelta => Some("colormod"),
            FailureKind::MissingFlip => Some("noflip"),
            _ => None,
        }
    }

    pub fn is_escapable(self) -> bool {
        self.escape_flag().is_some()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Archive => "archive",
            FailureKind::Descriptor => "descriptor",
            FailureKind::MissingAnimation => "missing_animation",
            FailureKind::WrongIndexName => "wrong_index_name",
            FailureKind::Layout => "layout",
            FailureKind::Dimensions => "dimensions",
            FailureKind::Builder => "frame_markers",
            FailureKind::SemiTransparent => "semi_transparent",
            FailureKind::PartialTile => "partial_tile",
            FailureKind::OffsetAmbiguity => "offset_ambiguity",
            FailureKind::PaletteOverflow => "palette_overflow",
            FailureKind::TileOverflow => "tile_overflow",
            FailureKind::AuxiliaryChanged => "auxiliary_changed",
            FailureKind::Silhouette => "silhouette",
            FailureKind::LineArt => "line_art",
            FailureKind::ColorDelta => "color_delta",
            FailureKind::FlipWithoutOriginal => "flip_without_original",
            FailureKind::MissingFlip => "missing_flip",
            FailureKind::LockedRegion => "locked_region",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected submission.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ValidationFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Image that helps the submitter locate the problem
    pub preview: Option<RgbaImage>,
}

impl ValidationFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), preview: None }
    }

    pub fn with_preview(mut self, preview: RgbaImage) -> Self {
        self.preview = Some(preview);
        self
    }
}

impl From<ArchiveError> for ValidationFailure {
    fn from(e: ArchiveError) -> Self {
        match e {
            ArchiveError::Descriptor(d) => d.into(),
            other => ValidationFailure::new(FailureKind::Archive, other.to_string()),
        }
    }
}

impl From<DescriptorError> for ValidationFailure {
    fn from(e: DescriptorError) -> Self {
        let kind = match e {
            DescriptorError::WrongIndexName { .. } => FailureKind::WrongIndexName,
            _ => FailureKind::Descriptor,
        };
        ValidationFailure::new(kind, format!("AnimData.xml: {}", e))
    }
}

impl From<BuilderError> for ValidationFailure {
    fn from(e: BuilderError) -> Self {
        let kind = match e {
            BuilderError::Marker { .. } | BuilderError::MissingMarker { .. } => FailureKind::Builder,
            _ => FailureKind::Layout,
        };
        ValidationFailure::new(kind, e.to_string())
    }
}

/// Pixel positions as a short list: `(1, 2), (3, 4) and 10 more`.
pub(crate) fn summarize_positions(positions: &[(u32, u32)], limit: usize) -> String {
    let mut out = String::new();
    for (i, (x, y)) in positions.iter().take(limit).enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "({}, {})", x, y);
    }
    if positions.len() > limit {
        let _ = write!(out, " and {} more", positions.len() - limit);
    }
    out
}

/// Join findings from several places into one message body.
pub(crate) fn join_findings(findings: &[String]) -> String {
    findings.iter().map(|f| format!("\n  - {}", f)).collect()
}
