//! Frame tables: deduplicated frames of a sprite with their sheet placements
//!
//! Every tile of an animation sheet is cropped to its tight bounds and
//! compared against the frames collected so far. A tile joins an existing
//! frame when its pixels are identical (directly or as a horizontal mirror)
//! and its decoded markers agree under the same transform. Tiles that look
//! identical but disagree on markers become new frames and are reported as
//! offset ambiguities for the caller to judge.
//!
//! Candidates are pre-filtered by (width, height, opaque pixel count), a
//! mirror-invariant key; exact comparison decides membership.

use image::RgbaImage;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::descriptor::AnimationDescriptor;
use crate::geometry::{crop, images_equal, mirror, opaque_count, paste, tight_bounds, Point, Rect, TRANSPARENT};
use crate::markers::{decode_markers, MarkerError, MarkerRequest, MarkerRole};
use crate::registry::Direction;
use crate::sprite::{SheetKind, SpriteSet};

/// A tile position: animation, direction row and frame column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TilePos {
    pub anim: String,
    pub row: u32,
    pub col: u32,
}

impl TilePos {
    pub fn new(anim: impl Into<String>, row: u32, col: u32) -> Self {
        Self { anim: anim.into(), row, col }
    }

    pub fn direction(&self) -> Option<Direction> {
        Direction::from_row(self.row)
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction() {
            Some(dir) => write!(f, "{} {} #{}", self.anim, dir, self.col),
            None => write!(f, "{} row {} #{}", self.anim, self.row, self.col),
        }
    }
}

/// Frame table construction failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuilderError {
    #[error("'{anim}': frame size {width}x{height} is not usable")]
    InvalidFrameSize { anim: String, width: u32, height: u32 },
    #[error("'{anim}': {width}x{height} sheet is not divisible by frame size {frame_width}x{frame_height}")]
    NotDivisible { anim: String, width: u32, height: u32, frame_width: u32, frame_height: u32 },
    #[error("'{anim}': {kind} sheet is {}x{}, expected {}x{}", .found.0, .found.1, .expected.0, .expected.1)]
    SheetSizeMismatch { anim: String, kind: SheetKind, expected: (u32, u32), found: (u32, u32) },
    #[error("'{anim}' has no {kind} sheet")]
    MissingSheet { anim: String, kind: SheetKind },
    #[error("'{0}' is a copy and has no frames of its own")]
    AliasEntry(String),
    #[error("{tile}: {source}")]
    Marker { tile: TilePos, source: MarkerError },
    #[error("{tile}: no {role} marker")]
    MissingMarker { tile: TilePos, role: MarkerRole },
}

/// Marker positions of a frame, relative to its crop origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameOffsets {
    pub head: Option<Point>,
    pub left_hand: Option<Point>,
    pub right_hand: Option<Point>,
    pub center: Option<Point>,
    pub shadow: Option<Point>,
}

impl FrameOffsets {
    /// Offsets as seen on the horizontal mirror of a frame `width` wide.
    ///
    /// Left and right hand trade roles; head and center keep theirs even
    /// though their positions are reflected.
    pub fn mirrored(&self, width: u32) -> Self {
        let flip = |p: Option<Point>| p.map(|p| p.mirrored(width));
        Self {
            head: flip(self.head),
            left_hand: flip(self.right_hand),
            right_hand: flip(self.left_hand),
            center: flip(self.center),
            shadow: flip(self.shadow),
        }
    }

    fn translated(self, dx: i32, dy: i32) -> Self {
        let shift = |p: Option<Point>| p.map(|p| Point::new(p.x - dx, p.y - dy));
        Self {
            head: shift(self.head),
            left_hand: shift(self.left_hand),
            right_hand: shift(self.right_hand),
            center: shift(self.center),
            shadow: shift(self.shadow),
        }
    }
}

/// One deduplicated frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Tight crop of the first tile that produced this frame
    pub image: RgbaImage,
    pub offsets: FrameOffsets,
    /// First seen in a left-facing row, so the table holds only a mirror
    pub mirror_of_missing_original: bool,
    pub origin: TilePos,
}

/// Where a tile's content lives in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub frame: usize,
    pub mirrored: bool,
    /// Tight bounds of the tile content, in sheet coordinates
    pub bounds: Rect,
}

/// Two pixel-identical tiles whose markers disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetAmbiguity {
    /// Existing frame the tile looked like
    pub frame: usize,
    /// Tile that was kept as a separate frame
    pub tile: TilePos,
    pub mirrored: bool,
}

type BucketKey = (u32, u32, u32);

fn bucket_key(image: &RgbaImage) -> BucketKey {
    (image.width(), image.height(), opaque_count(image))
}

enum Lookup {
    Found(usize, bool),
    PixelsOnly(usize, bool),
    Missing,
}

/// Deduplicated frames plus tile placements, deterministic for equal input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameTable {
    pub frames: Vec<Frame>,
    pub placements: BTreeMap<TilePos, Placement>,
    pub ambiguities: Vec<OffsetAmbiguity>,
    buckets: BTreeMap<BucketKey, Vec<usize>>,
}

impl FrameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table of every concrete animation of a sprite, in document order.
    ///
    /// With `with_markers`, Offsets and Shadow sheets are required and every
    /// occupied tile must carry a center and a shadow marker. Without, only
    /// pixels are compared.
    pub fn from_sprite(set: &SpriteSet, with_markers: bool) -> Result<Self, BuilderError> {
        let mut table = Self::new();
        for anim in set.descriptor.concrete() {
            let sheet_of = |kind| {
                set.sheet(&anim.name, kind)
                    .ok_or_else(|| BuilderError::MissingSheet { anim: anim.name.clone(), kind })
            };
            let sheet = sheet_of(SheetKind::Anim)?;
            let markers = if with_markers {
                Some((sheet_of(SheetKind::Offsets)?, sheet_of(SheetKind::Shadow)?))
            } else {
                None
            };
            let size = anim.frame_size.ok_or_else(|| BuilderError::AliasEntry(anim.name.clone()))?;
            table.add_sheet(&anim.name, sheet, markers, size)?;
        }
        log::debug!(
            "frame table: {} tiles -> {} frames, {} ambiguities",
            table.placements.len(),
            table.frames.len(),
            table.ambiguities.len()
        );
        Ok(table)
    }

    /// Walk one sheet tile by tile and merge its frames into the table.
    pub fn add_sheet(
        &mut self,
        anim: &str,
        sheet: &RgbaImage,
        markers: Option<(&RgbaImage, &RgbaImage)>,
        frame_size: (u32, u32),
    ) -> Result<(), BuilderError> {
        let (fw, fh) = frame_size;
        if fw == 0 || fh == 0 {
            return Err(BuilderError::InvalidFrameSize { anim: anim.to_string(), width: fw, height: fh });
        }
        let (width, height) = sheet.dimensions();
        if width % fw != 0 || height % fh != 0 {
            return Err(BuilderError::NotDivisible {
                anim: anim.to_string(),
                width,
                height,
                frame_width: fw,
                frame_height: fh,
            });
        }
        if let Some((offsets, shadow)) = markers {
            for (kind, aux) in [(SheetKind::Offsets, offsets), (SheetKind::Shadow, shadow)] {
                if aux.dimensions() != sheet.dimensions() {
                    return Err(BuilderError::SheetSizeMismatch {
                        anim: anim.to_string(),
                        kind,
                        expected: sheet.dimensions(),
                        found: aux.dimensions(),
                    });
                }
            }
        }

        let rows = height / fh;
        let left_rows = rows == Direction::ALL.len() as u32;

        for row in 0..rows {
            for col in 0..width / fw {
                let tile = TilePos::new(anim, row, col);
                let region = Rect::new(col * fw, row * fh, fw, fh);
                let bounds = tight_bounds(sheet, region);

                let offsets = match markers {
                    Some((offsets, shadow)) => {
                        let marks = decode_markers(offsets, region, MarkerRequest::OFFSETS)
                            .map_err(|source| BuilderError::Marker { tile: tile.clone(), source })?;
                        let shade = decode_markers(shadow, region, MarkerRequest::SHADOW)
                            .map_err(|source| BuilderError::Marker { tile: tile.clone(), source })?;
                        if bounds.is_empty() && marks.is_empty() && shade.is_empty() {
                            continue;
                        }
                        let found = FrameOffsets {
                            head: marks.head,
                            left_hand: marks.left_hand,
                            right_hand: marks.right_hand,
                            center: marks.center,
                            shadow: shade.shadow,
                        };
                        if found.center.is_none() {
                            return Err(BuilderError::MissingMarker { tile, role: MarkerRole::Center });
                        }
                        if found.shadow.is_none() {
                            return Err(BuilderError::MissingMarker { tile, role: MarkerRole::Shadow });
                        }
                        // Markers were read relative to the tile; frames anchor at the crop.
                        found.translated((bounds.x - region.x) as i32, (bounds.y - region.y) as i32)
                    }
                    None => {
                        if bounds.is_empty() {
                            continue;
                        }
                        FrameOffsets::default()
                    }
                };

                let image = crop(sheet, bounds);
                let left_facing = left_rows && Direction::from_row(row).is_some_and(Direction::is_left_facing);
                self.insert(tile, bounds, image, offsets, left_facing);
            }
        }
        Ok(())
    }

    fn insert(&mut self, tile: TilePos, bounds: Rect, image: RgbaImage, offsets: FrameOffsets, left_facing: bool) {
        let key = bucket_key(&image);
        let (frame, mirrored) = match self.lookup(key, &image, Some(&offsets)) {
            Lookup::Found(frame, mirrored) => (frame, mirrored),
            lookup => {
                if let Lookup::PixelsOnly(frame, mirrored) = lookup {
                    log::debug!("{}: same pixels as frame {} but different markers", tile, frame);
                    self.ambiguities.push(OffsetAmbiguity { frame, tile: tile.clone(), mirrored });
                }
                let index = self.frames.len();
                self.frames.push(Frame {
                    image,
                    offsets,
                    mirror_of_missing_original: left_facing,
                    origin: tile.clone(),
                });
                self.buckets.entry(key).or_default().push(index);
                (index, false)
            }
        };
        self.placements.insert(tile, Placement { frame, mirrored, bounds });
    }

    fn lookup(&self, key: BucketKey, image: &RgbaImage, offsets: Option<&FrameOffsets>) -> Lookup {
        let mut pixels_only = None;
        for &index in self.buckets.get(&key).into_iter().flatten() {
            let frame = &self.frames[index];
            for mirrored in [false, true] {
                if !images_equal(&frame.image, image, mirrored) {
                    continue;
                }
                let expected = if mirrored { frame.offsets.mirrored(frame.image.width()) } else { frame.offsets };
                match offsets {
                    Some(offsets) if *offsets != expected => {
                        pixels_only.get_or_insert((index, mirrored));
                    }
                    _ => return Lookup::Found(index, mirrored),
                }
            }
        }
        match pixels_only {
            Some((index, mirrored)) => Lookup::PixelsOnly(index, mirrored),
            None => Lookup::Missing,
        }
    }

    /// Frame whose pixels equal `image`, directly or mirrored; markers ignored.
    pub fn find(&self, image: &RgbaImage) -> Option<(usize, bool)> {
        match self.lookup(bucket_key(image), image, None) {
            Lookup::Found(index, mirrored) => Some((index, mirrored)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn placement(&self, tile: &TilePos) -> Option<&Placement> {
        self.placements.get(tile)
    }

    /// Placements of one animation, in row/column order.
    pub fn placements_of<'a>(&'a self, anim: &'a str) -> impl Iterator<Item = (&'a TilePos, &'a Placement)> + 'a {
        self.placements.iter().filter(move |(tile, _)| tile.anim == anim)
    }

    /// Paint a sheet of `size` from per-frame images following this table's
    /// placements for `anim`. `frames[i]` replaces table frame `i`.
    pub fn reassemble(&self, anim: &str, frames: &[RgbaImage], size: (u32, u32)) -> RgbaImage {
        let mut sheet = RgbaImage::from_pixel(size.0, size.1, TRANSPARENT);
        for (_, placement) in self.placements_of(anim) {
            let Some(image) = frames.get(placement.frame) else { continue };
            if placement.mirrored {
                paste(&mut sheet, &mirror(image), placement.bounds.x, placement.bounds.y);
            } else {
                paste(&mut sheet, image, placement.bounds.x, placement.bounds.y);
            }
        }
        sheet
    }

    /// Unique frames in a grid, padded to the largest frame.
    ///
    /// `cols` defaults to a roughly square layout.
    pub fn render_sheet(&self, cols: Option<u32>) -> RgbaImage {
        let images: Vec<&RgbaImage> = self.frames.iter().map(|f| &f.image).collect();
        if images.is_empty() {
            return RgbaImage::from_pixel(1, 1, TRANSPARENT);
        }

        let max_width = images.iter().map(|f| f.width()).max().unwrap_or(1).max(1);
        let max_height = images.iter().map(|f| f.height()).max().unwrap_or(1).max(1);

        let count = images.len() as u32;
        let columns = cols.unwrap_or_else(|| (count as f64).sqrt().ceil() as u32).clamp(1, count);
        let rows = count.div_ceil(columns);

        let mut sheet = RgbaImage::from_pixel(columns * max_width, rows * max_height, TRANSPARENT);
        for (i, frame) in images.iter().enumerate() {
            let col = (i as u32) % columns;
            let row = (i as u32) / columns;
            paste(&mut sheet, frame, col * max_width, row * max_height);
        }
        sheet
    }
}

/// Build the table of one animation sheet with its marker sheets.
pub fn build_frame_table(
    sheet: &RgbaImage,
    offsets: &RgbaImage,
    shadow: &RgbaImage,
    entry: &AnimationDescriptor,
) -> Result<FrameTable, BuilderError> {
    let size = entry.frame_size.ok_or_else(|| BuilderError::AliasEntry(entry.name.clone()))?;
    let mut table = FrameTable::new();
    table.add_sheet(&entry.name, sheet, Some((offsets, shadow)), size)?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const BODY: Rgba<u8> = Rgba([120, 80, 40, 255]);
    const EYE: Rgba<u8> = Rgba([250, 250, 10, 255]);
    const CENTER: Rgba<u8> = Rgba([0, 255, 0, 255]);
    const LEFT: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const RIGHT: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const SHADOW: Rgba<u8> = Rgba([255, 255, 255, 255]);

    /// An asymmetric 3x2 blob at (ox, oy) inside the tile, optionally mirrored.
    fn draw_blob(img: &mut RgbaImage, tx: u32, ty: u32, mirrored: bool) {
        let pixels = [(0, 0, BODY), (1, 0, BODY), (2, 0, EYE), (0, 1, BODY), (1, 1, BODY)];
        for (x, y, c) in pixels {
            let x = if mirrored { 2 - x } else { x };
            img.put_pixel(tx + 2 + x, ty + 3 + y, c);
        }
    }

    struct Sheets {
        anim: RgbaImage,
        offsets: RgbaImage,
        shadow: RgbaImage,
    }

    impl Sheets {
        fn new(cols: u32, rows: u32) -> Self {
            Self {
                anim: RgbaImage::new(cols * 8, rows * 8),
                offsets: RgbaImage::new(cols * 8, rows * 8),
                shadow: RgbaImage::new(cols * 8, rows * 8),
            }
        }

        /// Blob plus center/shadow markers at fixed tile-relative spots.
        fn frame(&mut self, col: u32, row: u32, mirrored: bool) {
            let (tx, ty) = (col * 8, row * 8);
            draw_blob(&mut self.anim, tx, ty, mirrored);
            let cx = if mirrored { 2 + 2 } else { 2 };
            self.offsets.put_pixel(tx + cx, ty + 4, CENTER);
            self.shadow.put_pixel(tx + 3, ty + 6, SHADOW);
        }

        fn table(&self) -> Result<FrameTable, BuilderError> {
            let mut table = FrameTable::new();
            table.add_sheet("Walk", &self.anim, Some((&self.offsets, &self.shadow)), (8, 8))?;
            Ok(table)
        }
    }

    #[test]
    fn test_identical_tiles_share_a_frame() {
        let mut s = Sheets::new(3, 1);
        s.frame(0, 0, false);
        s.frame(1, 0, false);
        s.frame(2, 0, false);
        let table = s.table().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.placements.len(), 3);
        assert!(table.placements.values().all(|p| p.frame == 0 && !p.mirrored));
        assert!(table.ambiguities.is_empty());
    }

    #[test]
    fn test_mirrored_tile_maps_with_flag() {
        let mut s = Sheets::new(2, 1);
        s.frame(0, 0, false);
        s.frame(1, 0, true);
        let table = s.table().unwrap();
        assert_eq!(table.len(), 1);
        let p = table.placement(&TilePos::new("Walk", 0, 1)).unwrap();
        assert_eq!((p.frame, p.mirrored), (0, true));
    }

    #[test]
    fn test_same_pixels_different_markers_is_ambiguity() {
        let mut s = Sheets::new(2, 1);
        s.frame(0, 0, false);
        s.frame(1, 0, false);
        // Move the second tile's center marker.
        s.offsets.put_pixel(8 + 2, 4, TRANSPARENT);
        s.offsets.put_pixel(8 + 3, 4, CENTER);

        let table = s.table().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.ambiguities,
            vec![OffsetAmbiguity { frame: 0, tile: TilePos::new("Walk", 0, 1), mirrored: false }]
        );
    }

    #[test]
    fn test_mirror_swaps_hands_only() {
        let offsets = FrameOffsets {
            head: Some(Point::new(1, 0)),
            left_hand: Some(Point::new(0, 2)),
            right_hand: Some(Point::new(4, 2)),
            center: Some(Point::new(2, 3)),
            shadow: Some(Point::new(2, 5)),
        };
        let m = offsets.mirrored(5);
        assert_eq!(m.head, Some(Point::new(3, 0)));
        assert_eq!(m.left_hand, Some(Point::new(0, 2)));
        assert_eq!(m.right_hand, Some(Point::new(4, 2)));
        assert_eq!(m.center, Some(Point::new(2, 3)));
        assert_eq!(m.mirrored(5), offsets);
    }

    #[test]
    fn test_mirrored_hands_must_trade_places() {
        // Frame with a left hand; its mirror carries the marker as a right hand.
        let mut s = Sheets::new(3, 1);
        s.frame(0, 0, false);
        s.offsets.put_pixel(1, 3, LEFT);
        s.frame(1, 0, true);
        s.offsets.put_pixel(8 + 5, 3, RIGHT);
        // Same mirrored pixels, but the hand keeps its left role.
        s.frame(2, 0, true);
        s.offsets.put_pixel(16 + 5, 3, LEFT);

        let table = s.table().unwrap();
        let second = table.placement(&TilePos::new("Walk", 0, 1)).unwrap();
        assert_eq!((second.frame, second.mirrored), (0, true));
        assert_eq!(table.len(), 2);
        assert_eq!(table.ambiguities.len(), 1);
        assert_eq!(table.ambiguities[0].tile, TilePos::new("Walk", 0, 2));
    }

    #[test]
    fn test_empty_tiles_are_skipped() {
        let mut s = Sheets::new(3, 1);
        s.frame(0, 0, false);
        let table = s.table().unwrap();
        assert_eq!(table.placements.len(), 1);
        assert!(table.placement(&TilePos::new("Walk", 0, 2)).is_none());
    }

    #[test]
    fn test_markers_without_pixels_make_empty_frame() {
        let mut s = Sheets::new(1, 1);
        s.offsets.put_pixel(4, 4, CENTER);
        s.shadow.put_pixel(4, 6, SHADOW);
        let table = s.table().unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.frames[0].image.dimensions(), (0, 0));
        assert_eq!(table.frames[0].offsets.center, Some(Point::new(4, 4)));
    }

    #[test]
    fn test_offsets_relative_to_crop() {
        let mut s = Sheets::new(1, 1);
        s.frame(0, 0, false);
        let table = s.table().unwrap();
        // Blob starts at (2, 3) inside the tile.
        assert_eq!(table.frames[0].offsets.center, Some(Point::new(0, 1)));
        assert_eq!(table.frames[0].offsets.shadow, Some(Point::new(1, 3)));
        assert_eq!(table.placements[&TilePos::new("Walk", 0, 0)].bounds, Rect::new(2, 3, 3, 2));
    }

    #[test]
    fn test_missing_center_marker_is_fatal() {
        let mut s = Sheets::new(1, 1);
        draw_blob(&mut s.anim, 0, 0, false);
        s.shadow.put_pixel(3, 6, SHADOW);
        let err = s.table().unwrap_err();
        assert_eq!(err, BuilderError::MissingMarker { tile: TilePos::new("Walk", 0, 0), role: MarkerRole::Center });
    }

    #[test]
    fn test_missing_shadow_marker_is_fatal() {
        let mut s = Sheets::new(1, 1);
        draw_blob(&mut s.anim, 0, 0, false);
        s.offsets.put_pixel(2, 4, CENTER);
        let err = s.table().unwrap_err();
        assert!(matches!(err, BuilderError::MissingMarker { role: MarkerRole::Shadow, .. }));
    }

    #[test]
    fn test_duplicate_marker_is_fatal() {
        let mut s = Sheets::new(1, 1);
        s.frame(0, 0, false);
        s.offsets.put_pixel(6, 6, CENTER);
        assert!(matches!(s.table().unwrap_err(), BuilderError::Marker { .. }));
    }

    #[test]
    fn test_not_divisible() {
        let sheet = RgbaImage::new(100, 24);
        let mut table = FrameTable::new();
        let err = table.add_sheet("Idle", &sheet, None, (24, 24)).unwrap_err();
        assert!(matches!(err, BuilderError::NotDivisible { width: 100, .. }));
    }

    #[test]
    fn test_auxiliary_size_mismatch() {
        let sheet = RgbaImage::new(16, 8);
        let small = RgbaImage::new(8, 8);
        let mut table = FrameTable::new();
        let err = table.add_sheet("Walk", &sheet, Some((&small, &sheet)), (8, 8)).unwrap_err();
        assert!(matches!(err, BuilderError::SheetSizeMismatch { kind: SheetKind::Offsets, .. }));
    }

    #[test]
    fn test_left_rows_flag_mirror_of_missing_original() {
        let mut s = Sheets::new(1, 8);
        // Only the Left row (6) is drawn.
        s.frame(0, 6, false);
        let table = s.table().unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.frames[0].mirror_of_missing_original);
    }

    #[test]
    fn test_build_is_deterministic() {
        let mut s = Sheets::new(4, 1);
        s.frame(0, 0, false);
        s.frame(1, 0, true);
        s.frame(3, 0, false);
        assert_eq!(s.table().unwrap(), s.table().unwrap());
    }

    #[test]
    fn test_find_ignores_markers() {
        let mut s = Sheets::new(1, 1);
        s.frame(0, 0, false);
        let table = s.table().unwrap();
        let mut blob = RgbaImage::new(8, 8);
        draw_blob(&mut blob, 0, 0, true);
        let cropped = crop(&blob, tight_bounds(&blob, Rect::of_image(&blob)));
        assert_eq!(table.find(&cropped), Some((0, true)));
    }

    #[test]
    fn test_reassemble_restores_sheet() {
        let mut s = Sheets::new(3, 1);
        s.frame(0, 0, false);
        s.frame(2, 0, true);
        let table = s.table().unwrap();
        let images: Vec<RgbaImage> = table.frames.iter().map(|f| f.image.clone()).collect();
        assert_eq!(table.reassemble("Walk", &images, s.anim.dimensions()), s.anim);
    }

    #[test]
    fn test_render_sheet_grid() {
        let mut s = Sheets::new(2, 1);
        s.frame(0, 0, false);
        draw_blob(&mut s.anim, 8, 0, false);
        s.anim.put_pixel(8 + 4, 4, EYE);
        s.offsets.put_pixel(8 + 2, 4, CENTER);
        s.shadow.put_pixel(8 + 3, 6, SHADOW);
        let table = s.table().unwrap();
        assert_eq!(table.len(), 2);
        let grid = table.render_sheet(None);
        assert_eq!(grid.dimensions(), (6, 2));
    }

    #[test]
    fn test_alias_entry_has_no_table() {
        let entry = AnimationDescriptor::alias("EventSleep", "Sleep");
        let img = RgbaImage::new(8, 8);
        assert_eq!(
            build_frame_table(&img, &img, &img, &entry).unwrap_err(),
            BuilderError::AliasEntry("EventSleep".to_string())
        );
    }
}
