//! Draft recolors from a known original/recolor pair
//!
//! A previous original and its accepted recolor teach a color mapping.
//! Frames of the new source art that the previous original already had
//! reuse the accepted recolor pixels verbatim and vote for the mapping;
//! everything else goes through the resulting substitution table. Nothing
//! here rejects; colors the table can't decide on are reported so a human
//! can fix them.

use image::RgbaImage;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::frames::{BuilderError, FrameTable};
use crate::geometry::{crop, images_equal, mirror, paste};
use crate::palette::{palette, palette_in, Color, PaletteScan};
use crate::portrait::PortraitSheet;
use crate::registry::PortraitLayout;
use crate::sprite::{SheetKind, SpriteSet};

/// Source color -> target candidates, most voted first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorSubstitutionTable {
    entries: BTreeMap<Color, Vec<(Color, u32)>>,
}

impl ColorSubstitutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Vote with every co-located opaque pixel of two images.
    ///
    /// Only the overlapping area counts. Pixels that are transparent on
    /// either side carry no color information and are skipped.
    pub fn vote_images(&mut self, source: &RgbaImage, target: &RgbaImage) {
        let width = source.width().min(target.width());
        let height = source.height().min(target.height());
        let mut votes: BTreeMap<(Color, Color), u32> = BTreeMap::new();
        for y in 0..height {
            for x in 0..width {
                let from = Color::from_rgba(*source.get_pixel(x, y));
                let to = Color::from_rgba(*target.get_pixel(x, y));
                if from.is_opaque() && to.is_opaque() {
                    *votes.entry((from, to)).or_insert(0) += 1;
                }
            }
        }
        for ((from, to), count) in votes {
            self.vote(from, to, count);
        }
    }

    /// Add `count` votes for `from -> to`.
    pub fn vote(&mut self, from: Color, to: Color, count: u32) {
        let candidates = self.entries.entry(from).or_default();
        match candidates.iter_mut().find(|(c, _)| *c == to) {
            Some((_, n)) => *n += count,
            None => candidates.push((to, count)),
        }
        // Count descending; color breaks ties so output is stable.
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    }

    pub fn candidates(&self, from: Color) -> &[(Color, u32)] {
        self.entries.get(&from).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Top-voted target; identity when the color was never seen.
    pub fn map(&self, from: Color) -> Color {
        self.candidates(from).first().map_or(from, |(to, _)| *to)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Undecided colors among `used`, in color order.
    pub fn ambiguities<'a>(&self, used: impl IntoIterator<Item = &'a Color>) -> Vec<Ambiguity> {
        used.into_iter()
            .filter_map(|source| match self.candidates(*source) {
                [] => Some(Ambiguity::Unmapped { source: *source }),
                [_] => None,
                many => Some(Ambiguity::Conflicting { source: *source, candidates: many.to_vec() }),
            })
            .collect()
    }

    /// Recolor every opaque pixel; anything else is left alone.
    pub fn apply(&self, image: &RgbaImage) -> RgbaImage {
        let mut out = image.clone();
        for pixel in out.pixels_mut() {
            let color = Color::from_rgba(*pixel);
            if color.is_opaque() {
                *pixel = self.map(color).to_rgba();
            }
        }
        out
    }
}

/// A source color the table can't map with confidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ambiguity {
    /// Several targets were voted for; the first one was used.
    Conflicting { source: Color, candidates: Vec<(Color, u32)> },
    /// Never seen in the known pair; kept unchanged.
    Unmapped { source: Color },
}

impl fmt::Display for Ambiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ambiguity::Conflicting { source, candidates } => {
                write!(f, "{} maps to several colors:", source)?;
                for (color, votes) in candidates {
                    write!(f, " {} ({})", color, votes)?;
                }
                Ok(())
            }
            Ambiguity::Unmapped { source } => write!(f, "{} has no known recolor, left unchanged", source),
        }
    }
}

/// Acknowledgements a manual resubmission of the draft would need.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuggestedFlags {
    /// Palette size change from the current original
    pub colormod: i32,
    /// Set when a sprite palette goes over the cap
    pub colors: Option<usize>,
    /// Set when a portrait tile goes over the cap
    pub overcolor: bool,
}

impl SuggestedFlags {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for SuggestedFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.colormod != 0 {
            parts.push(format!("colormod={}", self.colormod));
        }
        if let Some(colors) = self.colors {
            parts.push(format!("colors={}", colors));
        }
        if self.overcolor {
            parts.push("overcolor".to_string());
        }
        f.write_str(&parts.join(" "))
    }
}

/// Best-effort recolor plus what a reviewer should look at.
#[derive(Debug, Clone, PartialEq)]
pub struct RecolorDraft<T> {
    pub output: T,
    pub ambiguities: Vec<Ambiguity>,
    pub suggested: SuggestedFlags,
    /// Frames (or tiles) copied from the accepted recolor
    pub reused_frames: usize,
    /// Frames (or tiles) recolored through the table
    pub mapped_frames: usize,
}

fn combined_palette<'a>(images: impl IntoIterator<Item = &'a RgbaImage>) -> PaletteScan {
    let mut scan = PaletteScan::default();
    for image in images {
        scan.absorb(&palette(image));
    }
    scan
}

/// Recolor `current` the way `previous_recolor` recolors `previous`.
///
/// Offsets and Shadow sheets, the descriptor and any other files come
/// straight from `current`; only Anim sheets are rewritten.
pub fn synthesize_sprite_recolor(
    previous: &SpriteSet,
    previous_recolor: &SpriteSet,
    current: &SpriteSet,
    max_colors: usize,
) -> Result<RecolorDraft<SpriteSet>, BuilderError> {
    let known = FrameTable::from_sprite(previous, false)?;
    let fresh = FrameTable::from_sprite(current, false)?;

    // Only frames the current original shares with the previous one vote.
    let mut table = ColorSubstitutionTable::new();
    let reused: Vec<Option<RgbaImage>> =
        fresh.frames.iter().map(|frame| reuse_frame(&known, previous_recolor, &frame.image)).collect();
    for (frame, pixels) in fresh.frames.iter().zip(&reused) {
        if let Some(pixels) = pixels {
            table.vote_images(&frame.image, pixels);
        }
    }

    let reused_frames = reused.iter().filter(|r| r.is_some()).count();
    let mapped_frames = fresh.len() - reused_frames;
    let recolored: Vec<RgbaImage> = fresh
        .frames
        .iter()
        .zip(reused)
        .map(|(frame, pixels)| pixels.unwrap_or_else(|| table.apply(&frame.image)))
        .collect();

    let mut output = current.clone();
    for (anim, sheet) in current.anim_sheets() {
        output.insert_sheet(anim, SheetKind::Anim, fresh.reassemble(anim, &recolored, sheet.dimensions()));
    }

    let before = combined_palette(current.anim_sheets().map(|(_, img)| img));
    let after = combined_palette(output.anim_sheets().map(|(_, img)| img));
    let suggested = SuggestedFlags {
        colormod: after.len() as i32 - before.len() as i32,
        colors: (after.len() > max_colors).then_some(after.len()),
        overcolor: false,
    };
    let ambiguities = table.ambiguities(before.colors.keys());

    log::info!(
        "sprite recolor draft: {} frames reused, {} mapped, {} ambiguous colors",
        reused_frames,
        mapped_frames,
        ambiguities.len()
    );
    Ok(RecolorDraft { output, ambiguities, suggested, reused_frames, mapped_frames })
}

/// The accepted recolor of a frame the previous original already had.
fn reuse_frame(known: &FrameTable, recolor: &SpriteSet, image: &RgbaImage) -> Option<RgbaImage> {
    let (index, mirrored) = known.find(image)?;
    let origin = &known.frames[index].origin;
    let bounds = known.placement(origin)?.bounds;
    let sheet = recolor.sheet(&origin.anim, SheetKind::Anim)?;
    let pixels = crop(sheet, bounds);
    if pixels.dimensions() != image.dimensions() {
        return None;
    }
    Some(if mirrored { mirror(&pixels) } else { pixels })
}

/// Portrait counterpart of [`synthesize_sprite_recolor`].
///
/// Votes come from the whole sheet. A present tile equal to one of the
/// previous original's tiles, directly or mirrored, takes the matching
/// recolor tile as is.
pub fn synthesize_portrait_recolor(
    previous: &RgbaImage,
    previous_recolor: &RgbaImage,
    current: &RgbaImage,
    layout: &PortraitLayout,
    max_colors: usize,
) -> RecolorDraft<RgbaImage> {
    let mut table = ColorSubstitutionTable::new();
    table.vote_images(previous, previous_recolor);

    let known = PortraitSheet::new(previous, layout).frames();
    let sheet = PortraitSheet::new(current, layout);

    let mut output = table.apply(current);
    let mut reused_frames = 0;
    let mut mapped_frames = 0;
    for tile in sheet.frames() {
        let found = known.iter().find_map(|prior| {
            [false, true]
                .into_iter()
                .find(|m| images_equal(&prior.image, &tile.image, *m))
                .map(|m| (prior.rect, m))
        });
        let reused = found.and_then(|(rect, mirrored)| {
            let pixels = crop(previous_recolor, rect);
            (pixels.dimensions() == tile.image.dimensions())
                .then(|| if mirrored { mirror(&pixels) } else { pixels })
        });
        match reused {
            Some(pixels) => {
                paste(&mut output, &pixels, tile.rect.x, tile.rect.y);
                reused_frames += 1;
            }
            None => mapped_frames += 1,
        }
    }

    let before = palette(current);
    let after = PortraitSheet::new(&output, layout);
    let overcolor = after.present().into_iter().any(|(e, f)| palette_in(&output, after.tile_rect(e, f)).len() > max_colors);
    let suggested = SuggestedFlags {
        colormod: palette(&output).len() as i32 - before.len() as i32,
        colors: None,
        overcolor,
    };
    let used: BTreeSet<Color> = before.colors.keys().copied().collect();
    let ambiguities = table.ambiguities(&used);

    log::info!(
        "portrait recolor draft: {} tiles reused, {} mapped, {} ambiguous colors",
        reused_frames,
        mapped_frames,
        ambiguities.len()
    );
    RecolorDraft { output, ambiguities, suggested, reused_frames, mapped_frames }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const RED: Color = Color { r: 200, g: 0, b: 0, a: 255 };
    const GOLD: Color = Color { r: 230, g: 200, b: 0, a: 255 };
    const BLUE: Color = Color { r: 0, g: 0, b: 200, a: 255 };

    #[test]
    fn test_votes_sorted_by_count() {
        let mut table = ColorSubstitutionTable::new();
        table.vote(RED, BLUE, 2);
        table.vote(RED, GOLD, 5);
        table.vote(RED, BLUE, 1);
        assert_eq!(table.candidates(RED), &[(GOLD, 5), (BLUE, 3)]);
        assert_eq!(table.map(RED), GOLD);
    }

    #[test]
    fn test_unseen_color_maps_to_itself() {
        let table = ColorSubstitutionTable::new();
        assert_eq!(table.map(BLUE), BLUE);
        assert_eq!(table.ambiguities(&[BLUE]), vec![Ambiguity::Unmapped { source: BLUE }]);
    }

    #[test]
    fn test_conflicting_votes_reported() {
        let mut table = ColorSubstitutionTable::new();
        table.vote(RED, GOLD, 4);
        table.vote(RED, BLUE, 1);
        table.vote(BLUE, BLUE, 9);
        let report = table.ambiguities(&[RED, BLUE]);
        assert_eq!(report.len(), 1);
        assert!(matches!(&report[0], Ambiguity::Conflicting { source, .. } if *source == RED));
        assert!(report[0].to_string().contains("#C80000"));
    }

    #[test]
    fn test_vote_images_skips_transparency() {
        let mut a = RgbaImage::new(2, 1);
        let mut b = RgbaImage::new(2, 1);
        a.put_pixel(0, 0, RED.to_rgba());
        b.put_pixel(0, 0, GOLD.to_rgba());
        a.put_pixel(1, 0, BLUE.to_rgba());
        let mut table = ColorSubstitutionTable::new();
        table.vote_images(&a, &b);
        assert_eq!(table.len(), 1);
        assert_eq!(table.map(RED), GOLD);
    }

    #[test]
    fn test_apply_keeps_transparent_pixels() {
        let mut table = ColorSubstitutionTable::new();
        table.vote(RED, GOLD, 1);
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, RED.to_rgba());
        let out = table.apply(&img);
        assert_eq!(*out.get_pixel(0, 0), GOLD.to_rgba());
        assert_eq!(*out.get_pixel(1, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_suggested_flags_display() {
        let flags = SuggestedFlags { colormod: -2, colors: Some(17), overcolor: false };
        assert_eq!(flags.to_string(), "colormod=-2 colors=17");
        assert!(SuggestedFlags::default().is_empty());
    }

    fn portrait(tiles: &[(usize, bool, Color)]) -> RgbaImage {
        let layout = PortraitLayout::standard();
        let mut img = RgbaImage::new(200, 320);
        for (e, f, color) in tiles {
            let rect = layout.tile_rect(layout.slot(*e, *f));
            for y in rect.y..rect.bottom() {
                for x in rect.x..rect.right() {
                    let shade = if x == rect.x { Color::BLACK } else { *color };
                    img.put_pixel(x, y, shade.to_rgba());
                }
            }
        }
        img
    }

    #[test]
    fn test_portrait_tile_reuse_and_mapping() {
        let layout = PortraitLayout::standard();
        let previous = portrait(&[(0, false, RED)]);
        let previous_recolor = portrait(&[(0, false, GOLD)]);
        // Normal is unchanged, Happy is new art in the same colors.
        let mut current = portrait(&[(0, false, RED), (1, false, RED)]);
        current.put_pixel(50, 5, Color::BLACK.to_rgba());

        let draft = synthesize_portrait_recolor(&previous, &previous_recolor, &current, &layout, 15);
        assert_eq!(draft.reused_frames, 1);
        assert_eq!(draft.mapped_frames, 1);
        assert!(draft.ambiguities.is_empty());
        assert_eq!(*draft.output.get_pixel(45, 10), GOLD.to_rgba());
        assert_eq!(*draft.output.get_pixel(50, 5), Color::BLACK.to_rgba());
        assert_eq!(*draft.output.get_pixel(5, 5), GOLD.to_rgba());
        assert!(draft.suggested.is_empty());
    }

    #[test]
    fn test_portrait_unmapped_color() {
        let layout = PortraitLayout::standard();
        let previous = portrait(&[(0, false, RED)]);
        let current = portrait(&[(0, false, BLUE)]);
        let draft = synthesize_portrait_recolor(&previous, &previous, &current, &layout, 15);
        assert_eq!(draft.ambiguities, vec![Ambiguity::Unmapped { source: BLUE }]);
        assert_eq!(draft.output, current);
    }
}
