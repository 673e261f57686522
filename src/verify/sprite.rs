//! Sprite archive verification, fresh and recolor

use image::RgbaImage;
use std::collections::BTreeMap;

use crate::descriptor::{AnimDescriptor, AnimationDescriptor};
use crate::frames::FrameTable;
use crate::geometry::TRANSPARENT;
use crate::palette::{palette, Color, PaletteScan};
use crate::quantize::quantize_preview;
use crate::registry::{AnimRegistry, Direction};
use crate::sprite::{SheetKind, SpriteSet};

use super::outcome::{join_findings, summarize_positions};
use super::{reject_semi_transparent, AckFlags, FailureKind, SpriteRules, ValidationFailure, POSITION_LIMIT};

/// Verify a new sprite archive on its own.
///
/// Returns notes on the acknowledgements that were needed.
pub fn verify_sprite(bytes: &[u8], flags: &AckFlags, rules: &SpriteRules) -> Result<Vec<String>, ValidationFailure> {
    let set = SpriteSet::from_zip(bytes, &rules.registry)?;
    let mut notes = Vec::new();

    check_required(&set.descriptor, &rules.registry)?;
    check_structure(&set)?;

    let scans = scan_sheets(&set);
    reject_semi_transparent(scans.iter().map(|(name, scan)| (name.as_str(), scan)))?;

    let table = FrameTable::from_sprite(&set, true)?;
    if !table.ambiguities.is_empty() {
        let findings: Vec<String> = table
            .ambiguities
            .iter()
            .map(|a| {
                let origin = &table.frames[a.frame].origin;
                let how = if a.mirrored { "a mirror of" } else { "identical to" };
                format!("{} is {} {} but its markers differ", a.tile, how, origin)
            })
            .collect();
        if !flags.multioffset {
            return Err(ValidationFailure::new(
                FailureKind::OffsetAmbiguity,
                format!(
                    "Identical frames with different offsets; add `multioffset` if intended:{}",
                    join_findings(&findings)
                ),
            ));
        }
        notes.push(format!("acknowledged {} offset ambiguities", findings.len()));
    }

    let colors = anim_palette(&set);
    if let Some(note) = check_palette_cap(&colors, flags, rules, || table.render_sheet(None))? {
        notes.push(note);
    }

    log::info!(
        "sprite accepted: {} animations, {} unique frames, {} colors",
        set.descriptor.animations().len(),
        table.len(),
        colors.len()
    );
    Ok(notes)
}

/// Verify a recolor against the original it was derived from.
///
/// Only Anim sheet colors may differ. Returns the animations that changed.
pub fn verify_sprite_recolor(
    original: &[u8],
    submission: &[u8],
    flags: &AckFlags,
    rules: &SpriteRules,
) -> Result<Vec<String>, ValidationFailure> {
    let original = SpriteSet::from_zip(original, &rules.registry)?;
    let set = SpriteSet::from_zip(submission, &rules.registry)?;

    check_required(&set.descriptor, &rules.registry)?;
    check_structure(&set)?;
    check_auxiliary_unchanged(&original, &set)?;

    let scans = scan_sheets(&set);
    reject_semi_transparent(scans.iter().map(|(name, scan)| (name.as_str(), scan)))?;

    let mut silhouette = Vec::new();
    let mut line_art = Vec::new();
    let mut size_changes = Vec::new();
    let mut changed = Vec::new();
    let mut silhouette_preview: Option<(String, RgbaImage)> = None;

    for anim in set.descriptor.concrete() {
        let (Some(before), Some(after)) =
            (original.sheet(&anim.name, SheetKind::Anim), set.sheet(&anim.name, SheetKind::Anim))
        else {
            continue;
        };
        if before.dimensions() != after.dimensions() {
            size_changes.push(format!(
                "{}: {}x{} became {}x{}",
                anim.name,
                before.width(),
                before.height(),
                after.width(),
                after.height()
            ));
            continue;
        }

        let diff = diff_pixels(before, after);
        if !diff.silhouette.is_empty() {
            silhouette.push(format!("{}: {}", anim.name, summarize_positions(&diff.silhouette, POSITION_LIMIT)));
            if silhouette_preview.is_none() {
                silhouette_preview = Some((anim.name.clone(), highlight(after, &diff.silhouette)));
            }
        }
        if !diff.line_art.is_empty() {
            line_art.push(format!("{}: {}", anim.name, summarize_positions(&diff.line_art, POSITION_LIMIT)));
        }
        if diff.changed {
            changed.push(anim.name.clone());
        }
    }

    if !size_changes.is_empty() {
        return Err(ValidationFailure::new(
            FailureKind::Dimensions,
            format!("Recolor sheets must keep the original size:{}", join_findings(&size_changes)),
        ));
    }
    if let Some((anim, preview)) = silhouette_preview {
        log::debug!("silhouette preview rendered from {}", anim);
        return Err(ValidationFailure::new(
            FailureKind::Silhouette,
            format!("Recolor changes the transparency of the original:{}", join_findings(&silhouette)),
        )
        .with_preview(preview));
    }

    let mut notes = Vec::new();
    if !line_art.is_empty() {
        if !flags.lineart {
            return Err(ValidationFailure::new(
                FailureKind::LineArt,
                format!("Recolor changes black outlines; add `lineart` if intended:{}", join_findings(&line_art)),
            ));
        }
        notes.push("acknowledged outline changes".to_string());
    }

    let before_colors = anim_palette(&original);
    let colors = anim_palette(&set);
    if let Some(note) = check_color_delta(before_colors.len(), colors.len(), flags)? {
        notes.push(note);
    }
    let table = FrameTable::from_sprite(&set, false)?;
    if let Some(note) = check_palette_cap(&colors, flags, rules, || table.render_sheet(None))? {
        notes.push(note);
    }

    log::info!("recolor accepted: {} of {} animations changed", changed.len(), set.descriptor.concrete().count());
    changed.extend(notes);
    Ok(changed)
}

/// Check one animation's sheet size against its descriptor entry.
///
/// Returns every problem found, not just the first.
pub fn check_sheet_layout(entry: &AnimationDescriptor, sheet_size: (u32, u32)) -> Result<(), Vec<String>> {
    let mut problems = Vec::new();
    let Some((fw, fh)) = entry.frame_size else {
        return Err(vec![format!("{} has no frame size", entry.name)]);
    };
    let (width, height) = sheet_size;

    if width % fw != 0 || height % fh != 0 {
        problems.push(format!(
            "{}: {}x{} sheet is not divisible by frame size {}x{}",
            entry.name, width, height, fw, fh
        ));
        return Err(problems);
    }

    let columns = width / fw;
    let rows = height / fh;
    if columns as usize != entry.durations.len() {
        problems.push(format!(
            "{}: {} frame columns but {} durations",
            entry.name,
            columns,
            entry.durations.len()
        ));
    }
    if rows != 1 && rows != Direction::ALL.len() as u32 {
        problems.push(format!("{}: {} direction rows, expected 1 or 8", entry.name, rows));
    }
    for (field, frame) in entry.frame_events() {
        if frame as usize >= entry.durations.len() {
            problems.push(format!(
                "{}: {} {} is past the last frame ({})",
                entry.name,
                field,
                frame,
                entry.durations.len()
            ));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

/// Every tier-0 animation must be listed, by name or as a copy.
fn check_required(descriptor: &AnimDescriptor, registry: &AnimRegistry) -> Result<(), ValidationFailure> {
    let missing: Vec<&str> =
        registry.required().iter().filter(|name| !descriptor.contains(name)).map(String::as_str).collect();
    if missing.is_empty() {
        return Ok(());
    }
    Err(ValidationFailure::new(
        FailureKind::MissingAnimation,
        format!("Missing required animations: {}", missing.join(", ")),
    ))
}

/// Sheet presence, matching sizes and descriptor consistency for every
/// concrete animation, plus PNG files that belong to none.
fn check_structure(set: &SpriteSet) -> Result<(), ValidationFailure> {
    let mut problems = Vec::new();

    for anim in set.descriptor.concrete() {
        let sheets: Vec<(SheetKind, Option<&RgbaImage>)> =
            SheetKind::ALL.iter().map(|kind| (*kind, set.sheet(&anim.name, *kind))).collect();

        let missing: Vec<String> =
            sheets.iter().filter(|(_, s)| s.is_none()).map(|(k, _)| k.file_name(&anim.name)).collect();
        if !missing.is_empty() {
            problems.push(format!("{}: missing {}", anim.name, missing.join(", ")));
            continue;
        }

        let sizes: Vec<(SheetKind, (u32, u32))> =
            sheets.iter().filter_map(|(k, s)| s.map(|s| (*k, s.dimensions()))).collect();
        let anim_size = sizes[0].1;
        let mismatched: Vec<String> = sizes
            .iter()
            .filter(|(_, size)| *size != anim_size)
            .map(|(kind, (w, h))| format!("{} is {}x{}", kind.file_name(&anim.name), w, h))
            .collect();
        if !mismatched.is_empty() {
            problems.push(format!(
                "{}: sheets differ in size from {}x{}: {}",
                anim.name,
                anim_size.0,
                anim_size.1,
                mismatched.join(", ")
            ));
            continue;
        }

        if let Err(found) = check_sheet_layout(anim, anim_size) {
            problems.extend(found);
        }
    }

    for stray in set.stray_sheets() {
        problems.push(format!("{} does not belong to any listed animation", stray));
    }

    if problems.is_empty() {
        return Ok(());
    }
    Err(ValidationFailure::new(FailureKind::Layout, format!("Sheet layout problems:{}", join_findings(&problems))))
}

/// Everything except Anim sheet colors must match the original exactly.
fn check_auxiliary_unchanged(original: &SpriteSet, set: &SpriteSet) -> Result<(), ValidationFailure> {
    let mut changed = Vec::new();

    if original.descriptor_bytes != set.descriptor_bytes {
        changed.push(crate::descriptor::DESCRIPTOR_FILE.to_string());
    }

    let names = original.files().keys().chain(set.files().keys());
    let mut seen = std::collections::BTreeSet::new();
    for name in names {
        if seen.insert(name) && original.files().get(name) != set.files().get(name) {
            changed.push(name.clone());
        }
    }

    let sheet_names = original.sheets().keys().chain(set.sheets().keys());
    let mut seen = std::collections::BTreeSet::new();
    for name in sheet_names {
        if !seen.insert(name) {
            continue;
        }
        let is_anim = matches!(SheetKind::parse_file_name(name), Some((_, SheetKind::Anim)));
        let (before, after) = (original.sheets().get(name), set.sheets().get(name));
        let differs = match (before, after) {
            (Some(b), Some(a)) => !is_anim && b != a,
            _ => true,
        };
        if differs {
            changed.push(name.clone());
        }
    }

    if changed.is_empty() {
        return Ok(());
    }
    Err(ValidationFailure::new(
        FailureKind::AuxiliaryChanged,
        format!("A recolor may only change Anim sheet colors; these files differ: {}", changed.join(", ")),
    ))
}

/// Palette scans of every sheet, by file name.
fn scan_sheets(set: &SpriteSet) -> BTreeMap<String, PaletteScan> {
    set.sheets().iter().map(|(name, img)| (name.clone(), palette(img))).collect()
}

/// Combined opaque palette of all Anim sheets.
fn anim_palette(set: &SpriteSet) -> PaletteScan {
    let mut total = PaletteScan::default();
    for (_, sheet) in set.anim_sheets() {
        total.absorb(&palette(sheet));
    }
    total
}

/// Over the cap needs `colors` equal to the exact count.
pub(super) fn check_palette_cap(
    colors: &PaletteScan,
    flags: &AckFlags,
    rules: &SpriteRules,
    preview_source: impl FnOnce() -> RgbaImage,
) -> Result<Option<String>, ValidationFailure> {
    let count = colors.len();
    if count <= rules.max_colors {
        return Ok(None);
    }
    if flags.colors == Some(count) {
        return Ok(Some(format!("acknowledged {} colors", count)));
    }
    let preview = quantize_preview(&preview_source(), rules.max_colors + 1);
    Err(ValidationFailure::new(
        FailureKind::PaletteOverflow,
        format!(
            "Sprite uses {} colors, over the limit of {}; add `colors={}` if intended",
            count, rules.max_colors, count
        ),
    )
    .with_preview(preview))
}

/// A nonzero change in palette size must be declared exactly.
pub(super) fn check_color_delta(
    before: usize,
    after: usize,
    flags: &AckFlags,
) -> Result<Option<String>, ValidationFailure> {
    let delta = after as i64 - before as i64;
    if delta == 0 {
        return Ok(None);
    }
    if flags.colormod as i64 == delta {
        return Ok(Some(format!("acknowledged color count change of {:+}", delta)));
    }
    Err(ValidationFailure::new(
        FailureKind::ColorDelta,
        format!(
            "Recolor has {} colors where the original has {}; add `colormod={}` if intended",
            after, before, delta
        ),
    ))
}

/// Per-pixel classification of an original/recolor pair.
#[derive(Debug, Default)]
pub(super) struct PixelDiff {
    pub silhouette: Vec<(u32, u32)>,
    pub line_art: Vec<(u32, u32)>,
    pub changed: bool,
}

pub(super) fn diff_pixels(before: &RgbaImage, after: &RgbaImage) -> PixelDiff {
    let mut diff = PixelDiff::default();
    for (x, y, b) in before.enumerate_pixels() {
        let a = after.get_pixel(x, y);
        if a == b {
            continue;
        }
        diff.changed = true;
        let (b, a) = (Color::from_rgba(*b), Color::from_rgba(*a));
        if b.is_transparent() != a.is_transparent() {
            diff.silhouette.push((x, y));
        } else if b.is_line_art() != a.is_line_art() {
            diff.line_art.push((x, y));
        }
    }
    diff
}

/// Dim the image and paint the listed pixels in magenta.
pub(super) fn highlight(image: &RgbaImage, positions: &[(u32, u32)]) -> RgbaImage {
    let mut out = RgbaImage::from_pixel(image.width(), image.height(), TRANSPARENT);
    for (x, y, p) in image.enumerate_pixels() {
        if p[3] > 0 {
            out.put_pixel(x, y, image::Rgba([p[0] / 3, p[1] / 3, p[2] / 3, 255]));
        }
    }
    for &(x, y) in positions {
        if x < out.width() && y < out.height() {
            out.put_pixel(x, y, image::Rgba([255, 0, 255, 255]));
        }
    }
    out
}
