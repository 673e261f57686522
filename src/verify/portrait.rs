//! Portrait sheet verification, fresh and recolor

use image::RgbaImage;

use crate::geometry::{crop, paste};
use crate::palette::{palette, palette_in};
use crate::portrait::{Occupancy, PortraitSheet};
use crate::quantize::quantize_preview;

use super::outcome::join_findings;
use super::sprite::{check_color_delta, diff_pixels, highlight};
use super::{reject_semi_transparent, AckFlags, FailureKind, PortraitRules, ValidationFailure};

/// Verify a new portrait sheet on its own.
pub fn verify_portrait(image: &RgbaImage, flags: &AckFlags, rules: &PortraitRules) -> Result<(), ValidationFailure> {
    let sheet = PortraitSheet::new(image, &rules.layout);
    check_dimensions(&sheet)?;

    let scan = palette(image);
    reject_semi_transparent([("portrait", &scan)])?;
    check_tiles(&sheet)?;
    check_flip_originals(&sheet)?;
    check_tile_colors(&sheet, flags, rules.max_colors)?;
    check_flip_complete(&sheet, flags)?;

    log::info!("portrait accepted: {} tiles", sheet.present().len());
    Ok(())
}

/// Verify a portrait recolor against its original.
///
/// Silhouette must be identical; the palette size change must be declared
/// with `colormod`; every tile stays under the per-tile cap.
pub fn verify_portrait_recolor(
    original: &RgbaImage,
    image: &RgbaImage,
    flags: &AckFlags,
    rules: &PortraitRules,
) -> Result<(), ValidationFailure> {
    let sheet = PortraitSheet::new(image, &rules.layout);
    check_dimensions(&PortraitSheet::new(original, &rules.layout))?;
    check_dimensions(&sheet)?;

    let scan = palette(image);
    reject_semi_transparent([("portrait", &scan)])?;

    let diff = diff_pixels(original, image);
    if !diff.silhouette.is_empty() {
        let tiles: Vec<String> = rules
            .layout
            .tiles()
            .filter(|(e, f)| {
                let rect = sheet.tile_rect(*e, *f);
                diff.silhouette.iter().any(|(x, y)| {
                    *x >= rect.x && *x < rect.right() && *y >= rect.y && *y < rect.bottom()
                })
            })
            .map(|(e, f)| rules.layout.tile_name(e, f))
            .collect();
        return Err(ValidationFailure::new(
            FailureKind::Silhouette,
            format!(
                "Recolor changes the transparency of the original in {} pixels: {}",
                diff.silhouette.len(),
                tiles.join(", ")
            ),
        )
        .with_preview(highlight(image, &diff.silhouette)));
    }

    check_color_delta(palette(original).len(), scan.len(), flags)?;
    check_tile_colors(&sheet, flags, rules.max_colors)?;
    Ok(())
}

fn check_dimensions(sheet: &PortraitSheet<'_>) -> Result<(), ValidationFailure> {
    if sheet.has_expected_size() {
        return Ok(());
    }
    let (w, h) = sheet.layout.sheet_size();
    Err(ValidationFailure::new(
        FailureKind::Dimensions,
        format!("Portrait sheet is {}x{}, expected {}x{}", sheet.image.width(), sheet.image.height(), w, h),
    ))
}

/// Tiles must be fully painted or fully empty; padding slots stay empty.
fn check_tiles(sheet: &PortraitSheet<'_>) -> Result<(), ValidationFailure> {
    let padding = sheet.painted_padding();
    if !padding.is_empty() {
        let slots: Vec<String> = padding.iter().map(|s| sheet.layout.tile_rect(*s).to_string()).collect();
        return Err(ValidationFailure::new(
            FailureKind::Layout,
            format!("Unused tile slots contain pixels: {}", slots.join(", ")),
        ));
    }

    let partial: Vec<String> = sheet
        .layout
        .tiles()
        .filter_map(|(e, f)| match sheet.occupancy(e, f) {
            Occupancy::Partial(holes) => {
                Some(format!("{}: {} transparent pixels", sheet.layout.tile_name(e, f), holes.len()))
            }
            _ => None,
        })
        .collect();
    if partial.is_empty() {
        return Ok(());
    }
    Err(ValidationFailure::new(
        FailureKind::PartialTile,
        format!("Portrait tiles must be fully opaque:{}", join_findings(&partial)),
    ))
}

/// A flipped tile can't exist without the tile it mirrors.
fn check_flip_originals(sheet: &PortraitSheet<'_>) -> Result<(), ValidationFailure> {
    let orphans: Vec<String> = (0..sheet.layout.emotion_count())
        .filter(|e| sheet.is_present(*e, true) && !sheet.is_present(*e, false))
        .map(|e| sheet.layout.tile_name(e, true))
        .collect();
    if orphans.is_empty() {
        return Ok(());
    }
    Err(ValidationFailure::new(
        FailureKind::FlipWithoutOriginal,
        format!("Flipped portraits without an original: {}", orphans.join(", ")),
    ))
}

/// Once any flipped tile exists, every original needs its flip.
fn check_flip_complete(sheet: &PortraitSheet<'_>, flags: &AckFlags) -> Result<(), ValidationFailure> {
    let n = sheet.layout.emotion_count();
    if !(0..n).any(|e| sheet.is_present(e, true)) {
        return Ok(());
    }
    let missing: Vec<String> = (0..n)
        .filter(|e| sheet.is_present(*e, false) && !sheet.is_present(*e, true))
        .map(|e| sheet.layout.tile_name(e, true))
        .collect();
    if missing.is_empty() || flags.noflip {
        return Ok(());
    }
    Err(ValidationFailure::new(
        FailureKind::MissingFlip,
        format!("Missing flipped portraits: {}; add `noflip` if intended", missing.join(", ")),
    ))
}

/// Per-tile palette cap; the preview reduces only the offending tiles.
fn check_tile_colors(sheet: &PortraitSheet<'_>, flags: &AckFlags, max_colors: usize) -> Result<(), ValidationFailure> {
    let mut over = Vec::new();
    let mut preview = sheet.image.clone();
    for (e, f) in sheet.present() {
        let rect = sheet.tile_rect(e, f);
        let count = palette_in(sheet.image, rect).len();
        if count > max_colors {
            over.push(format!("{}: {} colors", sheet.layout.tile_name(e, f), count));
            paste(&mut preview, &quantize_preview(&crop(sheet.image, rect), max_colors), rect.x, rect.y);
        }
    }
    if over.is_empty() || flags.overcolor {
        return Ok(());
    }
    Err(ValidationFailure::new(
        FailureKind::TileOverflow,
        format!(
            "Portrait tiles over {} colors; add `overcolor` if intended:{}",
            max_colors,
            join_findings(&over)
        ),
    )
    .with_preview(preview))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use image::Rgba;

    fn fill(img: &mut RgbaImage, rect: Rect, color: Rgba<u8>) {
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                img.put_pixel(x, y, color);
            }
        }
    }

    fn sheet_with(tiles: &[(usize, bool)]) -> RgbaImage {
        let rules = PortraitRules::default();
        let mut img = RgbaImage::new(200, 320);
        for (e, f) in tiles {
            fill(&mut img, rules.layout.tile_rect(rules.layout.slot(*e, *f)), Rgba([200, 150, 100, 255]));
        }
        img
    }

    #[test]
    fn test_valid_portrait() {
        let img = sheet_with(&[(0, false), (1, false), (0, true), (1, true)]);
        assert!(verify_portrait(&img, &AckFlags::default(), &PortraitRules::default()).is_ok());
    }

    #[test]
    fn test_wrong_size() {
        let err = verify_portrait(&RgbaImage::new(200, 160), &AckFlags::default(), &PortraitRules::default())
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Dimensions);
    }

    #[test]
    fn test_partial_tile() {
        let mut img = sheet_with(&[(0, false)]);
        img.put_pixel(45, 3, Rgba([1, 2, 3, 255]));
        let err = verify_portrait(&img, &AckFlags::default(), &PortraitRules::default()).unwrap_err();
        assert_eq!(err.kind, FailureKind::PartialTile);
        assert!(err.message.contains("Happy"));
    }

    #[test]
    fn test_semi_transparent_portrait() {
        let mut img = sheet_with(&[(0, false)]);
        img.put_pixel(3, 3, Rgba([1, 2, 3, 128]));
        let flags = AckFlags { overcolor: true, noflip: true, ..Default::default() };
        let err = verify_portrait(&img, &flags, &PortraitRules::default()).unwrap_err();
        assert_eq!(err.kind, FailureKind::SemiTransparent);
    }

    #[test]
    fn test_flip_without_original_is_fatal() {
        let img = sheet_with(&[(0, false), (3, true)]);
        let flags = AckFlags { noflip: true, ..Default::default() };
        let err = verify_portrait(&img, &flags, &PortraitRules::default()).unwrap_err();
        assert_eq!(err.kind, FailureKind::FlipWithoutOriginal);
        assert!(err.message.contains("Angry^"));
    }

    #[test]
    fn test_missing_flip_escapable() {
        let img = sheet_with(&[(0, false), (1, false), (0, true)]);
        let err = verify_portrait(&img, &AckFlags::default(), &PortraitRules::default()).unwrap_err();
        assert_eq!(err.kind, FailureKind::MissingFlip);
        assert!(err.message.contains("Happy^"));

        let flags = AckFlags { noflip: true, ..Default::default() };
        assert!(verify_portrait(&img, &flags, &PortraitRules::default()).is_ok());
    }

    #[test]
    fn test_no_flips_at_all_is_fine() {
        let img = sheet_with(&[(0, false), (1, false)]);
        assert!(verify_portrait(&img, &AckFlags::default(), &PortraitRules::default()).is_ok());
    }

    #[test]
    fn test_tile_color_cap() {
        let mut img = sheet_with(&[(0, false)]);
        for i in 0..16u8 {
            img.put_pixel(i as u32, 0, Rgba([i * 10, 0, 50, 255]));
        }
        let err = verify_portrait(&img, &AckFlags::default(), &PortraitRules::default()).unwrap_err();
        assert_eq!(err.kind, FailureKind::TileOverflow);
        assert!(err.preview.is_some());

        let flags = AckFlags { overcolor: true, ..Default::default() };
        assert!(verify_portrait(&img, &flags, &PortraitRules::default()).is_ok());
    }

    #[test]
    fn test_recolor_silhouette_change() {
        let original = sheet_with(&[(0, false), (1, false)]);
        let mut recolor = original.clone();
        recolor.put_pixel(50, 10, Rgba([0, 0, 0, 0]));
        let flags = AckFlags { lineart: true, overcolor: true, noflip: true, colormod: 5, colors: Some(99), multioffset: true };
        let err = verify_portrait_recolor(&original, &recolor, &flags, &PortraitRules::default()).unwrap_err();
        assert_eq!(err.kind, FailureKind::Silhouette);
        assert!(err.message.contains("Happy"));
        assert!(err.preview.is_some());
    }

    #[test]
    fn test_recolor_color_delta() {
        let original = sheet_with(&[(0, false)]);
        let mut recolor = original.clone();
        recolor.put_pixel(1, 1, Rgba([9, 9, 9, 255]));
        let err = verify_portrait_recolor(&original, &recolor, &AckFlags::default(), &PortraitRules::default())
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::ColorDelta);

        let flags = AckFlags { colormod: 1, ..Default::default() };
        assert!(verify_portrait_recolor(&original, &recolor, &flags, &PortraitRules::default()).is_ok());
    }
}
