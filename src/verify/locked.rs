//! Locked-region enforcement against the currently accepted asset
//!
//! Sub-assets (animations for sprites, emotion tiles for portraits) that the
//! catalog marks locked must come through a submission byte for byte. Names
//! are matched case-insensitively. Unlocked sub-assets that changed are
//! reported back as the success payload. When the node has a known
//! original and recolor, the current asset goes through that recolor first.

use image::RgbaImage;
use std::collections::BTreeSet;
use std::path::Path;

use crate::geometry::regions_equal;
use crate::output::decode_png;
use crate::recolor::{synthesize_portrait_recolor, synthesize_sprite_recolor};
use crate::registry::{AnimRegistry, PortraitLayout};
use crate::sprite::{SheetKind, SpriteSet};

use super::{FailureKind, ValidationFailure};

/// A node's known original and its accepted recolor.
#[derive(Debug)]
pub struct RecolorPair<'a, T> {
    pub original: &'a T,
    pub recolor: &'a T,
}

// Derived impls would require `T: Copy`.
impl<T> Clone for RecolorPair<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RecolorPair<'_, T> {}

/// Content proposed to replace the current asset.
///
/// With a `recolor` pair, the current asset is first recolored the way the
/// pair recolors its original, and the submission is compared with that.
#[derive(Debug, Clone, Copy)]
pub enum Submission<'a> {
    Sprite {
        set: &'a SpriteSet,
        registry: &'a AnimRegistry,
        recolor: Option<RecolorPair<'a, SpriteSet>>,
    },
    Portrait {
        image: &'a RgbaImage,
        layout: &'a PortraitLayout,
        recolor: Option<RecolorPair<'a, RgbaImage>>,
    },
}

/// Compare a submission with the asset stored at `current`.
///
/// Sprites are read from a directory or zip, portraits from a PNG. A path
/// that doesn't exist means nothing has been accepted yet: every submitted
/// sub-asset counts as changed and nothing can violate a lock.
pub fn check_locked_regions(
    current: &Path,
    submission: Submission<'_>,
    locked: &BTreeSet<String>,
) -> Result<Vec<String>, ValidationFailure> {
    match submission {
        Submission::Sprite { set, registry, recolor } => {
            if !current.exists() {
                return Ok(set.descriptor.animations().iter().map(|a| a.name.clone()).collect());
            }
            let mut existing = SpriteSet::load(current, registry)?;
            if let Some(pair) = recolor {
                existing = synthesize_sprite_recolor(pair.original, pair.recolor, &existing, usize::MAX)?.output;
            }
            check_locked_sprite(&existing, set, locked)
        }
        Submission::Portrait { image, layout, recolor } => {
            if !current.exists() {
                return Ok(crate::portrait::PortraitSheet::new(image, layout)
                    .present()
                    .into_iter()
                    .map(|(e, f)| layout.tile_name(e, f))
                    .collect());
            }
            let bytes = std::fs::read(current)
                .map_err(|e| ValidationFailure::new(FailureKind::Archive, e.to_string()))?;
            let mut existing = decode_png(&bytes).map_err(|e| {
                ValidationFailure::new(FailureKind::Archive, format!("cannot decode {}: {}", current.display(), e))
            })?;
            if let Some(pair) = recolor {
                existing =
                    synthesize_portrait_recolor(pair.original, pair.recolor, &existing, layout, usize::MAX).output;
            }
            check_locked_portrait(&existing, image, layout, locked)
        }
    }
}

fn lowercase_set(names: &BTreeSet<String>) -> BTreeSet<String> {
    names.iter().map(|n| n.to_lowercase()).collect()
}

/// Per-animation comparison of two sprites.
///
/// An animation is unchanged when both sides list it, the entries it
/// resolves to carry the same frame data, and its three sheets are
/// pixel-identical. A locked animation missing from the submission counts
/// as a violation.
pub fn check_locked_sprite(
    current: &SpriteSet,
    submission: &SpriteSet,
    locked: &BTreeSet<String>,
) -> Result<Vec<String>, ValidationFailure> {
    let locked = lowercase_set(locked);

    let mut names: Vec<&str> = Vec::new();
    let mut seen = BTreeSet::new();
    for anim in submission.descriptor.animations().iter().chain(current.descriptor.animations()) {
        if seen.insert(anim.name.to_lowercase()) {
            names.push(&anim.name);
        }
    }

    let mut violations = Vec::new();
    let mut changed = Vec::new();
    for name in names {
        if animation_equal(current, submission, name) {
            continue;
        }
        let in_current = current.descriptor.contains(name);
        let in_submission = submission.descriptor.contains(name);
        if locked.contains(&name.to_lowercase()) && in_current {
            let why = if in_submission { "changed" } else { "removed" };
            violations.push(format!("{} ({})", name, why));
        } else {
            changed.push(name.to_string());
        }
    }

    if !violations.is_empty() {
        return Err(ValidationFailure::new(
            FailureKind::LockedRegion,
            format!("Locked animations were modified: {}", violations.join(", ")),
        ));
    }
    log::debug!("locked check passed; {} animations changed", changed.len());
    Ok(changed)
}

fn animation_equal(a: &SpriteSet, b: &SpriteSet, name: &str) -> bool {
    let (Some(ea), Some(eb)) = (a.descriptor.resolve(name), b.descriptor.resolve(name)) else {
        return false;
    };
    if ea.frame_size != eb.frame_size
        || ea.durations != eb.durations
        || (ea.rush_frame, ea.hit_frame, ea.return_frame) != (eb.rush_frame, eb.hit_frame, eb.return_frame)
    {
        return false;
    }
    SheetKind::ALL.iter().all(|kind| match (a.sheet(&ea.name, *kind), b.sheet(&eb.name, *kind)) {
        (Some(x), Some(y)) => x == y,
        (None, None) => true,
        _ => false,
    })
}

/// Per-tile comparison of two portrait sheets.
pub fn check_locked_portrait(
    current: &RgbaImage,
    submission: &RgbaImage,
    layout: &PortraitLayout,
    locked: &BTreeSet<String>,
) -> Result<Vec<String>, ValidationFailure> {
    let locked = lowercase_set(locked);
    let mut violations = Vec::new();
    let mut changed = Vec::new();

    for (emotion, flipped) in layout.tiles() {
        let rect = layout.tile_rect(layout.slot(emotion, flipped));
        let a = rect.clamp_to(current);
        let b = rect.clamp_to(submission);
        let same = if a.is_empty() && b.is_empty() {
            true
        } else {
            regions_equal(current, a, submission, b)
        };
        if same {
            continue;
        }
        let name = layout.tile_name(emotion, flipped);
        if locked.contains(&name.to_lowercase()) {
            violations.push(name);
        } else {
            changed.push(name);
        }
    }

    if !violations.is_empty() {
        return Err(ValidationFailure::new(
            FailureKind::LockedRegion,
            format!("Locked portraits were modified: {}", violations.join(", ")),
        ));
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{AnimDescriptor, AnimationDescriptor};
    use image::Rgba;
    use std::collections::BTreeMap;

    fn set_with(anims: &[(&str, i32)]) -> SpriteSet {
        let registry = AnimRegistry::standard();
        let entries = anims.iter().map(|(n, i)| AnimationDescriptor::new(*n, *i, (4, 4), vec![1])).collect();
        let descriptor = AnimDescriptor::from_entries(0, entries, &registry).unwrap();
        let mut sheets = BTreeMap::new();
        for (name, index) in anims {
            let mut anim = RgbaImage::new(4, 4);
            anim.put_pixel(1, 1, Rgba([*index as u8 * 20, 0, 0, 255]));
            sheets.insert(SheetKind::Anim.file_name(name), anim);
            sheets.insert(SheetKind::Offsets.file_name(name), RgbaImage::new(4, 4));
            sheets.insert(SheetKind::Shadow.file_name(name), RgbaImage::new(4, 4));
        }
        SpriteSet::new(descriptor, sheets).unwrap()
    }

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_locked_animation_changed() {
        let current = set_with(&[("Walk", 0), ("Idle", 7)]);
        let mut submission = current.clone();
        let mut walk = submission.sheet("Walk", SheetKind::Anim).unwrap().clone();
        walk.put_pixel(3, 3, Rgba([5, 5, 5, 255]));
        submission.insert_sheet("Walk", SheetKind::Anim, walk);

        let err = check_locked_sprite(&current, &submission, &names(&["walk"])).unwrap_err();
        assert_eq!(err.kind, FailureKind::LockedRegion);
        assert!(err.message.contains("Walk (changed)"));
        assert!(!err.message.contains("Idle"));
    }

    #[test]
    fn test_unlocked_change_is_reported() {
        let current = set_with(&[("Walk", 0), ("Idle", 7)]);
        let mut submission = current.clone();
        submission.insert_sheet("Idle", SheetKind::Shadow, RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255])));

        let changed = check_locked_sprite(&current, &submission, &names(&["Walk"])).unwrap();
        assert_eq!(changed, vec!["Idle".to_string()]);
    }

    #[test]
    fn test_locked_animation_removed() {
        let current = set_with(&[("Walk", 0), ("Idle", 7)]);
        let submission = set_with(&[("Walk", 0)]);
        let err = check_locked_sprite(&current, &submission, &names(&["Idle"])).unwrap_err();
        assert!(err.message.contains("Idle (removed)"));
    }

    #[test]
    fn test_new_animation_is_a_change() {
        let current = set_with(&[("Walk", 0)]);
        let submission = set_with(&[("Walk", 0), ("Idle", 7)]);
        let changed = check_locked_sprite(&current, &submission, &names(&["Walk", "Idle"])).unwrap();
        assert_eq!(changed, vec!["Idle".to_string()]);
    }

    #[test]
    fn test_locked_portrait_tile() {
        let layout = PortraitLayout::standard();
        let current = RgbaImage::from_pixel(200, 320, Rgba([100, 100, 100, 255]));
        let mut submission = current.clone();
        submission.put_pixel(41, 1, Rgba([1, 1, 1, 255]));
        submission.put_pixel(81, 1, Rgba([1, 1, 1, 255]));

        let err = check_locked_portrait(&current, &submission, &layout, &names(&["happy"])).unwrap_err();
        assert_eq!(err.message, "Locked portraits were modified: Happy");

        let changed = check_locked_portrait(&current, &submission, &layout, &names(&["Normal"])).unwrap();
        assert_eq!(changed, vec!["Happy".to_string(), "Pain".to_string()]);
    }

    #[test]
    fn test_missing_current_asset_means_everything_changed() {
        let temp = tempfile::TempDir::new().unwrap();
        let set = set_with(&[("Walk", 0)]);
        let registry = AnimRegistry::standard();
        let changed = check_locked_regions(
            &temp.path().join("absent"),
            Submission::Sprite { set: &set, registry: &registry, recolor: None },
            &names(&["Walk"]),
        )
        .unwrap();
        assert_eq!(changed, vec!["Walk".to_string()]);
    }
}
