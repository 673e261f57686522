//! Shared fixtures: small but complete sprites built in memory

#![allow(dead_code)]

use image::{Rgba, RgbaImage};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use spritecheck::descriptor::{AnimDescriptor, AnimationDescriptor};
use spritecheck::registry::AnimRegistry;
use spritecheck::sprite::{SheetKind, SpriteSet};

/// Tier-0 animations with their fixed index slots.
pub const REQUIRED: &[(&str, i32)] = &[("Walk", 0), ("Attack", 1), ("Sleep", 5), ("Hurt", 6), ("Idle", 7)];

pub const FRAME: u32 = 8;
pub const COLUMNS: u32 = 2;

pub const OUTLINE: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const BODY: Rgba<u8> = Rgba([120, 80, 40, 255]);
pub const EYE: [Rgba<u8>; 2] = [Rgba([250, 250, 10, 255]), Rgba([240, 120, 10, 255])];
pub const CENTER: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const SHADOW: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Positions of the outline ring of the body in a tile at (tx, ty).
pub fn ring(tx: u32, ty: u32) -> Vec<(u32, u32)> {
    let mut out = Vec::new();
    for y in 2..6 {
        for x in 2..6 {
            if x == 2 || x == 5 || y == 2 || y == 5 {
                out.push((tx + x, ty + y));
            }
        }
    }
    out
}

/// A 4x4 outlined body per tile; the eye color changes with the column.
pub fn anim_sheet() -> RgbaImage {
    let mut img = RgbaImage::new(FRAME * COLUMNS, FRAME);
    for col in 0..COLUMNS {
        let tx = col * FRAME;
        for (x, y) in ring(tx, 0) {
            img.put_pixel(x, y, OUTLINE);
        }
        img.put_pixel(tx + 3, 3, EYE[col as usize]);
        img.put_pixel(tx + 4, 3, BODY);
        img.put_pixel(tx + 3, 4, BODY);
        img.put_pixel(tx + 4, 4, BODY);
    }
    img
}

/// One marker pixel per tile at the same tile-relative position.
pub fn marker_sheet(color: Rgba<u8>, x: u32, y: u32) -> RgbaImage {
    let mut img = RgbaImage::new(FRAME * COLUMNS, FRAME);
    for col in 0..COLUMNS {
        img.put_pixel(col * FRAME + x, y, color);
    }
    img
}

/// Sprite with every required animation, one direction, two frames each.
pub fn sample_sprite() -> SpriteSet {
    let registry = AnimRegistry::standard();
    let entries = REQUIRED
        .iter()
        .map(|(name, index)| AnimationDescriptor::new(*name, *index, (FRAME, FRAME), vec![4; COLUMNS as usize]))
        .collect();
    let descriptor = AnimDescriptor::from_entries(1, entries, &registry).unwrap();

    let mut sheets = BTreeMap::new();
    for (name, _) in REQUIRED {
        sheets.insert(SheetKind::Anim.file_name(name), anim_sheet());
        sheets.insert(SheetKind::Offsets.file_name(name), marker_sheet(CENTER, 4, 4));
        sheets.insert(SheetKind::Shadow.file_name(name), marker_sheet(SHADOW, 4, 6));
    }
    SpriteSet::new(descriptor, sheets).unwrap()
}

/// Edit one sheet of a sprite in place.
pub fn edit_sheet(set: &mut SpriteSet, anim: &str, kind: SheetKind, edit: impl FnOnce(&mut RgbaImage)) {
    let mut sheet = set.sheet(anim, kind).unwrap().clone();
    edit(&mut sheet);
    set.insert_sheet(anim, kind, sheet);
}

/// Replace `count` outline pixels of Walk's first frame with new colors.
pub fn add_colors(set: &mut SpriteSet, count: usize) {
    assert!(count <= 12, "the outline ring only has 12 pixels");
    edit_sheet(set, "Walk", SheetKind::Anim, |sheet| {
        for (i, (x, y)) in ring(0, 0).into_iter().take(count).enumerate() {
            sheet.put_pixel(x, y, Rgba([10 + i as u8 * 15, 160, 200, 255]));
        }
    });
}

pub fn zip(set: &SpriteSet) -> Vec<u8> {
    set.to_zip().unwrap()
}

/// Store a sprite as a directory of loose files.
pub fn write_dir(set: &SpriteSet, dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("AnimData.xml"), &set.descriptor_bytes).unwrap();
    for (name, image) in set.sheets() {
        image.save(dir.join(name)).unwrap();
    }
}

/// Portrait sheet with the given tiles filled in one color.
pub fn portrait(tiles: &[(usize, bool)], color: Rgba<u8>) -> RgbaImage {
    let layout = spritecheck::registry::PortraitLayout::standard();
    let mut img = RgbaImage::new(200, 320);
    for (emotion, flipped) in tiles {
        let rect = layout.tile_rect(layout.slot(*emotion, *flipped));
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                img.put_pixel(x, y, color);
            }
        }
    }
    img
}
