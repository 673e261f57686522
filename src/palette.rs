//! Opaque palette extraction and alpha defect scanning
//!
//! Pixel art submissions use binary alpha: a pixel is either fully
//! transparent or fully opaque. Opaque pixels are counted per color;
//! anything in between is a defect and never enters the palette.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::geometry::Rect;

/// A color represented as RGBA values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn from_rgba(rgba: Rgba<u8>) -> Self {
        Self { r: rgba[0], g: rgba[1], b: rgba[2], a: rgba[3] }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// Partial alpha, which pixel art never allows.
    pub fn is_semi_transparent(&self) -> bool {
        self.a > 0 && self.a < 255
    }

    /// Opaque black, the conventional outline color.
    pub fn is_line_art(&self) -> bool {
        *self == Self::BLACK
    }
}

impl From<Rgba<u8>> for Color {
    fn from(rgba: Rgba<u8>) -> Self {
        Self::from_rgba(rgba)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Result of scanning an image (or region) for colors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaletteScan {
    /// Opaque color -> pixel count
    pub colors: BTreeMap<Color, u32>,
    /// Positions of pixels with 0 < alpha < 255, in scan order
    pub semi_transparent: Vec<(u32, u32)>,
}

impl PaletteScan {
    /// Number of distinct opaque colors.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn has_defects(&self) -> bool {
        !self.semi_transparent.is_empty()
    }

    /// Fold another scan's colors into this one. Defect positions are not
    /// merged because they belong to a different image.
    pub fn absorb(&mut self, other: &PaletteScan) {
        for (color, count) in &other.colors {
            *self.colors.entry(*color).or_insert(0) += count;
        }
    }
}

/// Palette of a whole image.
pub fn palette(image: &RgbaImage) -> PaletteScan {
    palette_in(image, Rect::of_image(image))
}

/// Palette of a region of an image.
pub fn palette_in(image: &RgbaImage, region: Rect) -> PaletteScan {
    let region = region.clamp_to(image);
    let mut scan = PaletteScan::default();
    for y in region.y..region.bottom() {
        for x in region.x..region.right() {
            let color = Color::from_rgba(*image.get_pixel(x, y));
            if color.is_opaque() {
                *scan.colors.entry(color).or_insert(0) += 1;
            } else if color.is_semi_transparent() {
                scan.semi_transparent.push((x, y));
            }
        }
    }
    scan
}
