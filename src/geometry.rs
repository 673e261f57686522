//! Rectangles, tight bounds and pixel-region comparison
//!
//! Everything here works on `RgbaImage` buffers in sheet coordinates.
//! Regions are clamped to the image before use, so callers can pass a tile
//! rectangle straight from a grid computation.

use image::{imageops, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fully transparent pixel.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// An axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle covering a whole image.
    pub fn of_image(image: &RgbaImage) -> Self {
        Self::new(0, 0, image.width(), image.height())
    }

    /// A zero-sized rectangle has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Intersection with the bounds of an image.
    pub fn clamp_to(&self, image: &RgbaImage) -> Rect {
        let x = self.x.min(image.width());
        let y = self.y.min(image.height());
        let right = self.right().min(image.width());
        let bottom = self.bottom().min(image.height());
        Rect::new(x, y, right - x, bottom - y)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} at ({}, {})", self.width, self.height, self.x, self.y)
    }
}

/// A signed pixel position, used for marker offsets that may fall outside a crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Reflect horizontally inside a region of the given width.
    pub fn mirrored(self, width: u32) -> Self {
        Self { x: width as i32 - 1 - self.x, y: self.y }
    }

    /// Translate by the negated origin of a rectangle.
    pub fn relative_to(self, origin: Rect) -> Self {
        Self { x: self.x - origin.x as i32, y: self.y - origin.y as i32 }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Smallest rectangle inside `region` containing every pixel with alpha > 0.
///
/// A fully transparent region yields an empty rectangle anchored at the
/// region's origin.
pub fn tight_bounds(image: &RgbaImage, region: Rect) -> Rect {
    let region = region.clamp_to(image);
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut found = false;

    for y in region.y..region.bottom() {
        for x in region.x..region.right() {
            if image.get_pixel(x, y)[3] > 0 {
                found = true;
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }
    }

    if !found {
        return Rect::new(region.x, region.y, 0, 0);
    }
    Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1)
}

/// True when no pixel in the region has alpha > 0.
pub fn is_blank(image: &RgbaImage, region: Rect) -> bool {
    tight_bounds(image, region).is_empty()
}

/// Copy a region out into its own image. Empty regions give a 0x0 image.
pub fn crop(image: &RgbaImage, region: Rect) -> RgbaImage {
    let region = region.clamp_to(image);
    if region.is_empty() {
        return RgbaImage::new(0, 0);
    }
    imageops::crop_imm(image, region.x, region.y, region.width, region.height).to_image()
}

/// Horizontal mirror of an image.
pub fn mirror(image: &RgbaImage) -> RgbaImage {
    imageops::flip_horizontal(image)
}

/// Overwrite pixels of `dest` with `src` at (x, y), no blending.
pub fn paste(dest: &mut RgbaImage, src: &RgbaImage, x: u32, y: u32) {
    imageops::replace(dest, src, x as i64, y as i64);
}

/// Per-pixel RGBA equality, optionally against the horizontal mirror of `b`.
pub fn images_equal(a: &RgbaImage, b: &RgbaImage, mirror: bool) -> bool {
    if a.dimensions() != b.dimensions() {
        return false;
    }
    if !mirror {
        return a.as_raw() == b.as_raw();
    }
    let w = a.width();
    for y in 0..a.height() {
        for x in 0..w {
            if a.get_pixel(x, y) != b.get_pixel(w - 1 - x, y) {
                return false;
            }
        }
    }
    true
}

/// Pixel equality of two same-sized regions, possibly from different images.
pub fn regions_equal(a: &RgbaImage, region_a: Rect, b: &RgbaImage, region_b: Rect) -> bool {
    if region_a.width != region_b.width || region_a.height != region_b.height {
        return false;
    }
    if region_a.clamp_to(a) != region_a || region_b.clamp_to(b) != region_b {
        return false;
    }
    for dy in 0..region_a.height {
        for dx in 0..region_a.width {
            if a.get_pixel(region_a.x + dx, region_a.y + dy)
                != b.get_pixel(region_b.x + dx, region_b.y + dy)
            {
                return false;
            }
        }
    }
    true
}

/// Number of fully opaque pixels in an image.
pub fn opaque_count(image: &RgbaImage) -> u32 {
    image.pixels().filter(|p| p[3] == 255).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    #[test]
    fn test_tight_bounds_finds_content() {
        let mut img = RgbaImage::new(8, 8);
        img.put_pixel(2, 3, RED);
        img.put_pixel(5, 6, RED);
        assert_eq!(tight_bounds(&img, Rect::of_image(&img)), Rect::new(2, 3, 4, 4));
    }

    #[test]
    fn test_tight_bounds_limited_to_region() {
        let mut img = RgbaImage::new(16, 8);
        img.put_pixel(1, 1, RED);
        img.put_pixel(10, 4, RED);
        assert_eq!(tight_bounds(&img, Rect::new(8, 0, 8, 8)), Rect::new(10, 4, 1, 1));
    }

    #[test]
    fn test_tight_bounds_empty_region() {
        let img = RgbaImage::new(8, 8);
        let bounds = tight_bounds(&img, Rect::new(4, 2, 4, 4));
        assert!(bounds.is_empty());
        assert_eq!((bounds.x, bounds.y), (4, 2));
    }

    #[test]
    fn test_images_equal_direct_and_mirror() {
        let mut a = RgbaImage::new(3, 1);
        a.put_pixel(0, 0, RED);
        a.put_pixel(2, 0, BLUE);
        let b = mirror(&a);
        assert!(images_equal(&a, &a, false));
        assert!(!images_equal(&a, &b, false));
        assert!(images_equal(&a, &b, true));
    }

    #[test]
    fn test_images_equal_rejects_size_mismatch() {
        assert!(!images_equal(&RgbaImage::new(2, 2), &RgbaImage::new(2, 3), false));
    }

    #[test]
    fn test_crop_and_paste() {
        let mut img = RgbaImage::new(4, 4);
        img.put_pixel(1, 1, RED);
        let piece = crop(&img, Rect::new(1, 1, 2, 2));
        assert_eq!(piece.dimensions(), (2, 2));
        assert_eq!(*piece.get_pixel(0, 0), RED);

        let mut dest = RgbaImage::new(4, 4);
        paste(&mut dest, &piece, 2, 2);
        assert_eq!(*dest.get_pixel(2, 2), RED);
        assert_eq!(*dest.get_pixel(1, 1), TRANSPARENT);
    }

    #[test]
    fn test_crop_empty_region() {
        let img = RgbaImage::new(4, 4);
        assert_eq!(crop(&img, Rect::new(1, 1, 0, 0)).dimensions(), (0, 0));
    }

    #[test]
    fn test_regions_equal_across_images() {
        let mut a = RgbaImage::new(4, 2);
        let mut b = RgbaImage::new(2, 2);
        a.put_pixel(3, 1, RED);
        b.put_pixel(1, 1, RED);
        assert!(regions_equal(&a, Rect::new(2, 0, 2, 2), &b, Rect::new(0, 0, 2, 2)));
        assert!(!regions_equal(&a, Rect::new(0, 0, 2, 2), &b, Rect::new(0, 0, 2, 2)));
    }

    #[test]
    fn test_point_mirror_is_involution() {
        let p = Point::new(-2, 5);
        assert_eq!(p.mirrored(7).mirrored(7), p);
        assert_eq!(Point::new(0, 0).mirrored(4), Point::new(3, 0));
    }
}
