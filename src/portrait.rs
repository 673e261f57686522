//! Portrait sheets: a fixed grid of emotion tiles
//!
//! Each emotion owns one square tile, laid out row-major; the flipped
//! versions follow in a second half with the same order. A tile is either
//! absent (fully transparent) or present (fully opaque). Portraits never
//! share tiles, so the frame table of a portrait is simply one frame per
//! present tile.

use image::RgbaImage;

use crate::geometry::{crop, Rect};
use crate::registry::PortraitLayout;

/// How much of a tile is painted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occupancy {
    Empty,
    Full,
    /// Some pixels painted, these ones not
    Partial(Vec<(u32, u32)>),
}

/// One present tile.
#[derive(Debug, Clone, PartialEq)]
pub struct PortraitTile {
    pub emotion: usize,
    pub flipped: bool,
    pub name: String,
    pub rect: Rect,
    pub image: RgbaImage,
}

/// A borrowed view of a portrait sheet under a layout.
#[derive(Debug, Clone, Copy)]
pub struct PortraitSheet<'a> {
    pub image: &'a RgbaImage,
    pub layout: &'a PortraitLayout,
}

impl<'a> PortraitSheet<'a> {
    pub fn new(image: &'a RgbaImage, layout: &'a PortraitLayout) -> Self {
        Self { image, layout }
    }

    pub fn has_expected_size(&self) -> bool {
        self.image.dimensions() == self.layout.sheet_size()
    }

    pub fn tile_rect(&self, emotion: usize, flipped: bool) -> Rect {
        self.layout.tile_rect(self.layout.slot(emotion, flipped))
    }

    /// Classify a slot by its alpha channel.
    pub fn occupancy_of(&self, rect: Rect) -> Occupancy {
        let rect = rect.clamp_to(self.image);
        let mut holes = Vec::new();
        let mut painted = false;
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                if self.image.get_pixel(x, y)[3] == 0 {
                    holes.push((x, y));
                } else {
                    painted = true;
                }
            }
        }
        match (painted, holes.is_empty()) {
            (false, _) => Occupancy::Empty,
            (true, true) => Occupancy::Full,
            (true, false) => Occupancy::Partial(holes),
        }
    }

    pub fn occupancy(&self, emotion: usize, flipped: bool) -> Occupancy {
        self.occupancy_of(self.tile_rect(emotion, flipped))
    }

    /// Whether any pixel of the tile is painted.
    pub fn is_present(&self, emotion: usize, flipped: bool) -> bool {
        self.occupancy(emotion, flipped) != Occupancy::Empty
    }

    /// Present tiles in slot order.
    pub fn present(&self) -> Vec<(usize, bool)> {
        self.layout.tiles().filter(|(e, f)| self.is_present(*e, *f)).collect()
    }

    /// Padding slots (past the last emotion of a half) that carry pixels.
    pub fn painted_padding(&self) -> Vec<u32> {
        let per_half = self.layout.half_rows() * self.layout.columns;
        let emotions = self.layout.emotion_count() as u32;
        (0..self.layout.slot_count())
            .filter(|slot| slot % per_half >= emotions)
            .filter(|slot| self.occupancy_of(self.layout.tile_rect(*slot)) != Occupancy::Empty)
            .collect()
    }

    /// One frame per present tile.
    pub fn frames(&self) -> Vec<PortraitTile> {
        self.present()
            .into_iter()
            .map(|(emotion, flipped)| {
                let rect = self.tile_rect(emotion, flipped);
                PortraitTile {
                    emotion,
                    flipped,
                    name: self.layout.tile_name(emotion, flipped),
                    rect,
                    image: crop(self.image, rect),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const SKIN: Rgba<u8> = Rgba([230, 190, 150, 255]);

    fn fill(img: &mut RgbaImage, rect: Rect) {
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                img.put_pixel(x, y, SKIN);
            }
        }
    }

    #[test]
    fn test_occupancy() {
        let layout = PortraitLayout::standard();
        let mut img = RgbaImage::new(200, 320);
        let sheet_rect = layout.tile_rect(layout.slot(0, false));
        fill(&mut img, sheet_rect);
        img.put_pixel(45, 5, SKIN);

        let sheet = PortraitSheet::new(&img, &layout);
        assert!(sheet.has_expected_size());
        assert_eq!(sheet.occupancy(0, false), Occupancy::Full);
        assert_eq!(sheet.occupancy(2, false), Occupancy::Empty);
        match sheet.occupancy(1, false) {
            Occupancy::Partial(holes) => assert_eq!(holes.len(), 40 * 40 - 1),
            other => panic!("expected partial tile, got {:?}", other),
        }
    }

    #[test]
    fn test_present_and_frames() {
        let layout = PortraitLayout::standard();
        let mut img = RgbaImage::new(200, 320);
        fill(&mut img, layout.tile_rect(layout.slot(0, false)));
        fill(&mut img, layout.tile_rect(layout.slot(0, true)));
        fill(&mut img, layout.tile_rect(layout.slot(6, false)));

        let sheet = PortraitSheet::new(&img, &layout);
        assert_eq!(sheet.present(), vec![(0, false), (6, false), (0, true)]);
        let frames = sheet.frames();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].name, "Normal^");
        assert_eq!(frames[1].rect, Rect::new(40, 40, 40, 40));
        assert_eq!(frames[0].image.dimensions(), (40, 40));
    }

    #[test]
    fn test_painted_padding() {
        let layout = PortraitLayout::new(
            10,
            4,
            vec!["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string(), "E".to_string()],
        );
        let mut img = RgbaImage::new(40, 40);
        // Slot 5 is padding after E in the first half.
        img.put_pixel(12, 12, SKIN);
        let sheet = PortraitSheet::new(&img, &layout);
        assert_eq!(sheet.painted_padding(), vec![5]);
    }
}
