//! Palette-reduced previews via median cut
//!
//! When a submission carries too many colors, the rejection includes the
//! sheet reduced to a small palette so the artist can see which shades
//! collapse together. Boxes are split along their widest RGB channel at the
//! pixel-weighted median; pixels are then mapped to the perceptually
//! closest box average (CIE76 distance in LAB).

use image::RgbaImage;
use std::collections::BTreeMap;

use crate::palette::{palette, Color};

#[derive(Debug, Clone, Copy)]
enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    fn of(self, color: &Color) -> u8 {
        match self {
            Channel::Red => color.r,
            Channel::Green => color.g,
            Channel::Blue => color.b,
        }
    }
}

/// Colors with their pixel counts, split as one unit.
#[derive(Debug, Clone)]
struct ColorBox {
    colors: Vec<(Color, u32)>,
}

impl ColorBox {
    fn widest_channel(&self) -> Channel {
        let range = |channel: Channel| {
            let values = self.colors.iter().map(|(c, _)| channel.of(c));
            let min = values.clone().min().unwrap_or(0);
            let max = values.max().unwrap_or(0);
            max - min
        };
        let (r, g, b) = (range(Channel::Red), range(Channel::Green), range(Channel::Blue));
        if r >= g && r >= b {
            Channel::Red
        } else if g >= b {
            Channel::Green
        } else {
            Channel::Blue
        }
    }

    fn pixel_count(&self) -> u64 {
        self.colors.iter().map(|(_, n)| *n as u64).sum()
    }

    /// Split at the pixel-weighted median of the widest channel.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let channel = self.widest_channel();
        self.colors.sort_by_key(|(c, _)| (channel.of(c), *c));

        let half = self.pixel_count() / 2;
        let mut running = 0u64;
        let mut at = self.colors.len() / 2;
        for (i, (_, n)) in self.colors.iter().enumerate() {
            running += *n as u64;
            if running >= half {
                at = i + 1;
                break;
            }
        }
        at = at.clamp(1, self.colors.len() - 1);

        let right = self.colors.split_off(at);
        (ColorBox { colors: self.colors }, ColorBox { colors: right })
    }

    fn average(&self) -> Color {
        let total = self.pixel_count().max(1);
        let mean = |channel: Channel| {
            let sum: u64 = self.colors.iter().map(|(c, n)| channel.of(c) as u64 * *n as u64).sum();
            (sum / total) as u8
        };
        Color::rgb(mean(Channel::Red), mean(Channel::Green), mean(Channel::Blue))
    }
}

/// Reduce opaque colors to at most `max_colors` representatives.
pub fn median_cut(colors: &BTreeMap<Color, u32>, max_colors: usize) -> Vec<Color> {
    let opaque: Vec<(Color, u32)> =
        colors.iter().filter(|(c, _)| c.is_opaque()).map(|(c, n)| (*c, *n)).collect();
    if opaque.len() <= max_colors || max_colors == 0 {
        return opaque.into_iter().map(|(c, _)| c).collect();
    }

    let mut boxes = vec![ColorBox { colors: opaque }];
    while boxes.len() < max_colors {
        let Some(idx) = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.colors.len() > 1)
            .max_by_key(|(_, b)| b.pixel_count())
            .map(|(i, _)| i)
        else {
            break;
        };
        let (left, right) = boxes.remove(idx).split();
        boxes.push(left);
        boxes.push(right);
    }

    boxes.iter().map(ColorBox::average).collect()
}

/// CIE LAB coordinates (D65).
#[derive(Debug, Clone, Copy)]
struct Lab {
    l: f64,
    a: f64,
    b: f64,
}

impl Lab {
    fn from_color(color: Color) -> Self {
        let lin = |c: u8| {
            let c = c as f64 / 255.0;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        let (r, g, b) = (lin(color.r), lin(color.g), lin(color.b));

        let x = (r * 0.4124564 + g * 0.3575761 + b * 0.1804375) / 0.95047;
        let y = r * 0.2126729 + g * 0.7151522 + b * 0.0721750;
        let z = (r * 0.0193339 + g * 0.1191920 + b * 0.9503041) / 1.08883;

        let f = |t: f64| {
            let delta: f64 = 6.0 / 29.0;
            if t > delta.powi(3) {
                t.cbrt()
            } else {
                t / (3.0 * delta * delta) + 4.0 / 29.0
            }
        };
        let (fx, fy, fz) = (f(x), f(y), f(z));
        Self { l: 116.0 * fy - 16.0, a: 500.0 * (fx - fy), b: 200.0 * (fy - fz) }
    }

    fn distance(&self, other: &Lab) -> f64 {
        let (dl, da, db) = (self.l - other.l, self.a - other.a, self.b - other.b);
        (dl * dl + da * da + db * db).sqrt()
    }
}

/// Index of the perceptually closest palette entry.
pub fn closest_color(color: Color, palette: &[Color]) -> Option<usize> {
    let target = Lab::from_color(color);
    palette
        .iter()
        .enumerate()
        .map(|(i, c)| (i, target.distance(&Lab::from_color(*c))))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
}

/// The image with its opaque pixels reduced to `max_colors` colors.
/// Non-opaque pixels are left as they are.
pub fn quantize_preview(image: &RgbaImage, max_colors: usize) -> RgbaImage {
    let reduced = median_cut(&palette(image).colors, max_colors);
    let mut lookup: BTreeMap<Color, Color> = BTreeMap::new();
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let color = Color::from_rgba(*pixel);
        if !color.is_opaque() {
            continue;
        }
        let mapped = *lookup
            .entry(color)
            .or_insert_with(|| closest_color(color, &reduced).map_or(color, |i| reduced[i]));
        *pixel = mapped.to_rgba();
    }
    out
}
