//! Marker pixel decoding for Offsets and Shadow sheets
//!
//! Each frame tile of an Offsets sheet carries up to four opaque marker
//! pixels whose colors name a role: black for the head, a saturated red
//! channel for the left hand, a saturated blue channel for the right hand
//! and a saturated green channel for the center. One pixel may carry
//! several roles (yellow is left hand + center). White pixels carry none.
//!
//! The matching Shadow sheet tile marks the shadow position with a single
//! white pixel; the green/red/blue pixels around it draw the shadow shape
//! for the declared shadow size and claim no role.

use image::RgbaImage;
use std::fmt;
use thiserror::Error;

use crate::geometry::{Point, Rect};
use crate::palette::Color;

/// The meaning of a marker pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerRole {
    Head,
    LeftHand,
    RightHand,
    Center,
    Shadow,
}

impl MarkerRole {
    pub const ALL: [MarkerRole; 5] = [
        MarkerRole::Head,
        MarkerRole::LeftHand,
        MarkerRole::RightHand,
        MarkerRole::Center,
        MarkerRole::Shadow,
    ];

    /// Whether an opaque pixel of this color claims the role.
    pub fn claims(self, color: Color) -> bool {
        if !color.is_opaque() {
            return false;
        }
        let white = color == Color::WHITE;
        match self {
            MarkerRole::Head => color == Color::BLACK,
            MarkerRole::LeftHand => !white && color.r == 255,
            MarkerRole::RightHand => !white && color.b == 255,
            MarkerRole::Center => !white && color.g == 255,
            MarkerRole::Shadow => white,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MarkerRole::Head => "head",
            MarkerRole::LeftHand => "left hand",
            MarkerRole::RightHand => "right hand",
            MarkerRole::Center => "center",
            MarkerRole::Shadow => "shadow",
        }
    }
}

impl fmt::Display for MarkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which roles to look for in a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarkerRequest {
    pub head: bool,
    pub left_hand: bool,
    pub right_hand: bool,
    pub center: bool,
    pub shadow: bool,
}

impl MarkerRequest {
    /// Every role an Offsets sheet carries.
    pub const OFFSETS: MarkerRequest =
        MarkerRequest { head: true, left_hand: true, right_hand: true, center: true, shadow: false };

    /// The role a Shadow sheet carries.
    pub const SHADOW: MarkerRequest =
        MarkerRequest { head: false, left_hand: false, right_hand: false, center: false, shadow: true };

    pub fn wants(&self, role: MarkerRole) -> bool {
        match role {
            MarkerRole::Head => self.head,
            MarkerRole::LeftHand => self.left_hand,
            MarkerRole::RightHand => self.right_hand,
            MarkerRole::Center => self.center,
            MarkerRole::Shadow => self.shadow,
        }
    }
}

/// Decoded marker positions, relative to the scanned region's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Markers {
    pub head: Option<Point>,
    pub left_hand: Option<Point>,
    pub right_hand: Option<Point>,
    pub center: Option<Point>,
    pub shadow: Option<Point>,
}

impl Markers {
    pub fn get(&self, role: MarkerRole) -> Option<Point> {
        match role {
            MarkerRole::Head => self.head,
            MarkerRole::LeftHand => self.left_hand,
            MarkerRole::RightHand => self.right_hand,
            MarkerRole::Center => self.center,
            MarkerRole::Shadow => self.shadow,
        }
    }

    fn slot(&mut self, role: MarkerRole) -> &mut Option<Point> {
        match role {
            MarkerRole::Head => &mut self.head,
            MarkerRole::LeftHand => &mut self.left_hand,
            MarkerRole::RightHand => &mut self.right_hand,
            MarkerRole::Center => &mut self.center,
            MarkerRole::Shadow => &mut self.shadow,
        }
    }

    pub fn is_empty(&self) -> bool {
        MarkerRole::ALL.iter().all(|role| self.get(*role).is_none())
    }
}

/// Marker decoding failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkerError {
    /// Two opaque pixels claim the same role inside one region
    #[error("multiple {role} markers at {first} and {second}")]
    MultipleMarkers { role: MarkerRole, first: Point, second: Point },
}

/// Scan `region` of `image` for the requested marker roles.
///
/// Returns the position of each requested role relative to the region
/// origin. A role claimed by more than one opaque pixel is an error: the
/// frame cannot be anchored deterministically.
pub fn decode_markers(
    image: &RgbaImage,
    region: Rect,
    request: MarkerRequest,
) -> Result<Markers, MarkerError> {
    let region = region.clamp_to(image);
    let mut found = Markers::default();

    for y in region.y..region.bottom() {
        for x in region.x..region.right() {
            let color = Color::from_rgba(*image.get_pixel(x, y));
            if !color.is_opaque() {
                continue;
            }
            let here = Point::new((x - region.x) as i32, (y - region.y) as i32);
            for role in MarkerRole::ALL {
                if !request.wants(role) || !role.claims(color) {
                    continue;
                }
                let slot = found.slot(role);
                if let Some(first) = *slot {
                    return Err(MarkerError::MultipleMarkers { role, first, second: here });
                }
                *slot = Some(here);
            }
        }
    }

    Ok(found)
}
