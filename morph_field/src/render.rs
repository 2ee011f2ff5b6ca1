//! Presentation-side view of the live particle buffer.
//!
//! The engine never hands out ownership of its buffer.  After each tick it
//! marks the [`RenderBinding`] dirty; the presentation layer asks for a
//! [`FrameView`], re-uploads the positions, and the flag clears until the
//! next tick.

use std::fmt;

use glam::{EulerRot, Quat, Vec3};
use particle_shapes::ShapeArchetype;

// ════════════════════════════════════════════════════════════════════════════
// Rotation — two accumulated angles
// ════════════════════════════════════════════════════════════════════════════

/// Whole-field rotation, in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rotation {
    /// Slow constant spin around the vertical axis.
    pub y: f32,
    /// Signal-driven tumble around the viewing axis.
    pub z: f32,
}

impl Rotation {
    /// Advance by one tick.
    pub fn advance(&mut self, signal: f32, base_spin: f32, tumble_gain: f32) {
        self.y += base_spin;
        self.z += signal * tumble_gain;
    }

    /// Euler XYZ with no X component.
    pub fn to_quat(self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, 0.0, self.y, self.z)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Rgb
// ════════════════════════════════════════════════════════════════════════════

/// Particle tint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color `{0}` (expected #RRGGBB)")]
pub struct ParseColorError(pub String);

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// Parse `#RRGGBB` (leading `#` optional).
    pub fn from_hex(s: &str) -> Result<Self, ParseColorError> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseColorError(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| ParseColorError(s.to_string()))
        };
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Packed `0xAARRGGBB`, fully opaque.
    pub fn to_argb(self) -> u32 {
        0xFF00_0000 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RenderBinding — dirty flag + generation
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct RenderBinding {
    dirty:      bool,
    generation: u64,
}

impl RenderBinding {
    /// Buffer contents changed; bump the generation.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        self.generation += 1;
    }

    pub fn is_dirty(&self) -> bool { self.dirty }
    pub fn generation(&self) -> u64 { self.generation }

    /// Clear the flag, returning the generation if it was set.
    pub fn take(&mut self) -> Option<u64> {
        if std::mem::take(&mut self.dirty) {
            Some(self.generation)
        } else {
            None
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FrameView — what the presentation layer gets each tick
// ════════════════════════════════════════════════════════════════════════════

/// Read-only borrow of the live buffer plus the presentation transform.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub positions:  &'a [Vec3],
    pub rotation:   Rotation,
    pub color:      Rgb,
    pub archetype:  ShapeArchetype,
    pub signal:     f32,
    pub generation: u64,
}

impl FrameView<'_> {
    pub fn len(&self) -> usize { self.positions.len() }
    pub fn is_empty(&self) -> bool { self.positions.is_empty() }

    /// Positions after applying the field rotation.
    pub fn rotated(&self) -> impl Iterator<Item = Vec3> + '_ {
        let q = self.rotation.to_quat();
        self.positions.iter().map(move |p| q * *p)
    }
}
