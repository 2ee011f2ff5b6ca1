//! Particle colors and pixel blending.

use morph_field::Rgb;

// ════════════════════════════════════════════════════════════════════════════
// Palette — the preset swatches plus any color given on the command line
// ════════════════════════════════════════════════════════════════════════════

/// Hot pink, cyan, gold, green-yellow, white.
pub const PRESET: [Rgb; 5] = [
    Rgb::new(0xFF, 0x00, 0x55),
    Rgb::new(0x00, 0xFF, 0xFF),
    Rgb::new(0xFF, 0xD7, 0x00),
    Rgb::new(0xAD, 0xFF, 0x2F),
    Rgb::new(0xFF, 0xFF, 0xFF),
];

#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    colors: Vec<Rgb>,
    index:  usize,
}

impl Default for Palette {
    fn default() -> Self {
        Palette { colors: PRESET.to_vec(), index: 0 }
    }
}

impl Palette {
    /// Select `color`, appending it as an extra swatch if it isn't a preset.
    pub fn with_color(mut self, color: Rgb) -> Self {
        self.index = match self.colors.iter().position(|&c| c == color) {
            Some(i) => i,
            None    => { self.colors.push(color); self.colors.len() - 1 }
        };
        self
    }

    pub fn current(&self) -> Rgb { self.colors[self.index] }
    pub fn index(&self) -> usize { self.index }
    pub fn colors(&self) -> &[Rgb] { &self.colors }

    /// Returns false if `i` is out of range.
    pub fn select(&mut self, i: usize) -> bool {
        if i < self.colors.len() {
            self.index = i;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) -> Rgb {
        self.index = (self.index + 1) % self.colors.len();
        self.current()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Pixel helpers — packed 0xAARRGGBB
// ════════════════════════════════════════════════════════════════════════════

/// Add `color * intensity` onto `dst`, saturating per channel.
pub fn additive(dst: u32, color: Rgb, intensity: f32) -> u32 {
    let k = intensity.clamp(0.0, 1.0);
    let add = |shift: u32, c: u8| {
        let d = (dst >> shift) & 0xFF;
        (d + (c as f32 * k) as u32).min(0xFF)
    };
    0xFF000000 | add(16, color.r) << 16 | add(8, color.g) << 8 | add(0, color.b)
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
pub fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

/// Grey level `v` (0–255) as ARGB.
pub fn grey(v: u8) -> u32 {
    let v = v as u32;
    0xFF000000 | v << 16 | v << 8 | v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_starts_hot_pink() {
        let p = Palette::default();
        assert_eq!(p.current(), Rgb::from_hex("#FF0055").unwrap());
        assert_eq!(p.colors().len(), 5);
    }

    #[test]
    fn next_wraps() {
        let mut p = Palette::default();
        for _ in 0..5 { p.next(); }
        assert_eq!(p.index(), 0);
    }

    #[test]
    fn with_color_reuses_preset() {
        let p = Palette::default().with_color(Rgb::new(0xFF, 0xD7, 0x00));
        assert_eq!(p.index(), 2);
        assert_eq!(p.colors().len(), 5);
    }

    #[test]
    fn with_color_appends_custom() {
        let custom = Rgb::new(10, 20, 30);
        let p = Palette::default().with_color(custom);
        assert_eq!(p.colors().len(), 6);
        assert_eq!(p.current(), custom);
    }

    #[test]
    fn select_out_of_range() {
        let mut p = Palette::default();
        assert!(!p.select(9));
        assert!(p.select(4));
        assert_eq!(p.current(), Rgb::WHITE);
    }

    #[test]
    fn additive_saturates() {
        let white = additive(0xFFF0F0F0, Rgb::WHITE, 1.0);
        assert_eq!(white, 0xFFFFFFFF);
        let dim = additive(0xFF000000, Rgb::new(200, 100, 0), 0.5);
        assert_eq!(dim, 0xFF643200);
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 0.0), 0xFF000000);
        assert_eq!(blend(0xFF000000, 0xFFFFFFFF, 1.0), 0xFFFFFFFF);
    }
}
