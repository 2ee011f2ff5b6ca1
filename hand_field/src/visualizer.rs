//! Software-rendered point-cloud visualizer using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ HAND PARTICLES                               ┌──────────────┐ │
//! │ status / error                               │ HOW TO       │ │
//! │                                              │ openness %   │ │
//! │                 · ·  particle field  · ·     │ [bar]        │ │
//! │              ·   (stars behind)        ·     └──────────────┘ │
//! │                                                               │
//! │        [HEART] [FLOWER] [SATURN] [FIREWORK] [ORB]             │
//! │                  ■  ■  ■  ■  ■   colors                       │
//! │ key legend                                                    │
//! └───────────────────────────────────────────────────────────────┘
//! ```

use std::sync::mpsc::Sender;

use glam::{Quat, Vec3};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use morph_field::FrameView;
use particle_shapes::ShapeArchetype;
use rand::Rng;

use crate::app::{AppError, UiCommand};
use crate::gesture::{SimInput, SourceStatus};
use crate::palette::{additive, blend, grey, Palette, PRESET};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:       usize = 960;
pub const WIN_H:       usize = 720;
const FOV_DEG:         f32   = 60.0;
const CAMERA_Z:        f32   = 10.0;
const POINT_SIZE:      f32   = 0.08;
const POINT_OPACITY:   f32   = 0.8;
const STAR_COUNT:      usize = 2000;
const BG_COLOR:        u32   = 0xFF07070C;
const PANEL_BG:        u32   = 0xFF101018;
const TITLE_COLOR:     u32   = 0xFFEC4899;
const TEXT_COLOR:      u32   = 0xFFDDDDDD;
const DIM_TEXT:        u32   = 0xFF777777;
const OK_COLOR:        u32   = 0xFF4ADE80;
const WAIT_COLOR:      u32   = 0xFFEAB308;
const ERR_COLOR:       u32   = 0xFFF87171;
const BAR_LOW:         u32   = 0xFF3B82F6;
const BAR_HIGH:        u32   = 0xFFEC4899;
const BUTTON_W:        usize = 120;
const BUTTON_H:        usize = 30;
const BUTTON_Y:        usize = WIN_H - 120;
const SWATCH:          usize = 22;
const SWATCH_Y:        usize = WIN_H - 72;
const INFO_X:          usize = WIN_W - 300;
const INFO_Y:          usize = 20;
const INFO_W:          usize = 280;
const INFO_H:          usize = 170;

// ════════════════════════════════════════════════════════════════════════════
// Projector — perspective camera on the +Z axis looking at the origin
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug)]
pub struct Projector {
    width:    f32,
    height:   f32,
    focal:    f32,
    camera_z: f32,
}

impl Projector {
    pub fn new(width: usize, height: usize, fov_deg: f32, camera_z: f32) -> Self {
        let half_fov = (fov_deg * 0.5).to_radians();
        Projector {
            width:  width as f32,
            height: height as f32,
            focal:  height as f32 * 0.5 / half_fov.tan(),
            camera_z,
        }
    }

    /// Screen position and depth, or `None` behind the near plane.
    pub fn project(&self, p: Vec3) -> Option<(f32, f32, f32)> {
        let depth = self.camera_z - p.z;
        if depth < 0.1 || !p.is_finite() {
            return None;
        }
        let s = self.focal / depth;
        Some((self.width * 0.5 + p.x * s, self.height * 0.5 - p.y * s, depth))
    }

    /// On-screen diameter of a sprite of `world_size` at `depth`.
    pub fn sprite_diameter(&self, world_size: f32, depth: f32) -> f32 {
        world_size * self.focal / depth
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Overlay — UI state drawn on top of the field
// ════════════════════════════════════════════════════════════════════════════

pub struct Overlay<'a> {
    pub status:    &'a SourceStatus,
    pub show_info: bool,
    pub openness:  f32,
    pub archetype: ShapeArchetype,
    pub palette:   &'a Palette,
}

/// Status line text and color.
pub fn status_line(status: &SourceStatus) -> (String, u32) {
    match status {
        SourceStatus::Loading      => ("LOADING HAND TRACKING...".to_string(), WAIT_COLOR),
        SourceStatus::Ready(name)  => (format!("TRACKING: {}", name), OK_COLOR),
        SourceStatus::Failed(msg)  => (msg.clone(), ERR_COLOR),
    }
}

/// Left edge of the shape button at `index`, centred as a row.
fn button_x(index: usize) -> usize {
    let row_w = ShapeArchetype::ALL.len() * (BUTTON_W + 10) - 10;
    (WIN_W - row_w) / 2 + index * (BUTTON_W + 10)
}

/// Left edge of swatch `index` in a centred row of `count`.
fn swatch_x(index: usize, count: usize) -> usize {
    let row_w = (count * (SWATCH + 12)).saturating_sub(12);
    WIN_W.saturating_sub(row_w) / 2 + index * (SWATCH + 12)
}

/// A clickable overlay element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hit {
    Shape(ShapeArchetype),
    Swatch(usize),
}

/// What lies under the pointer at `(x, y)`, given `swatches` color swatches.
pub fn hit_test(x: f32, y: f32, swatches: usize) -> Option<Hit> {
    if x < 0.0 || y < 0.0 {
        return None;
    }
    let (x, y) = (x as usize, y as usize);

    if (BUTTON_Y..BUTTON_Y + BUTTON_H).contains(&y) {
        return ShapeArchetype::ALL.into_iter()
            .find(|a| (button_x(a.index())..button_x(a.index()) + BUTTON_W).contains(&x))
            .map(Hit::Shape);
    }
    if (SWATCH_Y..SWATCH_Y + SWATCH).contains(&y) {
        return (0..swatches)
            .find(|&i| (swatch_x(i, swatches)..swatch_x(i, swatches) + SWATCH).contains(&x))
            .map(Hit::Swatch);
    }
    None
}

// ════════════════════════════════════════════════════════════════════════════
// Orbit — left-drag turns the camera around the field
// ════════════════════════════════════════════════════════════════════════════

/// Camera yaw/pitch from mouse drags, composed after the engine rotation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Orbit {
    pub yaw:   f32,
    pub pitch: f32,
}

impl Orbit {
    /// Radians per pixel dragged.
    const SENSITIVITY: f32 = 0.005;
    const PITCH_LIMIT: f32 = 1.4;

    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.yaw  += dx * Self::SENSITIVITY;
        self.pitch = (self.pitch + dy * Self::SENSITIVITY).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_rotation_x(self.pitch) * Quat::from_rotation_y(self.yaw)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:     Window,
    buf:        Vec<u32>,
    sim_tx:     Sender<SimInput>,
    projector:  Projector,
    /// Static backdrop: (pixel index, color).
    stars:      Vec<(usize, u32)>,
    orbit:      Orbit,
    mouse_down: bool,
    drag_from:  Option<(f32, f32)>,
    /// Swatch count drawn last frame, for hit-testing.
    swatches:   usize,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>) -> Result<Self, AppError> {
        let mut window = Window::new(
            "Hand Particles",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )?;

        window.set_target_fps(60);

        let projector = Projector::new(WIN_W, WIN_H, FOV_DEG, CAMERA_Z);
        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
            projector,
            stars: star_field(&projector, &mut rand::rng()),
            orbit: Orbit::default(),
            mouse_down: false,
            drag_from: None,
            swatches: PRESET.len(),
        })
    }

    /// Returns false when the window should close.
    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Poll the keyboard.  Hand keys go to the simulated signal source;
    /// everything else comes back as UI commands.
    pub fn poll_input(&mut self) -> Vec<UiCommand> {
        let mut out = Vec::new();
        if !self.window.is_open() {
            out.push(UiCommand::Quit);
            return out;
        }

        self.poll_mouse(&mut out);

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        let held     = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        if one_shot(Key::Q) || one_shot(Key::Escape) {
            let _ = self.sim_tx.send(SimInput::Quit);
            out.push(UiCommand::Quit);
            return out;
        }

        let shape_keys = [Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5];
        for (i, &k) in shape_keys.iter().enumerate() {
            if one_shot(k) {
                if let Some(a) = ShapeArchetype::from_index(i) {
                    out.push(UiCommand::SelectShape(a));
                }
            }
        }
        if one_shot(Key::Tab) { out.push(UiCommand::NextShape); }
        if one_shot(Key::C)   { out.push(UiCommand::NextColor); }
        if one_shot(Key::I)   { out.push(UiCommand::ToggleInfo); }

        // Simulated hand
        if one_shot(Key::Space) {
            let _ = self.sim_tx.send(SimInput::Open(true));
        }
        if self.window.is_key_released(Key::Space) {
            let _ = self.sim_tx.send(SimInput::Open(false));
        }
        if held(Key::Up)   { let _ = self.sim_tx.send(SimInput::Nudge( 0.05)); }
        if held(Key::Down) { let _ = self.sim_tx.send(SimInput::Nudge(-0.05)); }
        if one_shot(Key::H) { let _ = self.sim_tx.send(SimInput::ToggleHand); }

        out
    }

    /// A press on a button or swatch selects it; a press anywhere else
    /// starts an orbit drag that lasts until release.
    fn poll_mouse(&mut self, out: &mut Vec<UiCommand>) {
        let down = self.window.get_mouse_down(MouseButton::Left);
        if let Some((x, y)) = self.window.get_mouse_pos(MouseMode::Discard) {
            if down && !self.mouse_down {
                match hit_test(x, y, self.swatches) {
                    Some(Hit::Shape(a))  => out.push(UiCommand::SelectShape(a)),
                    Some(Hit::Swatch(i)) => out.push(UiCommand::SelectColor(i)),
                    None                 => self.drag_from = Some((x, y)),
                }
            } else if let (true, Some((px, py))) = (down, self.drag_from) {
                self.orbit.drag(x - px, y - py);
                self.drag_from = Some((x, y));
            }
        }
        if !down {
            self.drag_from = None;
        }
        self.mouse_down = down;
    }

    /// Render one frame.
    pub fn render(&mut self, frame: &FrameView<'_>, overlay: &Overlay<'_>) {
        self.buf.fill(BG_COLOR);

        for &(i, c) in &self.stars {
            self.buf[i] = c;
        }

        self.swatches = overlay.palette.colors().len();
        self.draw_particles(frame);
        self.draw_overlay(overlay);

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Particles ─────────────────────────────────────────────────────────

    fn draw_particles(&mut self, frame: &FrameView<'_>) {
        let color = frame.color;
        let orbit = self.orbit.to_quat();
        for p in frame.rotated() {
            let p = orbit * p;
            let Some((sx, sy, depth)) = self.projector.project(p) else { continue };
            let d = self.projector.sprite_diameter(POINT_SIZE, depth).clamp(1.0, 8.0);
            let half = d * 0.5;
            let x0 = (sx - half).floor() as isize;
            let y0 = (sy - half).floor() as isize;
            let n  = d.ceil() as isize;
            for dy in 0..n {
                for dx in 0..n {
                    let (x, y) = (x0 + dx, y0 + dy);
                    if x < 0 || y < 0 || x >= WIN_W as isize || y >= WIN_H as isize {
                        continue;
                    }
                    let idx = y as usize * WIN_W + x as usize;
                    self.buf[idx] = additive(self.buf[idx], color, POINT_OPACITY);
                }
            }
        }
    }

    // ── Overlay ───────────────────────────────────────────────────────────

    fn draw_overlay(&mut self, ov: &Overlay<'_>) {
        self.draw_label("HAND PARTICLES", 20, 20, 3, TITLE_COLOR);
        let (status, status_color) = status_line(ov.status);
        self.draw_label(&status, 20, 46, 2, status_color);

        if ov.show_info {
            self.draw_info(ov.openness);
        }

        // Shape selector
        for a in ShapeArchetype::ALL {
            let x = button_x(a.index());
            let active = a == ov.archetype;
            let bg = if active { blend(PANEL_BG, 0xFFFFFFFF, 0.2) } else { PANEL_BG };
            self.fill_rect(x, BUTTON_Y, BUTTON_W, BUTTON_H, bg);
            if active {
                self.draw_border(x, BUTTON_Y, BUTTON_W, BUTTON_H, 0xFFFFFFFF);
            }
            let label = format!("{} {}", a.index() + 1, a.label());
            let lx = x + BUTTON_W.saturating_sub(label.len() * 8) / 2;
            self.draw_label(&label, lx, BUTTON_Y + 10, 2, if active { 0xFFFFFFFF } else { DIM_TEXT });
        }

        // Color swatches
        let colors = ov.palette.colors();
        for (i, c) in colors.iter().enumerate() {
            let x = swatch_x(i, colors.len());
            self.fill_rect(x, SWATCH_Y, SWATCH, SWATCH, c.to_argb());
            if i == ov.palette.index() {
                self.draw_border(x.saturating_sub(3), SWATCH_Y - 3, SWATCH + 6, SWATCH + 6, 0xFFFFFFFF);
            }
        }

        self.draw_label(
            "1-5/click=shape  tab=next  c=color  drag=orbit  space=open  up/down=spread  h=hand  i=info  q=quit",
            20, WIN_H - 24, 2, DIM_TEXT,
        );
    }

    fn draw_info(&mut self, openness: f32) {
        self.fill_rect(INFO_X, INFO_Y, INFO_W, INFO_H, PANEL_BG);
        self.draw_border(INFO_X, INFO_Y, INFO_W, INFO_H, 0xFF333344);

        let lines = [
            ("HOW TO CONTROL",        TEXT_COLOR),
            ("1. raise one hand",     DIM_TEXT),
            ("2. pinch to contract",  DIM_TEXT),
            ("3. open to burst",      DIM_TEXT),
        ];
        for (row, (text, color)) in lines.iter().enumerate() {
            self.draw_label(text, INFO_X + 14, INFO_Y + 14 + row * 22, 2, *color);
        }

        let pct = (openness.clamp(0.0, 1.0) * 100.0).round() as u32;
        let text = format!("openness: {}%", pct);
        self.draw_label(&text, INFO_X + 14, INFO_Y + 112, 2, TEXT_COLOR);

        let bar_x = INFO_X + 14;
        let bar_y = INFO_Y + 140;
        let bar_w = INFO_W - 28;
        self.fill_rect(bar_x, bar_y, bar_w, 8, 0xFF1F2937);
        let filled = (bar_w as f32 * openness.clamp(0.0, 1.0)) as usize;
        for col in 0..filled {
            let c = blend(BAR_LOW, BAR_HIGH, col as f32 / bar_w as f32);
            self.fill_rect(bar_x + col, bar_y, 1, 8, c);
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x+w).min(WIN_W) {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..(y+h).min(WIN_H) {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    /// 3×5 bitmap font, each cell drawn as a `scale`×`scale` block.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for row in 0..5usize {
                for col in 0..3usize {
                    if glyph & (1 << (14 - (row * 3 + col))) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale;
            if cx + 4 * scale > WIN_W { break; }
        }
    }
}

/// Scatter dim stars on a thick shell far behind the field.
fn star_field<R: Rng + ?Sized>(projector: &Projector, rng: &mut R) -> Vec<(usize, u32)> {
    let mut stars = Vec::with_capacity(STAR_COUNT);
    for _ in 0..STAR_COUNT {
        let dir = particle_shapes::sample_point(ShapeArchetype::Sphere, rng).normalize_or_zero();
        let p = dir * rng.random_range(100.0..150.0);
        if let Some((sx, sy, _)) = projector.project(p) {
            if sx >= 0.0 && sy >= 0.0 && (sx as usize) < WIN_W && (sy as usize) < WIN_H {
                let level = rng.random_range(40..160u8);
                stars.push((sy as usize * WIN_W + sx as usize, grey(level)));
            }
        }
    }
    stars
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font, 15 bits per glyph, top row in the high bits
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> u16 {
    match c.to_ascii_uppercase() {
        '0' => 0b111_101_101_101_111,
        '1' => 0b010_110_010_010_111,
        '2' => 0b111_001_111_100_111,
        '3' => 0b111_001_111_001_111,
        '4' => 0b101_101_111_001_001,
        '5' => 0b111_100_111_001_111,
        '6' => 0b111_100_111_101_111,
        '7' => 0b111_001_001_001_001,
        '8' => 0b111_101_111_101_111,
        '9' => 0b111_101_111_001_111,
        'A' => 0b111_101_111_101_101,
        'B' => 0b110_101_110_101_110,
        'C' => 0b111_100_100_100_111,
        'D' => 0b110_101_101_101_110,
        'E' => 0b111_100_111_100_111,
        'F' => 0b111_100_111_100_100,
        'G' => 0b111_100_101_101_111,
        'H' => 0b101_101_111_101_101,
        'I' => 0b111_010_010_010_111,
        'J' => 0b001_001_001_101_111,
        'K' => 0b101_101_110_101_101,
        'L' => 0b100_100_100_100_111,
        'M' => 0b101_111_101_101_101,
        'N' => 0b111_101_101_101_101,
        'O' => 0b111_101_101_101_111,
        'P' => 0b111_101_111_100_100,
        'Q' => 0b111_101_101_111_001,
        'R' => 0b110_101_110_101_101,
        'S' => 0b111_100_111_001_111,
        'T' => 0b111_010_010_010_010,
        'U' => 0b101_101_101_101_111,
        'V' => 0b101_101_101_010_010,
        'W' => 0b101_101_101_111_101,
        'X' => 0b101_101_010_101_101,
        'Y' => 0b101_101_111_010_010,
        'Z' => 0b111_001_010_100_111,
        '/' => 0b001_001_010_100_100,
        '-' => 0b000_000_111_000_000,
        '.' => 0b000_000_000_000_010,
        ',' => 0b000_000_000_010_100,
        ':' => 0b000_010_000_010_000,
        '=' => 0b000_111_000_111_000,
        '+' => 0b000_010_111_010_000,
        '%' => 0b101_001_010_100_101,
        '(' => 0b010_100_100_100_010,
        ')' => 0b010_001_001_001_010,
        '?' => 0b111_001_011_000_010,
        '\'' => 0b010_010_000_000_000,
        ';' => 0b000_010_000_010_100,
        ' ' => 0,
        _   => 0b000_000_010_000_000, // fallback dot
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
