//! The morph/interaction engine.
//!
//! `MorphEngine` owns the one live particle buffer.  Each [`tick`] runs
//! three steps in a fixed order:
//!
//! 1. **Morph**: every coordinate moves `morph_rate` of the way toward the
//!    active archetype's target (first-order low-pass, never a snap).
//! 2. **Expand**: if the signal is above the deadzone, every particle is
//!    scaled by `1 + signal * expansion_rate`.  This compounds tick over
//!    tick; only step 1 pulls the field back once the signal drops.
//! 3. **Rotate**: constant spin plus a signal-proportional tumble, then the
//!    render binding is marked dirty.
//!
//! Switching archetype only changes the selector.  The buffer is never
//! reallocated.
//!
//! [`tick`]: MorphEngine::tick

use glam::Vec3;
use log::debug;
use particle_shapes::{ShapeArchetype, ShapeLibrary, TargetBuffer, DEFAULT_PARTICLE_COUNT};

use crate::render::{FrameView, RenderBinding, Rgb, Rotation};
use crate::signal::SignalProvider;

// ════════════════════════════════════════════════════════════════════════════
// EngineConfig
// ════════════════════════════════════════════════════════════════════════════

/// Tuning constants for the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineConfig {
    pub particle_count: usize,
    /// Fraction of the remaining distance covered per tick.
    pub morph_rate:     f32,
    /// Per-tick radial growth at full signal.
    pub expansion_rate: f32,
    /// Signals at or below this value apply no expansion.
    pub deadzone:       f32,
    /// Radians per tick around the vertical axis.
    pub base_spin:      f32,
    /// Radians per tick around the viewing axis at full signal.
    pub tumble_gain:    f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            particle_count: DEFAULT_PARTICLE_COUNT,
            morph_rate:     0.05,
            expansion_rate: 0.05,
            deadzone:       0.05,
            base_spin:      0.002,
            tumble_gain:    0.01,
        }
    }
}

impl EngineConfig {
    pub fn particle_count(mut self, n: usize) -> Self { self.particle_count = n; self }
    pub fn morph_rate(mut self, r: f32) -> Self { self.morph_rate = r.clamp(0.0, 1.0); self }
    pub fn expansion_rate(mut self, r: f32) -> Self { self.expansion_rate = r.max(0.0); self }
    pub fn deadzone(mut self, d: f32) -> Self { self.deadzone = d.clamp(0.0, 1.0); self }
    pub fn base_spin(mut self, s: f32) -> Self { self.base_spin = s; self }
    pub fn tumble_gain(mut self, g: f32) -> Self { self.tumble_gain = g; self }
}

// ════════════════════════════════════════════════════════════════════════════
// Step functions
// ════════════════════════════════════════════════════════════════════════════

/// Move every particle `rate` of the way toward its target.
///
/// A particle already on its target stays put.
pub fn morph_toward(live: &mut [Vec3], target: &[Vec3], rate: f32) {
    for (p, t) in live.iter_mut().zip(target) {
        p.x += (t.x - p.x) * rate;
        p.y += (t.y - p.y) * rate;
        p.z += (t.z - p.z) * rate;
    }
}

/// Radial push.  Returns `false` (and leaves the buffer alone) when the
/// signal is inside the deadzone.
pub fn expand(live: &mut [Vec3], signal: f32, rate: f32, deadzone: f32) -> bool {
    if signal <= deadzone {
        return false;
    }
    let expansion = 1.0 + signal * rate;
    for p in live.iter_mut() {
        *p *= expansion;
    }
    true
}

// ════════════════════════════════════════════════════════════════════════════
// MorphEngine
// ════════════════════════════════════════════════════════════════════════════

pub struct MorphEngine {
    config:   EngineConfig,
    library:  ShapeLibrary,
    live:     Vec<Vec3>,
    active:   ShapeArchetype,
    signal:   f32,
    rotation: Rotation,
    color:    Rgb,
    binding:  RenderBinding,
    ticks:    u64,
}

impl MorphEngine {
    /// Generate every target with the thread RNG and start on `initial`.
    pub fn new(config: EngineConfig, initial: ShapeArchetype) -> Self {
        Self::with_library(config, ShapeLibrary::new(config.particle_count), initial)
    }

    /// Use prebuilt targets.  The library's length wins over
    /// `config.particle_count`.
    pub fn with_library(mut config: EngineConfig, library: ShapeLibrary, initial: ShapeArchetype) -> Self {
        config.particle_count = library.count();
        let live = library.target(initial).as_slice().to_vec();
        MorphEngine {
            config,
            library,
            live,
            active:   initial,
            signal:   0.0,
            rotation: Rotation::default(),
            color:    Rgb::WHITE,
            binding:  RenderBinding::default(),
            ticks:    0,
        }
    }

    /// Overwrite the live buffer, e.g. to start from a known pose.
    /// Positions beyond the particle count are ignored; missing ones keep
    /// their current value.
    pub fn place(&mut self, positions: &[Vec3]) {
        for (p, q) in self.live.iter_mut().zip(positions) {
            *p = *q;
        }
        self.binding.mark_dirty();
    }

    // ── inputs ────────────────────────────────────────────────────────────

    pub fn set_archetype(&mut self, archetype: ShapeArchetype) {
        if archetype != self.active {
            debug!("morph target {} -> {} at tick {}", self.active, archetype, self.ticks);
            self.active = archetype;
        }
    }

    /// Store the latest openness.  Clamped into `[0, 1]`; NaN reads as closed.
    pub fn set_signal(&mut self, signal: f32) {
        self.signal = if signal.is_nan() { 0.0 } else { signal.clamp(0.0, 1.0) };
    }

    /// Take the newest value from `provider`, if it has one.
    pub fn pull_signal<P: SignalProvider + ?Sized>(&mut self, provider: &mut P) -> bool {
        match provider.latest_signal() {
            Some(s) => { self.set_signal(s); true }
            None    => false,
        }
    }

    /// Presentation-only; marks the frame dirty when the color changes.
    pub fn set_color(&mut self, color: Rgb) {
        if color != self.color {
            self.color = color;
            self.binding.mark_dirty();
        }
    }

    // ── per-frame ─────────────────────────────────────────────────────────

    /// Advance one rendered frame.
    pub fn tick(&mut self) {
        let target = self.library.target(self.active).as_slice();
        morph_toward(&mut self.live, target, self.config.morph_rate);
        expand(&mut self.live, self.signal, self.config.expansion_rate, self.config.deadzone);
        self.rotation.advance(self.signal, self.config.base_spin, self.config.tumble_gain);
        self.ticks += 1;
        self.binding.mark_dirty();
    }

    /// The current view, if it changed since the last call.
    pub fn frame(&mut self) -> Option<FrameView<'_>> {
        let generation = self.binding.take()?;
        Some(self.view_at(generation))
    }

    /// The current view, without touching the dirty flag.
    pub fn view(&self) -> FrameView<'_> {
        self.view_at(self.binding.generation())
    }

    fn view_at(&self, generation: u64) -> FrameView<'_> {
        FrameView {
            positions: &self.live,
            rotation:  self.rotation,
            color:     self.color,
            archetype: self.active,
            signal:    self.signal,
            generation,
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn config(&self)    -> &EngineConfig   { &self.config }
    pub fn live(&self)      -> &[Vec3]         { &self.live }
    pub fn archetype(&self) -> ShapeArchetype  { self.active }
    pub fn signal(&self)    -> f32             { self.signal }
    pub fn rotation(&self)  -> Rotation        { self.rotation }
    pub fn color(&self)     -> Rgb             { self.color }
    pub fn ticks(&self)     -> u64             { self.ticks }
    pub fn needs_upload(&self) -> bool         { self.binding.is_dirty() }

    pub fn target(&self) -> &TargetBuffer {
        self.library.target(self.active)
    }

    pub fn library(&self) -> &ShapeLibrary { &self.library }

    /// Mean particle distance from its target position.
    pub fn mean_distance_to_target(&self) -> f32 {
        if self.live.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.live.iter()
            .zip(self.target().as_slice())
            .map(|(p, t)| p.distance(*t) as f64)
            .sum();
        (sum / self.live.len() as f64) as f32
    }

    /// Largest particle distance from its target position.
    pub fn max_distance_to_target(&self) -> f32 {
        self.live.iter()
            .zip(self.target().as_slice())
            .map(|(p, t)| p.distance(*t))
            .fold(0.0, f32::max)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use particle_shapes::ShapeGenerator;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::mpsc;

    fn library(n: usize, jitter: f32) -> ShapeLibrary {
        ShapeGenerator::new(n).jitter(jitter).library(&mut StdRng::seed_from_u64(42))
    }

    fn engine(initial: ShapeArchetype) -> MorphEngine {
        MorphEngine::with_library(EngineConfig::default(), library(500, 0.05), initial)
    }

    #[test]
    fn starts_on_initial_target() {
        let e = engine(ShapeArchetype::Flower);
        assert_eq!(e.live(), e.target().as_slice());
        assert_eq!(e.live().len(), 500);
        assert_eq!(e.config().particle_count, 500);
    }

    #[test]
    fn morph_step_idempotent_at_target() {
        let lib = library(200, 0.05);
        let target = lib.target(ShapeArchetype::Saturn).as_slice();
        let mut live = target.to_vec();
        morph_toward(&mut live, target, 0.05);
        for (p, t) in live.iter().zip(target) {
            assert!((*p - *t).length() < 1e-6);
        }
    }

    #[test]
    fn morph_converges_monotonically() {
        let lib = library(200, 0.05);
        let target = lib.target(ShapeArchetype::Heart).as_slice();
        let mut live = lib.target(ShapeArchetype::Firework).as_slice().to_vec();
        let mut last: Vec<f32> = live.iter().zip(target).map(|(p, t)| p.distance(*t)).collect();
        for _ in 0..300 {
            morph_toward(&mut live, target, 0.05);
            for (i, (p, t)) in live.iter().zip(target).enumerate() {
                let d = p.distance(*t);
                assert!(d <= last[i] + 1e-6, "particle {} moved away", i);
                last[i] = d;
            }
        }
        assert!(last.iter().all(|&d| d < 1e-3));
    }

    #[test]
    fn expansion_compounds_outward() {
        let lib = library(100, 0.05);
        let mut live = lib.target(ShapeArchetype::Sphere).as_slice().to_vec();
        let mut last: Vec<f32> = live.iter().map(|p| p.length()).collect();
        for _ in 0..20 {
            assert!(expand(&mut live, 1.0, 0.05, 0.05));
            for (i, p) in live.iter().enumerate() {
                assert!(p.length() > last[i]);
                last[i] = p.length();
            }
        }
    }

    #[test]
    fn deadzone_blocks_expansion() {
        let mut live = vec![Vec3::new(1.0, 2.0, 3.0); 4];
        let before = live.clone();
        assert!(!expand(&mut live, 0.05, 0.05, 0.05));
        assert!(!expand(&mut live, 0.0, 0.05, 0.05));
        assert_eq!(live, before);
    }

    #[test]
    fn held_signal_grows_field() {
        let mut e = engine(ShapeArchetype::Sphere);
        e.set_signal(1.0);
        let start = particle_shapes::radius_stats(e.live()).mean;
        for _ in 0..200 { e.tick(); }
        let end = particle_shapes::radius_stats(e.live()).mean;
        assert!(end > start);
    }

    #[test]
    fn sphere_to_heart_settles() {
        let lib = library(400, 0.0);
        let mut e = MorphEngine::with_library(EngineConfig::default(), lib, ShapeArchetype::Sphere);
        assert!(e.live().iter().all(|p| (p.length() - 3.0).abs() < 1e-4));

        e.set_archetype(ShapeArchetype::Heart);
        e.set_signal(0.0);
        for _ in 0..400 { e.tick(); }
        assert!(e.max_distance_to_target() < 1e-3, "max {}", e.max_distance_to_target());
    }

    #[test]
    fn pulse_stays_finite_and_recovers() {
        let mut e = engine(ShapeArchetype::Saturn);
        e.set_signal(0.0);
        e.tick();
        e.set_signal(1.0);
        e.tick();
        let after_pulse = e.mean_distance_to_target();
        assert!(after_pulse > 0.0);
        e.set_signal(0.0);
        e.tick();
        assert!(e.live().iter().all(|p| p.is_finite()));
        assert!(e.mean_distance_to_target() < after_pulse);
    }

    #[test]
    fn switch_keeps_buffer_length_and_does_not_snap() {
        let mut e = engine(ShapeArchetype::Heart);
        let before = e.live().to_vec();
        e.set_archetype(ShapeArchetype::Firework);
        assert_eq!(e.live(), &before[..]);
        e.tick();
        assert_eq!(e.live().len(), 500);
        assert!(e.max_distance_to_target() > 0.0);
    }

    #[test]
    fn signal_is_clamped() {
        let mut e = engine(ShapeArchetype::Heart);
        e.set_signal(3.0);
        assert_eq!(e.signal(), 1.0);
        e.set_signal(-1.0);
        assert_eq!(e.signal(), 0.0);
        e.set_signal(f32::NAN);
        assert_eq!(e.signal(), 0.0);
    }

    #[test]
    fn rotation_tumbles_with_signal() {
        let mut calm = engine(ShapeArchetype::Heart);
        let mut busy = engine(ShapeArchetype::Heart);
        busy.set_signal(1.0);
        for _ in 0..10 { calm.tick(); busy.tick(); }
        assert!((calm.rotation().y - 0.02).abs() < 1e-6);
        assert_eq!(calm.rotation().z, 0.0);
        assert!((busy.rotation().z - 0.1).abs() < 1e-5);
    }

    #[test]
    fn frame_is_dirty_once_per_tick() {
        let mut e = engine(ShapeArchetype::Heart);
        assert!(e.frame().is_none());
        e.tick();
        assert!(e.needs_upload());
        let g = e.frame().map(|f| (f.generation, f.len()));
        assert_eq!(g, Some((1, 500)));
        assert!(e.frame().is_none());
        assert_eq!(e.view().generation, 1);
    }

    #[test]
    fn pull_signal_last_value_wins() {
        let mut e = engine(ShapeArchetype::Heart);
        let (tx, mut rx) = mpsc::channel::<f32>();
        tx.send(0.2).unwrap();
        tx.send(0.9).unwrap();
        assert!(e.pull_signal(&mut rx));
        assert_eq!(e.signal(), 0.9);
        // nothing new: keep the old value
        assert!(!e.pull_signal(&mut rx));
        assert_eq!(e.signal(), 0.9);
    }

    #[test]
    fn place_overrides_live_buffer() {
        let mut e = engine(ShapeArchetype::Heart);
        e.place(&vec![Vec3::ONE; 500]);
        assert!(e.live().iter().all(|p| *p == Vec3::ONE));
        assert!(e.needs_upload());
    }

    #[test]
    fn color_change_needs_upload() {
        let mut e = engine(ShapeArchetype::Heart);
        assert!(!e.needs_upload());
        e.set_color(Rgb::WHITE);
        assert!(!e.needs_upload());
        e.set_color(Rgb::new(1, 2, 3));
        assert!(e.needs_upload());
        let c = e.frame().map(|f| f.color);
        assert_eq!(c, Some(Rgb::new(1, 2, 3)));
        assert!(e.frame().is_none());
    }

    #[test]
    fn zero_deadzone_expands_any_signal() {
        let cfg = EngineConfig::default().deadzone(0.0).morph_rate(0.0);
        let mut e = MorphEngine::with_library(cfg, library(100, 0.05), ShapeArchetype::Sphere);
        let start = particle_shapes::radius_stats(e.live()).mean;
        e.set_signal(0.02);
        e.tick();
        assert!(particle_shapes::radius_stats(e.live()).mean > start);
    }

    #[test]
    fn config_setters_clamp() {
        let cfg = EngineConfig::default()
            .morph_rate(2.0)
            .expansion_rate(-1.0)
            .deadzone(1.5)
            .base_spin(0.0)
            .tumble_gain(0.5);
        assert_eq!(cfg.morph_rate, 1.0);
        assert_eq!(cfg.expansion_rate, 0.0);
        assert_eq!(cfg.deadzone, 1.0);

        let mut e = MorphEngine::with_library(cfg, library(50, 0.05), ShapeArchetype::Heart);
        e.set_signal(1.0);
        e.tick();
        assert_eq!(e.rotation().y, 0.0);
        assert!((e.rotation().z - 0.5).abs() < 1e-6);
    }

    #[test]
    fn place_from_library_snaps_to_other_shape() {
        let mut e = engine(ShapeArchetype::Heart);
        let orb = e.library().target(ShapeArchetype::Sphere).as_slice().to_vec();
        e.place(&orb);
        assert_eq!(e.live(), &orb[..]);
        assert_eq!(e.archetype(), ShapeArchetype::Heart);
    }
}
