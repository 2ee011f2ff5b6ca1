//! Top-level application state.
//!
//! `AppState` owns the `MorphEngine`, the palette, and the UI flags.  It
//! applies `UiCommand`s from the window, pulls the latest openness from the
//! signal source, and ticks the engine once per rendered frame.

use std::sync::mpsc;

use log::{info, warn};
use morph_field::{EngineConfig, MorphEngine, ParseColorError, Rgb};
use particle_shapes::{ShapeArchetype, ShapeGenerator, UnknownArchetype};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::gesture::{spawn_signal_source, SignalEvent, SignalInbox, SimInput, SourceStatus};
use crate::palette::Palette;
use crate::visualizer::{Overlay, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("window: {0}")]
    Window(#[from] minifb::Error),
    #[error(transparent)]
    Color(#[from] ParseColorError),
    #[error(transparent)]
    Shape(#[from] UnknownArchetype),
    #[error("particle count must be between 1 and {max}, got {got}")]
    ParticleCount { got: usize, max: usize },
}

/// Upper bound on particles; the software renderer slows down past this.
pub const MAX_PARTICLES: usize = 50_000;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Configuration for the full application.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub engine:        EngineConfig,
    pub initial_shape: ShapeArchetype,
    pub color:         Rgb,
    /// Seed for the shape targets; `None` draws from the thread RNG.
    pub seed:          Option<u64>,
    pub show_info:     bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            engine:        EngineConfig::default(),
            initial_shape: ShapeArchetype::Heart,
            color:         crate::palette::PRESET[0],
            seed:          None,
            show_info:     true,
        }
    }
}

impl AppConfig {
    pub fn shape(mut self, shape: ShapeArchetype) -> Self { self.initial_shape = shape; self }
    pub fn color(mut self, color: Rgb) -> Self { self.color = color; self }
    pub fn seed(mut self, seed: Option<u64>) -> Self { self.seed = seed; self }

    pub fn particles(mut self, n: usize) -> Result<Self, AppError> {
        if n == 0 || n > MAX_PARTICLES {
            return Err(AppError::ParticleCount { got: n, max: MAX_PARTICLES });
        }
        self.engine = self.engine.particle_count(n);
        Ok(self)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// UiCommand — discrete user interaction events
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiCommand {
    SelectShape(ShapeArchetype),
    NextShape,
    /// Swatch index into the palette; out of range is ignored.
    SelectColor(usize),
    NextColor,
    ToggleInfo,
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    engine:    MorphEngine,
    palette:   Palette,
    source:    SourceStatus,
    show_info: bool,
    quit:      bool,
}

impl AppState {
    pub fn new(cfg: AppConfig) -> Self {
        let gen = ShapeGenerator::new(cfg.engine.particle_count);
        let library = match cfg.seed {
            Some(seed) => gen.library(&mut StdRng::seed_from_u64(seed)),
            None       => gen.library(&mut rand::rng()),
        };

        let palette = Palette::default().with_color(cfg.color);
        let mut engine = MorphEngine::with_library(cfg.engine, library, cfg.initial_shape);
        engine.set_color(palette.current());

        AppState {
            engine,
            palette,
            source:    SourceStatus::Loading,
            show_info: cfg.show_info,
            quit:      false,
        }
    }

    // ── process one UiCommand ─────────────────────────────────────────────

    pub fn handle_command(&mut self, cmd: UiCommand) {
        match cmd {
            UiCommand::SelectShape(a) => self.engine.set_archetype(a),
            UiCommand::NextShape      => {
                let a = self.engine.archetype().next();
                self.engine.set_archetype(a);
            }
            UiCommand::SelectColor(i) => {
                if self.palette.select(i) {
                    self.engine.set_color(self.palette.current());
                }
            }
            UiCommand::NextColor      => {
                let c = self.palette.next();
                self.engine.set_color(c);
            }
            UiCommand::ToggleInfo     => self.show_info = !self.show_info,
            UiCommand::Quit           => self.quit = true,
        }
    }

    /// Apply one event straight from a source, bypassing the inbox.
    pub fn handle_signal(&mut self, event: SignalEvent) {
        match event {
            SignalEvent::Openness(v) => self.engine.set_signal(v),
            SignalEvent::Status(s)   => self.set_source_status(s),
        }
    }

    /// Take whatever the source published since the last frame.
    pub fn pull(&mut self, inbox: &mut SignalInbox) {
        self.engine.pull_signal(inbox);
        if let Some(s) = inbox.take_status() {
            self.set_source_status(s);
        }
        // a source that died without a word would otherwise still read as ready
        if inbox.is_disconnected() && !matches!(self.source, SourceStatus::Failed(_)) {
            self.set_source_status(SourceStatus::Failed("hand tracking stopped".to_string()));
        }
    }

    fn set_source_status(&mut self, status: SourceStatus) {
        match &status {
            SourceStatus::Failed(msg) => warn!("hand tracking unavailable: {}", msg),
            SourceStatus::Ready(name) => info!("hand tracking ready: {}", name),
            SourceStatus::Loading     => {}
        }
        self.source = status;
    }

    // ── Per-frame tick ────────────────────────────────────────────────────

    pub fn tick(&mut self) {
        self.engine.tick();
    }

    /// Hand the freshly ticked buffer to the visualizer.
    pub fn present(&mut self, vis: &mut Visualizer) {
        let overlay = Overlay {
            status:    &self.source,
            show_info: self.show_info,
            openness:  self.engine.signal(),
            archetype: self.engine.archetype(),
            palette:   &self.palette,
        };
        if let Some(frame) = self.engine.frame() {
            vis.render(&frame, &overlay);
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn engine(&self)        -> &MorphEngine   { &self.engine }
    pub fn palette(&self)       -> &Palette       { &self.palette }
    pub fn source_status(&self) -> &SourceStatus  { &self.source }
    pub fn show_info(&self)     -> bool           { self.show_info }
    pub fn should_quit(&self)   -> bool           { self.quit }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// This is the entry point called from `main.rs`.  It creates the visualizer,
/// the signal source (simulation by default, hardware with `--features leap`),
/// and drives one engine tick per rendered frame at ~60 fps.  Closing the
/// window ends the loop; no further ticks are issued.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    // ── Sim input channel ─────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();

    #[cfg(not(feature = "leap"))]
    let signal_rx = spawn_signal_source(crate::gesture::SimSignalSource::new(sim_rx));
    #[cfg(feature = "leap")]
    let signal_rx = {
        drop(sim_rx);
        spawn_signal_source(crate::gesture::LeapSignalSource::default())
    };
    let mut inbox = SignalInbox::new(signal_rx);

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(sim_tx)?;

    // ── App state ─────────────────────────────────────────────────────────
    info!(
        "{} particles, starting on {} in {}",
        cfg.engine.particle_count, cfg.initial_shape, cfg.color
    );
    let mut app = AppState::new(cfg);

    // ── Main loop ─────────────────────────────────────────────────────────
    while vis.is_open() && !app.should_quit() {
        // 1. Window input
        for cmd in vis.poll_input() {
            app.handle_command(cmd);
        }
        if app.should_quit() { break; }

        // 2. Latest openness (last value wins)
        app.pull(&mut inbox);

        // 3. Per-frame logic
        app.tick();

        // 4. Render
        app.present(&mut vis);
    }

    info!("window closed after {} ticks", app.engine().ticks());
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn make_app() -> AppState {
        let cfg = AppConfig::default().seed(Some(9)).particles(300).unwrap();
        AppState::new(cfg)
    }

    #[test]
    fn starts_on_configured_shape_and_color() {
        let cfg = AppConfig::default()
            .shape(ShapeArchetype::Saturn)
            .color(Rgb::new(0, 0xFF, 0xFF))
            .particles(100)
            .unwrap();
        let app = AppState::new(cfg);
        assert_eq!(app.engine().archetype(), ShapeArchetype::Saturn);
        assert_eq!(app.engine().color(), Rgb::new(0, 0xFF, 0xFF));
        assert_eq!(app.palette().index(), 1);
        assert_eq!(app.engine().live().len(), 100);
    }

    #[test]
    fn particle_count_bounds() {
        assert!(AppConfig::default().particles(0).is_err());
        assert!(AppConfig::default().particles(MAX_PARTICLES + 1).is_err());
        assert!(AppConfig::default().particles(MAX_PARTICLES).is_ok());
    }

    #[test]
    fn select_shape_switches_target() {
        let mut app = make_app();
        app.handle_command(UiCommand::SelectShape(ShapeArchetype::Firework));
        assert_eq!(app.engine().archetype(), ShapeArchetype::Firework);
    }

    #[test]
    fn next_shape_cycles() {
        let mut app = make_app();
        for _ in 0..ShapeArchetype::ALL.len() {
            app.handle_command(UiCommand::NextShape);
        }
        assert_eq!(app.engine().archetype(), ShapeArchetype::Heart);
    }

    #[test]
    fn next_color_updates_engine() {
        let mut app = make_app();
        app.handle_command(UiCommand::NextColor);
        assert_eq!(app.engine().color(), crate::palette::PRESET[1]);
    }

    #[test]
    fn swatch_click_selects_color() {
        let mut app = make_app();
        app.handle_command(UiCommand::SelectColor(3));
        assert_eq!(app.palette().index(), 3);
        assert_eq!(app.engine().color(), crate::palette::PRESET[3]);
        app.handle_command(UiCommand::SelectColor(42));
        assert_eq!(app.engine().color(), crate::palette::PRESET[3]);
    }

    #[test]
    fn toggle_info_and_quit() {
        let mut app = make_app();
        assert!(app.show_info());
        app.handle_command(UiCommand::ToggleInfo);
        assert!(!app.show_info());
        assert!(!app.should_quit());
        app.handle_command(UiCommand::Quit);
        assert!(app.should_quit());
    }

    #[test]
    fn openness_reaches_engine() {
        let mut app = make_app();
        app.handle_signal(SignalEvent::Openness(0.75));
        assert_eq!(app.engine().signal(), 0.75);
    }

    #[test]
    fn status_events_update_source() {
        let mut app = make_app();
        assert_eq!(app.source_status(), &SourceStatus::Loading);
        app.handle_signal(SignalEvent::Status(SourceStatus::Failed("no device".into())));
        assert_eq!(app.source_status(), &SourceStatus::Failed("no device".into()));
    }

    #[test]
    fn pull_drains_inbox() {
        let mut app = make_app();
        let (tx, rx) = mpsc::channel();
        let mut inbox = SignalInbox::new(rx);
        tx.send(SignalEvent::Openness(0.2)).unwrap();
        tx.send(SignalEvent::Status(SourceStatus::Ready("sim".into()))).unwrap();
        tx.send(SignalEvent::Openness(0.5)).unwrap();
        app.pull(&mut inbox);
        assert_eq!(app.engine().signal(), 0.5);
        assert_eq!(app.source_status(), &SourceStatus::Ready("sim".into()));
        // nothing new: signal holds
        app.pull(&mut inbox);
        assert_eq!(app.engine().signal(), 0.5);
    }

    #[test]
    fn lost_hand_returns_field_to_shape() {
        let mut app = make_app();
        app.handle_signal(SignalEvent::Openness(1.0));
        for _ in 0..20 { app.tick(); }
        let burst = app.engine().mean_distance_to_target();
        // no-hand frames arrive as 0.0
        app.handle_signal(SignalEvent::Openness(0.0));
        for _ in 0..300 { app.tick(); }
        assert!(app.engine().mean_distance_to_target() < burst * 0.01);
    }

    #[test]
    fn seeded_apps_share_targets() {
        let a = make_app();
        let b = make_app();
        assert_eq!(a.engine().live(), b.engine().live());
    }

    #[test]
    fn silent_hangup_marks_source_failed() {
        let mut app = make_app();
        let (tx, rx) = mpsc::channel();
        let mut inbox = SignalInbox::new(rx);
        tx.send(SignalEvent::Status(SourceStatus::Ready("sim".into()))).unwrap();
        tx.send(SignalEvent::Openness(0.6)).unwrap();
        app.pull(&mut inbox);
        assert_eq!(app.source_status(), &SourceStatus::Ready("sim".into()));

        drop(tx);
        app.pull(&mut inbox);
        assert_eq!(app.source_status(), &SourceStatus::Failed("hand tracking stopped".into()));
        assert_eq!(app.engine().signal(), 0.6);
    }

    #[test]
    fn hangup_keeps_reported_failure() {
        let mut app = make_app();
        let (tx, rx) = mpsc::channel();
        let mut inbox = SignalInbox::new(rx);
        tx.send(SignalEvent::Status(SourceStatus::Failed("no device".into()))).unwrap();
        drop(tx);
        app.pull(&mut inbox);
        assert_eq!(app.source_status(), &SourceStatus::Failed("no device".into()));
    }
}
