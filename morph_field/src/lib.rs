//! # morph_field
//!
//! A live particle buffer that continuously relaxes toward one of the
//! [`particle_shapes`] targets and bursts outward while a hand-openness
//! signal is high.
//!
//! ## Data flow
//!
//! | Stage | Cadence | Type |
//! |---|---|---|
//! | fingertip landmarks → openness | per captured frame | [`signal::PinchCalibration`] |
//! | openness → engine | last value wins | [`signal::SignalProvider`], [`MorphEngine::set_signal`] |
//! | morph + expand + rotate | per rendered frame | [`MorphEngine::tick`] |
//! | live buffer → presentation | once per dirty tick | [`MorphEngine::frame`] |
//!
//! ## Quick start
//!
//! ```rust
//! use morph_field::{EngineConfig, MorphEngine};
//! use particle_shapes::ShapeArchetype;
//!
//! let mut engine = MorphEngine::new(EngineConfig::default().particle_count(1000),
//!                                   ShapeArchetype::Sphere);
//! engine.set_archetype(ShapeArchetype::Heart);
//! engine.set_signal(0.8);
//! engine.tick();
//!
//! let frame = engine.frame().expect("tick marks the buffer dirty");
//! assert_eq!(frame.len(), 1000);
//! ```

pub mod engine;
pub mod render;
pub mod signal;

pub use engine::{expand, morph_toward, EngineConfig, MorphEngine};
pub use render::{FrameView, ParseColorError, RenderBinding, Rgb, Rotation};
pub use signal::{normalize, openness, HandObservation, PinchCalibration, SignalProvider};
