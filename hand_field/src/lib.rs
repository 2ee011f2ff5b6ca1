//! # hand_field
//!
//! A few thousand additive-blended points that morph between parametric
//! shapes and burst outward as the hand opens.  Openness is the normalized
//! thumb-tip to index-tip distance; the engine in `morph_field` turns it into
//! radial expansion and extra tumble.
//!
//! ## Controls
//!
//! | Key | Action |
//! |---|---|
//! | `1`–`5` | Select Heart, Flower, Saturn, Firework, Orb |
//! | `Tab` | Next shape |
//! | `C` | Next particle color |
//! | `I` | Toggle the info panel |
//! | Click a button / swatch | Select that shape / color |
//! | Left-drag on the field | Orbit the camera |
//! | `Q` / `Escape` | Quit |
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: the keyboard plays the hand.
//! * `leap` — **Hardware mode**: pinch distance from a LeapMotion controller.
//!
//! ### Simulation keyboard shortcuts
//!
//! | Key | Hand |
//! |---|---|
//! | `Space` (hold) | Spread thumb and index wide |
//! | `Up` / `Down` | Raise / lower the resting spread |
//! | `H` | Hand leaves / re-enters view (no hand reads as closed) |

pub mod gesture;
pub mod palette;
pub mod visualizer;
pub mod app;
