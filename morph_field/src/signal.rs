//! Hand-openness signal: from two fingertip landmarks to a scalar in `[0, 1]`.
//!
//! The distance between thumb tip and index tip is clamped into a calibrated
//! band and rescaled.  A frame with no hand produces `0.0`, the same value
//! as a fully pinched hand, so the field settles back into its pure shape
//! whenever tracking drops out.

use std::sync::mpsc::Receiver;

use glam::Vec3;

/// Pinch distance (normalized image units) that maps to `0.0`.
pub const MIN_PINCH_DISTANCE: f32 = 0.03;
/// Pinch distance (normalized image units) that maps to `1.0`.
pub const MAX_PINCH_DISTANCE: f32 = 0.20;

// ════════════════════════════════════════════════════════════════════════════
// PinchCalibration
// ════════════════════════════════════════════════════════════════════════════

/// Distance band mapped onto `[0, 1]`.  `max_distance > min_distance`
/// always holds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchCalibration {
    min_distance: f32,
    max_distance: f32,
}

impl PinchCalibration {
    /// Landmarks in normalized image coordinates.
    pub const DEFAULT: PinchCalibration = PinchCalibration {
        min_distance: MIN_PINCH_DISTANCE,
        max_distance: MAX_PINCH_DISTANCE,
    };

    /// Landmarks in LeapMotion millimetres.
    pub const LEAP_MILLIMETRES: PinchCalibration = PinchCalibration {
        min_distance: 20.0,
        max_distance: 110.0,
    };

    /// `None` unless both bounds are finite and `max > min`.
    pub fn new(min_distance: f32, max_distance: f32) -> Option<Self> {
        if min_distance.is_finite() && max_distance.is_finite() && max_distance > min_distance {
            Some(PinchCalibration { min_distance, max_distance })
        } else {
            None
        }
    }

    pub fn min_distance(&self) -> f32 { self.min_distance }
    pub fn max_distance(&self) -> f32 { self.max_distance }

    /// Rescale a raw distance.  Non-finite input maps to `0.0`.
    pub fn scale(&self, distance: f32) -> f32 {
        if !distance.is_finite() {
            return 0.0;
        }
        ((distance - self.min_distance) / (self.max_distance - self.min_distance)).clamp(0.0, 1.0)
    }

    pub fn normalize(&self, thumb_tip: Vec3, index_tip: Vec3) -> f32 {
        self.scale(thumb_tip.distance(index_tip))
    }

    pub fn openness(&self, observation: &HandObservation) -> f32 {
        match *observation {
            HandObservation::Hand { thumb_tip, index_tip } => self.normalize(thumb_tip, index_tip),
            HandObservation::NoHand => 0.0,
        }
    }
}

impl Default for PinchCalibration {
    fn default() -> Self { Self::DEFAULT }
}

/// Normalize with the default calibration.
pub fn normalize(thumb_tip: Vec3, index_tip: Vec3) -> f32 {
    PinchCalibration::DEFAULT.normalize(thumb_tip, index_tip)
}

/// What the tracker saw in one captured frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HandObservation {
    Hand { thumb_tip: Vec3, index_tip: Vec3 },
    NoHand,
}

/// Openness of one observation with the default calibration.
pub fn openness(observation: &HandObservation) -> f32 {
    PinchCalibration::DEFAULT.openness(observation)
}

// ════════════════════════════════════════════════════════════════════════════
// SignalProvider — the capture pipeline's side of the seam
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can report the most recently produced openness value.
///
/// `None` means nothing new was published since the last call; the engine
/// then keeps the value it already has.
pub trait SignalProvider {
    fn latest_signal(&mut self) -> Option<f32>;
}

/// Drains the channel and keeps only the newest value.
impl SignalProvider for Receiver<f32> {
    fn latest_signal(&mut self) -> Option<f32> {
        self.try_iter().last()
    }
}
