//! Hand-openness sources — LeapMotion hardware or keyboard simulation.
//!
//! A source runs on its own thread and publishes [`SignalEvent`]s over an
//! `mpsc` channel.  The render loop never waits on it: each frame it drains
//! whatever arrived through a [`SignalInbox`] and keeps only the newest
//! openness value.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use glam::Vec3;
use log::{info, warn};
use morph_field::{HandObservation, PinchCalibration, SignalProvider};

// ════════════════════════════════════════════════════════════════════════════
// SignalEvent
// ════════════════════════════════════════════════════════════════════════════

/// Lifecycle of a tracking source, for the status line.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceStatus {
    Loading,
    Ready(String),
    /// Tracking is unavailable; the text is shown to the user.
    Failed(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum SignalEvent {
    /// Normalized openness of the current captured frame, `0.0..=1.0`.
    Openness(f32),
    Status(SourceStatus),
}

// ════════════════════════════════════════════════════════════════════════════
// SignalSource trait — unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`SignalEvent`]s over a channel.
pub trait SignalSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<SignalEvent>);
}

/// Spawn a signal source on its own thread and return the receiving end.
pub fn spawn_signal_source<S: SignalSource>(source: S) -> Receiver<SignalEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SignalInbox — render-side end of the channel
// ════════════════════════════════════════════════════════════════════════════

/// Wraps the receiver so the engine can pull from it as a
/// [`SignalProvider`].  Status changes are kept aside for the UI.
pub struct SignalInbox {
    rx:           Receiver<SignalEvent>,
    status:       Option<SourceStatus>,
    disconnected: bool,
}

impl SignalInbox {
    pub fn new(rx: Receiver<SignalEvent>) -> Self {
        SignalInbox { rx, status: None, disconnected: false }
    }

    /// Most recent status seen since the last call.
    pub fn take_status(&mut self) -> Option<SourceStatus> {
        self.status.take()
    }

    /// True once the source thread has hung up.
    pub fn is_disconnected(&self) -> bool { self.disconnected }
}

impl SignalProvider for SignalInbox {
    fn latest_signal(&mut self) -> Option<f32> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(SignalEvent::Openness(v)) => latest = Some(v),
                Ok(SignalEvent::Status(s))   => self.status = Some(s),
                Err(TryRecvError::Empty)     => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.disconnected {
                        warn!("signal source hung up; holding last openness");
                        self.disconnected = true;
                    }
                    break;
                }
            }
        }
        latest
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FrameGate — one inference per captured frame
// ════════════════════════════════════════════════════════════════════════════

/// Passes a frame only if its capture timestamp differs from the last one
/// that passed.
#[derive(Debug, Default)]
pub struct FrameGate {
    last: Option<f64>,
}

impl FrameGate {
    pub fn admit(&mut self, timestamp: f64) -> bool {
        if self.last == Some(timestamp) {
            return false;
        }
        self.last = Some(timestamp);
        true
    }
}

/// One captured frame as the tracker reports it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandFrame {
    /// Capture time in seconds; repeats while the camera has no new image.
    pub timestamp:   f64,
    pub observation: HandObservation,
}

// ════════════════════════════════════════════════════════════════════════════
// LeapSignalSource — real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Openness source backed by a real LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
/// Uses the distal tips of thumb and index finger of the first tracked
/// hand; a frame with no hands reports `0.0`.
#[cfg(feature = "leap")]
pub struct LeapSignalSource {
    pub calibration: PinchCalibration,
}

#[cfg(feature = "leap")]
impl Default for LeapSignalSource {
    fn default() -> Self {
        LeapSignalSource { calibration: PinchCalibration::LEAP_MILLIMETRES }
    }
}

#[cfg(feature = "leap")]
impl SignalSource for LeapSignalSource {
    fn run(self: Box<Self>, tx: Sender<SignalEvent>) {
        use leaprs::*;

        let _ = tx.send(SignalEvent::Status(SourceStatus::Loading));

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => {
                let msg = format!("LeapC unavailable ({:?}); is the tracking service installed?", e);
                warn!("{}", msg);
                let _ = tx.send(SignalEvent::Status(SourceStatus::Failed(msg)));
                return;
            }
        };
        if let Err(e) = connection.open() {
            let msg = format!("No LeapMotion device ({:?}); connect one and restart", e);
            warn!("{}", msg);
            let _ = tx.send(SignalEvent::Status(SourceStatus::Failed(msg)));
            return;
        }

        info!("LeapMotion connection open");
        let _ = tx.send(SignalEvent::Status(SourceStatus::Ready("LeapMotion".to_string())));

        let start    = Instant::now();
        let mut gate = FrameGate::default();

        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };

            if let Event::Tracking(frame) = msg.event() {
                let captured = HandFrame {
                    timestamp:   start.elapsed().as_secs_f64(),
                    observation: frame.hands().next()
                        .and_then(|h| {
                            let fingers: Vec<_> = h.digits().collect();
                            if fingers.len() < 2 { return None; }
                            let t = fingers[0].distal().next_joint();
                            let i = fingers[1].distal().next_joint();
                            Some(HandObservation::Hand {
                                thumb_tip: Vec3::new(t.x, t.y, t.z),
                                index_tip: Vec3::new(i.x, i.y, i.z),
                            })
                        })
                        .unwrap_or(HandObservation::NoHand),
                };
                if !gate.admit(captured.timestamp) { continue; }
                let v = self.calibration.openness(&captured.observation);
                if tx.send(SignalEvent::Openness(v)).is_err() { return; }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimSignalSource — keyboard simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Debug, PartialEq)]
pub enum SimInput {
    /// Space held (`true`) or released (`false`): spread the fingers wide.
    Open(bool),
    /// Up/Down: shift the resting spread.
    Nudge(f32),
    /// Hand enters or leaves the camera view.
    ToggleHand,
    Quit,
}

/// The simulated hand: a resting spread, a hold-open override, and an
/// eased current spread so the fingers don't teleport.
#[derive(Clone, Debug, PartialEq)]
pub struct SimHand {
    pub rest:      f32,
    pub held_open: bool,
    pub present:   bool,
    pub spread:    f32,
}

impl Default for SimHand {
    fn default() -> Self {
        SimHand { rest: 0.0, held_open: false, present: true, spread: 0.0 }
    }
}

impl SimHand {
    // Fingertip gap at spread 0 and 1, slightly past both ends of the
    // default calibration band.
    const CLOSED_GAP: f32 = 0.01;
    const OPEN_GAP:   f32 = 0.24;
    const EASE:       f32 = 0.35;

    pub fn apply(&mut self, input: &SimInput) {
        match *input {
            SimInput::Open(down)  => self.held_open = down,
            SimInput::Nudge(d)    => self.rest = (self.rest + d).clamp(0.0, 1.0),
            SimInput::ToggleHand  => self.present = !self.present,
            SimInput::Quit        => {}
        }
    }

    /// Ease the current spread one camera frame toward its goal.
    pub fn step(&mut self) {
        let goal = if self.held_open { 1.0 } else { self.rest };
        self.spread += (goal - self.spread) * Self::EASE;
        if (goal - self.spread).abs() < 1e-3 { self.spread = goal; }
    }

    /// Synthetic landmarks in normalized image space.
    pub fn observation(&self) -> HandObservation {
        if !self.present {
            return HandObservation::NoHand;
        }
        let thumb_tip = Vec3::new(0.45, 0.55, -0.02);
        let gap = Self::CLOSED_GAP + (Self::OPEN_GAP - Self::CLOSED_GAP) * self.spread;
        HandObservation::Hand {
            thumb_tip,
            index_tip: thumb_tip + Vec3::new(0.6, -0.8, 0.0) * gap,
        }
    }
}

/// Openness source driven by [`SimInput`] events from the visualizer window.
///
/// Polls at display rate but only produces a new frame at camera rate, so
/// the [`FrameGate`] sees repeated timestamps just like a live video feed.
pub struct SimSignalSource {
    pub rx:             Receiver<SimInput>,
    pub calibration:    PinchCalibration,
    pub camera_period:  Duration,
    pub poll_period:    Duration,
}

impl SimSignalSource {
    pub fn new(rx: Receiver<SimInput>) -> Self {
        SimSignalSource {
            rx,
            calibration:   PinchCalibration::DEFAULT,
            camera_period: Duration::from_millis(33),
            poll_period:   Duration::from_millis(16),
        }
    }
}

impl SignalSource for SimSignalSource {
    fn run(self: Box<Self>, tx: Sender<SignalEvent>) {
        info!("simulated hand at {:?} per camera frame", self.camera_period);
        let _ = tx.send(SignalEvent::Status(SourceStatus::Ready("keyboard simulation".to_string())));

        let start       = Instant::now();
        let period      = self.camera_period.as_secs_f64().max(1e-3);
        let mut gate    = FrameGate::default();
        let mut hand    = SimHand::default();

        loop {
            loop {
                match self.rx.try_recv() {
                    Ok(SimInput::Quit)              => return,
                    Ok(input)                       => hand.apply(&input),
                    Err(TryRecvError::Empty)        => break,
                    Err(TryRecvError::Disconnected) => return,
                }
            }

            // video time advances in whole camera frames
            let timestamp = (start.elapsed().as_secs_f64() / period).floor() * period;
            if gate.admit(timestamp) {
                hand.step();
                let frame = HandFrame { timestamp, observation: hand.observation() };
                let v = self.calibration.openness(&frame.observation);
                if tx.send(SignalEvent::Openness(v)).is_err() { return; }
            }

            thread::sleep(self.poll_period);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use morph_field::openness;

    #[test]
    fn gate_drops_repeated_timestamps() {
        let mut g = FrameGate::default();
        assert!(g.admit(0.0));
        assert!(!g.admit(0.0));
        assert!(g.admit(0.033));
        assert!(!g.admit(0.033));
        assert!(g.admit(0.0));
    }

    #[test]
    fn sim_hand_closed_and_open() {
        let mut h = SimHand::default();
        assert_eq!(openness(&h.observation()), 0.0);
        h.apply(&SimInput::Open(true));
        for _ in 0..30 { h.step(); }
        assert_eq!(h.spread, 1.0);
        assert_eq!(openness(&h.observation()), 1.0);
    }

    #[test]
    fn sim_hand_eases() {
        let mut h = SimHand::default();
        h.apply(&SimInput::Open(true));
        h.step();
        assert!(h.spread > 0.0 && h.spread < 1.0);
    }

    #[test]
    fn sim_hand_missing_reads_closed() {
        let mut h = SimHand::default();
        h.apply(&SimInput::Open(true));
        for _ in 0..30 { h.step(); }
        h.apply(&SimInput::ToggleHand);
        assert_eq!(h.observation(), HandObservation::NoHand);
        assert_eq!(openness(&h.observation()), 0.0);
    }

    #[test]
    fn nudge_is_clamped() {
        let mut h = SimHand::default();
        for _ in 0..100 { h.apply(&SimInput::Nudge(0.05)); }
        assert_eq!(h.rest, 1.0);
        h.apply(&SimInput::Nudge(-5.0));
        assert_eq!(h.rest, 0.0);
    }

    #[test]
    fn inbox_keeps_last_openness_and_status() {
        let (tx, rx) = mpsc::channel();
        let mut inbox = SignalInbox::new(rx);
        tx.send(SignalEvent::Status(SourceStatus::Loading)).unwrap();
        tx.send(SignalEvent::Openness(0.3)).unwrap();
        tx.send(SignalEvent::Status(SourceStatus::Ready("sim".into()))).unwrap();
        tx.send(SignalEvent::Openness(0.6)).unwrap();
        assert_eq!(inbox.latest_signal(), Some(0.6));
        assert_eq!(inbox.take_status(), Some(SourceStatus::Ready("sim".into())));
        assert_eq!(inbox.take_status(), None);
        assert_eq!(inbox.latest_signal(), None);
        drop(tx);
        assert_eq!(inbox.latest_signal(), None);
        assert!(inbox.is_disconnected());
    }

    #[test]
    fn sim_source_publishes_openness() {
        let (sim_tx, sim_rx) = mpsc::channel();
        let rx = spawn_signal_source(SimSignalSource::new(sim_rx));

        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)).unwrap(),
            SignalEvent::Status(SourceStatus::Ready("keyboard simulation".to_string()))
        );

        sim_tx.send(SimInput::Open(true)).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut peak = 0.0_f32;
        while Instant::now() < deadline && peak < 1.0 {
            if let Ok(SignalEvent::Openness(v)) = rx.recv_timeout(Duration::from_millis(200)) {
                assert!((0.0..=1.0).contains(&v));
                peak = peak.max(v);
            }
        }
        assert_eq!(peak, 1.0);

        sim_tx.send(SimInput::Quit).unwrap();
    }
}
