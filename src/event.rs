//! Events delivered to the application.

use std::time::SystemTime;

use crate::board_time::TimeSync;

/// A debounced digital input batch, translated into host time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DigitalEvent {
    /// Debounced state mask of all input lines.
    pub value: u32,
    /// Mask of input *functions* that fired this round.
    pub changed: u32,
    /// Host wall-clock time of the physical transition.
    pub timestamp: SystemTime,
}

/// One analog sample pair.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AnalogEvent {
    /// Scaled voltage sample, 0..=255.
    pub volt: u8,
    /// Scaled current sample, 0..=255.
    pub ampere: u8,
}

/// A single member of a recorded throttle/current profile.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GhostCarSample {
    /// Throttle voltage, 0..=255.
    pub volt: u8,
    /// Current draw, 0..=255.
    pub ampere: u8,
}

/// Everything the protocol worker reports to the application.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The connection came up or went down.
    Connected(bool),
    /// The board-time handshake finished; carries the resulting sync state.
    TimeSync(TimeSync),
    /// A digital input batch passed the host-side debounce.
    Digital(DigitalEvent),
    /// An analog sample arrived.
    Analog(AnalogEvent),
    /// Recording ended; the collected profile, in capture order.
    GhostCarRecorded(Vec<GhostCarSample>),
}
