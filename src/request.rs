//! Requests sent from the application to the protocol worker.

use crate::event::GhostCarSample;
use crate::wire::{RecordGhostCar, SetupIo, StartGhostCar};

use crate::debounce::InputFunction;

/// The pin configuration and input-function map applied on every connect.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Pin direction masks and the extension flag sent as `SETUP_IO`.
    pub io: SetupIo,
    /// Logical input functions; their index is the bit reported in
    /// [`DigitalEvent::changed`](crate::event::DigitalEvent::changed).
    pub functions: Vec<InputFunction>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            io: SetupIo {
                bits_input: 0,
                bits_output: 0,
                with_spi_extension: 0,
            },
            functions: Vec::new(),
        }
    }
}

/// Everything the application can ask the protocol worker to do.
#[derive(Clone, Debug, PartialEq)]
pub enum Request {
    /// Set all digital output bits at once.
    WriteOutputs {
        /// State mask for every output line.
        value: u32,
    },
    /// Set one digital output bit.
    WriteBit {
        /// The output bit index.
        bit: u8,
        /// The new state.
        state: bool,
    },
    /// Write a PWM duty value to an output pin.
    AnalogWrite {
        /// The output pin.
        bit: u8,
        /// The duty value; `0` drives the pin low.
        value: u8,
    },
    /// Replace the configuration and re-run the I/O setup if connected.
    Configure(Config),
    /// Start recording an analog profile on the board.
    StartRecording(RecordGhostCar),
    /// Stop recording and deliver the collected profile.
    StopRecording,
    /// Start replaying a recorded profile.
    StartReplay {
        /// The profile to feed, in capture order.
        profile: Vec<GhostCarSample>,
        /// Replay cadence, output pin and control-loop parameters.
        setup: StartGhostCar,
    },
    /// Stop the replay and cut power to its output pin.
    StopReplay,
    /// Restart the replay from the top on a lap-synchronization point.
    SyncReplay,
}
