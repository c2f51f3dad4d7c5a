//! The embedded side of the protocol: sampling, debouncing and the
//! command handlers that run on the controller board.
//!
//! Everything here is written against the [`BoardIo`] pin capability so the
//! same state machine backs the real firmware and the in-memory
//! [`SimulatedBoard`] used by the host-side tests.

pub use fifo::{Sample, SampleFifo};
pub use sampler::Sampler;
pub use sim::{SimulatedBoard, TestPins};
pub use state::{DeviceState, GhostCarMode, GhostCarState, GC_RING_CAPACITY};

mod fifo;
mod sampler;
mod sim;
mod state;

/// Pin number of the first output routed through the shift registers.
pub const FIRST_EXTENDED_OUT: u8 = 16;

/// Raw pin access on the controller board.
///
/// Models the handful of primitives the firmware uses: digital and analog
/// pin I/O, PWM output, a 16-bit shift-register exchange for the I/O
/// extension and one persisted flag enabling that extension.
pub trait BoardIo: Send {
    /// Reads a digital input pin.
    fn digital_read(&mut self, pin: u8) -> bool;

    /// Writes a digital output pin.
    fn digital_write(&mut self, pin: u8, high: bool);

    /// Reads an analog pin, 0..=1023.
    fn analog_read(&mut self, pin: u8) -> u16;

    /// Writes a PWM duty value to an output pin.
    fn analog_write(&mut self, pin: u8, value: u8);

    /// Configures a pin as an input with its pull-up enabled.
    fn pin_mode_input(&mut self, pin: u8);

    /// Configures a pin as an output.
    fn pin_mode_output(&mut self, pin: u8);

    /// Whether the shift-register I/O extension is enabled (persisted).
    fn spi_extension(&self) -> bool;

    /// Persists the I/O extension flag.
    fn set_spi_extension(&mut self, enabled: bool);

    /// Shifts 16 output bits out and returns the 16 sampled extension inputs.
    fn shift_exchange(&mut self, out: u16) -> u16;
}
