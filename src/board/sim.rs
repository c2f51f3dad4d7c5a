//! An in-memory board used by the host-side tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use log::warn;

use crate::board::{BoardIo, Sampler};
use crate::frame::{Frame, MAX_PAYLOAD_SIZE};
use crate::link::Link;

const PIN_COUNT: usize = 16;

/// Scriptable pin backend.
///
/// Digital lines idle high to model the pull-ups of the real board.
#[derive(Debug)]
pub struct TestPins {
    digital: [bool; PIN_COUNT],
    analog: [u16; PIN_COUNT],
    pwm: [Option<u8>; PIN_COUNT],
    inputs: u16,
    outputs: u16,
    spi: bool,
    extension_in: u16,
    last_shift_out: u16,
}

impl Default for TestPins {
    fn default() -> Self {
        Self {
            digital: [true; PIN_COUNT],
            analog: [0; PIN_COUNT],
            pwm: [None; PIN_COUNT],
            inputs: 0,
            outputs: 0,
            spi: false,
            extension_in: 0,
            last_shift_out: 0,
        }
    }
}

impl TestPins {
    /// Creates pins in their idle state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drives a digital input line.
    pub fn set_digital(&mut self, pin: u8, high: bool) {
        self.digital[pin as usize] = high;
    }

    /// Drives an analog input, 0..=1023.
    pub fn set_analog(&mut self, pin: u8, value: u16) {
        self.analog[pin as usize] = value;
    }

    /// Drives the 16 extension input lines.
    pub fn set_extension(&mut self, value: u16) {
        self.extension_in = value;
    }

    /// The last PWM duty written to a pin, if any.
    #[must_use]
    pub fn last_pwm(&self, pin: u8) -> Option<u8> {
        self.pwm[pin as usize]
    }

    /// The last output mask shifted out to the extension.
    #[must_use]
    pub const fn shifted_out(&self) -> u16 {
        self.last_shift_out
    }

    /// Whether a pin was configured as an output.
    #[must_use]
    pub const fn is_output(&self, pin: u8) -> bool {
        self.outputs & (1 << pin) != 0
    }

    /// Whether a pin was configured as an input.
    #[must_use]
    pub const fn is_input(&self, pin: u8) -> bool {
        self.inputs & (1 << pin) != 0
    }
}

impl BoardIo for TestPins {
    fn digital_read(&mut self, pin: u8) -> bool {
        self.digital[pin as usize]
    }

    fn digital_write(&mut self, pin: u8, high: bool) {
        self.digital[pin as usize] = high;

        if !high {
            self.pwm[pin as usize] = Some(0);
        }
    }

    fn analog_read(&mut self, pin: u8) -> u16 {
        self.analog[pin as usize]
    }

    fn analog_write(&mut self, pin: u8, value: u8) {
        self.pwm[pin as usize] = Some(value);
    }

    fn pin_mode_input(&mut self, pin: u8) {
        self.inputs |= 1 << pin;
        self.outputs &= !(1 << pin);
        // Pull-up.
        self.digital[pin as usize] = true;
    }

    fn pin_mode_output(&mut self, pin: u8) {
        self.outputs |= 1 << pin;
        self.inputs &= !(1 << pin);
    }

    fn spi_extension(&self) -> bool {
        self.spi
    }

    fn set_spi_extension(&mut self, enabled: bool) {
        self.spi = enabled;
    }

    fn shift_exchange(&mut self, out: u16) -> u16 {
        self.last_shift_out = out;
        self.extension_in
    }
}

#[derive(Debug)]
struct Inner {
    sampler: Sampler<TestPins>,
    from_host: VecDeque<u8>,
    to_host: VecDeque<u8>,
    connected: bool,
}

/// A full board behind the [`Link`] trait.
///
/// Bytes written by the host are decoded and dispatched to the [`Sampler`];
/// replies and queued samples come back through [`Link::read_byte`]. The
/// handle is cheap to clone, so a test keeps one clone to drive pins and
/// time while the protocol worker owns another. Time does not pass on its
/// own, tests drive it with [`SimulatedBoard::advance`].
#[derive(Clone, Debug)]
pub struct SimulatedBoard {
    inner: Arc<Mutex<Inner>>,
}

impl Default for SimulatedBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBoard {
    /// Creates a board in the power-on state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                sampler: Sampler::new(TestPins::new()),
                from_host: VecDeque::new(),
                to_host: VecDeque::new(),
                connected: true,
            })),
        }
    }

    /// Advances board time by `ms` milliseconds of tick/poll rounds.
    pub fn advance(&self, ms: u32) {
        let mut inner = self.lock();

        for _ in 0..ms {
            inner.sampler.on_tick();
            inner.sampler.poll();
        }
    }

    /// Runs `action` against the simulated pins.
    pub fn with_pins<R>(&self, action: impl FnOnce(&mut TestPins) -> R) -> R {
        action(self.lock().sampler.pins_mut())
    }

    /// Runs `action` against the sampler driving this board.
    pub fn with_sampler<R>(&self, action: impl FnOnce(&mut Sampler<TestPins>) -> R) -> R {
        action(&mut self.lock().sampler)
    }

    /// Simulates plugging or unplugging the cable.
    pub fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn unplugged() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::BrokenPipe, "cable unplugged")
}

impl Inner {
    /// Decodes complete inbound frames and queues outbound bytes.
    fn pump(&mut self) {
        while self.from_host.len() >= 2 {
            let size = self.from_host[1] as usize;

            if size > MAX_PAYLOAD_SIZE {
                warn!("Simulated board drops oversized frame of {size} bytes");
                drop(self.from_host.drain(..2));
                continue;
            }

            if self.from_host.len() < 2 + size {
                break;
            }

            let id = self.from_host[0];
            let payload: Vec<u8> = self.from_host.drain(..2 + size).skip(2).collect();

            match Frame::parse(id, &payload) {
                Ok(frame) => {
                    if let Some(reply) = self.sampler.handle_frame(&frame) {
                        self.to_host.extend(reply.encode());
                    }
                }
                Err(error) => warn!("Simulated board drops frame: {error}"),
            }
        }

        // One queued sample per pump, like the firmware's main loop.
        if let Some(frame) = self.sampler.drain() {
            self.to_host.extend(frame.encode());
        }
    }
}

impl Link for SimulatedBoard {
    fn read_byte(&mut self) -> std::io::Result<Option<u8>> {
        let mut inner = self.lock();

        if !inner.connected {
            return Err(unplugged());
        }

        inner.pump();
        Ok(inner.to_host.pop_front())
    }

    fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        let mut inner = self.lock();

        if !inner.connected {
            return Err(unplugged());
        }

        inner.from_host.extend(bytes);
        inner.pump();
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }

    fn connected(&mut self) -> bool {
        self.lock().connected
    }
}

#[cfg(test)]
mod tests {
    use super::SimulatedBoard;
    use crate::command::Command;
    use crate::frame::Frame;
    use crate::link::Link;
    use crate::transport::Transport;
    use crate::wire::{DigitalInput, SetupIo};

    #[test]
    fn test_time_request_round_trip() {
        let board = SimulatedBoard::new();
        board.advance(42);

        let mut transport = Transport::new(board);
        transport.send(&Frame::empty(Command::GetTime)).unwrap();

        let id = transport.look().unwrap().unwrap();
        let reply = transport.receive(id).unwrap();
        assert_eq!(reply.command(), Command::BoardTime);

        let payload = DigitalInput::try_from(reply.payload()).unwrap();
        assert_eq!(payload.time, 42);
    }

    #[test]
    fn test_input_edge_reaches_the_host() {
        let mut board = SimulatedBoard::new();
        let setup = SetupIo {
            bits_input: 1 << 3,
            bits_output: 0,
            with_spi_extension: 0,
        };
        let configure = Frame::new(Command::SetupIo, &setup.to_bytes()).unwrap();
        board.write_all(&configure.encode()).unwrap();

        // Swallow the start-up batch, then trip pin 3.
        board.advance(500);
        while board.read_byte().unwrap().is_some() {}
        board.with_pins(|pins| pins.set_digital(3, false));
        board.advance(1);

        let mut transport = Transport::new(board);
        let id = transport.look().unwrap().unwrap();
        let frame = transport.receive(id).unwrap();
        assert_eq!(frame.command(), Command::DigitalIn);

        let payload = DigitalInput::try_from(frame.payload()).unwrap();
        assert_eq!(payload.value & (1 << 3), 0);
    }

    #[test]
    fn test_unplugged_cable() {
        let mut board = SimulatedBoard::new();
        assert!(board.connected());

        board.clone().set_connected(false);
        assert!(!board.connected());
    }
}
