use crate::board::fifo::SampleFifo;
use crate::debounce::{Debouncer, BOARD_BOUNCE_MS};
use crate::wire::{GhostCarValue, NO_CHANNEL};

/// Capacity of the ghost-car replay ring.
pub const GC_RING_CAPACITY: usize = 100;

/// Ghost-car operating mode of the board.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum GhostCarMode {
    /// Neither recording nor replaying.
    #[default]
    Off,
    /// Sampling the analog channels at the configured cadence.
    Record,
    /// Driving the PWM output from the replay ring.
    Replay,
}

/// Ghost-car configuration and buffers.
#[derive(Debug)]
pub struct GhostCarState {
    /// Current mode.
    pub mode: GhostCarMode,
    /// Cadence reload value in milliseconds.
    pub cycle_load: u8,
    /// Countdown until the next cadence slot.
    pub cycle: u8,
    /// Control-loop cadence, [`NO_CHANNEL`] disables the control loop.
    pub control_cycle_load: i8,
    /// Countdown until the next control slot.
    pub control_cycle: u8,
    /// Analog pin of the voltage channel (record mode).
    pub volt_pin: i8,
    /// Analog pin of the current channel.
    pub ampere_pin: i8,
    /// PWM output pin (replay mode).
    pub pwm_pin: i8,
    /// Correction factor toward more power.
    pub inc_factor: u8,
    /// Correction factor toward less power.
    pub dec_factor: u8,
    /// Last PWM value written.
    pub last_volt: u8,
    /// Power target of the current replay sample (volt * ampere).
    pub target_power: i32,
    /// The replay ring; values arrive from the host ahead of their slot.
    pub ring: heapless::Deque<GhostCarValue, GC_RING_CAPACITY>,
}

impl Default for GhostCarState {
    fn default() -> Self {
        Self {
            mode: GhostCarMode::Off,
            cycle_load: 100,
            cycle: 0,
            control_cycle_load: 10,
            control_cycle: 0,
            volt_pin: NO_CHANNEL,
            ampere_pin: NO_CHANNEL,
            pwm_pin: NO_CHANNEL,
            inc_factor: 0,
            dec_factor: 5,
            last_volt: 0,
            target_power: 0,
            ring: heapless::Deque::new(),
        }
    }
}

/// All mutable state of the board firmware, owned in one place.
///
/// Threaded explicitly through the sampler and the command handlers so the
/// whole embedded state machine is unit-testable in isolation.
#[derive(Debug)]
pub struct DeviceState {
    /// Mask of pins configured as inputs.
    pub bits_input: u16,
    /// Mask of pins configured as outputs.
    pub bits_output: u16,
    /// Output mask driven through the shift registers.
    pub out_value: u16,
    /// Input debounce with the board's 200 ms window.
    pub debouncer: Debouncer,
    /// Outbound sample queue.
    pub fifo: SampleFifo,
    /// Ghost-car mode, configuration and replay ring.
    pub ghost_car: GhostCarState,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            bits_input: 0,
            bits_output: 0,
            out_value: 0,
            // Lines idle high behind pull-ups.
            debouncer: Debouncer::new(BOARD_BOUNCE_MS, u32::MAX),
            fifo: SampleFifo::new(),
            ghost_car: GhostCarState::default(),
        }
    }
}

impl DeviceState {
    /// Creates the power-on state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
