use log::{debug, warn};

use crate::board::fifo::Sample;
use crate::board::state::{DeviceState, GhostCarMode};
use crate::board::{BoardIo, FIRST_EXTENDED_OUT};
use crate::command::Command;
use crate::frame::Frame;
use crate::wire::{
    AnalogOutput, DebugValue, DigitalInput, DigitalOutput, DigitalOutputBit, GhostCarValue,
    RecordGhostCar, SetupIo, StartGhostCar, NO_CHANNEL,
};

/// Extension output bit that signals "replay power applied".
const GC_POWER_IND_BIT: u8 = 28 - FIRST_EXTENDED_OUT;

/// The board's periodic sampling state machine.
///
/// A 1 kHz timer interrupt calls [`Sampler::on_tick`], which only advances
/// the millisecond counter and raises the due flag; the heavy body runs in
/// [`Sampler::poll`] from the main loop, because serial bytes get lost while
/// interrupts are disabled on this hardware. The body must finish before the
/// next tick, and the due flag is consumed synchronously so the sampler
/// never runs re-entrantly.
#[derive(Debug)]
pub struct Sampler<P> {
    pins: P,
    state: DeviceState,
    millis: u32,
    due: bool,
}

impl<P> Sampler<P>
where
    P: BoardIo,
{
    /// Creates a sampler in the power-on state.
    pub fn new(pins: P) -> Self {
        Self {
            pins,
            state: DeviceState::new(),
            millis: 0,
            due: false,
        }
    }

    /// The interrupt surrogate: advances board time and marks a round due.
    pub fn on_tick(&mut self) {
        self.millis = self.millis.wrapping_add(1);
        self.due = true;
    }

    /// Milliseconds since board boot.
    #[must_use]
    pub const fn millis(&self) -> u32 {
        self.millis
    }

    /// Read access to the device state.
    #[must_use]
    pub const fn state(&self) -> &DeviceState {
        &self.state
    }

    /// Mutable access to the pin backend.
    pub fn pins_mut(&mut self) -> &mut P {
        &mut self.pins
    }

    /// Runs one sampling round if a tick is due; returns whether it ran.
    pub fn poll(&mut self) -> bool {
        if !self.due {
            return false;
        }

        self.due = false;
        let now = self.millis;

        match self.state.ghost_car.mode {
            GhostCarMode::Record => self.record_round(),
            GhostCarMode::Replay => self.replay_round(),
            GhostCarMode::Off => {}
        }

        self.sample_inputs(now);
        true
    }

    /// Pops at most one queued sample and encodes it.
    ///
    /// One entry per main-loop iteration keeps a long drain from starving
    /// incoming command decoding.
    pub fn drain(&mut self) -> Option<Frame> {
        self.state.fifo.pop().map(Frame::from)
    }

    /// Dispatches one received command; returns at most one reply frame.
    pub fn handle_frame(&mut self, frame: &Frame) -> Option<Frame> {
        match frame.command() {
            Command::GetTime => Some(self.board_time()),
            Command::GetInputs => Some(self.input_snapshot()),
            Command::DigitalOut => self.digital_out(frame.payload()),
            Command::DigitalOutBit => self.digital_out_bit(frame.payload()),
            Command::AnalogOut => self.analog_out(frame.payload()),
            Command::RecordGhostCar => self.record_ghost_car(frame.payload()),
            Command::StartGhostCar => self.start_ghost_car(frame.payload()),
            Command::StopGhostCar => self.stop_ghost_car(),
            Command::GhostCarValue => self.ghost_car_value(frame.payload()),
            Command::GhostCarFlush => self.ghost_car_flush(),
            Command::SetupIo => self.setup_io(frame.payload()),
            other => {
                debug!("Ignoring command without a handler: {other}");
                None
            }
        }
    }

    fn board_time(&self) -> Frame {
        let payload = DigitalInput {
            time: self.millis,
            value: 0,
        };
        Frame::new(Command::BoardTime, &payload.to_bytes())
            .unwrap_or_else(|_| Frame::empty(Command::BoardTime))
    }

    fn input_snapshot(&self) -> Frame {
        let payload = DigitalInput {
            time: self.millis,
            value: self.state.debouncer.value(),
        };
        Frame::new(Command::DigitalIn, &payload.to_bytes())
            .unwrap_or_else(|_| Frame::empty(Command::DigitalIn))
    }

    fn digital_out(&mut self, payload: &[u8]) -> Option<Frame> {
        match DigitalOutput::try_from(payload) {
            Ok(output) => {
                for bit in 2..14_u8 {
                    if self.state.bits_output & (1 << bit) != 0 {
                        self.pins.digital_write(bit, output.value & (1 << bit) != 0);
                    }
                }
            }
            Err(error) => warn!("Dropping malformed DIGITAL_OUT: {error}"),
        }

        None
    }

    fn digital_out_bit(&mut self, payload: &[u8]) -> Option<Frame> {
        let output = match DigitalOutputBit::try_from(payload) {
            Ok(output) => output,
            Err(error) => {
                warn!("Dropping malformed DIGITAL_OUT_BIT: {error}");
                return None;
            }
        };

        if self.pins.spi_extension() && output.bit >= FIRST_EXTENDED_OUT {
            let bit = output.bit - FIRST_EXTENDED_OUT;

            if output.state != 0 {
                self.state.out_value |= 1 << bit;
            } else {
                self.state.out_value &= !(1 << bit);
            }
        } else if self.state.bits_output & (1 << output.bit) != 0 {
            self.pins.digital_write(output.bit, output.state != 0);
        }

        None
    }

    fn analog_out(&mut self, payload: &[u8]) -> Option<Frame> {
        match AnalogOutput::try_from(payload) {
            Ok(output) if output.value != 0 => self.pins.analog_write(output.bit, output.value),
            Ok(output) => self.pins.digital_write(output.bit, false),
            Err(error) => warn!("Dropping malformed ANALOG_OUT: {error}"),
        }

        None
    }

    fn record_ghost_car(&mut self, payload: &[u8]) -> Option<Frame> {
        let record = match RecordGhostCar::try_from(payload) {
            Ok(record) => record,
            Err(error) => {
                warn!("Dropping malformed RECORD_GHOST_CAR: {error}");
                return None;
            }
        };

        let ghost_car = &mut self.state.ghost_car;
        ghost_car.cycle_load = record.cycle;
        ghost_car.volt_pin = record.volt_bit;
        ghost_car.ampere_pin = record.ampere_bit;
        ghost_car.mode = if record.is_off() {
            GhostCarMode::Off
        } else {
            GhostCarMode::Record
        };

        if ghost_car.mode == GhostCarMode::Record {
            self.state.fifo.flush();
        }

        None
    }

    fn start_ghost_car(&mut self, payload: &[u8]) -> Option<Frame> {
        let start = match StartGhostCar::try_from(payload) {
            Ok(start) => start,
            Err(error) => {
                warn!("Dropping malformed START_GHOST_CAR: {error}");
                return None;
            }
        };

        let ghost_car = &mut self.state.ghost_car;
        ghost_car.mode = GhostCarMode::Replay;
        ghost_car.cycle_load = start.cycle as u8;
        ghost_car.pwm_pin = start.bit as i8;
        ghost_car.ampere_pin = start.ampere_bit as i8;
        ghost_car.control_cycle_load = start.control_cycle;
        ghost_car.inc_factor = start.inc_factor;
        ghost_car.dec_factor = start.dec_factor;

        self.pins.pin_mode_output(start.bit);
        None
    }

    fn stop_ghost_car(&mut self) -> Option<Frame> {
        self.state.ghost_car.mode = GhostCarMode::Off;

        if self.state.ghost_car.pwm_pin != NO_CHANNEL {
            self.pins
                .digital_write(self.state.ghost_car.pwm_pin as u8, false);
        }

        None
    }

    fn ghost_car_value(&mut self, payload: &[u8]) -> Option<Frame> {
        let value = match GhostCarValue::try_from(payload) {
            Ok(value) => value,
            Err(error) => {
                warn!("Dropping malformed GHOST_CAR_VALUE: {error}");
                return None;
            }
        };

        if self.state.ghost_car.ring.push_back(value).is_err() {
            // Flow control: the host pauses and retries this sample.
            return Some(Frame::empty(Command::GhostCarBufferFull));
        }

        None
    }

    fn ghost_car_flush(&mut self) -> Option<Frame> {
        self.state.ghost_car.ring.clear();
        None
    }

    fn setup_io(&mut self, payload: &[u8]) -> Option<Frame> {
        let setup = match SetupIo::try_from(payload) {
            Ok(setup) => setup,
            Err(error) => {
                warn!("Dropping malformed SETUP_IO: {error}");
                return None;
            }
        };

        self.state.bits_input = setup.bits_input;
        self.state.bits_output = setup.bits_output;

        // Pins 0 and 1 are reserved for the serial line.
        for bit in 2..14_u8 {
            if setup.bits_input & (1 << bit) != 0 {
                self.pins.pin_mode_input(bit);
            } else if setup.bits_output & (1 << bit) != 0 {
                self.pins.pin_mode_output(bit);
                self.pins.digital_write(bit, false);
            }
        }

        let with_spi = setup.with_spi_extension != 0;

        if with_spi != self.pins.spi_extension() {
            self.pins.set_spi_extension(with_spi);
            let note = DebugValue::new("Wrote EEPROM!", u32::from(setup.with_spi_extension));
            return Frame::new(Command::Debug, &note.to_bytes()).ok();
        }

        None
    }

    fn record_round(&mut self) {
        if !self.cycle_due() {
            return;
        }

        let ghost_car = &self.state.ghost_car;
        let volt = ((u32::from(self.pins.analog_read(ghost_car.volt_pin as u8)) * 255) / 1024) as u8;
        let ampere = if ghost_car.ampere_pin == NO_CHANNEL {
            0
        } else {
            self.pins.analog_read(ghost_car.ampere_pin as u8) as u8
        };

        let _ = self.state.fifo.offer(Sample::Analog { volt, ampere });
        self.state.ghost_car.cycle = self.state.ghost_car.cycle_load;
    }

    fn replay_round(&mut self) {
        if self.state.ghost_car.cycle == 0 && !self.state.ghost_car.ring.is_empty() {
            // Next recorded value is due.
            if let Some(value) = self.state.ghost_car.ring.pop_front() {
                let pwm = self.state.ghost_car.pwm_pin as u8;

                if value.volt != 0 {
                    self.pins.analog_write(pwm, value.volt);
                } else {
                    self.pins.digital_write(pwm, false);
                }

                self.state.ghost_car.last_volt = value.volt;
                self.state.ghost_car.target_power =
                    i32::from(value.volt) * i32::from(value.ampere);
            }

            self.state.ghost_car.cycle = self.state.ghost_car.cycle_load;
            return;
        }

        if self.state.ghost_car.cycle > 0 {
            self.state.ghost_car.cycle -= 1;
        }

        if self.state.ghost_car.control_cycle_load != NO_CHANNEL && self.control_due() {
            self.control_round();
        }
    }

    /// Current-control correction toward the recorded power target.
    fn control_round(&mut self) {
        let ampere_pin = self.state.ghost_car.ampere_pin;

        if ampere_pin == NO_CHANNEL {
            return;
        }

        let ampere = i32::from(self.pins.analog_read(ampere_pin as u8));

        if ampere <= 0 {
            return;
        }

        let ghost_car = &mut self.state.ghost_car;
        let actual_power = i32::from(ghost_car.last_volt) * ampere;
        let mut volt_diff = (ghost_car.target_power - actual_power) / ampere;

        volt_diff *= if volt_diff > 0 {
            i32::from(ghost_car.inc_factor)
        } else {
            i32::from(ghost_car.dec_factor)
        };

        let volt = (i32::from(ghost_car.last_volt) + volt_diff).clamp(0, 254) as u8;

        if volt != 0 {
            self.state.out_value |= 1 << GC_POWER_IND_BIT;
        } else {
            self.state.ghost_car.control_cycle_load = 20;
            self.state.out_value &= !(1 << GC_POWER_IND_BIT);
        }

        let pwm = self.state.ghost_car.pwm_pin as u8;
        self.pins.analog_write(pwm, volt);
        self.state.ghost_car.last_volt = volt;
    }

    fn cycle_due(&mut self) -> bool {
        if self.state.ghost_car.cycle == 0 {
            true
        } else {
            self.state.ghost_car.cycle -= 1;
            false
        }
    }

    fn control_due(&mut self) -> bool {
        if self.state.ghost_car.control_cycle == 0 {
            self.state.ghost_car.control_cycle = self.state.ghost_car.control_cycle_load as u8;
            true
        } else {
            self.state.ghost_car.control_cycle -= 1;
            false
        }
    }

    fn sample_inputs(&mut self, now: u32) {
        let mut raw = 0_u32;

        // Pins 0 and 1 carry the serial line.
        for bit in 2..14_u8 {
            if self.state.bits_input & (1 << bit) != 0 && self.pins.digital_read(bit) {
                raw |= 1 << bit;
            }
        }

        if self.pins.spi_extension() {
            let extension = self.pins.shift_exchange(self.state.out_value);
            raw |= u32::from(extension) << 16;
        }

        let before = self.state.debouncer.value();
        let changed = self.state.debouncer.changes(raw, u64::from(now));

        if changed != 0 {
            let accepted = self.state.debouncer.value();
            let queued = self.state.fifo.offer(Sample::Digital {
                value: accepted,
                time: now,
            });

            if !queued {
                // Dropped batch: leave the state uncommitted so the change
                // re-fires once the FIFO drains.
                self.state.debouncer.set_value(before);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Sampler;
    use crate::board::fifo::Sample;
    use crate::board::sim::TestPins;
    use crate::board::state::{GhostCarMode, GC_RING_CAPACITY};
    use crate::command::Command;
    use crate::frame::Frame;
    use crate::wire::{DigitalInput, GhostCarValue, RecordGhostCar, SetupIo, StartGhostCar};

    fn sampler_with_inputs(bits_input: u16) -> Sampler<TestPins> {
        let mut sampler = Sampler::new(TestPins::new());
        let setup = SetupIo {
            bits_input,
            bits_output: 0,
            with_spi_extension: 0,
        };
        sampler.handle_frame(&Frame::new(Command::SetupIo, &setup.to_bytes()).unwrap());
        sampler
    }

    fn advance(sampler: &mut Sampler<TestPins>, ms: u32) {
        for _ in 0..ms {
            sampler.on_tick();
            sampler.poll();
        }
    }

    fn settle(sampler: &mut Sampler<TestPins>) {
        // Swallow the start-up batch and let the debounce windows re-arm.
        advance(sampler, 500);
        while sampler.drain().is_some() {}
    }

    #[test]
    fn test_board_time_reply() {
        let mut sampler = sampler_with_inputs(0);
        advance(&mut sampler, 1234);

        let reply = sampler
            .handle_frame(&Frame::empty(Command::GetTime))
            .unwrap();
        assert_eq!(reply.command(), Command::BoardTime);

        let payload = DigitalInput::try_from(reply.payload()).unwrap();
        assert_eq!(payload.time, 1234);
        assert_eq!(payload.value, 0);
    }

    #[test]
    fn test_debounced_edge_is_queued() {
        let mut sampler = sampler_with_inputs(1 << 5);
        settle(&mut sampler);

        sampler.pins_mut().set_digital(5, false);
        advance(&mut sampler, 1);

        let frame = sampler.drain().expect("edge should be queued");
        assert_eq!(frame.command(), Command::DigitalIn);

        let payload = DigitalInput::try_from(frame.payload()).unwrap();
        assert_eq!(payload.value & (1 << 5), 0);
    }

    #[test]
    fn test_bounce_is_suppressed_on_the_board() {
        let mut sampler = sampler_with_inputs(1 << 5);
        settle(&mut sampler);

        sampler.pins_mut().set_digital(5, false);
        advance(&mut sampler, 1);
        assert!(sampler.drain().is_some());

        // Bouncing back within 200 ms is not reported.
        sampler.pins_mut().set_digital(5, true);
        advance(&mut sampler, 100);
        assert!(sampler.drain().is_none());

        // After the window the (still pending) change is accepted.
        advance(&mut sampler, 150);
        assert!(sampler.drain().is_some());
    }

    #[test]
    fn test_record_cadence() {
        let mut sampler = sampler_with_inputs(0);
        settle(&mut sampler);
        sampler.pins_mut().set_analog(3, 512);

        let record = RecordGhostCar {
            cycle: 100,
            volt_bit: 3,
            ampere_bit: -1,
        };
        sampler.handle_frame(&Frame::new(Command::RecordGhostCar, &record.to_bytes()).unwrap());
        assert_eq!(sampler.state().ghost_car.mode, GhostCarMode::Record);

        advance(&mut sampler, 505);

        let mut analog = 0;
        while let Some(frame) = sampler.drain() {
            assert_eq!(frame.command(), Command::AnalogIn);
            // 512 * 255 / 1024
            assert_eq!(frame.payload()[0], 127);
            analog += 1;
        }

        // One sample per 100 ms slot, give or take the first countdown.
        assert!((5..=6).contains(&analog), "got {analog} samples");
    }

    #[test]
    fn test_record_off_sentinel() {
        let mut sampler = sampler_with_inputs(0);
        let record = RecordGhostCar::off(100);
        sampler.handle_frame(&Frame::new(Command::RecordGhostCar, &record.to_bytes()).unwrap());
        assert_eq!(sampler.state().ghost_car.mode, GhostCarMode::Off);
    }

    #[test]
    fn test_ring_reports_buffer_full() {
        let mut sampler = sampler_with_inputs(0);
        let value = GhostCarValue {
            volt: 150,
            ampere: 10,
        };
        let frame = Frame::new(Command::GhostCarValue, &value.to_bytes()).unwrap();

        for _ in 0..GC_RING_CAPACITY {
            assert_eq!(sampler.handle_frame(&frame), None);
        }

        let reply = sampler.handle_frame(&frame).expect("ring is full");
        assert_eq!(reply.command(), Command::GhostCarBufferFull);

        // A flush empties the ring and values are accepted again.
        sampler.handle_frame(&Frame::empty(Command::GhostCarFlush));
        assert_eq!(sampler.handle_frame(&frame), None);
    }

    #[test]
    fn test_replay_drives_pwm() {
        let mut sampler = sampler_with_inputs(0);
        settle(&mut sampler);

        let start = StartGhostCar {
            cycle: 100,
            bit: 14,
            ampere_bit: 2,
            control_cycle: -1,
            dec_factor: 1,
            inc_factor: 4,
        };
        sampler.handle_frame(&Frame::new(Command::StartGhostCar, &start.to_bytes()).unwrap());

        let value = GhostCarValue {
            volt: 200,
            ampere: 20,
        };
        sampler.handle_frame(&Frame::new(Command::GhostCarValue, &value.to_bytes()).unwrap());

        advance(&mut sampler, 1);
        assert_eq!(sampler.pins_mut().last_pwm(14), Some(200));
        assert!(sampler.state().ghost_car.ring.is_empty());
    }

    #[test]
    fn test_fifo_drop_keeps_change_pending() {
        let mut sampler = sampler_with_inputs(1 << 5);
        settle(&mut sampler);

        // Fill the FIFO with analog noise.
        for _ in 0..40 {
            sampler.state.fifo.offer(Sample::Analog { volt: 0, ampere: 0 });
        }

        sampler.pins_mut().set_digital(5, false);
        advance(&mut sampler, 1);

        // Drain the noise; the digital change was dropped, not queued.
        let mut digital = 0;
        while let Some(frame) = sampler.drain() {
            if frame.command() == Command::DigitalIn {
                digital += 1;
            }
        }
        assert_eq!(digital, 0);

        // Once there is room again the change re-fires past the window.
        advance(&mut sampler, 250);
        let frame = sampler.drain().expect("change should re-fire");
        assert_eq!(frame.command(), Command::DigitalIn);
    }
}
