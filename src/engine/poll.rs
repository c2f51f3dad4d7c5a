//! Inbound frame dispatch and the replay clock.

use std::time::{Duration, Instant, SystemTime};

use log::{debug, error, info, warn};

use crate::command::Command;
use crate::debounce::active_functions;
use crate::event::{AnalogEvent, DigitalEvent, Event, GhostCarSample};
use crate::frame::Frame;
use crate::ghost_car::{Replay, REPLAY_PERIOD_MS};
use crate::wire::{AnalogInput, DebugValue, DigitalInput, GhostCarValue};

use super::connect::recoverable;
use super::{Connector, Engine};

impl<C> Engine<C>
where
    C: Connector,
{
    /// Drains and dispatches everything the board sent.
    pub(super) fn poll_link(&mut self) {
        if let Some(transport) = self.transport.as_mut() {
            if !transport.connected() {
                self.disconnect();
                return;
            }
        }

        loop {
            let Some(transport) = self.transport.as_mut() else {
                return;
            };

            let frame = match transport.look() {
                Ok(Some(id)) => match transport.receive(id) {
                    Ok(frame) => frame,
                    Err(error) if recoverable(&error) => {
                        warn!("Dropping unreadable frame: {error}");
                        continue;
                    }
                    Err(error) => {
                        error!("Read failed: {error}");
                        self.disconnect();
                        return;
                    }
                },
                Ok(None) => return,
                Err(error) => {
                    error!("Read failed: {error}");
                    self.disconnect();
                    return;
                }
            };

            self.dispatch(&frame);
        }
    }

    fn dispatch(&mut self, frame: &Frame) {
        match frame.command() {
            Command::DigitalIn => self.on_digital(frame.payload()),
            Command::AnalogIn => self.on_analog(frame.payload()),
            Command::GhostCarBufferFull => self.on_buffer_full(),
            Command::Debug => on_debug(frame.payload()),
            // Late handshake replies can arrive after a timeout.
            Command::BoardTime => debug!("Ignoring late board time reply"),
            other => warn!("Ignoring unexpected frame: {other}"),
        }
    }

    fn on_digital(&mut self, payload: &[u8]) {
        let input = match DigitalInput::try_from(payload) {
            Ok(input) => input,
            Err(error) => {
                warn!("Dropping malformed DIGITAL_IN: {error}");
                return;
            }
        };

        let changed = self.debouncer.changes(input.value, u64::from(input.time));

        if changed == 0 {
            return;
        }

        let value = self.debouncer.value();
        let fired = active_functions(changed, value, &self.config.functions);
        let timestamp = self
            .time_sync
            .translate(input.time)
            .unwrap_or_else(SystemTime::now);

        self.channels.notify(Event::Digital(DigitalEvent {
            value,
            changed: fired,
            timestamp,
        }));
    }

    fn on_analog(&mut self, payload: &[u8]) {
        let input = match AnalogInput::try_from(payload) {
            Ok(input) => input,
            Err(error) => {
                warn!("Dropping malformed ANALOG_IN: {error}");
                return;
            }
        };

        if let Some(samples) = self.recording.as_mut() {
            samples.push(GhostCarSample {
                volt: input.volt,
                ampere: input.ampere,
            });
        }

        self.channels.notify(Event::Analog(AnalogEvent {
            volt: input.volt,
            ampere: input.ampere,
        }));
    }

    fn on_buffer_full(&mut self) {
        if let Some(replay) = self.replay.as_mut() {
            debug!("Board replay ring is full, backing off");
            replay.on_buffer_full();
        } else {
            warn!("Buffer-full report without an active replay");
        }
    }

    /// Feeds the replay one sample per period.
    pub(super) fn tick_replay(&mut self) {
        if self.replay.is_none() {
            return;
        }

        let now = Instant::now();

        if now < self.next_replay_at {
            return;
        }

        self.next_replay_at = now + Duration::from_millis(REPLAY_PERIOD_MS);

        if let Some(value) = self.replay.as_mut().and_then(Replay::tick) {
            self.send_ghost_car_value(value);
        }
    }

    pub(super) fn send_ghost_car_value(&mut self, value: GhostCarValue) {
        match Frame::new(Command::GhostCarValue, &value.to_bytes()) {
            Ok(frame) => self.send(&frame),
            Err(error) => error!("Cannot encode replay sample: {error}"),
        }
    }

    /// Sends one frame; a failed write tears the connection down.
    pub(super) fn send(&mut self, frame: &Frame) {
        let Some(transport) = self.transport.as_mut() else {
            warn!("Dropping {frame}: not connected");
            return;
        };

        if let Err(error) = transport.send(frame) {
            error!("Write failed: {error}");
            self.disconnect();
        }
    }
}

fn on_debug(payload: &[u8]) {
    match DebugValue::try_from(payload) {
        Ok(debug) => info!("Board says: {debug}"),
        Err(error) => warn!("Dropping malformed DEBUG: {error}"),
    }
}
