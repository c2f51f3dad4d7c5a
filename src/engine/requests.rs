//! Application request handling.

use std::time::Instant;

use log::{error, warn};

use crate::command::Command;
use crate::event::Event;
use crate::frame::Frame;
use crate::ghost_car::Replay;
use crate::request::{Config, Request};
use crate::status::Status;
use crate::wire::{AnalogOutput, DigitalOutput, DigitalOutputBit, RecordGhostCar};

use super::{Connector, Engine};

impl<C> Engine<C>
where
    C: Connector,
{
    pub(super) fn handle_requests(&mut self) {
        while let Some(request) = self.channels.next_request() {
            self.handle_request(request);
        }
    }

    fn handle_request(&mut self, request: Request) {
        if self.status == Status::Disconnected && !matches!(request, Request::Configure(_)) {
            warn!("Dropping request while disconnected: {request:?}");
            return;
        }

        match request {
            Request::WriteOutputs { value } => {
                let output = DigitalOutput { value };
                self.send_payload(Command::DigitalOut, &output.to_bytes());
            }
            Request::WriteBit { bit, state } => {
                let output = DigitalOutputBit {
                    bit,
                    state: u8::from(state),
                };
                self.send_payload(Command::DigitalOutBit, &output.to_bytes());
            }
            Request::AnalogWrite { bit, value } => {
                let output = AnalogOutput { bit, value };
                self.send_payload(Command::AnalogOut, &output.to_bytes());
            }
            Request::Configure(config) => self.configure(config),
            Request::StartRecording(record) => {
                self.recording = Some(Vec::new());
                self.send_payload(Command::RecordGhostCar, &record.to_bytes());
            }
            Request::StopRecording => self.stop_recording(),
            Request::StartReplay { profile, setup } => {
                self.send_payload(Command::StartGhostCar, &setup.to_bytes());
                self.replay = Some(Replay::new(profile));
                self.next_replay_at = Instant::now();
            }
            Request::StopReplay => {
                self.send(&Frame::empty(Command::StopGhostCar));
                self.replay = None;
            }
            Request::SyncReplay => self.sync_replay(),
        }
    }

    /// Applies a new configuration.
    ///
    /// On a live connection the whole initialization sequence runs again:
    /// flush, board-time handshake, recording-off, `SETUP_IO` and an input
    /// snapshot, exactly as on connect.
    fn configure(&mut self, config: Config) {
        self.config = config;

        let Some(mut transport) = self.transport.take() else {
            return;
        };

        match self.initialize(&mut transport) {
            Ok(time_sync) => {
                self.transport = Some(transport);
                self.time_sync = time_sync;
                self.debouncer.reset(u32::MAX);
                self.channels.notify(Event::TimeSync(time_sync));
            }
            Err(error) => {
                warn!("Re-initialization failed: {error}");
                self.transport = Some(transport);
                self.disconnect();
            }
        }
    }

    fn stop_recording(&mut self) {
        let stop = RecordGhostCar::off(super::DEFAULT_RECORD_CYCLE);
        self.send_payload(Command::RecordGhostCar, &stop.to_bytes());

        if let Some(samples) = self.recording.take() {
            self.channels.notify(Event::GhostCarRecorded(samples));
        }
    }

    /// Flushes the board's ring and restarts the profile without waiting
    /// for the next replay period.
    fn sync_replay(&mut self) {
        self.send(&Frame::empty(Command::GhostCarFlush));

        if let Some(value) = self.replay.as_mut().and_then(Replay::sync) {
            self.send_ghost_car_value(value);
        }
    }

    fn send_payload(&mut self, command: Command, payload: &[u8]) {
        match Frame::new(command, payload) {
            Ok(frame) => self.send(&frame),
            Err(error) => error!("Cannot encode {command}: {error}"),
        }
    }
}
