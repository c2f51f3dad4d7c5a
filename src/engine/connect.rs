//! Connection establishment, the board-time handshake and teardown.

use std::thread::sleep;
use std::time::{Duration, Instant, SystemTime};

use log::{debug, info, trace, warn};

use crate::board_time::TimeSync;
use crate::command::Command;
use crate::event::Event;
use crate::frame::Frame;
use crate::status::Status;
use crate::transport::Transport;
use crate::wire::{DigitalInput, RecordGhostCar};

use super::{Connector, Engine, DEFAULT_RECORD_CYCLE, IDLE_PAUSE};

/// How often the time request is repeated before giving up.
const HANDSHAKE_ATTEMPTS: usize = 5;

/// How long one time request may take to be answered.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(3);

impl<C> Engine<C>
where
    C: Connector,
{
    pub(super) fn try_connect(&mut self) {
        let link = match self.connector.open() {
            Ok(link) => link,
            Err(error) => {
                debug!("Device not available: {error}");
                return;
            }
        };

        let mut transport = Transport::new(link);

        match self.initialize(&mut transport) {
            Ok(time_sync) => {
                self.transport = Some(transport);
                self.status = Status::Connected;
                self.time_sync = time_sync;
                self.debouncer.reset(u32::MAX);
                self.next_replay_at = Instant::now();

                info!("Connected to the board, {time_sync:?}");
                self.channels.notify(Event::Connected(true));
                self.channels.notify(Event::TimeSync(time_sync));
            }
            Err(error) => warn!("Board initialization failed: {error}"),
        }
    }

    /// Brings a fresh link into a known state.
    ///
    /// Drops stale input, establishes the board-time origin, stops any
    /// recording left over from a previous session, applies the pin
    /// configuration and requests an input snapshot.
    pub(super) fn initialize(
        &mut self,
        transport: &mut Transport<C::Link>,
    ) -> std::io::Result<TimeSync> {
        transport.flush_input()?;

        let time_sync = Self::handshake(transport)?;

        let stop_recording = RecordGhostCar::off(DEFAULT_RECORD_CYCLE);
        transport.send(&Frame::new(Command::RecordGhostCar, &stop_recording.to_bytes())?)?;
        transport.send(&Frame::new(Command::SetupIo, &self.config.io.to_bytes())?)?;
        transport.send(&Frame::empty(Command::GetInputs))?;

        Ok(time_sync)
    }

    /// Requests the board's uptime to anchor its timestamps in host time.
    ///
    /// A board that answers everything but the time request is unusual but
    /// not fatal: the connection comes up unsynchronized and events carry
    /// host receive times instead of translated board times.
    fn handshake(transport: &mut Transport<C::Link>) -> std::io::Result<TimeSync> {
        for attempt in 1..=HANDSHAKE_ATTEMPTS {
            transport.send(&Frame::empty(Command::GetTime))?;
            let deadline = Instant::now() + HANDSHAKE_TIMEOUT;

            while Instant::now() < deadline {
                let Some(id) = transport.look()? else {
                    sleep(IDLE_PAUSE);
                    continue;
                };

                match transport.receive(id) {
                    Ok(frame) if frame.command() == Command::BoardTime => {
                        let input = DigitalInput::try_from(frame.payload())
                            .map_err(std::io::Error::from)?;
                        debug!("Board reports {} ms uptime", input.time);
                        return Ok(TimeSync::from_uptime(SystemTime::now(), input.time));
                    }
                    Ok(frame) => trace!("Ignoring {frame} during the handshake"),
                    Err(error) if recoverable(&error) => {
                        trace!("Ignoring receive error during the handshake: {error}");
                    }
                    Err(error) => return Err(error),
                }
            }

            warn!("No board time reply, attempt {attempt}/{HANDSHAKE_ATTEMPTS}");
        }

        Ok(TimeSync::Unsynchronized)
    }

    /// Tears the connection down and reports it.
    pub(super) fn disconnect(&mut self) {
        if self.transport.take().is_none() {
            return;
        }

        warn!("Connection to the board lost");
        self.status = Status::Disconnected;
        self.time_sync = TimeSync::Unsynchronized;
        self.replay = None;

        // A recording cut short is still a usable profile.
        if let Some(samples) = self.recording.take() {
            self.channels.notify(Event::GhostCarRecorded(samples));
        }

        self.channels.notify(Event::Connected(false));
        self.retry.reset();
    }
}

/// Receive errors that mean "garbage or nothing", not "link is dead".
pub(super) fn recoverable(error: &std::io::Error) -> bool {
    matches!(
        error.kind(),
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::InvalidData
    )
}
