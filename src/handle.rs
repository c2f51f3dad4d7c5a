//! The application-facing handle to a running protocol worker.

use std::io::{Error, ErrorKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::event::GhostCarSample;
use crate::request::{Config, Request};
use crate::wire::{RecordGhostCar, StartGhostCar};

/// Sends requests to the protocol worker.
///
/// Clones share the same worker. Dropping the last clone hangs up the
/// request channel, which the worker treats as a shutdown signal.
#[derive(Clone, Debug)]
pub struct Handle {
    requests: Sender<Request>,
    terminate: Arc<AtomicBool>,
}

impl Handle {
    pub(crate) const fn new(requests: Sender<Request>, terminate: Arc<AtomicBool>) -> Self {
        Self {
            requests,
            terminate,
        }
    }

    /// Sets all digital output bits at once.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::BrokenPipe`] if the worker is gone.
    pub fn write_outputs(&self, value: u32) -> std::io::Result<()> {
        self.send(Request::WriteOutputs { value })
    }

    /// Sets one digital output bit.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::BrokenPipe`] if the worker is gone.
    pub fn write_bit(&self, bit: u8, state: bool) -> std::io::Result<()> {
        self.send(Request::WriteBit { bit, state })
    }

    /// Writes a PWM duty value to an output pin.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::BrokenPipe`] if the worker is gone.
    pub fn analog_write(&self, bit: u8, value: u8) -> std::io::Result<()> {
        self.send(Request::AnalogWrite { bit, value })
    }

    /// Replaces the pin configuration; it is re-applied on every connect.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::BrokenPipe`] if the worker is gone.
    pub fn configure(&self, config: Config) -> std::io::Result<()> {
        self.send(Request::Configure(config))
    }

    /// Starts recording an analog profile.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::BrokenPipe`] if the worker is gone.
    pub fn start_recording(&self, record: RecordGhostCar) -> std::io::Result<()> {
        self.send(Request::StartRecording(record))
    }

    /// Stops recording; the profile arrives as
    /// [`Event::GhostCarRecorded`](crate::event::Event::GhostCarRecorded).
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::BrokenPipe`] if the worker is gone.
    pub fn stop_recording(&self) -> std::io::Result<()> {
        self.send(Request::StopRecording)
    }

    /// Starts replaying a recorded profile.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::BrokenPipe`] if the worker is gone.
    pub fn start_replay(
        &self,
        profile: Vec<GhostCarSample>,
        setup: StartGhostCar,
    ) -> std::io::Result<()> {
        self.send(Request::StartReplay { profile, setup })
    }

    /// Stops the replay and cuts power to its output pin.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::BrokenPipe`] if the worker is gone.
    pub fn stop_replay(&self) -> std::io::Result<()> {
        self.send(Request::StopReplay)
    }

    /// Restarts the replay from the top, e.g. when the ghost car crosses
    /// the start/finish line.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::BrokenPipe`] if the worker is gone.
    pub fn sync_replay(&self) -> std::io::Result<()> {
        self.send(Request::SyncReplay)
    }

    /// Asks the worker to terminate.
    pub fn stop(&self) {
        self.terminate.store(true, Ordering::Relaxed);
    }

    fn send(&self, request: Request) -> std::io::Result<()> {
        self.requests
            .send(request)
            .map_err(|_| Error::new(ErrorKind::BrokenPipe, "protocol worker is gone"))
    }
}
