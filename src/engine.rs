//! The protocol worker: owns the link, drives the state machines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant};

use log::info;

use crate::board_time::TimeSync;
use crate::channels::Channels;
use crate::debounce::{Debouncer, HOST_BOUNCE_MS};
use crate::event::{Event, GhostCarSample};
use crate::ghost_car::Replay;
use crate::handle::Handle;
use crate::link::{Link, SerialLink};
use crate::request::Config;
use crate::retry::RetryGate;
use crate::status::Status;
use crate::transport::Transport;

mod connect;
mod poll;
mod requests;

/// Minimum spacing between attempts to open the device.
const RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// Pause per loop iteration while disconnected.
const DISCONNECTED_PAUSE: Duration = Duration::from_secs(1);

/// Pause per loop iteration while connected but idle.
const IDLE_PAUSE: Duration = Duration::from_micros(100);

/// Cadence sent with the recording-off sentinel.
const DEFAULT_RECORD_CYCLE: u8 = 100;

/// Opens the link to one board, repeatedly if need be.
pub trait Connector: Send + 'static {
    /// The link this connector produces.
    type Link: Link + 'static;

    /// Opens a fresh link.
    ///
    /// # Errors
    ///
    /// Returns an [`std::io::Error`] if the device is not available.
    fn open(&mut self) -> std::io::Result<Self::Link>;
}

/// Opens a serial device by path.
#[derive(Clone, Debug)]
pub struct SerialConnector {
    path: String,
}

impl SerialConnector {
    /// Creates a connector for the given device path.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Connector for SerialConnector {
    type Link = SerialLink;

    fn open(&mut self) -> std::io::Result<Self::Link> {
        SerialLink::open(&self.path).map_err(std::io::Error::from)
    }
}

/// The worker's complete state.
///
/// Owning the transport in one thread guarantees at most one frame in
/// flight per direction without any locking around the serial handle.
pub struct Engine<C>
where
    C: Connector,
{
    connector: C,
    channels: Channels,
    config: Config,
    terminate: Arc<AtomicBool>,
    transport: Option<Transport<C::Link>>,
    status: Status,
    retry: RetryGate,
    time_sync: TimeSync,
    debouncer: Debouncer,
    replay: Option<Replay>,
    next_replay_at: Instant,
    recording: Option<Vec<GhostCarSample>>,
}

impl<C> Engine<C>
where
    C: Connector,
{
    /// Creates a worker; it does nothing until [`Engine::run`] is called.
    #[must_use]
    pub(crate) fn new(
        connector: C,
        channels: Channels,
        config: Config,
        terminate: Arc<AtomicBool>,
    ) -> Self {
        Self {
            connector,
            channels,
            config,
            terminate,
            transport: None,
            status: Status::Disconnected,
            retry: RetryGate::new(RETRY_INTERVAL),
            time_sync: TimeSync::Unsynchronized,
            debouncer: Debouncer::new(HOST_BOUNCE_MS, u32::MAX),
            replay: None,
            next_replay_at: Instant::now(),
            recording: None,
        }
    }

    /// Spawns a worker thread and returns its handle and event stream.
    #[must_use]
    pub fn spawn(connector: C, config: Config) -> (Handle, Receiver<Event>) {
        let (request_sender, request_receiver) = channel();
        let (event_sender, event_receiver) = channel();
        let terminate = Arc::new(AtomicBool::new(false));

        let engine = Self::new(
            connector,
            Channels::new(request_receiver, event_sender),
            config,
            terminate.clone(),
        );
        std::thread::spawn(move || engine.run());

        (Handle::new(request_sender, terminate), event_receiver)
    }

    /// Runs until asked to terminate or the application hangs up.
    pub(crate) fn run(mut self) {
        info!("Protocol worker started");

        while !self.terminate.load(Ordering::Relaxed) && !self.channels.closed() {
            self.step();
        }

        self.disconnect();
        info!("Protocol worker stopped");
    }

    fn step(&mut self) {
        self.handle_requests();

        if self.transport.is_some() {
            self.poll_link();
            self.tick_replay();
            sleep(IDLE_PAUSE);
        } else if self.retry.check(Instant::now()) {
            self.try_connect();
        } else {
            sleep(DISCONNECTED_PAUSE);
        }
    }

    /// Current connection status.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }
}
