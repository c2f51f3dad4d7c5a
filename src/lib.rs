//! Serial protocol for a two-lane slot-car timing controller board.
//!
//! The board counts laps, debounces track sensors and drives lane power;
//! this crate implements both ends of its byte protocol. The host side is
//! the part applications use: [`Engine::spawn`] starts a worker thread
//! that owns the serial line, reconnects on its own and reports through an
//! event channel, while [`Handle`] sends it requests. The embedded side
//! under [`board`] mirrors the firmware as a plain state machine; the
//! [`board::SimulatedBoard`] runs it behind the [`Link`] trait so the
//! whole protocol can be exercised without hardware.
//!
//! Frames on the wire are `[command][size][payload]` with little-endian
//! packed payloads, no checksum and no escaping; the line runs at
//! 57600 baud, 8N1, over a USB serial bridge.

pub use board_time::TimeSync;
pub use command::Command;
pub use debounce::{active_functions, Debouncer, InputFunction, TriggerEdge};
pub use engine::{Connector, Engine, SerialConnector};
pub use error::FrameError;
pub use event::{AnalogEvent, DigitalEvent, Event, GhostCarSample};
pub use frame::{Frame, MAX_PAYLOAD_SIZE};
pub use ghost_car::Replay;
pub use handle::Handle;
pub use link::{Link, SerialLink, BAUD_RATE};
pub use request::{Config, Request};
pub use status::Status;
pub use transport::Transport;

pub mod board;
mod board_time;
mod channels;
mod command;
pub mod debounce;
mod engine;
mod error;
mod event;
mod frame;
mod ghost_car;
mod handle;
mod link;
mod request;
mod retry;
mod status;
mod transport;
pub mod wire;
