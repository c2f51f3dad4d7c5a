//! The wire envelope: one command byte, one size byte, then the payload.

use std::fmt::{Display, Formatter};

use crate::command::Command;
use crate::error::FrameError;

/// Capacity of the receive buffer and therefore the largest legal payload.
pub const MAX_PAYLOAD_SIZE: usize = 100;

/// Payload bytes of a single frame.
pub type Payload = heapless::Vec<u8, MAX_PAYLOAD_SIZE>;

/// Raw bytes of a single encoded frame, including the two envelope bytes.
pub type RawFrame = heapless::Vec<u8, { MAX_PAYLOAD_SIZE + 2 }>;

/// One command/size/payload unit on the wire.
///
/// A frame only lives for the duration of one send or receive.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    command: Command,
    payload: Payload,
}

impl Frame {
    /// Creates a frame from a command and its payload bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::PayloadTooLarge`] if the payload exceeds
    /// [`MAX_PAYLOAD_SIZE`].
    pub fn new(command: Command, payload: &[u8]) -> Result<Self, FrameError> {
        Ok(Self {
            command,
            payload: Payload::from_slice(payload)
                .map_err(|()| FrameError::PayloadTooLarge(payload.len()))?,
        })
    }

    /// Creates a frame without a payload.
    #[must_use]
    pub const fn empty(command: Command) -> Self {
        Self {
            command,
            payload: Payload::new(),
        }
    }

    /// Parses a frame from its command byte and payload bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::UnknownCommand`] for an id outside the protocol
    /// and [`FrameError::PayloadTooLarge`] for an oversized payload.
    pub fn parse(id: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let command = Command::from_u8(id).ok_or(FrameError::UnknownCommand(id))?;
        Self::new(command, payload)
    }

    /// Returns the command of this frame.
    #[must_use]
    pub const fn command(&self) -> Command {
        self.command
    }

    /// Returns the payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Encodes the frame as `[command][size][payload...]`.
    ///
    /// The payload is written verbatim; the wire carries no escaping and no
    /// checksum, the line is opened in raw mode and trusted to be
    /// binary-transparent.
    #[must_use]
    pub fn encode(&self) -> RawFrame {
        let mut bytes = RawFrame::new();
        // Both pushes are infallible: capacity is MAX_PAYLOAD_SIZE + 2.
        let _ = bytes.push(self.command as u8);
        let _ = bytes.push(self.payload.len() as u8);
        let _ = bytes.extend_from_slice(&self.payload);
        bytes
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({} bytes)", self.command, self.payload.len())
    }
}
