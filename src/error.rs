use std::fmt::{Display, Formatter};

use crate::frame::MAX_PAYLOAD_SIZE;

/// Errors that can occur while parsing frames and payloads.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FrameError {
    /// The command identifier is not part of the protocol.
    UnknownCommand(u8),
    /// The declared payload size exceeds the transport buffer capacity.
    PayloadTooLarge(usize),
    /// A payload buffer did not have the expected size.
    InvalidBufferSize {
        /// The expected amount of bytes.
        expected: usize,
        /// The found amount of bytes.
        found: usize,
    },
}

impl Display for FrameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCommand(id) => write!(f, "Unknown command id: {id:#04X}"),
            Self::PayloadTooLarge(size) => write!(
                f,
                "Declared payload size {size} exceeds buffer capacity of {MAX_PAYLOAD_SIZE} bytes."
            ),
            Self::InvalidBufferSize { expected, found } => write!(
                f,
                "Invalid buffer size. Expected {expected} bytes, but found {found} bytes."
            ),
        }
    }
}

impl std::error::Error for FrameError {}

impl From<FrameError> for std::io::Error {
    fn from(error: FrameError) -> Self {
        Self::new(std::io::ErrorKind::InvalidData, error)
    }
}
