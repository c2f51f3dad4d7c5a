use std::fmt::{Display, Formatter};

use crate::error::FrameError;

/// One analog sample pair reported by the board.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AnalogInput {
    /// Scaled voltage sample, 0..=255.
    pub volt: u8,
    /// Scaled current sample, 0..=255.
    pub ampere: u8,
}

impl AnalogInput {
    /// Size of the payload on the wire.
    pub const SIZE: usize = 2;

    /// Encodes the payload in wire order.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; Self::SIZE] {
        [self.volt, self.ampere]
    }
}

impl Display for AnalogInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ANALOG_IN({}/{})", self.volt, self.ampere)
    }
}

impl TryFrom<&[u8]> for AnalogInput {
    type Error = FrameError;

    fn try_from(buffer: &[u8]) -> Result<Self, Self::Error> {
        if buffer.len() == Self::SIZE {
            Ok(Self {
                volt: buffer[0],
                ampere: buffer[1],
            })
        } else {
            Err(FrameError::InvalidBufferSize {
                expected: Self::SIZE,
                found: buffer.len(),
            })
        }
    }
}
