use std::fmt::{Display, Formatter};

use crate::error::FrameError;

/// A debounced digital input batch reported by the board.
///
/// Also used as the payload of `BOARD_TIME` replies, where `time` carries the
/// board's uptime and `value` is zero.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DigitalInput {
    /// Board-relative timestamp in milliseconds since boot.
    pub time: u32,
    /// State mask of all digital input lines.
    pub value: u32,
}

impl DigitalInput {
    /// Size of the payload on the wire.
    pub const SIZE: usize = 8;

    /// Encodes the payload in wire order.
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];
        bytes[..4].copy_from_slice(&self.time.to_le_bytes());
        bytes[4..].copy_from_slice(&self.value.to_le_bytes());
        bytes
    }
}

impl Display for DigitalInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DIGITAL_IN({:#034b} at {}ms)", self.value, self.time)
    }
}

impl TryFrom<&[u8]> for DigitalInput {
    type Error = FrameError;

    fn try_from(buffer: &[u8]) -> Result<Self, Self::Error> {
        if buffer.len() == Self::SIZE {
            Ok(Self {
                time: u32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]),
                value: u32::from_le_bytes([buffer[4], buffer[5], buffer[6], buffer[7]]),
            })
        } else {
            Err(FrameError::InvalidBufferSize {
                expected: Self::SIZE,
                found: buffer.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DigitalInput;
    use crate::error::FrameError;

    #[test]
    fn test_round_trip() {
        let input = DigitalInput {
            time: 0x0102_0304,
            value: 0xA0B0_C0D0,
        };
        let bytes = input.to_bytes();
        assert_eq!(bytes, [0x04, 0x03, 0x02, 0x01, 0xD0, 0xC0, 0xB0, 0xA0]);
        assert_eq!(DigitalInput::try_from(&bytes[..]), Ok(input));
    }

    #[test]
    fn test_invalid_size() {
        assert_eq!(
            DigitalInput::try_from([0u8; 7].as_slice()),
            Err(FrameError::InvalidBufferSize {
                expected: 8,
                found: 7
            })
        );
    }
}
