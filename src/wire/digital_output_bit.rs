use std::fmt::{Display, Formatter};

use crate::error::FrameError;

/// A single digital output bit write.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DigitalOutputBit {
    /// The output bit index.
    pub bit: u8,
    /// The new state, `0` or `1`.
    pub state: u8,
}

impl DigitalOutputBit {
    /// Size of the payload on the wire.
    pub const SIZE: usize = 2;

    /// Encodes the payload in wire order.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; Self::SIZE] {
        [self.bit, self.state]
    }
}

impl Display for DigitalOutputBit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DIGITAL_OUT_BIT({} = {})", self.bit, self.state)
    }
}

impl TryFrom<&[u8]> for DigitalOutputBit {
    type Error = FrameError;

    fn try_from(buffer: &[u8]) -> Result<Self, Self::Error> {
        if buffer.len() == Self::SIZE {
            Ok(Self {
                bit: buffer[0],
                state: buffer[1],
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
    use super::DigitalOutputBit;

    #[test]
    fn test_round_trip() {
        let output = DigitalOutputBit { bit: 9, state: 1 };
        assert_eq!(
            DigitalOutputBit::try_from(&output.to_bytes()[..]),
            Ok(output)
        );
    }
}
