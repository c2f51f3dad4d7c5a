use crate::error::FrameError;

/// The whole digital output mask, written in one command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DigitalOutput {
    /// State mask for all digital output lines.
    pub value: u32,
}

impl DigitalOutput {
    /// Size of the payload on the wire.
    pub const SIZE: usize = 4;

    /// Encodes the payload in wire order.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; Self::SIZE] {
        self.value.to_le_bytes()
    }
}

impl TryFrom<&[u8]> for DigitalOutput {
    type Error = FrameError;

    fn try_from(buffer: &[u8]) -> Result<Self, Self::Error> {
        if buffer.len() == Self::SIZE {
            Ok(Self {
                value: u32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]),
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
    use super::DigitalOutput;

    #[test]
    fn test_round_trip() {
        let output = DigitalOutput { value: 0x00FF_00AA };
        assert_eq!(DigitalOutput::try_from(&output.to_bytes()[..]), Ok(output));
    }
}
