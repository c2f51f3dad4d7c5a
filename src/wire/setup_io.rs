use std::fmt::{Display, Formatter};

use crate::error::FrameError;

/// Configures the board's input/output pin masks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SetupIo {
    /// Mask of pins configured as inputs.
    pub bits_input: u16,
    /// Mask of pins configured as outputs.
    pub bits_output: u16,
    /// Non-zero enables the shift-register I/O extension.
    pub with_spi_extension: u8,
}

impl SetupIo {
    /// Size of the payload on the wire.
    pub const SIZE: usize = 5;

    /// Encodes the payload in wire order.
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];
        bytes[..2].copy_from_slice(&self.bits_input.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.bits_output.to_le_bytes());
        bytes[4] = self.with_spi_extension;
        bytes
    }
}

impl Display for SetupIo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SETUP_IO(in {:#018b}, out {:#018b}, spi {})",
            self.bits_input, self.bits_output, self.with_spi_extension
        )
    }
}

impl TryFrom<&[u8]> for SetupIo {
    type Error = FrameError;

    fn try_from(buffer: &[u8]) -> Result<Self, Self::Error> {
        if buffer.len() == Self::SIZE {
            Ok(Self {
                bits_input: u16::from_le_bytes([buffer[0], buffer[1]]),
                bits_output: u16::from_le_bytes([buffer[2], buffer[3]]),
                with_spi_extension: buffer[4],
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
    use super::SetupIo;

    #[test]
    fn test_round_trip() {
        let setup = SetupIo {
            bits_input: 0b0000_0000_0011_1100,
            bits_output: 0b0011_1100_0000_0000,
            with_spi_extension: 1,
        };
        assert_eq!(setup.to_bytes(), [0x3C, 0x00, 0x00, 0x3C, 0x01]);
        assert_eq!(SetupIo::try_from(&setup.to_bytes()[..]), Ok(setup));
    }
}
