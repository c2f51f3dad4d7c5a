use crate::error::FrameError;

/// An analog (PWM) output write.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AnalogOutput {
    /// The output pin.
    pub bit: u8,
    /// The PWM duty value; `0` switches the pin to digital low.
    pub value: u8,
}

impl AnalogOutput {
    /// Size of the payload on the wire.
    pub const SIZE: usize = 2;

    /// Encodes the payload in wire order.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; Self::SIZE] {
        [self.bit, self.value]
    }
}

impl TryFrom<&[u8]> for AnalogOutput {
    type Error = FrameError;

    fn try_from(buffer: &[u8]) -> Result<Self, Self::Error> {
        if buffer.len() == Self::SIZE {
            Ok(Self {
                bit: buffer[0],
                value: buffer[1],
            })
        } else {
            Err(FrameError::InvalidBufferSize {
                expected: Self::SIZE,
                found: buffer.len(),
            })
        }
    }
}
