use std::fmt::{Display, Formatter};

use crate::error::FrameError;

/// One ghost-car replay sample sent to the board's actuator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GhostCarValue {
    /// Throttle voltage, 0..=255.
    pub volt: u8,
    /// Expected current draw, 0..=255.
    pub ampere: u8,
}

impl GhostCarValue {
    /// Size of the payload on the wire.
    pub const SIZE: usize = 2;

    /// Encodes the payload in wire order.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; Self::SIZE] {
        [self.volt, self.ampere]
    }
}

impl Display for GhostCarValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GHOST_CAR_VALUE({}/{})", self.volt, self.ampere)
    }
}

impl TryFrom<&[u8]> for GhostCarValue {
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

#[cfg(test)]
mod tests {
    use super::GhostCarValue;

    #[test]
    fn test_round_trip() {
        let value = GhostCarValue {
            volt: 180,
            ampere: 40,
        };
        assert_eq!(GhostCarValue::try_from(&value.to_bytes()[..]), Ok(value));
    }
}
