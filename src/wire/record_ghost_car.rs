use std::fmt::{Display, Formatter};

use crate::error::FrameError;
use crate::wire::NO_CHANNEL;

/// Starts or stops ghost-car recording on the board.
///
/// A `volt_bit` of [`NO_CHANNEL`] is the stop sentinel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RecordGhostCar {
    /// Sampling cadence in milliseconds.
    pub cycle: u8,
    /// Analog pin for the voltage channel, or [`NO_CHANNEL`].
    pub volt_bit: i8,
    /// Analog pin for the current channel, or [`NO_CHANNEL`].
    pub ampere_bit: i8,
}

impl RecordGhostCar {
    /// Size of the payload on the wire.
    pub const SIZE: usize = 3;

    /// The stop sentinel: no channels, recording off.
    #[must_use]
    pub const fn off(cycle: u8) -> Self {
        Self {
            cycle,
            volt_bit: NO_CHANNEL,
            ampere_bit: NO_CHANNEL,
        }
    }

    /// Whether this payload stops recording.
    #[must_use]
    pub const fn is_off(self) -> bool {
        self.volt_bit == NO_CHANNEL
    }

    /// Encodes the payload in wire order.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; Self::SIZE] {
        [self.cycle, self.volt_bit as u8, self.ampere_bit as u8]
    }
}

impl Display for RecordGhostCar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_off() {
            write!(f, "RECORD_GHOST_CAR(off)")
        } else {
            write!(
                f,
                "RECORD_GHOST_CAR(every {}ms, pins {}/{})",
                self.cycle, self.volt_bit, self.ampere_bit
            )
        }
    }
}

impl TryFrom<&[u8]> for RecordGhostCar {
    type Error = FrameError;

    fn try_from(buffer: &[u8]) -> Result<Self, Self::Error> {
        if buffer.len() == Self::SIZE {
            Ok(Self {
                cycle: buffer[0],
                volt_bit: buffer[1] as i8,
                ampere_bit: buffer[2] as i8,
            })
        } else {
            Err(FrameError::InvalidBufferSize {
                expected: Self::SIZE,
                found: buffer.len(),
            })
        }
    }
}
