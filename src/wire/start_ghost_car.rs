use std::fmt::{Display, Formatter};

use crate::error::FrameError;

/// Starts ghost-car replay on the board.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StartGhostCar {
    /// Output cadence in milliseconds.
    pub cycle: i8,
    /// PWM output pin driving the lane.
    pub bit: u8,
    /// Analog pin measuring the lane current.
    pub ampere_bit: u8,
    /// Control-loop cadence in milliseconds, [`NO_CHANNEL`](crate::wire::NO_CHANNEL) disables it.
    pub control_cycle: i8,
    /// Correction factor applied when the car draws too much power.
    pub dec_factor: u8,
    /// Correction factor applied when the car draws too little power.
    pub inc_factor: u8,
}

impl StartGhostCar {
    /// Size of the payload on the wire.
    pub const SIZE: usize = 6;

    /// Encodes the payload in wire order.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; Self::SIZE] {
        [
            self.cycle as u8,
            self.bit,
            self.ampere_bit,
            self.control_cycle as u8,
            self.dec_factor,
            self.inc_factor,
        ]
    }
}

impl Display for StartGhostCar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "START_GHOST_CAR(every {}ms, pwm {}, ampere {})",
            self.cycle, self.bit, self.ampere_bit
        )
    }
}

impl TryFrom<&[u8]> for StartGhostCar {
    type Error = FrameError;

    fn try_from(buffer: &[u8]) -> Result<Self, Self::Error> {
        if buffer.len() == Self::SIZE {
            Ok(Self {
                cycle: buffer[0] as i8,
                bit: buffer[1],
                ampere_bit: buffer[2],
                control_cycle: buffer[3] as i8,
                dec_factor: buffer[4],
                inc_factor: buffer[5],
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
    use super::StartGhostCar;

    #[test]
    fn test_round_trip() {
        let start = StartGhostCar {
            cycle: 100,
            bit: 14,
            ampere_bit: 2,
            control_cycle: 4,
            dec_factor: 1,
            inc_factor: 4,
        };
        assert_eq!(StartGhostCar::try_from(&start.to_bytes()[..]), Ok(start));
    }
}
