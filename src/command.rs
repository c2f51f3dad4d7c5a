use std::fmt::{Display, Formatter};

/// Commands understood by the controller board and the host.
///
/// The identifiers are fixed by the board firmware and must not be renumbered.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Command {
    /// Host -> board: request the board's uptime in milliseconds.
    GetTime = 0x01,
    /// Host -> board: set the whole digital output mask.
    DigitalOut = 0x02,
    /// Host -> board: set a single digital output bit.
    DigitalOutBit = 0x03,
    /// Host -> board: write an analog (PWM) output.
    AnalogOut = 0x04,
    /// Host -> board: request a snapshot of the digital inputs.
    GetInputs = 0x05,
    /// Host -> board: start or stop ghost-car recording.
    RecordGhostCar = 0x06,
    /// Host -> board: start ghost-car replay.
    StartGhostCar = 0x07,
    /// Host -> board: stop ghost-car replay.
    StopGhostCar = 0x08,
    /// Host -> board: one ghost-car replay sample.
    GhostCarValue = 0x09,
    /// Host -> board: configure the input/output pin masks.
    SetupIo = 0x0A,
    /// Host -> board: empty the ghost-car replay buffer.
    GhostCarFlush = 0x0B,
    /// Board -> host: the replay buffer is full, retry the last sample.
    GhostCarBufferFull = 0x0E,
    /// Board -> host: a debounced digital input batch.
    DigitalIn = 0x0F,
    /// Board -> host: one analog sample pair.
    AnalogIn = 0x10,
    /// Board -> host: reply to [`Command::GetTime`].
    BoardTime = 0x11,
    /// Board -> host: a diagnostic message.
    Debug = 0x12,
}

impl Command {
    /// Parses a command identifier from its wire byte.
    #[must_use]
    pub const fn from_u8(id: u8) -> Option<Self> {
        match id {
            0x01 => Some(Self::GetTime),
            0x02 => Some(Self::DigitalOut),
            0x03 => Some(Self::DigitalOutBit),
            0x04 => Some(Self::AnalogOut),
            0x05 => Some(Self::GetInputs),
            0x06 => Some(Self::RecordGhostCar),
            0x07 => Some(Self::StartGhostCar),
            0x08 => Some(Self::StopGhostCar),
            0x09 => Some(Self::GhostCarValue),
            0x0A => Some(Self::SetupIo),
            0x0B => Some(Self::GhostCarFlush),
            0x0E => Some(Self::GhostCarBufferFull),
            0x0F => Some(Self::DigitalIn),
            0x10 => Some(Self::AnalogIn),
            0x11 => Some(Self::BoardTime),
            0x12 => Some(Self::Debug),
            _ => None,
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GetTime => write!(f, "GET_TIME"),
            Self::DigitalOut => write!(f, "DIGITAL_OUT"),
            Self::DigitalOutBit => write!(f, "DIGITAL_OUT_BIT"),
            Self::AnalogOut => write!(f, "ANALOG_OUT"),
            Self::GetInputs => write!(f, "GET_INPUTS"),
            Self::RecordGhostCar => write!(f, "RECORD_GHOST_CAR"),
            Self::StartGhostCar => write!(f, "START_GHOST_CAR"),
            Self::StopGhostCar => write!(f, "STOP_GHOST_CAR"),
            Self::GhostCarValue => write!(f, "GHOST_CAR_VALUE"),
            Self::SetupIo => write!(f, "SETUP_IO"),
            Self::GhostCarFlush => write!(f, "GHOST_CAR_FLUSH"),
            Self::GhostCarBufferFull => write!(f, "GHOST_CAR_BUFFER_FULL"),
            Self::DigitalIn => write!(f, "DIGITAL_IN"),
            Self::AnalogIn => write!(f, "ANALOG_IN"),
            Self::BoardTime => write!(f, "BOARD_TIME"),
            Self::Debug => write!(f, "DEBUG"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Command;

    #[test]
    fn test_from_u8_round_trip() {
        for command in [
            Command::GetTime,
            Command::DigitalOut,
            Command::DigitalOutBit,
            Command::AnalogOut,
            Command::GetInputs,
            Command::RecordGhostCar,
            Command::StartGhostCar,
            Command::StopGhostCar,
            Command::GhostCarValue,
            Command::SetupIo,
            Command::GhostCarFlush,
            Command::GhostCarBufferFull,
            Command::DigitalIn,
            Command::AnalogIn,
            Command::BoardTime,
            Command::Debug,
        ] {
            assert_eq!(Command::from_u8(command as u8), Some(command));
        }
    }

    #[test]
    fn test_unknown_ids() {
        assert_eq!(Command::from_u8(0x00), None);
        assert_eq!(Command::from_u8(0x0C), None);
        assert_eq!(Command::from_u8(0x0D), None);
        assert_eq!(Command::from_u8(0x13), None);
        assert_eq!(Command::from_u8(0xFF), None);
    }

    #[test]
    fn test_to_string() {
        assert_eq!(&Command::GetTime.to_string(), "GET_TIME");
        assert_eq!(
            &Command::GhostCarBufferFull.to_string(),
            "GHOST_CAR_BUFFER_FULL"
        );
    }
}
