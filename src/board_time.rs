//! Translation of board-relative timestamps into host wall-clock time.

use std::time::{Duration, SystemTime};

/// The board-time origin established by the connection handshake.
///
/// `DigitalInput.time` fields are milliseconds since the board booted. The
/// handshake computes the host timestamp of that boot once per connection;
/// a failed handshake is surfaced explicitly instead of silently treating
/// board-relative milliseconds as host time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimeSync {
    /// The origin is known; board timestamps can be translated.
    Synchronized {
        /// Host wall-clock time of the board's boot.
        origin: SystemTime,
    },
    /// No `BOARD_TIME` reply arrived within the attempt budget.
    Unsynchronized,
}

impl TimeSync {
    /// Computes the origin from the board's reported uptime.
    #[must_use]
    pub fn from_uptime(now: SystemTime, uptime_ms: u32) -> Self {
        now.checked_sub(Duration::from_millis(u64::from(uptime_ms)))
            .map_or(Self::Unsynchronized, |origin| Self::Synchronized { origin })
    }

    /// Translates a board-relative millisecond timestamp.
    #[must_use]
    pub fn translate(&self, board_ms: u32) -> Option<SystemTime> {
        match self {
            Self::Synchronized { origin } => {
                Some(*origin + Duration::from_millis(u64::from(board_ms)))
            }
            Self::Unsynchronized => None,
        }
    }

    /// Whether the origin is known.
    #[must_use]
    pub const fn is_synchronized(&self) -> bool {
        matches!(self, Self::Synchronized { .. })
    }
}
