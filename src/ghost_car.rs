//! Host-side ghost-car replay.
//!
//! The board buffers at most [`GC_RING_CAPACITY`](crate::board::state::GC_RING_CAPACITY)
//! samples ahead, so the host feeds the recorded profile one sample per
//! replay period and backs off when the board reports a full ring. The
//! state machine here is pure; the worker owns the clock and the wire.

use crate::event::GhostCarSample;
use crate::wire::GhostCarValue;

/// Cadence of replay samples pushed to the board, milliseconds.
pub const REPLAY_PERIOD_MS: u64 = 20;

/// Ticks to pause after the board reported a full ring (one second).
pub const PAUSE_TICKS: u32 = 50;

/// Lowest throttle kept when the profile runs out.
const FROZEN_VOLT_FLOOR: u8 = 100;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Cursor {
    /// Next sample to send.
    At(usize),
    /// Past the end; the frozen value is re-sent every period.
    Frozen,
}

/// Feeds one recorded profile to the board, sample by sample.
#[derive(Clone, Debug)]
pub struct Replay {
    samples: Vec<GhostCarSample>,
    cursor: Cursor,
    pause: u32,
    frozen: GhostCarValue,
}

impl Replay {
    /// Starts a replay at the beginning of `samples`.
    #[must_use]
    pub fn new(samples: Vec<GhostCarSample>) -> Self {
        Self {
            samples,
            cursor: Cursor::At(0),
            pause: 0,
            frozen: GhostCarValue { volt: 0, ampere: 0 },
        }
    }

    /// Produces the sample due this period, if any.
    ///
    /// Once the profile is exhausted the last sample keeps being sent at
    /// half throttle (but no less than a creep-along floor) so the car
    /// never stops dead on the track.
    pub fn tick(&mut self) -> Option<GhostCarValue> {
        if self.pause > 0 {
            self.pause -= 1;
            return None;
        }

        match self.cursor {
            Cursor::At(index) => {
                let sample = *self.samples.get(index)?;

                if index + 1 < self.samples.len() {
                    self.cursor = Cursor::At(index + 1);
                    Some(GhostCarValue {
                        volt: sample.volt,
                        ampere: sample.ampere,
                    })
                } else {
                    self.frozen = GhostCarValue {
                        volt: (sample.volt / 2).max(FROZEN_VOLT_FLOOR),
                        ampere: sample.ampere / 2,
                    };
                    self.cursor = Cursor::Frozen;
                    Some(self.frozen)
                }
            }
            Cursor::Frozen => Some(self.frozen),
        }
    }

    /// Handles a `GHOST_CAR_BUFFER_FULL` report.
    ///
    /// The rejected sample was the one sent last period, so the cursor
    /// steps back exactly one and the feed pauses while the board drains.
    pub fn on_buffer_full(&mut self) {
        self.pause = PAUSE_TICKS;

        if let Cursor::At(index) = self.cursor {
            self.cursor = Cursor::At(index.saturating_sub(1));
        }
    }

    /// Restarts the profile on a lap-synchronization point.
    ///
    /// The caller flushes the board's ring first; the returned sample is
    /// sent immediately so the car reacts on the sync itself rather than
    /// one period later.
    pub fn sync(&mut self) -> Option<GhostCarValue> {
        self.pause = 0;
        self.cursor = Cursor::At(0);
        self.tick()
    }
}
