//! Digital-input debouncing and edge detection.
//!
//! The same algorithm runs on the board (200 ms window, raw pin cadence) and
//! again on the host (30 ms window, per received batch) as defense in depth.
//! Both windows are independent tuning parameters.

/// Number of digital input lines covered by one bounce table.
pub const LINE_COUNT: usize = 32;

/// Bounce window applied by the host to received input batches, milliseconds.
pub const HOST_BOUNCE_MS: u64 = 30;

/// Bounce window applied by the board to raw pin samples, milliseconds.
pub const BOARD_BOUNCE_MS: u64 = 200;

/// The transition direction that makes an input function fire.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TriggerEdge {
    /// Fire on 0 -> 1.
    Rising,
    /// Fire on 1 -> 0.
    Falling,
}

/// Maps a logical input function to its physical bit and active edge.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InputFunction {
    /// Physical input bit of the function.
    pub bit: u8,
    /// The transition direction the function reacts to.
    pub edge: TriggerEdge,
}

/// Per-bit bounce suppression over a 32-line input mask.
#[derive(Clone, Debug)]
pub struct Debouncer {
    window_ms: u64,
    value: u32,
    accepted_at: [u64; LINE_COUNT],
}

impl Debouncer {
    /// Creates a debouncer with the given window and initial line state.
    #[must_use]
    pub const fn new(window_ms: u64, initial: u32) -> Self {
        Self {
            window_ms,
            value: initial,
            accepted_at: [0; LINE_COUNT],
        }
    }

    /// Feeds one raw sample round.
    ///
    /// Returns the mask of bits whose new state was accepted this round: a
    /// bit toggles only if it differs from the last accepted state and its
    /// previous accepted transition is older than the bounce window.
    pub fn changes(&mut self, raw: u32, at_ms: u64) -> u32 {
        let mut changed = 0;

        for bit in 0..LINE_COUNT {
            let mask = 1_u32 << bit;

            if (self.value ^ raw) & mask != 0
                && at_ms.saturating_sub(self.accepted_at[bit]) > self.window_ms
            {
                self.value ^= mask;
                self.accepted_at[bit] = at_ms;
                changed |= mask;
            }
        }

        changed
    }

    /// The last accepted state of all lines.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.value
    }

    /// Overrides the accepted state without firing edges.
    ///
    /// Used when a sample batch is dropped on a full FIFO: the change stays
    /// uncommitted and re-fires once the FIFO drains.
    pub fn set_value(&mut self, value: u32) {
        self.value = value;
    }

    /// Clears the bounce table and resets the accepted state.
    pub fn reset(&mut self, initial: u32) {
        self.value = initial;
        self.accepted_at = [0; LINE_COUNT];
    }
}

/// Filters accepted transitions through the per-function polarity.
///
/// Returns a bitmask of *function* indices that fired: function `n` fires if
/// its input bit toggled this round and the new state matches its configured
/// edge. Set semantics, one report per function per round.
#[must_use]
pub fn active_functions(changed: u32, state: u32, functions: &[InputFunction]) -> u32 {
    let mut fired = 0;

    for (index, function) in functions.iter().enumerate() {
        let mask = 1_u32 << function.bit;

        if changed & mask == 0 {
            continue;
        }

        let high = state & mask != 0;
        let active = match function.edge {
            TriggerEdge::Rising => high,
            TriggerEdge::Falling => !high,
        };

        if active {
            fired |= 1 << index;
        }
    }

    fired
}

#[cfg(test)]
mod tests {
    use super::{active_functions, Debouncer, InputFunction, TriggerEdge};

    #[test]
    fn test_bounce_suppression() {
        let mut debouncer = Debouncer::new(30, 0);

        // First transition of bit 5 is accepted, the bounce-back 10 ms later
        // falls inside the window and is suppressed.
        assert_eq!(debouncer.changes(1 << 5, 1_000), 1 << 5);
        assert_eq!(debouncer.changes(0, 1_010), 0);
        assert_eq!(debouncer.value(), 1 << 5);

        // Past the window the next transition is accepted again.
        assert_eq!(debouncer.changes(0, 1_031), 1 << 5);
        assert_eq!(debouncer.value(), 0);
    }

    #[test]
    fn test_unchanged_bits_do_not_fire() {
        let mut debouncer = Debouncer::new(30, 0b1010);
        assert_eq!(debouncer.changes(0b1010, 5_000), 0);
    }

    #[test]
    fn test_batching() {
        let mut debouncer = Debouncer::new(30, 0);
        // Two bits toggling in one round come back as one batch.
        assert_eq!(debouncer.changes(0b110, 9_999), 0b110);
    }

    #[test]
    fn test_polarity_filter() {
        let functions = [
            InputFunction {
                bit: 7,
                edge: TriggerEdge::Falling,
            },
            InputFunction {
                bit: 7,
                edge: TriggerEdge::Rising,
            },
        ];

        // Rising transition of bit 7: only the rising-configured function 1.
        assert_eq!(active_functions(1 << 7, 1 << 7, &functions), 0b10);
        // Falling transition: only the falling-configured function 0.
        assert_eq!(active_functions(1 << 7, 0, &functions), 0b01);
        // No transition, no report.
        assert_eq!(active_functions(0, 1 << 7, &functions), 0);
    }

    #[test]
    fn test_reset_clears_bounce_table() {
        let mut debouncer = Debouncer::new(30, 0);
        assert_eq!(debouncer.changes(1, 1_000), 1);

        debouncer.reset(0);
        // After a reset the same timestamp is accepted again.
        assert_eq!(debouncer.changes(1, 1_000), 1);
    }
}
