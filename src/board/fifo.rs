use crate::command::Command;
use crate::frame::Frame;
use crate::wire::{AnalogInput, DigitalInput};

/// Capacity of the outbound sample FIFO; the board has about 1 kB of SRAM.
pub const FIFO_CAPACITY: usize = 30;

/// One queued sample, tagged with the command it will be sent under.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Sample {
    /// A debounced digital input batch.
    Digital {
        /// State mask of all input lines.
        value: u32,
        /// Milliseconds since board boot.
        time: u32,
    },
    /// A ghost-car recording sample.
    Analog {
        /// Scaled voltage, 0..=255.
        volt: u8,
        /// Scaled current, 0..=255.
        ampere: u8,
    },
}

impl From<Sample> for Frame {
    fn from(sample: Sample) -> Self {
        match sample {
            Sample::Digital { value, time } => {
                // Payload size is fixed and far below the frame capacity.
                Self::new(Command::DigitalIn, &DigitalInput { time, value }.to_bytes())
                    .unwrap_or_else(|_| Self::empty(Command::DigitalIn))
            }
            Sample::Analog { volt, ampere } => {
                Self::new(Command::AnalogIn, &AnalogInput { volt, ampere }.to_bytes())
                    .unwrap_or_else(|_| Self::empty(Command::AnalogIn))
            }
        }
    }
}

/// Bounded outbound queue between the sampler and the serial line.
///
/// A full FIFO drops the offered sample instead of blocking; the host's view
/// goes stale until the queue drains.
#[derive(Debug, Default)]
pub struct SampleFifo {
    queue: heapless::Deque<Sample, FIFO_CAPACITY>,
}

impl SampleFifo {
    /// Creates an empty FIFO.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a sample; returns `false` if it was dropped on a full queue.
    pub fn offer(&mut self, sample: Sample) -> bool {
        self.queue.push_back(sample).is_ok()
    }

    /// Dequeues the oldest sample.
    pub fn pop(&mut self) -> Option<Sample> {
        self.queue.pop_front()
    }

    /// Number of queued samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue is full.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.queue.is_full()
    }

    /// Drops all queued samples.
    pub fn flush(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{Sample, SampleFifo, FIFO_CAPACITY};

    #[test]
    fn test_order() {
        let mut fifo = SampleFifo::new();
        assert!(fifo.offer(Sample::Digital { value: 1, time: 10 }));
        assert!(fifo.offer(Sample::Digital { value: 3, time: 20 }));

        assert_eq!(fifo.pop(), Some(Sample::Digital { value: 1, time: 10 }));
        assert_eq!(fifo.pop(), Some(Sample::Digital { value: 3, time: 20 }));
        assert_eq!(fifo.pop(), None);
    }

    #[test]
    fn test_drop_on_full() {
        let mut fifo = SampleFifo::new();

        for n in 0..FIFO_CAPACITY {
            assert!(fifo.offer(Sample::Analog {
                volt: n as u8,
                ampere: 0
            }));
        }

        assert!(fifo.is_full());
        assert!(!fifo.offer(Sample::Analog {
            volt: 0xFF,
            ampere: 0
        }));
        assert_eq!(fifo.len(), FIFO_CAPACITY);
    }

    #[test]
    fn test_flush() {
        let mut fifo = SampleFifo::new();
        fifo.offer(Sample::Analog { volt: 1, ampere: 2 });
        fifo.flush();
        assert_eq!(fifo.pop(), None);
    }
}
