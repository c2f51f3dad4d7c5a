//! Framed send/receive over a [`Link`].

use std::io::{Error, ErrorKind};
use std::thread::sleep;
use std::time::Duration;

use log::{debug, trace};

use crate::error::FrameError;
use crate::frame::{Frame, Payload, MAX_PAYLOAD_SIZE};
use crate::link::Link;

/// Pause between retries of a partial read.
const RETRY_PAUSE: Duration = Duration::from_micros(100);

/// Retry budget for completing a started frame (roughly one second).
const RETRY_BUDGET: usize = 10_000;

/// Owns the link and implements the two-phase receive.
///
/// The line is half-duplex: a frame is read by first peeking the command
/// byte ([`Transport::look`]), then reading the declared size and payload
/// ([`Transport::receive`]), retrying partial reads until satisfied or the
/// retry budget runs out.
#[derive(Debug)]
pub struct Transport<T> {
    link: T,
}

impl<T> Transport<T>
where
    T: Link,
{
    /// Wraps a link.
    pub const fn new(link: T) -> Self {
        Self { link }
    }

    /// Returns the underlying link.
    pub fn into_inner(self) -> T {
        self.link
    }

    /// Probes the physical connection.
    pub fn connected(&mut self) -> bool {
        self.link.connected()
    }

    /// Peeks one command byte; `Ok(None)` means no frame has started.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] on a hard I/O failure.
    pub fn look(&mut self) -> std::io::Result<Option<u8>> {
        self.link.read_byte()
    }

    /// Reads the rest of a frame whose command byte was already consumed.
    ///
    /// # Errors
    ///
    /// * [`ErrorKind::TimedOut`] if the payload could not be completed
    ///   within the retry budget — "no message yet", not fatal.
    /// * [`ErrorKind::InvalidData`] for an unknown command id or a declared
    ///   size beyond the buffer capacity; the offending bytes are consumed
    ///   so the stream stays in sync.
    /// * Any other [`Error`] on a hard I/O failure.
    pub fn receive(&mut self, id: u8) -> std::io::Result<Frame> {
        let size = self.read_byte_retrying()? as usize;

        trace!("Got command {id:#04X}, expected size is {size}");

        if size > MAX_PAYLOAD_SIZE {
            self.discard(size)?;
            return Err(FrameError::PayloadTooLarge(size).into());
        }

        let mut payload = Payload::new();

        while payload.len() < size {
            let byte = self.read_byte_retrying()?;
            // Cannot overflow: size is bounded by MAX_PAYLOAD_SIZE.
            let _ = payload.push(byte);
        }

        let frame = Frame::parse(id, &payload)?;
        debug!("Received frame: {frame}");
        Ok(frame)
    }

    /// Encodes and writes one frame.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] on a hard I/O failure.
    pub fn send(&mut self, frame: &Frame) -> std::io::Result<()> {
        debug!("Writing frame: {frame}");
        self.link.write_all(&frame.encode())?;
        self.link.flush()
    }

    /// Reads and discards every pending frame.
    ///
    /// Used to drop stale input after (re)opening the device.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] on a hard I/O failure.
    pub fn flush_input(&mut self) -> std::io::Result<()> {
        while let Some(id) = self.look()? {
            match self.receive(id) {
                Ok(frame) => trace!("Flushing stale frame: {frame}"),
                Err(error) if error.kind() == ErrorKind::TimedOut => break,
                Err(error) if error.kind() == ErrorKind::InvalidData => {
                    trace!("Flushing malformed frame: {error}");
                }
                Err(error) => return Err(error),
            }
        }

        Ok(())
    }

    fn read_byte_retrying(&mut self) -> std::io::Result<u8> {
        for _ in 0..RETRY_BUDGET {
            if let Some(byte) = self.link.read_byte()? {
                return Ok(byte);
            }

            sleep(RETRY_PAUSE);
        }

        Err(Error::new(
            ErrorKind::TimedOut,
            "frame incomplete within retry budget",
        ))
    }

    fn discard(&mut self, amount: usize) -> std::io::Result<()> {
        for _ in 0..amount {
            self.read_byte_retrying()?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::ErrorKind;

    use super::Transport;
    use crate::command::Command;
    use crate::frame::Frame;
    use crate::link::Link;

    /// In-memory link feeding scripted input and capturing output.
    #[derive(Debug, Default)]
    struct PipeLink {
        rx: VecDeque<u8>,
        tx: Vec<u8>,
    }

    impl Link for PipeLink {
        fn read_byte(&mut self) -> std::io::Result<Option<u8>> {
            Ok(self.rx.pop_front())
        }

        fn write_all(&mut self, bytes: &[u8]) -> std::io::Result<()> {
            self.tx.extend_from_slice(bytes);
            Ok(())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }

        fn connected(&mut self) -> bool {
            true
        }
    }

    #[test]
    fn test_send() {
        let mut transport = Transport::new(PipeLink::default());
        let frame = Frame::new(Command::GhostCarValue, &[200, 30]).unwrap();

        transport.send(&frame).unwrap();
        assert_eq!(transport.into_inner().tx, vec![0x09, 0x02, 200, 30]);
    }

    #[test]
    fn test_two_phase_receive() {
        let mut link = PipeLink::default();
        link.rx
            .extend([0x0F, 0x08, 0xDC, 0x05, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00]);
        let mut transport = Transport::new(link);

        let id = transport.look().unwrap().unwrap();
        assert_eq!(id, 0x0F);

        let frame = transport.receive(id).unwrap();
        assert_eq!(frame.command(), Command::DigitalIn);
        assert_eq!(
            frame.payload(),
            &[0xDC, 0x05, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_nothing_pending() {
        let mut transport = Transport::new(PipeLink::default());
        assert_eq!(transport.look().unwrap(), None);
    }

    #[test]
    fn test_unknown_command_is_invalid_data() {
        let mut link = PipeLink::default();
        link.rx.extend([0x02, 0xAA, 0xBB]);
        let mut transport = Transport::new(link);

        let error = transport.receive(0x0C).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_oversized_declaration_is_consumed() {
        let mut link = PipeLink::default();
        // Declared size 200 followed by that many junk bytes and a valid frame.
        link.rx.push_back(200);
        link.rx.extend(std::iter::repeat(0xEE).take(200));
        link.rx.extend([0x10, 0x02, 7, 9]);
        let mut transport = Transport::new(link);

        let error = transport.receive(0x0F).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidData);

        // The stream stays in sync: the next frame decodes cleanly.
        let id = transport.look().unwrap().unwrap();
        let frame = transport.receive(id).unwrap();
        assert_eq!(frame.command(), Command::AnalogIn);
        assert_eq!(frame.payload(), &[7, 9]);
    }

    #[test]
    fn test_flush_input() {
        let mut link = PipeLink::default();
        link.rx.extend([0x10, 0x02, 1, 2, 0x10, 0x02, 3, 4]);
        let mut transport = Transport::new(link);

        transport.flush_input().unwrap();
        assert_eq!(transport.look().unwrap(), None);
    }
}
