//! The capability interface over the physical connection to the board.

use std::io::{self, Read, Write};
use std::time::Duration;

use log::{debug, info, warn};
use serialport::SerialPort;

/// Line speed of the controller board.
pub const BAUD_RATE: u32 = 57_600;

/// Read timeout standing in for non-blocking reads on the serial handle.
const READ_TIMEOUT: Duration = Duration::from_millis(5);

#[cfg(unix)]
use serialport::TTYPort as SerialPortImpl;

#[cfg(windows)]
use serialport::COMPort as SerialPortImpl;

/// One half-duplex byte link to exactly one board.
///
/// Implemented by [`SerialLink`] for real hardware and by
/// [`SimulatedBoard`](crate::board::SimulatedBoard) for tests.
pub trait Link: Send {
    /// Reads one byte; `Ok(None)` means nothing is pending.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] on a hard I/O failure.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Writes all bytes of one encoded frame.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] on a hard I/O failure.
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Flushes buffered output.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] on a hard I/O failure.
    fn flush(&mut self) -> io::Result<()>;

    /// Probes whether the peer is physically present.
    ///
    /// Distinct from "handle is open": a USB-serial bridge can keep a stale
    /// handle alive after the cable is pulled, so successful prior reads do
    /// not imply a live link.
    fn connected(&mut self) -> bool;
}

/// The serial line to the controller board.
#[derive(Debug)]
pub struct SerialLink {
    port: SerialPortImpl,
}

impl SerialLink {
    /// Opens the device with the board's fixed line discipline:
    /// 57600 baud, 8 data bits, no parity, 1 stop bit, no flow control.
    ///
    /// # Errors
    ///
    /// Returns a [`serialport::Error`] if the device cannot be opened or
    /// configured.
    pub fn open(path: &str) -> serialport::Result<Self> {
        info!("Trying to open io device '{path}'");

        let port = serialport::new(path, BAUD_RATE)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open_native()?;

        info!("Serial port '{path}' opened");
        Ok(Self { port })
    }
}

impl Link for SerialLink {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0; 1];

        match self.port.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(error)
                if error.kind() == io::ErrorKind::TimedOut
                    || error.kind() == io::ErrorKind::WouldBlock =>
            {
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }

    fn connected(&mut self) -> bool {
        // The USB bridge raises carrier detect once the cable is gone; a
        // failing ioctl also counts as "not connected".
        match self.port.read_carrier_detect() {
            Ok(carrier_detect) => !carrier_detect,
            Err(error) => {
                warn!("Carrier detect probe failed: {error}");
                debug!("Treating '{}' as disconnected", self.port.name().unwrap_or_default());
                false
            }
        }
    }
}
