use std::borrow::Cow;
use std::fmt::{Display, Formatter};

use crate::error::FrameError;

const TEXT_SIZE: usize = 50;

/// A diagnostic message from the board firmware.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DebugValue {
    /// NUL-padded message text.
    pub text: [u8; TEXT_SIZE],
    /// An accompanying numeric value.
    pub value: u32,
}

impl DebugValue {
    /// Size of the payload on the wire.
    pub const SIZE: usize = TEXT_SIZE + 4;

    /// Creates a debug payload, truncating the message to 49 bytes.
    #[must_use]
    pub fn new(message: &str, value: u32) -> Self {
        let mut text = [0; TEXT_SIZE];
        let len = message.len().min(TEXT_SIZE - 1);
        text[..len].copy_from_slice(&message.as_bytes()[..len]);
        Self { text, value }
    }

    /// Returns the message text up to the first NUL byte.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        let end = self
            .text
            .iter()
            .position(|&byte| byte == 0)
            .unwrap_or(TEXT_SIZE);
        String::from_utf8_lossy(&self.text[..end])
    }

    /// Encodes the payload in wire order.
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];
        bytes[..TEXT_SIZE].copy_from_slice(&self.text);
        bytes[TEXT_SIZE..].copy_from_slice(&self.value.to_le_bytes());
        bytes
    }
}

impl Display for DebugValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] ({:#x})", self.text(), self.value)
    }
}

impl TryFrom<&[u8]> for DebugValue {
    type Error = FrameError;

    fn try_from(buffer: &[u8]) -> Result<Self, Self::Error> {
        if buffer.len() == Self::SIZE {
            let mut text = [0; TEXT_SIZE];
            text.copy_from_slice(&buffer[..TEXT_SIZE]);
            Ok(Self {
                text,
                value: u32::from_le_bytes([
                    buffer[TEXT_SIZE],
                    buffer[TEXT_SIZE + 1],
                    buffer[TEXT_SIZE + 2],
                    buffer[TEXT_SIZE + 3],
                ]),
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
    use super::DebugValue;

    #[test]
    fn test_round_trip() {
        let debug = DebugValue::new("memory exceeded!", 42);
        let decoded = DebugValue::try_from(&debug.to_bytes()[..]).unwrap();
        assert_eq!(decoded, debug);
        assert_eq!(decoded.text(), "memory exceeded!");
        assert_eq!(decoded.value, 42);
    }

    #[test]
    fn test_truncation() {
        let long = "x".repeat(80);
        let debug = DebugValue::new(&long, 0);
        assert_eq!(debug.text().len(), 49);
    }

    #[test]
    fn test_to_string() {
        assert_eq!(&DebugValue::new("boot", 16).to_string(), "[boot] (0x10)");
    }
}
