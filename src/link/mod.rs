//! Wire format shared by the host encoder and the device validator.
//!
//! A message is five ASCII digits, one per finger in the order thumb, index, middle,
//! ring, pinky, followed by `\n`. `1` means open (LED on).

use crate::hand::FingerState;

pub const MESSAGE_LEN: usize = 5;
pub const TERMINATOR: u8 = b'\n';
pub const BAUD_RATE: u32 = 115200;

/// First line the LED controller prints once it accepts data
pub const READY_BANNER: &str = "ESP32 LED Control Ready";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid message length. Expected 5, got {len}")]
    InvalidLength { len: usize },

    #[error("Invalid character '{}' at position {position}", shown(.value))]
    InvalidCharacter { position: usize, value: u8 },
}

/// Printable ASCII as is, anything else escaped (`\xff`)
fn shown(byte: &u8) -> std::ascii::EscapeDefault {
    std::ascii::escape_default(*byte)
}

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Five-digit body of a message, terminator excluded
pub fn encode(state: &FingerState) -> String {
    state.to_array().iter().map(|open| if *open { '1' } else { '0' }).collect()
}

/// Full line as written to the link
pub fn encode_line(state: &FingerState) -> String {
    let mut line = encode(state);
    line.push(TERMINATOR as char);
    line
}

/// Validate a received line (terminator already stripped).
///
/// Works on raw bytes: lengths and positions are byte counts. The whole line is
/// checked before anything is returned, so a rejected line never yields a partial
/// state.
pub fn decode(line: &[u8]) -> Result<FingerState> {
    let len = line.len();
    if len != MESSAGE_LEN {
        return Err(ValidationError::InvalidLength { len });
    }

    let mut bits = [false; MESSAGE_LEN];
    for (position, &value) in line.iter().enumerate() {
        bits[position] = match value {
            b'1' => true,
            b'0' => false,
            _ => return Err(ValidationError::InvalidCharacter { position, value }),
        };
    }
    Ok(FingerState::from_array(bits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_order() {
        let state = FingerState::from_array([true, true, false, true, false]);
        assert_eq!(encode(&state), "11010");
        assert_eq!(encode_line(&state), "11010\n");
        assert_eq!(encode(&FingerState::ALL_CLOSED), "00000");
    }

    #[test]
    fn test_decode_rejects_length() {
        assert_eq!(decode(b""), Err(ValidationError::InvalidLength { len: 0 }));
        assert_eq!(decode(b"1111"), Err(ValidationError::InvalidLength { len: 4 }));
        assert_eq!(decode(b"111111"), Err(ValidationError::InvalidLength { len: 6 }));
    }

    #[test]
    fn test_decode_reports_first_bad_character() {
        assert_eq!(
            decode(b"10a1b"),
            Err(ValidationError::InvalidCharacter { position: 2, value: b'a' })
        );
        assert_eq!(
            decode(b" 1111"),
            Err(ValidationError::InvalidCharacter { position: 0, value: b' ' })
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::InvalidLength { len: 3 }.to_string(),
            "Invalid message length. Expected 5, got 3"
        );
        assert_eq!(
            ValidationError::InvalidCharacter { position: 4, value: b'2' }.to_string(),
            "Invalid character '2' at position 4"
        );
        assert_eq!(
            ValidationError::InvalidCharacter { position: 1, value: 0xFF }.to_string(),
            "Invalid character '\\xff' at position 1"
        );
    }

    #[test]
    fn test_decode_counts_bytes_not_chars() {
        assert_eq!(decode("1111\u{e9}".as_bytes()), Err(ValidationError::InvalidLength { len: 6 }));
        assert_eq!(
            decode("11\u{20ac}".as_bytes()),
            Err(ValidationError::InvalidCharacter { position: 2, value: 0xE2 })
        );
        assert_eq!(
            decode(b"1111\xFF"),
            Err(ValidationError::InvalidCharacter { position: 4, value: 0xFF })
        );
    }
}
