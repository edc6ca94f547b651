//! Line framing.
//!
//! The transport hands us each line with its `\n` already removed. Telnet
//! clients end lines with `\r\n`, so a trailing `\r` may still be there.

use crate::ProtocolError;

/// Decodes one line of client input.
///
/// Strips a single trailing `\r` and validates UTF-8. Everything else
/// (leading/trailing spaces included) is preserved: a password may
/// legitimately contain them.
///
/// # Errors
/// Returns [`ProtocolError::InvalidUtf8`] with the offset of the first
/// invalid byte.
///
/// ```rust
/// use mudforge_protocol::decode_line;
///
/// assert_eq!(decode_line(b"Celidur\r").unwrap(), "Celidur");
/// assert!(decode_line(&[0x66, 0xff]).is_err());
/// ```
pub fn decode_line(raw: &[u8]) -> Result<String, ProtocolError> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    std::str::from_utf8(raw)
        .map(str::to_owned)
        .map_err(|e| ProtocolError::InvalidUtf8(e.valid_up_to()))
}
