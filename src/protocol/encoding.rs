//! # Text Payload Encoding
//!
//! Converts Unicode text to the printer's single-byte code page
//! (Windows-1252, selected with `ESC t 16` after init).
//!
//! ASCII passes through unchanged. Characters outside the code page are
//! replaced with `?` and reported at `warn` level; a receipt with an odd
//! glyph still prints.

use tracing::warn;

/// Encode a Unicode string as Windows-1252 bytes.
///
/// ```
/// use posprint::protocol::encoding::encode;
///
/// assert_eq!(encode("Total"), b"Total".to_vec());
/// assert_eq!(encode("€5"), vec![0x80, b'5']);
/// ```
pub fn encode(s: &str) -> Vec<u8> {
    if s.is_ascii() {
        return s.as_bytes().to_vec();
    }

    let mut out = Vec::with_capacity(s.len());
    let mut buf = [0u8; 4];
    for ch in s.chars() {
        if ch.is_ascii() {
            out.push(ch as u8);
            continue;
        }
        let (bytes, _, had_errors) = encoding_rs::WINDOWS_1252.encode(ch.encode_utf8(&mut buf));
        if had_errors || bytes.len() != 1 {
            warn!(
                character = %ch,
                codepoint = format!("U+{:04X}", ch as u32),
                "unmapped character, replacing with '?'"
            );
            out.push(b'?');
        } else {
            out.push(bytes[0]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        assert_eq!(encode("Hello, World! 123"), b"Hello, World! 123".to_vec());
    }

    #[test]
    fn test_latin_currency_symbols() {
        assert_eq!(encode("£"), vec![0xA3]);
        assert_eq!(encode("¥"), vec![0xA5]);
        assert_eq!(encode("€"), vec![0x80]);
    }

    #[test]
    fn test_accented_letters() {
        assert_eq!(encode("Café"), vec![b'C', b'a', b'f', 0xE9]);
    }

    #[test]
    fn test_unmapped_becomes_question_mark() {
        assert_eq!(encode("₹10"), vec![b'?', b'1', b'0']);
        assert_eq!(encode("日"), vec![b'?']);
    }

    #[test]
    fn test_one_byte_per_char() {
        let s = "Zł 4,50 ₱ ñ";
        assert_eq!(encode(s).len(), s.chars().count());
    }
}
