//! Incremental UTF-8 decoding of a chunked byte stream.

use std::char::REPLACEMENT_CHARACTER;

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Streaming UTF-8 decoder.
///
/// Chunk boundaries are transport-determined and can split a multi-byte
/// sequence; the incomplete tail is held back until the next chunk
/// completes it. Invalid sequences decode to U+FFFD. A byte order mark
/// at the very start of the stream is dropped.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    pending: Vec<u8>,
    started: bool,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes as much of `chunk` (plus any held-back bytes) as possible.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        let mut start = 0;
        loop {
            let rest = &self.pending[start..];
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    start = self.pending.len();
                    break;
                }
                Err(err) => {
                    let valid_len = err.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&rest[..valid_len]));
                    if let Some(bad_len) = err.error_len() {
                        out.push(REPLACEMENT_CHARACTER);
                        start += valid_len + bad_len;
                    } else {
                        // Incomplete sequence at the end: wait for more bytes.
                        start += valid_len;
                        break;
                    }
                }
            }
        }

        self.pending.drain(..start);
        if !self.started && !out.is_empty() {
            self.started = true;
            if out.starts_with(BYTE_ORDER_MARK) {
                out.drain(..BYTE_ORDER_MARK.len_utf8());
            }
        }
        out
    }

    /// Flushes held-back bytes at end of stream.
    ///
    /// A truncated sequence can never complete, so it becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        self.pending.clear();
        REPLACEMENT_CHARACTER.to_string()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"data:hello\n"), "data:hello\n");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_split_multibyte_char_is_reassembled() {
        let bytes = "héllo ✓".as_bytes();
        // 'é' is two bytes starting at index 1; split inside it.
        let (first, second) = bytes.split_at(2);

        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(first), "h");
        assert!(decoder.has_pending());
        assert_eq!(decoder.decode(second), "éllo ✓");
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_four_byte_char_split_byte_by_byte() {
        let bytes = "🦀".as_bytes();
        let mut decoder = Utf8StreamDecoder::new();
        let mut out = String::new();
        for byte in bytes {
            out.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        assert_eq!(out, "🦀");
    }

    #[test]
    fn test_invalid_byte_becomes_replacement() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn test_finish_replaces_truncated_tail() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(&"✓".as_bytes()[..2]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_leading_bom_is_dropped() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"\xef\xbb\xbfdata:x\n"), "data:x\n");
    }

    #[test]
    fn test_bom_split_across_chunks_is_dropped() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"\xef\xbb"), "");
        assert_eq!(decoder.decode(b"\xbfdata:x\n"), "data:x\n");
    }

    #[test]
    fn test_bom_after_first_text_is_kept() {
        let mut decoder = Utf8StreamDecoder::new();
        assert_eq!(decoder.decode(b"a"), "a");
        assert_eq!(decoder.decode("\u{FEFF}b".as_bytes()), "\u{FEFF}b");
    }
}
