// src/gps/framer.rs
//! Splits a raw byte stream into NMEA sentence lines

/// Longest line kept before the buffer is thrown away
pub const MAX_SENTENCE_LEN: usize = 200;

/// Incremental line framer.
///
/// Bytes are accumulated until a `\n` or `\r` arrives. Lines that are not
/// valid UTF-8, empty after trimming, or longer than [`MAX_SENTENCE_LEN`] are
/// dropped without any error being reported.
#[derive(Debug, Default)]
pub struct SentenceFramer {
    buffer: Vec<u8>,
}

impl SentenceFramer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_SENTENCE_LEN + 1),
        }
    }

    /// Feed a single byte, returning a sentence when a line terminator
    /// completes one.
    pub fn feed(&mut self, byte: u8) -> Option<String> {
        if byte == b'\n' || byte == b'\r' {
            let line = match std::str::from_utf8(&self.buffer) {
                Ok(text) => {
                    let text = text.trim();
                    (!text.is_empty()).then(|| text.to_string())
                }
                Err(_) => {
                    log::trace!("dropping {} undecodable bytes", self.buffer.len());
                    None
                }
            };
            self.buffer.clear();
            return line;
        }

        self.buffer.push(byte);
        if self.buffer.len() > MAX_SENTENCE_LEN {
            log::trace!("line exceeded {} bytes, discarding", MAX_SENTENCE_LEN);
            self.buffer.clear();
        }
        None
    }

    /// Feed a chunk as read from the transport
    pub fn feed_slice(&mut self, bytes: &[u8]) -> Vec<String> {
        bytes.iter().filter_map(|&b| self.feed(b)).collect()
    }

    /// Number of bytes waiting for a terminator
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emits_trimmed_line() {
        let mut framer = SentenceFramer::new();
        let lines = framer.feed_slice(b"  $GPRMC,1,A  \r\n");
        assert_eq!(lines, vec!["$GPRMC,1,A".to_string()]);
        assert_eq!(framer.pending(), 0);
    }

    #[test]
    fn test_partial_line_across_chunks() {
        let mut framer = SentenceFramer::new();
        assert!(framer.feed_slice(b"$GNRMC,12").is_empty());
        assert_eq!(framer.feed_slice(b"3,A\n"), vec!["$GNRMC,123,A".to_string()]);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let mut framer = SentenceFramer::new();
        assert!(framer.feed_slice(b"\r\n\r\n   \n").is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_discarded() {
        let mut framer = SentenceFramer::new();
        let lines = framer.feed_slice(b"\xff\xfe$GP\n$GPRMC\n");
        assert_eq!(lines, vec!["$GPRMC".to_string()]);
    }

    #[test]
    fn test_oversized_line_is_discarded() {
        let mut framer = SentenceFramer::new();
        let noise = vec![b'x'; MAX_SENTENCE_LEN + 1];
        assert!(framer.feed_slice(&noise).is_empty());
        assert_eq!(framer.pending(), 0);

        // framing restarts from empty after the overflow
        let lines = framer.feed_slice(b"ok\n");
        assert_eq!(lines, vec!["ok".to_string()]);
    }

    #[test]
    fn test_line_at_limit_is_kept() {
        let mut framer = SentenceFramer::new();
        let mut line = vec![b'a'; MAX_SENTENCE_LEN];
        line.push(b'\n');
        let lines = framer.feed_slice(&line);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), MAX_SENTENCE_LEN);
    }
}
