//! Line codec for newline-delimited text framing
//!
//! Framing is asymmetric on purpose: outbound lines are terminated with
//! CRLF, inbound lines are split on a single line feed with an optional
//! preceding carriage return. Delimiters are stripped from decoded lines
//! before they reach callers.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Maximum line length accepted in either direction (8 KB)
pub const DEFAULT_MAX_LINE_LEN: usize = 8 * 1024;

/// Terminator appended to every outbound line
pub const LINE_TERMINATOR: &str = "\r\n";

/// Line codec error
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line too long: {len} bytes (max {max})")]
    LineTooLong { len: usize, max: usize },

    #[error("Line is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Codec decoding LF-delimited lines and encoding CRLF-terminated lines
#[derive(Debug)]
pub struct LineCodec {
    max_line_len: usize,
    /// Buffer offset already scanned for a line feed, so fragmented reads
    /// are not rescanned from the start
    next_index: usize,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::with_max_line_len(DEFAULT_MAX_LINE_LEN)
    }

    /// Create a codec with a custom line length bound
    pub fn with_max_line_len(max_line_len: usize) -> Self {
        Self {
            max_line_len,
            next_index: 0,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match src[self.next_index..].iter().position(|b| *b == b'\n') {
            Some(pos) => {
                let end = self.next_index + pos;
                if end > self.max_line_len {
                    return Err(CodecError::LineTooLong {
                        len: end,
                        max: self.max_line_len,
                    });
                }

                // Consume the line and its delimiter
                let mut line = src.split_to(end + 1);
                self.next_index = 0;

                // Strip '\n' and an optional preceding '\r'
                line.truncate(line.len() - 1);
                if line.last() == Some(&b'\r') {
                    line.truncate(line.len() - 1);
                }

                let line = std::str::from_utf8(&line)?.to_string();
                Ok(Some(line))
            }
            None => {
                if src.len() > self.max_line_len {
                    return Err(CodecError::LineTooLong {
                        len: src.len(),
                        max: self.max_line_len,
                    });
                }
                self.next_index = src.len();
                Ok(None)
            }
        }
    }
}

impl<T: AsRef<str>> Encoder<T> for LineCodec {
    type Error = CodecError;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let line = item.as_ref();
        if line.len() > self.max_line_len {
            return Err(CodecError::LineTooLong {
                len: line.len(),
                max: self.max_line_len,
            });
        }

        dst.reserve(line.len() + LINE_TERMINATOR.len());
        dst.put_slice(line.as_bytes());
        dst.put_slice(LINE_TERMINATOR.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_appends_crlf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        codec.encode("PING", &mut buf).unwrap();

        assert_eq!(&buf[..], b"PING\r\n");
    }

    #[test]
    fn test_roundtrip() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        codec.encode("NICK observer", &mut buf).unwrap();

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, "NICK observer");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_strips_bare_lf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("hello\n");

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, "hello");
    }

    #[test]
    fn test_decode_strips_crlf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("hello\r\n");

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, "hello");
    }

    #[test]
    fn test_decode_empty_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("\n");

        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, "");
    }

    #[test]
    fn test_partial_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("hel");

        // No delimiter yet
        assert!(codec.decode(&mut buf).unwrap().is_none());

        // Rest of the line arrives
        buf.extend_from_slice(b"lo\n");
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, "hello");
    }

    #[test]
    fn test_multiple_lines_in_buffer() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("one\ntwo\r\nthree\n");

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "one");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "two");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "three");

        // Buffer should be empty now
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_line_too_long_on_decode() {
        let mut codec = LineCodec::with_max_line_len(8);
        let mut buf = BytesMut::from(&b"0123456789"[..]);

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(CodecError::LineTooLong { .. })));
    }

    #[test]
    fn test_line_too_long_on_encode() {
        let mut codec = LineCodec::with_max_line_len(4);
        let mut buf = BytesMut::new();

        let result = codec.encode("too long for this codec", &mut buf);
        assert!(matches!(result, Err(CodecError::LineTooLong { .. })));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_invalid_utf8() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"\xff\xfe\n"[..]);

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(CodecError::Utf8(_))));
    }

    #[test]
    fn test_decode_eof_with_trailing_partial() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("no terminator");

        // A partial line at EOF is an error, never a dispatched line
        let result = codec.decode_eof(&mut buf);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_eof_clean() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        assert!(codec.decode_eof(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_fragmented_delivery_keeps_scan_offset() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        for byte in b"abc" {
            buf.extend_from_slice(&[*byte]);
            assert!(codec.decode(&mut buf).unwrap().is_none());
        }

        buf.extend_from_slice(b"\ndef\n");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "abc");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "def");
    }
}
