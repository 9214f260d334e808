//! Line-based codec for tokio.
//!
//! Reads newline-terminated lines (lenient about bare `\n`) and writes
//! fully formed wire lines, with optional character-encoding support.

#[cfg(feature = "encoding")]
use std::borrow::Cow;

use bytes::BytesMut;
#[cfg(feature = "encoding")]
use encoding::Encoding;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::error::{self, ProtocolError};
use crate::util::{truncate_to_fit, MAX_INBOUND_LINE_LEN, MAX_OUTBOUND_LINE_LEN};

/// Line codec with the IRC length discipline: strict 512 bytes on
/// send, lenient on receive.
pub struct LineCodec {
    #[cfg(feature = "encoding")]
    encoding: &'static Encoding,
    /// Index of the next byte to check for a newline.
    next_index: usize,
    /// Receive-side length cap.
    max_len: usize,
}

impl LineCodec {
    /// Create a codec with the specified encoding label (e.g. "utf-8").
    ///
    /// Without the `encoding` feature the label is ignored and the
    /// codec is UTF-8 with lossy decode on receive.
    pub fn new(_label: &str) -> error::Result<LineCodec> {
        Ok(LineCodec {
            #[cfg(feature = "encoding")]
            encoding: Encoding::for_label(_label.as_bytes())
                .ok_or_else(|| ProtocolError::UnknownEncoding(_label.to_string()))?,
            next_index: 0,
            max_len: MAX_INBOUND_LINE_LEN,
        })
    }

    /// Create a codec with a custom receive-side length cap.
    pub fn with_max_len(label: &str, max_len: usize) -> error::Result<LineCodec> {
        let mut codec = LineCodec::new(label)?;
        codec.max_len = max_len;
        Ok(codec)
    }

    fn decode_bytes(&self, line: &[u8]) -> String {
        #[cfg(feature = "encoding")]
        {
            let (cow, _, _) = self.encoding.decode(line);
            cow.into_owned()
        }

        #[cfg(not(feature = "encoding"))]
        {
            String::from_utf8_lossy(line).into_owned()
        }
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let mut line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(ProtocolError::MessageTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            while matches!(line.last(), Some(b'\r') | Some(b'\n')) {
                line.truncate(line.len() - 1);
            }

            let data = self.decode_bytes(&line);

            // A NUL would truncate downstream consumers; drop the line
            // rather than kill the connection.
            if data.contains('\0') {
                warn!("discarding line containing NUL");
                return Ok(Some(String::new()));
            }

            Ok(Some(data))
        } else {
            self.next_index = src.len();

            if src.len() > self.max_len {
                return Err(ProtocolError::MessageTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, msg: String, dst: &mut BytesMut) -> error::Result<()> {
        // Enforce the send limit, preserving the terminator.
        let msg = if msg.len() > MAX_OUTBOUND_LINE_LEN {
            warn!(length = msg.len(), "truncating oversized outbound line");
            let mut truncated =
                truncate_to_fit(&msg, MAX_OUTBOUND_LINE_LEN - 2).to_string();
            truncated.push_str("\r\n");
            truncated
        } else {
            msg
        };

        #[cfg(feature = "encoding")]
        {
            let (cow, _, _) = self.encoding.encode(&msg);
            match cow {
                Cow::Borrowed(bytes) => dst.extend_from_slice(bytes),
                Cow::Owned(bytes) => dst.extend_from_slice(&bytes),
            }
        }

        #[cfg(not(feature = "encoding"))]
        {
            dst.extend_from_slice(msg.as_bytes());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_complete_line() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::from("PING :test\r\nrest");

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some("PING :test".to_string()));
        assert_eq!(&buf[..], b"rest");
    }

    #[test]
    fn test_decode_bare_newline() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::from("PING :test\n");

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some("PING :test".to_string()));
    }

    #[test]
    fn test_decode_partial_line() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::from("PING :");

        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"token\r\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("PING :token".to_string())
        );
    }

    #[test]
    fn test_decode_too_long() {
        let mut codec = LineCodec::with_max_len("utf-8", 10).unwrap();
        let mut buf = BytesMut::from("this is way too long\n");

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::MessageTooLong { .. })));
    }

    #[test]
    fn test_decode_empty_line() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::from("\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(String::new()));
    }

    #[test]
    fn test_decode_drops_nul_line() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::from("PRIVMSG #c :a\0b\r\nPING :x\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some(String::new()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :x".to_string()));
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::from(&b"PING :a\xffb\r\n"[..]);
        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert!(line.starts_with("PING :a"));
    }

    #[test]
    fn test_encode() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::new();

        codec.encode("PONG :test\r\n".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"PONG :test\r\n");
    }

    #[test]
    fn test_encode_truncates_oversized_line() {
        let mut codec = LineCodec::new("utf-8").unwrap();
        let mut buf = BytesMut::new();

        let long = format!("PRIVMSG #c :{}\r\n", "x".repeat(600));
        codec.encode(long, &mut buf).unwrap();
        assert_eq!(buf.len(), MAX_OUTBOUND_LINE_LEN);
        assert!(buf.ends_with(b"\r\n"));
    }
}
