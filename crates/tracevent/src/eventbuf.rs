//! The per-thread buffer events are formatted into.

use bytes::{BufMut, BytesMut};

/// A buffer for formatting trace events.
///
/// Each recording thread owns one. An event is fully formatted here before
/// any lock is taken, so the shared critical section is a single append of
/// already-finished bytes.
pub struct EventBuffer {
    scratch: [u8; 20],
    buf: BytesMut,
}

impl AsRef<[u8]> for EventBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl EventBuffer {
    pub fn with_capacity(size: usize) -> Self {
        EventBuffer {
            scratch: [0; 20],
            buf: BytesMut::with_capacity(size),
        }
    }

    /// Clears the buffer for the next event, keeping its capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Writes a single byte.
    #[inline]
    pub fn byte(&mut self, byte: u8) {
        self.buf.reserve(1);
        self.buf.put_u8(byte);
    }

    /// Writes a known number of bytes.
    #[inline]
    pub fn bytes<const N: usize>(&mut self, bytes: &[u8; N]) {
        self.buf.reserve(N);
        self.buf.put_slice(bytes);
    }

    /// Writes a JSON string literal, truncating the input to at most
    /// `max_chars` characters before escaping.
    ///
    /// Truncation is silent and defined behavior, not an error.
    pub fn json_str_truncated(&mut self, s: &str, max_chars: usize) {
        let s = match s.char_indices().nth(max_chars) {
            Some((idx, _)) => &s[..idx],
            None => s,
        };

        self.buf.reserve(2 + s.len());
        self.buf.put_u8(b'"');
        for &b in s.as_bytes() {
            match b {
                b'"' => self.buf.put_slice(b"\\\""),
                b'\\' => self.buf.put_slice(b"\\\\"),
                b'\n' => self.buf.put_slice(b"\\n"),
                b'\r' => self.buf.put_slice(b"\\r"),
                b'\t' => self.buf.put_slice(b"\\t"),
                // Remaining control characters must be \u-escaped for the
                // output to stay valid JSON.
                b if b < 0x20 => {
                    const HEX: &[u8; 16] = b"0123456789abcdef";
                    self.buf.put_slice(b"\\u00");
                    self.buf.put_u8(HEX[(b >> 4) as usize]);
                    self.buf.put_u8(HEX[(b & 0xf) as usize]);
                }
                b => self.buf.put_u8(b),
            }
        }
        self.buf.put_u8(b'"');
    }

    /// Writes an unsigned integer as decimal text.
    pub fn uint(&mut self, mut u: u64) {
        // 20 digits is the maximum length of a u64 in decimal.
        let mut i = self.scratch.len();
        loop {
            i -= 1;
            self.scratch[i] = b'0' + (u % 10) as u8;
            u /= 10;
            if u == 0 {
                break;
            }
        }
        self.buf.extend_from_slice(&self.scratch[i..]);
    }

    /// Writes a signed integer as decimal text.
    pub fn int(&mut self, i: i64) {
        if i < 0 {
            self.byte(b'-');
            self.uint(i.unsigned_abs());
        } else {
            self.uint(i as u64);
        }
    }
}
