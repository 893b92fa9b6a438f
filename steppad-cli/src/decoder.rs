//! Line framing and validation for bytes coming off the serial link.

use steppad_proto::{decode_line, TileVector};

/// Accumulates raw link bytes and yields validated tile vectors.
///
/// Anything that is not a complete, well-formed `STATE:` line — encoding
/// noise, unknown prefixes, wrong field counts — is discarded silently and
/// decoding resumes on the next line. Content never produces an error;
/// only link-level I/O failure is fatal, and that lives with the caller.
/// Cap on bytes buffered without a terminator in sight. A noise-jammed or
/// mis-bauded link streaming terminator-free bytes must not grow memory
/// without bound; the oldest bytes are shed first, and whatever partial
/// line they belonged to would have been discarded as malformed anyway.
const MAX_BUFFERED: usize = 4096;

pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Feed raw bytes read off the link.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        if self.buf.len() > MAX_BUFFERED {
            let excess = self.buf.len() - MAX_BUFFERED;
            self.buf.drain(..excess);
        }
    }

    /// Pop the next validated vector, if a complete line holding one has
    /// arrived. Skips over any malformed lines in between.
    pub fn next_vector(&mut self) -> Option<TileVector> {
        while let Some(nl) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=nl).collect();

            // Invalid encoding: drop the chunk, keep the loop alive
            let Ok(text) = std::str::from_utf8(&line) else {
                continue;
            };
            if let Some(vector) = decode_line(text) {
                return Some(vector);
            }
        }
        None
    }
}
