//! Newline-delimited JSON framing.
//!
//! The stream endpoint writes every event as one compact JSON object followed
//! by `\n`. Compact `serde_json` output never contains a raw newline, so the
//! newline is an unambiguous frame boundary.
//!
//! Transports are free to split or merge frames arbitrarily; [`LineDecoder`]
//! buffers partial input until a full line is available.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Serialize, de::DeserializeOwned};

pub type Result<T> = core::result::Result<T, CodecError>;

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    /// A complete frame was not valid JSON for the requested type.
    #[error("Malformed frame: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encodes `value` as a single newline-terminated frame.
pub fn encode_line<T: Serialize>(value: &T) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(128).writer();
    serde_json::to_writer(&mut buf, value)?;
    let mut buf = buf.into_inner();
    buf.put_u8(b'\n');
    Ok(buf.freeze())
}

/// Incremental decoder for newline-delimited JSON.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: BytesMut,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends raw bytes received from the transport.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Number of buffered bytes that do not yet form a complete frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Decodes the next complete frame, if one is buffered.
    ///
    /// Blank lines are skipped.
    pub fn next_frame<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line = self.buf.split_to(pos + 1);
            let line = line[..pos].trim_ascii();
            if line.is_empty() {
                continue;
            }
            return Ok(Some(serde_json::from_slice(line)?));
        }
        Ok(None)
    }

    /// Decodes whatever is left once the transport has ended.
    ///
    /// A final frame without a trailing newline is accepted.
    pub fn finish<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        if let Some(frame) = self.next_frame()? {
            return Ok(Some(frame));
        }
        let rest = self.buf.split();
        let line = rest.trim_ascii();
        if line.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(line)?))
    }
}
