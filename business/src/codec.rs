//! Base64 wire encoding for file contents.
//!
//! The catalog moves file bodies as standard, padded base64 text. Decoding
//! walks the text in fixed-size chunks into a buffer sized up front, so a
//! large payload never needs a second full-size intermediate copy.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Encoded characters decoded per step.
const CHUNK_SIZE: usize = 512;

/// Content type used when nothing better is known about a payload.
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Decoded bytes plus the content type they should be saved with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Error decoding base64 text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Invalid base64 symbol {byte:#04x} at offset {offset}")]
    InvalidSymbol { offset: usize, byte: u8 },

    #[error("Invalid base64 input: {0}")]
    Malformed(String),
}

/// Encodes `bytes` as standard padded base64.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decodes base64 `text` into a [`Blob`] tagged with `content_type`.
pub fn decode(text: &str, content_type: &str) -> Result<Blob, CodecError> {
    decode_chunked(text, content_type, CHUNK_SIZE)
}

/// Decodes to raw bytes.
pub fn decode_bytes(text: &str) -> Result<Vec<u8>, CodecError> {
    decode_chunked(text, DEFAULT_CONTENT_TYPE, CHUNK_SIZE).map(|blob| blob.bytes)
}

pub(crate) fn decode_chunked(
    text: &str,
    content_type: &str,
    chunk_size: usize,
) -> Result<Blob, CodecError> {
    let mut bytes = Vec::with_capacity(base64::decoded_len_estimate(text.len()));
    for chunk in decode_chunks(text, chunk_size) {
        bytes.extend_from_slice(&chunk?);
    }
    Ok(Blob::new(content_type, bytes))
}

/// Decodes `text` one chunk at a time, yielding the bytes of each chunk.
///
/// Chunk size is rounded down to whole 4-character groups. Padding is only
/// valid in the final chunk; anywhere else it is an invalid symbol. Offsets
/// in errors are relative to the whole input.
pub(crate) fn decode_chunks(
    text: &str,
    chunk_size: usize,
) -> impl Iterator<Item = Result<Vec<u8>, CodecError>> + '_ {
    let input = text.as_bytes();
    let step = (chunk_size / 4).max(1) * 4;
    input
        .chunks(step)
        .enumerate()
        .map(move |(index, chunk)| {
            let base = index * step;
            let is_last = base + chunk.len() == input.len();
            if !is_last {
                if let Some(pos) = chunk.iter().position(|&b| b == b'=') {
                    return Err(CodecError::InvalidSymbol {
                        offset: base + pos,
                        byte: b'=',
                    });
                }
            }
            STANDARD.decode(chunk).map_err(|e| match e {
                base64::DecodeError::InvalidByte(offset, byte)
                | base64::DecodeError::InvalidLastSymbol(offset, byte) => {
                    CodecError::InvalidSymbol {
                        offset: base + offset,
                        byte,
                    }
                }
                other => CodecError::Malformed(other.to_string()),
            })
        })
}

/// [`decode_chunks`] at the fixed internal chunk size.
pub(crate) fn decode_stream(text: &str) -> impl Iterator<Item = Result<Vec<u8>, CodecError>> + '_ {
    decode_chunks(text, CHUNK_SIZE)
}
