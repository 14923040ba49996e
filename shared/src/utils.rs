use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("String payload truncated: need {needed} bytes, have {have}")]
    Truncated { needed: usize, have: usize },

    #[error("String payload is not valid UTF-8")]
    InvalidUtf8,
}

const LENGTH_BYTES: usize = 4;

/// Encodes a string as `[length: u32 BE][UTF-8 bytes]`
pub fn encode_string(value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let mut output = Vec::with_capacity(LENGTH_BYTES + bytes.len());
    output.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    output.extend_from_slice(bytes);
    output
}

/// Reads a string written by [`encode_string`]. Trailing bytes are ignored.
pub fn decode_string(content: &[u8]) -> Result<String, CodecError> {
    let Some((length, rest)) = content.split_first_chunk::<LENGTH_BYTES>() else {
        return Err(CodecError::Truncated {
            needed: LENGTH_BYTES,
            have: content.len(),
        });
    };
    let length = u32::from_be_bytes(*length) as usize;

    let Some(bytes) = rest.get(..length) else {
        return Err(CodecError::Truncated {
            needed: LENGTH_BYTES + length,
            have: content.len(),
        });
    };

    String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidUtf8)
}
