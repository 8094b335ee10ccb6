//! Length-prefixed binary framing shared by trace sidecars and debug-info trailers.
//!
//! A frame is a 4-byte little-endian header length, a `bincode`-encoded
//! [`FrameHeader`], and the `bincode`-encoded payload the header checksums.

use kiln_common::ContentHash;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::TraceError;

/// Current frame format version. Increment on breaking payload changes.
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FrameHeader {
    magic: [u8; 4],
    format_version: u32,
    checksum: ContentHash,
}

fn serialization(e: impl std::fmt::Display) -> TraceError {
    TraceError::Serialization {
        reason: e.to_string(),
    }
}

/// Encodes `value` into a frame tagged with `magic`.
pub(crate) fn encode_framed<T: Serialize>(magic: [u8; 4], value: &T) -> Result<Vec<u8>, TraceError> {
    let payload =
        bincode::serde::encode_to_vec(value, bincode::config::standard()).map_err(serialization)?;
    let header = FrameHeader {
        magic,
        format_version: FORMAT_VERSION,
        checksum: ContentHash::from_bytes(&payload),
    };
    let header_bytes =
        bincode::serde::encode_to_vec(&header, bincode::config::standard()).map_err(serialization)?;

    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);
    Ok(output)
}

/// Decodes a frame produced by [`encode_framed`] with the same `magic`.
pub(crate) fn decode_framed<T: DeserializeOwned>(magic: [u8; 4], raw: &[u8]) -> Result<T, TraceError> {
    let invalid = |reason: &str| TraceError::InvalidHeader {
        reason: reason.to_string(),
    };

    let len_bytes: [u8; 4] = raw
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| invalid("truncated header length"))?;
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    let header_bytes = raw
        .get(4..4 + header_len)
        .ok_or_else(|| invalid("truncated header"))?;

    let (header, _): (FrameHeader, usize) =
        bincode::serde::decode_from_slice(header_bytes, bincode::config::standard())
            .map_err(|e| invalid(&e.to_string()))?;

    if header.magic != magic {
        return Err(invalid("magic bytes do not match"));
    }
    if header.format_version != FORMAT_VERSION {
        return Err(TraceError::VersionMismatch {
            expected: FORMAT_VERSION,
            actual: header.format_version,
        });
    }

    let payload = &raw[4 + header_len..];
    let actual = ContentHash::from_bytes(payload);
    if actual != header.checksum {
        return Err(TraceError::ChecksumMismatch {
            expected: header.checksum.to_string(),
            actual: actual.to_string(),
        });
    }

    let (value, _) = bincode::serde::decode_from_slice(payload, bincode::config::standard())
        .map_err(serialization)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAGIC: [u8; 4] = *b"TEST";

    #[test]
    fn frame_carries_value() {
        let value = (String::from("A.lang"), vec![1u32, 2, 3]);
        let bytes = encode_framed(MAGIC, &value).unwrap();
        let back: (String, Vec<u32>) = decode_framed(MAGIC, &bytes).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let bytes = encode_framed(MAGIC, &42u32).unwrap();
        let err = decode_framed::<u32>(*b"NOPE", &bytes).unwrap_err();
        assert!(matches!(err, TraceError::InvalidHeader { .. }));
    }

    #[test]
    fn truncated_input_is_rejected() {
        let err = decode_framed::<u32>(MAGIC, b"AB").unwrap_err();
        assert!(matches!(err, TraceError::InvalidHeader { .. }));

        let bytes = encode_framed(MAGIC, &42u32).unwrap();
        let err = decode_framed::<u32>(MAGIC, &bytes[..6]).unwrap_err();
        assert!(matches!(err, TraceError::InvalidHeader { .. }));
    }

    #[test]
    fn tampered_payload_fails_checksum() {
        let mut bytes = encode_framed(MAGIC, &String::from("payload")).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let err = decode_framed::<String>(MAGIC, &bytes).unwrap_err();
        assert!(matches!(err, TraceError::ChecksumMismatch { .. }));
    }

    #[test]
    fn future_version_is_rejected() {
        let payload = bincode::serde::encode_to_vec(7u32, bincode::config::standard()).unwrap();
        let header = FrameHeader {
            magic: MAGIC,
            format_version: 999,
            checksum: ContentHash::from_bytes(&payload),
        };
        let header_bytes =
            bincode::serde::encode_to_vec(&header, bincode::config::standard()).unwrap();
        let mut raw = Vec::new();
        raw.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
        raw.extend_from_slice(&header_bytes);
        raw.extend_from_slice(&payload);

        let err = decode_framed::<u32>(MAGIC, &raw).unwrap_err();
        assert!(matches!(
            err,
            TraceError::VersionMismatch {
                expected: 1,
                actual: 999
            }
        ));
    }
}
