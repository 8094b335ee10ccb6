//! Text encodings used to decode source units before parsing.

use std::fmt;
use std::str::FromStr;

/// A character encoding a source unit can be decoded with.
///
/// The session configures one default encoding; a unit that starts with a
/// byte-order mark overrides it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Encoding {
    /// UTF-8.
    Utf8,
    /// UTF-16, little endian.
    Utf16Le,
    /// UTF-16, big endian.
    Utf16Be,
    /// ISO-8859-1, every byte maps to the code point of the same value.
    Latin1,
}

impl Encoding {
    /// Returns the canonical name of this encoding.
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Latin1 => "ISO-8859-1",
        }
    }

    /// Detects a byte-order mark, returning the encoding it names and its length.
    pub fn detect_bom(bytes: &[u8]) -> Option<(Encoding, usize)> {
        match bytes {
            [0xEF, 0xBB, 0xBF, ..] => Some((Encoding::Utf8, 3)),
            [0xFF, 0xFE, ..] => Some((Encoding::Utf16Le, 2)),
            [0xFE, 0xFF, ..] => Some((Encoding::Utf16Be, 2)),
            _ => None,
        }
    }

    /// Decodes `bytes` with this encoding.
    pub fn decode(self, bytes: &[u8]) -> Result<String, DecodeError> {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| DecodeError {
                    encoding: self,
                    offset: e.valid_up_to(),
                }),
            Encoding::Utf16Le => decode_utf16(bytes, self, u16::from_le_bytes),
            Encoding::Utf16Be => decode_utf16(bytes, self, u16::from_be_bytes),
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    /// Decodes a whole source unit: a byte-order mark wins over `default`.
    ///
    /// Returns the text (without the mark) and the encoding actually used.
    pub fn decode_unit(bytes: &[u8], default: Encoding) -> Result<(String, Encoding), DecodeError> {
        match Self::detect_bom(bytes) {
            Some((encoding, len)) => Ok((encoding.decode(&bytes[len..])?, encoding)),
            None => Ok((default.decode(bytes)?, default)),
        }
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::Utf8
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = ParseEncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('_', "-").as_str() {
            "UTF-8" | "UTF8" => Ok(Encoding::Utf8),
            "UTF-16LE" => Ok(Encoding::Utf16Le),
            "UTF-16BE" => Ok(Encoding::Utf16Be),
            "ISO-8859-1" | "LATIN1" | "LATIN-1" => Ok(Encoding::Latin1),
            _ => Err(ParseEncodingError {
                input: s.to_string(),
            }),
        }
    }
}

fn decode_utf16(
    bytes: &[u8],
    encoding: Encoding,
    to_unit: fn([u8; 2]) -> u16,
) -> Result<String, DecodeError> {
    let err = |offset| DecodeError { encoding, offset };
    if bytes.len() % 2 != 0 {
        return Err(err(bytes.len() - 1));
    }
    let units = bytes.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
    let mut out = String::with_capacity(bytes.len() / 2);
    for (index, decoded) in char::decode_utf16(units).enumerate() {
        out.push(decoded.map_err(|_| err(index * 2))?);
    }
    Ok(out)
}

/// Error returned when bytes are not valid in the chosen encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("input is not valid {encoding} (first invalid byte at offset {offset})")]
pub struct DecodeError {
    /// The encoding decoding was attempted with.
    pub encoding: Encoding,
    /// Byte offset of the first invalid sequence.
    pub offset: usize,
}

/// Error returned for an unknown encoding name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown encoding '{input}'")]
pub struct ParseEncodingError {
    /// The name that failed to parse.
    pub input: String,
}
