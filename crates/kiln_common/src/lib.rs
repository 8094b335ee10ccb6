//! Shared foundational types used across the kiln incremental builder.
//!
//! This crate provides content hashing, canonical source-unit identifiers,
//! container handles, and the text encodings source units are decoded with.

#![warn(missing_docs)]

pub mod encoding;
pub mod handle;
pub mod hash;
pub mod uri;

pub use encoding::{DecodeError, Encoding, ParseEncodingError};
pub use handle::ContainerHandle;
pub use hash::{ContentHash, ContentHasher};
pub use uri::SourceUri;
