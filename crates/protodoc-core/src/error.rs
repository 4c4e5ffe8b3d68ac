//! Error types for the protodoc-core library.
//!
//! Only descriptor decoding can fail. Building the model from decoded
//! descriptors is infallible: lookups that miss degrade to empty values.

use thiserror::Error;

/// Result type alias for protodoc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for descriptor input handling
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to decode a descriptor set, plugin request or file descriptor
    #[error("failed to decode descriptor input: {0}")]
    DescriptorParse(#[from] prost::DecodeError),

    /// A requested documentation target is not part of the descriptor input
    #[error("file '{name}' is not present in the descriptor input")]
    UnknownTarget {
        /// Name of the missing file
        name: String,
    },

    /// Unsupported proto syntax version
    #[error("unsupported proto syntax: '{syntax}'")]
    UnsupportedSyntax {
        /// The unsupported syntax string
        syntax: String,
    },
}

impl Error {
    /// Creates a new unknown target error
    pub fn unknown_target(name: impl Into<String>) -> Self {
        Self::UnknownTarget { name: name.into() }
    }

    /// Returns true if the error was caused by malformed input bytes
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::DescriptorParse(_))
    }
}
