// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for encoding, buffering and sink delivery.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the encoder, the point buffer and the batching writer.
#[derive(Debug, Error)]
pub enum Error {
    /// The point has an empty measurement name.
    #[error("no measurement name")]
    NoMeasurement,

    /// The point has no fields (InfluxDB requires at least one).
    #[error("no fields")]
    NoFields,

    /// A float field is NaN or infinite, which Line Protocol cannot represent.
    #[error("field '{field}' is not a finite float")]
    InvalidFloat { field: String },

    /// A tag key, tag value or field key is empty.
    #[error("empty {part}")]
    EmptyKey { part: &'static str },

    /// A measurement name, tag key, tag value or field key contains a line break.
    #[error("{part} contains a line break")]
    LineBreak { part: &'static str },

    /// A pre-encoded buffer was requested under a different protocol.
    #[error("mismatched protocol")]
    MismatchedProtocol,

    /// Appending would push the buffer past its fixed capacity.
    #[error("buffer full: need {needed} bytes, {available} available")]
    BufferFull { needed: usize, available: usize },

    /// The caller cancelled the operation before the sink sent anything.
    #[error("write cancelled")]
    Cancelled,

    /// I/O failure reported by a sink.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Opaque failure reported by a transport collaborator.
    #[error("transport error: {0}")]
    Transport(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap a transport-specific error.
    pub fn transport<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Transport(err.into())
    }

    /// Whether the error was raised before any byte was produced for the point.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::NoMeasurement
                | Error::NoFields
                | Error::InvalidFloat { .. }
                | Error::EmptyKey { .. }
                | Error::LineBreak { .. }
        )
    }
}
