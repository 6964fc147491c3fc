// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Capacity-bounded accumulator of encoded points.
//!
//! A [`PointBuffer`] is bound to one protocol for its whole life. It can be
//! handed to a sink as a [`PointEncoder`] without copying, as long as the
//! sink asks for that same protocol.

use crate::error::{Error, Result};
use crate::point::{Point, PointEncoder};
use crate::protocol::{Protocol, ProtocolId};
use std::borrow::Cow;
use std::sync::Arc;

/// Default buffer capacity in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Encoded points waiting to be sent.
pub struct PointBuffer {
    buf: Vec<u8>,
    capacity: usize,
    protocol: Arc<dyn Protocol>,
}

impl PointBuffer {
    /// Create a buffer of [`DEFAULT_BUFFER_SIZE`] bytes.
    pub fn new(protocol: Arc<dyn Protocol>) -> Self {
        Self::with_capacity(protocol, DEFAULT_BUFFER_SIZE)
    }

    /// Create a buffer that holds at most `capacity` encoded bytes.
    ///
    /// The allocation is made up front and reused across [`PointBuffer::reset`].
    pub fn with_capacity(protocol: Arc<dyn Protocol>, capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            protocol,
        }
    }

    /// Encode `point` under the bound protocol and append it.
    ///
    /// The buffer is unchanged if encoding fails or the line does not fit.
    pub fn write_point(&mut self, point: &Point) -> Result<()> {
        let mut line = Vec::new();
        self.protocol.encode(&mut line, point)?;
        self.extend(&line)
    }

    /// Append bytes already encoded under the bound protocol.
    pub(crate) fn extend(&mut self, bytes: &[u8]) -> Result<()> {
        let available = self.available();
        if bytes.len() > available {
            return Err(Error::BufferFull {
                needed: bytes.len(),
                available,
            });
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// View the accumulated bytes as `protocol`.
    ///
    /// Fails with [`Error::MismatchedProtocol`] unless `protocol` is the one
    /// this buffer was created with.
    pub fn encode(&self, protocol: &dyn Protocol) -> Result<&[u8]> {
        if protocol.id() != self.protocol.id() {
            return Err(Error::MismatchedProtocol);
        }
        Ok(&self.buf)
    }

    /// Drop the contents, keeping the allocation.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Maximum number of bytes the buffer holds.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free space left before the buffer is full.
    pub fn available(&self) -> usize {
        self.capacity - self.buf.len()
    }

    pub fn protocol(&self) -> &Arc<dyn Protocol> {
        &self.protocol
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

impl PointEncoder for PointBuffer {
    fn encode(&self, protocol: &dyn Protocol) -> Result<Cow<'_, [u8]>> {
        PointBuffer::encode(self, protocol).map(Cow::Borrowed)
    }
}

impl std::fmt::Debug for PointBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointBuffer")
            .field("protocol", &self.protocol.id())
            .field("len", &self.buf.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Bytes that were already encoded under a known protocol.
///
/// Used to pass an oversized payload straight to a sink without copying it
/// into a buffer.
#[derive(Debug, Clone, Copy)]
pub struct Encoded<'a> {
    protocol: ProtocolId,
    bytes: &'a [u8],
}

impl<'a> Encoded<'a> {
    pub fn new(protocol: ProtocolId, bytes: &'a [u8]) -> Self {
        Self { protocol, bytes }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl PointEncoder for Encoded<'_> {
    fn encode(&self, protocol: &dyn Protocol) -> Result<Cow<'_, [u8]>> {
        if protocol.id() != self.protocol {
            return Err(Error::MismatchedProtocol);
        }
        Ok(Cow::Borrowed(self.bytes))
    }
}
