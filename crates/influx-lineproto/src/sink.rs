// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! [`Sink`] over any [`std::io::Write`].
//!
//! Useful for files, pipes, stdout or an already-connected TCP stream. Each
//! sink write becomes one `write_all` followed by a flush of the writer.

use crate::error::{Error, Result};
use crate::point::PointEncoder;
use crate::protocol::{LineProtocol, Protocol};
use crate::writer::{CancelToken, Sink};
use std::io::Write;
use std::sync::Arc;

/// Line Protocol sink writing to an [`std::io::Write`].
#[derive(Debug)]
pub struct IoSink<W: Write> {
    inner: W,
    protocol: Arc<dyn Protocol>,
    writes: u64,
    bytes_written: u64,
}

impl<W: Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            protocol: LineProtocol::V1.shared(),
            writes: 0,
            bytes_written: 0,
        }
    }

    /// Number of successful writes.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Total bytes handed to the underlying writer.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Sink for IoSink<W> {
    fn write(&mut self, cancel: &CancelToken, encoder: &dyn PointEncoder) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let body = encoder.encode(self.protocol.as_ref())?;
        self.inner.write_all(&body)?;
        self.inner.flush()?;

        self.writes += 1;
        self.bytes_written += body.len() as u64;
        Ok(())
    }

    fn protocol(&self) -> Arc<dyn Protocol> {
        Arc::clone(&self.protocol)
    }
}
