// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Batching writer on top of a [`Sink`].
//!
//! Encoded points are accumulated in a [`PointBuffer`] and handed to the sink
//! in one write when the next payload would not fit. A payload larger than the
//! whole buffer bypasses it and goes straight to the sink.
//!
//! ```text
//! PointEncoder --> BufferedWriter --(flush)--> Sink::write --> transport
//! ```

use crate::buffer::{Encoded, PointBuffer, DEFAULT_BUFFER_SIZE};
use crate::config::WriterConfig;
use crate::error::Result;
use crate::point::PointEncoder;
use crate::protocol::Protocol;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative cancellation flag passed through to the sink.
///
/// Clones share the same flag. Sinks check it before doing I/O and return
/// [`crate::Error::Cancelled`] once it is set.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Destination for encoded points, typically a network transport.
pub trait Sink {
    /// Encode `encoder` under [`Sink::protocol`] and transmit it.
    fn write(&mut self, cancel: &CancelToken, encoder: &dyn PointEncoder) -> Result<()>;

    /// Protocol this sink sends.
    fn protocol(&self) -> Arc<dyn Protocol>;
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn write(&mut self, cancel: &CancelToken, encoder: &dyn PointEncoder) -> Result<()> {
        (**self).write(cancel, encoder)
    }

    fn protocol(&self) -> Arc<dyn Protocol> {
        (**self).protocol()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&mut self, cancel: &CancelToken, encoder: &dyn PointEncoder) -> Result<()> {
        (**self).write(cancel, encoder)
    }

    fn protocol(&self) -> Arc<dyn Protocol> {
        (**self).protocol()
    }
}

/// Buffers encoded points in front of a [`Sink`].
///
/// A single call to [`BufferedWriter::write`] never splits its payload over
/// two sink writes. The buffer is only cleared after the sink accepted it, so
/// a failed flush can be retried with the same bytes.
pub struct BufferedWriter<S: Sink> {
    sink: S,
    buf: PointBuffer,
    flush_interval: Option<Duration>,
    last_flush: Instant,
}

impl<S: Sink> BufferedWriter<S> {
    /// Create a writer with a [`DEFAULT_BUFFER_SIZE`] byte buffer.
    pub fn new(sink: S) -> Self {
        Self::with_capacity(sink, DEFAULT_BUFFER_SIZE)
    }

    /// Create a writer with a buffer of `capacity` bytes.
    pub fn with_capacity(sink: S, capacity: usize) -> Self {
        let buf = PointBuffer::with_capacity(sink.protocol(), capacity);
        Self {
            sink,
            buf,
            flush_interval: None,
            last_flush: Instant::now(),
        }
    }

    /// Create a writer sized and timed from `config`.
    pub fn from_config(sink: S, config: &WriterConfig) -> Self {
        let mut writer = Self::with_capacity(sink, config.buffer_size);
        writer.flush_interval = config.flush_interval();
        writer
    }

    /// Set the maximum age of buffered data reported by [`BufferedWriter::should_flush`].
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = Some(interval);
        self
    }

    /// Encode `encoder` and buffer it, flushing first if it does not fit.
    pub fn write<E>(&mut self, cancel: &CancelToken, encoder: &E) -> Result<()>
    where
        E: PointEncoder + ?Sized,
    {
        let protocol = self.sink.protocol();
        let bytes = encoder.encode(protocol.as_ref())?;

        if bytes.len() > self.buf.available() {
            self.flush(cancel)?;
        }

        if bytes.len() > self.buf.capacity() {
            log::trace!(
                "payload of {} bytes exceeds buffer capacity {}, writing directly",
                bytes.len(),
                self.buf.capacity()
            );
            return self
                .sink
                .write(cancel, &Encoded::new(protocol.id(), &bytes[..]));
        }

        self.buf.extend(&bytes)
    }

    /// Send buffered bytes to the sink. Does nothing when the buffer is empty.
    pub fn flush(&mut self, cancel: &CancelToken) -> Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }

        let len = self.buf.len();
        if let Err(e) = self.sink.write(cancel, &self.buf) {
            log::warn!("flush of {} buffered bytes failed: {}", len, e);
            return Err(e);
        }
        log::debug!("flushed {} bytes", len);

        self.buf.reset();
        self.last_flush = Instant::now();
        Ok(())
    }

    /// Check if a time-based flush is due.
    ///
    /// Always false when no flush interval is configured or nothing is buffered.
    pub fn should_flush(&self) -> bool {
        match self.flush_interval {
            Some(interval) => !self.buf.is_empty() && self.last_flush.elapsed() >= interval,
            None => false,
        }
    }

    /// Number of buffered bytes.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Free space left in the buffer.
    pub fn available(&self) -> usize {
        self.buf.available()
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Take the sink and the buffer apart. Buffered bytes are not flushed.
    pub fn into_parts(self) -> (S, PointBuffer) {
        (self.sink, self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::point::Point;
    use crate::protocol::LineProtocol;

    /// Records every payload handed to it; optionally fails the next write.
    #[derive(Default)]
    struct RecordingSink {
        writes: Vec<Vec<u8>>,
        fail_next: bool,
    }

    impl Sink for RecordingSink {
        fn write(&mut self, cancel: &CancelToken, encoder: &dyn PointEncoder) -> Result<()> {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if self.fail_next {
                self.fail_next = false;
                return Err(Error::transport("connection refused"));
            }
            let bytes = encoder.encode(&LineProtocol::V1)?;
            self.writes.push(bytes.into_owned());
            Ok(())
        }

        fn protocol(&self) -> Arc<dyn Protocol> {
            LineProtocol::V1.shared()
        }
    }

    fn point(i: i64) -> Point {
        Point::new("cpu").field("v", i)
    }

    /// "cpu v=Ni\n" is 9 bytes for single-digit N.
    const LINE: usize = 9;

    #[test]
    fn test_writes_under_capacity_do_not_flush() {
        let mut sink = RecordingSink::default();
        let cancel = CancelToken::new();
        let mut writer = BufferedWriter::with_capacity(&mut sink, LINE * 3);

        for i in 0..3 {
            writer.write(&cancel, &point(i)).expect("write");
        }

        assert_eq!(writer.buffered(), LINE * 3);
        assert_eq!(writer.available(), 0);
        assert!(writer.get_ref().writes.is_empty());
        writer.flush(&cancel).expect("flush");
        drop(writer);

        assert_eq!(sink.writes, vec![b"cpu v=0i\ncpu v=1i\ncpu v=2i\n".to_vec()]);
    }

    #[test]
    fn test_overflowing_write_flushes_once_then_appends() {
        let mut sink = RecordingSink::default();
        let cancel = CancelToken::new();
        let mut writer = BufferedWriter::with_capacity(&mut sink, LINE * 3);

        for i in 0..4 {
            writer.write(&cancel, &point(i)).expect("write");
        }

        assert_eq!(writer.get_ref().writes.len(), 1);
        assert_eq!(
            writer.get_ref().writes[0],
            b"cpu v=0i\ncpu v=1i\ncpu v=2i\n".to_vec()
        );
        assert_eq!(writer.buffered(), LINE);
        writer.flush(&cancel).expect("flush");
    }

    #[test]
    fn test_oversized_payload_written_directly() {
        let mut sink = RecordingSink::default();
        let cancel = CancelToken::new();
        let mut writer = BufferedWriter::with_capacity(&mut sink, LINE * 2);

        writer.write(&cancel, &point(1)).expect("write");

        let batch: Vec<Point> = (0..3).map(point).collect();
        writer.write(&cancel, &batch).expect("write batch");

        assert_eq!(writer.buffered(), 0);
        drop(writer);

        assert_eq!(sink.writes.len(), 2);
        assert_eq!(sink.writes[0], b"cpu v=1i\n".to_vec());
        assert_eq!(sink.writes[1], b"cpu v=0i\ncpu v=1i\ncpu v=2i\n".to_vec());
    }

    #[test]
    fn test_oversized_payload_into_empty_buffer_skips_flush() {
        let mut sink = RecordingSink::default();
        let cancel = CancelToken::new();
        let mut writer = BufferedWriter::with_capacity(&mut sink, 4);

        writer.write(&cancel, &point(7)).expect("write");
        drop(writer);

        assert_eq!(sink.writes, vec![b"cpu v=7i\n".to_vec()]);
    }

    #[test]
    fn test_exact_fit_is_buffered() {
        let mut sink = RecordingSink::default();
        let cancel = CancelToken::new();
        let mut writer = BufferedWriter::with_capacity(&mut sink, LINE);

        writer.write(&cancel, &point(1)).expect("write");
        assert_eq!(writer.buffered(), LINE);
        assert!(writer.get_ref().writes.is_empty());
        writer.flush(&cancel).expect("flush");
    }

    #[test]
    fn test_failed_flush_keeps_buffer() {
        let mut sink = RecordingSink::default();
        let cancel = CancelToken::new();
        let mut writer = BufferedWriter::with_capacity(&mut sink, LINE * 2);

        writer.write(&cancel, &point(0)).expect("write");
        writer.write(&cancel, &point(1)).expect("write");

        writer.get_mut().fail_next = true;
        let err = writer.write(&cancel, &point(2)).unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
        assert_eq!(writer.buffered(), LINE * 2);

        // Retrying re-sends the same bytes and then buffers the new point.
        writer.write(&cancel, &point(2)).expect("retry");
        assert_eq!(writer.get_ref().writes, vec![b"cpu v=0i\ncpu v=1i\n".to_vec()]);
        assert_eq!(writer.buffered(), LINE);
        writer.flush(&cancel).expect("flush");
    }

    #[test]
    fn test_invalid_point_leaves_buffer_untouched() {
        let mut sink = RecordingSink::default();
        let cancel = CancelToken::new();
        let mut writer = BufferedWriter::with_capacity(&mut sink, 64);

        writer.write(&cancel, &point(0)).expect("write");
        let err = writer.write(&cancel, &Point::new("cpu")).unwrap_err();

        assert!(err.is_validation());
        assert_eq!(writer.buffered(), LINE);
        writer.flush(&cancel).expect("flush");
    }

    #[test]
    fn test_cancel_token_reaches_sink() {
        let mut sink = RecordingSink::default();
        let cancel = CancelToken::new();
        let mut writer = BufferedWriter::with_capacity(&mut sink, 64);

        writer.write(&cancel, &point(0)).expect("write");
        cancel.cancel();

        assert!(matches!(writer.flush(&cancel), Err(Error::Cancelled)));
        assert_eq!(writer.buffered(), LINE);

        let (_, buf) = writer.into_parts();
        assert_eq!(buf.as_bytes(), b"cpu v=0i\n");
    }

    #[test]
    fn test_flush_empty_is_noop() {
        let mut sink = RecordingSink::default();
        let mut writer = BufferedWriter::new(&mut sink);

        writer.flush(&CancelToken::new()).expect("flush");
        assert_eq!(writer.capacity(), DEFAULT_BUFFER_SIZE);
        drop(writer);

        assert!(sink.writes.is_empty());
    }

    #[test]
    fn test_should_flush_by_interval() {
        let mut writer =
            BufferedWriter::new(RecordingSink::default()).flush_interval(Duration::from_millis(0));
        let cancel = CancelToken::new();

        // Nothing buffered yet.
        assert!(!writer.should_flush());

        writer.write(&cancel, &point(0)).expect("write");
        assert!(writer.should_flush());

        writer.flush(&cancel).expect("flush");
        assert!(!writer.should_flush());
    }

    #[test]
    fn test_should_flush_without_interval() {
        let mut writer = BufferedWriter::new(RecordingSink::default());
        let cancel = CancelToken::new();

        writer.write(&cancel, &point(0)).expect("write");
        assert!(!writer.should_flush());
        writer.flush(&cancel).expect("flush");
    }
}
