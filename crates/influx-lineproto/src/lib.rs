// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! InfluxDB Line Protocol encoding and batching.
//!
//! This crate provides:
//! - A typed point model (measurement, tags, fields, timestamp)
//! - Line Protocol v1 encoding with the format's escaping rules
//! - A capacity-bounded [`PointBuffer`] bound to one protocol
//! - A [`BufferedWriter`] that batches encoded points in front of a [`Sink`]
//! - YAML configuration and JSON record mapping
//!
//! # Overview
//!
//! The crate does NOT talk HTTP or UDP itself. Transports implement [`Sink`]
//! and receive whole batches; [`IoSink`] covers anything that is
//! [`std::io::Write`].
//!
//! ```text
//! Point --> PointEncoder --> BufferedWriter --> PointBuffer --(flush)--> Sink
//! ```
//!
//! ```
//! use influx_lineproto::{BufferedWriter, CancelToken, IoSink, Point};
//!
//! let cancel = CancelToken::new();
//! let mut writer = BufferedWriter::new(IoSink::new(Vec::new()));
//!
//! let point = Point::new("cpu")
//!     .tag("host", "server01")
//!     .field("value", 2.0)
//!     .timestamp_nanos(1_000_000_000);
//! writer.write(&cancel, &point).unwrap();
//! writer.flush(&cancel).unwrap();
//!
//! let (sink, _) = writer.into_parts();
//! assert_eq!(sink.into_inner(), b"cpu,host=server01 value=2 1000000000\n");
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod mapping;
pub mod point;
pub mod protocol;
pub mod sink;
pub mod writer;

pub use buffer::{Encoded, PointBuffer, DEFAULT_BUFFER_SIZE};
pub use config::{ConfigError, WriterConfig};
pub use error::{Error, Result};
pub use mapping::FieldMapper;
pub use point::{FieldValue, Fields, Point, PointEncoder, Tag, Tags};
pub use protocol::{LineProtocol, Protocol, ProtocolId};
pub use sink::IoSink;
pub use writer::{BufferedWriter, CancelToken, Sink};
