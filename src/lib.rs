/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! # blockbridge
//!
//! `blockbridge` bridges thread-blocking repository calls with asynchronous,
//! push-based record streams.
//!
//! Two adapters make up the core:
//!
//! - [`wrap_blocking_source`] defers a blocking "read all" call onto a named
//!   worker pool and exposes the result as a cold [`futures::Stream`]. The
//!   blocking call runs only once a consumer polls the stream, and never on
//!   the consumer's thread.
//! - [`drain_to_blocking_sink`] consumes an asynchronous stream and persists
//!   each element through a blocking "save" call on a worker pool, one
//!   in-flight persist at a time, completing exactly once after the whole
//!   stream has been persisted or on the first failure.
//!
//! Both adapters borrow an [`ExecutionContext`]: a named pool of worker
//! threads, either bounded (fixed size, FIFO queueing) or elastic (grows on
//! demand, reclaims workers idle longer than a timeout). Contexts are
//! process-wide shared resources owned by the surrounding application; the
//! adapters only schedule work onto them.
//!
//! ## Round trip
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//! use blockbridge::{
//!     drain_to_blocking_sink, wrap_blocking_source, BlockingSink, BlockingSource,
//!     ExecutionContext, IoFailure, Record,
//! };
//!
//! struct StaticSource(Vec<Record>);
//!
//! impl BlockingSource for StaticSource {
//!     type Item = Record;
//!
//!     fn read_all(&self) -> Result<Vec<Record>, IoFailure> {
//!         Ok(self.0.clone())
//!     }
//! }
//!
//! struct CollectingSink(Mutex<Vec<Record>>);
//!
//! impl BlockingSink for CollectingSink {
//!     type Item = Record;
//!
//!     fn save(&self, record: Record) -> Result<(), IoFailure> {
//!         self.0.lock().expect("sink lock").push(record);
//!         Ok(())
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let pool = ExecutionContext::elastic("repository-io", Duration::from_secs(30));
//!
//! let source = Arc::new(StaticSource(vec![
//!     Record::new("u1", "Ada", "Lovelace"),
//!     Record::new("u2", "Grace", "Hopper"),
//! ]));
//! let sink = Arc::new(CollectingSink(Mutex::new(Vec::new())));
//!
//! let records = wrap_blocking_source(source, &pool);
//! drain_to_blocking_sink(records, sink.clone(), &pool)
//!     .await
//!     .unwrap();
//!
//! let saved = sink.0.lock().unwrap();
//! assert_eq!(saved.len(), 2);
//! assert_eq!(saved[0].id(), "u1");
//! assert_eq!(saved[1].id(), "u2");
//! # });
//! ```
//!
//! ## Contract map
//!
//! - Repository capabilities: [`BlockingSource`] and [`BlockingSink`], with
//!   [`IoFailure`] as the only domain error kind
//! - Scheduler: [`ExecutionContext`] bounded/elastic factories and `schedule`
//! - Adapters: deferred source stream and sink drain
//! - Blocking helpers: [`block_for_value`] / [`block_for_all`] for test
//!   harnesses and imperative call sites
//!
//! ## Observability model
//!
//! The crate uses `tracing` for logs/events. Library code emits events and
//! does not initialize a global subscriber. Binaries and tests are
//! responsible for one-time `tracing_subscriber` initialization at process
//! boundaries.

mod record;
pub use record::Record;

mod error;
pub use error::IoFailure;

mod repository;
pub use repository::{BlockingSink, BlockingSource};

mod scheduler;
pub use scheduler::ExecutionContext;

mod adapter;
pub use adapter::drain::drain_to_blocking_sink;
pub use adapter::source::{wrap_blocking_source, DeferredReadAll};

mod blocking;
pub use blocking::{block_for_all, block_for_value};
