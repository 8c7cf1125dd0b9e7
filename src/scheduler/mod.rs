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

//! Scheduler layer.
//!
//! Owns the named worker pools that isolate blocking repository calls from
//! whatever thread subscribes to or produces stream elements. The adapters
//! only ever borrow an [`ExecutionContext`] and call `schedule`; pool
//! lifecycle belongs to the surrounding application.
//!
//! ```
//! use std::time::Duration;
//! use blockbridge::ExecutionContext;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let bounded = ExecutionContext::bounded("persist-lane", 4);
//! let elastic = ExecutionContext::elastic("read-lane", Duration::from_secs(60));
//!
//! bounded.schedule(|| { /* blocking work */ });
//! elastic.schedule(|| { /* blocking work */ });
//! # });
//! ```

mod context;
pub use context::ExecutionContext;

pub(crate) mod worker;
