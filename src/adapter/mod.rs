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

//! Adapter layer.
//!
//! Owns the two directional bridges between the blocking repository contracts
//! and the asynchronous stream world: the deferred source stream (blocking
//! read, async consumption) and the sink drain (async production, blocking
//! persistence). Both confine the blocking call to a borrowed
//! [`crate::ExecutionContext`] worker and transition their output through
//! exactly one terminal state.

pub(crate) mod drain;
pub(crate) mod source;
