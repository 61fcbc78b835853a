// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session handling and the high-level client.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          S7Client                               │
//! │            (discover / read / write / write_by_path)            │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        SessionPool                              │
//! │            (bounded borrowing, dead-session replacement)        │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                UaSession / SessionFactory                       │
//! │            (protocol stack supplied by the application)         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod pool;
pub mod session;
pub mod wrapper;

pub use pool::{PoolStats, SessionLease, SessionPool};
pub use session::{BrowseResult, DataValue, SessionFactory, UaSession, UaValue};
pub use wrapper::S7Client;
