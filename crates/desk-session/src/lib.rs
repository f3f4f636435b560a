//! # desk-session
//!
//! The dashboard data plane: one persistent duplex connection to the trading
//! server, supervised for the life of the process.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `transport` | WebSocket endpoint: open/send/receive/close primitives |
//! | `endpoint` | Connection URL resolution (local dev port vs same-origin) |
//! | `supervisor` | Singleton connection, reconnect state machine, backoff |
//! | `dispatcher` | Frame decode, routing table, session mutation |
//!
//! ## Data Flow
//!
//! `transport` → `supervisor` (lifecycle) → `dispatcher` (decode/route) →
//! `SessionStore` (apply) → presentation layer.
//! Outbound: intent → `supervisor` → `dispatcher` (encode) → `transport`.

#![deny(unsafe_code)]

pub mod dispatcher;
pub mod endpoint;
pub mod supervisor;
pub mod transport;

pub use supervisor::{SessionConfig, SessionHandle, SessionManager};
