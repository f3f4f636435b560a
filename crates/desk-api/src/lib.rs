//! # desk-api
//!
//! Read-only REST client for the dashboard's list tables and balance chart.
//!
//! Each fetch is independent and one-shot: a newer request supersedes the
//! previous render, and the only failure handling is surfacing the error to
//! the caller for a notice. There is deliberately no retry or caching layer
//! here — recovery policy belongs to the connection supervisor, not to the
//! table glue.

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod types;

pub use client::ApiClient;
pub use errors::ApiError;
pub use types::*;
