//! # desk-core
//!
//! Foundation types for the desk trading dashboard data plane.
//!
//! This crate provides the shared vocabulary the other desk crates depend on:
//!
//! - **Protocol**: [`protocol::Inbound`] / [`protocol::Outbound`] tagged
//!   message unions and their payload types
//! - **Session**: [`session::SessionStore`] — user, account, and overview
//!   state derived from inbound messages
//! - **Notices**: [`notice::Notice`] transient user-facing notifications
//! - **Reconnect**: [`reconnect::ReconnectPolicy`] fixed-delay retry policy
//! - **Errors**: [`errors::ProtocolError`] decode failure taxonomy
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other desk crates.

#![deny(unsafe_code)]

pub mod errors;
pub mod notice;
pub mod protocol;
pub mod reconnect;
pub mod session;
