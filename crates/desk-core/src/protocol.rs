//! Wire protocol for the dashboard's duplex connection.
//!
//! Every frame is a JSON object discriminated by a `type` field. Two
//! families:
//!
//! - **[`Inbound`]**: server → client (bootstrap acknowledgement, account
//!   snapshots, order lifecycle events, switch confirmations, errors).
//! - **[`Outbound`]**: client → server (bootstrap handshake, snapshot
//!   requests, user switching, trading intents).
//!
//! The protocol is fire-and-forget: there are no request IDs, and
//! request/response pairs are disambiguated only by message type. Decoding
//! is two-step ([`decode`]) so an unrecognized future `type` is
//! distinguishable from a malformed frame.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ProtocolError;

// ─────────────────────────────────────────────────────────────────────────────
// Payload types
// ─────────────────────────────────────────────────────────────────────────────

/// Authenticated user identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned user ID.
    pub id: i64,
    /// Display name.
    pub username: String,
}

/// A trading account with its cash balances.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Server-assigned account ID.
    pub id: i64,
    /// Owning user ID.
    pub user_id: i64,
    /// Account display name.
    pub name: String,
    /// Account type label (e.g. `"AI"`).
    pub account_type: String,
    /// Capital the account started with.
    pub initial_capital: f64,
    /// Cash currently available.
    pub current_cash: f64,
    /// Cash locked by pending orders.
    pub frozen_cash: f64,
}

/// Aggregate valuation of the active account.
///
/// Applied verbatim from a `snapshot` frame — the client never derives or
/// transforms these numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    /// Account the snapshot was computed for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<Account>,
    /// Total assets (cash + positions).
    pub total_assets: f64,
    /// Market value of open positions.
    pub positions_value: f64,
    /// Optional portfolio sub-totals.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<PortfolioTotals>,
}

/// Portfolio sub-totals nested inside an [`Overview`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTotals {
    /// Total assets per the portfolio engine.
    pub total_assets: f64,
    /// Positions value per the portfolio engine.
    pub positions_value: f64,
}

/// Order side for trading intents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    /// Buy to open or add.
    Buy,
    /// Sell to reduce or close.
    Sell,
}

// ─────────────────────────────────────────────────────────────────────────────
// Inbound messages
// ─────────────────────────────────────────────────────────────────────────────

/// Server → client messages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Inbound {
    /// Bootstrap handshake acknowledged; session identity attached.
    #[serde(rename = "bootstrap_ok")]
    BootstrapOk {
        /// Authenticated user, when the server resolved one.
        #[serde(skip_serializing_if = "Option::is_none")]
        user: Option<User>,
        /// Active account, when the server resolved one.
        #[serde(skip_serializing_if = "Option::is_none")]
        account: Option<Account>,
    },

    /// Full account overview snapshot.
    #[serde(rename = "snapshot")]
    Snapshot {
        /// Aggregate valuation payload.
        overview: Overview,
    },

    /// An order was filled. No payload: the client resynchronizes by
    /// pulling a fresh snapshot instead of patching incrementally.
    #[serde(rename = "order_filled")]
    OrderFilled,

    /// An order was accepted and is pending.
    #[serde(rename = "order_pending")]
    OrderPending,

    /// The active user was switched.
    #[serde(rename = "user_switched")]
    UserSwitched {
        /// The user now active.
        user: User,
    },

    /// The active account was switched.
    #[serde(rename = "account_switched")]
    AccountSwitched {
        /// The account now active.
        account: Account,
    },

    /// Server-reported error. Surfaced as a transient notice; never alters
    /// connection or session state.
    #[serde(rename = "error")]
    Error {
        /// Human-readable error, when the server supplied one.
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

/// Discriminator strings for every [`Inbound`] variant.
const INBOUND_TYPES: &[&str] = &[
    "bootstrap_ok",
    "snapshot",
    "order_filled",
    "order_pending",
    "user_switched",
    "account_switched",
    "error",
];

impl Inbound {
    /// The `type` discriminator string for this message.
    #[must_use]
    pub fn message_type(&self) -> &'static str {
        match self {
            Self::BootstrapOk { .. } => "bootstrap_ok",
            Self::Snapshot { .. } => "snapshot",
            Self::OrderFilled => "order_filled",
            Self::OrderPending => "order_pending",
            Self::UserSwitched { .. } => "user_switched",
            Self::AccountSwitched { .. } => "account_switched",
            Self::Error { .. } => "error",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outbound messages
// ─────────────────────────────────────────────────────────────────────────────

/// Client → server messages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Outbound {
    /// Handshake sent once, immediately after the transport opens.
    #[serde(rename = "bootstrap")]
    Bootstrap {
        /// User to authenticate as.
        username: String,
        /// Starting capital for a fresh account.
        initial_capital: f64,
    },

    /// Request a fresh overview snapshot.
    #[serde(rename = "get_snapshot")]
    GetSnapshot,

    /// Switch the active user.
    #[serde(rename = "switch_user")]
    SwitchUser {
        /// Target username.
        username: String,
    },

    /// Place an order (consumed by the order-entry collaborator).
    #[serde(rename = "place_order")]
    PlaceOrder {
        /// Instrument symbol.
        symbol: String,
        /// Buy or sell.
        side: OrderSide,
        /// Order type label (e.g. `"market"`, `"limit"`).
        order_type: String,
        /// Quantity to trade.
        quantity: f64,
        /// Limit price, absent for market orders.
        #[serde(skip_serializing_if = "Option::is_none")]
        price: Option<f64>,
    },

    /// Cancel a pending order.
    #[serde(rename = "cancel_order")]
    CancelOrder {
        /// Server-assigned order ID.
        order_id: i64,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Codec
// ─────────────────────────────────────────────────────────────────────────────

/// Decode one inbound text frame.
///
/// Two-step: parse to a JSON value first, then check the `type`
/// discriminator against the known set before attempting the typed decode.
/// This keeps "unknown future type" (discard silently) distinct from
/// "malformed frame" (log a protocol violation).
pub fn decode(frame: &str) -> Result<Inbound, ProtocolError> {
    let value: Value =
        serde_json::from_str(frame).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?;
    if !INBOUND_TYPES.contains(&kind) {
        return Err(ProtocolError::UnknownType(kind.to_string()));
    }
    serde_json::from_value(value).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

/// Encode an outbound message as a text frame.
pub fn encode(message: &Outbound) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(|e| ProtocolError::Malformed(e.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
