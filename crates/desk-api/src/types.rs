//! Wire shapes for the paginated read endpoints.
//!
//! Row models mirror the server's serialized dictionaries field-for-field;
//! timestamps stay ISO-8601 strings because the tables render them verbatim
//! and never do date arithmetic client-side.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Pagination envelope
// ─────────────────────────────────────────────────────────────────────────────

/// One page of a list resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    /// Rows on this page, newest first.
    pub items: Vec<T>,
    /// Total row count across all pages.
    pub total: u64,
    /// 1-based page number echoed back.
    pub page: u32,
    /// Page size echoed back.
    pub page_size: u32,
    /// Ceiling of `total / page_size`.
    pub total_pages: u32,
}

/// Page cursor for a list request. Pages are 1-based.
#[derive(Clone, Copy, Debug)]
pub struct Page {
    /// 1-based page number.
    pub page: u32,
    /// Rows per page (server accepts 1–100).
    pub page_size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Row models
// ─────────────────────────────────────────────────────────────────────────────

/// One AI decision log row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Row ID.
    pub id: i64,
    /// Owning account.
    pub account_id: i64,
    /// Decision timestamp, ISO-8601.
    pub decision_time: String,
    /// Free-text rationale.
    #[serde(default)]
    pub reason: String,
    /// Operation label (e.g. `"buy"`, `"hold"`).
    #[serde(default)]
    pub operation: String,
    /// Instrument symbol, absent for portfolio-level decisions.
    pub symbol: Option<String>,
    /// Portfolio portion before the decision.
    #[serde(default)]
    pub prev_portion: f64,
    /// Portfolio portion targeted by the decision.
    #[serde(default)]
    pub target_portion: f64,
    /// Total balance at decision time.
    #[serde(default)]
    pub total_balance: f64,
    /// Whether the decision produced an order.
    pub executed: bool,
    /// The resulting order, when executed.
    pub order_id: Option<i64>,
}

/// One open position row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Row ID.
    pub id: i64,
    /// Owning account.
    pub account_id: i64,
    /// Instrument symbol.
    pub symbol: String,
    /// Instrument display name.
    pub name: String,
    /// Market label.
    pub market: String,
    /// Quantity held.
    pub quantity: f64,
    /// Quantity not locked by pending orders.
    pub available_quantity: f64,
    /// Average acquisition cost.
    pub avg_cost: f64,
    /// Last traded price, absent before first quote.
    pub last_price: Option<f64>,
    /// Market value, absent before first quote.
    pub market_value: Option<f64>,
}

/// One order row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Row ID.
    pub id: i64,
    /// Server-assigned order number.
    pub order_no: String,
    /// Instrument symbol.
    pub symbol: String,
    /// Instrument display name.
    pub name: String,
    /// Market label.
    pub market: String,
    /// `"buy"` or `"sell"`.
    pub side: String,
    /// Order type label (e.g. `"market"`, `"limit"`).
    pub order_type: String,
    /// Limit price, absent for market orders.
    pub price: Option<f64>,
    /// Quantity ordered.
    pub quantity: f64,
    /// Quantity filled so far.
    pub filled_quantity: f64,
    /// Status label (e.g. `"pending"`, `"filled"`, `"cancelled"`).
    pub status: String,
    /// Creation timestamp, ISO-8601.
    pub created_at: String,
}

/// One executed trade row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Row ID.
    pub id: i64,
    /// Order this execution belongs to.
    pub order_id: i64,
    /// Owning account.
    pub account_id: i64,
    /// Instrument symbol.
    pub symbol: String,
    /// Instrument display name.
    pub name: String,
    /// Market label.
    pub market: String,
    /// `"buy"` or `"sell"`.
    pub side: String,
    /// Execution price.
    pub price: f64,
    /// Executed quantity.
    pub quantity: f64,
    /// Commission charged.
    pub commission: f64,
    /// Execution timestamp, ISO-8601.
    pub trade_time: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Filters
// ─────────────────────────────────────────────────────────────────────────────

/// Optional decision-list filters; unset fields are omitted from the query.
#[derive(Clone, Debug, Default)]
pub struct DecisionFilter {
    /// Restrict to one operation label.
    pub operation: Option<String>,
    /// Restrict to one symbol (exact match).
    pub symbol: Option<String>,
    /// Restrict by execution outcome.
    pub executed: Option<bool>,
}

/// Optional order-list filters.
#[derive(Clone, Debug, Default)]
pub struct OrderFilter {
    /// Restrict to one status label.
    pub status: Option<String>,
    /// Symbol substring match.
    pub symbol: Option<String>,
}

/// Optional trade-list filters.
#[derive(Clone, Debug, Default)]
pub struct TradeFilter {
    /// Symbol substring match.
    pub symbol: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Balance history
// ─────────────────────────────────────────────────────────────────────────────

/// Chart window. The server rejects anything outside this set, so the
/// client only offers these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeRange {
    /// Last 24 hours.
    Day,
    /// Last 7 days.
    Week,
    /// Last 30 days.
    Month,
    /// Everything.
    All,
}

impl TimeRange {
    /// Wire value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "24h",
            Self::Week => "1w",
            Self::Month => "30d",
            Self::All => "all",
        }
    }
}

/// Chart aggregation interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interval {
    /// Six minutes (raw points, no aggregation server-side).
    SixMinutes,
    /// One hour.
    Hour,
    /// One day.
    Day,
}

impl Interval {
    /// Wire value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SixMinutes => "6m",
            Self::Hour => "1h",
            Self::Day => "1d",
        }
    }
}

/// Parameters for one balance-history fetch.
#[derive(Clone, Debug)]
pub struct BalanceHistoryQuery {
    /// Window to fetch within.
    pub time_range: TimeRange,
    /// Aggregation interval.
    pub interval: Interval,
    /// Exclusive upper bound for backward pagination (ISO-8601); `None`
    /// means "now".
    pub end_time: Option<String>,
    /// Point cap; the server accepts 1–1000.
    pub limit: u32,
}

impl BalanceHistoryQuery {
    /// A query for the given window at the given interval, newest page.
    #[must_use]
    pub fn new(time_range: TimeRange, interval: Interval) -> Self {
        Self {
            time_range,
            interval,
            end_time: None,
            limit: 100,
        }
    }
}

/// One point on the balance chart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalancePoint {
    /// Point timestamp, ISO-8601.
    pub timestamp: String,
    /// Total balance at that time.
    pub total_balance: f64,
    /// Decision row the point came from.
    pub decision_id: i64,
}

/// One page of the balance chart, paginated backward in time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceHistory {
    /// Points oldest-to-newest.
    pub data: Vec<BalancePoint>,
    /// Whether older points exist beyond this page.
    pub has_more: bool,
    /// `end_time` to pass for the next older page, when `has_more`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_end_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_values_match_server_accepted_set() {
        assert_eq!(TimeRange::Day.as_str(), "24h");
        assert_eq!(TimeRange::Week.as_str(), "1w");
        assert_eq!(TimeRange::Month.as_str(), "30d");
        assert_eq!(TimeRange::All.as_str(), "all");
        assert_eq!(Interval::SixMinutes.as_str(), "6m");
        assert_eq!(Interval::Hour.as_str(), "1h");
        assert_eq!(Interval::Day.as_str(), "1d");
    }

    #[test]
    fn default_page_is_first_page_of_twenty() {
        let page = Page::default();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 20);
    }

    #[test]
    fn paginated_envelope_decodes() {
        let json = r#"{
            "items": [{"timestamp": "2026-01-01T00:00:00", "total_balance": 1.0, "decision_id": 1}],
            "total": 41, "page": 2, "page_size": 20, "total_pages": 3
        }"#;
        let page: Paginated<BalancePoint> = serde_json::from_str(json).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_pages, 3);
    }

    #[test]
    fn decision_row_tolerates_nulls() {
        let json = r#"{
            "id": 1, "account_id": 7, "decision_time": "2026-01-01T00:00:00",
            "reason": "", "operation": "", "symbol": null,
            "prev_portion": 0.0, "target_portion": 0.0, "total_balance": 0.0,
            "executed": false, "order_id": null
        }"#;
        let row: Decision = serde_json::from_str(json).unwrap();
        assert!(row.symbol.is_none());
        assert!(row.order_id.is_none());
    }

    #[test]
    fn balance_history_without_next_page() {
        let json = r#"{"data": [], "has_more": false, "next_end_time": null}"#;
        let history: BalanceHistory = serde_json::from_str(json).unwrap();
        assert!(!history.has_more);
        assert!(history.next_end_time.is_none());
    }
}
