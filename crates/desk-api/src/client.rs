//! The REST read client.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::errors::{ApiError, Result};
use crate::types::{
    BalanceHistory, BalanceHistoryQuery, Decision, DecisionFilter, Order, OrderFilter, Page,
    Paginated, Position, Trade, TradeFilter,
};

/// Server-side cap on `limit` for the balance-history endpoint.
const MAX_HISTORY_LIMIT: u32 = 1000;

/// Read-only client for the dashboard's list and chart endpoints.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client against `base_url` (e.g. `http://127.0.0.1:8000/api`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Build a client with a caller-supplied `reqwest::Client` (shared
    /// connection pool, custom timeouts).
    #[must_use]
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            let _ = base_url.pop();
        }
        Self { client, base_url }
    }

    /// One page of AI decision rows, newest first.
    pub async fn decisions(
        &self,
        account_id: i64,
        page: Page,
        filter: &DecisionFilter,
    ) -> Result<Paginated<Decision>> {
        let mut query = page_query(page);
        push_opt(&mut query, "operation", filter.operation.as_deref());
        push_opt(&mut query, "symbol", filter.symbol.as_deref());
        if let Some(executed) = filter.executed {
            query.push(("executed", executed.to_string()));
        }
        self.get_json(
            &format!("/accounts/{account_id}/ai-decisions/paginated"),
            &query,
        )
        .await
    }

    /// One page of open positions.
    pub async fn positions(&self, account_id: i64, page: Page) -> Result<Paginated<Position>> {
        self.get_json(
            &format!("/accounts/{account_id}/positions/paginated"),
            &page_query(page),
        )
        .await
    }

    /// One page of orders, newest first.
    pub async fn orders(
        &self,
        account_id: i64,
        page: Page,
        filter: &OrderFilter,
    ) -> Result<Paginated<Order>> {
        let mut query = page_query(page);
        push_opt(&mut query, "status", filter.status.as_deref());
        push_opt(&mut query, "symbol", filter.symbol.as_deref());
        self.get_json(&format!("/accounts/{account_id}/orders/paginated"), &query)
            .await
    }

    /// One page of executed trades, newest first.
    pub async fn trades(
        &self,
        account_id: i64,
        page: Page,
        filter: &TradeFilter,
    ) -> Result<Paginated<Trade>> {
        let mut query = page_query(page);
        push_opt(&mut query, "symbol", filter.symbol.as_deref());
        self.get_json(&format!("/accounts/{account_id}/trades/paginated"), &query)
            .await
    }

    /// One page of the balance chart, paginated backward via `end_time`.
    pub async fn balance_history(
        &self,
        account_id: i64,
        query: &BalanceHistoryQuery,
    ) -> Result<BalanceHistory> {
        let limit = query.limit.clamp(1, MAX_HISTORY_LIMIT);
        let mut params = vec![
            ("time_range", query.time_range.as_str().to_string()),
            ("interval", query.interval.as_str().to_string()),
            ("limit", limit.to_string()),
        ];
        push_opt(&mut params, "end_time", query.end_time.as_deref());
        self.get_json(&format!("/accounts/{account_id}/balance-history"), &params)
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "fetching");
        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "fetch failed");
            return Err(ApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn page_query(page: Page) -> Vec<(&'static str, String)> {
    vec![
        ("page", page.page.to_string()),
        ("page_size", page.page_size.to_string()),
    ]
}

fn push_opt(query: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
    if let Some(value) = value {
        query.push((key, value.to_string()));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
