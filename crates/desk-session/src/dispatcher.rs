//! Frame decode and routing.
//!
//! One inbound text frame in, at most one session mutation, at most one
//! notice, and at most one follow-up request out. The routing table is the
//! single place inbound message semantics live; the supervisor only moves
//! frames and sends whatever follow-up the dispatcher returns.
//!
//! | Message | Session mutation | Notice | Follow-up |
//! |---------|------------------|--------|-----------|
//! | `bootstrap_ok` | user + account | — | `get_snapshot` |
//! | `snapshot` | overview | — | — |
//! | `order_filled` | — | success | `get_snapshot` |
//! | `order_pending` | — | info | `get_snapshot` |
//! | `user_switched` | user | success | — |
//! | `account_switched` | account | success | — |
//! | `error` | — | error | — |
//!
//! Switch confirmations deliberately carry no follow-up: the overview stays
//! stale until the caller that initiated the switch requests the next
//! snapshot round-trip.
//!
//! Unknown message types are discarded at debug level (forward
//! compatibility); malformed frames are discarded at warn level (protocol
//! violation). Neither ever touches connection or session state.

use desk_core::notice::Notice;
use desk_core::protocol::{self, Inbound, Outbound};
use desk_core::session::SessionStore;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Routes decoded frames into session mutations, notices, and follow-ups.
#[derive(Clone)]
pub struct Dispatcher {
    session: SessionStore,
    notices: broadcast::Sender<Notice>,
}

impl Dispatcher {
    /// Create a dispatcher writing into `session` and emitting on `notices`.
    #[must_use]
    pub fn new(session: SessionStore, notices: broadcast::Sender<Notice>) -> Self {
        Self { session, notices }
    }

    /// Handle one raw text frame.
    ///
    /// Returns the follow-up request to send, if the routed message calls
    /// for one. Undecodable frames return `None` and leave all state alone.
    pub fn handle_frame(&self, frame: &str) -> Option<Outbound> {
        let message = match protocol::decode(frame) {
            Ok(message) => message,
            Err(e) if e.is_unknown_type() => {
                debug!(error = %e, "discarding unrecognized message type");
                metrics::counter!("desk_frames_discarded_total", "reason" => "unknown_type")
                    .increment(1);
                return None;
            }
            Err(e) => {
                warn!(error = %e, "discarding malformed frame");
                metrics::counter!("desk_frames_discarded_total", "reason" => "malformed")
                    .increment(1);
                return None;
            }
        };
        self.route(message)
    }

    /// Apply one decoded message per the routing table.
    fn route(&self, message: Inbound) -> Option<Outbound> {
        match message {
            Inbound::BootstrapOk { user, account } => {
                debug!(
                    user = user.as_ref().map(|u| u.username.as_str()),
                    "bootstrap acknowledged"
                );
                self.session.apply_bootstrap(user, account);
                Some(Outbound::GetSnapshot)
            }
            Inbound::Snapshot { overview } => {
                self.session.set_overview(overview);
                None
            }
            Inbound::OrderFilled => {
                self.notify(Notice::success("Order filled"));
                Some(Outbound::GetSnapshot)
            }
            Inbound::OrderPending => {
                self.notify(Notice::info("Order pending"));
                Some(Outbound::GetSnapshot)
            }
            Inbound::UserSwitched { user } => {
                let username = user.username.clone();
                self.session.set_user(user);
                self.notify(Notice::success(format!("Switched to {username}")));
                None
            }
            Inbound::AccountSwitched { account } => {
                let name = account.name.clone();
                self.session.set_account(account);
                self.notify(Notice::success(format!("Switched to account {name}")));
                None
            }
            Inbound::Error { message } => {
                let text = message.unwrap_or_else(|| "Server error".to_string());
                warn!(message = %text, "server reported an error");
                self.notify(Notice::error(text));
                None
            }
        }
    }

    /// Emit a notice; no subscribers is fine.
    pub fn notify(&self, notice: Notice) {
        let _ = self.notices.send(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use desk_core::notice::NoticeLevel;
    use serde_json::json;

    fn dispatcher() -> (Dispatcher, SessionStore, broadcast::Receiver<Notice>) {
        let session = SessionStore::new();
        let (notices, rx) = broadcast::channel(16);
        (Dispatcher::new(session.clone(), notices), session, rx)
    }

    fn account_json() -> serde_json::Value {
        json!({
            "id": 7, "user_id": 1, "name": "default", "account_type": "AI",
            "initial_capital": 10_000.0, "current_cash": 10_000.0, "frozen_cash": 0.0,
        })
    }

    #[test]
    fn bootstrap_ok_stores_identity_and_requests_snapshot() {
        let (dispatcher, session, _rx) = dispatcher();
        let frame = json!({
            "type": "bootstrap_ok",
            "user": {"id": 1, "username": "default"},
            "account": account_json(),
        })
        .to_string();

        let follow_up = dispatcher.handle_frame(&frame);

        assert_matches!(follow_up, Some(Outbound::GetSnapshot));
        let snap = session.snapshot();
        assert_eq!(snap.user.unwrap().username, "default");
        assert_eq!(snap.account.unwrap().id, 7);
        assert!(!session.is_ready());
    }

    #[test]
    fn snapshot_completes_readiness_without_follow_up() {
        let (dispatcher, session, _rx) = dispatcher();
        let bootstrap = json!({
            "type": "bootstrap_ok",
            "user": {"id": 1, "username": "default"},
            "account": account_json(),
        })
        .to_string();
        let _ = dispatcher.handle_frame(&bootstrap);

        let snapshot = json!({
            "type": "snapshot",
            "overview": {"total_assets": 10_000.0, "positions_value": 0.0},
        })
        .to_string();
        let follow_up = dispatcher.handle_frame(&snapshot);

        assert!(follow_up.is_none());
        assert!(session.is_ready());
        assert_eq!(session.snapshot().overview.unwrap().total_assets, 10_000.0);
    }

    #[test]
    fn order_filled_notifies_and_resynchronizes() {
        let (dispatcher, _session, mut rx) = dispatcher();
        let follow_up = dispatcher.handle_frame(r#"{"type":"order_filled"}"#);
        assert_matches!(follow_up, Some(Outbound::GetSnapshot));
        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
    }

    #[test]
    fn order_pending_notifies_and_resynchronizes() {
        let (dispatcher, _session, mut rx) = dispatcher();
        let follow_up = dispatcher.handle_frame(r#"{"type":"order_pending"}"#);
        assert_matches!(follow_up, Some(Outbound::GetSnapshot));
        assert_eq!(rx.try_recv().unwrap().level, NoticeLevel::Info);
    }

    #[test]
    fn user_switched_updates_user_without_follow_up() {
        let (dispatcher, session, mut rx) = dispatcher();
        let frame = r#"{"type":"user_switched","user":{"id":2,"username":"alice"}}"#;
        let follow_up = dispatcher.handle_frame(frame);
        // The resync after a switch belongs to the caller, not the router.
        assert!(follow_up.is_none());
        assert_eq!(session.snapshot().user.unwrap().username, "alice");
        assert!(rx.try_recv().unwrap().message.contains("alice"));
    }

    #[test]
    fn account_switched_updates_account_without_follow_up() {
        let (dispatcher, session, mut rx) = dispatcher();
        let frame = json!({"type": "account_switched", "account": account_json()}).to_string();
        let follow_up = dispatcher.handle_frame(&frame);
        assert!(follow_up.is_none());
        assert_eq!(session.snapshot().account.unwrap().name, "default");
        assert_eq!(rx.try_recv().unwrap().level, NoticeLevel::Success);
    }

    #[test]
    fn only_bootstrap_and_order_events_request_a_snapshot() {
        let (dispatcher, _session, _rx) = dispatcher();
        let with_follow_up = [
            json!({"type": "bootstrap_ok"}).to_string(),
            json!({"type": "order_filled"}).to_string(),
            json!({"type": "order_pending"}).to_string(),
        ];
        for frame in &with_follow_up {
            assert_matches!(
                dispatcher.handle_frame(frame),
                Some(Outbound::GetSnapshot),
                "expected follow-up for {frame}"
            );
        }
        let without = [
            r#"{"type":"user_switched","user":{"id":2,"username":"alice"}}"#.to_string(),
            json!({"type": "account_switched", "account": account_json()}).to_string(),
            json!({"type": "error"}).to_string(),
        ];
        for frame in &without {
            assert!(
                dispatcher.handle_frame(frame).is_none(),
                "unexpected follow-up for {frame}"
            );
        }
    }

    #[test]
    fn server_error_surfaces_as_error_notice() {
        let (dispatcher, session, mut rx) = dispatcher();
        let follow_up =
            dispatcher.handle_frame(r#"{"type":"error","message":"insufficient funds"}"#);
        assert!(follow_up.is_none());
        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "insufficient funds");
        assert_eq!(session.snapshot(), Default::default());
    }

    #[test]
    fn server_error_without_message_gets_fallback_text() {
        let (dispatcher, _session, mut rx) = dispatcher();
        let _ = dispatcher.handle_frame(r#"{"type":"error"}"#);
        assert_eq!(rx.try_recv().unwrap().message, "Server error");
    }

    #[test]
    fn malformed_frame_is_a_no_op() {
        let (dispatcher, session, mut rx) = dispatcher();
        assert!(dispatcher.handle_frame("{not json").is_none());
        assert!(dispatcher.handle_frame(r#"{"no_type":true}"#).is_none());
        assert!(rx.try_recv().is_err());
        assert_eq!(session.snapshot(), Default::default());
    }

    #[test]
    fn unknown_type_is_a_no_op() {
        let (dispatcher, session, mut rx) = dispatcher();
        let frame = r#"{"type":"market_halt","reason":"circuit breaker"}"#;
        assert!(dispatcher.handle_frame(frame).is_none());
        assert!(rx.try_recv().is_err());
        assert_eq!(session.snapshot(), Default::default());
    }

    #[test]
    fn notices_are_fire_and_forget_without_subscribers() {
        let session = SessionStore::new();
        let (notices, rx) = broadcast::channel(16);
        drop(rx);
        let dispatcher = Dispatcher::new(session, notices);
        // Must not panic or error with zero subscribers.
        let _ = dispatcher.handle_frame(r#"{"type":"order_filled"}"#);
    }
}
