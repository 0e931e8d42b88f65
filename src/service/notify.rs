use rusqlite::Connection;
use serde_json::Value;
use tracing::{debug, warn};

use crate::db::device_repo;

/// Per-token outcome reported by the push provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Failed(String),
    /// The provider reported the token as permanently dead; it must be
    /// pruned from storage.
    InvalidToken,
}

/// Push-notification provider. The real provider (FCM or similar) lives
/// outside this crate; the core only depends on this contract.
pub trait Notifier {
    fn send(&self, tokens: &[String], title: &str, body: &str, data: &Value) -> Vec<Delivery>;
}

/// Default sink: logs the dispatch and reports every token as sent.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, tokens: &[String], title: &str, body: &str, _data: &Value) -> Vec<Delivery> {
        debug!(recipients = tokens.len(), title, body, "notification dispatched");
        tokens.iter().map(|_| Delivery::Sent).collect()
    }
}

/// Best-effort dispatch to every device a user has registered. Failures are
/// logged and swallowed; tokens the provider reports as permanently invalid
/// are pruned. Never returns an error: notification trouble must not roll
/// back the state transition that triggered it.
pub fn notify_user(
    conn: &Connection,
    notifier: &dyn Notifier,
    user_id: &str,
    title: &str,
    body: &str,
    data: &Value,
) {
    let tokens = match device_repo::tokens_for_user(conn, user_id) {
        Ok(tokens) => tokens,
        Err(e) => {
            warn!(user_id, error = %e, "failed to load device tokens");
            return;
        }
    };
    if tokens.is_empty() {
        return;
    }

    let results = notifier.send(&tokens, title, body, data);
    for (token, result) in tokens.iter().zip(results) {
        match result {
            Delivery::Sent => {
                if let Err(e) = device_repo::touch(conn, token) {
                    warn!(error = %e, "failed to update device token timestamp");
                }
            }
            Delivery::Failed(reason) => {
                warn!(user_id, reason = %reason, "notification delivery failed");
            }
            Delivery::InvalidToken => {
                debug!(user_id, "pruning permanently invalid device token");
                if let Err(e) = device_repo::unregister(conn, token) {
                    warn!(error = %e, "failed to prune invalid device token");
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) struct StaticNotifier {
    pub results: Vec<Delivery>,
}

#[cfg(test)]
impl Notifier for StaticNotifier {
    fn send(&self, tokens: &[String], _title: &str, _body: &str, _data: &Value) -> Vec<Delivery> {
        assert_eq!(tokens.len(), self.results.len());
        self.results.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connection, device_repo, user_repo};
    use serde_json::json;

    fn conn_with_user() -> Connection {
        let conn = connection::open_test_db();
        user_repo::create_user(&conn, "u1", "alice").unwrap();
        conn
    }

    #[test]
    fn test_invalid_tokens_are_pruned() {
        let conn = conn_with_user();
        device_repo::register(&conn, "d1", "tok-ok", "android", "u1").unwrap();
        device_repo::register(&conn, "d2", "tok-dead", "ios", "u1").unwrap();

        let notifier = StaticNotifier {
            results: vec![Delivery::Sent, Delivery::InvalidToken],
        };
        notify_user(&conn, &notifier, "u1", "t", "b", &json!({}));

        let remaining = device_repo::tokens_for_user(&conn, "u1").unwrap();
        assert_eq!(remaining, vec!["tok-ok".to_string()]);
    }

    #[test]
    fn test_failed_delivery_keeps_token() {
        let conn = conn_with_user();
        device_repo::register(&conn, "d1", "tok", "android", "u1").unwrap();

        let notifier = StaticNotifier {
            results: vec![Delivery::Failed("timeout".into())],
        };
        notify_user(&conn, &notifier, "u1", "t", "b", &json!({}));

        assert_eq!(device_repo::tokens_for_user(&conn, "u1").unwrap().len(), 1);
    }
}
