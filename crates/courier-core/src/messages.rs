use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use tracing::debug;

use courier_db::Database;
use courier_types::models::{MessageDetail, ReadReceipt};

use crate::error::CoreError;

/// The composition path: creating messages and tracking the one-shot
/// `read_at` transition. Messages are never deleted or edited.
pub struct MessageService {
    db: Arc<Database>,
}

impl MessageService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Persists one message with `sent_at = now()` and `read_at` unset, then
    /// returns it joined with both participant cards.
    pub fn send(&self, from: &str, to: &str, body: &str) -> Result<MessageDetail, CoreError> {
        if body.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "body",
                reason: "must not be empty",
            });
        }
        for username in [from, to] {
            if !self.db.user_exists(username)? {
                return Err(CoreError::UserNotFound(username.to_string()));
            }
        }

        let id = self.db.insert_message(from, to, body, Utc::now())?;
        debug!("Message {} sent {} -> {}", id, from, to);

        self.db
            .get_message(id)?
            .ok_or_else(|| CoreError::Store(anyhow!("message {} missing after insert", id)))
    }

    /// First call stamps `read_at = now()`; later calls return the original
    /// stamp unchanged.
    pub fn mark_read(&self, id: i64) -> Result<ReadReceipt, CoreError> {
        match self.db.mark_message_read(id, Utc::now())? {
            Some(read_at) => Ok(ReadReceipt { id, read_at }),
            None => Err(CoreError::MessageNotFound(id)),
        }
    }

    pub fn get(&self, id: i64) -> Result<MessageDetail, CoreError> {
        self.db
            .get_message(id)?
            .ok_or(CoreError::MessageNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthService, NewUser};
    use crate::config::Config;

    fn fixture() -> (AuthService, MessageService) {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let config = Config {
            jwt_secret: "test-secret".into(),
            hash_cost: 1,
        };
        (
            AuthService::new(db.clone(), &config).unwrap(),
            MessageService::new(db),
        )
    }

    fn register(auth: &AuthService, username: &str) {
        auth.register(NewUser {
            username,
            password: "pw-for-tests",
            first_name: "Test",
            last_name: "User",
            phone: "555-0100",
        })
        .unwrap();
    }

    #[test]
    fn send_and_get() {
        let (auth, messages) = fixture();
        register(&auth, "alice");
        register(&auth, "bob");

        let sent = messages.send("alice", "bob", "hi").unwrap();
        assert_eq!(sent.from_user.username, "alice");
        assert_eq!(sent.to_user.username, "bob");
        assert_eq!(sent.body, "hi");
        assert!(sent.read_at.is_none());

        let fetched = messages.get(sent.id).unwrap();
        assert_eq!(fetched.body, "hi");
        assert_eq!(fetched.sent_at, sent.sent_at);
    }

    #[test]
    fn message_ids_increase() {
        let (auth, messages) = fixture();
        register(&auth, "alice");
        register(&auth, "bob");

        let first = messages.send("alice", "bob", "one").unwrap();
        let second = messages.send("bob", "alice", "two").unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn send_requires_both_participants() {
        let (auth, messages) = fixture();
        register(&auth, "alice");

        assert!(matches!(
            messages.send("alice", "carol", "hi"),
            Err(CoreError::UserNotFound(name)) if name == "carol"
        ));
        assert!(matches!(
            messages.send("carol", "alice", "hi"),
            Err(CoreError::UserNotFound(name)) if name == "carol"
        ));
    }

    #[test]
    fn empty_body_rejected() {
        let (auth, messages) = fixture();
        register(&auth, "alice");
        register(&auth, "bob");

        assert!(matches!(
            messages.send("alice", "bob", "   "),
            Err(CoreError::Validation { field: "body", .. })
        ));
    }

    #[test]
    fn mark_read_stamps_once() {
        let (auth, messages) = fixture();
        register(&auth, "alice");
        register(&auth, "bob");

        let sent = messages.send("alice", "bob", "hi").unwrap();
        assert!(sent.sent_at <= Utc::now());

        let first = messages.mark_read(sent.id).unwrap();
        assert!(first.read_at >= sent.sent_at);

        // Second mark must not move the stamp.
        let second = messages.mark_read(sent.id).unwrap();
        assert_eq!(second.read_at, first.read_at);

        let fetched = messages.get(sent.id).unwrap();
        assert_eq!(fetched.read_at, Some(first.read_at));
    }

    #[test]
    fn unknown_message_id() {
        let (_, messages) = fixture();
        assert!(matches!(messages.get(99), Err(CoreError::MessageNotFound(99))));
        assert!(matches!(
            messages.mark_read(99),
            Err(CoreError::MessageNotFound(99))
        ));
    }
}
