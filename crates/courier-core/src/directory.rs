use std::sync::Arc;

use courier_db::Database;
use courier_types::models::{Profile, ReceivedMessage, SentMessage, UserProfile};

use crate::error::CoreError;

/// Read access to user records and message history. `UserNotFound` is
/// reserved for usernames that do not exist at all; an existing user with
/// nothing to list gets an empty vec, not an error.
pub struct UserDirectory {
    db: Arc<Database>,
}

impl UserDirectory {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Every user's public card, store-defined order. Empty is valid.
    pub fn all(&self) -> Result<Vec<Profile>, CoreError> {
        Ok(self.db.list_profiles()?)
    }

    pub fn get(&self, username: &str) -> Result<UserProfile, CoreError> {
        self.db
            .get_profile(username)?
            .ok_or_else(|| CoreError::UserNotFound(username.to_string()))
    }

    /// Messages sent by `username`, each joined with the recipient's card.
    pub fn messages_from(&self, username: &str) -> Result<Vec<SentMessage>, CoreError> {
        if !self.db.user_exists(username)? {
            return Err(CoreError::UserNotFound(username.to_string()));
        }
        Ok(self.db.messages_from(username)?)
    }

    /// Messages received by `username`, each joined with the sender's card.
    pub fn messages_to(&self, username: &str) -> Result<Vec<ReceivedMessage>, CoreError> {
        if !self.db.user_exists(username)? {
            return Err(CoreError::UserNotFound(username.to_string()));
        }
        Ok(self.db.messages_to(username)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthService, NewUser};
    use crate::config::Config;
    use crate::messages::MessageService;

    struct Fixture {
        auth: AuthService,
        directory: UserDirectory,
        messages: MessageService,
    }

    fn fixture() -> Fixture {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let config = Config {
            jwt_secret: "test-secret".into(),
            hash_cost: 1,
        };
        Fixture {
            auth: AuthService::new(db.clone(), &config).unwrap(),
            directory: UserDirectory::new(db.clone()),
            messages: MessageService::new(db),
        }
    }

    fn register(auth: &AuthService, username: &str, first_name: &str) {
        auth.register(NewUser {
            username,
            password: "pw-for-tests",
            first_name,
            last_name: "Tester",
            phone: "555-0100",
        })
        .unwrap();
    }

    #[test]
    fn empty_directory_is_not_an_error() {
        let fx = fixture();
        assert!(fx.directory.all().unwrap().is_empty());
    }

    #[test]
    fn all_lists_public_cards_only() {
        let fx = fixture();
        register(&fx.auth, "alice", "Alice");
        register(&fx.auth, "bob", "Bob");

        let cards = fx.directory.all().unwrap();
        assert_eq!(cards.len(), 2);

        let mut names: Vec<_> = cards.iter().map(|c| c.username.as_str()).collect();
        names.sort();
        assert_eq!(names, ["alice", "bob"]);
    }

    #[test]
    fn get_returns_the_stored_profile() {
        let fx = fixture();
        register(&fx.auth, "alice", "Alice");

        let profile = fx.directory.get("alice").unwrap();
        assert_eq!(profile.username, "alice");
        assert_eq!(profile.first_name, "Alice");
        assert_eq!(profile.phone, "555-0100");
        assert!(profile.last_login_at >= profile.join_at);
    }

    #[test]
    fn get_missing_user() {
        let fx = fixture();
        assert!(matches!(
            fx.directory.get("carol"),
            Err(CoreError::UserNotFound(name)) if name == "carol"
        ));
    }

    #[test]
    fn message_appears_on_both_sides_and_nowhere_else() {
        let fx = fixture();
        register(&fx.auth, "alice", "Alice");
        register(&fx.auth, "bob", "Bob");
        register(&fx.auth, "dora", "Dora");

        let sent = fx.messages.send("alice", "bob", "hi").unwrap();

        let from_alice = fx.directory.messages_from("alice").unwrap();
        assert_eq!(from_alice.len(), 1);
        assert_eq!(from_alice[0].id, sent.id);
        assert_eq!(from_alice[0].body, "hi");
        assert_eq!(from_alice[0].to_user.username, "bob");
        assert!(from_alice[0].read_at.is_none());

        let to_bob = fx.directory.messages_to("bob").unwrap();
        assert_eq!(to_bob.len(), 1);
        assert_eq!(to_bob[0].id, sent.id);
        assert_eq!(to_bob[0].from_user.username, "alice");

        // Nowhere else: not in alice's inbox, bob's outbox, or dora's either side.
        assert!(fx.directory.messages_to("alice").unwrap().is_empty());
        assert!(fx.directory.messages_from("bob").unwrap().is_empty());
        assert!(fx.directory.messages_from("dora").unwrap().is_empty());
        assert!(fx.directory.messages_to("dora").unwrap().is_empty());
    }

    #[test]
    fn no_messages_is_an_empty_vec_for_an_existing_user() {
        let fx = fixture();
        register(&fx.auth, "alice", "Alice");

        assert!(fx.directory.messages_from("alice").unwrap().is_empty());
        assert!(fx.directory.messages_to("alice").unwrap().is_empty());
    }

    #[test]
    fn message_queries_reject_unknown_usernames() {
        let fx = fixture();
        assert!(matches!(
            fx.directory.messages_from("carol"),
            Err(CoreError::UserNotFound(_))
        ));
        assert!(matches!(
            fx.directory.messages_to("carol"),
            Err(CoreError::UserNotFound(_))
        ));
    }

    #[test]
    fn listing_does_not_mark_messages_read() {
        let fx = fixture();
        register(&fx.auth, "alice", "Alice");
        register(&fx.auth, "bob", "Bob");
        fx.messages.send("alice", "bob", "hi").unwrap();

        fx.directory.messages_to("bob").unwrap();
        let again = fx.directory.messages_to("bob").unwrap();
        assert!(again[0].read_at.is_none());
    }
}
