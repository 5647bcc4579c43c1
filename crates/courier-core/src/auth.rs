use std::sync::Arc;

use anyhow::anyhow;
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::Utc;
use tracing::info;

use courier_db::Database;
use courier_types::models::{LoginStamp, UserProfile};

use crate::config::Config;
use crate::error::CoreError;

/// Registration input. Everything the caller supplies; timestamps and the
/// password hash are produced here.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: &'a str,
}

/// Credential registration and verification. Stateless between calls; all
/// durable state lives in the injected store handle.
pub struct AuthService {
    db: Arc<Database>,
    hasher: Argon2<'static>,
    dummy_hash: String,
}

impl AuthService {
    pub fn new(db: Arc<Database>, config: &Config) -> Result<Self, CoreError> {
        let params = Params::new(
            Params::DEFAULT_M_COST,
            config.hash_cost,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| CoreError::Store(anyhow!("argon2 params: {}", e)))?;
        let hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        // Verified whenever the username does not exist, so an unknown user
        // and a wrong password cost the same amount of time.
        let salt = SaltString::generate(&mut OsRng);
        let dummy_hash = hasher
            .hash_password(b"courier-dummy-credential", &salt)
            .map_err(|e| CoreError::Store(anyhow!("argon2 hash: {}", e)))?
            .to_string();

        Ok(Self {
            db,
            hasher,
            dummy_hash,
        })
    }

    /// Creates the user with `join_at == last_login_at` and returns the
    /// profile — never the hash, never the plaintext. A username collision
    /// (including a register/register race) surfaces as `DuplicateUser`
    /// off the store's primary-key constraint.
    pub fn register(&self, new: NewUser<'_>) -> Result<UserProfile, CoreError> {
        if new.username.is_empty() {
            return Err(CoreError::Validation {
                field: "username",
                reason: "must not be empty",
            });
        }
        if new.username.len() > 32 {
            return Err(CoreError::Validation {
                field: "username",
                reason: "must be at most 32 characters",
            });
        }
        if new.password.is_empty() {
            return Err(CoreError::Validation {
                field: "password",
                reason: "must not be empty",
            });
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self
            .hasher
            .hash_password(new.password.as_bytes(), &salt)
            .map_err(|e| CoreError::Store(anyhow!("argon2 hash: {}", e)))?
            .to_string();

        let now = Utc::now();
        if let Err(e) = self.db.create_user(
            new.username,
            &password_hash,
            new.first_name,
            new.last_name,
            new.phone,
            now,
        ) {
            if courier_db::is_unique_violation(&e) {
                return Err(CoreError::DuplicateUser(new.username.to_string()));
            }
            return Err(CoreError::Store(e));
        }

        info!("Registered user {}", new.username);
        Ok(UserProfile {
            username: new.username.to_string(),
            first_name: new.first_name.to_string(),
            last_name: new.last_name.to_string(),
            phone: new.phone.to_string(),
            join_at: now,
            last_login_at: now,
        })
    }

    /// Read-only credential check. `Ok(false)` covers both unknown username
    /// and wrong password; errors mean the check could not be performed.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<bool, CoreError> {
        let user = self.db.get_user_by_username(username)?;

        let stored = match &user {
            Some(row) => row.password.as_str(),
            None => self.dummy_hash.as_str(),
        };

        let parsed = PasswordHash::new(stored)
            .map_err(|e| CoreError::Store(anyhow!("corrupt password hash for {:?}: {}", username, e)))?;
        let verified = self
            .hasher
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();

        Ok(verified && user.is_some())
    }

    /// Stamps `last_login_at = now()`. Call only after a successful
    /// `authenticate` or `register`; concurrent stamps are last-writer-wins.
    pub fn touch_login(&self, username: &str) -> Result<LoginStamp, CoreError> {
        let now = Utc::now();
        if !self.db.touch_login(username, now)? {
            return Err(CoreError::UserNotFound(username.to_string()));
        }

        Ok(LoginStamp {
            username: username.to_string(),
            last_login_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let config = Config {
            jwt_secret: "test-secret".into(),
            hash_cost: 1,
        };
        AuthService::new(db, &config).unwrap()
    }

    fn alice<'a>() -> NewUser<'a> {
        NewUser {
            username: "alice",
            password: "secret1",
            first_name: "Alice",
            last_name: "Ames",
            phone: "555-0101",
        }
    }

    #[test]
    fn register_then_authenticate() {
        let auth = service();
        let profile = auth.register(alice()).unwrap();

        assert_eq!(profile.username, "alice");
        assert_eq!(profile.join_at, profile.last_login_at);

        assert!(auth.authenticate("alice", "secret1").unwrap());
        assert!(!auth.authenticate("alice", "wrong").unwrap());
    }

    #[test]
    fn unknown_user_is_false_not_error() {
        let auth = service();
        assert!(!auth.authenticate("carol", "x").unwrap());
    }

    #[test]
    fn stored_hash_is_not_the_plaintext() {
        let auth = service();
        auth.register(alice()).unwrap();

        let row = auth.db.get_user_by_username("alice").unwrap().unwrap();
        assert_ne!(row.password, "secret1");
        assert!(row.password.starts_with("$argon2id$"));
    }

    #[test]
    fn duplicate_username_rejected_and_first_row_untouched() {
        let auth = service();
        auth.register(alice()).unwrap();

        let second = NewUser {
            password: "other",
            first_name: "Impostor",
            ..alice()
        };
        match auth.register(second) {
            Err(CoreError::DuplicateUser(name)) => assert_eq!(name, "alice"),
            other => panic!("expected DuplicateUser, got {:?}", other.map(|p| p.username)),
        }

        let row = auth.db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(row.first_name, "Alice");
        assert!(auth.authenticate("alice", "secret1").unwrap());
    }

    #[test]
    fn empty_fields_rejected() {
        let auth = service();

        let no_name = NewUser { username: "", ..alice() };
        assert!(matches!(
            auth.register(no_name),
            Err(CoreError::Validation { field: "username", .. })
        ));

        let no_pass = NewUser { password: "", ..alice() };
        assert!(matches!(
            auth.register(no_pass),
            Err(CoreError::Validation { field: "password", .. })
        ));
    }

    #[test]
    fn touch_login_advances_the_stamp() {
        let auth = service();
        let profile = auth.register(alice()).unwrap();

        let first = auth.touch_login("alice").unwrap();
        assert!(first.last_login_at >= profile.join_at);

        // Repeatable without an auth in between; still just re-stamps.
        let second = auth.touch_login("alice").unwrap();
        assert!(second.last_login_at >= first.last_login_at);
    }

    #[test]
    fn touch_login_unknown_user() {
        let auth = service();
        assert!(matches!(
            auth.touch_login("carol"),
            Err(CoreError::UserNotFound(name)) if name == "carol"
        ));
    }
}
