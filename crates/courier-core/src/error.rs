use thiserror::Error;

/// Everything the core can fail with. A wrong password is NOT in here:
/// `AuthService::authenticate` reports it as a normal `Ok(false)`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: &'static str,
    },

    #[error("username already taken: {0}")]
    DuplicateUser(String),

    #[error("no such user: {0}")]
    UserNotFound(String),

    #[error("no such message: {0}")]
    MessageNotFound(i64),

    #[error("storage failure: {0}")]
    Store(#[from] anyhow::Error),
}
