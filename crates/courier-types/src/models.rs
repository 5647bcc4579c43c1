use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's public card, the shape other users are allowed to see.
/// The password hash never leaves the store layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Full profile including the lifecycle timestamps. Still hash-free.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub join_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

/// Result of stamping a login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginStamp {
    pub username: String,
    pub last_login_at: DateTime<Utc>,
}

/// A message as seen from the sender's side, joined with the recipient's card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentMessage {
    pub id: i64,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub to_user: Profile,
}

/// A message as seen from the recipient's side, joined with the sender's card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivedMessage {
    pub id: i64,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub from_user: Profile,
}

/// A single message joined with both participant cards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDetail {
    pub id: i64,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub from_user: Profile,
    pub to_user: Profile,
}

/// Acknowledgement that a message has been marked read.
/// `read_at` is set exactly once; repeated marks return the original stamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub id: i64,
    pub read_at: DateTime<Utc>,
}
