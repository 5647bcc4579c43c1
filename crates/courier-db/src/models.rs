/// Database row types — these map directly to SQLite rows.
/// Timestamps stay as the stored RFC 3339 strings here; the projection to
/// `courier-types` domain objects happens in `queries`, so nothing outside
/// this crate handles raw row shapes.

pub struct UserRow {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub join_at: String,
    pub last_login_at: String,
}

/// A message row joined with one counterparty's profile columns.
pub(crate) struct MessageSideRow {
    pub id: i64,
    pub body: String,
    pub sent_at: String,
    pub read_at: Option<String>,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}
