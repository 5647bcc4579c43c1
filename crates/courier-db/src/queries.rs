use crate::Database;
use crate::models::{MessageSideRow, UserRow};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use courier_types::models::{MessageDetail, Profile, ReceivedMessage, SentMessage, UserProfile};
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        first_name: &str,
        last_name: &str,
        phone: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let stamp = now.to_rfc3339();
        self.with_conn(|conn| {
            // ?6 twice: join_at and last_login_at start identical
            conn.execute(
                "INSERT INTO users (username, password, first_name, last_name, phone, join_at, last_login_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                rusqlite::params![username, password_hash, first_name, last_name, phone, stamp],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn user_exists(&self, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let hit: Option<i64> = conn
                .query_row("SELECT 1 FROM users WHERE username = ?1", [username], |row| row.get(0))
                .optional()?;
            Ok(hit.is_some())
        })
    }

    /// Returns false when no row matched (unknown username).
    pub fn touch_login(&self, username: &str, now: DateTime<Utc>) -> Result<bool> {
        let stamp = now.to_rfc3339();
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET last_login_at = ?2 WHERE username = ?1",
                rusqlite::params![username, stamp],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn list_profiles(&self) -> Result<Vec<Profile>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT username, first_name, last_name, phone FROM users")?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(Profile {
                        username: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        phone: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn get_profile(&self, username: &str) -> Result<Option<UserProfile>> {
        let row = self.with_conn(|conn| query_user_by_username(conn, username))?;

        row.map(|row| {
            Ok(UserProfile {
                join_at: parse_ts(&row.join_at)?,
                last_login_at: parse_ts(&row.last_login_at)?,
                username: row.username,
                first_name: row.first_name,
                last_name: row.last_name,
                phone: row.phone,
            })
        })
        .transpose()
    }

    // -- Messages --

    pub fn insert_message(
        &self,
        from_username: &str,
        to_username: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        let stamp = now.to_rfc3339();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (from_username, to_username, body, sent_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![from_username, to_username, body, stamp],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageDetail>> {
        self.with_conn(|conn| {
            // JOIN both participants in a single query
            let mut stmt = conn.prepare(
                "SELECT m.id, m.body, m.sent_at, m.read_at,
                        f.username, f.first_name, f.last_name, f.phone,
                        t.username, t.first_name, t.last_name, t.phone
                 FROM messages m
                 JOIN users f ON m.from_username = f.username
                 JOIN users t ON m.to_username = t.username
                 WHERE m.id = ?1",
            )?;

            let row = stmt
                .query_row([id], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        Profile {
                            username: row.get(4)?,
                            first_name: row.get(5)?,
                            last_name: row.get(6)?,
                            phone: row.get(7)?,
                        },
                        Profile {
                            username: row.get(8)?,
                            first_name: row.get(9)?,
                            last_name: row.get(10)?,
                            phone: row.get(11)?,
                        },
                    ))
                })
                .optional()?;

            row.map(|(id, body, sent_at, read_at, from_user, to_user)| {
                Ok(MessageDetail {
                    id,
                    body,
                    sent_at: parse_ts(&sent_at)?,
                    read_at: parse_ts_opt(read_at.as_deref())?,
                    from_user,
                    to_user,
                })
            })
            .transpose()
        })
    }

    /// Stamps `read_at` only if it is still NULL, then returns the effective
    /// stamp. `None` means no such message.
    pub fn mark_message_read(&self, id: i64, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        let stamp = now.to_rfc3339();
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE messages SET read_at = ?2 WHERE id = ?1 AND read_at IS NULL",
                rusqlite::params![id, stamp],
            )?;

            let read_at: Option<Option<String>> = conn
                .query_row("SELECT read_at FROM messages WHERE id = ?1", [id], |row| row.get(0))
                .optional()?;

            match read_at {
                None => Ok(None),
                Some(Some(s)) => Ok(Some(parse_ts(&s)?)),
                Some(None) => Err(anyhow!("read_at still NULL after marking message {}", id)),
            }
        })
    }

    pub fn messages_from(&self, username: &str) -> Result<Vec<SentMessage>> {
        let rows = self.with_conn(|conn| query_message_sides(conn, SENT_SQL, username))?;

        rows.into_iter()
            .map(|row| {
                Ok(SentMessage {
                    id: row.id,
                    body: row.body,
                    sent_at: parse_ts(&row.sent_at)?,
                    read_at: parse_ts_opt(row.read_at.as_deref())?,
                    to_user: Profile {
                        username: row.username,
                        first_name: row.first_name,
                        last_name: row.last_name,
                        phone: row.phone,
                    },
                })
            })
            .collect()
    }

    pub fn messages_to(&self, username: &str) -> Result<Vec<ReceivedMessage>> {
        let rows = self.with_conn(|conn| query_message_sides(conn, RECEIVED_SQL, username))?;

        rows.into_iter()
            .map(|row| {
                Ok(ReceivedMessage {
                    id: row.id,
                    body: row.body,
                    sent_at: parse_ts(&row.sent_at)?,
                    read_at: parse_ts_opt(row.read_at.as_deref())?,
                    from_user: Profile {
                        username: row.username,
                        first_name: row.first_name,
                        last_name: row.last_name,
                        phone: row.phone,
                    },
                })
            })
            .collect()
    }
}

// Each direction joins the counterparty's profile in the same statement
// (eliminates N+1 per-row lookups).
const SENT_SQL: &str = "SELECT m.id, m.body, m.sent_at, m.read_at,
        u.username, u.first_name, u.last_name, u.phone
 FROM messages m
 JOIN users u ON m.to_username = u.username
 WHERE m.from_username = ?1
 ORDER BY m.id";

const RECEIVED_SQL: &str = "SELECT m.id, m.body, m.sent_at, m.read_at,
        u.username, u.first_name, u.last_name, u.phone
 FROM messages m
 JOIN users u ON m.from_username = u.username
 WHERE m.to_username = ?1
 ORDER BY m.id";

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT username, password, first_name, last_name, phone, join_at, last_login_at
         FROM users WHERE username = ?1",
    )?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                username: row.get(0)?,
                password: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
                phone: row.get(4)?,
                join_at: row.get(5)?,
                last_login_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_message_sides(conn: &Connection, sql: &str, username: &str) -> Result<Vec<MessageSideRow>> {
    let mut stmt = conn.prepare(sql)?;

    let rows = stmt
        .query_map([username], |row| {
            Ok(MessageSideRow {
                id: row.get(0)?,
                body: row.get(1)?,
                sent_at: row.get(2)?,
                read_at: row.get(3)?,
                username: row.get(4)?,
                first_name: row.get(5)?,
                last_name: row.get(6)?,
                phone: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| anyhow!("bad timestamp {:?}: {}", s, e))
}

fn parse_ts_opt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    s.map(parse_ts).transpose()
}
