use chrono::{DateTime, Utc};

/// A row in the `following` table: a user the tracker polls.
#[derive(Debug, Clone, PartialEq)]
pub struct Following {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}
