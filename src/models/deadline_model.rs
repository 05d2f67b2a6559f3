use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A deadline owned by one user. The due date is kept as the raw string the
/// user typed ("DD.MM", "DD.MM.YYYY" or ISO) and parsed where filtered.
/// The `notified` latch is set exactly once by the deadline sweep and never
/// reset.
#[derive(Debug, Clone, Deserialize, Serialize, FromRow, PartialEq)]
pub struct Deadline {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub due: String,
    pub notified: bool,
    pub created_at: String,
}

/// A campus-wide event with a "DD.MM.YYYY" date.
#[derive(Debug, Clone, Deserialize, Serialize, FromRow, PartialEq)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub date: String,
    pub place: Option<String>,
}
