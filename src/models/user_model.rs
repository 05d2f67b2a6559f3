use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A model for describing users of the service.
/// Consists of:
/// 1. Opaque user id, assigned by the chat platform
/// 2. User's name and email address to which they will receive letters
/// 3. Chosen institution, group and subgroup (no subgroup = show all subgroups)
/// 4. Notification, events-subscription and first-lesson-alarm toggles
/// 5. Transient interaction state, e.g. "awaiting deadline text"
#[derive(Debug, Clone, Deserialize, Serialize, FromRow, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub institution: Option<String>,
    pub group_name: Option<String>,
    pub subgroup: Option<u8>,
    pub notify: bool,
    pub events_enabled: bool,
    pub alarm_enabled: bool,
    pub state: Option<String>,
}
