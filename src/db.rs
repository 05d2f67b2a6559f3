use log::{debug, info};
use sqlx::SqlitePool;
use std::{error::Error, path::Path};

use crate::models::deadline_model::{Deadline, Event};
use crate::models::user_model::User;
use crate::teachers;

pub const MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

pub async fn init_connection(db_path: &Path) -> Result<SqlitePool, Box<dyn Error>> {
    info!("Connecting to schedule.sqlite3 in {}", db_path.display());
    let conn_str = format!("sqlite:{}?mode=rwc", db_path.display());
    let pool = SqlitePool::connect(&conn_str).await?;

    MIGRATOR.run(&pool).await?;

    Ok(pool)
}

/* Users. Created on first interaction, updated by setting handlers,
never hard-deleted. */

pub async fn ensure_user(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    email: &str,
) -> Result<(), Box<dyn Error>> {
    debug!("Ensuring user {} exists", id);

    sqlx::query("INSERT OR IGNORE INTO users (id, name, email) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(name)
        .bind(email)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<Option<User>, Box<dyn Error>> {
    Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn set_user_institution(
    pool: &SqlitePool,
    id: &str,
    institution: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    sqlx::query("UPDATE users SET institution = $2 WHERE id = $1")
        .bind(id)
        .bind(institution)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_user_group(
    pool: &SqlitePool,
    id: &str,
    group: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    sqlx::query("UPDATE users SET group_name = $2 WHERE id = $1")
        .bind(id)
        .bind(group)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_user_subgroup(
    pool: &SqlitePool,
    id: &str,
    subgroup: Option<u8>,
) -> Result<(), Box<dyn Error>> {
    sqlx::query("UPDATE users SET subgroup = $2 WHERE id = $1")
        .bind(id)
        .bind(subgroup)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_notifications_enabled(
    pool: &SqlitePool,
    id: &str,
    enabled: bool,
) -> Result<(), Box<dyn Error>> {
    sqlx::query("UPDATE users SET notify = $2 WHERE id = $1")
        .bind(id)
        .bind(enabled)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_events_enabled(
    pool: &SqlitePool,
    id: &str,
    enabled: bool,
) -> Result<(), Box<dyn Error>> {
    sqlx::query("UPDATE users SET events_enabled = $2 WHERE id = $1")
        .bind(id)
        .bind(enabled)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_alarm_enabled(
    pool: &SqlitePool,
    id: &str,
    enabled: bool,
) -> Result<(), Box<dyn Error>> {
    sqlx::query("UPDATE users SET alarm_enabled = $2 WHERE id = $1")
        .bind(id)
        .bind(enabled)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn set_user_state(
    pool: &SqlitePool,
    id: &str,
    state: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    sqlx::query("UPDATE users SET state = $2 WHERE id = $1")
        .bind(id)
        .bind(state)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn users_with_notifications_enabled(
    pool: &SqlitePool,
) -> Result<Vec<User>, Box<dyn Error>> {
    Ok(
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE notify = 1 ORDER BY id")
            .fetch_all(pool)
            .await?,
    )
}

pub async fn users_with_alarm_enabled(pool: &SqlitePool) -> Result<Vec<User>, Box<dyn Error>> {
    Ok(sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE alarm_enabled = 1 AND notify = 1 AND group_name IS NOT NULL ORDER BY id",
    )
    .fetch_all(pool)
    .await?)
}

/* Deadlines. The `notified` latch is set exactly once by the deadline
sweep; a single atomic UPDATE keyed by id. */

pub async fn add_deadline(
    pool: &SqlitePool,
    user_id: &str,
    title: &str,
    description: Option<&str>,
    due: &str,
    created_at: &str,
) -> Result<(), Box<dyn Error>> {
    debug!("Adding deadline \"{}\" for user {}", title, user_id);

    sqlx::query(
        "INSERT INTO deadlines (user_id, title, description, due, notified, created_at) VALUES ($1, $2, $3, $4, 0, $5)",
    )
    .bind(user_id)
    .bind(title)
    .bind(description)
    .bind(due)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_user_deadlines(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<Deadline>, Box<dyn Error>> {
    Ok(sqlx::query_as::<_, Deadline>(
        "SELECT * FROM deadlines WHERE user_id = $1 ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?)
}

pub async fn get_unnotified_deadlines(pool: &SqlitePool) -> Result<Vec<Deadline>, Box<dyn Error>> {
    Ok(
        sqlx::query_as::<_, Deadline>("SELECT * FROM deadlines WHERE notified = 0 ORDER BY id")
            .fetch_all(pool)
            .await?,
    )
}

pub async fn mark_deadline_notified(pool: &SqlitePool, id: i64) -> Result<(), Box<dyn Error>> {
    debug!("Marking deadline {} as notified", id);

    sqlx::query("UPDATE deadlines SET notified = 1 WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/* Events. */

pub async fn add_event(
    pool: &SqlitePool,
    title: &str,
    date: &str,
    place: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    debug!("Adding event \"{}\" on {}", title, date);

    sqlx::query("INSERT INTO events (title, date, place) VALUES ($1, $2, $3)")
        .bind(title)
        .bind(date)
        .bind(place)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn get_events(pool: &SqlitePool) -> Result<Vec<Event>, Box<dyn Error>> {
    Ok(sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY id")
        .fetch_all(pool)
        .await?)
}

/* Favorite teachers. Stored as (user, normalized name) pairs; names are
normalized at this single write path so uniqueness is on the canonical
identity. Re-adding an existing pair is a no-op success. */

pub async fn add_favorite_teacher(
    pool: &SqlitePool,
    user_id: &str,
    teacher: &str,
) -> Result<(), Box<dyn Error>> {
    let teacher = teachers::normalize(teacher);
    debug!("Adding favorite teacher \"{}\" for user {}", teacher, user_id);

    sqlx::query("INSERT OR IGNORE INTO favorite_teachers (user_id, teacher) VALUES ($1, $2)")
        .bind(user_id)
        .bind(teacher)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn remove_favorite_teacher(
    pool: &SqlitePool,
    user_id: &str,
    teacher: &str,
) -> Result<(), Box<dyn Error>> {
    sqlx::query("DELETE FROM favorite_teachers WHERE user_id = $1 AND teacher = $2")
        .bind(user_id)
        .bind(teachers::normalize(teacher))
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn is_favorite_teacher(
    pool: &SqlitePool,
    user_id: &str,
    teacher: &str,
) -> Result<bool, Box<dyn Error>> {
    Ok(sqlx::query(
        "SELECT 1 FROM favorite_teachers WHERE user_id = $1 AND teacher = $2",
    )
    .bind(user_id)
    .bind(teachers::normalize(teacher))
    .fetch_optional(pool)
    .await?
    .is_some())
}

pub async fn get_favorite_teachers(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<String>, Box<dyn Error>> {
    use sqlx::Row;

    Ok(sqlx::query(
        "SELECT teacher FROM favorite_teachers WHERE user_id = $1 ORDER BY teacher",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|row| row.get("teacher"))
    .collect())
}
