//! The four recurring notification triggers: morning digest, evening
//! digest, deadline sweep and first-lesson alarm. Each trigger owns its
//! cadence state; none shares state with another. Every user (or
//! deadline) is processed independently, so one failing compose or send
//! never stalls the rest of the batch.
use std::error::Error;
use std::time::Duration as StdDuration;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, Timelike};
use log::{error, info};
use sqlx::SqlitePool;
use tokio::time::interval;

use crate::db;
use crate::helpers::{
    compose_deadline_reminder, compose_evening_digest, compose_first_lesson_alarm,
    compose_morning_digest, deadlines_due_within, log_all_users, nearest_deadlines,
    parse_start_time, upcoming_events,
};
use crate::message_sender::MessageSender;
use crate::models::deadline_model::Deadline;
use crate::models::timetable_model::TimetableDocument;
use crate::models::user_model::User;
use crate::models::Config;
use crate::projector::day_for_group;

const DIGEST_TICK: StdDuration = StdDuration::from_secs(60);
const SWEEP_TICK: StdDuration = StdDuration::from_secs(6 * 60 * 60);
const ALARM_TICK: StdDuration = StdDuration::from_secs(5 * 60);

/// The first-lesson alarm only runs inside this local-time window.
const ALARM_WINDOW_HOURS: (u32, u32) = (5, 15);

/// Minutes-until-start values at which the alarm fires. Minute-granular:
/// a firing can be missed if the process is down at the matching minute,
/// which is the accepted best-effort guarantee.
const ALARM_MINUTES: [i64; 2] = [15, 5];

const MORNING_SUBJECT: &str = "Расписание на сегодня";
const EVENING_SUBJECT: &str = "Расписание на завтра";
const DEADLINE_SUBJECT: &str = "Напоминание о дедлайне";
const ALARM_SUBJECT: &str = "Скоро первая пара";

/// Registers the four recurring triggers and runs them until the process
/// stops. The message-sending port is injected, the timetable document and
/// semester start are the process-wide cached-once values.
pub async fn start_scheduler<MS: MessageSender>(
    pool: &SqlitePool,
    config: &Config,
    document: &TimetableDocument,
    semester_start: NaiveDate,
    sender: &MS,
) -> () {
    info!(
        "Starting scheduler: morning digest at {}, evening digest at {}, deadline window {} h",
        config.morning_digest_time, config.evening_digest_time, config.deadline_reminder_window_hours
    );
    futures::join!(
        morning_digest_loop(pool, config, document, semester_start, sender),
        evening_digest_loop(pool, config, document, semester_start, sender),
        deadline_sweep_loop(pool, config, sender),
        first_lesson_alarm_loop(pool, config, document, semester_start, sender),
    );
}

async fn morning_digest_loop<MS: MessageSender>(
    pool: &SqlitePool,
    config: &Config,
    document: &TimetableDocument,
    semester_start: NaiveDate,
    sender: &MS,
) {
    let mut tick = interval(DIGEST_TICK);
    let mut last_fired: Option<NaiveDate> = None;
    loop {
        tick.tick().await;
        let now = Local::now();
        let today = now.date_naive();
        if now.format("%H:%M").to_string() == config.morning_digest_time
            && last_fired != Some(today)
        {
            run_morning_digest(pool, config, document, semester_start, sender, today).await;
            last_fired = Some(today);
        }
    }
}

async fn evening_digest_loop<MS: MessageSender>(
    pool: &SqlitePool,
    config: &Config,
    document: &TimetableDocument,
    semester_start: NaiveDate,
    sender: &MS,
) {
    let mut tick = interval(DIGEST_TICK);
    let mut last_fired: Option<NaiveDate> = None;
    loop {
        tick.tick().await;
        let now = Local::now();
        let today = now.date_naive();
        if now.format("%H:%M").to_string() == config.evening_digest_time
            && last_fired != Some(today)
        {
            run_evening_digest(pool, config, document, semester_start, sender, today).await;
            last_fired = Some(today);
        }
    }
}

async fn deadline_sweep_loop<MS: MessageSender>(pool: &SqlitePool, config: &Config, sender: &MS) {
    let mut tick = interval(SWEEP_TICK);
    loop {
        tick.tick().await;
        run_deadline_sweep(pool, config, sender, Local::now().naive_local()).await;
    }
}

async fn first_lesson_alarm_loop<MS: MessageSender>(
    pool: &SqlitePool,
    config: &Config,
    document: &TimetableDocument,
    semester_start: NaiveDate,
    sender: &MS,
) {
    let mut tick = interval(ALARM_TICK);
    loop {
        tick.tick().await;
        let now = Local::now().naive_local();
        let (from, to) = ALARM_WINDOW_HOURS;
        if now.hour() < from || now.hour() > to {
            continue;
        }
        run_first_lesson_alarm(pool, config, document, semester_start, sender, now).await;
    }
}

/// Morning digest: today's lessons (when a group is set) plus today's
/// subscribed events plus up to 3 nearest active deadlines, for every user
/// with notifications enabled.
pub async fn run_morning_digest<MS: MessageSender>(
    pool: &SqlitePool,
    config: &Config,
    document: &TimetableDocument,
    semester_start: NaiveDate,
    sender: &MS,
    today: NaiveDate,
) -> () {
    let users = match db::users_with_notifications_enabled(pool).await {
        Ok(users) => users,
        Err(e) => {
            error!("Morning digest could not list users: {}", e);
            return;
        }
    };
    log_all_users(&users);
    for user in users.iter() {
        if let Err(e) =
            morning_digest_for_user(pool, config, document, semester_start, sender, today, user)
                .await
        {
            error!("Morning digest failed for user {}: {}", user.id, e);
        }
    }
}

async fn morning_digest_for_user<MS: MessageSender>(
    pool: &SqlitePool,
    config: &Config,
    document: &TimetableDocument,
    semester_start: NaiveDate,
    sender: &MS,
    today: NaiveDate,
    user: &User,
) -> Result<(), Box<dyn Error>> {
    let day = user
        .group_name
        .as_ref()
        .map(|group| day_for_group(document, group, user.subgroup, semester_start, today));
    let all_events = db::get_events(pool).await?;
    let today_events = if user.events_enabled {
        upcoming_events(&all_events, 0, today)
    } else {
        Vec::new()
    };
    let all_deadlines = db::get_user_deadlines(pool, &user.id).await?;
    let nearest = nearest_deadlines(&all_deadlines, today, 3);
    let body = compose_morning_digest(user, day.as_ref(), &today_events, &nearest, semester_start);
    sender.send_message(config, user, MORNING_SUBJECT, &body)
}

/// Evening digest: tomorrow's lessons for every user with notifications
/// enabled and a group set; nothing is sent when tomorrow is a day off.
pub async fn run_evening_digest<MS: MessageSender>(
    pool: &SqlitePool,
    config: &Config,
    document: &TimetableDocument,
    semester_start: NaiveDate,
    sender: &MS,
    today: NaiveDate,
) -> () {
    let users = match db::users_with_notifications_enabled(pool).await {
        Ok(users) => users,
        Err(e) => {
            error!("Evening digest could not list users: {}", e);
            return;
        }
    };
    let tomorrow = today + Duration::days(1);
    for user in users.iter() {
        let Some(group) = &user.group_name else {
            continue;
        };
        let day = day_for_group(document, group, user.subgroup, semester_start, tomorrow);
        let Some(body) = compose_evening_digest(user, &day, semester_start) else {
            continue;
        };
        if let Err(e) = sender.send_message(config, user, EVENING_SUBJECT, &body) {
            error!("Evening digest failed for user {}: {}", user.id, e);
        }
    }
}

/// Deadline sweep: every unnotified deadline due within the reminder
/// window gets one reminder, then its `notified` latch is set. Send first,
/// latch second: a crash in between means one duplicate reminder on the
/// next sweep, the accepted at-least-once contract.
pub async fn run_deadline_sweep<MS: MessageSender>(
    pool: &SqlitePool,
    config: &Config,
    sender: &MS,
    now: NaiveDateTime,
) -> () {
    let deadlines = match db::get_unnotified_deadlines(pool).await {
        Ok(deadlines) => deadlines,
        Err(e) => {
            error!("Deadline sweep could not list deadlines: {}", e);
            return;
        }
    };
    let due = deadlines_due_within(&deadlines, config.deadline_reminder_window_hours, now);
    info!("Deadline sweep found {} deadline(s) due", due.len());
    for deadline in due {
        if let Err(e) = remind_about_deadline(pool, config, sender, deadline, now).await {
            error!("Reminder failed for deadline {}: {}", deadline.id, e);
        }
    }
}

async fn remind_about_deadline<MS: MessageSender>(
    pool: &SqlitePool,
    config: &Config,
    sender: &MS,
    deadline: &Deadline,
    now: NaiveDateTime,
) -> Result<(), Box<dyn Error>> {
    let Some(user) = db::get_user(pool, &deadline.user_id).await? else {
        return Ok(());
    };
    if !user.notify {
        return Ok(());
    }
    let body = compose_deadline_reminder(deadline, now);
    sender.send_message(config, &user, DEADLINE_SUBJECT, &body)?;
    db::mark_deadline_notified(pool, deadline.id).await?;
    Ok(())
}

/// First-lesson alarm: for every user with the alarm enabled, fire when
/// exactly 15 or exactly 5 minutes remain until the earliest lesson today.
pub async fn run_first_lesson_alarm<MS: MessageSender>(
    pool: &SqlitePool,
    config: &Config,
    document: &TimetableDocument,
    semester_start: NaiveDate,
    sender: &MS,
    now: NaiveDateTime,
) -> () {
    let users = match db::users_with_alarm_enabled(pool).await {
        Ok(users) => users,
        Err(e) => {
            error!("First-lesson alarm could not list users: {}", e);
            return;
        }
    };
    /* Minute-granular comparison: seconds are truncated away. */
    let now = match now.with_second(0).and_then(|now| now.with_nanosecond(0)) {
        Some(now) => now,
        None => now,
    };
    for user in users.iter() {
        let Some(group) = &user.group_name else {
            continue;
        };
        let day = day_for_group(document, group, user.subgroup, semester_start, now.date());
        let Some(first) = day.lessons.first() else {
            continue;
        };
        let Some(start) = parse_start_time(&first.time) else {
            continue;
        };
        let minutes = (now.date().and_time(start) - now).num_minutes();
        if !ALARM_MINUTES.contains(&minutes) {
            continue;
        }
        let body = compose_first_lesson_alarm(first, minutes);
        if let Err(e) = sender.send_message(config, user, ALARM_SUBJECT, &body) {
            error!("First-lesson alarm failed for user {}: {}", user.id, e);
        }
    }
}
