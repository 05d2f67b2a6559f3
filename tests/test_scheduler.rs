use std::error::Error;
use std::path::Path;

use campus_tt_notify::db::{
    add_deadline, add_event, ensure_user, get_user_deadlines, set_alarm_enabled,
    set_notifications_enabled, set_user_group, MIGRATOR,
};
use campus_tt_notify::helpers::generate_email;
use campus_tt_notify::message_sender::MessageSender;
use campus_tt_notify::models::timetable_model::TimetableDocument;
use campus_tt_notify::models::{user_model::User, Config};
use campus_tt_notify::scheduler::{
    run_deadline_sweep, run_evening_digest, run_first_lesson_alarm, run_morning_digest,
};
use campus_tt_notify::timetable::get_timetable_document;
use chrono::{NaiveDate, NaiveDateTime};
use figment::{
    providers::{Format, Json},
    Figment,
};
use lettre::transport::stub::StubTransport;
use lettre::Transport;
use mailparse::parse_mail;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Delivers through lettre's stub transport so tests can inspect every
/// message that the scheduler produced.
struct TestSender {
    transport: StubTransport,
}

impl MessageSender for TestSender {
    fn send_message(
        &self,
        config: &Config,
        user: &User,
        subject: &str,
        body: &str,
    ) -> Result<(), Box<dyn Error>> {
        let email = generate_email(config, user, subject, body)?;
        let _ = self.transport.send(&email);
        Ok(())
    }
}

async fn test_pool() -> SqlitePool {
    // a single connection, otherwise every pooled connection would get its
    // own empty in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    pool
}

fn test_config() -> Config {
    Figment::new()
        .merge(Json::file("example.config.json"))
        .extract()
        .unwrap()
}

fn test_sender() -> TestSender {
    TestSender {
        transport: StubTransport::new_ok(),
    }
}

fn load_document() -> TimetableDocument {
    get_timetable_document(Path::new("tests/test.timetable.full_tree.json")).unwrap()
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    date(year, month, day).and_hms_opt(hour, minute, 0).unwrap()
}

fn semester_start() -> NaiveDate {
    date(2025, 9, 1)
}

fn body_of(raw_message: &str) -> String {
    parse_mail(raw_message.as_bytes())
        .unwrap()
        .get_body()
        .unwrap()
}

#[tokio::test]
async fn deadline_sweep_sends_once_and_latches() {
    let pool = test_pool().await;
    let config = test_config();
    let sender = test_sender();
    ensure_user(&pool, "u1", "Энди Уорхол", "campbellsoupthebest@gmail.com")
        .await
        .unwrap();
    add_deadline(
        &pool,
        "u1",
        "Сдать курсовую",
        None,
        "16.09.2025",
        "2025-09-10 12:00:00",
    )
    .await
    .unwrap();

    // 20 hours before the due moment, window is 24 hours
    let now = at(2025, 9, 15, 4, 0);
    run_deadline_sweep(&pool, &config, &sender, now).await;
    run_deadline_sweep(&pool, &config, &sender, now).await;

    let messages = sender.transport.messages();
    assert_eq!(messages.len(), 1);
    let body = body_of(&messages[0].1);
    assert!(body.contains("Сдать курсовую"));
    assert!(body.contains("через 20 ч."));

    let deadlines = get_user_deadlines(&pool, "u1").await.unwrap();
    assert!(deadlines[0].notified);
}

#[tokio::test]
async fn deadline_sweep_skips_malformed_due_dates() {
    let pool = test_pool().await;
    let config = test_config();
    let sender = test_sender();
    ensure_user(&pool, "u1", "Энди Уорхол", "campbellsoupthebest@gmail.com")
        .await
        .unwrap();
    add_deadline(&pool, "u1", "Без срока", None, "когда-нибудь", "2025-09-10 12:00:00")
        .await
        .unwrap();

    run_deadline_sweep(&pool, &config, &sender, at(2025, 9, 15, 4, 0)).await;

    assert!(sender.transport.messages().is_empty());
    let deadlines = get_user_deadlines(&pool, "u1").await.unwrap();
    assert!(!deadlines[0].notified);
}

#[tokio::test]
async fn deadline_sweep_ignores_deadlines_outside_the_window() {
    let pool = test_pool().await;
    let config = test_config();
    let sender = test_sender();
    ensure_user(&pool, "u1", "Энди Уорхол", "campbellsoupthebest@gmail.com")
        .await
        .unwrap();
    add_deadline(&pool, "u1", "Далёкий дедлайн", None, "30.12.2025", "2025-09-10 12:00:00")
        .await
        .unwrap();
    add_deadline(&pool, "u1", "Прошедший дедлайн", None, "01.09.2025", "2025-08-20 12:00:00")
        .await
        .unwrap();

    run_deadline_sweep(&pool, &config, &sender, at(2025, 9, 15, 4, 0)).await;

    assert!(sender.transport.messages().is_empty());
}

#[tokio::test]
async fn deadline_sweep_respects_the_notifications_toggle() {
    let pool = test_pool().await;
    let config = test_config();
    let sender = test_sender();
    ensure_user(&pool, "u1", "Энди Уорхол", "campbellsoupthebest@gmail.com")
        .await
        .unwrap();
    set_notifications_enabled(&pool, "u1", false).await.unwrap();
    add_deadline(
        &pool,
        "u1",
        "Сдать курсовую",
        None,
        "16.09.2025",
        "2025-09-10 12:00:00",
    )
    .await
    .unwrap();

    run_deadline_sweep(&pool, &config, &sender, at(2025, 9, 15, 4, 0)).await;

    assert!(sender.transport.messages().is_empty());
}

#[tokio::test]
async fn morning_digest_collects_lessons_events_and_deadlines() {
    let pool = test_pool().await;
    let config = test_config();
    let sender = test_sender();
    let document = load_document();
    ensure_user(&pool, "u1", "Энди Уорхол", "campbellsoupthebest@gmail.com")
        .await
        .unwrap();
    set_user_group(&pool, "u1", Some("ИС-21")).await.unwrap();
    add_event(&pool, "День первокурсника", "15.09.2025", Some("актовый зал"))
        .await
        .unwrap();
    add_event(&pool, "Хакатон", "20.09.2025", None).await.unwrap();
    for (title, due) in [
        ("Лабораторная по БД", "19.09.2025"),
        ("Сдать курсовую", "16.09.2025"),
        ("Эссе по философии", "17.09.2025"),
        ("Отчёт по практике", "25.09.2025"),
    ] {
        add_deadline(&pool, "u1", title, None, due, "2025-09-10 12:00:00")
            .await
            .unwrap();
    }

    // Monday of week 3, an odd week
    run_morning_digest(
        &pool,
        &config,
        &document,
        semester_start(),
        &sender,
        date(2025, 9, 15),
    )
    .await;

    let messages = sender.transport.messages();
    assert_eq!(messages.len(), 1);
    let body = body_of(&messages[0].1);
    assert!(body.contains("Доброе утро, Энди Уорхол!"));
    assert!(body.contains("нечётная неделя №3"));
    assert!(body.contains("Математический анализ"));
    assert!(body.contains("Базы данных"));
    // the substitution dated exactly this Monday
    assert!(body.contains("замена"));
    // only the event of this day
    assert!(body.contains("День первокурсника"));
    assert!(!body.contains("Хакатон"));
    // three nearest deadlines out of four
    assert!(body.contains("Сдать курсовую"));
    assert!(body.contains("Эссе по философии"));
    assert!(body.contains("Лабораторная по БД"));
    assert!(!body.contains("Отчёт по практике"));
}

#[tokio::test]
async fn morning_digest_without_a_group_still_delivers() {
    let pool = test_pool().await;
    let config = test_config();
    let sender = test_sender();
    let document = load_document();
    ensure_user(&pool, "u1", "Энди Уорхол", "campbellsoupthebest@gmail.com")
        .await
        .unwrap();
    add_deadline(
        &pool,
        "u1",
        "Сдать курсовую",
        None,
        "16.09.2025",
        "2025-09-10 12:00:00",
    )
    .await
    .unwrap();

    run_morning_digest(
        &pool,
        &config,
        &document,
        semester_start(),
        &sender,
        date(2025, 9, 15),
    )
    .await;

    let messages = sender.transport.messages();
    assert_eq!(messages.len(), 1);
    let body = body_of(&messages[0].1);
    assert!(body.contains("Сдать курсовую"));
    assert!(!body.contains("Расписание на сегодня"));
}

#[tokio::test]
async fn evening_digest_sends_tomorrows_lessons() {
    let pool = test_pool().await;
    let config = test_config();
    let sender = test_sender();
    let document = load_document();
    ensure_user(&pool, "u1", "Энди Уорхол", "campbellsoupthebest@gmail.com")
        .await
        .unwrap();
    set_user_group(&pool, "u1", Some("ИС-21")).await.unwrap();

    // tomorrow is the Tuesday of week 3, where the pinned special course runs
    run_evening_digest(
        &pool,
        &config,
        &document,
        semester_start(),
        &sender,
        date(2025, 9, 15),
    )
    .await;

    let messages = sender.transport.messages();
    assert_eq!(messages.len(), 1);
    assert!(body_of(&messages[0].1).contains("Спецкурс по анализу данных"));
}

#[tokio::test]
async fn evening_digest_stays_silent_before_a_day_off() {
    let pool = test_pool().await;
    let config = test_config();
    let sender = test_sender();
    let document = load_document();
    ensure_user(&pool, "u1", "Энди Уорхол", "campbellsoupthebest@gmail.com")
        .await
        .unwrap();
    set_user_group(&pool, "u1", Some("ИС-21")).await.unwrap();

    // tomorrow is the Tuesday of week 4, an even week with no lessons
    run_evening_digest(
        &pool,
        &config,
        &document,
        semester_start(),
        &sender,
        date(2025, 9, 22),
    )
    .await;

    assert!(sender.transport.messages().is_empty());
}

#[tokio::test]
async fn first_lesson_alarm_fires_at_exactly_fifteen_and_five_minutes() {
    let pool = test_pool().await;
    let config = test_config();
    let sender = test_sender();
    let document = load_document();
    ensure_user(&pool, "u1", "Энди Уорхол", "campbellsoupthebest@gmail.com")
        .await
        .unwrap();
    set_user_group(&pool, "u1", Some("ИС-21")).await.unwrap();
    set_alarm_enabled(&pool, "u1", true).await.unwrap();

    // the earliest Monday lesson starts at 08:00
    for (hour, minute) in [(7, 30), (7, 44), (7, 46), (8, 0)] {
        run_first_lesson_alarm(
            &pool,
            &config,
            &document,
            semester_start(),
            &sender,
            at(2025, 9, 15, hour, minute),
        )
        .await;
    }
    assert!(sender.transport.messages().is_empty());

    run_first_lesson_alarm(
        &pool,
        &config,
        &document,
        semester_start(),
        &sender,
        at(2025, 9, 15, 7, 45),
    )
    .await;
    run_first_lesson_alarm(
        &pool,
        &config,
        &document,
        semester_start(),
        &sender,
        at(2025, 9, 15, 7, 55),
    )
    .await;

    let messages = sender.transport.messages();
    assert_eq!(messages.len(), 2);
    let first = body_of(&messages[0].1);
    assert!(first.contains("Через 15 мин."));
    assert!(first.contains("Математический анализ"));
    assert!(first.contains("1-205"));
    let second = body_of(&messages[1].1);
    assert!(second.contains("Через 5 мин."));
}

#[tokio::test]
async fn first_lesson_alarm_needs_the_alarm_toggle() {
    let pool = test_pool().await;
    let config = test_config();
    let sender = test_sender();
    let document = load_document();
    ensure_user(&pool, "u1", "Энди Уорхол", "campbellsoupthebest@gmail.com")
        .await
        .unwrap();
    set_user_group(&pool, "u1", Some("ИС-21")).await.unwrap();

    run_first_lesson_alarm(
        &pool,
        &config,
        &document,
        semester_start(),
        &sender,
        at(2025, 9, 15, 7, 45),
    )
    .await;

    assert!(sender.transport.messages().is_empty());
}
