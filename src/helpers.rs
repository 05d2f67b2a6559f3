//! Parsing and formatting glue: user-typed date strings, digest bodies and
//! the outgoing letter builder.
use std::error::Error;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use lettre::{message::header::ContentType, Message};
use log::debug;

use crate::calendar::{parity, week_number};
use crate::models::deadline_model::{Deadline, Event};
use crate::models::timetable_model::{DaySchedule, Lesson};
use crate::models::user_model::User;
use crate::models::Config;

pub fn log_all_users(users: &[User]) -> () {
    for user in users.iter() {
        debug!(
            "Serving {}, group {:?}, subgroup {:?}, notify {}, events {}, alarm {}",
            user.id, user.group_name, user.subgroup, user.notify, user.events_enabled, user.alarm_enabled
        );
    }
}

/// Parses a user-typed due date: "DD.MM" (current year), "DD.MM.YYYY" or
/// ISO "YYYY-MM-DD". `None` excludes the record from date-filtered results.
pub fn parse_due_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%d.%m.%Y") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}.{}", raw, today.year()), "%d.%m.%Y") {
        return Some(date);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Event dates are strictly "DD.MM.YYYY".
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%d.%m.%Y").ok()
}

/// "08:00-09:30" -> 08:00.
pub fn parse_start_time(time_range: &str) -> Option<NaiveTime> {
    let start = time_range
        .split(|c| c == '-' || c == '–')
        .next()?
        .trim();
    NaiveTime::parse_from_str(start, "%H:%M").ok()
}

/// Unnotified deadlines whose due moment (start of the due date) lies
/// within `[now, now + window_hours]`. Malformed due dates are skipped.
pub fn deadlines_due_within<'a>(
    deadlines: &'a [Deadline],
    window_hours: i64,
    now: NaiveDateTime,
) -> Vec<&'a Deadline> {
    deadlines
        .iter()
        .filter(|deadline| !deadline.notified)
        .filter(|deadline| {
            parse_due_date(&deadline.due, now.date()).map_or(false, |due| {
                let remaining = due.and_time(NaiveTime::MIN) - now;
                remaining >= Duration::zero() && remaining <= Duration::hours(window_hours)
            })
        })
        .collect()
}

/// Up to `limit` nearest deadlines still active on `today`, sorted by due
/// date. Malformed due dates are excluded.
pub fn nearest_deadlines<'a>(
    deadlines: &'a [Deadline],
    today: NaiveDate,
    limit: usize,
) -> Vec<&'a Deadline> {
    let mut dated: Vec<(NaiveDate, &Deadline)> = deadlines
        .iter()
        .filter_map(|deadline| {
            parse_due_date(&deadline.due, today).map(|due| (due, deadline))
        })
        .filter(|(due, _)| *due >= today)
        .collect();
    dated.sort_by_key(|(due, _)| *due);
    dated.into_iter().take(limit).map(|(_, deadline)| deadline).collect()
}

/// Events dated within `[today, today + days]`, sorted by date. Malformed
/// dates are excluded.
pub fn upcoming_events<'a>(events: &'a [Event], days: i64, today: NaiveDate) -> Vec<&'a Event> {
    let mut dated: Vec<(NaiveDate, &Event)> = events
        .iter()
        .filter_map(|event| parse_event_date(&event.date).map(|date| (date, event)))
        .filter(|(date, _)| *date >= today && *date <= today + Duration::days(days))
        .collect();
    dated.sort_by_key(|(date, _)| *date);
    dated.into_iter().map(|(_, event)| event).collect()
}

pub fn weekday_name_ru(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Понедельник",
        Weekday::Tue => "Вторник",
        Weekday::Wed => "Среда",
        Weekday::Thu => "Четверг",
        Weekday::Fri => "Пятница",
        Weekday::Sat => "Суббота",
        Weekday::Sun => "Воскресенье",
    }
}

/// One digest line for one lesson. A substitution dated exactly `date` is
/// appended as a note.
pub fn format_lesson_as_string(lesson: &Lesson, date: NaiveDate) -> String {
    let mut line = format!("    {} {}", lesson.time, lesson.subject);
    if let Some(kind) = &lesson.kind {
        line.push_str(&format!(" ({})", kind));
    }
    if let Some(room) = &lesson.room {
        line.push_str(&format!(", ауд. {}", room));
    }
    if let Some(teacher) = &lesson.teacher {
        line.push_str(&format!(", {}", teacher));
    }
    if let Some(subgroup) = lesson.subgroup {
        line.push_str(&format!(" [подгруппа {}]", subgroup));
    }
    let date_key = date.format("%d.%m.%Y").to_string();
    if let Some(substitution) = lesson
        .substitutions
        .iter()
        .find(|substitution| substitution.date == date_key)
    {
        let mut changes = Vec::new();
        if let Some(teacher) = &substitution.teacher {
            changes.push(format!("ведёт {}", teacher));
        }
        if let Some(room) = &substitution.room {
            changes.push(format!("ауд. {}", room));
        }
        if let Some(note) = &substitution.note {
            changes.push(note.clone());
        }
        if !changes.is_empty() {
            line.push_str(&format!(" (замена: {})", changes.join(", ")));
        }
    }
    line
}

pub fn format_day_as_string(day: &DaySchedule) -> String {
    if day.lessons.is_empty() {
        return "    Занятий нет.".to_string();
    }
    day.lessons
        .iter()
        .map(|lesson| format_lesson_as_string(lesson, day.date))
        .collect::<Vec<_>>()
        .join("\n")
}

fn day_header(day: &DaySchedule, semester_start: NaiveDate) -> String {
    format!(
        "{}, {}, {} неделя №{}",
        day.date.format("%d.%m.%Y"),
        weekday_name_ru(day.date.weekday()),
        parity(day.date, semester_start).as_russian(),
        week_number(day.date, semester_start)
    )
}

/// Morning digest: today's lessons (when a group is chosen), today's
/// events (when subscribed) and up to three nearest deadlines.
pub fn compose_morning_digest(
    user: &User,
    day: Option<&DaySchedule>,
    events: &[&Event],
    deadlines: &[&Deadline],
    semester_start: NaiveDate,
) -> String {
    let mut sections = vec![format!("Доброе утро, {}!", user.name)];
    if let Some(day) = day {
        sections.push(format!(
            "Расписание на сегодня ({}):\n{}",
            day_header(day, semester_start),
            format_day_as_string(day)
        ));
    }
    if !events.is_empty() {
        let lines = events
            .iter()
            .map(|event| match &event.place {
                Some(place) => format!("    {} — {} ({})", event.date, event.title, place),
                None => format!("    {} — {}", event.date, event.title),
            })
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Мероприятия сегодня:\n{}", lines));
    }
    if !deadlines.is_empty() {
        let lines = deadlines
            .iter()
            .map(|deadline| format!("    {} — до {}", deadline.title, deadline.due))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Ближайшие дедлайны:\n{}", lines));
    }
    sections.join("\n\n")
}

/// Evening digest: tomorrow's lessons. `None` when tomorrow is a day off,
/// in which case nothing is sent at all.
pub fn compose_evening_digest(
    user: &User,
    day: &DaySchedule,
    semester_start: NaiveDate,
) -> Option<String> {
    if day.lessons.is_empty() {
        return None;
    }
    Some(format!(
        "{}, расписание на завтра ({}):\n{}",
        user.name,
        day_header(day, semester_start),
        format_day_as_string(day)
    ))
}

pub fn compose_deadline_reminder(deadline: &Deadline, now: NaiveDateTime) -> String {
    let remaining = parse_due_date(&deadline.due, now.date())
        .map(|due| due.and_time(NaiveTime::MIN) - now)
        .unwrap_or_else(Duration::zero);
    let left = if remaining.num_hours() >= 24 {
        format!("{} дн.", remaining.num_days())
    } else {
        format!("{} ч.", remaining.num_hours())
    };
    let mut text = format!(
        "Напоминание: через {} дедлайн «{}» (срок: {}).",
        left, deadline.title, deadline.due
    );
    if let Some(description) = &deadline.description {
        text.push_str(&format!("\n{}", description));
    }
    text
}

pub fn compose_first_lesson_alarm(lesson: &Lesson, minutes: i64) -> String {
    let mut text = format!(
        "Через {} мин. начнётся первая пара: {} ({})",
        minutes, lesson.subject, lesson.time
    );
    if let Some(room) = &lesson.room {
        text.push_str(&format!(", ауд. {}", room));
    }
    if let Some(teacher) = &lesson.teacher {
        text.push_str(&format!(", {}", teacher));
    }
    text
}

pub fn generate_email(
    config: &Config,
    user: &User,
    subject: &str,
    body: &str,
) -> Result<Message, Box<dyn Error>> {
    let email = Message::builder()
        .from(
            format!(
                "{} <{}>",
                config.email_sender_fullname, config.email_sender_username
            )
            .parse()?,
        )
        .to(format!("{} <{}>", user.name, user.email).parse()?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(format!("{}\n\nДанное письмо было сгенерировано автоматически, направление ответа не подразумевается.", body))?;

    Ok(email)
}
