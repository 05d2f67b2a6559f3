//! Academic week numbering and parity relative to the semester start date.
use std::{fs::File, io::BufReader, path::Path};

use chrono::{Datelike, Duration, NaiveDate};
use log::{info, warn};

use crate::models::CalendarConfig;

/// Semester start used when calendar.json is absent or unreadable.
pub fn fallback_semester_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    Odd,
    Even,
}

impl Parity {
    pub fn as_russian(&self) -> &'static str {
        match self {
            Parity::Odd => "нечётная",
            Parity::Even => "чётная",
        }
    }
}

/// Monday of the date's calendar week.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Monday on/after the semester start. A start on Monday is used as-is,
/// a start on Sunday rolls over to the next day.
pub fn first_monday(semester_start: NaiveDate) -> NaiveDate {
    let behind = semester_start.weekday().num_days_from_monday() as i64;
    if behind == 0 {
        semester_start
    } else {
        semester_start + Duration::days(7 - behind)
    }
}

/// 1-based academic week number, weeks running Monday to Sunday.
/// Any date before the first Monday floors to week 1.
pub fn week_number(date: NaiveDate, semester_start: NaiveDate) -> u32 {
    let elapsed = (week_start(date) - first_monday(semester_start)).num_days();
    if elapsed < 0 {
        1
    } else {
        (elapsed / 7 + 1) as u32
    }
}

pub fn parity(date: NaiveDate, semester_start: NaiveDate) -> Parity {
    if week_number(date, semester_start) % 2 == 1 {
        Parity::Odd
    } else {
        Parity::Even
    }
}

/// Best-effort read of calendar.json. An absent or malformed file falls
/// back to the hardcoded semester start instead of failing startup.
pub fn get_calendar_config(path: &Path) -> CalendarConfig {
    if !path.exists() {
        warn!(
            "No calendar config at {}, falling back to semester start {}",
            path.display(),
            fallback_semester_start()
        );
        return CalendarConfig {
            semester_start: fallback_semester_start(),
        };
    }
    let parsed = File::open(path)
        .map(BufReader::new)
        .map_err(|e| e.to_string())
        .and_then(|file| serde_json::from_reader(file).map_err(|e| e.to_string()));
    match parsed {
        Ok(config) => {
            info!("Read calendar config from {}", path.display());
            config
        }
        Err(e) => {
            warn!(
                "Could not read calendar config from {}: {}, falling back to semester start {}",
                path.display(),
                e,
                fallback_semester_start()
            );
            CalendarConfig {
                semester_start: fallback_semester_start(),
            }
        }
    }
}
