use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{command, Parser};
use serde::{Deserialize, Serialize};

pub mod deadline_model;
pub mod timetable_model;
pub mod user_model;

/// A model for describing ARGS of the service.
/// Consists of:
/// 1. Path to config.json, that contains email sender and scheduler configuration parameters.
/// 2. Path to calendar.json, that contains the semester start date.
/// 3. Path to timetable.json, the nested timetable dataset (used unless a remote URL is configured).
/// 4. Path to schedule.sqlite3, the store with users, deadlines, events and favorite teachers.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[arg(long, value_name = "FILE", default_value = "config.json")]
    pub config_json_path: PathBuf,
    #[arg(long, value_name = "FILE", default_value = "calendar.json")]
    pub calendar_json_path: PathBuf,
    #[arg(long, value_name = "FILE", default_value = "timetable.json")]
    pub timetable_json_path: PathBuf,
    #[arg(long, value_name = "FILE", default_value = "schedule.sqlite3")]
    pub schedule_sqlite3_path: PathBuf,
}

/// A model for describing configuration of the service.
/// Consists of:
/// 1. SMTP server address and sender account (address, display name, password)
/// 2. Wall-clock times of the morning and evening digests, "HH:MM" local
/// 3. Reminder window for the deadline sweep, in hours
/// 4. Optional URL of a remotely served timetable dataset
#[derive(Debug, Deserialize)]
pub struct Config {
    pub email_relay: String,
    pub email_sender_username: String,
    pub email_sender_fullname: String,
    pub email_sender_password: String,
    pub morning_digest_time: String,
    pub evening_digest_time: String,
    pub deadline_reminder_window_hours: i64,
    #[serde(default)]
    pub timetable_url: Option<String>,
}

/// Model for `calendar.json`. The semester start date is the epoch from
/// which academic week numbers and parities are counted.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct CalendarConfig {
    pub semester_start: NaiveDate,
}
