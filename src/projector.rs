//! Day and week views over the timetable for one group and subgroup.
use chrono::{Duration, Local, NaiveDate};

use crate::calendar::week_start;
use crate::models::timetable_model::{DaySchedule, TimetableDocument};
use crate::timetable::{day_lessons, find_group_table, week_lessons};

/// One day of one group. A group absent from the document yields an empty
/// day, rendered downstream as a day off.
pub fn day_for_group(
    doc: &TimetableDocument,
    group: &str,
    subgroup: Option<u8>,
    semester_start: NaiveDate,
    date: NaiveDate,
) -> DaySchedule {
    match find_group_table(doc, group) {
        Some(table) => DaySchedule {
            date,
            lessons: day_lessons(table, date, semester_start, subgroup),
        },
        None => DaySchedule {
            date,
            lessons: Vec::new(),
        },
    }
}

pub fn today(
    doc: &TimetableDocument,
    group: &str,
    subgroup: Option<u8>,
    semester_start: NaiveDate,
) -> DaySchedule {
    day_for_group(doc, group, subgroup, semester_start, Local::now().date_naive())
}

pub fn tomorrow(
    doc: &TimetableDocument,
    group: &str,
    subgroup: Option<u8>,
    semester_start: NaiveDate,
) -> DaySchedule {
    let date = Local::now().date_naive() + Duration::days(1);
    day_for_group(doc, group, subgroup, semester_start, date)
}

/// The week containing `date`, starting from its Monday.
pub fn week_from(
    doc: &TimetableDocument,
    group: &str,
    subgroup: Option<u8>,
    semester_start: NaiveDate,
    date: NaiveDate,
) -> Vec<DaySchedule> {
    let monday = week_start(date);
    match find_group_table(doc, group) {
        Some(table) => week_lessons(table, monday, semester_start, subgroup),
        None => (0..7)
            .map(|offset| DaySchedule {
                date: monday + Duration::days(offset),
                lessons: Vec::new(),
            })
            .collect(),
    }
}

pub fn current_week(
    doc: &TimetableDocument,
    group: &str,
    subgroup: Option<u8>,
    semester_start: NaiveDate,
) -> Vec<DaySchedule> {
    week_from(doc, group, subgroup, semester_start, Local::now().date_naive())
}

pub fn next_week(
    doc: &TimetableDocument,
    group: &str,
    subgroup: Option<u8>,
    semester_start: NaiveDate,
) -> Vec<DaySchedule> {
    let date = Local::now().date_naive() + Duration::days(7);
    week_from(doc, group, subgroup, semester_start, date)
}
