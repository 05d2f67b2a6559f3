//! Resolution of group week tables out of the nested, version-skewed
//! timetable document, and projection of single days and weeks out of a
//! resolved table.
use std::{collections::BTreeMap, fs::File, io::BufReader, path::Path};

use chrono::{Datelike, Duration, NaiveDate};
use log::{info, warn};

use crate::calendar::{parity, week_number, Parity};
use crate::models::timetable_model::{DaySchedule, Faculty, Lesson, TimetableDocument, WeekTable};

/// Best-effort read of the timetable dataset. A missing or malformed file
/// yields `None` and the engine degrades to empty schedules everywhere.
pub fn get_timetable_document(path: &Path) -> Option<TimetableDocument> {
    if !path.exists() {
        warn!("No timetable dataset at {}", path.display());
        return None;
    }
    let file = match File::open(path) {
        Ok(file) => BufReader::new(file),
        Err(e) => {
            warn!("Could not open timetable dataset {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_reader(file) {
        Ok(document) => {
            info!("Read timetable dataset from {}", path.display());
            Some(document)
        }
        Err(e) => {
            warn!("Malformed timetable dataset {}: {}", path.display(), e);
            None
        }
    }
}

fn find_in_faculties<'a>(
    faculties: &'a BTreeMap<String, Faculty>,
    group: &str,
) -> Option<&'a WeekTable> {
    faculties.values().find_map(|faculty| {
        faculty.formats.values().find_map(|format| {
            format.degrees.values().find_map(|degree| {
                degree
                    .courses
                    .values()
                    .find_map(|course| course.groups.get(group))
            })
        })
    })
}

fn from_institution_tree<'a>(doc: &'a TimetableDocument, group: &str) -> Option<&'a WeekTable> {
    doc.institutions
        .as_ref()?
        .values()
        .find_map(|institution| find_in_faculties(&institution.faculties, group))
}

fn from_faculty_tree<'a>(doc: &'a TimetableDocument, group: &str) -> Option<&'a WeekTable> {
    find_in_faculties(doc.faculties.as_ref()?, group)
}

fn from_flat_groups<'a>(doc: &'a TimetableDocument, group: &str) -> Option<&'a WeekTable> {
    doc.groups.as_ref()?.get(group)
}

type ShapeExtractor = for<'a> fn(&'a TimetableDocument, &str) -> Option<&'a WeekTable>;

/// The three historical document shapes, tried in order; first hit wins.
const SHAPE_EXTRACTORS: [ShapeExtractor; 3] =
    [from_institution_tree, from_faculty_tree, from_flat_groups];

/// Finds the week table of a group by its exact name. Not-found is a valid,
/// expected outcome (group renamed or removed); callers degrade to an empty
/// day or week.
pub fn find_group_table<'a>(doc: &'a TimetableDocument, group: &str) -> Option<&'a WeekTable> {
    SHAPE_EXTRACTORS
        .iter()
        .find_map(|extract| extract(doc, group))
}

fn walk_faculties<'a>(
    faculties: &'a BTreeMap<String, Faculty>,
    f: &mut impl FnMut(&'a str, &'a WeekTable),
) {
    for faculty in faculties.values() {
        for format in faculty.formats.values() {
            for degree in format.degrees.values() {
                for course in degree.courses.values() {
                    for (group, table) in &course.groups {
                        f(group, table);
                    }
                }
            }
        }
    }
}

/// Visits every (group, table) pair across all three document shapes.
/// The traversal primitive behind the teacher directory.
pub fn for_each_group_table<'a>(
    doc: &'a TimetableDocument,
    mut f: impl FnMut(&'a str, &'a WeekTable),
) {
    if let Some(institutions) = &doc.institutions {
        for institution in institutions.values() {
            walk_faculties(&institution.faculties, &mut f);
        }
    }
    if let Some(faculties) = &doc.faculties {
        walk_faculties(faculties, &mut f);
    }
    if let Some(groups) = &doc.groups {
        for (group, table) in groups {
            f(group, table);
        }
    }
}

/// Start-time prefix of a lesson's time range, the text before the first
/// dash. Times are zero-padded "HH:MM", so lexical order is time order.
pub fn start_time(lesson: &Lesson) -> &str {
    lesson
        .time
        .split(|c| c == '-' || c == '–')
        .next()
        .map(str::trim)
        .unwrap_or(&lesson.time)
}

pub fn sort_by_start(lessons: &mut [Lesson]) {
    lessons.sort_by(|a, b| start_time(a).cmp(start_time(b)));
}

fn subgroup_matches(lesson_subgroup: Option<u8>, wanted: Option<u8>) -> bool {
    match (lesson_subgroup, wanted) {
        (None, _) | (_, None) => true,
        (Some(of_lesson), Some(of_caller)) => of_lesson == of_caller,
    }
}

/// Lessons of one group on one date: the parity cell for the date's week,
/// filtered by the caller's subgroup and by explicit week lists, sorted by
/// start time.
pub fn day_lessons(
    table: &WeekTable,
    date: NaiveDate,
    semester_start: NaiveDate,
    subgroup: Option<u8>,
) -> Vec<Lesson> {
    let side = match parity(date, semester_start) {
        Parity::Odd => &table.odd,
        Parity::Even => &table.even,
    };
    let week = week_number(date, semester_start);
    let mut lessons: Vec<Lesson> = side
        .day(date.weekday())
        .iter()
        .filter(|lesson| subgroup_matches(lesson.subgroup, subgroup))
        .filter(|lesson| lesson.weeks.as_ref().map_or(true, |weeks| weeks.contains(&week)))
        .cloned()
        .collect();
    sort_by_start(&mut lessons);
    lessons
}

/// Seven consecutive days starting at `start_date`, in calendar order.
pub fn week_lessons(
    table: &WeekTable,
    start_date: NaiveDate,
    semester_start: NaiveDate,
    subgroup: Option<u8>,
) -> Vec<DaySchedule> {
    (0..7)
        .map(|offset| {
            let date = start_date + Duration::days(offset);
            DaySchedule {
                date,
                lessons: day_lessons(table, date, semester_start, subgroup),
            }
        })
        .collect()
}
