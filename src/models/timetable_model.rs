//! Module with the timetable dataset model, covering all three historical
//! shapes of the document: the full institution tree, the faculty-rooted
//! tree and the flat groups map.
use std::collections::BTreeMap;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// An ad-hoc one-date replacement attached to a lesson: on `date` the lesson
/// is held by a different teacher and/or in a different room.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Substitution {
    pub date: String,
    #[serde(default)]
    pub teacher: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// One scheduled class occurrence within a fixed weekly slot.
/// A lesson without a `subgroup` applies to the whole group; a lesson with
/// an explicit `weeks` list only occurs on those academic weeks.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Lesson {
    pub time: String,
    pub subject: String,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub teacher: Option<String>,
    #[serde(default)]
    pub subgroup: Option<u8>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub parity: Option<String>,
    #[serde(default)]
    pub weeks: Option<Vec<u32>>,
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
}

/// Seven weekdays of one parity.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ParityWeek {
    #[serde(default)]
    pub monday: Vec<Lesson>,
    #[serde(default)]
    pub tuesday: Vec<Lesson>,
    #[serde(default)]
    pub wednesday: Vec<Lesson>,
    #[serde(default)]
    pub thursday: Vec<Lesson>,
    #[serde(default)]
    pub friday: Vec<Lesson>,
    #[serde(default)]
    pub saturday: Vec<Lesson>,
    #[serde(default)]
    pub sunday: Vec<Lesson>,
}

impl ParityWeek {
    pub fn day(&self, weekday: Weekday) -> &[Lesson] {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    pub fn day_mut(&mut self, weekday: Weekday) -> &mut Vec<Lesson> {
        match weekday {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        }
    }

    /// Weekdays in calendar order, Monday first.
    pub const WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];
}

/// A group's full fortnight-cycle lesson plan: two parities by seven days.
/// Immutable snapshot loaded from the dataset, never mutated by the engine.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct WeekTable {
    #[serde(default)]
    pub odd: ParityWeek,
    #[serde(default)]
    pub even: ParityWeek,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Course {
    #[serde(default)]
    pub groups: BTreeMap<String, WeekTable>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Degree {
    #[serde(default)]
    pub courses: BTreeMap<String, Course>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct StudyFormat {
    #[serde(default)]
    pub degrees: BTreeMap<String, Degree>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Faculty {
    #[serde(default)]
    pub formats: BTreeMap<String, StudyFormat>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Institution {
    #[serde(default)]
    pub faculties: BTreeMap<String, Faculty>,
}

/// The root container. Exactly one of the three maps is populated in any
/// real dataset file, but resolution tolerates them all at once: the full
/// tree is consulted first, then the faculty-rooted tree, then the flat map.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TimetableDocument {
    #[serde(default)]
    pub institutions: Option<BTreeMap<String, Institution>>,
    #[serde(default)]
    pub faculties: Option<BTreeMap<String, Faculty>>,
    #[serde(default)]
    pub groups: Option<BTreeMap<String, WeekTable>>,
}

/// One resolved day: the calendar date and the lessons that occur on it,
/// already filtered and sorted. An empty list is a day off, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySchedule {
    pub date: chrono::NaiveDate,
    pub lessons: Vec<Lesson>,
}
