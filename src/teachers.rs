//! The teacher directory. Teacher identities are not stored anywhere: they
//! are mined on demand from the free-text `teacher` fields of lesson
//! records, validated, normalized and deduplicated. The per-teacher week
//! schedule is reconstructed by scanning across all groups.
use std::collections::BTreeSet;

use crate::models::timetable_model::{ParityWeek, TimetableDocument, WeekTable};
use crate::timetable::{for_each_group_table, sort_by_start};

/// Leading academic titles and degree abbreviations stripped during
/// normalization. Longer variants come first so that e.g. "ст. преп."
/// is not half-eaten by a shorter prefix. Dot-free entries only match at
/// a word boundary.
const TITLE_PREFIXES: [&str; 30] = [
    "старший преподаватель",
    "ст. преподаватель",
    "ст. преп.",
    "ст.преп.",
    "ст. пр.",
    "ст.пр.",
    "преподаватель",
    "преп.",
    "профессор",
    "проф.",
    "доцент",
    "доц.",
    "ассистент",
    "асс.",
    "к. ф.-м. н.",
    "к.ф.-м.н.",
    "к. т. н.",
    "к.т.н.",
    "к. э. н.",
    "к.э.н.",
    "к. п. н.",
    "к.п.н.",
    "к. н.",
    "к.н.",
    "д. ф.-м. н.",
    "д.ф.-м.н.",
    "д. т. н.",
    "д.т.н.",
    "д. н.",
    "д.н.",
];

/// Trailing parenthesized remote-delivery markers stripped during
/// normalization.
const REMOTE_MARKERS: [&str; 4] = ["дот", "дистант", "дистанционно", "онлайн"];

/// Parenthesized lesson-type abbreviations that mark a candidate as a
/// subject annotation rather than a person.
const LESSON_KIND_TAGS: [&str; 16] = [
    "лк", "лек", "лекция", "пр", "практика", "лб", "лаб", "сем", "семинар", "зач", "зачет",
    "зачёт", "экз", "экзамен", "конс", "консультация",
];

/// Bounds the fixed-point prefix stripping so that even adversarial input
/// terminates.
const MAX_TITLE_PASSES: usize = 10;

/// Candidates shorter than this must contain a period (typical of
/// initials) to count as a name.
const MIN_BARE_NAME_CHARS: usize = 6;

/// Cheap, permissive extraction pass: every trimmed non-empty `teacher`
/// field across the whole hierarchy.
pub fn extract_candidates(doc: &TimetableDocument) -> BTreeSet<String> {
    let mut candidates = BTreeSet::new();
    for_each_group_table(doc, |_, table| {
        for side in [&table.odd, &table.even] {
            for weekday in ParityWeek::WEEKDAYS {
                for lesson in side.day(weekday) {
                    if let Some(teacher) = &lesson.teacher {
                        let teacher = teacher.trim();
                        if !teacher.is_empty() {
                            candidates.insert(teacher.to_string());
                        }
                    }
                }
            }
        }
    });
    candidates
}

/// "2-301", "12-404а": one or more digits, a dash, a digit.
fn looks_like_room_code(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    let mut digits = 0;
    let mut rest = None;
    for c in chars.by_ref() {
        if c.is_ascii_digit() {
            digits += 1;
        } else {
            rest = Some(c);
            break;
        }
    }
    digits > 0
        && rest == Some('-')
        && chars.next().map_or(false, |c| c.is_ascii_digit())
}

/// "8:00", "08:00".
fn looks_like_clock_time(candidate: &str) -> bool {
    let Some((hours, minutes)) = candidate.split_once(':') else {
        return false;
    };
    (1..=2).contains(&hours.len())
        && minutes.len() == 2
        && hours.chars().all(|c| c.is_ascii_digit())
        && minutes.chars().all(|c| c.is_ascii_digit())
}

/// "Литература (лк)": a parenthesized lesson-type abbreviation at or near
/// the end marks a subject annotation, not a person.
fn ends_with_lesson_kind(candidate: &str) -> bool {
    let trimmed = candidate.trim_end_matches(['.', ' ']);
    if !trimmed.ends_with(')') {
        return false;
    }
    let Some(open) = trimmed.rfind('(') else {
        return false;
    };
    let inner = trimmed[open + 1..trimmed.len() - 1].trim().to_lowercase();
    LESSON_KIND_TAGS.contains(&inner.as_str())
}

/// Decides whether a raw candidate is plausibly a person's name rather
/// than a room code, a clock time or a subject annotation.
pub fn is_plausible_name(candidate: &str) -> bool {
    let candidate = candidate.trim();
    if candidate.chars().count() < 3 {
        return false;
    }
    if !candidate.chars().any(char::is_alphabetic) {
        return false;
    }
    if looks_like_room_code(candidate) || looks_like_clock_time(candidate) {
        return false;
    }
    if candidate
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_whitespace() || c == '-' || c == '–')
    {
        return false;
    }
    if ends_with_lesson_kind(candidate) {
        return false;
    }
    if !candidate.chars().any(char::is_uppercase) {
        return false;
    }
    candidate.contains('.') || candidate.chars().count() >= MIN_BARE_NAME_CHARS
}

/// Case-insensitive prefix strip that never assumes lowercase mappings
/// preserve byte lengths.
fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let mut rest = s;
    for expected in prefix.chars() {
        let mut chars = rest.chars();
        let actual = chars.next()?;
        if actual.to_lowercase().ne(expected.to_lowercase()) {
            return None;
        }
        rest = chars.as_str();
    }
    Some(rest)
}

fn strip_title_prefix(name: &str) -> Option<&str> {
    for prefix in TITLE_PREFIXES {
        if let Some(rest) = strip_prefix_ci(name, prefix) {
            // A bare-word title must end at a word boundary, otherwise
            // "Доцентов И. И." would lose its surname.
            if !prefix.ends_with('.') && !rest.is_empty() && !rest.starts_with(char::is_whitespace)
            {
                continue;
            }
            return Some(rest.trim_start_matches([' ', ',']).trim_start());
        }
    }
    None
}

fn strip_remote_marker(name: &str) -> &str {
    let trimmed = name.trim_end();
    if !trimmed.ends_with(')') {
        return name;
    }
    let Some(open) = trimmed.rfind('(') else {
        return name;
    };
    let inner = trimmed[open + 1..trimmed.len() - 1].trim().to_lowercase();
    if REMOTE_MARKERS.contains(&inner.as_str()) {
        trimmed[..open].trim_end()
    } else {
        name
    }
}

/// Canonical identity of a raw teacher mention: the trailing delivery
/// marker and every leading title/degree removed, whitespace collapsed.
/// Idempotent: normalizing a normalized name changes nothing.
pub fn normalize(name: &str) -> String {
    let mut rest = strip_remote_marker(name.trim());
    for _ in 0..MAX_TITLE_PASSES {
        match strip_title_prefix(rest) {
            Some(stripped) => rest = stripped,
            None => break,
        }
    }
    rest.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Every distinct teacher of the dataset, normalized and sorted.
pub fn all_teachers(doc: &TimetableDocument) -> Vec<String> {
    extract_candidates(doc)
        .iter()
        .filter(|candidate| is_plausible_name(candidate))
        .map(|candidate| normalize(candidate))
        .filter(|name| !name.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Case-insensitive substring search. An empty query yields an empty
/// result, not the whole directory.
pub fn search(doc: &TimetableDocument, query: &str) -> Vec<String> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    all_teachers(doc)
        .into_iter()
        .filter(|name| name.to_lowercase().contains(&query))
        .collect()
}

/// Reconstructs a virtual week table for one teacher by scanning every
/// group's every cell. A lesson belongs to the teacher when its raw
/// mention normalizes to the same identity, or matches the query verbatim.
/// Matched lessons carry the originating group in the subject so the
/// combined schedule stays disambiguable.
pub fn teacher_week_table(doc: &TimetableDocument, teacher_name: &str) -> WeekTable {
    let target = normalize(teacher_name);
    let verbatim = teacher_name.trim();
    let mut result = WeekTable::default();
    for_each_group_table(doc, |group, table| {
        for (side, out) in [(&table.odd, &mut result.odd), (&table.even, &mut result.even)] {
            for weekday in ParityWeek::WEEKDAYS {
                for lesson in side.day(weekday) {
                    let Some(raw) = &lesson.teacher else {
                        continue;
                    };
                    if normalize(raw) != target && raw.trim() != verbatim {
                        continue;
                    }
                    let mut found = lesson.clone();
                    found.subject = format!("{} ({})", found.subject, group);
                    out.day_mut(weekday).push(found);
                }
            }
        }
    });
    for side in [&mut result.odd, &mut result.even] {
        for weekday in ParityWeek::WEEKDAYS {
            sort_by_start(side.day_mut(weekday));
        }
    }
    result
}
