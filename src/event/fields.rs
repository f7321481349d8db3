// src/event/fields.rs
use crate::parse::RawRecord;
use chrono::{NaiveDate, NaiveDateTime, Timelike};

pub const DEFAULT_SEPARATOR: &str = " - ";

/// Placeholder year the feed uses for "date on request".
const ON_REQUEST_YEAR: &str = "2099";
const ON_REQUEST: &str = "auf Anfrage";
const DATE_RANGES: [(&str, &str); 3] = [
    ("TerminDatumVon1", "TerminDatumBis1"),
    ("TerminDatumVon2", "TerminDatumBis2"),
    ("TerminDatumVon3", "TerminDatumBis3"),
];

/// Join the texts of `names` in order, skipping absent or empty fields.
pub fn concatenate(record: &RawRecord, names: &[&str]) -> String {
    concatenate_with(record, names, DEFAULT_SEPARATOR)
}

pub fn concatenate_with(record: &RawRecord, names: &[&str], separator: &str) -> String {
    join_non_empty(names.iter().filter_map(|name| record.field(name)), separator)
}

/// Join the non-empty `parts` with `separator`.
pub fn join_non_empty<'a>(parts: impl IntoIterator<Item = &'a str>, separator: &str) -> String {
    let mut out = String::new();
    for part in parts.into_iter().filter(|p| !p.is_empty()) {
        if !out.is_empty() {
            out.push_str(separator);
        }
        out.push_str(part);
    }
    out
}

/// When the group meets and when it does not: weekday, time, season and
/// exceptions, one line each.
pub fn regular_time(record: &RawRecord) -> String {
    let parts =
        ["Wochentag", "Uhrzeit", "Saison", "Ausnahmen"].map(|name| concatenate(record, &[name]));
    join_non_empty(parts.iter().map(String::as_str), "\n")
}

/// Up to three date ranges, separated by a line reading "und".
pub fn date(record: &RawRecord) -> String {
    let ranges: Vec<String> = DATE_RANGES
        .iter()
        .map(|(from, to)| concatenate(record, &[*from, *to]))
        .collect();
    if ranges.iter().any(|r| r.contains(ON_REQUEST_YEAR)) {
        return ON_REQUEST.to_string();
    }
    let ranges: Vec<String> = ranges
        .iter()
        .map(|range| {
            range
                .split(DEFAULT_SEPARATOR)
                .map(shorten_date)
                .collect::<Vec<_>>()
                .join(DEFAULT_SEPARATOR)
        })
        .collect();
    join_non_empty(ranges.iter().map(String::as_str), "\nund\n")
}

/// `31.12.2020 00:00` → `31.12.20`, `31.12.2020 18:30` → `31.12.20 18:30`.
/// Anything else is returned unchanged.
fn shorten_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%d.%m.%Y %H:%M") {
        if dt.hour() == 0 && dt.minute() == 0 {
            return dt.format("%d.%m.%y").to_string();
        }
        return dt.format("%d.%m.%y %H:%M").to_string();
    }
    match NaiveDate::parse_from_str(raw, "%d.%m.%Y") {
        Ok(d) => d.format("%d.%m.%y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Title, second name and description text, optionally followed by a pointer
/// to where more information lives.
pub fn description(record: &RawRecord, reference: Option<&str>) -> String {
    let mut text = concatenate(record, &["Bezeichnung", "Bezeichnung2", "Terminbeschreibung"]);
    if let Some(reference) = reference.filter(|r| !r.is_empty()) {
        if !text.is_empty() {
            if !text.ends_with('.') {
                text.push('.');
            }
            text.push(' ');
        }
        text.push_str("Mehr Infos unter ");
        text.push_str(reference);
        text.push('.');
    }
    text
}
