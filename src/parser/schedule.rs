use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveTime};
use regex::{Matches, Regex};
use tracing::debug;

use crate::config::{AgencyConfig, MalformedMatch};
use crate::meeting::{Classification, Meeting};

// Month names are not checked here; the strict parse does that.
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<month>[a-zA-Z]+) (?P<day>[0-9]{1,2}), (?P<year>[0-9]{4})").unwrap()
});
// Any two letters pass as the meridiem; only AM/PM survive parsing.
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-1]?[0-9]|2[0-3]):[0-5][0-9] [a-zA-Z]{2}").unwrap());

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june",
    "july", "august", "september", "october", "november", "december",
];

/// Lazy scan over regex matches, yielding the ones that parse.
pub struct Scan<'t, T> {
    matches: Matches<'static, 't>,
    parse: fn(&str) -> Option<T>,
    policy: MalformedMatch,
    done: bool,
}

impl<T> Iterator for Scan<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.done {
            return None;
        }
        loop {
            let m = self.matches.next()?;
            match (self.parse)(m.as_str()) {
                Some(value) => return Some(value),
                None => {
                    debug!("Unparseable match {:?} at {}", m.as_str(), m.start());
                    if self.policy == MalformedMatch::Stop {
                        self.done = true;
                        return None;
                    }
                }
            }
        }
    }
}

/// Every "Month D, YYYY" date in `text`, in order of appearance.
pub fn extract_dates(text: &str, policy: MalformedMatch) -> Scan<'_, NaiveDate> {
    Scan {
        matches: DATE_RE.find_iter(text),
        parse: parse_date,
        policy,
        done: false,
    }
}

/// Every "H:MM AM" clock time in `text`, in order of appearance.
pub fn extract_times(text: &str, policy: MalformedMatch) -> Scan<'_, NaiveTime> {
    Scan {
        matches: TIME_RE.find_iter(text),
        parse: parse_time,
        policy,
        done: false,
    }
}

/// The first time in the document, or the configured default.
pub fn representative_time(config: &AgencyConfig, text: &str) -> NaiveTime {
    extract_times(text, config.malformed)
        .next()
        .unwrap_or(config.default_start_time)
}

/// One board meeting per date found, all starting at the representative time.
pub fn build_records(config: &AgencyConfig, text: &str, source_url: &str) -> Vec<Meeting> {
    let time = representative_time(config, text);
    debug!("Scanning {} chars from {}, start time {}", text.len(), source_url, time);

    let meetings: Vec<Meeting> = extract_dates(text, config.malformed)
        .map(|date| Meeting {
            title: config.meeting_title.to_string(),
            // Too inconsistent to parse accurately
            description: String::new(),
            classification: Classification::Board,
            start: date.and_time(time),
            end: None,
            all_day: false,
            time_notes: String::new(),
            location: config.location(),
            links: vec![config.homepage_link()],
            source: source_url.to_string(),
        })
        .collect();

    debug!("Built {} meetings from {}", meetings.len(), source_url);
    meetings
}

/// Strict "Month D, YYYY" with a full month name.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let (month, rest) = s.split_once(' ')?;
    let (day, year) = rest.split_once(", ")?;
    let month = MONTHS
        .iter()
        .position(|name| name.eq_ignore_ascii_case(month))? as u32
        + 1;
    let year: i32 = year.parse().ok()?;
    if year < 1 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day.parse().ok()?)
}

/// Strict 12-hour "H:MM AM" / "HH:MM pm".
fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%I:%M %p").ok()
}
