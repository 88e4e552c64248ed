//! Digit-of-day circulation restriction.
//!
//! A vehicle is barred on the weekday whose digit pair contains the last
//! digit of its plate, during the active time window(s). Weekends are
//! unrestricted. Evaluation is a pure function of (plate, timestamp).

use anyhow::Result;
use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::plate::{FormatPolicy, NormalizedPlate, PlateFormatNormalizer, PlateSchema};

/// Restricted trailing digits, Monday through Friday.
pub static RESTRICTED_DIGITS: [[u8; 2]; 5] = [[1, 2], [3, 4], [5, 6], [7, 8], [9, 0]];

pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Inclusive time-of-day window, in seconds from midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub label: &'static str,
    start: u32,
    end: u32,
}

impl TimeWindow {
    const fn new(label: &'static str, start_hour: u32, end_hour: u32) -> Self {
        Self {
            label,
            start: start_hour * 3600,
            end: end_hour * 3600,
        }
    }

    /// Inclusive at both ends, down to the nanosecond.
    pub fn contains(&self, time: NaiveTime) -> bool {
        let bound = |secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, 0);
        match (bound(self.start), bound(self.end)) {
            (Some(start), Some(end)) => start <= time && time <= end,
            _ => false,
        }
    }

    /// "HH:MM-HH:MM"
    pub fn span(&self) -> String {
        format!(
            "{:02}:{:02}-{:02}:{:02}",
            self.start / 3600,
            self.start % 3600 / 60,
            self.end / 3600,
            self.end % 3600 / 60
        )
    }
}

static CONTINUOUS_WINDOWS: [TimeWindow; 1] = [TimeWindow::new("Restriction hours", 7, 20)];
static SPLIT_WINDOWS: [TimeWindow; 2] = [
    TimeWindow::new("Morning restriction hours", 7, 9),
    TimeWindow::new("Evening restriction hours", 17, 20),
];

/// Which restricted hours apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePolicy {
    /// One window, 07:00-20:00.
    #[default]
    Continuous,
    /// Two windows, 07:00-09:00 and 17:00-20:00.
    Split,
}

impl TimePolicy {
    pub fn windows(&self) -> &'static [TimeWindow] {
        match self {
            TimePolicy::Continuous => &CONTINUOUS_WINDOWS,
            TimePolicy::Split => &SPLIT_WINDOWS,
        }
    }

    /// Returns whether `time` falls in a restricted window, and why.
    pub fn check(&self, time: NaiveTime) -> (bool, String) {
        if let Some(window) = self.windows().iter().find(|w| w.contains(time)) {
            return (true, format!("{} ({})", window.label, window.span()));
        }

        let spans: Vec<String> = self.windows().iter().map(TimeWindow::span).collect();
        (
            false,
            format!("Outside restriction hours ({})", spans.join(", ")),
        )
    }
}

impl fmt::Display for TimePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimePolicy::Continuous => write!(f, "continuous"),
            TimePolicy::Split => write!(f, "split"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Permitted,
    Restricted,
    RestrictedOutOfHours,
}

impl Status {
    pub fn combine(day_restricted: bool, time_restricted: bool) -> Self {
        match (day_restricted, time_restricted) {
            (true, true) => Status::Restricted,
            (true, false) => Status::RestrictedOutOfHours,
            _ => Status::Permitted,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Permitted => write!(f, "PERMITTED"),
            Status::Restricted => write!(f, "RESTRICTED"),
            Status::RestrictedOutOfHours => write!(f, "RESTRICTED_OUT_OF_HOURS"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestrictionVerdict {
    pub last_digit: Option<u8>,
    pub day_restricted: bool,
    pub day_reason: String,
    pub time_restricted: bool,
    pub time_reason: String,
    pub overall_status: Status,
}

/// Last digit used for the day rule.
///
/// L3N4/N4L3: final digit of the 4-digit block. MIXED: the last digit
/// anywhere in the string.
pub fn last_digit(plate: &NormalizedPlate) -> Option<u8> {
    match plate.schema() {
        PlateSchema::L3N4 | PlateSchema::N4L3 => plate
            .digit_group()
            .and_then(|digits| digits.chars().nth(3))
            .and_then(|c| c.to_digit(10))
            .map(|d| d as u8),
        PlateSchema::Mixed => last_digit_in(plate.text()),
    }
}

fn last_digit_in(text: &str) -> Option<u8> {
    text.chars()
        .filter_map(|c| c.to_digit(10))
        .last()
        .map(|d| d as u8)
}

/// Digits barred on `weekday`. Empty on weekends.
pub fn restricted_digits(weekday: Weekday) -> &'static [u8] {
    let day = weekday.num_days_from_monday() as usize;
    match RESTRICTED_DIGITS.get(day) {
        Some(pair) => pair.as_slice(),
        None => &[],
    }
}

/// Day rule for a plate ending in `digit`.
pub fn check_day(digit: Option<u8>, weekday: Weekday) -> (bool, String) {
    let Some(digit) = digit else {
        return (false, "Could not determine the last digit".to_string());
    };

    let day = weekday.num_days_from_monday() as usize;
    if matches!(weekday, Weekday::Sat | Weekday::Sun) {
        return (false, "No restriction on weekends".to_string());
    }

    if restricted_digits(weekday).contains(&digit) {
        (
            true,
            format!("Restricted on {}s (plate ending in {})", WEEKDAY_NAMES[day], digit),
        )
    } else {
        (
            false,
            format!("Permitted on {}s (plate ending in {})", WEEKDAY_NAMES[day], digit),
        )
    }
}

/// Computes restriction verdicts for plates at given timestamps.
#[derive(Debug, Clone)]
pub struct RestrictionEvaluator {
    normalizer: PlateFormatNormalizer,
    time_policy: TimePolicy,
}

impl RestrictionEvaluator {
    pub fn new(format_policy: FormatPolicy, time_policy: TimePolicy) -> Result<Self> {
        Ok(Self {
            normalizer: PlateFormatNormalizer::new(format_policy)?,
            time_policy,
        })
    }

    /// Evaluates free-form plate text, e.g. a manually entered plate.
    ///
    /// Falls back to the last digit anywhere in the text when it does not
    /// normalize to a supported schema.
    pub fn evaluate(&self, plate_text: &str, at: NaiveDateTime) -> RestrictionVerdict {
        let digit = match self.normalizer.normalize(plate_text) {
            Some(plate) => last_digit(&plate),
            None => {
                let clean: String = plate_text
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect();
                last_digit_in(&clean)
            }
        };
        self.verdict(digit, at)
    }

    /// Evaluates an already-normalized plate.
    pub fn evaluate_plate(&self, plate: &NormalizedPlate, at: NaiveDateTime) -> RestrictionVerdict {
        self.verdict(last_digit(plate), at)
    }

    fn verdict(&self, digit: Option<u8>, at: NaiveDateTime) -> RestrictionVerdict {
        let (day_restricted, day_reason) = check_day(digit, at.weekday());
        let (time_restricted, time_reason) = self.time_policy.check(at.time());

        RestrictionVerdict {
            last_digit: digit,
            day_restricted,
            day_reason,
            time_restricted,
            time_reason,
            overall_status: Status::combine(day_restricted, time_restricted),
        }
    }
}
