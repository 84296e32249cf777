use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// The Monday-to-Sunday aligned date interval currently displayed.
///
/// Alignment is an invariant of every constructor, not just the default:
/// whatever weekday the anchor falls on, `start` is the Monday of its ISO
/// week and `end` is a Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Prev,
    Next,
}

/// The six quick-filter presets. Parsing an unrecognized label yields
/// `None`, which callers treat as a no-op rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickFilter {
    OneWeek,
    TwoWeeks,
    ThreeWeeks,
    OneMonth,
    TwoMonths,
    ThreeMonths,
}

/// Weekend classification of a grid row, used for styling only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayKind {
    Weekday,
    Saturday,
    Sunday,
}

pub fn start_of_iso_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub fn end_of_iso_week(date: NaiveDate) -> NaiveDate {
    start_of_iso_week(date) + Duration::days(6)
}

pub fn classify(date: NaiveDate) -> DayKind {
    match date.weekday() {
        Weekday::Sat => DayKind::Saturday,
        Weekday::Sun => DayKind::Sunday,
        _ => DayKind::Weekday,
    }
}

fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    // Only fails near NaiveDate::MAX, far outside any plausible window.
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

impl DateWindow {
    /// Single ISO week around `anchor`.
    pub fn from_anchor(anchor: NaiveDate) -> Self {
        let start = start_of_iso_week(anchor);
        Self {
            start,
            end: start + Duration::days(6),
        }
    }

    /// Shifts the window by exactly one ISO week and realigns.
    pub fn navigate(self, direction: NavDirection) -> Self {
        let delta = match direction {
            NavDirection::Prev => -7,
            NavDirection::Next => 7,
        };
        Self::from_anchor(self.start + Duration::days(delta))
    }

    /// Every date in the window, inclusive on both ends.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

impl QuickFilter {
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "1week" => Some(Self::OneWeek),
            "2weeks" => Some(Self::TwoWeeks),
            "3weeks" => Some(Self::ThreeWeeks),
            "1month" => Some(Self::OneMonth),
            "2months" => Some(Self::TwoMonths),
            "3months" => Some(Self::ThreeMonths),
            _ => None,
        }
    }

    /// Window for this preset, plus the new anchor the controller should
    /// adopt. Week presets span whole ISO weeks; month presets add calendar
    /// months to the start and snap the end forward to the next Sunday.
    pub fn window_from(self, today: NaiveDate) -> (DateWindow, NaiveDate) {
        let start = start_of_iso_week(today);
        let end = match self {
            Self::OneWeek => end_of_iso_week(start),
            Self::TwoWeeks => end_of_iso_week(start + Duration::weeks(1)),
            Self::ThreeWeeks => end_of_iso_week(start + Duration::weeks(2)),
            Self::OneMonth => end_of_iso_week(add_months(start, 1)),
            Self::TwoMonths => end_of_iso_week(add_months(start, 2)),
            Self::ThreeMonths => end_of_iso_week(add_months(start, 3)),
        };
        (DateWindow { start, end }, start)
    }
}
