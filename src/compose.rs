use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;

use crate::error::ExtractError;
use crate::layout::MonthKey;

/// An academic year such as "2025-2026", running September to August.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AcademicYear {
    label: String,
    start_year: i32,
}

impl AcademicYear {
    /// Parse a label whose first component is the four-digit start year
    /// ("2025-2026", "2026-27").
    pub fn parse(label: &str) -> Result<Self, ExtractError> {
        let invalid = || ExtractError::InvalidAcademicYear(label.to_string());
        let (start, end) = label.trim().split_once('-').ok_or_else(invalid)?;
        if start.len() != 4 || end.is_empty() || !end.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let start_year = start.parse::<i32>().map_err(|_| invalid())?;
        Ok(Self {
            label: label.trim().to_string(),
            start_year,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year, 9, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year + 1, 8, 31).unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first_day() <= date && date <= self.last_day()
    }

    /// The twelve months of the year, September first.
    pub fn months(&self) -> Vec<MonthKey> {
        (9..=12)
            .map(|m| (self.start_year, m))
            .chain((1..=8).map(|m| (self.start_year + 1, m)))
            .collect()
    }

    /// Every Monday-to-Friday date in the window, in order.
    pub fn weekdays(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.first_day()
            .iter_days()
            .take_while(|d| *d <= self.last_day())
            .filter(|d| !is_weekend(*d))
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// One academic year as written to the output document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcademicYearResult {
    pub academic_year: String,
    pub schooldays: Vec<NaiveDate>,
    pub holidays: Vec<NaiveDate>,
    pub exam_results_days: Vec<NaiveDate>,
    /// Holidays that only an override entry could place.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub override_holidays: Vec<NaiveDate>,
}

/// Classify every weekday of `year`: exam results days and shaded dates are
/// holidays, everything else is a schoolday.
pub fn compose(
    year: &AcademicYear,
    shaded: &BTreeSet<NaiveDate>,
    exam_results: &BTreeSet<NaiveDate>,
) -> AcademicYearResult {
    let mut schooldays = Vec::new();
    let mut holidays = Vec::new();
    for date in year.weekdays() {
        if exam_results.contains(&date) || shaded.contains(&date) {
            holidays.push(date);
        } else {
            schooldays.push(date);
        }
    }
    holidays.retain(|d| !is_weekend(*d));

    AcademicYearResult {
        academic_year: year.label().to_string(),
        schooldays,
        holidays,
        exam_results_days: exam_results.iter().copied().collect(),
        override_holidays: Vec::new(),
    }
}

/// Schoolday count printed in the document for one month, against what was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCountCheck {
    pub month: MonthKey,
    pub expected: u32,
    pub actual: u32,
}

impl MonthCountCheck {
    pub fn matches(&self) -> bool {
        self.expected == self.actual
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageReport {
    /// Dates listed as both schoolday and holiday.
    pub overlap: Vec<NaiveDate>,
    /// Weekdays between the first and last classified date that are in neither list.
    pub missing: Vec<NaiveDate>,
    pub classified: usize,
    pub weekdays_in_range: usize,
    pub month_checks: Vec<MonthCountCheck>,
    /// Months in the window whose grid was never rebuilt, so every weekday
    /// in them defaulted to schoolday.
    pub unreconstructed_months: Vec<MonthKey>,
    /// Dates mentioned in page text that ended up as schooldays.
    pub mentioned_schooldays: Vec<NaiveDate>,
}

impl CoverageReport {
    pub fn coverage_percent(&self) -> f64 {
        if self.weekdays_in_range == 0 {
            return 0.0;
        }
        self.classified as f64 * 100.0 / self.weekdays_in_range as f64
    }

    pub fn is_complete(&self) -> bool {
        self.overlap.is_empty() && self.missing.is_empty()
    }
}

pub fn analyze(result: &AcademicYearResult, expected: &BTreeMap<MonthKey, u32>) -> CoverageReport {
    let schooldays: BTreeSet<_> = result.schooldays.iter().copied().collect();
    let holidays: BTreeSet<_> = result.holidays.iter().copied().collect();
    let overlap: Vec<_> = schooldays.intersection(&holidays).copied().collect();
    let classified: BTreeSet<_> = schooldays.union(&holidays).copied().collect();

    let mut missing = Vec::new();
    let mut weekdays_in_range = 0;
    if let (Some(first), Some(last)) = (classified.first(), classified.last()) {
        let mut day = *first;
        while day <= *last {
            if !is_weekend(day) {
                weekdays_in_range += 1;
                if !classified.contains(&day) {
                    missing.push(day);
                }
            }
            match day.checked_add_days(Days::new(1)) {
                Some(next) => day = next,
                None => break,
            }
        }
    }

    let mut per_month: BTreeMap<MonthKey, u32> = BTreeMap::new();
    for date in &result.schooldays {
        *per_month.entry((date.year(), date.month())).or_default() += 1;
    }
    let month_checks = expected
        .iter()
        .map(|(month, expected)| MonthCountCheck {
            month: *month,
            expected: *expected,
            actual: per_month.get(month).copied().unwrap_or(0),
        })
        .collect();

    CoverageReport {
        overlap,
        missing,
        classified: classified.len(),
        weekdays_in_range,
        month_checks,
        unreconstructed_months: Vec::new(),
        mentioned_schooldays: Vec::new(),
    }
}
