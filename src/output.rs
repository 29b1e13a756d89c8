use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::compose::AcademicYearResult;
use crate::error::ExtractError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleDocument {
    /// Set by the caller so the year payloads stay a pure function of the input.
    pub last_updated: String,
    pub academic_years: Vec<AcademicYearResult>,
}

impl ScheduleDocument {
    pub fn new(last_updated: impl Into<String>, academic_years: Vec<AcademicYearResult>) -> Self {
        Self {
            last_updated: last_updated.into(),
            academic_years,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, ExtractError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), ExtractError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

/// Totals across every academic year in a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub teaching_days: usize,
    pub holidays: usize,
    pub exam_results_days: usize,
    pub weekdays: usize,
    /// Saturdays and Sundays between each year's first and last listed date.
    pub weekends: usize,
}

impl RunSummary {
    pub fn from_years(years: &[AcademicYearResult]) -> Self {
        let mut summary = Self::default();
        for year in years {
            summary.teaching_days += year.schooldays.len();
            summary.holidays += year.holidays.len();
            summary.exam_results_days += year.exam_results_days.len();
            summary.weekdays += year.schooldays.len() + year.holidays.len();

            let first = year.schooldays.iter().chain(&year.holidays).min();
            let last = year.schooldays.iter().chain(&year.holidays).max();
            if let (Some(first), Some(last)) = (first, last) {
                let span = (*last - *first).num_days() as usize + 1;
                summary.weekends += span - count_weekdays(*first, *last);
            }
        }
        summary
    }

    pub fn total_days(&self) -> usize {
        self.weekdays + self.weekends
    }
}

fn count_weekdays(first: NaiveDate, last: NaiveDate) -> usize {
    first
        .iter_days()
        .take_while(|d| *d <= last)
        .filter(|d| !crate::compose::is_weekend(*d))
        .count()
}
