use std::collections::BTreeMap;

use chrono::{NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::geometry::median;
use crate::layout::{DayHeaderColumns, MonthHeader, MonthKey, month_for_position};
use crate::reader::TextSpan;

static DAY_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})\*?$").expect("day number pattern is valid"));

/// Day-of-month written in a grid cell; a trailing `*` marks a footnote.
pub fn parse_day_number(text: &str) -> Option<u32> {
    let caps = DAY_NUMBER.captures(text.trim())?;
    let day: u32 = caps.get(1)?.as_str().parse().ok()?;
    (1..=31).contains(&day).then_some(day)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    match (first, next) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 0,
    }
}

/// A day-number span attributed to a month.
#[derive(Debug, Clone, Copy)]
pub struct DaySpan<'a> {
    pub day: u32,
    pub month: MonthKey,
    pub span: &'a TextSpan,
}

/// Day-number spans above the footer line, paired with the month region they fall in.
pub fn collect_day_spans<'a>(
    spans: impl IntoIterator<Item = &'a TextSpan>,
    headers: &[MonthHeader],
    footer_y: f32,
) -> Vec<DaySpan<'a>> {
    spans
        .into_iter()
        .filter(|span| span.bbox.y0 <= footer_y)
        .filter_map(|span| {
            let day = parse_day_number(&span.text)?;
            let month = month_for_position(span.bbox.top_left(), headers)?.key();
            Some(DaySpan { day, month, span })
        })
        .collect()
}

/// Weekday of every day in a month, anchored on where day 1 was printed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructedMonth {
    pub year: i32,
    pub month: u32,
    pub first_weekday: Weekday,
    /// Header-row position of the column holding day 1.
    pub first_column: usize,
    pub days: BTreeMap<u32, Weekday>,
}

impl ReconstructedMonth {
    pub fn new(year: i32, month: u32, first_weekday: Weekday, first_column: usize) -> Self {
        let days = (1..=days_in_month(year, month))
            .map(|day| (day, weekday_after(first_weekday, day - 1)))
            .collect();
        Self {
            year,
            month,
            first_weekday,
            first_column,
            days,
        }
    }

    pub fn key(&self) -> MonthKey {
        (self.year, self.month)
    }

    pub fn days_in_month(&self) -> u32 {
        self.days.len() as u32
    }

    pub fn weekday(&self, day: u32) -> Option<Weekday> {
        self.days.get(&day).copied()
    }

    pub fn date(&self, day: u32) -> Option<NaiveDate> {
        if day == 0 || day > self.days_in_month() {
            return None;
        }
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    /// Zero-based week row of `day` in the printed grid.
    pub fn row_of(&self, day: u32) -> usize {
        (self.first_column + day as usize - 1) / 7
    }

    /// Index of the last row the month occupies.
    pub fn last_row(&self) -> usize {
        self.row_of(self.days_in_month())
    }

    /// Day printed at `(row, column)`, if that cell belongs to the month.
    pub fn day_at(&self, row: usize, column: usize) -> Option<u32> {
        let day = (row * 7 + column) as i64 - self.first_column as i64 + 1;
        if day < 1 || day > self.days_in_month() as i64 {
            return None;
        }
        Some(day as u32)
    }
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_after(start: Weekday, days: u32) -> Weekday {
    WEEK[((start.num_days_from_monday() + days) % 7) as usize]
}

/// Rebuild each month that has a weekday row and a legible day "1" in one of its columns.
pub fn reconstruct_months(
    day_spans: &[DaySpan<'_>],
    day_headers: &[DayHeaderColumns],
) -> Vec<ReconstructedMonth> {
    let mut months = Vec::new();
    for header in day_headers {
        let first = day_spans
            .iter()
            .filter(|d| d.month == header.key() && d.day == 1)
            .find_map(|d| header.column_containing(d.span.bbox.center().x));
        if let Some(column) = first {
            months.push(ReconstructedMonth::new(
                header.year,
                header.month,
                column.weekday,
                column.ordinal,
            ));
        }
    }
    months
}

/// Check-point heights of day numbers, grouped by month and grid row.
#[derive(Debug, Default, Clone)]
pub struct RowSamples {
    samples: BTreeMap<MonthKey, BTreeMap<usize, Vec<f32>>>,
}

impl RowSamples {
    pub fn record(&mut self, month: MonthKey, row: usize, y: f32) {
        self.samples
            .entry(month)
            .or_default()
            .entry(row)
            .or_default()
            .push(y);
    }

    /// Median centre per sampled row, with rows up to the month's last row
    /// projected from the median per-row spacing.
    pub fn centers(&self, month: &ReconstructedMonth) -> Option<RowCenters> {
        let rows = self.samples.get(&month.key())?;
        let mut centers: BTreeMap<usize, f32> = rows
            .iter()
            .filter_map(|(row, ys)| median(ys).map(|y| (*row, y)))
            .collect();
        let known: Vec<(usize, f32)> = centers.iter().map(|(r, y)| (*r, *y)).collect();
        let (min_row, min_y) = *known.first()?;

        if known.len() >= 2 {
            let spacings: Vec<f32> = known
                .windows(2)
                .map(|w| (w[1].1 - w[0].1) / (w[1].0 - w[0].0) as f32)
                .collect();
            if let Some(step) = median(&spacings) {
                for row in min_row..=month.last_row() {
                    centers
                        .entry(row)
                        .or_insert(min_y + step * (row - min_row) as f32);
                }
            }
        }
        Some(RowCenters { centers })
    }
}

/// Vertical centre of each grid row of one month.
#[derive(Debug, Clone, PartialEq)]
pub struct RowCenters {
    centers: BTreeMap<usize, f32>,
}

impl RowCenters {
    pub fn center(&self, row: usize) -> Option<f32> {
        self.centers.get(&row).copied()
    }

    pub fn nearest_row(&self, y: f32) -> Option<usize> {
        self.centers
            .iter()
            .min_by(|a, b| (y - a.1).abs().total_cmp(&(y - b.1).abs()))
            .map(|(row, _)| *row)
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;

    use super::*;
    use crate::geometry::BBox;
    use crate::layout::WeekdayColumn;

    fn monday_first_header(year: i32, month: u32) -> DayHeaderColumns {
        DayHeaderColumns {
            year,
            month,
            columns: WEEK
                .iter()
                .enumerate()
                .map(|(i, wd)| {
                    let x = 50.0 + i as f32 * 25.0;
                    WeekdayColumn {
                        weekday: *wd,
                        ordinal: i,
                        x_center: x,
                        x_range: (x - 13.0, x + 13.0),
                    }
                })
                .collect(),
        }
    }

    #[test]
    fn day_numbers_accept_footnote_marks() {
        assert_eq!(parse_day_number("15"), Some(15));
        assert_eq!(parse_day_number(" 3* "), Some(3));
        assert_eq!(parse_day_number("0"), None);
        assert_eq!(parse_day_number("32"), None);
        assert_eq!(parse_day_number("2025"), None);
        assert_eq!(parse_day_number("M"), None);
    }

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2026, 2), 28);
        assert_eq!(days_in_month(2028, 2), 29);
        assert_eq!(days_in_month(2025, 12), 31);
        assert_eq!(days_in_month(2025, 9), 30);
    }

    #[test]
    fn weekdays_follow_from_day_one() {
        // October 2025 starts on a Wednesday.
        let month = ReconstructedMonth::new(2025, 10, Weekday::Wed, 2);
        assert_eq!(month.days_in_month(), 31);
        assert_eq!(month.weekday(1), Some(Weekday::Wed));
        assert_eq!(month.weekday(27), Some(Weekday::Mon));
        assert_eq!(month.weekday(31), Some(Weekday::Fri));
        assert_eq!(month.weekday(32), None);
        for day in 1..=31 {
            let date = month.date(day).unwrap();
            assert_eq!(month.weekday(day), Some(date.weekday()));
        }
    }

    #[test]
    fn rows_and_cells_agree() {
        let month = ReconstructedMonth::new(2025, 10, Weekday::Wed, 2);
        assert_eq!(month.row_of(1), 0);
        assert_eq!(month.row_of(5), 0);
        assert_eq!(month.row_of(6), 1);
        assert_eq!(month.last_row(), 4);
        assert_eq!(month.day_at(0, 0), None);
        assert_eq!(month.day_at(0, 2), Some(1));
        assert_eq!(month.day_at(3, 0), Some(20));
        assert_eq!(month.day_at(4, 4), Some(31));
        assert_eq!(month.day_at(4, 5), None);
        for day in 1..=31 {
            let column = (2 + day as usize - 1) % 7;
            assert_eq!(month.day_at(month.row_of(day), column), Some(day));
        }
    }

    #[test]
    fn reconstruction_needs_a_day_one_in_a_column() {
        let header = monday_first_header(2025, 10);
        let one = TextSpan::new("1", BBox::new(97.0, 130.0, 103.0, 140.0));
        let stray = TextSpan::new("1", BBox::new(400.0, 130.0, 406.0, 140.0));
        let found = reconstruct_months(
            &[
                DaySpan { day: 1, month: (2025, 10), span: &stray },
                DaySpan { day: 1, month: (2025, 10), span: &one },
            ],
            std::slice::from_ref(&header),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].first_weekday, Weekday::Wed);
        assert_eq!(found[0].first_column, 2);

        let missing = reconstruct_months(&[], std::slice::from_ref(&header));
        assert!(missing.is_empty());
    }

    #[test]
    fn row_centres_use_medians_and_project_missing_rows() {
        let month = ReconstructedMonth::new(2025, 10, Weekday::Wed, 2);
        let mut samples = RowSamples::default();
        for y in [130.0, 131.0, 132.0] {
            samples.record((2025, 10), 0, y);
        }
        samples.record((2025, 10), 1, 150.0);
        samples.record((2025, 10), 3, 191.0);
        let centers = samples.centers(&month).unwrap();
        assert_eq!(centers.center(0), Some(131.0));
        assert_eq!(centers.center(1), Some(150.0));
        assert_eq!(centers.center(3), Some(191.0));
        // Spacings 19 and 20.5 per row: median 19.75.
        assert_eq!(centers.center(2), Some(131.0 + 19.75 * 2.0));
        assert_eq!(centers.center(4), Some(131.0 + 19.75 * 4.0));
        assert_eq!(centers.len(), 5);
        assert_eq!(centers.nearest_row(175.0), Some(2));
    }

    #[test]
    fn single_row_is_not_projected() {
        let month = ReconstructedMonth::new(2025, 10, Weekday::Wed, 2);
        let mut samples = RowSamples::default();
        samples.record((2025, 10), 2, 170.0);
        let centers = samples.centers(&month).unwrap();
        assert_eq!(centers.len(), 1);
        assert!(samples.centers(&ReconstructedMonth::new(2025, 11, Weekday::Sat, 5)).is_none());
    }
}
