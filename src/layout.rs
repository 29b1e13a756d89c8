//! Month headers ("October 2025") and weekday-initial rows ("M T W T F S S").
//!
//! Calendars are not detected as tables. A month header anchors a fixed-size
//! region below and to the right of it, and every later lookup attributes
//! text and shapes to whichever region contains them.

use chrono::Weekday;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::geometry::{BBox, Point};
use crate::notes::month_number;
use crate::reader::TextLine;

/// Assumed calendar width (seven columns of roughly 25 units).
pub const CALENDAR_WIDTH: f32 = 180.0;
/// Assumed calendar height (title, weekday row and up to six weeks).
pub const CALENDAR_HEIGHT: f32 = 150.0;
/// Horizontal slack around each weekday letter when assigning columns.
pub const COLUMN_TOLERANCE: f32 = 10.0;

static MONTH_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{4})",
    )
    .expect("month header pattern is valid")
});

/// `(year, month)` of a calendar month.
pub type MonthKey = (i32, u32);

#[derive(Debug, Clone, PartialEq)]
pub struct MonthHeader {
    pub year: i32,
    pub month: u32,
    /// Bounding box of the header text itself.
    pub anchor: BBox,
    /// Region assumed to hold the month's grid.
    pub region: BBox,
}

impl MonthHeader {
    pub fn new(year: i32, month: u32, anchor: BBox) -> Self {
        let region = BBox::new(
            anchor.x0,
            anchor.y0,
            anchor.x0 + CALENDAR_WIDTH,
            anchor.y0 + CALENDAR_HEIGHT,
        );
        Self {
            year,
            month,
            anchor,
            region,
        }
    }

    pub fn key(&self) -> MonthKey {
        (self.year, self.month)
    }

    /// Inclusive on every edge.
    pub fn contains(&self, p: Point) -> bool {
        self.region.x0 <= p.x && p.x <= self.region.x1 && self.region.y0 <= p.y && p.y <= self.region.y1
    }
}

/// One weekday column of a month grid.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekdayColumn {
    pub weekday: Weekday,
    /// Position of the column in the header row, `0..7`.
    pub ordinal: usize,
    pub x_center: f32,
    pub x_range: (f32, f32),
}

impl WeekdayColumn {
    pub fn contains_x(&self, x: f32) -> bool {
        self.x_range.0 <= x && x <= self.x_range.1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayHeaderColumns {
    pub year: i32,
    pub month: u32,
    pub columns: Vec<WeekdayColumn>,
}

impl DayHeaderColumns {
    pub fn key(&self) -> MonthKey {
        (self.year, self.month)
    }

    pub fn column_containing(&self, x: f32) -> Option<&WeekdayColumn> {
        self.columns.iter().find(|c| c.contains_x(x))
    }

    /// Column whose range covers `x`, else the one with the closest centre.
    pub fn column_near(&self, x: f32) -> Option<&WeekdayColumn> {
        self.column_containing(x).or_else(|| {
            self.columns
                .iter()
                .min_by(|a, b| (x - a.x_center).abs().total_cmp(&(x - b.x_center).abs()))
        })
    }

    pub fn column_for(&self, weekday: Weekday) -> Option<&WeekdayColumn> {
        self.columns.iter().find(|c| c.weekday == weekday)
    }
}

/// Supported weekday-initial orderings and the weekday of each position.
const MONDAY_FIRST: (&str, [Weekday; 7]) = (
    "MTWTFSS",
    [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ],
);
const SUNDAY_FIRST: (&str, [Weekday; 7]) = (
    "SMTWTFS",
    [
        Weekday::Sun,
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ],
);

/// Find every "Month YYYY" occurrence, sorted top-to-bottom then left-to-right.
pub fn find_month_headers(lines: &[TextLine]) -> Vec<MonthHeader> {
    let mut headers = Vec::new();
    for line in lines {
        // Byte ranges of each span within the joined line text.
        let mut text = String::new();
        let mut ranges = Vec::with_capacity(line.spans.len());
        for span in &line.spans {
            if !text.is_empty() {
                text.push(' ');
            }
            let start = text.len();
            text.push_str(&span.text);
            ranges.push((start, text.len()));
        }

        for caps in MONTH_HEADER.captures_iter(&text) {
            let (Some(whole), Some(name), Some(year)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let (Some(month), Ok(year)) = (month_number(name.as_str()), year.as_str().parse::<i32>()) else {
                continue;
            };
            let anchor = line
                .spans
                .iter()
                .zip(&ranges)
                .filter(|(_, (start, end))| *start < whole.end() && whole.start() < *end)
                .map(|(span, _)| span.bbox)
                .reduce(|a, b| a.union(&b));
            if let Some(anchor) = anchor {
                headers.push(MonthHeader::new(year, month, anchor));
            }
        }
    }
    headers.sort_by(|a, b| {
        a.anchor
            .y0
            .total_cmp(&b.anchor.y0)
            .then(a.anchor.x0.total_cmp(&b.anchor.x0))
    });
    headers
}

/// For each month header, the first weekday-initial row inside its region.
pub fn find_day_headers(lines: &[TextLine], months: &[MonthHeader]) -> Vec<DayHeaderColumns> {
    let mut found = Vec::new();
    for month in months {
        for line in lines {
            if line.bbox.y0 < month.region.y0 || line.bbox.y0 > month.region.y1 {
                continue;
            }
            let letters: Vec<_> = line
                .spans
                .iter()
                .filter(|s| month.contains(s.bbox.top_left()))
                .filter_map(|s| weekday_initial(&s.text).map(|c| (c, s.bbox)))
                .take(7)
                .collect();
            if letters.len() < 7 {
                continue;
            }
            let pattern: String = letters.iter().map(|(c, _)| *c).collect();
            let weekdays = if pattern == MONDAY_FIRST.0 {
                MONDAY_FIRST.1
            } else if pattern == SUNDAY_FIRST.0 {
                SUNDAY_FIRST.1
            } else {
                continue;
            };
            let columns = letters
                .iter()
                .zip(weekdays)
                .enumerate()
                .map(|(ordinal, ((_, bbox), weekday))| WeekdayColumn {
                    weekday,
                    ordinal,
                    x_center: bbox.center().x,
                    x_range: (bbox.x0 - COLUMN_TOLERANCE, bbox.x1 + COLUMN_TOLERANCE),
                })
                .collect();
            found.push(DayHeaderColumns {
                year: month.year,
                month: month.month,
                columns,
            });
            break;
        }
    }
    found
}

fn weekday_initial(text: &str) -> Option<char> {
    let mut chars = text.trim().chars();
    let c = chars.next()?.to_ascii_uppercase();
    if chars.next().is_none() && "MTWFS".contains(c) {
        Some(c)
    } else {
        None
    }
}

/// The month whose region holds `p`, preferring the header nearest to it.
pub fn month_for_position(p: Point, headers: &[MonthHeader]) -> Option<&MonthHeader> {
    headers
        .iter()
        .filter(|h| h.contains(p))
        .min_by(|a, b| {
            p.distance(a.region.top_left())
                .total_cmp(&p.distance(b.region.top_left()))
        })
}
