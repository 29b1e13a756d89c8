//! Assign shaded boxes to calendar dates.
//!
//! Three sources produce [`DateCandidate`]s for a page:
//!
//! 1. Day-number text whose check-point lies strictly inside a coloured box.
//! 2. Override dates, projected onto the grid from their weekday column and
//!    row centre, for cells known to carry no legible digit.
//! 3. Coloured boxes claimed by neither of the above, whose centre is mapped
//!    back to a day through the nearest column and row.
//!
//! Several boxes can claim the same date. [`CandidateSet::resolve`] keeps the
//! candidate with the largest margin, provided it is at least [`MIN_MARGIN`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};

use crate::calendar::{DaySpan, ReconstructedMonth, RowCenters};
use crate::geometry::{BBox, Point};
use crate::layout::{DayHeaderColumns, MonthHeader, MonthKey, month_for_position};
use crate::shading::{Rgb, ShadedBox};

/// Candidates closer than this to a box edge are never authoritative.
pub const MIN_MARGIN: f32 = 1.0;
/// Resolved candidates below this margin are reported for review.
pub const AMBIGUOUS_MARGIN: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CandidateSource {
    DayText,
    Override,
    GridInference,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateCandidate {
    pub date: NaiveDate,
    pub box_id: usize,
    pub rect: BBox,
    pub color: Option<Rgb>,
    /// Distance from the check-point to the nearest box edge.
    pub margin: f32,
    pub check_point: Point,
    pub source: CandidateSource,
}

impl DateCandidate {
    fn new(date: NaiveDate, shaded: &ShadedBox, check_point: Point, source: CandidateSource) -> Self {
        Self {
            date,
            box_id: shaded.id,
            rect: shaded.rect,
            color: shaded.color,
            margin: shaded.rect.edge_margin(check_point),
            check_point,
            source,
        }
    }
}

/// Page geometry together with the months reconstructed so far in the document.
#[derive(Debug, Clone, Copy)]
pub struct PageGrid<'a> {
    pub month_headers: &'a [MonthHeader],
    pub day_headers: &'a [DayHeaderColumns],
    pub months: &'a BTreeMap<MonthKey, ReconstructedMonth>,
    pub row_centers: &'a BTreeMap<MonthKey, RowCenters>,
}

impl<'a> PageGrid<'a> {
    fn day_header(&self, key: MonthKey) -> Option<&'a DayHeaderColumns> {
        self.day_headers.iter().find(|h| h.key() == key)
    }

    /// Month, weekday row and row centres, when all three are known for `key`.
    fn frame(
        &self,
        key: MonthKey,
    ) -> Option<(&'a ReconstructedMonth, &'a DayHeaderColumns, &'a RowCenters)> {
        let month = self.months.get(&key)?;
        let header = self.day_header(key)?;
        let rows = self.row_centers.get(&key).filter(|rows| !rows.is_empty())?;
        Some((month, header, rows))
    }
}

/// Primary path: every day-number span against every coloured box.
pub fn day_text_candidates(day_spans: &[DaySpan<'_>], boxes: &[ShadedBox]) -> Vec<DateCandidate> {
    let mut candidates = Vec::new();
    for shaded in boxes.iter().filter(|b| b.is_highlight()) {
        for day in day_spans {
            let check_point = day.span.bbox.check_point();
            if !shaded.rect.contains_strict(check_point) {
                continue;
            }
            let (year, month) = day.month;
            let Some(date) = NaiveDate::from_ymd_opt(year, month, day.day) else {
                continue;
            };
            candidates.push(DateCandidate::new(
                date,
                shaded,
                check_point,
                CandidateSource::DayText,
            ));
        }
    }
    candidates
}

/// Fallback for listed dates: project each onto the grid and take the
/// best-margin box holding the projected point.
pub fn override_candidates(
    dates: &[NaiveDate],
    existing: &CandidateSet,
    boxes: &[ShadedBox],
    grid: &PageGrid<'_>,
) -> Vec<DateCandidate> {
    let mut candidates = Vec::new();
    for &date in dates {
        if existing.is_resolved(date) {
            continue;
        }
        let Some((month, header, rows)) = grid.frame((date.year(), date.month())) else {
            continue;
        };
        let Some(weekday) = month.weekday(date.day()) else {
            continue;
        };
        let Some(column) = header.column_for(weekday) else {
            continue;
        };
        let Some(row_y) = rows.center(month.row_of(date.day())) else {
            continue;
        };
        let check_point = Point::new(column.x_center, row_y);
        let best = boxes
            .iter()
            .filter(|b| b.is_highlight() && b.rect.contains_strict(check_point))
            .map(|b| DateCandidate::new(date, b, check_point, CandidateSource::Override))
            .filter(|c| c.margin >= MIN_MARGIN)
            .fold(None, keep_best);
        candidates.extend(best);
    }
    candidates
}

/// Fallback for boxes no other path claimed: map the box centre back to a day.
pub fn grid_candidates(
    boxes: &[ShadedBox],
    claimed: &BTreeSet<usize>,
    grid: &PageGrid<'_>,
) -> Vec<DateCandidate> {
    let mut candidates = Vec::new();
    for shaded in boxes.iter().filter(|b| b.is_highlight() && !claimed.contains(&b.id)) {
        let center = shaded.rect.center();
        let Some(header) = month_for_position(center, grid.month_headers) else {
            continue;
        };
        let Some((month, columns, rows)) = grid.frame(header.key()) else {
            continue;
        };
        let Some(column) = columns.column_near(center.x) else {
            continue;
        };
        let Some(row) = rows.nearest_row(center.y) else {
            continue;
        };
        let Some(date) = month.day_at(row, column.ordinal).and_then(|day| month.date(day)) else {
            continue;
        };
        candidates.push(DateCandidate::new(
            date,
            shaded,
            center,
            CandidateSource::GridInference,
        ));
    }
    candidates
}

/// First candidate with the strictly largest margin.
fn keep_best(best: Option<DateCandidate>, candidate: DateCandidate) -> Option<DateCandidate> {
    match best {
        Some(current) if current.margin >= candidate.margin => Some(current),
        _ => Some(candidate),
    }
}

/// The authoritative candidate chosen for one date.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub date: NaiveDate,
    pub chosen: DateCandidate,
    pub candidates: usize,
}

impl Resolution {
    pub fn is_ambiguous(&self) -> bool {
        self.chosen.margin < AMBIGUOUS_MARGIN
    }
}

/// All candidates of one page, grouped by date.
#[derive(Debug, Default, Clone)]
pub struct CandidateSet {
    by_date: BTreeMap<NaiveDate, Vec<DateCandidate>>,
}

impl CandidateSet {
    pub fn extend(&mut self, candidates: impl IntoIterator<Item = DateCandidate>) {
        for candidate in candidates {
            self.by_date.entry(candidate.date).or_default().push(candidate);
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.by_date.contains_key(&date)
    }

    /// Whether some candidate for `date` is far enough from its box edge to count.
    pub fn is_resolved(&self, date: NaiveDate) -> bool {
        self.candidates(date).iter().any(|c| c.margin >= MIN_MARGIN)
    }

    pub fn candidates(&self, date: NaiveDate) -> &[DateCandidate] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    /// Box ids chosen by a resolved date. Boxes behind discarded candidates stay free.
    pub fn claimed_boxes(&self) -> BTreeSet<usize> {
        self.resolve().into_iter().map(|r| r.chosen.box_id).collect()
    }

    /// Best candidate per date; dates whose every margin is below [`MIN_MARGIN`] are dropped.
    pub fn resolve(&self) -> Vec<Resolution> {
        self.by_date
            .iter()
            .filter_map(|(date, candidates)| {
                let chosen = candidates
                    .iter()
                    .filter(|c| c.margin >= MIN_MARGIN)
                    .cloned()
                    .fold(None, keep_best)?;
                Some(Resolution {
                    date: *date,
                    chosen,
                    candidates: candidates.len(),
                })
            })
            .collect()
    }
}
