use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, warn};

use crate::calendar::{ReconstructedMonth, RowCenters, RowSamples, collect_day_spans, reconstruct_months};
use crate::compose::{AcademicYear, AcademicYearResult, CoverageReport, analyze, compose};
use crate::error::ExtractError;
use crate::layout::{MonthKey, find_day_headers, find_month_headers};
use crate::notes::{dated_mentions, exam_results_days, expected_schoolday_counts};
use crate::reader::{PageContent, read_document};
use crate::resolver::{
    CandidateSet, CandidateSource, PageGrid, Resolution, day_text_candidates, grid_candidates,
    override_candidates,
};
use crate::shading::{detect_shaded_boxes, summarize_colors};

/// Day numbers below this fraction of the page height belong to footnotes.
pub const FOOTER_FRACTION: f32 = 0.85;

/// Counters gathered while walking a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub pages: usize,
    pub month_headers: usize,
    pub day_headers: usize,
    pub day_numbers: usize,
    pub shaded_boxes: usize,
    pub candidates: usize,
    pub ambiguous: usize,
}

/// Everything produced for one academic year.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub result: AcademicYearResult,
    pub report: CoverageReport,
    pub stats: ExtractionStats,
}

/// State for one document. Months and row samples carry over to later pages;
/// boxes and candidates stay with their page.
pub struct DocumentContext {
    year: AcademicYear,
    overrides: Vec<NaiveDate>,
    months: BTreeMap<MonthKey, ReconstructedMonth>,
    row_samples: RowSamples,
    shaded: BTreeMap<NaiveDate, Resolution>,
    exam_results: BTreeSet<NaiveDate>,
    mentions: BTreeSet<NaiveDate>,
    expected_counts: BTreeMap<MonthKey, u32>,
    stats: ExtractionStats,
}

impl DocumentContext {
    pub fn new(year: AcademicYear, overrides: Vec<NaiveDate>) -> Self {
        Self {
            year,
            overrides,
            months: BTreeMap::new(),
            row_samples: RowSamples::default(),
            shaded: BTreeMap::new(),
            exam_results: BTreeSet::new(),
            mentions: BTreeSet::new(),
            expected_counts: BTreeMap::new(),
            stats: ExtractionStats::default(),
        }
    }

    pub fn process_page(&mut self, page: &PageContent) {
        self.stats.pages += 1;
        let text = page.text();
        self.exam_results.extend(exam_results_days(&text));
        self.mentions.extend(dated_mentions(&text));
        self.expected_counts.extend(expected_schoolday_counts(&text));

        let month_headers = find_month_headers(&page.lines);
        let day_headers = find_day_headers(&page.lines, &month_headers);
        let footer_y = page.height * FOOTER_FRACTION;
        let day_spans = collect_day_spans(page.spans(), &month_headers, footer_y);

        for month in reconstruct_months(&day_spans, &day_headers) {
            debug!(
                page = page.index,
                year = month.year,
                month = month.month,
                first_weekday = %month.first_weekday,
                "reconstructed month"
            );
            self.months.insert(month.key(), month);
        }

        for day in &day_spans {
            if let Some(month) = self.months.get(&day.month) {
                if day.day <= month.days_in_month() {
                    self.row_samples
                        .record(day.month, month.row_of(day.day), day.span.bbox.check_point().y);
                }
            }
        }
        let row_centers: BTreeMap<MonthKey, RowCenters> = self
            .months
            .values()
            .filter_map(|m| self.row_samples.centers(m).map(|c| (m.key(), c)))
            .collect();

        let boxes = detect_shaded_boxes(&page.fills);
        for (color, summary) in summarize_colors(&boxes) {
            debug!(
                page = page.index,
                %color,
                count = summary.count,
                width = ?(summary.min_width, summary.max_width),
                height = ?(summary.min_height, summary.max_height),
                "shaded boxes"
            );
        }

        let grid = PageGrid {
            month_headers: &month_headers,
            day_headers: &day_headers,
            months: &self.months,
            row_centers: &row_centers,
        };
        let mut candidates = CandidateSet::default();
        candidates.extend(day_text_candidates(&day_spans, &boxes));
        let overrides = override_candidates(&self.overrides, &candidates, &boxes, &grid);
        candidates.extend(overrides);
        let claimed = candidates.claimed_boxes();
        candidates.extend(grid_candidates(&boxes, &claimed, &grid));

        let resolved = candidates.resolve();
        for resolution in resolved.iter().filter(|r| r.is_ambiguous()) {
            warn!(
                page = page.index,
                date = %resolution.date,
                margin = resolution.chosen.margin,
                color = %resolution.chosen.color.map(|c| c.to_string()).unwrap_or_default(),
                "ambiguous shaded-cell match"
            );
        }
        for resolution in &resolved {
            debug!(
                page = page.index,
                date = %resolution.date,
                source = ?resolution.chosen.source,
                box_id = resolution.chosen.box_id,
                margin = resolution.chosen.margin,
                candidates = resolution.candidates,
                "resolved shaded date"
            );
        }

        self.stats.month_headers += month_headers.len();
        self.stats.day_headers += day_headers.len();
        self.stats.day_numbers += day_spans.len();
        self.stats.shaded_boxes += boxes.len();
        self.stats.candidates += candidates.len();
        self.stats.ambiguous += resolved.iter().filter(|r| r.is_ambiguous()).count();
        info!(
            page = page.index,
            months = month_headers.len(),
            day_numbers = day_spans.len(),
            boxes = boxes.len(),
            shaded_dates = resolved.len(),
            "processed page"
        );

        for resolution in resolved {
            let keep_existing = self
                .shaded
                .get(&resolution.date)
                .is_some_and(|existing| existing.chosen.margin >= resolution.chosen.margin);
            if !keep_existing {
                self.shaded.insert(resolution.date, resolution);
            }
        }
    }

    pub fn finish(self) -> Extraction {
        let shaded: BTreeSet<NaiveDate> = self.shaded.keys().copied().collect();
        let mut result = compose(&self.year, &shaded, &self.exam_results);
        let holidays: BTreeSet<NaiveDate> = result.holidays.iter().copied().collect();
        result.override_holidays = self
            .shaded
            .values()
            .filter(|r| r.chosen.source == CandidateSource::Override && holidays.contains(&r.date))
            .map(|r| r.date)
            .collect();

        let expected: BTreeMap<MonthKey, u32> = self
            .expected_counts
            .iter()
            .filter(|((year, month), _)| {
                NaiveDate::from_ymd_opt(*year, *month, 1).is_some_and(|d| self.year.contains(d))
            })
            .map(|(k, v)| (*k, *v))
            .collect();
        let mut report = analyze(&result, &expected);
        report.unreconstructed_months = self
            .year
            .months()
            .into_iter()
            .filter(|key| !self.months.contains_key(key))
            .collect();
        let schooldays: BTreeSet<NaiveDate> = result.schooldays.iter().copied().collect();
        report.mentioned_schooldays = self
            .mentions
            .iter()
            .filter(|d| schooldays.contains(d))
            .copied()
            .collect();

        log_report(&self.year, &result, &report);
        Extraction {
            result,
            report,
            stats: self.stats,
        }
    }
}

fn log_report(year: &AcademicYear, result: &AcademicYearResult, report: &CoverageReport) {
    for (y, m) in &report.unreconstructed_months {
        warn!(
            academic_year = year.label(),
            month = %format!("{y}-{m:02}"),
            "month never reconstructed; its weekdays default to schooldays"
        );
    }
    for check in report.month_checks.iter().filter(|c| !c.matches()) {
        let (y, m) = check.month;
        warn!(
            academic_year = year.label(),
            month = %format!("{y}-{m:02}"),
            expected = check.expected,
            actual = check.actual,
            "schoolday count differs from the printed total"
        );
    }
    for date in &report.mentioned_schooldays {
        debug!(
            academic_year = year.label(),
            %date,
            weekday = %date.weekday(),
            "dated mention classified as schoolday"
        );
    }
    if !report.overlap.is_empty() {
        warn!(academic_year = year.label(), dates = ?report.overlap, "dates are both schoolday and holiday");
    }
    info!(
        academic_year = year.label(),
        schooldays = result.schooldays.len(),
        holidays = result.holidays.len(),
        exam_results_days = result.exam_results_days.len(),
        override_holidays = result.override_holidays.len(),
        coverage_percent = report.coverage_percent(),
        "composed academic year"
    );
}

/// Run every page of an already-read document through one context.
pub fn extract_pages(pages: &[PageContent], year: AcademicYear, overrides: Vec<NaiveDate>) -> Extraction {
    let mut context = DocumentContext::new(year, overrides);
    for page in pages {
        context.process_page(page);
    }
    context.finish()
}

pub fn extract_pdf(
    path: impl AsRef<Path>,
    year: AcademicYear,
    overrides: Vec<NaiveDate>,
) -> Result<Extraction, ExtractError> {
    let path = path.as_ref();
    info!(path = %path.display(), academic_year = year.label(), "reading PDF");
    let pages = read_document(path)?;
    Ok(extract_pages(&pages, year, overrides))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_keeps_every_month_flagged() {
        let year = AcademicYear::parse("2025-2026").unwrap();
        let extraction = extract_pages(&[], year, Vec::new());
        assert!(extraction.result.holidays.is_empty());
        assert_eq!(extraction.report.unreconstructed_months.len(), 12);
        assert_eq!(extraction.stats, ExtractionStats::default());
    }

    #[test]
    fn footer_text_contributes_exam_days_and_mentions() {
        use crate::geometry::BBox;
        use crate::reader::{TextLine, TextSpan};

        let line = |text: &str, y: f32| {
            TextLine::new(vec![TextSpan::new(text, BBox::new(40.0, y, 400.0, y + 10.0))])
        };
        let page = PageContent {
            index: 0,
            width: 595.0,
            height: 842.0,
            lines: vec![
                line("Results: A Level - 13 August 2026", 780.0),
                line("INSET day 3 November 2025", 800.0),
            ],
            fills: Vec::new(),
        };
        let year = AcademicYear::parse("2025-2026").unwrap();
        let extraction = extract_pages(&[page], year, Vec::new());
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(extraction.result.exam_results_days, vec![d(2026, 8, 13)]);
        assert!(extraction.result.holidays.contains(&d(2026, 8, 13)));
        assert!(extraction.result.schooldays.contains(&d(2025, 11, 3)));
        assert_eq!(extraction.report.mentioned_schooldays, vec![d(2025, 11, 3)]);
    }
}
