use std::collections::BTreeMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::layout::MonthKey;

const MONTH_NAMES: &str =
    "January|February|March|April|May|June|July|August|September|October|November|December";

static EXAM_RESULTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)(?:A Level|GCSE)\s*[-–]\s*(\d{{1,2}})\s+({MONTH_NAMES})\s+(\d{{4}})"
    ))
    .expect("exam results pattern is valid")
});

static DATED_MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)(\d{{1,2}})\s+({MONTH_NAMES})\s+(\d{{4}})"))
        .expect("dated mention pattern is valid")
});

static EXPECTED_COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|Jun(?:e)?|Jul(?:y)?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)\s+(\d{4})\s+\((\d+)\s+days?\)",
    )
    .expect("expected count pattern is valid")
});

/// Month number from an English month name or its three-letter prefix.
pub fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn dates_matching(pattern: &Regex, text: &str) -> Vec<NaiveDate> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let day = caps.get(1)?.as_str().parse::<u32>().ok()?;
            let month = month_number(caps.get(2)?.as_str())?;
            let year = caps.get(3)?.as_str().parse::<i32>().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })
        .collect()
}

/// Results days announced as "A Level - 13 August 2026" or "GCSE – 20 August 2026".
pub fn exam_results_days(text: &str) -> Vec<NaiveDate> {
    dates_matching(&EXAM_RESULTS, text)
}

/// Every "D Month YYYY" in the text. Impossible dates are dropped.
pub fn dated_mentions(text: &str) -> Vec<NaiveDate> {
    dates_matching(&DATED_MENTION, text)
}

/// Schoolday totals printed next to month titles, e.g. "September 2025 (22 days)".
pub fn expected_schoolday_counts(text: &str) -> BTreeMap<MonthKey, u32> {
    EXPECTED_COUNT
        .captures_iter(text)
        .filter_map(|caps| {
            let month = month_number(caps.get(1)?.as_str())?;
            let year = caps.get(2)?.as_str().parse::<i32>().ok()?;
            let count = caps.get(3)?.as_str().parse::<u32>().ok()?;
            Some(((year, month), count))
        })
        .collect()
}
