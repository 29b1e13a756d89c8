use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::ExtractError;

pub const DEFAULT_OUTPUT: &str = "schooldays.json";

const DEFAULT_SOURCES: [(&str, &str); 2] = [
    (
        "2025-2026",
        "https://www.utcsheffield.org.uk/olp/assets/sites/3/2025/03/UTC-Sheffield-City-and-OLP-Term-Dates-2025-2026-website-V2.pdf",
    ),
    (
        "2026-2027",
        "https://www.utcsheffield.org.uk/city/assets/sites/2/2025/10/UTC-Sheffield-Term-Dates-2026-27.pdf",
    ),
];

/// Cells in the 2025-2026 calendar that are shaded but carry no extractable digit.
const DEFAULT_OVERRIDES: [(i32, u32, u32); 4] = [(2026, 7, 23), (2026, 7, 24), (2026, 7, 30), (2026, 7, 31)];

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Source {
    pub academic_year: String,
    pub url: String,
}

/// Dates resolved from geometry alone for one academic year.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverrideList {
    pub academic_year: String,
    pub holidays: Vec<NaiveDate>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default = "default_sources")]
    pub sources: Vec<Source>,
    #[serde(default = "default_overrides")]
    pub overrides: Vec<OverrideList>,
    pub cache_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            overrides: default_overrides(),
            cache_dir: None,
            output: None,
        }
    }
}

fn default_sources() -> Vec<Source> {
    DEFAULT_SOURCES
        .iter()
        .map(|(year, url)| Source {
            academic_year: year.to_string(),
            url: url.to_string(),
        })
        .collect()
}

fn default_overrides() -> Vec<OverrideList> {
    vec![OverrideList {
        academic_year: "2025-2026".to_string(),
        holidays: DEFAULT_OVERRIDES
            .iter()
            .filter_map(|(y, m, d)| NaiveDate::from_ymd_opt(*y, *m, *d))
            .collect(),
        note: Some("shaded July cells with no text layer".to_string()),
    }]
}

impl Config {
    /// Read a TOML file; sections it leaves out keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Every override date listed for `academic_year`, sorted and deduplicated.
    pub fn overrides_for(&self, academic_year: &str) -> Vec<NaiveDate> {
        let mut dates: Vec<_> = self
            .overrides
            .iter()
            .filter(|o| o.academic_year == academic_year)
            .flat_map(|o| o.holidays.iter().copied())
            .collect();
        dates.sort();
        dates.dedup();
        dates
    }

    /// Notes attached to the override lists for `academic_year`.
    pub fn override_notes(&self, academic_year: &str) -> Vec<&str> {
        self.overrides
            .iter()
            .filter(|o| o.academic_year == academic_year)
            .filter_map(|o| o.note.as_deref())
            .collect()
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_cover_both_published_years() {
        let config = Config::default();
        let years: Vec<_> = config.sources.iter().map(|s| s.academic_year.as_str()).collect();
        assert_eq!(years, vec!["2025-2026", "2026-2027"]);
        assert_eq!(config.overrides_for("2025-2026").len(), 4);
        assert!(config.overrides_for("2026-2027").is_empty());
        assert_eq!(config.override_notes("2025-2026").len(), 1);
        assert_eq!(config.output_path(), PathBuf::from("schooldays.json"));
        assert_eq!(config.cache_dir(), PathBuf::from("."));
    }

    #[test]
    fn file_values_replace_defaults_section_by_section() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
output = "out/dates.json"

[[overrides]]
academic_year = "2026-2027"
holidays = ["2027-07-22", "2027-07-21", "2027-07-22"]
note = "unlabelled end-of-year cells"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.output_path(), PathBuf::from("out/dates.json"));
        assert!(config.overrides_for("2025-2026").is_empty());
        assert!(config.override_notes("2025-2026").is_empty());
        assert_eq!(config.override_notes("2026-2027"), vec!["unlabelled end-of-year cells"]);
        assert_eq!(
            config.overrides_for("2026-2027"),
            vec![
                NaiveDate::from_ymd_opt(2027, 7, 21).unwrap(),
                NaiveDate::from_ymd_opt(2027, 7, 22).unwrap(),
            ]
        );
    }

    #[test]
    fn malformed_dates_are_config_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[overrides]]\nacademic_year = \"2025-2026\"\nholidays = [\"23/07/2026\"]").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ExtractError::Config(_))));
    }
}
