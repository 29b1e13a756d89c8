pub mod calendar;
pub mod compose;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod notes;
pub mod output;
pub mod reader;
pub mod resolver;
pub mod shading;

pub use compose::{AcademicYear, AcademicYearResult, CoverageReport};
pub use config::Config;
pub use error::ExtractError;
pub use extract::{DocumentContext, Extraction, extract_pages, extract_pdf};
pub use output::{RunSummary, ScheduleDocument};
pub use reader::{PageContent, read_document};
