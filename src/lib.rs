//! Cross-tabulated media monitoring reports.
//!
//! A [`ReportBuilder`] counts coded observation records through a
//! [`CountSource`], grouped by country, topic, person sex or print space,
//! and lays the counts and percentages out as six worksheets of a
//! [`ReportDocument`]. The `output` module writes that document as XLSX,
//! tidy CSV or a JSON summary.

pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod reports;
pub mod source;
pub mod types;
pub mod util;
pub mod worksheet;

pub use config::{MediumSpec, MissingRolePolicy, ReportConfig, Role};
pub use error::{ReportError, Result};
pub use reports::ReportBuilder;
pub use source::{CountSource, Field, Query, RecordStore, Value};
pub use types::{Choice, CountrySet, ObservationRecord};
pub use worksheet::{Cell, ReportDocument, ReportWorksheet};
