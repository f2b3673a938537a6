use thiserror::Error;

/// Everything that can abort a report build or one of its outputs.
///
/// A build either produces a full document or one of these; there is no
/// partial result.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("query against {medium} failed: {message}")]
    Query { medium: String, message: String },

    #[error("medium {medium} has no {role} role")]
    MissingRole { medium: String, role: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
