//! Error taxonomy for the optimization engine.
//!
//! Fatal conditions surface as [`EngineError`] from the pipeline boundary;
//! malformed rows are never fatal (numeric cells coerce to zero and the run
//! continues). The `category` accessor feeds structured logs and the HTTP
//! status mapping in the server layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Caller supplied no payload at all.
    #[error("no workbook payload supplied")]
    NoFile,

    /// A sheet required by the current run mode is absent.
    #[error("required sheet {sheet:?} is missing from the workbook")]
    MissingSheet { sheet: String },

    /// The payload is not a readable xlsx archive.
    #[error("workbook payload could not be parsed: {0}")]
    Workbook(String),

    /// An output artifact failed to serialize.
    #[error("failed to render output artifact: {0}")]
    Render(String),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn missing_sheet(sheet: impl Into<String>) -> Self {
        EngineError::MissingSheet {
            sheet: sheet.into(),
        }
    }

    /// Coarse category used for log fields and error metrics.
    pub fn category(&self) -> &'static str {
        match self {
            EngineError::NoFile => "no_file",
            EngineError::MissingSheet { .. } => "missing_sheet",
            EngineError::Workbook(_) => "malformed_workbook",
            EngineError::Render(_) => "render",
            EngineError::Io(_) => "io",
        }
    }

    /// Whether the fault lies with the uploaded payload rather than the
    /// engine. Drives the 4xx/5xx split in the HTTP layer.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::NoFile | EngineError::MissingSheet { .. } | EngineError::Workbook(_)
        )
    }
}
