use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Preconditions failed: {0}")]
    PreconditionsFailed(String),

    #[error("Analysis failure: {0}")]
    AnalysisFailure(String),

    #[error("Every drift sample was trimmed as an outlier; no average drift can be computed")]
    DriftSamplesExhausted,

    #[error("Invalid analysis parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid fix timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Error while reading the track CSV: {0}")]
    CsvError(#[from] csv::Error),
}

impl PartialEq for AnalysisError {
    fn eq(&self, other: &Self) -> bool {
        use AnalysisError::*;
        match (self, other) {
            (PreconditionsFailed(a), PreconditionsFailed(b)) => a == b,
            (AnalysisFailure(a), AnalysisFailure(b)) => a == b,
            (InvalidParameter(a), InvalidParameter(b)) => a == b,
            (InvalidTimestamp(a), InvalidTimestamp(b)) => a == b,

            // payloads are not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            (DriftSamplesExhausted, DriftSamplesExhausted) => true,

            _ => false,
        }
    }
}
