use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unrecognised log file name '{name}': {reason}")]
    FileName { name: String, reason: String },

    #[error("Malformed log record: {reason}")]
    Record { reason: String },

    #[error("Malformed label map line '{line}': {reason}")]
    LabelMap { line: String, reason: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
