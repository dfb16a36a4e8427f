//! Error types for the planner.
//!
//! Querying a day that was never loaded and propagating a task that no
//! execution references are not errors; both are logged no-ops.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid duration format: {0:?}")]
    InvalidDurationFormat(String),

    #[error("Invalid day: {0:?} (expected YYYY-MM-DD)")]
    InvalidDay(String),

    #[error("Invalid exchange direction: {0} (expected 1 or -1)")]
    InvalidDirection(i64),

    #[error("Task execution not found: {0}")]
    ExecutionNotFound(i64),

    #[error("Remote service error: {0}")]
    Remote(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let err = Error::InvalidDurationFormat("1.2.3".to_string());
        assert_eq!(err.to_string(), "Invalid duration format: \"1.2.3\"");

        let err = Error::InvalidDirection(3);
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn json_errors_convert() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }
}
