//! Application-wide error types.

use thiserror::Error;

use crate::llm::ProviderError;
use crate::sources::IngestError;
use crate::tools::ValidationError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("llm error: {0}")]
    Llm(#[from] ProviderError),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_display() {
        let e = AppError::Config("missing field".into());
        assert!(e.to_string().contains("missing field"));
    }

    #[test]
    fn logger_error_display() {
        let e = AppError::Logger("already initialized".into());
        assert!(e.to_string().contains("already initialized"));
    }

    #[test]
    fn not_found_display() {
        let e = AppError::NotFound("notebook 42".into());
        assert_eq!(e.to_string(), "not found: notebook 42");
    }

    #[test]
    fn provider_error_converts() {
        let e: AppError = ProviderError::Request("connection refused".into()).into();
        assert!(e.to_string().starts_with("llm error"));
        assert!(e.to_string().contains("connection refused"));
    }

    #[test]
    fn validation_error_converts() {
        let e: AppError = ValidationError::field("topic", "too short").into();
        assert!(e.to_string().contains("topic"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let e: AppError = io_err.into();
        assert!(e.to_string().contains("io error"));
        let _: &dyn Error = &e;
    }
}
