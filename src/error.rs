use thiserror::Error;

/// Errors surfaced by the expense tracker. Every failure is reported once
/// through the command loop; none of these abort the process.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed user input, e.g. a non-numeric amount.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An operation referenced an expense id that does not exist.
    #[error("Expense with id {0} not found")]
    NotFound(i64),

    /// Persistence-layer failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A voice transcript had no usable amount or category token.
    #[error("Could not understand transcript: {0}")]
    Parse(String),

    /// Receipt text extraction failed.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Speech capture or transcription failed.
    #[error("Speech error: {0}")]
    Speech(String),

    /// Terminal setup or rendering failure.
    #[error("Terminal error: {0}")]
    Terminal(String),
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Terminal(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = AppError::Validation("Amount must be a number".to_string());
        assert_eq!(err.to_string(), "Validation error: Amount must be a number");
    }

    #[test]
    fn test_not_found_display() {
        let err = AppError::NotFound(42);
        assert_eq!(err.to_string(), "Expense with id 42 not found");
    }

    #[test]
    fn test_from_rusqlite_error() {
        let err: AppError = rusqlite::Error::InvalidParameterName("bad".to_string()).into();
        assert!(matches!(err, AppError::Storage(_)));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "tty gone");
        let err: AppError = io_err.into();
        assert!(matches!(err, AppError::Terminal(_)));
    }
}
