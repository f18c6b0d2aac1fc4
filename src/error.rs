//! Error types for the bitmap index

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Cannot build an index from an empty member set")]
    EmptyInput,

    #[error("Index payload is empty")]
    EmptyData,

    #[error("Buffer too short: {0} bytes (need header plus at least one payload byte)")]
    TruncatedBuffer(usize),

    #[error("Invalid index format: {0}")]
    InvalidFormat(String),

    #[error("Index span of {blocks} blocks exceeds limit of {max}")]
    SpanTooLarge { blocks: u64, max: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IndexError {
    /// Stable error code, suitable for logs and cache diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::EmptyInput => "EMPTY_INPUT",
            IndexError::EmptyData => "EMPTY_DATA",
            IndexError::TruncatedBuffer(_) => "TRUNCATED_BUFFER",
            IndexError::InvalidFormat(_) => "INVALID_FORMAT",
            IndexError::SpanTooLarge { .. } => "SPAN_TOO_LARGE",
            _ => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(IndexError::EmptyInput.code(), "EMPTY_INPUT");
        assert_eq!(IndexError::TruncatedBuffer(8).code(), "TRUNCATED_BUFFER");
        assert_eq!(
            IndexError::SpanTooLarge { blocks: 10, max: 4 }.code(),
            "SPAN_TOO_LARGE"
        );
        let io = IndexError::from(std::io::Error::new(std::io::ErrorKind::Other, "x"));
        assert_eq!(io.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_error_messages() {
        let err = IndexError::TruncatedBuffer(8);
        assert!(err.to_string().contains("8 bytes"));
        let err = IndexError::SpanTooLarge { blocks: 10, max: 4 };
        assert_eq!(err.to_string(), "Index span of 10 blocks exceeds limit of 4");
    }
}
