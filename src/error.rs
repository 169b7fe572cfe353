//! Error types for fastngram

/// Every failure is a precondition violation reported immediately; nothing
/// here is retryable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Trie page pool exhausted at {pages} pages")]
    CapacityExhausted { pages: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfiguration(msg.into())
    }

    pub(crate) fn argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("ngram_size 5 out of [2, 4] range");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: ngram_size 5 out of [2, 4] range"
        );

        let err = Error::CapacityExhausted { pages: 1 << 30 };
        assert!(err.to_string().contains("1073741824"));
    }
}
