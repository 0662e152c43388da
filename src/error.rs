use thiserror::Error;

pub type Result<T> = std::result::Result<T, BloomError>;

/// Failures reported by a [`BitStore`](crate::BitStore).
///
/// The variants are deliberately coarse: callers use them to decide whether
/// a call is worth retrying (`Connection`, `Timeout`) or whether the filter
/// is unusable as configured (`WrongType`, `Protocol`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store connection failed: {0}")]
    Connection(String),

    #[error("Wrong value type at key: {0}")]
    WrongType(String),

    #[error("Store operation timed out: {0}")]
    Timeout(String),

    #[error("Store protocol error: {0}")]
    Protocol(String),
}

#[derive(Error, Debug)]
pub enum BloomError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to parse environment variable {var_name}: value '{value}' - {error}")]
    EnvParseError {
        var_name: String,
        value: String,
        error: String,
    },
}

impl BloomError {
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, BloomError::InvalidParameter(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, BloomError::Store(StoreError::Connection(_)))
    }

    pub fn is_wrong_type(&self) -> bool {
        matches!(self, BloomError::Store(StoreError::WrongType(_)))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, BloomError::Store(StoreError::Timeout(_)))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, BloomError::Store(StoreError::Protocol(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_keep_their_kind() {
        let err: BloomError = StoreError::WrongType("bloom.0".into()).into();
        assert!(err.is_wrong_type());
        assert!(!err.is_connection());
        assert_eq!(err.to_string(), "Wrong value type at key: bloom.0");

        let err: BloomError = StoreError::Timeout("read".into()).into();
        assert!(err.is_timeout());

        let err = BloomError::InvalidParameter("Capacity must be > 0".into());
        assert!(err.is_invalid_parameter());
        assert!(!err.is_protocol());
    }
}
