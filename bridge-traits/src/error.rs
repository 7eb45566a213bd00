use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Resolver library not initialized")]
    NotInitialized,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_errors_convert() {
        let err: BridgeError = io::Error::from(io::ErrorKind::AddrNotAvailable).into();
        assert!(matches!(err, BridgeError::Io(_)));
        assert!(err.to_string().starts_with("IO error"));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            BridgeError::NotInitialized.to_string(),
            "Resolver library not initialized"
        );
        assert_eq!(
            BridgeError::InvalidQuery("empty name".to_string()).to_string(),
            "Invalid query: empty name"
        );
    }
}
