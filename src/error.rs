use std::error::Error;
use std::fmt;
use std::sync::PoisonError;

#[derive(Debug)]
pub enum RelayError {
    // Registry errors
    RegistryLock(String),

    // Protocol negotiation errors
    InvalidCategory(String),

    // Connection errors
    ConnectionError(String),
    ConnectionClosed,
    SendTimeout,

    // Message errors
    Serialization(String),
    MessageParseError(String),

    // Configuration errors
    ConfigError(String),

    // System errors
    SystemError(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegistryLock(msg) => write!(f, "Registry lock error: {}", msg),
            Self::InvalidCategory(name) => write!(f, "Invalid category: {:?}", name),
            Self::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            Self::ConnectionClosed => write!(f, "Connection closed"),
            Self::SendTimeout => write!(f, "Send timed out"),
            Self::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Self::MessageParseError(msg) => write!(f, "Message parse error: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Self::SystemError(msg) => write!(f, "System error: {}", msg),
        }
    }
}

impl Error for RelayError {}

// Converting from PoisonError to facilitate poisoned mutex handling
impl<T> From<PoisonError<T>> for RelayError {
    fn from(err: PoisonError<T>) -> Self {
        RelayError::RegistryLock(format!("Mutex poisoned: {}", err))
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::MessageParseError(err.to_string())
    }
}

// Generic result type for the relay
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_poisoned_mutex_maps_to_registry_lock() {
        let lock = Arc::new(Mutex::new(0));
        let poisoner = lock.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        let err: RelayError = lock.lock().unwrap_err().into();
        assert!(matches!(err, RelayError::RegistryLock(_)));
        assert!(err.to_string().starts_with("Registry lock error"));
    }

    #[test]
    fn test_display_invalid_category() {
        let err = RelayError::InvalidCategory("bogus".to_string());
        assert_eq!(err.to_string(), "Invalid category: \"bogus\"");
    }
}
