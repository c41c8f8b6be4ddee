//! Error types for the object pool

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::factory::BoxError;

/// The factory hook that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryOperation {
    Create,
    Destroy,
    Validate,
    Activate,
    Passivate,
}

impl fmt::Display for FactoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Destroy => "destroy",
            Self::Validate => "validate",
            Self::Activate => "activate",
            Self::Passivate => "passivate",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone)]
pub enum PoolError {
    #[error("Pool exhausted - no object became available within {waited:?}")]
    Exhausted { waited: Duration },

    #[error("Pool is closed")]
    Closed,

    #[error("Object is not currently borrowed from this pool")]
    UnknownObject,

    #[error("Pool is at maximum capacity")]
    PoolFull,

    #[error("Object validation failed")]
    ValidationFailed,

    #[error("Factory {operation} failed: {source}")]
    Factory {
        operation: FactoryOperation,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid pool configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to start pool maintenance: {0}")]
    Maintenance(String),
}

impl PoolError {
    pub(crate) fn factory(operation: FactoryOperation, source: BoxError) -> Self {
        Self::Factory {
            operation,
            source: Arc::from(source),
        }
    }

    /// Whether retrying the same call later may succeed.
    ///
    /// A borrow that timed out is an expected outcome under load.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Exhausted { .. } | Self::PoolFull)
    }
}

pub type PoolResult<T> = Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_error_keeps_source() {
        let err = PoolError::factory(FactoryOperation::Create, "socket refused".into());
        assert_eq!(err.to_string(), "Factory create failed: socket refused");
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_exhausted_is_retryable() {
        let err = PoolError::Exhausted {
            waited: Duration::from_millis(100),
        };
        assert!(err.is_retryable());
        assert!(!PoolError::Closed.is_retryable());
    }
}
