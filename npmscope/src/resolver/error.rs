//! Resolver error types.

use std::fmt;
use thiserror::Error;

use crate::pool::PoolError;
use crate::registry::RegistryError;

/// Why a single node could not be resolved.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Failure recorded against one node during a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeError {
    pub name: String,
    pub failure: FetchFailure,
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_error_display() {
        let err = NodeError {
            name: "ghost".to_string(),
            failure: RegistryError::NotFound {
                name: "ghost".to_string(),
            }
            .into(),
        };
        assert_eq!(err.to_string(), "ghost: package 'ghost' not found in registry");
    }

    #[test]
    fn test_pool_failure_display() {
        let failure = FetchFailure::from(PoolError::WorkerPanicked);
        assert!(failure.to_string().contains("panicked"));
    }
}
