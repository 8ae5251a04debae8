//! Registry error types

use crate::protocol::StreamCategory;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Category already has an active subscriber
    CategoryTaken(StreamCategory),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::CategoryTaken(category) => {
                write!(f, "Category already has a subscriber: {}", category)
            }
        }
    }
}

impl std::error::Error for RegistryError {}
