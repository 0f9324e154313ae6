//! Error taxonomy shared by every core structure.

/// Errors returned by graph, index and queue operations.
///
/// Absence on a pure lookup is an `Option`; these variants are reserved for
/// operations whose failure the caller has to distinguish.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },
    #[error("already exists: {id}")]
    AlreadyExists { id: String },
    #[error("vertex capacity of {capacity} exhausted")]
    CapacityExceeded { capacity: usize },
    #[error("no path from {from} to {to}")]
    NoPathExists { from: String, to: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl CoreError {
    pub fn vertex_not_found(id: &str) -> Self {
        Self::NotFound {
            what: "vertex",
            id: id.to_string(),
        }
    }
}

pub type Result<T, E = CoreError> = std::result::Result<T, E>;
