//! Error types for host validation

/// Error type for host loading operations
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The loader passed a null module base or a zero size
    #[error("Invalid host module: base={base:#x}, size={size:#x}")]
    InvalidModule { base: usize, size: usize },

    /// The loader passed a null callback table
    #[error("Callback table is null")]
    NullCallbacks,

    /// Required callbacks were left null by the loader
    #[error("Missing required callbacks: {0}")]
    MissingCallbacks(String),

    /// Host already initialized
    #[error("Host already initialized")]
    AlreadyInitialized,
}
