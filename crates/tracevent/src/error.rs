/// Errors surfaced by tracing operations.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// The sink could not be opened, or a write to it failed. Propagated
    /// synchronously to the call that triggered it so the caller can
    /// decide whether tracing is best-effort or mandatory.
    #[error("trace IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A recording or terminate call outside the init/terminate window.
    #[error("tracing session not initialized")]
    NotInitialized,

    /// A second `init` of the process-wide session.
    #[error("tracing session already initialized")]
    AlreadyInitialized,
}
