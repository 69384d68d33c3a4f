use thiserror::Error;

/// Error kinds surfaced by the simulation core. Variants map to the kinds in
/// the system's error-handling design: most are reported to the connected
/// player as a short message rather than propagated as a process failure.
#[derive(Debug, Error)]
pub enum MudError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("access denied")]
    AuthFailure,

    #[error("rate limited")]
    RateLimited,

    #[error("resource limit: {0}")]
    ResourceLimit(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("data error: {0}")]
    Data(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}

pub type MudResult<T> = Result<T, MudError>;
