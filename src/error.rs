use thiserror::Error;

/// Library error type for telecat operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The form cannot start a slideshow; carries the user-facing message.
    #[error("{0}")]
    InvalidForm(String),

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),

    /// History slot could not be encoded for persistence.
    #[error(transparent)]
    History(#[from] serde_json::Error),
}
