use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    // Configuration errors
    #[error("{0}")]
    Config(String),

    // Download errors
    #[error("Download failed for {key} ({url}): {reason}")]
    Network { key: String, url: String, reason: String },

    // Extraction errors
    #[error("Path traversal detected in {key} archive: {entry} escapes destination directory")]
    Security { key: String, entry: String },

    #[error("Extraction failed for {key}: {reason}")]
    Extraction { key: String, reason: String },

    // Installation errors
    #[error("Installation failed: {0}")]
    Install(String),

    #[error("Required package '{0}' is not installed. You will need to install it before you can run dh-setup.")]
    MissingSystemPackage(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SetupError {
    /// Shorthand for an extraction failure on `key`
    pub fn extraction(key: &str, reason: impl Into<String>) -> Self {
        SetupError::Extraction {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SetupError>;
