use thiserror::Error;

/// Library-level errors using thiserror for structured error handling.
///
/// Collaborator failures (capture, display) are reported through these types
/// but never change game state. They can be chained with anyhow at the
/// application layer.

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Frame directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("No frames found in {path}")]
    NoFrames { path: String },

    #[error("Failed to decode frame {path}")]
    DecodeFailed {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to scan frame directory")]
    ScanFailed(#[from] walkdir::Error),
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Display is not available")]
    Unavailable,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine configuration directory")]
    NoConfigDir,
}

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to read detection trace")]
    Io(#[from] std::io::Error),

    #[error("Malformed trace record on line {line}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Trace time went backwards on line {line}: {t_ms}ms after {previous_ms}ms")]
    NonMonotonic {
        line: usize,
        t_ms: u64,
        previous_ms: u64,
    },
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
