//! Error types for discparse.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while examining a disc.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required directory or file of the disc layout is missing.
    #[error("missing {what}: {}", path.display())]
    Structural { what: String, path: PathBuf },

    /// A Blu-ray structure without a `PLAYLIST` directory.
    #[error("no PLAYLIST directory under {}", path.display())]
    NoPlaylistDirectory { path: PathBuf },

    /// A vendor report lacks one of its mandatory markers.
    #[error("malformed report: {0}")]
    MalformedReport(String),

    /// One playlist container could not be decoded.
    #[error("failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// Selection input could not be interpreted.
    #[error("invalid selection: {0}")]
    Selection(String),

    /// An external tool produced no recognizable output.
    #[error("{tool}: {message}")]
    ExternalTool { tool: String, message: String },

    /// No candidate survived filtering.
    #[error("no main feature candidates in {}", path.display())]
    NoCandidates { path: PathBuf },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML parsing error.
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Coarse classification of [`Error`], used to decide how far a failure
/// propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Structural,
    MalformedReport,
    Decode,
    Selection,
    ExternalTool,
    NoCandidates,
    Io,
    Json,
    Xml,
    Config,
}

impl Error {
    /// Create a structural error.
    pub fn structural(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Structural {
            what: what.into(),
            path: path.into(),
        }
    }

    /// Create a decode error for one container.
    pub fn decode(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an external tool error.
    pub fn external_tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Structural { .. } | Error::NoPlaylistDirectory { .. } => ErrorKind::Structural,
            Error::MalformedReport(_) => ErrorKind::MalformedReport,
            Error::Decode { .. } => ErrorKind::Decode,
            Error::Selection(_) => ErrorKind::Selection,
            Error::ExternalTool { .. } => ErrorKind::ExternalTool,
            Error::NoCandidates { .. } => ErrorKind::NoCandidates,
            Error::Io(_) => ErrorKind::Io,
            Error::Json(_) => ErrorKind::Json,
            Error::Xml(_) => ErrorKind::Xml,
            Error::Config(_) | Error::Toml(_) => ErrorKind::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_playlist_directory_is_structural() {
        let err = Error::NoPlaylistDirectory {
            path: PathBuf::from("/discs/MOVIE"),
        };
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert_eq!(err.to_string(), "no PLAYLIST directory under /discs/MOVIE");
    }

    #[test]
    fn toml_errors_classify_as_config() {
        let err: Error = toml::from_str::<toml::Value>("= broken").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
