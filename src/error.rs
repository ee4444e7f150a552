//! Error types shared by configuration, runtime and loader code.

use std::fmt;
use std::path::PathBuf;

/// What: Top-level error surfaced by the provider and the server-side loader.
///
/// Inputs: Generated internally when validation or backend access fails.
///
/// Output: Implements `Display`/`Error` for ergonomic propagation.
///
/// Details:
/// - `Configuration`: missing or invalid user config, missing locale settings,
///   unresolvable config file.
/// - `InvalidArgument`: non-string or malformed locale, resolver-typed locale
///   path without an explicit namespace list.
/// - `Backend`: a resource load failed; never retried.
#[derive(Debug)]
pub enum I18nError {
    /// Configuration is missing or incomplete.
    Configuration(String),
    /// A caller-supplied argument was rejected.
    InvalidArgument(String),
    /// Loading resources from a backend failed.
    Backend(BackendError),
}

impl I18nError {
    /// Shorthand for [`I18nError::Configuration`].
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Shorthand for [`I18nError::InvalidArgument`].
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl fmt::Display for I18nError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::Backend(err) => write!(f, "backend error: {err}"),
        }
    }
}

impl std::error::Error for I18nError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            Self::Configuration(_) | Self::InvalidArgument(_) => None,
        }
    }
}

impl From<BackendError> for I18nError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}

/// What: Failure while reading one (locale, namespace) bundle from a backend.
///
/// Details:
/// - Carries the path that was read so log lines point at the broken file.
#[derive(Debug)]
pub enum BackendError {
    /// I/O error while reading a resource file.
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Resource file content is not a valid translation object.
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
    /// Backend-specific failure not tied to a file.
    Other(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "failed to parse {}: {message}", path.display())
            }
            Self::Other(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { .. } | Self::Other(_) => None,
        }
    }
}
