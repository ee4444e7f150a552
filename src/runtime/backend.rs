//! Resource backends: the trait runtimes load bundles through, and the
//! filesystem implementation used when no custom backend is configured.

use std::path::Path;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::config::LocalePath;
use crate::error::BackendError;
use crate::runtime::store::Bundle;

/// What: Source of translation bundles.
///
/// Output:
/// - `Ok(Some(bundle))` when the pair exists
/// - `Ok(None)` when the backend has nothing for the pair
///
/// # Errors
/// - Implementations return `Err` for failures that must abort the load
///   (unreadable or malformed data); they are never retried
pub trait Backend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Read one (locale, namespace) bundle.
    fn read<'a>(
        &'a self,
        locale: &'a str,
        ns: &'a str,
    ) -> BoxFuture<'a, Result<Option<Bundle>, BackendError>>;
}

/// What: Backend reading `<locale_path>/<locale>/<ns>.<extension>` files.
#[derive(Clone, Debug)]
pub struct FsBackend {
    /// Resource location.
    locale_path: LocalePath,
    /// File extension, without the dot.
    extension: String,
}

impl FsBackend {
    /// What: Create a filesystem backend.
    #[must_use]
    pub fn new(locale_path: LocalePath, extension: impl Into<String>) -> Self {
        Self {
            locale_path,
            extension: extension.into(),
        }
    }
}

impl Backend for FsBackend {
    fn name(&self) -> &'static str {
        "fs"
    }

    fn read<'a>(
        &'a self,
        locale: &'a str,
        ns: &'a str,
    ) -> BoxFuture<'a, Result<Option<Bundle>, BackendError>> {
        Box::pin(async move {
            let path = self.locale_path.file_for(locale, ns, &self.extension);
            let contents = match tokio::fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(path = %path.display(), "resource file not found");
                    return Ok(None);
                }
                Err(source) => return Err(BackendError::Io { path, source }),
            };
            parse_bundle(&path, &contents).map(Some)
        })
    }
}

/// What: Parse a resource file into a bundle.
///
/// Inputs:
/// - `path`: File the content came from; its extension picks the parser
/// - `contents`: Raw file content
///
/// Output:
/// - Parsed bundle; whitespace-only files yield an empty bundle
///
/// # Errors
/// - `BackendError::Parse` when the content is malformed or not an object
///
/// Details:
/// - `.yml`/`.yaml` use YAML, `.toml` uses TOML, everything else is JSON
pub fn parse_bundle(path: &Path, contents: &str) -> Result<Bundle, BackendError> {
    if contents.trim().is_empty() {
        return Ok(Bundle::new());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let parsed: Result<Value, String> = match extension.as_str() {
        "yml" | "yaml" => serde_norway::from_str(contents).map_err(|e| e.to_string()),
        "toml" => toml::from_str(contents).map_err(|e| e.to_string()),
        _ => serde_json::from_str(contents).map_err(|e| e.to_string()),
    };

    match parsed {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(BackendError::Parse {
            path: path.to_path_buf(),
            message: format!("expected an object of translations, found {}", kind_of(&other)),
        }),
        Err(message) => Err(BackendError::Parse {
            path: path.to_path_buf(),
            message,
        }),
    }
}

/// JSON type name for error messages.
const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
