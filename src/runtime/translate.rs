//! Fixed translation functions and value post-processing.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::runtime::Runtime;
use crate::runtime::store::Bundle;

/// Separator between a namespace and a key (`home:title`).
pub const NS_SEPARATOR: char = ':';
/// Separator between nested key segments (`nav.home`).
pub const KEY_SEPARATOR: char = '.';

/// What: Hook rewriting every translated value.
pub trait PostProcessor: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Rewrite `value` resolved for `key` in `locale`.
    fn process(&self, value: String, key: &str, locale: &str) -> String;
}

/// What: Translation function bound to a locale, namespace and key prefix.
///
/// Details:
/// - Unset locale follows the runtime's current language at call time
/// - Unset namespace uses the runtime's default namespace
/// - `ns:key` overrides the bound namespace for one lookup
#[derive(Clone)]
pub struct FixedT {
    /// Runtime the lookups read from.
    runtime: Arc<Runtime>,
    /// Bound locale.
    lng: Option<String>,
    /// Bound namespace.
    ns: Option<String>,
    /// Prefix joined in front of every key.
    key_prefix: Option<String>,
}

impl FixedT {
    /// What: Bind a translation function.
    #[must_use]
    pub const fn new(
        runtime: Arc<Runtime>,
        lng: Option<String>,
        ns: Option<String>,
        key_prefix: Option<String>,
    ) -> Self {
        Self {
            runtime,
            lng,
            ns,
            key_prefix,
        }
    }

    /// Bound locale, if any.
    #[must_use]
    pub fn lng(&self) -> Option<&str> {
        self.lng.as_deref()
    }

    /// Bound namespace, if any.
    #[must_use]
    pub fn ns(&self) -> Option<&str> {
        self.ns.as_deref()
    }

    /// Bound key prefix, if any.
    #[must_use]
    pub fn key_prefix(&self) -> Option<&str> {
        self.key_prefix.as_deref()
    }

    /// What: Translate a key.
    ///
    /// Inputs:
    /// - `key`: Dot-notation key, optionally qualified as `ns:key`
    ///
    /// Output:
    /// - Translated value, or the (prefixed) key itself when nothing matches
    ///
    /// Details:
    /// - Walks the bound locale and its fallback chain in order
    #[must_use]
    pub fn t(&self, key: &str) -> String {
        let (ns, key) = match key.split_once(NS_SEPARATOR) {
            Some((ns, rest)) if !ns.is_empty() && !rest.is_empty() => (ns.to_string(), rest),
            _ => (
                self.ns
                    .clone()
                    .unwrap_or_else(|| self.runtime.default_ns().to_string()),
                key,
            ),
        };
        let full_key = match self.key_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}{KEY_SEPARATOR}{key}"),
            _ => key.to_string(),
        };
        let lng = self
            .lng
            .clone()
            .unwrap_or_else(|| self.runtime.language());

        self.runtime
            .translate(&lng, &ns, &full_key)
            .unwrap_or_else(|| {
                tracing::debug!(
                    "Missing translation key '{}' in namespace '{}' for '{}'",
                    full_key,
                    ns,
                    lng
                );
                full_key
            })
    }
}

impl fmt::Debug for FixedT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedT")
            .field("lng", &self.lng)
            .field("ns", &self.ns)
            .field("key_prefix", &self.key_prefix)
            .finish_non_exhaustive()
    }
}

/// What: Look a key up in one bundle.
///
/// Details:
/// - A literal key containing dots wins over the nested path
/// - Numbers and booleans are rendered as text; objects and arrays are not values
pub(crate) fn lookup(bundle: &Bundle, key: &str) -> Option<String> {
    if let Some(found) = bundle.get(key).and_then(leaf_text) {
        return Some(found);
    }
    let mut parts = key.split(KEY_SEPARATOR);
    let mut current = bundle.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    leaf_text(current)
}

/// Text of a leaf value.
fn leaf_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
