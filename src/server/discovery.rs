//! Locale and namespace set computation for server-side loads.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{FallbackLng, LocalePath, fallback_for_locale};
use crate::error::I18nError;

/// What: Ordered, duplicate-free list of identifiers.
///
/// Details:
/// - Insertion order is kept; re-inserting an existing item is a no-op
/// - Serializes as a plain list
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedSet(Vec<String>);

impl OrderedSet {
    /// Empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// What: Insert an item unless already present.
    ///
    /// Output:
    /// - `true` when the item was new
    pub fn insert(&mut self, item: impl Into<String>) -> bool {
        let item = item.into();
        if self.0.contains(&item) {
            return false;
        }
        self.0.push(item);
        true
    }

    /// Whether `item` is in the set.
    #[must_use]
    pub fn contains(&self, item: &str) -> bool {
        self.0.iter().any(|i| i == item)
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// First item, if any.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Items as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Owned items in insertion order.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<S: Into<String>> FromIterator<S> for OrderedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}

impl<S: Into<String>> Extend<S> for OrderedSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

/// Locales relevant to one request, in fallback-resolution order.
pub type LocaleSet = OrderedSet;

/// Namespaces relevant to one request.
pub type NamespaceSet = OrderedSet;

/// What: Compute the locale set for a request.
///
/// Inputs:
/// - `initial_locale`: Locale the page renders in
/// - `fallback`: Configured fallback rules
/// - `extra_locales`: Additional locales requested by the caller
///
/// Output:
/// - `initial_locale`, then its fallback chain, then `extra_locales`, first-seen order
#[must_use]
pub fn locale_set(initial_locale: &str, fallback: &FallbackLng, extra_locales: &[String]) -> LocaleSet {
    let mut locales = LocaleSet::new();
    locales.insert(initial_locale);
    locales.extend(fallback_for_locale(initial_locale, fallback));
    locales.extend(extra_locales.iter().cloned());
    locales
}

/// What: List namespace names in one locale directory.
///
/// Inputs:
/// - `dir`: Directory holding `<namespace>.<extension>` files
/// - `extension`: Resource file extension, without the dot
///
/// Output:
/// - Sorted namespace names; empty when `dir` does not exist or cannot be read
///
/// Details:
/// - Entries without the extension (sub-directories, dotfiles, other formats) are skipped
#[must_use]
pub fn namespaces_in_dir(dir: &Path, extension: &str) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to read locale directory {}: {}", dir.display(), e);
            }
            return Vec::new();
        }
    };

    let suffix = format!(".{extension}");
    let mut namespaces: Vec<String> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            match name.strip_suffix(&suffix) {
                Some(ns) if !ns.is_empty() && !ns.starts_with('.') => Some(ns.to_string()),
                _ => {
                    tracing::debug!("Skipping non-namespace entry '{}' in {}", name, dir.display());
                    None
                }
            }
        })
        .collect();
    namespaces.sort();
    namespaces
}

/// What: Discover namespaces across every locale in a locale set.
///
/// Inputs:
/// - `locale_path`: Resource location
/// - `locales`: Locales to scan
/// - `extension`: Resource file extension
///
/// Output:
/// - Union of per-locale namespaces, first-seen order
///
/// # Errors
/// - `InvalidArgument` when `locale_path` is a resolver, which cannot be walked
pub fn discover_namespaces(
    locale_path: &LocalePath,
    locales: &LocaleSet,
    extension: &str,
) -> Result<NamespaceSet, I18nError> {
    let mut namespaces = NamespaceSet::new();
    for locale in locales.iter() {
        let Some(dir) = locale_path.locale_dir(locale) else {
            return Err(I18nError::invalid(
                "namespaces_required must be provided when locale_path is a resolver function",
            ));
        };
        namespaces.extend(namespaces_in_dir(&dir, extension));
    }
    tracing::debug!(
        "Discovered {} namespaces across {} locales: {:?}",
        namespaces.len(),
        locales.len(),
        namespaces.as_slice()
    );
    Ok(namespaces)
}
