//! Locale code validation and ordered de-duplication helpers.

use std::collections::HashSet;

/// What: Validate locale code format.
///
/// Inputs:
/// - `locale`: Locale code to validate
///
/// Output:
/// - `true` if format looks valid, `false` otherwise
///
/// Details:
/// - Accepts `language[-script][-region]` shapes such as `en`, `en-US`, `zh-Hans-CN`
/// - Underscores are tolerated (`pt_BR`) since locale directories often use them
/// - Rejects empty codes, whitespace, path separators and dangling hyphens
#[must_use]
pub fn is_valid_locale_format(locale: &str) -> bool {
    if locale.is_empty() || locale.len() > 35 {
        return false;
    }

    locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        && !locale.starts_with(['-', '_'])
        && !locale.ends_with(['-', '_'])
        && !locale.contains("--")
}

/// What: Validate a namespace name used as a resource file stem.
///
/// Details:
/// - Rejects empty names, path separators, `..`, leading dots and control characters
/// - Namespaces may contain dots elsewhere (`admin.users`)
#[must_use]
pub fn is_valid_namespace(ns: &str) -> bool {
    !ns.is_empty()
        && !ns.starts_with('.')
        && !ns.contains("..")
        && !ns.chars().any(|c| matches!(c, '/' | '\\') || c.is_control())
}

/// What: First locale in `locales` failing [`is_valid_locale_format`].
#[must_use]
pub fn first_invalid_locale(locales: &[String]) -> Option<&str> {
    locales
        .iter()
        .map(String::as_str)
        .find(|l| !is_valid_locale_format(l))
}

/// What: First namespace in `namespaces` failing [`is_valid_namespace`].
#[must_use]
pub fn first_invalid_namespace(namespaces: &[String]) -> Option<&str> {
    namespaces
        .iter()
        .map(String::as_str)
        .find(|ns| !is_valid_namespace(ns))
}

/// What: De-duplicate strings keeping the first occurrence of each.
///
/// Inputs:
/// - `items`: Any iterator of string-like values
///
/// Output:
/// - `Vec<String>` in first-seen order
#[must_use]
pub fn unique<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let item = item.into();
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}
