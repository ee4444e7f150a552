//! In-memory resource store keyed locale → namespace → translation key.

use std::collections::BTreeMap;

use serde_json::Value;

/// Translations of one namespace in one locale (nested key → value object).
pub type Bundle = serde_json::Map<String, Value>;

/// Nested mapping locale → namespace → bundle.
pub type Resource = BTreeMap<String, BTreeMap<String, Bundle>>;

/// What: Resource store owned by one runtime.
///
/// Details:
/// - A (locale, namespace) pair is "present" as soon as a bundle was added for
///   it, even an empty one
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceStore {
    /// Stored bundles.
    data: Resource,
}

impl ResourceStore {
    /// What: Seed a store from an existing resource mapping.
    #[must_use]
    pub const fn new(data: Resource) -> Self {
        Self { data }
    }

    /// What: Borrow the raw mapping.
    #[must_use]
    pub const fn data(&self) -> &Resource {
        &self.data
    }

    /// What: Whether a bundle exists for exactly this (locale, namespace) pair.
    #[must_use]
    pub fn has_bundle(&self, locale: &str, ns: &str) -> bool {
        self.data
            .get(locale)
            .is_some_and(|namespaces| namespaces.contains_key(ns))
    }

    /// What: Borrow the bundle for a (locale, namespace) pair.
    #[must_use]
    pub fn bundle(&self, locale: &str, ns: &str) -> Option<&Bundle> {
        self.data.get(locale).and_then(|namespaces| namespaces.get(ns))
    }

    /// What: Add translations for a (locale, namespace) pair.
    ///
    /// Inputs:
    /// - `bundle`: Translations to add
    /// - `deep`: Merge nested objects key by key instead of replacing top-level keys
    /// - `overwrite`: With `deep`, let incoming values replace existing leaves
    ///
    /// Details:
    /// - Creates the pair when missing
    /// - Without `deep`, incoming top-level keys always win
    pub fn add_bundle(&mut self, locale: &str, ns: &str, bundle: Bundle, deep: bool, overwrite: bool) {
        let target = self
            .data
            .entry(locale.to_string())
            .or_default()
            .entry(ns.to_string())
            .or_default();
        if deep {
            deep_extend(target, bundle, overwrite);
        } else {
            target.extend(bundle);
        }
    }

    /// What: Replace the bundle for a pair wholesale (cache reload).
    pub fn replace_bundle(&mut self, locale: &str, ns: &str, bundle: Bundle) {
        self.data
            .entry(locale.to_string())
            .or_default()
            .insert(ns.to_string(), bundle);
    }

    /// What: Every (locale, namespace) pair currently stored.
    #[must_use]
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.data
            .iter()
            .flat_map(|(locale, namespaces)| {
                namespaces
                    .keys()
                    .map(move |ns| (locale.clone(), ns.clone()))
            })
            .collect()
    }
}

/// What: Recursively merge `source` into `target`.
///
/// Details:
/// - Objects on both sides are merged key by key
/// - Other collisions keep `target` unless `overwrite` is set
/// - Keys only in `source` are always added
pub fn deep_extend(target: &mut Bundle, source: Bundle, overwrite: bool) {
    for (key, incoming) in source {
        match (target.get_mut(&key), incoming) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_extend(existing, incoming, overwrite);
            }
            (Some(existing), incoming) => {
                if overwrite {
                    *existing = incoming;
                }
            }
            (None, incoming) => {
                target.insert(key, incoming);
            }
        }
    }
}
