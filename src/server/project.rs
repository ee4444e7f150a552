//! Projection of a runtime's store down to the slice a page needs.

use std::collections::BTreeMap;

use crate::runtime::{Bundle, Resource, Runtime};
use crate::server::discovery::{LocaleSet, NamespaceSet};

/// What: Snapshot the bundles of `locales` × `namespaces` from a runtime.
///
/// Inputs:
/// - `runtime`: Initialized runtime to read from
/// - `locales`: Locale set of the request
/// - `namespaces`: Namespace set of the request
///
/// Output:
/// - Resource with exactly one entry per (locale, namespace) pair; pairs the
///   runtime lacks map to an empty bundle
///
/// Details:
/// - Read-only; the runtime's store is not touched
#[must_use]
pub fn project_store(runtime: &Runtime, locales: &LocaleSet, namespaces: &NamespaceSet) -> Resource {
    runtime.with_store(|store| {
        locales
            .iter()
            .map(|locale| {
                let bundles: BTreeMap<String, Bundle> = namespaces
                    .iter()
                    .map(|ns| {
                        let bundle = store.bundle(locale, ns).cloned().unwrap_or_default();
                        (ns.to_string(), bundle)
                    })
                    .collect();
                (locale.to_string(), bundles)
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RuntimeOptions;
    use crate::runtime::tests::resource;
    use serde_json::json;

    #[test]
    fn test_project_store_is_complete_and_read_only() {
        let seed = resource(json!({
            "en": {"common": {"a": "A"}, "home": {"b": "B"}, "unused": {"c": "C"}},
            "de": {"common": {"a": "Ä"}}
        }));
        let runtime = Runtime::new(RuntimeOptions {
            lng: "de".into(),
            resources: Some(seed.clone()),
            ..RuntimeOptions::default()
        });

        let locales: LocaleSet = ["de", "en", "fr"].into_iter().collect();
        let namespaces: NamespaceSet = ["common", "home"].into_iter().collect();
        let projected = project_store(&runtime, &locales, &namespaces);

        assert_eq!(projected.len(), 3);
        assert!(projected.values().all(|bundles| bundles.len() == 2));
        assert_eq!(
            serde_json::to_value(&projected).expect("serialize"),
            json!({
                "de": {"common": {"a": "Ä"}, "home": {}},
                "en": {"common": {"a": "A"}, "home": {"b": "B"}},
                "fr": {"common": {}, "home": {}}
            })
        );
        assert_eq!(runtime.store_snapshot(), seed);
    }
}
