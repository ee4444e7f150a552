//! Additive merge of incoming resources into a live runtime.

use crate::runtime::{Resource, Runtime};

/// What: Add every bundle of `resources` the runtime does not hold yet.
///
/// Inputs:
/// - `runtime`: Runtime to update
/// - `resources`: Incoming locale → namespace → bundle mapping
///
/// Output:
/// - Number of bundles added
///
/// Details:
/// - No-op for `None`, an empty mapping or an uninitialized runtime
/// - Granularity is the (locale, namespace) pair: a present pair is skipped
///   entirely, a missing one is added with deep + overwrite semantics
/// - Idempotent; the order pairs are visited in does not change the result
pub fn merge_resources(runtime: &Runtime, resources: Option<&Resource>) -> usize {
    let Some(resources) = resources else {
        return 0;
    };
    if resources.is_empty() || !runtime.is_initialized() {
        return 0;
    }

    let mut added = 0;
    for (locale, namespaces) in resources {
        for (ns, bundle) in namespaces {
            if runtime.has_resource_bundle(locale, ns) {
                continue;
            }
            runtime.add_resource_bundle(locale, ns, bundle.clone(), true, true);
            added += 1;
        }
    }
    if added > 0 {
        tracing::debug!("Merged {} new resource bundles into runtime", added);
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RuntimeOptions;
    use crate::runtime::tests::resource;
    use serde_json::json;

    fn seeded(value: serde_json::Value) -> Runtime {
        Runtime::new(RuntimeOptions {
            lng: "en".into(),
            resources: Some(resource(value)),
            ..RuntimeOptions::default()
        })
    }

    #[test]
    fn test_merge_is_idempotent() {
        let runtime = seeded(json!({"en": {"common": {"a": "A"}}}));
        let incoming = resource(json!({"en": {"home": {"h": "H"}}, "de": {"common": {"a": "Ä"}}}));

        assert_eq!(merge_resources(&runtime, Some(&incoming)), 2);
        let once = runtime.store_snapshot();
        assert_eq!(merge_resources(&runtime, Some(&incoming)), 0);
        assert_eq!(runtime.store_snapshot(), once);
    }

    #[test]
    fn test_merge_never_overwrites_present_pairs() {
        let runtime = seeded(json!({"en": {"common": {"a": "A"}}}));
        let incoming = resource(json!({"en": {"common": {"a": "changed", "b": "B"}}}));

        assert_eq!(merge_resources(&runtime, Some(&incoming)), 0);
        assert_eq!(
            runtime.resource_bundle("en", "common").map(serde_json::Value::Object),
            Some(json!({"a": "A"}))
        );
    }

    #[test]
    fn test_merge_order_independent() {
        let b1 = resource(json!({"en": {"common": {"a": "1"}}, "de": {"common": {"a": "Eins"}}}));
        let b2 = resource(json!({"en": {"home": {"h": "H"}}, "fr": {"common": {"a": "Un"}}}));

        let left = seeded(json!({"en": {"base": {"b": "B"}}}));
        merge_resources(&left, Some(&b1));
        merge_resources(&left, Some(&b2));

        let right = seeded(json!({"en": {"base": {"b": "B"}}}));
        merge_resources(&right, Some(&b2));
        merge_resources(&right, Some(&b1));

        assert_eq!(left.store_snapshot(), right.store_snapshot());
        assert_eq!(
            left.resource_bundle("fr", "common").map(serde_json::Value::Object),
            Some(json!({"a": "Un"}))
        );
    }

    #[test]
    fn test_merge_overlapping_pair_keeps_first_arrival() {
        let b1 = resource(json!({"en": {"common": {"a": "1"}}}));
        let b2 = resource(json!({"en": {"common": {"a": "2"}}}));

        let runtime = seeded(json!({}));
        merge_resources(&runtime, Some(&b1));
        merge_resources(&runtime, Some(&b2));
        assert_eq!(
            runtime.resource_bundle("en", "common").map(serde_json::Value::Object),
            Some(json!({"a": "1"}))
        );
    }

    #[test]
    fn test_merge_skips_uninitialized_and_empty() {
        let runtime = Runtime::new(RuntimeOptions::default());
        let incoming = resource(json!({"en": {"common": {}}}));
        assert_eq!(merge_resources(&runtime, Some(&incoming)), 0);
        assert!(!runtime.has_resource_bundle("en", "common"));

        let ready = seeded(json!({}));
        assert_eq!(merge_resources(&ready, None), 0);
        assert_eq!(merge_resources(&ready, Some(&Resource::new())), 0);
    }
}
