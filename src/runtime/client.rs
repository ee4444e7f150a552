//! Runtime construction from a resolved config.

use std::sync::Arc;

use crate::config::I18nConfig;
use crate::runtime::{Backend, FsBackend, Resource, Runtime, RuntimeOptions};

/// What: Per-call overrides applied on top of an [`I18nConfig`].
#[derive(Clone, Debug, Default)]
pub struct ClientOverrides {
    /// Namespaces to keep loaded instead of the configured ones.
    pub ns: Option<Vec<String>>,
    /// Resources to seed the store with.
    pub resources: Option<Resource>,
}

/// What: Build a runtime for a resolved config.
///
/// Inputs:
/// - `config`: Output of [`crate::config::create_config`]; `config.lng` is the
///   starting language
/// - `overrides`: Namespace and resource overrides
///
/// Output:
/// - Uninitialized runtime unless `overrides.resources` was given; callers
///   await [`Runtime::init`] before reading the store
///
/// Details:
/// - A configured custom backend module replaces the filesystem backend
/// - The pre-init hook runs on the new runtime before it is returned
#[must_use]
pub fn create_client(config: &I18nConfig, overrides: ClientOverrides) -> Arc<Runtime> {
    let backend: Arc<dyn Backend> = config.custom_backend().unwrap_or_else(|| {
        Arc::new(FsBackend::new(
            config.locale_path.clone(),
            config.locale_extension.clone(),
        ))
    });

    let seeded = overrides.resources.is_some();
    let runtime = Runtime::new(RuntimeOptions {
        lng: config.lng.clone(),
        fallback_lng: config.fallback_lng.clone(),
        ns: overrides.ns.unwrap_or_else(|| config.ns.clone()),
        default_ns: config.default_ns.clone(),
        preload: config.preload.clone(),
        resources: overrides.resources,
        backend: Some(backend),
        post_processors: config.post_processors(),
    });

    if let Some(hook) = &config.on_pre_init {
        (hook.0)(&runtime);
    }

    tracing::debug!(
        lng = %config.lng,
        custom_backend = config.has_custom_backend(),
        seeded,
        "created translation runtime"
    );
    Arc::new(runtime)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LocalePath, Module, PreInitHook, UserConfig, create_config};
    use crate::runtime::tests::{MemoryBackend, resource};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_create_client_prefers_custom_backend() {
        let backend = Arc::new(MemoryBackend::new(resource(json!({
            "en": {"common": {"hi": "Hi"}}
        }))));
        let mut user = UserConfig::new("en", &["en"]);
        user.ns = Some(vec!["common".into()]);
        user.modules.push(Module::Backend(backend.clone()));

        let config = create_config(&user, "en").expect("config");
        let runtime = create_client(&config, ClientOverrides::default());
        runtime.init().await.expect("init");

        assert!(backend.read_count() > 0);
        assert!(runtime.has_resource_bundle("en", "common"));
    }

    #[tokio::test]
    async fn test_create_client_seeded_skips_backend_and_runs_hook() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut user = UserConfig::new("en", &["en"]);
        user.ns = Some(vec!["common".into()]);
        user.locale_path = Some(LocalePath::Dir("/nonexistent/locales".into()));
        user.on_pre_init = Some(PreInitHook::new(move |runtime| {
            assert!(runtime.has_resource_bundle("en", "home"));
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        let config = create_config(&user, "en").expect("config");
        let runtime = create_client(
            &config,
            ClientOverrides {
                ns: Some(vec!["home".into()]),
                resources: Some(resource(json!({"en": {"home": {"t": "Home"}}}))),
            },
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(runtime.is_initialized());
        assert_eq!(runtime.namespaces(), vec!["home"]);
        assert_eq!(runtime.get_fixed_t(None, Some("home"), None).t("t"), "Home");
    }
}
