//! Translation runtime: the live instance the provider and the server-side
//! loader orchestrate.
//!
//! # Overview
//!
//! A [`Runtime`] owns:
//! - **Language**: the active locale, changed with [`Runtime::change_language`]
//! - **Namespaces**: the namespaces it keeps loaded
//! - **Resource store**: bundles keyed locale → namespace → translation key
//! - **Backend**: optional [`Backend`] that fills missing bundles on demand
//!
//! Runtimes are shared as `Arc<Runtime>`. State sits behind an `RwLock` that is
//! never held across an `.await`; backend reads for one operation are joined
//! and applied to the store in a single write.

mod backend;
mod client;
mod store;
mod translate;

pub use backend::{Backend, FsBackend, parse_bundle};
pub use client::{ClientOverrides, create_client};
pub use store::{Bundle, Resource, ResourceStore, deep_extend};
pub use translate::{FixedT, KEY_SEPARATOR, NS_SEPARATOR, PostProcessor};

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::future::try_join_all;

use crate::config::{FallbackLng, fallback_for_locale};
use crate::error::BackendError;
use crate::locale::unique;

/// What: Construction options for a [`Runtime`].
#[derive(Clone, Default)]
pub struct RuntimeOptions {
    /// Starting language.
    pub lng: String,
    /// Fallback rules used for lookups and loads.
    pub fallback_lng: FallbackLng,
    /// Namespaces kept loaded.
    pub ns: Vec<String>,
    /// Namespace used when a key carries none.
    pub default_ns: String,
    /// Extra locales loaded at init.
    pub preload: Vec<String>,
    /// Initial resources; a runtime seeded with them is ready without init.
    pub resources: Option<Resource>,
    /// Source for missing bundles.
    pub backend: Option<Arc<dyn Backend>>,
    /// Value rewriters applied by [`FixedT::t`].
    pub post_processors: Vec<Arc<dyn PostProcessor>>,
}

/// Mutable part of a runtime.
#[derive(Debug)]
struct RuntimeState {
    /// Active language.
    language: String,
    /// Namespaces kept loaded.
    namespaces: Vec<String>,
    /// Loaded bundles.
    store: ResourceStore,
    /// Set once init completed.
    initialized: bool,
}

/// What: Live translation runtime instance.
pub struct Runtime {
    /// Fallback rules.
    fallback_lng: FallbackLng,
    /// Default namespace.
    default_ns: String,
    /// Locales loaded at init.
    preload: Vec<String>,
    /// Source for missing bundles.
    backend: Option<Arc<dyn Backend>>,
    /// Value rewriters.
    post_processors: Vec<Arc<dyn PostProcessor>>,
    /// Mutable state.
    state: RwLock<RuntimeState>,
}

impl Runtime {
    /// What: Build a runtime.
    ///
    /// Details:
    /// - With `resources`, the store is seeded and the runtime is initialized
    ///   immediately; the backend is only used for later loads
    /// - Without `resources`, [`Runtime::init`] must be awaited before reading
    #[must_use]
    pub fn new(options: RuntimeOptions) -> Self {
        let initialized = options.resources.is_some();
        let store = ResourceStore::new(options.resources.unwrap_or_default());
        Self {
            fallback_lng: options.fallback_lng,
            default_ns: options.default_ns,
            preload: options.preload,
            backend: options.backend,
            post_processors: options.post_processors,
            state: RwLock::new(RuntimeState {
                language: options.lng,
                namespaces: unique(options.ns),
                store,
                initialized,
            }),
        }
    }

    /// Shared access to the state; a poisoned lock still holds usable data.
    fn read_state(&self) -> RwLockReadGuard<'_, RuntimeState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive access to the state.
    fn write_state(&self) -> RwLockWriteGuard<'_, RuntimeState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// What: Load the starting language, its fallbacks and preloaded locales.
    ///
    /// # Errors
    /// - Propagates the first backend failure; the runtime stays uninitialized
    ///
    /// Details:
    /// - No-op once initialized
    /// - Only pairs missing from the store are requested
    pub async fn init(&self) -> Result<(), BackendError> {
        if self.is_initialized() {
            return Ok(());
        }
        let (language, namespaces) = {
            let state = self.read_state();
            (state.language.clone(), state.namespaces.clone())
        };
        let locales = unique(
            self.language_chain(&language)
                .into_iter()
                .chain(self.preload.iter().cloned()),
        );
        let pairs = self.missing_pairs(&locales, &namespaces);
        self.load_pairs(&pairs, false).await?;

        self.write_state().initialized = true;
        tracing::info!(
            language = %language,
            locales = locales.len(),
            namespaces = namespaces.len(),
            "translation runtime initialized"
        );
        Ok(())
    }

    /// Whether init completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.read_state().initialized
    }

    /// Active language.
    #[must_use]
    pub fn language(&self) -> String {
        self.read_state().language.clone()
    }

    /// Namespaces kept loaded.
    #[must_use]
    pub fn namespaces(&self) -> Vec<String> {
        self.read_state().namespaces.clone()
    }

    /// Namespace used when a key carries none.
    #[must_use]
    pub fn default_ns(&self) -> &str {
        &self.default_ns
    }

    /// Configured fallback rules.
    #[must_use]
    pub const fn fallback_lng(&self) -> &FallbackLng {
        &self.fallback_lng
    }

    /// Whether a backend is attached.
    #[must_use]
    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    /// What: `locale` followed by its fallback chain, de-duplicated.
    #[must_use]
    pub fn language_chain(&self, locale: &str) -> Vec<String> {
        unique(
            std::iter::once(locale.to_string())
                .chain(fallback_for_locale(locale, &self.fallback_lng)),
        )
    }

    /// Whether the store holds a bundle for this exact pair.
    #[must_use]
    pub fn has_resource_bundle(&self, locale: &str, ns: &str) -> bool {
        self.read_state().store.has_bundle(locale, ns)
    }

    /// Copy of one bundle.
    #[must_use]
    pub fn resource_bundle(&self, locale: &str, ns: &str) -> Option<Bundle> {
        self.read_state().store.bundle(locale, ns).cloned()
    }

    /// What: Add a bundle to the store (see [`ResourceStore::add_bundle`]).
    pub fn add_resource_bundle(
        &self,
        locale: &str,
        ns: &str,
        bundle: Bundle,
        deep: bool,
        overwrite: bool,
    ) {
        self.write_state()
            .store
            .add_bundle(locale, ns, bundle, deep, overwrite);
    }

    /// What: Run `f` with read access to the store.
    pub fn with_store<R>(&self, f: impl FnOnce(&ResourceStore) -> R) -> R {
        f(&self.read_state().store)
    }

    /// What: Copy of the whole store.
    #[must_use]
    pub fn store_snapshot(&self) -> Resource {
        self.read_state().store.data().clone()
    }

    /// What: Switch the active language.
    ///
    /// # Errors
    /// - Propagates backend failures; the language is left unchanged then
    ///
    /// Details:
    /// - Loads bundles missing for the new language chain before switching
    pub async fn change_language(&self, lng: &str) -> Result<(), BackendError> {
        let namespaces = self.namespaces();
        let pairs = self.missing_pairs(&self.language_chain(lng), &namespaces);
        self.load_pairs(&pairs, false).await?;

        let previous = std::mem::replace(&mut self.write_state().language, lng.to_string());
        if previous != lng {
            tracing::debug!("Language changed from '{}' to '{}'", previous, lng);
        }
        Ok(())
    }

    /// What: Make namespaces available for the active language chain and preloads.
    ///
    /// # Errors
    /// - Propagates backend failures
    ///
    /// Details:
    /// - Namespaces are recorded as loaded even without a backend
    /// - Pairs already in the store are not requested again
    pub async fn load_namespaces(&self, ns: &[String]) -> Result<(), BackendError> {
        let language = {
            let mut state = self.write_state();
            for name in ns {
                if !state.namespaces.contains(name) {
                    state.namespaces.push(name.clone());
                }
            }
            state.language.clone()
        };
        let locales = unique(
            self.language_chain(&language)
                .into_iter()
                .chain(self.preload.iter().cloned()),
        );
        let pairs = self.missing_pairs(&locales, ns);
        self.load_pairs(&pairs, false).await
    }

    /// What: Re-read every stored and expected bundle from the backend.
    ///
    /// # Errors
    /// - Propagates backend failures; bundles read before the failure are not applied
    ///
    /// Details:
    /// - Replaces bundles wholesale; pairs the backend no longer has keep their data
    /// - No-op without a backend
    pub async fn reload_resources(&self) -> Result<(), BackendError> {
        if self.backend.is_none() {
            tracing::debug!("reload_resources called on a runtime without backend");
            return Ok(());
        }
        let (language, namespaces, stored) = {
            let state = self.read_state();
            (
                state.language.clone(),
                state.namespaces.clone(),
                state.store.pairs(),
            )
        };
        let locales = unique(
            self.language_chain(&language)
                .into_iter()
                .chain(self.preload.iter().cloned()),
        );
        let mut pairs = stored;
        for locale in &locales {
            for ns in &namespaces {
                let pair = (locale.clone(), ns.clone());
                if !pairs.contains(&pair) {
                    pairs.push(pair);
                }
            }
        }
        self.load_pairs(&pairs, true).await?;
        tracing::info!(bundles = pairs.len(), "translation resources reloaded");
        Ok(())
    }

    /// What: Translate `key` in `ns`, walking `lng` and its fallbacks.
    ///
    /// Output:
    /// - Post-processed value, or `None` when no locale in the chain has it
    #[must_use]
    pub fn translate(&self, lng: &str, ns: &str, key: &str) -> Option<String> {
        let chain = self.language_chain(lng);
        let (locale, value) = {
            let state = self.read_state();
            chain.iter().find_map(|locale| {
                state
                    .store
                    .bundle(locale, ns)
                    .and_then(|bundle| translate::lookup(bundle, key))
                    .map(|value| (locale.clone(), value))
            })?
        };
        Some(
            self.post_processors
                .iter()
                .fold(value, |acc, p| p.process(acc, key, &locale)),
        )
    }

    /// What: Translation function bound to a locale, namespace and key prefix.
    #[must_use]
    pub fn get_fixed_t(
        self: &Arc<Self>,
        lng: Option<&str>,
        ns: Option<&str>,
        key_prefix: Option<&str>,
    ) -> FixedT {
        FixedT::new(
            Arc::clone(self),
            lng.map(ToString::to_string),
            ns.map(ToString::to_string),
            key_prefix.map(ToString::to_string),
        )
    }

    /// Pairs of `locales` × `namespaces` absent from the store.
    fn missing_pairs(&self, locales: &[String], namespaces: &[String]) -> Vec<(String, String)> {
        let state = self.read_state();
        locales
            .iter()
            .flat_map(|locale| namespaces.iter().map(move |ns| (locale, ns)))
            .filter(|(locale, ns)| !state.store.has_bundle(locale, ns))
            .map(|(locale, ns)| (locale.clone(), ns.clone()))
            .collect()
    }

    /// What: Read `pairs` from the backend and apply them in one store write.
    ///
    /// Details:
    /// - `replace` swaps bundles wholesale; otherwise they are deep-merged with overwrite
    /// - Pairs the backend has nothing for are left untouched
    async fn load_pairs(&self, pairs: &[(String, String)], replace: bool) -> Result<(), BackendError> {
        let Some(backend) = self.backend.as_deref() else {
            return Ok(());
        };
        if pairs.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            backend = backend.name(),
            bundles = pairs.len(),
            "loading resource bundles"
        );
        let reads = pairs.iter().map(|(locale, ns)| async move {
            let bundle = backend.read(locale, ns).await?;
            Ok::<_, BackendError>((locale, ns, bundle))
        });
        let loaded = try_join_all(reads).await?;

        let mut state = self.write_state();
        for (locale, ns, bundle) in loaded {
            let Some(bundle) = bundle else {
                continue;
            };
            if replace {
                state.store.replace_bundle(locale, ns, bundle);
            } else {
                state.store.add_bundle(locale, ns, bundle, true, true);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read_state();
        f.debug_struct("Runtime")
            .field("language", &state.language)
            .field("namespaces", &state.namespaces)
            .field("initialized", &state.initialized)
            .field("bundles", &state.store.pairs().len())
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use serde_json::json;
    use std::sync::Mutex;

    /// What: In-memory backend recording every read.
    pub(crate) struct MemoryBackend {
        /// Bundles served by the backend.
        pub data: Mutex<Resource>,
        /// (locale, ns) pairs requested so far.
        pub reads: Mutex<Vec<(String, String)>>,
    }

    impl MemoryBackend {
        pub(crate) fn new(data: Resource) -> Self {
            Self {
                data: Mutex::new(data),
                reads: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn read_count(&self) -> usize {
            self.reads.lock().expect("reads lock").len()
        }
    }

    impl Backend for MemoryBackend {
        fn name(&self) -> &'static str {
            "memory"
        }

        fn read<'a>(
            &'a self,
            locale: &'a str,
            ns: &'a str,
        ) -> BoxFuture<'a, Result<Option<Bundle>, BackendError>> {
            Box::pin(async move {
                self.reads
                    .lock()
                    .expect("reads lock")
                    .push((locale.to_string(), ns.to_string()));
                Ok(self
                    .data
                    .lock()
                    .expect("data lock")
                    .get(locale)
                    .and_then(|namespaces| namespaces.get(ns))
                    .cloned())
            })
        }
    }

    /// Build a resource mapping from a JSON literal.
    pub(crate) fn resource(value: serde_json::Value) -> Resource {
        serde_json::from_value(value).expect("resource literal")
    }

    fn options_with(backend: Arc<MemoryBackend>) -> RuntimeOptions {
        RuntimeOptions {
            lng: "de".into(),
            fallback_lng: FallbackLng::Single("en".into()),
            ns: vec!["common".into()],
            default_ns: "common".into(),
            preload: Vec::new(),
            resources: None,
            backend: Some(backend),
            post_processors: Vec::new(),
        }
    }

    fn sample_backend() -> Arc<MemoryBackend> {
        Arc::new(MemoryBackend::new(resource(json!({
            "en": {"common": {"title": "Title", "only_en": "English"}, "about": {"who": "Us"}},
            "de": {"common": {"title": "Titel"}},
            "fr": {"common": {"title": "Titre"}}
        }))))
    }

    #[tokio::test]
    async fn test_init_loads_language_and_fallbacks() {
        let backend = sample_backend();
        let runtime = Runtime::new(options_with(backend.clone()));
        assert!(!runtime.is_initialized());

        runtime.init().await.expect("init");
        assert!(runtime.is_initialized());
        assert!(runtime.has_resource_bundle("de", "common"));
        assert!(runtime.has_resource_bundle("en", "common"));
        assert!(!runtime.has_resource_bundle("fr", "common"));

        let reads = backend.read_count();
        runtime.init().await.expect("second init is a no-op");
        assert_eq!(backend.read_count(), reads);
    }

    #[tokio::test]
    async fn test_translate_walks_fallback_chain() {
        let runtime = Arc::new(Runtime::new(options_with(sample_backend())));
        runtime.init().await.expect("init");

        let t = runtime.get_fixed_t(Some("de"), Some("common"), None);
        assert_eq!(t.t("title"), "Titel");
        assert_eq!(t.t("only_en"), "English");
        assert_eq!(t.t("missing.key"), "missing.key");
    }

    #[tokio::test]
    async fn test_change_language_loads_missing_bundles() {
        let runtime = Runtime::new(options_with(sample_backend()));
        runtime.init().await.expect("init");

        runtime.change_language("fr").await.expect("change");
        assert_eq!(runtime.language(), "fr");
        assert!(runtime.has_resource_bundle("fr", "common"));
    }

    #[tokio::test]
    async fn test_load_namespaces_only_requests_missing_pairs() {
        let backend = sample_backend();
        let runtime = Runtime::new(options_with(backend.clone()));
        runtime.init().await.expect("init");
        let before = backend.read_count();

        runtime
            .load_namespaces(&["about".to_string(), "common".to_string()])
            .await
            .expect("load");
        // de/about and en/about only; common is already present for both
        assert_eq!(backend.read_count(), before + 2);
        assert!(runtime.has_resource_bundle("en", "about"));
        assert!(!runtime.has_resource_bundle("de", "about"));
        assert_eq!(runtime.namespaces(), vec!["common", "about"]);
    }

    #[tokio::test]
    async fn test_reload_resources_replaces_cached_bundles() {
        let backend = sample_backend();
        let runtime = Runtime::new(options_with(backend.clone()));
        runtime.init().await.expect("init");

        *backend.data.lock().expect("data lock") = resource(json!({
            "en": {"common": {"title": "Title"}},
            "de": {"common": {"title": "Neu"}}
        }));
        runtime.reload_resources().await.expect("reload");

        assert_eq!(
            runtime.resource_bundle("de", "common").map(serde_json::Value::Object),
            Some(json!({"title": "Neu"}))
        );
    }

    #[test]
    fn test_seeded_runtime_is_ready_and_post_processes() {
        struct Upper;
        impl PostProcessor for Upper {
            fn name(&self) -> &'static str {
                "upper"
            }
            fn process(&self, value: String, _key: &str, _locale: &str) -> String {
                value.to_uppercase()
            }
        }

        let runtime = Arc::new(Runtime::new(RuntimeOptions {
            lng: "en".into(),
            default_ns: "common".into(),
            resources: Some(resource(json!({"en": {"common": {"hi": "hello"}, "home": {"t": "home"}}}))),
            post_processors: vec![Arc::new(Upper)],
            ..RuntimeOptions::default()
        }));
        assert!(runtime.is_initialized());
        let t = runtime.get_fixed_t(None, None, None);
        assert_eq!(t.t("hi"), "HELLO");
        assert_eq!(t.t("home:t"), "HOME");
        assert_eq!(runtime.store_snapshot().len(), 1);
    }
}
