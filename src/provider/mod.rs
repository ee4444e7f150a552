//! Runtime instance management for rendering contexts.
//!
//! A rendering context (a component tree, a request) owns one
//! [`TranslationProvider`]. Each render resolves the runtime for the page
//! props: the first render builds it from the serialized server state (or a
//! config override), later renders reuse it and only merge bundles it does not
//! have yet. Language switches are never applied during a render; they are
//! queued and run by [`TranslationProvider::commit`].

mod effects;
pub mod global;
mod merge;

pub use effects::{Effect, EffectQueue};
pub use merge::merge_resources;

use std::sync::Arc;

use futures::FutureExt;

use crate::config::{UserConfig, create_config};
use crate::error::I18nError;
use crate::runtime::{ClientOverrides, Runtime, create_client};
use crate::server::{PageProps, SsrState};

/// Label of the queued runtime init.
const INIT_EFFECT: &str = "init";
/// Label of the queued language change; at most one is pending.
const CHANGE_LANGUAGE_EFFECT: &str = "change_language";

/// What: Runtime resolved for one render.
#[derive(Clone, Debug)]
pub struct ResolvedInstance {
    /// Runtime for the context.
    pub runtime: Arc<Runtime>,
    /// Locale the page should be displayed in.
    pub locale: String,
    /// Whether this render constructed the runtime.
    pub created: bool,
}

/// What: Resolve the runtime of a rendering context.
///
/// Inputs:
/// - `slot`: The context's runtime slot; filled on first creation
/// - `ssr`: Serialized server state from the page props
/// - `router_locale`: Locale chosen by the host router
/// - `config_override`: Config used instead of the serialized one
///
/// Output:
/// - `Ok(None)` when there is neither server state nor an override; the caller
///   renders without translations
///
/// # Errors
/// - `Configuration` when no config is available, or it lacks `i18n` or
///   `i18n.default_locale`
///
/// Details:
/// - Resources: `config_override.resources`, else the serialized store
/// - Locale: serialized initial locale, else the router locale, else the default locale
/// - Reuse merges resources into the existing runtime; creation seeds a new one
///   and then merges (bundle-granular, see [`merge_resources`])
/// - The resolved runtime is published to [`global`] either way
pub fn get_or_create_instance(
    slot: &mut Option<Arc<Runtime>>,
    ssr: Option<&SsrState>,
    router_locale: Option<&str>,
    config_override: Option<&UserConfig>,
) -> Result<Option<ResolvedInstance>, I18nError> {
    if ssr.is_none() && config_override.is_none() {
        return Ok(None);
    }

    let Some(user_config) = config_override.or_else(|| ssr.and_then(|s| s.user_config.as_ref()))
    else {
        return Err(I18nError::config(
            "translation provider was called without a config",
        ));
    };
    let Some(settings) = user_config.i18n.as_ref() else {
        return Err(I18nError::config(
            "translation provider was called without config.i18n",
        ));
    };
    let Some(default_locale) = settings.default_locale.as_deref().filter(|l| !l.is_empty())
    else {
        return Err(I18nError::config(
            "config.i18n does not include a default_locale property",
        ));
    };

    let resources = config_override
        .and_then(|c| c.resources.as_ref())
        .or_else(|| ssr.map(|s| &s.initial_i18n_store));
    let locale = ssr
        .map(|s| s.initial_locale.as_str())
        .filter(|l| !l.is_empty())
        .or(router_locale)
        .unwrap_or(default_locale)
        .to_string();

    if let Some(runtime) = slot.as_ref() {
        merge_resources(runtime, resources);
        global::publish(runtime);
        return Ok(Some(ResolvedInstance {
            runtime: Arc::clone(runtime),
            locale,
            created: false,
        }));
    }

    let config = create_config(user_config, &locale)?;
    let runtime = create_client(
        &config,
        ClientOverrides {
            ns: ssr.map(|s| s.ns.clone()).filter(|ns| !ns.is_empty()),
            resources: resources.cloned(),
        },
    );
    merge_resources(&runtime, resources);
    global::publish(&runtime);
    *slot = Some(Arc::clone(&runtime));
    tracing::debug!(locale = %locale, "created runtime for rendering context");

    Ok(Some(ResolvedInstance {
        runtime,
        locale,
        created: true,
    }))
}

/// What: Per-context provider owning the runtime slot and post-commit effects.
#[derive(Debug, Default)]
pub struct TranslationProvider {
    /// Config used instead of the serialized one.
    config_override: Option<UserConfig>,
    /// Runtime of this context.
    instance: Option<Arc<Runtime>>,
    /// Effects waiting for commit.
    effects: EffectQueue,
}

impl TranslationProvider {
    /// What: Provider for a new rendering context.
    #[must_use]
    pub fn new(config_override: Option<UserConfig>) -> Self {
        Self {
            config_override,
            instance: None,
            effects: EffectQueue::new(),
        }
    }

    /// What: Resolve the runtime for a render pass.
    ///
    /// Inputs:
    /// - `props`: Page props, possibly carrying serialized server state
    ///
    /// Output:
    /// - Runtime to render with, or `None` to render without translations
    ///
    /// # Errors
    /// - See [`get_or_create_instance`]
    ///
    /// Details:
    /// - Never changes the runtime's language; a change is queued when the
    ///   resolved locale differs from the current one, replacing any change
    ///   queued by an earlier render, and a render resolving the current
    ///   language drops the pending change
    /// - A runtime created without resources gets its init queued once
    pub fn render(&mut self, props: &PageProps) -> Result<Option<Arc<Runtime>>, I18nError> {
        let resolved = get_or_create_instance(
            &mut self.instance,
            props.ssr.as_ref(),
            props.router_locale.as_deref(),
            self.config_override.as_ref(),
        )?;
        let Some(ResolvedInstance {
            runtime, locale, ..
        }) = resolved
        else {
            return Ok(None);
        };

        if !runtime.is_initialized() && !self.effects.is_scheduled(INIT_EFFECT) {
            let target = Arc::clone(&runtime);
            self.effects.schedule(
                INIT_EFFECT,
                Box::new(move || {
                    async move { target.init().await.map_err(I18nError::from) }.boxed()
                }),
            );
        }

        // Only the latest render's locale may be applied at commit.
        if runtime.language() == locale {
            self.effects.cancel(CHANGE_LANGUAGE_EFFECT);
        } else {
            let target = Arc::clone(&runtime);
            tracing::trace!(locale = %locale, "queued language change");
            self.effects.replace(
                CHANGE_LANGUAGE_EFFECT,
                Box::new(move || {
                    async move {
                        target
                            .change_language(&locale)
                            .await
                            .map_err(I18nError::from)
                    }
                    .boxed()
                }),
            );
        }

        Ok(Some(runtime))
    }

    /// What: Run effects queued by renders since the last commit.
    ///
    /// # Errors
    /// - Propagates the first failing effect (backend load during a language change)
    pub async fn commit(&mut self) -> Result<(), I18nError> {
        self.effects.flush().await
    }

    /// Runtime of this context, if created.
    #[must_use]
    pub const fn instance(&self) -> Option<&Arc<Runtime>> {
        self.instance.as_ref()
    }

    /// Number of effects waiting for commit.
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.effects.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocalePath;
    use crate::runtime::tests::resource;
    use serde_json::json;
    use std::sync::PoisonError;

    fn user_config() -> UserConfig {
        let mut config = UserConfig::new("en", &["en", "de"]);
        config.ns = Some(vec!["common".into()]);
        config.locale_path = Some(LocalePath::Dir("/nonexistent/locales".into()));
        config
    }

    fn ssr_state(locale: &str, store: serde_json::Value) -> SsrState {
        SsrState {
            initial_i18n_store: resource(store),
            initial_locale: locale.into(),
            ns: vec!["common".into()],
            user_config: Some(user_config()),
        }
    }

    #[test]
    fn test_no_state_and_no_override_yields_none() {
        let mut slot = None;
        assert!(
            get_or_create_instance(&mut slot, None, Some("en"), None)
                .expect("no error")
                .is_none()
        );
        assert!(slot.is_none());
    }

    #[test]
    fn test_missing_config_pieces_are_configuration_errors() {
        let mut slot = None;
        let mut state = ssr_state("en", json!({}));
        state.user_config = None;
        assert!(matches!(
            get_or_create_instance(&mut slot, Some(&state), None, None),
            Err(I18nError::Configuration(_))
        ));

        let no_i18n = UserConfig::default();
        assert!(matches!(
            get_or_create_instance(&mut slot, None, None, Some(&no_i18n)),
            Err(I18nError::Configuration(ref m)) if m.contains("config.i18n")
        ));

        let mut no_default = user_config();
        if let Some(i18n) = no_default.i18n.as_mut() {
            i18n.default_locale = None;
        }
        assert!(matches!(
            get_or_create_instance(&mut slot, None, None, Some(&no_default)),
            Err(I18nError::Configuration(ref m)) if m.contains("default_locale")
        ));
    }

    #[test]
    fn test_reuse_adds_new_namespace_and_keeps_existing() {
        let _guard = global::test_mutex()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut slot = None;
        let first = ssr_state("en", json!({"en": {"common": {"title": "Title"}}}));
        let created = get_or_create_instance(&mut slot, Some(&first), None, None)
            .expect("create")
            .expect("instance");
        assert!(created.created);

        let second = ssr_state(
            "en",
            json!({"en": {"common": {"title": "Changed"}, "about": {"who": "Us"}}}),
        );
        let reused = get_or_create_instance(&mut slot, Some(&second), None, None)
            .expect("reuse")
            .expect("instance");
        assert!(!reused.created);
        assert!(Arc::ptr_eq(&created.runtime, &reused.runtime));
        assert!(reused.runtime.has_resource_bundle("en", "about"));
        assert_eq!(
            reused.runtime.get_fixed_t(None, Some("common"), None).t("title"),
            "Title"
        );
        assert!(
            global::current_instance().is_some_and(|r| Arc::ptr_eq(&r, &reused.runtime))
        );
    }

    #[test]
    fn test_locale_resolution_order() {
        let _guard = global::test_mutex()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut slot = None;
        let state = ssr_state("", json!({}));
        let resolved = get_or_create_instance(&mut slot, Some(&state), Some("de"), None)
            .expect("resolve")
            .expect("instance");
        assert_eq!(resolved.locale, "de");

        let mut slot = None;
        let config = user_config();
        let resolved = get_or_create_instance(&mut slot, None, None, Some(&config))
            .expect("resolve")
            .expect("instance");
        assert_eq!(resolved.locale, "en");
    }

    #[tokio::test]
    async fn test_locale_change_waits_for_commit() {
        let _guard = global::test_mutex()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut provider = TranslationProvider::new(None);
        let store = json!({"en": {"common": {"hi": "Hi"}}, "de": {"common": {"hi": "Hallo"}}});

        let props = PageProps {
            ssr: Some(ssr_state("en", store.clone())),
            router_locale: None,
        };
        let runtime = provider.render(&props).expect("render").expect("runtime");
        assert_eq!(runtime.language(), "en");
        assert_eq!(provider.pending_effects(), 0);

        let props = PageProps {
            ssr: Some(ssr_state("de", store)),
            router_locale: None,
        };
        let runtime = provider.render(&props).expect("render").expect("runtime");
        assert_eq!(runtime.language(), "en", "render must not switch language");
        assert_eq!(provider.pending_effects(), 1);

        provider.commit().await.expect("commit");
        assert_eq!(runtime.language(), "de");
        assert_eq!(provider.pending_effects(), 0);
        assert_eq!(runtime.get_fixed_t(None, None, None).t("hi"), "Hallo");
    }

    #[tokio::test]
    async fn test_commit_applies_locale_of_latest_render() {
        let _guard = global::test_mutex()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut provider = TranslationProvider::new(None);
        let store = json!({"en": {"common": {"hi": "Hi"}}, "de": {"common": {"hi": "Hallo"}}});
        let props = |locale: &str| PageProps {
            ssr: Some(ssr_state(locale, store.clone())),
            router_locale: None,
        };

        let runtime = provider.render(&props("en")).expect("render").expect("runtime");
        provider.render(&props("de")).expect("render");
        provider.render(&props("en")).expect("render");
        assert_eq!(provider.pending_effects(), 0);
        provider.commit().await.expect("commit");
        assert_eq!(runtime.language(), "en");

        provider.render(&props("de")).expect("render");
        provider.render(&props("fr")).expect("render");
        provider.render(&props("de")).expect("render");
        assert_eq!(provider.pending_effects(), 1);
        provider.commit().await.expect("commit");
        assert_eq!(runtime.language(), "de");
    }

    #[tokio::test]
    async fn test_override_without_resources_queues_init() {
        let _guard = global::test_mutex()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut provider = TranslationProvider::new(Some(user_config()));
        let runtime = provider
            .render(&PageProps::default())
            .expect("render")
            .expect("runtime");
        assert!(!runtime.is_initialized());
        assert_eq!(provider.pending_effects(), 1);
        provider.render(&PageProps::default()).expect("render again");
        assert_eq!(provider.pending_effects(), 1, "init is queued once");

        provider.commit().await.expect("commit");
        assert!(runtime.is_initialized());
        assert!(provider.instance().is_some());
    }
}
