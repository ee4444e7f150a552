//! Validation and defaulting of a `UserConfig` into a runtime-ready config.

use std::path::{Path, PathBuf};

use crate::config::{
    FallbackLng, LocalePath, Module, ModuleKind, PreInitHook, UserConfig,
};
use crate::error::I18nError;
use crate::locale::unique;
use crate::runtime::{Backend, PostProcessor};
use crate::server::discovery::namespaces_in_dir;

/// Locale tree used when the config names none.
pub const DEFAULT_LOCALE_PATH: &str = "./public/locales";
/// Resource file extension used when the config names none.
pub const DEFAULT_LOCALE_EXTENSION: &str = "json";
/// Namespace used when the config names none.
pub const DEFAULT_NS: &str = "common";

/// What: Fully-resolved configuration consumed by the runtime and the loaders.
#[derive(Clone, Debug)]
pub struct I18nConfig {
    /// Language the runtime starts in.
    pub lng: String,
    /// Locale used when nothing else resolves one.
    pub default_locale: String,
    /// Every configured locale.
    pub locales: Vec<String>,
    /// Namespace used when a key carries none.
    pub default_ns: String,
    /// Namespaces loaded at init.
    pub ns: Vec<String>,
    /// Fallback rules.
    pub fallback_lng: FallbackLng,
    /// Resource location; relative directories are made absolute.
    pub locale_path: LocalePath,
    /// Resource file extension, without the dot.
    pub locale_extension: String,
    /// Locales loaded at init besides `lng` and its fallbacks.
    pub preload: Vec<String>,
    /// Refresh the shared runtime before server-side loads.
    pub reload_on_prerender: bool,
    /// Include the user config in serialized state.
    pub serialize_config: bool,
    /// Extension modules.
    pub modules: Vec<Module>,
    /// Hook run before init.
    pub on_pre_init: Option<PreInitHook>,
}

impl I18nConfig {
    /// What: Whether a custom backend module is configured.
    #[must_use]
    pub fn has_custom_backend(&self) -> bool {
        self.modules.iter().any(|m| m.kind() == ModuleKind::Backend)
    }

    /// What: First configured custom backend, if any.
    #[must_use]
    pub fn custom_backend(&self) -> Option<std::sync::Arc<dyn Backend>> {
        self.modules.iter().find_map(|m| match m {
            Module::Backend(b) => Some(b.clone()),
            Module::PostProcessor(_) => None,
        })
    }

    /// What: Configured post-processors in registration order.
    #[must_use]
    pub fn post_processors(&self) -> Vec<std::sync::Arc<dyn PostProcessor>> {
        self.modules
            .iter()
            .filter_map(|m| match m {
                Module::PostProcessor(p) => Some(p.clone()),
                Module::Backend(_) => None,
            })
            .collect()
    }
}

/// What: Validate a `UserConfig` and fill in defaults.
///
/// Inputs:
/// - `user`: Host configuration
/// - `lng`: Language the runtime will start in
///
/// Output:
/// - `I18nConfig` ready for [`crate::runtime::create_client`]
///
/// # Errors
/// - `Configuration` when `i18n` or `i18n.default_locale` is missing
///
/// Details:
/// - `fallback_lng` defaults to the default locale; an explicit `false` disables it
/// - `ns` defaults to the namespaces found under `<locale_path>/<default_locale>`,
///   or `[default_ns]` when nothing is found or the path is a resolver
/// - Every configured locale is preloaded
pub fn create_config(user: &UserConfig, lng: &str) -> Result<I18nConfig, I18nError> {
    let Some(settings) = user.i18n.as_ref() else {
        return Err(I18nError::config("config.i18n is missing"));
    };
    let Some(default_locale) = settings
        .default_locale
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        return Err(I18nError::config(
            "config.i18n does not include a default_locale property",
        ));
    };

    let mut locales = settings.locales.clone();
    if locales.is_empty() {
        locales.push(default_locale.to_string());
    } else if !locales.iter().any(|l| l == default_locale) {
        tracing::warn!(
            "default locale '{}' is not listed in config.i18n.locales {:?}",
            default_locale,
            locales
        );
    }

    let lng = if lng.trim().is_empty() {
        default_locale.to_string()
    } else {
        lng.to_string()
    };

    let locale_extension = user
        .locale_extension
        .clone()
        .map(|ext| ext.trim_start_matches('.').to_string())
        .filter(|ext| !ext.is_empty())
        .unwrap_or_else(|| DEFAULT_LOCALE_EXTENSION.to_string());

    let locale_path = match user.locale_path.clone() {
        Some(LocalePath::Dir(dir)) => LocalePath::Dir(absolutize(&dir)),
        Some(resolver @ LocalePath::Resolver(_)) => resolver,
        None => LocalePath::Dir(absolutize(Path::new(DEFAULT_LOCALE_PATH))),
    };

    let default_ns = user
        .default_ns
        .clone()
        .unwrap_or_else(|| DEFAULT_NS.to_string());

    let ns = match &user.ns {
        Some(ns) => unique(ns.iter().cloned()),
        None => {
            let discovered = locale_path
                .locale_dir(default_locale)
                .map(|dir| namespaces_in_dir(&dir, &locale_extension))
                .unwrap_or_default();
            if discovered.is_empty() {
                vec![default_ns.clone()]
            } else {
                discovered
            }
        }
    };

    if user.ns.is_none()
        && let Some(dir) = locale_path.locale_dir(default_locale)
        && !locale_path
            .file_for(default_locale, &default_ns, &locale_extension)
            .is_file()
    {
        tracing::warn!(
            "default namespace '{}' not found under {}",
            default_ns,
            dir.display()
        );
    }

    let fallback_lng = user
        .fallback_lng
        .clone()
        .unwrap_or_else(|| FallbackLng::Single(default_locale.to_string()));

    Ok(I18nConfig {
        lng,
        default_locale: default_locale.to_string(),
        preload: locales.clone(),
        locales,
        default_ns,
        ns,
        fallback_lng,
        locale_path,
        locale_extension,
        reload_on_prerender: user.reload_on_prerender,
        serialize_config: user.serialize_config.unwrap_or(true),
        modules: user.modules.clone(),
        on_pre_init: user.on_pre_init.clone(),
    })
}

/// Make a relative path absolute against the working directory.
fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
