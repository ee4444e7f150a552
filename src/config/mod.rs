//! User configuration: types, config-file discovery and loading.
//!
//! # Config Files
//!
//! The server-side loader reads a config file when no override is passed in.
//! The path defaults to `./i18n.config.yml` and can be changed with the
//! `I18NEXT_DEFAULT_CONFIG_PATH` environment variable. The format is picked
//! from the extension (`.yml`/`.yaml`, `.json`, `.toml`):
//!
//! ```yaml
//! i18n:
//!   default_locale: en
//!   locales: [en, de, fr]
//! fallback_lng:
//!   de-CH: de
//!   default: en
//! locale_path: ./public/locales
//! locale_extension: json
//! ```
//!
//! Function-typed settings (locale path resolvers, fallback resolvers, modules
//! and the pre-init hook) can only be set from code and are never serialized.

mod create;
mod fallback;

pub use create::{
    DEFAULT_LOCALE_EXTENSION, DEFAULT_LOCALE_PATH, DEFAULT_NS, I18nConfig, create_config,
};
pub use fallback::{DEFAULT_FALLBACK_KEY, FallbackLng, FallbackResolver, fallback_for_locale};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::I18nError;
use crate::runtime::{Backend, PostProcessor, Resource, Runtime};

/// Environment variable overriding the default config file path.
pub const CONFIG_PATH_ENV: &str = "I18NEXT_DEFAULT_CONFIG_PATH";

/// Config file used when neither an override nor the environment variable is set.
pub const DEFAULT_CONFIG_PATH: &str = "./i18n.config.yml";

/// Locale settings block (`i18n:` in config files).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleSettings {
    /// Locale used when nothing else resolves one.
    pub default_locale: Option<String>,
    /// Every locale the application ships.
    pub locales: Vec<String>,
}

/// Resolver signature for [`LocalePath::Resolver`]: `(locale, namespace) -> file`.
pub type LocalePathResolver = Arc<dyn Fn(&str, &str) -> PathBuf + Send + Sync>;

/// What: Where resource files live.
///
/// Details:
/// - `Dir`: tree shaped `<dir>/<locale>/<namespace>.<extension>`
/// - `Resolver`: computes each file path; cannot be walked for namespace discovery
#[derive(Clone)]
pub enum LocalePath {
    /// Root of a locale directory tree.
    Dir(PathBuf),
    /// Function mapping `(locale, namespace)` to a resource file.
    Resolver(LocalePathResolver),
}

impl LocalePath {
    /// What: Build a resolver-backed locale path from a closure.
    pub fn resolver<F>(f: F) -> Self
    where
        F: Fn(&str, &str) -> PathBuf + Send + Sync + 'static,
    {
        Self::Resolver(Arc::new(f))
    }

    /// What: Resource file for one (locale, namespace) pair.
    #[must_use]
    pub fn file_for(&self, locale: &str, ns: &str, extension: &str) -> PathBuf {
        match self {
            Self::Dir(dir) => dir.join(locale).join(format!("{ns}.{extension}")),
            Self::Resolver(resolve) => resolve(locale, ns),
        }
    }

    /// What: Directory holding one locale's namespace files, if introspectable.
    #[must_use]
    pub fn locale_dir(&self, locale: &str) -> Option<PathBuf> {
        match self {
            Self::Dir(dir) => Some(dir.join(locale)),
            Self::Resolver(_) => None,
        }
    }
}

impl fmt::Debug for LocalePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dir(dir) => f.debug_tuple("Dir").field(dir).finish(),
            Self::Resolver(_) => f.write_str("Resolver(<fn>)"),
        }
    }
}

impl Serialize for LocalePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Dir(dir) => serializer.serialize_str(&dir.to_string_lossy()),
            Self::Resolver(_) => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for LocalePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        PathBuf::deserialize(deserializer).map(Self::Dir)
    }
}

/// Kind of an extension module, mirroring the hook it plugs into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleKind {
    /// Supplies resource bundles.
    Backend,
    /// Rewrites translated values.
    PostProcessor,
}

/// What: Extension module plugged into every runtime built from a config.
#[derive(Clone)]
pub enum Module {
    /// Custom resource backend; replaces the filesystem backend.
    Backend(Arc<dyn Backend>),
    /// Post-processor applied to every translated value.
    PostProcessor(Arc<dyn PostProcessor>),
}

impl Module {
    /// What: Hook this module plugs into.
    #[must_use]
    pub const fn kind(&self) -> ModuleKind {
        match self {
            Self::Backend(_) => ModuleKind::Backend,
            Self::PostProcessor(_) => ModuleKind::PostProcessor,
        }
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend(b) => write!(f, "Backend({})", b.name()),
            Self::PostProcessor(p) => write!(f, "PostProcessor({})", p.name()),
        }
    }
}

/// Hook run on a fresh runtime right before it initializes.
#[derive(Clone)]
pub struct PreInitHook(pub Arc<dyn Fn(&Runtime) + Send + Sync>);

impl PreInitHook {
    /// What: Wrap a closure as a pre-init hook.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Runtime) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for PreInitHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PreInitHook(<fn>)")
    }
}

/// What: Host-owned static configuration.
///
/// Details:
/// - Every field is optional in config files; [`create_config`] validates and
///   fills defaults
/// - `modules` and `on_pre_init` are code-only and skipped by serde
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Locale settings; required.
    pub i18n: Option<LocaleSettings>,
    /// Namespace used when a key carries none.
    pub default_ns: Option<String>,
    /// Namespaces to load at init; discovered from disk when unset.
    pub ns: Option<Vec<String>>,
    /// Fallback rules; defaults to the default locale (`true` keeps the default).
    #[serde(deserialize_with = "fallback::deserialize_optional")]
    pub fallback_lng: Option<FallbackLng>,
    /// Resource location.
    pub locale_path: Option<LocalePath>,
    /// Resource file extension, without the dot.
    pub locale_extension: Option<String>,
    /// Refresh the shared runtime's cache before every server-side load.
    pub reload_on_prerender: bool,
    /// Include this config in serialized page state; defaults to `true`.
    pub serialize_config: Option<bool>,
    /// Resources handed straight to the provider, bypassing SSR state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resource>,
    /// Extension modules.
    #[serde(skip)]
    pub modules: Vec<Module>,
    /// Hook run before a runtime initializes.
    #[serde(skip)]
    pub on_pre_init: Option<PreInitHook>,
}

impl UserConfig {
    /// What: Minimal config with a default locale and locale list.
    #[must_use]
    pub fn new(default_locale: &str, locales: &[&str]) -> Self {
        Self {
            i18n: Some(LocaleSettings {
                default_locale: Some(default_locale.to_string()),
                locales: locales.iter().map(ToString::to_string).collect(),
            }),
            ..Self::default()
        }
    }

    /// What: Whether a custom backend module is configured.
    #[must_use]
    pub fn has_custom_backend(&self) -> bool {
        self.modules
            .iter()
            .any(|m| m.kind() == ModuleKind::Backend)
    }
}

/// What: Resolve the config file path used when no override is given.
///
/// Output:
/// - `I18NEXT_DEFAULT_CONFIG_PATH` when set and non-empty, else `./i18n.config.yml`
///
/// Details:
/// - Read on every call so long-lived processes pick up a changed environment
#[must_use]
pub fn default_config_path() -> PathBuf {
    if let Ok(p) = std::env::var(CONFIG_PATH_ENV)
        && !p.trim().is_empty()
    {
        return PathBuf::from(p);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// What: Load a `UserConfig` from a config file.
///
/// Inputs:
/// - `path`: Config file; format picked from the extension
///
/// Output:
/// - Parsed `UserConfig`
///
/// # Errors
/// - `Configuration` when the file does not exist, cannot be read, has an
///   unsupported extension or fails to parse
pub fn load_user_config(path: &Path) -> Result<UserConfig, I18nError> {
    if !path.is_file() {
        return Err(I18nError::config(format!(
            "unable to find a user config at {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        I18nError::config(format!("failed to read config {}: {e}", path.display()))
    })?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let parsed: Result<UserConfig, String> = match extension.as_str() {
        "yml" | "yaml" => serde_norway::from_str(&contents).map_err(|e| e.to_string()),
        "json" => serde_json::from_str(&contents).map_err(|e| e.to_string()),
        "toml" => toml::from_str(&contents).map_err(|e| e.to_string()),
        other => {
            return Err(I18nError::config(format!(
                "unsupported config format '.{other}' for {}; expected .yml, .yaml, .json or .toml",
                path.display()
            )));
        }
    };

    let config = parsed.map_err(|e| {
        I18nError::config(format!("failed to parse config {}: {e}", path.display()))
    })?;
    tracing::debug!(path = %path.display(), "loaded user config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_user_config_yaml() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for test");
        let path = temp_dir.path().join("i18n.config.yml");
        let yaml = r"
i18n:
  default_locale: en
  locales: [en, de]
fallback_lng:
  de-CH: de
  default: en
locale_path: ./locales
reload_on_prerender: true
";
        fs::write(&path, yaml).expect("Failed to write test config file");

        let config = load_user_config(&path).expect("Failed to load test config");
        let i18n = config.i18n.expect("i18n block");
        assert_eq!(i18n.default_locale.as_deref(), Some("en"));
        assert_eq!(i18n.locales, vec!["en", "de"]);
        assert!(config.reload_on_prerender);
        assert!(matches!(config.locale_path, Some(LocalePath::Dir(_))));
        assert_eq!(
            fallback_for_locale("de-CH", &config.fallback_lng.expect("fallback")),
            vec!["de", "en"]
        );
    }

    #[test]
    fn test_load_user_config_json_and_toml() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for test");

        let json_path = temp_dir.path().join("i18n.config.json");
        fs::write(
            &json_path,
            r#"{"i18n":{"default_locale":"fr","locales":["fr"]},"serialize_config":false}"#,
        )
        .expect("Failed to write json config");
        let config = load_user_config(&json_path).expect("json config");
        assert_eq!(config.serialize_config, Some(false));

        let toml_path = temp_dir.path().join("i18n.config.toml");
        fs::write(
            &toml_path,
            "locale_extension = \"yml\"\n[i18n]\ndefault_locale = \"de\"\nlocales = [\"de\"]\n",
        )
        .expect("Failed to write toml config");
        let config = load_user_config(&toml_path).expect("toml config");
        assert_eq!(config.locale_extension.as_deref(), Some("yml"));
    }

    #[test]
    fn test_fallback_true_keeps_default_locale_fallback() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for test");
        let path = temp_dir.path().join("i18n.config.yml");
        fs::write(
            &path,
            "i18n:\n  default_locale: en\n  locales: [en, de]\nfallback_lng: true\nns: [common]\n",
        )
        .expect("Failed to write test config file");

        let user = load_user_config(&path).expect("Failed to load test config");
        assert!(user.fallback_lng.is_none());
        let config = create_config(&user, "de").expect("create config");
        assert_eq!(fallback_for_locale("de", &config.fallback_lng), vec!["en"]);
    }

    #[test]
    fn test_load_user_config_missing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for test");
        let err = load_user_config(&temp_dir.path().join("nope.yml"))
            .expect_err("missing file must fail");
        assert!(matches!(err, I18nError::Configuration(ref m) if m.contains("unable to find")));
    }

    #[test]
    fn test_load_user_config_bad_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory for test");
        let path = temp_dir.path().join("i18n.config.js");
        fs::write(&path, "module.exports = {}").expect("Failed to write config");
        assert!(matches!(
            load_user_config(&path),
            Err(I18nError::Configuration(_))
        ));
    }

    #[test]
    fn test_user_config_skips_code_only_fields() {
        let mut config = UserConfig::new("en", &["en"]);
        config.locale_path = Some(LocalePath::resolver(|lng, ns| {
            PathBuf::from(format!("/srv/{lng}/{ns}.json"))
        }));
        let value = serde_json::to_value(&config).expect("serialize config");
        assert_eq!(value["locale_path"], serde_json::Value::Null);
        assert!(value.get("modules").is_none());
        assert!(value.get("resources").is_none());
    }

    #[test]
    fn test_locale_path_file_for() {
        let path = LocalePath::Dir(PathBuf::from("/app/locales"));
        assert_eq!(
            path.file_for("en", "common", "json"),
            PathBuf::from("/app/locales/en/common.json")
        );
        assert_eq!(path.locale_dir("fr"), Some(PathBuf::from("/app/locales/fr")));

        let resolver = LocalePath::resolver(|lng, ns| PathBuf::from(format!("{ns}-{lng}.yml")));
        assert_eq!(
            resolver.file_for("de", "home", "json"),
            PathBuf::from("home-de.yml")
        );
        assert!(resolver.locale_dir("de").is_none());
    }
}
