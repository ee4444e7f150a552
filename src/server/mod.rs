//! Server-side data loading: scope a page's translations, load them and
//! serialize the minimal slice into page props.
//!
//! # Flow
//!
//! 1. Validate the initial locale (before any I/O)
//! 2. Resolve the config: override, else the config file
//! 3. Refresh the shared runtime when `reload_on_prerender` is set
//! 4. Compute the locale set (initial + fallbacks + extras) and the namespace
//!    set (explicit, else discovered on disk)
//! 5. Build a runtime covering both sets and await its init
//! 6. Project the store onto locale set × namespace set
//!
//! The result carries a fixed translation function, the runtime and a
//! serializable [`SsrState`] that [`crate::provider`] turns back into a runtime.

pub mod discovery;
mod project;

pub use discovery::{
    LocaleSet, NamespaceSet, OrderedSet, discover_namespaces, locale_set, namespaces_in_dir,
};
pub use project::project_store;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{
    LocalePath, UserConfig, create_config, default_config_path, load_user_config,
};
use crate::error::I18nError;
use crate::locale::{first_invalid_locale, first_invalid_namespace, is_valid_locale_format};
use crate::provider::global;
use crate::runtime::{ClientOverrides, FixedT, Resource, Runtime, create_client};

/// Props key the serialized state is stored under.
pub const PROPS_KEY: &str = "_nextI18Next";

/// What: Serializable translation state handed from server to client.
///
/// Details:
/// - Wire names are camelCase: `initialI18nStore`, `initialLocale`, `ns`, `userConfig`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsrState {
    /// Projected resources: every locale × namespace of the request.
    pub initial_i18n_store: Resource,
    /// Locale the page renders in.
    pub initial_locale: String,
    /// Namespace set of the request.
    pub ns: Vec<String>,
    /// User config, when `serialize_config` allows it.
    pub user_config: Option<UserConfig>,
}

/// What: Page props carrying [`SsrState`] under [`PROPS_KEY`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PageProps {
    /// Serialized translation state.
    #[serde(rename = "_nextI18Next", default, skip_serializing_if = "Option::is_none")]
    pub ssr: Option<SsrState>,
    /// Locale picked by the host router, used when the state carries none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_locale: Option<String>,
}

/// What: Result of [`server_side_translations`].
#[derive(Debug)]
pub struct ServerSideTranslations {
    /// Translation function bound to the initial locale and first namespace.
    pub t: FixedT,
    /// Runtime the state was projected from.
    pub i18n: Arc<Runtime>,
    /// Serializable state for the client.
    pub state: SsrState,
}

impl ServerSideTranslations {
    /// What: Page props for this result.
    #[must_use]
    pub fn props(&self) -> PageProps {
        PageProps {
            ssr: Some(self.state.clone()),
            router_locale: None,
        }
    }

    /// What: Page props as JSON: `{ "_nextI18Next": { ... } }`.
    ///
    /// # Errors
    /// - Propagates `serde_json` failures
    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self.props())
    }
}

/// What: Arguments of a server-side load.
#[derive(Clone, Debug, Default)]
pub struct TranslationRequest {
    /// Locale the page renders in.
    pub initial_locale: String,
    /// Namespaces for the fixed translation function; the first one is bound.
    pub ns: Vec<String>,
    /// Key prefix for the fixed translation function.
    pub key_prefix: Option<String>,
    /// Explicit namespace set; discovered on disk when `None`.
    pub namespaces_required: Option<Vec<String>>,
    /// Config used instead of the config file.
    pub config_override: Option<UserConfig>,
    /// Locales to include besides the initial locale and its fallbacks.
    pub extra_locales: Vec<String>,
}

impl TranslationRequest {
    /// What: Request for `initial_locale` with everything else defaulted.
    #[must_use]
    pub fn new(initial_locale: impl Into<String>) -> Self {
        Self {
            initial_locale: initial_locale.into(),
            ..Self::default()
        }
    }

    /// Namespaces for the fixed translation function.
    #[must_use]
    pub fn with_ns<I, S>(mut self, ns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ns = ns.into_iter().map(Into::into).collect();
        self
    }

    /// Key prefix for the fixed translation function.
    #[must_use]
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Explicit namespace set.
    #[must_use]
    pub fn require_namespaces<I, S>(mut self, ns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces_required = Some(ns.into_iter().map(Into::into).collect());
        self
    }

    /// Config used instead of the config file.
    #[must_use]
    pub fn with_config(mut self, config: UserConfig) -> Self {
        self.config_override = Some(config);
        self
    }

    /// Additional locales to include.
    #[must_use]
    pub fn with_extra_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_locales = locales.into_iter().map(Into::into).collect();
        self
    }

    /// What: Build a request from untyped route parameters.
    ///
    /// Inputs:
    /// - `params`: JSON object with `locale` and optional `ns`, `keyPrefix`,
    ///   `namespacesRequired`, `extraLocales` (string or list of strings)
    ///
    /// # Errors
    /// - `InvalidArgument` when `locale` is missing or not a string, a list
    ///   field has the wrong shape, an extra locale is malformed or a required
    ///   namespace is path-like
    ///
    /// Details:
    /// - A bare string `namespacesRequired` is not an explicit set; discovery runs
    pub fn from_params(params: &Value) -> Result<Self, I18nError> {
        let Some(Value::String(locale)) = params.get("locale") else {
            return Err(I18nError::invalid(
                "initial locale argument was not passed as a string",
            ));
        };
        let key_prefix = match params.get("keyPrefix") {
            None | Some(Value::Null) => None,
            Some(Value::String(prefix)) => Some(prefix.clone()),
            Some(_) => return Err(I18nError::invalid("keyPrefix must be a string")),
        };
        // Only a list is an explicit namespace set; anything else means discovery.
        let namespaces_required =
            if matches!(params.get("namespacesRequired"), Some(Value::String(_))) {
                tracing::debug!("namespacesRequired is not a list; namespaces will be discovered");
                None
            } else {
                string_list(params, "namespacesRequired")?
            };
        let extra_locales = string_list(params, "extraLocales")?.unwrap_or_default();
        validate_scope(&extra_locales, namespaces_required.as_deref())?;

        Ok(Self {
            initial_locale: locale.clone(),
            ns: string_list(params, "ns")?.unwrap_or_default(),
            key_prefix,
            namespaces_required,
            config_override: None,
            extra_locales,
        })
    }
}

/// What: Reject extra locales and required namespaces that could escape the locale tree.
///
/// # Errors
/// - `InvalidArgument` naming the first offending entry
fn validate_scope(
    extra_locales: &[String],
    namespaces_required: Option<&[String]>,
) -> Result<(), I18nError> {
    if let Some(locale) = first_invalid_locale(extra_locales) {
        return Err(I18nError::invalid(format!(
            "extra locale '{locale}' is not a valid locale code"
        )));
    }
    if let Some(ns) = namespaces_required.and_then(first_invalid_namespace) {
        return Err(I18nError::invalid(format!(
            "required namespace '{ns}' is not a valid namespace name"
        )));
    }
    Ok(())
}

/// Read a field holding a string or a list of strings.
fn string_list(params: &Value, field: &str) -> Result<Option<Vec<String>>, I18nError> {
    match params.get(field) {
        None | Some(Value::Null | Value::Bool(false)) => Ok(None),
        Some(Value::String(s)) => Ok(Some(vec![s.clone()])),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(ToString::to_string).ok_or_else(|| {
                    I18nError::invalid(format!("{field} must only contain strings"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(I18nError::invalid(format!(
            "{field} must be a string or a list of strings"
        ))),
    }
}

/// What: Load the translations a page needs and serialize them.
///
/// Inputs:
/// - `request`: Locale, namespaces and overrides of the page
///
/// Output:
/// - Fixed translation function, runtime and [`SsrState`]
///
/// # Errors
/// - `InvalidArgument` for an empty or malformed locale, a malformed extra
///   locale or a path-like required namespace (all before any I/O), or a
///   resolver `locale_path` without `namespaces_required`
/// - `Configuration` when no config is available or it is incomplete
/// - `Backend` when loading resources fails
pub async fn server_side_translations(
    request: TranslationRequest,
) -> Result<ServerSideTranslations, I18nError> {
    let TranslationRequest {
        initial_locale,
        ns,
        key_prefix,
        namespaces_required,
        config_override,
        extra_locales,
    } = request;

    if !is_valid_locale_format(&initial_locale) {
        return Err(I18nError::invalid(format!(
            "initial locale '{initial_locale}' is not a valid locale code"
        )));
    }
    validate_scope(&extra_locales, namespaces_required.as_deref())?;

    let user_config = match config_override {
        Some(config) => config,
        None => load_user_config(&default_config_path())?,
    };
    let mut config = create_config(&user_config, &initial_locale)?;

    if namespaces_required.is_none() && matches!(config.locale_path, LocalePath::Resolver(_)) {
        return Err(I18nError::invalid(
            "namespaces_required must be provided when locale_path is a resolver function",
        ));
    }

    if config.reload_on_prerender
        && let Some(shared) = global::current_instance()
    {
        tracing::debug!("reloading shared runtime before server-side load");
        shared.reload_resources().await?;
    }

    let locales = locale_set(&initial_locale, &config.fallback_lng, &extra_locales);
    let explicit = namespaces_required.is_some();
    let namespaces: NamespaceSet = match namespaces_required {
        Some(required) => required.into_iter().collect(),
        None => {
            if config.has_custom_backend() {
                tracing::debug!(
                    "custom backend configured without namespaces_required; discovering from {:?}",
                    config.locale_path
                );
            }
            discover_namespaces(&config.locale_path, &locales, &config.locale_extension)?
        }
    };

    let mut runtime_ns: NamespaceSet = config.ns.iter().cloned().collect();
    runtime_ns.extend(namespaces.iter().map(ToString::to_string));
    let mut preload: LocaleSet = config.preload.iter().cloned().collect();
    preload.extend(locales.iter().map(ToString::to_string));
    config.preload = preload.into_vec();

    let runtime = create_client(
        &config,
        ClientOverrides {
            ns: Some(runtime_ns.into_vec()),
            resources: None,
        },
    );
    runtime.init().await?;

    if config.has_custom_backend() && explicit && !namespaces.is_empty() {
        runtime.load_namespaces(namespaces.as_slice()).await?;
    }

    let initial_i18n_store = project_store(&runtime, &locales, &namespaces);
    let t = runtime.get_fixed_t(
        Some(&initial_locale),
        ns.first().map(String::as_str),
        key_prefix.as_deref(),
    );

    tracing::info!(
        locale = %initial_locale,
        locales = locales.len(),
        namespaces = namespaces.len(),
        "server-side translations ready"
    );

    Ok(ServerSideTranslations {
        t,
        i18n: runtime,
        state: SsrState {
            initial_i18n_store,
            initial_locale,
            ns: namespaces.into_vec(),
            user_config: config.serialize_config.then_some(user_config),
        },
    })
}
