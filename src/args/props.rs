//! `props` subcommand: print the serialized page props for a locale.

use std::path::Path;

use ssr_i18n::{I18nError, TranslationRequest, server_side_translations};

use crate::args::utils::resolve_config;

/// Borrowed `props` arguments.
#[derive(Debug, Clone, Copy)]
pub struct PropsRequest<'a> {
    /// Locale the page renders in.
    pub locale: &'a str,
    /// Namespaces for the translation function.
    pub ns: &'a [String],
    /// Explicit namespace set.
    pub require: Option<&'a [String]>,
    /// Extra locales.
    pub extra_locales: &'a [String],
    /// Compact JSON output.
    pub compact: bool,
}

/// What: Run a server-side load and render its props as JSON.
///
/// Inputs:
/// - `request`: Parsed `props` arguments
/// - `config`: Config file given on the command line
///
/// Output:
/// - JSON text of `{ "_nextI18Next": { ... } }`
///
/// # Errors
/// - Config, argument and backend errors of the load
pub async fn handle_props(
    request: PropsRequest<'_>,
    config: Option<&Path>,
) -> Result<String, I18nError> {
    tracing::info!(locale = %request.locale, "props requested from CLI");
    let user_config = resolve_config(config)?;

    let mut load = TranslationRequest::new(request.locale)
        .with_ns(request.ns.iter().cloned())
        .with_extra_locales(request.extra_locales.iter().cloned())
        .with_config(user_config);
    if let Some(required) = request.require {
        load = load.require_namespaces(required.iter().cloned());
    }

    let result = server_side_translations(load).await?;
    let json = result
        .to_json()
        .map_err(|e| I18nError::Configuration(format!("unable to serialize props: {e}")))?;
    let text = if request.compact {
        serde_json::to_string(&json)
    } else {
        serde_json::to_string_pretty(&json)
    };
    text.map_err(|e| I18nError::Configuration(format!("unable to serialize props: {e}")))
}
