//! `namespaces` subcommand: list the namespaces discovery finds on disk.

use std::path::Path;

use ssr_i18n::I18nError;
use ssr_i18n::config::create_config;
use ssr_i18n::locale::{first_invalid_locale, is_valid_locale_format};
use ssr_i18n::server::{discover_namespaces, locale_set};

use crate::args::utils::resolve_config;

/// What: Discover the namespace set for `locale` and its fallbacks.
///
/// Inputs:
/// - `locale`: Locale to scan
/// - `extra_locales`: Additional locales to scan
/// - `config`: Config file given on the command line
///
/// Output:
/// - One namespace per line, first-seen order
///
/// # Errors
/// - `InvalidArgument` for a malformed locale or a resolver `locale_path`
/// - `Configuration` when the config is missing or incomplete
pub fn handle_namespaces(
    locale: &str,
    extra_locales: &[String],
    config: Option<&Path>,
) -> Result<String, I18nError> {
    if !is_valid_locale_format(locale) {
        return Err(I18nError::InvalidArgument(format!(
            "locale '{locale}' is not a valid locale code"
        )));
    }
    if let Some(extra) = first_invalid_locale(extra_locales) {
        return Err(I18nError::InvalidArgument(format!(
            "extra locale '{extra}' is not a valid locale code"
        )));
    }
    let user_config = resolve_config(config)?;
    let config = create_config(&user_config, locale)?;
    let locales = locale_set(locale, &config.fallback_lng, extra_locales);
    let namespaces = discover_namespaces(&config.locale_path, &locales, &config.locale_extension)?;
    tracing::info!(
        locale = %locale,
        count = namespaces.len(),
        "namespaces discovered from CLI"
    );
    Ok(namespaces.into_vec().join("\n"))
}
