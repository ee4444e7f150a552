//! `t` subcommand: translate keys through a server-side load.

use std::fmt::Write as _;
use std::path::Path;

use ssr_i18n::{I18nError, TranslationRequest, server_side_translations};

use crate::args::utils::resolve_config;

/// What: Translate `keys` for `locale`.
///
/// Inputs:
/// - `locale`: Locale to translate into
/// - `ns`: Namespace for keys without an `ns:` prefix
/// - `key_prefix`: Prefix joined in front of every key
/// - `keys`: Keys to translate
/// - `config`: Config file given on the command line
///
/// Output:
/// - `key = value` per line; missing keys echo the key
///
/// # Errors
/// - Config, argument and backend errors of the load
pub async fn handle_translate(
    locale: &str,
    ns: Option<&str>,
    key_prefix: Option<&str>,
    keys: &[String],
    config: Option<&Path>,
) -> Result<String, I18nError> {
    let user_config = resolve_config(config)?;
    let mut request = TranslationRequest::new(locale)
        .with_ns(ns)
        .with_config(user_config);
    if let Some(prefix) = key_prefix {
        request = request.with_key_prefix(prefix);
    }

    let result = server_side_translations(request).await?;
    let mut out = String::new();
    for key in keys {
        let _ = writeln!(out, "{key} = {}", result.t.t(key));
    }
    Ok(out.trim_end().to_string())
}
