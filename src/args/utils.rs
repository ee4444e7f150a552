//! Shared utilities for argument processing.

use std::path::Path;

use ssr_i18n::config::{UserConfig, default_config_path, load_user_config};
use ssr_i18n::I18nError;

/// What: Determine the log level based on command-line arguments and environment variables.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - Log level string (trace, debug, info, warn, error).
///
/// Details:
/// - Verbose flag overrides `log_level` argument.
/// - `SSR_I18N_TRACE=1` enables TRACE level for store and merge decisions.
pub fn determine_log_level(args: &crate::args::Args) -> String {
    if args.verbose {
        "debug".to_string()
    } else if std::env::var("SSR_I18N_TRACE").ok().as_deref() == Some("1") {
        "trace".to_string()
    } else {
        args.log_level.clone()
    }
}

/// What: Load the user config from `--config`, else from the default location.
///
/// # Errors
/// - `Configuration` when the file is missing or cannot be parsed
pub fn resolve_config(path: Option<&Path>) -> Result<UserConfig, I18nError> {
    match path {
        Some(path) => load_user_config(path),
        None => load_user_config(&default_config_path()),
    }
}
