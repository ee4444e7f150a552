//! Command-line argument definition and processing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ssr_i18n::I18nError;

/// ssr-i18n - inspect the translation state a page would serialize
#[derive(Parser, Debug)]
#[command(name = "ssr-i18n")]
#[command(version)]
#[command(about = "Inspect server-side translation props and namespace discovery", long_about = None)]
pub struct Args {
    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Enable verbose output (equivalent to --log-level debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Config file (default: $I18NEXT_DEFAULT_CONFIG_PATH or ./i18n.config.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the page props a server-side load produces for a locale
    Props {
        /// Locale the page renders in
        #[arg(short, long)]
        locale: String,

        /// Namespace bound to the translation function
        #[arg(long, value_delimiter = ',')]
        ns: Vec<String>,

        /// Explicit namespace set (comma-separated); discovered when omitted
        #[arg(long, value_delimiter = ',')]
        require: Option<Vec<String>>,

        /// Extra locales to include (comma-separated)
        #[arg(long, value_delimiter = ',')]
        extra_locales: Vec<String>,

        /// Print compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },

    /// Print the namespaces discovered on disk for a locale and its fallbacks
    Namespaces {
        /// Locale to scan
        #[arg(short, long)]
        locale: String,

        /// Extra locales to scan (comma-separated)
        #[arg(long, value_delimiter = ',')]
        extra_locales: Vec<String>,
    },

    /// Translate keys with the runtime a server-side load builds
    T {
        /// Locale to translate into
        #[arg(short, long)]
        locale: String,

        /// Namespace for keys without an `ns:` prefix
        #[arg(long)]
        ns: Option<String>,

        /// Prefix joined in front of every key
        #[arg(long)]
        key_prefix: Option<String>,

        /// Keys to translate
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

/// What: Run the selected subcommand.
///
/// Inputs:
/// - `args`: Parsed command-line arguments.
///
/// Output:
/// - Text to print on stdout.
///
/// # Errors
/// - Propagates config, argument and backend errors of the library
pub async fn process_args(args: &Args) -> Result<String, I18nError> {
    use crate::args::{namespaces, props, translate};

    let config = args.config.as_deref();
    match &args.command {
        Command::Props {
            locale,
            ns,
            require,
            extra_locales,
            compact,
        } => {
            props::handle_props(
                props::PropsRequest {
                    locale,
                    ns,
                    require: require.as_deref(),
                    extra_locales,
                    compact: *compact,
                },
                config,
            )
            .await
        }
        Command::Namespaces {
            locale,
            extra_locales,
        } => namespaces::handle_namespaces(locale, extra_locales, config),
        Command::T {
            locale,
            ns,
            key_prefix,
            keys,
        } => {
            translate::handle_translate(locale, ns.as_deref(), key_prefix.as_deref(), keys, config)
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_props_parses_comma_lists() {
        let args = Args::try_parse_from([
            "ssr-i18n",
            "props",
            "--locale",
            "de",
            "--require",
            "common,home",
            "--extra-locales",
            "fr",
        ])
        .expect("parse");
        match args.command {
            Command::Props {
                locale,
                require,
                extra_locales,
                ..
            } => {
                assert_eq!(locale, "de");
                assert_eq!(require, Some(vec!["common".into(), "home".into()]));
                assert_eq!(extra_locales, vec!["fr".to_string()]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "ssr-i18n",
            "namespaces",
            "-l",
            "en",
            "--config",
            "cfg.yml",
            "-v",
        ])
        .expect("parse");
        assert!(args.verbose);
        assert_eq!(args.config, Some(PathBuf::from("cfg.yml")));
    }

    #[test]
    fn test_translate_requires_keys() {
        assert!(Args::try_parse_from(["ssr-i18n", "t", "--locale", "en"]).is_err());
    }
}
