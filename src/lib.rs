//! Library entry for ssr-i18n: translation runtime glue for server-side
//! rendering with client hydration.
//!
//! - [`server::server_side_translations`] scopes, loads and serializes the
//!   translations a page needs
//! - [`provider::TranslationProvider`] rebuilds (or reuses) a runtime from the
//!   serialized state and keeps it in sync with the active locale

pub mod config;
pub mod error;
pub mod locale;
pub mod provider;
pub mod runtime;
pub mod server;

pub use config::{UserConfig, create_config, load_user_config};
pub use error::{BackendError, I18nError};
pub use provider::{TranslationProvider, get_or_create_instance, merge_resources};
pub use runtime::{FixedT, Runtime};
pub use server::{
    PageProps, ServerSideTranslations, SsrState, TranslationRequest, server_side_translations,
};
