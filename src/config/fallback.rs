//! Fallback-locale rules and chain resolution.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Resolver signature for [`FallbackLng::Resolver`].
pub type FallbackResolver = Arc<dyn Fn(&str) -> FallbackLng + Send + Sync>;

/// Key of the wildcard entry in a per-locale fallback map.
pub const DEFAULT_FALLBACK_KEY: &str = "default";

/// What: Configured fallback rules for locales missing a translation.
///
/// Details:
/// - `Disabled`: no fallback (`false` in config files)
/// - `Single`/`List`: same fallback for every locale
/// - `Map`: per-locale lists, with the `default` entry appended to every chain
/// - `Resolver`: computed per locale; never serialized
#[derive(Clone, Default)]
pub enum FallbackLng {
    /// No fallback locales.
    #[default]
    Disabled,
    /// One fallback locale for everything.
    Single(String),
    /// Ordered fallback locales for everything.
    List(Vec<String>),
    /// Per-locale fallback lists plus an optional `default` wildcard.
    Map(BTreeMap<String, Vec<String>>),
    /// Fallback rules computed from the requested locale.
    Resolver(FallbackResolver),
}

impl FallbackLng {
    /// What: Build a resolver-backed rule from a closure.
    pub fn resolver<F>(f: F) -> Self
    where
        F: Fn(&str) -> Self + Send + Sync + 'static,
    {
        Self::Resolver(Arc::new(f))
    }

    /// What: Whether any fallback is configured at all.
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }
}

/// What: Resolve the fallback chain for one locale.
///
/// Inputs:
/// - `locale`: Requested locale code
/// - `fallback`: Configured fallback rules
///
/// Output:
/// - Fallback locales in configured order; may contain duplicates or `locale`
///   itself, callers de-duplicate when building a locale set
///
/// Details:
/// - `Map`: explicit entry for `locale` first, then the `default` entry
/// - `Resolver`: called once, its result is resolved again; a resolver returning
///   another resolver yields an empty chain
#[must_use]
pub fn fallback_for_locale(locale: &str, fallback: &FallbackLng) -> Vec<String> {
    match fallback {
        FallbackLng::Disabled => Vec::new(),
        FallbackLng::Single(lng) => vec![lng.clone()],
        FallbackLng::List(list) => list.clone(),
        FallbackLng::Map(map) => {
            let mut chain = map.get(locale).cloned().unwrap_or_default();
            if let Some(default) = map.get(DEFAULT_FALLBACK_KEY) {
                chain.extend(default.iter().cloned());
            }
            chain
        }
        FallbackLng::Resolver(resolve) => match resolve(locale) {
            FallbackLng::Resolver(_) => {
                tracing::warn!(
                    "Fallback resolver for '{}' returned another resolver; ignoring",
                    locale
                );
                Vec::new()
            }
            resolved => fallback_for_locale(locale, &resolved),
        },
    }
}

impl fmt::Debug for FallbackLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Single(lng) => f.debug_tuple("Single").field(lng).finish(),
            Self::List(list) => f.debug_tuple("List").field(list).finish(),
            Self::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Self::Resolver(_) => f.write_str("Resolver(<fn>)"),
        }
    }
}

impl Serialize for FallbackLng {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Disabled => serializer.serialize_bool(false),
            Self::Single(lng) => serializer.serialize_str(lng),
            Self::List(list) => list.serialize(serializer),
            Self::Map(map) => map.serialize(serializer),
            Self::Resolver(_) => serializer.serialize_none(),
        }
    }
}

/// Accepts a single locale or a list as a map value.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    /// `de-CH: de`
    One(String),
    /// `de-CH: [de, en]`
    Many(Vec<String>),
}

/// Wire shape of fallback rules in config files.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawFallback {
    /// `false` disables, `true` is treated as unset.
    Flag(bool),
    /// `fallback_lng: en`
    Single(String),
    /// `fallback_lng: [en, fr]`
    List(Vec<String>),
    /// `fallback_lng: { de-CH: [de], default: [en] }`
    Map(BTreeMap<String, OneOrMany>),
}

impl RawFallback {
    /// Rules for this wire value; `true` yields `None` so the default applies.
    fn into_rules(self) -> Option<FallbackLng> {
        match self {
            Self::Flag(true) => None,
            Self::Flag(false) => Some(FallbackLng::Disabled),
            Self::Single(lng) => Some(FallbackLng::Single(lng)),
            Self::List(list) => Some(FallbackLng::List(list)),
            Self::Map(map) => Some(FallbackLng::Map(
                map.into_iter()
                    .map(|(k, v)| match v {
                        OneOrMany::One(lng) => (k, vec![lng]),
                        OneOrMany::Many(list) => (k, list),
                    })
                    .collect(),
            )),
        }
    }
}

impl<'de> Deserialize<'de> for FallbackLng {
    /// Standalone values have no default to fall back to: `null` and `true`
    /// read as `Disabled`.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<RawFallback>::deserialize(deserializer)?;
        Ok(raw.and_then(RawFallback::into_rules).unwrap_or_default())
    }
}

/// What: Deserialize an optional `fallback_lng` config field.
///
/// Details:
/// - `null` and `true` leave the field unset, so `create_config` falls back
///   to the default locale
/// - `false` disables fallback
///
/// # Errors
/// - Values matching no fallback shape
pub(crate) fn deserialize_optional<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<FallbackLng>, D::Error> {
    let raw = Option::<RawFallback>::deserialize(deserializer)?;
    Ok(raw.and_then(RawFallback::into_rules))
}
