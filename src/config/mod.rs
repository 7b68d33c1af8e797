//! Engine configuration.
//!
//! Explicit configuration struct passed at construction; no ambient shared
//! state. Deserializable from TOML with full defaults, `default_locale`
//! excepted: it is required and checked by [`SeoConfig::validate`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What `generate` emits when a pretty URL cannot be resolved at all.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissingUrlStrategy {
    /// Emit a placeholder `#` (default).
    #[default]
    Ignore,
    /// Emit `scheme://host/`.
    EmptyHost,
    /// Emit `scheme://host/{locale}/`.
    EmptyHostWithLocale,
    /// Delegate to a caller-supplied resolver.
    Callback,
    /// Emit an empty string. Used internally when generating alternates so
    /// that ungeneratable locales are skipped instead of erroring.
    Empty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoConfig {
    /// Separator inside a path segment group.
    pub slug_separator: char,
    /// Separator between path segment groups.
    pub path_separator: char,
    pub missing_url_strategy: MissingUrlStrategy,
    /// Required. Fixed 5-char tag, e.g. `lt_LT`.
    pub default_locale: String,
    /// Locales considered when building alternate links.
    pub locales: Vec<String>,
    /// Collapses regional variants in alternate tags, e.g. `en_GL` → `en_US`.
    pub alternate_locale_mapping: BTreeMap<String, String>,
    /// Read-through cache TTL in seconds; 0 disables the cache.
    pub cache_ttl: u64,
    /// Message attached to 404-equivalent resolutions.
    pub not_found_message: String,
    /// Permanently redirect when the request path differs from the stored
    /// friendly path only in case or formatting.
    pub case_redirects: bool,
    /// Surface `RouteUnresolvable` instead of applying the missing-url
    /// strategy on non-seo routes.
    pub strict: bool,
    /// Ceiling for the collision-resolution loop; exhaustion is an error.
    pub max_collision_iterations: u32,
    /// Language codes whose locales get transliterated slugs.
    pub transliteration_langs: Vec<String>,
}

impl Default for SeoConfig {
    fn default() -> Self {
        Self {
            slug_separator: '-',
            path_separator: '/',
            missing_url_strategy: MissingUrlStrategy::Ignore,
            default_locale: String::new(),
            locales: Vec::new(),
            alternate_locale_mapping: BTreeMap::new(),
            cache_ttl: 600,
            not_found_message: "Page not found".into(),
            case_redirects: true,
            strict: false,
            max_collision_iterations: 100,
            transliteration_langs: vec!["ru".into()],
        }
    }
}

impl SeoConfig {
    /// Parse from TOML and validate.
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_locale.is_empty() {
            return Err(ConfigError::Validation(
                "`default_locale` is required".into(),
            ));
        }
        for locale in std::iter::once(&self.default_locale).chain(self.locales.iter()) {
            if locale.len() != 5 || !locale.contains('_') {
                return Err(ConfigError::Validation(format!(
                    "locale `{locale}` must be a 5-char tag like `lt_LT`"
                )));
            }
        }
        if self.slug_separator.is_alphanumeric() || self.path_separator.is_alphanumeric() {
            return Err(ConfigError::Validation(
                "separators must not be alphanumeric".into(),
            ));
        }
        if self.slug_separator == self.path_separator {
            return Err(ConfigError::Validation(
                "`slug_separator` and `path_separator` must differ".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
