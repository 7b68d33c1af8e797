//! Persisted URL record and its status state machine.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Flat, ordered route/query parameter map.
///
/// Sorted key order makes the serialized form (and therefore the persisted
/// hashes) deterministic across processes.
pub type Params = BTreeMap<String, String>;

/// Lifecycle status of a [`UrlRecord`].
///
/// Allowed transitions: OK→REDIRECT (source entity changed), REDIRECT→OK
/// (revival of a previously generated slug), any→INVALID (explicit removal,
/// never auto-reversed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlStatus {
    Invalid,
    Ok,
    Redirect,
}

impl UrlStatus {
    /// Persisted integer form. INVALID=0, OK=1, REDIRECT=2; reverse lookups
    /// sort ascending so OK wins over REDIRECT.
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Invalid => 0,
            Self::Ok => 1,
            Self::Redirect => 2,
        }
    }

    pub fn from_i64(value: i64) -> Result<Self, StoreError> {
        match value {
            0 => Ok(Self::Invalid),
            1 => Ok(Self::Ok),
            2 => Ok(Self::Redirect),
            other => Err(StoreError::InvalidRecord(format!(
                "unknown status `{other}`"
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Ok => "ok",
            Self::Redirect => "redirect",
        }
    }
}

/// One row of the friendly⇄canonical URL mapping.
///
/// `(seo_path_hash, std_path_hash)` is the composite primary key;
/// re-creation attempts for the same canonical identity reuse the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// CRC32 of the friendly path. Locale is a separate column, together
    /// they scope reverse lookups.
    pub seo_path_hash: u32,
    /// CRC32 of the canonical hash-parameters, used for forward lookup.
    pub std_path_hash: u32,
    /// Fixed 5-char locale tag, e.g. `lt_LT`.
    pub locale: String,
    /// Route name, at most 35 chars.
    pub route_name: String,
    /// Real domain-object id, or a synthetic id hashed from residual
    /// parameters when the slug is not tied to a real entity.
    pub entity_id: u32,
    /// Friendly path.
    pub seo_url: String,
    /// Canonical path + query, re-parseable.
    pub std_url: String,
    pub status: UrlStatus,
    /// Updated on every write.
    pub timestamp: DateTime<Utc>,
}

/// Longest route name the schema stores.
pub const MAX_ROUTE_NAME_LEN: usize = 35;

/// Length of a locale tag, e.g. `lt_LT`.
pub const LOCALE_LEN: usize = 5;

impl UrlRecord {
    /// Schema-level invariants, checked before a write.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.route_name.len() > MAX_ROUTE_NAME_LEN {
            return Err(StoreError::InvalidRecord(format!(
                "route name `{}` exceeds {MAX_ROUTE_NAME_LEN} chars",
                self.route_name
            )));
        }
        if self.locale.len() != LOCALE_LEN {
            return Err(StoreError::InvalidRecord(format!(
                "locale `{}` is not a {LOCALE_LEN}-char tag",
                self.locale
            )));
        }
        Ok(())
    }

    /// Whether `other` denotes the same logical identity: same route,
    /// same entity. Distinguishes a revival from a text collision.
    pub fn identity_matches(&self, other: &UrlRecord) -> bool {
        self.route_name == other.route_name && self.entity_id == other.entity_id
    }

    /// Canonical path without the query string.
    pub fn std_path(&self) -> &str {
        self.std_url.split('?').next().unwrap_or(&self.std_url)
    }

    /// Raw query string of the canonical URL, empty when absent.
    pub fn std_query_str(&self) -> &str {
        match self.std_url.split_once('?') {
            Some((_, query)) => query,
            None => "",
        }
    }
}

/// Synthetic alternate tag aliasing the default locale's entry.
pub const X_DEFAULT: &str = "x-default";

/// Ephemeral locale-tag → absolute URL mapping for one canonical identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlternateSet {
    entries: BTreeMap<String, String>,
}

impl AlternateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>, url: impl Into<String>) {
        self.entries.insert(tag.into(), url.into());
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.entries.get(tag).map(String::as_str)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Number of entries, the `x-default` alias included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
