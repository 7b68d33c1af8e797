//! Persistence gateway for URL records.
//!
//! All queries are parameter-bound and scoped to a single
//! (hash | route, locale) combination at a time, which bounds the blast
//! radius of any one statement. The database constraints, not application
//! locking, are the source of truth for uniqueness.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::StoreError;
use crate::record::{UrlRecord, UrlStatus};

/// Outcome of the uniqueness probe for a candidate record.
#[derive(Debug, Clone, PartialEq)]
pub enum UniquenessCheck {
    /// No active row shares the friendly path; safe to insert.
    Unique,
    /// An active row for a *different* logical identity shares the path
    /// text. The candidate needs a new suffixed slug.
    Collision(UrlRecord),
    /// An active row for the *same* logical identity already exists.
    /// Not an error: the existing row is repaired in place.
    SameIdentity(UrlRecord),
}

/// Whether an upsert inserted a fresh row or revived an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Revived,
}

/// SQL parameter for a custom invalidation scope.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeParam {
    Int(i64),
    Text(String),
}

/// Extra WHERE fragment appended to scoped status transitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeFilter {
    /// Parameterized SQL fragment, e.g. `entity_id = ?`. `None` adds no
    /// extra constraint.
    pub clause: Option<String>,
    pub params: Vec<ScopeParam>,
}

impl ScopeFilter {
    /// Scope by exact entity id, the default invalidation scope.
    pub fn entity_id(id: u32) -> Self {
        Self {
            clause: Some("entity_id = ?".into()),
            params: vec![ScopeParam::Int(i64::from(id))],
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// Gateway to the relational store of URL records.
pub trait UrlStore: Send + Sync {
    /// Reverse lookup by friendly-path hash. Lowest status wins when
    /// duplicates exist (OK before REDIRECT before INVALID).
    fn find_by_seo_hash(&self, seo_hash: u32, locale: &str)
    -> Result<Option<UrlRecord>, StoreError>;

    /// Forward lookup by canonical hash, active rows only.
    fn find_by_std_hash(&self, std_hash: u32) -> Result<Option<UrlRecord>, StoreError>;

    /// The currently active row for a logical identity.
    fn find_active(
        &self,
        route_name: &str,
        entity_id: u32,
        locale: &str,
    ) -> Result<Option<UrlRecord>, StoreError>;

    /// `(locale, seo_url)` pairs of active sibling rows in other locales.
    fn find_alternates(
        &self,
        route_name: &str,
        entity_id: u32,
        exclude_locale: &str,
    ) -> Result<Vec<(String, String)>, StoreError>;

    /// Probe whether the candidate's friendly path is free.
    fn check_unique(&self, candidate: &UrlRecord) -> Result<UniquenessCheck, StoreError>;

    /// Insert the record; on primary-key conflict update status and
    /// timestamp only, reviving a previously invalidated slug.
    fn upsert(&self, record: &UrlRecord) -> Result<UpsertOutcome, StoreError>;

    /// Update the std fields of the existing row for the same identity in
    /// place. Recovery path for a duplicate that regenerated.
    fn repair_duplicate(&self, record: &UrlRecord) -> Result<(), StoreError>;

    /// Scoped status transition: active rows of the given routes (and
    /// locale, when given) move to `to`. Returns the number of rows
    /// touched.
    fn transition_status(
        &self,
        routes: &[String],
        locale: Option<&str>,
        scope: &ScopeFilter,
        to: UrlStatus,
    ) -> Result<usize, StoreError>;
}
