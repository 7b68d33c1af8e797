//! Seogate - reversible, unique, invalidatable pretty-URLs between your
//! router and your database.
//!
//! Friendly paths are generated from domain objects by per-route
//! [`SeoGenerator`]s, made unique with a numeric suffix on collision, and
//! persisted as hash-keyed [`UrlRecord`]s. The [`SeoRouter`] wraps the host
//! framework's router in both directions; entity lifecycle hooks drive the
//! record state machine through the [`InvalidationManager`], so renamed
//! entities keep redirecting and removed ones answer on their canonical
//! route only.

pub mod alternates;
pub mod cache;
pub mod config;
pub mod error;
pub mod generator;
pub mod invalidator;
pub mod manager;
pub mod record;
pub mod router;
pub mod slug;
pub mod store;
pub mod utils;

#[cfg(test)]
pub(crate) mod testutil;

pub use alternates::AlternatesManager;
pub use config::{MissingUrlStrategy, SeoConfig};
pub use error::{Result, SeoError, StoreError};
pub use generator::{GeneratorRegistry, SeoGenerator};
pub use invalidator::{
    ChangeSet, EntityRef, InvalidationManager, InvalidatorRegistry, SeoInvalidator,
};
pub use manager::UrlManager;
pub use record::{AlternateSet, Params, UrlRecord, UrlStatus};
pub use router::{
    HostRouter, RequestContext, Resolution, RouteMatch, SeoResolution, SeoRouter, UrlMode,
};
pub use slug::SeoSlug;
pub use store::{ScopeFilter, SqliteStore, UniquenessCheck, UrlStore};
