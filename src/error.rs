//! Error taxonomy for the URL resolution engine.

use thiserror::Error;

/// Errors surfaced by the engine.
///
/// Duplicate-identity conflicts are intentionally absent: they are recovered
/// in place via the repair path and never reach the caller.
#[derive(Debug, Error)]
pub enum SeoError {
    /// Route has no registered generator. Callers continue without
    /// pretty-URL behavior.
    #[error("no generator registered for route `{route}`")]
    NotRegistered { route: String },

    /// A generator was already registered for this route or
    /// (entity type, route) pair.
    #[error("`{name}` is already registered")]
    AlreadyRegistered { name: String },

    /// The generator declined to produce a slug for the given parameters.
    #[error("generator for route `{route}` declined to build a slug")]
    GenerationRefused { route: String },

    /// The host router cannot generate the canonical URL at all.
    /// Surfaced only in strict mode, otherwise the missing-url strategy
    /// applies.
    #[error("host router cannot resolve route `{route}`")]
    RouteUnresolvable { route: String },

    /// The collision-resolution loop hit the configured iteration ceiling.
    #[error("collision resolution for route `{route}` exceeded {attempts} attempts")]
    CollisionOverflow { route: String, attempts: u32 },

    #[error("url store error")]
    Store(#[from] StoreError),
}

/// Persistence gateway errors. These propagate unrecovered.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid url record: {0}")]
    InvalidRecord(String),
}

pub type Result<T, E = SeoError> = std::result::Result<T, E>;
