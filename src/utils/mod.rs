//! Pure helper functions: identity hashing and query-string assembly.

pub mod hash;
pub mod query;
