//! Identity hashing for URL records.
//!
//! CRC32 over normalized input. These hashes are persisted and must
//! round-trip across processes for the same logical input, so the
//! serialization of parameter maps is fixed: sorted key order (guaranteed
//! by [`Params`](crate::record::Params) being an ordered map) serialized
//! as JSON, then lowercased.

use crate::record::Params;

/// Hash a string: UTF-8 aware lowercase, then CRC32.
#[inline]
pub fn hash_str(data: &str) -> u32 {
    crc32fast::hash(data.to_lowercase().as_bytes())
}

/// Hash a parameter map deterministically.
///
/// Equal logical inputs hash equally regardless of insertion order.
pub fn hash_params(params: &Params) -> u32 {
    let serialized =
        serde_json::to_string(params).expect("string map serialization cannot fail");
    hash_str(&serialized)
}
