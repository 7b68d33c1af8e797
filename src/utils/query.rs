//! Query-string and URL assembly helpers.
//!
//! Pure functions. Internal representation is always decoded; encoding
//! happens at the string boundary via `form_urlencoded`.

use url::form_urlencoded;

use crate::record::Params;

/// Parse a raw query string into a decoded parameter map.
pub fn parse_query(query: &str) -> Params {
    form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// Serialize a parameter map back into an encoded query string.
/// Sorted key order, so output is deterministic.
pub fn build_query(params: &Params) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish()
}

/// Append parameters to a URL, respecting an existing query string.
pub fn append_query(url: &str, params: &Params) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}{}", build_query(params))
}

/// Build the canonical URL from hash parameters: the required `path` key
/// becomes the path, everything else the query string.
///
/// Returns `None` when the generator failed to provide `path`.
pub fn build_std_url(params: &Params) -> Option<String> {
    let mut params = params.clone();
    let path = params.remove("path")?;
    Some(append_query(&path, &params))
}

/// Entries of `base` whose keys are not consumed by `consumed`.
///
/// Used to re-attach query parameters that did not participate in the
/// friendly path back onto it.
pub fn without_keys(base: &Params, consumed: &Params) -> Params {
    base.iter()
        .filter(|(key, _)| !consumed.contains_key(*key))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Entries of `from` whose keys are absent in `present`.
///
/// Used to merge canonical query parameters back into a matched request.
pub fn missing_keys(from: &Params, present: &Params) -> Params {
    without_keys(from, present)
}

/// Split a relative or absolute URL into `(path, query)` with the query
/// string left raw. Falls back to a plain split when parsing fails.
pub fn split_path_query(url: &str) -> (String, String) {
    // Dummy base, same trick the url crate needs for relative inputs.
    static BASE: std::sync::OnceLock<url::Url> = std::sync::OnceLock::new();
    let base = BASE.get_or_init(|| url::Url::parse("http://x").expect("static base url"));

    match base.join(url) {
        Ok(parsed) => {
            let path = percent_encoding::percent_decode_str(parsed.path())
                .decode_utf8()
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| parsed.path().to_string());
            (path, parsed.query().unwrap_or("").to_string())
        }
        Err(_) => match url.split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (url.to_string(), String::new()),
        },
    }
}
