//! Transient slug model produced by generators.
//!
//! A [`SeoSlug`] captures one generation attempt: where the friendly path
//! lives (prefix + locale), which entity it denotes, the ordered text
//! segments it is built from, and the residual query parameters that were
//! not consumed into the path. It is consumed exactly once to build a
//! [`UrlRecord`](crate::record::UrlRecord).

mod urlize;

pub use urlize::{format_alternate_tag, glue_url, lang_from_locale, transliterate, urlize};

use crate::record::Params;
use crate::utils::hash;

/// Slug under construction for a single route + parameter set.
#[derive(Debug, Clone, Default)]
pub struct SeoSlug {
    route_name: String,
    prefix: String,
    locale: String,
    entity_id: Option<u32>,
    parts: Vec<Vec<String>>,
    query_parts: Params,
}

impl SeoSlug {
    pub fn new(
        route_name: impl Into<String>,
        prefix: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            route_name: route_name.into(),
            prefix: prefix.into(),
            locale: locale.into(),
            ..Self::default()
        }
    }

    /// Append a single-item path segment group.
    pub fn push_part(&mut self, text: impl Into<String>) -> &mut Self {
        self.parts.push(vec![text.into()]);
        self
    }

    /// Append a segment group; items are joined with the slug separator
    /// before urlization.
    pub fn push_group(&mut self, items: Vec<String>) -> &mut Self {
        self.parts.push(items);
        self
    }

    /// Bind the slug to a real domain object.
    pub fn set_entity_id(&mut self, id: u32) -> &mut Self {
        self.entity_id = Some(id);
        self
    }

    /// Residual query parameters not consumed into the path. These must be
    /// a subset of the generator's hash parameters, otherwise forward
    /// lookups and creation would disagree on the std hash.
    pub fn set_query_parts(&mut self, parts: Params) -> &mut Self {
        self.query_parts = parts;
        self
    }

    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn parts(&self) -> &[Vec<String>] {
        &self.parts
    }

    pub fn query_parts(&self) -> &Params {
        &self.query_parts
    }

    /// The entity id this slug denotes. Falls back to a synthetic id hashed
    /// from the residual query parameters when the slug is not tied to a
    /// real domain object.
    pub fn entity_id(&self) -> u32 {
        self.entity_id
            .unwrap_or_else(|| hash::hash_params(&self.query_parts))
    }
}
