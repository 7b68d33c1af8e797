//! Shared fixtures: an in-memory product catalog, its slug generator, and a
//! two-route mock host router.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::config::SeoConfig;
use crate::generator::SeoGenerator;
use crate::record::Params;
use crate::router::{HostRouter, RequestContext, RouteMatch};
use crate::slug::{SeoSlug, lang_from_locale};

/// Mutable id → title map shared between a test and its generator.
#[derive(Clone, Default)]
pub(crate) struct TitleBook {
    titles: Arc<Mutex<FxHashMap<u32, String>>>,
}

impl TitleBook {
    pub fn new(entries: &[(u32, &str)]) -> Self {
        let book = Self::default();
        for (id, title) in entries {
            book.set(*id, title);
        }
        book
    }

    pub fn get(&self, id: u32) -> Option<String> {
        self.titles.lock().get(&id).cloned()
    }

    pub fn set(&self, id: u32, title: &str) {
        self.titles.lock().insert(id, title.to_string());
    }
}

/// Generator for the `product` route: slug text is the product title,
/// identity is the product id.
pub(crate) struct ProductGenerator {
    titles: TitleBook,
}

impl SeoGenerator for ProductGenerator {
    fn hash_params(&self, _route_name: &str, route_params: &Params) -> Params {
        ["path", "id"]
            .iter()
            .filter_map(|key| {
                route_params
                    .get(*key)
                    .map(|value| (key.to_string(), value.clone()))
            })
            .collect()
    }

    fn build_slug(&self, route_name: &str, params: &Params) -> Option<SeoSlug> {
        let id: u32 = params.get("id")?.parse().ok()?;
        let title = self.titles.get(id)?;
        let locale = params.get("_locale").cloned().unwrap_or_else(|| "lt_LT".into());

        let mut slug = SeoSlug::new(
            route_name,
            format!("/{}/prod", lang_from_locale(&locale)),
            locale,
        );
        slug.push_part(title);
        slug.set_entity_id(id);
        let mut query = Params::new();
        query.insert("id".into(), id.to_string());
        slug.set_query_parts(query);
        Some(slug)
    }
}

pub(crate) fn product_generator(titles: TitleBook) -> Arc<dyn SeoGenerator> {
    Arc::new(ProductGenerator { titles })
}

/// Route params the way the router assembles them for the `product` route.
pub(crate) fn product_params(id: u32, locale: &str) -> Params {
    let mut params = Params::new();
    params.insert(
        "path".into(),
        format!("/{}/product/view", lang_from_locale(locale)),
    );
    params.insert("id".into(), id.to_string());
    params.insert("_locale".into(), locale.to_string());
    params
}

pub(crate) fn engine_config() -> SeoConfig {
    SeoConfig {
        default_locale: "lt_LT".into(),
        locales: vec!["lt_LT".into(), "en_US".into(), "ru_RU".into()],
        cache_ttl: 0,
        ..SeoConfig::default()
    }
}

/// Host router with two canonical routes: `home` at `/{lang}` and `product`
/// at `/{lang}/product/view`.
pub(crate) struct MockHostRouter {
    locales: FxHashMap<&'static str, &'static str>,
}

impl MockHostRouter {
    pub fn new() -> Self {
        Self {
            locales: [("lt", "lt_LT"), ("en", "en_US"), ("ru", "ru_RU")]
                .into_iter()
                .collect(),
        }
    }
}

impl HostRouter for MockHostRouter {
    fn match_path(&self, path: &str, _ctx: &RequestContext) -> Option<RouteMatch> {
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        let locale = self.locales.get(*segments.first()?)?;
        let mut params = Params::new();
        params.insert("_locale".into(), locale.to_string());

        match segments.as_slice() {
            [_lang] => Some(RouteMatch {
                route_name: "home".into(),
                params,
            }),
            [_lang, "product", "view"] => Some(RouteMatch {
                route_name: "product".into(),
                params,
            }),
            _ => None,
        }
    }

    fn generate(
        &self,
        route_name: &str,
        params: &Params,
        _ctx: &RequestContext,
    ) -> Option<String> {
        let lang = params
            .get("_locale")
            .map(|locale| lang_from_locale(locale).to_string())
            .unwrap_or_else(|| "lt".into());
        match route_name {
            "home" => Some(format!("/{lang}")),
            "product" => Some(format!("/{lang}/product/view?id={}", params.get("id")?)),
            _ => None,
        }
    }
}
