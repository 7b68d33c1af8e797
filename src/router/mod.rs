//! Dual-direction router adapter.
//!
//! Wraps the host framework's router: outbound, route + params become a
//! friendly URL (created on first use); inbound, a friendly path is resolved
//! back to the canonical route, with stale and removed paths answered by a
//! permanent redirect or a not-found.

use std::sync::Arc;

use crate::alternates::AlternatesManager;
use crate::config::{MissingUrlStrategy, SeoConfig};
use crate::error::{Result, SeoError};
use crate::manager::UrlManager;
use crate::record::{AlternateSet, Params, UrlRecord, UrlStatus};
use crate::slug::lang_from_locale;
use crate::utils::query;

/// Caller-supplied resolver for the `callback` missing-url strategy.
pub type MissingUrlCallback = Box<dyn Fn(&Params, &str) -> String + Send + Sync>;

/// Immutable snapshot of the inbound request. Derived contexts for
/// re-matching are built with [`RequestContext::for_reverse_match`]; the
/// original is never mutated.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub scheme: String,
    pub host: String,
    pub http_port: u16,
    pub https_port: u16,
    /// Decoded request path.
    pub path: String,
    /// Decoded request query parameters.
    pub query: Params,
    /// Locale negotiated by the host framework, when known.
    pub locale: Option<String>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            scheme: "http".into(),
            host: "localhost".into(),
            http_port: 80,
            https_port: 443,
            path: "/".into(),
            query: Params::new(),
            locale: None,
        }
    }
}

impl RequestContext {
    /// `scheme://host`, with the port omitted when it is the scheme default.
    pub fn base_url(&self) -> String {
        let (port, default) = if self.scheme == "https" {
            (self.https_port, 443)
        } else {
            (self.http_port, 80)
        };
        if port == default {
            format!("{}://{}", self.scheme, self.host)
        } else {
            format!("{}://{}:{}", self.scheme, self.host, port)
        }
    }

    /// Derived context pointing at a canonical path, for matching it against
    /// the host route table.
    pub fn for_reverse_match(&self, path: &str, query: Params) -> Self {
        Self {
            path: path.to_string(),
            query,
            ..self.clone()
        }
    }

    pub fn locale_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.locale.as_deref().unwrap_or(fallback)
    }
}

/// A route matched by the host router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub route_name: String,
    pub params: Params,
}

/// The host framework's own router, wrapped by [`SeoRouter`].
pub trait HostRouter: Send + Sync {
    /// Match a path against the canonical route table.
    fn match_path(&self, path: &str, ctx: &RequestContext) -> Option<RouteMatch>;

    /// Generate a canonical URL (path, optionally with a query string) for a
    /// route, or decline when the route or parameters are unknown.
    fn generate(&self, route_name: &str, params: &Params, ctx: &RequestContext)
    -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlMode {
    #[default]
    Path,
    Absolute,
}

/// Outcome of resolving an inbound path.
#[derive(Debug)]
pub enum Resolution {
    /// Serve the matched route. `seo` is present when the request arrived on
    /// an active friendly path.
    Match {
        inner: RouteMatch,
        seo: Option<SeoResolution>,
    },
    Redirect {
        location: String,
        permanent: bool,
    },
    NotFound {
        message: String,
    },
}

/// Pretty-URL annotations attached to a served match.
#[derive(Debug)]
pub struct SeoResolution {
    pub record: UrlRecord,
    /// Absolute friendly URL, for the canonical link element.
    pub canonical_url: String,
    pub alternates: AlternateSet,
}

pub struct SeoRouter {
    manager: Arc<UrlManager>,
    host: Arc<dyn HostRouter>,
    alternates: AlternatesManager,
    config: Arc<SeoConfig>,
    missing_url_callback: Option<MissingUrlCallback>,
}

impl SeoRouter {
    pub fn new(
        manager: Arc<UrlManager>,
        host: Arc<dyn HostRouter>,
        config: Arc<SeoConfig>,
    ) -> Self {
        let alternates = AlternatesManager::new(Arc::clone(&config), Arc::clone(manager.store()));
        Self {
            manager,
            host,
            alternates,
            config,
            missing_url_callback: None,
        }
    }

    pub fn with_missing_url_callback(mut self, callback: MissingUrlCallback) -> Self {
        self.missing_url_callback = Some(callback);
        self
    }

    pub fn manager(&self) -> &Arc<UrlManager> {
        &self.manager
    }

    /// Generate a URL for a route.
    ///
    /// Routes with a registered generator get their friendly URL, created on
    /// first use; everything else passes through to the host router. When no
    /// URL can be produced the configured missing-url strategy decides the
    /// placeholder, except in strict mode where an unresolvable host route
    /// is an error.
    pub fn generate(
        &self,
        route_name: &str,
        params: &Params,
        ctx: &RequestContext,
        mode: UrlMode,
    ) -> Result<String> {
        self.generate_with_strategy(route_name, params, ctx, mode, self.config.missing_url_strategy)
    }

    fn generate_with_strategy(
        &self,
        route_name: &str,
        params: &Params,
        ctx: &RequestContext,
        mode: UrlMode,
        strategy: MissingUrlStrategy,
    ) -> Result<String> {
        let locale = params
            .get("_locale")
            .cloned()
            .unwrap_or_else(|| ctx.locale_or(&self.config.default_locale).to_string());

        if !self.manager.is_seo_route(route_name) {
            return match self.host.generate(route_name, params, ctx) {
                Some(url) => Ok(self.absolutize(url, ctx, mode)),
                None if self.config.strict => Err(SeoError::RouteUnresolvable {
                    route: route_name.to_string(),
                }),
                None => Ok(self.apply_missing_strategy(strategy, params, &locale, ctx)),
            };
        }

        let mut route_params = params.clone();
        route_params.insert("_locale".into(), locale.clone());
        match self.lookup_or_create(route_name, route_params, ctx)? {
            Some(record) => {
                let consumed = query::parse_query(record.std_query_str());
                let mut residual = query::without_keys(params, &consumed);
                residual.remove("_locale");
                residual.remove("path");
                let url = query::append_query(&record.seo_url, &residual);
                Ok(self.absolutize(url, ctx, mode))
            }
            None => Ok(self.apply_missing_strategy(strategy, params, &locale, ctx)),
        }
    }

    /// Resolve an inbound request path.
    pub fn resolve(&self, ctx: &RequestContext) -> Result<Resolution> {
        if let Some(inner) = self.host.match_path(&ctx.path, ctx) {
            return self.supplement_canonical_match(inner, ctx);
        }

        let locale = ctx.locale_or(&self.config.default_locale).to_string();
        let Some(record) = self.manager.get_std_url(&ctx.path, &locale)? else {
            return Ok(self.not_found());
        };

        let std_query = query::parse_query(record.std_query_str());
        let reverse_ctx = ctx.for_reverse_match(record.std_path(), std_query.clone());
        let Some(inner) = self.host.match_path(record.std_path(), &reverse_ctx) else {
            tracing::warn!(std_url = %record.std_url, "stored canonical url no longer matches a route");
            return Ok(self.not_found());
        };

        match record.status {
            // Removed entity: serve the canonical route, no friendly-url
            // annotations, no redirect.
            UrlStatus::Invalid => Ok(Resolution::Match { inner, seo: None }),
            UrlStatus::Redirect => self.redirect_to_active(&record, inner, &std_query, ctx),
            UrlStatus::Ok => self.serve_friendly(record, inner, std_query, ctx),
        }
    }

    /// Request hit a canonical path directly. Served as-is, unless the route
    /// is friendly-url managed and an active friendly URL exists, in which
    /// case the request is permanently redirected onto it.
    fn supplement_canonical_match(
        &self,
        inner: RouteMatch,
        ctx: &RequestContext,
    ) -> Result<Resolution> {
        if !self.manager.is_seo_route(&inner.route_name) {
            return Ok(Resolution::Match { inner, seo: None });
        }

        let mut route_params = ctx.query.clone();
        route_params.extend(inner.params.iter().map(|(k, v)| (k.clone(), v.clone())));
        route_params.insert(
            "_locale".into(),
            ctx.locale_or(&self.config.default_locale).to_string(),
        );
        route_params.insert("path".into(), ctx.path.clone());

        match self.manager.get_active_seo_url(&inner.route_name, &route_params)? {
            Some(record) if record.seo_url != ctx.path => {
                let consumed = query::parse_query(record.std_query_str());
                let residual = query::without_keys(&ctx.query, &consumed);
                Ok(Resolution::Redirect {
                    location: query::append_query(&record.seo_url, &residual),
                    permanent: true,
                })
            }
            _ => Ok(Resolution::Match { inner, seo: None }),
        }
    }

    /// Stale friendly path: swap in the active sibling, regenerating it when
    /// none exists yet, and permanently redirect, carrying over the
    /// request's own query params.
    fn redirect_to_active(
        &self,
        stale: &UrlRecord,
        inner: RouteMatch,
        std_query: &Params,
        ctx: &RequestContext,
    ) -> Result<Resolution> {
        if let Some(active) = self.manager.exchange_inactive_for_active(stale)? {
            let residual = query::without_keys(&ctx.query, std_query);
            return Ok(Resolution::Redirect {
                location: query::append_query(&active.seo_url, &residual),
                permanent: true,
            });
        }

        let mut route_params = ctx.query.clone();
        route_params.extend(inner.params.iter().map(|(k, v)| (k.clone(), v.clone())));
        route_params.extend(std_query.iter().map(|(k, v)| (k.clone(), v.clone())));
        route_params.insert("_locale".into(), stale.locale.clone());
        route_params.insert("path".into(), stale.std_path().to_string());

        match self.lookup_or_create(&inner.route_name, route_params, ctx)? {
            Some(active) => {
                let residual = query::without_keys(&ctx.query, std_query);
                Ok(Resolution::Redirect {
                    location: query::append_query(&active.seo_url, &residual),
                    permanent: true,
                })
            }
            None => Ok(self.not_found()),
        }
    }

    /// Active friendly path: serve the canonical route annotated with the
    /// record, canonical link and alternates. A path that differs from the
    /// stored one (hashes are case-insensitive) is redirected to the stored
    /// form first.
    fn serve_friendly(
        &self,
        record: UrlRecord,
        mut inner: RouteMatch,
        std_query: Params,
        ctx: &RequestContext,
    ) -> Result<Resolution> {
        if self.config.case_redirects && ctx.path != record.seo_url {
            return Ok(Resolution::Redirect {
                location: query::append_query(&record.seo_url, &ctx.query),
                permanent: true,
            });
        }

        // Canonical query params the friendly path encodes (e.g. `id`) are
        // merged into the match; explicit request params win.
        for (key, value) in query::missing_keys(&std_query, &ctx.query) {
            inner.params.entry(key).or_insert(value);
        }

        let canonical_url = format!("{}{}", ctx.base_url(), record.seo_url);
        let alternates = self.collect_alternates(&record, &inner, &std_query, ctx)?;
        Ok(Resolution::Match {
            inner,
            seo: Some(SeoResolution {
                record,
                canonical_url,
                alternates,
            }),
        })
    }

    fn collect_alternates(
        &self,
        record: &UrlRecord,
        inner: &RouteMatch,
        std_query: &Params,
        ctx: &RequestContext,
    ) -> Result<AlternateSet> {
        let mut base_params = inner.params.clone();
        base_params.extend(std_query.iter().map(|(k, v)| (k.clone(), v.clone())));

        self.alternates.collect(record, &ctx.base_url(), |locale| {
            let mut params = base_params.clone();
            params.insert("_locale".into(), locale.to_string());
            // The canonical path is locale-dependent; drop the current one
            // so it is regenerated for the sibling locale.
            params.remove("path");
            let url = self.generate_with_strategy(
                &record.route_name,
                &params,
                ctx,
                UrlMode::Absolute,
                MissingUrlStrategy::Empty,
            )?;
            Ok((!url.is_empty()).then_some(url))
        })
    }

    /// Active friendly record for the route, created on first use. `None`
    /// means the slug generator declined or the host router cannot produce
    /// the canonical path, so the caller applies its missing-url handling.
    fn lookup_or_create(
        &self,
        route_name: &str,
        mut route_params: Params,
        ctx: &RequestContext,
    ) -> Result<Option<UrlRecord>> {
        if !route_params.contains_key("path") {
            match self.host.generate(route_name, &route_params, ctx) {
                Some(url) => {
                    let (path, _) = query::split_path_query(&url);
                    route_params.insert("path".into(), path);
                }
                None => return Ok(None),
            }
        }

        if let Some(record) = self.manager.get_active_seo_url(route_name, &route_params)? {
            return Ok(Some(record));
        }
        match self.manager.create_seo_url(route_name, &route_params) {
            Ok(record) => Ok(Some(record)),
            Err(SeoError::GenerationRefused { route }) => {
                tracing::debug!(route = %route, "generator declined, no friendly url");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn apply_missing_strategy(
        &self,
        strategy: MissingUrlStrategy,
        params: &Params,
        locale: &str,
        ctx: &RequestContext,
    ) -> String {
        match strategy {
            MissingUrlStrategy::Ignore => "#".into(),
            MissingUrlStrategy::EmptyHost => format!("{}/", ctx.base_url()),
            MissingUrlStrategy::EmptyHostWithLocale => {
                format!("{}/{}/", ctx.base_url(), lang_from_locale(locale))
            }
            MissingUrlStrategy::Callback => match &self.missing_url_callback {
                Some(callback) => callback(params, locale),
                None => {
                    tracing::warn!("missing-url strategy is `callback` but no callback is set");
                    "#".into()
                }
            },
            MissingUrlStrategy::Empty => String::new(),
        }
    }

    fn absolutize(&self, url: String, ctx: &RequestContext, mode: UrlMode) -> String {
        if mode == UrlMode::Absolute && url.starts_with('/') {
            format!("{}{}", ctx.base_url(), url)
        } else {
            url
        }
    }

    fn not_found(&self) -> Resolution {
        Resolution::NotFound {
            message: self.config.not_found_message.clone(),
        }
    }
}
