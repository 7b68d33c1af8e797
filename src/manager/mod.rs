//! URL manager: orchestrates generators, cache and store to create and
//! resolve friendly URLs, including the collision-resolution loop.

use std::sync::Arc;
use std::time::Duration;

use regex::Regex;

use crate::cache::UrlCache;
use crate::config::SeoConfig;
use crate::error::{Result, SeoError};
use crate::generator::GeneratorRegistry;
use crate::record::{Params, UrlRecord, UrlStatus};
use crate::slug::{SeoSlug, glue_url};
use crate::store::{UniquenessCheck, UrlStore};
use crate::utils::{hash, query};

pub struct UrlManager {
    store: Arc<dyn UrlStore>,
    generators: GeneratorRegistry,
    cache: Option<UrlCache>,
    config: Arc<SeoConfig>,
    suffix_re: Regex,
}

impl UrlManager {
    pub fn new(
        store: Arc<dyn UrlStore>,
        generators: GeneratorRegistry,
        config: Arc<SeoConfig>,
    ) -> Self {
        let cache = (config.cache_ttl > 0)
            .then(|| UrlCache::new(Duration::from_secs(config.cache_ttl)));
        // Trailing generation counter, e.g. `-3` in `widget-3`. ASCII digit
        // class: the crate is built without regex's unicode tables.
        let suffix_re = Regex::new(&format!(
            r"{}([0-9]+)$",
            regex::escape(&config.slug_separator.to_string())
        ))
        .expect("suffix pattern is valid");
        Self {
            store,
            generators,
            cache,
            config,
            suffix_re,
        }
    }

    pub fn store(&self) -> &Arc<dyn UrlStore> {
        &self.store
    }

    pub fn generators(&self) -> &GeneratorRegistry {
        &self.generators
    }

    pub fn is_seo_route(&self, route_name: &str) -> bool {
        self.generators.is_registered(route_name)
    }

    /// Forward lookup: the active friendly URL for a canonical identity.
    /// Read-through cached by std hash.
    pub fn get_active_seo_url(
        &self,
        route_name: &str,
        route_params: &Params,
    ) -> Result<Option<UrlRecord>> {
        let generator = self.generators.get(route_name)?;
        let std_hash = hash::hash_params(&generator.hash_params(route_name, route_params));

        if let Some(cache) = &self.cache
            && let Some(hit) = cache.get(std_hash)
        {
            return Ok(Some(hit));
        }

        let record = self.store.find_by_std_hash(std_hash)?;
        if let (Some(cache), Some(record)) = (&self.cache, &record) {
            cache.put(record);
        }
        Ok(record)
    }

    /// Reverse lookup: the canonical identity for a friendly path. Prefers
    /// the lowest-status row so matched-but-stale takes the redirect path.
    pub fn get_std_url(&self, seo_path: &str, locale: &str) -> Result<Option<UrlRecord>> {
        let seo_hash = hash::hash_str(seo_path);
        Ok(self.store.find_by_seo_hash(seo_hash, locale)?)
    }

    /// The currently active sibling of a stale record, read-through cached
    /// by the stale record's std hash.
    pub fn exchange_inactive_for_active(
        &self,
        stale: &UrlRecord,
    ) -> Result<Option<UrlRecord>> {
        // The cached entry can be the stale record itself (same std hash,
        // status cached before the invalidation); only a different row
        // counts as the active sibling. The stale entry is evicted so the
        // regeneration path cannot resolve back onto it.
        if let Some(cache) = &self.cache
            && let Some(hit) = cache.get(stale.std_path_hash)
        {
            if hit.status == UrlStatus::Ok && hit.seo_path_hash != stale.seo_path_hash {
                return Ok(Some(hit));
            }
            cache.remove(stale.std_path_hash);
        }

        let active =
            self.store
                .find_active(&stale.route_name, stale.entity_id, &stale.locale)?;
        if let (Some(cache), Some(active)) = (&self.cache, &active) {
            cache.put(active);
        }
        Ok(active)
    }

    /// Create a new active friendly URL for the given canonical request.
    ///
    /// Assumes every other friendly URL for these parameters is stale or
    /// absent. Idempotent: re-creating the same identity reuses or repairs
    /// the existing row instead of inserting a duplicate.
    pub fn create_seo_url(&self, route_name: &str, route_params: &Params) -> Result<UrlRecord> {
        let generator = self.generators.get(route_name)?;
        let hash_params = generator.hash_params(route_name, route_params);

        let mut merged = route_params.clone();
        merged.extend(hash_params.iter().map(|(k, v)| (k.clone(), v.clone())));

        let slug = generator
            .build_slug(route_name, &merged)
            .ok_or_else(|| SeoError::GenerationRefused {
                route: route_name.to_string(),
            })?;

        let mut candidate = self.build_record(route_name, slug, &hash_params)?;

        let mut iteration: u32 = 1;
        loop {
            if iteration > self.config.max_collision_iterations {
                return Err(SeoError::CollisionOverflow {
                    route: route_name.to_string(),
                    attempts: self.config.max_collision_iterations,
                });
            }

            match self.store.check_unique(&candidate)? {
                UniquenessCheck::Unique => {
                    self.store.upsert(&candidate)?;
                    if let Some(cache) = &self.cache {
                        cache.put(&candidate);
                    }
                    return Ok(candidate);
                }
                UniquenessCheck::SameIdentity(_) => {
                    // The same identity regenerated the same text, e.g. a
                    // concurrent create or a repeated canonical request.
                    // Repair the existing row's std fields in place.
                    self.store.repair_duplicate(&candidate)?;
                    if let Some(cache) = &self.cache {
                        cache.put(&candidate);
                    }
                    return Ok(candidate);
                }
                UniquenessCheck::Collision(existing) => {
                    tracing::debug!(
                        route = route_name,
                        taken = %existing.seo_url,
                        iteration,
                        "friendly path collision, suffixing"
                    );
                    self.make_unique(&existing, &mut candidate, iteration);
                    iteration += 1;
                }
            }
        }
    }

    /// Build a candidate record from a slug and its hash parameters.
    fn build_record(
        &self,
        route_name: &str,
        slug: SeoSlug,
        hash_params: &Params,
    ) -> Result<UrlRecord> {
        let seo_url = glue_url(
            &slug,
            self.config.path_separator,
            self.config.slug_separator,
            &self.config.transliteration_langs,
        );

        let mut std_params = hash_params.clone();
        std_params.extend(slug.query_parts().iter().map(|(k, v)| (k.clone(), v.clone())));
        let std_url =
            query::build_std_url(&std_params).ok_or_else(|| SeoError::GenerationRefused {
                route: route_name.to_string(),
            })?;

        let record = UrlRecord {
            seo_path_hash: hash::hash_str(&seo_url),
            std_path_hash: hash::hash_params(&std_params),
            locale: slug.locale().to_string(),
            route_name: slug.route_name().to_string(),
            entity_id: slug.entity_id(),
            seo_url,
            std_url,
            status: UrlStatus::Ok,
            timestamp: chrono::Utc::now(),
        };
        record.validate()?;
        Ok(record)
    }

    /// Rewrite the candidate's friendly path with the next free suffix.
    ///
    /// The counter continues from the suffix of the row we collided with.
    /// A matched number larger than the iteration count cannot be a
    /// generation counter (it is title text, think `product-42`), so it is
    /// capped to the iteration and the title text kept intact.
    fn make_unique(&self, existing: &UrlRecord, candidate: &mut UrlRecord, iteration: u32) {
        let sep = self.config.slug_separator;

        let mut matched_at = None;
        let mut current = u64::from(iteration);
        if let Some(caps) = self.suffix_re.captures(&existing.seo_url) {
            let whole = caps.get(0).expect("match exists");
            current = caps[1].parse::<u64>().unwrap_or(u64::MAX);
            matched_at = Some(whole.start());
        }
        if current > u64::from(iteration) {
            current = u64::from(iteration);
            matched_at = None;
        }
        let next = current + 1;

        match matched_at {
            // The collided row carries a generated suffix; replace the span
            // it occupies. The candidate shares the base text, so the
            // offset lines up with its own suffix from the prior iteration.
            Some(offset)
                if offset <= candidate.seo_url.len()
                    && candidate.seo_url.is_char_boundary(offset) =>
            {
                candidate.seo_url.truncate(offset);
                candidate.seo_url.push(sep);
                candidate.seo_url.push_str(&next.to_string());
            }
            _ => {
                candidate.seo_url.push(sep);
                candidate.seo_url.push_str(&next.to_string());
            }
        }
        candidate.seo_path_hash = hash::hash_str(&candidate.seo_url);
    }
}
