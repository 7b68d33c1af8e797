//! Per-route slug generators.
//!
//! One generator per route decides (a) which parameters make a canonical
//! identity unique (the hash parameters) and (b) the friendly slug text.
//! The same generator instance may serve several routes; a route may have
//! only one generator.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::SeoError;
use crate::record::Params;
use crate::slug::SeoSlug;

/// Capability a route plugs into the engine.
pub trait SeoGenerator: Send + Sync {
    /// The parameter subset that uniquely identifies the canonical URL.
    /// Must include the `path` key (provided in `route_params`); these
    /// parameters are hashed for forward lookups, so the same inputs must
    /// always yield the same map.
    fn hash_params(&self, route_name: &str, route_params: &Params) -> Params;

    /// Build the slug for one generation attempt, or decline (`None`) when
    /// the parameters cannot produce a friendly path.
    fn build_slug(&self, route_name: &str, params: &Params) -> Option<SeoSlug>;
}

/// Route name → generator mapping.
#[derive(Default)]
pub struct GeneratorRegistry {
    by_route: FxHashMap<String, Arc<dyn SeoGenerator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        route_name: impl Into<String>,
        generator: Arc<dyn SeoGenerator>,
    ) -> Result<(), SeoError> {
        let route_name = route_name.into();
        if self.by_route.contains_key(&route_name) {
            return Err(SeoError::AlreadyRegistered { name: route_name });
        }
        self.by_route.insert(route_name, generator);
        Ok(())
    }

    pub fn get(&self, route_name: &str) -> Result<&Arc<dyn SeoGenerator>, SeoError> {
        self.by_route
            .get(route_name)
            .ok_or_else(|| SeoError::NotRegistered {
                route: route_name.to_string(),
            })
    }

    pub fn is_registered(&self, route_name: &str) -> bool {
        self.by_route.contains_key(route_name)
    }

    pub fn routes(&self) -> impl Iterator<Item = &str> {
        self.by_route.keys().map(String::as_str)
    }
}
