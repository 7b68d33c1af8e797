//! Entity-change invalidation.
//!
//! Domain-object lifecycle hooks drive the record state machine: an update
//! touching a watched attribute moves the entity's active rows OK→REDIRECT
//! (the old path keeps redirecting), a removal moves them to INVALID. Rows
//! are never deleted; INVALID is the logical tombstone.

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::{Result, SeoError};
use crate::record::UrlStatus;
use crate::store::{ScopeFilter, UrlStore};

/// Identity of the changed domain object.
#[derive(Debug, Clone)]
pub struct EntityRef {
    /// Application-level type tag, e.g. `product`.
    pub entity_type: String,
    pub id: u32,
    /// Restrict the transition to one locale; `None` touches all locales.
    pub locale: Option<String>,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, id: u32) -> Self {
        Self {
            entity_type: entity_type.into(),
            id,
            locale: None,
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }
}

/// Changed attribute → new value, as reported by the host application's
/// persistence layer.
pub type ChangeSet = BTreeMap<String, serde_json::Value>;

/// Per-entity-type invalidation policy.
pub trait SeoInvalidator: Send + Sync {
    /// Attributes whose change stales the friendly URL.
    fn watched_attributes(&self) -> &[&str];

    /// Store scope of the transition. Defaults to the changed entity's rows.
    fn scope(&self, entity: &EntityRef) -> ScopeFilter {
        ScopeFilter::entity_id(entity.id)
    }

    /// Whether the change set intersects the watched attributes.
    fn should_invalidate(&self, change_set: &ChangeSet) -> bool {
        self.watched_attributes()
            .iter()
            .any(|attr| change_set.contains_key(*attr))
    }
}

struct Registration {
    routes: Vec<String>,
    invalidator: Arc<dyn SeoInvalidator>,
}

/// Entity type → invalidation policies and the routes they cover.
#[derive(Default)]
pub struct InvalidatorRegistry {
    by_entity: FxHashMap<String, Vec<Registration>>,
}

impl InvalidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `invalidator` for an entity type and the routes it stales.
    /// A route may be covered only once per entity type.
    pub fn register(
        &mut self,
        entity_type: impl Into<String>,
        routes: &[&str],
        invalidator: Arc<dyn SeoInvalidator>,
    ) -> Result<()> {
        let entity_type = entity_type.into();
        let registrations = self.by_entity.entry(entity_type.clone()).or_default();
        for route in routes {
            if registrations
                .iter()
                .any(|reg| reg.routes.iter().any(|known| known == route))
            {
                return Err(SeoError::AlreadyRegistered {
                    name: format!("{entity_type}:{route}"),
                });
            }
        }
        registrations.push(Registration {
            routes: routes.iter().map(|route| route.to_string()).collect(),
            invalidator,
        });
        Ok(())
    }

    fn resolve(&self, entity_type: &str) -> &[Registration] {
        self.by_entity
            .get(entity_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Applies registered invalidation policies to the URL store.
pub struct InvalidationManager {
    registry: InvalidatorRegistry,
    store: Arc<dyn UrlStore>,
}

impl InvalidationManager {
    pub fn new(registry: InvalidatorRegistry, store: Arc<dyn UrlStore>) -> Self {
        Self { registry, store }
    }

    /// Entity updated. Active rows go stale (OK→REDIRECT) when the change
    /// set touches a watched attribute. Returns the number of rows staled;
    /// an empty change set or an unregistered entity type is a no-op.
    pub fn on_entity_updated(&self, entity: &EntityRef, change_set: &ChangeSet) -> Result<usize> {
        if change_set.is_empty() {
            return Ok(0);
        }
        self.transition(entity, Some(change_set), UrlStatus::Redirect)
    }

    /// Entity removed. Active rows become logical tombstones (OK→INVALID).
    pub fn on_entity_removed(&self, entity: &EntityRef) -> Result<usize> {
        self.transition(entity, None, UrlStatus::Invalid)
    }

    fn transition(
        &self,
        entity: &EntityRef,
        change_set: Option<&ChangeSet>,
        to: UrlStatus,
    ) -> Result<usize> {
        let registrations = self.registry.resolve(&entity.entity_type);
        if registrations.is_empty() {
            tracing::debug!(entity_type = %entity.entity_type, "no invalidator registered");
            return Ok(0);
        }

        let mut touched = 0;
        for registration in registrations {
            if let Some(change_set) = change_set
                && !registration.invalidator.should_invalidate(change_set)
            {
                continue;
            }
            touched += self.store.transition_status(
                &registration.routes,
                entity.locale.as_deref(),
                &registration.invalidator.scope(entity),
                to,
            )?;
        }
        if touched > 0 {
            tracing::info!(
                entity_type = %entity.entity_type,
                entity_id = entity.id,
                status = to.name(),
                rows = touched,
                "friendly urls invalidated"
            );
        }
        Ok(touched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::UrlRecord;
    use crate::store::SqliteStore;
    use chrono::Utc;
    use serde_json::json;

    struct TitleInvalidator;

    impl SeoInvalidator for TitleInvalidator {
        fn watched_attributes(&self) -> &[&str] {
            &["title", "slug"]
        }
    }

    struct GlobalInvalidator;

    impl SeoInvalidator for GlobalInvalidator {
        fn watched_attributes(&self) -> &[&str] {
            &["layout"]
        }

        fn scope(&self, _entity: &EntityRef) -> ScopeFilter {
            ScopeFilter::none()
        }
    }

    fn record(entity_id: u32, locale: &str, seo_url: &str) -> UrlRecord {
        UrlRecord {
            seo_path_hash: crate::utils::hash::hash_str(seo_url),
            std_path_hash: crate::utils::hash::hash_str(&format!("{locale}{entity_id}")),
            locale: locale.into(),
            route_name: "product".into(),
            entity_id,
            seo_url: seo_url.into(),
            std_url: format!("/product/view?id={entity_id}"),
            status: UrlStatus::Ok,
            timestamp: Utc::now(),
        }
    }

    fn manager_with_rows(rows: &[UrlRecord]) -> (InvalidationManager, Arc<dyn UrlStore>) {
        let store: Arc<dyn UrlStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        for row in rows {
            store.upsert(row).unwrap();
        }
        let mut registry = InvalidatorRegistry::new();
        registry
            .register("product", &["product"], Arc::new(TitleInvalidator))
            .unwrap();
        (
            InvalidationManager::new(registry, Arc::clone(&store)),
            store,
        )
    }

    fn status_of(store: &Arc<dyn UrlStore>, seo_url: &str, locale: &str) -> UrlStatus {
        store
            .find_by_seo_hash(crate::utils::hash::hash_str(seo_url), locale)
            .unwrap()
            .unwrap()
            .status
    }

    #[test]
    fn test_watched_attribute_change_stales_rows() {
        let (manager, store) = manager_with_rows(&[record(1, "lt_LT", "/lt/prod/widget")]);

        let change: ChangeSet = [("title".to_string(), json!("Widget Pro"))].into();
        let touched = manager
            .on_entity_updated(&EntityRef::new("product", 1), &change)
            .unwrap();
        assert_eq!(touched, 1);
        assert_eq!(
            status_of(&store, "/lt/prod/widget", "lt_LT"),
            UrlStatus::Redirect
        );
    }

    #[test]
    fn test_unwatched_attribute_change_is_ignored() {
        let (manager, store) = manager_with_rows(&[record(1, "lt_LT", "/lt/prod/widget")]);

        let change: ChangeSet = [("price".to_string(), json!(1299))].into();
        let touched = manager
            .on_entity_updated(&EntityRef::new("product", 1), &change)
            .unwrap();
        assert_eq!(touched, 0);
        assert_eq!(status_of(&store, "/lt/prod/widget", "lt_LT"), UrlStatus::Ok);
    }

    #[test]
    fn test_empty_change_set_is_a_noop() {
        let (manager, _store) = manager_with_rows(&[record(1, "lt_LT", "/lt/prod/widget")]);
        let touched = manager
            .on_entity_updated(&EntityRef::new("product", 1), &ChangeSet::new())
            .unwrap();
        assert_eq!(touched, 0);
    }

    #[test]
    fn test_unregistered_entity_type_is_swallowed() {
        let (manager, _store) = manager_with_rows(&[record(1, "lt_LT", "/lt/prod/widget")]);
        let change: ChangeSet = [("title".to_string(), json!("x"))].into();
        assert_eq!(
            manager
                .on_entity_updated(&EntityRef::new("news", 1), &change)
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_removal_tombstones_all_locales() {
        let (manager, store) = manager_with_rows(&[
            record(1, "lt_LT", "/lt/prod/widget"),
            record(1, "en_US", "/en/prod/widget"),
        ]);

        let touched = manager
            .on_entity_removed(&EntityRef::new("product", 1))
            .unwrap();
        assert_eq!(touched, 2);
        assert_eq!(
            status_of(&store, "/lt/prod/widget", "lt_LT"),
            UrlStatus::Invalid
        );
        assert_eq!(
            status_of(&store, "/en/prod/widget", "en_US"),
            UrlStatus::Invalid
        );
    }

    #[test]
    fn test_locale_scoped_update() {
        let (manager, store) = manager_with_rows(&[
            record(1, "lt_LT", "/lt/prod/widget"),
            record(1, "en_US", "/en/prod/widget"),
        ]);

        let change: ChangeSet = [("title".to_string(), json!("Naujas"))].into();
        let touched = manager
            .on_entity_updated(
                &EntityRef::new("product", 1).with_locale("lt_LT"),
                &change,
            )
            .unwrap();
        assert_eq!(touched, 1);
        assert_eq!(
            status_of(&store, "/lt/prod/widget", "lt_LT"),
            UrlStatus::Redirect
        );
        assert_eq!(status_of(&store, "/en/prod/widget", "en_US"), UrlStatus::Ok);
    }

    #[test]
    fn test_other_entities_untouched() {
        let (manager, store) = manager_with_rows(&[
            record(1, "lt_LT", "/lt/prod/widget"),
            record(2, "lt_LT", "/lt/prod/gadget"),
        ]);

        let change: ChangeSet = [("title".to_string(), json!("x"))].into();
        manager
            .on_entity_updated(&EntityRef::new("product", 1), &change)
            .unwrap();
        assert_eq!(status_of(&store, "/lt/prod/gadget", "lt_LT"), UrlStatus::Ok);
    }

    #[test]
    fn test_custom_scope_covers_all_rows() {
        let store: Arc<dyn UrlStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        store.upsert(&record(1, "lt_LT", "/lt/prod/widget")).unwrap();
        store.upsert(&record(2, "lt_LT", "/lt/prod/gadget")).unwrap();

        let mut registry = InvalidatorRegistry::new();
        registry
            .register("settings", &["product"], Arc::new(GlobalInvalidator))
            .unwrap();
        let manager = InvalidationManager::new(registry, Arc::clone(&store));

        let change: ChangeSet = [("layout".to_string(), json!("wide"))].into();
        let touched = manager
            .on_entity_updated(&EntityRef::new("settings", 7), &change)
            .unwrap();
        assert_eq!(touched, 2);
    }

    #[test]
    fn test_duplicate_route_registration_rejected() {
        let mut registry = InvalidatorRegistry::new();
        registry
            .register("product", &["product"], Arc::new(TitleInvalidator))
            .unwrap();
        assert!(matches!(
            registry.register("product", &["product"], Arc::new(TitleInvalidator)),
            Err(SeoError::AlreadyRegistered { .. })
        ));
        // Same route under another entity type is fine.
        registry
            .register("variant", &["product"], Arc::new(TitleInvalidator))
            .unwrap();
    }
}
