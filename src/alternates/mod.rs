//! Cross-locale alternate link collection.
//!
//! For one canonical identity, gathers the friendly URLs of every locale it
//! resolves in: the record's own locale, persisted sibling rows, and
//! configured locales with no row yet, generated on demand. The default
//! locale's entry is aliased under `x-default`.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::SeoConfig;
use crate::error::Result;
use crate::record::{AlternateSet, UrlRecord, X_DEFAULT};
use crate::slug::format_alternate_tag;
use crate::store::UrlStore;

pub struct AlternatesManager {
    config: Arc<SeoConfig>,
    store: Arc<dyn UrlStore>,
}

impl AlternatesManager {
    pub fn new(config: Arc<SeoConfig>, store: Arc<dyn UrlStore>) -> Self {
        Self { config, store }
    }

    /// Alternate tag for a locale, with configured remapping applied first.
    pub fn tag(&self, locale: &str) -> String {
        let mapped = self
            .config
            .alternate_locale_mapping
            .get(locale)
            .map(String::as_str)
            .unwrap_or(locale);
        format_alternate_tag(mapped)
    }

    /// Collect alternates for `record`. `generate` produces an absolute
    /// friendly URL for a locale the store has no active row for; it returns
    /// `Ok(None)` when that locale cannot be generated, which skips the
    /// entry instead of erroring.
    pub fn collect<F>(
        &self,
        record: &UrlRecord,
        base_url: &str,
        generate: F,
    ) -> Result<AlternateSet>
    where
        F: Fn(&str) -> Result<Option<String>>,
    {
        let mut set = AlternateSet::new();
        let mut covered: BTreeSet<String> = BTreeSet::new();

        set.insert(self.tag(&record.locale), format!("{base_url}{}", record.seo_url));
        covered.insert(record.locale.clone());

        for (locale, seo_url) in
            self.store
                .find_alternates(&record.route_name, record.entity_id, &record.locale)?
        {
            set.insert(self.tag(&locale), format!("{base_url}{seo_url}"));
            covered.insert(locale);
        }

        for locale in &self.config.locales {
            if covered.contains(locale) {
                continue;
            }
            if let Some(url) = generate(locale)?
                && !url.is_empty()
                && url != "#"
            {
                set.insert(self.tag(locale), url);
            }
        }

        if let Some(default_url) = set.get(&self.tag(&self.config.default_locale)) {
            let default_url = default_url.to_string();
            set.insert(X_DEFAULT, default_url);
        }

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::UrlStatus;
    use crate::store::SqliteStore;
    use chrono::Utc;

    fn record(locale: &str, seo_url: &str, status: UrlStatus) -> UrlRecord {
        UrlRecord {
            seo_path_hash: crate::utils::hash::hash_str(seo_url),
            std_path_hash: crate::utils::hash::hash_str(&format!("{locale}{seo_url}")),
            locale: locale.into(),
            route_name: "product".into(),
            entity_id: 1,
            seo_url: seo_url.into(),
            std_url: "/product/view?id=1".into(),
            status,
            timestamp: Utc::now(),
        }
    }

    fn setup() -> (AlternatesManager, Arc<dyn UrlStore>) {
        let config = Arc::new(SeoConfig {
            default_locale: "lt_LT".into(),
            locales: vec!["lt_LT".into(), "en_US".into(), "ru_RU".into()],
            ..SeoConfig::default()
        });
        let store: Arc<dyn UrlStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        (AlternatesManager::new(config, Arc::clone(&store)), store)
    }

    #[test]
    fn test_collect_from_store_with_x_default() {
        let (manager, store) = setup();
        let current = record("lt_LT", "/lt/prod/widget", UrlStatus::Ok);
        store.upsert(&current).unwrap();
        store
            .upsert(&record("en_US", "/en/prod/widget", UrlStatus::Ok))
            .unwrap();

        let set = manager
            .collect(&current, "https://shop.example", |_| Ok(None))
            .unwrap();

        assert_eq!(set.get("lt-lt"), Some("https://shop.example/lt/prod/widget"));
        assert_eq!(set.get("en-us"), Some("https://shop.example/en/prod/widget"));
        assert_eq!(set.get(X_DEFAULT), Some("https://shop.example/lt/prod/widget"));
        // ru_RU has no row and the generator declined; 3 entries total.
        assert_eq!(set.len(), 3);
        assert!(!set.contains("ru-ru"));
    }

    #[test]
    fn test_collect_generates_missing_locales() {
        let (manager, store) = setup();
        let current = record("lt_LT", "/lt/prod/widget", UrlStatus::Ok);
        store.upsert(&current).unwrap();

        let set = manager
            .collect(&current, "https://shop.example", |locale| {
                Ok(Some(format!(
                    "https://shop.example/{}/prod/widget",
                    crate::slug::lang_from_locale(locale)
                )))
            })
            .unwrap();

        assert_eq!(set.get("en-us"), Some("https://shop.example/en/prod/widget"));
        assert_eq!(set.get("ru-ru"), Some("https://shop.example/ru/prod/widget"));
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_collect_skips_stale_siblings_and_placeholders() {
        let (manager, store) = setup();
        let current = record("lt_LT", "/lt/prod/widget", UrlStatus::Ok);
        store.upsert(&current).unwrap();
        store
            .upsert(&record("en_US", "/en/prod/old-widget", UrlStatus::Redirect))
            .unwrap();

        let set = manager
            .collect(&current, "https://shop.example", |_| Ok(Some("#".into())))
            .unwrap();

        // The stale English row is not an alternate, and `#` placeholders
        // from the generator are dropped.
        assert!(!set.contains("en-us"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_locale_remapping() {
        let config = Arc::new(SeoConfig {
            default_locale: "lt_LT".into(),
            alternate_locale_mapping: [("en_GL".to_string(), "en_US".to_string())].into(),
            ..SeoConfig::default()
        });
        let store: Arc<dyn UrlStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let manager = AlternatesManager::new(config, store);
        assert_eq!(manager.tag("en_GL"), "en-us");
        assert_eq!(manager.tag("lt_LT"), "lt-lt");
    }
}
