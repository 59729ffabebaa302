use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::api::{EntityKind, LogisticsApi};

/// Process-wide name-to-identifier cache, one map per entity kind. Keys are
/// lowercased. Shared across concurrent orchestrations; writes are
/// idempotent (the same name always maps to the same identifier), so a
/// plain mutex per kind is enough.
#[derive(Debug, Default)]
pub struct EntityCache {
    cities: Mutex<HashMap<String, String>>,
    materials: Mutex<HashMap<String, String>>,
    companies: Mutex<HashMap<String, String>>,
    listed: Mutex<HashSet<EntityKind>>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, kind: EntityKind) -> MutexGuard<'_, HashMap<String, String>> {
        let mutex = match kind {
            EntityKind::City => &self.cities,
            EntityKind::Material => &self.materials,
            EntityKind::Company => &self.companies,
        };
        mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, kind: EntityKind, name: &str) -> Option<String> {
        self.map(kind).get(&normalize_key(name)).cloned()
    }

    pub fn insert(&self, kind: EntityKind, name: &str, id: &str) {
        let key = normalize_key(name);
        if key.is_empty() {
            return;
        }
        self.map(kind).insert(key, id.to_string());
    }

    pub fn snapshot(&self, kind: EntityKind) -> HashMap<String, String> {
        self.map(kind).clone()
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        self.map(kind).len()
    }

    pub fn is_empty(&self, kind: EntityKind) -> bool {
        self.map(kind).is_empty()
    }

    fn is_listed(&self, kind: EntityKind) -> bool {
        self.listed.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).contains(&kind)
    }

    fn mark_listed(&self, kind: EntityKind) {
        self.listed.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).insert(kind);
    }
}

fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Maps entity names to backend identifiers: cache, then an exact-match
/// remote query, then the cached full listing. Materials additionally fall
/// back to a configured default identifier and therefore never fail.
pub struct EntityResolver<A> {
    api: Arc<A>,
    cache: Arc<EntityCache>,
    default_material_id: String,
}

impl<A> Clone for EntityResolver<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            cache: Arc::clone(&self.cache),
            default_material_id: self.default_material_id.clone(),
        }
    }
}

impl<A: LogisticsApi> EntityResolver<A> {
    pub fn new(
        api: Arc<A>,
        cache: Arc<EntityCache>,
        default_material_id: impl Into<String>,
    ) -> Self {
        Self { api, cache, default_material_id: default_material_id.into() }
    }

    pub fn cache(&self) -> &Arc<EntityCache> {
        &self.cache
    }

    pub async fn resolve_city(&self, name: &str) -> Option<String> {
        self.resolve(EntityKind::City, name).await
    }

    pub async fn resolve_company(&self, name: &str) -> Option<String> {
        self.resolve(EntityKind::Company, name).await
    }

    /// Never fails: an unresolvable material degrades to the configured
    /// default identifier with a warning.
    pub async fn resolve_material(&self, name: &str) -> String {
        match self.resolve(EntityKind::Material, name).await {
            Some(id) => id,
            None => {
                warn!(
                    event_name = "resolver.material_defaulted",
                    material = name,
                    default_id = %self.default_material_id,
                    "material not found, using the configured default"
                );
                self.default_material_id.clone()
            }
        }
    }

    pub async fn resolve(&self, kind: EntityKind, name: &str) -> Option<String> {
        if let Some(id) = self.cache.get(kind, name) {
            debug!(event_name = "resolver.cache_hit", kind = kind.as_str(), name);
            return Some(id);
        }

        match self.api.query_entities(kind, name).await {
            Ok(records) => {
                let wanted = name.trim();
                if let Some(record) =
                    records.iter().find(|record| record.name.eq_ignore_ascii_case(wanted))
                {
                    // Cache under both the catalog spelling and the query
                    // term so later spelling variants still hit.
                    self.cache.insert(kind, &record.name, &record.id);
                    self.cache.insert(kind, name, &record.id);
                    return Some(record.id.clone());
                }
                self.lookup_in_listing(kind, name).await
            }
            Err(error) => {
                warn!(
                    event_name = "resolver.query_failed",
                    kind = kind.as_str(),
                    name,
                    error = %error,
                    "exact-match query failed, falling back to the full listing"
                );
                self.lookup_in_listing(kind, name).await
            }
        }
    }

    /// Returns the full cached listing for a kind, fetching it remotely the
    /// first time. Serves the catalog read endpoints.
    pub async fn bulk_listing(&self, kind: EntityKind) -> HashMap<String, String> {
        self.ensure_listing(kind).await;
        self.cache.snapshot(kind)
    }

    async fn lookup_in_listing(&self, kind: EntityKind, name: &str) -> Option<String> {
        self.ensure_listing(kind).await;
        self.cache.get(kind, name)
    }

    async fn ensure_listing(&self, kind: EntityKind) {
        if self.cache.is_listed(kind) {
            return;
        }

        match self.api.list_entities(kind).await {
            Ok(records) => {
                for record in &records {
                    self.cache.insert(kind, &record.name, &record.id);
                }
                self.cache.mark_listed(kind);
                debug!(
                    event_name = "resolver.listing_cached",
                    kind = kind.as_str(),
                    count = records.len()
                );
            }
            Err(error) => {
                warn!(
                    event_name = "resolver.listing_failed",
                    kind = kind.as_str(),
                    error = %error,
                    "full listing fetch failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::api::{ApiError, EntityKind, EntityRecord, LogisticsApi};
    use crate::payloads::{ParcelDraft, ParcelReceipt, RouteIds, TripDraft};

    use super::{EntityCache, EntityResolver};

    /// Counts remote calls and serves a fixed catalog.
    #[derive(Default)]
    struct FakeApi {
        queries: AtomicUsize,
        listings: AtomicUsize,
        catalog: Vec<(EntityKind, &'static str, &'static str)>,
        fail_queries: bool,
    }

    impl FakeApi {
        fn with_catalog(catalog: Vec<(EntityKind, &'static str, &'static str)>) -> Self {
            Self { catalog, ..Self::default() }
        }

        fn remote_calls(&self) -> usize {
            self.queries.load(Ordering::SeqCst) + self.listings.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LogisticsApi for FakeApi {
        async fn query_entities(
            &self,
            kind: EntityKind,
            name: &str,
        ) -> Result<Vec<EntityRecord>, ApiError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if self.fail_queries {
                return Err(ApiError::Status { status: 500, body: "boom".to_string() });
            }
            Ok(self
                .catalog
                .iter()
                .filter(|(entry_kind, entry_name, _)| {
                    *entry_kind == kind && entry_name.eq_ignore_ascii_case(name.trim())
                })
                .map(|(_, entry_name, id)| EntityRecord {
                    id: (*id).to_string(),
                    name: (*entry_name).to_string(),
                })
                .collect())
        }

        async fn list_entities(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, ApiError> {
            self.listings.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .catalog
                .iter()
                .filter(|(entry_kind, _, _)| *entry_kind == kind)
                .map(|(_, entry_name, id)| EntityRecord {
                    id: (*id).to_string(),
                    name: (*entry_name).to_string(),
                })
                .collect())
        }

        async fn create_trip(&self, _draft: &TripDraft) -> Result<String, ApiError> {
            Err(ApiError::MissingIdentifier)
        }

        async fn find_trip(&self, _route: &RouteIds) -> Result<Option<String>, ApiError> {
            Ok(None)
        }

        async fn submit_parcel(&self, _draft: &ParcelDraft) -> Result<ParcelReceipt, ApiError> {
            Err(ApiError::MissingIdentifier)
        }
    }

    fn resolver(api: FakeApi) -> EntityResolver<FakeApi> {
        EntityResolver::new(Arc::new(api), Arc::new(EntityCache::new()), "material-default")
    }

    #[tokio::test]
    async fn second_resolution_with_different_case_hits_the_cache() {
        let resolver = resolver(FakeApi::with_catalog(vec![(
            EntityKind::City,
            "Jaipur",
            "city-jaipur",
        )]));

        let first = resolver.resolve_city("Jaipur").await;
        assert_eq!(first.as_deref(), Some("city-jaipur"));
        let calls_after_first = resolver.api.remote_calls();
        assert_eq!(calls_after_first, 1);

        let second = resolver.resolve_city("jaipur").await;
        assert_eq!(second.as_deref(), Some("city-jaipur"));
        assert_eq!(resolver.api.remote_calls(), calls_after_first, "cache hit issues no calls");
    }

    #[tokio::test]
    async fn query_miss_falls_back_to_listing_fetched_once() {
        // Exact-match queries fail outright here, so the listing answers.
        let resolver = resolver(FakeApi {
            fail_queries: true,
            ..FakeApi::with_catalog(vec![(EntityKind::City, "Navi Mumbai", "city-nm")])
        });

        let id = resolver.resolve_city("navi mumbai").await;
        assert_eq!(id.as_deref(), Some("city-nm"));
        assert_eq!(resolver.api.listings.load(std::sync::atomic::Ordering::SeqCst), 1);

        // A different unknown city reuses the cached listing.
        let missing = resolver.resolve_city("atlantis").await;
        assert_eq!(missing, None);
        assert_eq!(resolver.api.listings.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn material_resolution_defaults_instead_of_failing() {
        let resolver = resolver(FakeApi::with_catalog(vec![(
            EntityKind::Material,
            "Electronics",
            "mat-elec",
        )]));

        assert_eq!(resolver.resolve_material("electronics").await, "mat-elec");
        assert_eq!(resolver.resolve_material("unobtainium").await, "material-default");
    }

    #[tokio::test]
    async fn caches_are_isolated_per_kind() {
        let resolver = resolver(FakeApi::with_catalog(vec![
            (EntityKind::City, "Jaipur", "city-jaipur"),
            (EntityKind::Company, "Jaipur", "company-jaipur"),
        ]));

        assert_eq!(resolver.resolve_city("jaipur").await.as_deref(), Some("city-jaipur"));
        assert_eq!(
            resolver.resolve_company("jaipur").await.as_deref(),
            Some("company-jaipur")
        );
    }

    #[tokio::test]
    async fn bulk_listing_serves_snapshot_and_caches() {
        let resolver = resolver(FakeApi::with_catalog(vec![
            (EntityKind::Material, "Electronics", "mat-1"),
            (EntityKind::Material, "Chemicals", "mat-2"),
        ]));

        let listing = resolver.bulk_listing(EntityKind::Material).await;
        assert_eq!(listing.len(), 2);
        assert_eq!(listing.get("electronics").map(String::as_str), Some("mat-1"));

        // Subsequent resolutions come straight from the cache.
        assert_eq!(resolver.resolve_material("chemicals").await, "mat-2");
        assert_eq!(resolver.api.queries.load(std::sync::atomic::Ordering::SeqCst), 0);
    }
}
