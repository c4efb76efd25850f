//! In-process lookup cache for the two effectively-static dimension tables.
//!
//! Job filtering and bulk ingestion resolve `(region, district)` pairs and tag
//! names to row ids on every item; both maps are loaded once at startup
//! instead of querying per lookup. The cache is owned by the service state
//! with two defined mutation points: `reload` (full refresh from the
//! database) and `insert_tag` (called after a new tag row is committed, so
//! later filters resolve it without a reload).

use std::collections::HashMap;

use anyhow::Result;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Default)]
pub struct LookupCache {
    locations: RwLock<HashMap<(String, String), i64>>,
    tags: RwLock<HashMap<String, i64>>,
}

impl LookupCache {
    /// Loads both maps from the database.
    pub async fn load(pool: &PgPool) -> Result<Self> {
        let cache = Self::default();
        cache.reload(pool).await?;
        Ok(cache)
    }

    /// Replaces both maps wholesale with the current table contents.
    pub async fn reload(&self, pool: &PgPool) -> Result<()> {
        let location_rows: Vec<(i64, String, String)> =
            sqlx::query_as("SELECT id, region, district FROM locations")
                .fetch_all(pool)
                .await?;
        let tag_rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, name FROM tags")
            .fetch_all(pool)
            .await?;

        let locations: HashMap<(String, String), i64> = location_rows
            .into_iter()
            .map(|(id, region, district)| ((region, district), id))
            .collect();
        let tags: HashMap<String, i64> = tag_rows
            .into_iter()
            .map(|(id, name)| (name, id))
            .collect();

        info!(
            locations = locations.len(),
            tags = tags.len(),
            "Lookup cache loaded"
        );

        *self.locations.write().await = locations;
        *self.tags.write().await = tags;
        Ok(())
    }

    /// Exact `(region, district)` lookup.
    pub async fn location_id(&self, region: &str, district: &str) -> Option<i64> {
        self.locations
            .read()
            .await
            .get(&(region.to_string(), district.to_string()))
            .copied()
    }

    /// Resolves user-supplied location filters to ids.
    ///
    /// Each input is either `"region"` (matches every district of that
    /// region) or `"region district"` (exact match). Unresolvable inputs
    /// contribute nothing; the result is sorted and deduplicated.
    pub async fn resolve_locations(&self, inputs: &[String]) -> Vec<i64> {
        let locations = self.locations.read().await;
        let mut ids = Vec::new();
        for input in inputs {
            match input.trim().split_once(' ') {
                Some((region, district)) => {
                    if let Some(id) = locations.get(&(region.to_string(), district.to_string())) {
                        ids.push(*id);
                    }
                }
                None => {
                    let region = input.trim();
                    ids.extend(
                        locations
                            .iter()
                            .filter(|((r, _), _)| r == region)
                            .map(|(_, id)| *id),
                    );
                }
            }
        }
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    pub async fn tag_id(&self, name: &str) -> Option<i64> {
        self.tags.read().await.get(name).copied()
    }

    /// Resolves tag-name filters to ids, dropping unknown names.
    pub async fn resolve_tags(&self, inputs: &[String]) -> Vec<i64> {
        let tags = self.tags.read().await;
        let mut ids: Vec<i64> = inputs
            .iter()
            .filter_map(|name| tags.get(name.trim()).copied())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Records a freshly inserted tag row. Call after the insert committed.
    pub async fn insert_tag(&self, name: &str, id: i64) {
        self.tags.write().await.insert(name.to_string(), id);
    }

    #[cfg(test)]
    fn with_entries(locations: &[(&str, &str, i64)], tags: &[(&str, i64)]) -> Self {
        let cache = Self::default();
        {
            let mut map = cache.locations.try_write().unwrap();
            for (region, district, id) in locations {
                map.insert(((*region).to_string(), (*district).to_string()), *id);
            }
        }
        {
            let mut map = cache.tags.try_write().unwrap();
            for (name, id) in tags {
                map.insert((*name).to_string(), *id);
            }
        }
        cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LookupCache {
        LookupCache::with_entries(
            &[
                ("서울", "전체", 1),
                ("서울", "강남구", 2),
                ("서울", "마포구", 3),
                ("경기", "전체", 4),
            ],
            &[("백엔드", 10), ("데이터엔지니어", 11)],
        )
    }

    #[tokio::test]
    async fn test_region_only_matches_all_districts() {
        let ids = sample().resolve_locations(&["서울".to_string()]).await;
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_region_district_exact_match() {
        let ids = sample()
            .resolve_locations(&["서울 강남구".to_string()])
            .await;
        assert_eq!(ids, vec![2]);
    }

    #[tokio::test]
    async fn test_unresolvable_location_yields_empty() {
        let ids = sample().resolve_locations(&["부산".to_string()]).await;
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_mixed_inputs_dedup() {
        let ids = sample()
            .resolve_locations(&["서울".to_string(), "서울 강남구".to_string()])
            .await;
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_resolve_tags_drops_unknown() {
        let ids = sample()
            .resolve_tags(&["백엔드".to_string(), "없는태그".to_string()])
            .await;
        assert_eq!(ids, vec![10]);
    }

    #[tokio::test]
    async fn test_insert_tag_visible_to_later_lookups() {
        let cache = sample();
        cache.insert_tag("프론트엔드", 12).await;
        assert_eq!(cache.tag_id("프론트엔드").await, Some(12));
        assert_eq!(cache.resolve_tags(&["프론트엔드".to_string()]).await, vec![12]);
    }
}
