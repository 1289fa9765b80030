//! In-memory FactStore implementation

use async_trait::async_trait;

use residua_core::store::{CropFacts, FactStore, RegionFacts, SoilFacts, StoreError};

use crate::loader::FactTables;

const CROP_MATCH_LIMIT: usize = 5;

/// Immutable in-memory fact store.
///
/// Constructed once at process start from the loaded tables and shared
/// read-only; lookups never mutate, so concurrent requests need no
/// coordination.
pub struct InMemoryFactStore {
    crops: Vec<CropFacts>,
    soils: Vec<SoilFacts>,
    regions: Vec<RegionFacts>,
}

impl InMemoryFactStore {
    pub fn new(tables: FactTables) -> Self {
        Self {
            crops: tables.crops,
            soils: tables.soils,
            regions: tables.regions,
        }
    }

    /// Distinct crop names in load order, for dropdown population.
    pub fn crop_names(&self) -> Vec<String> {
        distinct(self.crops.iter().map(|c| c.crop.as_str()))
    }

    /// Distinct soil types in load order.
    pub fn soil_names(&self) -> Vec<String> {
        distinct(self.soils.iter().map(|s| s.soil_type.as_str()))
    }

    /// Distinct region names in load order.
    pub fn region_names(&self) -> Vec<String> {
        distinct(self.regions.iter().map(|r| r.region.as_str()))
    }
}

fn distinct<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

/// Exact case-sensitive matches win; otherwise fall back to
/// case-insensitive substring matching in either direction. At most
/// `limit` records are returned.
fn select_matches<'a, T>(
    items: &'a [T],
    query: &str,
    key: fn(&T) -> &str,
    limit: usize,
) -> Vec<&'a T> {
    let exact: Vec<&T> = items.iter().filter(|item| key(item) == query).collect();
    let picked = if exact.is_empty() {
        let query_lower = query.to_lowercase();
        items
            .iter()
            .filter(|item| {
                let stored = key(item).to_lowercase();
                stored.contains(&query_lower) || query_lower.contains(&stored)
            })
            .collect()
    } else {
        exact
    };
    picked.into_iter().take(limit).collect()
}

fn crop_key(facts: &CropFacts) -> &str {
    &facts.crop
}

fn soil_key(facts: &SoilFacts) -> &str {
    &facts.soil_type
}

fn region_key(facts: &RegionFacts) -> &str {
    &facts.region
}

#[async_trait]
impl FactStore for InMemoryFactStore {
    async fn crop_facts(&self, crop: &str) -> Result<Vec<CropFacts>, StoreError> {
        Ok(select_matches(&self.crops, crop, crop_key, CROP_MATCH_LIMIT)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn soil_facts(&self, soil: &str) -> Result<Option<SoilFacts>, StoreError> {
        Ok(select_matches(&self.soils, soil, soil_key, 1)
            .first()
            .map(|s| (*s).clone()))
    }

    async fn region_facts(&self, region: &str) -> Result<Option<RegionFacts>, StoreError> {
        Ok(select_matches(&self.regions, region, region_key, 1)
            .first()
            .map(|r| (*r).clone()))
    }
}
