// Canonical pools per entity.
//
// A pool is a tag-defined subset of an entity's records (e.g. KSA, UAE, Nightshift).
// Entities without configured pools are valid; their records are then grouped only
// by whatever non-blank tags they carry.

use crate::modules::utilization::core::records::tag_key;
use std::collections::BTreeMap;
use thiserror::Error;

/// Display name of the pool total ("every canonical pool, untagged excluded").
pub const ALL_POOLS: &str = "All Pools";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolCatalogError {
    #[error("malformed pool definition: {0:?} (expected Entity=PoolA|PoolB)")]
    Malformed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolCatalog {
    by_entity: BTreeMap<String, Vec<String>>,
}

impl PoolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        Self::new().with_pools("Creative", ["KSA", "UAE", "Nightshift"])
    }

    pub fn with_pools<S: Into<String>>(
        mut self,
        entity: &str,
        pools: impl IntoIterator<Item = S>,
    ) -> Self {
        let mut kept: Vec<String> = Vec::new();
        for pool in pools {
            let pool = pool.into().trim().to_string();
            if pool.is_empty() || kept.iter().any(|p| tag_key(p) == tag_key(&pool)) {
                continue;
            }
            kept.push(pool);
        }
        self.by_entity.insert(tag_key(entity), kept);
        self
    }

    /// Parses `Entity=PoolA|PoolB;Other=PoolC`. An entity may list no pools.
    pub fn parse(raw: &str) -> Result<Self, PoolCatalogError> {
        let mut catalog = Self::new();
        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (entity, pools) = segment
                .split_once('=')
                .ok_or_else(|| PoolCatalogError::Malformed(segment.to_string()))?;
            if entity.trim().is_empty() {
                return Err(PoolCatalogError::Malformed(segment.to_string()));
            }
            catalog = catalog.with_pools(entity, pools.split('|'));
        }
        Ok(catalog)
    }

    pub fn pools_for(&self, entity: &str) -> &[String] {
        self.by_entity
            .get(&tag_key(entity))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every canonical pool across entities, first spelling wins.
    pub fn all_pools(&self) -> Vec<String> {
        let mut all: Vec<String> = Vec::new();
        for pool in self.by_entity.values().flatten() {
            if !all.iter().any(|p| tag_key(p) == tag_key(pool)) {
                all.push(pool.clone());
            }
        }
        all
    }
}
