// Company-wide figures across entity snapshots.
//
// Rules
// - Hours are summed across entities, ratios recomputed from the sums.
// - Sold hours are a per-period figure shared by every entity of that period, so they
//   are counted once per period key.
// - Contribution share = pool logged / sum of logged over the listed pools * 100. It is
//   independent of utilization and all shares are 0 when nothing was logged.

use crate::modules::utilization::core::metrics::{
    DerivedMetricSet, MetricTotals, external_for_pools,
};
use crate::modules::utilization::core::pool_filter::{DatasetKind, PoolSelection, single_select};
use crate::modules::utilization::core::pools::ALL_POOLS;
use crate::modules::utilization::core::ports::ExternalHours;
use crate::modules::utilization::core::records::tag_key;
use crate::modules::utilization::core::snapshot::Snapshot;
use crate::shared::core::primitives::PeriodKey;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolContribution {
    pub pool: String,
    pub logged_hours: f64,
    pub share: f64,
}

/// Canonical pools of every snapshot, first spelling wins.
pub fn canonical_pools(snapshots: &[Arc<Snapshot>]) -> Vec<String> {
    let mut pools: Vec<String> = Vec::new();
    for pool in snapshots.iter().flat_map(|s| s.pools.iter()) {
        if !pools.iter().any(|p| tag_key(p) == tag_key(pool)) {
            pools.push(pool.clone());
        }
    }
    pools
}

pub fn company_rollup(snapshots: &[Arc<Snapshot>], pools: &[String]) -> DerivedMetricSet {
    let selection = PoolSelection::from_pools(DatasetKind::Resources, pools);
    let totals = snapshots
        .iter()
        .fold(MetricTotals::default(), |acc, snapshot| {
            acc.merge(&snapshot.totals_for(&selection))
        });

    let canonical = canonical_pools(snapshots);
    let external = external_per_period(snapshots)
        .into_iter()
        .filter_map(|hours| company_external(hours, &selection, &canonical))
        .fold(None, |acc: Option<f64>, hours| {
            Some(acc.unwrap_or(0.0) + hours)
        });

    totals.with_external(external).finish()
}

pub fn pool_contributions(snapshots: &[Arc<Snapshot>], pools: &[String]) -> Vec<PoolContribution> {
    let listed: Vec<String> = if pools.is_empty() {
        canonical_pools(snapshots)
    } else {
        let mut listed: Vec<String> = Vec::new();
        for pool in pools.iter().map(|p| p.trim()) {
            if pool.is_empty()
                || tag_key(pool) == tag_key(ALL_POOLS)
                || listed.iter().any(|p| tag_key(p) == tag_key(pool))
            {
                continue;
            }
            listed.push(pool.to_string());
        }
        listed
    };

    let logged: Vec<(String, f64)> = listed
        .into_iter()
        .map(|pool| {
            let hours = snapshots
                .iter()
                .flat_map(|s| single_select(&s.timesheets, Some(pool.as_str())))
                .map(|t| t.total_hours)
                .sum();
            (pool, hours)
        })
        .collect();
    let total: f64 = logged.iter().map(|(_, hours)| hours).sum();

    logged
        .into_iter()
        .map(|(pool, logged_hours)| PoolContribution {
            share: if total > 0.0 {
                logged_hours / total * 100.0
            } else {
                0.0
            },
            pool,
            logged_hours,
        })
        .collect()
}

// One sold-hours map per period: the first snapshot of the period that has one.
fn external_per_period(snapshots: &[Arc<Snapshot>]) -> Vec<&ExternalHours> {
    let mut order: Vec<&PeriodKey> = Vec::new();
    let mut by_period: HashMap<&PeriodKey, Option<&ExternalHours>> = HashMap::new();
    for snapshot in snapshots {
        let slot = by_period.entry(&snapshot.period_key).or_insert_with(|| {
            order.push(&snapshot.period_key);
            None
        });
        if slot.is_none() {
            *slot = snapshot.external_hours.as_ref();
        }
    }
    order
        .into_iter()
        .filter_map(|period| by_period.get(period).copied().flatten())
        .collect()
}

fn company_external(
    external: &ExternalHours,
    selection: &PoolSelection,
    canonical: &[String],
) -> Option<f64> {
    match selection {
        PoolSelection::All if external.is_empty() => None,
        PoolSelection::All => Some(external.values().map(|h| h.max(0.0)).sum()),
        PoolSelection::Single(pool) => external_for_pools(external, [pool.as_str()]),
        PoolSelection::Multi(pools) | PoolSelection::Union(pools) => {
            external_for_pools(external, pools.iter().map(String::as_str))
        }
        PoolSelection::PoolTotal => {
            external_for_pools(external, canonical.iter().map(String::as_str))
        }
    }
}
