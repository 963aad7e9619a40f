// Snapshot: the cache value for one (entity, granularity, period).
//
// Responsibilities
// - Hold the three record sets as ingested, plus every derived figure a view reads:
//   per-pool metrics, the pool total, whole-entity metrics and the per-member join.
// - Built once, synchronously, from a provider payload. Never mutated afterwards; a
//   refresh builds a new one and the cache swaps the `Arc`.

use crate::modules::utilization::core::ingest::EntityDatasets;
use crate::modules::utilization::core::metrics::{
    DerivedMetricSet, MetricTotals, external_for_pool, external_for_pools,
};
use crate::modules::utilization::core::name_resolver::{NameIndex, Resolution};
use crate::modules::utilization::core::pool_filter::{PoolSelection, select};
use crate::modules::utilization::core::pools::ALL_POOLS;
use crate::modules::utilization::core::ports::ExternalHours;
use crate::modules::utilization::core::records::{
    AvailableResourceRecord, EmployeeRecord, TimesheetRecord,
};
use crate::shared::core::primitives::{CacheKey, PeriodKey};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::AddAssign;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ResourceHours {
    pub available_hours: f64,
    pub planned_hours: f64,
}

impl AddAssign for ResourceHours {
    fn add_assign(&mut self, other: Self) {
        self.available_hours += other.available_hours;
        self.planned_hours += other.planned_hours;
    }
}

/// One directory member with the hours joined in from the other two datasets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberRow {
    pub name: String,
    pub job_title: Option<String>,
    pub tags: Vec<String>,
    pub available_hours: f64,
    pub planned_hours: f64,
    pub logged_hours: f64,
}

/// Everything a snapshot is built from, minus the fetch identity.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    pub entity: String,
    pub period_key: PeriodKey,
    pub datasets: EntityDatasets,
    /// None when the sold-hours figures could not be fetched.
    pub external_hours: Option<ExternalHours>,
    pub pools: Vec<String>,
    pub source_cached: bool,
    pub source_timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub entity: String,
    pub period_key: PeriodKey,
    pub fetch_id: Uuid,
    pub fetched_at: i64,
    pub pools: Vec<String>,
    pub employees: Vec<EmployeeRecord>,
    pub resources: Vec<AvailableResourceRecord>,
    pub timesheets: Vec<TimesheetRecord>,
    pub pool_metrics: BTreeMap<String, DerivedMetricSet>,
    pub entity_metrics: DerivedMetricSet,
    pub external_hours: Option<ExternalHours>,
    pub members: Vec<MemberRow>,
    pub source_cached: bool,
    pub source_timestamp: Option<i64>,
}

impl Snapshot {
    pub fn build(source: SnapshotSource, fetch_id: Uuid, fetched_at: i64) -> Self {
        let SnapshotSource {
            entity,
            period_key,
            datasets,
            external_hours,
            pools,
            source_cached,
            source_timestamp,
        } = source;

        let mut snapshot = Self {
            entity,
            period_key,
            fetch_id,
            fetched_at,
            pools,
            employees: datasets.employees,
            resources: datasets.resources,
            timesheets: datasets.timesheets,
            pool_metrics: BTreeMap::new(),
            entity_metrics: MetricTotals::default().finish(),
            external_hours,
            members: Vec::new(),
            source_cached,
            source_timestamp,
        };

        snapshot.entity_metrics = snapshot.metrics_for(&PoolSelection::All);
        snapshot.pool_metrics = snapshot
            .pools
            .iter()
            .map(|pool| {
                (
                    pool.clone(),
                    snapshot.metrics_for(&PoolSelection::Single(pool.clone())),
                )
            })
            .chain(std::iter::once((
                ALL_POOLS.to_string(),
                snapshot.metrics_for(&PoolSelection::PoolTotal),
            )))
            .collect();
        snapshot.members = snapshot.join_members();
        snapshot
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.entity.as_str(), &self.period_key)
    }

    pub fn age_ms(&self, now: i64) -> i64 {
        (now - self.fetched_at).max(0)
    }

    /// Record sums for a selection, without the sold-hours figure.
    pub fn totals_for(&self, selection: &PoolSelection) -> MetricTotals {
        let employees = select(&self.employees, selection, &self.pools);
        let resources = select(&self.resources, selection, &self.pools);
        let timesheets = select(&self.timesheets, selection, &self.pools);
        MetricTotals::from_records(&employees, &resources, &timesheets, &self.pools)
    }

    /// Sold hours for a selection. The whole entity uses an entity-level figure when the
    /// source reports one, the pool total otherwise.
    pub fn external_for(&self, selection: &PoolSelection) -> Option<f64> {
        let external = self.external_hours.as_ref()?;
        let canonical = self.pools.iter().map(String::as_str);
        match selection {
            PoolSelection::All => external_for_pool(external, &self.entity)
                .or_else(|| external_for_pools(external, canonical)),
            PoolSelection::Single(pool) => external_for_pool(external, pool),
            PoolSelection::Multi(pools) | PoolSelection::Union(pools) => {
                external_for_pools(external, pools.iter().map(String::as_str))
            }
            PoolSelection::PoolTotal => external_for_pools(external, canonical),
        }
    }

    pub fn metrics_for(&self, selection: &PoolSelection) -> DerivedMetricSet {
        self.totals_for(selection)
            .with_external(self.external_for(selection))
            .finish()
    }

    fn join_members(&self) -> Vec<MemberRow> {
        let resources: NameIndex<ResourceHours> = NameIndex::build(
            &self.resources,
            |r| r.name.as_str(),
            |r| ResourceHours {
                available_hours: r.available_hours,
                planned_hours: r.planned_hours,
            },
        );
        let logged: NameIndex<f64> =
            NameIndex::build(&self.timesheets, |t| t.name.as_str(), |t| t.total_hours);

        self.employees
            .iter()
            .map(|employee| {
                let (hours, resource_outcome) = resources.resolve_with_outcome(&employee.name);
                let (logged_hours, logged_outcome) = logged.resolve_with_outcome(&employee.name);
                let outcomes = [
                    ("resources", resource_outcome),
                    ("timesheets", logged_outcome),
                ];
                for (dataset, outcome) in outcomes {
                    if let Resolution::Ambiguous(candidates) = outcome {
                        debug!(
                            entity = %self.entity,
                            member = %employee.name,
                            dataset,
                            candidates,
                            "ambiguous name join, contributing 0"
                        );
                    }
                }
                MemberRow {
                    name: employee.name.clone(),
                    job_title: employee.job_title.clone(),
                    tags: employee.tags.clone(),
                    available_hours: hours.available_hours,
                    planned_hours: hours.planned_hours,
                    logged_hours,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod snapshot_tests {
    use super::*;
    use crate::shared::core::primitives::Granularity;
    use crate::tests::fixtures::records::{employee, resource, timesheet};
    use rstest::{fixture, rstest};
    use std::collections::HashMap;

    #[fixture]
    fn source() -> SnapshotSource {
        SnapshotSource {
            entity: "Creative".to_string(),
            period_key: PeriodKey {
                granularity: Granularity::Monthly,
                value: "2025-01".to_string(),
            },
            datasets: EntityDatasets {
                employees: vec![
                    employee("Sara Ali", &["KSA"]),
                    employee("Omar Khaled", &["UAE"]),
                    employee("Yusuf Rahman", &[]),
                ],
                resources: vec![
                    resource("Sara Ali", &["KSA"], 60.0, 30.0),
                    resource("Dana Karim", &["KSA"], 40.0, 20.0),
                    resource("Omar Khaled", &["UAE"], 80.0, 80.0),
                    resource("Yusuf Rahman", &[], 10.0, 10.0),
                ],
                timesheets: vec![
                    timesheet("Sara Ali", &["KSA"], 15.0),
                    timesheet("Dana Karim", &["KSA"], 10.0),
                    timesheet("Omar Khaled", &["UAE"], 40.0),
                    timesheet("Yusuf Rahman", &[], 5.0),
                ],
            },
            external_hours: Some(HashMap::from([
                ("KSA".to_string(), 40.0),
                ("uae".to_string(), 100.0),
            ])),
            pools: vec![
                "KSA".to_string(),
                "UAE".to_string(),
                "Nightshift".to_string(),
            ],
            source_cached: false,
            source_timestamp: None,
        }
    }

    #[rstest]
    fn it_should_compute_metrics_per_pool(source: SnapshotSource) {
        let snapshot = Snapshot::build(source, Uuid::now_v7(), 1_000);
        let ksa = &snapshot.pool_metrics["KSA"];

        assert_eq!(ksa.headcount, 1);
        assert_eq!(ksa.active_headcount, 2);
        assert_eq!(ksa.available_hours, 100.0);
        assert_eq!(ksa.logged_hours, 25.0);
        assert_eq!(ksa.utilization_rate, 25.0);
        assert_eq!(ksa.variance, -50.0);
        assert_eq!(ksa.efficiency_ratio, Some(62.5));
        assert_eq!(ksa.billable_utilization, Some(40.0));
        assert_eq!(ksa.scope_health, Some(80.0));

        let nightshift = &snapshot.pool_metrics["Nightshift"];
        assert_eq!(nightshift.headcount, 0);
        assert_eq!(nightshift.utilization_rate, 0.0);
        assert_eq!(nightshift.external_hours, None);
    }

    #[rstest]
    fn it_should_exclude_untagged_records_from_the_pool_total(source: SnapshotSource) {
        let snapshot = Snapshot::build(source, Uuid::now_v7(), 1_000);
        let total = &snapshot.pool_metrics[ALL_POOLS];

        assert_eq!(total.headcount, 2);
        assert_eq!(total.available_hours, 180.0);
        assert_eq!(total.logged_hours, 65.0);
        assert_eq!(total.external_hours, Some(140.0));

        assert_eq!(snapshot.entity_metrics.headcount, 3);
        assert_eq!(snapshot.entity_metrics.logged_hours, 70.0);
    }

    #[rstest]
    fn it_should_degrade_to_not_available_without_external_hours(mut source: SnapshotSource) {
        source.external_hours = None;
        let snapshot = Snapshot::build(source, Uuid::now_v7(), 1_000);
        for metrics in snapshot.pool_metrics.values() {
            assert_eq!(metrics.efficiency_ratio, None);
            assert_eq!(metrics.billable_utilization, None);
            assert_eq!(metrics.scope_health, None);
        }
    }

    #[rstest]
    fn it_should_join_member_hours_by_name(mut source: SnapshotSource) {
        source
            .datasets
            .timesheets
            .push(timesheet("sara ALI", &["KSA"], 5.0));
        let snapshot = Snapshot::build(source, Uuid::now_v7(), 1_000);
        let sara = &snapshot.members[0];

        assert_eq!(sara.name, "Sara Ali");
        assert_eq!(sara.available_hours, 60.0);
        assert_eq!(sara.planned_hours, 30.0);
        assert_eq!(sara.logged_hours, 20.0);
    }

    #[rstest]
    fn it_should_contribute_zero_for_an_ambiguous_member(mut source: SnapshotSource) {
        source.datasets.employees.push(employee("Ali", &["KSA"]));
        source
            .datasets
            .timesheets
            .push(timesheet("Ali Hassan", &["KSA"], 9.0));
        let snapshot = Snapshot::build(source, Uuid::now_v7(), 1_000);
        let ali = snapshot.members.last().unwrap();

        assert_eq!(ali.name, "Ali");
        assert_eq!(ali.logged_hours, 0.0);
    }

    #[rstest]
    fn it_should_report_its_age(source: SnapshotSource) {
        let snapshot = Snapshot::build(source, Uuid::now_v7(), 1_000);
        assert_eq!(snapshot.age_ms(4_500), 3_500);
        assert_eq!(snapshot.age_ms(500), 0);
        assert_eq!(snapshot.cache_key().to_string(), "Creative/monthly/2025-01");
    }
}
