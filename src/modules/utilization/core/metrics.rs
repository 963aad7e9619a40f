// Metrics Calculator: the single source of truth for derived figures.
//
// Rules
// - utilization_rate = logged / available * 100, 0 when available is 0.
// - variance         = (logged - planned) / planned * 100, 0 when planned is 0.
// - efficiency_ratio     = logged / external * 100, N/A when external is 0 or unknown.
// - billable_utilization = external / available * 100, N/A when available is 0 or
//   external is unknown.
// - scope_health         = external / planned * 100, N/A when planned is 0 or external
//   is unknown.
// - N/A is `None` (serialized as null), never 0.
//
// Sums are collected in `MetricTotals` first so a company roll-up recomputes the
// ratios from summed hours instead of averaging ratios.

use crate::modules::utilization::core::name_resolver::normalize;
use crate::modules::utilization::core::pool_filter::is_recognized;
use crate::modules::utilization::core::ports::ExternalHours;
use crate::modules::utilization::core::records::{
    AvailableResourceRecord, EmployeeRecord, TimesheetRecord, tag_key,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetricSet {
    pub headcount: usize,
    pub active_headcount: usize,
    pub available_hours: f64,
    pub planned_hours: f64,
    pub logged_hours: f64,
    pub external_hours: Option<f64>,
    pub utilization_rate: f64,
    pub variance: f64,
    pub efficiency_ratio: Option<f64>,
    pub billable_utilization: Option<f64>,
    pub scope_health: Option<f64>,
}

pub fn utilization_rate(logged: f64, available: f64) -> f64 {
    if available > 0.0 {
        logged / available * 100.0
    } else {
        0.0
    }
}

pub fn variance(logged: f64, planned: f64) -> f64 {
    if planned > 0.0 {
        (logged - planned) / planned * 100.0
    } else {
        0.0
    }
}

pub fn efficiency_ratio(logged: f64, external: Option<f64>) -> Option<f64> {
    external
        .filter(|e| *e > 0.0)
        .map(|e| logged / e * 100.0)
}

pub fn billable_utilization(external: Option<f64>, available: f64) -> Option<f64> {
    match external {
        Some(e) if available > 0.0 => Some(e / available * 100.0),
        _ => None,
    }
}

pub fn scope_health(external: Option<f64>, planned: f64) -> Option<f64> {
    match external {
        Some(e) if planned > 0.0 => Some(e / planned * 100.0),
        _ => None,
    }
}

/// Summed inputs of a metric set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricTotals {
    pub headcount: usize,
    pub active_headcount: usize,
    pub available_hours: f64,
    pub planned_hours: f64,
    pub logged_hours: f64,
    pub external_hours: Option<f64>,
}

impl MetricTotals {
    /// Sums filtered datasets. `canonical` decides which tags count as recognized for
    /// the active headcount.
    pub fn from_records(
        employees: &[&EmployeeRecord],
        resources: &[&AvailableResourceRecord],
        timesheets: &[&TimesheetRecord],
        canonical: &[String],
    ) -> Self {
        let mut active: HashSet<String> = HashSet::new();
        let mut anonymous_active = 0;
        for timesheet in timesheets
            .iter()
            .filter(|t| t.total_hours > 0.0 && is_recognized(**t, canonical))
        {
            let key = normalize(&timesheet.name);
            if key.is_empty() {
                anonymous_active += 1;
            } else {
                active.insert(key);
            }
        }

        Self {
            headcount: employees.len(),
            active_headcount: active.len() + anonymous_active,
            available_hours: resources.iter().map(|r| r.available_hours).sum(),
            planned_hours: resources.iter().map(|r| r.planned_hours).sum(),
            logged_hours: timesheets.iter().map(|t| t.total_hours).sum(),
            external_hours: None,
        }
    }

    pub fn with_external(mut self, external: Option<f64>) -> Self {
        self.external_hours = external;
        self
    }

    /// Adds record sums. External hours are not summed here; they are set once per
    /// period by the caller.
    pub fn merge(mut self, other: &MetricTotals) -> Self {
        self.headcount += other.headcount;
        self.active_headcount += other.active_headcount;
        self.available_hours += other.available_hours;
        self.planned_hours += other.planned_hours;
        self.logged_hours += other.logged_hours;
        self
    }

    pub fn finish(self) -> DerivedMetricSet {
        DerivedMetricSet {
            headcount: self.headcount,
            active_headcount: self.active_headcount,
            available_hours: self.available_hours,
            planned_hours: self.planned_hours,
            logged_hours: self.logged_hours,
            external_hours: self.external_hours,
            utilization_rate: utilization_rate(self.logged_hours, self.available_hours),
            variance: variance(self.logged_hours, self.planned_hours),
            efficiency_ratio: efficiency_ratio(self.logged_hours, self.external_hours),
            billable_utilization: billable_utilization(self.external_hours, self.available_hours),
            scope_health: scope_health(self.external_hours, self.planned_hours),
        }
    }
}

/// Sold hours for one pool, looked up case-insensitively.
pub fn external_for_pool(external: &ExternalHours, pool: &str) -> Option<f64> {
    let wanted = tag_key(pool);
    external
        .iter()
        .find(|(name, _)| tag_key(name) == wanted)
        .map(|(_, hours)| hours.max(0.0))
}

/// Sum of the sold hours of the given pools that have a figure. None when none has one.
pub fn external_for_pools<'a>(
    external: &ExternalHours,
    pools: impl IntoIterator<Item = &'a str>,
) -> Option<f64> {
    let mut seen: HashSet<String> = HashSet::new();
    pools
        .into_iter()
        .filter(|p| seen.insert(tag_key(p)))
        .filter_map(|p| external_for_pool(external, p))
        .fold(None, |acc, hours| Some(acc.unwrap_or(0.0) + hours))
}
