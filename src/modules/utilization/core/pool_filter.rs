// Pool Filter Engine.
//
// Responsibilities
// - Multi-select: union of the selected pools, one row per normalized name.
// - Union: every row tagged with a selected pool, kept as is so hours still add up.
// - Single-select: every record carrying the pool tag; no pool means the full dataset.
// - Pool total: records carrying at least one recognized tag. Untagged records are
//   excluded.
//
// Boundaries
// - Each dataset is filtered on its own. Joining across datasets is the Name Resolver's
//   job, summing is the Metrics Calculator's.

use crate::modules::utilization::core::name_resolver::normalize;
use crate::modules::utilization::core::pools::ALL_POOLS;
use crate::modules::utilization::core::records::{
    AvailableResourceRecord, EmployeeRecord, Tagged, TimesheetRecord, tag_key,
};
use crate::modules::utilization::core::snapshot::Snapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Employees,
    Resources,
    Timesheets,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown dataset: {0}")]
pub struct UnknownDataset(pub String);

impl FromStr for DatasetKind {
    type Err = UnknownDataset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "employees" | "headcount" => Ok(DatasetKind::Employees),
            "resources" | "available_resources" => Ok(DatasetKind::Resources),
            "timesheets" => Ok(DatasetKind::Timesheets),
            other => Err(UnknownDataset(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolSelection {
    All,
    Single(String),
    Multi(Vec<String>),
    Union(Vec<String>),
    PoolTotal,
}

impl PoolSelection {
    /// Maps the pool names a caller picked onto a selection. "All Pools" selects the
    /// pool total, nothing selects everything. Only headcount collapses rows by name;
    /// hour-bearing datasets keep every matching row.
    pub fn from_pools(kind: DatasetKind, pools: &[String]) -> Self {
        let pools: Vec<String> = pools
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if pools.iter().any(|p| tag_key(p) == tag_key(ALL_POOLS)) {
            return PoolSelection::PoolTotal;
        }
        match (kind, pools.as_slice()) {
            (_, []) => PoolSelection::All,
            (DatasetKind::Employees, _) => PoolSelection::Multi(pools),
            (_, [only]) => PoolSelection::Single(only.clone()),
            (_, _) => PoolSelection::Union(pools),
        }
    }

    pub fn label(&self) -> String {
        match self {
            PoolSelection::All => "All".to_string(),
            PoolSelection::Single(pool) => pool.clone(),
            PoolSelection::Multi(pools) | PoolSelection::Union(pools) => pools.join(", "),
            PoolSelection::PoolTotal => ALL_POOLS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "dataset", content = "records", rename_all = "lowercase")]
pub enum FilteredRecords {
    Employees(Vec<EmployeeRecord>),
    Resources(Vec<AvailableResourceRecord>),
    Timesheets(Vec<TimesheetRecord>),
}

impl FilteredRecords {
    pub fn len(&self) -> usize {
        match self {
            FilteredRecords::Employees(r) => r.len(),
            FilteredRecords::Resources(r) => r.len(),
            FilteredRecords::Timesheets(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A tag counts as recognized when it names a canonical pool. An entity without
/// canonical pools recognizes any tag.
pub fn is_recognized<T: Tagged>(record: &T, canonical: &[String]) -> bool {
    if canonical.is_empty() {
        record.tags().iter().any(|t| !t.trim().is_empty())
    } else {
        record.has_any_tag(canonical.iter().map(String::as_str))
    }
}

pub fn multi_select<'a, T: Tagged>(records: &'a [T], pools: &[String]) -> Vec<&'a T> {
    let mut seen: HashSet<String> = HashSet::new();
    records
        .iter()
        .filter(|r| r.has_any_tag(pools.iter().map(String::as_str)))
        .filter(|r| {
            let key = normalize(r.name());
            key.is_empty() || seen.insert(key)
        })
        .collect()
}

pub fn union_select<'a, T: Tagged>(records: &'a [T], pools: &[String]) -> Vec<&'a T> {
    records
        .iter()
        .filter(|r| r.has_any_tag(pools.iter().map(String::as_str)))
        .collect()
}

pub fn single_select<'a, T: Tagged>(records: &'a [T], pool: Option<&str>) -> Vec<&'a T> {
    match pool {
        None => records.iter().collect(),
        Some(pool) => records.iter().filter(|r| r.has_tag(pool)).collect(),
    }
}

pub fn pool_total<'a, T: Tagged>(records: &'a [T], canonical: &[String]) -> Vec<&'a T> {
    records
        .iter()
        .filter(|r| is_recognized(*r, canonical))
        .collect()
}

pub fn select<'a, T: Tagged>(
    records: &'a [T],
    selection: &PoolSelection,
    canonical: &[String],
) -> Vec<&'a T> {
    match selection {
        PoolSelection::All => single_select(records, None),
        PoolSelection::Single(pool) => single_select(records, Some(pool)),
        PoolSelection::Multi(pools) => multi_select(records, pools),
        PoolSelection::Union(pools) => union_select(records, pools),
        PoolSelection::PoolTotal => pool_total(records, canonical),
    }
}

pub fn filter_pool(
    snapshot: &Snapshot,
    kind: DatasetKind,
    selection: &PoolSelection,
) -> FilteredRecords {
    let canonical = snapshot.pools.as_slice();
    match kind {
        DatasetKind::Employees => FilteredRecords::Employees(
            select(&snapshot.employees, selection, canonical)
                .into_iter()
                .cloned()
                .collect(),
        ),
        DatasetKind::Resources => FilteredRecords::Resources(
            select(&snapshot.resources, selection, canonical)
                .into_iter()
                .cloned()
                .collect(),
        ),
        DatasetKind::Timesheets => FilteredRecords::Timesheets(
            select(&snapshot.timesheets, selection, canonical)
                .into_iter()
                .cloned()
                .collect(),
        ),
    }
}

#[cfg(test)]
mod pool_filter_tests {
    use super::*;
    use crate::tests::fixtures::records::{employee, timesheet};
    use rstest::{fixture, rstest};

    fn names<T: Tagged>(records: &[&T]) -> Vec<String> {
        records.iter().map(|r| r.name().to_string()).collect()
    }

    fn pools(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[fixture]
    fn directory() -> Vec<EmployeeRecord> {
        vec![
            employee("Sara Ali", &["KSA"]),
            employee("Omar Khaled", &["UAE", "Nightshift"]),
            employee("omar  khaled", &["Nightshift"]),
            employee("Lina Haddad", &[" ksa ", "UAE"]),
            employee("Yusuf Rahman", &[]),
            employee("Maya Saad", &["Remote"]),
        ]
    }

    #[rstest]
    fn it_should_union_pools_and_deduplicate_by_name(directory: Vec<EmployeeRecord>) {
        let selected = multi_select(&directory, &pools(&["UAE", "Nightshift"]));
        assert_eq!(names(&selected), vec!["Omar Khaled", "Lina Haddad"]);
    }

    #[rstest]
    fn it_should_select_nothing_for_an_empty_multi_selection(directory: Vec<EmployeeRecord>) {
        assert!(multi_select(&directory, &[]).is_empty());
    }

    #[rstest]
    #[case(&[], &["KSA"])]
    #[case(&["KSA"], &["KSA", "UAE"])]
    #[case(&["UAE"], &["UAE", "Nightshift", "Remote"])]
    #[case(&["KSA", "Nightshift"], &["KSA", "UAE", "Nightshift", "Remote"])]
    fn it_should_be_monotone_in_the_selection(
        directory: Vec<EmployeeRecord>,
        #[case] smaller: &[&str],
        #[case] larger: &[&str],
    ) {
        let small: HashSet<String> = multi_select(&directory, &pools(smaller))
            .iter()
            .map(|r| normalize(&r.name))
            .collect();
        let large: HashSet<String> = multi_select(&directory, &pools(larger))
            .iter()
            .map(|r| normalize(&r.name))
            .collect();
        assert!(small.is_subset(&large));
    }

    #[rstest]
    fn it_should_keep_same_name_rows_when_selecting_hours_across_pools() {
        let rows = vec![
            timesheet("Omar Khaled", &["KSA"], 30.0),
            timesheet("omar khaled", &["UAE"], 12.0),
            timesheet("Sara Ali", &["Remote"], 8.0),
        ];
        let selection = PoolSelection::from_pools(DatasetKind::Timesheets, &pools(&["KSA", "UAE"]));

        let selected = select(&rows, &selection, &[]);

        let hours: f64 = selected.iter().map(|r| r.total_hours).sum();
        assert_eq!(selection.label(), "KSA, UAE");
        assert_eq!(names(&selected), vec!["Omar Khaled", "omar khaled"]);
        assert_eq!(hours, 42.0);
    }

    #[rstest]
    fn it_should_single_select_every_matching_record(directory: Vec<EmployeeRecord>) {
        let selected = single_select(&directory, Some("nightshift"));
        assert_eq!(names(&selected), vec!["Omar Khaled", "omar  khaled"]);
        assert_eq!(single_select(&directory, None).len(), directory.len());
    }

    #[rstest]
    fn it_should_exclude_untagged_and_unrecognized_records_from_the_pool_total(
        directory: Vec<EmployeeRecord>,
    ) {
        let canonical = pools(&["KSA", "UAE", "Nightshift"]);
        let selected = pool_total(&directory, &canonical);
        assert_eq!(
            names(&selected),
            vec!["Sara Ali", "Omar Khaled", "omar  khaled", "Lina Haddad"]
        );
    }

    #[rstest]
    fn it_should_recognize_any_tag_when_no_pools_are_configured(directory: Vec<EmployeeRecord>) {
        let selected = pool_total(&directory, &[]);
        assert_eq!(selected.len(), 5);
        assert!(!names(&selected).contains(&"Yusuf Rahman".to_string()));
    }

    #[rstest]
    #[case(DatasetKind::Employees, &[], PoolSelection::All)]
    #[case(DatasetKind::Employees, &["KSA"], PoolSelection::Multi(vec!["KSA".to_string()]))]
    #[case(DatasetKind::Resources, &["KSA"], PoolSelection::Single("KSA".to_string()))]
    #[case(DatasetKind::Timesheets, &[" "], PoolSelection::All)]
    #[case(DatasetKind::Timesheets, &["all pools"], PoolSelection::PoolTotal)]
    fn it_should_map_requested_pools_onto_a_selection(
        #[case] kind: DatasetKind,
        #[case] requested: &[&str],
        #[case] expected: PoolSelection,
    ) {
        assert_eq!(PoolSelection::from_pools(kind, &pools(requested)), expected);
    }

    #[rstest]
    #[case("employees", DatasetKind::Employees)]
    #[case("Headcount", DatasetKind::Employees)]
    #[case("available_resources", DatasetKind::Resources)]
    #[case(" timesheets", DatasetKind::Timesheets)]
    fn it_should_parse_dataset_kinds(#[case] raw: &str, #[case] expected: DatasetKind) {
        assert_eq!(raw.parse::<DatasetKind>(), Ok(expected));
    }
}
