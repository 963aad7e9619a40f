// Ingestion: raw provider payload -> typed record sets.
//
// Rules
// - Absent or null numbers become 0. Negative and non-finite numbers become 0.
// - Absent or null arrays become empty. Null and blank tags are dropped, duplicates
//   (by tag_key) collapse to the first spelling.
// - A resource without `available_hours` but with `time_off_hours` gets the base
//   capacity of the granularity minus its time off. Without either it stays at 0.

use crate::modules::utilization::core::ports::{
    RawEmployee, RawEntityPayload, RawResource, RawTimesheet, RawTimesheetEntry,
};
use crate::modules::utilization::core::records::{
    AvailableResourceRecord, EmployeeRecord, TimesheetEntry, TimesheetRecord, tag_key,
};
use crate::shared::core::periods::PeriodCatalog;
use crate::shared::core::primitives::Granularity;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityDatasets {
    pub employees: Vec<EmployeeRecord>,
    pub resources: Vec<AvailableResourceRecord>,
    pub timesheets: Vec<TimesheetRecord>,
}

pub fn ingest(raw: RawEntityPayload, granularity: Granularity) -> EntityDatasets {
    EntityDatasets {
        employees: raw
            .employees
            .unwrap_or_default()
            .into_iter()
            .map(employee)
            .collect(),
        resources: raw
            .resources
            .unwrap_or_default()
            .into_iter()
            .map(|r| resource(r, granularity))
            .collect(),
        timesheets: raw
            .timesheets
            .unwrap_or_default()
            .into_iter()
            .map(timesheet)
            .collect(),
    }
}

fn hours(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

fn text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn tags(raw: Option<Vec<Option<String>>>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut tags = Vec::new();
    for tag in raw.unwrap_or_default().into_iter().flatten() {
        let key = tag_key(&tag);
        if key.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        tags.push(tag.trim().to_string());
    }
    tags
}

fn employee(raw: RawEmployee) -> EmployeeRecord {
    EmployeeRecord {
        name: text(raw.name),
        job_title: optional_text(raw.job_title),
        email: optional_text(raw.email),
        tags: tags(raw.tags),
    }
}

fn resource(raw: RawResource, granularity: Granularity) -> AvailableResourceRecord {
    let time_off_hours = hours(raw.time_off_hours);
    let available_hours = match (raw.available_hours, raw.time_off_hours) {
        (Some(available), _) => hours(Some(available)),
        (None, Some(_)) => {
            (PeriodCatalog::base_capacity_hours(granularity) - time_off_hours).max(0.0)
        }
        (None, None) => 0.0,
    };
    AvailableResourceRecord {
        name: text(raw.name),
        tags: tags(raw.tags),
        available_hours,
        planned_hours: hours(raw.planned_hours),
        time_off_hours,
        allocated_percentage: hours(raw.allocated_percentage),
    }
}

fn timesheet_entry(raw: RawTimesheetEntry) -> TimesheetEntry {
    TimesheetEntry {
        task: optional_text(raw.task).unwrap_or_else(|| "No Task".to_string()),
        date: text(raw.date),
        hours: hours(raw.hours),
    }
}

fn timesheet(raw: RawTimesheet) -> TimesheetRecord {
    TimesheetRecord {
        name: text(raw.name),
        tags: tags(raw.tags),
        total_hours: hours(raw.total_hours),
        unbilled_hours: hours(raw.unbilled_hours),
        entries: raw
            .entries
            .unwrap_or_default()
            .into_iter()
            .map(timesheet_entry)
            .collect(),
    }
}
