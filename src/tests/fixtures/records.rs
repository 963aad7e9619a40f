// Record builders for core tests.

use crate::modules::utilization::core::records::{
    AvailableResourceRecord, EmployeeRecord, TimesheetEntry, TimesheetRecord,
};

fn owned(tags: &[&str]) -> Vec<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

pub fn employee(name: &str, tags: &[&str]) -> EmployeeRecord {
    EmployeeRecord {
        name: name.to_string(),
        job_title: None,
        email: None,
        tags: owned(tags),
    }
}

pub fn resource(
    name: &str,
    tags: &[&str],
    available: f64,
    planned: f64,
) -> AvailableResourceRecord {
    AvailableResourceRecord {
        name: name.to_string(),
        tags: owned(tags),
        available_hours: available,
        planned_hours: planned,
        time_off_hours: 0.0,
        allocated_percentage: 0.0,
    }
}

pub fn timesheet(name: &str, tags: &[&str], total: f64) -> TimesheetRecord {
    TimesheetRecord {
        name: name.to_string(),
        tags: owned(tags),
        total_hours: total,
        unbilled_hours: 0.0,
        entries: vec![TimesheetEntry {
            task: "Campaign".to_string(),
            date: "2025-01-02".to_string(),
            hours: total,
        }],
    }
}
