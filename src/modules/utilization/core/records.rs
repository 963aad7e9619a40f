// The three record sets of a snapshot, after ingestion.
//
// Notes
// - Hours are f64, never negative. Absent values were defaulted to 0 at ingestion.
// - Tags keep their display form. Compare them through `tag_key` only.
// - No shared numeric identifier exists across the three sets; the name is the identity.

use serde::{Deserialize, Serialize};

/// Case- and whitespace-insensitive form of a tag.
pub fn tag_key(tag: &str) -> String {
    tag.trim().to_lowercase()
}

/// Anything with a name and a tag set can be filtered into pools.
pub trait Tagged {
    fn name(&self) -> &str;
    fn tags(&self) -> &[String];

    fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag_key(tag);
        self.tags().iter().any(|t| tag_key(t) == wanted)
    }

    fn has_any_tag<'a>(&self, tags: impl IntoIterator<Item = &'a str>) -> bool {
        tags.into_iter().any(|tag| self.has_tag(tag))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub name: String,
    pub job_title: Option<String>,
    pub email: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableResourceRecord {
    pub name: String,
    pub tags: Vec<String>,
    /// Already net of time off.
    pub available_hours: f64,
    pub planned_hours: f64,
    pub time_off_hours: f64,
    pub allocated_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimesheetEntry {
    pub task: String,
    pub date: String,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimesheetRecord {
    pub name: String,
    pub tags: Vec<String>,
    pub total_hours: f64,
    pub unbilled_hours: f64,
    pub entries: Vec<TimesheetEntry>,
}

impl Tagged for EmployeeRecord {
    fn name(&self) -> &str {
        &self.name
    }
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Tagged for AvailableResourceRecord {
    fn name(&self) -> &str {
        &self.name
    }
    fn tags(&self) -> &[String] {
        &self.tags
    }
}

impl Tagged for TimesheetRecord {
    fn name(&self) -> &str {
        &self.name
    }
    fn tags(&self) -> &[String] {
        &self.tags
    }
}
