// Ports define what the utilization core needs from the outside world.
//
// Purpose
// - DataProvider: the upstream ERP/spreadsheet source of per-entity datasets and of
//   sold (external) hours.
//
// Boundaries
// - Raw* types are the transport shape. Every field is optional because the upstream
//   source omits or nulls fields freely. Ingestion turns them into records.
// - No concrete input or output here. Adapters implement the trait.

use crate::shared::core::primitives::Granularity;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider returned an error: {0}")]
    Upstream(String),
}

/// Sold/contracted hours per pool name, as reported by the external source.
pub type ExternalHours = HashMap<String, f64>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEmployee {
    pub name: Option<String>,
    pub job_title: Option<String>,
    pub email: Option<String>,
    pub tags: Option<Vec<Option<String>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawResource {
    pub name: Option<String>,
    pub tags: Option<Vec<Option<String>>>,
    pub available_hours: Option<f64>,
    pub planned_hours: Option<f64>,
    pub time_off_hours: Option<f64>,
    pub allocated_percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTimesheetEntry {
    pub task: Option<String>,
    pub date: Option<String>,
    pub hours: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTimesheet {
    pub name: Option<String>,
    pub tags: Option<Vec<Option<String>>>,
    pub total_hours: Option<f64>,
    pub unbilled_hours: Option<f64>,
    #[serde(alias = "timesheet_entries")]
    pub entries: Option<Vec<RawTimesheetEntry>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEntityPayload {
    pub entity: String,
    pub employees: Option<Vec<RawEmployee>>,
    #[serde(alias = "available_resources")]
    pub resources: Option<Vec<RawResource>>,
    #[serde(alias = "timesheet_data")]
    pub timesheets: Option<Vec<RawTimesheet>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPayload {
    pub entities: Vec<RawEntityPayload>,
    /// The provider served this from its own upstream cache.
    pub cached: bool,
    pub source_timestamp: Option<i64>,
}

impl RawPayload {
    pub fn take_entity(&mut self, entity: &str) -> Option<RawEntityPayload> {
        let wanted = entity.trim().to_lowercase();
        let index = self
            .entities
            .iter()
            .position(|e| e.entity.trim().to_lowercase() == wanted)?;
        Some(self.entities.swap_remove(index))
    }
}

#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn fetch_snapshot(
        &self,
        entities: &[String],
        granularity: Granularity,
        period_value: &str,
    ) -> Result<RawPayload, ProviderError>;

    async fn fetch_external_hours(
        &self,
        granularity: Granularity,
        period_value: &str,
    ) -> Result<ExternalHours, ProviderError>;

    /// Ask the provider to drop its own upstream cache for a period.
    async fn force_refresh(
        &self,
        granularity: Granularity,
        period_value: &str,
    ) -> Result<(), ProviderError>;
}
