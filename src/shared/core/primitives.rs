// Value types shared by every use case: granularity, period key and cache key.
//
// Notes
// - Timestamps are i64 epoch milliseconds everywhere.
// - Entity names keep their display casing; comparisons go through `CacheKey::new`
//   which trims them so "Creative " and "Creative" address the same entry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Monthly,
    Weekly,
    Daily,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [
        Granularity::Monthly,
        Granularity::Weekly,
        Granularity::Daily,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Monthly => "monthly",
            Granularity::Weekly => "weekly",
            Granularity::Daily => "daily",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown granularity: {0}")]
pub struct UnknownGranularity(pub String);

impl FromStr for Granularity {
    type Err = UnknownGranularity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" => Ok(Granularity::Monthly),
            "weekly" => Ok(Granularity::Weekly),
            "daily" => Ok(Granularity::Daily),
            other => Err(UnknownGranularity(other.to_string())),
        }
    }
}

/// A validated reporting period. Only `PeriodCatalog::resolve` builds these from
/// user input, so `value` is always one of the enumerated tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub granularity: Granularity,
    pub value: String,
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.granularity, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    pub entity: String,
    pub granularity: Granularity,
    pub period_value: String,
}

impl CacheKey {
    pub fn new(entity: impl Into<String>, period: &PeriodKey) -> Self {
        Self {
            entity: entity.into().trim().to_string(),
            granularity: period.granularity,
            period_value: period.value.clone(),
        }
    }

    pub fn period(&self) -> PeriodKey {
        PeriodKey {
            granularity: self.granularity,
            value: self.period_value.clone(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.entity, self.granularity, self.period_value
        )
    }
}
