// Period catalog: the finite set of reporting periods per granularity.
//
// Tokens
// - monthly: "YYYY-MM" (01..=12)
// - weekly:  "YYYY-WW", week 1 starts on the first Sunday of the year and weeks are
//            enumerated while their start stays inside the year
// - daily:   "YYYY-DDD", day ordinal within the year
//
// Invalid tokens are never an error for callers: `resolve` substitutes the first
// valid token of the granularity and reports that it did.

use crate::shared::core::primitives::{Granularity, PeriodKey};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use thiserror::Error;

const MONTHLY_CAPACITY_HOURS: f64 = 184.0;
const WEEKLY_CAPACITY_HOURS: f64 = 40.0;
const DAILY_CAPACITY_HOURS: f64 = 8.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("reporting year out of range: {0}")]
    YearOutOfRange(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodResolution {
    pub key: PeriodKey,
    pub substituted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodCatalog {
    year: i32,
    first_day: NaiveDate,
    last_day: NaiveDate,
    first_sunday: NaiveDate,
}

impl PeriodCatalog {
    pub fn new(year: i32) -> Result<Self, PeriodError> {
        let first_day =
            NaiveDate::from_ymd_opt(year, 1, 1).ok_or(PeriodError::YearOutOfRange(year))?;
        let last_day =
            NaiveDate::from_ymd_opt(year, 12, 31).ok_or(PeriodError::YearOutOfRange(year))?;
        let days_until_sunday = (6 - first_day.weekday().num_days_from_monday() as i64) % 7;
        Ok(Self {
            year,
            first_day,
            last_day,
            first_sunday: first_day + Duration::days(days_until_sunday),
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Working hours one person offers in a period of this granularity.
    pub fn base_capacity_hours(granularity: Granularity) -> f64 {
        match granularity {
            Granularity::Monthly => MONTHLY_CAPACITY_HOURS,
            Granularity::Weekly => WEEKLY_CAPACITY_HOURS,
            Granularity::Daily => DAILY_CAPACITY_HOURS,
        }
    }

    pub fn default_value(&self, granularity: Granularity) -> String {
        match granularity {
            Granularity::Monthly | Granularity::Weekly => format!("{}-01", self.year),
            Granularity::Daily => format!("{}-001", self.year),
        }
    }

    pub fn periods(&self, granularity: Granularity) -> Vec<PeriodOption> {
        (1..=self.period_count(granularity))
            .filter_map(|ordinal| {
                let value = self.format_value(granularity, ordinal);
                let (start, end) = self.range_of(granularity, ordinal)?;
                Some(PeriodOption {
                    label: Self::label(granularity, ordinal, start, end),
                    value,
                })
            })
            .collect()
    }

    pub fn is_valid(&self, granularity: Granularity, value: &str) -> bool {
        self.ordinal_of(granularity, value).is_some()
    }

    pub fn resolve(&self, granularity: Granularity, raw: Option<&str>) -> PeriodResolution {
        match raw.map(str::trim) {
            Some(value) if self.is_valid(granularity, value) => PeriodResolution {
                key: PeriodKey {
                    granularity,
                    value: value.to_string(),
                },
                substituted: false,
            },
            other => {
                let fallback = self.default_value(granularity);
                if let Some(invalid) = other {
                    tracing::warn!(
                        %granularity,
                        invalid,
                        fallback = %fallback,
                        "invalid period value, substituting the first period"
                    );
                }
                PeriodResolution {
                    key: PeriodKey {
                        granularity,
                        value: fallback,
                    },
                    substituted: true,
                }
            }
        }
    }

    /// Inclusive calendar range covered by a period key.
    pub fn date_range(&self, key: &PeriodKey) -> Option<(NaiveDate, NaiveDate)> {
        let ordinal = self.ordinal_of(key.granularity, &key.value)?;
        self.range_of(key.granularity, ordinal)
    }

    fn period_count(&self, granularity: Granularity) -> u32 {
        match granularity {
            Granularity::Monthly => 12,
            Granularity::Weekly => {
                let days_left = (self.last_day - self.first_sunday).num_days();
                (days_left / 7 + 1) as u32
            }
            Granularity::Daily => self.last_day.ordinal(),
        }
    }

    fn format_value(&self, granularity: Granularity, ordinal: u32) -> String {
        match granularity {
            Granularity::Monthly | Granularity::Weekly => format!("{}-{:02}", self.year, ordinal),
            Granularity::Daily => format!("{}-{:03}", self.year, ordinal),
        }
    }

    fn ordinal_of(&self, granularity: Granularity, value: &str) -> Option<u32> {
        let (year, rest) = value.split_once('-')?;
        if year.parse::<i32>().ok()? != self.year {
            return None;
        }
        let width = match granularity {
            Granularity::Monthly | Granularity::Weekly => 2,
            Granularity::Daily => 3,
        };
        if rest.len() != width || !rest.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let ordinal = rest.parse::<u32>().ok()?;
        (1..=self.period_count(granularity))
            .contains(&ordinal)
            .then_some(ordinal)
    }

    fn range_of(&self, granularity: Granularity, ordinal: u32) -> Option<(NaiveDate, NaiveDate)> {
        match granularity {
            Granularity::Monthly => {
                let start = NaiveDate::from_ymd_opt(self.year, ordinal, 1)?;
                let next = if ordinal == 12 {
                    NaiveDate::from_ymd_opt(self.year + 1, 1, 1)?
                } else {
                    NaiveDate::from_ymd_opt(self.year, ordinal + 1, 1)?
                };
                Some((start, next.pred_opt()?))
            }
            Granularity::Weekly => {
                let start = self.first_sunday + Duration::weeks(ordinal as i64 - 1);
                Some((start, start + Duration::days(6)))
            }
            Granularity::Daily => {
                let day = self.first_day.with_ordinal(ordinal)?;
                Some((day, day))
            }
        }
    }

    fn label(granularity: Granularity, ordinal: u32, start: NaiveDate, end: NaiveDate) -> String {
        match granularity {
            Granularity::Monthly => start.format("%B %Y").to_string(),
            Granularity::Weekly => format!(
                "Week {} ({} - {})",
                ordinal,
                start.format("%b %d"),
                end.format("%b %d, %Y")
            ),
            Granularity::Daily => start.format("%a, %b %d, %Y").to_string(),
        }
    }
}

#[cfg(test)]
mod period_catalog_tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn catalog() -> PeriodCatalog {
        PeriodCatalog::new(2025).unwrap()
    }

    #[rstest]
    fn it_should_enumerate_twelve_months(catalog: PeriodCatalog) {
        let months = catalog.periods(Granularity::Monthly);
        assert_eq!(months.len(), 12);
        assert_eq!(
            months[0],
            PeriodOption {
                value: "2025-01".to_string(),
                label: "January 2025".to_string()
            }
        );
        assert_eq!(months[11].value, "2025-12");
    }

    #[rstest]
    fn it_should_start_week_one_on_the_first_sunday(catalog: PeriodCatalog) {
        let weeks = catalog.periods(Granularity::Weekly);
        assert_eq!(weeks.len(), 52);
        assert_eq!(weeks[0].value, "2025-01");
        assert_eq!(weeks[0].label, "Week 1 (Jan 05 - Jan 11, 2025)");
        assert_eq!(weeks[51].value, "2025-52");
    }

    #[rstest]
    fn it_should_enumerate_every_day_of_the_year(catalog: PeriodCatalog) {
        let days = catalog.periods(Granularity::Daily);
        assert_eq!(days.len(), 365);
        assert_eq!(days[0].value, "2025-001");
        assert_eq!(days[0].label, "Wed, Jan 01, 2025");
        assert_eq!(days[364].value, "2025-365");
    }

    #[rstest]
    fn it_should_count_366_days_in_a_leap_year() {
        let catalog = PeriodCatalog::new(2024).unwrap();
        assert_eq!(catalog.periods(Granularity::Daily).len(), 366);
        assert!(catalog.is_valid(Granularity::Daily, "2024-366"));
    }

    #[rstest]
    #[case(Granularity::Monthly, "2025-13")]
    #[case(Granularity::Monthly, "2024-01")]
    #[case(Granularity::Monthly, "2025-1")]
    #[case(Granularity::Weekly, "2025-53")]
    #[case(Granularity::Weekly, "2025-W01")]
    #[case(Granularity::Daily, "2025-000")]
    #[case(Granularity::Daily, "2025-366")]
    #[case(Granularity::Daily, "garbage")]
    fn it_should_substitute_an_invalid_period(
        catalog: PeriodCatalog,
        #[case] granularity: Granularity,
        #[case] raw: &str,
    ) {
        let resolution = catalog.resolve(granularity, Some(raw));
        assert!(resolution.substituted);
        assert_eq!(resolution.key.value, catalog.default_value(granularity));
        assert_eq!(resolution.key.granularity, granularity);
    }

    #[rstest]
    fn it_should_keep_a_valid_period(catalog: PeriodCatalog) {
        let resolution = catalog.resolve(Granularity::Weekly, Some(" 2025-10 "));
        assert!(!resolution.substituted);
        assert_eq!(resolution.key.value, "2025-10");
    }

    #[rstest]
    fn it_should_substitute_a_missing_period(catalog: PeriodCatalog) {
        let resolution = catalog.resolve(Granularity::Daily, None);
        assert!(resolution.substituted);
        assert_eq!(resolution.key.value, "2025-001");
    }

    #[rstest]
    fn it_should_map_periods_to_date_ranges(catalog: PeriodCatalog) {
        let february = PeriodKey {
            granularity: Granularity::Monthly,
            value: "2025-02".to_string(),
        };
        assert_eq!(
            catalog.date_range(&february),
            Some((
                NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
            ))
        );
        let december = PeriodKey {
            granularity: Granularity::Monthly,
            value: "2025-12".to_string(),
        };
        assert_eq!(
            catalog.date_range(&december).map(|(_, end)| end),
            NaiveDate::from_ymd_opt(2025, 12, 31)
        );
        let day = PeriodKey {
            granularity: Granularity::Daily,
            value: "2025-032".to_string(),
        };
        let feb_first = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert_eq!(catalog.date_range(&day), Some((feb_first, feb_first)));
    }

    #[rstest]
    fn it_should_expose_the_base_capacity_per_granularity() {
        let base = PeriodCatalog::base_capacity_hours;
        assert_eq!(base(Granularity::Monthly), 184.0);
        assert_eq!(base(Granularity::Weekly), 40.0);
        assert_eq!(base(Granularity::Daily), 8.0);
    }
}
