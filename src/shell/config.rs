// Process configuration read from the environment.
//
// Every value has a default. A value that does not parse falls back to its default
// and is logged, the process still starts.

use crate::modules::utilization::core::pools::PoolCatalog;
use std::env;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_BIND: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 8080));
pub const DEFAULT_REPORTING_YEAR: i32 = 2025;
pub const DEFAULT_ENTITIES: [&str; 3] = ["Creative", "Creative Strategy", "Instructional Design"];

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub reporting_year: i32,
    pub entities: Vec<String>,
    pub pools: PoolCatalog,
    pub provider_delay_ms: u64,
    pub seed_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let entities = value("UTILIZATION_ENTITIES")
            .map(|raw| list(&raw))
            .filter(|entities| !entities.is_empty())
            .unwrap_or_else(|| DEFAULT_ENTITIES.iter().map(|e| e.to_string()).collect());

        let pools = match value("UTILIZATION_POOLS") {
            None => PoolCatalog::standard(),
            Some(raw) => PoolCatalog::parse(&raw).unwrap_or_else(|error| {
                tracing::warn!(%error, "UTILIZATION_POOLS ignored, using the standard pools");
                PoolCatalog::standard()
            }),
        };

        Self {
            bind: parse_or(value("UTILIZATION_BIND"), "UTILIZATION_BIND", DEFAULT_BIND),
            reporting_year: parse_or(
                value("UTILIZATION_REPORTING_YEAR"),
                "UTILIZATION_REPORTING_YEAR",
                DEFAULT_REPORTING_YEAR,
            ),
            entities,
            pools,
            provider_delay_ms: parse_or(
                value("UTILIZATION_PROVIDER_DELAY_MS"),
                "UTILIZATION_PROVIDER_DELAY_MS",
                0,
            ),
            seed_file: value("UTILIZATION_SEED_FILE").map(PathBuf::from),
        }
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, name: &str, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, "unparseable value, using the default");
            default
        }),
    }
}

fn list(raw: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for item in raw.split(',').map(str::trim).filter(|i| !i.is_empty()) {
        if !items.iter().any(|i| i.eq_ignore_ascii_case(item)) {
            items.push(item.to_string());
        }
    }
    items
}

#[cfg(test)]
mod app_config_tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[rstest]
    fn it_should_default_every_value() {
        let config = config(&[]);

        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.bind.to_string(), "0.0.0.0:8080");
        assert_eq!(config.reporting_year, 2025);
        assert_eq!(
            config.entities,
            vec!["Creative", "Creative Strategy", "Instructional Design"]
        );
        assert_eq!(config.pools, PoolCatalog::standard());
        assert_eq!(config.provider_delay_ms, 0);
        assert_eq!(config.seed_file, None);
    }

    #[rstest]
    fn it_should_read_overrides() {
        let config = config(&[
            ("UTILIZATION_BIND", "127.0.0.1:9000"),
            ("UTILIZATION_REPORTING_YEAR", "2024"),
            ("UTILIZATION_ENTITIES", "Creative, creative ,Motion"),
            ("UTILIZATION_POOLS", "Motion=Cairo|Dubai"),
            ("UTILIZATION_PROVIDER_DELAY_MS", "250"),
            ("UTILIZATION_SEED_FILE", "./data/seed.json"),
        ]);

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.reporting_year, 2024);
        assert_eq!(config.entities, vec!["Creative", "Motion"]);
        assert_eq!(config.pools.pools_for("motion"), ["Cairo", "Dubai"]);
        assert!(config.pools.pools_for("Creative").is_empty());
        assert_eq!(config.provider_delay_ms, 250);
        assert_eq!(config.seed_file, Some(PathBuf::from("./data/seed.json")));
    }

    #[rstest]
    #[case("UTILIZATION_BIND", "not-an-address")]
    #[case("UTILIZATION_REPORTING_YEAR", "twenty")]
    #[case("UTILIZATION_PROVIDER_DELAY_MS", "-5")]
    #[case("UTILIZATION_POOLS", "Creative")]
    #[case("UTILIZATION_ENTITIES", " , ")]
    fn it_should_fall_back_on_unparseable_values(#[case] name: &str, #[case] value: &str) {
        assert_eq!(config(&[(name, value)]), config(&[]));
    }
}
