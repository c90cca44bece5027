use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DATA_PATH: &str = "top5playersclean.csv";

/// Dashboard settings read from the environment (and an optional `.env`).
///
/// | variable                 | default                |
/// |--------------------------|------------------------|
/// | `SOCCERSTAT_DATA`        | `top5playersclean.csv` |
/// | `SOCCERSTAT_MIN_MATCHES` | `0`                    |
/// | `SOCCERSTAT_TOP_N`       | `10`                   |
/// | `SOCCERSTAT_OUTLIER_GPM` | `5.0`                  |
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub data_path: PathBuf,
    pub min_matches: u32,
    pub top_n: usize,
    /// Goals-per-match value at or above which box-plot points are outliers.
    pub outlier_goals_per_match: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            min_matches: 0,
            top_n: 10,
            outlier_goals_per_match: 5.0,
        }
    }
}

impl DashboardConfig {
    /// Read `.env` if present, then the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            data_path: lookup("SOCCERSTAT_DATA")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            min_matches: parse_or(&lookup, "SOCCERSTAT_MIN_MATCHES", defaults.min_matches),
            top_n: parse_or(&lookup, "SOCCERSTAT_TOP_N", defaults.top_n),
            outlier_goals_per_match: parse_or(
                &lookup,
                "SOCCERSTAT_OUTLIER_GPM",
                defaults.outlier_goals_per_match,
            ),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("ignoring {key}={raw:?}: not a valid value");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(DashboardConfig::from_lookup(lookup(&[])), DashboardConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let cfg = DashboardConfig::from_lookup(lookup(&[
            ("SOCCERSTAT_DATA", "data/players.parquet"),
            ("SOCCERSTAT_MIN_MATCHES", "5"),
            ("SOCCERSTAT_TOP_N", " 20 "),
            ("SOCCERSTAT_OUTLIER_GPM", "3.5"),
        ]));
        assert_eq!(cfg.data_path, PathBuf::from("data/players.parquet"));
        assert_eq!(cfg.min_matches, 5);
        assert_eq!(cfg.top_n, 20);
        assert_eq!(cfg.outlier_goals_per_match, 3.5);
    }

    #[test]
    fn malformed_values_fall_back() {
        let cfg = DashboardConfig::from_lookup(lookup(&[
            ("SOCCERSTAT_MIN_MATCHES", "-3"),
            ("SOCCERSTAT_TOP_N", "many"),
            ("SOCCERSTAT_DATA", "  "),
        ]));
        assert_eq!(cfg, DashboardConfig::default());
    }
}
