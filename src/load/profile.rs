//! Preset job tables and per-profile defaults.
//!
//! # Profiles
//! - `comprehensive`: one job per endpoint plus the liveness probe, 3 workers
//! - `minimal`: hello, calc and error on short periods, 1 worker
//! - `custom`: jobs taken verbatim from `load.jobs`

use std::time::Duration;

use crate::config::schema::{JobConfig, LoadConfig, LoadProfile, ParamRule};

/// Worker and timeout defaults that come with a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileDefaults {
    pub workers: usize,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

/// Fully resolved load generator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSettings {
    pub jobs: Vec<JobConfig>,
    pub workers: usize,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub preview_chars: usize,
}

fn job(name: &str, path: &str, params: ParamRule, initial_delay_secs: u64, period_secs: u64) -> JobConfig {
    JobConfig {
        name: name.to_string(),
        path: path.to_string(),
        params,
        initial_delay_ms: initial_delay_secs * 1000,
        period_ms: period_secs * 1000,
        max_in_flight: 1,
    }
}

impl LoadProfile {
    /// Preset jobs. `Custom` has none of its own.
    pub fn jobs(&self) -> Vec<JobConfig> {
        match self {
            LoadProfile::Comprehensive => vec![
                job("hello", "/hello", ParamRule::None, 2, 4),
                job(
                    "calc",
                    "/calc",
                    ParamRule::RandomQuery {
                        names: vec!["x".to_string(), "y".to_string()],
                        min: 1,
                        max: 100,
                    },
                    3,
                    6,
                ),
                job("users", "/users", ParamRule::None, 5, 8),
                job("user", "/users", ParamRule::RandomPathId { min: 1, max: 10 }, 7, 12),
                job("orders", "/orders", ParamRule::None, 10, 15),
                job("slow", "/slow", ParamRule::None, 15, 30),
                job("error", "/error", ParamRule::None, 20, 45),
                job("health", "/actuator/health", ParamRule::None, 1, 10),
            ],
            LoadProfile::Minimal => vec![
                job("hello", "/hello", ParamRule::None, 1, 3),
                job(
                    "calc",
                    "/calc",
                    ParamRule::Fixed {
                        query: "x=21&y=2".to_string(),
                    },
                    2,
                    5,
                ),
                job("error", "/error", ParamRule::None, 5, 15),
            ],
            LoadProfile::Custom => Vec::new(),
        }
    }

    pub fn defaults(&self) -> ProfileDefaults {
        match self {
            LoadProfile::Minimal => ProfileDefaults {
                workers: 1,
                connect_timeout: Duration::from_secs(2),
                read_timeout: Duration::from_secs(2),
            },
            LoadProfile::Comprehensive | LoadProfile::Custom => ProfileDefaults {
                workers: 3,
                connect_timeout: Duration::from_secs(5),
                read_timeout: Duration::from_secs(10),
            },
        }
    }
}

impl LoadConfig {
    /// Merge the profile's presets with explicit overrides.
    pub fn resolve(&self) -> LoadSettings {
        let defaults = self.profile.defaults();
        let jobs = match self.profile {
            LoadProfile::Custom => self.jobs.clone(),
            preset => preset.jobs(),
        };

        LoadSettings {
            jobs,
            workers: self.workers.unwrap_or(defaults.workers),
            connect_timeout: self
                .connect_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            read_timeout: self
                .read_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.read_timeout),
            preview_chars: self.preview_chars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::job::ScheduledJob;

    #[test]
    fn test_presets_are_valid() {
        for profile in [LoadProfile::Comprehensive, LoadProfile::Minimal] {
            for config in profile.jobs() {
                assert!(ScheduledJob::try_from(&config).is_ok(), "{:?}", config);
            }
        }
    }

    #[test]
    fn test_comprehensive_covers_every_endpoint() {
        let jobs = LoadProfile::Comprehensive.jobs();
        assert_eq!(jobs.len(), 8);
        let periods: Vec<u64> = jobs.iter().map(|j| j.period_ms / 1000).collect();
        assert_eq!(periods, vec![4, 6, 8, 12, 15, 30, 45, 10]);
        assert!(jobs.iter().any(|j| j.path == "/actuator/health"));
    }

    #[test]
    fn test_minimal_profile_settings() {
        let config = LoadConfig {
            profile: LoadProfile::Minimal,
            ..LoadConfig::default()
        };
        let settings = config.resolve();
        assert_eq!(settings.jobs.len(), 3);
        assert_eq!(settings.workers, 1);
        assert_eq!(settings.read_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_custom_profile_uses_configured_jobs_and_overrides() {
        let config = LoadConfig {
            profile: LoadProfile::Custom,
            jobs: vec![job("hello", "/hello", ParamRule::None, 0, 1)],
            workers: Some(2),
            read_timeout_secs: Some(7),
            ..LoadConfig::default()
        };
        let settings = config.resolve();
        assert_eq!(settings.jobs.len(), 1);
        assert_eq!(settings.workers, 2);
        assert_eq!(settings.connect_timeout, Duration::from_secs(5));
        assert_eq!(settings.read_timeout, Duration::from_secs(7));
    }
}
