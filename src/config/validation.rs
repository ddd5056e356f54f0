//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (delays ordered, probabilities non-zero, ports valid)
//! - Check the load generator can actually start
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DemoConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{DelayRange, DemoConfig, LoadProfile, TransportMode};
use crate::load::job::ScheduledJob;

/// One semantic problem, tagged with the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn check_delay(field: &str, range: &DelayRange, errors: &mut Vec<ValidationError>) {
    if range.min_ms > range.max_ms {
        errors.push(ValidationError::new(
            field,
            format!("min_ms {} exceeds max_ms {}", range.min_ms, range.max_ms),
        ));
    }
}

pub fn validate_config(config: &DemoConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let sim = &config.simulator;
    check_delay("simulator.calc_delay", &sim.calc_delay, &mut errors);
    check_delay("simulator.slow_delay", &sim.slow_delay, &mut errors);
    if sim.user_not_found_one_in == 0 {
        errors.push(ValidationError::new("simulator.user_not_found_one_in", "must be at least 1"));
    }
    if sim.user_created_max_days < 2 {
        errors.push(ValidationError::new("simulator.user_created_max_days", "must be at least 2"));
    }
    if sim.order_count.min == 0 || sim.order_count.min > sim.order_count.max {
        errors.push(ValidationError::new(
            "simulator.order_count",
            format!("need 1 <= min <= max, got {}..{}", sim.order_count.min, sim.order_count.max),
        ));
    }
    if !(sim.order_value.min.is_finite() && sim.order_value.max.is_finite())
        || sim.order_value.min < 0.0
        || sim.order_value.min >= sim.order_value.max
    {
        errors.push(ValidationError::new(
            "simulator.order_value",
            format!("need 0 <= min < max, got {}..{}", sim.order_value.min, sim.order_value.max),
        ));
    }

    let load = &config.load;
    if load.preview_chars == 0 {
        errors.push(ValidationError::new("load.preview_chars", "must be greater than 0"));
    }
    if load.workers == Some(0) {
        errors.push(ValidationError::new("load.workers", "must be at least 1"));
    }
    if let Some(target) = &load.target_url {
        match Url::parse(target) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => errors.push(ValidationError::new("load.target_url", format!("'{}' is not an http(s) URL", target))),
        }
        if load.transport == TransportMode::Direct {
            errors.push(ValidationError::new("load.target_url", "has no effect with direct transport"));
        }
    }
    if load.enabled && load.profile == LoadProfile::Custom && load.jobs.is_empty() {
        errors.push(ValidationError::new("load.jobs", "custom profile needs at least one job"));
    }
    for (i, job) in load.jobs.iter().enumerate() {
        if let Err(e) = ScheduledJob::try_from(job) {
            errors.push(ValidationError::new(format!("load.jobs[{}]", i), e.to_string()));
        }
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", obs.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::JobConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&DemoConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = DemoConfig::default();
        config.simulator.user_not_found_one_in = 0;
        config.simulator.order_count.min = 0;
        config.load.workers = Some(0);
        config.load.profile = LoadProfile::Custom;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "simulator.user_not_found_one_in",
                "simulator.order_count",
                "load.workers",
                "load.jobs",
            ]
        );
    }

    #[test]
    fn test_rejects_empty_user_age_range() {
        let mut config = DemoConfig::default();
        config.simulator.user_created_max_days = 1;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "simulator.user_created_max_days");

        config.simulator.user_created_max_days = 2;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_rejects_bad_jobs_and_urls() {
        let mut config = DemoConfig::default();
        config.load.target_url = Some("ftp://example.com".into());
        config.load.jobs.push(JobConfig {
            name: "broken".into(),
            path: "/hello".into(),
            params: Default::default(),
            initial_delay_ms: 0,
            period_ms: 0,
            max_in_flight: 1,
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "load.target_url");
        assert_eq!(errors[1].field, "load.jobs[0]");
    }

    #[test]
    fn test_disabled_metrics_skip_address_check() {
        let mut config = DemoConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_err());
        config.observability.metrics_enabled = false;
        assert!(validate_config(&config).is_ok());
    }
}
