//! Scheduled job definition and validation.

use std::time::Duration;

use thiserror::Error;

use crate::config::schema::{JobConfig, ParamRule};
use crate::simulator::random::RandomSource;

/// Errors that prevent the scheduler from starting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    /// No jobs were configured.
    #[error("no jobs configured")]
    NoJobs,

    /// Worker pool size of zero.
    #[error("worker pool size must be at least 1")]
    NoWorkers,

    /// Two jobs share a name.
    #[error("duplicate job name '{0}'")]
    DuplicateJob(String),

    /// A single job is malformed.
    #[error("job '{job}': {reason}")]
    InvalidJob { job: String, reason: String },
}

/// A periodic call bound to one path and parameter rule.
///
/// Firings happen at `initial_delay + k * period` for `k >= 0`, measured from
/// scheduler start, regardless of how long earlier firings take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledJob {
    pub name: String,
    pub path: String,
    pub params: ParamRule,
    pub initial_delay: Duration,
    pub period: Duration,
    /// Cap on concurrent firings of this job; `None` allows unbounded overlap.
    /// Single-flight unless configured otherwise.
    pub max_in_flight: Option<usize>,
}

impl ScheduledJob {
    pub fn new(name: impl Into<String>, path: impl Into<String>, initial_delay: Duration, period: Duration) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            params: ParamRule::None,
            initial_delay,
            period,
            max_in_flight: Some(1),
        }
    }

    pub fn with_params(mut self, params: ParamRule) -> Self {
        self.params = params;
        self
    }

    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = Some(limit);
        self
    }

    /// Let firings of this job overlap without limit. Calls that outlast the
    /// period then accumulate and compete with other jobs for workers.
    pub fn with_unbounded_overlap(mut self) -> Self {
        self.max_in_flight = None;
        self
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        let invalid = |reason: &str| ScheduleError::InvalidJob {
            job: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if !self.path.starts_with('/') {
            return Err(invalid("path must start with '/'"));
        }
        if self.period.is_zero() {
            return Err(invalid("period must be greater than zero"));
        }
        if self.max_in_flight == Some(0) {
            return Err(invalid("max_in_flight must be at least 1 when set"));
        }
        match &self.params {
            ParamRule::RandomQuery { names, min, max } => {
                if names.is_empty() {
                    return Err(invalid("random_query needs at least one name"));
                }
                if min >= max {
                    return Err(invalid("random_query range is empty"));
                }
            }
            ParamRule::RandomPathId { min, max } if min >= max => {
                return Err(invalid("random_path_id range is empty"));
            }
            _ => {}
        }
        Ok(())
    }

    /// Path for one firing, with parameters drawn fresh.
    pub fn render_path(&self, random: &dyn RandomSource) -> String {
        match &self.params {
            ParamRule::None => self.path.clone(),
            ParamRule::Fixed { query } if query.is_empty() => self.path.clone(),
            ParamRule::Fixed { query } => append_query(&self.path, query),
            ParamRule::RandomQuery { names, min, max } => {
                let query = names
                    .iter()
                    .map(|name| format!("{}={}", name, random.next_i64_in(*min, *max)))
                    .collect::<Vec<_>>()
                    .join("&");
                append_query(&self.path, &query)
            }
            ParamRule::RandomPathId { min, max } => {
                format!("{}/{}", self.path.trim_end_matches('/'), random.next_i64_in(*min, *max))
            }
        }
    }

    /// Firings due within `elapsed` of scheduler start, first firing included.
    pub fn expected_firings(&self, elapsed: Duration) -> u64 {
        if elapsed < self.initial_delay || self.period.is_zero() {
            return 0;
        }
        let since_first = elapsed - self.initial_delay;
        (since_first.as_nanos() / self.period.as_nanos()) as u64 + 1
    }
}

fn append_query(path: &str, query: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{}{}{}", path, separator, query)
}

impl TryFrom<&JobConfig> for ScheduledJob {
    type Error = ScheduleError;

    fn try_from(config: &JobConfig) -> Result<Self, Self::Error> {
        let job = Self {
            name: config.name.clone(),
            path: config.path.clone(),
            params: config.params.clone(),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            period: Duration::from_millis(config.period_ms),
            max_in_flight: (config.max_in_flight > 0).then_some(config.max_in_flight),
        };
        job.validate()?;
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::random::SequenceRandom;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_render_fixed_and_random() {
        let random = SequenceRandom::new([4, 40]);

        let fixed = ScheduledJob::new("calc", "/calc", secs(2), secs(5))
            .with_params(ParamRule::Fixed { query: "x=21&y=2".into() });
        assert_eq!(fixed.render_path(&random), "/calc?x=21&y=2");

        let random_calc = ScheduledJob::new("calc", "/calc", secs(3), secs(6)).with_params(ParamRule::RandomQuery {
            names: vec!["x".into(), "y".into()],
            min: 1,
            max: 100,
        });
        assert_eq!(random_calc.render_path(&random), "/calc?x=5&y=41");

        let lookup = ScheduledJob::new("user", "/users/", secs(7), secs(12))
            .with_params(ParamRule::RandomPathId { min: 1, max: 10 });
        assert_eq!(lookup.render_path(&random), "/users/5");
    }

    #[test]
    fn test_expected_firings_inclusive_boundary() {
        let hello = ScheduledJob::new("hello", "/hello", secs(1), secs(3));
        assert_eq!(hello.expected_firings(Duration::from_millis(999)), 0);
        assert_eq!(hello.expected_firings(secs(1)), 1);
        assert_eq!(hello.expected_firings(secs(10)), 4);
        assert_eq!(hello.expected_firings(Duration::from_millis(9_999)), 3);

        let error = ScheduledJob::new("error", "/error", secs(5), secs(15));
        assert_eq!(error.expected_firings(secs(10)), 1);
    }

    #[test]
    fn test_validation_rejects_malformed_jobs() {
        let ok = ScheduledJob::new("hello", "/hello", secs(0), secs(1));
        assert!(ok.validate().is_ok());
        assert_eq!(ok.max_in_flight, Some(1));
        assert!(ok.clone().with_unbounded_overlap().validate().is_ok());

        let cases = [
            ScheduledJob::new("", "/hello", secs(0), secs(1)),
            ScheduledJob::new("hello", "hello", secs(0), secs(1)),
            ScheduledJob::new("hello", "/hello", secs(0), secs(0)),
            ScheduledJob::new("hello", "/hello", secs(0), secs(1)).with_max_in_flight(0),
            ScheduledJob::new("calc", "/calc", secs(0), secs(1))
                .with_params(ParamRule::RandomQuery { names: vec![], min: 1, max: 2 }),
            ScheduledJob::new("user", "/users", secs(0), secs(1))
                .with_params(ParamRule::RandomPathId { min: 5, max: 5 }),
        ];
        for job in cases {
            assert!(
                matches!(job.validate(), Err(ScheduleError::InvalidJob { .. })),
                "{:?} should be rejected",
                job
            );
        }
    }

    #[test]
    fn test_from_config() {
        let config = JobConfig {
            name: "orders".into(),
            path: "/orders".into(),
            params: ParamRule::None,
            initial_delay_ms: 10_000,
            period_ms: 15_000,
            max_in_flight: 1,
        };
        let job = ScheduledJob::try_from(&config).unwrap();
        assert_eq!(job.initial_delay, secs(10));
        assert_eq!(job.period, secs(15));
        assert_eq!(job.max_in_flight, Some(1));

        let overlapping = JobConfig { max_in_flight: 0, ..config.clone() };
        assert_eq!(ScheduledJob::try_from(&overlapping).unwrap().max_in_flight, None);

        let broken = JobConfig { period_ms: 0, ..config };
        assert!(ScheduledJob::try_from(&broken).is_err());
    }
}
