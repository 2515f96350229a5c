// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sizing knobs for the job system.

use serde::{Deserialize, Serialize};

use crate::error::JobError;

/// Fixed sizes of the worker pool and its arenas.
///
/// Everything is allocated once in [`crate::JobSystem::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Maximum number of jobs ever created on the system.
    pub job_capacity: usize,
    /// Number of completion tokens that may be outstanding at once.
    pub token_capacity: usize,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            job_capacity: 64,
            token_capacity: 8,
        }
    }
}

impl JobsConfig {
    /// Rejects zero-sized pools.
    ///
    /// # Errors
    /// [`JobError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), JobError> {
        if self.workers == 0 {
            return Err(JobError::InvalidConfig("workers must be > 0"));
        }
        if self.job_capacity == 0 {
            return Err(JobError::InvalidConfig("job_capacity must be > 0"));
        }
        if self.job_capacity > u32::MAX as usize {
            return Err(JobError::InvalidConfig("job_capacity must fit in u32"));
        }
        if self.token_capacity == 0 {
            return Err(JobError::InvalidConfig("token_capacity must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: JobsConfig = serde_json::from_str(r#"{ "workers": 2 }"#).expect("valid json");
        assert_eq!(cfg.workers, 2);
        assert_eq!(cfg.job_capacity, JobsConfig::default().job_capacity);
    }

    #[test]
    fn zero_sizes_are_rejected() {
        let cfg = JobsConfig {
            workers: 0,
            ..JobsConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(JobError::InvalidConfig(_))));
        assert!(JobsConfig::default().validate().is_ok());
    }
}
