use super::job::Job;
use super::retry::{RetryPolicy, retry_with_policy};
use crate::storage::StorageInstance;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Executes jobs against the store.
#[derive(Debug, Clone)]
pub struct JobRunner {
    storage: Arc<dyn StorageInstance>,
    retry_policy: RetryPolicy,
}

impl JobRunner {
    pub fn new(storage: Arc<dyn StorageInstance>, retry_policy: RetryPolicy) -> Self {
        Self {
            storage,
            retry_policy,
        }
    }

    /// One attempt, no retry.
    pub async fn execute(&self, job: &Job) -> Result<()> {
        match job {
            Job::RenameRecords {
                metric_id,
                new_name,
                version,
            } => {
                let updated = self
                    .storage
                    .rename_records(*metric_id, new_name, *version)
                    .await
                    .with_context(|| format!("Failed to run {}", job))?;
                debug!("{} updated {} records", job, updated);
                Ok(())
            }
        }
    }

    /// Runs the job with the retry policy. The final failure is logged and returned.
    pub async fn run(&self, job: Job) -> Result<()> {
        let label = job.to_string();
        retry_with_policy(&self.retry_policy, &label, |_| self.execute(&job)).await?;
        info!("{} completed", label);
        Ok(())
    }
}
