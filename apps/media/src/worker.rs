//! Background execution of media jobs.
//!
//! The request handler registers the job and returns; the transform runs on
//! the blocking pool and its result is written under the results directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::jobs::JobStore;
use crate::ops::{self, Family};
use crate::storage::Storage;

#[derive(Debug, Clone)]
pub struct JobSpec {
    pub job_id: Uuid,
    pub family: Family,
    pub operation: String,
    pub parameters: Value,
    pub source: Option<PathBuf>,
}

/// Fire-and-forget. The job record is the only place the outcome lands.
pub fn spawn_job(storage: Storage, jobs: JobStore, spec: JobSpec) {
    tokio::spawn(async move {
        let job_id = spec.job_id;
        match execute(&storage, spec).await {
            Ok((path, metadata)) => {
                info!(%job_id, path = %path.display(), "media job completed");
                jobs.complete(job_id, path.display().to_string(), metadata);
            }
            Err(e) => {
                warn!(%job_id, "media job failed: {e:#}");
                jobs.fail(job_id, format!("{e:#}"));
            }
        }
    });
}

async fn execute(storage: &Storage, spec: JobSpec) -> Result<(PathBuf, Value)> {
    let source = match &spec.source {
        Some(path) => Some(
            tokio::fs::read(path)
                .await
                .with_context(|| format!("reading {}", path.display()))?,
        ),
        None => None,
    };

    let JobSpec {
        job_id,
        family,
        operation,
        parameters,
        ..
    } = spec;
    let output = tokio::task::spawn_blocking(move || {
        ops::run(family, &operation, &parameters, source.as_deref())
    })
    .await
    .context("media operation panicked")??;

    let path = storage
        .write_result(job_id, output.extension, &output.bytes)
        .await
        .context("writing job result")?;
    Ok((path, output.metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobStatus;
    use serde_json::json;
    use std::time::Duration;

    async fn wait_for(jobs: &JobStore, job_id: Uuid) -> JobStatus {
        for _ in 0..200 {
            let status = jobs.get(job_id).map(|j| j.status);
            if let Some(status @ (JobStatus::Completed | JobStatus::Failed)) = status {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        JobStatus::Processing
    }

    #[tokio::test]
    async fn test_job_completes_and_writes_result() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path());
        let jobs = JobStore::new();
        let job = jobs.create(Family::Text, "sentiment", json!({}));

        spawn_job(
            storage,
            jobs.clone(),
            JobSpec {
                job_id: job.job_id,
                family: Family::Text,
                operation: "sentiment".into(),
                parameters: json!({ "text": "a great result" }),
                source: None,
            },
        );

        assert_eq!(wait_for(&jobs, job.job_id).await, JobStatus::Completed);
        let done = jobs.get(job.job_id).unwrap();
        let path = done.result_path.unwrap();
        assert!(path.ends_with(".json"));
        assert!(tokio::fs::metadata(&path).await.is_ok());
        assert_eq!(done.metadata["text_length"], 14);
    }

    #[tokio::test]
    async fn test_bad_input_marks_job_failed() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = JobStore::new();
        let job = jobs.create(Family::Audio, "speech", json!({}));

        spawn_job(
            Storage::new(dir.path()),
            jobs.clone(),
            JobSpec {
                job_id: job.job_id,
                family: Family::Audio,
                operation: "speech".into(),
                parameters: json!({}),
                source: None,
            },
        );

        assert_eq!(wait_for(&jobs, job.job_id).await, JobStatus::Failed);
        assert!(jobs.get(job.job_id).unwrap().error.is_some());
    }
}
