//! Process-local job registry.
//!
//! Jobs are keyed by UUID in a `DashMap` and are lost on restart. Reads clone
//! the job out so no map guard outlives the call.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::ops::Family;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaJob {
    pub job_id: Uuid,
    #[serde(skip)]
    pub family: Family,
    pub operation: String,
    pub status: JobStatus,
    pub result_path: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct JobStore {
    inner: Arc<DashMap<Uuid, MediaJob>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new job in `processing`.
    pub fn create(&self, family: Family, operation: &str, metadata: Value) -> MediaJob {
        let job = MediaJob {
            job_id: Uuid::new_v4(),
            family,
            operation: operation.to_string(),
            status: JobStatus::Processing,
            result_path: None,
            metadata,
            created_at: Utc::now(),
            completed_at: None,
            error: None,
        };
        self.inner.insert(job.job_id, job.clone());
        job
    }

    pub fn get(&self, job_id: Uuid) -> Option<MediaJob> {
        self.inner.get(&job_id).map(|job| job.value().clone())
    }

    /// Marks the job completed. `extra` object keys are merged into its metadata.
    pub fn complete(&self, job_id: Uuid, result_path: String, extra: Value) {
        if let Some(mut job) = self.inner.get_mut(&job_id) {
            job.status = JobStatus::Completed;
            job.result_path = Some(result_path);
            job.completed_at = Some(Utc::now());
            merge_metadata(&mut job.metadata, extra);
        }
    }

    pub fn fail(&self, job_id: Uuid, error: String) {
        if let Some(mut job) = self.inner.get_mut(&job_id) {
            job.status = JobStatus::Failed;
            job.completed_at = Some(Utc::now());
            job.error = Some(error);
        }
    }
}

fn merge_metadata(target: &mut Value, extra: Value) {
    let Value::Object(extra) = extra else {
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(fields) = target {
        fields.extend(extra);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_job_is_processing() {
        let store = JobStore::new();
        let job = store.create(Family::Audio, "echo", json!({ "file_id": "abc" }));
        let fetched = store.get(job.job_id).unwrap();
        assert_eq!(fetched.status, JobStatus::Processing);
        assert!(fetched.completed_at.is_none());
        assert!(fetched.result_path.is_none());
    }

    #[test]
    fn test_complete_merges_metadata() {
        let store = JobStore::new();
        let job = store.create(Family::Text, "statistics", json!({ "source": "upload" }));
        store.complete(job.job_id, "results/x.json".into(), json!({ "bytes": 12 }));

        let done = store.get(job.job_id).unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.result_path.as_deref(), Some("results/x.json"));
        assert_eq!(done.metadata["source"], "upload");
        assert_eq!(done.metadata["bytes"], 12);
        assert!(done.completed_at.is_some());
    }

    #[test]
    fn test_fail_records_error() {
        let store = JobStore::new();
        let job = store.create(Family::Image, "analyze", Value::Null);
        store.fail(job.job_id, "unreadable".into());

        let failed = store.get(job.job_id).unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("unreadable"));
        assert!(failed.result_path.is_none());
    }

    #[test]
    fn test_unknown_job_is_none() {
        assert!(JobStore::new().get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(json!(JobStatus::Completed), json!("completed"));
    }
}
