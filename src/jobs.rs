use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::error::{DubError, Result};
use crate::outcome::Degradation;

/// Final artifact; its presence marks a job as completed
pub const DUBBED_VIDEO_FILE: &str = "dubbed_video.mp4";
/// Assembled dubbed audio track
pub const FINAL_AUDIO_FILE: &str = "final_audio.wav";
/// Downloaded video-only stream
pub const VIDEO_FILE: &str = "video.mp4";
/// Serialized `DubbingReport`
pub const REPORT_FILE: &str = "report.json";
/// Serialized `JobFailure`; written when a job ends without its output
pub const FAILURE_FILE: &str = "failure.json";

/// One dubbing request and its isolated working directory
#[derive(Debug, Clone)]
pub struct Job {
    pub id: Uuid,
    pub work_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Completed { output_path: PathBuf },
}

/// Summary of a finished job, persisted next to its artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DubbingReport {
    pub job_id: Uuid,
    pub video_id: String,
    pub target_language: String,
    pub output_path: PathBuf,
    pub transcript_segment_count: usize,
    pub translation_error_count: usize,
    pub clip_count: usize,
    pub degradations: Vec<Degradation>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Why a job stopped before producing its output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    pub job_id: Uuid,
    pub video_id: String,
    pub target_language: String,
    pub error: String,
    pub cancelled: bool,
    pub failed_at: DateTime<Utc>,
}

/// A job directory found under the store root
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub id: Uuid,
    pub work_dir: PathBuf,
    pub status: JobStatus,
    /// Present when the job ended without its output
    pub failure: Option<JobFailure>,
}

impl JobSummary {
    pub fn is_failed(&self) -> bool {
        self.failure.is_some() && !matches!(self.status, JobStatus::Completed { .. })
    }
}

/// Owns the directory that holds one sub-directory per job.
/// Job directories are never removed by the store.
pub struct JobStore {
    root: PathBuf,
}

impl JobStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Issue a new job id and create its directory
    pub async fn create(&self) -> Result<Job> {
        let id = Uuid::new_v4();
        let work_dir = self.root.join(id.to_string());
        tokio::fs::create_dir_all(&work_dir).await?;
        info!("Created job {} in {}", id, work_dir.display());
        Ok(Job { id, work_dir })
    }

    /// Status of a job, keyed only on whether the final artifact exists
    pub fn status(&self, job_id: &str) -> Result<JobStatus> {
        let id = Uuid::parse_str(job_id.trim())
            .map_err(|_| DubError::InvalidInput(format!("'{}' is not a valid job id", job_id)))?;
        Ok(status_of(&self.root.join(id.to_string())))
    }

    /// Every job directory under the root, oldest first
    pub fn list(&self) -> Result<Vec<JobSummary>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()))
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_dir() {
                continue;
            }
            let Some(id) = entry.file_name().to_str().and_then(|n| Uuid::parse_str(n).ok()) else {
                debug!("Skipping non-job directory {}", entry.path().display());
                continue;
            };
            let failure = match read_json(&entry.path().join(FAILURE_FILE)) {
                Ok(failure) => failure,
                Err(e) => {
                    warn!("Unreadable failure record for job {}: {}", id, e);
                    None
                }
            };
            found.push(JobSummary {
                id,
                work_dir: entry.path().to_path_buf(),
                status: status_of(entry.path()),
                failure,
            });
        }
        Ok(found)
    }

    pub async fn write_report(&self, job: &Job, report: &DubbingReport) -> Result<PathBuf> {
        let path = job.work_dir.join(REPORT_FILE);
        let content = serde_json::to_string_pretty(report)?;
        tokio::fs::write(&path, content).await?;
        debug!("Report written to {}", path.display());
        Ok(path)
    }

    pub fn read_report(&self, id: &Uuid) -> Result<Option<DubbingReport>> {
        read_json(&self.root.join(id.to_string()).join(REPORT_FILE))
    }

    /// Mark a job as failed; the directory and any partial artifacts stay
    pub async fn write_failure(&self, job: &Job, failure: &JobFailure) -> Result<PathBuf> {
        let path = job.work_dir.join(FAILURE_FILE);
        let content = serde_json::to_string_pretty(failure)?;
        tokio::fs::write(&path, content).await?;
        info!("Job {} marked failed: {}", job.id, failure.error);
        Ok(path)
    }

    pub fn read_failure(&self, id: &Uuid) -> Result<Option<JobFailure>> {
        read_json(&self.root.join(id.to_string()).join(FAILURE_FILE))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&content)?))
}

fn status_of(work_dir: &Path) -> JobStatus {
    let output_path = work_dir.join(DUBBED_VIDEO_FILE);
    if output_path.is_file() {
        JobStatus::Completed { output_path }
    } else {
        JobStatus::Processing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[tokio::test]
    async fn test_status_follows_final_artifact() {
        let root = assert_fs::TempDir::new().unwrap();
        let store = JobStore::new(root.path());
        let job = store.create().await.unwrap();
        assert!(job.work_dir.is_dir());

        let id = job.id.to_string();
        assert_eq!(store.status(&id).unwrap(), JobStatus::Processing);

        std::fs::write(job.work_dir.join(DUBBED_VIDEO_FILE), b"video").unwrap();
        let first = store.status(&id).unwrap();
        let second = store.status(&id).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            JobStatus::Completed { output_path: job.work_dir.join(DUBBED_VIDEO_FILE) }
        );
    }

    #[test]
    fn test_malformed_job_id_is_invalid_input() {
        let store = JobStore::new("downloads");
        assert!(matches!(store.status("../etc"), Err(DubError::InvalidInput(_))));
        assert!(matches!(store.status(""), Err(DubError::InvalidInput(_))));
    }

    #[test]
    fn test_unknown_job_is_processing() {
        let store = JobStore::new("downloads");
        let status = store.status(&Uuid::new_v4().to_string()).unwrap();
        assert_eq!(status, JobStatus::Processing);
    }

    #[tokio::test]
    async fn test_list_skips_foreign_entries() {
        let root = assert_fs::TempDir::new().unwrap();
        root.child("not-a-job").create_dir_all().unwrap();
        root.child("notes.txt").write_str("hello").unwrap();

        let store = JobStore::new(root.path());
        assert!(store.list().unwrap().is_empty());

        let job = store.create().await.unwrap();
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, job.id);
        assert_eq!(listed[0].status, JobStatus::Processing);

        assert!(JobStore::new(root.path().join("missing")).list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_round_trips_through_disk() {
        let root = assert_fs::TempDir::new().unwrap();
        let store = JobStore::new(root.path());
        let job = store.create().await.unwrap();

        let now = Utc::now();
        let report = DubbingReport {
            job_id: job.id,
            video_id: "dQw4w9WgXcQ".to_string(),
            target_language: "spanish".to_string(),
            output_path: job.work_dir.join(DUBBED_VIDEO_FILE),
            transcript_segment_count: 3,
            translation_error_count: 1,
            clip_count: 3,
            degradations: vec![Degradation::GapFillerSkipped { count: 1 }],
            started_at: now,
            finished_at: now,
        };
        store.write_report(&job, &report).await.unwrap();

        let loaded = store.read_report(&job.id).unwrap().unwrap();
        assert_eq!(loaded.video_id, "dQw4w9WgXcQ");
        assert_eq!(loaded.degradations, report.degradations);
        assert!(store.read_report(&Uuid::new_v4()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failure_record_marks_listed_job_failed() {
        let root = assert_fs::TempDir::new().unwrap();
        let store = JobStore::new(root.path());
        let failed = store.create().await.unwrap();
        let running = store.create().await.unwrap();

        let failure = JobFailure {
            job_id: failed.id,
            video_id: "dQw4w9WgXcQ".to_string(),
            target_language: "german".to_string(),
            error: "Job was cancelled".to_string(),
            cancelled: true,
            failed_at: Utc::now(),
        };
        store.write_failure(&failed, &failure).await.unwrap();

        assert_eq!(store.read_failure(&failed.id).unwrap(), Some(failure));
        assert!(store.read_failure(&running.id).unwrap().is_none());

        let listed = store.list().unwrap();
        let summary = |id: Uuid| listed.iter().find(|j| j.id == id).unwrap();
        assert!(summary(failed.id).is_failed());
        assert!(!summary(running.id).is_failed());
        // status stays keyed on the final artifact
        assert_eq!(store.status(&failed.id.to_string()).unwrap(), JobStatus::Processing);
    }

    #[tokio::test]
    async fn test_corrupt_failure_record_is_skipped_in_listing() {
        let root = assert_fs::TempDir::new().unwrap();
        let store = JobStore::new(root.path());
        let job = store.create().await.unwrap();
        std::fs::write(job.work_dir.join(FAILURE_FILE), b"{not json").unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].failure.is_none());
        assert!(store.read_failure(&job.id).is_err());
    }
}
