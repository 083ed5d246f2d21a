//! Durable JSON cron store with atomic writes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, info};

use crate::error::{Result, SchedulerError};
use crate::types::{CronJob, CronStoreFile};

pub struct CronStore {
    path: PathBuf,
    jobs: Mutex<Vec<CronJob>>,
}

impl CronStore {
    /// Load `cron/jobs.json`. A missing file starts empty; an unreadable
    /// file is fatal — silently dropping every user's reminders is worse
    /// than refusing to start.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let jobs = if path.exists() {
            let raw = fs::read_to_string(&path)
                .map_err(|e| SchedulerError::StoreUnreadable(e.to_string()))?;
            let file: CronStoreFile = serde_json::from_str(&raw)
                .map_err(|e| SchedulerError::StoreUnreadable(e.to_string()))?;
            info!(jobs = file.jobs.len(), "cron store loaded");
            file.jobs
        } else {
            Vec::new()
        };
        Ok(Self { path, jobs: Mutex::new(jobs) })
    }

    /// Run `f` over the job list and persist afterwards when it returns
    /// `true`. All mutation goes through here so the file on disk never
    /// diverges from memory.
    pub fn with_jobs_mut<R>(&self, f: impl FnOnce(&mut Vec<CronJob>) -> (R, bool)) -> Result<R> {
        let mut jobs = self.jobs.lock().unwrap();
        let (out, dirty) = f(&mut jobs);
        if dirty {
            self.persist(&jobs)?;
        }
        Ok(out)
    }

    pub fn snapshot(&self) -> Vec<CronJob> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn get(&self, id: &str) -> Option<CronJob> {
        self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned()
    }

    fn persist(&self, jobs: &[CronJob]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = CronStoreFile { version: 1, jobs: jobs.to_vec() };
        let raw = serde_json::to_string(&file)?;
        atomic_write(&self.path, raw.as_bytes())?;
        debug!(jobs = jobs.len(), "cron store persisted");
        Ok(())
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CronPayload, CronState, Schedule};

    fn job(id: &str) -> CronJob {
        CronJob {
            id: id.to_string(),
            name: id.to_string(),
            enabled: true,
            schedule: Schedule::At { at_ms: 1 },
            payload: CronPayload::default(),
            state: CronState::default(),
            created_at_ms: 0,
            updated_at_ms: 0,
            delete_after_run: true,
        }
    }

    #[test]
    fn roundtrip_through_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cron").join("jobs.json");
        let store = CronStore::load(&path).unwrap();
        store
            .with_jobs_mut(|jobs| {
                jobs.push(job("AB"));
                ((), true)
            })
            .unwrap();

        let reloaded = CronStore::load(&path).unwrap();
        assert_eq!(reloaded.snapshot().len(), 1);
        assert_eq!(reloaded.get("AB").unwrap().id, "AB");
    }

    #[test]
    fn corrupt_store_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("jobs.json");
        fs::write(&path, b"{broken").unwrap();
        assert!(matches!(
            CronStore::load(&path),
            Err(SchedulerError::StoreUnreadable(_))
        ));
    }

    #[test]
    fn create_then_remove_restores_store() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("jobs.json");
        let store = CronStore::load(&path).unwrap();
        let before = fs::read_to_string(&path).unwrap_or_default();
        store
            .with_jobs_mut(|jobs| {
                jobs.push(job("XY"));
                ((), true)
            })
            .unwrap();
        store
            .with_jobs_mut(|jobs| {
                jobs.retain(|j| j.id != "XY");
                ((), true)
            })
            .unwrap();
        let after = fs::read_to_string(&path).unwrap();
        let parsed: CronStoreFile = serde_json::from_str(&after).unwrap();
        assert!(parsed.jobs.is_empty());
        // Either both empty-store serialisations match or the original never existed
        if !before.is_empty() {
            assert_eq!(before, after);
        }
    }
}
