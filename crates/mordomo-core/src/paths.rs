//! Data-directory layout. Every durable file lives under one root
//! (default `~/.mordomo`) so backup and migration stay a single `cp -r`.

use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct DataDirs {
    root: PathBuf,
}

impl DataDirs {
    pub fn new(override_root: Option<&str>) -> Self {
        let root = match override_root {
            Some(p) => PathBuf::from(p),
            None => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".mordomo"),
        };
        Self { root }
    }

    /// Create every subdirectory. Called once at startup; failure is fatal.
    pub fn ensure(&self) -> Result<()> {
        for dir in [
            self.root.clone(),
            self.cron_dir(),
            self.session_dir(),
            self.memory_dir(),
            self.security_dir(),
            self.workspace_users_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join("organizer.db")
    }

    pub fn cron_dir(&self) -> PathBuf {
        self.root.join("cron")
    }

    pub fn cron_store(&self) -> PathBuf {
        self.cron_dir().join("jobs.json")
    }

    pub fn stale_removal_pending(&self) -> PathBuf {
        self.cron_dir().join("stale_removal_pending.json")
    }

    pub fn session_dir(&self) -> PathBuf {
        self.root.join("session")
    }

    pub fn memory_dir(&self) -> PathBuf {
        self.root.join("memory")
    }

    pub fn security_dir(&self) -> PathBuf {
        self.root.join("security")
    }

    pub fn blocked_commands(&self) -> PathBuf {
        self.security_dir().join("blocked_commands.json")
    }

    pub fn painpoints(&self) -> PathBuf {
        self.security_dir().join("client_painpoints.json")
    }

    pub fn workspace_users_dir(&self) -> PathBuf {
        self.root.join("workspace").join("users")
    }

    pub fn smart_reminder_sent(&self) -> PathBuf {
        self.root.join("smart_reminder_sent.json")
    }

    pub fn token_usage(&self, override_path: Option<&str>) -> PathBuf {
        match override_path {
            Some(p) => PathBuf::from(p),
            None => self.root.join("token_usage.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_creates_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = DataDirs::new(Some(tmp.path().to_str().unwrap()));
        dirs.ensure().unwrap();
        assert!(dirs.cron_dir().is_dir());
        assert!(dirs.session_dir().is_dir());
        assert!(dirs.memory_dir().is_dir());
        assert!(dirs.security_dir().is_dir());
        assert!(dirs.workspace_users_dir().is_dir());
    }
}
