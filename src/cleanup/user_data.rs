use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Whether the user data directory may be deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDataPolicy {
    Keep,
    /// Ask first; a non-interactive session counts as consent
    Ask,
    Remove,
}

impl UserDataPolicy {
    /// `--force` removes without asking; `--clean` alone asks
    pub fn from_flags(clean: bool, force: bool) -> Self {
        match (clean, force) {
            (_, true) => UserDataPolicy::Remove,
            (true, false) => UserDataPolicy::Ask,
            (false, false) => UserDataPolicy::Keep,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserDataOutcome {
    Removed,
    Preserved,
    NotFound,
    Failed(String),
}

pub struct UserDataManager {
    path: PathBuf,
}

impl UserDataManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.symlink_metadata().is_ok()
    }

    /// Apply `policy`; `confirm` is only consulted for [`UserDataPolicy::Ask`]
    pub fn apply<F>(&self, policy: UserDataPolicy, confirm: F) -> UserDataOutcome
    where
        F: FnOnce(&Path) -> Option<bool>,
    {
        if !self.exists() {
            return UserDataOutcome::NotFound;
        }

        let remove = match policy {
            UserDataPolicy::Keep => false,
            UserDataPolicy::Remove => true,
            UserDataPolicy::Ask => confirm(&self.path).unwrap_or(true),
        };

        if !remove {
            tracing::debug!(path = ?self.path, "preserving user data");
            return UserDataOutcome::Preserved;
        }

        match self.remove() {
            Ok(()) => {
                tracing::info!(path = ?self.path, "removed user data");
                UserDataOutcome::Removed
            }
            Err(err) => {
                tracing::warn!(path = ?self.path, error = %err, "could not remove user data");
                UserDataOutcome::Failed(err.to_string())
            }
        }
    }

    fn remove(&self) -> io::Result<()> {
        let metadata = self.path.symlink_metadata()?;
        if metadata.is_dir() {
            fs::remove_dir_all(&self.path)
        } else {
            fs::remove_file(&self.path)
        }
    }
}
