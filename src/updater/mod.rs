//! Deciding whether the managed tool needs an update, and applying it.
//!
//! Both steps are best-effort: a failed check or a failed install never stops
//! the launcher from handing off to whatever version is already installed.

use anyhow::Result;

mod npm;

pub use npm::NpmUpdater;

/// "Is there something newer?" and "install it".
pub trait UpdateSource {
    fn has_update(&self) -> Result<bool>;
    fn update(&self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateDecision {
    UpToDate,
    UpdateAvailable,
    CheckFailed { reason: String },
}

/// Maps the update check onto a decision, absorbing every failure.
pub struct VersionGate<'a> {
    source: &'a dyn UpdateSource,
}

impl<'a> VersionGate<'a> {
    pub fn new(source: &'a dyn UpdateSource) -> Self {
        Self { source }
    }

    pub fn decide(&self) -> UpdateDecision {
        match self.source.has_update() {
            Ok(true) => UpdateDecision::UpdateAvailable,
            Ok(false) => UpdateDecision::UpToDate,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "update check failed");
                UpdateDecision::CheckFailed {
                    reason: format!("{err:#}"),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    Failed { reason: String },
}

/// Applies an available update without ever failing the launch.
pub struct UpdatePerformer<'a> {
    source: &'a dyn UpdateSource,
}

impl<'a> UpdatePerformer<'a> {
    pub fn new(source: &'a dyn UpdateSource) -> Self {
        Self { source }
    }

    pub fn apply(&self) -> UpdateOutcome {
        match self.source.update() {
            Ok(()) => UpdateOutcome::Updated,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "update failed, keeping installed version");
                UpdateOutcome::Failed {
                    reason: format!("{err:#}"),
                }
            }
        }
    }
}
