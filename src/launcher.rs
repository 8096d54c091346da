//! Update check followed by hand-off to the managed tool.
//!
//! `Start -> [VersionGate -> UpdatePerformer] -> DelegateResolver -> ProcessDelegate`.
//! The bracketed steps never fail the launch; only resolution and spawn errors do.

use std::ffi::OsString;

use crate::delegate::{Delegate, DelegateError, DelegateResolver};
use crate::tool::ManagedToolReference;
use crate::ui;
use crate::updater::{UpdateDecision, UpdateOutcome, UpdatePerformer, UpdateSource, VersionGate};

/// Exit status the process should end with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOutcome {
    pub exit_code: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    pub check_for_updates: bool,
    pub args: Vec<OsString>,
}

pub struct Launcher<'a> {
    tool: &'a ManagedToolReference,
    updates: &'a dyn UpdateSource,
    resolver: &'a DelegateResolver<'a>,
    delegate: &'a dyn Delegate,
}

impl<'a> Launcher<'a> {
    pub fn new(
        tool: &'a ManagedToolReference,
        updates: &'a dyn UpdateSource,
        resolver: &'a DelegateResolver<'a>,
        delegate: &'a dyn Delegate,
    ) -> Self {
        Self {
            tool,
            updates,
            resolver,
            delegate,
        }
    }

    pub fn run(&self, options: &LaunchOptions) -> Result<LaunchOutcome, DelegateError> {
        if options.check_for_updates {
            self.check_and_update();
        } else {
            tracing::debug!("update check skipped");
        }

        let target = self.resolver.resolve(self.tool)?;
        let exit_code = self.delegate.run(&target, &options.args)?;
        Ok(LaunchOutcome { exit_code })
    }

    fn check_and_update(&self) {
        let progress = ui::Progress::new("Checking", "for Claude Code updates");

        match VersionGate::new(self.updates).decide() {
            UpdateDecision::UpToDate => {
                progress.success("Current", Some("(Claude Code is up to date)".to_string()));
            }
            UpdateDecision::CheckFailed { reason } => {
                progress.warn("Skipped", "update check failed, proceeding with current version");
                ui::detail(reason);
            }
            UpdateDecision::UpdateAvailable => {
                progress.success("Found", Some("(a newer version is available)".to_string()));
                let progress = ui::Progress::new("Updating", "Claude Code");
                match UpdatePerformer::new(self.updates).apply() {
                    UpdateOutcome::Updated => progress.success("Updated", None),
                    UpdateOutcome::Failed { reason } => {
                        progress.warn("Skipped", "update failed, proceeding with current version");
                        ui::detail(reason);
                    }
                }
            }
        }
    }
}
