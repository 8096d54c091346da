//! Best-effort removal of everything the shim installed, followed by a
//! verification pass.
//!
//! Steps run in a fixed order and each one absorbs its own failures:
//! `uninstall -> binaries -> aliases -> user data -> verify`.

pub mod aliases;
pub mod artifacts;
pub mod pattern;
pub mod user_data;
pub mod verify;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::npm::PackageManager;
use crate::tool::{ManagedToolReference, SHIM_PACKAGE};
use crate::ui;
use crate::util::{paths, Platform};

pub use aliases::{AliasScrubber, ScrubOutcome, ScrubReport, ScrubRules, ShellDialect};
pub use artifacts::{ArtifactLocator, ArtifactRemoval, RemovalOutcome};
pub use pattern::{PathPattern, PatternError};
pub use user_data::{UserDataManager, UserDataOutcome, UserDataPolicy};
pub use verify::{CleanupCheckResult, CleanupVerifier, Verification};

/// Commands printed when automatic cleanup cannot finish on its own.
pub const MANUAL_INSTRUCTIONS: &str = "\
1. Remove npm package:
   npm uninstall -g claude-code-updater --force

2. Remove binary files:
   rm -f ~/.nvm/versions/node/*/bin/claude
   rm -f ~/.nvm/versions/node/*/bin/claude-code-updater
   sudo rm -f /usr/local/bin/claude
   sudo rm -f /usr/local/bin/claude-code-updater

3. Remove aliases from shell config files:
   Edit ~/.bashrc, ~/.bash_profile, ~/.zshrc
   Remove lines containing \"claude-code-updater\" or \"alias claude=\"

4. Remove user data (optional):
   rm -rf ~/.claude-code-updater

5. Restart your terminal";

/// Filesystem anchors every cleanup step works relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupContext {
    pub home: PathBuf,
    /// Prefix for absolute system locations such as `/usr/local/bin`
    pub system_root: PathBuf,
    pub platform: Platform,
}

impl CleanupContext {
    pub fn detect() -> Result<Self> {
        Ok(Self {
            home: paths::home_dir()?,
            system_root: paths::system_root(),
            platform: Platform::current(),
        })
    }

    pub fn user_data_dir(&self) -> PathBuf {
        paths::user_data_dir(&self.home)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallOutcome {
    Uninstalled,
    NotInstalled,
    Unavailable,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanupOptions {
    pub user_data: UserDataPolicy,
    /// Print every path touched, not just totals
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub uninstall: UninstallOutcome,
    pub removals: Vec<ArtifactRemoval>,
    pub scrubs: Vec<ScrubReport>,
    pub user_data: UserDataOutcome,
    pub verification: Verification,
}

impl CleanupReport {
    pub fn all_clean(&self) -> bool {
        self.verification.all_clean()
    }

    /// Files and directories this run deleted or rewrote
    pub fn files_modified(&self) -> usize {
        let removed = self.removals.iter().filter(|r| r.removed()).count();
        let scrubbed = self.scrubs.iter().filter(|s| s.modified()).count();
        let user_data = usize::from(self.user_data == UserDataOutcome::Removed);
        removed + scrubbed + user_data
    }
}

pub struct Cleanup<'a> {
    context: &'a CleanupContext,
    package_manager: &'a dyn PackageManager,
    package: &'a str,
    rules: ScrubRules,
}

impl<'a> Cleanup<'a> {
    pub fn new(
        context: &'a CleanupContext,
        package_manager: &'a dyn PackageManager,
        tool: &ManagedToolReference,
    ) -> Result<Self> {
        let rules = ScrubRules::for_command(tool.local_command())
            .context("Failed to build shell config rules")?;
        Ok(Self {
            context,
            package_manager,
            package: SHIM_PACKAGE,
            rules,
        })
    }

    /// Run every step, then verify.
    ///
    /// `confirm` is asked before user data is removed under
    /// [`UserDataPolicy::Ask`]. Every step runs whatever the earlier ones did.
    pub fn run<F>(&self, options: &CleanupOptions, confirm: F) -> CleanupReport
    where
        F: FnOnce(&Path) -> Option<bool>,
    {
        let uninstall = self.uninstall_package();
        let removals = self.remove_binaries(options.verbose);
        let scrubs = self.scrub_aliases(options.verbose);
        let user_data = self.handle_user_data(options.user_data, confirm);

        let verification =
            CleanupVerifier::new(self.context, self.package_manager, self.package, &self.rules)
                .verify();

        CleanupReport {
            uninstall,
            removals,
            scrubs,
            user_data,
            verification,
        }
    }

    fn uninstall_package(&self) -> UninstallOutcome {
        let progress = ui::Progress::new("Uninstalling", format!("npm package {}", self.package));

        match self.package_manager.is_installed(self.package) {
            Ok(false) => {
                progress.success("Skipped", Some("(not installed)".to_string()));
                return UninstallOutcome::NotInstalled;
            }
            Err(err) if err.is_unavailable() => {
                progress.warn("Skipped", "npm not available");
                return UninstallOutcome::Unavailable;
            }
            Err(err) => {
                // Still try the uninstall; the query may fail where the mutation works
                tracing::debug!(error = %err, "could not query installed packages");
            }
            Ok(true) => {}
        }

        match self.package_manager.uninstall(self.package) {
            Ok(()) => {
                progress.success("Uninstalled", None);
                UninstallOutcome::Uninstalled
            }
            Err(err) if err.is_unavailable() => {
                progress.warn("Skipped", "npm not available");
                UninstallOutcome::Unavailable
            }
            Err(err) => {
                progress.warn("Failed", format!("{err}, continuing"));
                UninstallOutcome::Failed(err.to_string())
            }
        }
    }

    fn remove_binaries(&self, verbose: bool) -> Vec<ArtifactRemoval> {
        let progress = ui::Progress::new("Removing", "binary files");
        let removals = ArtifactLocator::new(self.context).remove_known_binaries();

        let removed = removals.iter().filter(|r| r.removed()).count();
        let failed: Vec<_> = removals
            .iter()
            .filter_map(|r| match &r.outcome {
                RemovalOutcome::Failed(reason) => Some((r.path.as_path(), reason.as_str())),
                _ => None,
            })
            .collect();

        if failed.is_empty() {
            progress.success("Removed", Some(format!("({removed} removed)")));
        } else {
            progress.warn("Partial", format!("{} could not be removed", failed.len()));
            for (path, reason) in &failed {
                ui::detail(format!("{}: {reason}", path.display()));
            }
        }

        if verbose {
            for removal in removals.iter().filter(|r| r.removed()) {
                ui::detail(format!("removed {}", removal.path.display()));
            }
        }

        removals
    }

    fn scrub_aliases(&self, verbose: bool) -> Vec<ScrubReport> {
        let progress = ui::Progress::new("Cleaning", "shell configuration");
        let scrubs =
            AliasScrubber::new(self.context, self.rules.clone()).scrub_shell_configs();

        let modified = scrubs.iter().filter(|s| s.modified()).count();
        let failed: Vec<_> = scrubs
            .iter()
            .filter_map(|s| match &s.outcome {
                ScrubOutcome::Failed(reason) => Some((s.file.as_path(), reason.as_str())),
                _ => None,
            })
            .collect();

        if failed.is_empty() {
            progress.success("Cleaned", Some(format!("({modified} files updated)")));
        } else {
            progress.warn("Partial", format!("{} files could not be updated", failed.len()));
            for (file, reason) in &failed {
                ui::detail(format!("{}: {reason}", file.display()));
            }
        }

        if verbose {
            for scrub in scrubs.iter().filter(|s| s.modified()) {
                ui::detail(format!("updated {}", scrub.file.display()));
            }
        }

        scrubs
    }

    fn handle_user_data<F>(&self, policy: UserDataPolicy, confirm: F) -> UserDataOutcome
    where
        F: FnOnce(&Path) -> Option<bool>,
    {
        let manager = UserDataManager::new(self.context.user_data_dir());
        let outcome = manager.apply(policy, confirm);

        match &outcome {
            UserDataOutcome::Removed => {
                ui::success("Removed", format!("user data {}", manager.path().display()))
            }
            UserDataOutcome::Preserved => {
                ui::info(format!("User data preserved at {}", manager.path().display()));
                ui::detail("Run with --clean to remove it");
            }
            UserDataOutcome::NotFound => tracing::debug!(path = ?manager.path(), "no user data"),
            UserDataOutcome::Failed(reason) => ui::warn(format!(
                "Could not remove user data {}: {reason}",
                manager.path().display()
            )),
        }

        outcome
    }
}
