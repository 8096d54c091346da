use std::fmt::Write as _;
use std::path::PathBuf;

use super::aliases::{AliasScrubber, ScrubRules};
use super::artifacts::ArtifactLocator;
use super::CleanupContext;
use crate::npm::PackageManager;

pub const PACKAGE_CHECK: &str = "npm package";
pub const BINARY_CHECK: &str = "binary files";
pub const ALIAS_CHECK: &str = "shell aliases";

/// One verification dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupCheckResult {
    pub target_name: String,
    pub clean: bool,
    pub message: String,
}

impl CleanupCheckResult {
    fn clean(target_name: &str, message: impl Into<String>) -> Self {
        Self {
            target_name: target_name.to_string(),
            clean: true,
            message: message.into(),
        }
    }

    fn dirty(target_name: &str, message: impl Into<String>) -> Self {
        Self {
            target_name: target_name.to_string(),
            clean: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub results: Vec<CleanupCheckResult>,
}

impl Verification {
    pub fn all_clean(&self) -> bool {
        self.results.iter().all(|result| result.clean)
    }
}

pub struct CleanupVerifier<'a> {
    context: &'a CleanupContext,
    package_manager: &'a dyn PackageManager,
    package: &'a str,
    rules: &'a ScrubRules,
}

impl<'a> CleanupVerifier<'a> {
    pub fn new(
        context: &'a CleanupContext,
        package_manager: &'a dyn PackageManager,
        package: &'a str,
        rules: &'a ScrubRules,
    ) -> Self {
        Self {
            context,
            package_manager,
            package,
            rules,
        }
    }

    /// Run every check; none of them short-circuits the others
    pub fn verify(&self) -> Verification {
        Verification {
            results: vec![self.check_package(), self.check_binaries(), self.check_aliases()],
        }
    }

    fn check_package(&self) -> CleanupCheckResult {
        match self.package_manager.is_installed(self.package) {
            Ok(false) => CleanupCheckResult::clean(PACKAGE_CHECK, "not installed"),
            Ok(true) => CleanupCheckResult::dirty(
                PACKAGE_CHECK,
                format!("{} is still installed globally", self.package),
            ),
            Err(err) if err.is_unavailable() => self.check_package_dirs(),
            Err(err) => {
                tracing::debug!(error = %err, "package query failed");
                CleanupCheckResult::dirty(PACKAGE_CHECK, format!("could not verify: {err}"))
            }
        }
    }

    /// Without npm, look for the package where a global install would have put it
    fn check_package_dirs(&self) -> CleanupCheckResult {
        let scan = ArtifactLocator::new(self.context).scan_package_dirs();

        if !scan.present.is_empty() {
            return CleanupCheckResult::dirty(
                PACKAGE_CHECK,
                format!(
                    "npm not available, package files remain: {}",
                    join_paths(&scan.present)
                ),
            );
        }
        if !scan.errors.is_empty() {
            return CleanupCheckResult::dirty(
                PACKAGE_CHECK,
                format!("could not verify: {}", scan.errors.join("; ")),
            );
        }
        CleanupCheckResult::clean(PACKAGE_CHECK, "npm not available, no package files found")
    }

    fn check_binaries(&self) -> CleanupCheckResult {
        let scan = ArtifactLocator::new(self.context).scan();

        if !scan.present.is_empty() {
            return CleanupCheckResult::dirty(
                BINARY_CHECK,
                format!("still present: {}", join_paths(&scan.present)),
            );
        }

        if !scan.errors.is_empty() {
            return CleanupCheckResult::dirty(BINARY_CHECK, scan.errors.join("; "));
        }

        CleanupCheckResult::clean(BINARY_CHECK, "none found")
    }

    fn check_aliases(&self) -> CleanupCheckResult {
        let scan = AliasScrubber::new(self.context, self.rules.clone()).scan();

        if scan.dirty.is_empty() && scan.errors.is_empty() {
            return CleanupCheckResult::clean(ALIAS_CHECK, "none found");
        }

        let mut message = String::new();
        if !scan.dirty.is_empty() {
            let _ = write!(message, "still referenced in: {}", join_paths(&scan.dirty));
        }
        for error in &scan.errors {
            if !message.is_empty() {
                message.push_str("; ");
            }
            message.push_str(error);
        }
        CleanupCheckResult::dirty(ALIAS_CHECK, message)
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::tests::FakeNpm;
    use crate::tool::SHIM_PACKAGE;
    use crate::util::Platform;
    use std::fs;
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> CleanupContext {
        CleanupContext {
            home: temp.path().join("home"),
            system_root: temp.path().join("root"),
            platform: Platform::Linux,
        }
    }

    fn verify(ctx: &CleanupContext, npm: &FakeNpm) -> Verification {
        let rules = ScrubRules::for_command("claude").unwrap();
        CleanupVerifier::new(ctx, npm, SHIM_PACKAGE, &rules).verify()
    }

    fn result<'v>(verification: &'v Verification, name: &str) -> &'v CleanupCheckResult {
        verification
            .results
            .iter()
            .find(|result| result.target_name == name)
            .unwrap()
    }

    #[test]
    fn test_empty_system_is_clean() {
        let temp = TempDir::new().unwrap();
        let verification = verify(&context(&temp), &FakeNpm::default());

        assert_eq!(verification.results.len(), 3);
        assert!(verification.all_clean());
    }

    #[test]
    fn test_installed_package_is_dirty() {
        let temp = TempDir::new().unwrap();
        let npm = FakeNpm::with_installed(&[SHIM_PACKAGE]);
        let verification = verify(&context(&temp), &npm);

        assert!(!result(&verification, PACKAGE_CHECK).clean);
        assert!(result(&verification, BINARY_CHECK).clean);
        assert!(!verification.all_clean());
    }

    #[test]
    fn test_missing_npm_without_package_files_is_clean() {
        let temp = TempDir::new().unwrap();
        let verification = verify(&context(&temp), &FakeNpm::unavailable());

        let package = result(&verification, PACKAGE_CHECK);
        assert!(package.clean);
        assert!(package.message.starts_with("npm not available"));
    }

    #[test]
    fn test_missing_npm_with_package_files_is_dirty() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let package = ctx
            .home
            .join(".nvm/versions/node/v20.1.0/lib/node_modules/claude-code-updater");
        fs::create_dir_all(&package).unwrap();
        fs::write(package.join("package.json"), "{}").unwrap();

        let verification = verify(&ctx, &FakeNpm::unavailable());

        let check = result(&verification, PACKAGE_CHECK);
        assert!(!check.clean);
        assert!(check.message.contains("v20.1.0"));
        assert!(!verification.all_clean());
    }

    #[test]
    fn test_failed_query_is_not_clean() {
        let temp = TempDir::new().unwrap();
        let verification = verify(&context(&temp), &FakeNpm::broken());

        let package = result(&verification, PACKAGE_CHECK);
        assert!(!package.clean);
        assert!(package.message.starts_with("could not verify"));
    }

    #[test]
    fn test_leftover_binary_is_dirty() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        let bin = ctx.home.join(".nvm/versions/node/v20.0.0/bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("claude"), "").unwrap();

        let verification = verify(&ctx, &FakeNpm::default());

        let binaries = result(&verification, BINARY_CHECK);
        assert!(!binaries.clean);
        assert!(binaries.message.contains("v20.0.0"));
        assert!(!verification.all_clean());
    }

    #[test]
    fn test_alias_residue_is_dirty() {
        let temp = TempDir::new().unwrap();
        let ctx = context(&temp);
        fs::create_dir_all(&ctx.home).unwrap();
        fs::write(ctx.home.join(".zshrc"), "alias claude=\"claude-code-updater\"\n").unwrap();

        let verification = verify(&ctx, &FakeNpm::default());

        assert!(!result(&verification, ALIAS_CHECK).clean);
        assert!(result(&verification, PACKAGE_CHECK).clean);
        assert!(!verification.all_clean());
    }
}
