use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::{DelegateError, DelegateTarget};
use crate::npm::{package_dir, PackageManager, PackageManifest};
use crate::tool::ManagedToolReference;

/// Finds the managed tool, first on the command search path and then through
/// the package manager's global module root.
pub struct DelegateResolver<'a> {
    package_manager: &'a dyn PackageManager,
    search_path: Option<OsString>,
    current_exe: Option<PathBuf>,
}

impl<'a> DelegateResolver<'a> {
    pub fn new(package_manager: &'a dyn PackageManager) -> Self {
        Self {
            package_manager,
            search_path: env::var_os("PATH"),
            current_exe: env::current_exe().ok(),
        }
    }

    /// Search `path` instead of the inherited `PATH`
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    pub fn resolve(&self, tool: &ManagedToolReference) -> Result<DelegateTarget, DelegateError> {
        if let Some(target) = self.resolve_direct(tool) {
            tracing::debug!(path = ?target.executable_path, "resolved on search path");
            return Ok(target);
        }

        match self.resolve_global_module(tool) {
            Ok(target) => {
                tracing::debug!(
                    path = ?target.executable_path,
                    args = ?target.invocation_args,
                    "resolved through global module root"
                );
                Ok(target)
            }
            Err(err) => {
                tracing::debug!(error = %format!("{err:#}"), "global module resolution failed");
                Err(DelegateError::NotFound {
                    package: tool.registry_name().to_string(),
                    install_hint: tool.install_hint(),
                })
            }
        }
    }

    fn resolve_direct(&self, tool: &ManagedToolReference) -> Option<DelegateTarget> {
        let cwd = env::current_dir().unwrap_or_default();
        let candidates =
            which::which_in_all(tool.local_command(), self.search_path.as_ref(), cwd).ok()?;

        candidates
            .into_iter()
            .find(|candidate| !self.is_self(candidate))
            .map(DelegateTarget::new)
    }

    /// The launcher may itself be installed under the tool's name
    fn is_self(&self, candidate: &Path) -> bool {
        let Some(current) = &self.current_exe else {
            return false;
        };
        match (fs::canonicalize(candidate), fs::canonicalize(current)) {
            (Ok(candidate), Ok(current)) => candidate == current,
            _ => false,
        }
    }

    fn resolve_global_module(&self, tool: &ManagedToolReference) -> Result<DelegateTarget> {
        let root = self
            .package_manager
            .global_root()
            .context("Failed to query the global module root")?;

        let package = package_dir(&root, tool.registry_name());
        let manifest_path = package.join("package.json");
        if !manifest_path.is_file() {
            bail!("Package not found in global modules at {:?}", package);
        }

        let manifest = PackageManifest::load(&manifest_path)?;
        let entry = manifest.entry_point(tool.local_command()).ok_or_else(|| {
            anyhow!(
                "{:?} declares no executable for '{}'",
                manifest_path,
                tool.local_command()
            )
        })?;

        let script = package.join(entry);
        if !script.is_file() {
            bail!("Executable entry point {:?} does not exist", script);
        }

        Ok(DelegateTarget::new(self.node()).with_arg(script))
    }

    fn node(&self) -> PathBuf {
        let cwd = env::current_dir().unwrap_or_default();
        which::which_in("node", self.search_path.as_ref(), cwd)
            .unwrap_or_else(|_| PathBuf::from("node"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npm::PackageManagerError;
    use tempfile::TempDir;

    struct FixedRoot(Option<PathBuf>);

    impl PackageManager for FixedRoot {
        fn global_root(&self) -> Result<PathBuf, PackageManagerError> {
            self.0.clone().ok_or(PackageManagerError::Unavailable {
                program: "npm".to_string(),
            })
        }

        fn is_installed(&self, _name: &str) -> Result<bool, PackageManagerError> {
            Ok(false)
        }

        fn install(&self, _spec: &str) -> Result<(), PackageManagerError> {
            Ok(())
        }

        fn uninstall(&self, _name: &str) -> Result<(), PackageManagerError> {
            Ok(())
        }
    }

    fn install_package(root: &Path, bin: &str, create_script: bool) -> PathBuf {
        let package = root.join("@anthropic-ai").join("claude-code");
        fs::create_dir_all(&package).unwrap();
        fs::write(
            package.join("package.json"),
            format!(r#"{{"name":"@anthropic-ai/claude-code","version":"1.0.0","bin":{bin}}}"#),
        )
        .unwrap();
        let script = package.join("cli.js");
        if create_script {
            fs::write(&script, "#!/usr/bin/env node\n").unwrap();
        }
        script
    }

    #[cfg(unix)]
    fn install_executable(dir: &Path, name: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_direct_strategy_wins() {
        let bin = TempDir::new().unwrap();
        let claude = install_executable(bin.path(), "claude");
        let npm = FixedRoot(None);

        let target = DelegateResolver::new(&npm)
            .with_search_path(bin.path())
            .resolve(&ManagedToolReference::claude_code())
            .unwrap();

        assert_eq!(target, DelegateTarget::new(claude));
    }

    #[test]
    fn test_falls_back_to_global_module() {
        let empty_path = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        let script = install_package(root.path(), r#"{"claude":"cli.js"}"#, true);
        let npm = FixedRoot(Some(root.path().to_path_buf()));

        let target = DelegateResolver::new(&npm)
            .with_search_path(empty_path.path())
            .resolve(&ManagedToolReference::claude_code())
            .unwrap();

        assert_eq!(target.executable_path, PathBuf::from("node"));
        assert_eq!(target.invocation_args, vec![script.into_os_string()]);
    }

    #[test]
    fn test_single_bin_manifest() {
        let empty_path = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        let script = install_package(root.path(), r#""cli.js""#, true);
        let npm = FixedRoot(Some(root.path().to_path_buf()));

        let target = DelegateResolver::new(&npm)
            .with_search_path(empty_path.path())
            .resolve(&ManagedToolReference::claude_code())
            .unwrap();

        assert_eq!(target.invocation_args, vec![script.into_os_string()]);
    }

    #[test]
    fn test_not_found_when_both_strategies_fail() {
        let empty_path = TempDir::new().unwrap();
        let npm = FixedRoot(None);

        let err = DelegateResolver::new(&npm)
            .with_search_path(empty_path.path())
            .resolve(&ManagedToolReference::claude_code())
            .unwrap_err();

        assert!(matches!(err, DelegateError::NotFound { .. }));
        assert!(err
            .to_string()
            .contains("npm i -g @anthropic-ai/claude-code"));
    }

    #[test]
    fn test_not_found_when_manifest_missing() {
        let empty_path = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        let npm = FixedRoot(Some(root.path().to_path_buf()));

        let err = DelegateResolver::new(&npm)
            .with_search_path(empty_path.path())
            .resolve(&ManagedToolReference::claude_code())
            .unwrap_err();
        assert!(matches!(err, DelegateError::NotFound { .. }));
    }

    #[test]
    fn test_not_found_when_entry_point_missing() {
        let empty_path = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        install_package(root.path(), r#"{"claude":"cli.js"}"#, false);
        let npm = FixedRoot(Some(root.path().to_path_buf()));

        let err = DelegateResolver::new(&npm)
            .with_search_path(empty_path.path())
            .resolve(&ManagedToolReference::claude_code())
            .unwrap_err();
        assert!(matches!(err, DelegateError::NotFound { .. }));
    }

    #[test]
    fn test_not_found_when_bin_names_other_command() {
        let empty_path = TempDir::new().unwrap();
        let root = TempDir::new().unwrap();
        install_package(root.path(), r#"{"other":"cli.js"}"#, true);
        let npm = FixedRoot(Some(root.path().to_path_buf()));

        let err = DelegateResolver::new(&npm)
            .with_search_path(empty_path.path())
            .resolve(&ManagedToolReference::claude_code())
            .unwrap_err();
        assert!(matches!(err, DelegateError::NotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_skips_own_executable() {
        let bin = TempDir::new().unwrap();
        let claude = install_executable(bin.path(), "claude");
        let npm = FixedRoot(None);

        let mut resolver = DelegateResolver::new(&npm).with_search_path(bin.path());
        resolver.current_exe = Some(claude);

        let err = resolver
            .resolve(&ManagedToolReference::claude_code())
            .unwrap_err();
        assert!(matches!(err, DelegateError::NotFound { .. }));
    }
}
