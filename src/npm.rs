use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackageManagerError {
    #[error("{program} is not available on PATH")]
    Unavailable { program: String },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("failed to run `{command}`")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse output of `{command}`")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

impl PackageManagerError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, PackageManagerError::Unavailable { .. })
    }
}

/// Queries and mutations against a global package installation.
pub trait PackageManager {
    /// Directory holding globally installed packages.
    fn global_root(&self) -> Result<PathBuf, PackageManagerError>;

    fn is_installed(&self, name: &str) -> Result<bool, PackageManagerError>;

    /// Install the given package spec globally (e.g. `pkg@latest`).
    fn install(&self, spec: &str) -> Result<(), PackageManagerError>;

    fn uninstall(&self, name: &str) -> Result<(), PackageManagerError>;
}

/// The npm CLI.
#[derive(Debug, Clone)]
pub struct Npm {
    program: OsString,
}

impl Npm {
    /// Locate `npm` on PATH (`npm.cmd` on Windows).
    pub fn new() -> Self {
        let program = which::which("npm")
            .map(PathBuf::into_os_string)
            .unwrap_or_else(|_| OsString::from("npm"));
        Self { program }
    }

    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn describe(&self, args: &[&str]) -> String {
        let mut parts = vec!["npm".to_string()];
        parts.extend(args.iter().map(|arg| arg.to_string()));
        parts.join(" ")
    }

    fn spawn_error(&self, args: &[&str], err: io::Error) -> PackageManagerError {
        if err.kind() == io::ErrorKind::NotFound {
            PackageManagerError::Unavailable {
                program: self.program.to_string_lossy().into_owned(),
            }
        } else {
            PackageManagerError::Io {
                command: self.describe(args),
                source: err,
            }
        }
    }

    fn capture(&self, args: &[&str]) -> Result<Output, PackageManagerError> {
        tracing::debug!(command = %self.describe(args), "running package manager query");
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| self.spawn_error(args, err))
    }

    fn failed(&self, args: &[&str], output: &Output) -> PackageManagerError {
        PackageManagerError::Failed {
            command: self.describe(args),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

impl Default for Npm {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageManager for Npm {
    fn global_root(&self) -> Result<PathBuf, PackageManagerError> {
        let args = ["root", "-g"];
        let output = self.capture(&args)?;
        if !output.status.success() {
            return Err(self.failed(&args, &output));
        }

        let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if root.is_empty() {
            return Err(self.failed(&args, &output));
        }
        Ok(PathBuf::from(root))
    }

    fn is_installed(&self, name: &str) -> Result<bool, PackageManagerError> {
        let args = ["ls", "-g", "--depth=0", "--json"];
        let output = self.capture(&args)?;

        // npm ls exits non-zero for unrelated tree problems but still prints the listing
        match parse_global_listing(&output.stdout) {
            Ok(listing) => Ok(listing.dependencies.contains_key(name)),
            Err(_) if !output.status.success() => Err(self.failed(&args, &output)),
            Err(source) => Err(PackageManagerError::Parse {
                command: self.describe(&args),
                source,
            }),
        }
    }

    fn install(&self, spec: &str) -> Result<(), PackageManagerError> {
        let args = ["install", "-g", spec];
        let output = self.capture(&args)?;
        if !output.status.success() {
            return Err(self.failed(&args, &output));
        }
        Ok(())
    }

    fn uninstall(&self, name: &str) -> Result<(), PackageManagerError> {
        let args = ["uninstall", "-g", name];
        tracing::debug!(command = %self.describe(&args), "running package manager uninstall");
        let status = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .map_err(|err| self.spawn_error(&args, err))?;

        if !status.success() {
            return Err(PackageManagerError::Failed {
                command: self.describe(&args),
                status: status.to_string(),
                stderr: String::new(),
            });
        }
        Ok(())
    }
}

/// Subset of a package's `package.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub bin: Option<BinField>,
}

/// `bin` is either a single script or a map of command name to script
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BinField {
    Single(String),
    Commands(BTreeMap<String, String>),
}

impl PackageManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read package manifest {:?}", path))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse package manifest {:?}", path))
    }

    /// Script path (relative to the package directory) providing `command`
    pub fn entry_point(&self, command: &str) -> Option<&str> {
        match self.bin.as_ref()? {
            BinField::Single(script) => Some(script.as_str()),
            BinField::Commands(commands) => commands.get(command).map(String::as_str),
        }
    }
}

/// Directory of `package` inside a global module root, honouring `@scope/name`
pub fn package_dir(global_root: &Path, package: &str) -> PathBuf {
    package
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(global_root.to_path_buf(), |dir, part| dir.join(part))
}

#[derive(Debug, Default, Deserialize)]
struct GlobalListing {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
}

fn parse_global_listing(stdout: &[u8]) -> Result<GlobalListing, serde_json::Error> {
    serde_json::from_slice(stdout)
}
