use std::fs;
use std::path::{Path, PathBuf};

use super::pattern::{PathPattern, PatternError};
use super::CleanupContext;

#[derive(Debug, Clone, Copy)]
enum Anchor {
    Home,
    System,
}

/// A known install location, relative to its anchor.
struct ArtifactCandidate {
    anchor: Anchor,
    path: &'static str,
    windows: bool,
}

impl ArtifactCandidate {
    fn pattern(&self, context: &CleanupContext) -> Result<PathPattern, PatternError> {
        let base = match self.anchor {
            Anchor::Home => &context.home,
            Anchor::System => &context.system_root,
        };
        // Only the table text is parsed; the anchor may contain anything
        Ok(PathPattern::parse(self.path)?.anchored_at(base))
    }
}

const KNOWN_BINARIES: &[ArtifactCandidate] = &[
    // nvm-managed Node.js installs
    ArtifactCandidate {
        anchor: Anchor::Home,
        path: ".nvm/versions/node/*/bin/claude",
        windows: false,
    },
    ArtifactCandidate {
        anchor: Anchor::Home,
        path: ".nvm/versions/node/*/bin/claude-code-updater",
        windows: false,
    },
    // npm global prefix
    ArtifactCandidate {
        anchor: Anchor::System,
        path: "usr/local/bin/claude",
        windows: false,
    },
    ArtifactCandidate {
        anchor: Anchor::System,
        path: "usr/local/bin/claude-code-updater",
        windows: false,
    },
    // npm cmd shims
    ArtifactCandidate {
        anchor: Anchor::Home,
        path: "AppData/Roaming/npm/claude.cmd",
        windows: true,
    },
    ArtifactCandidate {
        anchor: Anchor::Home,
        path: "AppData/Roaming/npm/claude-code-updater.cmd",
        windows: true,
    },
];

/// Where a global install of the shim package keeps its files
const KNOWN_PACKAGE_DIRS: &[ArtifactCandidate] = &[
    ArtifactCandidate {
        anchor: Anchor::Home,
        path: ".nvm/versions/node/*/lib/node_modules/claude-code-updater",
        windows: false,
    },
    ArtifactCandidate {
        anchor: Anchor::System,
        path: "usr/local/lib/node_modules/claude-code-updater",
        windows: false,
    },
    ArtifactCandidate {
        anchor: Anchor::Home,
        path: "AppData/Roaming/npm/node_modules/claude-code-updater",
        windows: true,
    },
];

/// Result of attempting to remove one concrete path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed,
    Absent,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRemoval {
    pub path: PathBuf,
    pub outcome: RemovalOutcome,
}

impl ArtifactRemoval {
    pub fn removed(&self) -> bool {
        self.outcome == RemovalOutcome::Removed
    }
}

/// What a scan of known locations finds on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactScan {
    pub present: Vec<PathBuf>,
    pub errors: Vec<String>,
}

pub struct ArtifactLocator<'a> {
    context: &'a CleanupContext,
}

impl<'a> ArtifactLocator<'a> {
    pub fn new(context: &'a CleanupContext) -> Self {
        Self { context }
    }

    /// Binary locations for the context's platform, one entry per table row
    pub fn candidates(&self) -> Vec<Result<PathPattern, PatternError>> {
        self.patterns(KNOWN_BINARIES)
    }

    /// Remove every known binary that exists; each path is attempted independently
    pub fn remove_known_binaries(&self) -> Vec<ArtifactRemoval> {
        let mut removals = Vec::new();

        for candidate in self.candidates() {
            match candidate {
                Ok(pattern) => removals.extend(remove_pattern(&pattern)),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping invalid binary location");
                    removals.push(ArtifactRemoval {
                        path: err.path().to_path_buf(),
                        outcome: RemovalOutcome::Failed(err.to_string()),
                    });
                }
            }
        }

        removals
    }

    /// Binaries still on disk
    pub fn scan(&self) -> ArtifactScan {
        scan_patterns(self.patterns(KNOWN_BINARIES))
    }

    /// Global package directories of the shim still on disk
    pub fn scan_package_dirs(&self) -> ArtifactScan {
        scan_patterns(self.patterns(KNOWN_PACKAGE_DIRS))
    }

    fn patterns(&self, table: &[ArtifactCandidate]) -> Vec<Result<PathPattern, PatternError>> {
        let windows = self.context.platform.is_windows();
        table
            .iter()
            .filter(|candidate| candidate.windows == windows)
            .map(|candidate| candidate.pattern(self.context))
            .collect()
    }
}

fn scan_patterns(patterns: Vec<Result<PathPattern, PatternError>>) -> ArtifactScan {
    let mut scan = ArtifactScan::default();
    for pattern in patterns {
        let pattern = match pattern {
            Ok(pattern) => pattern,
            Err(err) => {
                scan.errors.push(err.to_string());
                continue;
            }
        };
        match pattern.expand() {
            Ok(paths) => scan
                .present
                .extend(paths.into_iter().filter(|path| is_present(path))),
            Err(err) => scan
                .errors
                .push(format!("could not list {}: {err}", pattern.display())),
        }
    }
    scan
}

/// Remove the concrete paths behind a pattern, never stopping early
fn remove_pattern(pattern: &PathPattern) -> Vec<ArtifactRemoval> {
    match pattern.expand() {
        Ok(paths) => paths.iter().map(|path| remove_path(path)).collect(),
        Err(err) => {
            tracing::warn!(pattern = %pattern.display(), error = %err, "could not expand pattern");
            vec![ArtifactRemoval {
                path: PathBuf::from(pattern.display()),
                outcome: RemovalOutcome::Failed(err.to_string()),
            }]
        }
    }
}

fn remove_path(path: &Path) -> ArtifactRemoval {
    let outcome = if !is_present(path) {
        RemovalOutcome::Absent
    } else {
        match fs::remove_file(path) {
            Ok(()) => {
                tracing::info!(path = ?path, "removed binary");
                RemovalOutcome::Removed
            }
            Err(err) => {
                tracing::warn!(path = ?path, error = %err, "could not remove binary");
                RemovalOutcome::Failed(err.to_string())
            }
        }
    };

    ArtifactRemoval {
        path: path.to_path_buf(),
        outcome,
    }
}

/// Dangling symlinks count as present
fn is_present(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
