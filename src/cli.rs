use clap::Parser;
use std::ffi::OsString;

/// Control flag consumed by the launcher; never forwarded.
pub const SKIP_UPDATE_FLAG: &str = "--skip-update";

/// Launcher arguments.
///
/// Deliberately not a clap parser: everything except `--skip-update` belongs
/// to Claude Code, including `--help` and `--version`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchArgs {
    pub skip_update: bool,
    pub forwarded: Vec<OsString>,
}

impl LaunchArgs {
    /// Split raw arguments (without the program name)
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut parsed = Self::default();
        for arg in args.into_iter().map(Into::into) {
            if arg == SKIP_UPDATE_FLAG {
                parsed.skip_update = true;
            } else {
                parsed.forwarded.push(arg);
            }
        }
        parsed
    }
}

/// Claude Code Updater - Complete Cleanup Tool
///
/// Uninstalls the npm package, removes leftover binaries and shell aliases,
/// optionally removes user data, then verifies that nothing is left behind.
#[derive(Parser, Debug)]
#[command(name = "claude-code-updater-cleanup", author, version, about, long_about)]
pub struct CleanupCli {
    /// Remove user data (~/.claude-code-updater) as well
    #[arg(long, visible_alias = "purge")]
    pub clean: bool,

    /// Force removal without prompts
    #[arg(short, long)]
    pub force: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
