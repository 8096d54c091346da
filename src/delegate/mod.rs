//! Locating the managed tool's executable and handing the process over to it.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

mod process;
mod resolve;

pub use process::ProcessDelegate;
pub use resolve::DelegateResolver;

/// Program to spawn plus the arguments that precede the user's own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateTarget {
    pub executable_path: PathBuf,
    pub invocation_args: Vec<OsString>,
}

impl DelegateTarget {
    pub fn new(executable_path: impl Into<PathBuf>) -> Self {
        Self {
            executable_path: executable_path.into(),
            invocation_args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.invocation_args.push(arg.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum DelegateError {
    #[error("Could not find {package}. Please install it first with: {install_hint}")]
    NotFound {
        package: String,
        install_hint: String,
    },

    #[error("Failed to start {program:?}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed while waiting for the delegated process")]
    Wait(#[source] io::Error),

    #[error("Failed to start the process runtime")]
    Runtime(#[source] io::Error),
}

/// Runs a resolved target to completion and reports its exit code.
pub trait Delegate {
    fn run(&self, target: &DelegateTarget, args: &[OsString]) -> Result<i32, DelegateError>;
}
