use std::ffi::OsString;
use std::io;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

use super::{Delegate, DelegateError, DelegateTarget};
use crate::tool::ManagedToolReference;

/// Spawns the managed tool with inherited stdio and relays termination
/// signals to it until it exits.
pub struct ProcessDelegate {
    tool: ManagedToolReference,
}

impl ProcessDelegate {
    pub fn new(tool: ManagedToolReference) -> Self {
        Self { tool }
    }

    async fn run_child(
        &self,
        target: &DelegateTarget,
        args: &[OsString],
    ) -> Result<ExitStatus, DelegateError> {
        // Subscribed before spawn; signals that arrive meanwhile queue for the child
        let mut forwarder = SignalForwarder::subscribe().map_err(DelegateError::Runtime)?;

        let mut child = Command::new(&target.executable_path)
            .args(&target.invocation_args)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|err| self.spawn_error(target, err))?;

        tracing::debug!(pid = ?child.id(), program = ?target.executable_path, "delegated");

        forwarder.attach(child.id());
        loop {
            tokio::select! {
                status = child.wait() => return status.map_err(DelegateError::Wait),
                Some(signal) = forwarder.recv() => forwarder.forward(signal),
            }
        }
    }

    fn spawn_error(&self, target: &DelegateTarget, err: io::Error) -> DelegateError {
        if err.kind() == io::ErrorKind::NotFound {
            DelegateError::NotFound {
                package: self.tool.registry_name().to_string(),
                install_hint: self.tool.install_hint(),
            }
        } else {
            DelegateError::Spawn {
                program: target.executable_path.clone(),
                source: err,
            }
        }
    }
}

impl Delegate for ProcessDelegate {
    fn run(&self, target: &DelegateTarget, args: &[OsString]) -> Result<i32, DelegateError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(DelegateError::Runtime)?;

        let status = runtime.block_on(self.run_child(target, args))?;
        Ok(exit_code(status))
    }
}

/// Child's exit code, or 0 when it reported none (e.g. killed by a signal)
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(0)
}

#[cfg(unix)]
mod forward {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    use std::io;
    use tokio::signal::unix::{signal, Signal as Listener, SignalKind};

    pub(super) struct SignalForwarder {
        pid: Option<Pid>,
        interrupt: Listener,
        terminate: Listener,
    }

    impl SignalForwarder {
        pub(super) fn subscribe() -> io::Result<Self> {
            Ok(Self {
                pid: None,
                interrupt: signal(SignalKind::interrupt())?,
                terminate: signal(SignalKind::terminate())?,
            })
        }

        /// Relay queued and future signals to `pid`
        pub(super) fn attach(&mut self, pid: Option<u32>) {
            self.pid = pid.and_then(|pid| i32::try_from(pid).ok()).map(Pid::from_raw);
        }

        pub(super) async fn recv(&mut self) -> Option<Signal> {
            tokio::select! {
                received = self.interrupt.recv() => received.map(|()| Signal::SIGINT),
                received = self.terminate.recv() => received.map(|()| Signal::SIGTERM),
            }
        }

        pub(super) fn forward(&self, signal: Signal) {
            let Some(pid) = self.pid else {
                return;
            };
            tracing::debug!(%signal, %pid, "forwarding signal");
            if let Err(err) = kill(pid, signal) {
                // ESRCH: the child exited between the signal and the relay
                tracing::debug!(%signal, error = %err, "could not forward signal");
            }
        }
    }
}

#[cfg(not(unix))]
mod forward {
    use std::io;

    /// Console interrupts already reach the child; holding the listener keeps
    /// them from terminating the launcher first.
    pub(super) struct SignalForwarder;

    impl SignalForwarder {
        pub(super) fn subscribe() -> io::Result<Self> {
            Ok(Self)
        }

        pub(super) fn attach(&mut self, _pid: Option<u32>) {}

        pub(super) async fn recv(&mut self) -> Option<()> {
            tokio::signal::ctrl_c().await.ok()
        }

        pub(super) fn forward(&self, _signal: ()) {}
    }
}

use forward::SignalForwarder;

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use nix::sys::signal::{raise, Signal};
    use std::fs;
    use std::os::unix::process::ExitStatusExt;
    use tempfile::TempDir;

    fn shell(script: &str) -> DelegateTarget {
        DelegateTarget::new("/bin/sh")
            .with_arg("-c")
            .with_arg(script)
            .with_arg("sh")
    }

    fn delegate() -> ProcessDelegate {
        ProcessDelegate::new(ManagedToolReference::claude_code())
    }

    #[test]
    fn test_propagates_exit_code() {
        let code = delegate().run(&shell("exit 7"), &[]).unwrap();
        assert_eq!(code, 7);
    }

    #[test]
    fn test_success_exit_code() {
        let code = delegate().run(&shell("exit 0"), &[]).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_signal_death_defaults_to_zero() {
        let code = delegate().run(&shell("kill -9 $$"), &[]).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_forwards_arguments_in_order() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("args.txt");
        let script = format!("printf '%s\\n' \"$@\" > '{}'", out.display());

        let args = [OsString::from("-p"), OsString::from("hello world")];
        delegate().run(&shell(&script), &args).unwrap();

        assert_eq!(fs::read_to_string(out).unwrap(), "-p\nhello world\n");
    }

    #[test]
    fn test_missing_executable_is_not_found() {
        let temp = TempDir::new().unwrap();
        let target = DelegateTarget::new(temp.path().join("claude"));

        let err = delegate().run(&target, &[]).unwrap_err();
        assert!(matches!(err, DelegateError::NotFound { .. }));
        assert!(err.to_string().contains("npm i -g @anthropic-ai/claude-code"));
    }

    #[test]
    fn test_other_spawn_failures_propagate() {
        let temp = TempDir::new().unwrap();
        let not_executable = temp.path().join("claude");
        fs::write(&not_executable, "plain text").unwrap();

        let err = delegate()
            .run(&DelegateTarget::new(not_executable), &[])
            .unwrap_err();
        assert!(matches!(err, DelegateError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_forward_without_child_is_noop() {
        let forwarder = SignalForwarder::subscribe().unwrap();
        forwarder.forward(Signal::SIGTERM);
    }

    #[tokio::test]
    async fn test_signal_before_spawn_reaches_child() {
        let mut forwarder = SignalForwarder::subscribe().unwrap();
        raise(Signal::SIGTERM).unwrap();

        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        forwarder.attach(child.id());

        let signal = forwarder.recv().await.unwrap();
        assert_eq!(signal, Signal::SIGTERM);
        forwarder.forward(signal);

        let status = child.wait().await.unwrap();
        assert_eq!(status.signal(), Some(Signal::SIGTERM as i32));
    }
}
