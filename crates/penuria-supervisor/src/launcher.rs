//! Child process launcher.
//!
//! The supervisor talks to child processes through the [`Launcher`] trait
//! so the poll loop can be exercised against a scripted launcher in tests.
//! [`ExecLauncher`] is the production implementation over
//! `tokio::process`.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::{Child, Command};

use penuria_core::ChildExit;

use crate::error::{Result, SupervisorError};

/// What to run in the isolated child process.
#[derive(Debug, Clone)]
pub struct ChildSpec {
    /// Executable to run.
    pub program: PathBuf,
    /// Command-line arguments.
    pub args: Vec<String>,
    /// Extra environment variables (inherited environment stays).
    pub env: Vec<(String, String)>,
}

impl ChildSpec {
    /// Creates a spec for the given program.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
            env: vec![],
        }
    }

    /// Appends an argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Sets an environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Non-blocking child status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildPoll {
    /// Child is still running.
    Running,
    /// Child has exited.
    Exited(ChildExit),
}

/// Adapter between the supervisor loop and actual child processes.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Handle to one spawned child.
    type Handle: Send;

    /// Spawns a child for the given spec.
    ///
    /// # Errors
    /// Returns an error if spawning fails.
    async fn spawn(&self, spec: &ChildSpec) -> Result<Self::Handle>;

    /// Checks the child's status without blocking.
    ///
    /// # Errors
    /// Returns an error if the status cannot be determined.
    async fn poll(&self, handle: &mut Self::Handle) -> Result<ChildPoll>;

    /// Force-terminates the child and reaps it.
    ///
    /// Idempotent: killing an already-dead child succeeds, so the external
    /// deadline and the in-child alarm can race without double-handling.
    ///
    /// # Errors
    /// Returns an error if termination fails.
    async fn kill(&self, handle: &mut Self::Handle) -> Result<()>;

    /// Child's OS process id, while known.
    fn pid(&self, handle: &Self::Handle) -> Option<u32>;
}

/// Production launcher over `tokio::process::Command`.
///
/// Children inherit stdout and stderr so a test body's own diagnostics
/// reach the terminal; stdin is closed. The parent adds only its one
/// progress line per case.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecLauncher;

impl ExecLauncher {
    /// Creates a new launcher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Launcher for ExecLauncher {
    type Handle = Child;

    async fn spawn(&self, spec: &ChildSpec) -> Result<Child> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| SupervisorError::spawn(format!("{}: {e}", spec.program.display())))?;

        tracing::debug!(pid = child.id(), program = %spec.program.display(), "spawned child");
        Ok(child)
    }

    async fn poll(&self, handle: &mut Child) -> Result<ChildPoll> {
        match handle.try_wait() {
            Ok(Some(status)) => Ok(ChildPoll::Exited(exit_of(status))),
            Ok(None) => Ok(ChildPoll::Running),
            Err(e) => Err(SupervisorError::poll(e.to_string())),
        }
    }

    async fn kill(&self, handle: &mut Child) -> Result<()> {
        let pid = handle.id();
        // start_kill errors when the child was already reaped; that is the
        // idempotent success case.
        if let Err(e) = handle.start_kill() {
            tracing::debug!(pid, error = %e, "kill on already-dead child");
            return Ok(());
        }
        // Reap so no zombie remains.
        handle
            .wait()
            .await
            .map_err(|e| SupervisorError::kill(e.to_string()))?;
        if let Some(pid) = pid {
            if process_exists(pid) {
                return Err(SupervisorError::kill(format!(
                    "child {pid} still visible after SIGKILL"
                )));
            }
        }
        tracing::debug!(pid, "child killed and reaped");
        Ok(())
    }

    fn pid(&self, handle: &Child) -> Option<u32> {
        handle.id()
    }
}

/// Returns true if a process with `pid` is currently visible.
///
/// Probes with the null signal; ESRCH means the process is gone. Any other
/// error leaves us unable to confirm, so the process is assumed alive.
#[cfg(unix)]
#[must_use]
pub fn process_exists(pid: u32) -> bool {
    use nix::sys::signal::kill as nix_kill;
    use nix::unistd::Pid;

    #[allow(clippy::cast_possible_wrap)] // PID from u32 fits in i32 range
    match nix_kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(nix::errno::Errno::ESRCH) => false,
        Err(_) => true,
    }
}

/// Returns true if a process with `pid` is currently visible.
///
/// No probe is available on this platform; assume gone once reaped.
#[cfg(not(unix))]
#[must_use]
pub fn process_exists(_pid: u32) -> bool {
    false
}

fn exit_of(status: std::process::ExitStatus) -> ChildExit {
    if let Some(code) = status.code() {
        return ChildExit::with_code(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ChildExit::with_signal(signal);
        }
    }
    // Neither code nor signal: treat as a generic abnormal exit.
    ChildExit::with_code(-1)
}
