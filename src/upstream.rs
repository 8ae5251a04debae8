//! Engine process launcher
//!
//! Spawns the pose-estimation engine with its stdout piped and exposes that
//! stdout as the line source for [`RelayServer::run`](crate::RelayServer::run).
//! The child is killed when the [`EngineProcess`] is dropped.

use std::ffi::OsStr;
use std::process::{ExitStatus, Stdio};

use tokio::io::BufReader;
use tokio::process::{Child, ChildStdout, Command};

use crate::error::{Error, Result};

/// Buffer size for the engine's stdout
const STDOUT_BUFFER_SIZE: usize = 4096;

/// A running engine
#[derive(Debug)]
pub struct EngineProcess {
    child: Child,
    stdout: Option<BufReader<ChildStdout>>,
}

impl EngineProcess {
    /// Spawn `program` with `args`
    ///
    /// Stdin is closed and stderr is inherited so engine diagnostics still
    /// reach the terminal.
    pub fn spawn<I, S>(program: impl AsRef<OsStr>, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(program);
        command.args(args);
        Self::from_command(command)
    }

    /// Spawn a prepared command, overriding its stdio and drop behavior
    pub fn from_command(mut command: Command) -> Result<Self> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = command.spawn()?;
        let stdout = child.stdout.take().ok_or(Error::UpstreamClosed)?;

        tracing::info!(pid = child.id(), "Engine started");

        Ok(Self {
            child,
            stdout: Some(BufReader::with_capacity(STDOUT_BUFFER_SIZE, stdout)),
        })
    }

    /// OS process id, if the child has not been reaped
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Take the buffered stdout
    ///
    /// Returns `None` if it was already taken.
    pub fn take_stdout(&mut self) -> Option<BufReader<ChildStdout>> {
        self.stdout.take()
    }

    /// Kill the engine and wait for it to exit
    pub async fn kill(&mut self) -> Result<()> {
        self.child.kill().await?;
        tracing::info!("Engine stopped");
        Ok(())
    }

    /// Wait for the engine to exit on its own
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        let status = self.child.wait().await?;
        tracing::info!(status = %status, "Engine exited");
        Ok(status)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use tokio::io::AsyncBufReadExt;

    use super::*;

    #[tokio::test]
    async fn test_stdout_lines() {
        let mut engine =
            EngineProcess::spawn("sh", ["-c", "printf 'new frame\\n[End]\\n'"]).unwrap();
        let mut lines = engine.take_stdout().unwrap().lines();

        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("new frame"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("[End]"));
        assert_eq!(lines.next_line().await.unwrap(), None);

        assert!(engine.wait().await.unwrap().success());
    }

    #[tokio::test]
    async fn test_stdout_taken_once() {
        let mut engine = EngineProcess::spawn("sh", ["-c", "true"]).unwrap();
        assert!(engine.take_stdout().is_some());
        assert!(engine.take_stdout().is_none());
        engine.wait().await.unwrap();
    }

    #[tokio::test]
    async fn test_kill_running_engine() {
        let mut engine = EngineProcess::spawn("sleep", ["30"]).unwrap();
        assert!(engine.id().is_some());
        engine.kill().await.unwrap();
        assert!(engine.id().is_none());
    }

    #[test]
    fn test_missing_program() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let _guard = runtime.enter();
        let result = EngineProcess::spawn("pose-relay-no-such-engine", std::iter::empty::<&str>());
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
