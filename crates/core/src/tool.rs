//! External tool adapter
//!
//! Every collaborator (gpg, tar, git, diff, find, the pager) is run through
//! [`ToolRunner`] as a program plus an argument list. Arguments never pass
//! through a shell, so paths with spaces or quotes need no escaping.

use crate::error::ToolError;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

/// One external program call
#[derive(Debug, Clone)]
pub struct Invocation {
    program: String,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    accepted_codes: Vec<i32>,
}

impl Invocation {
    /// Start an invocation of `program`
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            accepted_codes: vec![0],
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    /// Run with a working directory
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Treat an additional exit status as success (diff exits 1 on differences)
    pub fn accept_exit_code(mut self, code: i32) -> Self {
        if !self.accepted_codes.contains(&code) {
            self.accepted_codes.push(code);
        }
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arg_list(&self) -> &[OsString] {
        &self.args
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    fn check(&self, code: i32, stderr: &str) -> Result<(), ToolError> {
        if self.accepted_codes.contains(&code) {
            Ok(())
        } else {
            Err(ToolError::Exit {
                program: self.program.clone(),
                code,
                stderr: stderr.trim().to_string(),
            })
        }
    }
}

/// Captured result of a finished invocation
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit status (-1 when killed by a signal)
    pub code: i32,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl ToolOutput {
    /// Stdout decoded lossily
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Non-empty stdout lines
    pub fn lines(&self) -> Vec<String> {
        self.stdout_str()
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Runs external programs one at a time, optionally bounded by a timeout
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolRunner {
    timeout: Option<Duration>,
}

impl ToolRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Run and capture stdout/stderr; fails on an unaccepted exit status
    pub async fn output(&self, inv: &Invocation) -> Result<ToolOutput, ToolError> {
        tracing::debug!(program = %inv.program, args = ?inv.args, "running external tool");

        let mut child = inv
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolError::Spawn {
                program: inv.program.clone(),
                source,
            })?;

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();

        let run = async {
            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            // Drain both pipes concurrently so neither can fill and block the child
            let read_out = async {
                if let Some(out) = stdout_pipe.as_mut() {
                    out.read_to_end(&mut stdout).await?;
                }
                Ok::<_, std::io::Error>(())
            };
            let read_err = async {
                if let Some(err) = stderr_pipe.as_mut() {
                    err.read_to_end(&mut stderr).await?;
                }
                Ok::<_, std::io::Error>(())
            };
            let (out_res, err_res) = tokio::join!(read_out, read_err);
            out_res?;
            err_res?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status.code().unwrap_or(-1), stdout, stderr))
        };

        let (code, stdout, stderr) = self
            .bounded(inv, run)
            .await?
            .map_err(|source| ToolError::Spawn {
                program: inv.program.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&stderr).into_owned();
        inv.check(code, &stderr)?;

        Ok(ToolOutput { code, stdout, stderr })
    }

    /// Run with `input` streamed to stdin and stdout/stderr inherited
    pub async fn feed(&self, inv: &Invocation, input: &[u8]) -> Result<(), ToolError> {
        tracing::debug!(program = %inv.program, bytes = input.len(), "streaming into external tool");

        let spawn_err = |source| ToolError::Spawn {
            program: inv.program.clone(),
            source,
        };

        let mut child = inv.command().stdin(Stdio::piped()).spawn().map_err(spawn_err)?;

        if let Some(mut stdin) = child.stdin.take() {
            // A pager quitting early closes the pipe; that is not a failure
            match stdin.write_all(input).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(spawn_err(e)),
            }
            drop(stdin);
        }

        let status = child.wait().await.map_err(spawn_err)?;
        inv.check(status.code().unwrap_or(-1), "")
    }

    async fn bounded<F, T>(&self, inv: &Invocation, fut: F) -> Result<T, ToolError>
    where
        F: std::future::Future<Output = T>,
    {
        match self.timeout {
            Some(after) => tokio::time::timeout(after, fut).await.map_err(|_| {
                tracing::warn!(program = %inv.program, "external tool timed out");
                ToolError::Timeout {
                    program: inv.program.clone(),
                    after,
                }
            }),
            None => Ok(fut.await),
        }
    }
}
