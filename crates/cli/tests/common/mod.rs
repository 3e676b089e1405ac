//! Test projects and a runner for the cellar binary
//!
//! Projects are configured with `cp` as the crypto tool and `cat` as the
//! pager, so every command runs unattended without key material.

#![allow(dead_code)]

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const CONFIG: &str = r#"scratch_dir = "scratch"

[tools]
encrypt = ["cp", "{input}", "{output}"]
decrypt = ["cp", "{input}", "{output}"]
pager = "cat"
"#;

/// Temporary cellar project with automatic cleanup
pub struct TestProject {
    temp_dir: TempDir,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().context("Failed to create temp directory")?;
        fs::write(temp_dir.path().join("cellar.toml"), CONFIG)?;
        fs::create_dir_all(temp_dir.path().join("private"))?;
        Ok(Self { temp_dir })
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn private_dir(&self) -> PathBuf {
        self.root().join("private")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.root().join("archives")
    }

    pub fn write_private(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.private_dir().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", relative))?;
        Ok(())
    }

    pub fn read_private(&self, relative: &str) -> Result<String> {
        Ok(fs::read_to_string(self.private_dir().join(relative))?)
    }

    /// Fill the private directory with deterministic text files
    ///
    /// Returns the relative paths written, sorted.
    pub fn generate_private(&self, seed: u64, count: usize) -> Result<Vec<String>> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut written = Vec::with_capacity(count);

        for i in 0..count {
            let dir = ["", "keys/", "notes/"][rng.gen_range(0..3)];
            let relative = format!("{}file_{:03}.txt", dir, i);
            let len = rng.gen_range(16..512);
            let content: String = (0..len)
                .map(|_| rng.gen_range(b'a'..=b'z') as char)
                .collect();
            self.write_private(&relative, &content)?;
            written.push(relative);
        }

        written.sort();
        Ok(written)
    }

    /// Archive file names on disk, newest first
    pub fn archive_names(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.archive_dir())
            .map(|d| {
                d.filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort_by(|a, b| b.cmp(a));
        names
    }

    pub fn scratch_is_clean(&self) -> bool {
        fs::read_dir(self.root().join("scratch"))
            .map(|mut d| d.next().is_none())
            .unwrap_or(true)
    }

    pub fn git(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.root())
            .output()
            .context("Failed to run git")?;
        if !output.status.success() {
            anyhow::bail!("git {:?} failed: {}", args, String::from_utf8_lossy(&output.stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    pub fn git_init(&self) -> Result<()> {
        self.git(&["init", "-q"])?;
        self.git(&["config", "user.name", "Cellar Test"])?;
        self.git(&["config", "user.email", "test@example.com"])?;
        self.git(&["config", "commit.gpgsign", "false"])?;
        Ok(())
    }
}

/// Builder for one invocation of the cellar binary
pub struct CellarCommand {
    cwd: PathBuf,
    args: Vec<String>,
    stdin: Option<String>,
}

/// Captured output of a finished invocation
#[derive(Debug)]
pub struct CommandResult {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CellarCommand {
    pub fn new(cwd: &Path) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn stdin(mut self, input: &str) -> Self {
        self.stdin = Some(input.to_string());
        self
    }

    pub fn run(self) -> Result<CommandResult> {
        let mut child = Command::new(env!("CARGO_BIN_EXE_cellar"))
            .args(&self.args)
            .current_dir(&self.cwd)
            .env_remove("CELLAR_ROOT")
            .env_remove("RUST_LOG")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn cellar")?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Some(input) = &self.stdin {
                stdin.write_all(input.as_bytes())?;
            }
        }

        let output: Output = child.wait_with_output()?;
        Ok(CommandResult {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    pub fn assert_success(self) -> Result<CommandResult> {
        let args = self.args.join(" ");
        let result = self.run()?;
        if result.code != Some(0) {
            anyhow::bail!(
                "cellar {} failed ({:?})\nstdout:\n{}\nstderr:\n{}",
                args,
                result.code,
                result.stdout,
                result.stderr
            );
        }
        Ok(result)
    }

    pub fn assert_failure(self) -> Result<CommandResult> {
        let args = self.args.join(" ");
        let result = self.run()?;
        if result.code != Some(1) {
            anyhow::bail!(
                "cellar {} should have exited 1, got {:?}\nstdout:\n{}",
                args,
                result.code,
                result.stdout
            );
        }
        Ok(result)
    }
}

/// True if a usable git binary is on PATH
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
