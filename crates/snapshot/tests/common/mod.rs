//! Test project fixtures
//!
//! Projects use `cp` as the crypto tool so archives are plain tarballs and
//! no key material is needed. Real `tar`, `diff`, `find` and `git` run.

#![allow(dead_code)]

use anyhow::{Context, Result};
use cellar_core::{Catalog, Config, ConfigFile, ToolsConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Temporary cellar project with automatic cleanup
pub struct TestProject {
    temp_dir: TempDir,
    pub config: Config,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        Self::with_tools(|_| {})
    }

    /// Create a project, letting the caller adjust tool settings
    pub fn with_tools(adjust: impl FnOnce(&mut ToolsConfig)) -> Result<Self> {
        let temp_dir = TempDir::new().context("Failed to create temp directory")?;
        let config = build_config(temp_dir.path(), adjust)?;
        fs::create_dir_all(&config.private_dir)?;
        fs::create_dir_all(&config.archive_dir)?;

        Ok(Self { temp_dir, config })
    }

    /// Swap tool settings while keeping the project on disk
    pub fn reconfigure(&mut self, adjust: impl FnOnce(&mut ToolsConfig)) -> Result<()> {
        self.config = build_config(self.temp_dir.path(), adjust)?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a file under the private directory
    pub fn write_private(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.config.private_dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {}", relative))?;
        Ok(())
    }

    pub fn read_private(&self, relative: &str) -> Result<String> {
        Ok(fs::read_to_string(self.config.private_dir.join(relative))?)
    }

    /// Put an arbitrary file into the archive directory
    pub fn write_archive(&self, name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.config.archive_path(name);
        fs::write(&path, content)?;
        Ok(path)
    }

    pub async fn catalog(&self) -> Catalog {
        Catalog::load(&self.config).await
    }

    /// Number of files in the archive directory
    pub fn archive_count(&self) -> usize {
        fs::read_dir(&self.config.archive_dir)
            .map(|d| d.count())
            .unwrap_or(0)
    }

    /// Scratch workspaces still on disk
    pub fn leftover_scratch(&self) -> Vec<PathBuf> {
        fs::read_dir(&self.config.scratch_dir)
            .map(|d| d.filter_map(|e| e.ok()).map(|e| e.path()).collect())
            .unwrap_or_default()
    }

    /// Initialise a git repository at the project root
    pub fn git_init(&self) -> Result<()> {
        self.git(&["init", "-q"])?;
        self.git(&["config", "user.name", "Cellar Test"])?;
        self.git(&["config", "user.email", "test@example.com"])?;
        self.git(&["config", "commit.gpgsign", "false"])?;
        Ok(())
    }

    /// Commit everything staged
    pub fn git_commit(&self, message: &str) -> Result<()> {
        self.git(&["commit", "-q", "-m", message])?;
        Ok(())
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
}

fn build_config(root: &Path, adjust: impl FnOnce(&mut ToolsConfig)) -> Result<Config> {
    let mut tools = ToolsConfig {
        encrypt: passthrough(),
        decrypt: passthrough(),
        ..ToolsConfig::default()
    };
    adjust(&mut tools);

    let file = ConfigFile {
        scratch_dir: Some(PathBuf::from("scratch")),
        tools,
        ..ConfigFile::default()
    };
    Ok(Config::from_file(root, file)?)
}

/// `cp {input} {output}` in place of real encryption
pub fn passthrough() -> Vec<String> {
    vec!["cp".to_string(), "{input}".to_string(), "{output}".to_string()]
}

/// A command template that always fails
pub fn failing() -> Vec<String> {
    vec!["false".to_string()]
}

/// True if a usable git binary is on PATH
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
