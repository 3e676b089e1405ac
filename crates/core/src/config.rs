//! Project configuration for cellar
//!
//! Configuration is stored at `<root>/cellar.toml`. Every key is optional;
//! a project without the file uses `archives/` and `private/` under the root
//! and gpg for encryption.
//!
//! The loaded [`Config`] is built once per invocation and handed by reference
//! to every component, so nothing reads the process working directory after
//! startup.

use crate::error::CellarError;
use crate::tool::{Invocation, ToolRunner};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Placeholder replaced by the source path in crypto templates
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Placeholder replaced by the destination path in crypto templates
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// On-disk shape of `cellar.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Directory holding encrypted archives (default: archives)
    pub archive_dir: PathBuf,

    /// Directory being snapshotted (default: private)
    pub private_dir: PathBuf,

    /// Parent directory for scratch workspaces (default: system temp dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,

    /// Container file suffix (default: .tar.gpg)
    pub suffix: String,

    /// External tool configuration
    pub tools: ToolsConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            archive_dir: PathBuf::from("archives"),
            private_dir: PathBuf::from("private"),
            scratch_dir: None,
            suffix: ".tar.gpg".to_string(),
            tools: ToolsConfig::default(),
        }
    }
}

/// External tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Encrypt command template (`{input}` plaintext, `{output}` archive)
    pub encrypt: Vec<String>,

    /// Decrypt command template (`{input}` archive, `{output}` plaintext)
    pub decrypt: Vec<String>,

    /// Container builder/extractor
    pub tar: String,

    /// Version control executable
    pub git: String,

    /// Recursive diff executable
    pub diff: String,

    /// Glob search executable
    pub find: String,

    /// Pager; falls back to $PAGER, then `less`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pager: Option<String>,

    /// Timeout for each external call in seconds (0 = wait forever)
    pub timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            encrypt: strings(&[
                "gpg", "--batch", "--yes", "--quiet", "--symmetric", "--output", "{output}", "{input}",
            ]),
            decrypt: strings(&[
                "gpg", "--batch", "--yes", "--quiet", "--output", "{output}", "--decrypt", "{input}",
            ]),
            tar: "tar".to_string(),
            git: "git".to_string(),
            diff: "diff".to_string(),
            find: "find".to_string(),
            pager: None,
            timeout_secs: 0,
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ToolsConfig {
    /// Build the encrypt invocation for one file
    pub fn encrypt(&self, input: &Path, output: &Path) -> Result<Invocation> {
        expand_template("encrypt", &self.encrypt, input, output)
    }

    /// Build the decrypt invocation for one file
    pub fn decrypt(&self, input: &Path, output: &Path) -> Result<Invocation> {
        expand_template("decrypt", &self.decrypt, input, output)
    }

    /// Pager program after applying the $PAGER fallback
    pub fn pager_program(&self) -> String {
        self.pager
            .clone()
            .or_else(|| std::env::var("PAGER").ok().filter(|p| !p.trim().is_empty()))
            .unwrap_or_else(|| "less".to_string())
    }

    /// Timeout applied to each external call
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Substitute `{input}`/`{output}` per argument; no shell is involved
fn expand_template(name: &str, template: &[String], input: &Path, output: &Path) -> Result<Invocation> {
    let (program, rest) = template
        .split_first()
        .ok_or_else(|| CellarError::Config(format!("tools.{} must name a program", name)))?;

    let args: Vec<OsString> = rest
        .iter()
        .map(|arg| match arg.as_str() {
            INPUT_PLACEHOLDER => input.as_os_str().to_owned(),
            OUTPUT_PLACEHOLDER => output.as_os_str().to_owned(),
            other => OsString::from(
                other
                    .replace(INPUT_PLACEHOLDER, &input.to_string_lossy())
                    .replace(OUTPUT_PLACEHOLDER, &output.to_string_lossy()),
            ),
        })
        .collect();

    Ok(Invocation::new(program).args(args))
}

/// Resolve `.` and `..` lexically, without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the filesystem root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

/// Effective configuration for one invocation
#[derive(Debug, Clone)]
pub struct Config {
    /// Project root (directory holding `cellar.toml`)
    pub root: PathBuf,
    /// Absolute archive directory
    pub archive_dir: PathBuf,
    /// Absolute private working directory
    pub private_dir: PathBuf,
    /// Parent of scratch workspaces
    pub scratch_dir: PathBuf,
    /// Container file suffix
    pub suffix: String,
    /// External tools
    pub tools: ToolsConfig,
}

impl Config {
    /// Name of the project configuration file
    pub const FILE_NAME: &'static str = "cellar.toml";

    /// Load configuration for a project root
    ///
    /// Returns the defaults if `cellar.toml` doesn't exist.
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(Self::FILE_NAME);

        let file = if config_path.exists() {
            let content = fs::read_to_string(&config_path).map_err(CellarError::io(format!(
                "failed to read {}",
                config_path.display()
            )))?;
            let file: ConfigFile = toml::from_str(&content).map_err(|e| {
                CellarError::Config(format!("failed to parse {}: {}", config_path.display(), e))
            })?;
            tracing::debug!("Loaded project config from {}", config_path.display());
            file
        } else {
            tracing::debug!("No {} at {}, using defaults", Self::FILE_NAME, root.display());
            ConfigFile::default()
        };

        Self::from_file(root, file)
    }

    /// Resolve a parsed config file against a project root
    pub fn from_file(root: &Path, file: ConfigFile) -> Result<Self> {
        if file.suffix.is_empty() {
            return Err(CellarError::Config("suffix must not be empty".to_string()));
        }

        let root = normalize(root);
        let archive_dir = normalize(&root.join(&file.archive_dir));
        let private_dir = normalize(&root.join(&file.private_dir));

        // Restore wipes private_dir; it must not hold the root, the archives or scratch space
        if root.starts_with(&private_dir) || archive_dir.starts_with(&private_dir) {
            return Err(CellarError::Config(format!(
                "private_dir {} must not contain the project root or archive_dir",
                private_dir.display()
            )));
        }

        let scratch_dir = match file.scratch_dir {
            Some(dir) if !dir.as_os_str().is_empty() => normalize(&root.join(dir)),
            _ => std::env::temp_dir(),
        };

        if scratch_dir.starts_with(&private_dir) {
            return Err(CellarError::Config(format!(
                "scratch_dir {} must not be inside private_dir {}",
                scratch_dir.display(),
                private_dir.display()
            )));
        }

        Ok(Self {
            root,
            archive_dir,
            private_dir,
            scratch_dir,
            suffix: file.suffix,
            tools: file.tools,
        })
    }

    /// Runner honouring the configured timeout
    pub fn runner(&self) -> ToolRunner {
        ToolRunner::new(self.tools.timeout())
    }

    /// Full path of an archive by file name
    pub fn archive_path(&self, name: &str) -> PathBuf {
        self.archive_dir.join(name)
    }

    /// True if a file name carries the container suffix
    pub fn is_container_name(&self, name: &str) -> bool {
        name.len() > self.suffix.len() && name.ends_with(&self.suffix)
    }

    /// Effective values in file form, for display
    pub fn to_file(&self) -> ConfigFile {
        ConfigFile {
            archive_dir: self.archive_dir.clone(),
            private_dir: self.private_dir.clone(),
            scratch_dir: Some(self.scratch_dir.clone()),
            suffix: self.suffix.clone(),
            tools: self.tools.clone(),
        }
    }
}
