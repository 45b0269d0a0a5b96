//! Configuration for the generator, the build pipeline and interactive
//! sessions.
//!
//! Everything lives in an optional `compactgen.toml`; every field has a
//! default, so an empty file (or no file) is a valid configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::params::{ChoiceRule, default_choice_rules};
use crate::engine::session::{ErrorHint, SessionOptions, default_error_hints};

pub const DEFAULT_CONFIG_FILE: &str = "compactgen.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub build: BuildConfig,
    pub cli: CliConfig,
}

/// Pipeline layout and external commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Searched recursively for `*.compact` when `source` is unset.
    pub contract_dir: PathBuf,
    pub source: Option<PathBuf>,
    /// Compiler command; source file and output dir are appended.
    pub compiler: Vec<String>,
    pub compiler_output: PathBuf,
    /// Build command run inside `contract_dir`.
    pub contract_build: Vec<String>,
    /// Generated project root; artifacts land in `<cli_dir>/src/`.
    pub cli_dir: PathBuf,
    /// Build command run inside `cli_dir` after generation.
    pub cli_build: Vec<String>,
    /// Quiet window after a run during which new requests are ignored.
    pub debounce_ms: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            contract_dir: PathBuf::from("contract"),
            source: None,
            compiler: vec!["compactc".to_string()],
            compiler_output: PathBuf::from("contract/src/managed"),
            contract_build: npm_build(),
            cli_dir: PathBuf::from("cli"),
            cli_build: npm_build(),
            debounce_ms: 2000,
        }
    }
}

impl BuildConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn npm_build() -> Vec<String> {
    vec!["npm".to_string(), "run".to_string(), "build".to_string()]
}

/// Interactive-session tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub choice_rules: Vec<ChoiceRule>,
    pub error_hints: Vec<ErrorHint>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            choice_rules: default_choice_rules(),
            error_hints: default_error_hints(),
        }
    }
}

impl CliConfig {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            choice_rules: self.choice_rules.clone(),
            error_hints: self.error_hints.clone(),
        }
    }
}

impl Config {
    /// Load `path`. A missing file is only tolerated for the default name.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() && path == Path::new(DEFAULT_CONFIG_FILE) {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Reading {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Parsing {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
