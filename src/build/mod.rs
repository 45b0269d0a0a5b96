//! End-to-end pipeline: locate + parse → compile → build contract →
//! generate → build CLI.
//!
//! Steps run strictly one after another. The first failing step ends the
//! run; whatever earlier steps wrote stays on disk.

pub mod runner;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::config::BuildConfig;
use crate::engine::SessionOptions;
use crate::error::PipelineError;
use crate::{parser, writer};
use runner::{CommandRunner, ExternalStep, TokioRunner};

pub const SOURCE_EXTENSION: &str = "compact";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another run is still going.
    InFlight,
    /// The previous run finished inside the quiet window.
    Debounced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub source: PathBuf,
    pub contract_name: String,
    pub functions: usize,
    pub state_variables: usize,
    pub artifacts: Vec<PathBuf>,
    /// Names of the steps that ran, in order.
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(BuildReport),
    Skipped(SkipReason),
}

/// At most one execution in flight, and none within `quiet` of the last
/// completion.
#[derive(Debug)]
pub struct SingleFlight {
    running: AtomicBool,
    last_completed: Mutex<Option<Instant>>,
    quiet: Duration,
}

impl SingleFlight {
    pub fn new(quiet: Duration) -> Self {
        Self {
            running: AtomicBool::new(false),
            last_completed: Mutex::new(None),
            quiet,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Claim the flight. The returned guard stamps the completion time and
    /// releases the flag when dropped.
    pub fn try_begin(&self) -> Result<FlightGuard<'_>, SkipReason> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SkipReason::InFlight);
        }

        let last = *self
            .last_completed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if last.is_some_and(|t| t.elapsed() < self.quiet) {
            self.running.store(false, Ordering::Release);
            return Err(SkipReason::Debounced);
        }

        Ok(FlightGuard { flight: self })
    }
}

pub struct FlightGuard<'a> {
    flight: &'a SingleFlight,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        *self
            .flight
            .last_completed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Instant::now());
        self.flight.running.store(false, Ordering::Release);
    }
}

pub struct BuildOrchestrator<C = TokioRunner> {
    config: BuildConfig,
    /// Choice and hint tables baked into the generated CLI.
    cli_options: SessionOptions,
    runner: C,
    flight: SingleFlight,
    executions: AtomicUsize,
}

impl BuildOrchestrator<TokioRunner> {
    pub fn new(config: BuildConfig) -> Self {
        Self::with_runner(config, TokioRunner)
    }
}

impl<C: CommandRunner> BuildOrchestrator<C> {
    pub fn with_runner(config: BuildConfig, runner: C) -> Self {
        let flight = SingleFlight::new(config.debounce());
        Self {
            config,
            cli_options: SessionOptions::default(),
            runner,
            flight,
            executions: AtomicUsize::new(0),
        }
    }

    pub fn with_session_options(mut self, options: SessionOptions) -> Self {
        self.cli_options = options;
        self
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn runner(&self) -> &C {
        &self.runner
    }

    /// How many times the pipeline actually started.
    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::Acquire)
    }

    /// Request a run. Returns immediately with `Skipped` when another run
    /// is in flight or the quiet window has not elapsed.
    pub async fn run(&self) -> Result<RunOutcome, PipelineError> {
        let guard = match self.flight.try_begin() {
            Ok(guard) => guard,
            Err(reason) => {
                info!("Build request ignored ({reason:?})");
                return Ok(RunOutcome::Skipped(reason));
            }
        };
        self.executions.fetch_add(1, Ordering::AcqRel);

        let result = self.execute().await;
        drop(guard);

        match &result {
            Ok(report) => info!(
                "✓ Build finished: {} ({} functions, {} state variables, {} artifacts)",
                report.contract_name,
                report.functions,
                report.state_variables,
                report.artifacts.len()
            ),
            Err(e) => error!("✗ Build failed: {e}"),
        }
        result.map(RunOutcome::Completed)
    }

    async fn execute(&self) -> Result<BuildReport, PipelineError> {
        let cfg = &self.config;
        let mut steps = Vec::new();

        // 1. ── Locate & parse ─────────────────────────────────────────
        info!("[1/5] Locating contract source");
        let source = locate_source(cfg)?;
        let text = std::fs::read_to_string(&source).map_err(|e| PipelineError::SourceRead {
            path: source.clone(),
            source: e,
        })?;
        let file_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let iface = parser::analyze(&text, &file_name);
        info!(
            "Parsed {}: {} functions, {} state variables",
            source.display(),
            iface.functions.len(),
            iface.state_variables.len()
        );
        steps.push("parse".to_string());

        // 2. ── Compile ────────────────────────────────────────────────
        info!("[2/5] Compiling contract");
        let compile = ExternalStep::from_command("compile", &cfg.compiler, None).map(|s| {
            s.arg(source.to_string_lossy())
                .arg(cfg.compiler_output.to_string_lossy())
        });
        self.run_step(compile, &mut steps).await?;

        // 3. ── Build contract package ─────────────────────────────────
        info!("[3/5] Building contract package");
        let build_contract = ExternalStep::from_command(
            "build contract",
            &cfg.contract_build,
            Some(cfg.contract_dir.clone()),
        );
        self.run_step(build_contract, &mut steps).await?;

        // 4. ── Generate ───────────────────────────────────────────────
        info!("[4/5] Generating API and CLI sources");
        let artifacts = writer::emit(&iface, &self.cli_options, &cfg.cli_dir)?;
        steps.push("generate".to_string());

        // 5. ── Build generated project ────────────────────────────────
        info!("[5/5] Building generated CLI");
        let build_cli =
            ExternalStep::from_command("build cli", &cfg.cli_build, Some(cfg.cli_dir.clone()));
        self.run_step(build_cli, &mut steps).await?;

        Ok(BuildReport {
            source,
            contract_name: iface.contract_name,
            functions: iface.functions.len(),
            state_variables: iface.state_variables.len(),
            artifacts,
            steps,
        })
    }

    async fn run_step(
        &self,
        step: Option<ExternalStep>,
        steps: &mut Vec<String>,
    ) -> Result<(), PipelineError> {
        let Some(step) = step else {
            warn!("step has no command configured, skipping");
            return Ok(());
        };

        info!("→ {}", step.command_line());
        let output = self.runner.run(&step).await?;
        if !output.success() {
            return Err(PipelineError::ExternalTool {
                step: step.name,
                code: output.code,
                output: output.combined(),
            });
        }

        steps.push(step.name);
        Ok(())
    }
}

/// The configured source file, or the first `*.compact` file (by path)
/// under the contract directory.
pub fn locate_source(cfg: &BuildConfig) -> Result<PathBuf, PipelineError> {
    if let Some(src) = &cfg.source {
        return if src.is_file() {
            Ok(src.clone())
        } else {
            Err(PipelineError::SourceNotFound(src.clone()))
        };
    }

    WalkDir::new(&cfg.contract_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .find(|p| is_contract_source(p))
        .ok_or_else(|| PipelineError::SourceNotFound(cfg.contract_dir.clone()))
}

pub fn is_contract_source(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
}
