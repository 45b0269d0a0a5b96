//! Rebuild on contract source changes.

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::runner::CommandRunner;
use super::{BuildOrchestrator, RunOutcome, is_contract_source};

/// Directory to watch: the configured source's parent, else the contract dir.
pub fn watch_root<C: CommandRunner>(orchestrator: &BuildOrchestrator<C>) -> PathBuf {
    let cfg = orchestrator.config();
    cfg.source
        .as_deref()
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cfg.contract_dir.clone())
}

/// True when the event touches at least one contract source file.
pub fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|p| is_contract_source(p))
}

/// Build once, then rebuild on every relevant change until Ctrl-C.
/// Failed builds are reported and watching continues.
pub async fn watch<C: CommandRunner>(orchestrator: &BuildOrchestrator<C>) -> Result<()> {
    let root = watch_root(orchestrator);
    let (tx, mut rx) = mpsc::channel::<Event>(64);

    let mut watcher = RecommendedWatcher::new(
        move |result: std::result::Result<Event, notify::Error>| match result {
            Ok(event) => {
                if tx.blocking_send(event).is_err() {
                    debug!("watch channel closed");
                }
            }
            Err(e) => warn!("watch error: {e}"),
        },
        notify::Config::default(),
    )
    .context("Creating file watcher")?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("Watching {}", root.display()))?;
    info!("Watching {} for *.compact changes (Ctrl-C to stop)", root.display());

    rebuild(orchestrator).await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watcher");
                break;
            }
            event = rx.recv() => {
                let Some(event) = event else { break };
                if !is_relevant(&event) {
                    continue;
                }
                debug!("change detected: {:?}", event.paths);
                rebuild(orchestrator).await;
            }
        }
    }

    Ok(())
}

async fn rebuild<C: CommandRunner>(orchestrator: &BuildOrchestrator<C>) {
    // Outcomes and failures are logged by the orchestrator.
    if let Ok(RunOutcome::Skipped(reason)) = orchestrator.run().await {
        debug!("change coalesced ({reason:?})");
    }
}
