pub mod build;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod processor;
pub mod writer;

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;

use build::{BuildOrchestrator, RunOutcome};
use cli::{Cli, Commands};
use config::Config;
use engine::{DryRunBinding, Session, StdinReader};
use model::ContractInterface;

pub async fn run(args: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(&args.config)?;

    match args.command {
        Commands::Analyze { source, json } => {
            let iface = parser::load(&source)?;
            if json {
                let text = serde_json::to_string_pretty(&iface)
                    .with_context(|| "Serializing interface")?;
                println!("{text}");
            } else {
                print_summary(&iface);
            }
        }

        Commands::Generate { source, out } => {
            // 1. ── Parse ──────────────────────────────────────────────
            let iface = parser::load(&source)?;

            // 2. ── Write outputs ──────────────────────────────────────
            let written = writer::emit(&iface, &config.cli.session_options(), &out)
                .with_context(|| format!("Generating into {}", out.display()))?;
            for path in written {
                println!("{}", path.display());
            }
        }

        Commands::Build { source } => {
            override_source(&mut config, source);
            let orchestrator = BuildOrchestrator::new(config.build)
                .with_session_options(config.cli.session_options());
            // The error carries the failing step, exit code and output.
            match orchestrator.run().await.with_context(|| "Build pipeline")? {
                RunOutcome::Completed(report) => println!(
                    "✓ {} built from {} ({} steps)",
                    report.contract_name,
                    report.source.display(),
                    report.steps.len()
                ),
                RunOutcome::Skipped(reason) => println!("Build skipped ({reason:?})"),
            }
        }

        Commands::Watch { source } => {
            override_source(&mut config, source);
            let orchestrator = BuildOrchestrator::new(config.build)
                .with_session_options(config.cli.session_options());
            build::watch::watch(&orchestrator).await?;
        }

        Commands::Menu { source } => {
            let iface = parser::load(&source)?;
            let binding = Arc::new(DryRunBinding::new());
            let mut session = Session::new(
                iface,
                binding,
                config.cli.session_options(),
                StdinReader::new(),
                std::io::stdout(),
            );
            let summary = session.run().await.with_context(|| "Interactive session")?;
            tracing::info!(
                "Session over: {} dispatched, {} succeeded, {} failed",
                summary.dispatched,
                summary.succeeded,
                summary.failed
            );
        }
    }

    Ok(())
}

fn override_source(config: &mut Config, source: Option<PathBuf>) {
    if source.is_some() {
        config.build.source = source;
    }
}

fn print_summary(iface: &ContractInterface) {
    println!("Contract: {}", iface.contract_name);
    println!("Functions ({}):", iface.functions.len());
    for f in &iface.functions {
        let params = f
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.declared_type))
            .collect::<Vec<_>>()
            .join(", ");
        let kind = if f.is_read_only() { "query" } else { "mutation" };
        println!("  {}({params}) -> {}  [{kind}]", f.name, f.return_type);
    }
    println!("State ({}):", iface.state_variables.len());
    for s in &iface.state_variables {
        println!("  {}: {}", s.name, s.declared_type);
    }
}
