//! Interactive dispatch loop.
//!
//! ```text
//! Menu ──select──▶ Collecting(0..n) ──▶ Dispatch ──▶ ResultDisplay ──▶ Menu
//!   │                    │ bad input                                   ▲
//!   │                    └─────────────────────────────────────────────┘
//!   └──exit / EOF──▶ Exit
//! ```
//!
//! Nothing that goes wrong inside one action ends the session; only the
//! Exit entry, closed input or a broken output sink do.

use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{error, info};

use super::binding::{ArgValue, CallOutcome, Capabilities, ContractBinding};
use super::menu::{MenuAction, MenuItem, build_menu, select};
use super::params::{ChoiceRule, ParameterCollector, default_choice_rules};
use super::reader::LineReader;
use crate::error::{InvocationError, ParameterError, PromptError};
use crate::model::{ContractInterface, FunctionSpec};

/// Extra text shown when a failure message contains `contains`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorHint {
    pub contains: String,
    pub hint: String,
}

pub fn default_error_hints() -> Vec<ErrorHint> {
    vec![ErrorHint {
        contains: "already".to_string(),
        hint: "this action is only allowed once and has already been performed.".to_string(),
    }]
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub choice_rules: Vec<ChoiceRule>,
    pub error_hints: Vec<ErrorHint>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            choice_rules: default_choice_rules(),
            error_hints: default_error_hints(),
        }
    }
}

#[derive(Debug)]
enum SessionState {
    Menu,
    Collecting { function: usize, args: Vec<ArgValue> },
    Dispatch { function: usize, args: Vec<ArgValue> },
    ResultDisplay { function: usize, result: Result<CallOutcome, InvocationError> },
    DisplayState,
    Exit,
}

/// What happened during a session, for callers and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: usize,
}

pub struct Session<R, W> {
    iface: ContractInterface,
    menu: Vec<MenuItem>,
    caps: Capabilities,
    binding: Arc<dyn ContractBinding>,
    collector: ParameterCollector,
    hints: Vec<ErrorHint>,
    reader: R,
    out: W,
    summary: SessionSummary,
}

impl<R: LineReader, W: Write> Session<R, W> {
    pub fn new(
        iface: ContractInterface,
        binding: Arc<dyn ContractBinding>,
        options: SessionOptions,
        reader: R,
        out: W,
    ) -> Self {
        let menu = build_menu(&iface);
        let caps = Capabilities::bind(&iface, Arc::clone(&binding));
        Self {
            iface,
            menu,
            caps,
            binding,
            collector: ParameterCollector::new(options.choice_rules),
            hints: options.error_hints,
            reader,
            out,
            summary: SessionSummary::default(),
        }
    }

    pub fn menu(&self) -> &[MenuItem] {
        &self.menu
    }

    /// Hand back the reader and output sink once the session is over.
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.out)
    }

    pub async fn run(&mut self) -> io::Result<SessionSummary> {
        info!(
            "Starting session for {} ({} operations)",
            self.iface.contract_name,
            self.caps.len()
        );

        let mut state = SessionState::Menu;
        loop {
            state = match state {
                SessionState::Menu => self.on_menu().await?,
                SessionState::Collecting { function, args } => {
                    self.on_collect(function, args).await?
                }
                SessionState::Dispatch { function, args } => self.on_dispatch(function, args).await,
                SessionState::ResultDisplay { function, result } => {
                    self.on_result(function, result)?
                }
                SessionState::DisplayState => self.on_display_state().await?,
                SessionState::Exit => break,
            };
        }

        writeln!(self.out, "Goodbye.")?;
        self.out.flush()?;
        Ok(self.summary.clone())
    }

    async fn on_menu(&mut self) -> io::Result<SessionState> {
        writeln!(self.out)?;
        writeln!(self.out, "{} contract", self.iface.contract_name)?;
        for item in &self.menu {
            writeln!(self.out, "{}", item.label)?;
        }
        self.out.flush()?;

        let Some(line) = self.reader.question("Select an option: ").await? else {
            return Ok(SessionState::Exit);
        };

        let Some(item) = select(&self.menu, &line) else {
            writeln!(
                self.out,
                "✗ Invalid option \"{}\", choose 1-{}",
                line.trim(),
                self.menu.len()
            )?;
            return Ok(SessionState::Menu);
        };

        Ok(match &item.action {
            MenuAction::Exit => SessionState::Exit,
            MenuAction::DisplayState => SessionState::DisplayState,
            MenuAction::Invoke(name) => match self.function_index(name) {
                Some(function) => SessionState::Collecting {
                    function,
                    args: Vec::new(),
                },
                None => SessionState::Menu,
            },
        })
    }

    async fn on_collect(&mut self, function: usize, mut args: Vec<ArgValue>) -> io::Result<SessionState> {
        let f = &self.iface.functions[function];
        let Some(param) = f.parameters.get(args.len()) else {
            return Ok(SessionState::Dispatch { function, args });
        };

        match self.collector.collect(param, &mut self.reader, &mut self.out).await {
            Ok(value) => {
                args.push(value);
                Ok(SessionState::Collecting { function, args })
            }
            Err(PromptError::Parameter(ParameterError::InputClosed { .. })) => Ok(SessionState::Exit),
            Err(PromptError::Parameter(e)) => {
                writeln!(self.out, "✗ {}: {e}", f.name)?;
                Ok(SessionState::Menu)
            }
            Err(PromptError::Io(e)) => Err(e),
        }
    }

    async fn on_dispatch(&mut self, function: usize, args: Vec<ArgValue>) -> SessionState {
        let name = &self.iface.functions[function].name;
        self.summary.dispatched += 1;
        let result = self.caps.invoke(name, args).await;
        SessionState::ResultDisplay { function, result }
    }

    fn on_result(
        &mut self,
        function: usize,
        result: Result<CallOutcome, InvocationError>,
    ) -> io::Result<SessionState> {
        let f: &FunctionSpec = &self.iface.functions[function];

        match result {
            Ok(CallOutcome::Receipt(receipt)) => {
                self.summary.succeeded += 1;
                writeln!(
                    self.out,
                    "✓ {} submitted: tx {} at block {}",
                    f.name, receipt.transaction_id, receipt.block_height
                )?;
            }
            Ok(CallOutcome::Value(value)) => {
                self.summary.succeeded += 1;
                writeln!(self.out, "✓ {} returned: {value}", f.name)?;
            }
            Err(e) => {
                self.summary.failed += 1;
                error!(function = %f.name, "operation failed: {e}");
                writeln!(self.out, "✗ {} failed: {e}", f.name)?;
                let message = e.to_string();
                if let Some(hint) = self.hints.iter().find(|h| message.contains(&h.contains)) {
                    writeln!(self.out, "  hint: {}", hint.hint)?;
                }
            }
        }

        Ok(SessionState::Menu)
    }

    async fn on_display_state(&mut self) -> io::Result<SessionState> {
        match self.binding.ledger_state().await {
            Ok(state) => {
                writeln!(self.out, "Contract state:")?;
                for var in &self.iface.state_variables {
                    let value = state
                        .get(&var.name)
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "<unavailable>".to_string());
                    writeln!(self.out, "  {} ({}): {value}", var.name, var.declared_type)?;
                }
            }
            Err(e) => {
                error!("reading contract state failed: {e}");
                writeln!(self.out, "✗ display contract state failed: {e}")?;
            }
        }
        Ok(SessionState::Menu)
    }

    fn function_index(&self, name: &str) -> Option<usize> {
        self.iface.functions.iter().position(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::binding::DryRunBinding;
    use crate::engine::reader::ScriptedReader;
    use crate::parser::analyze;

    const VOTING: &str = "
        export ledger round: Counter;
        export ledger votes: Map<Uint<8>, Counter>;
        export circuit register(): [] {}
        export circuit vote_for(choice_index: Uint<0..3>, note: Opaque<\"string\">): [] {}
        export circuit get_vote_count(count: Uint<8>): Uint<64> {}
    ";

    async fn run_session(
        binding: Arc<DryRunBinding>,
        answers: &[&str],
    ) -> (SessionSummary, String, ScriptedReader) {
        let iface = analyze(VOTING, "voting.compact");
        let reader = ScriptedReader::new(answers.iter().copied());
        let mut session = Session::new(iface, binding, SessionOptions::default(), reader, Vec::new());
        let summary = session.run().await.unwrap();
        let (reader, out) = session.into_parts();
        (summary, String::from_utf8(out).unwrap(), reader)
    }

    #[tokio::test]
    async fn test_exit_without_invoking() {
        let binding = Arc::new(DryRunBinding::new());
        let (summary, out, _) = run_session(binding.clone(), &["5"]).await;

        assert_eq!(summary, SessionSummary::default());
        assert!(binding.calls().is_empty());
        assert!(out.contains("1. Register(0 params)"));
        assert!(out.contains("4. Display contract state"));
        assert!(out.contains("5. Exit"));
        assert!(out.ends_with("Goodbye.\n"));
    }

    #[tokio::test]
    async fn test_full_cycle_returns_to_menu() {
        let binding = Arc::new(DryRunBinding::new());
        let (summary, out, _) = run_session(
            binding.clone(),
            &["2", "2", "for B", "3", "200", "5"],
        )
        .await;

        assert_eq!(summary.dispatched, 2);
        assert_eq!(summary.succeeded, 2);

        let calls = binding.calls();
        assert_eq!(calls[0].name, "vote_for");
        assert_eq!(
            calls[0].args,
            vec![ArgValue::Integer(1u32.into()), ArgValue::Text("for B".into())]
        );
        assert!(calls[0].is_tx);
        assert_eq!(calls[1].name, "get_vote_count");
        assert!(!calls[1].is_tx);

        assert!(out.contains("Select choice_index:"));
        assert!(out.contains("✓ vote_for submitted: tx"));
        assert!(out.contains("✓ get_vote_count returned: null"));
    }

    #[tokio::test]
    async fn test_validation_failure_stays_in_session() {
        let binding = Arc::new(DryRunBinding::new());
        let (summary, out, _) = run_session(binding.clone(), &["3", "abc", "3", "999", "5"]).await;

        assert_eq!(summary.dispatched, 0);
        assert!(binding.calls().is_empty());
        assert!(out.contains("✗ get_vote_count: `count` expects an integer, got `abc`"));
        assert!(out.contains("✗ get_vote_count: `count` must be within 0..=255, got 999"));
    }

    #[tokio::test]
    async fn test_invocation_failure_with_hint() {
        let binding = Arc::new(DryRunBinding::new().once_only("register"));
        let (summary, out, _) = run_session(binding.clone(), &["1", "1", "5"]).await;

        assert_eq!(summary.dispatched, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(out.contains("✗ register failed: failed assert: register already performed"));
        assert!(out.contains("  hint: this action is only allowed once"));
    }

    #[tokio::test]
    async fn test_failure_without_hint() {
        let binding = Arc::new(DryRunBinding::new().rejecting("register", "network unreachable"));
        let (_, out, _) = run_session(binding, &["1", "5"]).await;

        assert!(out.contains("✗ register failed: network unreachable"));
        assert!(!out.contains("hint:"));
    }

    #[tokio::test]
    async fn test_invalid_selection_and_state_display() {
        let binding = Arc::new(
            DryRunBinding::new().with_ledger_value("round", serde_json::json!(7)),
        );
        let (_, out, _) = run_session(binding, &["42", "4", "5"]).await;

        assert!(out.contains("✗ Invalid option \"42\", choose 1-5"));
        assert!(out.contains("  round (Counter): 7"));
        assert!(out.contains("  votes (Map<Uint<8>, Counter>): <unavailable>"));
    }

    #[tokio::test]
    async fn test_closed_input_ends_session() {
        let binding = Arc::new(DryRunBinding::new());
        // input runs out in the middle of parameter collection
        let (summary, out, reader) = run_session(binding.clone(), &["2"]).await;

        assert_eq!(summary.dispatched, 0);
        assert_eq!(reader.remaining(), 0);
        assert!(out.ends_with("Goodbye.\n"));
    }
}
