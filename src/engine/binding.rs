//! Contract bindings and the capability table built on top of them.
//!
//! A binding is the external collaborator that actually talks to the
//! network. The engine never looks operations up by reflection: once per
//! session the interface is turned into a name → callable table, and
//! dispatch is a map lookup.

use async_trait::async_trait;
use futures::future::BoxFuture;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::error::InvocationError;
use crate::model::ContractInterface;

/// A converted argument, ready to hand to the binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Integer(BigUint),
    Boolean(bool),
    Bytes(Vec<u8>),
    Text(String),
}

impl ArgValue {
    pub fn to_json(&self) -> Value {
        match self {
            ArgValue::Integer(n) => Value::String(n.to_string()),
            ArgValue::Boolean(b) => Value::Bool(*b),
            ArgValue::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
            ArgValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Integer(n) => write!(f, "{n}"),
            ArgValue::Boolean(b) => write!(f, "{b}"),
            ArgValue::Bytes(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            ArgValue::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// Raw shape returned by `callTx.<name>(…)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTxResult {
    pub public: PublicTxData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicTxData {
    pub tx_id: String,
    pub block_height: u64,
}

/// Normalised mutation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_id: String,
    pub block_height: u64,
}

impl From<CallTxResult> for TxReceipt {
    fn from(result: CallTxResult) -> Self {
        Self {
            transaction_id: result.public.tx_id,
            block_height: result.public.block_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Receipt(TxReceipt),
    Value(Value),
}

#[async_trait]
pub trait ContractBinding: Send + Sync {
    /// Submit a mutating circuit as a transaction.
    async fn call_tx(&self, name: &str, args: Vec<ArgValue>) -> Result<CallTxResult, InvocationError>;

    /// Evaluate a read-only circuit.
    async fn query(&self, name: &str, args: Vec<ArgValue>) -> Result<Value, InvocationError>;

    /// Current ledger values keyed by field name.
    async fn ledger_state(&self) -> Result<Map<String, Value>, InvocationError>;
}

pub type OperationFuture = BoxFuture<'static, Result<CallOutcome, InvocationError>>;
pub type OperationFn = Arc<dyn Fn(Vec<ArgValue>) -> OperationFuture + Send + Sync>;

/// Function name → callable, built once per session.
pub struct Capabilities {
    ops: HashMap<String, OperationFn>,
}

impl Capabilities {
    pub fn bind(iface: &ContractInterface, binding: Arc<dyn ContractBinding>) -> Self {
        let mut ops = HashMap::with_capacity(iface.functions.len());

        for f in &iface.functions {
            let binding = Arc::clone(&binding);
            let name = f.name.clone();
            let mutates = f.mutates;

            let op: OperationFn = Arc::new(move |args: Vec<ArgValue>| -> OperationFuture {
                let binding = Arc::clone(&binding);
                let name = name.clone();
                Box::pin(async move {
                    if mutates {
                        let result = binding.call_tx(&name, args).await?;
                        Ok(CallOutcome::Receipt(result.into()))
                    } else {
                        binding.query(&name, args).await.map(CallOutcome::Value)
                    }
                })
            });
            ops.insert(f.name.clone(), op);
        }

        Self { ops }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub async fn invoke(&self, name: &str, args: Vec<ArgValue>) -> Result<CallOutcome, InvocationError> {
        let op = self
            .ops
            .get(name)
            .ok_or_else(|| InvocationError::Unsupported(name.to_string()))?;
        op(args).await
    }
}

/// One call observed by [`DryRunBinding`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub name: String,
    pub args: Vec<ArgValue>,
    pub is_tx: bool,
}

#[derive(Default)]
struct DryRunState {
    block_height: u64,
    calls: Vec<RecordedCall>,
    ledger: Map<String, Value>,
    /// circuit name → rejection message
    rejections: HashMap<String, String>,
    /// circuits that reject every call after their first success
    once_only: HashSet<String>,
}

/// Offline binding: records every call, answers mutations with synthetic
/// receipts and queries with `null`.
#[derive(Default)]
pub struct DryRunBinding {
    state: Mutex<DryRunState>,
}

impl DryRunBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ledger_value(self, name: impl Into<String>, value: Value) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.ledger.insert(name.into(), value);
        }
        self
    }

    /// Every call to `name` fails with `message`.
    pub fn rejecting(self, name: impl Into<String>, message: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.rejections.insert(name.into(), message.into());
        }
        self
    }

    /// `name` succeeds once, then fails like a uniqueness-constrained circuit.
    pub fn once_only(self, name: impl Into<String>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.once_only.insert(name.into());
        }
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state
            .lock()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, name: &str, args: Vec<ArgValue>, is_tx: bool) -> Result<u64, InvocationError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| InvocationError::Rejected("dry-run binding state poisoned".into()))?;

        if let Some(message) = state.rejections.get(name) {
            return Err(InvocationError::Rejected(message.clone()));
        }
        if state.once_only.contains(name) && state.calls.iter().any(|c| c.name == name) {
            return Err(InvocationError::Rejected(format!(
                "failed assert: {name} already performed"
            )));
        }

        let rendered = Value::Array(args.iter().map(ArgValue::to_json).collect());
        debug!("dry-run {} {name} {rendered}", if is_tx { "tx" } else { "query" });
        state.calls.push(RecordedCall {
            name: name.to_string(),
            args,
            is_tx,
        });
        if is_tx {
            state.block_height += 1;
        }
        Ok(state.block_height)
    }
}

#[async_trait]
impl ContractBinding for DryRunBinding {
    async fn call_tx(&self, name: &str, args: Vec<ArgValue>) -> Result<CallTxResult, InvocationError> {
        let height = self.record(name, args, true)?;
        let mut id = height.to_be_bytes().to_vec();
        id.extend_from_slice(name.as_bytes());
        Ok(CallTxResult {
            public: PublicTxData {
                tx_id: hex::encode(id),
                block_height: height,
            },
        })
    }

    async fn query(&self, name: &str, args: Vec<ArgValue>) -> Result<Value, InvocationError> {
        self.record(name, args, false)?;
        Ok(Value::Null)
    }

    async fn ledger_state(&self) -> Result<Map<String, Value>, InvocationError> {
        self.state
            .lock()
            .map(|s| s.ledger.clone())
            .map_err(|_| InvocationError::Rejected("dry-run binding state poisoned".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::analyze;

    const SRC: &str = "
        export circuit increment(): [] {}
        export circuit get_round(): Uint<64> {}
    ";

    #[tokio::test]
    async fn test_capabilities_route_by_classification() {
        let iface = analyze(SRC, "counter.compact");
        let binding = Arc::new(DryRunBinding::new());
        let caps = Capabilities::bind(&iface, binding.clone());

        assert_eq!(caps.len(), 2);

        let outcome = caps.invoke("increment", vec![]).await.unwrap();
        match outcome {
            CallOutcome::Receipt(r) => assert_eq!(r.block_height, 1),
            other => panic!("expected receipt, got {other:?}"),
        }

        let outcome = caps.invoke("get_round", vec![]).await.unwrap();
        assert_eq!(outcome, CallOutcome::Value(Value::Null));

        let calls = binding.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].is_tx);
        assert!(!calls[1].is_tx);
    }

    #[tokio::test]
    async fn test_unknown_operation_is_unsupported() {
        let iface = analyze(SRC, "counter.compact");
        let caps = Capabilities::bind(&iface, Arc::new(DryRunBinding::new()));

        let err = caps.invoke("nope", vec![]).await.unwrap_err();
        assert_eq!(err, InvocationError::Unsupported("nope".into()));
    }

    #[tokio::test]
    async fn test_once_only_rejects_second_call() {
        let binding = DryRunBinding::new().once_only("register");
        binding.call_tx("register", vec![]).await.unwrap();
        let err = binding.call_tx("register", vec![]).await.unwrap_err();
        assert!(err.to_string().contains("already"));
    }

    #[test]
    fn test_receipt_normalisation() {
        let raw: CallTxResult =
            serde_json::from_str(r#"{"public":{"txId":"abc","blockHeight":42}}"#).unwrap();
        let receipt = TxReceipt::from(raw);
        assert_eq!(
            receipt,
            TxReceipt {
                transaction_id: "abc".into(),
                block_height: 42,
            }
        );
    }

    #[test]
    fn test_arg_json() {
        let test_cases = vec![
            (ArgValue::Integer(BigUint::from(u64::MAX) * 2u32), Value::from("36893488147419103230")),
            (ArgValue::Boolean(true), Value::Bool(true)),
            (ArgValue::Bytes(vec![0xde, 0xad]), Value::from("0xdead")),
            (ArgValue::Text("hi".into()), Value::from("hi")),
        ];

        for (arg, expected) in test_cases {
            assert_eq!(arg.to_json(), expected);
        }
    }
}
