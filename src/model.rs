use serde::Serialize;
use std::path::PathBuf;

/// Return-type sentinel for circuits that produce no value.
pub const VOID_TYPE: &str = "[]";

/// Entire contract surface as it comes out of the analyzer.
///
/// Rebuilt from scratch on every parse; nothing here survives between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInterface {
    pub contract_name: String,
    pub functions: Vec<FunctionSpec>,
    pub state_variables: Vec<StateSpec>,
}

impl ContractInterface {
    pub fn empty(contract_name: impl Into<String>) -> Self {
        Self {
            contract_name: contract_name.into(),
            functions: Vec::new(),
            state_variables: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.state_variables.is_empty()
    }

    pub fn function(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions.iter().find(|f| f.name == name)
    }
}

/// One exported circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSpec {
    pub name: String,
    /// Positional order matches the call site.
    pub parameters: Vec<ParamSpec>,
    pub return_type: String,
    pub mutates: bool,
    pub description: String,
}

impl FunctionSpec {
    pub fn is_read_only(&self) -> bool {
        !self.mutates
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub declared_type: String,
}

/// One exported ledger field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub declared_type: String,
}

/// Generated source text plus where it lands, relative to the output
/// directory. Writing one is always a full overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationArtifact {
    pub path: PathBuf,
    pub contents: String,
}

/// Immediately-after-scan representation: declarations exactly as written,
/// before classification and de-duplication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawContract {
    pub circuits: Vec<RawCircuit>,
    pub ledgers: Vec<StateSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCircuit {
    pub name: String,
    pub parameters: Vec<ParamSpec>,
    pub return_type: String,
    /// `//` comment lines directly above the declaration.
    pub doc: Vec<String>,
}
