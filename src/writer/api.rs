//! Emit the TypeScript API wrapper: one async function per circuit.
//!
//! Mutations go through `contract.callTx.<name>(…)` and are normalised to a
//! `TransactionReceipt`; queries call the accessor `contract.<name>(…)` and
//! return its value untouched.

use std::fmt::{self, Write};

use super::{HEADER, ts_ident};
use crate::model::{ContractInterface, FunctionSpec};
use crate::processor::types::{TargetType, map_type};

pub fn render(iface: &ContractInterface) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_module(&mut out, iface);
    out
}

pub fn binding_type_name(iface: &ContractInterface) -> String {
    format!("Deployed{}Contract", iface.contract_name)
}

fn write_module(h: &mut String, iface: &ContractInterface) -> fmt::Result {
    let binding = binding_type_name(iface);

    writeln!(h, "// {HEADER}")?;
    writeln!(h, "// Contract: {}", iface.contract_name)?;
    writeln!(h, "// Regeneration overwrites this file; manual edits are lost.\n")?;

    // ---------------------------------------------------------------
    // 1. Shapes shared with downstream code
    // ---------------------------------------------------------------
    writeln!(h, "export interface TransactionReceipt {{")?;
    writeln!(h, "  transactionId: string;")?;
    writeln!(h, "  blockHeight: bigint | number;")?;
    writeln!(h, "}}\n")?;

    writeln!(h, "export interface CallTxResult {{")?;
    writeln!(h, "  public: {{ txId: string; blockHeight: bigint | number }};")?;
    writeln!(h, "}}\n")?;

    writeln!(h, "export interface {binding} {{")?;
    writeln!(h, "  callTx: {{")?;
    for f in iface.functions.iter().filter(|f| f.mutates) {
        writeln!(h, "    {}({}): Promise<CallTxResult>;", f.name, typed_params(f))?;
    }
    writeln!(h, "  }};")?;
    for f in iface.functions.iter().filter(|f| !f.mutates) {
        writeln!(
            h,
            "  {}({}): Promise<{}>;",
            f.name,
            typed_params(f),
            map_type(&f.return_type).ts_name()
        )?;
    }
    writeln!(h, "}}\n")?;

    writeln!(h, "const toReceipt = (result: CallTxResult): TransactionReceipt => ({{")?;
    writeln!(h, "  transactionId: result.public.txId,")?;
    writeln!(h, "  blockHeight: result.public.blockHeight,")?;
    writeln!(h, "}});")?;

    // ---------------------------------------------------------------
    // 2. One wrapper per circuit
    // ---------------------------------------------------------------
    for f in &iface.functions {
        writeln!(h)?;
        write_operation(h, &binding, f)?;
    }

    // ---------------------------------------------------------------
    // 3. Metadata table for menus and tooling
    // ---------------------------------------------------------------
    writeln!(h)?;
    writeln!(h, "export const operations = [")?;
    for f in &iface.functions {
        let params = f
            .parameters
            .iter()
            .map(|p| format!("{{ name: {:?}, type: {:?} }}", p.name, p.declared_type))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(
            h,
            "  {{ name: {:?}, readOnly: {}, params: [{}] }},",
            f.name, !f.mutates, params
        )?;
    }
    writeln!(h, "] as const;")?;

    writeln!(h)?;
    writeln!(h, "export const stateVariables = [")?;
    for s in &iface.state_variables {
        writeln!(h, "  {{ name: {:?}, type: {:?} }},", s.name, s.declared_type)?;
    }
    writeln!(h, "] as const;")?;

    Ok(())
}

fn write_operation(h: &mut String, binding: &str, f: &FunctionSpec) -> fmt::Result {
    let args = f
        .parameters
        .iter()
        .map(|p| ts_ident(&p.name))
        .collect::<Vec<_>>()
        .join(", ");
    let mut signature = format!("contract: {binding}");
    if !f.parameters.is_empty() {
        signature.push_str(", ");
        signature.push_str(&typed_params(f));
    }

    let ident = ts_ident(&f.name);

    writeln!(h, "/** {} */", jsdoc_text(&f.description))?;
    if f.mutates {
        writeln!(
            h,
            "export async function {ident}({signature}): Promise<TransactionReceipt> {{"
        )?;
        writeln!(h, "  const result = await contract.callTx.{}({args});", f.name)?;
        writeln!(h, "  return toReceipt(result);")?;
    } else {
        let ret = map_type(&f.return_type);
        writeln!(
            h,
            "export async function {ident}({signature}): Promise<{}> {{",
            ret.ts_name()
        )?;
        if ret == TargetType::Void {
            writeln!(h, "  await contract.{}({args});", f.name)?;
        } else {
            writeln!(h, "  return await contract.{}({args});", f.name)?;
        }
    }
    writeln!(h, "}}")
}

/// Keep a comment from closing the surrounding `/** … */` early.
fn jsdoc_text(text: &str) -> String {
    text.replace("*/", "*\\/")
}

fn typed_params(f: &FunctionSpec) -> String {
    f.parameters
        .iter()
        .map(|p| format!("{}: {}", ts_ident(&p.name), map_type(&p.declared_type).ts_name()))
        .collect::<Vec<_>>()
        .join(", ")
}
