//! Emit the TypeScript interactive CLI.
//!
//! Menu layout: one numbered entry per circuit, then "Display contract
//! state" and "Exit". The dispatch loop collects parameters, calls the
//! matching wrapper from `api.ts` and prints the outcome; a failed call
//! prints an error line and falls back to the menu.
//!
//! Choice rules and error hints come from the same `SessionOptions` the
//! in-process engine uses, so both front ends prompt alike.

use std::fmt::{self, Write};

use super::{HEADER, ts_ident};
use crate::engine::SessionOptions;
use crate::engine::params::{Choice, ParameterCollector};
use crate::model::{ContractInterface, FunctionSpec, ParamSpec};
use crate::processor::title_case;
use crate::processor::types::{ParamKind, param_kind};

/// `"<n>. <Title Case name>(<k> params)"`
pub fn entry_label(number: usize, f: &FunctionSpec) -> String {
    format!(
        "{number}. {}({} params)",
        title_case(&f.name),
        f.parameters.len()
    )
}

pub fn render(iface: &ContractInterface, options: &SessionOptions) -> String {
    let mut out = String::new();
    // writing into a String cannot fail
    let _ = write_module(&mut out, iface, options);
    out
}

fn write_module(h: &mut String, iface: &ContractInterface, options: &SessionOptions) -> fmt::Result {
    let collector = ParameterCollector::new(options.choice_rules.clone());
    let binding = super::api::binding_type_name(iface);
    let n = iface.functions.len();
    let state_choice = n + 1;
    let exit_choice = n + 2;

    writeln!(h, "// {HEADER}")?;
    writeln!(h, "// Contract: {}", iface.contract_name)?;
    writeln!(h, "// Regeneration overwrites this file; manual edits are lost.\n")?;
    writeln!(h, "import * as api from './api.js';")?;
    writeln!(h, "import type {{ {binding} }} from './api.js';\n")?;

    writeln!(h, "export interface LineReader {{")?;
    writeln!(h, "  question(prompt: string): Promise<string>;")?;
    writeln!(h, "}}\n")?;

    writeln!(h, "interface Choice {{")?;
    writeln!(h, "  label: string;")?;
    writeln!(h, "  value: string;")?;
    writeln!(h, "}}\n")?;

    // ---------------------------------------------------------------
    // 1. Menu
    // ---------------------------------------------------------------
    writeln!(h, "export const MENU: readonly string[] = [")?;
    for (i, f) in iface.functions.iter().enumerate() {
        writeln!(h, "  {:?},", entry_label(i + 1, f))?;
    }
    writeln!(h, "  {:?},", format!("{state_choice}. Display contract state"))?;
    writeln!(h, "  {:?},", format!("{exit_choice}. Exit"))?;
    writeln!(h, "];\n")?;

    writeln!(h, "const ERROR_HINTS: readonly {{ contains: string; hint: string }}[] = [")?;
    for hint in &options.error_hints {
        writeln!(h, "  {{ contains: {:?}, hint: {:?} }},", hint.contains, hint.hint)?;
    }
    writeln!(h, "];\n")?;

    write_helpers(h)?;

    // ---------------------------------------------------------------
    // 2. Dispatch loop
    // ---------------------------------------------------------------
    writeln!(h, "export async function runCli(")?;
    writeln!(h, "  contract: {binding},")?;
    writeln!(h, "  rl: LineReader,")?;
    writeln!(h, "  readState: () => Promise<Record<string, unknown>>,")?;
    writeln!(h, "): Promise<void> {{")?;
    writeln!(h, "  for (;;) {{")?;
    writeln!(h, "    console.log('\\n' + MENU.join('\\n'));")?;
    writeln!(h, "    const choice = (await rl.question('Select an option: ')).trim();")?;
    writeln!(h, "    switch (choice) {{")?;

    for (i, f) in iface.functions.iter().enumerate() {
        write_case(h, i + 1, f, &collector)?;
    }

    writeln!(h, "      case '{state_choice}': {{")?;
    writeln!(h, "        try {{")?;
    writeln!(h, "          const state = await readState();")?;
    for s in &iface.state_variables {
        writeln!(
            h,
            "          console.log({:?}, formatValue(state[{:?}]));",
            format!("{} ({}):", s.name, s.declared_type),
            s.name
        )?;
    }
    writeln!(h, "        }} catch (error) {{")?;
    writeln!(h, "          reportError('display contract state', error);")?;
    writeln!(h, "        }}")?;
    writeln!(h, "        break;")?;
    writeln!(h, "      }}")?;
    writeln!(h, "      case '{exit_choice}':")?;
    writeln!(h, "        console.log('Goodbye.');")?;
    writeln!(h, "        return;")?;
    writeln!(h, "      default:")?;
    writeln!(
        h,
        "        console.log(`✗ Invalid option \"${{choice}}\", choose 1-{exit_choice}`);"
    )?;
    writeln!(h, "    }}")?;
    writeln!(h, "  }}")?;
    writeln!(h, "}}")?;

    Ok(())
}

fn write_case(
    h: &mut String,
    number: usize,
    f: &FunctionSpec,
    collector: &ParameterCollector,
) -> fmt::Result {
    writeln!(h, "      case '{number}': {{")?;
    writeln!(h, "        try {{")?;
    for p in &f.parameters {
        let choices = collector.choices_for(p);
        writeln!(h, "          const {} = {};", ts_ident(&p.name), read_param(p, &choices))?;
    }
    let args: Vec<String> = std::iter::once("contract".to_string())
        .chain(f.parameters.iter().map(|p| ts_ident(&p.name)))
        .collect();
    writeln!(
        h,
        "          const result = await api.{}({});",
        ts_ident(&f.name),
        args.join(", ")
    )?;
    if f.mutates {
        writeln!(
            h,
            "          console.log(`✓ {} submitted: tx ${{result.transactionId}} at block ${{result.blockHeight}}`);",
            f.name
        )?;
    } else {
        writeln!(
            h,
            "          console.log(`✓ {} returned:`, formatValue(result));",
            f.name
        )?;
    }
    writeln!(h, "        }} catch (error) {{")?;
    writeln!(h, "          reportError({:?}, error);", f.name)?;
    writeln!(h, "        }}")?;
    writeln!(h, "        break;")?;
    writeln!(h, "      }}")
}

/// Expression reading one parameter. With `choices` the answer is picked
/// from a numbered list and its value runs through the usual conversion.
fn read_param(p: &ParamSpec, choices: &[&Choice]) -> String {
    let ask = if choices.is_empty() {
        let prompt = format!("{} ({}): ", p.name, p.declared_type);
        format!("await rl.question({prompt:?})")
    } else {
        let list = choices
            .iter()
            .map(|c| format!("{{ label: {:?}, value: {:?} }}", c.label, c.value))
            .collect::<Vec<_>>()
            .join(", ");
        format!("await pickChoice(rl, {:?}, [{list}])", p.name)
    };
    match param_kind(&p.declared_type) {
        ParamKind::Integer(range) => {
            let max = match &range.max {
                Some(m) => format!("{m}n"),
                None => "undefined".to_string(),
            };
            format!("parseInteger({:?}, {ask}, {}n, {max})", p.name, range.min)
        }
        ParamKind::Boolean => format!("parseBoolean({:?}, {ask})", p.name),
        ParamKind::Bytes => format!("parseBytes({ask})"),
        ParamKind::Text => ask,
    }
}

fn write_helpers(h: &mut String) -> fmt::Result {
    h.push_str(HELPERS);
    writeln!(h)
}

const HELPERS: &str = r#"const TRUTHY = ['true', 'yes', 'y', '1'];
const FALSY = ['false', 'no', 'n', '0'];

function parseInteger(name: string, text: string, min: bigint, max?: bigint): bigint {
  const trimmed = text.trim();
  if (!/^\d+$/.test(trimmed)) {
    throw new Error(`${name} expects an integer, got "${text}"`);
  }
  const value = BigInt(trimmed);
  if (value < min || (max !== undefined && value > max)) {
    throw new Error(`${name} must be within ${min}..=${max ?? ''}, got ${value}`);
  }
  return value;
}

function parseBoolean(name: string, text: string): boolean {
  const token = text.trim().toLowerCase();
  if (TRUTHY.includes(token)) return true;
  if (FALSY.includes(token)) return false;
  throw new Error(`${name} expects yes/no, got "${text}"`);
}

function parseBytes(text: string): Uint8Array {
  const trimmed = text.trim();
  if (/^0x([0-9a-fA-F]{2})*$/.test(trimmed)) {
    const hex = trimmed.slice(2);
    const out = new Uint8Array(hex.length / 2);
    for (let i = 0; i < out.length; i++) {
      out[i] = parseInt(hex.slice(i * 2, i * 2 + 2), 16);
    }
    return out;
  }
  return new TextEncoder().encode(text);
}

async function pickChoice(rl: LineReader, name: string, choices: readonly Choice[]): Promise<string> {
  console.log(`Select ${name}:`);
  choices.forEach((c, i) => console.log(`  ${i + 1}) ${c.label}`));
  const answer = (await rl.question(`Choice [1-${choices.length}]: `)).trim();
  const picked = /^\d+$/.test(answer) ? choices[Number(answer) - 1] : undefined;
  if (picked === undefined) {
    throw new Error(`${name}: "${answer}" is not one of the listed choices`);
  }
  return picked.value;
}

function formatValue(value: unknown): string {
  if (value instanceof Uint8Array) {
    return '0x' + Array.from(value, (b) => b.toString(16).padStart(2, '0')).join('');
  }
  if (typeof value === 'bigint') return value.toString();
  if (value === undefined) return '<unavailable>';
  return JSON.stringify(value, (_k, v) => (typeof v === 'bigint' ? v.toString() : v));
}

function reportError(operation: string, error: unknown): void {
  const message = error instanceof Error ? error.message : String(error);
  console.log(`✗ ${operation} failed: ${message}`);
  const hint = ERROR_HINTS.find((h) => message.includes(h.contains));
  if (hint !== undefined) {
    console.log(`  hint: ${hint.hint}`);
  }
}
"#;
