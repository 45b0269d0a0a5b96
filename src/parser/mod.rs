//! Statement scanner for contract sources.
//!
//! Only two statement shapes are recognised:
//!   • `export [sealed] ledger NAME: TYPE;`
//!   • `export [pure] circuit NAME(params): RETURN { … }`
//!
//! Everything else is invisible. Scanning is total: a source without any
//! recognised statement yields an empty `RawContract`, and a malformed
//! declaration is skipped rather than reported.

pub mod lexer;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use crate::model::{ContractInterface, ParamSpec, RawCircuit, RawContract, StateSpec, VOID_TYPE};
use crate::processor;
use lexer::{Lexer, Token};

const LEDGER_MODIFIERS: &[&str] = &["sealed"];
const CIRCUIT_MODIFIERS: &[&str] = &["pure"];

/// Read a contract file from disk and analyze it.
pub fn load(path: &Path) -> Result<ContractInterface> {
    let src = std::fs::read_to_string(path)
        .with_context(|| format!("Reading {}", path.display()))?;
    info!("File loaded, size: {} bytes", src.len());

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(analyze(&src, &file_name))
}

/// Source text → `ContractInterface`. Never fails.
pub fn analyze(src: &str, file_name: &str) -> ContractInterface {
    let raw = parse_source(src);
    processor::run(&raw, file_name)
}

/// Scan raw source text into declarations exactly as written.
pub fn parse_source(src: &str) -> RawContract {
    let tokens: Vec<Token> = Lexer::new(src).collect();
    let mut scanner = Scanner { tokens, pos: 0 };
    let raw = scanner.scan();
    debug!(
        "Scanned {} circuits and {} ledger fields",
        raw.circuits.len(),
        raw.ledgers.len()
    );
    raw
}

struct Scanner {
    tokens: Vec<Token>,
    pos: usize,
}

impl Scanner {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.peek().is_some_and(|t| t.is_punct(c)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_ident(&mut self) -> Option<String> {
        match self.peek() {
            Some(Token::Ident(id)) => {
                let id = id.clone();
                self.pos += 1;
                Some(id)
            }
            _ => None,
        }
    }

    fn scan(&mut self) -> RawContract {
        let mut raw = RawContract::default();
        let mut doc: Vec<String> = Vec::new();

        while let Some(tok) = self.bump() {
            match tok {
                Token::Comment(line) => doc.push(line),
                Token::Ident(ref kw) if kw == "export" => {
                    let pending = std::mem::take(&mut doc);
                    self.scan_export(pending, &mut raw);
                }
                _ => doc.clear(),
            }
        }

        raw
    }

    /// Called right after `export`. On a malformed declaration the cursor
    /// is left wherever parsing stopped; the main loop resumes from there.
    fn scan_export(&mut self, doc: Vec<String>, raw: &mut RawContract) {
        let start = self.pos;
        let Some(mut kw) = self.eat_ident() else {
            return;
        };

        if LEDGER_MODIFIERS.contains(&kw.as_str()) || CIRCUIT_MODIFIERS.contains(&kw.as_str()) {
            match self.eat_ident() {
                Some(next) => kw = next,
                None => return,
            }
        }

        match kw.as_str() {
            "ledger" => match self.scan_ledger() {
                Some(state) => raw.ledgers.push(state),
                None => debug!("skipping malformed ledger declaration at token {start}"),
            },
            "circuit" => match self.scan_circuit(doc) {
                Some(circuit) => raw.circuits.push(circuit),
                None => debug!("skipping malformed circuit declaration at token {start}"),
            },
            _ => {}
        }
    }

    fn scan_ledger(&mut self) -> Option<StateSpec> {
        let name = self.eat_ident()?;
        if !self.eat_punct(':') {
            return None;
        }
        let ty = self.collect_until(|t| t.is_punct(';'));
        self.eat_punct(';');
        if ty.is_empty() {
            return None;
        }
        Some(StateSpec {
            name,
            declared_type: render_type(&ty),
        })
    }

    fn scan_circuit(&mut self, doc: Vec<String>) -> Option<RawCircuit> {
        let name = self.eat_ident()?;

        // generic circuit parameters, e.g. `circuit foo<T>(…)`
        if self.peek().is_some_and(|t| t.is_punct('<')) {
            self.skip_balanced();
        }

        if !self.eat_punct('(') {
            return None;
        }
        let params = self.collect_until(|t| t.is_punct(')'));
        if !self.eat_punct(')') {
            return None;
        }

        let return_type = if self.eat_punct(':') {
            let ty = self.collect_until(|t| t.is_punct('{') || t.is_punct(';'));
            render_type(&ty)
        } else {
            VOID_TYPE.to_string()
        };

        Some(RawCircuit {
            name,
            parameters: split_params(&params),
            return_type,
            doc,
        })
    }

    /// Collect tokens until `stop` matches at bracket depth zero, or until a
    /// top-level `export` (which means the statement was never closed).
    fn collect_until<F: Fn(&Token) -> bool>(&mut self, stop: F) -> Vec<Token> {
        let mut out = Vec::new();
        let mut depth = 0usize;

        while let Some(tok) = self.peek() {
            if depth == 0 && (stop(tok) || tok.is_ident("export")) {
                break;
            }
            match tok {
                Token::Punct('<' | '(' | '[') => depth += 1,
                Token::Punct('>' | ')' | ']') => depth = depth.saturating_sub(1),
                _ => {}
            }
            if !matches!(tok, Token::Comment(_)) {
                out.push(tok.clone());
            }
            self.pos += 1;
        }

        out
    }

    fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        while let Some(tok) = self.bump() {
            match tok {
                Token::Punct('<' | '(' | '[') => depth += 1,
                Token::Punct('>' | ')' | ']') => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }
}

/// Split a parameter list on top-level commas, then each parameter on its
/// first top-level colon. Commas inside `<…>`, `[…]` or `(…)` belong to the
/// type, so `m: Map<Bytes<32>, Uint<64>>` stays a single parameter.
fn split_params(tokens: &[Token]) -> Vec<ParamSpec> {
    let mut params = Vec::new();
    let mut depth = 0usize;
    let mut current: Vec<Token> = Vec::new();

    for tok in tokens {
        match tok {
            Token::Punct('<' | '(' | '[') => depth += 1,
            Token::Punct('>' | ')' | ']') => depth = depth.saturating_sub(1),
            Token::Punct(',') if depth == 0 => {
                if let Some(p) = to_param(&current) {
                    params.push(p);
                }
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(tok.clone());
    }
    if let Some(p) = to_param(&current) {
        params.push(p);
    }

    params
}

fn to_param(tokens: &[Token]) -> Option<ParamSpec> {
    if tokens.is_empty() {
        return None;
    }

    let colon = tokens.iter().position(|t| t.is_punct(':'));
    let (name_toks, type_toks) = match colon {
        Some(i) => (&tokens[..i], &tokens[i + 1..]),
        None => (tokens, &[][..]),
    };

    // `mut`-style prefixes are not part of the name; keep the last identifier
    let name = name_toks.iter().rev().find_map(|t| match t {
        Token::Ident(id) => Some(id.clone()),
        _ => None,
    })?;

    Some(ParamSpec {
        name,
        declared_type: render_type(type_toks),
    })
}

/// Re-assemble a type expression in canonical spelling: no whitespace
/// except one space after every comma.
pub fn render_type(tokens: &[Token]) -> String {
    let mut out = String::new();
    for tok in tokens {
        out.push_str(&tok.text());
        if tok.is_punct(',') {
            out.push(' ');
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, ty: &str) -> ParamSpec {
        ParamSpec {
            name: name.into(),
            declared_type: ty.into(),
        }
    }

    #[test]
    fn test_parse_ledger() {
        let test_cases = vec![
            (
                "export ledger round: Counter;",
                vec![StateSpec {
                    name: "round".into(),
                    declared_type: "Counter".into(),
                }],
            ),
            (
                "export sealed ledger owner: Bytes<32>;",
                vec![StateSpec {
                    name: "owner".into(),
                    declared_type: "Bytes<32>".into(),
                }],
            ),
            (
                "export ledger votes: Map<Bytes<32>,Uint<64>>;",
                vec![StateSpec {
                    name: "votes".into(),
                    declared_type: "Map<Bytes<32>, Uint<64>>".into(),
                }],
            ),
            // not exported, invisible
            ("ledger hidden: Field;", vec![]),
            // malformed: missing colon
            ("export ledger broken Field;", vec![]),
        ];

        for (input, expected) in test_cases {
            let raw = parse_source(input);
            assert_eq!(raw.ledgers, expected, "input: {input}");
        }
    }

    #[test]
    fn test_parse_circuit() {
        let test_cases = vec![
            (
                "export circuit increment(): [] { round.increment(1); }",
                RawCircuit {
                    name: "increment".into(),
                    parameters: vec![],
                    return_type: "[]".into(),
                    doc: vec![],
                },
            ),
            (
                "export circuit get_vote_count(index: Uint<8>): Uint<64> { return 0; }",
                RawCircuit {
                    name: "get_vote_count".into(),
                    parameters: vec![param("index", "Uint<8>")],
                    return_type: "Uint<64>".into(),
                    doc: vec![],
                },
            ),
            (
                "export pure circuit mix(a: Field, b: Boolean): Field { return a; }",
                RawCircuit {
                    name: "mix".into(),
                    parameters: vec![param("a", "Field"), param("b", "Boolean")],
                    return_type: "Field".into(),
                    doc: vec![],
                },
            ),
            (
                "// Register a voter\n// Only once per key\nexport circuit register(pk: Bytes<32>): [] {}",
                RawCircuit {
                    name: "register".into(),
                    parameters: vec![param("pk", "Bytes<32>")],
                    return_type: "[]".into(),
                    doc: vec!["Register a voter".into(), "Only once per key".into()],
                },
            ),
        ];

        for (input, expected) in test_cases {
            let raw = parse_source(input);
            assert_eq!(raw.circuits, vec![expected], "input: {input}");
        }
    }

    #[test]
    fn test_nested_generic_params_stay_whole() {
        let src = "export circuit put(m: Map<Bytes<32>, Uint<64>>, s: Set<Bytes<32>>, n: Uint<0..3>): [] {}";
        let raw = parse_source(src);

        assert_eq!(raw.circuits.len(), 1);
        assert_eq!(
            raw.circuits[0].parameters,
            vec![
                param("m", "Map<Bytes<32>, Uint<64>>"),
                param("s", "Set<Bytes<32>>"),
                param("n", "Uint<0..3>"),
            ]
        );
    }

    #[test]
    fn test_missing_return_type_defaults_to_void() {
        let raw = parse_source("export circuit reset() { }");
        assert_eq!(raw.circuits[0].return_type, VOID_TYPE);
    }

    #[test]
    fn test_comment_separated_by_code_is_not_doc() {
        let src = "// stray\nconst x = 1;\nexport circuit tick(): [] {}";
        let raw = parse_source(src);
        assert!(raw.circuits[0].doc.is_empty());
    }

    #[test]
    fn test_parser_is_total() {
        let test_cases = vec![
            "",
            "export",
            "export circuit",
            "export circuit f(",
            "export circuit f(a: Uint<8>",
            "export ledger",
            "export ledger x:",
            "}}}{{{ <<< >>> ,,, :::",
            "\"unterminated",
            "pragma language_version >= 0.14;",
        ];

        for input in test_cases {
            // must return, never panic
            let iface = analyze(input, "any.compact");
            assert!(iface.functions.len() <= 1, "input: {input}");
        }
    }

    #[test]
    fn test_scenario_a() {
        let src = "export ledger round: Counter;\n\nexport circuit increment(): [] {\n  round.increment(1);\n}\n";
        let iface = analyze(src, "counter.compact");

        assert_eq!(iface.contract_name, "Counter");
        assert_eq!(iface.functions.len(), 1);
        let f = &iface.functions[0];
        assert_eq!(f.name, "increment");
        assert!(f.parameters.is_empty());
        assert_eq!(f.return_type, "[]");
        assert!(f.mutates);
        assert_eq!(
            iface.state_variables,
            vec![StateSpec {
                name: "round".into(),
                declared_type: "Counter".into(),
            }]
        );
    }

    #[test]
    fn test_scenario_b() {
        let src = "export circuit get_vote_count(index: Uint<8>): Uint<64> { return votes.lookup(index); }";
        let iface = analyze(src, "voting.compact");

        let f = &iface.functions[0];
        assert!(!f.mutates);
        assert_eq!(f.parameters, vec![param("index", "Uint<8>")]);
    }
}
