//! The functional core: raw declarations → classified `ContractInterface`.
pub mod classify;
pub mod types;

use std::collections::HashSet;
use tracing::warn;

use crate::model::{ContractInterface, FunctionSpec, RawContract};

/// Runs every analysis pass and returns the interface handed to writers
/// and to the interactive engine.
pub fn run(raw: &RawContract, file_name: &str) -> ContractInterface {
    let contract_name = contract_name_from_file(file_name);
    let mut seen = HashSet::new();
    let mut functions = Vec::with_capacity(raw.circuits.len());

    for circuit in &raw.circuits {
        if !seen.insert(circuit.name.as_str()) {
            warn!("duplicate circuit `{}` ignored", circuit.name);
            continue;
        }

        let description = if circuit.doc.is_empty() {
            format!("Execute {}", circuit.name)
        } else {
            circuit.doc.join(" ")
        };

        functions.push(FunctionSpec {
            name: circuit.name.clone(),
            parameters: circuit.parameters.clone(),
            return_type: circuit.return_type.clone(),
            mutates: classify::mutates(&circuit.name, &circuit.return_type),
            description,
        });
    }

    let iface = ContractInterface {
        contract_name,
        functions,
        state_variables: raw.ledgers.clone(),
    };

    if iface.is_empty() {
        warn!("no exported circuits or ledger fields found in {file_name}");
    }
    iface
}

/// `voting-booth.compact` → `VotingBooth`
pub fn contract_name_from_file(file_name: &str) -> String {
    let stem = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .split('.')
        .next()
        .unwrap_or_default();

    let name: String = stem
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect();

    if name.is_empty() {
        "Contract".to_string()
    } else {
        name
    }
}

/// `get_vote_count` → `Get Vote Count`
pub fn title_case(name: &str) -> String {
    name.split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ParamSpec, RawCircuit};

    fn circuit(name: &str, ret: &str, doc: &[&str]) -> RawCircuit {
        RawCircuit {
            name: name.into(),
            parameters: vec![],
            return_type: ret.into(),
            doc: doc.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_contract_names() {
        let test_cases = vec![
            ("counter.compact", "Counter"),
            ("voting-booth.compact", "VotingBooth"),
            ("contracts/my_token.compact", "MyToken"),
            ("", "Contract"),
            (".compact", "Contract"),
        ];

        for (file, expected) in test_cases {
            assert_eq!(contract_name_from_file(file), expected, "{file}");
        }
    }

    #[test]
    fn test_title_case() {
        let test_cases = vec![
            ("increment", "Increment"),
            ("get_vote_count", "Get Vote Count"),
            ("__private__thing", "Private Thing"),
            ("castVote", "CastVote"),
        ];

        for (name, expected) in test_cases {
            assert_eq!(title_case(name), expected);
        }
    }

    #[test]
    fn test_duplicate_circuits_keep_first() {
        let mut first = circuit("vote", "[]", &[]);
        first.parameters.push(ParamSpec {
            name: "choice".into(),
            declared_type: "Uint<8>".into(),
        });
        let raw = RawContract {
            circuits: vec![first, circuit("vote", "Field", &[]), circuit("tally", "Field", &[])],
            ledgers: vec![],
        };

        let iface = run(&raw, "v.compact");
        let names: Vec<_> = iface.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["vote", "tally"]);
        assert_eq!(iface.functions[0].parameters.len(), 1);
        assert!(iface.functions[0].mutates);
    }

    #[test]
    fn test_descriptions() {
        let raw = RawContract {
            circuits: vec![
                circuit("vote", "[]", &["Cast a vote", "for an option"]),
                circuit("tally", "Field", &[]),
            ],
            ledgers: vec![],
        };

        let iface = run(&raw, "v.compact");
        assert_eq!(iface.functions[0].description, "Cast a vote for an option");
        assert_eq!(iface.functions[1].description, "Execute tally");
    }

    #[test]
    fn test_empty_source_yields_empty_interface() {
        let iface = run(&RawContract::default(), "nothing.compact");
        assert_eq!(iface, ContractInterface::empty("Nothing"));
    }
}
