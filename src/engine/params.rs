//! Turning typed user input into `ArgValue`s.
//!
//! Free-text conversion follows the parameter's declared type. Names that
//! match a choice rule get a closed, numbered prompt instead; rules are
//! checked in order and the first match wins.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::io::Write;

use super::binding::ArgValue;
use super::reader::LineReader;
use crate::error::{ParameterError, PromptError};
use crate::model::ParamSpec;
use crate::processor::types::{ParamKind, param_kind};

const TRUTHY: &[&str] = &["true", "yes", "y", "1"];
const FALSY: &[&str] = &["false", "no", "n", "0"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    /// Text fed through the normal conversion once picked.
    pub value: String,
}

/// Parameters whose name contains `name_contains` (case-insensitive) are
/// asked as a numbered choice list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRule {
    pub name_contains: String,
    pub choices: Vec<Choice>,
}

impl ChoiceRule {
    pub fn matches(&self, param_name: &str) -> bool {
        param_name
            .to_ascii_lowercase()
            .contains(&self.name_contains.to_ascii_lowercase())
    }
}

pub fn default_choice_rules() -> Vec<ChoiceRule> {
    vec![ChoiceRule {
        name_contains: "index".to_string(),
        choices: ["A", "B", "C", "D"]
            .iter()
            .enumerate()
            .map(|(i, letter)| Choice {
                label: format!("Option {letter}"),
                value: i.to_string(),
            })
            .collect(),
    }]
}

/// Convert one line of free text for `param`.
pub fn convert(param: &ParamSpec, input: &str) -> Result<ArgValue, ParameterError> {
    let name = &param.name;
    match param_kind(&param.declared_type) {
        ParamKind::Integer(range) => {
            let trimmed = input.trim();
            let value: BigUint = trimmed
                .parse()
                .ok()
                .filter(|_| trimmed.chars().all(|c| c.is_ascii_digit()))
                .ok_or_else(|| ParameterError::NotAnInteger {
                    name: name.clone(),
                    input: input.to_string(),
                })?;
            if !range.contains(&value) {
                return Err(ParameterError::OutOfRange {
                    name: name.clone(),
                    range: range.to_string(),
                    value: value.to_string(),
                });
            }
            Ok(ArgValue::Integer(value))
        }
        ParamKind::Boolean => {
            let token = input.trim().to_ascii_lowercase();
            if TRUTHY.contains(&token.as_str()) {
                Ok(ArgValue::Boolean(true))
            } else if FALSY.contains(&token.as_str()) {
                Ok(ArgValue::Boolean(false))
            } else {
                Err(ParameterError::NotABoolean {
                    name: name.clone(),
                    input: input.to_string(),
                })
            }
        }
        ParamKind::Bytes => {
            let trimmed = input.trim();
            match trimmed
                .strip_prefix("0x")
                .or_else(|| trimmed.strip_prefix("0X"))
            {
                Some(digits) => hex::decode(digits)
                    .map(ArgValue::Bytes)
                    .map_err(|e| ParameterError::InvalidHex {
                        name: name.clone(),
                        reason: e.to_string(),
                    }),
                // length is the binding's business
                None => Ok(ArgValue::Bytes(input.as_bytes().to_vec())),
            }
        }
        ParamKind::Text => Ok(ArgValue::Text(input.to_string())),
    }
}

pub struct ParameterCollector {
    rules: Vec<ChoiceRule>,
}

impl ParameterCollector {
    pub fn new(rules: Vec<ChoiceRule>) -> Self {
        Self { rules }
    }

    pub fn rule_for(&self, param_name: &str) -> Option<&ChoiceRule> {
        self.rules.iter().find(|r| r.matches(param_name))
    }

    /// Choices of the matching rule that are valid for the parameter's
    /// type. Empty when no rule applies.
    pub fn choices_for(&self, param: &ParamSpec) -> Vec<&Choice> {
        let Some(rule) = self.rule_for(&param.name) else {
            return Vec::new();
        };
        rule.choices
            .iter()
            .filter(|c| convert(param, &c.value).is_ok())
            .collect()
    }

    /// Ask for one parameter and convert the answer.
    pub async fn collect<R, W>(
        &self,
        param: &ParamSpec,
        reader: &mut R,
        out: &mut W,
    ) -> Result<ArgValue, PromptError>
    where
        R: LineReader + ?Sized,
        W: Write + ?Sized,
    {
        let choices = self.choices_for(param);

        if choices.is_empty() {
            let prompt = format!("{} ({}): ", param.name, param.declared_type);
            let line = reader
                .question(&prompt)
                .await?
                .ok_or_else(|| closed(param))?;
            return Ok(convert(param, &line)?);
        }

        writeln!(out, "Select {}:", param.name)?;
        for (i, choice) in choices.iter().enumerate() {
            writeln!(out, "  {}) {}", i + 1, choice.label)?;
        }
        let prompt = format!("Choice [1-{}]: ", choices.len());
        let line = reader
            .question(&prompt)
            .await?
            .ok_or_else(|| closed(param))?;

        let picked = line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| choices.get(i))
            .ok_or_else(|| ParameterError::InvalidChoice {
                name: param.name.clone(),
                input: line.clone(),
            })?;

        Ok(convert(param, &picked.value)?)
    }
}

fn closed(param: &ParamSpec) -> ParameterError {
    ParameterError::InputClosed {
        name: param.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::reader::ScriptedReader;

    fn param(name: &str, ty: &str) -> ParamSpec {
        ParamSpec {
            name: name.into(),
            declared_type: ty.into(),
        }
    }

    #[test]
    fn test_bounded_integer_conversion() {
        let p = param("n", "0..3");
        assert_eq!(convert(&p, "2"), Ok(ArgValue::Integer(2u32.into())));
        assert_eq!(convert(&p, " 3 "), Ok(ArgValue::Integer(3u32.into())));
        assert!(matches!(
            convert(&p, "7"),
            Err(ParameterError::OutOfRange { .. })
        ));
        assert!(matches!(
            convert(&p, "abc"),
            Err(ParameterError::NotAnInteger { .. })
        ));
        assert!(matches!(
            convert(&p, "-1"),
            Err(ParameterError::NotAnInteger { .. })
        ));
        assert!(matches!(
            convert(&p, "+2"),
            Err(ParameterError::NotAnInteger { .. })
        ));
    }

    #[test]
    fn test_conversions_by_type() {
        let test_cases = vec![
            (param("n", "Uint<64>"), "18446744073709551615", Ok(ArgValue::Integer(u64::MAX.into()))),
            (param("f", "Field"), "123456789012345678901234567890", Ok(ArgValue::Integer("123456789012345678901234567890".parse().unwrap()))),
            (param("b", "Boolean"), "YES", Ok(ArgValue::Boolean(true))),
            (param("b", "Boolean"), "n", Ok(ArgValue::Boolean(false))),
            (param("k", "Bytes<32>"), "0xdeadBEEF", Ok(ArgValue::Bytes(vec![0xde, 0xad, 0xbe, 0xef]))),
            (param("k", "Bytes<32>"), "hi", Ok(ArgValue::Bytes(b"hi".to_vec()))),
            (param("s", "Opaque<\"string\">"), " as is ", Ok(ArgValue::Text(" as is ".into()))),
            (param("m", "Maybe<Field>"), "whatever", Ok(ArgValue::Text("whatever".into()))),
        ];

        for (p, input, expected) in test_cases {
            assert_eq!(convert(&p, input), expected, "{} <- {input}", p.declared_type);
        }
    }

    #[test]
    fn test_conversion_failures() {
        let test_cases = vec![
            (param("n", "Uint<8>"), "256"),
            (param("b", "Boolean"), "maybe"),
            (param("k", "Bytes<32>"), "0xabc"),
            (param("k", "Bytes<32>"), "0xzz"),
        ];

        for (p, input) in test_cases {
            assert!(convert(&p, input).is_err(), "{} <- {input}", p.declared_type);
        }
    }

    #[test]
    fn test_rule_priority() {
        let collector = ParameterCollector::new(vec![
            ChoiceRule {
                name_contains: "choice_index".into(),
                choices: vec![Choice {
                    label: "First".into(),
                    value: "0".into(),
                }],
            },
            ChoiceRule {
                name_contains: "index".into(),
                choices: vec![],
            },
        ]);

        assert_eq!(
            collector.rule_for("choice_index").map(|r| r.name_contains.as_str()),
            Some("choice_index")
        );
        assert_eq!(
            collector.rule_for("Row_INDEX").map(|r| r.name_contains.as_str()),
            Some("index")
        );
        assert!(collector.rule_for("amount").is_none());
    }

    #[test]
    fn test_choices_filtered_by_range() {
        let collector = ParameterCollector::new(default_choice_rules());
        assert_eq!(collector.choices_for(&param("index", "Uint<0..1>")).len(), 2);
        assert_eq!(collector.choices_for(&param("index", "Uint<8>")).len(), 4);
        assert!(collector.choices_for(&param("amount", "Uint<8>")).is_empty());
    }

    #[tokio::test]
    async fn test_choice_prompt_overrides_free_text() {
        let collector = ParameterCollector::new(default_choice_rules());
        let mut reader = ScriptedReader::new(["3"]);
        let mut out = Vec::new();

        let value = collector
            .collect(&param("choice_index", "Uint<8>"), &mut reader, &mut out)
            .await
            .unwrap();

        assert_eq!(value, ArgValue::Integer(2u32.into()));
        assert_eq!(reader.prompts, vec!["Choice [1-4]: ".to_string()]);
        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("Select choice_index:"));
        assert!(shown.contains("  3) Option C"));
    }

    #[tokio::test]
    async fn test_invalid_choice() {
        let collector = ParameterCollector::new(default_choice_rules());
        let mut reader = ScriptedReader::new(["9"]);
        let mut out = Vec::new();

        let err = collector
            .collect(&param("index", "Uint<8>"), &mut reader, &mut out)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PromptError::Parameter(ParameterError::InvalidChoice { .. })
        ));
    }

    #[tokio::test]
    async fn test_free_text_prompt() {
        let collector = ParameterCollector::new(default_choice_rules());
        let mut reader = ScriptedReader::new(["true"]);
        let mut out = Vec::new();

        let value = collector
            .collect(&param("approve", "Boolean"), &mut reader, &mut out)
            .await
            .unwrap();

        assert_eq!(value, ArgValue::Boolean(true));
        assert_eq!(reader.prompts, vec!["approve (Boolean): ".to_string()]);
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_closed_input() {
        let collector = ParameterCollector::new(vec![]);
        let mut reader = ScriptedReader::new(Vec::<String>::new());
        let mut out = Vec::new();

        let err = collector
            .collect(&param("n", "Field"), &mut reader, &mut out)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PromptError::Parameter(ParameterError::InputClosed { .. })
        ));
    }
}
