//! Declared DSL type → target type lookup.
//!
//! Fixed table, total: anything not listed maps to `TargetType::Unknown`
//! so an exotic ledger type never blocks generation.

use num_bigint::BigUint;
use num_traits::One;
use std::fmt;

use super::classify::is_void;

/// Widest `Uint<N>` that gets an explicit upper bound.
pub const MAX_UINT_BITS: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    /// Unsigned integer family; needs bignum range (up to and beyond u64).
    BigInt,
    Bytes,
    Boolean,
    Text,
    Void,
    Unknown,
}

impl TargetType {
    /// Spelling in generated TypeScript.
    pub fn ts_name(self) -> &'static str {
        match self {
            TargetType::BigInt => "bigint",
            TargetType::Bytes => "Uint8Array",
            TargetType::Boolean => "boolean",
            TargetType::Text => "string",
            TargetType::Void => "void",
            TargetType::Unknown => "unknown",
        }
    }
}

/// How the interactive collector should read a value for a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    Integer(IntegerRange),
    Boolean,
    Bytes,
    Text,
}

/// Inclusive range; `max == None` means unbounded above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegerRange {
    pub min: BigUint,
    pub max: Option<BigUint>,
}

impl IntegerRange {
    pub fn unbounded() -> Self {
        Self {
            min: BigUint::ZERO,
            max: None,
        }
    }

    pub fn inclusive(min: BigUint, max: BigUint) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    /// `0 ..= 2^bits - 1`. Widths past `MAX_UINT_BITS` are treated as
    /// unbounded.
    pub fn bits(bits: u32) -> Self {
        if bits > MAX_UINT_BITS {
            return Self::unbounded();
        }
        let max = (BigUint::one() << bits) - BigUint::one();
        Self::inclusive(BigUint::ZERO, max)
    }

    pub fn contains(&self, v: &BigUint) -> bool {
        *v >= self.min && self.max.as_ref().is_none_or(|m| v <= m)
    }
}

impl fmt::Display for IntegerRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.max {
            Some(max) => write!(f, "{}..={}", self.min, max),
            None => write!(f, "{}..", self.min),
        }
    }
}

/// Look up the target type for a declared type token.
pub fn map_type(declared: &str) -> TargetType {
    let declared = declared.trim();
    if is_void(declared) {
        return TargetType::Void;
    }
    if parse_bare_range(declared).is_some() {
        return TargetType::BigInt;
    }

    let (head, args) = split_generic(declared);
    match head {
        "Uint" | "Field" | "Counter" => TargetType::BigInt,
        "Bytes" => TargetType::Bytes,
        "Boolean" => TargetType::Boolean,
        "Opaque" if args == Some("\"string\"") => TargetType::Text,
        _ => TargetType::Unknown,
    }
}

/// Runtime parameter kind; everything that is not integer, boolean or
/// bytes is read as raw text.
pub fn param_kind(declared: &str) -> ParamKind {
    let declared = declared.trim();
    if let Some(range) = parse_bare_range(declared) {
        return ParamKind::Integer(range);
    }

    match map_type(declared) {
        TargetType::BigInt => ParamKind::Integer(integer_range(declared)),
        TargetType::Boolean => ParamKind::Boolean,
        TargetType::Bytes => ParamKind::Bytes,
        _ => ParamKind::Text,
    }
}

fn integer_range(declared: &str) -> IntegerRange {
    let (head, args) = split_generic(declared);
    let Some(args) = args.filter(|_| head == "Uint") else {
        return IntegerRange::unbounded();
    };

    if let Some(range) = parse_bare_range(args) {
        return range;
    }
    match args.trim().parse::<u32>() {
        Ok(bits) if bits > 0 => IntegerRange::bits(bits),
        _ => IntegerRange::unbounded(),
    }
}

/// `"0..3"` → `0..=3`
fn parse_bare_range(s: &str) -> Option<IntegerRange> {
    let (lo, hi) = s.split_once("..")?;
    let lo: BigUint = lo.trim().parse().ok()?;
    let hi: BigUint = hi.trim().parse().ok()?;
    Some(IntegerRange::inclusive(lo, hi))
}

/// `Map<A, B>` → (`Map`, Some(`A, B`))
fn split_generic(s: &str) -> (&str, Option<&str>) {
    match (s.find('<'), s.rfind('>')) {
        (Some(open), Some(close)) if close > open => (s[..open].trim(), Some(&s[open + 1..close])),
        _ => (s, None),
    }
}
