//! # Circuit Inputs
//!
//! Inputs arrive as a JSON object mapping signal names to values. A value is
//! an integer (JSON number or numeric string, decimal or `0x` hexadecimal,
//! possibly negative) or an array of values nested to any depth. Declaration
//! order is preserved; arrays stay nested until assignment, where they are
//! flattened depth-first.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Num;
use serde_json::Value;

use crate::error::{Result, SpecError};

/// Value tree of a single named input
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputValue {
    Scalar(BigInt),
    Array(Vec<InputValue>),
}

impl InputValue {
    /// Flatten into scalars, depth-first, left to right
    pub fn flatten(&self) -> Vec<BigInt> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(&self, out: &mut Vec<BigInt>) {
        match self {
            InputValue::Scalar(v) => out.push(v.clone()),
            InputValue::Array(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }

    /// Number of scalars after flattening
    pub fn len(&self) -> usize {
        match self {
            InputValue::Scalar(_) => 1,
            InputValue::Array(items) => items.iter().map(InputValue::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert a parsed JSON value
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => parse_integer(&n.to_string()).map(InputValue::Scalar),
            Value::String(s) => parse_integer(s).map(InputValue::Scalar),
            Value::Array(items) => items
                .iter()
                .map(InputValue::from_json)
                .collect::<Result<Vec<_>>>()
                .map(InputValue::Array),
            other => Err(SpecError::MalformedInput(format!(
                "expected an integer or an array, found {other}"
            ))),
        }
    }
}

impl From<BigInt> for InputValue {
    fn from(v: BigInt) -> Self {
        InputValue::Scalar(v)
    }
}

impl From<i64> for InputValue {
    fn from(v: i64) -> Self {
        InputValue::Scalar(BigInt::from(v))
    }
}

impl<T: Into<InputValue>> From<Vec<T>> for InputValue {
    fn from(items: Vec<T>) -> Self {
        InputValue::Array(items.into_iter().map(Into::into).collect())
    }
}

/// A named circuit input
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Input {
    pub name: String,
    pub value: InputValue,
}

impl Input {
    pub fn new(name: impl Into<String>, value: impl Into<InputValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Parse a JSON object of inputs, keeping declaration order
pub fn parse_inputs(text: &str) -> Result<Vec<Input>> {
    let root: Value = serde_json::from_str(text)?;
    let Value::Object(entries) = root else {
        return Err(SpecError::MalformedInput(
            "inputs must be a JSON object".to_string(),
        ));
    };

    entries
        .iter()
        .map(|(name, value)| {
            let value = InputValue::from_json(value).map_err(|e| match e {
                SpecError::MalformedInput(msg) => {
                    SpecError::MalformedInput(format!("input `{name}`: {msg}"))
                }
                other => other,
            })?;
            Ok(Input {
                name: name.clone(),
                value,
            })
        })
        .collect()
}

/// Parse an integer literal: optional sign, then decimal or `0x` hex digits
///
/// Only plain ASCII digits are accepted after the prefix; no inner signs and
/// no `_` separators.
pub fn parse_integer(text: &str) -> Result<BigInt> {
    let trimmed = text.trim();
    let (sign, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (Sign::Minus, rest),
        None => (Sign::Plus, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let (radix, digits) = match unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        Some(hex) => (16, hex),
        None => (10, unsigned),
    };

    let well_formed = !digits.is_empty() && digits.chars().all(|c| c.is_digit(radix));
    let magnitude = well_formed
        .then(|| BigUint::from_str_radix(digits, radix).ok())
        .flatten()
        .ok_or_else(|| SpecError::MalformedInput(format!("`{text}` is not an integer")))?;

    Ok(BigInt::from_biguint(sign, magnitude))
}
