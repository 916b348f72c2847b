//! Typed evaluation of parsed expressions.

use std::cmp::Ordering;
use std::collections::HashMap;

use globset::Glob;
use transctl_core::Cell;

use crate::ast::{BinaryOp, Expr, Function, Literal, UnaryOp};
use crate::error::ExprError;

/// Runtime value of a filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Field absent from the record.
    Null,
    /// Boolean.
    Bool(bool),
    /// Any numeric quantity, byte-like values in bytes.
    Number(f64),
    /// String.
    Text(String),
    /// Enumeration: compares equal to its code or (case-insensitively) its label.
    Label {
        /// Wire code.
        code: f64,
        /// Display label.
        label: &'static str,
    },
}

impl Value {
    /// Type name used in diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::Label { .. } => "enum",
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) | Self::Label { code: value, .. } => Some(*value),
            Self::Text(text) => text.trim().parse().ok(),
            Self::Bool(_) | Self::Null => None,
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Label { label, .. } => Some((*label).to_string()),
            Self::Number(value) => Some(value.to_string()),
            Self::Bool(_) | Self::Null => None,
        }
    }

    fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Null, _) | (_, Self::Null) => false,
            (Self::Bool(left), Self::Bool(right)) => left == right,
            (Self::Text(left), Self::Text(right)) => left == right,
            (Self::Label { label, .. }, Self::Text(text))
            | (Self::Text(text), Self::Label { label, .. })
                if text.eq_ignore_ascii_case(label) =>
            {
                true
            }
            (left, right) => match (left.as_number(), right.as_number()) {
                (Some(left), Some(right)) => (left - right).abs() < f64::EPSILON,
                _ => false,
            },
        }
    }
}

impl From<&Cell> for Value {
    #[expect(
        clippy::cast_precision_loss,
        reason = "enum codes are small integers"
    )]
    fn from(cell: &Cell) -> Self {
        match cell {
            Cell::Empty => Self::Null,
            Cell::Bool(value) => Self::Bool(*value),
            Cell::Text(text) => Self::Text(text.clone()),
            Cell::Enum(code, label) => Self::Label {
                code: *code as f64,
                label: *label,
            },
            other => other.number().map_or(Self::Null, Self::Number),
        }
    }
}

/// Variable bindings for one evaluation.
pub trait Env {
    /// Value of `name`; [`Value::Null`] when unbound.
    fn lookup(&self, name: &str) -> Value;
}

impl Env for HashMap<String, Value> {
    fn lookup(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or(Value::Null)
    }
}

fn mismatch(op: BinaryOp, left: &Value, right: &Value) -> ExprError {
    ExprError::TypeMismatch {
        operator: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

fn truthy(op: BinaryOp, value: &Value, other: &Value) -> Result<bool, ExprError> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::Null => Ok(false),
        _ => Err(mismatch(op, value, other)),
    }
}

/// Evaluate `expr` against `env`.
///
/// Absent fields evaluate to null: comparisons against null are false,
/// arithmetic with null yields null, and `&&`/`||` treat it as false.
///
/// # Errors
///
/// Fails on operand type mismatches and invalid glob patterns.
#[expect(
    clippy::cast_precision_loss,
    reason = "string lengths stay far below 2^52"
)]
pub fn evaluate(expr: &Expr, env: &dyn Env) -> Result<Value, ExprError> {
    match expr {
        Expr::Literal(Literal::Number(value)) => Ok(Value::Number(*value)),
        Expr::Literal(Literal::Str(text)) => Ok(Value::Text(text.clone())),
        Expr::Literal(Literal::Bool(flag)) => Ok(Value::Bool(*flag)),
        Expr::Var(name) => Ok(env.lookup(name)),
        Expr::Unary(op, operand) => unary(*op, evaluate(operand, env)?),
        Expr::Binary(op @ (BinaryOp::And | BinaryOp::Or), left, right) => {
            let left = evaluate(left, env)?;
            let left_true = truthy(*op, &left, &Value::Null)?;
            match (op, left_true) {
                (BinaryOp::And, false) => Ok(Value::Bool(false)),
                (BinaryOp::Or, true) => Ok(Value::Bool(true)),
                _ => {
                    let right = evaluate(right, env)?;
                    truthy(*op, &right, &left).map(Value::Bool)
                }
            }
        }
        Expr::Binary(op, left, right) => binary(*op, &evaluate(left, env)?, &evaluate(right, env)?),
        Expr::Call(Function::StrLen, args) => {
            let value = match args.first() {
                Some(arg) => evaluate(arg, env)?,
                None => Value::Null,
            };
            match value {
                Value::Null => Ok(Value::Number(0.0)),
                other => other
                    .as_text()
                    .map(|text| Value::Number(text.chars().count() as f64))
                    .ok_or_else(|| ExprError::TypeMismatch {
                        operator: "strlen",
                        left: other.type_name(),
                        right: "none",
                    }),
            }
        }
    }
}

fn unary(op: UnaryOp, value: Value) -> Result<Value, ExprError> {
    match (op, value) {
        (UnaryOp::Not, Value::Bool(flag)) => Ok(Value::Bool(!flag)),
        (UnaryOp::Not, Value::Null) => Ok(Value::Bool(true)),
        (UnaryOp::Neg, Value::Null) => Ok(Value::Null),
        (UnaryOp::Neg, value) => numeric(&value)
            .map(|number| Value::Number(-number))
            .ok_or(ExprError::TypeMismatch {
                operator: "-",
                left: value.type_name(),
                right: "none",
            }),
        (UnaryOp::Not, value) => Err(ExprError::TypeMismatch {
            operator: "!",
            left: value.type_name(),
            right: "none",
        }),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, ExprError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left.loose_eq(right))),
        BinaryOp::Ne => Ok(Value::Bool(!left.loose_eq(right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let Some(ordering) = compare(op, left, right)? else {
                return Ok(Value::Bool(false));
            };
            Ok(Value::Bool(match op {
                BinaryOp::Lt => ordering == Ordering::Less,
                BinaryOp::Le => ordering != Ordering::Greater,
                BinaryOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        BinaryOp::Glob | BinaryOp::PrefixI => {
            if matches!(left, Value::Null) || matches!(right, Value::Null) {
                return Ok(Value::Bool(false));
            }
            let (Some(text), Some(pattern)) = (left.as_text(), right.as_text()) else {
                return Err(mismatch(op, left, right));
            };
            if op == BinaryOp::PrefixI {
                return Ok(Value::Bool(
                    text.to_lowercase().starts_with(&pattern.to_lowercase()),
                ));
            }
            let matcher = Glob::new(&pattern)
                .map_err(|source| ExprError::Glob {
                    pattern: pattern.clone(),
                    source,
                })?
                .compile_matcher();
            Ok(Value::Bool(matcher.is_match(&text)))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            if let (BinaryOp::Add, Value::Text(head), Value::Text(tail)) = (op, left, right) {
                return Ok(Value::Text(format!("{head}{tail}")));
            }
            if matches!(left, Value::Null) || matches!(right, Value::Null) {
                return Ok(Value::Null);
            }
            let (Some(a), Some(b)) = (numeric(left), numeric(right)) else {
                return Err(mismatch(op, left, right));
            };
            Ok(Value::Number(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a % b,
            }))
        }
        BinaryOp::And | BinaryOp::Or => {
            let left = truthy(op, left, right)?;
            let right = truthy(op, right, &Value::Null)?;
            Ok(Value::Bool(if op == BinaryOp::And {
                left && right
            } else {
                left || right
            }))
        }
    }
}

/// Numbers and enum codes only; strings never take part in arithmetic.
const fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) | Value::Label { code: number, .. } => Some(*number),
        _ => None,
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Option<Ordering>, ExprError> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => Ok(None),
        (Value::Text(left), Value::Text(right)) => Ok(Some(left.cmp(right))),
        (Value::Bool(_), _) | (_, Value::Bool(_)) => Err(mismatch(op, left, right)),
        _ => match (left.as_number(), right.as_number()) {
            (Some(a), Some(b)) => Ok(a.partial_cmp(&b)),
            _ => Err(mismatch(op, left, right)),
        },
    }
}

/// Evaluate `expr` and require a boolean result.
///
/// # Errors
///
/// Propagates evaluation errors; any non-boolean result is
/// [`ExprError::NotBoolean`].
pub fn matches(expr: &Expr, env: &dyn Env) -> Result<bool, ExprError> {
    match evaluate(expr, env)? {
        Value::Bool(flag) => Ok(flag),
        other => Err(ExprError::NotBoolean {
            found: other.type_name(),
        }),
    }
}
