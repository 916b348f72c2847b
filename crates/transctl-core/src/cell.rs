//! Typed cell values produced by record column accessors.

use std::cmp::Ordering;

use serde_json::{Value, json};

use crate::units::{
    ByteCount, ByteFormat, ByteUnit, Eta, KiLimit, Limit, Percent, Rate, Timestamp,
};

/// One value of one column of one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// The field was not fetched or not reported.
    Empty,
    /// Boolean flag.
    Bool(bool),
    /// Plain integer.
    Int(i64),
    /// Plain float.
    Float(f64),
    /// Free text.
    Text(String),
    /// Byte count.
    Bytes(ByteCount),
    /// Transfer rate.
    Rate(Rate),
    /// kB/s limit.
    Limit(Limit),
    /// KiB/s limit.
    KiLimit(KiLimit),
    /// Completion fraction.
    Percent(Percent),
    /// Remaining time.
    Eta(Eta),
    /// Point in time.
    Time(Timestamp),
    /// Enumeration with its wire code and label.
    Enum(i64, &'static str),
}

impl Cell {
    /// Build an optional cell, mapping `None` to [`Cell::Empty`].
    pub fn from_option<T>(value: Option<T>, build: impl FnOnce(T) -> Self) -> Self {
        value.map_or(Self::Empty, build)
    }

    /// Whether this cell holds a value.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Whether the cell participates in column totals.
    #[must_use]
    pub const fn is_byte_like(&self) -> bool {
        matches!(
            self,
            Self::Bytes(_) | Self::Rate(_) | Self::Limit(_) | Self::KiLimit(_)
        )
    }

    /// Whether the column reads best with larger values first.
    #[must_use]
    pub const fn prefers_descending(&self) -> bool {
        self.is_byte_like() || matches!(self, Self::Percent(_))
    }

    /// Render for table and flat output.
    #[must_use]
    pub fn render(&self, bytes: ByteFormat) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => format!("{value:.2}"),
            Self::Text(value) => value.clone(),
            Self::Bytes(value) => value.render(bytes),
            Self::Rate(value) => value.render(bytes),
            Self::Limit(value) => value.render(bytes),
            Self::KiLimit(value) => value.render(bytes),
            Self::Percent(value) => value.format(bytes.precision.max(2)),
            Self::Eta(value) => value.format(),
            Self::Time(value) => value.format(),
            Self::Enum(_, label) => (*label).to_string(),
        }
    }

    /// Sum of two cells of the same byte-like type; `Empty` is the identity.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Empty, value) | (value, Self::Empty) => value.clone(),
            (Self::Bytes(left), Self::Bytes(right)) => Self::Bytes(left.add(*right)),
            (Self::Rate(left), Self::Rate(right)) => Self::Rate(left.add(*right)),
            (Self::Limit(left), Self::Limit(right)) => Self::Limit(left.add(*right)),
            (Self::KiLimit(left), Self::KiLimit(right)) => Self::KiLimit(left.add(*right)),
            (left, _) => left.clone(),
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Float(_) => 2,
            Self::Bytes(_) | Self::Rate(_) | Self::Limit(_) | Self::KiLimit(_) => 3,
            Self::Percent(_) => 4,
            Self::Eta(_) => 5,
            Self::Time(_) => 6,
            Self::Enum(..) => 7,
            Self::Text(_) => 8,
        }
    }

    /// Typed ordering used for sorting; empty cells sort first.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(left), Self::Bool(right)) => left.cmp(right),
            (Self::Int(left), Self::Int(right)) => left.cmp(right),
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            (Self::Percent(left), Self::Percent(right)) => left.compare(*right),
            (Self::Eta(left), Self::Eta(right)) => left.cmp(right),
            (Self::Time(left), Self::Time(right)) => left.cmp(right),
            (Self::Enum(left, _), Self::Enum(right, _)) => left.cmp(right),
            (left, right) if left.rank() == right.rank() => match (left.number(), right.number())
            {
                (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            },
            (left, right) => left.rank().cmp(&right.rank()),
        }
    }

    /// Numeric view used by comparisons and the filter environment.
    #[must_use]
    pub fn number(&self) -> Option<f64> {
        use crate::units::i64_to_f64;
        match self {
            Self::Int(value) | Self::Enum(value, _) => Some(i64_to_f64(*value)),
            Self::Float(value) => Some(*value),
            Self::Bytes(value) => Some(i64_to_f64(value.bytes())),
            Self::Rate(value) => Some(i64_to_f64(value.bytes())),
            Self::Limit(value) => Some(i64_to_f64(value.bytes())),
            Self::KiLimit(value) => Some(i64_to_f64(value.bytes())),
            Self::Percent(value) => Some(value.0),
            Self::Eta(value) => Some(i64_to_f64(value.to_wire())),
            Self::Time(value) => Some(i64_to_f64(value.secs())),
            Self::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            Self::Empty | Self::Text(_) => None,
        }
    }

    /// Native JSON value for structured output.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Bool(value) => json!(value),
            Self::Int(value) | Self::Enum(value, _) => json!(value),
            Self::Float(value) => json!(value),
            Self::Text(value) => json!(value),
            Self::Bytes(value) => json!(value.0),
            Self::Rate(value) => json!(value.0),
            Self::Limit(value) => json!(value.0),
            Self::KiLimit(value) => json!(value.0),
            Self::Percent(value) => json!(value.0),
            Self::Eta(value) => json!(value.to_wire()),
            Self::Time(value) => json!(value.secs()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_cells_add_and_keep_type() {
        let total = Cell::Bytes(ByteCount(1024))
            .add(&Cell::Empty)
            .add(&Cell::Bytes(ByteCount(2048)));
        assert_eq!(total, Cell::Bytes(ByteCount(3072)));
        assert_eq!(total.render(ByteFormat::HUMAN), "3.0 KiB");
    }

    #[test]
    fn compare_uses_typed_value_not_text() {
        let small = Cell::Bytes(ByteCount(900));
        let large = Cell::Bytes(ByteCount(10_000));
        assert_eq!(small.compare(&large), Ordering::Less);
        assert_eq!(Cell::Empty.compare(&small), Ordering::Less);
        assert_eq!(
            Cell::Enum(4, "Downloading").compare(&Cell::Enum(0, "Stopped")),
            Ordering::Greater
        );
    }

    #[test]
    fn descending_preference_follows_type() {
        assert!(Cell::Percent(Percent(0.5)).prefers_descending());
        assert!(Cell::Rate(Rate(1)).prefers_descending());
        assert!(!Cell::Text("a".into()).prefers_descending());
    }
}
