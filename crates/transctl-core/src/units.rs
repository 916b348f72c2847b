//! Wire-tolerant value types with human formatting.
//!
//! # Design
//! - Byte-like values share the [`ByteUnit`] trait; they differ only in the
//!   scale applied before display and in the `/s` suffix.
//! - Every decoder accepts the integer the daemons send as well as floats
//!   (some qBittorrent builds report sizes as `1.0e9`).
//! - Sentinel-bearing values ([`Eta`], [`Timestamp`]) encode back to the
//!   integer they were decoded from.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Local};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

const SI_UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];
const IEC_UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Byte rendering options threaded from the CLI into every cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteFormat {
    /// Render with unit suffixes; otherwise emit the raw byte count.
    pub human: bool,
    /// Use 1024-based units instead of 1000-based ones.
    pub iec: bool,
    /// Significant digits kept for scaled values.
    pub precision: usize,
}

impl ByteFormat {
    /// Human-readable IEC formatting with two significant digits.
    pub const HUMAN: Self = Self {
        human: true,
        iec: true,
        precision: 2,
    };

    /// Raw integer formatting.
    pub const RAW: Self = Self {
        human: false,
        iec: true,
        precision: 2,
    };
}

impl Default for ByteFormat {
    fn default() -> Self {
        Self::HUMAN
    }
}

/// Render a byte quantity with 1000- or 1024-based suffixes.
///
/// `precision` counts significant digits: `3072` at IEC/2 is `3.0 KiB`,
/// `1_500_000_000` at SI/3 is `1.50 GB`. Values below one unit keep their
/// exact integer.
#[must_use]
pub fn format_bytes(bytes: i64, iec: bool, precision: usize, suffix: &str) -> String {
    let (base, units) = if iec {
        (1024.0, IEC_UNITS)
    } else {
        (1000.0, SI_UNITS)
    };
    let mut value = i64_to_f64(bytes).abs();
    if value < base {
        return format!("{bytes} B{suffix}");
    }
    let mut unit = 0;
    while value >= base && unit + 1 < units.len() {
        value /= base;
        unit += 1;
    }
    let decimals = precision.saturating_sub(integer_digits(value));
    let sign = if bytes < 0 { "-" } else { "" };
    format!("{sign}{value:.decimals$} {}{suffix}", units[unit])
}

fn integer_digits(mut value: f64) -> usize {
    let mut digits = 1;
    while value >= 10.0 {
        value /= 10.0;
        digits += 1;
    }
    digits
}

#[expect(
    clippy::cast_precision_loss,
    reason = "byte counts are only rendered approximately"
)]
pub(crate) const fn i64_to_f64(value: i64) -> f64 {
    value as f64
}

/// Shared behaviour of byte-like quantities.
pub trait ByteUnit: Copy {
    /// Multiplier from the wire integer to bytes.
    const SCALE: i64;
    /// Suffix appended after the unit (`/s` for rates).
    const SUFFIX: &'static str;

    /// Wire integer.
    fn as_i64(self) -> i64;

    /// Build from the wire integer.
    fn from_i64(value: i64) -> Self;

    /// Value in bytes.
    fn bytes(self) -> i64 {
        self.as_i64().saturating_mul(Self::SCALE)
    }

    /// Human-readable rendering.
    fn format(self, iec: bool, precision: usize) -> String {
        format_bytes(self.bytes(), iec, precision, Self::SUFFIX)
    }

    /// Render per the CLI byte options.
    fn render(self, options: ByteFormat) -> String {
        if options.human {
            self.format(options.iec, options.precision)
        } else {
            self.bytes().to_string()
        }
    }

    /// Sum preserving the concrete type.
    #[must_use]
    fn add(self, other: Self) -> Self {
        Self::from_i64(self.as_i64().saturating_add(other.as_i64()))
    }
}

macro_rules! byte_unit {
    ($(#[$meta:meta])* $name:ident, scale = $scale:expr, suffix = $suffix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub i64);

        impl ByteUnit for $name {
            const SCALE: i64 = $scale;
            const SUFFIX: &'static str = $suffix;

            fn as_i64(self) -> i64 {
                self.0
            }

            fn from_i64(value: i64) -> Self {
                Self(value)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_i64(self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserialize_lenient_i64(deserializer).map(Self)
            }
        }
    };
}

byte_unit!(
    /// Count of bytes.
    ByteCount,
    scale = 1,
    suffix = ""
);
byte_unit!(
    /// Transfer rate in bytes per second.
    Rate,
    scale = 1,
    suffix = "/s"
);
byte_unit!(
    /// Speed limit in kilobytes (1000) per second.
    Limit,
    scale = 1000,
    suffix = "/s"
);
byte_unit!(
    /// Speed limit in kibibytes (1024) per second.
    KiLimit,
    scale = 1024,
    suffix = "/s"
);

struct LenientI64;

impl Visitor<'_> for LenientI64 {
    type Value = i64;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an integer")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
        Ok(value)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
        i64::try_from(value).map_err(|_| E::custom("integer out of range"))
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "fractional byte counts are truncated"
    )]
    fn visit_f64<E: de::Error>(self, value: f64) -> Result<i64, E> {
        if value.is_finite() {
            Ok(value as i64)
        } else {
            Err(E::custom("non-finite number"))
        }
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<i64, E> {
        Ok(i64::from(value))
    }
}

/// Decode an integer, accepting floats and booleans.
///
/// # Errors
///
/// Returns an error when the value is neither numeric nor boolean.
pub fn deserialize_lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    deserializer.deserialize_any(LenientI64)
}

/// Completion fraction in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(pub f64);

impl Percent {
    /// Fraction of `part` over `whole`; an empty whole counts as complete.
    #[must_use]
    pub fn of(part: i64, whole: i64) -> Self {
        if whole == 0 {
            Self(1.0)
        } else {
            Self(i64_to_f64(part) / i64_to_f64(whole))
        }
    }

    /// Render as a percentage with `precision` significant digits.
    #[must_use]
    pub fn format(self, precision: usize) -> String {
        let value = self.0 * 100.0;
        let decimals = precision.saturating_sub(integer_digits(value.abs()));
        format!("{value:.decimals$}%")
    }

    /// Ordering that treats NaN as equal.
    #[must_use]
    pub fn compare(self, other: Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

/// Estimated time remaining.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Eta {
    /// Wire `0`: no estimate reported.
    #[default]
    Absent,
    /// Wire `-1`: the transfer is done.
    Done,
    /// Wire `-2` (or any other negative): unknown.
    Unknown,
    /// Positive number of seconds.
    Seconds(i64),
}

impl Eta {
    /// Decode from the wire integer.
    #[must_use]
    pub const fn from_wire(value: i64) -> Self {
        match value {
            0 => Self::Absent,
            -1 => Self::Done,
            value if value < 0 => Self::Unknown,
            value => Self::Seconds(value),
        }
    }

    /// Encode to the wire integer.
    #[must_use]
    pub const fn to_wire(self) -> i64 {
        match self {
            Self::Absent => 0,
            Self::Done => -1,
            Self::Unknown => -2,
            Self::Seconds(value) => value,
        }
    }

    const fn rank(self) -> (u8, i64) {
        match self {
            Self::Absent => (0, 0),
            Self::Done => (1, 0),
            Self::Seconds(value) => (2, value),
            Self::Unknown => (3, 0),
        }
    }

    /// Human-readable rendering (`1h2m5s`, `Done`, `Unknown`).
    #[must_use]
    pub fn format(self) -> String {
        match self {
            Self::Absent => String::new(),
            Self::Done => "Done".to_string(),
            Self::Unknown => "Unknown".to_string(),
            Self::Seconds(total) => format_duration(total),
        }
    }
}

impl Ord for Eta {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Eta {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for Eta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_wire())
    }
}

impl<'de> Deserialize<'de> for Eta {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_lenient_i64(deserializer).map(Self::from_wire)
    }
}

fn format_duration(total: i64) -> String {
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    let mut out = String::new();
    for (value, unit) in [(days, 'd'), (hours, 'h'), (minutes, 'm'), (seconds, 's')] {
        if value > 0 {
            out.push_str(&value.to_string());
            out.push(unit);
        }
    }
    if out.is_empty() {
        out.push_str("0s");
    }
    out
}

/// Seconds since the Unix epoch; non-positive wire values mean "never".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Decode from wire seconds.
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        if secs <= 0 { Self(0) } else { Self(secs) }
    }

    /// Seconds since the epoch (zero for "never").
    #[must_use]
    pub const fn secs(self) -> i64 {
        self.0
    }

    /// Whether the timestamp is the zero-time.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Local-time rendering, empty for the zero-time.
    #[must_use]
    pub fn format(self) -> String {
        if self.is_zero() {
            return String::new();
        }
        DateTime::from_timestamp(self.0, 0).map_or_else(String::new, |utc| {
            utc.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_lenient_i64(deserializer).map(Self::from_secs)
    }
}

/// Milliseconds since the Unix epoch; non-positive wire values mean "never".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimestampMs(i64);

impl TimestampMs {
    /// Decode from wire milliseconds.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        if millis <= 0 { Self(0) } else { Self(millis) }
    }

    /// Milliseconds since the epoch.
    #[must_use]
    pub const fn millis(self) -> i64 {
        self.0
    }

    /// Truncate to a second-resolution timestamp.
    #[must_use]
    pub const fn to_secs(self) -> Timestamp {
        Timestamp::from_secs(self.0 / 1000)
    }
}

impl Serialize for TimestampMs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl<'de> Deserialize<'de> for TimestampMs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_lenient_i64(deserializer).map(Self::from_millis)
    }
}

/// Boolean delivered either as `true`/`false` or as an integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoolInt(pub bool);

impl Serialize for BoolInt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.0)
    }
}

impl<'de> Deserialize<'de> for BoolInt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_lenient_i64(deserializer).map(|value| Self(value != 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bytes_uses_significant_digits() {
        assert_eq!(format_bytes(512, true, 2, ""), "512 B");
        assert_eq!(format_bytes(3072, true, 2, ""), "3.0 KiB");
        assert_eq!(format_bytes(1536, true, 2, ""), "1.5 KiB");
        assert_eq!(format_bytes(1_500_000_000, false, 3, ""), "1.50 GB");
        assert_eq!(format_bytes(150 * 1024, true, 2, ""), "150 KiB");
        assert_eq!(format_bytes(-2048, true, 2, ""), "-2.0 KiB");
    }

    #[test]
    fn limits_scale_before_formatting() {
        assert_eq!(Limit(100).format(false, 3), "100 kB/s");
        assert_eq!(KiLimit(1).format(true, 2), "1.0 KiB/s");
        assert_eq!(Rate(2048).render(ByteFormat::RAW), "2048");
        assert_eq!(Limit(5).bytes(), 5000);
    }

    #[test]
    fn byte_units_add_within_type() {
        assert_eq!(ByteCount(1024).add(ByteCount(2048)), ByteCount(3072));
        assert_eq!(Rate(1).add(Rate(2)), Rate(3));
    }

    #[test]
    fn byte_count_decodes_floats() -> Result<(), serde_json::Error> {
        let value: ByteCount = serde_json::from_str("1.0e3")?;
        assert_eq!(value, ByteCount(1000));
        Ok(())
    }

    #[test]
    fn eta_sentinels_round_trip() -> Result<(), serde_json::Error> {
        for wire in [-2_i64, -1, 0, 42] {
            let decoded: Eta = serde_json::from_str(&wire.to_string())?;
            assert_eq!(serde_json::to_string(&decoded)?, wire.to_string());
        }
        let decoded: Eta = serde_json::from_str("-1")?;
        assert_eq!(decoded, Eta::Done);
        assert_eq!(Eta::from_wire(3725).format(), "1h2m5s");
        Ok(())
    }

    #[test]
    fn eta_orders_done_before_unknown() {
        assert!(Eta::Done < Eta::Seconds(5));
        assert!(Eta::Seconds(5) < Eta::Unknown);
        assert!(Eta::Absent < Eta::Done);
    }

    #[test]
    fn timestamp_zero_for_non_positive() -> Result<(), serde_json::Error> {
        let decoded: Timestamp = serde_json::from_str("-5")?;
        assert!(decoded.is_zero());
        assert_eq!(decoded.format(), "");
        let decoded: Timestamp = serde_json::from_str("1700000000")?;
        assert_eq!(serde_json::to_string(&decoded)?, "1700000000");
        assert_eq!(TimestampMs::from_millis(1_700_000_000_123).to_secs().secs(), 1_700_000_000);
        Ok(())
    }

    #[test]
    fn bool_int_accepts_both_encodings() -> Result<(), serde_json::Error> {
        let from_int: BoolInt = serde_json::from_str("1")?;
        let from_bool: BoolInt = serde_json::from_str("false")?;
        assert!(from_int.0);
        assert!(!from_bool.0);
        Ok(())
    }

    #[test]
    fn percent_formats_and_guards_empty_whole() {
        assert_eq!(Percent(0.5).format(2), "50%");
        assert_eq!(Percent(0.05).format(2), "5.0%");
        assert!((Percent::of(0, 0).0 - 1.0).abs() < f64::EPSILON);
    }
}
