//! Integer-coded enumerations following Transmission's documented codes.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::units::deserialize_lenient_i64;

macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $code:expr => $label:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every variant in code order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire integer.
            #[must_use]
            pub const fn code(self) -> i64 {
                match self {
                    $(Self::$variant => $code),+
                }
            }

            /// Display label.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            /// Decode a wire integer.
            #[must_use]
            pub fn from_code(code: i64) -> Option<Self> {
                Self::ALL.iter().copied().find(|variant| variant.code() == code)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let trimmed = value.trim();
                if let Ok(code) = trimmed.parse::<i64>() {
                    return Self::from_code(code)
                        .ok_or_else(|| format!("unknown {} code {code}", stringify!($name)));
                }
                Self::ALL
                    .iter()
                    .copied()
                    .find(|variant| variant.label().eq_ignore_ascii_case(trimmed))
                    .ok_or_else(|| format!("unknown {} '{trimmed}'", stringify!($name)))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_i64(self.code())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let code = deserialize_lenient_i64(deserializer)?;
                Self::from_code(code).ok_or_else(|| {
                    de::Error::custom(format!("invalid {} code {code}", stringify!($name)))
                })
            }
        }
    };
}

coded_enum!(
    /// Torrent activity status.
    Status {
        /// Stopped or paused.
        Stopped = 0 => "Stopped",
        /// Queued for verification.
        CheckWait = 1 => "Check-Wait",
        /// Verifying local data.
        Checking = 2 => "Checking",
        /// Queued for download.
        DownloadWait = 3 => "Download-Wait",
        /// Downloading.
        Downloading = 4 => "Downloading",
        /// Queued for seeding.
        SeedWait = 5 => "Seed-Wait",
        /// Seeding.
        Seeding = 6 => "Seeding",
    }
);

coded_enum!(
    /// Bandwidth priority.
    Priority {
        /// Low priority.
        Low = -1 => "Low",
        /// Normal priority.
        Normal = 0 => "Normal",
        /// High priority.
        High = 1 => "High",
    }
);

coded_enum!(
    /// Whether a per-torrent limit follows the session, itself, or nothing.
    Mode {
        /// Use the session-wide setting.
        Global = 0 => "Global",
        /// Use the torrent's own setting.
        Single = 1 => "Single",
        /// No limit.
        Unlimited = 2 => "Unlimited",
    }
);

coded_enum!(
    /// Announce/scrape state of a tracker.
    TrackerState {
        /// Not announcing.
        Inactive = 0 => "Inactive",
        /// Waiting for the next announce.
        Waiting = 1 => "Waiting",
        /// Queued to announce.
        Queued = 2 => "Queued",
        /// Announcing now.
        Active = 3 => "Active",
    }
);

coded_enum!(
    /// Per-piece availability.
    PieceState {
        /// Piece not present locally.
        Missing = 0 => "Missing",
        /// Piece present and verified.
        Have = 1 => "Have",
    }
);

coded_enum!(
    /// Per-file download priority.
    FilePriority {
        /// Low priority.
        Low = -1 => "Low",
        /// Normal priority.
        Normal = 0 => "Normal",
        /// High priority.
        High = 1 => "High",
    }
);

impl Default for FilePriority {
    fn default() -> Self {
        Self::Normal
    }
}

/// Peer encryption preference of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encryption {
    /// Only encrypted peers.
    Required,
    /// Prefer encrypted peers.
    Preferred,
    /// Accept clear-text peers.
    Tolerated,
}

impl Encryption {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Preferred => "preferred",
            Self::Tolerated => "tolerated",
        }
    }
}

impl fmt::Display for Encryption {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_daemon() -> Result<(), serde_json::Error> {
        let status: Status = serde_json::from_str("4")?;
        assert_eq!(status, Status::Downloading);
        assert_eq!(serde_json::to_string(&Status::Seeding)?, "6");
        Ok(())
    }

    #[test]
    fn out_of_range_codes_are_rejected() {
        assert!(serde_json::from_str::<Status>("9").is_err());
        assert!(serde_json::from_str::<Priority>("2").is_err());
        assert!(serde_json::from_str::<TrackerState>("-1").is_err());
    }

    #[test]
    fn file_priority_defaults_to_normal() {
        assert_eq!(FilePriority::default(), FilePriority::Normal);
        assert_eq!(FilePriority::default().code(), 0);
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("high".parse::<FilePriority>(), Ok(FilePriority::High));
        assert_eq!("-1".parse::<Priority>(), Ok(Priority::Low));
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn encryption_uses_lowercase_strings() -> Result<(), serde_json::Error> {
        let value: Encryption = serde_json::from_str("\"preferred\"")?;
        assert_eq!(value, Encryption::Preferred);
        Ok(())
    }
}
