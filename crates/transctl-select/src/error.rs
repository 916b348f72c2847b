//! Error types for filter expressions and torrent selection.

use thiserror::Error;
use transctl_core::ProviderError;

/// Failures while lexing, parsing, or evaluating a filter expression.
#[derive(Debug, Error)]
pub enum ExprError {
    /// A character that starts no token.
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar {
        /// Byte offset into the expression.
        offset: usize,
        /// Offending character.
        ch: char,
    },
    /// A string literal without its closing quote.
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        offset: usize,
    },
    /// A numeric literal that does not parse.
    #[error("invalid number '{text}'")]
    InvalidNumber {
        /// Literal text.
        text: String,
    },
    /// A size suffix outside `B`, `kB`..`PB`, `KiB`..`PiB`.
    #[error("unknown size unit '{unit}'")]
    UnknownUnit {
        /// Suffix as written.
        unit: String,
    },
    /// A token the grammar does not allow here.
    #[error("unexpected {found} at offset {offset}")]
    UnexpectedToken {
        /// Byte offset of the token.
        offset: usize,
        /// Token description.
        found: String,
    },
    /// Input ended mid-expression.
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    /// A call to something other than a known function.
    #[error("unknown function '{name}'")]
    UnknownFunction {
        /// Function name.
        name: String,
    },
    /// A known function called with the wrong argument count.
    #[error("{name}() takes {expected} argument(s), got {found}")]
    Arity {
        /// Function name.
        name: &'static str,
        /// Required argument count.
        expected: usize,
        /// Supplied argument count.
        found: usize,
    },
    /// Operand types the operator does not accept.
    #[error("operator '{operator}' cannot be applied to {left} and {right}")]
    TypeMismatch {
        /// Operator symbol.
        operator: &'static str,
        /// Left operand type.
        left: &'static str,
        /// Right operand type.
        right: &'static str,
    },
    /// The right side of `%%` is not a valid glob.
    #[error("invalid glob pattern '{pattern}'")]
    Glob {
        /// Pattern as evaluated.
        pattern: String,
        /// Underlying compile error.
        #[source]
        source: globset::Error,
    },
    /// The whole expression evaluated to something other than a boolean.
    #[error("filter must evaluate to a boolean, got {found}")]
    NotBoolean {
        /// Type of the result.
        found: &'static str,
    },
}

/// Failures of the selection engine.
#[derive(Debug, Error)]
pub enum SelectError {
    /// No selection flag and no identifier, or conflicting ones.
    #[error("must specify --list, --recent, --filter or at least one torrent")]
    SelectionRequired,
    /// The filter expression is invalid or failed on a torrent.
    #[error("invalid filter '{expression}'")]
    Filter {
        /// Expression source.
        expression: String,
        /// Underlying expression error.
        #[source]
        source: ExprError,
    },
    /// The filter names a field no torrent column provides.
    #[error("filter references unknown field '{name}'")]
    UnknownField {
        /// Field name after column-name mapping.
        name: String,
    },
    /// Fetching torrents from the daemon failed.
    #[error("failed to fetch torrents")]
    Provider {
        /// Underlying provider error.
        #[source]
        source: ProviderError,
    },
}

impl From<ProviderError> for SelectError {
    fn from(source: ProviderError) -> Self {
        Self::Provider { source }
    }
}
