use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors a caller can recover from. Every variant leaves the active configuration and the line store
/// exactly as they were before the rejected request
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SimError {
    /// A configuration edit broke one of the validation rules. `parameter` names the offending
    /// field as it appears in the JSON configuration
    InvalidConfiguration {
        parameter: &'static str,
        reason: String,
    },
    /// The address did not have exactly `address_bits` characters
    InvalidAddressLength {
        expected: usize,
        actual: usize,
    },
    /// The address contained something other than `0` or `1`
    InvalidAddressDigit {
        position: usize,
        found: char,
    },
}

impl SimError {
    pub(crate) fn config(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration { parameter, reason: reason.into() }
    }
}

impl Display for SimError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::InvalidConfiguration { parameter, reason } => {
                write!(f, "invalid configuration, {parameter}: {reason}")
            }
            SimError::InvalidAddressLength { expected, actual } => {
                write!(f, "the address must have exactly {expected} bits, got {actual}")
            }
            SimError::InvalidAddressDigit { position, found } => {
                write!(f, "the address may only contain 0 and 1, found {found:?} at position {position}")
            }
        }
    }
}

impl Error for SimError {}
