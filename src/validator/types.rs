use thiserror::Error;

/// Outcome of [`validate_syntax`](crate::validate_syntax).
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxReport {
    pub valid: bool,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
}

impl SyntaxReport {
    pub fn valid() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(error: &SyntaxError) -> Self {
        Self {
            valid: false,
            error: Some(error.to_string()),
        }
    }
}

/// First rule an address broke. Rules are checked in declaration order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("email must be a non-empty string")]
    Empty,
    #[error("email must contain exactly one '@' (found {0})")]
    AtCount(usize),
    #[error("email format is invalid")]
    Grammar,
    #[error("local part length {0} > 64")]
    LocalTooLong(usize),
    #[error("total length {0} > 254")]
    TooLong(usize),
    #[error("local part cannot start or end with '.'")]
    LocalDotEdge,
    #[error("local part cannot contain '..'")]
    LocalConsecutiveDots,
    #[error("domain must contain at least one dot")]
    DomainWithoutDot,
}

/// An address that passed every syntax rule, split at its `@`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Address<'a> {
    pub local: &'a str,
    pub domain: &'a str,
}
