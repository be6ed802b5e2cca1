use std::fmt;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// Three-valued deliverability verdict.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Valid,
    Invalid,
    Unknown,
}

impl Verdict {
    /// Stable numeric alias: 1 valid, 3 unknown, 6 invalid.
    pub const fn result_code(self) -> u8 {
        match self {
            Self::Valid => 1,
            Self::Unknown => 3,
            Self::Invalid => 6,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable reason attached to a [`Verdict`].
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subresult {
    InvalidSyntax,
    TypoDetected,
    NoMxRecords,
    DnsLookupFailed,
    MailboxExists,
    MailboxDoesNotExist,
    Greylisted,
    ServiceUnavailable,
    SmtpError,
    UnknownResponse,
    SmtpBlockedButMxValid,
    SyntaxAndMxValid,
    VerificationError,
}

impl Subresult {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidSyntax => "invalid_syntax",
            Self::TypoDetected => "typo_detected",
            Self::NoMxRecords => "no_mx_records",
            Self::DnsLookupFailed => "dns_lookup_failed",
            Self::MailboxExists => "mailbox_exists",
            Self::MailboxDoesNotExist => "mailbox_does_not_exist",
            Self::Greylisted => "greylisted",
            Self::ServiceUnavailable => "service_unavailable",
            Self::SmtpError => "smtp_error",
            Self::UnknownResponse => "unknown_response",
            Self::SmtpBlockedButMxValid => "smtp_blocked_but_mx_valid",
            Self::SyntaxAndMxValid => "syntax_and_mx_valid",
            Self::VerificationError => "verification_error",
        }
    }
}

impl fmt::Display for Subresult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage that produced the verdict.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationMethod {
    SyntaxValidation,
    TypoDetection,
    DnsLookup,
    DnsLookupFallback,
    SmtpVerification,
    Unknown,
}

impl VerificationMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SyntaxValidation => "syntax_validation",
            Self::TypoDetection => "typo_detection",
            Self::DnsLookup => "dns_lookup",
            Self::DnsLookupFallback => "dns_lookup_fallback",
            Self::SmtpVerification => "smtp_verification",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of one stage. `valid == None` means skipped or inconclusive.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepStatus {
    pub valid: Option<bool>,
    pub message: String,
}

impl StepStatus {
    pub(crate) fn passed(message: impl Into<String>) -> Self {
        Self {
            valid: Some(true),
            message: message.into(),
        }
    }

    pub(crate) fn failed(message: impl Into<String>) -> Self {
        Self {
            valid: Some(false),
            message: message.into(),
        }
    }

    pub(crate) fn inconclusive(message: impl Into<String>) -> Self {
        Self {
            valid: None,
            message: message.into(),
        }
    }
}

#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Steps {
    pub syntax: StepStatus,
    pub mx: StepStatus,
    pub smtp: StepStatus,
}

impl Steps {
    fn not_checked() -> Self {
        Self {
            syntax: StepStatus::inconclusive("not checked"),
            mx: StepStatus::inconclusive("not checked"),
            smtp: StepStatus::inconclusive("not checked"),
        }
    }
}

/// Everything [`Verifier::verify`](super::Verifier::verify) learned about one
/// address.
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    /// Input with surrounding whitespace removed.
    pub email: String,
    pub result: Verdict,
    pub result_code: u8,
    pub subresult: Subresult,
    pub domain: String,
    pub mx_records: Vec<String>,
    pub disposable: bool,
    pub role_based: bool,
    pub did_you_mean: Option<String>,
    pub error: Option<String>,
    pub verification_method: VerificationMethod,
    pub smtp_checked: bool,
    pub smtp_blocked: bool,
    pub steps: Steps,
    /// Elapsed wall time rounded to whole seconds.
    pub execution_time_seconds: u64,
    pub execution_time_ms: u64,
    /// RFC 3339, UTC, millisecond precision.
    pub timestamp: String,
}

impl VerificationResult {
    /// Placeholder filled in by the engine before its verdict is known.
    pub(crate) fn pending(email: &str) -> Self {
        Self {
            email: email.to_string(),
            result: Verdict::Unknown,
            result_code: Verdict::Unknown.result_code(),
            subresult: Subresult::VerificationError,
            domain: String::new(),
            mx_records: Vec::new(),
            disposable: false,
            role_based: false,
            did_you_mean: None,
            error: None,
            verification_method: VerificationMethod::Unknown,
            smtp_checked: false,
            smtp_blocked: false,
            steps: Steps::not_checked(),
            execution_time_seconds: 0,
            execution_time_ms: 0,
            timestamp: String::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.result == Verdict::Valid
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({}) via {}",
            self.email, self.result, self.subresult, self.verification_method
        )?;
        if let Some(suggestion) = &self.did_you_mean {
            write!(f, ", did you mean {suggestion}?")?;
        }
        if self.disposable {
            f.write_str(" [disposable]")?;
        }
        if self.role_based {
            f.write_str(" [role]")?;
        }
        if let Some(error) = &self.error {
            write!(f, " - {error}")?;
        }
        Ok(())
    }
}
