#![forbid(unsafe_code)]
//! mailverify — email deliverability checks without sending mail.
//!
//! Syntax, domain typos, MX records and a live SMTP `RCPT TO` probe are
//! folded into one [`VerificationResult`]: valid, invalid or unknown plus a
//! machine-readable [`Subresult`].

/// `tracing` target used by every event of this crate.
pub const LOG_TARGET: &str = "mailverify";

pub mod mx;
pub mod smtp;
pub mod tables;
pub mod typo;
pub mod validator;
pub mod verify;

pub use mx::{LookupMx, MxError, MxRecord, MxStatus, SystemResolver, resolve_mx, resolve_mx_with};
pub use smtp::{
    DEFAULT_PORTS, ProbeOutcome, ProbeRequest, ServerVerdict, TcpTransport, Transport, probe_port,
    probe_server,
};
pub use tables::ReferenceTables;
pub use typo::{Suggestion, did_you_mean, edit_distance, suggest};
pub use validator::{SyntaxError, SyntaxReport, validate_syntax};
pub use verify::{
    StepStatus, Steps, Subresult, Verdict, VerificationMethod, VerificationOptions,
    VerificationResult, Verifier, VerifierConfig, VerifyError, verify,
};
