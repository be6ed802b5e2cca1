use std::borrow::Cow;
use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

use crate::smtp::DEFAULT_PORTS;
use crate::tables::ReferenceTables;

/// Per-call knobs for [`Verifier::verify`](super::Verifier::verify).
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "camelCase", default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOptions {
    #[cfg_attr(feature = "with-serde", serde(rename = "checkMX"))]
    pub check_mx: bool,
    #[cfg_attr(feature = "with-serde", serde(rename = "checkSMTP"))]
    pub check_smtp: bool,
    /// Connect and idle-read deadline of each probe.
    pub timeout_ms: u64,
    /// Upper bound on the mail exchangers probed, most preferred first.
    pub max_server_attempts: usize,
}

impl Default for VerificationOptions {
    fn default() -> Self {
        Self {
            check_mx: true,
            check_smtp: true,
            timeout_ms: 2_500,
            max_server_attempts: 2,
        }
    }
}

impl VerificationOptions {
    /// Only syntax and typo checks, no network access.
    pub fn offline() -> Self {
        Self {
            check_mx: false,
            check_smtp: false,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }

    /// Options as the engine applies them.
    ///
    /// Probing SMTP needs the MX hosts, so `check_smtp` turns `check_mx` on.
    /// At least one server is tried and the timeout is never zero.
    pub fn effective(&self) -> Self {
        Self {
            check_mx: self.check_mx || self.check_smtp,
            check_smtp: self.check_smtp,
            timeout_ms: self.timeout_ms.max(1),
            max_server_attempts: self.max_server_attempts.max(1),
        }
    }
}

/// Engine-wide settings, fixed when the [`Verifier`](super::Verifier) is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// `EHLO` identity. Defaults to the domain under test.
    pub helo_domain: Option<String>,
    /// `MAIL FROM` address. Defaults to `postmaster@<domain under test>`.
    pub envelope_sender: Option<String>,
    /// Ports raced on every mail exchanger, in preference order.
    pub ports: Vec<u16>,
    pub tables: ReferenceTables,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            helo_domain: None,
            envelope_sender: None,
            ports: DEFAULT_PORTS.to_vec(),
            tables: ReferenceTables::builtin(),
        }
    }
}

impl VerifierConfig {
    pub fn with_helo_domain(mut self, helo: impl Into<String>) -> Self {
        self.helo_domain = Some(helo.into());
        self
    }

    pub fn with_envelope_sender(mut self, sender: impl Into<String>) -> Self {
        self.envelope_sender = Some(sender.into());
        self
    }

    pub fn with_ports(mut self, ports: impl Into<Vec<u16>>) -> Self {
        self.ports = ports.into();
        self
    }

    pub fn with_tables(mut self, tables: ReferenceTables) -> Self {
        self.tables = tables;
        self
    }

    pub fn helo_name<'a>(&'a self, domain: &'a str) -> Cow<'a, str> {
        match self.helo_domain.as_deref().map(str::trim) {
            Some(helo) if !helo.is_empty() => Cow::Borrowed(helo),
            _ => Cow::Borrowed(domain),
        }
    }

    pub fn mail_from<'a>(&'a self, domain: &str) -> Cow<'a, str> {
        match self.envelope_sender.as_deref().map(str::trim) {
            Some(sender) if !sender.is_empty() => Cow::Borrowed(sender),
            _ => Cow::Owned(format!("postmaster@{domain}")),
        }
    }
}
