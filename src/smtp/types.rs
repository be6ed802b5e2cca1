use std::fmt;
use std::time::Duration;

/// Position of the SMTP client dialogue. The state is the only thing that
/// decides what a reply code means; reply text is never inspected.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Connecting,
    AwaitingGreeting,
    AwaitingEhloAck,
    AwaitingMailAck,
    AwaitingRcptAck,
    Closing,
    Done,
}

impl fmt::Display for ProbeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::AwaitingGreeting => "greeting",
            Self::AwaitingEhloAck => "ehlo",
            Self::AwaitingMailAck => "mail_from",
            Self::AwaitingRcptAck => "rcpt_to",
            Self::Closing => "quit",
            Self::Done => "done",
        })
    }
}

/// A raw SMTP reply, preserving the numeric status code and message text.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    pub message: String,
}

impl SmtpReply {
    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_transient_failure(&self) -> bool {
        (400..500).contains(&self.code)
    }

    pub fn is_permanent_failure(&self) -> bool {
        (500..600).contains(&self.code)
    }
}

impl fmt::Display for SmtpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{} {}", self.code, self.message)
        }
    }
}

/// A recorded SMTP transcript event used for diagnostics.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmtpEvent {
    Sent { stage: ProbeState, command: String },
    Received { stage: ProbeState, reply: SmtpReply },
    Error { stage: ProbeState, message: String },
}

/// What a probe needs to know besides the host and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    /// Address given to `RCPT TO`.
    pub recipient: String,
    /// Identity given to `EHLO`.
    pub helo: String,
    /// Address given to `MAIL FROM`.
    pub sender: String,
    /// Connect and idle-read deadline.
    pub timeout: Duration,
}

/// Result of one SMTP session against one port.
///
/// `response_code == 0` means no definitive code was obtained (refused,
/// reset, timed out, closed early).
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub success: bool,
    pub response_code: u16,
    pub message: String,
    pub port: u16,
    pub transcript: Vec<SmtpEvent>,
}

impl ProbeOutcome {
    /// An outcome with no protocol signal at all.
    pub fn silent(port: u16, message: impl Into<String>) -> Self {
        Self {
            success: false,
            response_code: 0,
            message: message.into(),
            port,
            transcript: Vec::new(),
        }
    }

    /// Permanent rejection in the 550-599 range.
    pub fn is_authoritative_rejection(&self) -> bool {
        is_authoritative_rejection(self.response_code)
    }

    /// Either accepted or authoritatively rejected: no other port or server
    /// needs to be asked.
    pub fn is_decisive(&self) -> bool {
        self.success || self.is_authoritative_rejection()
    }
}

pub(crate) fn is_authoritative_rejection(code: u16) -> bool {
    (550..=599).contains(&code)
}

/// Reduction of the probes run against one mail exchanger.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "camelCase"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerVerdict {
    pub host: String,
    pub success: bool,
    pub response_code: u16,
    pub message: String,
    /// Every port ended without a definitive code.
    pub all_ports_blocked: bool,
    /// Port of the outcome the verdict was taken from.
    pub port: Option<u16>,
    pub ports_tried: usize,
    pub transcript: Vec<SmtpEvent>,
}

impl ServerVerdict {
    /// Verdict taken from a single outcome that won the race.
    pub(crate) fn decided(host: &str, outcome: ProbeOutcome) -> Self {
        Self {
            host: host.to_string(),
            success: outcome.success,
            response_code: outcome.response_code,
            message: outcome.message,
            all_ports_blocked: false,
            port: Some(outcome.port),
            ports_tried: 1,
            transcript: outcome.transcript,
        }
    }

    /// Verdict when nobody won the race: the first outcome carrying a real
    /// code, else the first outcome.
    pub(crate) fn reduce(host: &str, outcomes: Vec<ProbeOutcome>) -> Self {
        let ports_tried = outcomes.len();
        let all_ports_blocked = outcomes.iter().all(|o| o.response_code == 0);
        let best = outcomes
            .iter()
            .position(|o| o.response_code != 0)
            .unwrap_or(0);
        match outcomes.into_iter().nth(best) {
            Some(outcome) => Self {
                host: host.to_string(),
                success: outcome.success,
                response_code: outcome.response_code,
                message: outcome.message,
                all_ports_blocked,
                port: Some(outcome.port),
                ports_tried,
                transcript: outcome.transcript,
            },
            None => Self::not_attempted(host),
        }
    }

    /// No port was configured, so nothing was probed.
    pub(crate) fn not_attempted(host: &str) -> Self {
        Self {
            host: host.to_string(),
            success: false,
            response_code: 0,
            message: "no SMTP port configured".to_string(),
            all_ports_blocked: false,
            port: None,
            ports_tried: 0,
            transcript: Vec::new(),
        }
    }

    pub fn is_decisive(&self) -> bool {
        self.success || is_authoritative_rejection(self.response_code)
    }
}
