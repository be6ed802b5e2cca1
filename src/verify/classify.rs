use crate::smtp::ServerVerdict;

use super::types::{StepStatus, Subresult, Verdict, VerificationMethod};

/// How the last server verdict reads to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Classification {
    pub verdict: Verdict,
    pub subresult: Subresult,
    pub method: VerificationMethod,
    pub error: Option<String>,
    pub step: StepStatus,
}

/// Maps the verdict of the last server probed to the public vocabulary.
pub(crate) fn classify(server: &ServerVerdict) -> Classification {
    let summary = format!("{} answered: {}", server.host, server.message);

    if server.success {
        return Classification {
            verdict: Verdict::Valid,
            subresult: Subresult::MailboxExists,
            method: VerificationMethod::SmtpVerification,
            error: None,
            step: StepStatus::passed(summary),
        };
    }

    if server.ports_tried == 0 {
        return Classification {
            verdict: Verdict::Unknown,
            subresult: Subresult::SmtpError,
            method: VerificationMethod::SmtpVerification,
            error: Some(server.message.clone()),
            step: StepStatus::inconclusive(server.message.clone()),
        };
    }

    if server.all_ports_blocked {
        let message = format!(
            "no SMTP port of {} answered ({}); MX records are valid",
            server.host, server.message
        );
        return Classification {
            verdict: Verdict::Valid,
            subresult: Subresult::SmtpBlockedButMxValid,
            method: VerificationMethod::DnsLookupFallback,
            error: Some(message.clone()),
            step: StepStatus::inconclusive(message),
        };
    }

    let (verdict, subresult) = match server.response_code {
        450..=452 => (Verdict::Unknown, Subresult::Greylisted),
        421 => (Verdict::Unknown, Subresult::ServiceUnavailable),
        550..=553 => (Verdict::Invalid, Subresult::MailboxDoesNotExist),
        _ => (Verdict::Unknown, Subresult::UnknownResponse),
    };
    Classification {
        verdict,
        subresult,
        method: VerificationMethod::SmtpVerification,
        error: Some(server.message.clone()),
        step: StepStatus::failed(summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(code: u16, success: bool, blocked: bool) -> ServerVerdict {
        ServerVerdict {
            host: "mx.example.com".to_string(),
            success,
            response_code: code,
            message: format!("{code} text"),
            all_ports_blocked: blocked,
            port: Some(25),
            ports_tried: 3,
            transcript: Vec::new(),
        }
    }

    #[test]
    fn success_is_valid() {
        let c = classify(&verdict(250, true, false));
        assert_eq!((c.verdict, c.subresult), (Verdict::Valid, Subresult::MailboxExists));
        assert_eq!(c.step.valid, Some(true));
        assert_eq!(c.error, None);
    }

    #[test]
    fn blocked_falls_back_to_mx() {
        let c = classify(&verdict(0, false, true));
        assert_eq!(c.verdict, Verdict::Valid);
        assert_eq!(c.subresult, Subresult::SmtpBlockedButMxValid);
        assert_eq!(c.method, VerificationMethod::DnsLookupFallback);
        assert_eq!(c.step.valid, None);
        assert!(c.error.is_some());
    }

    #[test]
    fn code_ranges() {
        let cases = [
            (450, Verdict::Unknown, Subresult::Greylisted),
            (451, Verdict::Unknown, Subresult::Greylisted),
            (452, Verdict::Unknown, Subresult::Greylisted),
            (421, Verdict::Unknown, Subresult::ServiceUnavailable),
            (550, Verdict::Invalid, Subresult::MailboxDoesNotExist),
            (553, Verdict::Invalid, Subresult::MailboxDoesNotExist),
            (554, Verdict::Unknown, Subresult::UnknownResponse),
            (503, Verdict::Unknown, Subresult::UnknownResponse),
            (0, Verdict::Unknown, Subresult::UnknownResponse),
        ];
        for (code, expected_verdict, expected_subresult) in cases {
            let c = classify(&verdict(code, false, false));
            assert_eq!(c.verdict, expected_verdict, "code {code}");
            assert_eq!(c.subresult, expected_subresult, "code {code}");
            assert_eq!(c.method, VerificationMethod::SmtpVerification);
        }
    }

    #[test]
    fn nothing_probed_is_smtp_error() {
        let mut server = verdict(0, false, false);
        server.ports_tried = 0;
        server.port = None;
        let c = classify(&server);
        assert_eq!((c.verdict, c.subresult), (Verdict::Unknown, Subresult::SmtpError));
    }
}
