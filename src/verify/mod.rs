//! The verification engine.
//!
//! [`Verifier::verify`] runs syntax, typo, MX and SMTP checks in that order.
//! Each stage may settle the verdict; the first one that does ends the call.

mod classify;
mod error;
mod options;
mod types;

pub use error::VerifyError;
pub use options::{VerificationOptions, VerifierConfig};
pub use types::{
    StepStatus, Steps, Subresult, Verdict, VerificationMethod, VerificationResult,
};

use std::sync::Arc;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};

use crate::LOG_TARGET;
use crate::mx::{LookupMx, SystemResolver, resolve_mx_with};
use crate::smtp::{ProbeRequest, ServerVerdict, TcpTransport, Transport, probe_server};
use crate::typo::suggest;
use crate::validator::check_syntax;
use classify::classify;

/// The verdict a stage settled on. Applied to the result exactly once.
#[derive(Debug)]
struct Conclusion {
    verdict: Verdict,
    subresult: Subresult,
    method: VerificationMethod,
    error: Option<String>,
}

impl Conclusion {
    fn new(verdict: Verdict, subresult: Subresult, method: VerificationMethod) -> Self {
        Self {
            verdict,
            subresult,
            method,
            error: None,
        }
    }

    fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    fn apply(self, result: &mut VerificationResult) {
        result.result = self.verdict;
        result.result_code = self.verdict.result_code();
        result.subresult = self.subresult;
        result.verification_method = self.method;
        result.error = self.error;
    }
}

/// Email deliverability checker.
///
/// Holds the DNS and transport capabilities plus the reference tables. A
/// `Verifier` is immutable and may be shared between threads.
pub struct Verifier<R = SystemResolver> {
    resolver: R,
    transport: Arc<dyn Transport>,
    config: VerifierConfig,
}

impl Verifier<SystemResolver> {
    /// System DNS, plain TCP and the built-in tables.
    pub fn new() -> Self {
        Self::with_config(VerifierConfig::default())
    }

    pub fn with_config(config: VerifierConfig) -> Self {
        Self::with_parts(SystemResolver, Arc::new(TcpTransport::new()), config)
    }
}

impl Default for Verifier<SystemResolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: LookupMx> Verifier<R> {
    pub fn with_parts(resolver: R, transport: Arc<dyn Transport>, config: VerifierConfig) -> Self {
        Self {
            resolver,
            transport,
            config,
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Classifies `email` as valid, invalid or unknown.
    ///
    /// Never fails: malformed input is an `invalid` result, and faults outside
    /// the classified paths become `unknown/verification_error`.
    pub fn verify(&self, email: &str, options: &VerificationOptions) -> VerificationResult {
        let started = Instant::now();
        let options = options.effective();
        let mut result = VerificationResult::pending(email.trim());

        let conclusion = match self.run(&mut result, &options) {
            Ok(conclusion) => conclusion,
            Err(err) => {
                warn!(target: LOG_TARGET, email = %result.email, error = %err, "verification aborted");
                Conclusion::new(
                    Verdict::Unknown,
                    Subresult::VerificationError,
                    VerificationMethod::Unknown,
                )
                .with_error(err.to_string())
            }
        };
        conclusion.apply(&mut result);

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        result.execution_time_ms = elapsed_ms;
        result.execution_time_seconds = elapsed_ms.saturating_add(500) / 1_000;
        result.timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        info!(
            target: LOG_TARGET,
            email = %result.email,
            result = %result.result,
            subresult = %result.subresult,
            elapsed_ms,
            "verification done"
        );
        result
    }

    fn run(
        &self,
        result: &mut VerificationResult,
        options: &VerificationOptions,
    ) -> Result<Conclusion, VerifyError> {
        let tables = &self.config.tables;
        let email = result.email.clone();

        let address = match check_syntax(&email) {
            Ok(address) => address,
            Err(err) => {
                let message = err.to_string();
                result.steps.syntax = StepStatus::failed(message.clone());
                return Ok(Conclusion::new(
                    Verdict::Invalid,
                    Subresult::InvalidSyntax,
                    VerificationMethod::SyntaxValidation,
                )
                .with_error(message));
            }
        };
        result.steps.syntax = StepStatus::passed("syntax is valid");

        let domain = address.domain.to_ascii_lowercase();
        result.domain = domain.clone();
        result.disposable = tables.is_disposable(&domain);
        result.role_based = tables.is_role_account(address.local);

        if let Some(suggestion) = suggest(&email, tables) {
            if !suggestion.suggested_email.eq_ignore_ascii_case(&email) {
                debug!(target: LOG_TARGET, email = %email, suggestion = %suggestion.suggested_email, "typo detected");
                result.did_you_mean = Some(suggestion.suggested_email);
                return Ok(Conclusion::new(
                    Verdict::Invalid,
                    Subresult::TypoDetected,
                    VerificationMethod::TypoDetection,
                ));
            }
        }

        if options.check_mx {
            match resolve_mx_with(&self.resolver, &domain) {
                Ok(hosts) if hosts.is_empty() => {
                    result.steps.mx = StepStatus::failed("no MX records found");
                    return Ok(Conclusion::new(
                        Verdict::Invalid,
                        Subresult::NoMxRecords,
                        VerificationMethod::DnsLookup,
                    )
                    .with_error(format!("{domain} has no MX records")));
                }
                Ok(hosts) => {
                    result.steps.mx = StepStatus::passed(format!("{} MX record(s) found", hosts.len()));
                    result.mx_records = hosts;
                }
                Err(err) if err.is_resolver_failure() => return Err(VerifyError::resolver(err)),
                Err(err) => {
                    warn!(target: LOG_TARGET, domain = %domain, error = %err, "MX lookup failed");
                    let message = err.to_string();
                    result.steps.mx = StepStatus::failed(message.clone());
                    return Ok(Conclusion::new(
                        Verdict::Invalid,
                        Subresult::DnsLookupFailed,
                        VerificationMethod::DnsLookup,
                    )
                    .with_error(message));
                }
            }
        } else {
            result.steps.mx = StepStatus::inconclusive("MX check skipped");
        }

        if !options.check_smtp {
            result.steps.smtp = StepStatus::inconclusive("SMTP check skipped");
            return Ok(Conclusion::new(
                Verdict::Valid,
                Subresult::SyntaxAndMxValid,
                VerificationMethod::DnsLookup,
            ));
        }

        result.smtp_checked = true;
        let request = ProbeRequest {
            recipient: email.clone(),
            helo: self.config.helo_name(&domain).into_owned(),
            sender: self.config.mail_from(&domain).into_owned(),
            timeout: options.timeout(),
        };
        let server = self.probe_servers(&result.mx_records, &request, options.max_server_attempts);
        let server = server.unwrap_or_else(|| ServerVerdict::not_attempted(&domain));

        let classification = classify(&server);
        result.smtp_blocked = server.all_ports_blocked;
        result.steps.smtp = classification.step;
        let conclusion = Conclusion::new(
            classification.verdict,
            classification.subresult,
            classification.method,
        );
        Ok(match classification.error {
            Some(error) => conclusion.with_error(error),
            None => conclusion,
        })
    }

    /// Probes the exchangers one after the other and returns the last
    /// verdict. Stops at the first acceptance or permanent rejection.
    fn probe_servers(
        &self,
        hosts: &[String],
        request: &ProbeRequest,
        max_attempts: usize,
    ) -> Option<ServerVerdict> {
        let mut last = None;
        for host in hosts.iter().take(max_attempts) {
            let verdict = probe_server(
                Arc::clone(&self.transport),
                host,
                &self.config.ports,
                request,
            );
            debug!(
                target: LOG_TARGET,
                host = %host,
                code = verdict.response_code,
                success = verdict.success,
                blocked = verdict.all_ports_blocked,
                "server probed"
            );
            let decisive = verdict.is_decisive();
            last = Some(verdict);
            if decisive {
                break;
            }
        }
        last
    }
}

/// Verifies `email` with a default [`Verifier`].
pub fn verify(email: &str, options: &VerificationOptions) -> VerificationResult {
    Verifier::new().verify(email, options)
}
