use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use super::session::SmtpSession;
use super::transport::Transport;
use super::types::{ProbeOutcome, ProbeRequest, ProbeState, SmtpEvent, SmtpReply};
use crate::LOG_TARGET;

/// Shared flag telling probes that their result is no longer wanted.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Recorded {
    success: bool,
    code: u16,
    message: String,
}

/// What the driver must do after a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    Send(String),
    Finish,
}

/// The probe state machine. It only sees reply codes and remembers which
/// command it sent last through its state.
#[derive(Debug)]
pub(crate) struct Dialogue<'a> {
    state: ProbeState,
    request: &'a ProbeRequest,
    recorded: Option<Recorded>,
}

impl<'a> Dialogue<'a> {
    pub(crate) fn new(request: &'a ProbeRequest) -> Self {
        Self {
            state: ProbeState::Connecting,
            request,
            recorded: None,
        }
    }

    pub(crate) fn state(&self) -> ProbeState {
        self.state
    }

    pub(crate) fn is_done(&self) -> bool {
        self.state == ProbeState::Done
    }

    pub(crate) fn on_connected(&mut self) {
        self.state = ProbeState::AwaitingGreeting;
    }

    pub(crate) fn on_reply(&mut self, reply: &SmtpReply) -> Step {
        use ProbeState::*;

        match (self.state, reply.code) {
            (Connecting | Done, _) => Step::Finish,
            (Closing, _) => {
                self.state = Done;
                Step::Finish
            }
            (_, _) if reply.is_transient_failure() || reply.is_permanent_failure() => {
                self.record(false, reply.code, reply.to_string());
                self.quit()
            }
            (AwaitingGreeting, 220) => {
                self.state = AwaitingEhloAck;
                Step::Send(format!("EHLO {}", self.request.helo))
            }
            (AwaitingEhloAck, 250) => {
                self.state = AwaitingMailAck;
                Step::Send(format!("MAIL FROM:<{}>", self.request.sender))
            }
            (AwaitingMailAck, 250) => {
                self.state = AwaitingRcptAck;
                Step::Send(format!("RCPT TO:<{}>", self.request.recipient))
            }
            (AwaitingRcptAck, _) if reply.is_positive_completion() => {
                self.record(true, reply.code, reply.to_string());
                self.quit()
            }
            (state, code) => {
                self.record(
                    false,
                    code,
                    format!("unexpected reply at {state}: {reply}"),
                );
                self.quit()
            }
        }
    }

    /// Transport failure, idle timeout or early close. A verdict recorded
    /// before `QUIT` survives; otherwise the outcome has no code.
    pub(crate) fn on_transport_error(&mut self, cause: &str) {
        if self.state != ProbeState::Closing || self.recorded.is_none() {
            self.recorded = Some(Recorded {
                success: false,
                code: 0,
                message: cause.to_string(),
            });
        }
        self.state = ProbeState::Done;
    }

    pub(crate) fn on_cancelled(&mut self) {
        if self.recorded.is_none() {
            self.record(false, 0, "probe cancelled".to_string());
        }
        self.state = ProbeState::Done;
    }

    pub(crate) fn into_outcome(self, port: u16, transcript: Vec<SmtpEvent>) -> ProbeOutcome {
        let recorded = self.recorded.unwrap_or(Recorded {
            success: false,
            code: 0,
            message: "connection closed before a definitive reply".to_string(),
        });
        ProbeOutcome {
            success: recorded.success,
            response_code: recorded.code,
            message: recorded.message,
            port,
            transcript,
        }
    }

    fn record(&mut self, success: bool, code: u16, message: String) {
        self.recorded = Some(Recorded {
            success,
            code,
            message,
        });
    }

    fn quit(&mut self) -> Step {
        self.state = ProbeState::Closing;
        Step::Send("QUIT".to_string())
    }
}

/// Runs one SMTP session against `host:port` and reports what it learned.
///
/// Never fails: connection and protocol errors become an outcome with
/// `response_code == 0`. The stream is dropped, and thereby closed, on every
/// exit path.
pub fn probe_port(
    transport: &dyn Transport,
    host: &str,
    port: u16,
    request: &ProbeRequest,
    cancel: &CancelToken,
) -> ProbeOutcome {
    let mut dialogue = Dialogue::new(request);
    let mut transcript = Vec::new();

    let stream = match transport.connect(host, port, request.timeout) {
        Ok(stream) => stream,
        Err(err) => {
            let cause = describe(&err, request);
            debug!(target: LOG_TARGET, host, port, %cause, "connect failed");
            transcript.push(SmtpEvent::Error {
                stage: dialogue.state(),
                message: cause.clone(),
            });
            dialogue.on_transport_error(&cause);
            return dialogue.into_outcome(port, transcript);
        }
    };
    let mut session = SmtpSession::new(stream);
    dialogue.on_connected();

    while !dialogue.is_done() {
        let stage = dialogue.state();
        let reply = match session.read_reply() {
            Ok(reply) => reply,
            Err(err) => {
                let cause = describe(&err, request);
                transcript.push(SmtpEvent::Error {
                    stage,
                    message: cause.clone(),
                });
                dialogue.on_transport_error(&cause);
                break;
            }
        };
        debug!(target: LOG_TARGET, host, port, %stage, code = reply.code, "reply");
        transcript.push(SmtpEvent::Received {
            stage,
            reply: reply.clone(),
        });

        let command = match dialogue.on_reply(&reply) {
            Step::Send(command) => command,
            Step::Finish => break,
        };
        if cancel.is_cancelled() {
            dialogue.on_cancelled();
            break;
        }
        transcript.push(SmtpEvent::Sent {
            stage: dialogue.state(),
            command: command.clone(),
        });
        if let Err(err) = session.send_command(&command) {
            let cause = describe(&err, request);
            transcript.push(SmtpEvent::Error {
                stage: dialogue.state(),
                message: cause.clone(),
            });
            dialogue.on_transport_error(&cause);
        }
    }
    drop(session);

    dialogue.into_outcome(port, transcript)
}

fn describe(err: &io::Error, request: &ProbeRequest) -> String {
    match err.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => {
            format!("timed out after {} ms", request.timeout.as_millis())
        }
        _ => err.to_string(),
    }
}
