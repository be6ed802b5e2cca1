//! SMTP mailbox probing.
//!
//! [`probe_port`] runs one `EHLO` / `MAIL FROM` / `RCPT TO` / `QUIT` session
//! against a single port; [`probe_server`] races it across several ports of
//! one mail exchanger. Both go through the [`Transport`] capability so that
//! tests can replay server behaviour without sockets.

mod probe;
mod racer;
mod session;
mod transport;
mod types;

pub use probe::{CancelToken, probe_port};
pub use racer::{DEFAULT_PORTS, probe_server};
pub use transport::{SmtpStream, TcpTransport, Transport};
pub use types::{ProbeOutcome, ProbeRequest, ProbeState, ServerVerdict, SmtpEvent, SmtpReply};

#[cfg(test)]
pub(crate) mod testing;
