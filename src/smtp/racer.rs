use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use tracing::{debug, warn};

use super::probe::{CancelToken, probe_port};
use super::transport::Transport;
use super::types::{ProbeOutcome, ProbeRequest, ServerVerdict};
use crate::LOG_TARGET;

/// Ports raced against every mail exchanger: SMTP, submission, SMTPS.
pub const DEFAULT_PORTS: [u16; 3] = [25, 587, 465];

/// Probes `host` on every port at once and reduces the outcomes to one
/// verdict.
///
/// The first outcome that is accepted or rejected with a 550-599 code wins
/// and is returned straight away; the other probes are told to stop and
/// their results are dropped. When nobody wins, all outcomes are awaited
/// and [`ServerVerdict::reduce`] picks one.
pub fn probe_server(
    transport: Arc<dyn Transport>,
    host: &str,
    ports: &[u16],
    request: &ProbeRequest,
) -> ServerVerdict {
    if ports.is_empty() {
        return ServerVerdict::not_attempted(host);
    }

    let cancel = CancelToken::default();
    let (tx, rx) = mpsc::channel::<(usize, ProbeOutcome)>();
    let mut slots: Vec<Option<ProbeOutcome>> = vec![None; ports.len()];
    let mut launched = 0usize;

    for (index, &port) in ports.iter().enumerate() {
        let tx = tx.clone();
        let transport = Arc::clone(&transport);
        let host_owned = host.to_string();
        let request = request.clone();
        let cancel = cancel.clone();
        let spawned = thread::Builder::new()
            .name(format!("smtp-probe-{port}"))
            .spawn(move || {
                let outcome = probe_port(transport.as_ref(), &host_owned, port, &request, &cancel);
                // The racer may already have returned.
                let _ = tx.send((index, outcome));
            });
        match spawned {
            Ok(_) => launched += 1,
            Err(err) => {
                warn!(target: LOG_TARGET, host, port, %err, "probe thread not started");
                slots[index] = Some(ProbeOutcome::silent(
                    port,
                    format!("probe not started: {err}"),
                ));
            }
        }
    }
    drop(tx);

    for _ in 0..launched {
        let Ok((index, outcome)) = rx.recv() else {
            break;
        };
        debug!(
            target: LOG_TARGET,
            host,
            port = outcome.port,
            code = outcome.response_code,
            success = outcome.success,
            "probe finished"
        );
        if outcome.is_decisive() {
            cancel.cancel();
            return ServerVerdict::decided(host, outcome);
        }
        slots[index] = Some(outcome);
    }

    let outcomes = slots
        .into_iter()
        .zip(ports)
        .map(|(slot, &port)| {
            slot.unwrap_or_else(|| ProbeOutcome::silent(port, "probe ended without reporting"))
        })
        .collect();
    let verdict = ServerVerdict::reduce(host, outcomes);
    if verdict.all_ports_blocked {
        warn!(target: LOG_TARGET, host, ?ports, "no SMTP port answered");
    }
    verdict
}
