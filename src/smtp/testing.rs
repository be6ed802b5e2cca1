//! In-memory transport replaying scripted server replies.

use std::collections::{HashMap, VecDeque};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::transport::{SmtpStream, Transport};
use super::types::ProbeRequest;

/// One server behaviour, consumed in order. The first item answers the
/// connection; every later item answers one client command.
#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Reply(&'static str),
    /// Say nothing for a while, then report an idle timeout.
    Stall(Duration),
}

type Log = Arc<Mutex<Vec<(String, u16, String)>>>;

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    scripts: HashMap<(String, u16), Vec<Scripted>>,
    otherwise: Option<Vec<Scripted>>,
    log: Log,
    open: Arc<AtomicUsize>,
    connections: Mutex<Vec<(String, u16)>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(mut self, host: &str, port: u16, script: Vec<Scripted>) -> Self {
        self.scripts.insert((host.to_string(), port), script);
        self
    }

    /// Script for every endpoint without its own. Without one, unscripted
    /// endpoints refuse the connection.
    pub(crate) fn otherwise(mut self, script: Vec<Scripted>) -> Self {
        self.otherwise = Some(script);
        self
    }

    pub(crate) fn commands(&self, host: &str, port: u16) -> Vec<String> {
        self.log
            .lock()
            .map(|log| {
                log.iter()
                    .filter(|(h, p, _)| h == host && *p == port)
                    .map(|(_, _, command)| command.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Hosts connected to, in first-contact order.
    pub(crate) fn hosts_contacted(&self) -> Vec<String> {
        let mut hosts: Vec<String> = Vec::new();
        if let Ok(connections) = self.connections.lock() {
            for (host, _) in connections.iter() {
                if !hosts.contains(host) {
                    hosts.push(host.clone());
                }
            }
        }
        hosts
    }

    pub(crate) fn connect_count(&self) -> usize {
        self.connections.lock().map(|c| c.len()).unwrap_or_default()
    }

    pub(crate) fn all_closed(&self) -> bool {
        self.open.load(Ordering::SeqCst) == 0
    }
}

impl Transport for ScriptedTransport {
    fn connect(
        &self,
        host: &str,
        port: u16,
        _timeout: Duration,
    ) -> io::Result<Box<dyn SmtpStream>> {
        let script = self
            .scripts
            .get(&(host.to_string(), port))
            .or(self.otherwise.as_ref())
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"))?;
        if let Ok(mut connections) = self.connections.lock() {
            connections.push((host.to_string(), port));
        }
        self.open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedStream {
            items: script.into(),
            unlocked: 1,
            pending: Vec::new(),
            pos: 0,
            partial: Vec::new(),
            host: host.to_string(),
            port,
            log: Arc::clone(&self.log),
            open: Arc::clone(&self.open),
        }))
    }
}

struct ScriptedStream {
    items: VecDeque<Scripted>,
    unlocked: usize,
    pending: Vec<u8>,
    pos: usize,
    partial: Vec<u8>,
    host: String,
    port: u16,
    log: Log,
    open: Arc<AtomicUsize>,
}

impl Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos < self.pending.len() {
            let n = buf.len().min(self.pending.len() - self.pos);
            buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
            self.pos += n;
            return Ok(n);
        }
        if self.items.is_empty() {
            return Ok(0);
        }
        if self.unlocked == 0 {
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "server waits for a command",
            ));
        }
        self.unlocked -= 1;
        match self.items.pop_front() {
            Some(Scripted::Reply(text)) => {
                self.pending = text.as_bytes().to_vec();
                self.pos = 0;
                self.read(buf)
            }
            Some(Scripted::Stall(duration)) => {
                thread::sleep(duration);
                Err(io::Error::new(io::ErrorKind::TimedOut, "idle timeout"))
            }
            None => Ok(0),
        }
    }
}

impl Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.partial.extend_from_slice(buf);
        while let Some(end) = self.partial.windows(2).position(|w| w == b"\r\n") {
            let line: Vec<u8> = self.partial.drain(..end + 2).collect();
            let command = String::from_utf8_lossy(&line[..end]).into_owned();
            if let Ok(mut log) = self.log.lock() {
                log.push((self.host.clone(), self.port, command));
            }
            self.unlocked += 1;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ScriptedStream {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Server that accepts the recipient with 250.
pub(crate) fn accepting_script() -> Vec<Scripted> {
    vec![
        Scripted::Reply("220 mx.example.com ESMTP\r\n"),
        Scripted::Reply("250-mx.example.com\r\n250 SIZE 35882577\r\n"),
        Scripted::Reply("250 2.1.0 Ok\r\n"),
        Scripted::Reply("250 2.1.5 Ok\r\n"),
        Scripted::Reply("221 2.0.0 Bye\r\n"),
    ]
}

/// Server that answers `RCPT TO` with `rcpt_reply`.
pub(crate) fn rcpt_script(rcpt_reply: &'static str) -> Vec<Scripted> {
    vec![
        Scripted::Reply("220 mx.example.com ESMTP\r\n"),
        Scripted::Reply("250 mx.example.com\r\n"),
        Scripted::Reply("250 2.1.0 Ok\r\n"),
        Scripted::Reply(rcpt_reply),
        Scripted::Reply("221 2.0.0 Bye\r\n"),
    ]
}

/// Server that never says anything.
pub(crate) fn silent_script(stall: Duration) -> Vec<Scripted> {
    vec![Scripted::Stall(stall)]
}

pub(crate) fn request(recipient: &str) -> ProbeRequest {
    ProbeRequest {
        recipient: recipient.to_string(),
        helo: "probe.test".to_string(),
        sender: "verify@probe.test".to_string(),
        timeout: Duration::from_millis(50),
    }
}
