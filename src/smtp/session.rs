use std::io::{self, BufRead, BufReader, Read, Write};

use super::transport::SmtpStream;
use super::types::SmtpReply;

const MAX_LINE_LEN: u64 = 4096;
const MAX_REPLY_LINES: usize = 128;

/// Line-oriented SMTP client connection. Dropping it closes the stream.
pub(crate) struct SmtpSession {
    reader: BufReader<Box<dyn SmtpStream>>,
}

impl SmtpSession {
    pub(crate) fn new(stream: Box<dyn SmtpStream>) -> Self {
        Self {
            reader: BufReader::new(stream),
        }
    }

    pub(crate) fn send_command(&mut self, command: &str) -> io::Result<()> {
        let mut line = command.as_bytes().to_vec();
        line.extend_from_slice(b"\r\n");
        let stream = self.reader.get_mut();
        stream.write_all(&line)?;
        stream.flush()
    }

    /// Reads one complete reply, following `NNN-` continuation lines up to
    /// the final `NNN ` line.
    pub(crate) fn read_reply(&mut self) -> io::Result<SmtpReply> {
        let mut code = None;
        let mut message_lines = Vec::new();
        loop {
            let raw = self.read_line()?;
            let parsed_code = parse_code(&raw).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("invalid SMTP reply: '{raw}'"),
                )
            })?;
            if let Some(existing) = code {
                if existing != parsed_code {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("inconsistent SMTP reply codes: {existing} vs {parsed_code}"),
                    ));
                }
            } else {
                code = Some(parsed_code);
            }
            let continuation = raw.as_bytes().get(3).copied() == Some(b'-');
            message_lines.push(raw.get(4..).unwrap_or_default().to_string());
            if !continuation {
                break;
            }
            if message_lines.len() >= MAX_REPLY_LINES {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "SMTP reply has too many lines",
                ));
            }
        }
        Ok(SmtpReply {
            code: code.ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, "SMTP reply missing status code")
            })?,
            message: message_lines.join("\n"),
        })
    }

    fn read_line(&mut self) -> io::Result<String> {
        let mut raw = String::new();
        let bytes = (&mut self.reader).take(MAX_LINE_LEN).read_line(&mut raw)?;
        if bytes == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed while reading reply",
            ));
        }
        if !raw.ends_with('\n') {
            if bytes as u64 >= MAX_LINE_LEN {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "SMTP reply line too long",
                ));
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed in the middle of a reply",
            ));
        }
        raw.pop();
        if raw.ends_with('\r') {
            raw.pop();
        }
        Ok(raw)
    }
}

/// Three leading digits forming a code in 100..=599.
fn parse_code(line: &str) -> Option<u16> {
    let digits = line.get(..3)?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match line.as_bytes().get(3) {
        None | Some(b' ') | Some(b'-') => {}
        Some(_) => return None,
    }
    digits.parse::<u16>().ok().filter(|c| (100..600).contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn session(input: impl AsRef<[u8]>) -> SmtpSession {
        SmtpSession::new(Box::new(Cursor::new(input.as_ref().to_vec())))
    }

    #[test]
    fn reads_single_line_reply() {
        let mut s = session("220 mx.example.com ESMTP ready\r\n");
        let reply = s.read_reply().expect("reply");
        assert_eq!(reply.code, 220);
        assert_eq!(reply.message, "mx.example.com ESMTP ready");
    }

    #[test]
    fn joins_continuation_lines() {
        let mut s = session("250-mx.example.com\r\n250-SIZE 1000\r\n250 8BITMIME\r\n");
        let reply = s.read_reply().expect("reply");
        assert_eq!(reply.code, 250);
        assert_eq!(reply.message, "mx.example.com\nSIZE 1000\n8BITMIME");
    }

    #[test]
    fn bare_code_and_lf_endings() {
        let mut s = session("221\n");
        let reply = s.read_reply().expect("reply");
        assert_eq!(reply.code, 221);
        assert_eq!(reply.message, "");
    }

    #[test]
    fn rejects_garbage_and_mixed_codes() {
        let err = session("hello\r\n").read_reply().expect_err("garbage");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let err = session("250-a\r\n251 b\r\n").read_reply().expect_err("mixed");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn eof_is_reported() {
        let err = session("").read_reply().expect_err("eof");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        let err = session("250 partial").read_reply().expect_err("partial line");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn overlong_line_is_rejected() {
        let long = format!("250 {}\r\n", "x".repeat(5000));
        let err = session(long).read_reply().expect_err("too long");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
