//! Incremental Command Parser
//!
//! This module implements the central hard problem of the server:
//! reconstructing one structured [`Command`] from a byte stream delivered in
//! arbitrarily small, arbitrarily-timed chunks, without blocking and without
//! re-parsing already-consumed bytes.
//!
//! ## How Parsing Works
//!
//! A request is an array of bulk strings:
//!
//! ```text
//! *3\r\n$3\r\nSET\r\n$4\r\nname\r\n$4\r\nAriz\r\n
//! ```
//!
//! The parser is an explicit finite-state machine. Each stage attempts to
//! consume exactly one token from the connection's accumulation buffer:
//!
//! ```text
//! ArrayLength → CommandName → [Key] → [Value] → [OptionName ⇄ OptionValue]* → Complete
//! ```
//!
//! The transition taken after each stage depends on the command name and the
//! declared element count, not on a fixed sequence. PING stops after the
//! name; GET reads a key; SET reads key, value, and zero or more option
//! pairs.
//!
//! ## Suspension
//!
//! If the buffer does not yet hold a full token, [`CommandBuilder::advance`]
//! returns [`ParseOutcome::Suspended`] and retains all prior partial state
//! unchanged. The owning connection waits for the next readiness event and
//! calls `advance` again; no stage is restarted. In particular, once the
//! `$<len>\r\n` header of a bulk string has been consumed, a suspension in
//! the middle of the payload resumes at the payload, not at the header.
//!
//! ## Errors
//!
//! A declared array length below one, a declared count that does not match
//! the command's argument shape, a non-numeric length token, an unknown
//! command name, and an unrecognized SET option are all protocol errors.
//! The connection that produced them is closed; other connections are
//! unaffected.

use crate::command::Command;
use crate::protocol::types::{prefix, CRLF};
use bytes::{Buf, Bytes, BytesMut};
use std::time::Duration;
use thiserror::Error;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum length of a `*<n>\r\n` or `$<len>\r\n` header line
const MAX_LENGTH_LINE: usize = 32;

/// Errors that can occur while building a command from wire bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The first byte of a token was not the expected marker
    #[error("expected '{expected}' marker, found {found:#04x}")]
    UnexpectedMarker { expected: char, found: u8 },

    /// A length token contained something other than decimal digits
    #[error("invalid length token: {0}")]
    InvalidLength(String),

    /// A declared array length below one is a malformed request
    #[error("invalid array length: {0}")]
    InvalidArrayLength(i64),

    /// Bulk string payload exceeds the allowed maximum
    #[error("bulk string too large: {size} bytes (max: {max})")]
    BulkTooLarge { size: usize, max: usize },

    /// Bulk string payload was not followed by CRLF
    #[error("bulk string missing trailing CRLF")]
    MissingTerminator,

    /// Command name is not in the implemented set
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// Declared element count does not match the command's argument shape
    #[error("wrong number of arguments for '{command}' command")]
    WrongArity { command: &'static str },

    /// SET option name is not in the recognized option set
    #[error("unknown option '{0}' for 'SET' command")]
    UnknownOption(String),

    /// SET expiry option value was not a positive integer
    #[error("invalid expire time in 'SET' command")]
    InvalidExpiry,

    /// A token that must be text (command or option name) was not UTF-8
    #[error("invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),
}

/// Result of one call to [`CommandBuilder::advance`].
#[derive(Debug, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The buffer does not yet hold enough bytes; all partial state is
    /// retained for the next call.
    Suspended,

    /// A full command was assembled and finalized.
    Complete(Command),
}

/// The stages of the command builder.
///
/// Stages only move forward, with repetition between `OptionName` and
/// `OptionValue` for each declared option pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    #[default]
    ArrayLength,
    CommandName,
    Key,
    Value,
    OptionName,
    OptionValue,
    Complete,
}

/// The implemented command set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Ping,
    Echo,
    Get,
    Set,
}

impl Kind {
    fn name(self) -> &'static str {
        match self {
            Kind::Ping => "PING",
            Kind::Echo => "ECHO",
            Kind::Get => "GET",
            Kind::Set => "SET",
        }
    }
}

/// Recognized SET options. Both take one value argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetOption {
    /// Expiry in seconds
    Ex,
    /// Expiry in milliseconds
    Px,
}

/// The command under construction, accumulated across resumptions.
#[derive(Debug, Default)]
struct Partial {
    kind: Option<Kind>,
    /// Element count the client declared for the array
    declared: usize,
    /// Elements not yet consumed
    remaining: usize,
    key: Option<Bytes>,
    value: Option<Bytes>,
    /// Option name consumed, its value argument still outstanding
    pending_option: Option<SetOption>,
    expiry: Option<Duration>,
}

/// Pure transition function of the state machine.
///
/// Given the stage that just completed and the command assembled so far,
/// returns the next stage. Has no access to I/O or buffers, so every
/// transition can be unit-tested in isolation.
fn transition(stage: Stage, partial: &Partial) -> Stage {
    match stage {
        Stage::ArrayLength => Stage::CommandName,
        Stage::CommandName => match partial.kind {
            Some(Kind::Ping) => Stage::Complete,
            Some(Kind::Echo) => Stage::Value,
            Some(Kind::Get) | Some(Kind::Set) => Stage::Key,
            // The name stage sets `kind` before transitioning
            None => Stage::CommandName,
        },
        Stage::Key => match partial.kind {
            Some(Kind::Get) => Stage::Complete,
            _ => Stage::Value,
        },
        Stage::Value => match partial.kind {
            Some(Kind::Echo) => Stage::Complete,
            _ if partial.remaining > 0 => Stage::OptionName,
            _ => Stage::Complete,
        },
        Stage::OptionName => Stage::OptionValue,
        Stage::OptionValue => {
            if partial.remaining > 0 {
                Stage::OptionName
            } else {
                Stage::Complete
            }
        }
        Stage::Complete => Stage::Complete,
    }
}

/// Validates the declared array length against the command's expected shape.
///
/// PING takes no arguments, ECHO and GET exactly one, SET a key and value
/// plus zero or more two-element option pairs.
fn check_shape(kind: Kind, declared: usize) -> Result<(), ParseError> {
    let ok = match kind {
        Kind::Ping => declared == 1,
        Kind::Echo => declared == 2,
        Kind::Get => declared == 2,
        Kind::Set => declared >= 3 && declared % 2 == 1,
    };
    if ok {
        Ok(())
    } else {
        Err(ParseError::WrongArity {
            command: kind.name(),
        })
    }
}

/// Incremental, resumable builder for one [`Command`].
///
/// One builder assembles exactly one command. The owning connection creates
/// a fresh builder when a new command begins and discards this one once
/// [`ParseOutcome::Complete`] is returned.
///
/// # Example
///
/// ```
/// use emberkv::protocol::{CommandBuilder, ParseOutcome};
/// use bytes::BytesMut;
///
/// let mut builder = CommandBuilder::new();
/// let mut buf = BytesMut::from(&b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n"[..]);
///
/// match builder.advance(&mut buf).unwrap() {
///     ParseOutcome::Complete(command) => println!("parsed {:?}", command),
///     ParseOutcome::Suspended => println!("need more bytes"),
/// }
/// ```
#[derive(Debug, Default)]
pub struct CommandBuilder {
    stage: Stage,
    partial: Partial,
    /// Bulk payload length whose `$<len>\r\n` header has already been
    /// consumed. Survives suspension so the header is never re-read.
    pending_bulk: Option<usize>,
}

impl CommandBuilder {
    /// Creates a builder in its initial stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stage the builder will attempt next.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Consumes tokens from `buf` until the command completes or the buffer
    /// runs dry.
    ///
    /// Bytes are consumed from the front of `buf` only when the token they
    /// belong to is fully available; a suspended call leaves unconsumed
    /// bytes (and all builder state) exactly as they were.
    pub fn advance(&mut self, buf: &mut BytesMut) -> Result<ParseOutcome, ParseError> {
        loop {
            match self.stage {
                Stage::ArrayLength => {
                    let n = match take_length_line(buf, prefix::ARRAY)? {
                        Some(n) => n,
                        None => return Ok(ParseOutcome::Suspended),
                    };
                    if n < 1 {
                        return Err(ParseError::InvalidArrayLength(n));
                    }
                    self.partial.declared = n as usize;
                    self.partial.remaining = n as usize;
                }
                Stage::CommandName => {
                    let token = match self.next_element(buf)? {
                        Some(t) => t,
                        None => return Ok(ParseOutcome::Suspended),
                    };
                    let name = std::str::from_utf8(&token)
                        .map_err(|_| ParseError::InvalidUtf8("command name"))?
                        .to_ascii_uppercase();
                    let kind = match name.as_str() {
                        "PING" => Kind::Ping,
                        "ECHO" => Kind::Echo,
                        "GET" => Kind::Get,
                        "SET" => Kind::Set,
                        _ => return Err(ParseError::UnknownCommand(name)),
                    };
                    check_shape(kind, self.partial.declared)?;
                    self.partial.kind = Some(kind);
                }
                Stage::Key => {
                    let token = match self.next_element(buf)? {
                        Some(t) => t,
                        None => return Ok(ParseOutcome::Suspended),
                    };
                    self.partial.key = Some(token);
                }
                Stage::Value => {
                    let token = match self.next_element(buf)? {
                        Some(t) => t,
                        None => return Ok(ParseOutcome::Suspended),
                    };
                    self.partial.value = Some(token);
                }
                Stage::OptionName => {
                    let token = match self.next_element(buf)? {
                        Some(t) => t,
                        None => return Ok(ParseOutcome::Suspended),
                    };
                    let name = std::str::from_utf8(&token)
                        .map_err(|_| ParseError::InvalidUtf8("option name"))?
                        .to_ascii_uppercase();
                    let option = match name.as_str() {
                        "EX" => SetOption::Ex,
                        "PX" => SetOption::Px,
                        _ => return Err(ParseError::UnknownOption(name)),
                    };
                    self.partial.pending_option = Some(option);
                }
                Stage::OptionValue => {
                    let token = match self.next_element(buf)? {
                        Some(t) => t,
                        None => return Ok(ParseOutcome::Suspended),
                    };
                    let amount: u64 = std::str::from_utf8(&token)
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .filter(|n| *n > 0)
                        .ok_or(ParseError::InvalidExpiry)?;
                    // The option name stage always runs first
                    let option = self
                        .partial
                        .pending_option
                        .take()
                        .ok_or(ParseError::InvalidExpiry)?;
                    // Last occurrence wins when an option repeats
                    self.partial.expiry = Some(match option {
                        SetOption::Ex => Duration::from_secs(amount),
                        SetOption::Px => Duration::from_millis(amount),
                    });
                }
                Stage::Complete => unreachable!("builder reused after completion"),
            }

            self.stage = transition(self.stage, &self.partial);

            if self.stage == Stage::Complete {
                return Ok(ParseOutcome::Complete(self.finalize()?));
            }
        }
    }

    /// Reads one array element (a bulk string), decrementing the remaining
    /// element count on success.
    fn next_element(&mut self, buf: &mut BytesMut) -> Result<Option<Bytes>, ParseError> {
        match self.take_bulk(buf)? {
            Some(token) => {
                self.partial.remaining = self.partial.remaining.saturating_sub(1);
                Ok(Some(token))
            }
            None => Ok(None),
        }
    }

    /// Reads one bulk string: `$<len>\r\n<len bytes>\r\n`.
    ///
    /// The header and the payload are consumed in two steps. When the
    /// header has been consumed but the payload is incomplete, the length
    /// is parked in `pending_bulk` and the next call resumes directly at
    /// the payload. Never reads past the declared frame boundary.
    fn take_bulk(&mut self, buf: &mut BytesMut) -> Result<Option<Bytes>, ParseError> {
        let len = match self.pending_bulk {
            Some(len) => len,
            None => {
                let n = match take_length_line(buf, prefix::BULK)? {
                    Some(n) => n,
                    None => return Ok(None),
                };
                if n < 0 {
                    return Err(ParseError::InvalidLength(format!(
                        "negative bulk length {}",
                        n
                    )));
                }
                let n = n as usize;
                if n > MAX_BULK_SIZE {
                    return Err(ParseError::BulkTooLarge {
                        size: n,
                        max: MAX_BULK_SIZE,
                    });
                }
                self.pending_bulk = Some(n);
                n
            }
        };

        if buf.len() < len + CRLF.len() {
            return Ok(None);
        }
        if &buf[len..len + CRLF.len()] != CRLF {
            return Err(ParseError::MissingTerminator);
        }

        let payload = buf.split_to(len).freeze();
        buf.advance(CRLF.len());
        self.pending_bulk = None;
        Ok(Some(payload))
    }

    /// Locks the partial command into an immutable [`Command`].
    fn finalize(&mut self) -> Result<Command, ParseError> {
        let partial = std::mem::take(&mut self.partial);
        match partial.kind {
            Some(Kind::Ping) => Ok(Command::Ping),
            Some(Kind::Echo) => Ok(Command::Echo {
                message: partial.value.ok_or(ParseError::WrongArity { command: "ECHO" })?,
            }),
            Some(Kind::Get) => Ok(Command::Get {
                key: partial.key.ok_or(ParseError::WrongArity { command: "GET" })?,
            }),
            Some(Kind::Set) => {
                let key = partial.key.ok_or(ParseError::WrongArity { command: "SET" })?;
                let value = partial.value.ok_or(ParseError::WrongArity { command: "SET" })?;
                Ok(Command::Set {
                    key,
                    value,
                    expiry: partial.expiry,
                })
            }
            None => Err(ParseError::UnknownCommand(String::new())),
        }
    }
}

/// Consumes a `<marker><digits>\r\n` line from the front of `buf`.
///
/// Returns `Ok(None)` when the terminator has not arrived yet; the line is
/// left in the buffer untouched. The marker and terminator are stripped and
/// the digits parsed as a (possibly negative) decimal integer.
fn take_length_line(buf: &mut BytesMut, marker: u8) -> Result<Option<i64>, ParseError> {
    let Some(&first) = buf.first() else {
        return Ok(None);
    };
    if first != marker {
        return Err(ParseError::UnexpectedMarker {
            expected: marker as char,
            found: first,
        });
    }

    let Some(pos) = find_crlf(&buf[1..]) else {
        if buf.len() > MAX_LENGTH_LINE {
            return Err(ParseError::InvalidLength(
                "length line missing terminator".to_string(),
            ));
        }
        return Ok(None);
    };

    let digits = &buf[1..1 + pos];
    let text = std::str::from_utf8(digits)
        .map_err(|_| ParseError::InvalidLength("non-ASCII length".to_string()))?;
    let n: i64 = text
        .parse()
        .map_err(|_| ParseError::InvalidLength(text.to_string()))?;

    buf.advance(1 + pos + CRLF.len());
    Ok(Some(n))
}

/// Finds the position of CRLF in the buffer.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn parse_all(input: &[u8]) -> Result<ParseOutcome, ParseError> {
        let mut buf = BytesMut::from(input);
        CommandBuilder::new().advance(&mut buf)
    }

    fn parsed(input: &[u8]) -> Command {
        match parse_all(input).unwrap() {
            ParseOutcome::Complete(command) => command,
            ParseOutcome::Suspended => panic!("unexpected suspension"),
        }
    }

    #[test]
    fn parse_ping() {
        assert_eq!(parsed(b"*1\r\n$4\r\nPING\r\n"), Command::Ping);
    }

    #[test]
    fn parse_ping_lowercase() {
        assert_eq!(parsed(b"*1\r\n$4\r\nping\r\n"), Command::Ping);
    }

    #[test]
    fn parse_echo() {
        assert_eq!(
            parsed(b"*2\r\n$4\r\nECHO\r\n$5\r\nhello\r\n"),
            Command::Echo {
                message: Bytes::from("hello")
            }
        );
    }

    #[test]
    fn parse_get() {
        assert_eq!(
            parsed(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n"),
            Command::Get {
                key: Bytes::from("name")
            }
        );
    }

    #[test]
    fn parse_set() {
        assert_eq!(
            parsed(b"*3\r\n$3\r\nSET\r\n$4\r\nname\r\n$4\r\nAriz\r\n"),
            Command::Set {
                key: Bytes::from("name"),
                value: Bytes::from("Ariz"),
                expiry: None,
            }
        );
    }

    #[test]
    fn parse_set_with_px() {
        assert_eq!(
            parsed(b"*5\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n$2\r\nPX\r\n$3\r\n100\r\n"),
            Command::Set {
                key: Bytes::from("k"),
                value: Bytes::from("v"),
                expiry: Some(Duration::from_millis(100)),
            }
        );
    }

    #[test]
    fn parse_set_with_ex() {
        assert_eq!(
            parsed(b"*5\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n$2\r\nEX\r\n$2\r\n10\r\n"),
            Command::Set {
                key: Bytes::from("k"),
                value: Bytes::from("v"),
                expiry: Some(Duration::from_secs(10)),
            }
        );
    }

    #[test]
    fn parse_set_last_option_wins() {
        let input =
            b"*7\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n$2\r\nEX\r\n$2\r\n10\r\n$2\r\nPX\r\n$2\r\n50\r\n";
        assert_eq!(
            parsed(input),
            Command::Set {
                key: Bytes::from("k"),
                value: Bytes::from("v"),
                expiry: Some(Duration::from_millis(50)),
            }
        );
    }

    #[test]
    fn binary_safe_payloads() {
        // Embedded CRLF and NUL bytes inside a bulk string are data, not
        // terminators.
        assert_eq!(
            parsed(b"*3\r\n$3\r\nSET\r\n$4\r\na\r\nb\r\n$3\r\nx\x00y\r\n"),
            Command::Set {
                key: Bytes::from(&b"a\r\nb"[..]),
                value: Bytes::from(&b"x\x00y"[..]),
                expiry: None,
            }
        );
    }

    #[test]
    fn empty_buffer_suspends() {
        assert_eq!(parse_all(b"").unwrap(), ParseOutcome::Suspended);
    }

    #[test]
    fn byte_at_a_time_equals_one_shot() {
        let inputs: [&[u8]; 5] = [
            b"*1\r\n$4\r\nPING\r\n",
            b"*2\r\n$4\r\nECHO\r\n$5\r\nhello\r\n",
            b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n",
            b"*3\r\n$3\r\nSET\r\n$4\r\nname\r\n$4\r\nAriz\r\n",
            b"*5\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n$2\r\nPX\r\n$3\r\n100\r\n",
        ];

        for input in inputs {
            let expected = parsed(input);

            // Feed one byte per resumption, forcing maximal suspension.
            let mut builder = CommandBuilder::new();
            let mut buf = BytesMut::new();
            let mut result = None;
            for (i, byte) in input.iter().enumerate() {
                buf.extend_from_slice(&[*byte]);
                match builder.advance(&mut buf).unwrap() {
                    ParseOutcome::Suspended => assert!(i + 1 < input.len()),
                    ParseOutcome::Complete(command) => {
                        result = Some(command);
                        assert_eq!(i + 1, input.len());
                    }
                }
            }
            assert_eq!(result.expect("command never completed"), expected);
        }
    }

    #[test]
    fn every_split_point_equals_one_shot() {
        let input: &[u8] = b"*5\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n$2\r\nPX\r\n$3\r\n100\r\n";
        let expected = parsed(input);

        for split in 1..input.len() {
            let mut builder = CommandBuilder::new();
            let mut buf = BytesMut::from(&input[..split]);
            assert_eq!(
                builder.advance(&mut buf).unwrap(),
                ParseOutcome::Suspended,
                "prefix of {} bytes should suspend",
                split
            );
            buf.extend_from_slice(&input[split..]);
            match builder.advance(&mut buf).unwrap() {
                ParseOutcome::Complete(command) => assert_eq!(command, expected),
                ParseOutcome::Suspended => panic!("split at {} never completed", split),
            }
        }
    }

    #[test]
    fn bulk_header_not_reread_after_suspension() {
        let mut builder = CommandBuilder::new();
        let mut buf = BytesMut::from(&b"*2\r\n$3\r\nGET\r\n$4\r\nna"[..]);
        assert_eq!(builder.advance(&mut buf).unwrap(), ParseOutcome::Suspended);
        // The `$4\r\n` header was consumed; only the partial payload stays
        // buffered for the resumed read.
        assert_eq!(&buf[..], b"na");
        buf.extend_from_slice(b"me\r\n");
        assert_eq!(
            builder.advance(&mut buf).unwrap(),
            ParseOutcome::Complete(Command::Get {
                key: Bytes::from("name")
            })
        );
    }

    #[test]
    fn trailing_bytes_stay_buffered() {
        let mut builder = CommandBuilder::new();
        let mut buf = BytesMut::from(&b"*1\r\n$4\r\nPING\r\n*2\r\n$3\r\nGET\r\n$1\r\nk\r\n"[..]);
        assert_eq!(
            builder.advance(&mut buf).unwrap(),
            ParseOutcome::Complete(Command::Ping)
        );
        // The second command is untouched and parses with a fresh builder.
        let mut next = CommandBuilder::new();
        assert_eq!(
            next.advance(&mut buf).unwrap(),
            ParseOutcome::Complete(Command::Get {
                key: Bytes::from("k")
            })
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn zero_length_array_is_an_error() {
        assert_eq!(
            parse_all(b"*0\r\n"),
            Err(ParseError::InvalidArrayLength(0))
        );
    }

    #[test]
    fn negative_array_length_is_an_error() {
        assert_eq!(
            parse_all(b"*-1\r\n"),
            Err(ParseError::InvalidArrayLength(-1))
        );
    }

    #[test]
    fn non_numeric_bulk_length_is_an_error() {
        assert!(matches!(
            parse_all(b"*1\r\n$abc\r\n"),
            Err(ParseError::InvalidLength(_))
        ));
    }

    #[test]
    fn wrong_marker_is_an_error() {
        assert!(matches!(
            parse_all(b"@1\r\n"),
            Err(ParseError::UnexpectedMarker { .. })
        ));
        assert!(matches!(
            parse_all(b"*1\r\n+PING\r\n"),
            Err(ParseError::UnexpectedMarker { .. })
        ));
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert_eq!(
            parse_all(b"*1\r\n$5\r\nHELLO\r\n"),
            Err(ParseError::UnknownCommand("HELLO".to_string()))
        );
    }

    #[test]
    fn arity_mismatches_are_errors() {
        // PING takes no arguments
        assert_eq!(
            parse_all(b"*2\r\n$4\r\nPING\r\n$2\r\nhi\r\n"),
            Err(ParseError::WrongArity { command: "PING" })
        );
        // GET takes exactly one
        assert_eq!(
            parse_all(b"*3\r\n$3\r\nGET\r\n$1\r\na\r\n$1\r\nb\r\n"),
            Err(ParseError::WrongArity { command: "GET" })
        );
        // SET options come in pairs, so an even count is malformed
        assert_eq!(
            parse_all(b"*4\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n$2\r\nPX\r\n"),
            Err(ParseError::WrongArity { command: "SET" })
        );
    }

    #[test]
    fn unrecognized_set_option_is_rejected() {
        assert_eq!(
            parse_all(b"*5\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n$2\r\nZZ\r\n$1\r\n1\r\n"),
            Err(ParseError::UnknownOption("ZZ".to_string()))
        );
    }

    #[test]
    fn non_numeric_expiry_is_rejected() {
        assert_eq!(
            parse_all(b"*5\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n$2\r\nPX\r\n$3\r\nabc\r\n"),
            Err(ParseError::InvalidExpiry)
        );
    }

    #[test]
    fn zero_expiry_is_rejected() {
        assert_eq!(
            parse_all(b"*5\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n$2\r\nPX\r\n$1\r\n0\r\n"),
            Err(ParseError::InvalidExpiry)
        );
    }

    #[test]
    fn bulk_missing_terminator_is_an_error() {
        assert_eq!(
            parse_all(b"*1\r\n$4\r\nPINGXX"),
            Err(ParseError::MissingTerminator)
        );
    }

    #[test]
    fn oversized_bulk_is_rejected() {
        let input = format!("*1\r\n${}\r\n", MAX_BULK_SIZE + 1);
        assert!(matches!(
            parse_all(input.as_bytes()),
            Err(ParseError::BulkTooLarge { .. })
        ));
    }

    // Exhaustive checks of the pure transition function, one per edge of
    // the stage diagram.
    mod transitions {
        use super::super::*;

        fn partial(kind: Kind, remaining: usize) -> Partial {
            Partial {
                kind: Some(kind),
                remaining,
                ..Partial::default()
            }
        }

        #[test]
        fn array_length_always_leads_to_name() {
            assert_eq!(
                transition(Stage::ArrayLength, &Partial::default()),
                Stage::CommandName
            );
        }

        #[test]
        fn name_branches_on_kind() {
            assert_eq!(
                transition(Stage::CommandName, &partial(Kind::Ping, 0)),
                Stage::Complete
            );
            assert_eq!(
                transition(Stage::CommandName, &partial(Kind::Echo, 1)),
                Stage::Value
            );
            assert_eq!(
                transition(Stage::CommandName, &partial(Kind::Get, 1)),
                Stage::Key
            );
            assert_eq!(
                transition(Stage::CommandName, &partial(Kind::Set, 2)),
                Stage::Key
            );
        }

        #[test]
        fn key_branches_on_kind() {
            assert_eq!(
                transition(Stage::Key, &partial(Kind::Get, 0)),
                Stage::Complete
            );
            assert_eq!(
                transition(Stage::Key, &partial(Kind::Set, 1)),
                Stage::Value
            );
        }

        #[test]
        fn value_branches_on_remaining_options() {
            assert_eq!(
                transition(Stage::Value, &partial(Kind::Echo, 0)),
                Stage::Complete
            );
            assert_eq!(
                transition(Stage::Value, &partial(Kind::Set, 0)),
                Stage::Complete
            );
            assert_eq!(
                transition(Stage::Value, &partial(Kind::Set, 2)),
                Stage::OptionName
            );
        }

        #[test]
        fn option_pair_loops_until_exhausted() {
            assert_eq!(
                transition(Stage::OptionName, &partial(Kind::Set, 1)),
                Stage::OptionValue
            );
            assert_eq!(
                transition(Stage::OptionValue, &partial(Kind::Set, 2)),
                Stage::OptionName
            );
            assert_eq!(
                transition(Stage::OptionValue, &partial(Kind::Set, 0)),
                Stage::Complete
            );
        }

        #[test]
        fn complete_is_terminal() {
            assert_eq!(
                transition(Stage::Complete, &partial(Kind::Ping, 0)),
                Stage::Complete
            );
        }
    }
}
