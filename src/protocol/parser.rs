//! Incremental RESP2 Parser
//!
//! Recursive-descent parser over a byte buffer. The caller accumulates
//! incoming socket data and asks the parser for one complete value at a
//! time:
//!
//! - `Ok(Some((value, consumed)))` - one value parsed, `consumed` bytes used
//! - `Ok(None)` - the frame is incomplete, read more bytes first
//! - `Err(ParseError)` - the stream violates the protocol
//!
//! `consumed` covers exactly the bytes of the returned value, so the buffer
//! can hold several back-to-back commands and the caller drains them one by
//! one. A parse error always surfaces before any partial value is exposed.

use crate::protocol::types::{prefix, RespValue, CRLF};
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur while parsing the wire protocol.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Type tag byte outside the five known tags
    #[error("unknown type prefix: {0:#04x}")]
    UnknownPrefix(u8),

    /// Line that should hold a base-10 integer does not
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Invalid UTF-8 in a simple string, error line, or length line
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Bulk string length is negative (and not the -1 null marker)
    #[error("invalid bulk string length: {0}")]
    InvalidBulkLength(i64),

    /// Array count is negative (and not the -1 null marker)
    #[error("invalid array length: {0}")]
    InvalidArrayLength(i64),

    /// Framing violation (missing CRLF, nesting too deep, ...)
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// A bulk payload exceeds the maximum allowed size
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum size for a single bulk string (512 MB)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum array nesting depth (prevents unbounded recursion)
pub const MAX_NESTING_DEPTH: usize = 32;

/// An incremental RESP2 parser.
///
/// One instance lives per connection; it carries no state between calls
/// other than the recursion depth guard.
#[derive(Debug, Default)]
pub struct RespParser {
    depth: usize,
}

impl RespParser {
    /// Creates a new parser instance.
    pub fn new() -> Self {
        Self { depth: 0 }
    }

    /// Attempts to parse one RESP2 value from the front of `buf`.
    pub fn parse(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        self.depth = 0;
        self.parse_value(buf)
    }

    fn parse_value(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        if buf.is_empty() {
            return Ok(None);
        }

        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::ProtocolError(format!(
                "maximum nesting depth exceeded: {}",
                MAX_NESTING_DEPTH
            )));
        }

        match buf[0] {
            prefix::SIMPLE_STRING => self.parse_simple_string(buf),
            prefix::ERROR => self.parse_error(buf),
            prefix::INTEGER => self.parse_integer(buf),
            prefix::BULK_STRING => self.parse_bulk_string(buf),
            prefix::ARRAY => self.parse_array(buf),
            other => Err(ParseError::UnknownPrefix(other)),
        }
    }

    /// `+<string>\r\n`
    fn parse_simple_string(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        match read_line(&buf[1..])? {
            Some((line, line_len)) => Ok(Some((
                RespValue::SimpleString(line.to_string()),
                1 + line_len,
            ))),
            None => Ok(None),
        }
    }

    /// `-<message>\r\n`
    fn parse_error(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        match read_line(&buf[1..])? {
            Some((line, line_len)) => {
                Ok(Some((RespValue::Error(line.to_string()), 1 + line_len)))
            }
            None => Ok(None),
        }
    }

    /// `:<integer>\r\n`
    fn parse_integer(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        match read_line(&buf[1..])? {
            Some((line, line_len)) => {
                let n = parse_i64(line)?;
                Ok(Some((RespValue::Integer(n), 1 + line_len)))
            }
            None => Ok(None),
        }
    }

    /// `$<length>\r\n<data>\r\n`, null: `$-1\r\n`
    fn parse_bulk_string(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        let (length, header_len) = match read_line(&buf[1..])? {
            Some((line, line_len)) => (parse_i64(line)?, 1 + line_len),
            None => return Ok(None),
        };

        if length == -1 {
            return Ok(Some((RespValue::BulkString(None), header_len)));
        }
        if length < 0 {
            return Err(ParseError::InvalidBulkLength(length));
        }

        let length = length as usize;
        if length > MAX_BULK_SIZE {
            return Err(ParseError::MessageTooLarge {
                size: length,
                max: MAX_BULK_SIZE,
            });
        }

        let total_needed = header_len + length + 2;
        if buf.len() < total_needed {
            return Ok(None);
        }

        if &buf[header_len + length..total_needed] != CRLF {
            return Err(ParseError::ProtocolError(
                "bulk string missing trailing CRLF".to_string(),
            ));
        }

        let data = Bytes::copy_from_slice(&buf[header_len..header_len + length]);
        Ok(Some((RespValue::BulkString(Some(data)), total_needed)))
    }

    /// `*<count>\r\n<elements...>`, null: `*-1\r\n`
    fn parse_array(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        let (count, header_len) = match read_line(&buf[1..])? {
            Some((line, line_len)) => (parse_i64(line)?, 1 + line_len),
            None => return Ok(None),
        };

        if count == -1 {
            return Ok(Some((RespValue::Array(None), header_len)));
        }
        if count < 0 {
            return Err(ParseError::InvalidArrayLength(count));
        }

        let count = count as usize;
        let mut elements = Vec::with_capacity(count);
        let mut consumed = header_len;

        self.depth += 1;
        for _ in 0..count {
            match self.parse_value(&buf[consumed..])? {
                Some((value, element_consumed)) => {
                    elements.push(value);
                    consumed += element_consumed;
                }
                None => return Ok(None),
            }
        }
        self.depth -= 1;

        Ok(Some((RespValue::Array(Some(elements)), consumed)))
    }
}

/// Reads one CRLF-terminated line from the front of `buf`.
///
/// Returns the line content and the number of bytes it occupies
/// including the terminator, or `None` if no full line is buffered yet.
fn read_line(buf: &[u8]) -> ParseResult<Option<(&str, usize)>> {
    match find_crlf(buf) {
        Some(pos) => {
            let line = std::str::from_utf8(&buf[..pos])
                .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
            Ok(Some((line, pos + 2)))
        }
        None => Ok(None),
    }
}

fn parse_i64(line: &str) -> ParseResult<i64> {
    line.parse()
        .map_err(|_| ParseError::InvalidInteger(line.to_string()))
}

/// Finds the position of the `\r` of the first CRLF pair, if any.
#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}

/// Parses a single message from bytes with a fresh parser.
pub fn parse_message(buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
    RespParser::new().parse(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_string() {
        let result = parse_message(b"+OK\r\n").unwrap().unwrap();
        assert_eq!(result.0, RespValue::SimpleString("OK".to_string()));
        assert_eq!(result.1, 5);
    }

    #[test]
    fn parse_simple_string_incomplete() {
        assert!(parse_message(b"+OK").unwrap().is_none());
    }

    #[test]
    fn parse_error_value() {
        let result = parse_message(b"-ERR unknown command\r\n").unwrap().unwrap();
        assert_eq!(result.0, RespValue::Error("ERR unknown command".to_string()));
        assert_eq!(result.1, 22);
    }

    #[test]
    fn parse_integer() {
        let result = parse_message(b":1000\r\n").unwrap().unwrap();
        assert_eq!(result.0, RespValue::Integer(1000));
        assert_eq!(result.1, 7);
    }

    #[test]
    fn parse_negative_integer() {
        let result = parse_message(b":-42\r\n").unwrap().unwrap();
        assert_eq!(result.0, RespValue::Integer(-42));
    }

    #[test]
    fn parse_bulk_string() {
        let result = parse_message(b"$5\r\nhello\r\n").unwrap().unwrap();
        assert_eq!(result.0, RespValue::bulk_string("hello"));
        assert_eq!(result.1, 11);
    }

    #[test]
    fn parse_null_bulk_string() {
        let result = parse_message(b"$-1\r\n").unwrap().unwrap();
        assert_eq!(result.0, RespValue::BulkString(None));
        assert_eq!(result.1, 5);
    }

    #[test]
    fn parse_empty_bulk_string() {
        let result = parse_message(b"$0\r\n\r\n").unwrap().unwrap();
        assert_eq!(result.0, RespValue::bulk_string(Bytes::new()));
        assert_eq!(result.1, 6);
    }

    #[test]
    fn parse_bulk_string_incomplete() {
        assert!(parse_message(b"$5\r\nhel").unwrap().is_none());
    }

    #[test]
    fn parse_negative_bulk_length_rejected() {
        let result = parse_message(b"$-2\r\n");
        assert_eq!(result, Err(ParseError::InvalidBulkLength(-2)));
    }

    #[test]
    fn parse_array() {
        let result = parse_message(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(
            result.0,
            RespValue::array(vec![
                RespValue::bulk_string("GET"),
                RespValue::bulk_string("name"),
            ])
        );
        assert_eq!(result.1, 23);
    }

    #[test]
    fn parse_null_array() {
        let result = parse_message(b"*-1\r\n").unwrap().unwrap();
        assert_eq!(result.0, RespValue::Array(None));
    }

    #[test]
    fn parse_empty_array() {
        let result = parse_message(b"*0\r\n").unwrap().unwrap();
        assert_eq!(result.0, RespValue::array(vec![]));
    }

    #[test]
    fn parse_negative_array_length_rejected() {
        let result = parse_message(b"*-3\r\n");
        assert_eq!(result, Err(ParseError::InvalidArrayLength(-3)));
    }

    #[test]
    fn parse_nested_array() {
        let result = parse_message(b"*2\r\n:1\r\n*2\r\n:2\r\n:3\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(
            result.0,
            RespValue::array(vec![
                RespValue::Integer(1),
                RespValue::array(vec![RespValue::Integer(2), RespValue::Integer(3)]),
            ])
        );
    }

    #[test]
    fn parse_mixed_array() {
        let result = parse_message(b"*3\r\n+OK\r\n:100\r\n$5\r\nhello\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(
            result.0,
            RespValue::array(vec![
                RespValue::SimpleString("OK".to_string()),
                RespValue::Integer(100),
                RespValue::bulk_string("hello"),
            ])
        );
    }

    #[test]
    fn parse_array_incomplete_element() {
        assert!(parse_message(b"*2\r\n$3\r\nGET\r\n$4\r\nna").unwrap().is_none());
    }

    #[test]
    fn unknown_prefix_rejected() {
        let result = parse_message(b"@invalid\r\n");
        assert_eq!(result, Err(ParseError::UnknownPrefix(b'@')));
    }

    #[test]
    fn invalid_integer_rejected() {
        let result = parse_message(b":not_a_number\r\n");
        assert!(matches!(result, Err(ParseError::InvalidInteger(_))));
    }

    #[test]
    fn bulk_missing_trailing_crlf_rejected() {
        let result = parse_message(b"$5\r\nhelloXX");
        assert!(matches!(result, Err(ParseError::ProtocolError(_))));
    }

    #[test]
    fn roundtrip_every_variant() {
        let values = vec![
            RespValue::simple_string("OK"),
            RespValue::error("ERR boom"),
            RespValue::integer(-7),
            RespValue::bulk_string("hello"),
            RespValue::bulk_string(Bytes::new()),
            RespValue::null_bulk(),
            RespValue::array(vec![]),
            RespValue::null_array(),
            RespValue::array(vec![
                RespValue::bulk_string("SET"),
                RespValue::null_bulk(),
                RespValue::array(vec![RespValue::integer(1), RespValue::null_array()]),
            ]),
        ];

        for original in values {
            let serialized = original.serialize();
            let (parsed, consumed) = parse_message(&serialized).unwrap().unwrap();
            assert_eq!(parsed, original);
            assert_eq!(consumed, serialized.len());
        }
    }

    #[test]
    fn consumed_count_leaves_next_frame_intact() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"*1\r\n$4\r\nPING\r\n");
        buf.extend_from_slice(b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n");

        let (first, consumed) = parse_message(&buf).unwrap().unwrap();
        assert_eq!(first, RespValue::array(vec![RespValue::bulk_string("PING")]));

        let (second, _) = parse_message(&buf[consumed..]).unwrap().unwrap();
        assert_eq!(
            second,
            RespValue::array(vec![
                RespValue::bulk_string("GET"),
                RespValue::bulk_string("k"),
            ])
        );
    }

    #[test]
    fn binary_safe_bulk_string() {
        let result = parse_message(b"$5\r\nhel\x00o\r\n").unwrap().unwrap();
        assert_eq!(result.0, RespValue::bulk_string(&b"hel\x00o"[..]));
    }
}
