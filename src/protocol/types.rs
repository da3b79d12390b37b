//! RESP2 Wire Types
//!
//! This module defines the data types of the RESP2 protocol and their
//! wire encoding. RESP2 is a simple, binary-safe request/response protocol.
//!
//! ## Protocol Format
//!
//! Each value starts with a type prefix byte:
//! - `+` Simple String
//! - `-` Error
//! - `:` Integer
//! - `$` Bulk String
//! - `*` Array
//!
//! Lines are terminated with CRLF (`\r\n`).
//!
//! ## Examples
//!
//! Simple String: `+OK\r\n`
//! Error: `-ERR unknown command\r\n`
//! Integer: `:1000\r\n`
//! Bulk String: `$5\r\nhello\r\n`
//! Array: `*2\r\n$3\r\nGET\r\n$4\r\nname\r\n`
//! Null Bulk String: `$-1\r\n`
//! Null Array: `*-1\r\n`
//!
//! A null bulk string (`$-1`) and a null array (`*-1`) are distinct values,
//! and both are distinct from the empty bulk string (`$0\r\n\r\n`) and the
//! empty array (`*0\r\n`). The `Option` payloads below preserve that
//! distinction through a serialize/parse round trip.

use bytes::Bytes;
use std::fmt;

/// The CRLF terminator used by the protocol
pub const CRLF: &[u8] = b"\r\n";

/// RESP2 type prefix bytes
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// One value of the RESP2 protocol.
///
/// Used both for parsed incoming commands and for outgoing replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Non-binary-safe string; cannot contain CRLF.
    /// Format: `+<string>\r\n`
    SimpleString(String),

    /// Like a simple string, but signals an error condition.
    /// Format: `-<message>\r\n`
    Error(String),

    /// 64-bit signed integer.
    /// Format: `:<integer>\r\n`
    Integer(i64),

    /// Binary-safe string, length-prefixed. `None` is the null bulk string.
    /// Format: `$<length>\r\n<data>\r\n`, null: `$-1\r\n`
    BulkString(Option<Bytes>),

    /// Ordered sequence of values, arbitrarily nested. `None` is the null array.
    /// Format: `*<count>\r\n<element1><element2>...`, null: `*-1\r\n`
    Array(Option<Vec<RespValue>>),
}

impl RespValue {
    /// Creates a simple string reply.
    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    /// Creates an error reply.
    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    /// Creates an integer reply.
    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    /// Creates a bulk string reply.
    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(Some(data.into()))
    }

    /// Creates a null bulk string reply (`$-1\r\n`).
    pub fn null_bulk() -> Self {
        RespValue::BulkString(None)
    }

    /// Creates an array reply.
    pub fn array(values: Vec<RespValue>) -> Self {
        RespValue::Array(Some(values))
    }

    /// Creates a null array reply (`*-1\r\n`).
    pub fn null_array() -> Self {
        RespValue::Array(None)
    }

    /// The `+OK` reply.
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    /// The `+PONG` reply.
    pub fn pong() -> Self {
        RespValue::SimpleString("PONG".to_string())
    }

    /// Serializes this value to its wire representation.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes this value into an existing buffer.
    ///
    /// Append-only; more efficient than [`serialize`](Self::serialize)
    /// when a buffer is reused across replies.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => {
                buf.push(prefix::SIMPLE_STRING);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::Error(s) => {
                buf.push(prefix::ERROR);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::Integer(n) => {
                buf.push(prefix::INTEGER);
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::BulkString(Some(data)) => {
                buf.push(prefix::BULK_STRING);
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            RespValue::BulkString(None) => {
                buf.push(prefix::BULK_STRING);
                buf.extend_from_slice(b"-1");
                buf.extend_from_slice(CRLF);
            }
            RespValue::Array(Some(values)) => {
                buf.push(prefix::ARRAY);
                buf.extend_from_slice(values.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                for value in values {
                    value.serialize_into(buf);
                }
            }
            RespValue::Array(None) => {
                buf.push(prefix::ARRAY);
                buf.extend_from_slice(b"-1");
                buf.extend_from_slice(CRLF);
            }
        }
    }

    /// Extracts the payload of a non-null bulk string.
    pub fn as_bulk(&self) -> Option<&Bytes> {
        match self {
            RespValue::BulkString(Some(b)) => Some(b),
            _ => None,
        }
    }

    /// Extracts the elements of a non-null array.
    pub fn as_array(&self) -> Option<&[RespValue]> {
        match self {
            RespValue::Array(Some(arr)) => Some(arr),
            _ => None,
        }
    }
}

impl fmt::Display for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespValue::SimpleString(s) => write!(f, "\"{}\"", s),
            RespValue::Error(s) => write!(f, "(error) {}", s),
            RespValue::Integer(n) => write!(f, "(integer) {}", n),
            RespValue::BulkString(Some(data)) => {
                if let Ok(s) = std::str::from_utf8(data) {
                    write!(f, "\"{}\"", s)
                } else {
                    write!(f, "(binary data, {} bytes)", data.len())
                }
            }
            RespValue::BulkString(None) => write!(f, "(nil)"),
            RespValue::Array(None) => write!(f, "(nil array)"),
            RespValue::Array(Some(values)) => {
                if values.is_empty() {
                    write!(f, "(empty array)")
                } else {
                    writeln!(f)?;
                    for (i, v) in values.iter().enumerate() {
                        writeln!(f, "{}) {}", i + 1, v)?;
                    }
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_string_serialize() {
        let value = RespValue::simple_string("OK");
        assert_eq!(value.serialize(), b"+OK\r\n");
    }

    #[test]
    fn error_serialize() {
        let value = RespValue::error("ERR unknown command");
        assert_eq!(value.serialize(), b"-ERR unknown command\r\n");
    }

    #[test]
    fn integer_serialize() {
        assert_eq!(RespValue::integer(1000).serialize(), b":1000\r\n");
        assert_eq!(RespValue::integer(-42).serialize(), b":-42\r\n");
    }

    #[test]
    fn bulk_string_serialize() {
        let value = RespValue::bulk_string("hello");
        assert_eq!(value.serialize(), b"$5\r\nhello\r\n");
    }

    #[test]
    fn null_bulk_and_null_array_are_distinct() {
        assert_eq!(RespValue::null_bulk().serialize(), b"$-1\r\n");
        assert_eq!(RespValue::null_array().serialize(), b"*-1\r\n");
        assert_ne!(RespValue::null_bulk(), RespValue::null_array());
    }

    #[test]
    fn empty_bulk_is_not_null() {
        let empty = RespValue::bulk_string(Bytes::new());
        assert_eq!(empty.serialize(), b"$0\r\n\r\n");
        assert_ne!(empty, RespValue::null_bulk());
    }

    #[test]
    fn empty_array_is_not_null() {
        let empty = RespValue::array(vec![]);
        assert_eq!(empty.serialize(), b"*0\r\n");
        assert_ne!(empty, RespValue::null_array());
    }

    #[test]
    fn array_serialize() {
        let value = RespValue::array(vec![
            RespValue::bulk_string("GET"),
            RespValue::bulk_string("name"),
        ]);
        assert_eq!(value.serialize(), b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n");
    }

    #[test]
    fn nested_array_serialize() {
        let value = RespValue::array(vec![
            RespValue::integer(1),
            RespValue::array(vec![RespValue::integer(2), RespValue::integer(3)]),
        ]);
        assert_eq!(value.serialize(), b"*2\r\n:1\r\n*2\r\n:2\r\n:3\r\n");
    }

    #[test]
    fn ok_and_pong() {
        assert_eq!(RespValue::ok().serialize(), b"+OK\r\n");
        assert_eq!(RespValue::pong().serialize(), b"+PONG\r\n");
    }
}
