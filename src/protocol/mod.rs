//! RESP2 Protocol Implementation
//!
//! This module provides the wire-protocol codec: a tagged value type with
//! its serializer, and an incremental parser for incoming bytes. The codec
//! knows nothing about cache semantics; it only converts between bytes and
//! structured [`RespValue`]s.
//!
//! ## Modules
//!
//! - `types`: the `RespValue` enum and its wire serialization
//! - `parser`: incremental parser for incoming RESP2 data
//!
//! ## Example
//!
//! ```
//! use emberkv::protocol::{parse_message, RespValue};
//!
//! // Parsing incoming data
//! let data = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
//! let (value, consumed) = parse_message(data).unwrap().unwrap();
//! assert_eq!(consumed, data.len());
//!
//! // Creating replies
//! let reply = RespValue::bulk_string("value");
//! assert_eq!(reply.serialize(), b"$5\r\nvalue\r\n");
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{parse_message, ParseError, ParseResult, RespParser};
pub use types::RespValue;
