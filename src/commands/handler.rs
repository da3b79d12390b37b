//! Command Handler
//!
//! Maps parsed RESP2 commands onto [`CacheService`] calls and shapes the
//! replies. One handler instance is cloned into every connection task;
//! it is stateless apart from the shared service handle.
//!
//! ## Validation
//!
//! A command must be a non-null, non-empty array whose first element is a
//! non-null bulk string naming the verb (case-insensitive). Violations
//! produce an error reply, never a connection abort - framing errors are
//! the parser's business, not ours.
//!
//! ## Command table
//!
//! | Verb   | Args                    | Success reply            |
//! |--------|-------------------------|--------------------------|
//! | PING   | `[msg]`                 | `+PONG` or echoed bulk   |
//! | SET    | `key value [EX secs]`   | `+OK`                    |
//! | GET    | `key`                   | bulk value or `$-1`      |
//! | DEL    | `key [key ...]`         | `:count deleted`         |
//! | EXISTS | `key [key ...]`         | `:count present`         |
//! | EXPIRE | `key seconds`           | `:1` applied, `:0` not   |
//! | TTL    | `key`                   | `:secs`, `:-1`, or `:-2` |
//! | KEYS   | `pattern`               | array of bulk keys       |

use crate::cache::{CacheError, CacheService};
use crate::protocol::RespValue;
use bytes::Bytes;

const ERR_WRONG_TYPE: &str = "ERR wrong argument type";
const ERR_SYNTAX: &str = "ERR syntax error";
const ERR_NOT_INTEGER: &str = "ERR value is not an integer or out of range";

/// Executes commands against the cache service.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    cache: CacheService,
}

impl CommandHandler {
    /// Creates a handler over the given cache service.
    pub fn new(cache: CacheService) -> Self {
        Self { cache }
    }

    /// Executes one parsed command and returns the reply to send.
    pub fn execute(&self, command: RespValue) -> RespValue {
        let args = match command {
            RespValue::Array(Some(args)) if !args.is_empty() => args,
            _ => return RespValue::error("ERR invalid command format"),
        };

        let verb = match &args[0] {
            RespValue::BulkString(Some(bulk)) => match std::str::from_utf8(bulk) {
                Ok(s) => s.to_uppercase(),
                Err(_) => return RespValue::error("ERR command must be a bulk string"),
            },
            _ => return RespValue::error("ERR command must be a bulk string"),
        };

        self.dispatch(&verb, &args[1..])
    }

    fn dispatch(&self, verb: &str, args: &[RespValue]) -> RespValue {
        match verb {
            "PING" => self.cmd_ping(args),
            "SET" => self.cmd_set(args),
            "GET" => self.cmd_get(args),
            "DEL" => self.cmd_del(args),
            "EXISTS" => self.cmd_exists(args),
            "EXPIRE" => self.cmd_expire(args),
            "TTL" => self.cmd_ttl(args),
            "KEYS" => self.cmd_keys(args),
            _ => RespValue::error(format!("ERR unknown command '{}'", verb)),
        }
    }

    // ========================================================================
    // Argument helpers
    // ========================================================================

    /// Extracts a non-null bulk string argument as raw bytes.
    fn arg_bytes(value: &RespValue) -> Option<Bytes> {
        match value {
            RespValue::BulkString(Some(b)) => Some(b.clone()),
            _ => None,
        }
    }

    /// Extracts a non-null bulk string argument as UTF-8 text.
    fn arg_str(value: &RespValue) -> Option<&str> {
        match value {
            RespValue::BulkString(Some(b)) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Extracts a bulk string argument holding a base-10 integer.
    fn arg_integer(value: &RespValue) -> Option<i64> {
        Self::arg_str(value).and_then(|s| s.parse().ok())
    }

    fn render_error(err: CacheError) -> RespValue {
        RespValue::error(format!("ERR {}", err))
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// PING [message]
    fn cmd_ping(&self, args: &[RespValue]) -> RespValue {
        match args {
            [] => RespValue::pong(),
            [msg] => match Self::arg_bytes(msg) {
                Some(payload) => RespValue::bulk_string(payload),
                None => RespValue::error(ERR_WRONG_TYPE),
            },
            _ => RespValue::error("ERR wrong number of arguments for 'PING' command"),
        }
    }

    /// SET key value [EX seconds]
    fn cmd_set(&self, args: &[RespValue]) -> RespValue {
        if args.len() < 2 {
            return RespValue::error("ERR wrong number of arguments for 'SET' command");
        }

        let key = match Self::arg_str(&args[0]) {
            Some(k) => k,
            None => return RespValue::error(ERR_WRONG_TYPE),
        };
        let value = match Self::arg_bytes(&args[1]) {
            Some(v) => v,
            None => return RespValue::error(ERR_WRONG_TYPE),
        };

        // A TTL of zero lets the service substitute its default.
        let mut ttl_secs: i64 = 0;

        let mut i = 2;
        while i < args.len() {
            let option = match Self::arg_str(&args[i]) {
                Some(o) => o.to_uppercase(),
                None => return RespValue::error(ERR_SYNTAX),
            };

            match option.as_str() {
                "EX" => {
                    i += 1;
                    if i >= args.len() {
                        return RespValue::error(ERR_SYNTAX);
                    }
                    ttl_secs = match Self::arg_integer(&args[i]) {
                        Some(secs) => secs,
                        None => return RespValue::error(ERR_NOT_INTEGER),
                    };
                }
                _ => return RespValue::error(ERR_SYNTAX),
            }
            i += 1;
        }

        match self.cache.set(key, value, ttl_secs) {
            Ok(()) => RespValue::ok(),
            Err(e) => Self::render_error(e),
        }
    }

    /// GET key
    fn cmd_get(&self, args: &[RespValue]) -> RespValue {
        if args.len() != 1 {
            return RespValue::error("ERR wrong number of arguments for 'GET' command");
        }
        let key = match Self::arg_str(&args[0]) {
            Some(k) => k,
            None => return RespValue::error(ERR_WRONG_TYPE),
        };

        match self.cache.get(key) {
            Ok(Some(value)) => RespValue::bulk_string(value),
            Ok(None) => RespValue::null_bulk(),
            Err(e) => Self::render_error(e),
        }
    }

    /// DEL key [key ...]
    fn cmd_del(&self, args: &[RespValue]) -> RespValue {
        if args.is_empty() {
            return RespValue::error("ERR wrong number of arguments for 'DEL' command");
        }

        let mut deleted = 0i64;
        for arg in args {
            let key = match Self::arg_str(arg) {
                Some(k) => k,
                None => return RespValue::error(ERR_WRONG_TYPE),
            };
            match self.cache.delete(key) {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => return Self::render_error(e),
            }
        }
        RespValue::integer(deleted)
    }

    /// EXISTS key [key ...]
    fn cmd_exists(&self, args: &[RespValue]) -> RespValue {
        if args.is_empty() {
            return RespValue::error("ERR wrong number of arguments for 'EXISTS' command");
        }

        let mut present = 0i64;
        for arg in args {
            let key = match Self::arg_str(arg) {
                Some(k) => k,
                None => return RespValue::error(ERR_WRONG_TYPE),
            };
            match self.cache.exists(key) {
                Ok(true) => present += 1,
                Ok(false) => {}
                Err(e) => return Self::render_error(e),
            }
        }
        RespValue::integer(present)
    }

    /// EXPIRE key seconds
    fn cmd_expire(&self, args: &[RespValue]) -> RespValue {
        if args.len() != 2 {
            return RespValue::error("ERR wrong number of arguments for 'EXPIRE' command");
        }
        let key = match Self::arg_str(&args[0]) {
            Some(k) => k,
            None => return RespValue::error(ERR_WRONG_TYPE),
        };
        let seconds = match Self::arg_integer(&args[1]) {
            Some(s) => s,
            None => return RespValue::error(ERR_NOT_INTEGER),
        };

        match self.cache.expire(key, seconds) {
            Ok(()) => RespValue::integer(1),
            // Absent or expired key: numeric 0, not an error reply.
            Err(CacheError::KeyNotFound) => RespValue::integer(0),
            Err(e) => Self::render_error(e),
        }
    }

    /// TTL key
    fn cmd_ttl(&self, args: &[RespValue]) -> RespValue {
        if args.len() != 1 {
            return RespValue::error("ERR wrong number of arguments for 'TTL' command");
        }
        let key = match Self::arg_str(&args[0]) {
            Some(k) => k,
            None => return RespValue::error(ERR_WRONG_TYPE),
        };

        match self.cache.ttl(key) {
            Ok(seconds) => RespValue::integer(seconds),
            Err(e) => Self::render_error(e),
        }
    }

    /// KEYS pattern
    fn cmd_keys(&self, args: &[RespValue]) -> RespValue {
        if args.len() != 1 {
            return RespValue::error("ERR wrong number of arguments for 'KEYS' command");
        }
        let pattern = match Self::arg_str(&args[0]) {
            Some(p) => p,
            None => return RespValue::error(ERR_WRONG_TYPE),
        };

        let keys = self
            .cache
            .keys(pattern)
            .into_iter()
            .map(RespValue::bulk_string)
            .collect();
        RespValue::array(keys)
    }
}
