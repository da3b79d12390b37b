//! Connection Handler
//!
//! One handler per accepted TCP connection, running in its own task. The
//! handler owns a read buffer and a parser bound to its socket and loops:
//! read bytes, parse one command, execute it, write the reply.
//!
//! TCP is a stream, so a single read may hold a partial command or several
//! back-to-back commands; the `BytesMut` buffer plus the parser's
//! consumed-count contract handle both. Within one connection commands are
//! processed strictly in arrival order.
//!
//! ## Connection teardown
//!
//! - Clean end-of-stream: normal disconnect, not an error.
//! - Parse error: one `-ERR protocol error: ...` frame is written, then
//!   the connection closes - the stream framing is no longer trustworthy.
//! - I/O error: this connection's task ends (logged); other connections
//!   and the store are unaffected.
//! - Shutdown broadcast: observed at each loop iteration boundary.

use crate::commands::CommandHandler;
use crate::protocol::{ParseError, RespParser, RespValue};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

/// Maximum size for the read buffer (64 KB)
const MAX_BUFFER_SIZE: usize = 64 * 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Process-wide connection counters.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total commands processed
    pub commands_processed: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Errors that end a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Transport-level failure
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The byte stream violated the wire protocol
    #[error("parse error: {0}")]
    ParseError(#[from] ParseError),

    /// Client closed the connection between commands
    #[error("client disconnected")]
    ClientDisconnected,

    /// Stream ended in the middle of a command
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// A single command exceeded the read buffer cap
    #[error("buffer size limit exceeded")]
    BufferFull,
}

/// Handles a single client connection.
pub struct ConnectionHandler {
    stream: BufWriter<TcpStream>,
    addr: SocketAddr,
    buffer: BytesMut,
    command_handler: CommandHandler,
    parser: RespParser,
    stats: Arc<ConnectionStats>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ConnectionHandler {
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        command_handler: CommandHandler,
        stats: Arc<ConnectionStats>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            command_handler,
            parser: RespParser::new(),
            stats,
            shutdown_rx,
        }
    }

    /// Runs the connection to completion.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "client disconnected"),
            Err(ConnectionError::ClientDisconnected) => {
                debug!(client = %self.addr, "client disconnected")
            }
            Err(ConnectionError::IoError(io_err))
                if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "connection error"),
        }

        self.stats.connection_closed();
        result
    }

    /// The read-parse-execute-reply loop.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        let mut shutdown_rx = self.shutdown_rx.clone();

        loop {
            // Drain every complete command already buffered.
            loop {
                if *shutdown_rx.borrow() {
                    return Ok(());
                }

                match self.try_parse_command() {
                    Ok(Some(command)) => {
                        let response = self.command_handler.execute(command);
                        self.stats.command_processed();
                        self.send_response(&response).await?;
                    }
                    Ok(None) => break,
                    Err(e) => {
                        // One error frame, then the connection closes: the
                        // stream can no longer be framed reliably.
                        let reply = RespValue::error(format!("ERR protocol error: {}", e));
                        let _ = self.send_response(&reply).await;
                        return Err(ConnectionError::ParseError(e));
                    }
                }
            }

            tokio::select! {
                result = Self::read_more_data(&mut self.stream, &mut self.buffer, self.addr) => {
                    result?;
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        debug!(client = %self.addr, "closing connection on shutdown");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Attempts to parse one command from the buffer.
    fn try_parse_command(&mut self) -> Result<Option<RespValue>, ParseError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        match self.parser.parse(&self.buffer)? {
            Some((value, consumed)) => {
                let _ = self.buffer.split_to(consumed);
                trace!(
                    client = %self.addr,
                    consumed,
                    remaining = self.buffer.len(),
                    "parsed command"
                );
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Reads more bytes from the socket into the buffer.
    async fn read_more_data(
        stream: &mut BufWriter<TcpStream>,
        buffer: &mut BytesMut,
        addr: SocketAddr,
    ) -> Result<(), ConnectionError> {
        if buffer.len() >= MAX_BUFFER_SIZE {
            warn!(client = %addr, size = buffer.len(), "read buffer limit exceeded");
            return Err(ConnectionError::BufferFull);
        }

        if buffer.capacity() - buffer.len() < 1024 {
            buffer.reserve(4096);
        }

        let n = stream.get_mut().read_buf(buffer).await?;
        if n == 0 {
            return if buffer.is_empty() {
                Err(ConnectionError::ClientDisconnected)
            } else {
                Err(ConnectionError::UnexpectedEof)
            };
        }

        trace!(client = %addr, bytes = n, "read data");
        Ok(())
    }

    /// Writes one reply to the client.
    async fn send_response(&mut self, response: &RespValue) -> Result<(), ConnectionError> {
        let bytes = response.serialize();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        trace!(client = %self.addr, bytes = bytes.len(), "sent response");
        Ok(())
    }
}

/// Runs one connection to completion, swallowing its errors.
///
/// Connection-level failures are logged; they must never propagate into
/// the accept loop or affect other connections.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
    shutdown_rx: watch::Receiver<bool>,
) {
    let handler = ConnectionHandler::new(stream, addr, command_handler, stats, shutdown_rx);
    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::ClientDisconnected | ConnectionError::ParseError(_) => {}
            ConnectionError::IoError(ref io_err)
                if io_err.kind() == std::io::ErrorKind::ConnectionReset => {}
            _ => {
                debug!(client = %addr, error = %e, "connection ended with error");
            }
        }
    }
}
