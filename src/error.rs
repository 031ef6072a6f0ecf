use std::io;

use thiserror::Error;

/// Top-level error type for ntpeek.
#[derive(Error, Debug)]
pub enum NtpError {
    /// The host name has no usable IPv4 address.
    #[error("dns: cannot resolve '{host}': {reason}")]
    Resolution { host: String, reason: String },
    /// Socket connect/send/receive failure, including timeouts.
    #[error("network: {host}: {source}")]
    Transport {
        host: String,
        #[source]
        source: io::Error,
    },
    /// A header field does not fit its wire representation.
    #[error("encoding: {0}")]
    Encoding(String),
    /// The received buffer is not a valid 48-byte header.
    #[error("decoding: {0}")]
    Decoding(String),
    /// A value has no entry in a text lookup table.
    #[error("lookup: {0}")]
    Lookup(String),
    /// User supplied target could not be parsed.
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    /// A background query task failed to complete.
    #[error("task: {0}")]
    Task(String),
    /// Other error cases.
    #[error("other: {0}")]
    Other(String),
}

impl NtpError {
    /// True when the error is a transport-level timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            NtpError::Transport { source, .. } => matches!(
                source.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, NtpError>;
