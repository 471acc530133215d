//! Server errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Could not bind the listening socket
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Accept loop or local address lookup failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
