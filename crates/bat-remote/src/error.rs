use std::net::SocketAddr;

/// An error type for the remote module.
#[derive(thiserror::Error, Debug)]
pub enum RemoteError {
    /// The configured port is outside the range the server may use.
    #[error("The port {0} is not in the valid range 1024-49151.")]
    InvalidPort(u16),

    /// The server could not listen on the requested address.
    #[error("Could not bind the server to {addr}: {source}")]
    Bind {
        /// The requested address.
        addr: SocketAddr,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The executor was dropped and no longer accepts tasks.
    #[error("The main thread is not accepting tasks.")]
    ExecutorClosed,

    /// The main thread did not answer within the request timeout.
    #[error("Timed out waiting for the main thread.")]
    Timeout,

    /// The main thread dropped the request without answering.
    #[error("The main thread dropped the request.")]
    TaskDropped,

    /// The serving thread failed.
    #[error("The server thread panicked.")]
    ServerPanicked,

    /// Error from the async runtime or the socket.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
