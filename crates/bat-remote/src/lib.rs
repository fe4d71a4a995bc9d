#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Server, executor and user configuration.
pub mod config;

/// Error types for the remote module.
pub mod error;

/// The main thread task queue.
pub mod executor;

/// HTTP handlers of the remote protocol.
pub mod handlers;

/// The application operations available to remote clients.
pub mod host;

/// Request and response bodies of the remote protocol.
pub mod protocol;

/// Lifecycle of the protocol server.
pub mod server;

pub use config::{ExecutorOptions, RemoteConfig, ServerOptions};
pub use error::RemoteError;
pub use executor::{ExecutorHandle, MainThreadExecutor};
pub use host::RemoteHost;
pub use server::RemoteServer;
