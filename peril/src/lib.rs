#![doc = include_str!("../README.md")]
#![deny(missing_docs)]
#![cfg_attr(test, deny(warnings))]

/// Exposes the exchanges, routing keys and message types shared by the
/// server and the clients.
pub mod routing;

/// Exposes the application configuration and its loader.
mod config;
pub use self::config::{AppConfig, LoadError};

/// Exposes the global application context.
mod context;
pub use self::context::AppContext;

/// Exposes the logging bootstrap shared by the binaries.
mod launch;
pub use self::launch::{init_tracing, LaunchError};

/// Exposes the client-side handler of pause announcements.
mod pause;
pub use self::pause::PauseWatch;
