//! Lifecycle management for the demo service.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → shutdown_signal() resolves
//!
//! Shutdown (shutdown.rs):
//!     trigger() → background tasks (config watcher) stop
//!               → server stops accepting and drains in-flight requests
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans the shutdown out to every task
//! - A failed signal registration is logged and treated as "never fires"

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
