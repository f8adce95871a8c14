//! Invocation scopes.
//!
//! # Data Flow
//! ```text
//! OperationLayer           → RequestScope (entrypoint "GET /items/{id}")
//!   ManagedInvocation      → service, function, operation labels
//!     executor.run(..)
//!       ScopedInvocationInfoProvider::current()
//!         reads both task-locals → InvocationInfo
//! ```
//!
//! # Design Decisions
//! - Task-locals instead of thread-locals so values follow the future
//!   across worker threads
//! - Scopes nest; leaving an inner scope restores the outer one
//! - Wrapping is explicit: callers decorate the work they want labelled

pub mod managed;
pub mod provider;

pub use managed::ManagedInvocation;
pub use provider::ScopedInvocationInfoProvider;
