//! Reference timer host for the game session.
//!
//! The core never reads a clock; it hands back arm/cancel requests. This crate
//! provides a [`Scheduler`] that keeps those requests on a virtual millisecond
//! clock and a [`Runtime`] that pairs it with a session. The terminal runner
//! drives a `Runtime` with wall-clock time; tests drive it with exact steps.

pub mod runtime;
pub mod scheduler;

pub use runtime::Runtime;
pub use scheduler::Scheduler;
