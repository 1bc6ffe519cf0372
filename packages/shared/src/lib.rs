//! Shared utilities for the genkan lobby server.
//!
//! Cross-cutting concerns used by the server binary and its tests:
//! clock abstraction and tracing setup.

pub mod logger;
pub mod time;
