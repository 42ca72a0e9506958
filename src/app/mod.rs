//! Glue core — pure adaptation logic, zero platform I/O.
//!
//! The transport adapter, credential loader and parse glue reach the
//! network stack, the filesystem and the TLS library only through the
//! **port traits** in [`ports`], so every path is testable with fakes.

pub mod glue;
pub mod loader;
pub mod ports;
pub mod provision;
pub mod transport;
