//! mbedTLS transport and credential I/O glue.
//!
//! Supplies the TLS library's I/O callbacks on a platform without POSIX
//! sockets or `fopen`: socket send/receive over lwIP, and whole-file
//! certificate/key loading from flash-backed storage.  All ESP-IDF-specific
//! code is guarded by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod debug;
pub mod error;

pub use app::glue::{ParseGlue, parse_directory, parse_encrypted_key, parse_revocation_list};
pub use app::loader::{CredentialBuffer, CredentialLoader, Encoding};
pub use app::ports::{CredentialParser, Errno, FileSystem, FsError, NetStack, SocketFd};
pub use app::provision::{CertStore, Provisioned};
pub use app::transport::SocketTransport;
pub use config::{TlsIoConfig, TlsMode};
pub use error::{Result, TlsIoError, UnsupportedFeature};
