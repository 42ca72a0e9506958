//! Glue configuration parameters
//!
//! Credential locations, loader limits and TLS debug output settings.
//! Values can be persisted in NVS (postcard) or provisioned as JSON.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::debug::DebugSink;

/// Maximum credential path length (bytes).
pub const MAX_PATH_LEN: usize = 64;

/// Fixed-capacity credential path.
pub type CredentialPath = heapless::String<MAX_PATH_LEN>;

/// TLS authentication mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TlsMode {
    /// Pre-shared key only (default, no certificates needed).
    #[default]
    PskOnly,
    /// X.509 certificate authentication only (no PSK fallback).
    CertOnly,
    /// Dual-mode: try certificate auth first, fall back to PSK.
    PskAndCert,
}

impl TlsMode {
    pub fn uses_certificates(self) -> bool {
        self != Self::PskOnly
    }
}

/// Where the credential files live on the device filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPaths {
    /// CA certificate chain used to verify the peer.
    pub ca_chain: CredentialPath,
    /// This device's certificate chain.
    pub device_cert: CredentialPath,
    /// This device's (unencrypted) private key.
    pub device_key: CredentialPath,
}

fn path(s: &str) -> CredentialPath {
    let mut p = CredentialPath::new();
    let _ = p.push_str(s);
    p
}

impl Default for CredentialPaths {
    fn default() -> Self {
        Self {
            ca_chain: path("/certs/ca.pem"),
            device_cert: path("/certs/device.pem"),
            device_key: path("/certs/device.key"),
        }
    }
}

/// Core glue configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsIoConfig {
    /// Which credentials the device presents.
    pub mode: TlsMode,
    /// Credential file locations (ignored in `PskOnly`).
    pub credentials: CredentialPaths,
    /// Largest credential file the loader will allocate for (bytes).
    pub max_credential_bytes: u32,
    /// mbedTLS debug threshold (0 = off, 4 = verbose).
    pub debug_threshold: u8,
    /// Translate `\n` into `\r\n` on the debug console.
    pub crlf_console: bool,
}

impl Default for TlsIoConfig {
    fn default() -> Self {
        Self {
            mode: TlsMode::PskOnly,
            credentials: CredentialPaths::default(),
            max_credential_bytes: 16 * 1024,
            debug_threshold: 1,
            crlf_console: true,
        }
    }
}

impl TlsIoConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(64..=65_536).contains(&self.max_credential_bytes) {
            return Err(ConfigError::ValidationFailed(
                "max_credential_bytes must be 64–65536",
            ));
        }
        if self.debug_threshold > 4 {
            return Err(ConfigError::ValidationFailed("debug_threshold must be 0–4"));
        }
        if self.mode.uses_certificates() {
            let c = &self.credentials;
            if c.ca_chain.is_empty() || c.device_cert.is_empty() || c.device_key.is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "credential paths are required outside PskOnly mode",
                ));
            }
        }
        Ok(())
    }

    /// Loader size cap derived from `max_credential_bytes`.
    pub fn max_credential_len(&self) -> usize {
        self.max_credential_bytes as usize
    }

    /// Destination for mbedTLS debug lines.
    pub fn debug_sink(&self) -> DebugSink {
        DebugSink::new(self.debug_threshold, self.crlf_console)
    }

    /// Serialise for NVS persistence.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(|_| ConfigError::Corrupted)
    }

    /// Decode and validate a persisted config.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let cfg: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Decode and validate a provisioning document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_slice(bytes).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Errors from config decoding and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}
