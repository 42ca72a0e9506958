//! Status taxonomy surfaced to the TLS library.
//!
//! Every failure the glue can produce maps to exactly one [`TlsIoError`]
//! variant.  Platform error codes (lwIP errno, NVS `esp_err_t`, `std::io`)
//! are translated at the adapter boundary and never leak past it.
//! All variants are `Copy` so they can be returned straight through the
//! C callback shims without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// mbedTLS return codes
// ---------------------------------------------------------------------------

/// Numeric codes understood by mbedTLS' retry/failure logic.
pub mod codes {
    pub const SSL_WANT_READ: i32 = -0x6900;
    pub const SSL_WANT_WRITE: i32 = -0x6880;
    pub const NET_INVALID_CONTEXT: i32 = -0x0045;
    pub const NET_CONN_RESET: i32 = -0x0050;
    pub const NET_SEND_FAILED: i32 = -0x004E;
    pub const NET_RECV_FAILED: i32 = -0x004C;
    pub const PK_ALLOC_FAILED: i32 = -0x3F80;
    pub const PK_FILE_IO_ERROR: i32 = -0x3E00;
    pub const X509_FILE_IO_ERROR: i32 = -0x2900;
}

// ---------------------------------------------------------------------------
// Unsupported features
// ---------------------------------------------------------------------------

/// Credential features this platform deliberately does not implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedFeature {
    /// Passphrase-protected private key files.
    EncryptedKey,
    /// Certificate revocation lists.
    RevocationList,
    /// Directory-based certificate stores.
    CertificateDirectory,
}

impl fmt::Display for UnsupportedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EncryptedKey => write!(f, "encrypted private keys"),
            Self::RevocationList => write!(f, "certificate revocation lists"),
            Self::CertificateDirectory => write!(f, "certificate directories"),
        }
    }
}

// ---------------------------------------------------------------------------
// TLS I/O error
// ---------------------------------------------------------------------------

/// Closed set of outcomes reported to the TLS library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsIoError {
    /// Receive would block; the caller should retry later.
    WantRead,
    /// Send would block (or was interrupted); the caller should retry later.
    WantWrite,
    /// Peer reset the connection or the pipe is broken.
    ConnectionReset,
    /// The transport handle is negative or otherwise unusable.
    InvalidHandle,
    /// Send failed for a reason the stack did not classify.
    SendFailed,
    /// Receive failed for a reason the stack did not classify.
    RecvFailed,
    /// Credential size overflowed or the allocation could not be satisfied.
    AllocFailed,
    /// The credential resource could not be opened or fully read.
    FileIo,
    /// The requested credential feature is not available on this platform.
    Unsupported(UnsupportedFeature),
    /// The TLS library's own parser rejected the credential.
    Parse(i32),
}

impl TlsIoError {
    /// The mbedTLS return code for this outcome.
    ///
    /// Unsupported features report the file-I/O code of the mbedTLS
    /// function they stand in for, which is what callers of those
    /// functions already handle.
    pub const fn code(self) -> i32 {
        match self {
            Self::WantRead => codes::SSL_WANT_READ,
            Self::WantWrite => codes::SSL_WANT_WRITE,
            Self::ConnectionReset => codes::NET_CONN_RESET,
            Self::InvalidHandle => codes::NET_INVALID_CONTEXT,
            Self::SendFailed => codes::NET_SEND_FAILED,
            Self::RecvFailed => codes::NET_RECV_FAILED,
            Self::AllocFailed => codes::PK_ALLOC_FAILED,
            Self::FileIo => codes::PK_FILE_IO_ERROR,
            Self::Unsupported(UnsupportedFeature::EncryptedKey) => codes::PK_FILE_IO_ERROR,
            Self::Unsupported(_) => codes::X509_FILE_IO_ERROR,
            Self::Parse(code) => code,
        }
    }

    /// `true` for the would-block signals the caller is expected to retry.
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::WantRead | Self::WantWrite)
    }
}

impl fmt::Display for TlsIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WantRead => write!(f, "receive would block"),
            Self::WantWrite => write!(f, "send would block"),
            Self::ConnectionReset => write!(f, "connection reset by peer"),
            Self::InvalidHandle => write!(f, "invalid socket handle"),
            Self::SendFailed => write!(f, "send failed"),
            Self::RecvFailed => write!(f, "receive failed"),
            Self::AllocFailed => write!(f, "credential allocation failed"),
            Self::FileIo => write!(f, "credential file I/O error"),
            Self::Unsupported(feature) => write!(f, "unsupported: {feature}"),
            Self::Parse(code) => write!(f, "TLS parser rejected credential ({code})"),
        }
    }
}

impl From<UnsupportedFeature> for TlsIoError {
    fn from(feature: UnsupportedFeature) -> Self {
        Self::Unsupported(feature)
    }
}

// ---------------------------------------------------------------------------
// Callback return convention
// ---------------------------------------------------------------------------

/// Pack a transport outcome into the C callback convention: a byte count on
/// success, a negative mbedTLS code on failure.
pub fn return_code(result: Result<usize>) -> i32 {
    match result {
        Ok(n) => i32::try_from(n).unwrap_or(i32::MAX),
        Err(e) => e.code(),
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, TlsIoError>;
