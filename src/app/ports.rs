//! Port traits — the boundary between the glue logic and its collaborators.
//!
//! ```text
//!   TLS library ──▶ glue (transport / loader / parse glue) ──▶ Port trait ──▶ Adapter
//! ```
//!
//! Driven adapters (lwIP, NVS-backed storage, host simulation) implement
//! [`NetStack`] and [`FileSystem`].  The TLS library's in-memory parsers are
//! reached through [`CredentialParser`].  Collaborators are passed in at
//! construction, so every adapter can be swapped for a fake in tests.
//!
//! ## Security notes
//!
//! - **FileSystem** implementations must not cache credential bytes; the
//!   loader owns the only copy and erases it.
//! - **NetStack** implementations report failures lwIP-style: a negative
//!   return plus an errno readable through [`NetStack::last_error`].

use core::fmt;

// ───────────────────────────────────────────────────────────────
// Socket handle
// ───────────────────────────────────────────────────────────────

/// Opaque reference to an already-open socket descriptor.
///
/// The glue never creates or closes descriptors; the owner above the TLS
/// library does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketFd(i32);

impl SocketFd {
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Negative descriptors are never valid.
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

// ───────────────────────────────────────────────────────────────
// Stack errno
// ───────────────────────────────────────────────────────────────

/// Stack-level error code captured after a failed socket call.
///
/// Values follow newlib/lwIP (`sys/errno.h`), which match Linux for the
/// codes the transport cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Errno(pub i32);

impl Errno {
    pub const NONE: Self = Self(0);
    pub const EINTR: Self = Self(4);
    pub const EIO: Self = Self(5);
    pub const EBADF: Self = Self(9);
    pub const EAGAIN: Self = Self(11);
    /// Alias of `EAGAIN` on newlib.
    pub const EWOULDBLOCK: Self = Self::EAGAIN;
    pub const EPIPE: Self = Self(32);
    pub const ECONNRESET: Self = Self(104);

    pub fn is_would_block(self) -> bool {
        self == Self::EAGAIN || self == Self::EWOULDBLOCK
    }

    pub fn is_reset(self) -> bool {
        self == Self::EPIPE || self == Self::ECONNRESET
    }

    pub fn is_interrupted(self) -> bool {
        self == Self::EINTR
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "errno {}", self.0)
    }
}

// ───────────────────────────────────────────────────────────────
// Network stack port
// ───────────────────────────────────────────────────────────────

/// The socket surface the transport adapter consumes.
///
/// Methods take `&self`: the stack is a shared collaborator and
/// simulation backends use interior mutability for their bookkeeping.
pub trait NetStack {
    /// Write up to `data.len()` bytes.  Returns the count written, or a
    /// negative value with the cause available from [`last_error`](Self::last_error).
    fn write(&self, fd: SocketFd, data: &[u8]) -> isize;

    /// Read up to `buf.len()` bytes.  Same return convention as [`write`](Self::write).
    fn read(&self, fd: SocketFd, buf: &mut [u8]) -> isize;

    /// Whether the descriptor has its non-blocking flag set.
    fn is_nonblocking(&self, fd: SocketFd) -> bool;

    /// Error code left behind by the most recent failed call.
    fn last_error(&self) -> Errno;
}

impl<S: NetStack + ?Sized> NetStack for &S {
    fn write(&self, fd: SocketFd, data: &[u8]) -> isize {
        (**self).write(fd, data)
    }

    fn read(&self, fd: SocketFd, buf: &mut [u8]) -> isize {
        (**self).read(fd, buf)
    }

    fn is_nonblocking(&self, fd: SocketFd) -> bool {
        (**self).is_nonblocking(fd)
    }

    fn last_error(&self) -> Errno {
        (**self).last_error()
    }
}

// ───────────────────────────────────────────────────────────────
// Filesystem port
// ───────────────────────────────────────────────────────────────

/// The open/size/read/close contract consumed by the credential loader.
///
/// No seek or write capability is required.
pub trait FileSystem {
    /// Handle to an open resource.
    type File;

    /// Open `path` for reading.
    fn open(&mut self, path: &str) -> Result<Self::File, FsError>;

    /// Size of the open resource in bytes.
    fn size(&mut self, file: &Self::File) -> usize;

    /// Read into `buf`, returning the number of bytes actually read.
    /// A count below `buf.len()` is a short read, not an error.
    fn read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize, FsError>;

    /// Release the handle.
    fn close(&mut self, file: Self::File);
}

/// Errors from [`FileSystem`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// No resource under that path.
    NotFound,
    /// Generic storage I/O error.
    Io,
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// TLS library parser port
// ───────────────────────────────────────────────────────────────

/// The TLS library's own in-memory credential parsers.
///
/// `data` is the loader's reported slice: PEM input includes its trailing
/// NUL, DER input does not.  Errors carry the library's native code.
pub trait CredentialParser {
    /// Parse one or more certificates and append them to the chain.
    fn parse_chain(&mut self, data: &[u8]) -> Result<(), i32>;

    /// Parse CA certificates used to verify the peer.  Parsers that keep a
    /// single chain can rely on the default.
    fn parse_trust_anchors(&mut self, data: &[u8]) -> Result<(), i32> {
        self.parse_chain(data)
    }

    /// Parse an unencrypted private key.
    fn parse_key(&mut self, data: &[u8]) -> Result<(), i32>;
}
