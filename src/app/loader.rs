//! Credential loader — whole-file reads of keys and certificates.
//!
//! Reads a named resource through the [`FileSystem`] port into a freshly
//! allocated, NUL-terminated buffer.  Two scope guards cover every exit:
//!
//! - [`OpenFile`] closes the resource when it goes out of scope.
//! - The partially filled buffer lives in [`Zeroizing`] until it is handed
//!   off, so any failure erases the whole allocation before release.
//!
//! ## PEM length adjustment
//!
//! mbedTLS expects the trailing NUL to be counted in the length of PEM
//! input but not of DER input.  If the content contains `-----BEGIN `, the
//! reported length is the raw length plus one.  This is a heuristic: a DER
//! blob that happens to contain the marker bytes is reported as PEM.

use core::fmt;

use log::{info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::ports::{FileSystem, FsError};
use crate::error::{Result, TlsIoError};

/// ASCII sequence introducing a PEM block.
pub const PEM_BEGIN_MARKER: &[u8] = b"-----BEGIN ";

/// Container encoding inferred from the marker scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Text container; reported length includes the NUL terminator.
    Pem,
    /// Binary container; reported length equals the raw byte count.
    Der,
}

/// Whether `data` contains the PEM begin marker anywhere.
pub fn contains_pem_marker(data: &[u8]) -> bool {
    data.windows(PEM_BEGIN_MARKER.len())
        .any(|window| window == PEM_BEGIN_MARKER)
}

// ───────────────────────────────────────────────────────────────
// Credential buffer
// ───────────────────────────────────────────────────────────────

/// Loaded credential bytes, erased when dropped.
///
/// The allocation is always `raw_len() + 1` bytes with a NUL at the end.
pub struct CredentialBuffer {
    bytes: Vec<u8>,
    len: usize,
    encoding: Encoding,
}

impl CredentialBuffer {
    /// Take ownership of a NUL-terminated `bytes` and derive its length.
    fn from_terminated(bytes: Vec<u8>) -> Self {
        let raw = bytes.len().saturating_sub(1);
        let encoding = if contains_pem_marker(&bytes[..raw]) {
            Encoding::Pem
        } else {
            Encoding::Der
        };
        let len = match encoding {
            Encoding::Pem => raw + 1,
            Encoding::Der => raw,
        };
        Self {
            bytes,
            len,
            encoding,
        }
    }

    /// The slice to hand to the TLS library's parser (`len()` bytes).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// The stored bytes without any terminator, for non-TLS consumers.
    pub fn contents(&self) -> &[u8] {
        &self.bytes[..self.raw_len()]
    }

    /// Reported length, including the NUL for PEM content.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Byte count of the resource as stored.
    pub fn raw_len(&self) -> usize {
        self.bytes.len().saturating_sub(1)
    }

    /// Size of the backing allocation (`raw_len() + 1`).
    pub fn allocated_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

impl Zeroize for CredentialBuffer {
    fn zeroize(&mut self) {
        self.bytes.zeroize();
        self.len = 0;
    }
}

impl Drop for CredentialBuffer {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl ZeroizeOnDrop for CredentialBuffer {}

impl fmt::Debug for CredentialBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBuffer")
            .field("len", &self.len)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

// ───────────────────────────────────────────────────────────────
// Open-file guard
// ───────────────────────────────────────────────────────────────

/// Open resource that is closed exactly once, on `close()` or drop.
struct OpenFile<'a, F: FileSystem> {
    fs: &'a mut F,
    file: Option<F::File>,
}

impl<'a, F: FileSystem> OpenFile<'a, F> {
    fn open(fs: &'a mut F, path: &str) -> core::result::Result<Self, FsError> {
        let file = fs.open(path)?;
        Ok(Self {
            fs,
            file: Some(file),
        })
    }

    fn size(&mut self) -> usize {
        match self.file.as_ref() {
            Some(file) => self.fs.size(file),
            None => 0,
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, FsError> {
        match self.file.as_mut() {
            Some(file) => self.fs.read(file, buf),
            None => Err(FsError::Io),
        }
    }

    fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(file) = self.file.take() {
            self.fs.close(file);
        }
    }
}

impl<F: FileSystem> Drop for OpenFile<'_, F> {
    fn drop(&mut self) {
        self.release();
    }
}

// ───────────────────────────────────────────────────────────────
// Loader
// ───────────────────────────────────────────────────────────────

/// Whole-file credential loader over a [`FileSystem`] collaborator.
pub struct CredentialLoader<F> {
    fs: F,
    max_bytes: usize,
}

impl<F: FileSystem> CredentialLoader<F> {
    /// Loader without a size cap; only `n + 1` overflow or allocator
    /// failure reject a resource.
    pub fn new(fs: F) -> Self {
        Self::with_limit(fs, usize::MAX)
    }

    /// Loader that treats resources above `max_bytes` as unallocatable.
    pub fn with_limit(fs: F, max_bytes: usize) -> Self {
        Self { fs, max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn into_fs(self) -> F {
        self.fs
    }

    /// Read the whole resource at `path`.
    ///
    /// On failure nothing escapes: the resource is closed and any buffer
    /// that was allocated is zeroed before it is released.
    pub fn load(&mut self, path: &str) -> Result<CredentialBuffer> {
        if path.is_empty() {
            warn!("loader: empty credential path");
            return Err(TlsIoError::FileIo);
        }

        let mut file = match OpenFile::open(&mut self.fs, path) {
            Ok(file) => file,
            Err(e) => {
                warn!("loader: open '{}' failed: {}", path, e);
                return Err(TlsIoError::FileIo);
            }
        };

        let n = file.size();
        let alloc_len = match n.checked_add(1) {
            Some(len) if n <= self.max_bytes => len,
            _ => {
                file.close();
                warn!("loader: '{}' too large ({}B)", path, n);
                return Err(TlsIoError::AllocFailed);
            }
        };

        let mut buf = Zeroizing::new(Vec::new());
        if buf.try_reserve_exact(alloc_len).is_err() {
            file.close();
            warn!("loader: allocation of {}B for '{}' failed", alloc_len, path);
            return Err(TlsIoError::AllocFailed);
        }
        buf.resize(alloc_len, 0);

        match file.read(&mut buf[..n]) {
            Ok(read) if read == n => {}
            Ok(read) => {
                file.close();
                warn!("loader: short read on '{}' ({}/{}B)", path, read, n);
                return Err(TlsIoError::FileIo);
            }
            Err(e) => {
                file.close();
                warn!("loader: read '{}' failed: {}", path, e);
                return Err(TlsIoError::FileIo);
            }
        }

        file.close();
        buf[n] = 0;

        let credential = CredentialBuffer::from_terminated(core::mem::take(&mut *buf));
        info!(
            "loader: loaded '{}' ({}B, {:?})",
            path,
            credential.raw_len(),
            credential.encoding()
        );
        Ok(credential)
    }
}
