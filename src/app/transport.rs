//! Socket transport adapter — the TLS library's send/receive callbacks.
//!
//! Each call is a single stateless attempt against the [`NetStack`]:
//! partial counts are returned as-is and every failure is classified into
//! the TLS library's status set.  Retry and backoff belong to the caller.
//!
//! ## Classification order
//!
//! 1. non-blocking descriptor + `EAGAIN` → would-block
//! 2. `EPIPE` / `ECONNRESET`            → connection reset
//! 3. `EINTR`                           → would-block (retryable)
//! 4. anything else                     → send / receive failed
//!
//! Would-block is checked first because some stacks report `EAGAIN` under
//! several circumstances.

use log::debug;

use super::ports::{Errno, NetStack, SocketFd};
use crate::error::{Result, TlsIoError};

/// Which way the failed call was moving bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Send,
    Recv,
}

impl Direction {
    fn would_block(self) -> TlsIoError {
        match self {
            Self::Send => TlsIoError::WantWrite,
            Self::Recv => TlsIoError::WantRead,
        }
    }

    fn failed(self) -> TlsIoError {
        match self {
            Self::Send => TlsIoError::SendFailed,
            Self::Recv => TlsIoError::RecvFailed,
        }
    }
}

/// Map a captured errno to a TLS status.
///
/// `nonblocking` must be the descriptor's flag at the time of the failure.
pub fn classify(errno: Errno, nonblocking: bool, direction: Direction) -> TlsIoError {
    if nonblocking && errno.is_would_block() {
        direction.would_block()
    } else if errno.is_reset() {
        TlsIoError::ConnectionReset
    } else if errno.is_interrupted() {
        direction.would_block()
    } else {
        direction.failed()
    }
}

/// Send/receive adapter over a borrowed or owned [`NetStack`].
pub struct SocketTransport<S> {
    stack: S,
}

impl<S: NetStack> SocketTransport<S> {
    pub fn new(stack: S) -> Self {
        Self { stack }
    }

    /// Write as much of `data` as the stack accepts in one attempt.
    pub fn send(&self, fd: SocketFd, data: &[u8]) -> Result<usize> {
        if !fd.is_valid() {
            return Err(TlsIoError::InvalidHandle);
        }
        let ret = self.stack.write(fd, data);
        self.finish(fd, ret, Direction::Send)
    }

    /// Read whatever the stack has available, up to `buf.len()` bytes.
    pub fn recv(&self, fd: SocketFd, buf: &mut [u8]) -> Result<usize> {
        if !fd.is_valid() {
            return Err(TlsIoError::InvalidHandle);
        }
        let ret = self.stack.read(fd, buf);
        self.finish(fd, ret, Direction::Recv)
    }

    fn finish(&self, fd: SocketFd, ret: isize, direction: Direction) -> Result<usize> {
        if ret >= 0 {
            return Ok(ret as usize);
        }
        // Capture errno before the flag query; fcntl may overwrite it.
        let errno = self.stack.last_error();
        let status = classify(errno, self.stack.is_nonblocking(fd), direction);
        debug!(
            "transport: {:?} on fd {} failed ({}) -> {}",
            direction,
            fd.raw(),
            errno,
            status
        );
        Err(status)
    }
}
