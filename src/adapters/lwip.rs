//! lwIP network stack adapter.
//!
//! Implements [`NetStack`] with the raw lwIP socket API.  Compiled only for
//! `target_os = "espidf"`.

use esp_idf_svc::sys::{F_GETFL, O_NONBLOCK, __errno, lwip_fcntl, lwip_read, lwip_write};

use crate::app::ports::{Errno, NetStack, SocketFd};

/// Zero-sized handle to the process-wide lwIP stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct LwipStack;

impl NetStack for LwipStack {
    fn write(&self, fd: SocketFd, data: &[u8]) -> isize {
        // SAFETY: `data` is a live slice for the duration of the call and
        // lwIP does not retain the pointer.
        unsafe { lwip_write(fd.raw(), data.as_ptr().cast(), data.len()) as isize }
    }

    fn read(&self, fd: SocketFd, buf: &mut [u8]) -> isize {
        // SAFETY: `buf` is exclusively borrowed and writable for `buf.len()` bytes.
        unsafe { lwip_read(fd.raw(), buf.as_mut_ptr().cast(), buf.len()) as isize }
    }

    fn is_nonblocking(&self, fd: SocketFd) -> bool {
        // SAFETY: F_GETFL only reads the descriptor flags.
        let flags = unsafe { lwip_fcntl(fd.raw(), F_GETFL as _, 0) };
        flags >= 0 && (flags & O_NONBLOCK as i32) == O_NONBLOCK as i32
    }

    fn last_error(&self) -> Errno {
        // SAFETY: __errno() returns the pointer to the current task errno,
        // which is valid to read in any task context.
        Errno(unsafe { *__errno() })
    }
}
