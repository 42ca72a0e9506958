//! Host network stack adapter (simulation only).
//!
//! Implements [`NetStack`] over `std::net::TcpStream` with an lwIP-like
//! surface: connections are registered under small integer descriptors,
//! calls return `-1` on failure and leave an errno behind.  Lets the
//! transport adapter run against real loopback sockets on the host.

use std::cell::{Cell, RefCell};
use std::io::{self, ErrorKind, Read, Write};
use std::net::TcpStream;

use log::info;

use crate::app::ports::{Errno, NetStack, SocketFd};

struct Slot {
    stream: TcpStream,
    nonblocking: bool,
}

/// Descriptor table over host TCP streams.
pub struct HostNetStack {
    slots: RefCell<Vec<Option<Slot>>>,
    last_error: Cell<Errno>,
}

impl HostNetStack {
    pub fn new() -> Self {
        info!("HostNetStack: simulation backend");
        Self {
            slots: RefCell::new(Vec::new()),
            last_error: Cell::new(Errno::NONE),
        }
    }

    /// Take ownership of `stream` and hand out its descriptor.
    pub fn register(&self, stream: TcpStream) -> SocketFd {
        let mut slots = self.slots.borrow_mut();
        let slot = Some(Slot {
            stream,
            nonblocking: false,
        });
        let index = match slots.iter().position(Option::is_none) {
            Some(free) => {
                slots[free] = slot;
                free
            }
            None => {
                slots.push(slot);
                slots.len() - 1
            }
        };
        SocketFd::new(index as i32)
    }

    /// Set or clear the non-blocking flag.
    pub fn set_nonblocking(&self, fd: SocketFd, nonblocking: bool) -> Result<(), Errno> {
        let mut slots = self.slots.borrow_mut();
        let slot = Self::slot_mut(&mut slots, fd).ok_or(Errno::EBADF)?;
        slot.stream
            .set_nonblocking(nonblocking)
            .map_err(|e| errno_of(&e))?;
        slot.nonblocking = nonblocking;
        Ok(())
    }

    /// Drop the stream behind `fd`; the descriptor becomes invalid.
    pub fn close(&self, fd: SocketFd) {
        let mut slots = self.slots.borrow_mut();
        if let Some(entry) = usize::try_from(fd.raw()).ok().and_then(|i| slots.get_mut(i)) {
            *entry = None;
        }
    }

    fn slot_mut(slots: &mut [Option<Slot>], fd: SocketFd) -> Option<&mut Slot> {
        let index = usize::try_from(fd.raw()).ok()?;
        slots.get_mut(index)?.as_mut()
    }

    fn io<F>(&self, fd: SocketFd, op: F) -> isize
    where
        F: FnOnce(&mut TcpStream) -> io::Result<usize>,
    {
        let mut slots = self.slots.borrow_mut();
        let Some(slot) = Self::slot_mut(&mut slots, fd) else {
            self.last_error.set(Errno::EBADF);
            return -1;
        };
        match op(&mut slot.stream) {
            Ok(n) => n as isize,
            Err(e) => {
                self.last_error.set(errno_of(&e));
                -1
            }
        }
    }
}

impl Default for HostNetStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Portable errno for a host I/O error.
fn errno_of(e: &io::Error) -> Errno {
    match e.kind() {
        ErrorKind::WouldBlock => Errno::EAGAIN,
        ErrorKind::Interrupted => Errno::EINTR,
        ErrorKind::BrokenPipe => Errno::EPIPE,
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted => Errno::ECONNRESET,
        _ => Errno::EIO,
    }
}

impl NetStack for HostNetStack {
    fn write(&self, fd: SocketFd, data: &[u8]) -> isize {
        self.io(fd, |s| s.write(data))
    }

    fn read(&self, fd: SocketFd, buf: &mut [u8]) -> isize {
        self.io(fd, |s| s.read(buf))
    }

    fn is_nonblocking(&self, fd: SocketFd) -> bool {
        let mut slots = self.slots.borrow_mut();
        Self::slot_mut(&mut slots, fd).is_some_and(|s| s.nonblocking)
    }

    fn last_error(&self) -> Errno {
        self.last_error.get()
    }
}
