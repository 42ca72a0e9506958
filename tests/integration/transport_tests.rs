//! Integration tests for the socket transport adapter.
//!
//! Would-block handling plus the full classification table, driven
//! through a scripted stack.

use super::mock_stack::ScriptedStack;
use tlsglue::error::{codes, return_code};
use tlsglue::{Errno, SocketFd, SocketTransport, TlsIoError};

const FD: SocketFd = SocketFd::new(4);

#[test]
fn nonblocking_would_block_on_send_wants_write() {
    let stack = ScriptedStack::failing(Errno::EAGAIN, true);
    let transport = SocketTransport::new(&stack);
    let result = transport.send(FD, b"client hello");
    assert_eq!(result, Err(TlsIoError::WantWrite), "must not be a generic failure");
    assert_eq!(return_code(result), codes::SSL_WANT_WRITE);
}

#[test]
fn nonblocking_would_block_on_recv_wants_read() {
    let stack = ScriptedStack::failing(Errno::EWOULDBLOCK, true);
    let transport = SocketTransport::new(&stack);
    let mut buf = [0u8; 16];
    assert_eq!(transport.recv(FD, &mut buf), Err(TlsIoError::WantRead));
}

#[test]
fn partial_write_is_reported_as_is() {
    let stack = ScriptedStack::new();
    stack.write_ret.set(Some(3));
    let transport = SocketTransport::new(&stack);
    assert_eq!(transport.send(FD, b"abcdef"), Ok(3));
    assert_eq!(stack.calls.get(), 1, "no internal retry of the remainder");
    assert_eq!(stack.sent.borrow().as_slice(), b"abc");
}

#[test]
fn zero_byte_read_is_success() {
    let stack = ScriptedStack::new();
    let transport = SocketTransport::new(&stack);
    let mut buf = [0u8; 8];
    assert_eq!(transport.recv(FD, &mut buf), Ok(0));
}

#[test]
fn recv_delivers_stack_bytes() {
    let stack = ScriptedStack::new();
    stack.inbound.borrow_mut().extend_from_slice(b"server hello");
    let transport = SocketTransport::new(&stack);
    let mut buf = [0u8; 6];
    assert_eq!(transport.recv(FD, &mut buf), Ok(6));
    assert_eq!(&buf, b"server");
    assert_eq!(transport.recv(FD, &mut buf), Ok(6));
    assert_eq!(&buf, b" hello");
}

#[test]
fn classification_table() {
    let cases = [
        (Errno::EAGAIN, true, TlsIoError::WantWrite, TlsIoError::WantRead),
        (Errno::EAGAIN, false, TlsIoError::SendFailed, TlsIoError::RecvFailed),
        (Errno::EPIPE, true, TlsIoError::ConnectionReset, TlsIoError::ConnectionReset),
        (Errno::ECONNRESET, false, TlsIoError::ConnectionReset, TlsIoError::ConnectionReset),
        (Errno::EINTR, false, TlsIoError::WantWrite, TlsIoError::WantRead),
        (Errno::EINTR, true, TlsIoError::WantWrite, TlsIoError::WantRead),
        (Errno::EIO, true, TlsIoError::SendFailed, TlsIoError::RecvFailed),
        (Errno(113), false, TlsIoError::SendFailed, TlsIoError::RecvFailed),
    ];
    for (errno, nonblocking, on_send, on_recv) in cases {
        let stack = ScriptedStack::failing(errno, nonblocking);
        let transport = SocketTransport::new(&stack);
        let mut buf = [0u8; 4];
        assert_eq!(transport.send(FD, b"x"), Err(on_send), "send {errno} nb={nonblocking}");
        assert_eq!(transport.recv(FD, &mut buf), Err(on_recv), "recv {errno} nb={nonblocking}");
    }
}

#[test]
fn negative_handle_is_rejected_before_any_call() {
    let stack = ScriptedStack::new();
    let transport = SocketTransport::new(&stack);
    let result = transport.send(SocketFd::new(-1), b"x");
    assert_eq!(result, Err(TlsIoError::InvalidHandle));
    assert_eq!(return_code(result), codes::NET_INVALID_CONTEXT);
    assert_eq!(stack.calls.get(), 0);
    assert_eq!(stack.flag_queries.get(), 0);
}

#[test]
fn success_never_queries_flags() {
    let stack = ScriptedStack::new();
    let transport = SocketTransport::new(&stack);
    transport.send(FD, b"data").unwrap();
    assert_eq!(stack.flag_queries.get(), 0);
}
