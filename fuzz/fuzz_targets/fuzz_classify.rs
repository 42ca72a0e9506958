//! Fuzz target: socket status classification
//!
//! Every errno/flag combination must map to one of the transport statuses,
//! and would-block on a non-blocking socket must always ask for a retry.
//!
//! cargo fuzz run fuzz_classify

#![no_main]

use libfuzzer_sys::fuzz_target;
use tlsglue::app::transport::{Direction, classify};
use tlsglue::{Errno, TlsIoError};

fuzz_target!(|input: &[u8]| {
    if input.len() < 5 {
        return;
    }
    let errno = Errno(i32::from_le_bytes([input[0], input[1], input[2], input[3]]));
    let nonblocking = input[4] & 1 == 1;
    let direction = if input[4] & 2 == 0 {
        Direction::Send
    } else {
        Direction::Recv
    };

    let status = classify(errno, nonblocking, direction);
    assert!(status.code() < 0);
    if nonblocking && errno.is_would_block() {
        assert!(status.is_retryable());
    }
    if !errno.is_would_block() && errno.is_reset() {
        assert_eq!(status, TlsIoError::ConnectionReset);
    }
});
