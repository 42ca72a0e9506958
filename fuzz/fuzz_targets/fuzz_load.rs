//! Fuzz target: `CredentialLoader::load`
//!
//! Serves arbitrary bytes as a credential file, optionally cutting the read
//! short, and checks the length rule and that no handle is leaked.
//!
//! cargo fuzz run fuzz_load

#![no_main]

use libfuzzer_sys::fuzz_target;
use tlsglue::app::loader::contains_pem_marker;
use tlsglue::{CredentialLoader, FileSystem, FsError, TlsIoError};

struct Fuzzed<'a> {
    data: &'a [u8],
    deliver: usize,
    open: bool,
}

impl FileSystem for Fuzzed<'_> {
    type File = ();

    fn open(&mut self, _: &str) -> Result<(), FsError> {
        self.open = true;
        Ok(())
    }

    fn size(&mut self, _: &()) -> usize {
        self.data.len()
    }

    fn read(&mut self, _: &mut (), buf: &mut [u8]) -> Result<usize, FsError> {
        let n = buf.len().min(self.deliver);
        buf[..n].copy_from_slice(&self.data[..n]);
        Ok(n)
    }

    fn close(&mut self, _: ()) {
        self.open = false;
    }
}

fuzz_target!(|input: &[u8]| {
    let Some((&cut, data)) = input.split_first() else {
        return;
    };
    // Low bit set: deliver only part of the file.
    let deliver = if cut & 1 == 1 && !data.is_empty() {
        usize::from(cut >> 1) % data.len()
    } else {
        data.len()
    };

    let mut loader = CredentialLoader::new(Fuzzed {
        data,
        deliver,
        open: false,
    });
    match loader.load("fuzz.pem") {
        Ok(buf) => {
            let expected = data.len() + usize::from(contains_pem_marker(data));
            assert_eq!(buf.len(), expected);
            assert_eq!(buf.contents(), data);
        }
        Err(e) => {
            assert_eq!(e, TlsIoError::FileIo);
            assert!(deliver < data.len());
        }
    }
    assert!(!loader.fs().open, "handle leaked");
});
