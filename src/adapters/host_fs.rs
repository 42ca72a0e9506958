//! Host filesystem adapter (simulation only).
//!
//! Implements [`FileSystem`] over `std::fs`, rooted at a directory so the
//! device-style absolute paths used in config (`/certs/ca.pem`) resolve
//! inside a sandbox.  Used for host-side testing and tooling; on ESP-IDF
//! the NVS-backed store takes its place.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::{FileSystem, FsError};

/// Open host file plus its size at open time.
pub struct HostFile {
    file: File,
    size: usize,
}

pub struct HostFs {
    root: PathBuf,
}

impl HostFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        info!("HostFs: simulation backend rooted at {}", root.display());
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FsError> {
        let relative = Path::new(path.trim_start_matches('/'));
        // Keep lookups inside the root.
        if relative
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(FsError::NotFound);
        }
        Ok(self.root.join(relative))
    }
}

impl FileSystem for HostFs {
    type File = HostFile;

    fn open(&mut self, path: &str) -> Result<HostFile, FsError> {
        let full = self.resolve(path)?;
        let file = File::open(&full).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FsError::NotFound,
            _ => FsError::Io,
        })?;
        let meta = file.metadata().map_err(|_| FsError::Io)?;
        if !meta.is_file() {
            return Err(FsError::NotFound);
        }
        let size = usize::try_from(meta.len()).map_err(|_| FsError::Io)?;
        Ok(HostFile { file, size })
    }

    fn size(&mut self, file: &HostFile) -> usize {
        file.size
    }

    fn read(&mut self, file: &mut HostFile, buf: &mut [u8]) -> Result<usize, FsError> {
        let mut total = 0;
        while total < buf.len() {
            match file.file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(_) => return Err(FsError::Io),
            }
        }
        Ok(total)
    }

    fn close(&mut self, file: HostFile) {
        drop(file);
    }
}
