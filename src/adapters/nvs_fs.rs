//! NVS-backed credential store.
//!
//! Implements [`FileSystem`](crate::app::ports::FileSystem) on ESP-IDF by
//! mapping each credential path to a blob in the `certs` NVS namespace.
//! The blob key is the final path component, so `/certs/ca.pem` is read
//! from key `ca.pem`.
//!
//! ## Flash layout
//!
//! | Key           | Content                              |
//! |---------------|--------------------------------------|
//! | `ca.pem`      | CA certificate chain                 |
//! | `device.pem`  | device certificate chain             |
//! | `device.key`  | device private key                   |
//! | `tlsglue.json`| optional provisioning config         |
//!
//! # Security
//!
//! The `certs` namespace should live on the encrypted NVS partition.

#[cfg(target_os = "espidf")]
use log::{info, warn};

#[cfg(target_os = "espidf")]
use crate::app::ports::{FileSystem, FsError};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// NVS keys are limited to 15 characters plus NUL.
pub const MAX_KEY_LEN: usize = 15;

/// Namespace holding credential blobs.
pub const CERT_NAMESPACE: &str = "certs";

/// NUL-terminated NVS key for `path`, or `None` if it cannot be stored.
pub fn blob_key(path: &str) -> Option<[u8; MAX_KEY_LEN + 1]> {
    let name = path.rsplit('/').next()?;
    if name.is_empty() || name.len() > MAX_KEY_LEN || name.bytes().any(|b| b == 0) {
        return None;
    }
    let mut key = [0u8; MAX_KEY_LEN + 1];
    key[..name.len()].copy_from_slice(name.as_bytes());
    Some(key)
}

/// Open blob: the namespace handle stays open until `close`.
#[cfg(target_os = "espidf")]
pub struct NvsBlob {
    handle: nvs_handle_t,
    key: [u8; MAX_KEY_LEN + 1],
    size: usize,
}

#[cfg(target_os = "espidf")]
pub struct NvsFs {
    namespace: [u8; 16],
}

#[cfg(target_os = "espidf")]
impl NvsFs {
    /// Initialise NVS flash and bind to the `certs` namespace.
    ///
    /// On first boot or after a version mismatch the partition is erased
    /// and re-initialised.
    pub fn new() -> Result<Self, FsError> {
        // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
        // single main-task context before any concurrent NVS access.
        let ret = unsafe { nvs_flash_init() };
        if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
            warn!("NvsFs: erasing and re-initialising flash partition");
            if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                return Err(FsError::Io);
            }
        } else if ret != ESP_OK {
            return Err(FsError::Io);
        }

        let mut namespace = [0u8; 16];
        namespace[..CERT_NAMESPACE.len()].copy_from_slice(CERT_NAMESPACE.as_bytes());
        info!("NvsFs: credential namespace '{}'", CERT_NAMESPACE);
        Ok(Self { namespace })
    }
}

#[cfg(target_os = "espidf")]
impl FileSystem for NvsFs {
    type File = NvsBlob;

    fn open(&mut self, path: &str) -> Result<NvsBlob, FsError> {
        let key = blob_key(path).ok_or(FsError::NotFound)?;

        let mut handle: nvs_handle_t = 0;
        // SAFETY: namespace is NUL-terminated and `handle` is a valid out-pointer.
        let ret = unsafe {
            nvs_open(
                self.namespace.as_ptr().cast(),
                nvs_open_mode_t_NVS_READONLY,
                &mut handle,
            )
        };
        if ret == ESP_ERR_NVS_NOT_FOUND {
            return Err(FsError::NotFound);
        }
        if ret != ESP_OK {
            return Err(FsError::Io);
        }

        // Size query: null output buffer.
        let mut size: usize = 0;
        let ret = unsafe {
            nvs_get_blob(handle, key.as_ptr().cast(), core::ptr::null_mut(), &mut size)
        };
        if ret != ESP_OK {
            unsafe { nvs_close(handle) };
            return Err(if ret == ESP_ERR_NVS_NOT_FOUND {
                FsError::NotFound
            } else {
                FsError::Io
            });
        }

        Ok(NvsBlob { handle, key, size })
    }

    fn size(&mut self, file: &NvsBlob) -> usize {
        file.size
    }

    fn read(&mut self, file: &mut NvsBlob, buf: &mut [u8]) -> Result<usize, FsError> {
        // NVS only returns whole blobs.
        if buf.len() < file.size {
            return Ok(0);
        }
        let mut len = file.size;
        // SAFETY: `buf` holds at least `len` writable bytes; key is NUL-terminated.
        let ret = unsafe {
            nvs_get_blob(
                file.handle,
                file.key.as_ptr().cast(),
                buf.as_mut_ptr().cast(),
                &mut len,
            )
        };
        if ret != ESP_OK {
            return Err(FsError::Io);
        }
        Ok(len)
    }

    fn close(&mut self, file: NvsBlob) {
        // SAFETY: handle came from nvs_open and is closed exactly once.
        unsafe { nvs_close(file.handle) };
    }
}
