//! Certificate store — feeds configured credentials into the TLS library.
//!
//! Runs once at credential-load time, before any connection is opened.
//! In `PskOnly` mode nothing is read.  Otherwise the CA chain, the device
//! certificate chain and the device key are parsed in that order through
//! [`ParseGlue`]; the first failure aborts provisioning.
//!
//! | Path          | Content                                  |
//! |---------------|------------------------------------------|
//! | `ca_chain`    | PEM or DER CA certificate chain          |
//! | `device_cert` | PEM or DER device certificate chain      |
//! | `device_key`  | PEM or DER unencrypted private key       |

use log::{info, warn};

use super::glue::ParseGlue;
use super::ports::{CredentialParser, FileSystem};
use crate::config::{CredentialPaths, TlsMode};
use crate::error::Result;

/// What a successful [`CertStore::provision`] handed to the TLS library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provisioned {
    pub mode: TlsMode,
    /// Certificate files parsed (CA chain + device chain).
    pub chains: u8,
    /// Whether a private key was parsed.
    pub key: bool,
}

/// Certificate store adapter.
pub struct CertStore<F> {
    glue: ParseGlue<F>,
    mode: TlsMode,
}

impl<F: FileSystem> CertStore<F> {
    pub fn new(glue: ParseGlue<F>, mode: TlsMode) -> Self {
        Self { glue, mode }
    }

    pub fn mode(&self) -> TlsMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: TlsMode) {
        self.mode = mode;
    }

    pub fn glue_mut(&mut self) -> &mut ParseGlue<F> {
        &mut self.glue
    }

    /// Parse the configured credentials into `parser`.
    pub fn provision<P>(&mut self, parser: &mut P, paths: &CredentialPaths) -> Result<Provisioned>
    where
        P: CredentialParser + ?Sized,
    {
        if !self.mode.uses_certificates() {
            info!("CertStore: PskOnly mode, no certificates loaded");
            return Ok(Provisioned {
                mode: self.mode,
                chains: 0,
                key: false,
            });
        }

        let ca = self.glue.parse_ca_chain(parser, &paths.ca_chain);
        logged("CA chain", &paths.ca_chain, ca)?;
        let cert = self.glue.parse_certificate_chain(parser, &paths.device_cert);
        logged("device cert", &paths.device_cert, cert)?;
        let key = self.glue.parse_key_file(parser, &paths.device_key);
        logged("device key", &paths.device_key, key)?;

        info!(
            "CertStore: provisioned {:?} (ca={}, cert={}, key={})",
            self.mode, paths.ca_chain, paths.device_cert, paths.device_key
        );
        Ok(Provisioned {
            mode: self.mode,
            chains: 2,
            key: true,
        })
    }
}

fn logged(label: &str, path: &str, result: Result<()>) -> Result<()> {
    result.inspect_err(|e| warn!("CertStore: {} '{}' failed: {}", label, path, e))
}
