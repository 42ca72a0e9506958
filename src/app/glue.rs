//! Certificate/key parse glue.
//!
//! Bridges the TLS library's file-based entry points to the in-memory
//! parsers: load through the [`CredentialLoader`], hand the reported slice
//! to the [`CredentialParser`], then erase the buffer whatever the parser
//! said.  Credential material never outlives the call that loaded it.
//!
//! Passphrase-protected keys, revocation lists and directory stores are not
//! implemented on this platform.  Their entry points fail with
//! [`TlsIoError::Unsupported`] for every input, so callers cannot mistake
//! "not implemented" for "nothing to load".

use log::warn;

use super::loader::{CredentialBuffer, CredentialLoader};
use super::ports::{CredentialParser, FileSystem};
use crate::error::{Result, TlsIoError, UnsupportedFeature};

/// File-based credential entry points over a [`CredentialLoader`].
pub struct ParseGlue<F> {
    loader: CredentialLoader<F>,
}

impl<F: FileSystem> ParseGlue<F> {
    pub fn new(loader: CredentialLoader<F>) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &CredentialLoader<F> {
        &self.loader
    }

    /// Whole-file load for certificates.
    pub fn load_certificate(&mut self, path: &str) -> Result<CredentialBuffer> {
        self.loader.load(path)
    }

    /// Whole-file load for private keys.
    pub fn load_key(&mut self, path: &str) -> Result<CredentialBuffer> {
        self.loader.load(path)
    }

    /// Load `path` and append every certificate in it to the parser's chain.
    pub fn parse_certificate_chain<P>(&mut self, parser: &mut P, path: &str) -> Result<()>
    where
        P: CredentialParser + ?Sized,
    {
        let buf = self.loader.load(path)?;
        let parsed = parser.parse_chain(buf.as_bytes());
        drop(buf);
        parsed.map_err(|code| {
            warn!("glue: certificate chain '{}' rejected ({})", path, code);
            TlsIoError::Parse(code)
        })
    }

    /// Load `path` and add its certificates to the parser's trust anchors.
    pub fn parse_ca_chain<P>(&mut self, parser: &mut P, path: &str) -> Result<()>
    where
        P: CredentialParser + ?Sized,
    {
        let buf = self.loader.load(path)?;
        let parsed = parser.parse_trust_anchors(buf.as_bytes());
        drop(buf);
        parsed.map_err(|code| {
            warn!("glue: CA chain '{}' rejected ({})", path, code);
            TlsIoError::Parse(code)
        })
    }

    /// Load `path` and parse it as an unencrypted private key.
    pub fn parse_key_file<P>(&mut self, parser: &mut P, path: &str) -> Result<()>
    where
        P: CredentialParser + ?Sized,
    {
        let buf = self.loader.load(path)?;
        let parsed = parser.parse_key(buf.as_bytes());
        drop(buf);
        parsed.map_err(|code| {
            warn!("glue: private key '{}' rejected ({})", path, code);
            TlsIoError::Parse(code)
        })
    }
}

/// Passphrase-protected key files are not supported.
pub fn parse_encrypted_key(_path: &str, _passphrase: &[u8]) -> Result<()> {
    Err(UnsupportedFeature::EncryptedKey.into())
}

/// Certificate revocation lists are not supported.
pub fn parse_revocation_list(_path: &str) -> Result<()> {
    Err(UnsupportedFeature::RevocationList.into())
}

/// Directory-based certificate stores are not supported.
pub fn parse_directory(_path: &str) -> Result<()> {
    Err(UnsupportedFeature::CertificateDirectory.into())
}
