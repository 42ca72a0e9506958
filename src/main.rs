//! tlsglue device entry point.
//!
//! Brings up logging and the credential store, then provisions mbedTLS
//! with the configured certificates before any connection is opened.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     mbedTLS (external)                   │
//! │   ssl_set_bio ─────────┐        x509_crt / pk contexts   │
//! │                        ▼                 ▲               │
//! │   bio_send / bio_recv          CertStore ─ ParseGlue     │
//! │   SocketTransport<LwipStack>   CredentialLoader<NvsFs>   │
//! │  ─────────────── Port Trait Boundary ─────────────────   │
//! │   lwIP sockets                 NVS `certs` namespace     │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use log::{info, warn};

use tlsglue::adapters::mbedtls::{ClientConfig, MbedtlsCredentials};
use tlsglue::adapters::nvs_fs::NvsFs;
use tlsglue::{CertStore, CredentialLoader, ParseGlue, TlsIoConfig};

/// Optional provisioning document stored next to the credentials.
const CONFIG_PATH: &str = "/certs/tlsglue.json";

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("tlsglue v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Credential store + config ──────────────────────────
    let fs = NvsFs::new().map_err(|e| anyhow!("NVS init failed: {e}"))?;
    let mut loader = CredentialLoader::new(fs);
    let config = match loader.load(CONFIG_PATH) {
        Ok(doc) => TlsIoConfig::from_json(doc.contents()).unwrap_or_else(|e| {
            warn!("config rejected ({}), using defaults", e);
            TlsIoConfig::default()
        }),
        Err(_) => {
            info!("no stored config, using defaults");
            TlsIoConfig::default()
        }
    };

    // ── 3. Provision mbedTLS ──────────────────────────────────
    let limited = CredentialLoader::with_limit(loader.into_fs(), config.max_credential_len());
    let mut store = CertStore::new(ParseGlue::new(limited), config.mode);
    let mut creds =
        MbedtlsCredentials::new().map_err(|code| anyhow!("mbedtls init failed ({code})"))?;
    let provisioned = store
        .provision(&mut creds, &config.credentials)
        .map_err(|e| anyhow!("credential provisioning failed: {e}"))?;

    // ── 4. TLS client configuration ───────────────────────────
    let mut tls = ClientConfig::new().map_err(|code| anyhow!("ssl config failed ({code})"))?;
    tls.register(&mut creds, &provisioned)
        .map_err(|code| anyhow!("credential registration failed ({code})"))?;
    tls.set_debug(config.debug_sink());
    info!(
        "TLS client ready: mode={:?} chains={} key={} (debug {:?})",
        provisioned.mode,
        provisioned.chains,
        provisioned.key,
        config.debug_sink()
    );

    // Connections open `adapters::mbedtls::Session::new(&tls, fd)` once the
    // network is up.
    loop {
        std::thread::sleep(std::time::Duration::from_secs(60));
    }
}
