//! mbedTLS callback shims and in-memory parsers.
//!
//! Compiled only for `target_os = "espidf"`.  Exposes:
//!
//! - `bio_send` / `bio_recv`: BIO callbacks registered with
//!   `mbedtls_ssl_set_bio`.  The socket descriptor travels in the `p_bio`
//!   context pointer.
//! - `debug_callback`: `mbedtls_ssl_conf_dbg` hook forwarding into `log`
//!   or, in console mode, onto stdout with CRLF line endings.
//! - [`MbedtlsCredentials`]: [`CredentialParser`] over the CA chain, the
//!   device chain and an `mbedtls_pk_context`.
//! - [`ClientConfig`]: an owned client `mbedtls_ssl_config` the credentials
//!   and debug hook are registered on.
//! - [`Session`]: one `mbedtls_ssl_context` bound to a config and a socket.

use core::ffi::{CStr, c_char, c_int, c_void};

use log::{info, warn};

use esp_idf_svc::sys::{
    MBEDTLS_SSL_IS_CLIENT, MBEDTLS_SSL_PRESET_DEFAULT, MBEDTLS_SSL_TRANSPORT_STREAM,
    MBEDTLS_SSL_VERIFY_REQUIRED, mbedtls_ctr_drbg_context, mbedtls_ctr_drbg_free, mbedtls_ctr_drbg_init,
    mbedtls_ctr_drbg_random, mbedtls_ctr_drbg_seed, mbedtls_entropy_context,
    mbedtls_entropy_free, mbedtls_entropy_func, mbedtls_entropy_init, mbedtls_pk_context,
    mbedtls_pk_free, mbedtls_pk_init, mbedtls_pk_parse_key, mbedtls_ssl_conf_authmode,
    mbedtls_ssl_conf_ca_chain, mbedtls_ssl_conf_dbg, mbedtls_ssl_conf_own_cert,
    mbedtls_ssl_conf_rng, mbedtls_ssl_config, mbedtls_ssl_config_defaults,
    mbedtls_ssl_config_free, mbedtls_ssl_config_init, mbedtls_ssl_context, mbedtls_ssl_free,
    mbedtls_ssl_init, mbedtls_ssl_setup, mbedtls_ssl_set_bio, mbedtls_x509_crt,
    mbedtls_x509_crt_free, mbedtls_x509_crt_init, mbedtls_x509_crt_parse,
};

use super::lwip::LwipStack;
use crate::app::ports::{CredentialParser, SocketFd};
use crate::app::provision::Provisioned;
use crate::app::transport::SocketTransport;
use crate::debug::DebugSink;
use crate::error::return_code;

/// Personalisation string for the key-parsing DRBG.
const DRBG_PERS: &[u8] = b"tlsglue-pk";

// ── BIO callbacks ─────────────────────────────────────────────────────────────

/// mbedTLS send BIO callback.
///
/// # Safety
///
/// `ctx` must be a socket descriptor cast to `*mut c_void` (see [`attach`]),
/// and `buf` must be readable for `len` bytes.
pub unsafe extern "C" fn bio_send(ctx: *mut c_void, buf: *const u8, len: usize) -> c_int {
    let fd = SocketFd::new(ctx as c_int);
    let data = if buf.is_null() || len == 0 {
        &[][..]
    } else {
        // SAFETY: caller guarantees `buf` is valid for `len` bytes.
        unsafe { core::slice::from_raw_parts(buf, len) }
    };
    return_code(SocketTransport::new(LwipStack).send(fd, data))
}

/// mbedTLS recv BIO callback.
///
/// # Safety
///
/// Same invariants as [`bio_send`]; `buf` must be writable for `len` bytes.
pub unsafe extern "C" fn bio_recv(ctx: *mut c_void, buf: *mut u8, len: usize) -> c_int {
    let fd = SocketFd::new(ctx as c_int);
    let data = if buf.is_null() || len == 0 {
        &mut [][..]
    } else {
        // SAFETY: caller guarantees `buf` is valid and unaliased for `len` bytes.
        unsafe { core::slice::from_raw_parts_mut(buf, len) }
    };
    return_code(SocketTransport::new(LwipStack).recv(fd, data))
}

/// Route `ssl`'s record I/O through the BIO callbacks for socket `fd`.
pub fn attach(ssl: &mut mbedtls_ssl_context, fd: SocketFd) {
    // SAFETY: the callbacks only interpret `p_bio` as an integer descriptor.
    unsafe {
        mbedtls_ssl_set_bio(
            ssl,
            fd.raw() as isize as *mut c_void,
            Some(bio_send),
            Some(bio_recv),
            None,
        );
    }
}

// ── Debug output ─────────────────────────────────────────────────────────────

/// Board console as a `fmt::Write` sink.
struct Console;

impl core::fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        use std::io::Write as _;
        std::io::stdout().write_all(s.as_bytes()).map_err(|_| core::fmt::Error)
    }
}

/// `mbedtls_ssl_conf_dbg` hook.  `ctx` carries a packed [`DebugSink`].
///
/// # Safety
///
/// `file` and `msg` must be null or NUL-terminated strings.
pub unsafe extern "C" fn debug_callback(
    ctx: *mut c_void,
    level: c_int,
    file: *const c_char,
    line: c_int,
    msg: *const c_char,
) {
    let text = |p: *const c_char| {
        if p.is_null() {
            ""
        } else {
            // SAFETY: mbedTLS passes NUL-terminated strings.
            unsafe { CStr::from_ptr(p) }.to_str().unwrap_or("<non-utf8>")
        }
    };
    let sink = DebugSink::from_ctx(ctx as usize);
    sink.emit(Console, level, text(file), line.max(0) as u32, text(msg));
}

/// Install the debug hook on `conf`.
pub fn install_debug(conf: &mut mbedtls_ssl_config, sink: DebugSink) {
    // SAFETY: the hook only interprets `p_dbg` as a packed integer.
    unsafe {
        mbedtls_ssl_conf_dbg(conf, Some(debug_callback), sink.to_ctx() as *mut c_void);
    }
}

// ── Credential parser ────────────────────────────────────────────────────────

/// Certificate chains and private key owned by one TLS configuration.
///
/// All mbedTLS structs are heap-allocated to avoid large stack frames, and
/// must outlive every [`ClientConfig`] they are registered on.
pub struct MbedtlsCredentials {
    pub ca: Box<mbedtls_x509_crt>,
    pub chain: Box<mbedtls_x509_crt>,
    pub key: Box<mbedtls_pk_context>,
    entropy: Box<mbedtls_entropy_context>,
    drbg: Box<mbedtls_ctr_drbg_context>,
}

unsafe impl Send for MbedtlsCredentials {}

impl MbedtlsCredentials {
    /// Initialise empty containers and seed the DRBG used by key parsing.
    pub fn new() -> Result<Self, i32> {
        let mut creds = Self {
            ca: Box::new(mbedtls_x509_crt::default()),
            chain: Box::new(mbedtls_x509_crt::default()),
            key: Box::new(mbedtls_pk_context::default()),
            entropy: Box::new(mbedtls_entropy_context::default()),
            drbg: Box::new(mbedtls_ctr_drbg_context::default()),
        };

        // SAFETY: All pointers come from Box::as_mut() and are therefore
        // valid, aligned, and exclusively owned.  Drop frees them once.
        let ret = unsafe {
            mbedtls_x509_crt_init(creds.ca.as_mut());
            mbedtls_x509_crt_init(creds.chain.as_mut());
            mbedtls_pk_init(creds.key.as_mut());
            mbedtls_entropy_init(creds.entropy.as_mut());
            mbedtls_ctr_drbg_init(creds.drbg.as_mut());
            mbedtls_ctr_drbg_seed(
                creds.drbg.as_mut(),
                Some(mbedtls_entropy_func),
                (creds.entropy.as_mut() as *mut mbedtls_entropy_context).cast(),
                DRBG_PERS.as_ptr(),
                DRBG_PERS.len(),
            )
        };
        if ret != 0 {
            warn!("mbedtls: ctr_drbg_seed failed ({})", ret);
            return Err(ret);
        }

        info!("mbedtls: credential containers ready");
        Ok(creds)
    }
}

impl CredentialParser for MbedtlsCredentials {
    fn parse_chain(&mut self, data: &[u8]) -> Result<(), i32> {
        // SAFETY: `data` is a live slice; mbedTLS copies what it keeps.
        let ret = unsafe { mbedtls_x509_crt_parse(self.chain.as_mut(), data.as_ptr(), data.len()) };
        // A positive return counts certificates that failed to parse.
        if ret == 0 { Ok(()) } else { Err(ret) }
    }

    fn parse_trust_anchors(&mut self, data: &[u8]) -> Result<(), i32> {
        // SAFETY: as above.
        let ret = unsafe { mbedtls_x509_crt_parse(self.ca.as_mut(), data.as_ptr(), data.len()) };
        if ret == 0 { Ok(()) } else { Err(ret) }
    }

    fn parse_key(&mut self, data: &[u8]) -> Result<(), i32> {
        // SAFETY: as above; the DRBG was seeded in `new`.
        let ret = unsafe {
            mbedtls_pk_parse_key(
                self.key.as_mut(),
                data.as_ptr(),
                data.len(),
                core::ptr::null(),
                0,
                Some(mbedtls_ctr_drbg_random),
                (self.drbg.as_mut() as *mut mbedtls_ctr_drbg_context).cast(),
            )
        };
        if ret == 0 { Ok(()) } else { Err(ret) }
    }
}

impl Drop for MbedtlsCredentials {
    fn drop(&mut self) {
        // SAFETY: every context was initialised in `new` and is freed exactly once.
        unsafe {
            mbedtls_x509_crt_free(self.ca.as_mut());
            mbedtls_x509_crt_free(self.chain.as_mut());
            mbedtls_pk_free(self.key.as_mut());
            mbedtls_ctr_drbg_free(self.drbg.as_mut());
            mbedtls_entropy_free(self.entropy.as_mut());
        }
    }
}

// ── Client configuration ─────────────────────────────────────────────────────

/// Owned client-side `mbedtls_ssl_config`.
pub struct ClientConfig {
    conf: Box<mbedtls_ssl_config>,
}

unsafe impl Send for ClientConfig {}

impl ClientConfig {
    /// Stream-transport client defaults.
    pub fn new() -> Result<Self, i32> {
        let mut conf = Box::new(mbedtls_ssl_config::default());
        // SAFETY: `conf` is a fresh, exclusively owned allocation; Drop frees it.
        let ret = unsafe {
            mbedtls_ssl_config_init(conf.as_mut());
            mbedtls_ssl_config_defaults(
                conf.as_mut(),
                MBEDTLS_SSL_IS_CLIENT as _,
                MBEDTLS_SSL_TRANSPORT_STREAM as _,
                MBEDTLS_SSL_PRESET_DEFAULT as _,
            )
        };
        if ret != 0 {
            warn!("mbedtls: ssl_config_defaults failed ({})", ret);
            return Err(ret);
        }
        Ok(Self { conf })
    }

    pub fn raw_mut(&mut self) -> &mut mbedtls_ssl_config {
        self.conf.as_mut()
    }

    /// Register what `provisioned` loaded into `creds`, plus its DRBG.
    ///
    /// With no certificates (PSK only) only the RNG is wired.
    pub fn register(
        &mut self,
        creds: &mut MbedtlsCredentials,
        provisioned: &Provisioned,
    ) -> Result<(), i32> {
        // SAFETY: every pointer comes from a live Box owned by `creds`,
        // which the caller keeps alive for as long as this config is used.
        unsafe {
            mbedtls_ssl_conf_rng(
                self.conf.as_mut(),
                Some(mbedtls_ctr_drbg_random),
                (creds.drbg.as_mut() as *mut mbedtls_ctr_drbg_context).cast(),
            );
            if provisioned.chains == 0 {
                return Ok(());
            }
            mbedtls_ssl_conf_ca_chain(self.conf.as_mut(), creds.ca.as_mut(), core::ptr::null_mut());
            mbedtls_ssl_conf_authmode(self.conf.as_mut(), MBEDTLS_SSL_VERIFY_REQUIRED as _);
            if provisioned.key {
                let ret = mbedtls_ssl_conf_own_cert(
                    self.conf.as_mut(),
                    creds.chain.as_mut(),
                    creds.key.as_mut(),
                );
                if ret != 0 {
                    warn!("mbedtls: ssl_conf_own_cert failed ({})", ret);
                    return Err(ret);
                }
            }
        }
        info!("mbedtls: credentials registered ({:?})", provisioned.mode);
        Ok(())
    }

    /// Route this configuration's debug output through `sink`.
    pub fn set_debug(&mut self, sink: DebugSink) {
        install_debug(self.conf.as_mut(), sink);
    }
}

impl Drop for ClientConfig {
    fn drop(&mut self) {
        // SAFETY: initialised in `new`, freed exactly once.
        unsafe { mbedtls_ssl_config_free(self.conf.as_mut()) };
    }
}

// ── Session ──────────────────────────────────────────────────────────────────

/// One TLS session over a connected socket.
pub struct Session<'conf> {
    ssl: Box<mbedtls_ssl_context>,
    _conf: core::marker::PhantomData<&'conf ClientConfig>,
}

impl<'conf> Session<'conf> {
    /// Bind a fresh context to `conf` and route its records through `fd`.
    pub fn new(conf: &'conf ClientConfig, fd: SocketFd) -> Result<Self, i32> {
        let mut ssl = Box::new(mbedtls_ssl_context::default());
        // SAFETY: `ssl` is exclusively owned; `conf` outlives the session
        // through the `'conf` borrow.
        let ret = unsafe {
            mbedtls_ssl_init(ssl.as_mut());
            mbedtls_ssl_setup(ssl.as_mut(), conf.conf.as_ref())
        };
        if ret != 0 {
            // SAFETY: initialised above.
            unsafe { mbedtls_ssl_free(ssl.as_mut()) };
            warn!("mbedtls: ssl_setup failed ({})", ret);
            return Err(ret);
        }
        attach(ssl.as_mut(), fd);
        Ok(Self {
            ssl,
            _conf: core::marker::PhantomData,
        })
    }

    pub fn raw_mut(&mut self) -> &mut mbedtls_ssl_context {
        self.ssl.as_mut()
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        // SAFETY: initialised in `new`, freed exactly once.
        unsafe { mbedtls_ssl_free(self.ssl.as_mut()) };
    }
}
