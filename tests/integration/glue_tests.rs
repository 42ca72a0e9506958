//! Integration tests for the parse glue and the unsupported entry points.

use super::mock_fs::MemFs;
use tlsglue::error::codes;
use tlsglue::{
    CredentialLoader, CredentialParser, ParseGlue, TlsIoError, UnsupportedFeature,
    parse_directory, parse_encrypted_key, parse_revocation_list,
};

/// Parser that records what it was handed and optionally rejects it.
#[derive(Default)]
pub struct RecordingParser {
    pub chains: Vec<Vec<u8>>,
    pub keys: Vec<Vec<u8>>,
    pub reject_chain: Option<i32>,
    pub reject_key: Option<i32>,
}

impl CredentialParser for RecordingParser {
    fn parse_chain(&mut self, data: &[u8]) -> Result<(), i32> {
        self.chains.push(data.to_vec());
        self.reject_chain.map_or(Ok(()), Err)
    }

    fn parse_key(&mut self, data: &[u8]) -> Result<(), i32> {
        self.keys.push(data.to_vec());
        self.reject_key.map_or(Ok(()), Err)
    }
}

const CERT: &[u8] = b"-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";

fn glue(fs: MemFs) -> ParseGlue<MemFs> {
    ParseGlue::new(CredentialLoader::new(fs))
}

#[test]
fn pem_chain_reaches_parser_with_terminator() {
    let mut glue = glue(MemFs::new().with_file("/certs/ca.pem", CERT));
    let mut parser = RecordingParser::default();
    glue.parse_certificate_chain(&mut parser, "/certs/ca.pem").unwrap();

    let seen = &parser.chains[0];
    assert_eq!(seen.len(), CERT.len() + 1);
    assert_eq!(&seen[..CERT.len()], CERT);
    assert_eq!(seen[CERT.len()], 0);
    assert!(glue.loader().fs().balanced());
}

#[test]
fn der_key_reaches_parser_verbatim() {
    let der = [0x30, 0x82, 0x01, 0x0a, 0x02, 0x01, 0x00];
    let mut glue = glue(MemFs::new().with_file("k.der", &der));
    let mut parser = RecordingParser::default();
    glue.parse_key_file(&mut parser, "k.der").unwrap();
    assert_eq!(parser.keys[0], der);
}

#[test]
fn parser_rejection_carries_its_code() {
    let mut glue = glue(MemFs::new().with_file("c.pem", CERT));
    let mut parser = RecordingParser {
        reject_chain: Some(-0x2180),
        ..Default::default()
    };
    let err = glue.parse_certificate_chain(&mut parser, "c.pem").unwrap_err();
    assert_eq!(err, TlsIoError::Parse(-0x2180));
    assert_eq!(err.code(), -0x2180);
}

#[test]
fn load_failure_skips_parser() {
    let mut glue = glue(MemFs::new());
    let mut parser = RecordingParser::default();
    let err = glue.parse_key_file(&mut parser, "absent.key").unwrap_err();
    assert_eq!(err, TlsIoError::FileIo);
    assert!(parser.keys.is_empty());
}

#[test]
fn unsupported_entry_points_always_fail() {
    assert_eq!(
        parse_encrypted_key("/certs/device.key", b"secret"),
        Err(TlsIoError::Unsupported(UnsupportedFeature::EncryptedKey))
    );
    assert_eq!(
        parse_revocation_list("/certs/ca.crl"),
        Err(TlsIoError::Unsupported(UnsupportedFeature::RevocationList))
    );
    assert_eq!(
        parse_directory("/certs"),
        Err(TlsIoError::Unsupported(UnsupportedFeature::CertificateDirectory))
    );
    assert_eq!(
        parse_directory("").unwrap_err().code(),
        codes::X509_FILE_IO_ERROR
    );
}

#[test]
fn load_certificate_reports_pem_terminator() {
    let mut glue = glue(MemFs::new().with_file("/certs/ca.pem", CERT));
    let buf = glue.load_certificate("/certs/ca.pem").unwrap();
    assert_eq!(buf.len(), CERT.len() + 1);
    assert_eq!(buf.contents(), CERT);
    assert_eq!(buf.as_bytes()[CERT.len()], 0);
    drop(buf);
    assert!(glue.loader().fs().balanced());
}

#[test]
fn load_key_reports_der_length() {
    let der: Vec<u8> = (0..100u8).map(|b| b ^ 0x5a).collect();
    let mut glue = glue(MemFs::new().with_file("/certs/device.der", &der));
    let buf = glue.load_key("/certs/device.der").unwrap();
    assert_eq!(buf.len(), der.len());
    assert_eq!(buf.as_bytes(), der.as_slice());
}

#[test]
fn load_entry_points_report_missing_files() {
    let mut glue = glue(MemFs::new());
    assert_eq!(glue.load_certificate("/certs/none.pem").unwrap_err(), TlsIoError::FileIo);
    assert_eq!(glue.load_key("/certs/none.key").unwrap_err(), TlsIoError::FileIo);
    assert_eq!(glue.loader().fs().size_queries, 0);
}

#[test]
fn load_key_short_read_is_file_io() {
    let mut fs = MemFs::new().with_file("/certs/device.key", &[0x30; 100]);
    fs.read_limit = Some(40);
    let mut glue = glue(fs);
    assert_eq!(glue.load_key("/certs/device.key").unwrap_err(), TlsIoError::FileIo);
    assert!(glue.loader().fs().balanced());
}
