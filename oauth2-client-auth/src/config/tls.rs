//! TLS settings for the token endpoint connection

use reqwest::tls::{Certificate, Identity, Version};
use reqwest::ClientBuilder;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading TLS settings
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read TLS file '{}': {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid PEM data in {origin}: {source}")]
    InvalidPem {
        origin: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("no PEM certificates found in {origin}")]
    NoCertificates { origin: String },
    #[error("both cert_file and key_file must be set for a client certificate")]
    IncompleteKeyPair,
    #[error("unsupported minimum TLS version '{0}', expected \"1.2\" or \"1.3\"")]
    UnsupportedVersion(String),
    #[error("failed to build token endpoint client with TLS settings: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

/// TLS client settings, loaded into a [`TlsConfig`] before use
#[derive(Debug, confique::Config, Clone, Default)]
pub struct TlsClientSettings {
    /// PEM file with CA certificates trusted for the token endpoint
    #[config(env = "OAUTH2_CLIENT_TLS_CA_FILE")]
    pub ca_file: Option<PathBuf>,

    /// Inline PEM CA certificates, added to those from `ca_file`
    #[config(env = "OAUTH2_CLIENT_TLS_CA_PEM")]
    pub ca_pem: Option<String>,

    /// PEM client certificate for mutual TLS
    #[config(env = "OAUTH2_CLIENT_TLS_CERT_FILE")]
    pub cert_file: Option<PathBuf>,

    /// PEM private key matching `cert_file`
    #[config(env = "OAUTH2_CLIENT_TLS_KEY_FILE")]
    pub key_file: Option<PathBuf>,

    /// Skip server certificate verification (default: false)
    #[config(env = "OAUTH2_CLIENT_TLS_INSECURE_SKIP_VERIFY", default = false)]
    pub insecure_skip_verify: bool,

    /// Minimum TLS version, "1.2" or "1.3"
    #[config(env = "OAUTH2_CLIENT_TLS_MIN_VERSION")]
    pub min_version: Option<String>,
}

/// TLS configuration ready to be installed on an HTTP client
#[derive(Default)]
pub struct TlsConfig {
    root_certificates: Vec<Certificate>,
    identity: Option<Identity>,
    accept_invalid_certs: bool,
    min_version: Option<Version>,
}

impl fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConfig")
            .field("root_certificates", &self.root_certificates.len())
            .field("identity", &self.identity.is_some())
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("min_version", &self.min_version)
            .finish()
    }
}

impl TlsClientSettings {
    /// Reads the referenced certificate files and builds a [`TlsConfig`]
    pub fn load_tls_config(&self) -> Result<TlsConfig, TlsError> {
        let mut root_certificates = Vec::new();
        if let Some(path) = &self.ca_file {
            let pem = read_file(path)?;
            root_certificates.extend(parse_certificates(&pem, path.display().to_string())?);
        }
        if let Some(pem) = &self.ca_pem {
            root_certificates.extend(parse_certificates(pem.as_bytes(), "ca_pem".to_string())?);
        }

        let identity = match (&self.cert_file, &self.key_file) {
            (Some(cert_path), Some(key_path)) => {
                let mut pem = read_file(cert_path)?;
                pem.push(b'\n');
                pem.extend(read_file(key_path)?);
                Some(
                    Identity::from_pem(&pem).map_err(|source| TlsError::InvalidPem {
                        origin: cert_path.display().to_string(),
                        source,
                    })?,
                )
            }
            (None, None) => None,
            _ => return Err(TlsError::IncompleteKeyPair),
        };

        let min_version = match self.min_version.as_deref() {
            None | Some("") => None,
            Some("1.2") => Some(Version::TLS_1_2),
            Some("1.3") => Some(Version::TLS_1_3),
            Some(other) => return Err(TlsError::UnsupportedVersion(other.to_string())),
        };

        Ok(TlsConfig {
            root_certificates,
            identity,
            accept_invalid_certs: self.insecure_skip_verify,
            min_version,
        })
    }
}

impl TlsConfig {
    /// Installs this configuration on a client builder
    pub fn apply(self, mut builder: ClientBuilder) -> ClientBuilder {
        for certificate in self.root_certificates {
            builder = builder.add_root_certificate(certificate);
        }
        if let Some(identity) = self.identity {
            builder = builder.identity(identity);
        }
        if let Some(version) = self.min_version {
            builder = builder.min_tls_version(version);
        }
        builder.danger_accept_invalid_certs(self.accept_invalid_certs)
    }
}

fn parse_certificates(pem: &[u8], origin: String) -> Result<Vec<Certificate>, TlsError> {
    let certificates = match Certificate::from_pem_bundle(pem) {
        Ok(certificates) => certificates,
        Err(source) => return Err(TlsError::InvalidPem { origin, source }),
    };
    if certificates.is_empty() {
        return Err(TlsError::NoCertificates { origin });
    }
    Ok(certificates)
}

fn read_file(path: &Path) -> Result<Vec<u8>, TlsError> {
    std::fs::read(path).map_err(|source| TlsError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}
