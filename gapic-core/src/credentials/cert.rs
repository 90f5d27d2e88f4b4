//! Client certificate sources for mutual TLS.
use serde::Deserialize;
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

#[derive(Debug, thiserror::Error)]
pub enum CertSourceError {
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Certificate config '{}' is invalid: {source}", path.display())]
    InvalidConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Client certificate callback failed: {0}")]
    Callback(String),
}

type LoadFn = dyn Fn() -> Result<(Vec<u8>, Vec<u8>), CertSourceError> + Send + Sync;

/// A capability producing a PEM encoded `(certificate chain, private key)` pair.
///
/// The source is only invoked when a channel is built. Two sources compare equal when they are
/// clones of the same capability.
#[derive(Clone)]
pub struct CertSource {
    load: Arc<LoadFn>,
    origin: &'static str,
}

impl CertSource {
    pub fn new<F>(load: F) -> Self
    where
        F: Fn() -> Result<(Vec<u8>, Vec<u8>), CertSourceError> + Send + Sync + 'static,
    {
        Self {
            load: Arc::new(load),
            origin: "callback",
        }
    }

    /// A source returning fixed PEM bytes.
    pub fn from_pem(cert: impl Into<Vec<u8>>, key: impl Into<Vec<u8>>) -> Self {
        let (cert, key) = (cert.into(), key.into());
        Self {
            load: Arc::new(move || Ok((cert.clone(), key.clone()))),
            origin: "pem",
        }
    }

    /// A source reading both PEM files each time it is invoked.
    pub fn from_files(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        let (cert_path, key_path) = (cert_path.into(), key_path.into());
        Self {
            load: Arc::new(move || Ok((read(&cert_path)?, read(&key_path)?))),
            origin: "files",
        }
    }

    pub fn load(&self) -> Result<(Vec<u8>, Vec<u8>), CertSourceError> {
        (self.load)()
    }

    pub fn ptr_eq(&self, other: &CertSource) -> bool {
        Arc::ptr_eq(&self.load, &other.load)
    }
}

impl PartialEq for CertSource {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for CertSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertSource")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

fn read(path: &Path) -> Result<Vec<u8>, CertSourceError> {
    std::fs::read(path).map_err(|source| CertSourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// The gcloud certificate configuration file.
///
/// ```json
/// { "cert_configs": { "workload": { "cert_path": "...", "key_path": "..." } } }
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CertificateConfig {
    #[serde(default)]
    cert_configs: CertConfigs,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
struct CertConfigs {
    workload: Option<WorkloadCertConfig>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
struct WorkloadCertConfig {
    cert_path: PathBuf,
    key_path: PathBuf,
}

impl CertificateConfig {
    pub fn load(path: &Path) -> Result<Self, CertSourceError> {
        let content = read(path)?;
        serde_json::from_slice(&content).map_err(|source| CertSourceError::InvalidConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The workload certificate declared by this config, if any.
    pub fn workload_cert_source(&self) -> Option<CertSource> {
        self.cert_configs
            .workload
            .as_ref()
            .map(|w| CertSource::from_files(&w.cert_path, &w.key_path))
    }
}
