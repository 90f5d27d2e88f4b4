//! Credential and certificate discovery.
use super::{CertSource, CertificateConfig, Credentials, CredentialsError};
use directories::BaseDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Points at the credentials file used when nothing is passed explicitly.
pub const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";
/// Overrides the location of the gcloud certificate config.
pub const CERTIFICATE_CONFIG_ENV: &str = "GOOGLE_API_CERTIFICATE_CONFIG";

/// Source of credential material that is not passed explicitly by the caller.
///
/// The resolver and the transport factory only ever reach ambient state through this trait,
/// so tests can substitute deterministic fakes for process-wide lookups.
pub trait CredentialProvider: Send + Sync {
    /// Discovers the application default credentials.
    fn default_credentials(
        &self,
        scopes: &[String],
        quota_project_id: Option<&str>,
    ) -> Result<Credentials, CredentialsError>;

    /// Loads credentials from a file.
    ///
    /// `quota_project_id` takes precedence over the quota project recorded in the file.
    fn credentials_from_file(
        &self,
        path: &Path,
        _scopes: &[String],
        quota_project_id: Option<&str>,
    ) -> Result<Credentials, CredentialsError> {
        CredentialsFile::load(path)?.into_credentials(path, quota_project_id)
    }

    /// Builds credentials out of an API key.
    fn api_key_credentials(&self, api_key: &str) -> Credentials {
        Credentials::api_key(api_key)
    }

    /// Discovers a client certificate usable for mutual TLS, if the environment has one.
    fn default_client_cert_source(&self) -> Option<CertSource>;
}

/// On-disk credentials.
///
/// Only files carrying a ready to use `access_token` are supported; exchanging service account
/// or user refresh tokens is left to a dedicated auth library plugged in as a custom
/// [`CredentialProvider`].
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsFile {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub quota_project_id: Option<String>,
}

impl CredentialsFile {
    pub fn load(path: &Path) -> Result<Self, CredentialsError> {
        let content = std::fs::read_to_string(path).map_err(|source| CredentialsError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| CredentialsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn into_credentials(
        self,
        path: &Path,
        quota_project_id: Option<&str>,
    ) -> Result<Credentials, CredentialsError> {
        let Some(token) = self.access_token else {
            return Err(CredentialsError::UnsupportedType {
                path: path.to_path_buf(),
                kind: self.kind,
            });
        };

        let credentials = Credentials::bearer(token);
        let quota_project_id = quota_project_id.map(str::to_string);
        match quota_project_id.or(self.quota_project_id) {
            Some(project) => Ok(credentials.with_quota_project_id(project)),
            None => Ok(credentials),
        }
    }
}

/// Discovers credentials and client certificates the way gcloud tooling lays them out.
///
/// * credentials: the file named by `GOOGLE_APPLICATION_CREDENTIALS`;
/// * client certificate: the workload entry of the certificate config named by
///   `GOOGLE_API_CERTIFICATE_CONFIG`, falling back to `<config dir>/gcloud/certificate_config.json`.
#[derive(Debug, Clone, Default)]
pub struct AmbientCredentialProvider {
    credentials_file: Option<PathBuf>,
    certificate_config: Option<PathBuf>,
}

impl AmbientCredentialProvider {
    /// Creates a provider looking at explicit locations instead of the environment.
    pub fn new(credentials_file: Option<PathBuf>, certificate_config: Option<PathBuf>) -> Self {
        Self {
            credentials_file,
            certificate_config,
        }
    }

    /// Captures the relevant environment variables once.
    pub fn from_env() -> Self {
        let credentials_file = std::env::var_os(CREDENTIALS_ENV).map(PathBuf::from);
        let certificate_config = std::env::var_os(CERTIFICATE_CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| {
                BaseDirs::new().map(|dirs| {
                    dirs.config_dir()
                        .join("gcloud")
                        .join("certificate_config.json")
                })
            });

        Self::new(credentials_file, certificate_config)
    }
}

impl CredentialProvider for AmbientCredentialProvider {
    fn default_credentials(
        &self,
        scopes: &[String],
        quota_project_id: Option<&str>,
    ) -> Result<Credentials, CredentialsError> {
        let path = self
            .credentials_file
            .as_deref()
            .ok_or(CredentialsError::DefaultCredentialsNotFound)?;

        debug!(path = %path.display(), "loading application default credentials");
        self.credentials_from_file(path, scopes, quota_project_id)
    }

    fn default_client_cert_source(&self) -> Option<CertSource> {
        let path = self.certificate_config.as_deref()?;
        if !path.exists() {
            return None;
        }

        match CertificateConfig::load(path) {
            Ok(config) => config.workload_cert_source(),
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "ignoring unreadable certificate config"
                );
                None
            }
        }
    }
}
