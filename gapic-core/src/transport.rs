//! # Transport
//!
//! [`TransportFactory`] turns a [`ResolvedConfig`] into a connected [`Transport`]: it resolves the
//! credential source into [`Credentials`], loads the client certificate when one was selected,
//! and eagerly connects one `tonic` channel. Any failure aborts client construction.
//!
//! The [`Transport`] owns the channel for the client's lifetime. [`Transport::close`] releases it
//! deterministically; dropping the transport releases it on every other path.
use crate::config::{CredentialSource, ResolvedConfig, ResolvedEndpoint};
use crate::credentials::{CertSourceError, CredentialProvider, Credentials, CredentialsError};
use std::sync::Arc;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint, Identity};
use tracing::{debug, info, warn};

pub const API_CLIENT_HEADER: &str = "x-goog-api-client";
pub const USER_PROJECT_HEADER: &str = "x-goog-user-project";

const API_CLIENT_VERSION: &str = concat!("gl-rust gapic/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid endpoint '{endpoint}': {source}")]
    InvalidUri {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },
    #[error("Failed to load credentials: {0}")]
    Credentials(#[from] CredentialsError),
    #[error("Failed to load the client certificate: {0}")]
    CertSource(#[from] CertSourceError),
    #[error("Malformed client certificate: {0}")]
    MalformedCertificate(String),
    #[error("Invalid TLS configuration: {0}")]
    Tls(#[source] tonic::transport::Error),
    #[error("Failed to connect to '{endpoint}': {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },
    #[error("The transport was closed")]
    Closed,
}

/// Builds transports out of resolved configuration.
pub struct TransportFactory {
    provider: Arc<dyn CredentialProvider>,
}

impl TransportFactory {
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self { provider }
    }

    /// Resolves the selected credential source into usable credentials.
    pub fn credentials(&self, config: &ResolvedConfig) -> Result<Credentials, TransportError> {
        let scopes = config.effective_scopes();
        let quota_project_id = config.quota_project_id.as_deref();

        let credentials = match &config.credentials {
            CredentialSource::Explicit(credentials) => credentials.clone(),
            CredentialSource::ApiKey(key) => self.provider.api_key_credentials(key),
            CredentialSource::File(path) => self
                .provider
                .credentials_from_file(path, scopes, quota_project_id)
                .inspect_err(|err| {
                    warn!(path = %path.display(), error = %err, "invalid credentials file")
                })?,
            CredentialSource::Ambient => {
                self.provider.default_credentials(scopes, quota_project_id)?
            }
        };

        Ok(credentials)
    }

    /// TLS settings for `endpoint`, or `None` for plaintext `http://` endpoints.
    ///
    /// The client certificate source is invoked here, once per channel.
    pub fn tls_config(
        &self,
        endpoint: &ResolvedEndpoint,
    ) -> Result<Option<ClientTlsConfig>, TransportError> {
        let uri = endpoint.uri();
        if uri.starts_with("http://") {
            if endpoint.cert_source.is_some() {
                warn!(endpoint = %uri, "ignoring client certificate for a plaintext endpoint");
            }
            return Ok(None);
        }

        let parsed = endpoint_for(&uri)?;
        let domain = parsed.uri().host().unwrap_or_default().to_string();

        let mut tls = ClientTlsConfig::new()
            .with_native_roots()
            .domain_name(domain);

        if let Some(source) = &endpoint.cert_source {
            let (cert, key) = source
                .load()
                .inspect_err(|err| warn!(error = %err, "client certificate source failed"))?;
            validate_pem(&cert, &key)?;
            tls = tls.identity(Identity::from_pem(cert, key));
            debug!(endpoint = %uri, "presenting client certificate");
        }

        Ok(Some(tls))
    }

    /// Resolves credentials, then TLS, then connects.
    pub async fn build(&self, config: &ResolvedConfig) -> Result<Transport, TransportError> {
        let credentials = self.credentials(config)?;
        let tls = self.tls_config(&config.endpoint)?;

        let uri = config.endpoint.uri();
        let mut endpoint = endpoint_for(&uri)?;
        if let Some(tls) = tls {
            endpoint = endpoint.tls_config(tls).map_err(TransportError::Tls)?;
        }

        debug!(endpoint = %uri, "connecting");
        let channel = endpoint
            .connect()
            .await
            .map_err(|source| TransportError::Connect {
                endpoint: uri.clone(),
                source,
            })?;
        info!(endpoint = %uri, "connected");

        let quota_project_id = quota_project_id(config, &credentials);
        Ok(Transport::new(
            channel,
            config.endpoint.host.clone(),
            credentials,
            quota_project_id,
        ))
    }
}

// The quota project recorded with the credentials applies when none was configured.
fn quota_project_id(config: &ResolvedConfig, credentials: &Credentials) -> Option<String> {
    config
        .quota_project_id
        .clone()
        .or_else(|| credentials.quota_project_id().map(str::to_string))
}

fn endpoint_for(uri: &str) -> Result<Endpoint, TransportError> {
    Endpoint::from_shared(uri.to_string()).map_err(|source| TransportError::InvalidUri {
        endpoint: uri.to_string(),
        source,
    })
}

fn validate_pem(cert: &[u8], key: &[u8]) -> Result<(), TransportError> {
    let certs = rustls_pemfile::certs(&mut &cert[..])
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TransportError::MalformedCertificate(e.to_string()))?;
    if certs.is_empty() {
        return Err(TransportError::MalformedCertificate(
            "no PEM certificate found".to_string(),
        ));
    }

    match rustls_pemfile::private_key(&mut &key[..]) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(TransportError::MalformedCertificate(
            "no PEM private key found".to_string(),
        )),
        Err(e) => Err(TransportError::MalformedCertificate(e.to_string())),
    }
}

/// The metadata attached to every call of a client.
///
/// The credential header is produced per call so token sources may refresh.
#[derive(Debug, Clone)]
pub struct CallMetadata {
    credentials: Credentials,
    headers: Vec<(String, String)>,
}

impl CallMetadata {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn resolve(&self) -> Result<Vec<(String, String)>, CredentialsError> {
        let auth = self.credentials.auth_header()?;
        Ok(auth
            .to_metadata()
            .into_iter()
            .chain(self.headers.iter().cloned())
            .collect())
    }
}

/// A channel bound to its endpoint and credentials.
#[derive(Debug)]
pub struct Transport<S = Channel> {
    service: Option<S>,
    host: String,
    credentials: Credentials,
    quota_project_id: Option<String>,
}

impl<S> Transport<S> {
    pub fn new(
        service: S,
        host: impl Into<String>,
        credentials: Credentials,
        quota_project_id: Option<String>,
    ) -> Self {
        Self {
            service: Some(service),
            host: host.into(),
            credentials,
            quota_project_id,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn quota_project_id(&self) -> Option<&str> {
        self.quota_project_id.as_deref()
    }

    /// The underlying service, or [`TransportError::Closed`] after [`Transport::close`].
    pub fn service(&self) -> Result<&S, TransportError> {
        self.service.as_ref().ok_or(TransportError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.service.is_none()
    }

    /// Releases the channel. Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.service.take().is_some() {
            info!(host = %self.host, "transport closed");
        }
    }

    /// The per-client metadata: credentials, quota project and library identification.
    pub fn metadata(&self) -> CallMetadata {
        let metadata = CallMetadata::new(self.credentials.clone())
            .with_header(API_CLIENT_HEADER, API_CLIENT_VERSION);

        match &self.quota_project_id {
            Some(project) => metadata.with_header(USER_PROJECT_HEADER, project.clone()),
            None => metadata,
        }
    }
}
