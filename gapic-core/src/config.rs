//! # Client Configuration
//!
//! Configuration is layered. From highest to lowest precedence:
//!
//! 1. **[`ClientOptions`]**: explicit overrides passed by the caller (or loaded from JSON).
//! 2. **[`EnvironmentSignals`]**: `GOOGLE_API_USE_MTLS_ENDPOINT` and
//!    `GOOGLE_API_USE_CLIENT_CERTIFICATE`.
//! 3. **Ambient discovery**: application default credentials and client certificates, reached
//!    through a [`crate::credentials::CredentialProvider`].
//!
//! [`ConfigResolver`] folds the three layers into a [`ResolvedConfig`] once per client.
mod endpoint;
mod env;
mod resolver;

pub use endpoint::{default_mtls_endpoint, endpoint_uri};
pub use env::{
    EnvironmentSignals, MtlsMode, USE_CLIENT_CERTIFICATE_ENV, USE_MTLS_ENDPOINT_ENV,
};
pub use resolver::{ConfigResolver, CredentialSource, ResolvedConfig, ResolvedEndpoint};

use crate::credentials::{CertSource, Credentials};
use serde::Deserialize;
use std::path::PathBuf;

/// Errors caused by invalid or contradictory configuration.
///
/// These are raised while a client is being constructed and are never retried.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "Duplicate credential args: only one of {} may be provided",
        .0.join(", ")
    )]
    DuplicateCredentialArgs(Vec<&'static str>),
    #[error(
        "Unsupported GOOGLE_API_USE_MTLS_ENDPOINT value '{0}'. Accepted values: never, auto, always"
    )]
    UnsupportedMtlsEndpoint(String),
    #[error(
        "Unsupported GOOGLE_API_USE_CLIENT_CERTIFICATE value '{0}'. Accepted values: true, false"
    )]
    UnsupportedClientCertificate(String),
}

/// Endpoint and scope defaults baked into a generated client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefaults {
    pub endpoint: String,
    pub mtls_endpoint: String,
    pub scopes: Vec<String>,
}

impl ServiceDefaults {
    /// Defaults for `endpoint`, deriving the mTLS endpoint from it.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let mtls_endpoint = default_mtls_endpoint(&endpoint);
        Self {
            endpoint,
            mtls_endpoint,
            scopes: Vec::new(),
        }
    }

    pub fn with_mtls_endpoint(mut self, mtls_endpoint: impl Into<String>) -> Self {
        self.mtls_endpoint = mtls_endpoint.into();
        self
    }

    pub fn with_scopes<I, T>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }
}

/// User supplied overrides.
///
/// `client_cert_source` and `credentials` are capabilities and can only be set in code; every
/// other field can also be loaded from JSON with [`ClientOptions::from_json`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientOptions {
    pub api_endpoint: Option<String>,
    #[serde(skip)]
    pub client_cert_source: Option<CertSource>,
    #[serde(skip)]
    pub credentials: Option<Credentials>,
    pub credentials_file: Option<PathBuf>,
    pub scopes: Option<Vec<String>>,
    pub quota_project_id: Option<String>,
    pub api_key: Option<String>,
}

impl ClientOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_api_endpoint(mut self, api_endpoint: impl Into<String>) -> Self {
        self.api_endpoint = Some(api_endpoint.into());
        self
    }

    pub fn with_client_cert_source(mut self, source: CertSource) -> Self {
        self.client_cert_source = Some(source);
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    pub fn with_scopes<I, T>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_quota_project_id(mut self, quota_project_id: impl Into<String>) -> Self {
        self.quota_project_id = Some(quota_project_id.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}
