//! # Credentials
//!
//! Credentials are opaque to the rest of the crate: all a transport needs from them is the
//! metadata header to attach to each call. A [`Credentials`] value is a cheap, clonable handle
//! over a [`TokenSource`].
//!
//! Where credentials come from is decided by [`crate::config::ConfigResolver`]: exactly one of an
//! explicit object, a credentials file, an API key or ambient discovery. Ambient discovery and
//! file loading are delegated to a [`CredentialProvider`], which tests replace with fakes.
mod cert;
mod provider;

pub use cert::{CertSource, CertSourceError, CertificateConfig};
pub use provider::{
    AmbientCredentialProvider, CERTIFICATE_CONFIG_ENV, CREDENTIALS_ENV, CredentialProvider,
    CredentialsFile,
};

use std::{fmt, path::PathBuf, sync::Arc};

/// Errors raised while producing or loading credentials.
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    #[error("Failed to read credentials file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Credentials file '{}' is not valid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(
        "Credentials file '{}' of type '{kind}' does not carry an access token",
        path.display()
    )]
    UnsupportedType { path: PathBuf, kind: String },
    #[error(
        "Could not automatically determine credentials. Set GOOGLE_APPLICATION_CREDENTIALS or pass credentials explicitly"
    )]
    DefaultCredentialsNotFound,
    #[error("Failed to obtain a token: {0}")]
    Token(String),
}

/// The metadata a set of credentials contributes to an outgoing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthHeader {
    Bearer(String),
    ApiKey(String),
    None,
}

impl AuthHeader {
    /// Returns the `(key, value)` metadata pair, if any.
    pub fn to_metadata(&self) -> Option<(String, String)> {
        match self {
            AuthHeader::Bearer(token) => {
                Some(("authorization".to_string(), format!("Bearer {token}")))
            }
            AuthHeader::ApiKey(key) => Some(("x-goog-api-key".to_string(), key.clone())),
            AuthHeader::None => None,
        }
    }
}

/// Anything able to authorize a call.
///
/// Implementations are called once per call and may refresh tokens internally.
pub trait TokenSource: Send + Sync {
    fn auth_header(&self) -> Result<AuthHeader, CredentialsError>;
}

#[derive(Debug)]
struct StaticHeader(AuthHeader);

impl TokenSource for StaticHeader {
    fn auth_header(&self) -> Result<AuthHeader, CredentialsError> {
        Ok(self.0.clone())
    }
}

/// Opaque, token-bearing credentials shared by every call of a client.
#[derive(Clone)]
pub struct Credentials {
    source: Arc<dyn TokenSource>,
    kind: &'static str,
    quota_project_id: Option<String>,
}

impl Credentials {
    /// Wraps a custom token source.
    pub fn new(source: impl TokenSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
            kind: "custom",
            quota_project_id: None,
        }
    }

    /// Credentials attaching a fixed OAuth2 access token.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            source: Arc::new(StaticHeader(AuthHeader::Bearer(token.into()))),
            kind: "bearer",
            quota_project_id: None,
        }
    }

    /// Credentials attaching an API key.
    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            source: Arc::new(StaticHeader(AuthHeader::ApiKey(key.into()))),
            kind: "api_key",
            quota_project_id: None,
        }
    }

    /// Credentials attaching nothing. Useful against local emulators.
    pub fn anonymous() -> Self {
        Self {
            source: Arc::new(StaticHeader(AuthHeader::None)),
            kind: "anonymous",
            quota_project_id: None,
        }
    }

    /// Attaches the project billed for calls made with these credentials.
    pub fn with_quota_project_id(mut self, project: impl Into<String>) -> Self {
        self.quota_project_id = Some(project.into());
        self
    }

    pub fn quota_project_id(&self) -> Option<&str> {
        self.quota_project_id.as_deref()
    }

    pub fn auth_header(&self) -> Result<AuthHeader, CredentialsError> {
        self.source.auth_header()
    }

    /// Returns `true` if both handles share the same underlying token source.
    pub fn ptr_eq(&self, other: &Credentials) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("kind", &self.kind)
            .field("quota_project_id", &self.quota_project_id)
            .finish_non_exhaustive()
    }
}
