use super::ConfigError;
use std::str::FromStr;

pub const USE_MTLS_ENDPOINT_ENV: &str = "GOOGLE_API_USE_MTLS_ENDPOINT";
pub const USE_CLIENT_CERTIFICATE_ENV: &str = "GOOGLE_API_USE_CLIENT_CERTIFICATE";

/// When the mutual TLS endpoint may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MtlsMode {
    Never,
    /// Use the mTLS endpoint only when a client certificate is available.
    #[default]
    Auto,
    Always,
}

impl FromStr for MtlsMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "never" => Ok(MtlsMode::Never),
            "auto" => Ok(MtlsMode::Auto),
            "always" => Ok(MtlsMode::Always),
            other => Err(ConfigError::UnsupportedMtlsEndpoint(other.to_string())),
        }
    }
}

/// Raw values of the environment variables steering endpoint selection.
///
/// Values are kept unparsed so that an unsupported value is only reported by the resolver,
/// and only on the code paths that actually read it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSignals {
    pub use_mtls_endpoint: Option<String>,
    pub use_client_certificate: Option<String>,
}

impl EnvironmentSignals {
    /// Captures the signals from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Captures the signals through an arbitrary lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            use_mtls_endpoint: lookup(USE_MTLS_ENDPOINT_ENV),
            use_client_certificate: lookup(USE_CLIENT_CERTIFICATE_ENV),
        }
    }

    pub fn with_mtls_endpoint(mut self, value: impl Into<String>) -> Self {
        self.use_mtls_endpoint = Some(value.into());
        self
    }

    pub fn with_client_certificate(mut self, value: impl Into<String>) -> Self {
        self.use_client_certificate = Some(value.into());
        self
    }

    pub fn mtls_mode(&self) -> Result<MtlsMode, ConfigError> {
        self.use_mtls_endpoint
            .as_deref()
            .map_or(Ok(MtlsMode::default()), str::parse)
    }

    pub fn use_client_certificate(&self) -> Result<bool, ConfigError> {
        match self.use_client_certificate.as_deref() {
            None | Some("false") => Ok(false),
            Some("true") => Ok(true),
            Some(other) => Err(ConfigError::UnsupportedClientCertificate(
                other.to_string(),
            )),
        }
    }
}
