use super::{
    ClientOptions, ConfigError, EnvironmentSignals, MtlsMode, ServiceDefaults, endpoint_uri,
};
use crate::credentials::{CertSource, CredentialProvider, Credentials};
use std::{path::PathBuf, sync::Arc};
use tracing::debug;

/// Where the credentials of a client come from. Exactly one source is ever selected.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    Explicit(Credentials),
    File(PathBuf),
    ApiKey(String),
    /// Application default credentials, discovered through the [`CredentialProvider`].
    Ambient,
}

/// The endpoint a client talks to and the client certificate it presents, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEndpoint {
    pub host: String,
    pub cert_source: Option<CertSource>,
}

impl ResolvedEndpoint {
    /// The URI the channel connects to.
    pub fn uri(&self) -> String {
        endpoint_uri(&self.host)
    }
}

/// Everything needed to build a transport. Produced once per client and never mutated.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub endpoint: ResolvedEndpoint,
    pub credentials: CredentialSource,
    pub scopes: Option<Vec<String>>,
    pub default_scopes: Vec<String>,
    pub quota_project_id: Option<String>,
}

impl ResolvedConfig {
    /// The user scopes when given, the service defaults otherwise.
    pub fn effective_scopes(&self) -> &[String] {
        self.scopes.as_deref().unwrap_or(&self.default_scopes)
    }
}

/// Resolves the effective endpoint, certificate and credential source of a client.
pub struct ConfigResolver {
    defaults: ServiceDefaults,
    env: EnvironmentSignals,
    provider: Arc<dyn CredentialProvider>,
}

impl ConfigResolver {
    pub fn new(
        defaults: ServiceDefaults,
        env: EnvironmentSignals,
        provider: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            defaults,
            env,
            provider,
        }
    }

    pub fn defaults(&self) -> &ServiceDefaults {
        &self.defaults
    }

    pub fn resolve(&self, options: &ClientOptions) -> Result<ResolvedConfig, ConfigError> {
        let credentials = credential_source(options)?;
        let endpoint = self.select_endpoint(options)?;

        Ok(ResolvedConfig {
            endpoint,
            credentials,
            scopes: options.scopes.clone(),
            default_scopes: self.defaults.scopes.clone(),
            quota_project_id: options.quota_project_id.clone(),
        })
    }

    /// Resolves the endpoint and client certificate only.
    pub fn resolve_endpoint(
        &self,
        options: &ClientOptions,
    ) -> Result<ResolvedEndpoint, ConfigError> {
        credential_source(options)?;
        self.select_endpoint(options)
    }

    fn select_endpoint(&self, options: &ClientOptions) -> Result<ResolvedEndpoint, ConfigError> {
        if let Some(api_endpoint) = &options.api_endpoint {
            let cert_source = if self.env.use_client_certificate()? {
                options.client_cert_source.clone()
            } else {
                None
            };

            let mtls = cert_source.is_some();
            debug!(host = %api_endpoint, mtls, "using explicit api endpoint");
            return Ok(ResolvedEndpoint {
                host: api_endpoint.clone(),
                cert_source,
            });
        }

        let mode = self.env.mtls_mode()?;
        let use_client_cert = self.env.use_client_certificate()?;

        let cert_source = if use_client_cert {
            options
                .client_cert_source
                .clone()
                .or_else(|| self.provider.default_client_cert_source())
        } else {
            None
        };

        let (host, cert_source) = match mode {
            MtlsMode::Never => (&self.defaults.endpoint, None),
            MtlsMode::Always => (&self.defaults.mtls_endpoint, cert_source),
            MtlsMode::Auto if cert_source.is_some() => (&self.defaults.mtls_endpoint, cert_source),
            MtlsMode::Auto => (&self.defaults.endpoint, None),
        };

        debug!(host = %host, ?mode, mtls = cert_source.is_some(), "resolved api endpoint");
        Ok(ResolvedEndpoint {
            host: host.clone(),
            cert_source,
        })
    }
}

fn credential_source(options: &ClientOptions) -> Result<CredentialSource, ConfigError> {
    let mut supplied = Vec::new();
    if options.credentials.is_some() {
        supplied.push("credentials");
    }
    if options.credentials_file.is_some() {
        supplied.push("credentials_file");
    }
    if options.api_key.is_some() {
        supplied.push("api_key");
    }

    if supplied.len() > 1 {
        return Err(ConfigError::DuplicateCredentialArgs(supplied));
    }

    let source = match (
        &options.credentials,
        &options.credentials_file,
        &options.api_key,
    ) {
        (Some(credentials), _, _) => CredentialSource::Explicit(credentials.clone()),
        (_, Some(path), _) => CredentialSource::File(path.clone()),
        (_, _, Some(key)) => CredentialSource::ApiKey(key.clone()),
        _ => CredentialSource::Ambient,
    };

    Ok(source)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::credentials::CredentialsError;

    const DEFAULT_ENDPOINT: &str = "foo.googleapis.com";
    const DEFAULT_MTLS_ENDPOINT: &str = "foo.mtls.googleapis.com";

    struct FakeProvider {
        cert_source: Option<CertSource>,
    }

    impl CredentialProvider for FakeProvider {
        fn default_credentials(
            &self,
            _scopes: &[String],
            _quota_project_id: Option<&str>,
        ) -> Result<Credentials, CredentialsError> {
            Ok(Credentials::anonymous())
        }

        fn default_client_cert_source(&self) -> Option<CertSource> {
            self.cert_source.clone()
        }
    }

    fn resolver(env: EnvironmentSignals, ambient_cert: Option<CertSource>) -> ConfigResolver {
        ConfigResolver::new(
            ServiceDefaults::new(DEFAULT_ENDPOINT),
            env,
            Arc::new(FakeProvider {
                cert_source: ambient_cert,
            }),
        )
    }

    fn env(mtls: &str, client_cert: &str) -> EnvironmentSignals {
        EnvironmentSignals::default()
            .with_mtls_endpoint(mtls)
            .with_client_certificate(client_cert)
    }

    fn cert() -> CertSource {
        CertSource::from_pem("cert bytes", "key bytes")
    }

    #[test]
    fn test_explicit_endpoint_wins_for_every_environment() {
        for mtls in ["never", "auto", "always"] {
            for client_cert in ["true", "false"] {
                let options = ClientOptions::default()
                    .with_api_endpoint("squid.clam.whelk")
                    .with_client_cert_source(cert());

                let endpoint = resolver(env(mtls, client_cert), Some(cert()))
                    .resolve_endpoint(&options)
                    .unwrap();

                assert_eq!(endpoint.host, "squid.clam.whelk");
            }
        }
    }

    #[test]
    fn test_explicit_endpoint_ignores_mtls_mode_value() {
        let options = ClientOptions::default().with_api_endpoint("squid.clam.whelk");
        let env = EnvironmentSignals::default().with_mtls_endpoint("Unsupported");

        let endpoint = resolver(env, None).resolve_endpoint(&options).unwrap();

        assert_eq!(endpoint.host, "squid.clam.whelk");
    }

    #[test]
    fn test_explicit_endpoint_cert_gated_by_client_certificate_signal() {
        let source = cert();
        let options = ClientOptions::default()
            .with_api_endpoint("foo")
            .with_client_cert_source(source.clone());

        let enabled = EnvironmentSignals::default().with_client_certificate("true");
        let with_cert = resolver(enabled, None).resolve_endpoint(&options).unwrap();
        assert_eq!(with_cert.cert_source, Some(source));

        let disabled = EnvironmentSignals::default().with_client_certificate("false");
        let without_cert = resolver(disabled, None)
            .resolve_endpoint(&options)
            .unwrap();
        assert_eq!(without_cert.cert_source, None);
    }

    #[test]
    fn test_never_uses_default_endpoint_even_with_cert() {
        let options = ClientOptions::default().with_client_cert_source(cert());

        let endpoint = resolver(env("never", "true"), Some(cert()))
            .resolve_endpoint(&options)
            .unwrap();

        assert_eq!(endpoint.host, DEFAULT_ENDPOINT);
        assert_eq!(endpoint.cert_source, None);
    }

    #[test]
    fn test_always_uses_mtls_endpoint() {
        let endpoint = resolver(env("always", "false"), None)
            .resolve_endpoint(&ClientOptions::default())
            .unwrap();

        assert_eq!(endpoint.host, DEFAULT_MTLS_ENDPOINT);
        assert_eq!(endpoint.cert_source, None);
    }

    #[test]
    fn test_always_with_cert_keeps_the_cert_source() {
        let source = cert();
        let options = ClientOptions::default().with_client_cert_source(source.clone());

        let endpoint = resolver(env("always", "true"), None)
            .resolve_endpoint(&options)
            .unwrap();

        assert_eq!(endpoint.host, DEFAULT_MTLS_ENDPOINT);
        assert_eq!(endpoint.cert_source, Some(source));
    }

    #[test]
    fn test_auto_without_cert_uses_default_endpoint() {
        let endpoint = resolver(env("auto", "true"), None)
            .resolve_endpoint(&ClientOptions::default())
            .unwrap();

        assert_eq!(endpoint.host, DEFAULT_ENDPOINT);
        assert_eq!(endpoint.cert_source, None);
    }

    #[test]
    fn test_auto_with_discovered_cert_uses_mtls_endpoint() {
        let discovered = cert();

        let endpoint = resolver(env("auto", "true"), Some(discovered.clone()))
            .resolve_endpoint(&ClientOptions::default())
            .unwrap();

        assert_eq!(endpoint.host, DEFAULT_MTLS_ENDPOINT);
        assert_eq!(endpoint.cert_source, Some(discovered));
    }

    #[test]
    fn test_auto_prefers_explicit_cert_over_discovered_one() {
        let explicit = cert();
        let options = ClientOptions::default().with_client_cert_source(explicit.clone());

        let endpoint = resolver(env("auto", "true"), Some(cert()))
            .resolve_endpoint(&options)
            .unwrap();

        assert_eq!(endpoint.host, DEFAULT_MTLS_ENDPOINT);
        assert_eq!(endpoint.cert_source, Some(explicit));
    }

    #[test]
    fn test_auto_ignores_cert_when_client_certificate_is_false() {
        let options = ClientOptions::default().with_client_cert_source(cert());

        let endpoint = resolver(env("auto", "false"), Some(cert()))
            .resolve_endpoint(&options)
            .unwrap();

        assert_eq!(endpoint.host, DEFAULT_ENDPOINT);
        assert_eq!(endpoint.cert_source, None);
    }

    #[test]
    fn test_unsupported_environment_values_fail() {
        let options = ClientOptions::default();

        let mtls = resolver(
            EnvironmentSignals::default().with_mtls_endpoint("Unsupported"),
            None,
        )
        .resolve(&options);
        assert!(matches!(mtls, Err(ConfigError::UnsupportedMtlsEndpoint(v)) if v == "Unsupported"));

        let client_cert = resolver(
            EnvironmentSignals::default().with_client_certificate("Unsupported"),
            None,
        )
        .resolve(&options);
        assert!(matches!(
            client_cert,
            Err(ConfigError::UnsupportedClientCertificate(v)) if v == "Unsupported"
        ));
    }

    #[test]
    fn test_duplicate_credentials_are_rejected() {
        let options = ClientOptions::default()
            .with_credentials(Credentials::anonymous())
            .with_credentials_file("credentials.json");

        let result = resolver(EnvironmentSignals::default(), None).resolve(&options);

        assert_eq!(
            result.unwrap_err(),
            ConfigError::DuplicateCredentialArgs(vec!["credentials", "credentials_file"])
        );
    }

    #[test]
    fn test_api_key_with_credentials_is_rejected() {
        let options = ClientOptions::default()
            .with_api_key("api_key")
            .with_credentials(Credentials::anonymous());

        let result = resolver(EnvironmentSignals::default(), None).resolve_endpoint(&options);

        assert!(matches!(
            result,
            Err(ConfigError::DuplicateCredentialArgs(_))
        ));
    }

    #[test]
    fn test_credential_source_selection() {
        let resolver = resolver(EnvironmentSignals::default(), None);

        let ambient = resolver.resolve(&ClientOptions::default()).unwrap();
        assert!(matches!(ambient.credentials, CredentialSource::Ambient));

        let file_options = ClientOptions::default().with_credentials_file("credentials.json");
        let file = resolver.resolve(&file_options).unwrap();
        assert!(matches!(
            file.credentials,
            CredentialSource::File(p) if p == PathBuf::from("credentials.json")
        ));

        let key = resolver
            .resolve(&ClientOptions::default().with_api_key("api_key"))
            .unwrap();
        assert!(matches!(key.credentials, CredentialSource::ApiKey(k) if k == "api_key"));
    }

    #[test]
    fn test_scopes_fall_back_to_service_defaults() {
        let resolver = ConfigResolver::new(
            ServiceDefaults::new(DEFAULT_ENDPOINT).with_scopes(["scope.default"]),
            EnvironmentSignals::default(),
            Arc::new(FakeProvider { cert_source: None }),
        );

        let defaulted = resolver.resolve(&ClientOptions::default()).unwrap();
        assert_eq!(defaulted.effective_scopes(), ["scope.default".to_string()]);

        let explicit = resolver
            .resolve(&ClientOptions::default().with_scopes(["1", "2"]))
            .unwrap();
        assert_eq!(
            explicit.effective_scopes(),
            ["1".to_string(), "2".to_string()]
        );
    }

    #[test]
    fn test_quota_project_is_carried_over() {
        let config = resolver(EnvironmentSignals::default(), None)
            .resolve(&ClientOptions::default().with_quota_project_id("octopus"))
            .unwrap();

        assert_eq!(config.quota_project_id.as_deref(), Some("octopus"));
        assert_eq!(config.endpoint.host, DEFAULT_ENDPOINT);
    }
}
