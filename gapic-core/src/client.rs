//! # Gapic Client
//!
//! [`GapicClient`] is what a generated API client is built on. Construction resolves the
//! configuration and connects the transport exactly once:
//!
//! 1. [`ConfigResolver`] folds [`ClientOptions`], [`EnvironmentSignals`] and ambient discovery
//!    into a [`ResolvedConfig`], or fails with a [`ConfigError`] before anything is built.
//! 2. [`TransportFactory`] loads credentials and the client certificate and connects a channel.
//!
//! Methods are resolved by path (`package.Service/Method`) from a `DescriptorPool`, so one client
//! type serves every API whose descriptors are available.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gapic_core::{GapicClient, RequestInput, config::ServiceDefaults};
//! use gapic_core::prost_reflect::DescriptorPool;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DescriptorPool::decode(std::fs::read("descriptor.bin")?.as_slice())?;
//! let defaults = ServiceDefaults::new("servicemanagement.googleapis.com");
//!
//! let client = GapicClient::builder(defaults, pool).connect().await?;
//!
//! let input = RequestInput::fields([("serviceName", serde_json::json!("my-service"))]);
//! let mut rollouts = client
//!     .list("google.api.servicemanagement.v1.ServiceManager/ListServiceRollouts", input)
//!     .await?;
//!
//! while let Some(rollout) = rollouts.next().await {
//!     println!("{}", rollout?);
//! }
//! # Ok(())
//! # }
//! ```
mod paged;

pub use paged::MethodPageSource;

use crate::{
    BoxError,
    config::{
        ClientOptions, ConfigError, ConfigResolver, EnvironmentSignals, ResolvedConfig,
        ServiceDefaults,
    },
    credentials::{AmbientCredentialProvider, CredentialProvider, Credentials, CredentialsError},
    grpc::client::{GrpcClient, GrpcRequestError},
    pager::AsyncPager,
    request::{FieldSet, InvalidArgument, RequestInput, routing_header},
    transport::{CallMetadata, Transport, TransportError, TransportFactory},
};
use http_body::Body as HttpBody;
use prost_reflect::{DescriptorPool, MethodDescriptor};
use std::sync::Arc;
use tonic::transport::Channel;
use tracing::{debug, info};

/// Errors that abort client construction. No partially built client is ever returned.
#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error("Invalid client configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to build the transport: {0}")]
    Transport(#[from] TransportError),
    #[error("Failed to start the client runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Errors of a single call, unary or paged.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),
    #[error("Invalid method path '{0}', expected 'package.Service/Method'")]
    InvalidMethodPath(String),
    #[error("Service '{0}' not found")]
    ServiceNotFound(String),
    #[error("Method '{0}' not found")]
    MethodNotFound(String),
    #[error("Method '{0}' does not return paged results")]
    NotPaginated(String),
    #[error("Method '{0}' is a streaming method")]
    Streaming(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Failed to authorize the call: {0}")]
    Credentials(#[from] CredentialsError),
    #[error("gRPC client request error: '{0}'")]
    Request(#[from] GrpcRequestError),
    #[error("gRPC call failed with status {}: {}", .0.code(), .0.message())]
    Status(Box<tonic::Status>),
}

impl From<tonic::Status> for CallError {
    fn from(status: tonic::Status) -> Self {
        CallError::Status(Box::new(status))
    }
}

impl CallError {
    /// The status returned by the server, if the call got that far.
    pub fn status(&self) -> Option<&tonic::Status> {
        match self {
            CallError::Status(status) => Some(status),
            _ => None,
        }
    }
}

/// Collects everything needed to construct a [`GapicClient`].
pub struct ClientBuilder {
    defaults: ServiceDefaults,
    pool: DescriptorPool,
    options: ClientOptions,
    env: Option<EnvironmentSignals>,
    provider: Option<Arc<dyn CredentialProvider>>,
}

impl ClientBuilder {
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Overrides the environment signals, captured from the process environment otherwise.
    pub fn environment(mut self, env: EnvironmentSignals) -> Self {
        self.env = Some(env);
        self
    }

    /// Overrides ambient discovery, [`AmbientCredentialProvider::from_env`] otherwise.
    pub fn credential_provider(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    fn provider(&self) -> Arc<dyn CredentialProvider> {
        self.provider
            .clone()
            .unwrap_or_else(|| Arc::new(AmbientCredentialProvider::from_env()))
    }

    /// Resolves the configuration without building anything.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        let env = self.env.clone().unwrap_or_else(EnvironmentSignals::from_env);
        ConfigResolver::new(self.defaults.clone(), env, self.provider())
            .resolve(&self.options)
    }

    /// Resolves the configuration and connects the transport.
    pub async fn connect(self) -> Result<GapicClient, ClientBuildError> {
        let config = self.resolve()?;
        let transport = TransportFactory::new(self.provider())
            .build(&config)
            .await?;

        info!(host = %transport.host(), "client connected");
        Ok(GapicClient::from_transport(transport, self.pool))
    }
}

/// A client for any API described by its descriptor pool.
#[derive(Debug)]
pub struct GapicClient<S = Channel> {
    transport: Transport<S>,
    pool: DescriptorPool,
}

impl GapicClient<Channel> {
    pub fn builder(defaults: ServiceDefaults, pool: DescriptorPool) -> ClientBuilder {
        ClientBuilder {
            defaults,
            pool,
            options: ClientOptions::default(),
            env: None,
            provider: None,
        }
    }
}

impl<S> GapicClient<S> {
    /// Wraps an already built transport.
    pub fn from_transport(transport: Transport<S>, pool: DescriptorPool) -> Self {
        Self { transport, pool }
    }

    /// Creates a client over any `GrpcService`, such as an in-process tonic server.
    ///
    /// The client is anonymous and no configuration is resolved.
    pub fn from_service(service: S, pool: DescriptorPool) -> Self {
        let transport = Transport::new(service, "in-process", Credentials::anonymous(), None);
        Self::from_transport(transport, pool)
    }

    pub fn transport(&self) -> &Transport<S> {
        &self.transport
    }

    pub fn descriptor_pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// Looks up a method by its `package.Service/Method` path.
    pub fn method(&self, path: &str) -> Result<MethodDescriptor, CallError> {
        let (service, method) = path
            .trim_start_matches('/')
            .split_once('/')
            .filter(|(service, method)| !service.is_empty() && !method.is_empty())
            .ok_or_else(|| CallError::InvalidMethodPath(path.to_string()))?;

        self.pool
            .get_service_by_name(service)
            .ok_or_else(|| CallError::ServiceNotFound(service.to_string()))?
            .methods()
            .find(|m| m.name() == method)
            .ok_or_else(|| CallError::MethodNotFound(path.to_string()))
    }

    /// Closes the transport. Calls made afterwards fail with [`TransportError::Closed`].
    pub fn close(&mut self) {
        self.transport.close();
    }

    pub fn is_closed(&self) -> bool {
        self.transport.is_closed()
    }
}

impl<S> GapicClient<S>
where
    S: tonic::client::GrpcService<tonic::body::Body> + Clone,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// Performs a unary call and returns the decoded response.
    pub async fn call(
        &self,
        method: &str,
        input: RequestInput,
    ) -> Result<serde_json::Value, CallError> {
        let method = self.unary_method(method)?;
        let request = input.into_value();
        let headers = self.call_metadata(&method, &request).resolve()?;
        let mut client = GrpcClient::new(self.transport.service()?.clone());

        debug!(method = %method.full_name(), "calling");
        let response = client.unary(&method, request, headers).await??;
        Ok(response)
    }

    /// Starts a paged call.
    ///
    /// The first page is fetched before returning, so an invalid initial request fails here.
    /// Later pages are fetched lazily while the returned pager is consumed.
    pub async fn list(
        &self,
        method: &str,
        input: RequestInput,
    ) -> Result<AsyncPager<MethodPageSource<S>>, CallError> {
        let method = self.unary_method(method)?;
        let request = input.into_value();
        let metadata = self.call_metadata(&method, &request);
        let client = GrpcClient::new(self.transport.service()?.clone());

        debug!(method = %method.full_name(), "listing");
        let source = MethodPageSource::new(client, method, request, metadata)?;
        AsyncPager::start(source).await
    }

    /// [`GapicClient::call`] taking an optional full request and flattened fields, the way
    /// generated methods receive them. Passing both fails before anything is sent.
    pub async fn call_with(
        &self,
        method: &str,
        request: Option<serde_json::Value>,
        fields: FieldSet,
    ) -> Result<serde_json::Value, CallError> {
        let input = RequestInput::build(request, fields)?;
        self.call(method, input).await
    }

    /// [`GapicClient::list`] taking an optional full request and flattened fields.
    pub async fn list_with(
        &self,
        method: &str,
        request: Option<serde_json::Value>,
        fields: FieldSet,
    ) -> Result<AsyncPager<MethodPageSource<S>>, CallError> {
        let input = RequestInput::build(request, fields)?;
        self.list(method, input).await
    }

    fn unary_method(&self, path: &str) -> Result<MethodDescriptor, CallError> {
        let method = self.method(path)?;
        if method.is_client_streaming() || method.is_server_streaming() {
            return Err(CallError::Streaming(path.to_string()));
        }
        Ok(method)
    }

    fn call_metadata(
        &self,
        method: &MethodDescriptor,
        request: &serde_json::Value,
    ) -> CallMetadata {
        let metadata = self.transport.metadata();
        match routing_header(&method.input(), request) {
            Some((key, value)) => metadata.with_header(key, value),
            None => metadata,
        }
    }
}
