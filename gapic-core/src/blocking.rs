//! # Blocking client
//!
//! A synchronous facade over [`crate::GapicClient`]. It owns a multi-threaded tokio runtime that
//! keeps the channel alive; calls block the current thread until they complete.
//!
//! Do not create or drop this client from within an async context.
use crate::{
    client::{CallError, ClientBuildError, ClientBuilder, MethodPageSource},
    pager::Pager,
    request::RequestInput,
};
use tokio::runtime::Runtime;
use tonic::transport::Channel;

pub struct GapicClient {
    runtime: Runtime,
    inner: crate::GapicClient<Channel>,
}

impl GapicClient {
    /// Starts a runtime and connects the client described by `builder`.
    pub fn connect(builder: ClientBuilder) -> Result<Self, ClientBuildError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(ClientBuildError::Runtime)?;

        let inner = runtime.block_on(builder.connect())?;
        Ok(Self { runtime, inner })
    }

    pub fn inner(&self) -> &crate::GapicClient<Channel> {
        &self.inner
    }

    pub fn call(&self, method: &str, input: RequestInput) -> Result<serde_json::Value, CallError> {
        self.runtime.block_on(self.inner.call(method, input))
    }

    /// Starts a paged call. The first page is fetched before returning.
    pub fn list(
        &self,
        method: &str,
        input: RequestInput,
    ) -> Result<Pager<MethodPageSource<Channel>>, CallError> {
        let pager = self.runtime.block_on(self.inner.list(method, input))?;
        Ok(Pager::from_async(pager, Some(self.runtime.handle().clone())))
    }

    pub fn close(&mut self) {
        self.inner.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}
