//! # Gapic Core
//!
//! `gapic-core` is the orchestration layer shared by generated gRPC API clients. It owns the two
//! pieces of such a client that hold actual decisions or state:
//!
//! * **Endpoint and credential resolution**: [`config::ConfigResolver`] turns [`ClientOptions`],
//!   environment signals and ambient discovery into a [`config::ResolvedConfig`], and
//!   [`transport::TransportFactory`] turns that into a cached channel.
//! * **Pagination**: [`pager::AsyncPager`] and [`pager::Pager`] wrap a single-page fetch into a
//!   lazy, forward-only sequence of items or raw pages.
//!
//! ## Key Components
//!
//! * **[`GapicClient`]:** The main entry point. It resolves configuration, builds the transport and
//!   dispatches JSON requests to methods resolved from a `DescriptorPool`.
//! * **[`RequestInput`]:** A validated request: either a full request object or a set of
//!   flattened fields, never both.
//! * **[`blocking::GapicClient`]:** The same client driven from synchronous code.
//!
//! ## Internal clients
//!
//! * **[`GrpcClient`]:** A dynamic unary gRPC client using a custom JSON codec. It plays the role
//!   of the method invoker behind every call.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-reflect`, and `tonic` to ensure that consumers
//! use compatible versions of these underlying dependencies.
pub mod blocking;
pub mod client;
pub mod config;
pub mod credentials;
pub mod grpc;
pub mod pager;
pub mod request;
pub mod transport;

pub use client::{ClientBuilder, GapicClient};
pub use config::ClientOptions;
pub use credentials::Credentials;
pub use grpc::client::GrpcClient;
pub use request::RequestInput;

// Re-exports
pub use prost;
pub use prost_reflect;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
