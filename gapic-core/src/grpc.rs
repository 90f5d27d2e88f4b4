//! # Dynamic gRPC invocation
//!
//! The method invoker behind every client call. Requests and responses travel as
//! `serde_json::Value` and are transcoded to and from protobuf on the fly, using the method
//! descriptors of a `DescriptorPool`.
pub mod client;
pub mod codec;
