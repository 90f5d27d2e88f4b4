//! # Rollout Service
//!
//! **INTERNAL USE ONLY**: a trimmed-down Service Management API used to integration test
//! `gapic-core`. It exposes the generated server trait, its tonic server wrapper and the
//! encoded `FileDescriptorSet` the dynamic client resolves methods from.

pub mod pb {
    include!(concat!(env!("OUT_DIR"), "/google.api.servicemanagement.v1.rs"));
}

pub use pb::service_manager_server::{ServiceManager, ServiceManagerServer};
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("descriptors");

pub const LIST_SERVICE_ROLLOUTS: &str =
    "google.api.servicemanagement.v1.ServiceManager/ListServiceRollouts";
pub const GET_SERVICE_ROLLOUT: &str =
    "google.api.servicemanagement.v1.ServiceManager/GetServiceRollout";
