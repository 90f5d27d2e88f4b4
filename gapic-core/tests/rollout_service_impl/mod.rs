#![allow(dead_code)]

use rollout_service::ServiceManager;
use rollout_service::pb::{
    GetServiceRolloutRequest, ListServiceRolloutsRequest, ListServiceRolloutsResponse, Rollout,
    rollout::RolloutStatus,
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tonic::{Request, Response, Status, metadata::MetadataMap};

/// What the service saw of one incoming call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub service_name: String,
    pub page_token: String,
    pub metadata: MetadataMap,
}

/// Serves scripted pages keyed by the incoming page token.
#[derive(Clone, Default)]
pub struct ScriptedRollouts {
    pages: HashMap<String, Result<(Vec<&'static str>, &'static str), Status>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ScriptedRollouts {
    /// `[a,b,c]/"t1"`, `[]/"t2"`, `[d]/"t3"`, `[e,f]/""`
    pub fn four_pages() -> Self {
        Self::default()
            .page("", &["a", "b", "c"], "t1")
            .page("t1", &[], "t2")
            .page("t2", &["d"], "t3")
            .page("t3", &["e", "f"], "")
    }

    pub fn page(mut self, token: &str, ids: &[&'static str], next: &'static str) -> Self {
        self.pages.insert(token.to_string(), Ok((ids.to_vec(), next)));
        self
    }

    pub fn failing_page(mut self, token: &str, status: Status) -> Self {
        self.pages.insert(token.to_string(), Err(status));
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<RecordedCall>>> {
        self.calls.clone()
    }

    fn record(&self, service_name: &str, page_token: &str, metadata: &MetadataMap) {
        self.calls.lock().unwrap().push(RecordedCall {
            service_name: service_name.to_string(),
            page_token: page_token.to_string(),
            metadata: metadata.clone(),
        });
    }
}

fn rollout(service_name: &str, id: &str) -> Rollout {
    Rollout {
        rollout_id: id.to_string(),
        created_by: "release-bot@example.com".to_string(),
        status: RolloutStatus::Success as i32,
        service_name: service_name.to_string(),
    }
}

#[tonic::async_trait]
impl ServiceManager for ScriptedRollouts {
    async fn list_service_rollouts(
        &self,
        request: Request<ListServiceRolloutsRequest>,
    ) -> Result<Response<ListServiceRolloutsResponse>, Status> {
        let metadata = request.metadata().clone();
        let request = request.into_inner();
        self.record(&request.service_name, &request.page_token, &metadata);

        match self.pages.get(&request.page_token) {
            Some(Ok((ids, next))) => Ok(Response::new(ListServiceRolloutsResponse {
                rollouts: ids
                    .iter()
                    .map(|id| rollout(&request.service_name, id))
                    .collect(),
                next_page_token: next.to_string(),
            })),
            Some(Err(status)) => Err(status.clone()),
            None => Err(Status::invalid_argument(format!(
                "unknown page token '{}'",
                request.page_token
            ))),
        }
    }

    async fn get_service_rollout(
        &self,
        request: Request<GetServiceRolloutRequest>,
    ) -> Result<Response<Rollout>, Status> {
        let metadata = request.metadata().clone();
        let request = request.into_inner();
        self.record(&request.service_name, "", &metadata);

        if request.rollout_id == "missing" {
            return Err(Status::not_found("rollout not found"));
        }

        Ok(Response::new(rollout(&request.service_name, &request.rollout_id)))
    }
}
