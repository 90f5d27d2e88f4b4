use futures_util::TryStreamExt;
use gapic_core::client::{CallError, GapicClient};
use gapic_core::prost_reflect::DescriptorPool;
use gapic_core::request::{FieldSet, RequestInput};
use gapic_core::transport::{TransportError, USER_PROJECT_HEADER};
use gapic_core::{Credentials, transport::Transport};
use rollout_service::{FILE_DESCRIPTOR_SET, LIST_SERVICE_ROLLOUTS, ServiceManagerServer};
use rollout_service_impl::ScriptedRollouts;
use serde_json::json;

mod rollout_service_impl;

fn client(service: ScriptedRollouts) -> GapicClient<ServiceManagerServer<ScriptedRollouts>> {
    let pool = DescriptorPool::decode(FILE_DESCRIPTOR_SET).unwrap();
    GapicClient::from_service(ServiceManagerServer::new(service), pool)
}

fn rollout_ids(items: &[serde_json::Value]) -> Vec<&str> {
    items
        .iter()
        .map(|item| item["rolloutId"].as_str().unwrap())
        .collect()
}

fn service_name(name: &str) -> RequestInput {
    RequestInput::fields([("serviceName", json!(name))])
}

#[tokio::test]
async fn test_list_flattens_items_across_pages() {
    let service = ScriptedRollouts::four_pages();
    let calls = service.calls();

    let items: Vec<_> = client(service)
        .list(LIST_SERVICE_ROLLOUTS, service_name("svc"))
        .await
        .unwrap()
        .into_stream()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(rollout_ids(&items), vec!["a", "b", "c", "d", "e", "f"]);
    assert_eq!(items[0]["serviceName"], "svc");
    assert_eq!(items[0]["status"], "SUCCESS");

    let tokens: Vec<_> = calls
        .lock()
        .unwrap()
        .iter()
        .map(|c| c.page_token.clone())
        .collect();
    assert_eq!(tokens, vec!["", "t1", "t2", "t3"]);
}

#[tokio::test]
async fn test_list_pages_expose_tokens() {
    let service = ScriptedRollouts::four_pages();
    let calls = service.calls();

    let pages: Vec<_> = client(service)
        .list(LIST_SERVICE_ROLLOUTS, service_name("svc"))
        .await
        .unwrap()
        .pages()
        .try_collect()
        .await
        .unwrap();

    let tokens: Vec<_> = pages.iter().map(|p| p.next_page_token.as_str()).collect();
    assert_eq!(tokens, vec!["t1", "t2", "t3", ""]);
    assert!(pages[1].items.is_empty());
    assert_eq!(calls.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn test_list_fetches_first_page_only_until_consumed() {
    let service = ScriptedRollouts::four_pages();
    let calls = service.calls();

    let mut pager = client(service)
        .list(LIST_SERVICE_ROLLOUTS, service_name("svc"))
        .await
        .unwrap();

    assert_eq!(pager.next_page_token(), Some("t1"));
    assert_eq!(calls.lock().unwrap().len(), 1);

    for _ in 0..3 {
        pager.next().await.unwrap().unwrap();
    }
    assert_eq!(calls.lock().unwrap().len(), 1);

    let d = pager.next().await.unwrap().unwrap();
    assert_eq!(d["rolloutId"], "d");
    assert_eq!(calls.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_list_with_full_request_object() {
    let service = ScriptedRollouts::four_pages();
    let calls = service.calls();

    let input = RequestInput::request(json!({"serviceName": "svc", "pageSize": 3}));
    let pager = client(service)
        .list(LIST_SERVICE_ROLLOUTS, input)
        .await
        .unwrap();
    let items: Vec<_> = pager.into_stream().try_collect().await.unwrap();

    assert_eq!(items.len(), 6);
    assert!(calls.lock().unwrap().iter().all(|c| c.service_name == "svc"));
}

#[tokio::test]
async fn test_request_and_flattened_fields_are_rejected_before_any_call() {
    let service = ScriptedRollouts::four_pages();
    let calls = service.calls();
    let client = client(service);

    let mut fields = FieldSet::new();
    fields.insert("serviceName".to_string(), json!("svc"));

    let result = client
        .list_with(
            LIST_SERVICE_ROLLOUTS,
            Some(json!({"serviceName": "svc"})),
            fields,
        )
        .await;

    assert!(matches!(
        result,
        Err(CallError::InvalidArgument(err)) if err.fields == vec!["serviceName".to_string()]
    ));
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_list_with_flattened_fields_only() {
    let service = ScriptedRollouts::four_pages();
    let calls = service.calls();

    let mut fields = FieldSet::new();
    fields.insert("serviceName".to_string(), json!("svc"));

    let pager = client(service)
        .list_with(LIST_SERVICE_ROLLOUTS, None, fields)
        .await
        .unwrap();
    let items: Vec<_> = pager.into_stream().try_collect().await.unwrap();

    assert_eq!(items.len(), 6);
    assert_eq!(calls.lock().unwrap()[0].service_name, "svc");
}

#[tokio::test]
async fn test_fetch_error_is_yielded_once_after_earlier_items() {
    let service = ScriptedRollouts::default()
        .page("", &["a", "b"], "t1")
        .failing_page("t1", tonic::Status::unavailable("backend down"));
    let calls = service.calls();

    let mut pager = client(service)
        .list(LIST_SERVICE_ROLLOUTS, service_name("svc"))
        .await
        .unwrap();

    assert_eq!(pager.next().await.unwrap().unwrap()["rolloutId"], "a");
    assert_eq!(pager.next().await.unwrap().unwrap()["rolloutId"], "b");

    let err = pager.next().await.unwrap().unwrap_err();
    assert_eq!(err.status().unwrap().code(), tonic::Code::Unavailable);

    assert!(pager.next().await.is_none());
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_initial_page_error_fails_the_list_call() {
    let service = ScriptedRollouts::default()
        .failing_page("", tonic::Status::permission_denied("no access"));

    let result = client(service)
        .list(LIST_SERVICE_ROLLOUTS, service_name("svc"))
        .await;

    match result {
        Err(CallError::Status(status)) => assert_eq!(status.code(), tonic::Code::PermissionDenied),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected the list call to fail"),
    }
}

#[tokio::test]
async fn test_list_sends_routing_and_identification_metadata() {
    let service = ScriptedRollouts::four_pages();
    let calls = service.calls();
    let pool = DescriptorPool::decode(FILE_DESCRIPTOR_SET).unwrap();
    let transport = Transport::new(
        ServiceManagerServer::new(service),
        "in-process",
        Credentials::bearer("test-token"),
        Some("octopus".to_string()),
    );
    let client = GapicClient::from_transport(transport, pool);

    let pager = client
        .list(LIST_SERVICE_ROLLOUTS, service_name("service_name_value"))
        .await
        .unwrap();
    let _: Vec<_> = pager.into_stream().try_collect().await.unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 4);
    for call in calls.iter() {
        let metadata = &call.metadata;
        assert_eq!(metadata.get("authorization").unwrap(), "Bearer test-token");
        assert_eq!(metadata.get(USER_PROJECT_HEADER).unwrap(), "octopus");
        assert_eq!(
            metadata.get("x-goog-request-params").unwrap(),
            "service_name=service_name_value"
        );
        assert!(metadata.get("x-goog-api-client").is_some());
    }
}

#[tokio::test]
async fn test_unary_method_is_not_paginated() {
    let result = client(ScriptedRollouts::four_pages())
        .list(
            rollout_service::GET_SERVICE_ROLLOUT,
            RequestInput::default(),
        )
        .await;

    assert!(matches!(result, Err(CallError::NotPaginated(_))));
}

#[tokio::test]
async fn test_closed_client_refuses_new_calls() {
    let service = ScriptedRollouts::four_pages();
    let calls = service.calls();
    let mut client = client(service);

    client.close();
    let result = client
        .list(LIST_SERVICE_ROLLOUTS, service_name("svc"))
        .await;

    assert!(matches!(
        result,
        Err(CallError::Transport(TransportError::Closed))
    ));
    assert!(calls.lock().unwrap().is_empty());
}
