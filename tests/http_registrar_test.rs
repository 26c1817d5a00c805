mod common;

use common::{package, posting_card, receiver, sender};
use httpmock::prelude::*;
use sigep_batch::{
    ArchiveRenderer, CloseStage, CloserState, HttpRegistrar, PostingSession, Registrar,
    RemoteFailure, Service, SigepError, ZipCode,
};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const AUTH: &str = "Basic c2lnZXA6bjVmOXQ4";

fn registrar(server: &MockServer) -> HttpRegistrar {
    HttpRegistrar::new(&server.url("/api"), "sigep", "n5f9t8", Duration::from_secs(5)).unwrap()
}

async fn mock_codes<'a>(server: &'a MockServer, service: u32, code: &str) -> httpmock::Mock<'a> {
    let body = serde_json::json!({ "codes": [code] });
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/tracking-codes")
                .header("authorization", AUTH)
                .json_body_partial(format!(r#"{{"service": {}, "quantity": 1}}"#, service));
            then.status(200).json_body(body);
        })
        .await
}

#[tokio::test]
async fn test_close_over_http() {
    let server = MockServer::start_async().await;
    let pac = mock_codes(&server, 4669, "PA100000001BR").await;
    let sedex = mock_codes(&server, 4162, "SS100000002BR").await;
    let close = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/posting-lists")
                .header("authorization", AUTH)
                .json_body_partial(
                    r#"{"custom_id": 777, "posting_card": "0067599079", "regional_direction": 72}"#,
                );
            then.status(201).json_body(serde_json::json!({ "number": 1_234_567 }));
        })
        .await;

    let mut session = PostingSession::new(posting_card(), registrar(&server), ArchiveRenderer::new())
        .with_id_generator(|| 777u32);
    session.set_sender(sender()).unwrap();
    session.set_receiver(receiver()).unwrap();
    session.add_package(package(Service::Pac)).unwrap();
    session.add_package(package(Service::Sedex)).unwrap();

    let list = assert_ok!(session.close_posting_list(None).await);
    assert_eq!(list.number(), 1_234_567);
    let codes: Vec<String> = list.tracking_codes().map(|c| c.to_string()).collect();
    assert_eq!(codes, vec!["PA100000001BR", "SS100000002BR"]);

    pac.assert_async().await;
    sedex.assert_async().await;
    close.assert_async().await;
}

async fn filled_session(server: &MockServer) -> PostingSession<HttpRegistrar, ArchiveRenderer> {
    mock_codes(server, 4669, "PA100000001BR").await;
    mock_codes(server, 4162, "SS100000002BR").await;
    let mut session = PostingSession::new(posting_card(), registrar(server), ArchiveRenderer::new());
    session.set_sender(sender()).unwrap();
    session.set_receiver(receiver()).unwrap();
    session.add_package(package(Service::Pac)).unwrap();
    session.add_package(package(Service::Sedex)).unwrap();
    session
}

fn refused_codes(err: &SigepError) -> Vec<String> {
    match err {
        SigepError::RemoteOperation {
            operation: "close_posting_list",
            batch_id: Some(12),
            source: RemoteFailure::Refused { codes },
        } => codes.clone(),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_partially_accepted_list_keeps_batch() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/posting-lists");
            then.status(200).json_body(serde_json::json!({
                "number": 99,
                "accepted": ["ss100000002br"]
            }));
        })
        .await;
    let mut session = filled_session(&server).await;

    let err = assert_err!(session.close_posting_list(Some(12)).await);
    assert_eq!(refused_codes(&err), vec!["PA100000001BR"]);

    assert_eq!(session.packages().len(), 2);
    assert!(session.sender().is_some());
    assert!(session.posting_list().is_none());
    assert_eq!(
        session.closer_state(),
        CloserState::Failed {
            stage: CloseStage::Submitting
        }
    );
}

#[tokio::test]
async fn test_empty_acceptance_keeps_batch() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/posting-lists");
            then.status(200)
                .json_body(serde_json::json!({ "number": 99, "accepted": [] }));
        })
        .await;
    let mut session = filled_session(&server).await;

    let err = assert_err!(session.close_posting_list(Some(12)).await);
    assert_eq!(refused_codes(&err), vec!["PA100000001BR", "SS100000002BR"]);

    assert_eq!(session.packages().len(), 2);
    assert!(session.receiver().is_some());
    assert!(matches!(session.render_manifest(None), Err(SigepError::NotClosed)));
}

#[tokio::test]
async fn test_rejection_carries_status_and_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/tracking-codes");
            then.status(401).body("invalid credentials");
        })
        .await;

    let user = posting_card().contract.user;
    let err = assert_err!(registrar(&server).request_tracking_codes(&user, Service::Pac, 2).await);
    match err {
        SigepError::RemoteOperation {
            operation,
            batch_id: None,
            source: RemoteFailure::Rejected { status, message },
        } => {
            assert_eq!(operation, "request_tracking_codes");
            assert_eq!(status, 401);
            assert_eq!(message, "invalid credentials");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_malformed_reply_is_decode_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/delivery-time");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let from = ZipCode::new("01504-000").unwrap();
    let to = ZipCode::new("30160-011").unwrap();
    let err = assert_err!(
        registrar(&server)
            .calculate_delivery_time(Service::Sedex, &from, &to)
            .await
    );
    assert!(matches!(
        err,
        SigepError::RemoteOperation {
            source: RemoteFailure::Decode(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_route_queries() {
    let server = MockServer::start_async().await;
    let delivery = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/delivery-time")
                .json_body_partial(r#"{"service": 4162, "from": "01504000", "to": "30160011"}"#);
            then.status(200).json_body(serde_json::json!({ "days": 2 }));
        })
        .await;
    let availability = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/service-availability")
                .json_body_partial(r#"{"posting_card": "0067599079", "service": 40789}"#);
            then.status(200).json_body(serde_json::json!({ "available": false }));
        })
        .await;

    let registrar = registrar(&server);
    let from = ZipCode::new("01504-000").unwrap();
    let to = ZipCode::new("30160-011").unwrap();

    assert_eq!(
        assert_ok!(registrar.calculate_delivery_time(Service::Sedex, &from, &to).await),
        2
    );
    assert!(!assert_ok!(
        registrar
            .verify_service_availability(&posting_card(), Service::Sedex10, &from, &to)
            .await
    ));
    delivery.assert_async().await;
    availability.assert_async().await;
}

#[tokio::test]
async fn test_posting_card_status() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/posting-cards/0067599079/status")
                .header("authorization", AUTH);
            then.status(200).json_body(serde_json::json!({ "active": true }));
        })
        .await;

    let session = PostingSession::new(posting_card(), registrar(&server), ArchiveRenderer::new());
    assert!(assert_ok!(session.get_posting_card_status(None).await));
    mock.assert_async().await;
}
