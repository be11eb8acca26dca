//! Integration tests for the ingestion, acknowledgement and listing
//! endpoints over real HTTP.

mod common;

use common::{acknowledge, ingest, list_events, spawn_server};
use serde_json::json;

#[tokio::test]
async fn ingest_returns_id_of_stored_event() {
    let (addr, state) = spawn_server().await;
    let client = reqwest::Client::new();

    let id = ingest(&client, addr, "GET /x 404 missing").await;

    let events = list_events(&client, addr).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["id"], id);
    assert_eq!(events[0]["raw"], "GET /x 404 missing");
    assert_eq!(events[0]["statusCode"], 404);
    assert_eq!(events[0]["level"], "warning");
    assert_eq!(events[0]["acknowledged"], false);
    assert!(events[0]["timestamp"].is_string());
    assert_eq!(state.hub.store().len().unwrap(), 1);
}

#[tokio::test]
async fn malformed_lines_are_accepted_as_info() {
    let (addr, _state) = spawn_server().await;
    let client = reqwest::Client::new();

    for raw in ["", "no digits here", "a1234b", "\u{fffd}\u{fffd} garbled"] {
        ingest(&client, addr, raw).await;
    }

    let events = list_events(&client, addr).await;
    assert_eq!(events.len(), 4);
    for event in &events {
        assert_eq!(event["statusCode"], 0);
        assert_eq!(event["level"], "info");
    }
}

#[tokio::test]
async fn list_returns_events_in_ingestion_order() {
    let (addr, _state) = spawn_server().await;
    let client = reqwest::Client::new();

    let mut ids = Vec::new();
    for i in 0..10 {
        ids.push(ingest(&client, addr, &format!("line {i} status 20{}", i % 10)).await);
    }

    let listed: Vec<String> = list_events(&client, addr)
        .await
        .iter()
        .map(|e| e["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn acknowledge_known_event_sets_flag_idempotently() {
    let (addr, _state) = spawn_server().await;
    let client = reqwest::Client::new();

    let id = ingest(&client, addr, "GET /x 500 error").await;
    let other = ingest(&client, addr, "GET /y 200 ok").await;

    assert_eq!(acknowledge(&client, addr, &id).await, json!({ "ok": true }));
    let after_first = list_events(&client, addr).await;
    assert_eq!(acknowledge(&client, addr, &id).await, json!({ "ok": true }));
    let after_second = list_events(&client, addr).await;

    assert_eq!(after_first, after_second);
    let acked = after_second.iter().find(|e| e["id"] == id).unwrap();
    let untouched = after_second.iter().find(|e| e["id"] == other).unwrap();
    assert_eq!(acked["acknowledged"], true);
    assert_eq!(untouched["acknowledged"], false);
}

#[tokio::test]
async fn acknowledge_unknown_event_is_not_found_and_changes_nothing() {
    let (addr, _state) = spawn_server().await;
    let client = reqwest::Client::new();

    ingest(&client, addr, "GET /x 500 error").await;
    let before = list_events(&client, addr).await;

    let unknown = "6f1c2d43-9a8e-4b7f-8c3d-2e1f0a9b8c7d";
    let response = client
        .post(format!("http://{}/acknowledge/{}", addr, unknown))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "ok": false, "error": "not_found" }));

    assert_eq!(list_events(&client, addr).await, before);
}

#[tokio::test]
async fn ingest_without_raw_field_is_rejected_by_extractor() {
    let (addr, _state) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{}/ingest", addr))
        .json(&json!({ "line": "wrong field" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());
    assert!(list_events(&client, addr).await.is_empty());
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let (addr, _state) = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{}/events", addr))
        .header("Origin", "http://viewer.example")
        .send()
        .await
        .unwrap();
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_ingests_get_unique_ids() {
    let (addr, _state) = spawn_server().await;
    let client = reqwest::Client::new();

    let mut handles = Vec::new();
    for i in 0..40 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            ingest(&client, addr, &format!("worker {i} 503")).await
        }));
    }
    let mut ids = std::collections::HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }

    assert_eq!(ids.len(), 40);
    assert_eq!(list_events(&client, addr).await.len(), 40);
}
