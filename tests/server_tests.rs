//! HTTP round trips against a served demo model.

mod common;

use serde_json::{Value, json};

use common::fixtures::applicant;
use common::harness::spawn_test_server;

async fn post(client: &reqwest::Client, url: String, body: Value) -> reqwest::Response {
    client.post(url).json(&body).send().await.unwrap()
}

#[tokio::test]
async fn test_health_and_metadata() {
    let server = spawn_test_server().await.unwrap();
    let client = reqwest::Client::new();

    let health = client
        .get(format!("{}/health", server.url()))
        .send()
        .await
        .unwrap();
    assert!(health.status().is_success());
    assert_eq!(
        health.headers().get("x-riskline-status").unwrap(),
        "ok"
    );
    let body: Value = health.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok", "version": "0.1.0"}));

    let metadata: Value = client
        .get(format!("{}/metadata", server.url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(metadata["active_model"], "stub_hybrid");
    assert_eq!(metadata["feature_order"].as_array().unwrap().len(), 5);

    server.shutdown().await;
}

#[tokio::test]
async fn test_predict_then_query_records() {
    let server = spawn_test_server().await.unwrap();
    let client = reqwest::Client::new();

    let mut ids = Vec::new();
    for (occupation, age) in [("teacher", 45.0), ("contractor", 23.0), ("teacher", 46.0)] {
        let response = post(
            &client,
            format!("{}/predict", server.url()),
            json!({"features": applicant(occupation, "own", age, 50000.0)}),
        )
        .await;
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        ids.push(body["record_id"].as_str().unwrap().to_string());
    }
    assert_eq!(server.store.len(), 3);

    let listed: Value = client
        .get(format!("{}/predictions?page_size=2", server.url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let listed_ids: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(listed_ids, [ids[2].as_str(), ids[1].as_str()]);

    let nearest: Value = client
        .get(format!("{}/predictions/{}/nearest?k=1", server.url(), ids[0]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(nearest["euclidean"][0]["id"], ids[2].as_str());
    assert_eq!(nearest["cosine"][0]["id"], ids[2].as_str());

    let explained = post(
        &client,
        format!("{}/predictions/{}/explain", server.url(), ids[1]),
        json!({"overwrite": false}),
    )
    .await;
    assert_eq!(explained.status(), 200);
    let explanation: Value = explained.json().await.unwrap();
    assert_eq!(explanation["explanation_type"], "counterfactual");

    server.shutdown().await;
}

#[tokio::test]
async fn test_rejections() {
    let server = spawn_test_server().await.unwrap();
    let client = reqwest::Client::new();

    let short = post(
        &client,
        format!("{}/predict", server.url()),
        json!({"features": {"occupation": "teacher"}}),
    )
    .await;
    assert_eq!(short.status(), 400);
    let body: Value = short.json().await.unwrap();
    assert_eq!(body["code"], 400);

    let missing = client
        .get(format!("{}/predictions/{}", server.url(), uuid::Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);

    assert!(server.store.is_empty());
    server.shutdown().await;
}
