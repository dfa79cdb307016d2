// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Control API tests driven through the router.

use activity_recorder::services::LocationFeed;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::wait_for_view;

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn samples_body(points: &[(f64, f64, &str)]) -> Value {
    let samples: Vec<Value> = points
        .iter()
        .map(|(lat, lon, ts)| {
            json!({
                "latitude": lat,
                "longitude": lon,
                "accuracy_meters": 8.0,
                "timestamp": ts,
            })
        })
        .collect();
    json!({ "samples": samples })
}

#[tokio::test]
async fn test_health() {
    let (app, _state, _api) = common::create_test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_initial_status_is_idle() {
    let (app, _state, _api) = common::create_test_app();
    let (status, body) = send(&app, "GET", "/recording", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "idle");
    assert_eq!(body["metrics"]["distance_km"], 0.0);
    assert_eq!(body["metrics"]["duration"], "00:00");
    assert_eq!(body["metrics"]["pace"], "--:--");
    assert_eq!(body["segment_count"], 0);
}

#[tokio::test]
async fn test_pause_from_idle_conflicts() {
    let (app, _state, _api) = common::create_test_app();
    let (status, body) = send(&app, "POST", "/recording/pause", None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "invalid_transition");
}

#[tokio::test]
async fn test_start_without_permission_forbidden() {
    let (app, _state, _api) = common::create_test_app_with_feed(LocationFeed::default());
    let (status, body) = send(&app, "POST", "/recording/start", None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "permission_denied");
}

#[tokio::test]
async fn test_record_and_finish_flow() {
    let (app, state, api) = common::create_test_app();

    let (status, body) = send(&app, "POST", "/recording/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "recording");

    let (status, body) = send(
        &app,
        "POST",
        "/location/samples",
        Some(samples_body(&[
            (52.0, 21.0, "2024-05-01T07:00:00Z"),
            (52.0009, 21.0, "2024-05-01T07:00:05Z"),
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["delivered"], 2);

    wait_for_view(&state.recorder, |v| v.point_count == 2).await;

    let (status, body) = send(&app, "GET", "/recording/route", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["segments"].as_array().unwrap().len(), 1);
    assert_eq!(body["segments"][0]["points"].as_array().unwrap().len(), 2);
    assert!(body["segments"][0]["polyline"].as_str().unwrap().len() > 4);

    let (status, body) = send(&app, "GET", "/recording/route.geojson", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "Feature");
    assert_eq!(body["geometry"]["type"], "MultiLineString");

    let (status, body) = send(&app, "POST", "/recording/pause", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "paused");

    let (status, body) = send(
        &app,
        "POST",
        "/recording/finish",
        Some(json!({ "name": "Morning", "type": "run", "note": "easy" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activity_id"], 1);
    assert_eq!(body["status"]["state"], "finished");

    let created = api.created();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].name, "Morning - easy");
}

#[tokio::test]
async fn test_samples_ignored_while_idle() {
    let (app, _state, _api) = common::create_test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/location/samples",
        Some(samples_body(&[(52.0, 21.0, "2024-05-01T07:00:00Z")])),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["delivered"], 0);
    assert_eq!(body["ignored"], 1);
}

#[tokio::test]
async fn test_finish_rejects_long_name() {
    let (app, _state, api) = common::create_test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/recording/finish",
        Some(json!({ "name": "a".repeat(101) })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_finish_with_too_few_points() {
    let (app, _state, _api) = common::create_test_app();
    send(&app, "POST", "/recording/start", None).await;
    send(&app, "POST", "/recording/pause", None).await;

    let (status, body) = send(&app, "POST", "/recording/finish", Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "insufficient_data");

    let (_, body) = send(&app, "GET", "/recording", None).await;
    assert_eq!(body["state"], "paused");
}

#[tokio::test]
async fn test_upload_failure_is_bad_gateway() {
    let (app, state, api) = common::create_test_app();
    send(&app, "POST", "/recording/start", None).await;
    send(
        &app,
        "POST",
        "/location/samples",
        Some(samples_body(&[
            (52.0, 21.0, "2024-05-01T07:00:00Z"),
            (52.0001, 21.0, "2024-05-01T07:00:02Z"),
        ])),
    )
    .await;
    wait_for_view(&state.recorder, |v| v.point_count == 2).await;
    send(&app, "POST", "/recording/pause", None).await;

    api.fail_create(true);
    let (status, body) = send(&app, "POST", "/recording/finish", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upload_failed");

    let (_, body) = send(&app, "GET", "/recording", None).await;
    assert_eq!(body["state"], "paused");
    assert_eq!(body["point_count"], 2);
}

#[tokio::test]
async fn test_discard_resets_status() {
    let (app, _state, _api) = common::create_test_app();
    send(&app, "POST", "/recording/start", None).await;

    let (status, body) = send(&app, "POST", "/recording/discard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "discarded");
    assert_eq!(body["point_count"], 0);
}

#[tokio::test]
async fn test_retry_unsent_with_nothing_queued() {
    let (app, _state, _api) = common::create_test_app();
    let (status, body) = send(&app, "POST", "/recording/retry-unsent", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queued"], 0);
}

#[tokio::test]
async fn test_permission_roundtrip() {
    let (app, _state, _api) = common::create_test_app_with_feed(LocationFeed::default());

    let (_, body) = send(&app, "GET", "/location/permission", None).await;
    assert_eq!(body["status"], "unknown");
    assert_eq!(body["requested"], false);

    let (status, body) = send(
        &app,
        "POST",
        "/location/permission",
        Some(json!({ "granted": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "granted");

    let (status, _) = send(&app, "POST", "/recording/start", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test(start_paused = true)]
async fn test_request_permission_times_out() {
    let (app, _state, _api) = common::create_test_app_with_feed(LocationFeed::default());

    let (status, body) = send(&app, "POST", "/location/request-permission", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["granted"], false);
    assert_eq!(body["timed_out"], true);

    let (_, body) = send(&app, "GET", "/location/permission", None).await;
    assert_eq!(body["status"], "unknown");
    assert_eq!(body["requested"], false);
}

#[tokio::test]
async fn test_request_permission_when_already_granted() {
    let (app, _state, _api) = common::create_test_app();

    let (status, body) = send(&app, "POST", "/location/request-permission", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["granted"], true);
    assert_eq!(body["timed_out"], false);
}

#[tokio::test]
async fn test_malformed_samples_body_rejected() {
    let (app, _state, _api) = common::create_test_app();
    let (status, _) = send(
        &app,
        "POST",
        "/location/samples",
        Some(json!({ "samples": [{ "latitude": "north" }] })),
    )
    .await;
    assert!(status.is_client_error());
}

async fn allowed_origin(app: &Router, origin: &str) -> Option<String> {
    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .header(header::ORIGIN, origin)
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .map(|v| v.to_str().unwrap().to_string())
}

#[tokio::test]
async fn test_cors_only_for_loopback_origins() {
    let (app, _state, _api) = common::create_test_app();

    assert_eq!(
        allowed_origin(&app, "http://localhost:5173").await.as_deref(),
        Some("http://localhost:5173")
    );
    assert_eq!(allowed_origin(&app, "http://localhost.evil.example").await, None);
}
