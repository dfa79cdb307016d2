// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity API client against a throwaway local server.

use activity_recorder::error::{RecorderError, UploadStage};
use activity_recorder::models::{
    ActivitySummary, ActivityType, CreateActivityRequest, FinishRequest, TrackPoint,
};
use activity_recorder::services::{upload_activity, ActivityApi, ActivityApiClient};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const TOKEN: &str = "test-token";

#[derive(Default)]
struct FakeServer {
    created: Mutex<Vec<Value>>,
    tracks: Mutex<Vec<(u64, Value)>>,
    /// Status returned by the track endpoint, 200 when unset
    track_status: Mutex<Option<StatusCode>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

async fn create(
    State(server): State<Arc<FakeServer>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "bad token" })));
    }
    let mut created = server.created.lock().unwrap();
    created.push(body);
    (StatusCode::CREATED, Json(json!({ "id": 100 + created.len() })))
}

async fn attach(
    State(server): State<Arc<FakeServer>>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> StatusCode {
    if let Some(status) = *server.track_status.lock().unwrap() {
        return status;
    }
    server.tracks.lock().unwrap().push((id, body));
    StatusCode::NO_CONTENT
}

async fn spawn_server() -> (String, Arc<FakeServer>) {
    let server = Arc::new(FakeServer::default());
    let app = Router::new()
        .route("/api/activities", post(create))
        .route("/api/activities/{id}/track", put(attach))
        .with_state(server.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), server)
}

fn summary() -> ActivitySummary {
    ActivitySummary {
        started_at: "2024-05-01T07:00:00.000Z".to_string(),
        distance_km: 1.25,
        duration_minutes: 7.5,
        points: vec![
            TrackPoint {
                latitude: 52.0,
                longitude: 21.0,
                timestamp: "2024-05-01T07:00:00.000Z".to_string(),
            },
            TrackPoint {
                latitude: 52.001,
                longitude: 21.0,
                timestamp: "2024-05-01T07:00:30.000Z".to_string(),
            },
        ],
    }
}

fn request(summary: &ActivitySummary) -> CreateActivityRequest {
    let details = FinishRequest {
        name: "Lunch ride".to_string(),
        activity_type: ActivityType::Bike,
        note: None,
    };
    CreateActivityRequest::from_summary(7, &details, summary)
}

#[tokio::test]
async fn test_two_phase_upload_wire_format() {
    let (base_url, server) = spawn_server().await;
    let client = ActivityApiClient::new(&format!("{}/", base_url), TOKEN).unwrap();
    let summary = summary();

    let id = upload_activity(&client, &request(&summary), &summary)
        .await
        .unwrap();
    assert_eq!(id, 101);

    let created = server.created.lock().unwrap().clone();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["user_id"], 7);
    assert_eq!(created[0]["name"], "Lunch ride");
    assert_eq!(created[0]["type"], "bike");
    assert_eq!(created[0]["started_at"], "2024-05-01T07:00:00.000Z");
    assert_eq!(created[0]["distance_km"], 1.25);
    assert_eq!(created[0]["duration_min"], 7.5);

    let tracks = server.tracks.lock().unwrap().clone();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].0, 101);
    let points = tracks[0].1["points"].as_array().unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[1]["latitude"], 52.001);
    assert_eq!(points[1]["timestamp"], "2024-05-01T07:00:30.000Z");
}

#[tokio::test]
async fn test_bad_token_fails_create() {
    let (base_url, server) = spawn_server().await;
    let client = ActivityApiClient::new(&base_url, "wrong").unwrap();
    let summary = summary();

    let err = upload_activity(&client, &request(&summary), &summary)
        .await
        .unwrap_err();
    match err {
        RecorderError::UploadFailed {
            stage,
            activity_id,
            message,
        } => {
            assert_eq!(stage, UploadStage::CreateActivity);
            assert_eq!(activity_id, None);
            assert_eq!(message, RecorderError::API_TOKEN_ERROR);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(server.tracks.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_track_failure_reports_orphaned_record() {
    let (base_url, server) = spawn_server().await;
    *server.track_status.lock().unwrap() = Some(StatusCode::TOO_MANY_REQUESTS);
    let client = ActivityApiClient::new(&base_url, TOKEN).unwrap();
    let summary = summary();

    let err = upload_activity(&client, &request(&summary), &summary)
        .await
        .unwrap_err();
    assert!(err.is_partial_upload());
    match err {
        RecorderError::UploadFailed {
            activity_id,
            message,
            ..
        } => {
            assert_eq!(activity_id, Some(101));
            assert_eq!(message, RecorderError::API_RATE_LIMIT);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_server() {
    // Nothing listens on this port once the listener is dropped
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = ActivityApiClient::new(&format!("http://{}", addr), TOKEN).unwrap();
    let err = client.create_activity(&request(&summary())).await.unwrap_err();
    assert!(matches!(
        err,
        RecorderError::UploadFailed {
            stage: UploadStage::CreateActivity,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_silent_server_times_out() {
    // Accepts connections but never writes a response
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let client = ActivityApiClient::new(&format!("http://{}", addr), TOKEN).unwrap();
    let err = client.create_activity(&request(&summary())).await.unwrap_err();
    assert!(matches!(
        err,
        RecorderError::UploadFailed {
            stage: UploadStage::CreateActivity,
            activity_id: None,
            ..
        }
    ));
}
