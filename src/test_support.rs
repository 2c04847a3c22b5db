//! In-process mock of the PeerFlow API for network tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{Value, json};

use crate::api::ApiClient;

#[derive(Default)]
struct MockState {
    hits: AtomicUsize,
    requested_ids: Mutex<Vec<String>>,
    auth_headers: Mutex<Vec<Option<String>>>,
    login_forms: Mutex<Vec<HashMap<String, String>>>,
    responses: Mutex<VecDeque<(StatusCode, Value)>>,
}

impl MockState {
    /// Pop the next scripted response; the last one repeats forever.
    fn next_response(&self) -> (StatusCode, Value) {
        let mut queue = self.responses.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap_or((StatusCode::NOT_FOUND, json!({ "detail": "not scripted" })))
        }
    }
}

pub(crate) struct MockApi {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockApi {
    /// Serve the scripted responses, in order, for every API call.
    pub async fn start(responses: Vec<(StatusCode, Value)>) -> Self {
        let state = Arc::new(MockState { responses: Mutex::new(responses.into()), ..MockState::default() });
        let app = Router::new()
            .route("/api/v1/assignments/{id}", get(assignment))
            .route("/authentication/login", post(login))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url: format!("http://{addr}"), state }
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn requested_ids(&self) -> Vec<String> {
        self.state.requested_ids.lock().unwrap().clone()
    }

    pub fn auth_headers(&self) -> Vec<Option<String>> {
        self.state.auth_headers.lock().unwrap().clone()
    }

    pub fn login_forms(&self) -> Vec<HashMap<String, String>> {
        self.state.login_forms.lock().unwrap().clone()
    }
}

async fn assignment(
    State(state): State<Arc<MockState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.requested_ids.lock().unwrap().push(id);
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    state.auth_headers.lock().unwrap().push(auth);
    let (status, body) = state.next_response();
    (status, Json(body))
}

async fn login(
    State(state): State<Arc<MockState>>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.login_forms.lock().unwrap().push(form);
    let (status, body) = state.next_response();
    (status, Json(body))
}

/// Client for talking to the mock; ignores any proxy set in the environment.
pub(crate) fn test_client() -> ApiClient {
    let http = reqwest::Client::builder()
        .no_proxy()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .unwrap();
    ApiClient::from_http(http)
}

/// Base URL of a port nothing listens on.
pub(crate) async fn closed_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub(crate) fn user_json(id: &str, role: &str) -> Value {
    json!({ "id": id, "name": "Ada", "surname": "Lovelace", "email": "ada@test.com", "role": role })
}

pub(crate) fn assignment_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Assignment {id}"),
        "description": "Write something",
        "submissonDeadline": "2025-06-01T12:00:00",
        "createdDate": "2025-05-01T09:00:00Z",
        "lastModifiedDate": "2025-05-01T09:00:00Z",
        "teacherId": "T1",
        "involvedStudents": []
    })
}

pub(crate) fn peer_review_json(assignment_id: &str) -> Value {
    json!({
        "id": format!("PR-{assignment_id}"),
        "AssignmentID": assignment_id,
        "ReviewDeadline": "2025-06-10T12:00:00",
        "RubricID": "R1",
        "Rubric": { "Criteria": [
            { "Title": "Clarity", "Description": "Is it clear?", "MinScore": 0, "MaxScore": 5 }
        ] },
        "Status": "Peer Review Started",
        "ReviewerAssignmentMode": "Manual",
        "NumberOfReviewersPerSubmission": 1,
        "PeerReviewPairings": []
    })
}

pub(crate) fn submission_json(id: &str, assignment_id: &str) -> Value {
    json!({
        "_id": id,
        "AssignmentID": assignment_id,
        "Status": "submitted",
        "StudentID": "S1",
        "TextContent": "text",
        "Attachments": []
    })
}

/// Full teacher view of an assignment.
pub(crate) fn details_json(assignment_id: &str) -> Value {
    json!({
        "message": "Assignment retrieved",
        "assignment": assignment_json(assignment_id),
        "peerReviewAssignment": peer_review_json(assignment_id),
        "submissions": [submission_json("SUB1", assignment_id), submission_json("SUB2", assignment_id)]
    })
}
