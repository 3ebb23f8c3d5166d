//! REST backend tests
//!
//! Runs the client against an in-process warp server.
//!
use admission_core::{BackendError, DraftFields, ErrorKind, SubmissionPayload, SubmissionRecord};
use admission_http::{HttpAdmissionBackend, HttpConfig};
use admission_sync::prelude::*;
use admission_test_utils::{sample_fields, RecordingNotifier};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use warp::Filter;

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    auth: Option<String>,
    body: String,
}

struct MockApi {
    base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockApi {
    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }

    fn backend(&self) -> HttpAdmissionBackend {
        HttpAdmissionBackend::new(&HttpConfig::new(&self.base_url).with_token("tok")).unwrap()
    }
}

/// Serve `respond(method, path)` as `(status, json body)`
fn mock_api<F>(respond: F) -> MockApi
where
    F: Fn(&str, &str) -> (u16, String) + Send + Sync + 'static,
{
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = requests.clone();
    let respond = Arc::new(respond);

    let route = warp::any()
        .and(warp::method())
        .and(warp::path::full())
        .and(warp::header::optional::<String>("authorization"))
        .and(warp::body::bytes())
        .map(
            move |method: warp::http::Method,
                  path: warp::path::FullPath,
                  auth: Option<String>,
                  body: warp::hyper::body::Bytes| {
                let recorded = Recorded {
                    method: method.to_string(),
                    path: path.as_str().to_string(),
                    auth,
                    body: String::from_utf8_lossy(&body).into_owned(),
                };
                let (status, reply) = respond(&recorded.method, &recorded.path);
                log.lock().push(recorded);
                warp::http::Response::builder()
                    .status(status)
                    .header("content-type", "application/json")
                    .body(reply)
                    .unwrap()
            },
        );

    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    MockApi {
        base_url: format!("http://{addr}/api/"),
        requests,
    }
}

fn payload() -> SubmissionPayload {
    SubmissionPayload::from_fields(&sample_fields()).unwrap()
}

#[tokio::test]
async fn test_check_existing_sends_bearer_token() {
    let api = mock_api(|_, _| (200, r#"{"hasAdmission":true,"admissionId":42}"#.into()));

    let existing = api.backend().check_existing_admission().await.unwrap();

    assert!(existing.has_admission);
    assert_eq!(existing.admission_id.as_deref(), Some("42"));
    let requests = api.requests();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/api/admissions/check-existing/");
    assert_eq!(requests[0].auth.as_deref(), Some("Bearer tok"));
}

#[tokio::test]
async fn test_missing_draft_is_none() {
    let not_found = mock_api(|_, _| (404, r#"{"detail":"Not found."}"#.into()));
    assert_eq!(not_found.backend().get_draft().await, Ok(None));

    let null = mock_api(|_, _| (200, "null".into()));
    assert_eq!(null.backend().get_draft().await, Ok(None));
}

#[tokio::test]
async fn test_get_draft_decodes_server_shape() {
    let api = mock_api(|_, _| {
        (
            200,
            r#"{"draft_data":{"fullNameEnglish":"Rahim Khan"},"current_step":3,"saved_at":"2026-01-15T10:00:00Z"}"#
                .into(),
        )
    });

    let draft = api.backend().get_draft().await.unwrap().unwrap();

    assert_eq!(draft.draft_data.full_name_english.as_deref(), Some("Rahim Khan"));
    assert_eq!(draft.current_step, 3);
    assert!(draft.saved_at.is_some());
}

#[tokio::test]
async fn test_save_draft_posts_fields_and_step() {
    let api = mock_api(|_, _| (200, r#"{"saved_at":"2026-01-15T10:00:00Z"}"#.into()));
    let mut fields = DraftFields::new();
    fields.mobile = Some("01711000000".into());

    let ack = api.backend().save_draft(&fields, 2).await.unwrap();

    assert_eq!(ack.saved_at.to_rfc3339(), "2026-01-15T10:00:00+00:00");
    let request = &api.requests()[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/api/admissions/draft/");
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "draft_data": { "mobile": "01711000000" }, "current_step": 2 })
    );
}

#[tokio::test]
async fn test_clear_draft_tolerates_missing_draft() {
    let api = mock_api(|_, _| (404, String::new()));

    assert_eq!(api.backend().clear_draft().await, Ok(()));
    assert_eq!(api.requests()[0].method, "DELETE");
}

#[tokio::test]
async fn test_submit_error_mapping() {
    let cases = [
        (400, r#"{"message":"Mobile number is invalid"}"#, ErrorKind::Validation),
        (409, r#"{"message":"Already submitted"}"#, ErrorKind::DuplicateSubmission),
        (
            400,
            r#"{"code":"duplicate_submission","message":"Already submitted"}"#,
            ErrorKind::DuplicateSubmission,
        ),
        (503, "", ErrorKind::Network),
        (403, r#"{"detail":"Forbidden"}"#, ErrorKind::Unknown),
    ];

    for (status, body, kind) in cases {
        let api = mock_api(move |_, _| (status, body.to_string()));
        let err = api.backend().submit_application(&payload()).await.unwrap_err();
        assert_eq!(err.kind(), kind, "status {status}");
    }
}

#[tokio::test]
async fn test_validation_message_reaches_caller_verbatim() {
    let api = mock_api(|_, _| (422, r#"{"message":"SSC roll does not match board"}"#.into()));

    let err = api.backend().submit_application(&payload()).await.unwrap_err();

    assert_eq!(err, BackendError::Validation("SSC roll does not match board".into()));
}

#[tokio::test]
async fn test_malformed_success_body_is_unknown() {
    let api = mock_api(|_, _| (200, "<html></html>".into()));

    let err = api.backend().get_my_admission().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unknown);
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let backend = HttpAdmissionBackend::new(&HttpConfig::new(format!("http://{addr}/api"))).unwrap();

    let err = backend.check_existing_admission().await.unwrap_err();

    assert!(err.is_network());
}

#[tokio::test]
async fn test_controller_recovers_duplicate_over_http() {
    let api = mock_api(|method, path| match (method, path) {
        ("GET", "/api/admissions/check-existing/") => (200, r#"{"hasAdmission":false}"#.into()),
        ("GET", "/api/admissions/draft/") => (404, String::new()),
        ("POST", "/api/admissions/") => (
            400,
            r#"{"code":"duplicate_submission","message":"You have already submitted an application"}"#
                .into(),
        ),
        ("GET", "/api/admissions/my-admission/") => {
            (200, r#"{"id":"APP-123","status":"pending"}"#.into())
        }
        ("DELETE", "/api/admissions/draft/") => (204, String::new()),
        _ => (404, String::new()),
    });

    let controller = DraftSyncController::new(
        SyncConfig::default(),
        Arc::new(api.backend()),
        Arc::new(MemoryStore::new()),
        Arc::new(RecordingNotifier::new()),
    );
    controller.bootstrap().await;
    controller
        .update_fields(|fields| *fields = sample_fields())
        .unwrap();

    let outcome = controller.submit().await;

    assert_eq!(
        outcome,
        SubmitOutcome::Submitted(SubmissionRecord::discovered("APP-123"))
    );
    let paths: Vec<_> = api
        .requests()
        .into_iter()
        .map(|r| format!("{} {}", r.method, r.path))
        .collect();
    assert!(paths.contains(&"GET /api/admissions/my-admission/".to_string()));
    assert!(!paths.iter().any(|p| p == "POST /api/admissions/draft/"));
}
