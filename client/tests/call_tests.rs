/// Authenticated call wrapper: 401 recovery, error taxonomy, auth modes.
mod common;

use client::{ApiError, AuthMode, CallOptions};
use common::*;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::{Value, json};

const JOBS: &str = "/api/v1/jobs";

// ── Happy path ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn attaches_bearer_and_returns_json() {
    let h = harness();
    let token = live_token("USER");
    h.seed(&token, "user");
    h.transport.respond(JOBS, 200, json!({ "result": [{ "id": 1 }] }));

    let body = h.client.call(JOBS, CallOptions::get()).await.unwrap();

    assert_eq!(body["result"][0]["id"], 1);
    let sent = &h.transport.requests_to(JOBS)[0];
    assert_eq!(sent.bearer(), Some(token.as_str()));
    assert_eq!(sent.headers[CONTENT_TYPE], "application/json");
    assert!(sent.include_credentials);
    assert_eq!(h.transport.calls(REFRESH), 0);
}

#[tokio::test]
async fn without_session_the_request_goes_out_unauthenticated() {
    let h = harness();
    h.transport.respond(JOBS, 200, json!({ "result": [] }));

    h.client.call(JOBS, CallOptions::get()).await.unwrap();

    let sent = &h.transport.requests_to(JOBS)[0];
    assert!(sent.headers.get(AUTHORIZATION).is_none());
    assert_eq!(h.transport.calls(REFRESH), 0);
}

#[tokio::test]
async fn json_body_and_method_are_forwarded() {
    let h = harness();
    h.seed(&live_token("EMPLOYER"), "employer");
    h.transport.respond(JOBS, 201, json!({ "result": { "id": 7 } }));

    let options = CallOptions::post()
        .json(&json!({ "title": "Rust engineer" }))
        .unwrap();
    let id: Value = h.client.call_result(JOBS, options).await.unwrap();

    assert_eq!(id["id"], 7);
    let sent = &h.transport.requests_to(JOBS)[0];
    assert_eq!(sent.method, http::Method::POST);
    let body: Value = serde_json::from_slice(sent.body.as_ref().unwrap()).unwrap();
    assert_eq!(body["title"], "Rust engineer");
}

// ── 401 recovery ────────────────────────────────────────────────────────────

#[tokio::test]
async fn unauthorized_refreshes_once_and_retries_once() {
    let h = harness();
    let stale = live_token("USER");
    let fresh = live_token("USER") + "x";
    h.seed(&stale, "user");
    h.transport
        .respond(JOBS, 401, json!({ "message": "Token revoked" }))
        .respond(JOBS, 200, json!({ "result": "ok" }))
        .respond(REFRESH, 200, token_envelope(&fresh));

    let body = h.client.call(JOBS, CallOptions::get()).await.unwrap();

    assert_eq!(body["result"], "ok");
    assert_eq!(h.transport.calls(REFRESH), 1);
    let jobs = h.transport.requests_to(JOBS);
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].bearer(), Some(stale.as_str()));
    assert_eq!(jobs[1].bearer(), Some(fresh.as_str()));
    assert_eq!(h.stored_token(), Some(fresh));
}

#[tokio::test]
async fn retry_outcome_is_returned_as_is() {
    let h = harness();
    h.seed(&live_token("USER"), "user");
    h.transport
        .respond(JOBS, 401, json!({}))
        .respond(JOBS, 401, json!({ "message": "Still no" }))
        .respond(REFRESH, 200, token_envelope(&live_token("USER")));

    let err = h.client.call(JOBS, CallOptions::get()).await.unwrap_err();

    assert!(matches!(err, ApiError::Http { status: 401, ref message } if message == "Still no"));
    assert_eq!(h.transport.calls(REFRESH), 1);
    assert_eq!(h.transport.calls(JOBS), 2);
}

#[tokio::test]
async fn failed_refresh_after_401_is_auth_required_without_retry() {
    let h = harness();
    h.seed(&live_token("USER"), "user");
    h.transport
        .respond(JOBS, 401, json!({}))
        .respond(REFRESH, 401, json!({}));

    let err = h.client.call(JOBS, CallOptions::get()).await.unwrap_err();

    assert!(err.is_auth_required());
    assert_eq!(err.to_code(), "AUTH_REQUIRED");
    assert_eq!(h.transport.calls(JOBS), 1);
    assert_eq!(h.transport.calls(REFRESH), 1);
    assert_eq!(h.stored_token(), None);
}

#[tokio::test]
async fn optional_auth_falls_back_to_anonymous_retry() {
    let h = harness();
    h.seed(&live_token("USER"), "user");
    h.transport
        .respond(JOBS, 401, json!({}))
        .respond(JOBS, 200, json!({ "result": [] }))
        .respond(REFRESH, 401, json!({}));

    let options = CallOptions::get().auth(AuthMode::Optional);
    h.client.call(JOBS, options).await.unwrap();

    let jobs = h.transport.requests_to(JOBS);
    assert_eq!(jobs.len(), 2);
    assert!(jobs[1].headers.get(AUTHORIZATION).is_none());
}

#[tokio::test]
async fn anonymous_calls_never_refresh() {
    let h = harness();
    h.seed(&expired_token("USER"), "user");
    h.transport.respond(JOBS, 401, json!({ "message": "Login required" }));

    let err = h
        .client
        .call(JOBS, CallOptions::get().anonymous())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(h.transport.calls(REFRESH), 0);
    assert!(h.transport.requests_to(JOBS)[0].headers.get(AUTHORIZATION).is_none());
    // The expired token is left for the next authenticated call to refresh.
    assert!(h.stored_token().is_some());
}

// ── Other failures ──────────────────────────────────────────────────────────

#[tokio::test]
async fn non_401_errors_are_not_retried() {
    for status in [400u16, 403, 404, 409, 500, 503] {
        let h = harness();
        h.seed(&live_token("USER"), "user");
        h.transport
            .respond(JOBS, status, json!({ "code": 4000, "message": "Rejected by backend" }));

        let err = h.client.call(JOBS, CallOptions::get()).await.unwrap_err();

        match err {
            ApiError::Http { status: got, message } => {
                assert_eq!(got, status);
                assert_eq!(message, "Rejected by backend");
            }
            other => panic!("expected HTTP_ERROR for {}, got {:?}", status, other),
        }
        assert_eq!(h.transport.calls(JOBS), 1);
        assert_eq!(h.transport.calls(REFRESH), 0);
        assert!(h.stored_token().is_some());
    }
}

#[tokio::test]
async fn transport_failure_is_network_error() {
    let h = harness();
    h.seed(&live_token("USER"), "user");
    h.transport.fail(JOBS);

    let err = h.client.call(JOBS, CallOptions::get()).await.unwrap_err();

    assert_eq!(err.to_code(), "NETWORK_ERROR");
    assert_eq!(h.transport.calls(JOBS), 1);
    assert_eq!(h.transport.calls(REFRESH), 0);
}

#[tokio::test]
async fn non_json_success_is_parse_error() {
    let h = harness();
    h.seed(&live_token("USER"), "user");
    h.transport.respond_raw(JOBS, 200, "<!doctype html>");

    let err = h.client.call(JOBS, CallOptions::get()).await.unwrap_err();
    assert_eq!(err.to_code(), "PARSE_ERROR");
}

#[tokio::test]
async fn missing_result_is_parse_error_for_call_result() {
    let h = harness();
    h.seed(&live_token("USER"), "user");
    h.transport.respond(JOBS, 200, json!({ "code": 1000 }));

    let err = h
        .client
        .call_result::<Value>(JOBS, CallOptions::get())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)));
}

#[tokio::test]
async fn empty_success_body_is_null() {
    let h = harness();
    h.seed(&live_token("USER"), "user");
    h.transport.respond(JOBS, 204, Value::Null);

    let body = h.client.call(JOBS, CallOptions::delete()).await.unwrap();
    assert!(body.is_null());
}
