//! Password reset exchange tests.

use http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_reset_request_is_always_success() {
    let app = TestApp::new().await;

    let unknown = app
        .request(
            "POST",
            "/api/auth/password-reset/request",
            Some(serde_json::json!({ "email": "nobody@x.com" })),
            None,
        )
        .await;
    assert_eq!(unknown.status, StatusCode::OK);

    app.register("real@x.com", "Passw0rd!").await;
    let known = app
        .request(
            "POST",
            "/api/auth/password-reset/request",
            Some(serde_json::json!({ "email": "real@x.com" })),
            None,
        )
        .await;
    assert_eq!(known.status, StatusCode::OK);

    // Identical bodies: the response must not confirm account existence.
    assert_eq!(unknown.body, known.body);

    // But only the real account got a code.
    assert!(app.delivery.last_code_for("nobody@x.com").is_none());
    assert!(app.delivery.last_code_for("real@x.com").is_some());
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_commit_requires_verified_code_and_revokes_trust() {
    let app = TestApp::new().await;
    let cookies = app.register_and_login("a@x.com", "Passw0rd!").await;

    app.request(
        "POST",
        "/api/auth/password-reset/request",
        Some(serde_json::json!({ "email": "a@x.com" })),
        None,
    )
    .await;
    let code = app.delivery.last_code_for("a@x.com").unwrap();

    // Correct but not-yet-verified code: commit must fail with a state error.
    let premature = app
        .request(
            "POST",
            "/api/auth/password-reset/commit",
            Some(serde_json::json!({
                "email": "a@x.com", "code": code, "new_password": "N3w-Passw0rd!"
            })),
            None,
        )
        .await;
    assert_eq!(premature.status, StatusCode::BAD_REQUEST);

    // Verify, then commit.
    let verify = app
        .request(
            "POST",
            "/api/auth/password-reset/verify",
            Some(serde_json::json!({ "email": "a@x.com", "code": code })),
            None,
        )
        .await;
    assert_eq!(verify.status, StatusCode::OK);
    assert_eq!(verify.body.get("verified").unwrap(), true);

    let commit = app
        .request(
            "POST",
            "/api/auth/password-reset/commit",
            Some(serde_json::json!({
                "email": "a@x.com", "code": code, "new_password": "N3w-Passw0rd!"
            })),
            None,
        )
        .await;
    assert_eq!(commit.status, StatusCode::OK);

    // Any session that existed before the reset is now invalid.
    let stale = app.request("GET", "/api/auth/me", None, Some(&cookies)).await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);

    // Old password dead, new password works.
    let old = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "email": "a@x.com", "password": "Passw0rd!" })),
            None,
        )
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);
    app.login("a@x.com", "N3w-Passw0rd!").await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_attempt_budget_fails_closed() {
    let app = TestApp::new().await;
    app.register("b@x.com", "Passw0rd!").await;

    app.request(
        "POST",
        "/api/auth/password-reset/request",
        Some(serde_json::json!({ "email": "b@x.com" })),
        None,
    )
    .await;
    let code = app.delivery.last_code_for("b@x.com").unwrap();

    // Burn the whole budget on wrong codes.
    for _ in 0..5 {
        let response = app
            .request(
                "POST",
                "/api/auth/password-reset/verify",
                Some(serde_json::json!({ "email": "b@x.com", "code": "000000" })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    // The sixth call fails even with the correct code.
    let exhausted = app
        .request(
            "POST",
            "/api/auth/password-reset/verify",
            Some(serde_json::json!({ "email": "b@x.com", "code": code })),
            None,
        )
        .await;
    assert_eq!(exhausted.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        exhausted.body.get("error").unwrap().as_str().unwrap(),
        "RESET_CODE_ATTEMPTS_EXCEEDED"
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_new_request_supersedes_prior_code() {
    let app = TestApp::new().await;
    app.register("c@x.com", "Passw0rd!").await;

    app.request(
        "POST",
        "/api/auth/password-reset/request",
        Some(serde_json::json!({ "email": "c@x.com" })),
        None,
    )
    .await;
    let first_code = app.delivery.last_code_for("c@x.com").unwrap();

    app.request(
        "POST",
        "/api/auth/password-reset/request",
        Some(serde_json::json!({ "email": "c@x.com" })),
        None,
    )
    .await;
    let second_code = app.delivery.last_code_for("c@x.com").unwrap();

    // The superseded code no longer verifies; the fresh one does.
    if first_code != second_code {
        let stale = app
            .request(
                "POST",
                "/api/auth/password-reset/verify",
                Some(serde_json::json!({ "email": "c@x.com", "code": first_code })),
                None,
            )
            .await;
        assert_eq!(stale.status, StatusCode::BAD_REQUEST);
    }

    let fresh = app
        .request(
            "POST",
            "/api/auth/password-reset/verify",
            Some(serde_json::json!({ "email": "c@x.com", "code": second_code })),
            None,
        )
        .await;
    assert_eq!(fresh.status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_code_cannot_be_committed_twice() {
    let app = TestApp::new().await;
    app.register("d@x.com", "Passw0rd!").await;

    app.request(
        "POST",
        "/api/auth/password-reset/request",
        Some(serde_json::json!({ "email": "d@x.com" })),
        None,
    )
    .await;
    let code = app.delivery.last_code_for("d@x.com").unwrap();

    app.request(
        "POST",
        "/api/auth/password-reset/verify",
        Some(serde_json::json!({ "email": "d@x.com", "code": code })),
        None,
    )
    .await;

    let first = app
        .request(
            "POST",
            "/api/auth/password-reset/commit",
            Some(serde_json::json!({
                "email": "d@x.com", "code": code, "new_password": "N3w-Passw0rd!"
            })),
            None,
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);

    // verified → used happened exactly once; a second commit is rejected.
    let second = app
        .request(
            "POST",
            "/api/auth/password-reset/commit",
            Some(serde_json::json!({
                "email": "d@x.com", "code": code, "new_password": "An0ther-Pass!"
            })),
            None,
        )
        .await;
    assert_eq!(second.status, StatusCode::BAD_REQUEST);
}
