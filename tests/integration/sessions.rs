//! Session listing, revocation, and tier gate tests.

use http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_session_listing_marks_current() {
    let app = TestApp::new().await;
    app.register("s@x.com", "Passw0rd!").await;
    let _first = app.login("s@x.com", "Passw0rd!").await;
    let second = app.login("s@x.com", "Passw0rd!").await;

    let listing = app.request("GET", "/api/sessions", None, Some(&second)).await;
    assert_eq!(listing.status, StatusCode::OK);

    let sessions = listing.body.as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    let current_count = sessions
        .iter()
        .filter(|s| s.get("current").unwrap().as_bool().unwrap())
        .count();
    assert_eq!(current_count, 1);

    // No credential material in the listing.
    for session in sessions {
        assert!(session.get("token_hash").is_none());
        assert!(session.get("access_token_hash").is_none());
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_revoking_one_session_cascades_to_its_credentials() {
    let app = TestApp::new().await;
    app.register("s2@x.com", "Passw0rd!").await;
    let victim = app.login("s2@x.com", "Passw0rd!").await;
    let keeper = app.login("s2@x.com", "Passw0rd!").await;

    // Find the session that is not the caller's.
    let listing = app.request("GET", "/api/sessions", None, Some(&keeper)).await;
    let other_id = listing
        .body
        .as_array()
        .unwrap()
        .iter()
        .find(|s| !s.get("current").unwrap().as_bool().unwrap())
        .unwrap()
        .get("id")
        .unwrap()
        .as_str()
        .unwrap()
        .to_string();

    let revoke = app
        .request(
            "DELETE",
            &format!("/api/sessions/{other_id}"),
            None,
            Some(&keeper),
        )
        .await;
    assert_eq!(revoke.status, StatusCode::OK);

    // The revoked session's short-lived credential fails the gate.
    let stale = app.request("GET", "/api/auth/me", None, Some(&victim)).await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);

    // And its rotation credential fails too — the cascade is atomic with
    // the session flag.
    let replay = app
        .request("POST", "/api/auth/refresh", None, Some(&victim))
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);

    // The keeper is untouched.
    let alive = app.request("GET", "/api/auth/me", None, Some(&keeper)).await;
    assert_eq!(alive.status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_revoke_all_includes_caller() {
    let app = TestApp::new().await;
    app.register("s3@x.com", "Passw0rd!").await;
    let _one = app.login("s3@x.com", "Passw0rd!").await;
    let two = app.login("s3@x.com", "Passw0rd!").await;

    let response = app.request("DELETE", "/api/sessions", None, Some(&two)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body.get("count").unwrap().as_u64().unwrap(), 2);
    // The caller's own cookies are cleared, since their session was included.
    assert_eq!(response.cookies.get("agora_access").unwrap(), "");

    let after = app.request("GET", "/api/auth/me", None, Some(&two)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_cannot_revoke_another_users_session() {
    let app = TestApp::new().await;
    let alice = app.register_and_login("alice@x.com", "Passw0rd!").await;
    let bob = app.register_and_login("bob@x.com", "Passw0rd!").await;

    let listing = app.request("GET", "/api/sessions", None, Some(&alice)).await;
    let alice_session = listing.body.as_array().unwrap()[0]
        .get("id")
        .unwrap()
        .as_str()
        .unwrap()
        .to_string();

    // Bob cannot see or revoke Alice's session; the response does not
    // even confirm it exists.
    let response = app
        .request(
            "DELETE",
            &format!("/api/sessions/{alice_session}"),
            None,
            Some(&bob),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let alive = app.request("GET", "/api/auth/me", None, Some(&alice)).await;
    assert_eq!(alive.status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_admin_deactivation_cuts_access_immediately() {
    let app = TestApp::new().await;
    let victim = app.register_and_login("mark@x.com", "Passw0rd!").await;

    app.register("ops@x.com", "Passw0rd!").await;
    app.set_tier("ops@x.com", "admin").await;
    let admin = app.login("ops@x.com", "Passw0rd!").await;

    let victim_id: String =
        sqlx::query_scalar::<_, uuid::Uuid>("SELECT id FROM users WHERE email = 'mark@x.com'")
            .fetch_one(&app.db_pool)
            .await
            .unwrap()
            .to_string();

    let deactivate = app
        .request(
            "PUT",
            &format!("/api/admin/users/{victim_id}/active"),
            Some(serde_json::json!({ "active": false })),
            Some(&admin),
        )
        .await;
    assert_eq!(deactivate.status, StatusCode::OK);

    // Existing credentials die with the sessions, and new logins are
    // refused with the uniform failure.
    let stale = app.request("GET", "/api/auth/me", None, Some(&victim)).await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);

    let refused = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "email": "mark@x.com", "password": "Passw0rd!" })),
            None,
        )
        .await;
    assert_eq!(refused.status, StatusCode::UNAUTHORIZED);

    // Reactivation restores password login.
    let reactivate = app
        .request(
            "PUT",
            &format!("/api/admin/users/{victim_id}/active"),
            Some(serde_json::json!({ "active": true })),
            Some(&admin),
        )
        .await;
    assert_eq!(reactivate.status, StatusCode::OK);
    app.login("mark@x.com", "Passw0rd!").await;
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_tier_gate_rejects_members_independent_of_auth() {
    let app = TestApp::new().await;
    let member = app.register_and_login("m@x.com", "Passw0rd!").await;
    app.register("target@x.com", "Passw0rd!").await;

    let target_id: String =
        sqlx::query_scalar::<_, uuid::Uuid>("SELECT id FROM users WHERE email = 'target@x.com'")
            .fetch_one(&app.db_pool)
            .await
            .unwrap()
            .to_string();

    // Authenticated but outside the allow-list: Forbidden, not another
    // authentication error.
    let denied = app
        .request(
            "DELETE",
            &format!("/api/admin/users/{target_id}/sessions"),
            None,
            Some(&member),
        )
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    // An admin passes the same gate.
    app.register("root@x.com", "Passw0rd!").await;
    app.set_tier("root@x.com", "admin").await;
    let admin = app.login("root@x.com", "Passw0rd!").await;

    let allowed = app
        .request(
            "DELETE",
            &format!("/api/admin/users/{target_id}/sessions"),
            None,
            Some(&admin),
        )
        .await;
    assert_eq!(allowed.status, StatusCode::OK);
}
