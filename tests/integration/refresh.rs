//! Rotation credential lifecycle tests.

use std::collections::HashMap;

use http::StatusCode;

use crate::helpers::TestApp;

async fn do_refresh(app: &TestApp, cookies: &HashMap<String, String>) -> crate::helpers::TestResponse {
    app.request("POST", "/api/auth/refresh", None, Some(cookies)).await
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_sequential_rotation_and_stale_reuse() {
    let app = TestApp::new().await;
    let first = app.register_and_login("r@x.com", "Passw0rd!").await;

    // Rotate three times, each time with the freshest credential.
    let mut current = first.clone();
    for _ in 0..3 {
        let response = do_refresh(&app, &current).await;
        assert_eq!(response.status, StatusCode::OK);
        let mut next = current.clone();
        next.extend(response.cookies.clone());
        assert_ne!(
            current.get("agora_refresh"),
            next.get("agora_refresh"),
            "rotation must replace the credential"
        );
        current = next;
    }

    // The first-generation credential, long since rotated away, is dead.
    let replay = do_refresh(&app, &first).await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        replay.body.get("error").unwrap().as_str().unwrap(),
        "SESSION_INVALID",
        "reuse must surface as the generic session failure"
    );
    // Failure clears all three cookies.
    assert_eq!(replay.cookies.get("agora_access").unwrap(), "");
    assert_eq!(replay.cookies.get("agora_refresh").unwrap(), "");
    assert_eq!(replay.cookies.get("agora_session").unwrap(), "");
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_reuse_of_revoked_credential_kills_session() {
    let app = TestApp::new().await;
    let first = app.register_and_login("theft@x.com", "Passw0rd!").await;

    // Legitimate client rotates; the attacker's stolen copy is now stale.
    let rotated = do_refresh(&app, &first).await;
    assert_eq!(rotated.status, StatusCode::OK);
    let mut fresh = first.clone();
    fresh.extend(rotated.cookies.clone());

    // Attacker replays the stale credential: rejected, and the session is
    // revoked as a precaution.
    let replay = do_refresh(&app, &first).await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);

    // The legitimate client's freshly rotated credential dies with the
    // session — whole-session cutoff, not per-token.
    let after = do_refresh(&app, &fresh).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_concurrent_rotation_exactly_one_wins() {
    let app = TestApp::new().await;
    let cookies = app.register_and_login("race@x.com", "Passw0rd!").await;

    let (a, b) = tokio::join!(do_refresh(&app, &cookies), do_refresh(&app, &cookies));

    let successes = [a.status, b.status]
        .iter()
        .filter(|s| **s == StatusCode::OK)
        .count();
    assert_eq!(successes, 1, "exactly one concurrent rotation may succeed");
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_rotation_after_session_revocation_fails() {
    let app = TestApp::new().await;
    let cookies = app.register_and_login("rev@x.com", "Passw0rd!").await;

    let logout = app
        .request("POST", "/api/auth/logout", None, Some(&cookies))
        .await;
    assert_eq!(logout.status, StatusCode::OK);

    // The cascade revoked the rotation credential with the session.
    let response = do_refresh(&app, &cookies).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_refresh_without_cookie_fails_and_clears() {
    let app = TestApp::new().await;

    let response = app.request("POST", "/api/auth/refresh", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.cookies.get("agora_refresh").unwrap(), "");
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_rotated_access_credential_authenticates() {
    let app = TestApp::new().await;
    let cookies = app.register_and_login("fresh@x.com", "Passw0rd!").await;

    let rotated = do_refresh(&app, &cookies).await;
    assert_eq!(rotated.status, StatusCode::OK);

    let mut fresh = cookies.clone();
    fresh.extend(rotated.cookies.clone());

    let me = app.request("GET", "/api/auth/me", None, Some(&fresh)).await;
    assert_eq!(me.status, StatusCode::OK);

    // The session now binds the new credential; the pre-rotation access
    // token no longer matches the stored hash.
    let stale = app.request("GET", "/api/auth/me", None, Some(&cookies)).await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);
}
