//! Login, logout, and authentication gate tests.

use http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_register_login_protected_logout_cycle() {
    let app = TestApp::new().await;

    let cookies = app.register_and_login("a@x.com", "Passw0rd!").await;
    assert!(cookies.contains_key("agora_access"));
    assert!(cookies.contains_key("agora_refresh"));
    assert!(cookies.contains_key("agora_session"));

    // Protected call succeeds with the issued credentials.
    let me = app.request("GET", "/api/auth/me", None, Some(&cookies)).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body.get("email").unwrap().as_str().unwrap(), "a@x.com");
    // The response body never carries a credential.
    assert!(me.body.get("password_hash").is_none());

    // Logout revokes the session and clears the cookies.
    let logout = app
        .request("POST", "/api/auth/logout", None, Some(&cookies))
        .await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.cookies.get("agora_access").unwrap(), "");

    // The old short-lived credential is dead immediately.
    let after = app.request("GET", "/api/auth/me", None, Some(&cookies)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        after.body.get("error").unwrap().as_str().unwrap(),
        "SESSION_INVALID"
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_login_failure_is_uniform_across_causes() {
    let app = TestApp::new().await;
    app.register("known@x.com", "Passw0rd!").await;

    let wrong_password = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "email": "known@x.com", "password": "nope" })),
            None,
        )
        .await;
    let unknown_user = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "email": "nobody@x.com", "password": "nope" })),
            None,
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    // Account enumeration resistance: byte-identical bodies.
    assert_eq!(wrong_password.body, unknown_user.body);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_deactivated_account_cannot_login() {
    let app = TestApp::new().await;
    app.register("gone@x.com", "Passw0rd!").await;

    sqlx::query("UPDATE users SET is_active = FALSE WHERE email = 'gone@x.com'")
        .execute(&app.db_pool)
        .await
        .unwrap();

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "email": "gone@x.com", "password": "Passw0rd!" })),
            None,
        )
        .await;

    // Same uniform failure as a wrong password.
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.body.get("error").unwrap().as_str().unwrap(),
        "INVALID_CREDENTIAL"
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_protected_endpoint_without_cookies() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/auth/me", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_tampered_access_cookie_rejected() {
    let app = TestApp::new().await;
    let mut cookies = app.register_and_login("t@x.com", "Passw0rd!").await;

    let access = cookies.get("agora_access").unwrap().clone();
    cookies.insert("agora_access".to_string(), format!("{access}x"));

    let response = app.request("GET", "/api/auth/me", None, Some(&cookies)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_external_identity_linking_is_idempotent() {
    use agora_service::identity::ExternalProfile;

    let app = TestApp::new().await;
    app.register("a@x.com", "Passw0rd!").await;

    let profile = ExternalProfile {
        provider: "acme".to_string(),
        subject: "acme:subject-1".to_string(),
        email: "a@x.com".to_string(),
        display_name: Some("A".to_string()),
        avatar_url: None,
    };

    // First callback links the existing password account.
    let first = app
        .state
        .identity_resolver
        .resolve_external(&profile, None)
        .await
        .unwrap();
    assert!(first.email_verified);
    assert_eq!(first.oauth_id.as_deref(), Some("acme:subject-1"));
    assert!(first.has_password());

    // Second callback is a no-op on the link step: same identity, no
    // duplicate row.
    let second = app
        .state
        .identity_resolver
        .resolve_external(&profile, None)
        .await
        .unwrap();
    assert_eq!(first.id, second.id);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = 'a@x.com'")
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_federated_account_cannot_password_login() {
    use agora_service::identity::ExternalProfile;

    let app = TestApp::new().await;

    let profile = ExternalProfile {
        provider: "acme".to_string(),
        subject: "acme:subject-2".to_string(),
        email: "fed@x.com".to_string(),
        display_name: None,
        avatar_url: None,
    };
    app.state
        .identity_resolver
        .resolve_external(&profile, None)
        .await
        .unwrap();

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "email": "fed@x.com", "password": "anything" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.body.get("error").unwrap().as_str().unwrap(),
        "INVALID_CREDENTIAL"
    );
}
