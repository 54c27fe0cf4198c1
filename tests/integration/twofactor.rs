//! Second-factor enrollment and login gating tests.

use http::StatusCode;
use totp_rs::{Algorithm, Secret, TOTP};

use crate::helpers::TestApp;

/// Generate a current code for a base32 secret, the way an authenticator
/// app would.
fn current_code(secret_base32: &str, account: &str) -> String {
    TOTP::new(
        Algorithm::SHA1,
        6,
        2,
        30,
        Secret::Encoded(secret_base32.to_string()).to_bytes().unwrap(),
        Some("Agora".to_string()),
        account.to_string(),
    )
    .unwrap()
    .generate_current()
    .unwrap()
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_enrollment_and_login_gating() {
    let app = TestApp::new().await;
    let cookies = app.register_and_login("tf@x.com", "Passw0rd!").await;

    // Setup: secret, QR, recovery codes — but not yet enforced.
    let setup = app
        .request("POST", "/api/auth/2fa/setup", None, Some(&cookies))
        .await;
    assert_eq!(setup.status, StatusCode::OK);
    let secret = setup.body.get("secret").unwrap().as_str().unwrap().to_string();
    assert!(!setup.body.get("qr_code_base64").unwrap().as_str().unwrap().is_empty());
    let recovery_codes: Vec<String> = setup
        .body
        .get("recovery_codes")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap().to_string())
        .collect();
    assert_eq!(recovery_codes.len(), 10);

    let status = app
        .request("GET", "/api/auth/2fa/status", None, Some(&cookies))
        .await;
    assert_eq!(status.body.get("enabled").unwrap(), false);
    assert_eq!(status.body.get("pending_confirmation").unwrap(), true);

    // Confirm with a live code.
    let confirm = app
        .request(
            "POST",
            "/api/auth/2fa/confirm",
            Some(serde_json::json!({ "code": current_code(&secret, "tf@x.com") })),
            Some(&cookies),
        )
        .await;
    assert_eq!(confirm.status, StatusCode::OK);

    // Login without a code: soft second-factor-required status, no cookies.
    let pending = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "email": "tf@x.com", "password": "Passw0rd!" })),
            None,
        )
        .await;
    assert_eq!(pending.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        pending.body.get("error").unwrap().as_str().unwrap(),
        "SECOND_FACTOR_REQUIRED"
    );
    assert!(pending.cookies.is_empty());

    // Wrong code: the hard failure.
    let wrong = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({
                "email": "tf@x.com", "password": "Passw0rd!", "totp_code": "000000"
            })),
            None,
        )
        .await;
    assert_eq!(
        wrong.body.get("error").unwrap().as_str().unwrap(),
        "SECOND_FACTOR_INVALID"
    );

    // Correct code completes login.
    let complete = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({
                "email": "tf@x.com", "password": "Passw0rd!",
                "totp_code": current_code(&secret, "tf@x.com")
            })),
            None,
        )
        .await;
    assert_eq!(complete.status, StatusCode::OK);
    assert!(complete.cookies.contains_key("agora_access"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_backup_code_works_exactly_once() {
    let app = TestApp::new().await;
    let cookies = app.register_and_login("bc@x.com", "Passw0rd!").await;

    let setup = app
        .request("POST", "/api/auth/2fa/setup", None, Some(&cookies))
        .await;
    let secret = setup.body.get("secret").unwrap().as_str().unwrap().to_string();
    let backup = setup.body.get("recovery_codes").unwrap().as_array().unwrap()[0]
        .as_str()
        .unwrap()
        .to_string();

    app.request(
        "POST",
        "/api/auth/2fa/confirm",
        Some(serde_json::json!({ "code": current_code(&secret, "bc@x.com") })),
        Some(&cookies),
    )
    .await;

    // A backup code substitutes for the TOTP code.
    let first = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({
                "email": "bc@x.com", "password": "Passw0rd!", "totp_code": backup
            })),
            None,
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);

    // But only once.
    let second = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({
                "email": "bc@x.com", "password": "Passw0rd!", "totp_code": backup
            })),
            None,
        )
        .await;
    assert_eq!(second.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (AGORA_TEST_DATABASE_URL)"]
async fn test_disable_requires_current_password() {
    let app = TestApp::new().await;
    let cookies = app.register_and_login("dis@x.com", "Passw0rd!").await;

    let setup = app
        .request("POST", "/api/auth/2fa/setup", None, Some(&cookies))
        .await;
    let secret = setup.body.get("secret").unwrap().as_str().unwrap().to_string();
    app.request(
        "POST",
        "/api/auth/2fa/confirm",
        Some(serde_json::json!({ "code": current_code(&secret, "dis@x.com") })),
        Some(&cookies),
    )
    .await;

    let wrong = app
        .request(
            "POST",
            "/api/auth/2fa/disable",
            Some(serde_json::json!({ "password": "not-it" })),
            Some(&cookies),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let right = app
        .request(
            "POST",
            "/api/auth/2fa/disable",
            Some(serde_json::json!({ "password": "Passw0rd!" })),
            Some(&cookies),
        )
        .await;
    assert_eq!(right.status, StatusCode::OK);

    // Login no longer demands a second factor.
    app.login("dis@x.com", "Passw0rd!").await;
}
