mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::authenticator_with;
use common::TestApp;
use common::ADMIN_PASSWORD;
use common::ALICE_PASSWORD;
use common::BOB_PASSWORD;
use common::CAROL_PASSWORD;
use serde_json::json;

const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::spawn();

    let response = app.get("/health", Some("not-an-envelope")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "UP");
}

#[tokio::test]
async fn test_login_success() {
    let app = TestApp::spawn();

    let response = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "alice@example.com", "password": ALICE_PASSWORD }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);

    let data = &response.body["data"];
    assert!(data["token"].is_string());
    assert_eq!(data["user"]["id"], app.alice.id.to_string());
    assert_eq!(data["user"]["email"], "alice@example.com");
    assert_eq!(
        data["user"]["authorities"],
        json!(["ROLE_USER", "USER:DELETE", "USER:READ", "USER:UPDATE"])
    );
    assert!(!data["user"].to_string().contains("password"));
}

#[tokio::test]
async fn test_login_ignores_bearer_header_on_public_path() {
    let app = TestApp::spawn();

    let response = app
        .post(
            "/api/auth/login",
            Some("garbage"),
            json!({ "email": "bob@example.com", "password": BOB_PASSWORD }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_token_identifies_same_principal() {
    let app = TestApp::spawn();
    let token = app.login("alice@example.com", ALICE_PASSWORD).await;

    let response = app.get("/api/auth/me", Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["id"], app.alice.id.to_string());
    assert_eq!(response.body["data"]["email"], "alice@example.com");
    assert_eq!(response.body["data"]["name"], "Alice");
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_are_indistinguishable() {
    let app = TestApp::spawn();

    let unknown = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "nobody@example.com", "password": ALICE_PASSWORD }),
        )
        .await;
    let wrong_password = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "alice@example.com", "password": "wrong" }),
        )
        .await;
    let malformed_email = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "alice", "password": ALICE_PASSWORD }),
        )
        .await;

    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(malformed_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.body, wrong_password.body);
    assert_eq!(unknown.body, malformed_email.body);
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = TestApp::spawn();

    let response = app.get("/api/auth/me", None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), "Authentication required");
}

#[tokio::test]
async fn test_non_bearer_authorization_is_unauthenticated() {
    let app = TestApp::spawn();

    let response = app
        .get_with_authorization("/api/auth/me", "Basic x")
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), "Authentication required");
}

#[tokio::test]
async fn test_envelope_from_foreign_key_is_rejected() {
    let app = TestApp::spawn();
    let foreign = authenticator_with(&[7u8; 32], Duration::minutes(60));
    let token = foreign
        .issue_access_token(&app.alice.principal())
        .expect("Failed to issue token");

    let response = app.get("/api/auth/me", Some(&token)).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), INVALID_TOKEN_MESSAGE);
}

#[tokio::test]
async fn test_expired_token_in_valid_envelope_is_rejected() {
    let app = TestApp::spawn();
    let expired = app
        .authenticator
        .token_codec()
        .issue(&app.alice.principal(), Duration::seconds(-10))
        .expect("Failed to issue token");
    let envelope = app
        .authenticator
        .encryptor()
        .encrypt(&expired)
        .expect("Failed to encrypt token");

    let response = app.get("/api/auth/me", Some(&envelope)).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), INVALID_TOKEN_MESSAGE);
}

#[tokio::test]
async fn test_tampered_envelope_is_rejected() {
    let app = TestApp::spawn();
    let token = app.login("alice@example.com", ALICE_PASSWORD).await;

    let mut chars: Vec<char> = token.chars().collect();
    chars[4] = if chars[4] == 'A' { 'B' } else { 'A' };
    let tampered: String = chars.into_iter().collect();

    let response = app.get("/api/auth/me", Some(&tampered)).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), INVALID_TOKEN_MESSAGE);
}

#[tokio::test]
async fn test_bare_signed_token_is_rejected() {
    let app = TestApp::spawn();
    let bare = app
        .authenticator
        .token_codec()
        .issue(&app.alice.principal(), Duration::minutes(5))
        .expect("Failed to issue token");

    let response = app.get("/api/auth/me", Some(&bare)).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.message(), INVALID_TOKEN_MESSAGE);
}

#[tokio::test]
async fn test_get_user_requires_read_authority() {
    let app = TestApp::spawn();
    let carol = app.login("carol@example.com", CAROL_PASSWORD).await;
    let alice = app.login("alice@example.com", ALICE_PASSWORD).await;
    let path = format!("/api/users/{}", app.bob.id);

    let forbidden = app.get(&path, Some(&carol)).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let allowed = app.get(&path, Some(&alice)).await;
    assert_eq!(allowed.status, StatusCode::OK);
    assert_eq!(allowed.body["data"]["email"], "bob@example.com");
    assert_eq!(allowed.body["data"]["roles"], json!(["USER"]));
    assert!(allowed.body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_get_user_not_found_and_invalid_id() {
    let app = TestApp::spawn();
    let token = app.login("alice@example.com", ALICE_PASSWORD).await;

    let missing = app
        .get(&format!("/api/users/{}", uuid::Uuid::new_v4()), Some(&token))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let invalid = app.get("/api/users/12345", Some(&token)).await;
    assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_update_other_user_is_forbidden() {
    let app = TestApp::spawn();
    let token = app.login("alice@example.com", ALICE_PASSWORD).await;

    let response = app
        .patch(
            &format!("/api/users/{}", app.bob.id),
            &token,
            json!({ "name": "Mallory" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    let bob = app.repository.get(&app.bob.id).expect("Bob was removed");
    assert_eq!(bob.profile.name.as_deref(), Some("Bob"));
}

#[tokio::test]
async fn test_owner_and_admin_may_update() {
    let app = TestApp::spawn();
    let alice = app.login("alice@example.com", ALICE_PASSWORD).await;
    let admin = app.login("admin@example.com", ADMIN_PASSWORD).await;

    let own = app
        .patch(
            &format!("/api/users/{}", app.alice.id),
            &alice,
            json!({ "surname": "Liddell", "phoneNumber": "+441234" }),
        )
        .await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["data"]["surname"], "Liddell");
    assert_eq!(own.body["data"]["phoneNumber"], "+441234");
    assert!(own.body["data"]["createdAt"].is_string());

    let by_admin = app
        .patch(
            &format!("/api/users/{}", app.bob.id),
            &admin,
            json!({ "name": "Robert" }),
        )
        .await;
    assert_eq!(by_admin.status, StatusCode::OK);
    assert_eq!(by_admin.body["data"]["name"], "Robert");
}

#[tokio::test]
async fn test_change_password_is_strictly_owner_only() {
    let app = TestApp::spawn();
    let admin = app.login("admin@example.com", ADMIN_PASSWORD).await;
    let bob = app.login("bob@example.com", BOB_PASSWORD).await;
    let path = format!("/api/users/{}/password", app.bob.id);
    let body = json!({ "currentPassword": BOB_PASSWORD, "newPassword": "bob-new-pass" });

    let by_admin = app.put(&path, &admin, body.clone()).await;
    assert_eq!(by_admin.status, StatusCode::FORBIDDEN);

    let by_owner = app.put(&path, &bob, body).await;
    assert_eq!(by_owner.status, StatusCode::OK);

    let old = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "bob@example.com", "password": BOB_PASSWORD }),
        )
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);

    app.login("bob@example.com", "bob-new-pass").await;
}

#[tokio::test]
async fn test_change_password_wrong_current_password() {
    let app = TestApp::spawn();
    let alice = app.login("alice@example.com", ALICE_PASSWORD).await;

    let response = app
        .put(
            &format!("/api/users/{}/password", app.alice.id),
            &alice,
            json!({ "currentPassword": "guess", "newPassword": "alice-new-pass" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_user_requires_create_authority() {
    let app = TestApp::spawn();
    let alice = app.login("alice@example.com", ALICE_PASSWORD).await;
    let body = json!({
        "email": "dave@example.com",
        "password": "dave-pass",
        "name": "Dave",
        "roleIds": [app.user_role.0],
    });

    let forbidden = app.post("/api/users", Some(&alice), body.clone()).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let admin = app.login("admin@example.com", ADMIN_PASSWORD).await;
    let created = app.post("/api/users", Some(&admin), body).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["data"]["email"], "dave@example.com");
    assert_eq!(created.body["data"]["roles"], json!(["USER"]));
    assert_eq!(created.body["data"]["activated"], true);

    let token = app.login("dave@example.com", "dave-pass").await;
    let me = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(me.body["data"]["id"], created.body["data"]["id"]);
}

#[tokio::test]
async fn test_create_user_conflicts_and_unknown_roles() {
    let app = TestApp::spawn();
    let admin = app.login("admin@example.com", ADMIN_PASSWORD).await;

    let duplicate = app
        .post(
            "/api/users",
            Some(&admin),
            json!({ "email": "alice@example.com", "password": "x-pass" }),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert!(duplicate.message().contains("already exists"));

    let unknown_role = app
        .post(
            "/api/users",
            Some(&admin),
            json!({
                "email": "erin@example.com",
                "password": "erin-pass",
                "roleIds": [app.admin_role.0, uuid::Uuid::new_v4()],
            }),
        )
        .await;
    assert_eq!(unknown_role.status, StatusCode::NOT_FOUND);

    let invalid_email = app
        .post(
            "/api/users",
            Some(&admin),
            json!({ "email": "erin", "password": "erin-pass" }),
        )
        .await;
    assert_eq!(invalid_email.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_delete_user_ownership() {
    let app = TestApp::spawn();
    let alice = app.login("alice@example.com", ALICE_PASSWORD).await;
    let admin = app.login("admin@example.com", ADMIN_PASSWORD).await;
    let path = format!("/api/users/{}", app.bob.id);

    let forbidden = app.delete(&path, &alice).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert!(app.repository.get(&app.bob.id).is_some());

    let deleted = app.delete(&path, &admin).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let gone = app.get(&path, Some(&admin)).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_token_outlives_account_changes() {
    let app = TestApp::spawn();
    let alice = app.login("alice@example.com", ALICE_PASSWORD).await;
    let admin = app.login("admin@example.com", ADMIN_PASSWORD).await;

    app.delete(&format!("/api/users/{}", app.alice.id), &admin)
        .await;

    // Tokens are self-contained; nothing is looked up per request.
    let response = app.get("/api/auth/me", Some(&alice)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["id"], app.alice.id.to_string());
}
