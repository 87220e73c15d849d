#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::OnceLock;

use async_trait::async_trait;
use auth::Authenticator;
use auth::JwtHandler;
use auth::Permission;
use auth::Profile;
use auth::Role;
use auth::TokenCodec;
use auth::TransportEncryptor;
use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use chrono::Duration;
use chrono::Utc;
use http_body_util::BodyExt;
use identity_service::domain::user::credentials::CredentialVerifier;
use identity_service::domain::user::models::AssignedRole;
use identity_service::domain::user::models::EmailAddress;
use identity_service::domain::user::models::RoleId;
use identity_service::domain::user::models::User;
use identity_service::domain::user::models::UserId;
use identity_service::domain::user::ports::UserRepository;
use identity_service::domain::user::service::UserService;
use identity_service::inbound::http::public_paths::PublicPaths;
use identity_service::inbound::http::router::create_router;
use identity_service::user::errors::UserError;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const SIGNING_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const ENCRYPTION_KEY: [u8; 32] = [42u8; 32];

pub const ADMIN_PASSWORD: &str = "admin-pass";
pub const ALICE_PASSWORD: &str = "alice-pass";
pub const BOB_PASSWORD: &str = "bob-pass";
pub const CAROL_PASSWORD: &str = "carol-pass";

/// In-memory user store with a fixed role catalogue.
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<UserId, User>>,
    roles: Vec<AssignedRole>,
}

impl InMemoryUserRepository {
    pub fn new(roles: Vec<AssignedRole>) -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            roles,
        }
    }

    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn get(&self, id: &UserId) -> Option<User> {
        self.users.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|existing| existing.email == user.email) {
            return Err(UserError::EmailAlreadyExists(user.email.to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|user| &user.email == email)
            .cloned())
    }

    async fn find_roles_by_ids(&self, ids: &[RoleId]) -> Result<Vec<AssignedRole>, UserError> {
        Ok(self
            .roles
            .iter()
            .filter(|assigned| ids.contains(&assigned.id))
            .cloned()
            .collect())
    }

    async fn update(&self, user: User) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();
        if !users.contains_key(&user.id) {
            return Err(UserError::NotFound(user.id.to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: &UserId) -> Result<(), UserError> {
        self.users
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or(UserError::NotFound(id.to_string()))
    }
}

/// Response status and parsed JSON body
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    pub fn message(&self) -> &str {
        self.body["data"]["message"].as_str().unwrap_or_default()
    }
}

/// Test application served in-process through `oneshot`
pub struct TestApp {
    pub router: Router,
    pub authenticator: Arc<Authenticator>,
    pub repository: Arc<InMemoryUserRepository>,
    pub admin_role: RoleId,
    pub user_role: RoleId,
    pub admin: User,
    pub alice: User,
    pub bob: User,
    /// Holds no roles at all
    pub carol: User,
}

pub fn authenticator_with(encryption_key: &[u8; 32], validity: Duration) -> Authenticator {
    Authenticator::new(
        TokenCodec::new(JwtHandler::new(SIGNING_SECRET).expect("Invalid signing secret")),
        TransportEncryptor::new(encryption_key).expect("Invalid encryption key"),
        validity,
    )
}

// Argon2 is slow in debug builds; hash the fixture passwords once per binary.
fn password_hashes() -> &'static [String; 4] {
    static HASHES: OnceLock<[String; 4]> = OnceLock::new();
    HASHES.get_or_init(|| {
        let hasher = auth::PasswordHasher::new();
        [ADMIN_PASSWORD, ALICE_PASSWORD, BOB_PASSWORD, CAROL_PASSWORD]
            .map(|password| hasher.hash(password).expect("Failed to hash password"))
    })
}

fn fixture_user(email: &str, name: &str, password_hash: &str, roles: Vec<AssignedRole>) -> User {
    User {
        id: UserId::new(),
        email: EmailAddress::new(email.to_string()).expect("Invalid fixture email"),
        password_hash: password_hash.to_string(),
        profile: Profile {
            name: Some(name.to_string()),
            surname: None,
            phone_number: None,
        },
        activated: true,
        roles,
        created_at: Utc::now(),
    }
}

impl TestApp {
    pub fn spawn() -> Self {
        let admin_role = AssignedRole {
            id: RoleId(Uuid::new_v4()),
            role: Role::new("ADMIN").with_permissions([
                Permission::new("USER", "CREATE"),
                Permission::new("USER", "READ"),
                Permission::new("USER", "UPDATE"),
                Permission::new("USER", "DELETE"),
            ]),
        };
        let user_role = AssignedRole {
            id: RoleId(Uuid::new_v4()),
            role: Role::new("USER").with_permissions([
                Permission::new("USER", "READ"),
                Permission::new("USER", "UPDATE"),
                Permission::new("USER", "DELETE"),
            ]),
        };

        let [admin_hash, alice_hash, bob_hash, carol_hash] = password_hashes();
        let admin = fixture_user("admin@example.com", "Admin", admin_hash, vec![admin_role.clone()]);
        let alice = fixture_user("alice@example.com", "Alice", alice_hash, vec![user_role.clone()]);
        let bob = fixture_user("bob@example.com", "Bob", bob_hash, vec![user_role.clone()]);
        let carol = fixture_user("carol@example.com", "Carol", carol_hash, Vec::new());

        let repository = Arc::new(InMemoryUserRepository::new(vec![
            admin_role.clone(),
            user_role.clone(),
        ]));
        for user in [&admin, &alice, &bob, &carol] {
            repository.insert(user.clone());
        }

        let authenticator = Arc::new(authenticator_with(&ENCRYPTION_KEY, Duration::minutes(60)));

        let router = create_router(
            Arc::new(UserService::new(Arc::clone(&repository))),
            Arc::new(CredentialVerifier::new(
                Arc::clone(&repository),
                Arc::clone(&authenticator),
            )),
            Arc::clone(&authenticator),
            PublicPaths::new(["/api/auth/login", "/health"]),
        );

        Self {
            router,
            authenticator,
            repository,
            admin_role: admin_role.id,
            user_role: user_role.id,
            admin,
            alice,
            bob,
            carol,
        }
    }

    /// Send a request through the full middleware stack
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let authorization = token.map(|token| format!("Bearer {}", token));
        self.send_with_authorization(method, path, authorization.as_deref(), body)
            .await
    }

    /// Send a request with a raw `Authorization` header value
    pub async fn send_with_authorization(
        &self,
        method: Method,
        path: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(authorization) = authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }

        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Failed to parse response")
        };

        TestResponse { status, body }
    }

    /// Helper to make GET request, optionally with Bearer token
    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, path, token, None).await
    }

    /// Helper to make GET request with a raw `Authorization` header
    pub async fn get_with_authorization(&self, path: &str, authorization: &str) -> TestResponse {
        self.send_with_authorization(Method::GET, path, Some(authorization), None)
            .await
    }

    /// Helper to make POST request, optionally with Bearer token
    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, path, token, Some(body)).await
    }

    /// Helper to make PATCH request with Bearer token
    pub async fn patch(&self, path: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::PATCH, path, Some(token), Some(body)).await
    }

    /// Helper to make PUT request with Bearer token
    pub async fn put(&self, path: &str, token: &str, body: Value) -> TestResponse {
        self.send(Method::PUT, path, Some(token), Some(body)).await
    }

    /// Helper to make DELETE request with Bearer token
    pub async fn delete(&self, path: &str, token: &str) -> TestResponse {
        self.send(Method::DELETE, path, Some(token), None).await
    }

    /// Log in and return the encrypted access token
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post(
                "/api/auth/login",
                None,
                serde_json::json!({ "email": email, "password": password }),
            )
            .await;

        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.body["data"]["token"]
            .as_str()
            .expect("Missing token")
            .to_string()
    }
}
