/// Common test utilities for integration tests
///
/// Shared infrastructure:
/// - Test database setup (skips cleanly when DATABASE_URL is unset)
/// - A recording notifier double standing in for SMTP
/// - Request helpers driving the router in-process via tower

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use tasklist_api::app::{build_router, AppState};
use tasklist_api::config::{ApiConfig, Config, GoogleConfig, JwtConfig};
use tasklist_shared::db::{migrations, pool::DatabaseConfig};
use tasklist_shared::mail::{MailConfig, NotifyError, Notifier};
use tower::ServiceExt;
use uuid::Uuid;

/// Secret used for signing test tokens
pub const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// A recorded notification: (email, name, task title)
pub type SentNotification = (String, String, String);

/// Notifier double that records every call instead of sending mail
///
/// With `fail` set it returns an error on every call, for verifying that
/// notification failures never surface to the API caller.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<SentNotification>>>,
    pub fail: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn task_created(
        &self,
        to_email: &str,
        to_name: &str,
        task_title: &str,
    ) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Transport("simulated outage".to_string()));
        }

        self.sent.lock().unwrap().push((
            to_email.to_string(),
            to_name.to_string(),
            task_title.to_string(),
        ));
        Ok(())
    }
}

/// Test context: database, in-process router, recording notifier
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub notifier: RecordingNotifier,
    run_id: String,
}

impl TestContext {
    /// Creates a context, or None when DATABASE_URL is unset
    pub async fn try_new() -> Option<Self> {
        Self::try_with_notifier(RecordingNotifier::default()).await
    }

    /// Creates a context with a failing notifier double
    pub async fn try_new_failing_notifier() -> Option<Self> {
        Self::try_with_notifier(RecordingNotifier {
            fail: true,
            ..Default::default()
        })
        .await
    }

    async fn try_with_notifier(notifier: RecordingNotifier) -> Option<Self> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set; skipping database-backed test");
            return None;
        };

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: database_url.clone(),
                ..Default::default()
            },
            jwt: JwtConfig {
                secret: TEST_JWT_SECRET.to_string(),
                ttl_hours: 24,
            },
            // Configured so the external endpoint exercises token
            // verification instead of bailing out as unconfigured
            google: GoogleConfig {
                client_id: Some("test-client-id".to_string()),
            },
            mail: MailConfig {
                from: "Tasklist <noreply@example.com>".to_string(),
                ..Default::default()
            },
        };

        let db = PgPool::connect(&database_url)
            .await
            .expect("Should connect to test database");
        migrations::run_migrations(&db)
            .await
            .expect("Should run migrations");

        let state = AppState::new(db.clone(), config, Arc::new(notifier.clone()));
        let app = build_router(state);

        Some(Self {
            db,
            app,
            notifier,
            run_id: Uuid::new_v4().simple().to_string(),
        })
    }

    /// An email address unique to this context
    pub fn email(&self, local: &str) -> String {
        format!("{}-{}@example.com", local, self.run_id)
    }

    /// Sends a request and returns (status, parsed JSON body)
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Request should not fail at the transport level");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Should read response body");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response should be JSON")
        };

        (status, json)
    }

    /// Registers a user through the API, returning (token, user json)
    pub async fn register(&self, local: &str, name: &str) -> (String, serde_json::Value) {
        let (status, body) = self
            .request(
                "POST",
                "/auth/register",
                None,
                Some(serde_json::json!({
                    "email": self.email(local),
                    "password": "secret-password",
                    "name": name,
                })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        let token = body["token"].as_str().expect("token in response").to_string();
        (token, body["user"].clone())
    }

    /// Removes every user (and cascaded task) this context created
    pub async fn cleanup(&self) {
        sqlx::query("DELETE FROM users WHERE email LIKE $1")
            .bind(format!("%-{}@example.com", self.run_id))
            .execute(&self.db)
            .await
            .expect("Cleanup should succeed");
    }
}
