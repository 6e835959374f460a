#![allow(dead_code)]

use std::net::SocketAddr;

use reqwest::{Client, Response, StatusCode};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tempfile::TempDir;
use uuid::Uuid;

use showcase::config::{BootstrapAdmin, Config};

pub const ADMIN_EMAIL: &str = "admin@test.com";
pub const ADMIN_PASSWORD: &str = "password123";

/// Smallest valid PNG: 1x1 transparent pixel.
pub const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f, 0x15, 0xc4,
    0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae,
    0x42, 0x60, 0x82,
];

/// A running test server instance with a dedicated test database and media root.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
    pub media: TempDir,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed")
    }

    /// Submit the index form url-encoded.
    pub async fn post_project(&self, data: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url("/projects/"))
            .form(data)
            .send()
            .await
            .expect("post project failed")
    }

    /// Submit the index form as multipart with an attached image.
    pub async fn post_project_with_image(
        &self,
        title: &str,
        description: &str,
        filename: &str,
        bytes: &'static [u8],
    ) -> Response {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("image/png")
            .unwrap();
        let form = reqwest::multipart::Form::new()
            .text("title", title.to_string())
            .text("description", description.to_string())
            .part("image", part);
        self.client
            .post(self.url("/projects/"))
            .multipart(form)
            .send()
            .await
            .expect("multipart post failed")
    }

    /// Post a body verbatim with the given content type.
    pub async fn post_raw(&self, path: &str, content_type: &str, body: &'static str) -> Response {
        self.client
            .post(self.url(path))
            .header("content-type", content_type)
            .body(body)
            .send()
            .await
            .expect("raw post failed")
    }

    pub async fn project_count(&self) -> i64 {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
            .fetch_one(&self.pool)
            .await
            .unwrap();
        row.0
    }

    /// Log in to the console and return the session cookie header value.
    pub async fn login(&self, email: &str, password: &str) -> (Option<String>, StatusCode) {
        let resp = self
            .client
            .post(self.url("/admin/login/"))
            .form(&[("email", email), ("password", password)])
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let cookie = resp
            .headers()
            .get_all("set-cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("access_token="))
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        (cookie, status)
    }

    /// Log in as the bootstrap staff account.
    pub async fn admin_session(&self) -> String {
        let (cookie, status) = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(status, StatusCode::SEE_OTHER, "admin login failed");
        cookie.expect("no session cookie set")
    }

    pub async fn get_admin(&self, path: &str, session: &str) -> Response {
        self.client
            .get(self.url(path))
            .header("cookie", session)
            .send()
            .await
            .expect("admin get failed")
    }

    pub async fn post_admin(&self, path: &str, session: &str, data: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .header("cookie", session)
            .form(data)
            .send()
            .await
            .expect("admin post failed")
    }
}

pub fn location(resp: &Response) -> String {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let db_name = format!("showcase_test_{}", Uuid::now_v7().to_string().replace('-', ""));

    // Connect to default postgres DB to create test DB
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let media = tempfile::tempdir().expect("Failed to create media dir");

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        media_root: media.path().to_path_buf(),
        max_upload_size: 1_048_576,
        secure_cookies: false,
        log_level: "warn".to_string(),
        bootstrap_admin: Some(BootstrapAdmin {
            email: ADMIN_EMAIL.to_string(),
            password: ADMIN_PASSWORD.to_string(),
        }),
    };

    showcase::ensure_bootstrap_admin(&pool, &config)
        .await
        .expect("Failed to bootstrap admin");

    let (app, state) = showcase::build_app(pool.clone(), config);
    state.media.ensure_dirs().await.expect("Failed to create media dirs");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
        media,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
