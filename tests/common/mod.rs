#![allow(dead_code)]

use anyhow::{Context, Result};
use chat_api::auth::hash_password;
use chat_api::database::models::{NewUser, User};
use chat_api::{app, config, database::DatabaseManager, AppState};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use sqlx::PgPool;

pub const PASSWORD: &str = "correct-horse";

/// An in-process server bound to a free port, sharing one pool with the test
pub struct TestServer {
    pub base_url: String,
    pub pool: PgPool,
    client: reqwest::Client,
}

pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub access: String,
    pub refresh: String,
}

/// Start a server for this test, or `None` when no database is configured.
///
/// Each `#[tokio::test]` owns its runtime, so servers are per test rather
/// than shared.
pub async fn server() -> Result<Option<TestServer>> {
    let _ = dotenvy::dotenv();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set; skipping database-backed test");
        return Ok(None);
    }

    let pool = DatabaseManager::connect(&config::config().database)?;
    DatabaseManager::migrate(&pool).await?;

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    let router = app(AppState::new(pool.clone()));
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(Some(TestServer {
        base_url: format!("http://127.0.0.1:{port}"),
        pool,
        client: reqwest::Client::new(),
    }))
}

pub fn unique_username(prefix: &str) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &suffix[..12])
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and return status plus JSON body (`Null` when empty)
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut req = self.client.request(method, self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await?;
        let json = if text.is_empty() { Value::Null } else { serde_json::from_str(&text)? };
        Ok((status, json))
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::POST, path, token, Some(body)).await
    }

    pub async fn patch(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(Method::PATCH, path, Some(token), Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.send(Method::DELETE, path, Some(token), None).await
    }

    /// Insert a user directly so staff accounts can be created, then log in
    pub async fn user(&self, prefix: &str, is_staff: bool) -> Result<TestUser> {
        let username = unique_username(prefix);
        let user = User::insert(
            &self.pool,
            &NewUser {
                username: username.clone(),
                password_hash: hash_password(PASSWORD)?,
                email: String::new(),
                is_staff,
                is_superuser: false,
            },
        )
        .await?;
        self.login(user.id, &username).await
    }

    pub async fn login(&self, id: i64, username: &str) -> Result<TestUser> {
        let (status, body) = self
            .post("/token/", None, serde_json::json!({ "username": username, "password": PASSWORD }))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {status} {body}");
        Ok(TestUser {
            id,
            username: username.to_string(),
            access: body["access"].as_str().context("missing access")?.to_string(),
            refresh: body["refresh"].as_str().context("missing refresh")?.to_string(),
        })
    }

    /// Create a chat owned by `owner` using a staff token
    pub async fn chat_for(&self, staff: &TestUser, owner: &TestUser) -> Result<i64> {
        let (status, body) = self
            .post("/chats/create/", Some(&staff.access), serde_json::json!({ "user": owner.id }))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "chat create failed: {status} {body}");
        body["id"].as_i64().context("missing chat id")
    }

    pub async fn message_in(&self, author: &TestUser, chat: i64, content: &str) -> Result<i64> {
        let (status, body) = self
            .post(
                "/messages/create/",
                Some(&author.access),
                serde_json::json!({ "chat": chat, "content": content }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "message create failed: {status} {body}");
        body["id"].as_i64().context("missing message id")
    }
}
