use std::sync::Arc;
use std::time::Duration;

use bson::oid::ObjectId;
use common::context::Handler;
use common::prelude::FutureTimeout;
use reqwest::{header, Method, StatusCode};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::api::jwt::{AuthJwtPayload, JwtState};
use crate::config::{ApiConfig, AppConfig};
use crate::global::GlobalState;
use crate::tests::global::mock_global_state;

mod children;
mod steps;

/// An API server on a free local port, backed by the memory store.
pub struct TestServer {
	pub global: Arc<GlobalState>,
	client: reqwest::Client,
	port: u16,
	handler: Handler,
	handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
	pub async fn start() -> Self {
		let port = portpicker::pick_unused_port().expect("failed to pick port");
		let (global, handler) = mock_global_state(AppConfig {
			api: ApiConfig {
				bind_address: format!("127.0.0.1:{}", port).parse().unwrap(),
				tls: None,
			},
			..Default::default()
		})
		.await;

		let handle = tokio::spawn(crate::api::run(global.clone()));

		// We need to wait for the server to start
		tokio::time::sleep(Duration::from_millis(300)).await;

		Self {
			global,
			client: reqwest::Client::new(),
			port,
			handler,
			handle,
		}
	}

	pub fn token(&self, user: ObjectId) -> String {
		AuthJwtPayload::new(user)
			.serialize(&self.global)
			.expect("failed to create token")
	}

	pub async fn send(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> reqwest::Response {
		let mut req = self.client.request(method, format!("http://127.0.0.1:{}{}", self.port, path));

		if let Some(token) = token {
			req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
		}

		if let Some(body) = body {
			req = req.json(&body);
		}

		req.send().await.expect("failed to send request")
	}

	/// Sends a request and reads the body as json, an empty body reads as `null`.
	pub async fn request(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
		let resp = self.send(method, path, token, body).await;
		let status = resp.status();
		let body = resp.text().await.expect("failed to read body");

		if body.is_empty() {
			(status, Value::Null)
		} else {
			(status, serde_json::from_str(&body).expect("body is not json"))
		}
	}

	pub async fn shutdown(self) {
		// The client uses Keep-Alive, so we need to drop it to release the global context
		drop(self.client);
		drop(self.global);

		self.handler
			.cancel()
			.timeout(Duration::from_secs(1))
			.await
			.expect("failed to cancel context");
		self.handle
			.timeout(Duration::from_secs(1))
			.await
			.expect("failed to cancel api")
			.expect("api failed")
			.expect("api failed");
	}
}

#[tokio::test]
async fn test_health() {
	let server = TestServer::start().await;

	let (status, body) = server.request(Method::GET, "/health", None, None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, json!({ "status": "ok" }));

	server.shutdown().await;
}

#[tokio::test]
async fn test_unknown_route() {
	let server = TestServer::start().await;

	let (status, body) = server.request(Method::GET, "/nothing/here", None, None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body, json!({ "message": "not found", "success": false }));

	server.shutdown().await;
}

#[tokio::test]
async fn test_cors_headers() {
	let server = TestServer::start().await;

	let resp = server.send(Method::OPTIONS, "/paddocks", None, None).await;
	assert_eq!(resp.status(), StatusCode::NO_CONTENT);

	let headers = resp.headers();
	assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
	assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, PATCH, DELETE, OPTIONS");
	assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type, Authorization");

	let resp = server.send(Method::GET, "/health", None, None).await;
	assert_eq!(resp.status(), StatusCode::OK);
	assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

	server.shutdown().await;
}

#[tokio::test]
async fn test_auth_middleware() {
	let server = TestServer::start().await;
	let token = server.token(ObjectId::new());

	let (status, _) = server.request(Method::GET, "/paddocks", Some(&token), None).await;
	assert_eq!(status, StatusCode::OK);

	let (status, body) = server.request(Method::GET, "/paddocks", Some("garbage"), None).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(body["success"], json!(false));

	let resp = server
		.client
		.get(format!("http://127.0.0.1:{}/paddocks", server.port))
		.header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
		.send()
		.await
		.expect("failed to send request");
	assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

	// A token signed by someone else.
	let mut other = AppConfig::default();
	other.jwt.secret = "not-the-secret".to_string();
	let (global, handler) = mock_global_state(other).await;
	let foreign = AuthJwtPayload::new(ObjectId::new()).serialize(&global).unwrap();
	drop(global);
	handler.cancel().await;

	let (status, _) = server.request(Method::GET, "/paddocks", Some(&foreign), None).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);

	server.shutdown().await;
}

#[tokio::test]
async fn test_api_bad_bind() {
	let (global, handler) = mock_global_state(AppConfig {
		api: ApiConfig {
			bind_address: "203.0.113.1:1".parse().unwrap(),
			tls: None,
		},
		..Default::default()
	})
	.await;

	assert!(crate::api::run(global).await.is_err());

	handler
		.cancel()
		.timeout(Duration::from_secs(1))
		.await
		.expect("failed to cancel context");
}
