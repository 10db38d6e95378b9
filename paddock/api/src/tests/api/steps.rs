use bson::oid::ObjectId;
use reqwest::{Method, StatusCode};
use serde_json::json;

use super::TestServer;

#[tokio::test]
async fn test_step_lifecycle() {
	let server = TestServer::start().await;
	let owner = ObjectId::new();
	let token = server.token(owner);
	let other = server.token(ObjectId::new());

	let (status, body) = server
		.request(
			Method::POST,
			"/steps",
			None,
			Some(json!({ "step": { "title": "warm up", "owner": owner.to_hex() } })),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(body["step"]["title"], "warm up");
	assert_eq!(body["step"]["owner"], owner.to_hex());
	let id = body["step"]["_id"].as_str().unwrap().to_string();

	let (status, body) = server.request(Method::GET, &format!("/steps/{id}"), Some(&token), None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["step"]["_id"], id);

	let (status, _) = server
		.request(
			Method::PATCH,
			&format!("/steps/{id}"),
			Some(&other),
			Some(json!({ "step": { "title": "stolen" } })),
		)
		.await;
	assert_eq!(status, StatusCode::FORBIDDEN);

	let (status, _) = server
		.request(
			Method::PATCH,
			&format!("/steps/{id}"),
			Some(&token),
			Some(json!({ "step": { "title": "cool down", "owner": ObjectId::new().to_hex() } })),
		)
		.await;
	assert_eq!(status, StatusCode::NO_CONTENT);

	let (_, body) = server.request(Method::GET, &format!("/steps/{id}"), Some(&token), None).await;
	assert_eq!(body["step"]["title"], "cool down");
	assert_eq!(body["step"]["owner"], owner.to_hex());

	let (status, _) = server.request(Method::DELETE, &format!("/steps/{id}"), Some(&other), None).await;
	assert_eq!(status, StatusCode::FORBIDDEN);

	let (status, _) = server.request(Method::DELETE, &format!("/steps/{id}"), Some(&token), None).await;
	assert_eq!(status, StatusCode::NO_CONTENT);

	let (status, _) = server.request(Method::GET, &format!("/steps/{id}"), Some(&token), None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	server.shutdown().await;
}

#[tokio::test]
async fn test_step_list_scoped_to_caller() {
	let server = TestServer::start().await;
	let owner = ObjectId::new();
	let token = server.token(owner);

	for title in ["one", "two"] {
		let (status, _) = server
			.request(Method::POST, "/steps", Some(&token), Some(json!({ "step": { "title": title } })))
			.await;
		assert_eq!(status, StatusCode::CREATED);
	}

	let (status, _) = server
		.request(
			Method::POST,
			"/steps",
			None,
			Some(json!({ "step": { "title": "someone else", "owner": ObjectId::new().to_hex() } })),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED);

	let (status, body) = server.request(Method::GET, "/steps", Some(&token), None).await;
	assert_eq!(status, StatusCode::OK);

	let titles = body["steps"]
		.as_array()
		.unwrap()
		.iter()
		.map(|step| step["title"].as_str().unwrap())
		.collect::<Vec<_>>();
	assert_eq!(titles, vec!["one", "two"]);

	let (status, _) = server.request(Method::GET, "/steps", None, None).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);

	server.shutdown().await;
}

#[tokio::test]
async fn test_step_without_owner_is_never_owned() {
	let server = TestServer::start().await;
	let token = server.token(ObjectId::new());

	let (status, body) = server
		.request(Method::POST, "/steps", None, Some(json!({ "step": { "title": "orphan" } })))
		.await;
	assert_eq!(status, StatusCode::CREATED);
	assert!(body["step"].get("owner").is_none());
	let id = body["step"]["_id"].as_str().unwrap().to_string();

	let (status, _) = server.request(Method::DELETE, &format!("/steps/{id}"), Some(&token), None).await;
	assert_eq!(status, StatusCode::FORBIDDEN);

	server.shutdown().await;
}
