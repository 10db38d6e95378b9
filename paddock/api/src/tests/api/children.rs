use bson::oid::ObjectId;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use super::TestServer;
use crate::api::models::ChildModel;
use crate::database::System;
use crate::global::ApiState;
use crate::store::Store;

async fn create_paddock(server: &TestServer, owner: ObjectId) -> String {
	let (status, body) = server
		.request(
			Method::POST,
			"/paddocks",
			None,
			Some(json!({ "paddock": { "title": "track", "owner": owner.to_hex() } })),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED);

	body["paddock"]["_id"].as_str().unwrap().to_string()
}

async fn append(server: &TestServer, id: &str, field: &str, title: &str) -> (StatusCode, Value) {
	server
		.request(
			Method::POST,
			&format!("/paddocks/{id}/{field}"),
			None,
			Some(json!({ "paddock": { field: { "title": title } } })),
		)
		.await
}

fn titles(list: &Value) -> Vec<&str> {
	list.as_array()
		.unwrap()
		.iter()
		.map(|child| child["title"].as_str().unwrap())
		.collect()
}

#[tokio::test]
async fn test_append_and_list_steps() {
	let server = TestServer::start().await;
	let id = create_paddock(&server, ObjectId::new()).await;

	let (status, body) = append(&server, &id, "steps", "first").await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(titles(&body["paddock"]["steps"]), vec!["first"]);

	let (status, body) = append(&server, &id, "steps", "second").await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(titles(&body["paddock"]["steps"]), vec!["first", "second"]);

	let (status, body) = server.request(Method::GET, &format!("/paddocks/{id}/steps"), None, None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(titles(&body["steps"]), vec!["first", "second"]);

	// The trailing step id is ignored.
	let ignored = ObjectId::new().to_hex();
	let (status, body) = server
		.request(Method::GET, &format!("/paddocks/{id}/steps/{ignored}"), None, None)
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(titles(&body["steps"]), vec!["first", "second"]);

	let missing = ObjectId::new().to_hex();
	let (status, _) = server.request(Method::GET, &format!("/paddocks/{missing}/steps"), None, None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let (status, _) = append(&server, &missing, "steps", "lost").await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let (status, _) = append(&server, &id, "steps", "").await;
	assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

	server.shutdown().await;
}

#[tokio::test]
async fn test_remove_step() {
	let server = TestServer::start().await;
	let token = server.token(ObjectId::new());
	let id = create_paddock(&server, ObjectId::new()).await;

	append(&server, &id, "steps", "first").await;
	append(&server, &id, "steps", "second").await;
	let (_, body) = append(&server, &id, "steps", "third").await;
	let second = body["paddock"]["steps"][1]["_id"].as_str().unwrap().to_string();

	let (status, _) = server
		.request(Method::DELETE, &format!("/paddocks/{id}/step/{second}"), None, None)
		.await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);

	let (status, body) = server
		.request(Method::DELETE, &format!("/paddocks/{id}/step/{second}"), Some(&token), None)
		.await;
	assert_eq!(status, StatusCode::NO_CONTENT);
	assert!(body.is_null());

	let (_, body) = server.request(Method::GET, &format!("/paddocks/{id}/steps"), None, None).await;
	assert_eq!(titles(&body["steps"]), vec!["first", "third"]);

	let (status, _) = server
		.request(Method::DELETE, &format!("/paddocks/{id}/step/{second}"), Some(&token), None)
		.await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let missing = ObjectId::new().to_hex();
	let (status, _) = server
		.request(Method::DELETE, &format!("/paddocks/{missing}/step/{second}"), Some(&token), None)
		.await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	server.shutdown().await;
}

#[tokio::test]
async fn test_pop_steps() {
	let server = TestServer::start().await;
	let owner = ObjectId::new();
	let id = create_paddock(&server, owner).await;

	for title in ["first", "second", "third"] {
		append(&server, &id, "steps", title).await;
	}

	let (status, _) = server
		.request(Method::DELETE, &format!("/paddocks/owner/{}/steps", owner.to_hex()), None, None)
		.await;
	assert_eq!(status, StatusCode::NO_CONTENT);

	let (_, body) = server.request(Method::GET, &format!("/paddocks/{id}/steps"), None, None).await;
	assert_eq!(titles(&body["steps"]), vec!["first", "second"]);

	let (status, _) = server
		.request(
			Method::DELETE,
			&format!("/paddocks/owner/{}/steps", ObjectId::new().to_hex()),
			None,
			None,
		)
		.await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	// Popping an emptied list is a no-op.
	for _ in 0..3 {
		let (status, _) = server
			.request(Method::DELETE, &format!("/paddocks/owner/{}/steps", owner.to_hex()), None, None)
			.await;
		assert_eq!(status, StatusCode::NO_CONTENT);
	}

	let (_, body) = server.request(Method::GET, &format!("/paddocks/{id}/steps"), None, None).await;
	assert_eq!(body["steps"], json!([]));

	server.shutdown().await;
}

#[tokio::test]
async fn test_append_system_shares_the_created_record() {
	let server = TestServer::start().await;
	let owner = ObjectId::new();
	let token = server.token(owner);
	let id = create_paddock(&server, owner).await;

	let (status, body) = server
		.request(
			Method::POST,
			&format!("/paddocks/{id}/systems"),
			Some(&token),
			Some(json!({ "paddock": { "systems": { "title": "timing" } } })),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED);

	let system = body["paddock"]["systems"].as_array().unwrap().last().unwrap().clone();
	assert_eq!(system["title"], "timing");
	assert_eq!(system["owner"], owner.to_hex());

	let system_id = ObjectId::parse_str(system["_id"].as_str().unwrap()).unwrap();
	let stored = server
		.global
		.store()
		.record::<System>(system_id)
		.await
		.unwrap()
		.expect("system was not stored on its own");
	assert_eq!(serde_json::to_value(ChildModel::from(stored)).unwrap(), system);

	let missing = ObjectId::new().to_hex();
	let (status, _) = append(&server, &missing, "systems", "lost").await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	server.shutdown().await;
}

#[tokio::test]
async fn test_remove_and_pop_systems() {
	let server = TestServer::start().await;
	let owner = ObjectId::new();
	let token = server.token(owner);
	let id = create_paddock(&server, owner).await;

	for title in ["first", "second", "third"] {
		let (status, _) = append(&server, &id, "systems", title).await;
		assert_eq!(status, StatusCode::CREATED);
	}

	let (_, body) = append(&server, &id, "systems", "fourth").await;
	let first = body["paddock"]["systems"][0]["_id"].as_str().unwrap().to_string();

	let (status, _) = server
		.request(Method::DELETE, &format!("/paddocks/{id}/system/{first}"), Some(&token), None)
		.await;
	assert_eq!(status, StatusCode::NO_CONTENT);

	let (status, _) = server
		.request(Method::DELETE, &format!("/paddocks/owner/{}/systems", owner.to_hex()), None, None)
		.await;
	assert_eq!(status, StatusCode::NO_CONTENT);

	let (_, body) = server.request(Method::GET, &format!("/paddocks/{id}"), Some(&token), None).await;
	assert_eq!(titles(&body["paddock"]["systems"]), vec!["second", "third"]);
	// Steps are untouched by system operations.
	assert_eq!(body["paddock"]["steps"], json!([]));

	let (status, _) = server
		.request(Method::DELETE, &format!("/paddocks/{id}/system/{first}"), Some(&token), None)
		.await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let (status, _) = server
		.request(Method::DELETE, &format!("/paddocks/{id}/system/{first}"), None, None)
		.await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);

	server.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_appends() {
	let server = TestServer::start().await;
	let id = create_paddock(&server, ObjectId::new()).await;

	let appends = (0..16).map(|i| {
		let server = &server;
		let id = &id;
		async move { append(server, id, "steps", &format!("step {i}")).await.0 }
	});

	for status in futures_util::future::join_all(appends).await {
		assert_eq!(status, StatusCode::CREATED);
	}

	let (_, body) = server.request(Method::GET, &format!("/paddocks/{id}/steps"), None, None).await;
	assert_eq!(body["steps"].as_array().unwrap().len(), 16);

	server.shutdown().await;
}
