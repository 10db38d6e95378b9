use common::http::RouteError;

use super::auth::AuthError;
use super::guards::DocumentError;
use crate::store::StoreError;

pub type Result<T, E = RouteError<ApiError>> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
	#[error("failed to read http body: {0}")]
	ParseHttpBody(#[from] hyper::Error),
	#[error("failed to parse json body: {0}")]
	ParseJson(#[from] serde_json::Error),
	#[error("invalid object id: {0}")]
	ObjectId(#[from] bson::oid::Error),
	#[error("invalid request: {0}")]
	Validation(&'static str),
	#[error("store error: {0}")]
	Store(#[from] StoreError),
	#[error("auth error: {0}")]
	Auth(#[from] AuthError),
	#[error("document error: {0}")]
	Document(#[from] DocumentError),
}
