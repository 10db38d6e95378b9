use bson::oid::ObjectId;
use common::http::RouteError;
use hyper::StatusCode;

use super::error::ApiError;
use super::jwt::AuthJwtPayload;

#[derive(thiserror::Error, Debug, Clone)]
pub enum AuthError {
	#[error("token must be ascii only")]
	HeaderToStr,
	#[error("token must be a bearer token")]
	NotBearerToken,
	#[error("not logged in")]
	NotLoggedIn,
	#[error("invalid token")]
	InvalidToken,
}

impl From<AuthError> for RouteError<ApiError> {
	#[track_caller]
	fn from(value: AuthError) -> Self {
		RouteError::from(match &value {
			AuthError::HeaderToStr => (StatusCode::UNAUTHORIZED, "token must be ascii only"),
			AuthError::NotBearerToken => (StatusCode::UNAUTHORIZED, "token must be a bearer token"),
			AuthError::NotLoggedIn => (StatusCode::UNAUTHORIZED, "not logged in"),
			AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid token"),
		})
		.with_source(Some(ApiError::Auth(value)))
	}
}

/// The verified caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthData {
	pub user_id: ObjectId,
}

impl From<AuthJwtPayload> for AuthData {
	fn from(payload: AuthJwtPayload) -> Self {
		Self {
			user_id: payload.user_id,
		}
	}
}
