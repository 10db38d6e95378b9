use bson::oid::ObjectId;
use common::http::RouteError;
use hyper::StatusCode;

use super::auth::AuthData;
use super::error::ApiError;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentError {
	#[error("document not found")]
	NotFound,
	#[error("document belongs to another user")]
	Forbidden,
}

impl From<DocumentError> for RouteError<ApiError> {
	#[track_caller]
	fn from(value: DocumentError) -> Self {
		RouteError::from(match value {
			DocumentError::NotFound => (StatusCode::NOT_FOUND, "not found"),
			DocumentError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
		})
		.with_source(Some(ApiError::Document(value)))
	}
}

/// Turns a missing document into [`DocumentError::NotFound`].
pub fn handle_404<T>(document: Option<T>) -> Result<T, DocumentError> {
	document.ok_or(DocumentError::NotFound)
}

/// Fails unless the caller owns the document. A document without an owner
/// belongs to nobody.
pub fn require_ownership(auth: &AuthData, owner: Option<&ObjectId>) -> Result<(), DocumentError> {
	match owner {
		Some(owner) if *owner == auth.user_id => Ok(()),
		_ => Err(DocumentError::Forbidden),
	}
}
