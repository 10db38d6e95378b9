use std::sync::Arc;

use tokio::sync::RwLock;

use super::auth::{AuthData, AuthError};

#[derive(Default, Clone)]
pub struct ContextData {
	pub auth: Option<AuthData>,
}

/// Per request state shared between the middlewares and the handler.
#[derive(Default, Clone)]
pub struct RequestContext(Arc<RwLock<ContextData>>);

impl RequestContext {
	pub async fn set_auth(&self, data: AuthData) {
		let mut guard = self.0.write().await;
		guard.auth = Some(data);
	}

	pub async fn auth(&self) -> Option<AuthData> {
		self.0.read().await.auth.clone()
	}

	/// Like [`RequestContext::auth`] but fails for anonymous requests.
	pub async fn require_auth(&self) -> Result<AuthData, AuthError> {
		self.auth().await.ok_or(AuthError::NotLoggedIn)
	}
}
