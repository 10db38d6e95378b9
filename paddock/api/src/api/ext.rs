use std::sync::Arc;

use bson::oid::ObjectId;
use common::http::ext::{OptionExt, RequestGlobalExt, ResultExt};
use hyper::{Body, Request, StatusCode};
use routerify::ext::RequestExt as _;
use serde::de::DeserializeOwned;

use super::error::{ApiError, Result};
use super::request_context::RequestContext;
use crate::global::ApiGlobal;

pub trait RequestExt {
	fn get_global<G: ApiGlobal>(&self) -> Result<Arc<G>>;

	/// The context set by the auth middleware, or an empty one.
	fn request_context(&self) -> RequestContext;

	/// Parses the path parameter `name` as a hex object id.
	fn object_id(&self, name: &str) -> Result<ObjectId>;
}

impl RequestExt for Request<Body> {
	fn get_global<G: ApiGlobal>(&self) -> Result<Arc<G>> {
		RequestGlobalExt::<ApiError>::get_global(self)
	}

	fn request_context(&self) -> RequestContext {
		self.context::<RequestContext>().unwrap_or_default()
	}

	#[track_caller]
	fn object_id(&self, name: &str) -> Result<ObjectId> {
		let param = self
			.param(name)
			.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "missing path parameter"))?;

		ObjectId::parse_str(param).map_err_route((StatusCode::UNPROCESSABLE_ENTITY, "invalid id"))
	}
}

/// Reads the whole body and parses it as `T`.
pub async fn parse_json<T: DeserializeOwned>(req: Request<Body>) -> Result<T> {
	let body = hyper::body::to_bytes(req.into_body())
		.await
		.map_err_route((StatusCode::BAD_REQUEST, "failed to read request body"))?;

	serde_json::from_slice(&body).map_err_route((StatusCode::BAD_REQUEST, "invalid request body"))
}
