use std::sync::Arc;

use common::http::RouteError;
use common::make_response;
use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;
use serde_json::json;

use super::error::{ApiError, Result};
use crate::global::ApiGlobal;

async fn health(_: Request<Body>) -> Result<Response<Body>> {
	Ok(make_response!(
		StatusCode::OK,
		json!({
			"status": "ok"
		})
	))
}

pub fn routes<G: ApiGlobal>(_: &Arc<G>) -> std::result::Result<Router<Body, RouteError<ApiError>>, routerify::RouteError> {
	Router::builder().get("/", health).build()
}
