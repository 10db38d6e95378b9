use std::sync::Arc;

use common::http::ext::ResultExt;
use common::http::{empty_response, RouteError};
use common::make_response;
use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;
use serde_json::json;

use super::error::{ApiError, Result};
use super::ext::{parse_json, RequestExt};
use super::guards::{handle_404, require_ownership};
use super::models::{NewPaddock, PaddockBody, PaddockModel, PaddockPatch};
use crate::global::ApiGlobal;
use crate::store::Store;

/// Every paddock, regardless of who owns it.
#[tracing::instrument(skip_all)]
async fn index<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let context = req.request_context();
	context.require_auth().await?;

	let paddocks = global
		.store()
		.paddocks()
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch paddocks"))?;

	let paddocks = paddocks.into_iter().map(PaddockModel::from).collect::<Vec<_>>();

	Ok(make_response!(StatusCode::OK, json!({ "paddocks": paddocks })))
}

#[tracing::instrument(skip_all)]
async fn show<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let context = req.request_context();
	context.require_auth().await?;
	let id = req.object_id("id")?;

	let paddock = global
		.store()
		.paddock(id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch paddock"))?;
	let paddock = handle_404(paddock)?;

	Ok(make_response!(StatusCode::OK, json!({ "paddock": PaddockModel::from(paddock) })))
}

/// Open to anonymous callers, the owner comes from the body or the token.
#[tracing::instrument(skip_all)]
async fn create<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let context = req.request_context();
	let caller = context.auth().await;

	let body: PaddockBody<NewPaddock> = parse_json(req).await?;
	let paddock = body.paddock.into_paddock(caller.as_ref())?;

	global
		.store()
		.insert_paddock(&paddock)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to create paddock"))?;

	tracing::debug!(id = %paddock.id, owner = %paddock.owner, "created paddock");

	Ok(make_response!(StatusCode::CREATED, json!({ "paddock": PaddockModel::from(paddock) })))
}

#[tracing::instrument(skip_all)]
async fn update<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let context = req.request_context();
	let auth = context.require_auth().await?;
	let id = req.object_id("id")?;

	let paddock = global
		.store()
		.paddock(id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch paddock"))?;
	let paddock = handle_404(paddock)?;
	require_ownership(&auth, Some(&paddock.owner))?;

	let body: PaddockBody<PaddockPatch> = parse_json(req).await?;
	if body.paddock.owner.is_some() {
		tracing::debug!(id = %id, "ignoring owner in paddock update");
	}

	let changes = body.paddock.into_changes(Some(&auth))?;
	if !changes.is_empty() {
		let found = global
			.store()
			.update_paddock(id, &changes)
			.await
			.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to update paddock"))?;
		handle_404(found.then_some(()))?;
	}

	Ok(empty_response(StatusCode::NO_CONTENT))
}

#[tracing::instrument(skip_all)]
async fn destroy<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let context = req.request_context();
	let auth = context.require_auth().await?;
	let id = req.object_id("id")?;

	let paddock = global
		.store()
		.paddock(id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch paddock"))?;
	let paddock = handle_404(paddock)?;
	require_ownership(&auth, Some(&paddock.owner))?;

	global
		.store()
		.delete_paddock(id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to delete paddock"))?;

	Ok(empty_response(StatusCode::NO_CONTENT))
}

pub fn routes<G: ApiGlobal>(_: &Arc<G>) -> std::result::Result<Router<Body, RouteError<ApiError>>, routerify::RouteError> {
	Router::builder()
		.get("/", index::<G>)
		.post("/", create::<G>)
		.get("/:id", show::<G>)
		.patch("/:id", update::<G>)
		.delete("/:id", destroy::<G>)
		.build()
}
