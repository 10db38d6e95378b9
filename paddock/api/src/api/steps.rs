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
use super::models::{ChildModel, DocumentPatch, NewChild, StepBody};
use crate::database::{Child, Step};
use crate::global::ApiGlobal;
use crate::store::Store;

/// Only the steps owned by the caller.
#[tracing::instrument(skip_all)]
async fn index<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let context = req.request_context();
	let auth = context.require_auth().await?;

	let steps = global
		.store()
		.records::<Step>(auth.user_id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch steps"))?;

	let steps = steps.into_iter().map(ChildModel::from).collect::<Vec<_>>();

	Ok(make_response!(StatusCode::OK, json!({ "steps": steps })))
}

#[tracing::instrument(skip_all)]
async fn show<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let context = req.request_context();
	context.require_auth().await?;
	let id = req.object_id("id")?;

	let step = global
		.store()
		.record::<Step>(id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch step"))?;
	let step = handle_404(step)?;

	Ok(make_response!(StatusCode::OK, json!({ "step": ChildModel::from(step) })))
}

#[tracing::instrument(skip_all)]
async fn create<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let context = req.request_context();
	let caller = context.auth().await;

	let body: StepBody<NewChild> = parse_json(req).await?;
	let step: Step = body.step.into_child(caller.as_ref())?;

	global
		.store()
		.insert_record(&step)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to create step"))?;

	tracing::debug!(id = %step.id, "created step");

	Ok(make_response!(StatusCode::CREATED, json!({ "step": ChildModel::from(step) })))
}

#[tracing::instrument(skip_all)]
async fn update<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let context = req.request_context();
	let auth = context.require_auth().await?;
	let id = req.object_id("id")?;

	let step = global
		.store()
		.record::<Step>(id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch step"))?;
	let step = handle_404(step)?;
	require_ownership(&auth, step.owner())?;

	let body: StepBody<DocumentPatch> = parse_json(req).await?;
	if body.step.owner.is_some() {
		tracing::debug!(id = %id, "ignoring owner in step update");
	}

	if let Some(title) = body.step.title()? {
		let found = global
			.store()
			.set_record_title::<Step>(id, &title)
			.await
			.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to update step"))?;
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

	let step = global
		.store()
		.record::<Step>(id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch step"))?;
	let step = handle_404(step)?;
	require_ownership(&auth, step.owner())?;

	global
		.store()
		.delete_record::<Step>(id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to delete step"))?;

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
