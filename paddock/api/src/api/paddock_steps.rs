use std::sync::Arc;

use common::http::ext::ResultExt;
use common::http::{empty_response, RouteError};
use common::make_response;
use hyper::{Body, Request, Response, StatusCode};
use routerify::Router;
use serde_json::json;

use super::error::{ApiError, Result};
use super::ext::{parse_json, RequestExt};
use super::guards::{handle_404, DocumentError};
use super::models::{AppendSteps, ChildModel, PaddockBody, PaddockModel};
use crate::database::Step;
use crate::global::ApiGlobal;
use crate::store::{Removal, Store};

/// The embedded steps of a paddock. A trailing step id in the path is
/// accepted and ignored.
#[tracing::instrument(skip_all)]
async fn index<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let id = req.object_id("pad_id")?;

	let paddock = global
		.store()
		.paddock(id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch paddock"))?;
	let paddock = handle_404(paddock)?;

	let steps = paddock.steps.into_iter().map(ChildModel::from).collect::<Vec<_>>();

	Ok(make_response!(StatusCode::OK, json!({ "steps": steps })))
}

#[tracing::instrument(skip_all)]
async fn append<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let context = req.request_context();
	let caller = context.auth().await;
	let id = req.object_id("id")?;

	let body: PaddockBody<AppendSteps> = parse_json(req).await?;
	let step: Step = body.paddock.steps.into_child(caller.as_ref())?;

	let paddock = global
		.store()
		.push_child(id, &step)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to append step"))?;
	let paddock = handle_404(paddock)?;

	Ok(make_response!(StatusCode::CREATED, json!({ "paddock": PaddockModel::from(paddock) })))
}

#[tracing::instrument(skip_all)]
async fn remove<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let context = req.request_context();
	context.require_auth().await?;
	let id = req.object_id("id")?;
	let step_id = req.object_id("step_id")?;

	let removal = global
		.store()
		.pull_child::<Step>(id, step_id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to remove step"))?;

	match removal {
		Removal::Removed => Ok(empty_response(StatusCode::NO_CONTENT)),
		Removal::ParentMissing | Removal::ChildMissing => Err(DocumentError::NotFound.into()),
	}
}

/// Drops the last step of the paddock owned by the user in the path.
#[tracing::instrument(skip_all)]
async fn pop<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let owner = req.object_id("owner_id")?;

	let found = global
		.store()
		.pop_child::<Step>(owner)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to pop step"))?;
	handle_404(found.then_some(()))?;

	Ok(empty_response(StatusCode::NO_CONTENT))
}

pub fn routes<G: ApiGlobal>(_: &Arc<G>) -> std::result::Result<Router<Body, RouteError<ApiError>>, routerify::RouteError> {
	Router::builder()
		.get("/:pad_id/steps", index::<G>)
		.get("/:pad_id/steps/:step_id", index::<G>)
		.post("/:id/steps", append::<G>)
		.delete("/:id/step/:step_id", remove::<G>)
		.delete("/owner/:owner_id/steps", pop::<G>)
		.build()
}
