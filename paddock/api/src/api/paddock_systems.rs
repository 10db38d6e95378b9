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
use super::models::{AppendSystems, PaddockBody, PaddockModel};
use crate::database::System;
use crate::global::ApiGlobal;
use crate::store::{Removal, Store};

/// Stores a new system and appends that same document to the paddock, so
/// the standalone and the embedded copy share id and timestamps.
#[tracing::instrument(skip_all)]
async fn append<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let context = req.request_context();
	let caller = context.auth().await;
	let id = req.object_id("id")?;

	let body: PaddockBody<AppendSystems> = parse_json(req).await?;
	let system: System = body.paddock.systems.into_child(caller.as_ref())?;

	let paddock = global
		.store()
		.paddock(id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to fetch paddock"))?;
	handle_404(paddock)?;

	global
		.store()
		.insert_record(&system)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to create system"))?;

	let paddock = global
		.store()
		.push_child(id, &system)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to append system"))?;
	// Only reachable if the paddock was deleted after the check above.
	let paddock = handle_404(paddock)?;

	tracing::debug!(id = %id, system = %system.id, "appended system");

	Ok(make_response!(StatusCode::CREATED, json!({ "paddock": PaddockModel::from(paddock) })))
}

#[tracing::instrument(skip_all)]
async fn remove<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let context = req.request_context();
	context.require_auth().await?;
	let id = req.object_id("id")?;
	let system_id = req.object_id("system_id")?;

	let removal = global
		.store()
		.pull_child::<System>(id, system_id)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to remove system"))?;

	match removal {
		Removal::Removed => Ok(empty_response(StatusCode::NO_CONTENT)),
		Removal::ParentMissing | Removal::ChildMissing => Err(DocumentError::NotFound.into()),
	}
}

#[tracing::instrument(skip_all)]
async fn pop<G: ApiGlobal>(req: Request<Body>) -> Result<Response<Body>> {
	let global = req.get_global::<G>()?;
	let owner = req.object_id("owner_id")?;

	let found = global
		.store()
		.pop_child::<System>(owner)
		.await
		.map_err_route((StatusCode::INTERNAL_SERVER_ERROR, "failed to pop system"))?;
	handle_404(found.then_some(()))?;

	Ok(empty_response(StatusCode::NO_CONTENT))
}

pub fn routes<G: ApiGlobal>(_: &Arc<G>) -> std::result::Result<Router<Body, RouteError<ApiError>>, routerify::RouteError> {
	Router::builder()
		.post("/:id/systems", append::<G>)
		.delete("/:id/system/:system_id", remove::<G>)
		.delete("/owner/:owner_id/systems", pop::<G>)
		.build()
}
