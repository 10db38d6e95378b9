use std::sync::Arc;

use common::http::RouteError;
use hyper::http::header;
use hyper::Body;
use routerify::prelude::RequestExt as _;
use routerify::Middleware;

use crate::api::auth::{AuthData, AuthError};
use crate::api::error::ApiError;
use crate::api::ext::RequestExt as _;
use crate::api::jwt::{AuthJwtPayload, JwtState};
use crate::api::request_context::RequestContext;
use crate::global::ApiGlobal;

/// Attaches the caller to the request context. Requests without an
/// `Authorization` header pass through anonymous, a header that does not hold
/// a valid bearer token fails the request.
pub fn auth_middleware<G: ApiGlobal>(_: &Arc<G>) -> Middleware<Body, RouteError<ApiError>> {
	Middleware::pre(|req| async move {
		let context = RequestContext::default();
		req.set_context(context.clone());

		let Some(token) = req.headers().get(header::AUTHORIZATION) else {
			return Ok(req);
		};

		let global = req.get_global::<G>()?;

		let token = token
			.to_str()
			.map_err(|_| AuthError::HeaderToStr)?
			.strip_prefix("Bearer ")
			.ok_or(AuthError::NotBearerToken)?;

		let jwt = AuthJwtPayload::verify(&global, token).ok_or(AuthError::InvalidToken)?;

		tracing::trace!(
			user_id = %jwt.user_id,
			issued_at = %jwt.issued_at,
			not_before = ?jwt.not_before,
			expiration = ?jwt.expiration,
			"authenticated request"
		);

		context.set_auth(AuthData::from(jwt)).await;

		Ok(req)
	})
}
