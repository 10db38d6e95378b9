use std::panic::Location;
use std::sync::{Arc, Weak};

use hyper::StatusCode;

use super::RouteError;

pub trait ResultExt<T, E, E2>: Sized {
	/// Replaces the error with the response built from `ctx` and keeps the
	/// original error as the source.
	fn map_err_route<C>(self, ctx: C) -> std::result::Result<T, RouteError<E2>>
	where
		RouteError<E2>: From<C>,
		E2: From<E>;
}

impl<T, E, E2> ResultExt<T, E, E2> for std::result::Result<T, E> {
	#[track_caller]
	fn map_err_route<C>(self, ctx: C) -> std::result::Result<T, RouteError<E2>>
	where
		RouteError<E2>: From<C>,
		E2: From<E>,
	{
		match self {
			Ok(val) => Ok(val),
			Err(err) => Err(RouteError::from(ctx)
				.with_source(Some(err.into()))
				.with_location(Location::caller())),
		}
	}
}

pub trait OptionExt<T, E>: Sized {
	fn map_err_route<C>(self, ctx: C) -> std::result::Result<T, RouteError<E>>
	where
		RouteError<E>: From<C>;
}

impl<T, E> OptionExt<T, E> for std::option::Option<T> {
	#[track_caller]
	fn map_err_route<C>(self, ctx: C) -> std::result::Result<T, RouteError<E>>
	where
		RouteError<E>: From<C>,
	{
		match self {
			Some(val) => Ok(val),
			None => Err(RouteError::from(ctx).with_location(Location::caller())),
		}
	}
}

pub trait RequestGlobalExt<E> {
	/// Fetches the global state the router was built with. The router only
	/// holds a weak reference, so this fails once shutdown dropped it.
	fn get_global<G: Sync + Send + 'static>(&self) -> std::result::Result<Arc<G>, RouteError<E>>;
}

impl<E, B> RequestGlobalExt<E> for hyper::Request<B>
where
	Self: routerify::ext::RequestExt,
{
	#[track_caller]
	fn get_global<G: Sync + Send + 'static>(&self) -> std::result::Result<Arc<G>, RouteError<E>> {
		use routerify::ext::RequestExt;

		self.data::<Weak<G>>()
			.ok_or((StatusCode::INTERNAL_SERVER_ERROR, "global state not set"))?
			.upgrade()
			.ok_or_else(|| (StatusCode::SERVICE_UNAVAILABLE, "shutting down").into())
	}
}
