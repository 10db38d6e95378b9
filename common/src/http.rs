use std::fmt::{Debug, Display};
use std::panic::Location;

use hyper::{Body, Request, Response, StatusCode};
use routerify::RequestInfo;
use serde_json::json;

pub mod ext;

/// Builds a JSON response from anything that implements `Display`, usually a
/// `serde_json::Value`.
#[macro_export]
macro_rules! make_response {
	($status:expr, $body:expr) => {{
		let mut response = ::hyper::Response::new(::hyper::Body::from($body.to_string()));
		*response.status_mut() = $status;
		response.headers_mut().insert(
			::hyper::header::CONTENT_TYPE,
			::hyper::header::HeaderValue::from_static("application/json"),
		);
		response
	}};
}

/// Body every failed request answers with.
pub fn error_body(message: &str) -> serde_json::Value {
	json!({ "message": message, "success": false })
}

/// A response without a body, e.g. `204 No Content`.
pub fn empty_response(status: StatusCode) -> Response<Body> {
	let mut response = Response::new(Body::empty());
	*response.status_mut() = status;
	response
}

/// Router error handler. Unwraps a [`RouteError`] into its response and logs
/// it according to [`RouteError::should_log`].
pub async fn error_handler<E: std::error::Error + 'static>(
	err: Box<dyn std::error::Error + Send + Sync + 'static>,
	info: RequestInfo,
) -> Response<Body> {
	match err.downcast::<RouteError<E>>() {
		Ok(err) => {
			let location = err.location();

			err.span().in_scope(|| match err.should_log() {
				ShouldLog::Yes => {
					tracing::error!(path = %info.uri(), method = %info.method(), location = %location, error = ?err, "http error")
				}
				ShouldLog::Debug => {
					tracing::debug!(path = %info.uri(), method = %info.method(), location = %location, error = ?err, "http error")
				}
				ShouldLog::No => (),
			});

			err.response()
		}
		Err(err) => {
			tracing::error!(path = %info.uri(), method = %info.method(), error = ?err, "unhandled http error");
			make_response!(StatusCode::INTERNAL_SERVER_ERROR, error_body("Internal Server Error"))
		}
	}
}

/// Fallback for requests no route matched.
pub async fn not_found<E>(req: Request<Body>) -> Result<Response<Body>, RouteError<E>> {
	tracing::debug!(path = %req.uri(), method = %req.method(), "no route matched");
	Ok(make_response!(StatusCode::NOT_FOUND, error_body("not found")))
}

/// The error type of every route. Carries the response that should be sent,
/// the error that caused it and where it was raised.
pub struct RouteError<E> {
	source: Option<E>,
	location: &'static Location<'static>,
	span: tracing::Span,
	response: Response<Body>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShouldLog {
	Yes,
	Debug,
	No,
}

impl<E> RouteError<E> {
	pub fn span(&self) -> &tracing::Span {
		&self.span
	}

	pub fn location(&self) -> &'static Location<'static> {
		self.location
	}

	pub fn status(&self) -> StatusCode {
		self.response.status()
	}

	pub fn source_ref(&self) -> Option<&E> {
		self.source.as_ref()
	}

	pub fn response(self) -> Response<Body> {
		self.response
	}

	/// Server errors are always logged, client errors only when something
	/// caused them.
	pub fn should_log(&self) -> ShouldLog {
		if self.status().is_server_error() {
			ShouldLog::Yes
		} else if self.source.is_some() {
			ShouldLog::Debug
		} else {
			ShouldLog::No
		}
	}

	pub fn with_source(mut self, source: Option<E>) -> Self {
		self.source = source;
		self
	}

	pub fn with_location(mut self, location: &'static Location<'static>) -> Self {
		self.location = location;
		self
	}
}

impl<E> From<Response<Body>> for RouteError<E> {
	#[track_caller]
	fn from(response: Response<Body>) -> Self {
		Self {
			source: None,
			span: tracing::Span::current(),
			location: Location::caller(),
			response,
		}
	}
}

impl<E, S: AsRef<str>> From<(StatusCode, S)> for RouteError<E> {
	#[track_caller]
	fn from((status, message): (StatusCode, S)) -> Self {
		Self::from(make_response!(status, error_body(message.as_ref())))
	}
}

impl<E, S: AsRef<str>, T> From<(StatusCode, S, T)> for RouteError<E>
where
	T: Into<E>,
{
	#[track_caller]
	fn from((status, message, source): (StatusCode, S, T)) -> Self {
		Self::from(make_response!(status, error_body(message.as_ref()))).with_source(Some(source.into()))
	}
}

impl<E> From<&'_ str> for RouteError<E> {
	#[track_caller]
	fn from(message: &'_ str) -> Self {
		Self::from((StatusCode::INTERNAL_SERVER_ERROR, message))
	}
}

impl<E: Debug> Debug for RouteError<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.source {
			Some(err) => write!(f, "RouteError({}): {:?}", self.status(), err),
			None => write!(f, "RouteError({}): Unknown Source", self.status()),
		}
	}
}

impl<E: Display> Display for RouteError<E> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.source {
			Some(err) => write!(f, "RouteError({}): {}", self.status(), err),
			None => write!(f, "RouteError({}): Unknown Source", self.status()),
		}
	}
}

impl<E: std::error::Error + 'static> std::error::Error for RouteError<E> {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match &self.source {
			Some(err) => Some(err),
			None => None,
		}
	}
}
