use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::http::{empty_response, RouteError};
use common::prelude::FutureTimeout;
use hyper::server::conn::Http;
use hyper::{Body, Request, Response, StatusCode};
use routerify::{RequestServiceBuilder, Router};
use tokio::net::TcpSocket;
use tokio::select;

use self::error::{ApiError, Result};
use crate::config::ApiConfig;
use crate::global::ApiGlobal;

pub mod auth;
pub mod error;
pub mod ext;
pub mod guards;
pub mod health;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod paddock_steps;
pub mod paddock_systems;
pub mod paddocks;
pub mod request_context;
pub mod steps;

async fn preflight(_: Request<Body>) -> Result<Response<Body>> {
	Ok(empty_response(StatusCode::NO_CONTENT))
}

pub fn routes<G: ApiGlobal>(global: &Arc<G>) -> std::result::Result<Router<Body, RouteError<ApiError>>, routerify::RouteError> {
	let weak = Arc::downgrade(global);

	Router::builder()
		.data(weak)
		.err_handler_with_info(common::http::error_handler::<ApiError>)
		.middleware(middleware::cors::cors_middleware(global))
		.middleware(middleware::auth::auth_middleware(global))
		.scope("/health", health::routes(global)?)
		// The nested routes go first so `/paddocks/owner/...` is never read as a paddock id.
		.scope("/paddocks", paddock_steps::routes(global)?)
		.scope("/paddocks", paddock_systems::routes(global)?)
		.scope("/paddocks", paddocks::routes(global)?)
		.scope("/steps", steps::routes(global)?)
		.options("/*", preflight)
		.any(common::http::not_found::<ApiError>)
		.build()
}

pub async fn run<G: ApiGlobal>(global: Arc<G>) -> anyhow::Result<()> {
	let config = global.config::<ApiConfig>();
	tracing::info!("API listening on {}", config.bind_address);

	let socket = if config.bind_address.is_ipv6() {
		TcpSocket::new_v6()?
	} else {
		TcpSocket::new_v4()?
	};

	socket.set_reuseaddr(true)?;
	socket.set_reuseport(true)?;
	socket.bind(config.bind_address)?;
	let listener = socket.listen(1024)?;

	let tls_acceptor = if let Some(tls) = &config.tls {
		tracing::info!("TLS enabled");
		let cert = tokio::fs::read(&tls.cert).await.context("failed to read api ssl cert")?;
		let key = tokio::fs::read(&tls.key).await.context("failed to read api ssl private key")?;

		let key = rustls_pemfile::pkcs8_private_keys(&mut io::BufReader::new(io::Cursor::new(key)))?
			.into_iter()
			.next()
			.map(rustls::PrivateKey)
			.context("api ssl private key file holds no pkcs8 key")?;

		let certs = rustls_pemfile::certs(&mut io::BufReader::new(io::Cursor::new(cert)))?
			.into_iter()
			.map(rustls::Certificate)
			.collect();

		Some(Arc::new(tokio_rustls::TlsAcceptor::from(Arc::new(
			rustls::ServerConfig::builder()
				.with_safe_defaults()
				.with_no_client_auth()
				.with_single_cert(certs, key)?,
		))))
	} else {
		None
	};

	// The router only holds a weak reference to the global state, otherwise an
	// open keep-alive connection would keep it alive and block shutdown.
	let router = routes(&global).map_err(|err| anyhow::anyhow!("failed to build router: {err}"))?;
	let request_service =
		RequestServiceBuilder::new(router).map_err(|err| anyhow::anyhow!("failed to build request service: {err}"))?;

	loop {
		select! {
			_ = global.ctx().done() => {
				return Ok(());
			},
			r = listener.accept() => {
				let (socket, addr) = r?;

				let tls_acceptor = tls_acceptor.clone();
				let service = request_service.build(addr);

				tracing::debug!("accepted connection from {}", addr);

				tokio::spawn(async move {
					if let Some(tls_acceptor) = tls_acceptor {
						let Ok(Ok(socket)) = tls_acceptor.accept(socket).timeout(Duration::from_secs(5)).await else {
							return;
						};
						tracing::debug!("TLS handshake complete");
						Http::new().serve_connection(socket, service).with_upgrades().await.ok();
					} else {
						Http::new().serve_connection(socket, service).with_upgrades().await.ok();
					}
				});
			},
		}
	}
}
