use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use common::context::Context;
use common::logging;
use common::prelude::FutureTimeout;
use common::signal::SignalHandler;
use tokio::signal::unix::SignalKind;
use tokio::{select, time};

use crate::config::AppConfig;
use crate::global::GlobalState;

mod api;
mod config;
mod database;
mod global;
mod store;

#[cfg(test)]
mod tests;

async fn run() -> anyhow::Result<()> {
	let config = match AppConfig::parse() {
		Ok(config) => config,
		Err(err) => {
			logging::init("trace", Default::default()).context("failed to init logging")?;
			return Err(err).context("failed to parse config");
		}
	};

	logging::init(&config.logging.level, config.logging.mode).context("failed to init logging")?;

	tracing::info!(name = %config.name, config_file = ?config.config_file, "starting up");

	let (ctx, handler) = Context::new();

	let store = store::build_store(&config.database)
		.timeout(Duration::from_secs(3))
		.await
		.context("store connection timed out")?
		.context("failed to connect to store")?;

	let global = Arc::new(GlobalState::new(config, ctx, store));

	let api_future = tokio::spawn(api::run(global.clone()));

	let mut signal_handler = SignalHandler::new()
		.with_signal(SignalKind::interrupt())?
		.with_signal(SignalKind::terminate())?;

	select! {
		_ = signal_handler.recv() => tracing::info!("shutting down"),
		r = api_future => match r {
			Ok(Ok(())) => tracing::error!("api stopped unexpectedly: no error raised"),
			Ok(Err(err)) => tracing::error!("api stopped unexpectedly: {:#}", err),
			Err(err) => tracing::error!("api stopped unexpectedly: {}", err),
		},
	}

	drop(global);

	tracing::info!("waiting for tasks to finish");

	select! {
		_ = time::sleep(Duration::from_secs(60)) => tracing::warn!("force shutting down"),
		_ = signal_handler.recv() => tracing::warn!("force shutting down"),
		_ = handler.cancel() => tracing::info!("shutting down"),
	}

	Ok(())
}

#[tokio::main]
pub async fn main() {
	if let Err(err) = run().await {
		tracing::error!("{:#}", err);
		std::process::exit(1);
	}
}
