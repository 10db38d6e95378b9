use std::str::FromStr;

use once_cell::sync::OnceCell;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

type ReloadHandle = Box<dyn Fn(&str) -> Result<(), LoggingError> + Sync + Send>;

static RELOAD_HANDLE: OnceCell<ReloadHandle> = OnceCell::new();

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
	#[default]
	Default,
	Json,
	Pretty,
	Compact,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
	#[error("invalid log level: {0}")]
	InvalidLevel(#[from] tracing_subscriber::filter::ParseError),
	#[error("failed to init logger: {0}")]
	Init(#[from] tracing_subscriber::util::TryInitError),
	#[error("failed to reload logger: {0}")]
	Reload(#[from] tracing_subscriber::reload::Error),
}

/// Installs the subscriber built by `$builder` and returns a closure that
/// swaps its filter.
macro_rules! install {
	($builder:expr) => {{
		let builder = $builder.with_filter_reloading();
		let handle = builder.reload_handle();

		builder.finish().try_init()?;

		Box::new(move |level: &str| {
			handle.reload(EnvFilter::from_str(level)?)?;
			Ok(())
		}) as ReloadHandle
	}};
}

/// Initializes the global subscriber on the first call. Later calls only
/// replace the filter, the mode of the first call sticks.
pub fn init(level: &str, mode: Mode) -> Result<(), LoggingError> {
	let reload = RELOAD_HANDLE.get_or_try_init(|| -> Result<ReloadHandle, LoggingError> {
		let builder = tracing_subscriber::fmt()
			.with_line_number(true)
			.with_file(true)
			.with_env_filter(EnvFilter::from_str(level)?);

		Ok(match mode {
			Mode::Default => install!(builder),
			Mode::Json => install!(builder.json()),
			Mode::Pretty => install!(builder.pretty()),
			Mode::Compact => install!(builder.compact()),
		})
	})?;

	reload(level)?;

	Ok(())
}
