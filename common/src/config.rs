use std::path::{Path, PathBuf};

use crate::logging;

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct TlsConfig {
	/// The path to the PEM encoded TLS certificate chain
	pub cert: String,

	/// The path to the PEM encoded PKCS#8 private key
	pub key: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// The log level to use, this is a tracing env filter
	pub level: String,

	/// What logging mode we should use
	pub mode: logging::Mode,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			mode: logging::Mode::Default,
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("config file not found: {0}")]
	FileNotFound(String),
	#[error("failed to resolve config file: {0}")]
	Io(#[from] std::io::Error),
	#[error("{0}")]
	Config(#[from] ::config::ConfigError),
}

const EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Accepts either a path to an existing file or a stem that one of the
/// supported extensions completes.
fn find_file(path: &str) -> Option<PathBuf> {
	let exact = Path::new(path);
	if exact.extension().is_some() && exact.is_file() {
		return Some(exact.to_path_buf());
	}

	EXTENSIONS
		.iter()
		.map(|ext| PathBuf::from(format!("{path}.{ext}")))
		.find(|candidate| candidate.is_file())
}

fn env_source(prefix: &str) -> ::config::Environment {
	::config::Environment::with_prefix(prefix)
		.prefix_separator("_")
		.separator("__")
		.try_parsing(true)
}

/// Builds `C` from its serde defaults, then an optional config file, then
/// `{prefix}_` environment variables. Nested keys use `__`, so
/// `{prefix}_API__BIND_ADDRESS` sets `api.bind_address`.
///
/// The file path is read from `{prefix}_CONFIG_FILE` and falls back to
/// `config_file`. A path coming from the environment must exist, the fallback
/// may be missing. Returns the canonical path of the file that was loaded.
pub fn parse<C: serde::de::DeserializeOwned>(
	prefix: &str,
	config_file: Option<String>,
) -> Result<(C, Option<String>), ConfigError> {
	let key = match ::config::Config::builder()
		.add_source(env_source(prefix))
		.build()?
		.get_string("config_file")
	{
		Ok(key) => Some(key),
		Err(::config::ConfigError::NotFound(_)) => None,
		Err(err) => return Err(err.into()),
	};

	let key_provided = key.is_some();

	let mut builder = ::config::Config::builder();
	let mut config_path = None;

	if let Some(path) = key.or(config_file) {
		match find_file(&path) {
			Some(file) => {
				config_path = Some(std::fs::canonicalize(&file)?.display().to_string());
				builder = builder.add_source(::config::File::from(file));
			}
			None if key_provided => return Err(ConfigError::FileNotFound(path)),
			None => tracing::debug!(path = %path, "no config file found"),
		}
	}

	let config = builder.add_source(env_source(prefix)).build()?.try_deserialize()?;

	Ok((config, config_path))
}
