use std::net::SocketAddr;

use common::config::{ConfigError, LoggingConfig, TlsConfig};

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct ApiConfig {
	/// Bind address for the API
	pub bind_address: SocketAddr,

	/// If we should use TLS for the API server
	pub tls: Option<TlsConfig>,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			bind_address: SocketAddr::from(([0, 0, 0, 0, 0, 0, 0, 0], 4000)),
			tls: None,
		}
	}
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
	#[default]
	Mongo,
	/// Keeps every document in process memory, nothing survives a restart
	Memory,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
	/// Which store backs the API
	pub kind: StoreKind,

	/// The MongoDB connection string, must name a default database
	pub uri: String,
}

impl Default for DatabaseConfig {
	fn default() -> Self {
		Self {
			kind: StoreKind::Mongo,
			uri: "mongodb://localhost:27017/paddock".to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct JwtConfig {
	/// JWT secret
	pub secret: String,

	/// JWT issuer
	pub issuer: String,
}

impl Default for JwtConfig {
	fn default() -> Self {
		Self {
			issuer: "paddock".to_string(),
			secret: "paddock".to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
	/// The path to the config file
	pub config_file: Option<String>,

	/// Name of this instance
	pub name: String,

	/// The logging config
	pub logging: LoggingConfig,

	/// API Config
	pub api: ApiConfig,

	/// Database Config
	pub database: DatabaseConfig,

	/// JWT Config
	pub jwt: JwtConfig,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			config_file: Some("config".to_string()),
			name: "paddock-api".to_string(),
			logging: LoggingConfig::default(),
			api: ApiConfig::default(),
			database: DatabaseConfig::default(),
			jwt: JwtConfig::default(),
		}
	}
}

impl AppConfig {
	pub fn parse() -> Result<Self, ConfigError> {
		let (mut config, config_file) = common::config::parse::<Self>("PADDOCK", Self::default().config_file)?;

		config.config_file = config_file;

		Ok(config)
	}
}
