use common::context::Context;

use crate::config::{ApiConfig, AppConfig, JwtConfig};
use crate::store::AnyStore;

pub trait ApiState {
	fn store(&self) -> &AnyStore;
}

pub trait ApiGlobal:
	common::global::GlobalCtx
	+ common::global::GlobalConfigProvider<ApiConfig>
	+ common::global::GlobalConfigProvider<JwtConfig>
	+ common::global::GlobalConfig
	+ ApiState
	+ Send
	+ Sync
	+ 'static
{
}

impl<T> ApiGlobal for T where
	T: common::global::GlobalCtx
		+ common::global::GlobalConfigProvider<ApiConfig>
		+ common::global::GlobalConfigProvider<JwtConfig>
		+ common::global::GlobalConfig
		+ ApiState
		+ Send
		+ Sync
		+ 'static
{
}

/// Everything the handlers share, built once at startup.
pub struct GlobalState {
	config: AppConfig,
	ctx: Context,
	store: AnyStore,
}

impl GlobalState {
	pub fn new(config: AppConfig, ctx: Context, store: AnyStore) -> Self {
		Self { config, ctx, store }
	}
}

impl common::global::GlobalCtx for GlobalState {
	fn ctx(&self) -> &Context {
		&self.ctx
	}
}

impl common::global::GlobalConfig for GlobalState {}

impl common::global::GlobalConfigProvider<ApiConfig> for GlobalState {
	fn provide_config(&self) -> &ApiConfig {
		&self.config.api
	}
}

impl common::global::GlobalConfigProvider<JwtConfig> for GlobalState {
	fn provide_config(&self) -> &JwtConfig {
		&self.config.jwt
	}
}

impl ApiState for GlobalState {
	fn store(&self) -> &AnyStore {
		&self.store
	}
}
