use crate::context::Context;

pub trait GlobalCtx {
	fn ctx(&self) -> &Context;
}

/// Lets a global state hand out any of the config sections it carries, e.g.
/// `global.config::<ApiConfig>()`.
pub trait GlobalConfig {
	#[inline(always)]
	fn config<C>(&self) -> &C
	where
		Self: GlobalConfigProvider<C>,
	{
		GlobalConfigProvider::provide_config(self)
	}
}

pub trait GlobalConfigProvider<C> {
	fn provide_config(&self) -> &C;
}
