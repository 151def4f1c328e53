//! Link-time datasource discovery.
//!
//! Crates that provide datasource types submit a [`DatasourcePlugin`] with
//! [`datasource_plugin!`](crate::datasource_plugin). The host calls [`load_plugins`]
//! once at startup to register everything that was linked in.

use serde::de::DeserializeOwned;

use super::Registry;
use crate::defs::DatasourceKind;
use crate::error::TypeRegistrationError;

/// A datasource type waiting to be registered.
pub struct DatasourcePlugin {
	/// Tag of the datasource type; plugins are loaded in tag order.
	pub tag: &'static str,
	/// Called once by [`load_plugins`].
	pub register: fn(&Registry) -> Result<(), TypeRegistrationError>,
}

inventory::collect!(DatasourcePlugin);

impl DatasourcePlugin {
	pub const fn new(tag: &'static str, register: fn(&Registry) -> Result<(), TypeRegistrationError>) -> Self {
		Self { tag, register }
	}

	/// Plugin that registers `T` through [`Registry::register`].
	pub const fn of<T>() -> Self
	where
		T: DatasourceKind + DeserializeOwned,
	{
		Self {
			tag: T::TYPE,
			register: register_kind::<T>,
		}
	}
}

fn register_kind<T>(registry: &Registry) -> Result<(), TypeRegistrationError>
where
	T: DatasourceKind + DeserializeOwned,
{
	registry.register::<T>()
}

/// Registers every submitted [`DatasourcePlugin`] into `registry`.
///
/// Stops at the first failure; plugins registered before it stay registered.
/// Returns the number of plugins loaded.
pub fn load_plugins(registry: &Registry) -> Result<usize, TypeRegistrationError> {
	let mut plugins: Vec<&'static DatasourcePlugin> = inventory::iter::<DatasourcePlugin>.into_iter().collect();
	plugins.sort_by(|a, b| a.tag.cmp(b.tag));

	for plugin in &plugins {
		if let Err(error) = (plugin.register)(registry) {
			tracing::error!(tag = plugin.tag, %error, "datasource plugin failed to register");
			return Err(error);
		}
	}

	tracing::debug!(count = plugins.len(), "datasource plugins loaded");
	Ok(plugins.len())
}

/// Submits a datasource type for registration by [`load_plugins`].
///
/// ```ignore
/// fluent_registry::datasource_plugin!(CsvDatasource);
/// ```
#[macro_export]
macro_rules! datasource_plugin {
	($ty:ty) => {
		$crate::inventory::submit!($crate::db::DatasourcePlugin::of::<$ty>());
	};
}
