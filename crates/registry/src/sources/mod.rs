//! The `sources` façade: datasource factories resolved by name.
//!
//! # Role
//!
//! [`SourceFactories`] pairs a [`Registry`] with the host [`DataContext`]. Factories are
//! looked up in the registry's current snapshot at call time, so a type registered
//! after the façade was created is immediately callable.
//!
//! # Invariants
//!
//! - A built datasource reaches the host only if its concrete type matches the
//!   type its factory was registered for.
//!   - Enforced in: [`SourceFactory::call`].
//! - Context attachment on a fresh datasource never fails a factory call.
//!   - Tested by: `tests::slotless_datasource_is_still_attached`.
//! - [`SourceFactories::pandas_default`] creates at most one default datasource.
//!   - Tested by: `tests::pandas_default_is_idempotent`.

use std::any::Any;
use std::sync::Arc;

use crate::context::{ContextDatasource, ContextRef, ContextSlotError, DataContext};
use crate::core::TypeKey;
use crate::db::{FactoryBinding, Registry};
use crate::defs::{Datasource, DatasourceHandle, Fields, Signature};
use crate::error::{AttributeNotFoundError, DefaultDatasourceError, FactoryError};

#[cfg(test)]
mod tests;

/// Reserved context name of the default pandas datasource.
pub const DEFAULT_PANDAS_DATASOURCE_NAME: &str = "default_pandas_datasource";

/// Asset name used by `read_<tag>` methods when none is given.
pub const DEFAULT_PANDAS_DATA_ASSET_NAME: &str = "#ephemeral_pandas_asset";

/// Members of the façade itself, listed alongside factory names.
pub const BUILTIN_MEMBERS: &[&str] = &["factories", "list_attributes", "pandas_default", "resolve"];

/// Name-resolved datasource factories bound to one data context.
#[derive(Clone)]
pub struct SourceFactories {
	registry: Arc<Registry>,
	context: Arc<dyn DataContext>,
}

impl SourceFactories {
	pub fn new(registry: Arc<Registry>, context: Arc<dyn DataContext>) -> Self {
		Self { registry, context }
	}

	/// Façade over the process-wide registry.
	pub fn global(context: Arc<dyn DataContext>) -> Self {
		Self::new(Registry::global(), context)
	}

	pub fn registry(&self) -> &Arc<Registry> {
		&self.registry
	}

	/// Every registered factory name, in registration order.
	pub fn factories(&self) -> Vec<String> {
		self.registry.factories()
	}

	pub fn resolve(&self, name: &str) -> Result<SourceFactory, AttributeNotFoundError> {
		match self.registry.binding(name) {
			Some(binding) => Ok(SourceFactory {
				binding,
				context: Arc::clone(&self.context),
			}),
			None => Err(AttributeNotFoundError::new(name, self.factories())),
		}
	}

	/// Factory names followed by the façade's own members.
	pub fn list_attributes(&self) -> Vec<String> {
		let mut attributes = self.factories();
		attributes.extend(BUILTIN_MEMBERS.iter().map(|member| member.to_string()));
		attributes
	}

	/// Returns the context's default datasource, creating it on first use.
	///
	/// Name and type come from [`RegistryConfig::default_datasource`](crate::config::RegistryConfig).
	/// A legacy datasource under the default name is a conflict whether or not
	/// the default type is registered.
	pub fn pandas_default(&self) -> Result<DatasourceHandle, DefaultDatasourceError> {
		let config = &self.registry.config().default_datasource;
		let existing = self.context.datasources().swap_remove(&config.name);
		let factory = self.resolve(&format!("add_{}", config.type_tag));

		match (existing, factory) {
			(Some(ContextDatasource::Managed(handle)), Ok(factory)) if handle.type_key() == factory.type_key() => {
				Ok(handle)
			}
			(Some(existing), factory) => Err(DefaultDatasourceError::Conflict {
				name: config.name.clone(),
				found: existing.kind_name(),
				expected: match factory {
					Ok(factory) => factory.type_key().name().to_string(),
					Err(_) => config.type_tag.clone(),
				},
			}),
			(None, factory) => {
				let factory = factory.map_err(FactoryError::from)?;
				tracing::debug!(name = %config.name, method = factory.name(), "creating default datasource");
				Ok(factory.call(&config.name, Fields::new())?)
			}
		}
	}
}

impl std::fmt::Debug for SourceFactories {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SourceFactories")
			.field("factories", &self.factories())
			.finish_non_exhaustive()
	}
}

/// A resolved `add_<tag>` factory.
#[derive(Clone)]
pub struct SourceFactory {
	binding: FactoryBinding,
	context: Arc<dyn DataContext>,
}

impl SourceFactory {
	pub fn name(&self) -> &str {
		self.binding.method_name()
	}

	pub fn type_key(&self) -> TypeKey {
		self.binding.type_key()
	}

	pub fn signature(&self) -> &Signature {
		self.binding.signature()
	}

	pub fn doc(&self) -> &str {
		self.binding.doc()
	}

	/// Builds a datasource named `name`, attaches it to the context and returns it.
	pub fn call(&self, name: &str, fields: Fields) -> Result<DatasourceHandle, FactoryError> {
		let key = self.binding.type_key();
		let mut datasource = (self.binding.factory())(name, fields)?;

		let built: &dyn Datasource = &*datasource;
		let built: &dyn Any = built;
		if !key.matches(built) {
			return Err(FactoryError::UnexpectedType { expected: key });
		}

		let context: ContextRef = Arc::downgrade(&self.context);
		match datasource.attach_context(context) {
			Ok(()) => {}
			Err(ContextSlotError::Missing) => {
				tracing::debug!(datasource = key.name(), name, "datasource has no context slot");
			}
			Err(error) => {
				tracing::warn!(datasource = key.name(), name, %error, "unable to attach context to datasource");
			}
		}

		let handle = DatasourceHandle::new(datasource, key, Arc::clone(self.binding.methods()));
		self.context.attach_datasource(handle.clone())?;
		tracing::debug!(datasource = key.name(), name, "datasource attached to context");
		Ok(handle)
	}
}

impl std::fmt::Debug for SourceFactory {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SourceFactory")
			.field("name", &self.name())
			.field("signature", &self.signature().to_string())
			.finish()
	}
}
