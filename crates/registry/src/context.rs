//! Host-side collaborators: the data context that owns datasource instances.
//!
//! The registry never implements a context. It only builds datasources, hands them to
//! [`DataContext::attach_datasource`], and forwards batch requests built by
//! synthesized `read_<tag>` methods to [`DataContext::get_validator`].

use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::defs::{DatasourceHandle, Fields};

/// Non-owning reference from a datasource back to its context.
pub type ContextRef = Weak<dyn DataContext>;

/// The host application's owner of live datasources.
pub trait DataContext: Send + Sync {
	/// Registers `datasource` under its name. Name collisions are the host's call.
	fn attach_datasource(&self, datasource: DatasourceHandle) -> Result<(), ContextError>;

	/// Existing datasources keyed by name.
	fn datasources(&self) -> IndexMap<String, ContextDatasource>;

	/// Resolves a validator for the batch described by `batch_request`.
	fn get_validator(&self, batch_request: BatchRequest) -> Result<Validator, ContextError>;
}

/// A datasource as seen through the host context.
#[derive(Debug, Clone)]
pub enum ContextDatasource {
	/// Built through this registry.
	Managed(DatasourceHandle),
	/// Anything the host tracks that the registry does not manage.
	Legacy(LegacyDatasource),
}

impl ContextDatasource {
	pub fn name(&self) -> &str {
		match self {
			Self::Managed(handle) => handle.name(),
			Self::Legacy(legacy) => &legacy.name,
		}
	}

	/// Short description of the concrete kind, for error messages.
	pub fn kind_name(&self) -> String {
		match self {
			Self::Managed(handle) => handle.type_key().name().to_string(),
			Self::Legacy(legacy) => legacy.class_name.clone(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyDatasource {
	pub name: String,
	pub class_name: String,
}

/// Opaque request for a batch of data from one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
	pub datasource_name: String,
	pub data_asset_name: String,
	#[serde(default)]
	pub options: Fields,
}

impl BatchRequest {
	pub fn new(datasource_name: impl Into<String>, data_asset_name: impl Into<String>) -> Self {
		Self {
			datasource_name: datasource_name.into(),
			data_asset_name: data_asset_name.into(),
			options: Fields::new(),
		}
	}

	pub fn with_options(mut self, options: Fields) -> Self {
		self.options = options;
		self
	}
}

/// What the host hands back from [`DataContext::get_validator`].
#[derive(Debug, Clone, PartialEq)]
pub struct Validator {
	pub batch_request: BatchRequest,
}

impl Validator {
	pub fn new(batch_request: BatchRequest) -> Self {
		Self { batch_request }
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
	#[error("a datasource named `{0}` already exists")]
	NameCollision(String),
	#[error("unable to get validator: {0}")]
	Validator(String),
}

/// Why a datasource did not accept a context reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextSlotError {
	/// The datasource has no context slot at all.
	#[error("datasource has no context slot")]
	Missing,
	#[error("context slot rejected the reference: {0}")]
	Rejected(String),
}

/// Storage for a [`ContextRef`], for datasources that want one.
#[derive(Default, Clone)]
pub struct ContextSlot(Option<ContextRef>);

impl ContextSlot {
	pub fn set(&mut self, context: ContextRef) {
		self.0 = Some(context);
	}

	/// Upgrades the stored reference; `None` if unset or the context was dropped.
	pub fn get(&self) -> Option<Arc<dyn DataContext>> {
		self.0.as_ref().and_then(Weak::upgrade)
	}

	pub fn is_set(&self) -> bool {
		self.0.is_some()
	}
}

impl fmt::Debug for ContextSlot {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ContextSlot")
			.field("attached", &self.get().is_some())
			.finish()
	}
}
