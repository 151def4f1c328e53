//! Committed registry state.
//!
//! # Role
//!
//! A [`Snapshot`] is immutable once published. Registration clones the current
//! snapshot, stages its changes on the clone, and publishes the clone as a whole, so
//! readers see either all of a registration or none of it.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::core::{TypeKey, TypeLookup};
use crate::defs::{Datasource, Fields, Signature};
use crate::error::FactoryError;
use crate::synth::MethodTable;

/// Builds a datasource named by the first argument from the given fields.
pub type SourceFactoryFn = Arc<dyn Fn(&str, Fields) -> Result<Box<dyn Datasource>, FactoryError> + Send + Sync>;

/// A datasource factory stored under its derived `add_<tag>` name.
#[derive(Clone)]
pub struct FactoryBinding {
	pub(crate) method_name: String,
	pub(crate) tag: String,
	pub(crate) key: TypeKey,
	pub(crate) factory: SourceFactoryFn,
	/// Set when the factory was derived from the type by `Registry::register`.
	pub(crate) derived: bool,
	pub(crate) methods: Arc<MethodTable>,
	pub(crate) signature: Signature,
	pub(crate) doc: String,
}

impl FactoryBinding {
	pub fn method_name(&self) -> &str {
		&self.method_name
	}

	pub fn tag(&self) -> &str {
		&self.tag
	}

	pub fn type_key(&self) -> TypeKey {
		self.key
	}

	pub fn factory(&self) -> &SourceFactoryFn {
		&self.factory
	}

	/// Asset methods installed on datasources built by this factory.
	pub fn methods(&self) -> &Arc<MethodTable> {
		&self.methods
	}

	pub fn signature(&self) -> &Signature {
		&self.signature
	}

	pub fn doc(&self) -> &str {
		&self.doc
	}

	/// Same type, same tag, and the same factory (or both derived from the type).
	pub(crate) fn is_identical(&self, key: TypeKey, tag: &str, factory: &SourceFactoryFn, derived: bool) -> bool {
		self.key == key && self.tag == tag && ((self.derived && derived) || Arc::ptr_eq(&self.factory, factory))
	}
}

impl fmt::Debug for FactoryBinding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FactoryBinding")
			.field("method_name", &self.method_name)
			.field("type", &self.key)
			.field("signature", &self.signature.to_string())
			.finish()
	}
}

/// Everything the registry has committed so far.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
	pub(crate) datasources: TypeLookup,
	/// Asset lookups scoped per datasource type.
	pub(crate) asset_lookups: FxHashMap<TypeKey, TypeLookup>,
	pub(crate) factories: IndexMap<String, FactoryBinding>,
}

impl Snapshot {
	/// Global datasource tag ↔ type lookup.
	pub fn datasource_types(&self) -> &TypeLookup {
		&self.datasources
	}

	/// Asset lookup of one datasource type, if it was registered.
	pub fn asset_types(&self, datasource: TypeKey) -> Option<&TypeLookup> {
		self.asset_lookups.get(&datasource)
	}

	pub fn factory(&self, method_name: &str) -> Option<&FactoryBinding> {
		self.factories.get(method_name)
	}

	/// Factory names in registration order.
	pub fn factory_names(&self) -> impl Iterator<Item = &str> + '_ {
		self.factories.keys().map(String::as_str)
	}
}
