//! The datasource type registry and its process-wide instance.
//!
//! # Role
//!
//! [`Registry`] owns the datasource tag lookup, one asset tag lookup per datasource
//! type, and the factory table keyed by derived `add_<tag>` names.
//!
//! # Concurrency
//!
//! - **Reads:** wait-free; callers load the current [`Snapshot`] through `ArcSwap`.
//! - **Writes:** serialized by a writer mutex. Each registration stages its changes
//!   on a copy of the current snapshot and publishes the copy with a single store.
//!
//! # Invariants
//!
//! - A failed registration publishes nothing.
//!   - Enforced in: [`Registry::register_types_and_factory`] (staged transactions,
//!     snapshot stored only after every check passed).
//!   - Tested by: `tests::failed_asset_rolls_back_datasource_and_siblings`.
//! - Factory names are unique; a collision never overwrites the first binding.
//!   - Tested by: `tests::second_datasource_with_same_tag_is_rejected`,
//!     `tests::racing_registrations_yield_one_winner`.

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;

use crate::config::{ConfigError, DuplicatePolicy, RegistryConfig};
use crate::core::{Transaction, TypeKey};
use crate::defs::{Datasource, DatasourceKind, DatasourceType, Fields, Signature, construct_from_fields};
use crate::error::{AssetDeclError, TypeRegistrationError};
use crate::synth::{self, MethodTable};

pub mod plugin;
pub mod snapshot;

pub use plugin::{DatasourcePlugin, load_plugins};
pub use snapshot::{FactoryBinding, Snapshot, SourceFactoryFn};


static GLOBAL: LazyLock<Arc<Registry>> = LazyLock::new(|| Arc::new(Registry::new()));

/// Where a registered type sits in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisteredKind {
	Datasource,
	Asset { datasource: TypeKey },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredType {
	pub tag: String,
	pub key: TypeKey,
	pub kind: RegisteredKind,
}

pub struct Registry {
	config: RegistryConfig,
	ephemeral_asset_name: Arc<str>,
	write_lock: Mutex<()>,
	snap: ArcSwap<Snapshot>,
}

impl Registry {
	pub fn new() -> Self {
		Self::from_valid_config(RegistryConfig::default())
	}

	/// Registry using `config`, which is validated first.
	pub fn with_config(config: RegistryConfig) -> Result<Self, ConfigError> {
		config.validate()?;
		Ok(Self::from_valid_config(config))
	}

	fn from_valid_config(config: RegistryConfig) -> Self {
		Self {
			ephemeral_asset_name: Arc::from(config.ephemeral_asset_name.as_str()),
			config,
			write_lock: Mutex::new(()),
			snap: ArcSwap::from_pointee(Snapshot::default()),
		}
	}

	/// The process-wide registry. Starts empty and is never torn down.
	pub fn global() -> Arc<Registry> {
		Arc::clone(&GLOBAL)
	}

	pub fn config(&self) -> &RegistryConfig {
		&self.config
	}

	/// Current committed state.
	pub fn snapshot(&self) -> Arc<Snapshot> {
		self.snap.load_full()
	}

	/// Registered factory names, in registration order.
	pub fn factories(&self) -> Vec<String> {
		self.snap.load().factory_names().map(str::to_string).collect()
	}

	pub fn binding(&self, method_name: &str) -> Option<FactoryBinding> {
		self.snap.load().factory(method_name).cloned()
	}

	/// Registers `T` with a factory that deserializes it from the caller's fields.
	pub fn register<T>(&self) -> Result<(), TypeRegistrationError>
	where
		T: DatasourceKind + DeserializeOwned,
	{
		let factory: SourceFactoryFn = Arc::new(|name: &str, fields: Fields| {
			let datasource: T = construct_from_fields(name, fields)?;
			Ok(Box::new(datasource) as Box<dyn Datasource>)
		});
		self.register_internal(DatasourceType::of::<T>(), factory, true)
	}

	/// Registers a datasource type, all of its asset types, and its `add_<tag>` factory.
	///
	/// All or nothing: on error neither lookup nor the factory table changes.
	pub fn register_types_and_factory(
		&self,
		ds_type: DatasourceType,
		factory: SourceFactoryFn,
	) -> Result<(), TypeRegistrationError> {
		self.register_internal(ds_type, factory, false)
	}

	fn register_internal(
		&self,
		ds_type: DatasourceType,
		factory: SourceFactoryFn,
		derived: bool,
	) -> Result<(), TypeRegistrationError> {
		let key = ds_type.key();
		let tag = ds_type.tag();
		if tag.is_empty() {
			return Err(TypeRegistrationError::MissingType { type_name: key.name() });
		}
		let method_name = format!("add_{tag}");

		let _writer = self.write_lock.lock();
		let current = self.snap.load_full();

		if self.config.duplicate_policy == DuplicatePolicy::IgnoreIdentical
			&& let Some(existing) = current.factory(&method_name)
			&& existing.is_identical(key, tag, &factory, derived)
		{
			tracing::debug!(datasource = key.name(), method = %method_name, "identical registration ignored");
			return Ok(());
		}
		if current.factory(&method_name).is_some() {
			return Err(TypeRegistrationError::FactoryExists {
				tag: tag.to_string(),
				method: method_name,
			});
		}

		let mut next = Snapshot::clone(&current);
		let mut methods = ds_type.declared_methods().clone();
		{
			let Snapshot {
				datasources,
				asset_lookups,
				factories,
			} = &mut next;

			let mut ds_txn = datasources.transaction();
			let mut asset_txn = asset_lookups.entry(key).or_default().transaction();

			self.register_assets(&ds_type, &mut asset_txn, &mut methods)?;

			tracing::debug!(
				datasource = key.name(),
				tag,
				method = %method_name,
				"registering datasource factory"
			);

			ds_txn
				.set(key, tag)
				.map_err(|source| TypeRegistrationError::Lookup {
					datasource: key.name(),
					tag: tag.to_string(),
					source,
				})?;

			asset_txn.commit();
			ds_txn.commit();

			let signature = Signature::new()
				.positional("name", "str")
				.var_keyword("kwargs")
				.returns(key.name())
				.merge_fields(ds_type.fields(), &["type"]);
			factories.insert(
				method_name.clone(),
				FactoryBinding {
					doc: format!("Create a `{}` datasource and attach it to the data context.", key.name()),
					method_name,
					tag: tag.to_string(),
					key,
					factory,
					derived,
					methods: Arc::new(methods),
					signature,
				},
			);
		}

		self.snap.store(Arc::new(next));
		Ok(())
	}

	fn register_assets(
		&self,
		ds_type: &DatasourceType,
		txn: &mut Transaction<'_>,
		methods: &mut MethodTable,
	) -> Result<(), TypeRegistrationError> {
		let datasource = ds_type.key().name();
		if ds_type.asset_types().is_empty() {
			tracing::warn!(datasource, "no asset types declared for datasource");
		}

		for asset_type in ds_type.asset_types() {
			let asset = asset_type.key().name();
			if asset_type.is_private() {
				tracing::debug!(datasource, asset, "asset type is private; skipping registration");
				continue;
			}

			let invalid = |source: AssetDeclError| TypeRegistrationError::InvalidAsset {
				datasource,
				asset,
				source,
			};
			let tag = asset_type.tag().ok_or_else(|| invalid(AssetDeclError::MissingType(asset)))?;

			tracing::debug!(datasource, asset, tag, "registering asset type");
			txn.set(asset_type.key(), tag)
				.map_err(|source| invalid(AssetDeclError::Lookup(source)))?;

			synth::bind_asset_methods_if_absent(ds_type, asset_type, tag, &self.ephemeral_asset_name, methods);
		}
		Ok(())
	}

	/// Every registered datasource type followed by its asset types.
	pub fn iter_registered_types(&self) -> Vec<RegisteredType> {
		let snap = self.snap.load();
		let mut out = Vec::new();
		for (tag, key) in snap.datasources.iter() {
			out.push(RegisteredType {
				tag: tag.to_string(),
				key,
				kind: RegisteredKind::Datasource,
			});
			let Some(assets) = snap.asset_types(key) else {
				continue;
			};
			out.extend(assets.iter().map(|(asset_tag, asset_key)| RegisteredType {
				tag: asset_tag.to_string(),
				key: asset_key,
				kind: RegisteredKind::Asset { datasource: key },
			}));
		}
		out
	}
}

impl Default for Registry {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for Registry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Registry")
			.field("config", &self.config)
			.field("factories", &self.factories())
			.finish()
	}
}
