//! Type-tag registry for pluggable datasources and their data assets.
//!
//! Datasource crates describe their types ([`DatasourceKind`], [`AssetKind`]) and
//! register them with a [`Registry`]. Registration maps every type to a short string
//! tag, installs an `add_<tag>` factory, and gives each datasource type generated
//! `add_<asset>_asset` / `read_<asset>` methods. [`SourceFactories`] resolves those
//! factories by name and hands built datasources to the host [`DataContext`].
//!
//! # Modules
//!
//! - [`core`](crate::core) - Type keys and the transactional tag lookup
//! - [`defs`] - Datasource and asset traits, type descriptors, signatures
//! - [`db`] - The registry, its snapshots and link-time plugins
//! - [`synth`] - Generated per-asset methods
//! - [`sources`] - Name-resolved factory façade
//! - [`context`] - Host context interface
//! - [`config`] - Registry configuration

pub mod config;
pub mod context;
pub mod core;
pub mod db;
pub mod defs;
pub mod error;
pub mod sources;
pub mod synth;

#[cfg(test)]
mod tests;

pub use config::{ConfigError, DefaultDatasourceConfig, DuplicatePolicy, RegistryConfig};
pub use context::{
	BatchRequest, ContextDatasource, ContextError, ContextRef, ContextSlot, ContextSlotError, DataContext,
	LegacyDatasource, Validator,
};
pub use crate::core::{LookupError, Transaction, TypeKey, TypeLookup};
pub use db::{
	DatasourcePlugin, FactoryBinding, RegisteredKind, RegisteredType, Registry, Snapshot, SourceFactoryFn,
	load_plugins,
};
pub use defs::{
	AssetKind, AssetSet, AssetType, DataAsset, Datasource, DatasourceHandle, DatasourceKind, DatasourceType,
	FieldSpec, Fields, Signature,
};
pub use error::{
	AssetDeclError, AssetError, AttributeNotFoundError, DefaultDatasourceError, FactoryError, TypeRegistrationError,
};
// Used by `datasource_plugin!`.
#[doc(hidden)]
pub use inventory;
pub use sources::{SourceFactories, SourceFactory};
pub use synth::{AssetMethod, AssetOp, MethodOrigin, MethodTable};
