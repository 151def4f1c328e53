//! Datasource traits, the registrable datasource type descriptor and the shared
//! handle through which built datasources are used.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::Fields;
use super::asset::{AssetType, DataAsset};
use super::signature::FieldSpec;
use crate::context::{ContextRef, ContextSlotError, DataContext, Validator};
use crate::core::TypeKey;
use crate::error::{AssetError, FactoryError};
use crate::synth::{AssetMethod, AssetOp, MethodTable};

/// A configured source of data assets.
pub trait Datasource: Any + Send + Sync + fmt::Debug {
	fn name(&self) -> &str;

	/// Takes ownership of `asset`; returns the datasource's shared view of it.
	fn add_asset(&mut self, asset: Box<dyn DataAsset>) -> Result<Arc<dyn DataAsset>, AssetError>;

	/// Stores a back-reference to the owning context.
	///
	/// The default has no slot and returns [`ContextSlotError::Missing`].
	fn attach_context(&mut self, context: ContextRef) -> Result<(), ContextSlotError> {
		let _ = context;
		Err(ContextSlotError::Missing)
	}

	fn context(&self) -> Option<Arc<dyn DataContext>> {
		None
	}
}

/// A concrete datasource type with a declared tag.
pub trait DatasourceKind: Datasource + Sized {
	const TYPE: &'static str;

	const FIELDS: &'static [FieldSpec] = &[];

	/// Asset types offered by this datasource, in declaration order.
	fn asset_types() -> Vec<AssetType> {
		Vec::new()
	}

	/// Asset methods this type defines itself. These always win over synthesized ones.
	fn declared_methods() -> MethodTable {
		MethodTable::new()
	}
}

/// Type-erased descriptor of a datasource type.
#[derive(Clone)]
pub struct DatasourceType {
	key: TypeKey,
	tag: &'static str,
	fields: &'static [FieldSpec],
	asset_types: Vec<AssetType>,
	declared: MethodTable,
}

impl DatasourceType {
	pub fn of<T: DatasourceKind>() -> Self {
		Self {
			key: TypeKey::of::<T>(),
			tag: T::TYPE,
			fields: T::FIELDS,
			asset_types: T::asset_types(),
			declared: T::declared_methods(),
		}
	}

	/// Descriptor with no fields, assets or declared methods.
	pub fn new(key: TypeKey, tag: &'static str) -> Self {
		Self {
			key,
			tag,
			fields: &[],
			asset_types: Vec::new(),
			declared: MethodTable::new(),
		}
	}

	pub fn with_fields(mut self, fields: &'static [FieldSpec]) -> Self {
		self.fields = fields;
		self
	}

	pub fn with_asset_types(mut self, asset_types: Vec<AssetType>) -> Self {
		self.asset_types = asset_types;
		self
	}

	pub fn with_method(mut self, name: impl Into<String>, method: AssetMethod) -> Self {
		self.declared.declare(name, method);
		self
	}

	pub fn key(&self) -> TypeKey {
		self.key
	}

	pub fn tag(&self) -> &'static str {
		self.tag
	}

	pub fn fields(&self) -> &'static [FieldSpec] {
		self.fields
	}

	pub fn asset_types(&self) -> &[AssetType] {
		&self.asset_types
	}

	/// Methods declared directly on this type (never inherited or synthesized).
	pub fn declared_methods(&self) -> &MethodTable {
		&self.declared
	}
}

impl fmt::Debug for DatasourceType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DatasourceType")
			.field("key", &self.key)
			.field("tag", &self.tag)
			.field("asset_types", &self.asset_types)
			.field("declared", &self.declared.names())
			.finish()
	}
}

/// Shared, lockable handle to a built datasource plus its asset method table.
#[derive(Clone)]
pub struct DatasourceHandle {
	inner: Arc<RwLock<Box<dyn Datasource>>>,
	key: TypeKey,
	name: Arc<str>,
	methods: Arc<MethodTable>,
}

impl DatasourceHandle {
	pub(crate) fn new(datasource: Box<dyn Datasource>, key: TypeKey, methods: Arc<MethodTable>) -> Self {
		let name = Arc::from(datasource.name());
		Self {
			inner: Arc::new(RwLock::new(datasource)),
			key,
			name,
			methods,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn type_key(&self) -> TypeKey {
		self.key
	}

	pub fn is<T: Datasource>(&self) -> bool {
		self.key == TypeKey::of::<T>()
	}

	pub fn read(&self) -> RwLockReadGuard<'_, Box<dyn Datasource>> {
		self.inner.read()
	}

	pub fn write(&self) -> RwLockWriteGuard<'_, Box<dyn Datasource>> {
		self.inner.write()
	}

	/// Runs `f` on the concrete datasource if it is a `T`.
	pub fn with<T: Datasource, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
		let guard = self.inner.read();
		let ds: &dyn Datasource = &**guard;
		let any: &dyn Any = ds;
		any.downcast_ref::<T>().map(f)
	}

	pub fn with_mut<T: Datasource, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
		let mut guard = self.inner.write();
		let ds: &mut dyn Datasource = &mut **guard;
		let any: &mut dyn Any = ds;
		any.downcast_mut::<T>().map(f)
	}

	pub fn methods(&self) -> &MethodTable {
		&self.methods
	}

	pub fn method_names(&self) -> Vec<&str> {
		self.methods.names()
	}

	pub fn method(&self, name: &str) -> Result<&AssetMethod, FactoryError> {
		self.methods.get(name).ok_or_else(|| FactoryError::NoSuchMethod {
			datasource: self.name.to_string(),
			method: name.to_string(),
			known: self.methods.names().into_iter().map(str::to_string).collect(),
		})
	}

	/// Calls an `add_<tag>_asset` style method.
	pub fn invoke_add(&self, method: &str, name: &str, fields: Fields) -> Result<Arc<dyn DataAsset>, FactoryError> {
		match self.method(method)?.op() {
			AssetOp::Add(f) => f(self, name, fields),
			AssetOp::Read(_) => Err(self.kind_mismatch(method, "add-asset")),
		}
	}

	/// Calls a `read_<tag>` style method.
	pub fn invoke_read(
		&self,
		method: &str,
		asset_name: Option<&str>,
		fields: Fields,
	) -> Result<Validator, FactoryError> {
		match self.method(method)?.op() {
			AssetOp::Read(f) => f(self, asset_name, fields),
			AssetOp::Add(_) => Err(self.kind_mismatch(method, "read-asset")),
		}
	}

	/// True when both handles point at the same datasource instance.
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}

	fn kind_mismatch(&self, method: &str, expected: &'static str) -> FactoryError {
		FactoryError::MethodKind {
			datasource: self.name.to_string(),
			method: method.to_string(),
			expected,
		}
	}
}

impl fmt::Debug for DatasourceHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DatasourceHandle")
			.field("name", &self.name)
			.field("type", &self.key)
			.field("methods", &self.methods.names())
			.finish()
	}
}

/// Name-unique asset storage for datasource implementations.
#[derive(Debug, Default, Clone)]
pub struct AssetSet {
	assets: IndexMap<String, Arc<dyn DataAsset>>,
}

impl AssetSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `asset`, rejecting a second asset with the same name.
	pub fn insert(&mut self, asset: Box<dyn DataAsset>) -> Result<Arc<dyn DataAsset>, AssetError> {
		let name = asset.name().to_string();
		if self.assets.contains_key(&name) {
			return Err(AssetError::Duplicate(name));
		}
		let asset: Arc<dyn DataAsset> = Arc::from(asset);
		self.assets.insert(name, Arc::clone(&asset));
		Ok(asset)
	}

	pub fn get(&self, name: &str) -> Option<&Arc<dyn DataAsset>> {
		self.assets.get(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
		self.assets.keys().map(String::as_str)
	}

	pub fn len(&self) -> usize {
		self.assets.len()
	}

	pub fn is_empty(&self) -> bool {
		self.assets.is_empty()
	}
}
