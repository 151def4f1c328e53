//! Per-datasource asset method tables and the synthesizer that fills them.
//!
//! # Role
//!
//! For every public asset type a datasource declares, the registry wants two
//! methods on the datasource: `add_<tag>_asset` (build the asset and add it) and
//! `read_<tag>` (build, add, then ask the context for a validator). This module
//! generates both as [`AssetMethod`] values and binds them into the datasource's
//! [`MethodTable`] unless the datasource type declares `add_<tag>_asset` itself.
//!
//! # Invariants
//!
//! - A declared method is never replaced.
//!   - Enforced in: [`bind_asset_methods_if_absent`].
//!   - Tested by: `tests::declared_add_method_is_kept`.
//! - The presence check only looks at the datasource type's own declarations.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::context::Validator;
use crate::defs::{AssetType, DataAsset, DatasourceHandle, DatasourceType, Fields, Signature};
use crate::error::FactoryError;


pub type AddAssetFn =
	Arc<dyn Fn(&DatasourceHandle, &str, Fields) -> Result<Arc<dyn DataAsset>, FactoryError> + Send + Sync>;

pub type ReadAssetFn =
	Arc<dyn Fn(&DatasourceHandle, Option<&str>, Fields) -> Result<Validator, FactoryError> + Send + Sync>;

#[derive(Clone)]
pub enum AssetOp {
	Add(AddAssetFn),
	Read(ReadAssetFn),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodOrigin {
	/// Written by hand on the datasource type.
	Declared,
	/// Generated at registration time.
	Synthesized,
}

/// A callable method on a datasource, plus its descriptive signature.
#[derive(Clone)]
pub struct AssetMethod {
	op: AssetOp,
	signature: Signature,
	origin: MethodOrigin,
}

impl AssetMethod {
	/// A hand-written add-asset method.
	pub fn add<F>(f: F) -> Self
	where
		F: Fn(&DatasourceHandle, &str, Fields) -> Result<Arc<dyn DataAsset>, FactoryError> + Send + Sync + 'static,
	{
		Self::declared(AssetOp::Add(Arc::new(f)))
	}

	/// A hand-written read method.
	pub fn read<F>(f: F) -> Self
	where
		F: Fn(&DatasourceHandle, Option<&str>, Fields) -> Result<Validator, FactoryError> + Send + Sync + 'static,
	{
		Self::declared(AssetOp::Read(Arc::new(f)))
	}

	pub fn declared(op: AssetOp) -> Self {
		Self {
			op,
			signature: Signature::new(),
			origin: MethodOrigin::Declared,
		}
	}

	pub fn with_signature(mut self, signature: Signature) -> Self {
		self.signature = signature;
		self
	}

	pub fn op(&self) -> &AssetOp {
		&self.op
	}

	pub fn signature(&self) -> &Signature {
		&self.signature
	}

	pub fn origin(&self) -> MethodOrigin {
		self.origin
	}

	/// True when both methods wrap the same function object.
	pub fn same_fn(&self, other: &AssetMethod) -> bool {
		match (&self.op, &other.op) {
			(AssetOp::Add(a), AssetOp::Add(b)) => Arc::ptr_eq(a, b),
			(AssetOp::Read(a), AssetOp::Read(b)) => Arc::ptr_eq(a, b),
			_ => false,
		}
	}

	fn synthesized(op: AssetOp, signature: Signature) -> Self {
		Self {
			op,
			signature,
			origin: MethodOrigin::Synthesized,
		}
	}
}

impl fmt::Debug for AssetMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let kind = match self.op {
			AssetOp::Add(_) => "add",
			AssetOp::Read(_) => "read",
		};
		f.debug_struct("AssetMethod")
			.field("kind", &kind)
			.field("origin", &self.origin)
			.field("signature", &self.signature.to_string())
			.finish()
	}
}

/// Name-ordered asset methods of one datasource type.
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
	methods: IndexMap<String, AssetMethod>,
}

impl MethodTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Binds `method` under `name`, replacing any previous binding.
	pub fn declare(&mut self, name: impl Into<String>, method: AssetMethod) -> &mut Self {
		self.methods.insert(name.into(), method);
		self
	}

	pub fn get(&self, name: &str) -> Option<&AssetMethod> {
		self.methods.get(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.methods.contains_key(name)
	}

	pub fn names(&self) -> Vec<&str> {
		self.methods.keys().map(String::as_str).collect()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &AssetMethod)> + '_ {
		self.methods.iter().map(|(name, method)| (name.as_str(), method))
	}

	pub fn len(&self) -> usize {
		self.methods.len()
	}

	pub fn is_empty(&self) -> bool {
		self.methods.is_empty()
	}
}

pub fn add_method_name(asset_tag: &str) -> String {
	format!("add_{asset_tag}_asset")
}

pub fn read_method_name(asset_tag: &str) -> String {
	format!("read_{asset_tag}")
}

/// Binds the generated `add_<tag>_asset` and `read_<tag>` methods into `table`.
///
/// Skipped entirely when `ds_type` declares `add_<tag>_asset` itself. Returns true
/// when methods were generated.
pub(crate) fn bind_asset_methods_if_absent(
	ds_type: &DatasourceType,
	asset_type: &AssetType,
	asset_tag: &str,
	ephemeral_asset_name: &Arc<str>,
	table: &mut MethodTable,
) -> bool {
	let add_name = add_method_name(asset_tag);
	if ds_type.declared_methods().contains(&add_name) {
		tracing::debug!(
			datasource = ds_type.key().name(),
			method = %add_name,
			"asset method already declared"
		);
		return false;
	}

	tracing::debug!(
		datasource = ds_type.key().name(),
		asset = asset_type.key().name(),
		method = %add_name,
		"generating asset methods"
	);

	table.declare(add_name, synthesize_add(*asset_type));
	table.declare(
		read_method_name(asset_tag),
		synthesize_read(*asset_type, Arc::clone(ephemeral_asset_name)),
	);
	true
}

fn synthesize_add(asset_type: AssetType) -> AssetMethod {
	let signature = Signature::new()
		.positional("name", "str")
		.var_keyword("kwargs")
		.returns(asset_type.key().name())
		.merge_fields(asset_type.fields(), &["type"]);

	let add: AddAssetFn = Arc::new(move |ds: &DatasourceHandle, name: &str, fields: Fields| {
		let asset = asset_type.construct(name, fields)?;
		ds.write()
			.add_asset(asset)
			.map_err(|source| FactoryError::AddAsset {
				datasource: ds.name().to_string(),
				source,
			})
	});
	AssetMethod::synthesized(AssetOp::Add(add), signature)
}

fn synthesize_read(asset_type: AssetType, ephemeral_asset_name: Arc<str>) -> AssetMethod {
	let signature = Signature::new()
		.optional_positional("asset_name", "str | None", "None")
		.var_keyword("kwargs")
		.returns("Validator")
		.merge_fields(asset_type.fields(), &["type"]);

	let read: ReadAssetFn = Arc::new(move |ds: &DatasourceHandle, asset_name: Option<&str>, fields: Fields| {
		let name = asset_name.filter(|n| !n.is_empty()).unwrap_or(&ephemeral_asset_name);
		let asset = asset_type.construct(name, fields)?;

		// The datasource lock is released before calling into the context.
		let (added, context) = {
			let mut guard = ds.write();
			let added = guard.add_asset(asset).map_err(|source| FactoryError::AddAsset {
				datasource: ds.name().to_string(),
				source,
			})?;
			(added, guard.context())
		};

		let context = context.ok_or_else(|| FactoryError::MissingContext(ds.name().to_string()))?;
		let batch_request = added.build_batch_request(ds.name());
		Ok(context.get_validator(batch_request)?)
	});
	AssetMethod::synthesized(AssetOp::Read(read), signature)
}
