//! Data asset traits and the registrable asset type descriptor.

use std::any::Any;
use std::fmt;

use serde::de::DeserializeOwned;

use super::Fields;
use super::signature::FieldSpec;
use crate::context::BatchRequest;
use crate::core::TypeKey;
use crate::error::FactoryError;

/// An item produced by a datasource.
pub trait DataAsset: Any + Send + Sync + fmt::Debug {
	fn name(&self) -> &str;

	fn build_batch_request(&self, datasource_name: &str) -> BatchRequest {
		BatchRequest::new(datasource_name, self.name())
	}
}

/// A concrete asset type that can be registered under a datasource.
///
/// Instances are built by deserializing the caller's fields plus `name`.
pub trait AssetKind: DataAsset + DeserializeOwned {
	/// Declared tag. `None` (or an empty string) makes registration fail.
	const TYPE: Option<&'static str>;

	/// Constructible fields, for signatures only.
	const FIELDS: &'static [FieldSpec] = &[];
}

type AssetCtor = fn(&str, Fields) -> Result<Box<dyn DataAsset>, FactoryError>;

/// Type-erased descriptor of an [`AssetKind`].
#[derive(Clone, Copy)]
pub struct AssetType {
	key: TypeKey,
	tag: Option<&'static str>,
	fields: &'static [FieldSpec],
	construct: AssetCtor,
}

impl AssetType {
	pub fn of<T: AssetKind>() -> Self {
		Self {
			key: TypeKey::of::<T>(),
			tag: T::TYPE,
			fields: T::FIELDS,
			construct: construct_boxed::<T>,
		}
	}

	pub fn key(&self) -> TypeKey {
		self.key
	}

	/// The declared tag, if one is assigned and non-empty.
	pub fn tag(&self) -> Option<&'static str> {
		self.tag.filter(|tag| !tag.is_empty())
	}

	pub fn fields(&self) -> &'static [FieldSpec] {
		self.fields
	}

	pub fn is_private(&self) -> bool {
		self.key.is_private()
	}

	/// Builds an instance named `name` from `fields`.
	pub fn construct(&self, name: &str, fields: Fields) -> Result<Box<dyn DataAsset>, FactoryError> {
		(self.construct)(name, fields)
	}
}

impl fmt::Debug for AssetType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AssetType")
			.field("key", &self.key)
			.field("tag", &self.tag)
			.finish()
	}
}

fn construct_boxed<T: AssetKind>(name: &str, fields: Fields) -> Result<Box<dyn DataAsset>, FactoryError> {
	let asset: T = super::construct_from_fields(name, fields)?;
	Ok(Box::new(asset))
}
