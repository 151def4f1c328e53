//! Runtime identity for registrable Rust types.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a registered datasource or asset type.
///
/// Equality and hashing use only the [`TypeId`]; the name is carried for messages
/// and for the private-type naming convention.
#[derive(Clone, Copy)]
pub struct TypeKey {
	id: TypeId,
	name: &'static str,
}

impl TypeKey {
	pub fn of<T: Any>() -> Self {
		Self {
			id: TypeId::of::<T>(),
			name: short_type_name(std::any::type_name::<T>()),
		}
	}

	/// Key for an arbitrary id/name pair, used by hosts that mint descriptors by hand.
	pub const fn from_parts(id: TypeId, name: &'static str) -> Self {
		Self { id, name }
	}

	pub fn type_id(&self) -> TypeId {
		self.id
	}

	/// Unqualified type name, e.g. `CsvAsset`.
	pub fn name(&self) -> &'static str {
		self.name
	}

	/// Types whose name starts with an underscore are not public concrete types.
	pub fn is_private(&self) -> bool {
		self.name.starts_with('_')
	}

	/// Returns true when `value` is an instance of this type.
	pub fn matches(&self, value: &dyn Any) -> bool {
		value.type_id() == self.id
	}
}

impl PartialEq for TypeKey {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

impl fmt::Debug for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("TypeKey").field(&self.name).finish()
	}
}

impl fmt::Display for TypeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name)
	}
}

/// Strips the module path (and generic arguments) from [`std::any::type_name`] output.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
	let base = full.split('<').next().unwrap_or(full);
	base.rsplit("::").next().unwrap_or(base)
}
