use super::key::TypeKey;

/// Bijection violations and failed lookups in a [`crate::core::TypeLookup`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
	/// The tag is already mapped to a type.
	#[error("`{tag}` already set (mapped to `{existing}`)")]
	DuplicateTag { tag: String, existing: TypeKey },
	/// The type is already mapped to a tag.
	#[error("`{ty}` already set (mapped to `{existing}`)")]
	DuplicateType { ty: TypeKey, existing: String },
	#[error("`{0}` not found")]
	NotFound(String),
	/// Returned by `raise_if_contains` when a collection overlaps registered tags.
	#[error("items are already present: {0:?}")]
	AlreadyPresent(Vec<String>),
}
