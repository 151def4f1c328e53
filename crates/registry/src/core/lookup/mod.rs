//! Two-way mapping between registered types and their string tags.
//!
//! # Role
//!
//! A [`TypeLookup`] is a bijection: each tag names exactly one type and each type
//! carries exactly one tag. Entries are never replaced or removed once visible.
//!
//! # Transactions
//!
//! [`TypeLookup::transaction`] returns a [`Transaction`] that stages writes in an
//! overlay. Staged entries are visible through the transaction itself but not through
//! the lookup until [`Transaction::commit`]. Dropping an uncommitted transaction
//! discards the overlay, so an early return (or a panic) during a multi-step
//! registration leaves the lookup exactly as it was.
//!
//! # Invariants
//!
//! - `get(tag_of(t)) == t` and `tag_of(get(tag)) == tag` for every committed entry.
//!   - Enforced in: [`TypeLookup::set`], [`Transaction::set`].
//!   - Tested by: `tests::bijection_holds_for_committed_entries`.
//! - Iteration order is insertion order.

use rustc_hash::FxHashMap;

use super::error::LookupError;
use super::key::TypeKey;


/// Bidirectional tag ↔ type table.
#[derive(Debug, Clone, Default)]
pub struct TypeLookup {
	/// Insertion-ordered entries; the maps below index into this.
	entries: Vec<(String, TypeKey)>,
	by_tag: FxHashMap<String, usize>,
	by_type: FxHashMap<TypeKey, usize>,
}

impl TypeLookup {
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts a new entry, rejecting any tag or type that is already mapped.
	pub fn set(&mut self, ty: TypeKey, tag: impl Into<String>) -> Result<(), LookupError> {
		let tag = tag.into();
		self.check_vacant(ty, &tag)?;
		self.insert_unchecked(ty, tag);
		Ok(())
	}

	/// Returns the type registered under `tag`.
	pub fn get(&self, tag: &str) -> Result<TypeKey, LookupError> {
		self.by_tag
			.get(tag)
			.map(|&idx| self.entries[idx].1)
			.ok_or_else(|| LookupError::NotFound(tag.to_string()))
	}

	/// Returns the tag registered for `ty`.
	pub fn tag_of(&self, ty: TypeKey) -> Result<&str, LookupError> {
		self.by_type
			.get(&ty)
			.map(|&idx| self.entries[idx].0.as_str())
			.ok_or_else(|| LookupError::NotFound(ty.name().to_string()))
	}

	pub fn contains_tag(&self, tag: &str) -> bool {
		self.by_tag.contains_key(tag)
	}

	pub fn contains_type(&self, ty: TypeKey) -> bool {
		self.by_type.contains_key(&ty)
	}

	/// Registered tags in insertion order.
	pub fn type_names(&self) -> impl Iterator<Item = &str> + '_ {
		self.entries.iter().map(|(tag, _)| tag.as_str())
	}

	/// Committed `(tag, type)` pairs in insertion order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, TypeKey)> + '_ {
		self.entries.iter().map(|(tag, ty)| (tag.as_str(), *ty))
	}

	/// Tags from `tags` that are already registered, in the order given.
	pub fn intersection<'a, I>(&self, tags: I) -> Vec<String>
	where
		I: IntoIterator<Item = &'a str>,
	{
		tags.into_iter()
			.filter(|tag| self.contains_tag(tag))
			.map(str::to_string)
			.collect()
	}

	/// Fails with [`LookupError::AlreadyPresent`] if any of `tags` is registered.
	pub fn raise_if_contains<'a, I>(&self, tags: I) -> Result<(), LookupError>
	where
		I: IntoIterator<Item = &'a str>,
	{
		let present = self.intersection(tags);
		if present.is_empty() {
			Ok(())
		} else {
			Err(LookupError::AlreadyPresent(present))
		}
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Opens a staged-write scope over this lookup.
	pub fn transaction(&mut self) -> Transaction<'_> {
		tracing::trace!(entries = self.entries.len(), "beginning type lookup transaction");
		Transaction {
			base: self,
			staged: TypeLookup::new(),
		}
	}

	fn check_vacant(&self, ty: TypeKey, tag: &str) -> Result<(), LookupError> {
		if let Some(&idx) = self.by_tag.get(tag) {
			return Err(LookupError::DuplicateTag {
				tag: tag.to_string(),
				existing: self.entries[idx].1,
			});
		}
		if let Some(&idx) = self.by_type.get(&ty) {
			return Err(LookupError::DuplicateType {
				ty,
				existing: self.entries[idx].0.clone(),
			});
		}
		Ok(())
	}

	fn insert_unchecked(&mut self, ty: TypeKey, tag: String) {
		let idx = self.entries.len();
		self.by_tag.insert(tag.clone(), idx);
		self.by_type.insert(ty, idx);
		self.entries.push((tag, ty));
	}
}

/// Staged writes over a [`TypeLookup`]; committed all at once or not at all.
#[must_use = "an uncommitted transaction is rolled back when dropped"]
pub struct Transaction<'a> {
	base: &'a mut TypeLookup,
	staged: TypeLookup,
}

impl Transaction<'_> {
	/// Stages a new entry. Conflicts are checked against both committed and staged entries.
	pub fn set(&mut self, ty: TypeKey, tag: impl Into<String>) -> Result<(), LookupError> {
		let tag = tag.into();
		self.base.check_vacant(ty, &tag)?;
		self.staged.set(ty, tag)
	}

	/// Looks `tag` up in the staged overlay, then in the committed lookup.
	pub fn get(&self, tag: &str) -> Result<TypeKey, LookupError> {
		self.staged.get(tag).or_else(|_| self.base.get(tag))
	}

	pub fn tag_of(&self, ty: TypeKey) -> Result<&str, LookupError> {
		match self.staged.tag_of(ty) {
			Ok(tag) => Ok(tag),
			Err(_) => self.base.tag_of(ty),
		}
	}

	/// Number of entries staged so far.
	pub fn staged_len(&self) -> usize {
		self.staged.len()
	}

	/// Publishes every staged entry to the underlying lookup.
	pub fn commit(mut self) {
		let staged = std::mem::take(&mut self.staged);
		tracing::trace!(count = staged.len(), "committing type lookup transaction");
		for (tag, ty) in staged.entries {
			self.base.insert_unchecked(ty, tag);
		}
	}
}

impl Drop for Transaction<'_> {
	fn drop(&mut self) {
		if !self.staged.is_empty() {
			tracing::debug!(
				discarded = self.staged.len(),
				"type lookup transaction rolled back"
			);
		}
	}
}
