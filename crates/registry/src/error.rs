//! Error types for registration, factory resolution and factory invocation.

use crate::context::ContextError;
use crate::core::{LookupError, TypeKey};

/// A registration precondition failed. Nothing from the failed call is visible.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeRegistrationError {
	#[error("`{type_name}` is missing a `type` attribute with an assigned string value")]
	MissingType { type_name: &'static str },

	#[error("'{tag}' - `sources.{method}()` factory already exists")]
	FactoryExists { tag: String, method: String },

	#[error("unable to register asset type `{datasource}.asset_types` -> `{asset}`")]
	InvalidAsset {
		datasource: &'static str,
		asset: &'static str,
		#[source]
		source: AssetDeclError,
	},

	#[error("unable to register `{datasource}` as '{tag}'")]
	Lookup {
		datasource: &'static str,
		tag: String,
		#[source]
		source: LookupError,
	},
}

/// Why a single declared asset type could not be registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetDeclError {
	#[error("`{0}` `type` field must be assigned and cannot be empty")]
	MissingType(&'static str),
	#[error(transparent)]
	Lookup(#[from] LookupError),
}

/// No factory is registered under the requested name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("No factory {name} in {known:?}{}", hint(.suggestion))]
pub struct AttributeNotFoundError {
	pub name: String,
	/// Factory names known at the time of the lookup, in registration order.
	pub known: Vec<String>,
	pub suggestion: Option<String>,
}

fn hint(suggestion: &Option<String>) -> String {
	match suggestion {
		Some(s) => format!("; did you mean `{s}`?"),
		None => String::new(),
	}
}

impl AttributeNotFoundError {
	pub(crate) fn new(name: &str, known: Vec<String>) -> Self {
		let suggestion = known
			.iter()
			.min_by_key(|k| strsim::levenshtein(name, k))
			.filter(|k| strsim::levenshtein(name, k) <= 3)
			.cloned();
		Self {
			name: name.to_string(),
			known,
			suggestion,
		}
	}
}

/// A datasource refused an asset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
	#[error("asset `{0}` already exists")]
	Duplicate(String),
	#[error("asset rejected: {0}")]
	Rejected(String),
}

/// Failure while invoking a datasource factory or one of its asset methods.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
	#[error(transparent)]
	AttributeNotFound(#[from] AttributeNotFoundError),

	#[error("`{field}` is set implicitly for `{type_name}` and cannot be passed as a field")]
	ReservedField {
		type_name: &'static str,
		field: &'static str,
	},

	#[error("unable to construct `{type_name}` named `{name}`")]
	Construct {
		type_name: &'static str,
		name: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("factory registered for `{expected}` built a different datasource type")]
	UnexpectedType { expected: TypeKey },

	#[error("`{datasource}` has no method `{method}` (available: {known:?})")]
	NoSuchMethod {
		datasource: String,
		method: String,
		known: Vec<String>,
	},

	#[error("`{datasource}.{method}` is not a {expected} method")]
	MethodKind {
		datasource: String,
		method: String,
		expected: &'static str,
	},

	#[error("unable to add asset to `{datasource}`")]
	AddAsset {
		datasource: String,
		#[source]
		source: AssetError,
	},

	#[error("datasource `{0}` is not attached to a data context")]
	MissingContext(String),

	#[error(transparent)]
	Context(#[from] ContextError),
}

/// Failure of the default datasource accessor.
#[derive(Debug, thiserror::Error)]
pub enum DefaultDatasourceError {
	#[error(
		"A datasource with a legacy type already exists with the name: \"{name}\" ({found}). Please rename this datasource if you wish to use the default `{expected}` datasource."
	)]
	Conflict {
		name: String,
		found: String,
		expected: String,
	},
	#[error(transparent)]
	Create(#[from] FactoryError),
}
