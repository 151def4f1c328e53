//! Definitions supplied by datasource plugins: traits, type descriptors, signatures.

pub mod asset;
pub mod datasource;
pub mod signature;

pub use asset::{AssetKind, AssetType, DataAsset};
pub use datasource::{AssetSet, Datasource, DatasourceHandle, DatasourceKind, DatasourceType};
use serde::de::DeserializeOwned;
use serde_json::Value;
pub use signature::{FieldSpec, Param, ParamKind, Signature};

use crate::core::TypeKey;
use crate::error::FactoryError;

/// Keyword fields passed to factories and asset methods.
pub type Fields = serde_json::Map<String, Value>;

/// Fields the registry supplies itself; callers may not pass them.
const RESERVED_FIELDS: &[&str] = &["name", "type"];

/// Deserializes `T` from `fields` plus `name`.
pub(crate) fn construct_from_fields<T>(name: &str, mut fields: Fields) -> Result<T, FactoryError>
where
	T: DeserializeOwned + 'static,
{
	let type_name = TypeKey::of::<T>().name();
	if let Some(&field) = RESERVED_FIELDS.iter().find(|f| fields.contains_key(**f)) {
		return Err(FactoryError::ReservedField { type_name, field });
	}
	fields.insert("name".to_string(), Value::String(name.to_string()));
	serde_json::from_value(Value::Object(fields)).map_err(|source| FactoryError::Construct {
		type_name,
		name: name.to_string(),
		source,
	})
}
