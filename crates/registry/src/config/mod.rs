//! Registry configuration.
//!
//! Every field has a default, so hosts only need to supply what they change. A host
//! that keeps its settings in a TOML file can hand the relevant table to
//! [`RegistryConfig::from_toml_str`].

use serde::Deserialize;

use crate::sources::{DEFAULT_PANDAS_DATA_ASSET_NAME, DEFAULT_PANDAS_DATASOURCE_NAME};


/// What to do when a factory name is registered a second time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
	/// Always fail with `TypeRegistrationError::FactoryExists`.
	#[default]
	Reject,
	/// Accept a repeat of the exact same registration as a no-op; anything else still fails.
	IgnoreIdentical,
}

/// The datasource served by `SourceFactories::pandas_default`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultDatasourceConfig {
	/// Reserved name in the data context.
	pub name: String,
	/// Tag of the datasource type to create.
	#[serde(rename = "type")]
	pub type_tag: String,
}

impl Default for DefaultDatasourceConfig {
	fn default() -> Self {
		Self {
			name: DEFAULT_PANDAS_DATASOURCE_NAME.to_string(),
			type_tag: "pandas".to_string(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
	pub duplicate_policy: DuplicatePolicy,
	pub default_datasource: DefaultDatasourceConfig,
	/// Asset name used by `read_<tag>` when the caller gives none.
	pub ephemeral_asset_name: String,
}

impl Default for RegistryConfig {
	fn default() -> Self {
		Self {
			duplicate_policy: DuplicatePolicy::default(),
			default_datasource: DefaultDatasourceConfig::default(),
			ephemeral_asset_name: DEFAULT_PANDAS_DATA_ASSET_NAME.to_string(),
		}
	}
}

impl RegistryConfig {
	pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(source)?;
		config.validate()?;
		Ok(config)
	}

	pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
		self.duplicate_policy = policy;
		self
	}

	/// Rejects empty names, which would make derived method names meaningless.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let required = [
			("default_datasource.name", &self.default_datasource.name),
			("default_datasource.type", &self.default_datasource.type_tag),
			("ephemeral_asset_name", &self.ephemeral_asset_name),
		];
		match required.into_iter().find(|(_, value)| value.is_empty()) {
			Some((field, _)) => Err(ConfigError::MissingField(field)),
			None => Ok(()),
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("invalid registry config: {0}")]
	Toml(#[from] toml::de::Error),

	#[error("missing required field: {0}")]
	MissingField(&'static str),
}
