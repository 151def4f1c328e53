//! Datasource and asset types shared by the unit tests.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::context::{
	BatchRequest, ContextDatasource, ContextError, ContextRef, ContextSlot, ContextSlotError, DataContext,
	LegacyDatasource, Validator,
};
use crate::db::SourceFactoryFn;
use crate::defs::{
	AssetKind, AssetSet, AssetType, DataAsset, Datasource, DatasourceKind, Fields, FieldSpec,
};
use crate::error::AssetError;
use crate::synth::{AssetMethod, MethodTable};

crate::datasource_plugin!(CsvDatasource);
crate::datasource_plugin!(PandasDatasource);

/// Tags submitted by the `datasource_plugin!` calls above, in load order.
pub(crate) const PLUGIN_TAGS: &[&str] = &["csv", "pandas"];

#[derive(Debug, Deserialize)]
pub(crate) struct FileAsset {
	pub name: String,
	pub path: String,
	#[serde(default)]
	pub sep: Option<String>,
}

impl DataAsset for FileAsset {
	fn name(&self) -> &str {
		&self.name
	}
}

impl AssetKind for FileAsset {
	const TYPE: Option<&'static str> = Some("file");
	const FIELDS: &'static [FieldSpec] = &[
		FieldSpec::required("type", "str"),
		FieldSpec::required("path", "str"),
		FieldSpec::optional("sep", "str | None", "None"),
	];
}

#[derive(Debug, Deserialize)]
#[allow(non_camel_case_types)]
pub(crate) struct _PrivateAsset {
	pub name: String,
}

impl DataAsset for _PrivateAsset {
	fn name(&self) -> &str {
		&self.name
	}
}

impl AssetKind for _PrivateAsset {
	const TYPE: Option<&'static str> = None;
}

#[derive(Debug, Deserialize)]
pub(crate) struct ParquetAsset {
	pub name: String,
}

impl DataAsset for ParquetAsset {
	fn name(&self) -> &str {
		&self.name
	}
}

impl AssetKind for ParquetAsset {
	const TYPE: Option<&'static str> = Some("parquet");
}

/// Reuses the `file` tag of [`FileAsset`].
#[derive(Debug, Deserialize)]
pub(crate) struct ShadowFileAsset {
	pub name: String,
}

impl DataAsset for ShadowFileAsset {
	fn name(&self) -> &str {
		&self.name
	}
}

impl AssetKind for ShadowFileAsset {
	const TYPE: Option<&'static str> = Some("file");
}

/// Public asset with no tag; registering it always fails.
#[derive(Debug, Deserialize)]
pub(crate) struct UntaggedAsset {
	pub name: String,
}

impl DataAsset for UntaggedAsset {
	fn name(&self) -> &str {
		&self.name
	}
}

impl AssetKind for UntaggedAsset {
	const TYPE: Option<&'static str> = None;
}

#[derive(Debug, Deserialize)]
pub(crate) struct DataFrameAsset {
	pub name: String,
}

impl DataAsset for DataFrameAsset {
	fn name(&self) -> &str {
		&self.name
	}
}

impl AssetKind for DataFrameAsset {
	const TYPE: Option<&'static str> = Some("dataframe");
}

#[derive(Debug, Deserialize)]
pub(crate) struct CsvDatasource {
	pub name: String,
	#[serde(default)]
	pub base_directory: Option<String>,
	#[serde(skip)]
	pub assets: AssetSet,
	#[serde(skip)]
	context: ContextSlot,
}

impl Datasource for CsvDatasource {
	fn name(&self) -> &str {
		&self.name
	}

	fn add_asset(&mut self, asset: Box<dyn DataAsset>) -> Result<Arc<dyn DataAsset>, AssetError> {
		self.assets.insert(asset)
	}

	fn attach_context(&mut self, context: ContextRef) -> Result<(), ContextSlotError> {
		self.context.set(context);
		Ok(())
	}

	fn context(&self) -> Option<Arc<dyn DataContext>> {
		self.context.get()
	}
}

impl DatasourceKind for CsvDatasource {
	const TYPE: &'static str = "csv";
	const FIELDS: &'static [FieldSpec] = &[
		FieldSpec::required("type", "str"),
		FieldSpec::optional("base_directory", "str | None", "None"),
	];

	fn asset_types() -> Vec<AssetType> {
		vec![AssetType::of::<FileAsset>(), AssetType::of::<_PrivateAsset>()]
	}
}

#[derive(Debug, Deserialize)]
pub(crate) struct PandasDatasource {
	pub name: String,
	#[serde(skip)]
	pub assets: AssetSet,
	#[serde(skip)]
	context: ContextSlot,
}

impl Datasource for PandasDatasource {
	fn name(&self) -> &str {
		&self.name
	}

	fn add_asset(&mut self, asset: Box<dyn DataAsset>) -> Result<Arc<dyn DataAsset>, AssetError> {
		self.assets.insert(asset)
	}

	fn attach_context(&mut self, context: ContextRef) -> Result<(), ContextSlotError> {
		self.context.set(context);
		Ok(())
	}

	fn context(&self) -> Option<Arc<dyn DataContext>> {
		self.context.get()
	}
}

impl DatasourceKind for PandasDatasource {
	const TYPE: &'static str = "pandas";

	fn asset_types() -> Vec<AssetType> {
		vec![AssetType::of::<DataFrameAsset>()]
	}
}

/// Has no context slot and no asset types.
#[derive(Debug, Deserialize)]
pub(crate) struct SlotlessDatasource {
	pub name: String,
}

impl Datasource for SlotlessDatasource {
	fn name(&self) -> &str {
		&self.name
	}

	fn add_asset(&mut self, asset: Box<dyn DataAsset>) -> Result<Arc<dyn DataAsset>, AssetError> {
		Err(AssetError::Rejected(asset.name().to_string()))
	}
}

impl DatasourceKind for SlotlessDatasource {
	const TYPE: &'static str = "slotless";
}

/// Has a context slot that refuses every reference.
#[derive(Debug, Deserialize)]
pub(crate) struct SealedDatasource {
	pub name: String,
}

impl Datasource for SealedDatasource {
	fn name(&self) -> &str {
		&self.name
	}

	fn add_asset(&mut self, asset: Box<dyn DataAsset>) -> Result<Arc<dyn DataAsset>, AssetError> {
		Err(AssetError::Rejected(asset.name().to_string()))
	}

	fn attach_context(&mut self, _context: ContextRef) -> Result<(), ContextSlotError> {
		Err(ContextSlotError::Rejected("sealed".to_string()))
	}
}

impl DatasourceKind for SealedDatasource {
	const TYPE: &'static str = "sealed";
}

/// Declares its own `add_file_asset`.
#[derive(Debug, Deserialize)]
pub(crate) struct DeclaredDatasource {
	pub name: String,
	#[serde(skip)]
	pub assets: AssetSet,
}

impl Datasource for DeclaredDatasource {
	fn name(&self) -> &str {
		&self.name
	}

	fn add_asset(&mut self, asset: Box<dyn DataAsset>) -> Result<Arc<dyn DataAsset>, AssetError> {
		self.assets.insert(asset)
	}
}

impl DatasourceKind for DeclaredDatasource {
	const TYPE: &'static str = "declared";

	fn asset_types() -> Vec<AssetType> {
		vec![AssetType::of::<FileAsset>()]
	}

	fn declared_methods() -> MethodTable {
		let mut table = MethodTable::new();
		table.declare(
			"add_file_asset",
			AssetMethod::add(|ds, name, mut fields: Fields| {
				fields.entry("path").or_insert_with(|| "declared.csv".into());
				let asset = AssetType::of::<FileAsset>().construct(name, fields)?;
				ds.write()
					.add_asset(asset)
					.map_err(|source| crate::error::FactoryError::AddAsset {
						datasource: ds.name().to_string(),
						source,
					})
			}),
		);
		table
	}
}

/// Default-constructed factory for [`SlotlessDatasource`].
pub(crate) fn slotless_factory() -> SourceFactoryFn {
	Arc::new(|name: &str, _fields: Fields| {
		Ok(Box::new(SlotlessDatasource { name: name.to_string() }) as Box<dyn Datasource>)
	})
}

/// Host context that records everything the registry hands it.
#[derive(Default)]
pub(crate) struct TestContext {
	datasources: Mutex<IndexMap<String, ContextDatasource>>,
	requests: Mutex<Vec<BatchRequest>>,
}

impl TestContext {
	pub(crate) fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Context that already holds a datasource the registry does not manage.
	pub(crate) fn with_legacy(name: &str, class_name: &str) -> Arc<Self> {
		let context = Self::default();
		context.datasources.lock().insert(
			name.to_string(),
			ContextDatasource::Legacy(LegacyDatasource {
				name: name.to_string(),
				class_name: class_name.to_string(),
			}),
		);
		Arc::new(context)
	}

	pub(crate) fn names(&self) -> Vec<String> {
		self.datasources.lock().keys().cloned().collect()
	}

	pub(crate) fn requests(&self) -> Vec<BatchRequest> {
		self.requests.lock().clone()
	}
}

impl DataContext for TestContext {
	fn attach_datasource(&self, datasource: crate::defs::DatasourceHandle) -> Result<(), ContextError> {
		let mut datasources = self.datasources.lock();
		let name = datasource.name().to_string();
		if datasources.contains_key(&name) {
			return Err(ContextError::NameCollision(name));
		}
		datasources.insert(name, ContextDatasource::Managed(datasource));
		Ok(())
	}

	fn datasources(&self) -> IndexMap<String, ContextDatasource> {
		self.datasources.lock().clone()
	}

	fn get_validator(&self, batch_request: BatchRequest) -> Result<Validator, ContextError> {
		self.requests.lock().push(batch_request.clone());
		Ok(Validator::new(batch_request))
	}
}
