use std::any::Any;

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use super::*;
use crate::config::RegistryConfig;
use crate::context::{BatchRequest, ContextError};
use crate::defs::{AssetType, DatasourceType};
use crate::error::TypeRegistrationError;
use crate::tests::*;

fn fields(value: serde_json::Value) -> Fields {
	match value {
		serde_json::Value::Object(map) => map,
		other => panic!("expected an object, got {other}"),
	}
}

fn facade(registry: Registry, context: &Arc<TestContext>) -> SourceFactories {
	let context: Arc<dyn DataContext> = context.clone();
	SourceFactories::new(Arc::new(registry), context)
}

fn registry_with<F: FnOnce(&Registry) -> Result<(), TypeRegistrationError>>(register: F) -> Registry {
	let registry = Registry::new();
	register(&registry).unwrap();
	registry
}

#[test]
fn csv_factory_builds_attaches_and_exposes_asset_methods() {
	let context = TestContext::new();
	let sources = facade(registry_with(Registry::register::<CsvDatasource>), &context);
	assert_eq!(sources.factories(), vec!["add_csv"]);

	let csv = sources
		.resolve("add_csv")
		.unwrap()
		.call("my_csv", fields(json!({ "base_directory": "/data" })))
		.unwrap();

	assert_eq!(csv.name(), "my_csv");
	assert!(csv.is::<CsvDatasource>());
	assert_eq!(context.names(), vec!["my_csv"]);
	assert_eq!(csv.method_names(), vec!["add_file_asset", "read_file"]);
	assert_eq!(
		csv.with(|ds: &CsvDatasource| ds.base_directory.clone()),
		Some(Some("/data".to_string()))
	);

	let trips = csv
		.invoke_add("add_file_asset", "trips", fields(json!({ "path": "trips.csv", "sep": ";" })))
		.unwrap();
	let trips = (&*trips as &dyn Any).downcast_ref::<FileAsset>().unwrap();
	assert_eq!(trips.path, "trips.csv");
	assert_eq!(trips.sep.as_deref(), Some(";"));

	let validator = csv
		.invoke_read("read_file", Some("yellow"), fields(json!({ "path": "yellow.csv" })))
		.unwrap();
	assert_eq!(validator.batch_request, BatchRequest::new("my_csv", "yellow"));
	assert_eq!(
		csv.with(|ds: &CsvDatasource| ds.assets.names().map(str::to_string).collect::<Vec<_>>()),
		Some(vec!["trips".to_string(), "yellow".to_string()])
	);
}

#[test]
fn unknown_factory_lists_known_names_and_suggests() {
	let context = TestContext::new();
	let sources = facade(registry_with(Registry::register::<CsvDatasource>), &context);

	let err = sources.resolve("add_cvs").unwrap_err();

	assert_eq!(err.known, vec!["add_csv"]);
	assert_eq!(err.suggestion.as_deref(), Some("add_csv"));
	assert_eq!(err.to_string(), "No factory add_cvs in [\"add_csv\"]; did you mean `add_csv`?");
}

#[test]
fn distant_names_get_no_suggestion() {
	let context = TestContext::new();
	let sources = facade(registry_with(Registry::register::<CsvDatasource>), &context);

	let err = sources.resolve("add_postgres").unwrap_err();

	assert_eq!(err.suggestion, None);
	assert_eq!(err.to_string(), "No factory add_postgres in [\"add_csv\"]");
}

#[test]
fn failed_registration_leaves_no_factory() {
	let context = TestContext::new();
	let registry = Registry::new();
	let broken = DatasourceType::new(TypeKey::of::<PandasDatasource>(), "broken")
		.with_asset_types(vec![AssetType::of::<ParquetAsset>(), AssetType::of::<UntaggedAsset>()]);
	registry
		.register_types_and_factory(broken, slotless_factory())
		.unwrap_err();
	let sources = facade(registry, &context);

	assert!(sources.resolve("add_broken").is_err());
	assert!(sources.factories().is_empty());
}

#[test]
fn list_attributes_covers_factories_and_members() {
	let context = TestContext::new();
	let registry = Registry::new();
	registry.register::<CsvDatasource>().unwrap();
	registry.register::<PandasDatasource>().unwrap();
	let sources = facade(registry, &context);

	let attributes = sources.list_attributes();

	for name in sources.factories().iter().map(String::as_str).chain(BUILTIN_MEMBERS.iter().copied()) {
		assert!(attributes.iter().any(|a| a == name), "missing {name}");
	}
}

#[test]
fn factories_registered_later_are_visible() {
	let context = TestContext::new();
	let sources = facade(Registry::new(), &context);
	assert!(sources.resolve("add_pandas").is_err());

	sources.registry().register::<PandasDatasource>().unwrap();

	assert!(sources.resolve("add_pandas").is_ok());
}

#[test]
fn resolved_factory_describes_itself() {
	let context = TestContext::new();
	let sources = facade(registry_with(Registry::register::<CsvDatasource>), &context);

	let factory = sources.resolve("add_csv").unwrap();

	assert_eq!(factory.name(), "add_csv");
	assert_eq!(factory.type_key(), TypeKey::of::<CsvDatasource>());
	assert_eq!(factory.signature().param_names(), vec!["name", "base_directory", "kwargs"]);
	assert!(factory.doc().contains("CsvDatasource"));
}

#[test]
fn pandas_default_is_idempotent() {
	let context = TestContext::new();
	let sources = facade(registry_with(Registry::register::<PandasDatasource>), &context);

	let first = sources.pandas_default().unwrap();
	let second = sources.pandas_default().unwrap();

	assert!(first.ptr_eq(&second));
	assert!(first.is::<PandasDatasource>());
	assert_eq!(context.names(), vec![DEFAULT_PANDAS_DATASOURCE_NAME]);
}

#[test]
fn pandas_default_conflicts_with_legacy_datasource() {
	let context = TestContext::with_legacy(DEFAULT_PANDAS_DATASOURCE_NAME, "SqlDatasource");
	let sources = facade(registry_with(Registry::register::<PandasDatasource>), &context);

	let err = sources.pandas_default().unwrap_err();

	match err {
		DefaultDatasourceError::Conflict { name, found, expected } => {
			assert_eq!(name, DEFAULT_PANDAS_DATASOURCE_NAME);
			assert_eq!(found, "SqlDatasource");
			assert_eq!(expected, "PandasDatasource");
		}
		other => panic!("unexpected error: {other}"),
	}
}

#[test]
fn legacy_conflict_is_reported_without_a_registered_factory() {
	let context = TestContext::with_legacy(DEFAULT_PANDAS_DATASOURCE_NAME, "SqlDatasource");
	let sources = facade(Registry::new(), &context);

	let err = sources.pandas_default().unwrap_err();

	match err {
		DefaultDatasourceError::Conflict { name, found, expected } => {
			assert_eq!(name, DEFAULT_PANDAS_DATASOURCE_NAME);
			assert_eq!(found, "SqlDatasource");
			assert_eq!(expected, "pandas");
		}
		other => panic!("unexpected error: {other}"),
	}
	assert_eq!(context.names(), vec![DEFAULT_PANDAS_DATASOURCE_NAME]);
}

#[test]
fn pandas_default_conflicts_with_other_managed_kind() {
	let context = TestContext::new();
	let registry = Registry::new();
	registry.register::<CsvDatasource>().unwrap();
	registry.register::<PandasDatasource>().unwrap();
	let sources = facade(registry, &context);
	sources
		.resolve("add_csv")
		.unwrap()
		.call(DEFAULT_PANDAS_DATASOURCE_NAME, Fields::new())
		.unwrap();

	let err = sources.pandas_default().unwrap_err();

	assert!(matches!(err, DefaultDatasourceError::Conflict { ref found, .. } if found == "CsvDatasource"));
}

#[test]
fn pandas_default_requires_a_registered_factory() {
	let context = TestContext::new();
	let sources = facade(Registry::new(), &context);

	let err = sources.pandas_default().unwrap_err();

	assert!(matches!(
		err,
		DefaultDatasourceError::Create(FactoryError::AttributeNotFound(ref e)) if e.name == "add_pandas"
	));
	assert!(context.names().is_empty());
}

#[test]
fn default_datasource_follows_config() {
	let context = TestContext::new();
	let config = RegistryConfig::from_toml_str(
		r#"
[default_datasource]
name = "scratch"
type = "csv"
"#,
	)
	.unwrap();
	let registry = Registry::with_config(config).unwrap();
	registry.register::<CsvDatasource>().unwrap();
	let sources = facade(registry, &context);

	let scratch = sources.pandas_default().unwrap();

	assert_eq!(scratch.name(), "scratch");
	assert!(scratch.is::<CsvDatasource>());
}

#[rstest]
#[case::without_slot("add_slotless")]
#[case::with_sealed_slot("add_sealed")]
fn slotless_datasource_is_still_attached(#[case] factory: &str) {
	let context = TestContext::new();
	let registry = Registry::new();
	registry.register::<SlotlessDatasource>().unwrap();
	registry.register::<SealedDatasource>().unwrap();
	let sources = facade(registry, &context);

	let ds = sources.resolve(factory).unwrap().call("plain", Fields::new()).unwrap();

	assert!(ds.read().context().is_none());
	assert_eq!(context.names(), vec!["plain"]);
}

#[test]
fn factory_building_another_type_is_refused() {
	let context = TestContext::new();
	let registry = Registry::new();
	registry
		.register_types_and_factory(DatasourceType::new(TypeKey::of::<CsvDatasource>(), "csv"), slotless_factory())
		.unwrap();
	let sources = facade(registry, &context);

	let err = sources.resolve("add_csv").unwrap().call("odd", Fields::new()).unwrap_err();

	assert!(matches!(err, FactoryError::UnexpectedType { expected } if expected == TypeKey::of::<CsvDatasource>()));
	assert!(context.names().is_empty());
}

#[test]
fn context_errors_are_surfaced() {
	let context = TestContext::new();
	let sources = facade(registry_with(Registry::register::<PandasDatasource>), &context);
	let add_pandas = sources.resolve("add_pandas").unwrap();
	add_pandas.call("frames", Fields::new()).unwrap();

	let err = add_pandas.call("frames", Fields::new()).unwrap_err();

	assert!(matches!(err, FactoryError::Context(ContextError::NameCollision(ref name)) if name == "frames"));
}

#[test]
fn reserved_fields_are_refused() {
	let context = TestContext::new();
	let sources = facade(registry_with(Registry::register::<CsvDatasource>), &context);

	let err = sources
		.resolve("add_csv")
		.unwrap()
		.call("my_csv", fields(json!({ "name": "other" })))
		.unwrap_err();

	assert!(matches!(err, FactoryError::ReservedField { field: "name", .. }));
	assert!(context.names().is_empty());
}
