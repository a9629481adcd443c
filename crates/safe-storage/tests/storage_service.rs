use safe_storage::{get_all_implementations, StorageError, StorageService};
use safe_types::StorageKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Record {
	owners: Vec<String>,
	threshold: usize,
}

fn record() -> Record {
	Record {
		owners: vec!["0xaa".to_string(), "0xbb".to_string()],
		threshold: 2,
	}
}

fn file_service(path: &std::path::Path) -> StorageService {
	let factories: HashMap<_, _> = get_all_implementations().into_iter().collect();
	let config: toml::Value = toml::from_str(&format!(
		"storage_path = \"{}\"",
		path.display().to_string().replace('\\', "/")
	))
	.unwrap();
	StorageService::new(factories["file"](&config).unwrap())
}

#[tokio::test]
async fn test_typed_round_trip_survives_new_service() {
	let dir = tempfile::tempdir().unwrap();
	let ns = StorageKey::Wallets.as_str();

	file_service(dir.path())
		.store(ns, "treasury", &record())
		.await
		.unwrap();

	let reopened = file_service(dir.path());
	let loaded: Record = reopened.retrieve(ns, "treasury").await.unwrap();
	assert_eq!(loaded, record());
	assert!(reopened.exists(ns, "treasury").await.unwrap());
}

#[tokio::test]
async fn test_optional_update_and_remove() {
	let factories: HashMap<_, _> = get_all_implementations().into_iter().collect();
	let empty = toml::Value::Table(Default::default());
	let service = StorageService::new(factories["memory"](&empty).unwrap());
	let ns = StorageKey::Wallets.as_str();

	let missing: Option<Record> = service.retrieve_optional(ns, "ops").await.unwrap();
	assert!(missing.is_none());
	assert!(matches!(
		service.update(ns, "ops", &record()).await,
		Err(StorageError::NotFound)
	));

	service.store(ns, "ops", &record()).await.unwrap();
	let mut changed = record();
	changed.threshold = 1;
	service.update(ns, "ops", &changed).await.unwrap();
	let loaded: Option<Record> = service.retrieve_optional(ns, "ops").await.unwrap();
	assert_eq!(loaded, Some(changed));

	service.remove(ns, "ops").await.unwrap();
	assert!(!service.exists(ns, "ops").await.unwrap());
}
