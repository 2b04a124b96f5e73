use std::sync::Arc;

use serde_json::json;
use settings_cache::{CacheConfig, CacheStatus, SettingsCache, SettingsError};
use settings_defaults::DefaultsTable;
use settings_primitives::{OptionMap, Selector, SettingValue};
use settings_storage::{MemoryArea, Storage};

fn defaults() -> Arc<DefaultsTable> {
    Arc::new(
        DefaultsTable::builder()
            .option("color", "blue")
            .option("volume", json!({"level": 5}))
            .option("panel", json!({"width": 300, "docked": true}))
            .build()
            .unwrap(),
    )
}

fn cache_with(managed: Option<MemoryArea>, sync: MemoryArea) -> SettingsCache {
    let mut storage = Storage::new(Arc::new(sync));
    if let Some(managed) = managed {
        storage = storage.with_managed(Arc::new(managed));
    }
    SettingsCache::builder(defaults())
        .with_storage(storage)
        .with_config(CacheConfig::default().with_preload(false))
        .build()
}

#[tokio::test]
async fn untouched_cache_returns_exactly_the_defaults() {
    let cache = cache_with(None, MemoryArea::new());

    let all = cache.get_all().await.unwrap();
    assert_eq!(all, defaults().all());
}

#[tokio::test]
async fn scenario_defaults_then_sets() {
    let cache = cache_with(Some(MemoryArea::unmanaged()), MemoryArea::new());

    let all = cache.get_all().await.unwrap();
    assert_eq!(all["color"].as_str(), Some("blue"));
    assert_eq!(all["volume"].to_json(), json!({"level": 5}));
    assert_eq!(cache.get("color").await.unwrap().as_str(), Some("blue"));

    cache
        .set(("volume", SettingValue::from(json!({"level": 8}))))
        .await
        .unwrap();
    assert_eq!(cache.get("volume").await.unwrap().to_json(), json!({"level": 8}));

    cache
        .set(("volume", SettingValue::from(json!({}))))
        .await
        .unwrap();
    assert_eq!(cache.get("volume").await.unwrap().to_json(), json!({"level": 5}));
}

#[tokio::test]
async fn managed_wins_over_sync_and_defaults() {
    let managed = MemoryArea::from_json(json!({"color": "green"})).unwrap();
    let sync = MemoryArea::from_json(json!({"color": "red"})).unwrap();
    let cache = cache_with(Some(managed), sync);

    assert_eq!(cache.get("color").await.unwrap().as_str(), Some("green"));

    // A user write is stored but still shadowed by policy.
    cache.set(("color", SettingValue::from("yellow"))).await.unwrap();
    assert_eq!(cache.get("color").await.unwrap().as_str(), Some("green"));
    assert_eq!(cache.get_all().await.unwrap()["color"].as_str(), Some("green"));
}

#[tokio::test]
async fn sync_wins_over_defaults() {
    let sync = MemoryArea::from_json(json!({"color": "red", "extra": 1})).unwrap();
    let cache = cache_with(None, sync);

    assert_eq!(cache.get("color").await.unwrap().as_str(), Some("red"));

    let all = cache.get_all().await.unwrap();
    assert_eq!(all["color"].as_str(), Some("red"));
    assert_eq!(all["extra"], SettingValue::from(1_i64));
    assert_eq!(all["volume"].to_json(), json!({"level": 5}));
}

#[tokio::test]
async fn partial_mappings_keep_default_sub_keys() {
    let managed = MemoryArea::from_json(json!({"panel": {"docked": false}})).unwrap();
    let sync = MemoryArea::from_json(json!({"volume": {"muted": true}})).unwrap();
    let cache = cache_with(Some(managed), sync);

    assert_eq!(
        cache.get("panel").await.unwrap().to_json(),
        json!({"width": 300, "docked": false})
    );
    assert_eq!(
        cache.get("volume").await.unwrap().to_json(),
        json!({"level": 5, "muted": true})
    );
}

#[tokio::test]
async fn stored_option_without_default_is_returned_as_stored() {
    let sync = MemoryArea::from_json(json!({"experimental": {"on": true}})).unwrap();
    let cache = cache_with(None, sync);

    assert_eq!(cache.get("experimental").await.unwrap().to_json(), json!({"on": true}));
}

#[tokio::test]
async fn unknown_option_fails() {
    let cache = cache_with(None, MemoryArea::new());

    let err = cache.get("colour").await.unwrap_err();
    assert!(matches!(err, SettingsError::UnknownOption { ref option } if option == "colour"));
    assert!(matches!(
        cache.get("").await,
        Err(SettingsError::InvalidArgument { .. })
    ));
}

#[tokio::test]
async fn repeated_reads_are_stable() {
    let sync = MemoryArea::from_json(json!({"color": "red"})).unwrap();
    let cache = cache_with(None, sync);

    let first = cache.get("color").await.unwrap();
    let second = cache.get("color").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.get_all().await.unwrap(), cache.get_all().await.unwrap());
}

#[tokio::test]
async fn set_then_get_round_trips() {
    let cache = cache_with(None, MemoryArea::new());

    cache.set(("color", SettingValue::from("purple"))).await.unwrap();
    assert_eq!(cache.get("color").await.unwrap().as_str(), Some("purple"));

    let many = OptionMap::from([
        ("a".to_owned(), SettingValue::from(1_i64)),
        ("b".to_owned(), SettingValue::from(json!([1, 2]))),
    ]);
    cache.set(many).await.unwrap();
    assert_eq!(cache.get("a").await.unwrap(), SettingValue::from(1_i64));
    assert_eq!(cache.get("b").await.unwrap().to_json(), json!([1, 2]));
}

#[tokio::test]
async fn set_writes_through_to_storage() {
    let sync = Arc::new(MemoryArea::new());
    let cache = SettingsCache::builder(defaults())
        .with_storage(Storage::new(sync.clone()))
        .with_config(CacheConfig::default().with_preload(false))
        .build();

    cache.set(("color", SettingValue::from("red"))).await.unwrap();
    assert_eq!(sync.snapshot().await["color"].as_str(), Some("red"));
}

#[tokio::test]
async fn default_values_are_isolated_copies() {
    let cache = cache_with(None, MemoryArea::new());

    let mut volume = cache.get_default_value("volume").unwrap();
    if let SettingValue::Mapping(map) = &mut volume {
        map.insert("level".into(), json!(0));
    }
    assert_eq!(cache.get_default_value("volume").unwrap().to_json(), json!({"level": 5}));

    let mut fetched = cache.get("volume").await.unwrap();
    if let SettingValue::Mapping(map) = &mut fetched {
        map.clear();
    }
    assert_eq!(cache.get("volume").await.unwrap().to_json(), json!({"level": 5}));

    assert_eq!(cache.default_values().len(), 3);
    assert!(matches!(
        cache.get_default_value("missing"),
        Err(SettingsError::UnknownOption { .. })
    ));
}

#[tokio::test]
async fn typed_reads_deserialize() {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Volume {
        level: u8,
    }

    let cache = cache_with(None, MemoryArea::new());
    assert_eq!(cache.get_as::<Volume>("volume").await.unwrap(), Volume { level: 5 });
    assert_eq!(cache.get_as::<String>("color").await.unwrap(), "blue");
    assert!(matches!(
        cache.get_as::<u8>("color").await,
        Err(SettingsError::Decode { .. })
    ));
}

#[tokio::test]
async fn status_follows_the_load_lifecycle() {
    let cache = cache_with(None, MemoryArea::new());
    assert_eq!(cache.status(), CacheStatus::Uninitialized);

    let handle = cache.load_options(Selector::All).unwrap();
    handle.clone().wait_synced().await.unwrap();
    handle.wait().await.unwrap();
    assert_eq!(cache.status(), CacheStatus::Ready);
}
