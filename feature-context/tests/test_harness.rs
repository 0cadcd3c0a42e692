use std::sync::Arc;

use feature_context::flags::flag_models::RawFlags;
use feature_context::platform::{Platform, PlatformCall};
use feature_context::storage::{KeyValueStore, MemoryStore};
use feature_context::test_utils::TestHarness;

#[test]
fn it_clears_both_stores_on_reset() {
    let kv = Arc::new(MemoryStore::new());
    let backend = Arc::new(MemoryStore::new());

    // What an earlier test might have left behind.
    let previous = TestHarness::with_stores(kv.clone(), backend.clone());
    previous.kv.set("idb:flags", "{}".to_string()).unwrap();
    previous
        .storage
        .set_json("flags", &[("squad", true)].into_iter().collect::<RawFlags>());
    previous.storage.set_item("theme", "dark");
    assert!(!previous.is_clean());

    let harness = TestHarness::with_stores(kv, backend);
    harness.reset();

    assert!(harness.is_clean());
    assert!(harness.kv.keys().unwrap().is_empty());
    assert!(harness.storage.is_empty());
    assert_eq!(harness.storage.get_item("theme"), None);
}

#[test]
fn it_is_clean_when_fresh() {
    let harness = TestHarness::new();
    harness.reset();
    assert!(harness.is_clean());
}

#[test]
fn it_forgets_platform_calls_on_reset() {
    let harness = TestHarness::new();
    let platform: Arc<dyn Platform> = harness.platform.clone();

    platform.open("https://example.com");
    platform.router_push("/onboarding");
    assert_eq!(
        harness.platform.calls(),
        vec![
            PlatformCall::Open("https://example.com".to_string()),
            PlatformCall::RouterPush("/onboarding".to_string()),
        ]
    );

    harness.reset();
    assert!(harness.platform.calls().is_empty());
}
