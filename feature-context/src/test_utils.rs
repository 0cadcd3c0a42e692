use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::{distributions::Alphanumeric, Rng};
use serde_json::Value;

use crate::config::Config;
use crate::flags::flag_models::{OverrideDictionary, RawFlags};
use crate::flags::overrides::CookieOverrideStore;
use crate::platform::{Platform, PlatformCall};
use crate::storage::{KeyValueStore, MemoryStore, StorageWrapper};

pub const TEST_STORAGE_PREFIX: &str = "app:";

/// Environment every test runs under.
pub const TEST_ENV: [(&str, &str); 2] = [
    ("API_URL", "http://localhost:3000"),
    ("WEBAPP_URL", "/"),
];

pub fn random_string(prefix: &str, length: usize) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(Alphanumeric)
        .take(length)
        .map(char::from)
        .collect();
    format!("{}{}", prefix, suffix)
}

pub fn flags_from_json(value: Value) -> RawFlags {
    serde_json::from_value(value).expect("Failed to parse test flags")
}

/// `Cookie` header carrying `overrides` under `cookie_name`, between unrelated cookies.
pub fn override_cookie_header(cookie_name: &str, overrides: &OverrideDictionary) -> String {
    let value =
        CookieOverrideStore::to_cookie_value(overrides).expect("Failed to encode test overrides");
    format!("session={}; {}={}", random_string("", 8), cookie_name, value)
}

/// Records every call. Media queries never match and the router query is empty.
#[derive(Debug, Default)]
pub struct FakePlatform {
    calls: Mutex<Vec<PlatformCall>>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: PlatformCall) {
        self.lock().push(call);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PlatformCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.lock().clone()
    }

    pub fn reset(&self) {
        self.lock().clear();
    }
}

impl Platform for FakePlatform {
    fn observe_intersection(&self, target: &str) {
        self.record(PlatformCall::ObserveIntersection(target.to_string()));
    }

    fn unobserve_intersection(&self, target: &str) {
        self.record(PlatformCall::UnobserveIntersection(target.to_string()));
    }

    fn disconnect_intersection(&self) {
        self.record(PlatformCall::DisconnectIntersection);
    }

    fn match_media(&self, query: &str) -> bool {
        self.record(PlatformCall::MatchMedia(query.to_string()));
        false
    }

    fn broadcast(&self, channel: &str, message: &str) {
        self.record(PlatformCall::Broadcast {
            channel: channel.to_string(),
            message: message.to_string(),
        });
    }

    fn close_channel(&self, channel: &str) {
        self.record(PlatformCall::CloseChannel(channel.to_string()));
    }

    fn open(&self, url: &str) {
        self.record(PlatformCall::Open(url.to_string()));
    }

    fn scroll_to(&self, x: f64, y: f64) {
        self.record(PlatformCall::ScrollTo { x, y });
    }

    fn router_query(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn router_push(&self, path: &str) {
        self.record(PlatformCall::RouterPush(path.to_string()));
    }
}

/// Per-test environment: a fake platform plus the two persisted stores.
/// Call [`TestHarness::reset`] at the start of each test so nothing written by
/// a previous test is visible.
pub struct TestHarness {
    pub platform: Arc<FakePlatform>,
    pub kv: Arc<MemoryStore>,
    pub storage: StorageWrapper,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_stores(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Harness over existing stores, e.g. ones shared with a previous test.
    pub fn with_stores(kv: Arc<MemoryStore>, storage_backend: Arc<MemoryStore>) -> Self {
        Self {
            platform: Arc::new(FakePlatform::new()),
            kv,
            storage: StorageWrapper::new(storage_backend, TEST_STORAGE_PREFIX),
        }
    }

    pub fn config(&self) -> Config {
        Config::from_vars(TEST_ENV).expect("Invalid test configuration")
    }

    pub fn reset(&self) {
        if let Err(e) = self.kv.clear() {
            tracing::warn!("failed to clear key-value store: {}", e);
        }
        self.storage.clear();
        self.platform.reset();
    }

    pub fn is_clean(&self) -> bool {
        self.kv.keys().map(|keys| keys.is_empty()).unwrap_or(false) && self.storage.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_string_has_prefix_and_length() {
        let value = random_string("flag_", 12);
        assert!(value.starts_with("flag_"));
        assert_eq!(value.len(), 17);
    }

    #[test]
    fn test_fake_platform_records_calls() {
        let platform = FakePlatform::new();

        assert!(!platform.match_media("(prefers-color-scheme: dark)"));
        platform.observe_intersection("feed");
        platform.scroll_to(0.0, 120.0);
        platform.broadcast("auth", "logout");
        assert!(platform.router_query().is_empty());

        assert_eq!(
            platform.calls(),
            vec![
                PlatformCall::MatchMedia("(prefers-color-scheme: dark)".to_string()),
                PlatformCall::ObserveIntersection("feed".to_string()),
                PlatformCall::ScrollTo { x: 0.0, y: 120.0 },
                PlatformCall::Broadcast {
                    channel: "auth".to_string(),
                    message: "logout".to_string()
                },
            ]
        );

        platform.reset();
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn test_harness_config_uses_test_env() {
        let config = TestHarness::new().config();
        assert_eq!(config.api_url, "http://localhost:3000");
        assert_eq!(config.webapp_url, "/");
        assert!(!config.is_preview());
    }
}
