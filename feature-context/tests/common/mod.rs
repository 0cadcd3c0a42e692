use std::sync::Arc;

use once_cell::sync::Lazy;

use feature_context::config::Config;
use feature_context::flags::flag_models::{OverrideDictionary, RawFlags};
use feature_context::flags::overrides::CookieOverrideStore;
use feature_context::provider::{FeaturesData, FeaturesProvider};
use feature_context::test_utils::override_cookie_header;

pub static DEFAULT_CONFIG: Lazy<Config> = Lazy::new(Config::default_test_config);

pub static PREVIEW_CONFIG: Lazy<Config> = Lazy::new(|| {
    Config::from_vars([("PREVIEW_DEPLOYMENT", "true")]).expect("Invalid preview configuration")
});

/// Runs `flags` through a provider built from `config`, with `overrides`
/// stored in the request cookie.
pub fn provide_with_cookie(
    config: &Config,
    flags: RawFlags,
    overrides: &OverrideDictionary,
) -> Arc<FeaturesData> {
    let header = override_cookie_header(&config.overrides_cookie_name, overrides);
    let store = CookieOverrideStore::from_config(config, Some(header));
    let mut provider = FeaturesProvider::new(store, config.is_preview());
    provider.provide(Arc::new(flags), Some(true), Some(true))
}
