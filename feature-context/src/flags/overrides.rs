use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use thiserror::Error;

use crate::config::Config;
use crate::flags::flag_models::{OverrideDictionary, RawFlags};

#[derive(Error, Debug)]
pub enum OverrideError {
    #[error("override cookie is not valid utf-8: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),
    #[error("failed to parse override cookie: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Client-side persisted overrides, consulted only in preview deployments.
pub trait OverrideStore {
    /// Current overrides. Unreadable state reads as empty.
    fn read(&self) -> OverrideDictionary;

    /// Fetched flags with `overrides` taking precedence for matching keys.
    fn merge(&self, flags: &RawFlags, overrides: &OverrideDictionary) -> RawFlags {
        flags.overlay(overrides)
    }
}

impl<T: OverrideStore + ?Sized> OverrideStore for &T {
    fn read(&self) -> OverrideDictionary {
        (**self).read()
    }

    fn merge(&self, flags: &RawFlags, overrides: &OverrideDictionary) -> RawFlags {
        (**self).merge(flags, overrides)
    }
}

/// Reads overrides out of a `Cookie` request header. The cookie holds a
/// percent-encoded JSON object of flag name to value.
#[derive(Debug, Clone)]
pub struct CookieOverrideStore {
    cookie_name: String,
    header: Option<String>,
}

impl CookieOverrideStore {
    pub fn new(cookie_name: impl Into<String>, header: Option<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            header,
        }
    }

    pub fn from_config(config: &Config, header: Option<String>) -> Self {
        Self::new(config.overrides_cookie_name.clone(), header)
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Strict read: a missing cookie is empty, a malformed one is an error.
    pub fn parse(&self) -> Result<OverrideDictionary, OverrideError> {
        let Some(raw) = self
            .header
            .as_deref()
            .and_then(|header| find_cookie(header, &self.cookie_name))
        else {
            return Ok(OverrideDictionary::default());
        };

        let decoded = percent_decode_str(raw).decode_utf8()?;
        if decoded.trim().is_empty() {
            return Ok(OverrideDictionary::default());
        }
        Ok(serde_json::from_str(&decoded)?)
    }

    pub fn to_cookie_value(overrides: &OverrideDictionary) -> Result<String, OverrideError> {
        let json = serde_json::to_string(overrides)?;
        Ok(utf8_percent_encode(&json, NON_ALPHANUMERIC).to_string())
    }

    /// `Set-Cookie` value that persists `overrides` under this store's cookie name.
    pub fn to_set_cookie(&self, overrides: &OverrideDictionary) -> Result<String, OverrideError> {
        Ok(format!(
            "{}={}; Path=/",
            self.cookie_name,
            Self::to_cookie_value(overrides)?
        ))
    }
}

impl OverrideStore for CookieOverrideStore {
    fn read(&self) -> OverrideDictionary {
        match self.parse() {
            Ok(overrides) => overrides,
            Err(e) => {
                tracing::warn!(cookie = %self.cookie_name, "ignoring feature overrides: {}", e);
                OverrideDictionary::default()
            }
        }
    }
}

fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
}

/// Fixed overrides held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOverrideStore {
    overrides: OverrideDictionary,
}

impl InMemoryOverrideStore {
    pub fn new(overrides: OverrideDictionary) -> Self {
        Self { overrides }
    }
}

impl OverrideStore for InMemoryOverrideStore {
    fn read(&self) -> OverrideDictionary {
        self.overrides.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::flag_models::FlagValue;

    fn cookie_header(name: &str, overrides: &OverrideDictionary) -> String {
        format!(
            "session=abc; {}={}; theme=dark",
            name,
            CookieOverrideStore::to_cookie_value(overrides).unwrap()
        )
    }

    #[test]
    fn test_reads_overrides_from_cookie() {
        let overrides: OverrideDictionary = [
            ("onboarding_steps", FlagValue::from("topics/theme")),
            ("squad", FlagValue::Bool(true)),
        ]
        .into_iter()
        .collect();
        let store = CookieOverrideStore::new(
            "feature_flags",
            Some(cookie_header("feature_flags", &overrides)),
        );

        assert_eq!(store.read(), overrides);
    }

    #[test]
    fn test_missing_header_or_cookie_reads_empty() {
        let no_header = CookieOverrideStore::new("feature_flags", None);
        assert!(no_header.read().is_empty());

        let other_cookies =
            CookieOverrideStore::new("feature_flags", Some("session=abc; theme=dark".to_string()));
        assert!(other_cookies.parse().unwrap().is_empty());

        let blank = CookieOverrideStore::new("feature_flags", Some("feature_flags=".to_string()));
        assert!(blank.parse().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_cookie_degrades_to_empty() {
        let store =
            CookieOverrideStore::new("feature_flags", Some("feature_flags=%7Bnope".to_string()));

        assert!(matches!(store.parse(), Err(OverrideError::InvalidJson(_))));
        assert!(store.read().is_empty());
    }

    #[test]
    fn test_invalid_utf8_cookie_is_an_encoding_error() {
        let store = CookieOverrideStore::new("feature_flags", Some("feature_flags=%FF".to_string()));

        assert!(matches!(
            store.parse(),
            Err(OverrideError::InvalidEncoding(_))
        ));
        assert!(store.read().is_empty());
    }

    #[test]
    fn test_set_cookie_uses_configured_name() {
        let store = CookieOverrideStore::from_config(&Config::default_test_config(), None);
        let overrides: OverrideDictionary = [("x", "2")].into_iter().collect();

        let set_cookie = store.to_set_cookie(&overrides).unwrap();

        assert!(set_cookie.starts_with("feature_flags=%7B"));
        assert!(set_cookie.ends_with("; Path=/"));
    }

    #[test]
    fn test_default_merge_prefers_overrides() {
        let store = InMemoryOverrideStore::default();
        let fetched: RawFlags = [("x", "1"), ("z", "0")].into_iter().collect();
        let overrides: OverrideDictionary = [("x", "2"), ("y", "3")].into_iter().collect();

        let merged = store.merge(&fetched, &overrides);

        assert_eq!(merged.keys(), vec!["x", "y", "z"]);
        assert_eq!(merged.get("x"), Some(&FlagValue::from("2")));
        assert_eq!(merged.get("z"), Some(&FlagValue::from("0")));
    }
}
