use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::de::{Error as _, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single flag value as delivered by the flag provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FlagValue {
    /// Enabled predicate for bare values. Text only counts when it spells one
    /// of the enabled sentinels, so `"false"` or `"control"` stay disabled.
    pub fn is_enabled(&self) -> bool {
        match self {
            FlagValue::Bool(enabled) => *enabled,
            FlagValue::Number(n) => *n != 0.0 && !n.is_nan(),
            FlagValue::Text(s) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "on" | "enabled"
            ),
        }
    }

    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FlagValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            FlagValue::Number(n) => Some(Cow::Owned(format_number(*n))),
            FlagValue::Bool(_) => None,
        }
    }

    /// Integer reading of the value: numbers truncate, text uses its leading integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FlagValue::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            FlagValue::Number(_) | FlagValue::Bool(_) => None,
            FlagValue::Text(s) => parse_leading_integer(s),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Leading integer of `s`, like `parseInt`. Digit runs past the `i64` range saturate.
fn parse_leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() {
        return None;
    }
    let magnitude = digits.bytes().fold(0i64, |acc, digit| {
        acc.saturating_mul(10)
            .saturating_add(i64::from(digit - b'0'))
    });
    Some(if negative { -magnitude } else { magnitude })
}

impl From<bool> for FlagValue {
    fn from(value: bool) -> Self {
        FlagValue::Bool(value)
    }
}

impl From<f64> for FlagValue {
    fn from(value: f64) -> Self {
        FlagValue::Number(value)
    }
}

impl From<i64> for FlagValue {
    fn from(value: i64) -> Self {
        FlagValue::Number(value as f64)
    }
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        FlagValue::Text(value.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(value: String) -> Self {
        FlagValue::Text(value)
    }
}

/// One flag as stored: a bare value, or the provider SDK's
/// `{"enabled": .., "value": ..}` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlagEntry {
    Value(FlagValue),
    Provider {
        enabled: bool,
        value: Option<FlagValue>,
    },
}

impl FlagEntry {
    /// Provider entries answer with their own `enabled` bit, whatever the value.
    pub fn is_enabled(&self) -> bool {
        match self {
            FlagEntry::Value(value) => value.is_enabled(),
            FlagEntry::Provider { enabled, .. } => *enabled,
        }
    }

    /// Value as seen by readers. A disabled provider entry has none.
    pub fn value(&self) -> Option<&FlagValue> {
        match self {
            FlagEntry::Value(value) => Some(value),
            FlagEntry::Provider {
                enabled: true,
                value,
            } => value.as_ref(),
            FlagEntry::Provider { enabled: false, .. } => None,
        }
    }

    fn from_json(json: Value) -> Result<Option<FlagEntry>, serde_json::Error> {
        match json {
            Value::Null => Ok(None),
            Value::Object(_) => {
                let entry: ProviderEntry = serde_json::from_value(json)?;
                Ok(Some(FlagEntry::Provider {
                    enabled: entry.enabled,
                    value: entry.value,
                }))
            }
            Value::Array(_) => Err(serde_json::Error::invalid_type(
                Unexpected::Seq,
                &"a flag value or a provider entry",
            )),
            scalar => Ok(Some(FlagEntry::Value(serde_json::from_value(scalar)?))),
        }
    }
}

impl From<FlagValue> for FlagEntry {
    fn from(value: FlagValue) -> Self {
        FlagEntry::Value(value)
    }
}

impl From<bool> for FlagEntry {
    fn from(value: bool) -> Self {
        FlagEntry::Value(value.into())
    }
}

impl From<f64> for FlagEntry {
    fn from(value: f64) -> Self {
        FlagEntry::Value(value.into())
    }
}

impl From<i64> for FlagEntry {
    fn from(value: i64) -> Self {
        FlagEntry::Value(value.into())
    }
}

impl From<&str> for FlagEntry {
    fn from(value: &str) -> Self {
        FlagEntry::Value(value.into())
    }
}

impl From<String> for FlagEntry {
    fn from(value: String) -> Self {
        FlagEntry::Value(value.into())
    }
}

#[derive(Deserialize)]
struct ProviderEntry {
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    value: Option<FlagValue>,
}

/// Snapshot of the raw flags for one fetch cycle, keyed by flag name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawFlags(BTreeMap<String, FlagEntry>);

/// Overrides share the flag shape; they are just read from somewhere else.
pub type OverrideDictionary = RawFlags;

impl RawFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective value of `key`; absent for missing or disabled flags.
    pub fn get(&self, key: &str) -> Option<&FlagValue> {
        self.0.get(key).and_then(FlagEntry::value)
    }

    pub fn entry(&self, key: &str) -> Option<&FlagEntry> {
        self.0.get(key)
    }

    pub fn is_enabled(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(FlagEntry::is_enabled)
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: impl Into<FlagEntry>) {
        self.0.insert(key.into(), entry.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Flag names in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FlagEntry)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of these flags with every entry of `other` laid on top.
    pub fn overlay(&self, other: &RawFlags) -> RawFlags {
        let mut merged = self.0.clone();
        merged.extend(other.iter().map(|(k, v)| (k.clone(), v.clone())));
        RawFlags(merged)
    }
}

impl<K: Into<String>, V: Into<FlagEntry>> FromIterator<(K, V)> for RawFlags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        RawFlags(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Entries that are neither a scalar nor a provider object are dropped on
/// their own; the rest of the snapshot still loads.
impl<'de> Deserialize<'de> for RawFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Ok(RawFlags(
            entries
                .into_iter()
                .filter_map(|(key, json)| match FlagEntry::from_json(json) {
                    Ok(entry) => entry.map(|entry| (key, entry)),
                    Err(e) => {
                        tracing::warn!(flag = %key, "dropping malformed flag entry: {}", e);
                        None
                    }
                })
                .collect(),
        ))
    }
}
