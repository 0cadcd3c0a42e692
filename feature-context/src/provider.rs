use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::flags::flag_models::RawFlags;
use crate::flags::overrides::OverrideStore;
use crate::flags::projection::{project, Experiments};

/// Diagnostic hook that receives the merged flag names in preview mode.
pub type KeysInspector = dyn Fn(&[String]) + Send + Sync;

/// Read-only features value handed to consumers for one update cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturesData {
    pub flags: RawFlags,
    #[serde(flatten)]
    pub experiments: Experiments,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_flags_fetched: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_features_loaded: Option<bool>,
}

impl FeaturesData {
    /// Projects `flags` and keeps them alongside the result.
    pub fn from_flags(flags: RawFlags) -> Self {
        let experiments = project(&flags);
        Self {
            flags,
            experiments,
            is_flags_fetched: None,
            is_features_loaded: None,
        }
    }
}

/// Projects `flags`, laying the stored overrides on top first when running
/// in a preview deployment. Outside preview the store is never read.
#[instrument(skip_all, fields(preview = is_preview, flags = flags.len()))]
pub fn merge_and_project<S: OverrideStore + ?Sized>(
    flags: &RawFlags,
    is_preview: bool,
    store: &S,
    inspector: Option<&KeysInspector>,
) -> FeaturesData {
    if !is_preview {
        return FeaturesData::from_flags(flags.clone());
    }

    let overrides = store.read();
    let merged = store.merge(flags, &overrides);
    tracing::debug!(
        overrides = overrides.len(),
        merged = merged.len(),
        "applied preview feature overrides"
    );

    if let Some(inspect) = inspector {
        inspect(&merged.keys());
    }

    FeaturesData::from_flags(merged)
}

struct Memo {
    flags: Arc<RawFlags>,
    is_flags_fetched: Option<bool>,
    is_features_loaded: Option<bool>,
    value: Arc<FeaturesData>,
}

impl Memo {
    fn matches(
        &self,
        flags: &Arc<RawFlags>,
        is_flags_fetched: Option<bool>,
        is_features_loaded: Option<bool>,
    ) -> bool {
        self.is_flags_fetched == is_flags_fetched
            && self.is_features_loaded == is_features_loaded
            && (Arc::ptr_eq(&self.flags, flags) || *self.flags == **flags)
    }
}

/// Holds the current `FeaturesData` and rebuilds it only when the flags or
/// either status signal change.
pub struct FeaturesProvider<S> {
    store: S,
    is_preview: bool,
    inspector: Option<Box<KeysInspector>>,
    memo: Option<Memo>,
}

impl<S: OverrideStore> FeaturesProvider<S> {
    pub fn new(store: S, is_preview: bool) -> Self {
        Self {
            store,
            is_preview,
            inspector: None,
            memo: None,
        }
    }

    pub fn with_inspector(mut self, inspector: impl Fn(&[String]) + Send + Sync + 'static) -> Self {
        self.inspector = Some(Box::new(inspector));
        self
    }

    pub fn is_preview(&self) -> bool {
        self.is_preview
    }

    pub fn provide(
        &mut self,
        flags: Arc<RawFlags>,
        is_flags_fetched: Option<bool>,
        is_features_loaded: Option<bool>,
    ) -> Arc<FeaturesData> {
        if let Some(memo) = &self.memo {
            if memo.matches(&flags, is_flags_fetched, is_features_loaded) {
                return memo.value.clone();
            }
        }

        tracing::debug!(
            flags = flags.len(),
            ?is_flags_fetched,
            ?is_features_loaded,
            "recomputing features"
        );

        let mut data = merge_and_project(
            &flags,
            self.is_preview,
            &self.store,
            self.inspector.as_deref(),
        );
        data.is_flags_fetched = is_flags_fetched;
        data.is_features_loaded = is_features_loaded;

        let value = Arc::new(data);
        self.memo = Some(Memo {
            flags,
            is_flags_fetched,
            is_features_loaded,
            value: value.clone(),
        });
        value
    }

    /// Last value handed out, if any.
    pub fn current(&self) -> Option<Arc<FeaturesData>> {
        self.memo.as_ref().map(|memo| memo.value.clone())
    }
}
