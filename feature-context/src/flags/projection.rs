use std::str::FromStr;

use serde::Serialize;

use crate::flags::features::{
    Feature, InAppNotificationPosition, OnboardingFilteringTitle, OnboardingFiltersLayout,
    OnboardingV2,
};
use crate::flags::flag_models::{FlagValue, RawFlags};

pub const ONBOARDING_STEP_SEPARATOR: char = '/';

/// Typed experiment settings derived from one flag snapshot.
///
/// `Default` is the projection of an empty snapshot: zero, empty list,
/// `false` and `None` for every optional variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiments {
    pub onboarding_minimum_topics: i64,
    pub onboarding_steps: Vec<String>,
    pub onboarding_filters_layout: Option<OnboardingFiltersLayout>,
    pub popular_feed_copy: Option<String>,
    pub can_submit_article: bool,
    pub submit_article_sidebar_button: Option<String>,
    pub submit_article_modal_button: Option<String>,
    pub show_comment_popover: bool,
    pub in_app_notification_position: Option<InAppNotificationPosition>,
    pub has_squad_access: bool,
    pub show_hiring: bool,
    pub onboarding_v2: Option<OnboardingV2>,
    pub onboarding_filtering_title: Option<OnboardingFilteringTitle>,
}

/// Provider entries report their `enabled` bit; bare values use the sentinel predicate.
pub fn is_feature_enabled(feature: Feature, flags: &RawFlags) -> bool {
    flags.is_enabled(feature.key())
}

pub fn get_feature_text(feature: Feature, flags: &RawFlags) -> Option<String> {
    flags
        .get(feature.key())
        .and_then(FlagValue::as_text)
        .map(|text| text.into_owned())
}

/// Picks an enum variant from the flag's text. Unknown values fall back to `None`.
pub fn get_feature_variant<T: FromStr>(feature: Feature, flags: &RawFlags) -> Option<T> {
    let text = flags.get(feature.key())?.as_text()?;
    match text.trim().parse::<T>() {
        Ok(variant) => Some(variant),
        Err(_) => {
            tracing::debug!(
                flag = feature.key(),
                value = %text,
                "ignoring unknown flag variant"
            );
            None
        }
    }
}

/// Integer value or `default`. Zero also yields the default.
pub fn get_number_value(value: Option<&FlagValue>, default: i64) -> i64 {
    match value.and_then(FlagValue::as_integer) {
        Some(n) if n != 0 => n,
        _ => default,
    }
}

pub fn split_steps(value: Option<&str>) -> Vec<String> {
    value
        .map(|steps| {
            steps
                .split(ONBOARDING_STEP_SEPARATOR)
                .map(str::trim)
                .filter(|step| !step.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Projects a flag snapshot into the experiments record. Never fails; anything
/// missing or malformed resolves to its default.
pub fn project(flags: &RawFlags) -> Experiments {
    let steps = get_feature_text(Feature::OnboardingSteps, flags);

    Experiments {
        onboarding_minimum_topics: get_number_value(
            flags.get(Feature::OnboardingMinimumTopics.key()),
            0,
        ),
        onboarding_steps: split_steps(steps.as_deref()),
        onboarding_filters_layout: get_feature_variant(Feature::OnboardingFiltersLayout, flags),
        popular_feed_copy: get_feature_text(Feature::PopularFeedCopy, flags),
        can_submit_article: is_feature_enabled(Feature::SubmitArticle, flags),
        submit_article_sidebar_button: get_feature_text(
            Feature::SubmitArticleSidebarButton,
            flags,
        ),
        submit_article_modal_button: get_feature_text(Feature::SubmitArticleModalButton, flags),
        show_comment_popover: is_feature_enabled(Feature::ShowCommentPopover, flags),
        in_app_notification_position: get_feature_variant(
            Feature::InAppNotificationPosition,
            flags,
        ),
        has_squad_access: is_feature_enabled(Feature::HasSquadAccess, flags),
        show_hiring: is_feature_enabled(Feature::ShowHiring, flags),
        onboarding_v2: get_feature_variant(Feature::OnboardingV2, flags),
        onboarding_filtering_title: get_feature_variant(Feature::OnboardingFilteringTitle, flags),
    }
}
