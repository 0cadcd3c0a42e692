use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Every flag the experiments record reads, with the name it is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, IntoStaticStr)]
pub enum Feature {
    #[strum(serialize = "onboarding_minimum_topics")]
    OnboardingMinimumTopics,
    #[strum(serialize = "onboarding_steps")]
    OnboardingSteps,
    #[strum(serialize = "onboarding_filters_layout")]
    OnboardingFiltersLayout,
    #[strum(serialize = "popular_feed_copy")]
    PopularFeedCopy,
    #[strum(serialize = "submit_article")]
    SubmitArticle,
    #[strum(serialize = "submit_article_sidebar_button")]
    SubmitArticleSidebarButton,
    #[strum(serialize = "submit_article_modal_button")]
    SubmitArticleModalButton,
    #[strum(serialize = "show_comment_popover")]
    ShowCommentPopover,
    #[strum(serialize = "inapp_notification_position")]
    InAppNotificationPosition,
    #[strum(serialize = "squad")]
    HasSquadAccess,
    #[strum(serialize = "show_hiring")]
    ShowHiring,
    #[strum(serialize = "onboarding_v2")]
    OnboardingV2,
    #[strum(serialize = "onboarding_filtering_title")]
    OnboardingFilteringTitle,
}

impl Feature {
    pub fn key(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OnboardingFiltersLayout {
    Grid,
    Accordion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum InAppNotificationPosition {
    Bottom,
    Top,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OnboardingV2 {
    Control,
    V1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OnboardingFilteringTitle {
    Control,
    V1,
    V2,
    V3,
    V4,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_feature_keys_are_unique() {
        let keys: HashSet<&str> = Feature::iter().map(Feature::key).collect();
        assert_eq!(keys.len(), Feature::iter().count());
    }

    #[test]
    fn test_feature_key_round_trips_through_from_str() {
        for feature in Feature::iter() {
            assert_eq!(Feature::from_str(feature.key()), Ok(feature));
            assert_eq!(feature.to_string(), feature.key());
        }
    }

    #[test]
    fn test_renamed_keys() {
        assert_eq!(Feature::SubmitArticle.key(), "submit_article");
        assert_eq!(Feature::HasSquadAccess.key(), "squad");
        assert_eq!(
            Feature::InAppNotificationPosition.key(),
            "inapp_notification_position"
        );
    }

    #[test]
    fn test_variants_parse_case_insensitively() {
        assert_eq!(
            OnboardingFiltersLayout::from_str("Accordion"),
            Ok(OnboardingFiltersLayout::Accordion)
        );
        assert_eq!(
            OnboardingFilteringTitle::from_str("V3"),
            Ok(OnboardingFilteringTitle::V3)
        );
        assert_eq!(OnboardingV2::V1.to_string(), "v1");
        assert!(InAppNotificationPosition::from_str("left").is_err());
    }
}
