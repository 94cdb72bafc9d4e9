//! Line-oriented feature file parser
//!
//! Three states: no feature open, a feature open, a scenario open inside a
//! feature. Each line is trimmed and matched against the `Feature:`,
//! `Background:` and `Scenario:` prefixes in that order; any other non-blank
//! line inside a scenario becomes a content line.

use once_cell::sync::Lazy;
use regex::Regex;
use std::mem;
use tracing::debug;

use crate::model::{Feature, FeatureCategory, Scenario, Specification};

const FEATURE_PREFIX: &str = "Feature:";
const BACKGROUND_PREFIX: &str = "Background:";
const SCENARIO_PREFIX: &str = "Scenario:";

/// `[Conversation]`, `[Artifact]` and their `[LLM ...]` spellings
static CATEGORY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(?:LLM )?(Conversation|Artifact)\]").unwrap());

/// `(numerator/denominator)` with unsigned integer parts
static THRESHOLD_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\((\d+)/(\d+)\)").unwrap());

enum State {
    NoFeature,
    InFeature(Feature),
    InScenario(Feature, Scenario),
}

impl State {
    /// Close any open scenario, returning the open feature (if any).
    fn close_scenario(self) -> Option<Feature> {
        match self {
            State::NoFeature => None,
            State::InFeature(feature) => Some(feature),
            State::InScenario(mut feature, scenario) => {
                feature.scenarios.push(scenario);
                Some(feature)
            }
        }
    }
}

/// Parse the text of one specification file.
///
/// Never fails: unknown lines are skipped and a malformed scoring tag only
/// leaves the scenario's threshold unset.
#[must_use]
pub fn parse_str(text: &str) -> Specification {
    let mut features = Vec::new();
    let mut state = State::NoFeature;

    for raw in text.lines() {
        let line = raw.trim();

        if let Some(rest) = line.strip_prefix(FEATURE_PREFIX) {
            if let Some(done) = mem::replace(&mut state, State::NoFeature).close_scenario() {
                features.push(done);
            }
            let (name, category) = parse_feature_header(rest);
            state = State::InFeature(Feature::new(name, category));
        } else if let Some(rest) = line.strip_prefix(BACKGROUND_PREFIX) {
            match &mut state {
                State::InFeature(feature) | State::InScenario(feature, _) => {
                    feature.background = rest.trim().to_string();
                }
                State::NoFeature => debug!("Background outside of a feature ignored"),
            }
        } else if let Some(rest) = line.strip_prefix(SCENARIO_PREFIX) {
            state = match mem::replace(&mut state, State::NoFeature).close_scenario() {
                Some(feature) => {
                    let (description, threshold) = parse_scenario_header(rest);
                    State::InScenario(feature, Scenario::new(description, threshold))
                }
                None => {
                    debug!("Scenario outside of a feature ignored");
                    State::NoFeature
                }
            };
        } else if !line.is_empty()
            && let State::InScenario(_, scenario) = &mut state
        {
            scenario.content.push(line.to_string());
        }
    }

    if let Some(done) = state.close_scenario() {
        features.push(done);
    }

    Specification::new(features)
}

/// Split a feature header into its name and category tag.
fn parse_feature_header(rest: &str) -> (String, FeatureCategory) {
    match CATEGORY_TAG.captures(rest) {
        Some(caps) => {
            let category = match &caps[1] {
                "Conversation" => FeatureCategory::Conversation,
                _ => FeatureCategory::Artifact,
            };
            let name = CATEGORY_TAG.replace(rest, "").trim().to_string();
            (name, category)
        }
        None => (rest.trim().to_string(), FeatureCategory::Other),
    }
}

/// Split a scenario header into its description and optional threshold.
///
/// The first tag with a non-zero denominator wins. Tags that are not
/// well formed stay in the description.
fn parse_scenario_header(rest: &str) -> (String, Option<f64>) {
    let description = rest.trim();

    for caps in THRESHOLD_TAG.captures_iter(description) {
        let (Ok(numerator), Ok(denominator)) = (caps[1].parse::<f64>(), caps[2].parse::<f64>())
        else {
            continue;
        };
        if denominator <= 0.0 {
            debug!(tag = &caps[0], "Zero denominator in scoring tag; skipped");
            continue;
        }

        let tag = caps.get(0).map_or(0..0, |m| m.range());
        let stripped = format!("{}{}", &description[..tag.start], &description[tag.end..]);
        return (stripped.trim().to_string(), Some(numerator / denominator * 10.0));
    }

    (description.to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const POETRY: &str = r"
Feature: Poem Generation [Conversation]
  Background: The user asks for a poem
  Scenario: Poem rhymes (7/10)
    Given a topic
    Then the poem rhymes

  Scenario: Poem is short
    Then it has at most 4 lines

Feature: Poem Title [Artifact]
  Scenario: Title is catchy (1/2)
    Then the title is catchy
";

    #[test]
    fn test_parses_features_and_scenarios() {
        let spec = parse_str(POETRY);
        assert_eq!(spec.features.len(), 2);

        let poem = &spec.features[0];
        assert_eq!(poem.name, "Poem Generation");
        assert_eq!(poem.category, FeatureCategory::Conversation);
        assert_eq!(poem.background, "The user asks for a poem");
        assert_eq!(poem.scenarios.len(), 2);
        assert_eq!(poem.scenarios[0].description, "Poem rhymes");
        assert_eq!(poem.scenarios[0].threshold, Some(7.0));
        assert_eq!(
            poem.scenarios[0].content,
            vec!["Given a topic", "Then the poem rhymes"]
        );
        assert_eq!(poem.scenarios[1].threshold, None);

        let title = &spec.features[1];
        assert_eq!(title.name, "Poem Title");
        assert_eq!(title.category, FeatureCategory::Artifact);
        assert_eq!(title.scenarios[0].threshold, Some(5.0));
    }

    #[test]
    fn test_untagged_feature_is_other() {
        let spec = parse_str("Feature: Login\nScenario: works\n");
        assert_eq!(spec.features[0].name, "Login");
        assert_eq!(spec.features[0].category, FeatureCategory::Other);
    }

    #[test]
    fn test_legacy_tags_are_aliases() {
        let spec = parse_str("Feature: [LLM Conversation] Chat\nFeature: Card [LLM Artifact]\n");
        assert_eq!(spec.features[0].name, "Chat");
        assert_eq!(spec.features[0].category, FeatureCategory::Conversation);
        assert_eq!(spec.features[1].name, "Card");
        assert_eq!(spec.features[1].category, FeatureCategory::Artifact);
    }

    #[test]
    fn test_unknown_tag_stays_in_name() {
        let spec = parse_str("Feature: Search [Beta]\n");
        assert_eq!(spec.features[0].name, "Search [Beta]");
        assert_eq!(spec.features[0].category, FeatureCategory::Other);
    }

    #[test]
    fn test_last_background_wins() {
        let spec = parse_str(
            "Feature: F\nBackground: first\nScenario: s\nBackground: second\nline\n",
        );
        let feature = &spec.features[0];
        assert_eq!(feature.background, "second");
        // Background lines are never scenario content
        assert_eq!(feature.scenarios[0].content, vec!["line"]);
    }

    #[test]
    fn test_malformed_threshold_tags() {
        for header in [
            "Scenario: zero denominator (3/0)",
            "Scenario: negative denominator (3/-2)",
            "Scenario: negative numerator (-1/2)",
            "Scenario: words (a/b)",
        ] {
            let spec = parse_str(&format!("Feature: F\n{header}\n"));
            let scenario = &spec.features[0].scenarios[0];
            assert_eq!(scenario.threshold, None, "{header}");
            assert!(scenario.description.contains('('), "{header}");
        }
    }

    #[test]
    fn test_numerator_beyond_u64_is_accepted() {
        let spec = parse_str("Feature: F\nScenario: big (99999999999999999999/10)\n");
        let scenario = &spec.features[0].scenarios[0];
        assert_eq!(scenario.threshold, Some(99_999_999_999_999_999_999.0 / 10.0 * 10.0));
        assert_eq!(scenario.description, "big");
    }

    #[test]
    fn test_first_well_formed_tag_wins() {
        let spec = parse_str("Feature: F\nScenario: delta (-1/2) rated (3/4)\n");
        let scenario = &spec.features[0].scenarios[0];
        assert_eq!(scenario.threshold, Some(7.5));
        assert_eq!(scenario.description, "delta (-1/2) rated");

        let spec = parse_str("Feature: F\nScenario: skip (1/0) then (1/2)\n");
        let scenario = &spec.features[0].scenarios[0];
        assert_eq!(scenario.threshold, Some(5.0));
        assert_eq!(scenario.description, "skip (1/0) then");
    }

    #[test]
    fn test_blank_lines_do_not_end_scenario() {
        let spec = parse_str("Feature: F\nScenario: s\n  a\n\n   \n  b\n");
        assert_eq!(spec.features[0].scenarios[0].content, vec!["a", "b"]);
    }

    #[test]
    fn test_lines_outside_scenarios_are_dropped() {
        let spec = parse_str("stray\nScenario: orphan\norphan content\nFeature: F\nintro\n");
        assert_eq!(spec.features.len(), 1);
        assert!(spec.features[0].scenarios.is_empty());
    }

    #[test]
    fn test_duplicate_features_are_kept() {
        let spec = parse_str("Feature: F [Artifact]\nFeature: F [Artifact]\n");
        assert_eq!(spec.features.len(), 2);
    }

    #[test]
    fn test_crlf_input() {
        let spec = parse_str("Feature: F [Conversation]\r\nScenario: s (1/4)\r\nline\r\n");
        assert_eq!(spec.features[0].name, "F");
        assert_eq!(spec.features[0].scenarios[0].threshold, Some(2.5));
        assert_eq!(spec.features[0].scenarios[0].content, vec!["line"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_str("").is_empty());
    }

    proptest! {
        #[test]
        fn prop_threshold_is_ratio_times_ten(n in 0u32..1000, d in 1u32..1000) {
            let spec = parse_str(&format!("Feature: F\nScenario: check ({n}/{d}) passes\n"));
            let scenario = &spec.features[0].scenarios[0];
            let expected = f64::from(n) / f64::from(d) * 10.0;
            prop_assert_eq!(scenario.threshold, Some(expected));
            prop_assert_eq!(scenario.description.contains('('), false);
        }

        #[test]
        fn prop_scenario_order_preserved(count in 1usize..20) {
            let mut text = String::from("Feature: F\n");
            for i in 0..count {
                text.push_str(&format!("Scenario: s{i}\nline {i}\n"));
            }
            let spec = parse_str(&text);
            let descriptions: Vec<_> = spec.features[0]
                .scenarios
                .iter()
                .map(|s| s.description.clone())
                .collect();
            let expected: Vec<_> = (0..count).map(|i| format!("s{i}")).collect();
            prop_assert_eq!(descriptions, expected);
        }
    }
}
