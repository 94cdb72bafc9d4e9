use serde::{Deserialize, Serialize};
use std::fmt;

/// The features parsed from one specification file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pub features: Vec<Feature>,
}

impl Specification {
    #[must_use]
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Category tag carried on a `Feature:` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureCategory {
    Conversation,
    Artifact,
    Other,
}

impl fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conversation => write!(f, "Conversation"),
            Self::Artifact => write!(f, "Artifact"),
            Self::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Feature name with the category tag stripped
    pub name: String,
    pub category: FeatureCategory,
    /// Remainder of the last `Background:` line in this feature
    pub background: String,
    pub scenarios: Vec<Scenario>,
}

impl Feature {
    #[must_use]
    pub fn new(name: impl Into<String>, category: FeatureCategory) -> Self {
        Self {
            name: name.into(),
            category,
            background: String::new(),
            scenarios: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario text with the `(n/d)` scoring tag stripped
    pub description: String,
    /// `n/d * 10` when the scoring tag was well formed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Trimmed lines following the header, in order
    pub content: Vec<String>,
    /// Filled in by an external scorer; never touched here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_result: Option<ValidationResult>,
}

impl Scenario {
    #[must_use]
    pub fn new(description: impl Into<String>, threshold: Option<f64>) -> Self {
        Self {
            description: description.into(),
            threshold,
            content: Vec::new(),
            validation_result: None,
        }
    }
}

/// Score attached to a scenario by an external scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub description: String,
    pub score: f64,
}
