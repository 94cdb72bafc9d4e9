use bddap_utils::error::SpecError;
use tracing::debug;

use crate::model::{Feature, FeatureCategory, Specification};

/// Iterate every feature across `specs`, file order then in-file order.
pub fn features(specs: &[Specification]) -> impl Iterator<Item = &Feature> {
    specs.iter().flat_map(|spec| spec.features.iter())
}

/// Find the first feature whose name and category both match exactly.
///
/// # Errors
///
/// `SpecError::FeatureNotFound` naming the requested pair when nothing
/// matches.
pub fn find_feature<'a>(
    specs: &'a [Specification],
    name: &str,
    category: FeatureCategory,
) -> Result<&'a Feature, SpecError> {
    let found = features(specs).find(|f| f.name == name && f.category == category);
    match found {
        Some(feature) => {
            debug!(feature = name, %category, scenarios = feature.scenarios.len(), "Matched feature");
            Ok(feature)
        }
        None => Err(SpecError::FeatureNotFound {
            name: name.to_string(),
            category: category.to_string(),
        }),
    }
}
