//! Feature specifications
//!
//! Parses `.feature` files into [`Specification`] trees and looks features
//! up by name and category.
//!
//! ```text
//! Feature: Poem Generation [Conversation]
//!   Background: The user wants a poem
//!   Scenario: The poem rhymes (7/10)
//!     Given a topic
//!     Then every line rhymes
//! ```

mod index;
mod model;
mod parser;
mod sources;

pub use bddap_utils::error::SpecError;
pub use index::{features, find_feature};
pub use model::{Feature, FeatureCategory, Scenario, Specification, ValidationResult};
pub use parser::parse_str;
pub use sources::{FEATURE_EXTENSION, SpecSource, parse_all, parse_file};
