//! Named linguistic resources attached to a language profile.
//!
//! Each declared resource is loaded exactly once, when the profile is
//! built. A resource that cannot be loaded is recorded as absent with a
//! reason; it never aborts profile construction. Modules that need an
//! absent resource are skipped by the pipeline.

pub mod source;
pub mod store;

pub use source::{
    parse_frequency_table, parse_similarity_table, parse_string_set, parse_term_categories,
    FileSource, InlineSource, Resource, ResourceError, ResourceKind, ResourceSource,
};
pub use store::{ResourceState, ResourceStore};
