//! Quality analysis for text corpora.
//!
//! A [`LanguageProfile`] bundles tokenization, thresholds and linguistic
//! resources for one language. Analysis modules live in a
//! [`CapabilityRegistry`], either built in or declared by TOML manifests,
//! and a [`PipelineExecutor`] runs the ones the profile enables over a
//! corpus, isolating each module's failures from the rest of the run.

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod corpus;
pub mod errors;
pub mod modules;
pub mod neardup;
pub mod observability;
pub mod pipeline;
pub mod profile;
pub mod recommendations;
pub mod registry;
pub mod resources;
pub mod tokenize;

pub use crate::core::{MetricValue, MetricsBundle, RecordId, TextRecord};
pub use crate::errors::{Error, Result, ResultExt};
pub use crate::neardup::{NearDupConfig, NearDupDetector, NearDupPair, NearDupReport};
pub use crate::pipeline::{ModuleOutcome, PipelineExecutor, PipelineResult, RunPhase, RunStatus};
pub use crate::profile::{LanguageProfile, ModuleSelection, ProfileBuilder};
pub use crate::recommendations::{Recommendation, Severity};
pub use crate::registry::{
    factory, AnalysisModule, CapabilityRegistry, DiscoveryReport, FactoryCatalog, ModuleFactory,
    Readiness, RegisterOptions, RejectionReason,
};
pub use crate::resources::{Resource, ResourceKind, ResourceSource, ResourceStore};
pub use crate::tokenize::TokenizerKind;
