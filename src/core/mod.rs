//! Core data types shared by every part of a run.

pub mod metrics;
pub mod record;

pub use metrics::{MetricValue, MetricsBundle};
pub use record::{RecordId, TextRecord};
