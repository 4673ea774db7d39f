//! Pipeline execution: selection, isolated module runs and the run result.

mod executor;
mod result;
mod run;

pub use executor::{panic_message, PipelineExecutor};
pub use result::{
    FailureKind, FailureStage, ModuleFailure, ModuleOutcome, ModuleTiming, PipelineResult,
    RunStatus,
};
pub use run::RunPhase;
