//! Runs the selected analysis modules of one profile over a corpus.
//!
//! A run walks `NotStarted -> Selecting -> Executing -> Done`. During
//! selection every enabled module is constructed and asked whether it can
//! run; during execution the ready ones analyze the records in
//! registration order. Errors and panics raised by a module are caught at
//! the module boundary and recorded against that module only.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use super::result::{FailureStage, ModuleFailure, ModuleTiming, PipelineResult};
use super::run::RunState;
use crate::core::TextRecord;
use crate::observability::{enter_module, increment_completed, set_phase, set_profile, set_progress};
use crate::profile::LanguageProfile;
use crate::registry::{AnalysisModule, CapabilityRegistry, Readiness, RegisteredModule};

/// Why a selected module will not reach `analyze`.
enum NotReady {
    Skipped(String),
    Failed(ModuleFailure),
}

pub struct PipelineExecutor {
    profile: Arc<LanguageProfile>,
    modules: Vec<RegisteredModule>,
}

impl PipelineExecutor {
    /// Snapshots the registry; later registry changes do not affect this executor.
    pub fn new(profile: Arc<LanguageProfile>, registry: &CapabilityRegistry) -> Self {
        Self {
            profile,
            modules: registry.entries().to_vec(),
        }
    }

    pub fn profile(&self) -> &LanguageProfile {
        &self.profile
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(RegisteredModule::name).collect()
    }

    pub fn run(&self, records: &[TextRecord]) -> PipelineResult {
        let code = self.profile.code();
        let span = tracing::info_span!("pipeline_run", profile = code, records = records.len());
        let _span = span.enter();
        let _profile = set_profile(code);

        let mut state = RunState::new();
        let mut result = PipelineResult::new(code, records.len());
        let records = self.profile.prepare(records.iter().cloned());

        let phase = set_phase(state.advance());
        let ready = self.select(&mut result);
        self.warn_unregistered(&mut result);
        drop(phase);

        let _phase = set_phase(state.advance());
        set_progress(0, ready.len());
        for (name, module) in ready {
            self.execute(name, module, &records, &mut result);
            increment_completed();
        }

        state.advance();
        tracing::info!(
            analyzed = result.bundles().len(),
            skipped = result.skipped().len(),
            failed = result.failed().len(),
            "pipeline run finished"
        );
        result.finish(state.into_trail())
    }

    fn select<'a>(
        &'a self,
        result: &mut PipelineResult,
    ) -> Vec<(&'a str, Box<dyn AnalysisModule>)> {
        let selection = self.profile.modules();
        let mut ready = Vec::new();
        for entry in &self.modules {
            let name = entry.name();
            if !selection.is_enabled(name) {
                tracing::debug!(module = name, "module not selected");
                result.record_not_selected(name);
                continue;
            }
            result.select(name);
            match self.prepare_module(entry) {
                Ok(module) => ready.push((name, module)),
                Err(NotReady::Skipped(reason)) => {
                    tracing::warn!(module = name, %reason, "module skipped");
                    result.record_skip(name, reason);
                }
                Err(NotReady::Failed(failure)) => {
                    tracing::error!(module = name, %failure, "module failed before analysis");
                    result.record_failure(name, failure);
                }
            }
        }
        ready
    }

    fn prepare_module(&self, entry: &RegisteredModule) -> Result<Box<dyn AnalysisModule>, NotReady> {
        let _module = enter_module(entry.name());
        let profile = Arc::clone(&self.profile);
        let module = catch_unwind(AssertUnwindSafe(|| entry.instantiate(profile))).map_err(|payload| {
            NotReady::Failed(ModuleFailure::panic(
                FailureStage::Construction,
                panic_message(payload.as_ref()),
            ))
        })?;
        match catch_unwind(AssertUnwindSafe(|| module.can_run(&self.profile))) {
            Ok(Readiness::Ready) => Ok(module),
            Ok(Readiness::Blocked(reason)) => Err(NotReady::Skipped(reason)),
            Err(payload) => Err(NotReady::Failed(ModuleFailure::panic(
                FailureStage::Readiness,
                panic_message(payload.as_ref()),
            ))),
        }
    }

    fn execute(
        &self,
        name: &str,
        module: Box<dyn AnalysisModule>,
        records: &[TextRecord],
        result: &mut PipelineResult,
    ) {
        let span = tracing::debug_span!("module", module = name);
        let _span = span.enter();
        let started = Instant::now();
        let outcome = {
            let _module = enter_module(name);
            catch_unwind(AssertUnwindSafe(|| module.analyze(records)))
        };
        let elapsed = started.elapsed();
        result.record_timing(ModuleTiming::new(name, elapsed));

        match outcome {
            Ok(Ok(bundle)) => {
                tracing::debug!(metrics = bundle.len(), elapsed_ms = elapsed.as_millis() as u64, "module analyzed");
                result.record_bundle(name, bundle);
            }
            Ok(Err(err)) => {
                let failure = ModuleFailure::error(FailureStage::Analysis, format!("{err:#}"));
                tracing::error!(module = name, %failure, "module failed");
                result.record_failure(name, failure);
            }
            Err(payload) => {
                let failure = ModuleFailure::panic(FailureStage::Analysis, panic_message(payload.as_ref()));
                tracing::error!(module = name, %failure, "module failed");
                result.record_failure(name, failure);
            }
        }
    }

    fn warn_unregistered(&self, result: &mut PipelineResult) {
        let Some(enabled) = self.profile.modules().enabled() else {
            return;
        };
        for name in enabled {
            if !self.modules.iter().any(|entry| entry.name() == name) {
                let message = format!(
                    "module '{name}' is enabled by profile '{}' but is not registered",
                    self.profile.code()
                );
                tracing::warn!("{message}");
                result.warn(message);
            }
        }
    }
}

/// Text of a panic payload, for `panic!` with a literal or a formatted message.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MetricsBundle;
    use crate::pipeline::{ModuleOutcome, RunPhase, RunStatus};
    use crate::registry::factory;

    struct Fixed {
        name: &'static str,
    }

    impl AnalysisModule for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn analyze(self: Box<Self>, records: &[TextRecord]) -> anyhow::Result<MetricsBundle> {
            Ok(MetricsBundle::new(self.name).with("records", records.len()))
        }
    }

    struct Broken;

    impl AnalysisModule for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn analyze(self: Box<Self>, _records: &[TextRecord]) -> anyhow::Result<MetricsBundle> {
            anyhow::bail!("lexicon index corrupted")
        }
    }

    struct Panicky;

    impl AnalysisModule for Panicky {
        fn name(&self) -> &str {
            "panicky"
        }

        fn analyze(self: Box<Self>, _records: &[TextRecord]) -> anyhow::Result<MetricsBundle> {
            panic!("boom at record {}", 2)
        }
    }

    fn profile(enabled: Option<&[&str]>) -> Arc<LanguageProfile> {
        let mut builder = LanguageProfile::builder("xx");
        if let Some(names) = enabled {
            builder = builder.enable(names.iter().copied());
        }
        builder.build().unwrap().into_shared()
    }

    fn registry() -> CapabilityRegistry {
        let mut registry = CapabilityRegistry::new();
        registry.register("first", factory(|_| Fixed { name: "first" })).unwrap();
        registry.register("broken", factory(|_| Broken)).unwrap();
        registry.register("panicky", factory(|_| Panicky)).unwrap();
        registry.register("last", factory(|_| Fixed { name: "last" })).unwrap();
        registry
    }

    fn records() -> Vec<TextRecord> {
        TextRecord::from_texts("t", "general", ["one two", "three four five"])
    }

    #[test]
    fn test_failures_do_not_stop_later_modules() {
        let executor = PipelineExecutor::new(profile(None), &registry());
        let result = executor.run(&records());

        assert_eq!(result.selected(), ["first", "broken", "panicky", "last"]);
        assert_eq!(result.bundle("first").unwrap().number("records"), Some(2.0));
        assert_eq!(result.bundle("last").unwrap().number("records"), Some(2.0));
        assert_eq!(
            result.failure("broken").unwrap().to_string(),
            "error during analysis: lexicon index corrupted"
        );
        assert_eq!(
            result.failure("panicky").unwrap().to_string(),
            "panic during analysis: boom at record 2"
        );
        assert_eq!(result.status(), RunStatus::Degraded);
        assert_eq!(result.timings().len(), 4);
    }

    #[test]
    fn test_phase_trail() {
        let executor = PipelineExecutor::new(profile(None), &registry());
        let result = executor.run(&[]);
        assert_eq!(
            result.phases(),
            [
                RunPhase::NotStarted,
                RunPhase::Selecting,
                RunPhase::Executing,
                RunPhase::Done
            ]
        );
    }

    #[test]
    fn test_not_selected_and_unknown_enabled() {
        let executor = PipelineExecutor::new(profile(Some(&["last", "ghost"])), &registry());
        let result = executor.run(&records());

        assert_eq!(result.selected(), ["last"]);
        assert_eq!(result.not_selected(), ["first", "broken", "panicky"]);
        assert_eq!(result.warnings().len(), 1);
        assert!(result.warnings()[0].contains("'ghost'"));
        assert_eq!(result.status(), RunStatus::Complete);
    }

    #[test]
    fn test_construction_panic_is_recorded() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(
                "fragile",
                Arc::new(|_: Arc<LanguageProfile>| -> Box<dyn AnalysisModule> {
                    panic!("cannot build")
                }),
            )
            .unwrap();
        let result = PipelineExecutor::new(profile(None), &registry).run(&records());
        match result.outcome("fragile") {
            Some(ModuleOutcome::Failed(failure)) => {
                assert_eq!(failure.stage, FailureStage::Construction);
                assert_eq!(failure.message, "cannot build");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_records_are_tokenized_before_analysis() {
        struct TokenCheck;
        impl AnalysisModule for TokenCheck {
            fn name(&self) -> &str {
                "token_check"
            }
            fn analyze(self: Box<Self>, records: &[TextRecord]) -> anyhow::Result<MetricsBundle> {
                anyhow::ensure!(records.iter().all(TextRecord::is_tokenized), "untokenized record");
                Ok(MetricsBundle::new("token_check"))
            }
        }
        let mut registry = CapabilityRegistry::new();
        registry.register("token_check", factory(|_| TokenCheck)).unwrap();
        let result = PipelineExecutor::new(profile(None), &registry).run(&records());
        assert!(result.bundle("token_check").is_some());
    }

    #[test]
    fn test_panic_message_payloads() {
        let literal: Box<dyn Any + Send> = Box::new("literal");
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(literal.as_ref()), "literal");
        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(other.as_ref()), "unknown panic payload");
    }
}
