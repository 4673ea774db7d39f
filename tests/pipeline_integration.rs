//! End-to-end behavior of the pipeline executor.

mod common;

use common::{bare_profile, records, scripted, Behavior};
use corpuslens::{
    CapabilityRegistry, LanguageProfile, ModuleOutcome, PipelineExecutor, Resource, RunStatus,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::atomic::Ordering;

#[test]
fn test_blocked_module_is_never_analyzed() {
    let (stub, calls) = scripted("lexical_stub", &["lexicon"], Behavior::Succeed);
    let mut registry = CapabilityRegistry::new();
    registry.register("lexical_stub", stub).unwrap();

    let result = PipelineExecutor::new(bare_profile("xx"), &registry).run(&records(&["a b c"]));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        result.outcome("lexical_stub"),
        Some(ModuleOutcome::Skipped("missing resource: lexicon"))
    );
    assert!(result.failed().is_empty());
}

#[test]
fn test_present_resource_lets_module_run() {
    let (stub, calls) = scripted("lexical_stub", &["lexicon"], Behavior::Succeed);
    let mut registry = CapabilityRegistry::new();
    registry.register("lexical_stub", stub).unwrap();
    let profile = LanguageProfile::builder("xx")
        .inline_resource("lexicon", Resource::FrequencyTable(Default::default()))
        .build()
        .unwrap()
        .into_shared();

    let result = PipelineExecutor::new(profile, &registry).run(&records(&["a b c"]));

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(result.bundle("lexical_stub").is_some());
}

#[test]
fn test_failure_and_panic_do_not_stop_later_modules() {
    let mut registry = CapabilityRegistry::new();
    let mut counters = Vec::new();
    for (name, behavior) in [
        ("alpha", Behavior::Succeed),
        ("beta", Behavior::Fail),
        ("gamma", Behavior::Panic),
        ("delta", Behavior::Succeed),
    ] {
        let (factory, calls) = scripted(name, &[], behavior);
        registry.register(name, factory).unwrap();
        counters.push(calls);
    }

    let result = PipelineExecutor::new(bare_profile("xx"), &registry).run(&records(&["one", "two"]));

    assert!(counters.iter().all(|c| c.load(Ordering::SeqCst) == 1));
    assert_eq!(result.bundle("alpha").unwrap().number("records"), Some(2.0));
    assert_eq!(result.bundle("delta").unwrap().number("records"), Some(2.0));
    assert_eq!(result.failure("beta").unwrap().message, "beta could not analyze");
    assert_eq!(result.failure("gamma").unwrap().message, "gamma blew up");
    assert_eq!(result.status(), RunStatus::Degraded);
}

#[test]
fn test_builtins_over_a_small_corpus() {
    let profile = bare_profile("en");
    let registry = CapabilityRegistry::with_builtins();
    let corpus = records(&[
        "the cat sat on the mat today",
        "the cat sat on the mat today",
        "a dog ran across the busy road",
        "hi",
    ]);

    let result = PipelineExecutor::new(profile, &registry).run(&corpus);

    assert_eq!(
        result.selected(),
        ["structural", "linguistic", "diversity", "domain", "gender_bias"]
    );
    for name in ["structural", "linguistic", "diversity", "domain"] {
        assert!(result.bundle(name).is_some(), "{name} should have run");
    }
    assert_eq!(
        result.skipped_reason("gender_bias"),
        Some("missing resource: gender_terms")
    );
    let diversity = result.bundle("diversity").unwrap();
    assert_eq!(diversity.number("near_duplicate_pairs"), Some(1.0));
    assert_eq!(result.bundle("structural").unwrap().number("too_short"), Some(1.0));
}

#[test]
fn test_result_serializes_all_three_outcomes() {
    let mut registry = CapabilityRegistry::new();
    for (name, requires, behavior) in [
        ("ok", &[][..], Behavior::Succeed),
        ("needs", &["lexicon"][..], Behavior::Succeed),
        ("bad", &[][..], Behavior::Fail),
    ] {
        registry.register(name, scripted(name, requires, behavior).0).unwrap();
    }
    let result = PipelineExecutor::new(bare_profile("xx"), &registry).run(&records(&["x"]));
    let json = serde_json::to_value(&result).unwrap();

    assert!(json["bundles"]["ok"].is_object());
    assert_eq!(json["skipped"]["needs"], "missing resource: lexicon");
    assert_eq!(json["failed"]["bad"]["stage"], "analysis");
    assert_eq!(json["phases"][3], "done");
}

fn behavior() -> impl Strategy<Value = (Behavior, bool)> {
    (
        prop_oneof![Just(Behavior::Succeed), Just(Behavior::Fail)],
        any::<bool>(),
    )
}

proptest! {
    /// Selected modules are split exactly into analyzed, skipped and failed.
    #[test]
    fn prop_selected_modules_are_partitioned(
        specs in prop::collection::vec(behavior(), 0..8),
        enabled_mask in prop::collection::vec(any::<bool>(), 8),
        restrict in any::<bool>(),
    ) {
        let mut registry = CapabilityRegistry::new();
        let mut names = Vec::new();
        for (i, (behavior, blocked)) in specs.iter().enumerate() {
            let name = format!("m{i}");
            let requires: &[&str] = if *blocked { &["absent"] } else { &[] };
            registry.register(name.clone(), scripted(&name, requires, *behavior).0).unwrap();
            names.push(name);
        }

        let mut builder = LanguageProfile::builder("xx");
        if restrict {
            builder = builder.enable(
                names.iter().zip(&enabled_mask).filter(|(_, on)| **on).map(|(n, _)| n.clone()),
            );
        }
        let profile = builder.build().unwrap().into_shared();
        let result = PipelineExecutor::new(profile, &registry).run(&records(&["a b", "c d"]));

        let selected: BTreeSet<&str> = result.selected_names().collect();
        let bundles: BTreeSet<&str> = result.bundles().keys().map(String::as_str).collect();
        let skipped: BTreeSet<&str> = result.skipped().keys().map(String::as_str).collect();
        let failed: BTreeSet<&str> = result.failed().keys().map(String::as_str).collect();

        prop_assert!(bundles.is_disjoint(&skipped));
        prop_assert!(bundles.is_disjoint(&failed));
        prop_assert!(skipped.is_disjoint(&failed));
        let union: BTreeSet<&str> = bundles.union(&skipped).chain(failed.iter()).copied().collect();
        prop_assert_eq!(union, selected.clone());
        prop_assert_eq!(selected.len() + result.not_selected().len(), names.len());

        // Registration order is execution order.
        let order: Vec<&str> = result.timings().iter().map(|t| t.module.as_str()).collect();
        let expected: Vec<&str> = names
            .iter()
            .map(String::as_str)
            .filter(|n| bundles.contains(n) || failed.contains(n))
            .collect();
        prop_assert_eq!(order, expected);
    }
}
