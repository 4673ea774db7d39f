// Shared fixtures for corpuslens integration tests
#![allow(dead_code)]

use corpuslens::{
    factory, AnalysisModule, LanguageProfile, MetricsBundle, ModuleFactory, TextRecord,
};
use proptest::prelude::Rng;
use proptest::test_runner::{RngAlgorithm, TestRng};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// How a [`ScriptedModule`] behaves when analyzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail,
    Panic,
}

/// Module whose outcome is fixed up front, counting its `analyze` calls.
pub struct ScriptedModule {
    name: String,
    requires: Vec<String>,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl AnalysisModule for ScriptedModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_resources(&self) -> Vec<String> {
        self.requires.clone()
    }

    fn analyze(self: Box<Self>, records: &[TextRecord]) -> anyhow::Result<MetricsBundle> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => Ok(MetricsBundle::new(self.name.clone()).with("records", records.len())),
            Behavior::Fail => anyhow::bail!("{} could not analyze", self.name),
            Behavior::Panic => panic!("{} blew up", self.name),
        }
    }
}

/// Factory for a scripted module plus the counter its instances share.
pub fn scripted(name: &str, requires: &[&str], behavior: Behavior) -> (ModuleFactory, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let name = name.to_string();
    let requires: Vec<String> = requires.iter().map(|r| r.to_string()).collect();
    let factory = factory(move |_profile| ScriptedModule {
        name: name.clone(),
        requires: requires.clone(),
        behavior,
        calls: Arc::clone(&counter),
    });
    (factory, calls)
}

pub fn records(texts: &[&str]) -> Vec<TextRecord> {
    TextRecord::from_texts("fixture", "general", texts.iter().copied())
}

pub fn bare_profile(code: &str) -> Arc<LanguageProfile> {
    LanguageProfile::builder(code).build().unwrap().into_shared()
}

pub fn write_file(dir: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

/// Deterministic ChaCha generator seeded from `seed`.
pub fn seeded_rng(seed: u64) -> TestRng {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&seed.to_le_bytes());
    TestRng::from_seed(RngAlgorithm::ChaCha, &bytes)
}

/// `count` records of `words` pseudo-words each, drawn from a vocabulary
/// of `vocabulary` words.
pub fn synthetic_corpus(count: usize, words: usize, vocabulary: u64, seed: u64) -> Vec<TextRecord> {
    let mut rng = seeded_rng(seed);
    let texts: Vec<String> = (0..count)
        .map(|_| {
            (0..words)
                .map(|_| format!("w{}", rng.next_u64() % vocabulary))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    TextRecord::from_texts("synthetic", "general", texts)
}
