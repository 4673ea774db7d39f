//! Building language profiles from TOML files and resource directories.

mod common;

use common::{records, write_file};
use corpuslens::config::discover_profile_path;
use corpuslens::resources::ResourceState;
use corpuslens::{CapabilityRegistry, Error, LanguageProfile, PipelineExecutor, TokenizerKind};
use indoc::indoc;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const FONGBE: &str = indoc! {r#"
    [language]
    code = "fon"
    name = "Fongbe"

    [tokenization]
    method = "model-based"
    model = "unicode-words"

    [thresholds.structural]
    min_words = 2
    max_words = 12

    [thresholds.duplicates]
    threshold = 0.9

    [thresholds.orthography]
    max_diacritic_errors = 3

    [modules]
    disabled = ["domain"]

    [resources.lexicon]
    path = "resources/lexicon.txt"
    kind = "frequency"

    [resources.gender_terms]
    path = "resources/gender_terms.json"
    kind = "term-categories"

    [resources.professions]
    path = "resources/professions.txt"
    kind = "string-set"
"#};

fn profile_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "corpuslens.toml", FONGBE);
    write_file(
        dir.path(),
        "resources/lexicon.txt",
        "# word count\nnu 120\nɖo 80\nwɛ\n",
    );
    write_file(dir.path(), "resources/gender_terms.json", "{ not json");
    dir
}

#[test]
fn test_profile_from_file() {
    let dir = profile_dir();
    let profile = LanguageProfile::from_config_file(&dir.path().join("corpuslens.toml")).unwrap();

    assert_eq!(profile.code(), "fon");
    assert_eq!(profile.name(), "Fongbe");
    assert_eq!(profile.tokenizer_kind(), TokenizerKind::ModelBased);
    assert_eq!(profile.thresholds().structural.max_words, 12);
    assert_eq!(profile.thresholds().structural.min_chars, 10);
    assert_eq!(profile.thresholds().get("duplicates", "threshold"), Some(0.9));
    assert_eq!(profile.thresholds().get("orthography", "max_diacritic_errors"), Some(3.0));
    assert!(!profile.modules().is_enabled("domain"));
    assert_eq!(profile.tokenize("Nu ɖo, wɛ!"), ["nu", "ɖo", "wɛ"]);
}

#[test]
fn test_bad_resources_are_absent_not_fatal() {
    let dir = profile_dir();
    let profile = LanguageProfile::from_config_file(&dir.path().join("corpuslens.toml")).unwrap();
    let resources = profile.resources();

    assert!(resources.has("lexicon"));
    assert_eq!(resources.get("lexicon").map(|r| r.len()), Some(3));
    assert!(matches!(resources.state("gender_terms"), Some(ResourceState::Absent { .. })));
    assert!(resources.absence_reason("professions").is_some());

    let result = PipelineExecutor::new(profile.into_shared(), &CapabilityRegistry::with_builtins())
        .run(&records(&["nu ɖo wɛ", "ɖo wɛ nu"]));
    assert_eq!(result.not_selected(), ["domain"]);
    assert_eq!(
        result.skipped_reason("gender_bias"),
        Some("missing resource: gender_terms")
    );
    assert!(result.bundle("linguistic").unwrap().number("lexical_complexity").is_some());
}

#[test]
fn test_structural_errors_fail_construction() {
    let dir = TempDir::new().unwrap();
    let cases = [
        ("empty_code", "[language]\ncode = \"\"\n"),
        ("missing_language", "[modules]\ndisabled = []\n"),
        (
            "inverted",
            "[language]\ncode = \"xx\"\n[thresholds.structural]\nmin_words = 30\nmax_words = 5\n",
        ),
        (
            "typo",
            "[language]\ncode = \"xx\"\n[thresholds.structural]\nmax_wrods = 5\n",
        ),
        (
            "bad_model",
            "[language]\ncode = \"xx\"\n[tokenization]\nmethod = \"model-based\"\nmodel = \"spacy\"\n",
        ),
        (
            "custom_without_fn",
            "[language]\ncode = \"xx\"\n[tokenization]\nmethod = \"custom\"\n",
        ),
    ];
    for (name, contents) in cases {
        let path = write_file(dir.path(), &format!("{name}.toml"), contents);
        let err = LanguageProfile::from_config_file(&path).unwrap_err();
        assert!(
            matches!(err, Error::ProfileConstruction { .. }),
            "{name}: unexpected error {err}"
        );
    }
}

#[test]
fn test_missing_profile_file_is_a_construction_failure() {
    let dir = TempDir::new().unwrap();
    let err = LanguageProfile::from_config_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(err.is_profile_failure());
}

#[test]
fn test_profile_discovered_from_subdirectory() {
    let dir = profile_dir();
    let nested = dir.path().join("corpus/raw");
    std::fs::create_dir_all(&nested).unwrap();
    assert_eq!(
        discover_profile_path(&nested),
        Some(dir.path().join("corpuslens.toml"))
    );
}

#[test]
fn test_builder_overrides_and_custom_tokenizer() {
    let profile = LanguageProfile::builder("yo")
        .custom_tokenizer(|text| text.split('-').map(str::to_string).collect())
        .threshold("diversity", "min_ttr", 0.2)
        .threshold("plugin", "weight", 2.5)
        .build()
        .unwrap();

    assert_eq!(profile.tokenizer_kind(), TokenizerKind::Custom);
    assert_eq!(profile.tokenize("a-b-c"), ["a", "b", "c"]);
    assert_eq!(profile.thresholds().diversity.min_ttr, 0.2);
    assert_eq!(profile.thresholds().get_or("plugin", "weight", 0.0), 2.5);

    let err = LanguageProfile::builder("yo")
        .threshold("structural", "unknown_key", 1.0)
        .build()
        .unwrap_err();
    assert!(err.is_profile_failure());
}
