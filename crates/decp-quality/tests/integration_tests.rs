//! Integration tests for the quality audit.
//!
//! These tests run the whole audit over a small dataset covering every
//! defect the detectors look for.

use chrono::NaiveDate;
use decp_quality::{
    AuditConfig, AuditError, AuditResultSet, Dataset, Dimension, PathsConfig, SourceComparison,
    audit_dataset,
};
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_config() -> AuditConfig {
    AuditConfig::from_toml_file(fixtures_path().join("audit_config.toml"))
        .expect("Failed to load configuration")
}

fn load_dataset() -> Dataset {
    Dataset::from_json_file(fixtures_path().join("decp_sample.json"))
        .expect("Failed to load dataset")
}

fn load_schema() -> Value {
    let text = std::fs::read_to_string(fixtures_path().join("decp_schema.json"))
        .expect("Failed to read schema");
    serde_json::from_str(&text).expect("Failed to parse schema")
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 11).unwrap()
}

fn audit() -> AuditResultSet {
    audit_dataset(load_dataset(), &load_schema(), &load_config(), today())
        .expect("Audit should succeed")
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("decp-quality-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn details(results: &AuditResultSet, source: &str, dimension: Dimension) -> Vec<f64> {
    results
        .lookup(source)
        .unwrap()
        .measure(dimension)
        .ordered_details()
}

// ============================================================================
// Per-source scores
// ============================================================================

#[test]
fn test_sources_follow_configuration_order() {
    let results = audit();
    let sources: Vec<&str> = results.results().iter().map(|r| r.source.as_str()).collect();
    assert_eq!(sources, vec!["alpha", "beta", "gamma"]);
}

#[test]
fn test_alpha_details() {
    let results = audit();

    // Two records share uid a1 and only differ on the excluded id column
    assert_eq!(details(&results, "alpha", Dimension::Singularite), vec![0.5, 0.5]);
    // a3 has a replacement character and an unknown procedure, a4 a long id
    assert_eq!(
        details(&results, "alpha", Dimension::Conformite),
        vec![0.25, 0.25, 0.25]
    );
    // a4 has no objet
    assert_eq!(details(&results, "alpha", Dimension::Completude), vec![0.25, 0.25]);
    // 10 days since 2024-06-01, floored to 100 over 4 records; a1 twice late
    assert_eq!(details(&results, "alpha", Dimension::Validite), vec![25.0, 0.5]);
    // a3 notified after publication, 500 € over 12 months
    assert_eq!(details(&results, "alpha", Dimension::Coherence), vec![0.25, 0.25]);
    // a3 and a4 outside the amount bounds, no extreme value
    assert_eq!(details(&results, "alpha", Dimension::Exactitude), vec![0.5, 0.0]);
}

#[test]
fn test_alpha_scores() {
    let results = audit();
    let alpha = results.lookup("alpha").unwrap();

    let values: Vec<f64> = alpha.measures().iter().map(|m| m.value).collect();
    assert_eq!(values, vec![0.5, 0.25, 0.25, 12.75, 0.25, 0.25]);
    assert_eq!(alpha.general.value, 2.375);
}

#[test]
fn test_beta_matches_case_insensitively() {
    let results = audit();
    let beta = results.lookup("beta").unwrap();

    // Both "Marché" and "marché" records of "beta" and "Beta" are audited
    assert_eq!(details(&results, "beta", Dimension::Validite), vec![50.0, 0.0]);
    assert_eq!(beta.measure(Dimension::Validite).value, 25.0);
    for dimension in Dimension::ALL {
        if dimension != Dimension::Validite {
            assert_eq!(beta.measure(dimension).value, 0.0, "{}", dimension);
        }
    }
    assert_eq!(beta.general.value, 4.166667);
}

#[test]
fn test_source_without_markets_scores_zero() {
    let results = audit();
    let gamma = results.lookup("gamma").unwrap();

    // gamma only publishes a concession, which is filtered out
    assert_eq!(gamma.general.value, 0.0);
    for measure in gamma.measures() {
        assert_eq!(measure.value, 0.0);
        assert!(measure.details.values().all(|v| *v == 0.0));
    }
}

#[test]
fn test_unconfigured_source_is_ignored() {
    let results = audit();
    assert_eq!(results.len(), 3);
    assert!(matches!(results.lookup("delta"), Err(AuditError::NotFound(_))));
}

// ============================================================================
// Ranking
// ============================================================================

#[test]
fn test_ranks() {
    let results = audit();
    let rank = |source: &str, dimension: Option<Dimension>| {
        let result = results.lookup(source).unwrap();
        match dimension {
            Some(d) => result.measure(d).rank,
            None => result.general.rank,
        }
    };

    assert_eq!(rank("gamma", None), Some(1));
    assert_eq!(rank("alpha", None), Some(2));
    assert_eq!(rank("beta", None), Some(3));

    // Ties share a rank and leave no gap
    assert_eq!(rank("beta", Some(Dimension::Singularite)), Some(1));
    assert_eq!(rank("gamma", Some(Dimension::Singularite)), Some(1));
    assert_eq!(rank("alpha", Some(Dimension::Singularite)), Some(2));

    assert_eq!(rank("gamma", Some(Dimension::Validite)), Some(1));
    assert_eq!(rank("alpha", Some(Dimension::Validite)), Some(2));
    assert_eq!(rank("beta", Some(Dimension::Validite)), Some(3));
}

// ============================================================================
// Persistence and comparison
// ============================================================================

#[test]
fn test_artifact_round_trip() {
    let results = audit();
    let path = temp_dir("round-trip").join("audit.json");

    results.save_json(&path).unwrap();
    let restored = AuditResultSet::load_json(&path).unwrap();
    assert_eq!(restored, results);

    let artifact: Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(artifact[0]["source"], "alpha");
    assert_eq!(artifact[0]["general"]["valeur"], 2.375);
    assert_eq!(artifact[0]["general"]["rang"], 2);
    assert_eq!(artifact[0]["validite"]["synthese"]["valeur"], 12.75);
    assert_eq!(
        artifact[0]["validite"]["detail"]["jours_depuis_derniere_publication"],
        25.0
    );

    std::fs::remove_dir_all(path.parent().unwrap()).ok();
}

#[test]
fn test_comparison_between_two_audits() {
    let current = audit();
    let mut config = load_config();
    config.publication_delay_days = 120;
    let previous = audit_dataset(load_dataset(), &load_schema(), &config, today()).unwrap();

    let comparison = SourceComparison::new(
        current.lookup("alpha").unwrap(),
        Some(previous.lookup("alpha").unwrap()),
    );

    // Validité: 12.75 now, (25.0 + 0.0) / 2 = 12.5 with the longer delay
    let validite = &comparison.dimensions[3];
    assert_eq!(validite.key, "validite");
    assert_eq!(validite.value_pct, 1275);
    assert_eq!(validite.delta_pts, Some(25));
    assert_eq!(validite.rank, Some(2));
}

// ============================================================================
// Full run
// ============================================================================

fn run_config(name: &str) -> (AuditConfig, PathBuf) {
    let dir = temp_dir(name);
    let mut config = load_config();
    config.paths = PathsConfig {
        dataset: fixtures_path().join("decp_sample.json"),
        schema: fixtures_path().join("decp_schema.json"),
        results: dir.join("out").join("audit.json"),
    };
    (config, dir)
}

#[test]
fn test_run_writes_results() {
    let (config, dir) = run_config("run");

    let run = decp_quality::audit::run(&config, None).unwrap();
    assert_eq!(run.num_records, 7);
    assert_eq!(run.output, config.paths.results);

    let saved = AuditResultSet::load_json(&config.paths.results).unwrap();
    assert_eq!(saved, run.results);
    assert_eq!(
        details(&saved, "alpha", Dimension::Singularite),
        vec![0.5, 0.5]
    );

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_run_with_row_limit() {
    let (config, dir) = run_config("rows");

    // The first two records are the a1 pair
    let run = decp_quality::audit::run(&config, Some(2)).unwrap();
    assert_eq!(run.num_records, 2);
    assert_eq!(
        details(&run.results, "alpha", Dimension::Singularite),
        vec![1.0, 1.0]
    );
    assert_eq!(run.results.lookup("beta").unwrap().general.value, 0.0);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_run_with_missing_dataset_fails() {
    let (mut config, dir) = run_config("missing");
    config.paths.dataset = dir.join("absent.json");

    let err = decp_quality::audit::run(&config, None).unwrap_err();
    assert_eq!(err.error_code(), "IO_ERROR");

    std::fs::remove_dir_all(dir).ok();
}
