//! Integration tests for error handling.
//!
//! Tests that fatal source errors fail the run and per-record problems do not.

mod common;

use asin_shuffle::sheet::write_rows;
use asin_shuffle::{PoolError, Preset, SheetError, export_targets, load_targets};
use common::{TestEnv, asin};

// =============================================================================
// Fatal source errors
// =============================================================================

#[test]
fn test_missing_text_source_fails() {
    let env = TestEnv::new();
    env.add_record("22.json", &asin('A'));

    let err = env.run(&env.config(Preset::Text), 1).unwrap_err();
    assert!(matches!(err.downcast_ref::<PoolError>(), Some(PoolError::Missing(_))));
}

#[test]
fn test_missing_text_source_fails_even_without_records() {
    let env = TestEnv::new();

    let err = env.run(&env.config(Preset::Text), 1).unwrap_err();
    assert!(matches!(err.downcast_ref::<PoolError>(), Some(PoolError::Missing(_))));
}

#[test]
fn test_source_without_valid_asins_fails() {
    let env = TestEnv::new();
    env.add_file("asins.txt", "short\n\ntoo-long-to-be-an-asin\n");
    env.add_record("22.json", &asin('A'));

    let err = env.run(&env.config(Preset::Text), 1).unwrap_err();
    assert!(matches!(err.downcast_ref::<PoolError>(), Some(PoolError::Empty(_))));
}

#[test]
fn test_sheet_without_asin_column_fails() {
    let env = TestEnv::new();
    env.add_record("22.json", &asin('A'));
    write_rows(
        &env.path("asins.xlsx"),
        "ASINs",
        &["file", "sku"],
        &[vec!["22.json".to_string(), asin('B')]],
    )
    .unwrap();

    let err = env.run(&env.config(Preset::Sheet), 1).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SheetError>(),
        Some(SheetError::MissingColumn { .. })
    ));
}

#[test]
fn test_sheet_with_other_sheet_name_fails() {
    let env = TestEnv::new();
    env.add_record("22.json", &asin('A'));
    let targets = load_targets(
        env.temp_dir.path(),
        &env.config(Preset::Sheet).filter,
        "QuickDownloadURL",
    )
    .unwrap();
    export_targets(&env.path("asins.xlsx"), "Other", &targets).unwrap();

    let err = env.run(&env.config(Preset::Sheet), 1).unwrap_err();
    assert!(matches!(err.downcast_ref::<SheetError>(), Some(SheetError::MissingSheet(_))));
}

#[test]
fn test_missing_records_dir_fails() {
    let env = TestEnv::new();
    let mut config = env.config(Preset::Observed);
    config.dir = env.path("does-not-exist");

    assert!(env.run(&config, 1).is_err());
}

// =============================================================================
// Graceful outcomes
// =============================================================================

#[test]
fn test_no_targets_is_nothing_to_do() {
    let env = TestEnv::new();
    env.add_asin_list("asins.txt", &[&asin('A')]);
    env.add_record("notes.json", &asin('B'));

    let report = env.run(&env.config(Preset::Text), 1).unwrap();
    assert!(report.nothing_to_do);
    assert!(report.outcomes.is_empty());
}

#[test]
fn test_missing_sheet_and_no_targets_is_nothing_to_do() {
    let env = TestEnv::new();

    let report = env.run(&env.config(Preset::Sheet), 1).unwrap();
    assert!(report.nothing_to_do);
    assert!(!env.path("asins.xlsx").exists());
}

#[test]
fn test_broken_records_are_skipped() {
    let env = TestEnv::new();
    env.add_asin_list("asins.txt", &[&asin('A'), &asin('B')]);
    env.add_file("22.json", "{ this is not json");
    env.add_file("23.json", "[1, 2, 3]");
    env.add_record_with_url("24.json", "https://x/y?asin=lowercase1");
    env.add_record("25.json", &asin('C'));

    let report = env.run(&env.config(Preset::Text), 1).unwrap();

    assert_eq!(report.skipped.len(), 3);
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(env.read("22.json"), "{ this is not json");
}
