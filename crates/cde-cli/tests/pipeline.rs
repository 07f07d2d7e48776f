//! Integration tests for the pipeline module.

use std::fs;

use cde_cli::pipeline::{build_embedder, describe_method, run_apply, run_matching};
use cde_map::MappingTable;
use cde_model::{
    CdeEntry, CdeType, CellValue, Column, Dataset, MappingRow, MatchingOptions, OutputOrder,
    Schema, SimilarityMethod, SynthesisOptions, ValueDomain,
};
use cde_transform::ApplyError;
use tempfile::TempDir;

fn schema() -> Schema {
    Schema::new(vec![
        CdeEntry::numeric("age", CdeType::Integer),
        CdeEntry::categorical(
            "gender",
            CdeType::Binomial,
            ValueDomain::from_pairs([("M", "Male"), ("F", "Female")]),
        ),
    ])
    .unwrap()
}

fn dataset() -> Dataset {
    Dataset::new(vec![
        Column::new("Age", vec![CellValue::Integer(30), CellValue::Missing]),
        Column::new("gender", vec!["M".into(), "F".into()]),
    ])
    .unwrap()
}

#[test]
fn test_lexical_method_needs_no_embedder() {
    assert!(build_embedder(SimilarityMethod::Lexical, None).unwrap().is_none());
    assert!(
        build_embedder(SimilarityMethod::LearnedEmbedding, None)
            .unwrap()
            .is_some()
    );
}

#[test]
fn test_char_embedding_requires_a_table() {
    assert!(build_embedder(SimilarityMethod::CharEmbedding, None).is_err());

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("chars.txt");
    fs::write(&path, "a 1 0\nb 0 1\n").unwrap();
    let embedder = build_embedder(SimilarityMethod::CharEmbedding, Some(&path))
        .unwrap()
        .unwrap();
    assert_eq!(embedder.name(), "chars");
}

#[test]
fn test_matching_seeds_one_row_per_column() {
    let run = run_matching(
        &dataset(),
        &schema(),
        MatchingOptions::default().with_top_k(2),
        SynthesisOptions::default(),
        None,
    )
    .unwrap();

    let rows = run.initial.table.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].dataset_column, "Age");
    assert_eq!(rows[0].cde_code, "age");
    assert_eq!(rows[0].transform, "1.0");
    assert_eq!(rows[1].cde_code, "gender");
    assert_eq!(rows[1].transform, r#"{"M": "M", "F": "F"}"#);
    assert!(run.outcome.results.iter().all(|r| r.len() == 2));
}

#[test]
fn test_summary_names_the_embedding_model() {
    let lexical = run_matching(
        &dataset(),
        &schema(),
        MatchingOptions::default(),
        SynthesisOptions::default(),
        None,
    )
    .unwrap();
    assert_eq!(describe_method(&lexical.outcome), "lexical");

    let learned = run_matching(
        &dataset(),
        &schema(),
        MatchingOptions::default().with_method(SimilarityMethod::LearnedEmbedding),
        SynthesisOptions::default(),
        build_embedder(SimilarityMethod::LearnedEmbedding, None).unwrap(),
    )
    .unwrap();
    assert_eq!(learned.outcome.embedding_model.as_deref(), Some("char-bag"));
    assert_eq!(
        describe_method(&learned.outcome),
        "learned-embedding (model: char-bag; character counts substituted for a learned model)"
    );
}

#[test]
fn test_apply_with_schema_checks_first() {
    let table = MappingTable::from_rows(vec![
        MappingRow::new("Age", "age", CdeType::Integer, "1.0"),
        MappingRow::new("gender", "age", CdeType::Integer, "1.0"),
    ]);
    let err = run_apply(&dataset(), &table, Some(&schema()), OutputOrder::Unordered)
        .unwrap_err();
    let ApplyError::InvalidMapping { violations } = err;
    assert_eq!(violations.len(), 1);

    // without a schema the same table is applied with per-column recovery
    let outcome = run_apply(&dataset(), &table, None, OutputOrder::SchemaOrdered).unwrap();
    assert_eq!(outcome.dataset.column_names(), vec!["age"]);
    assert!(outcome.has_warnings());
}
