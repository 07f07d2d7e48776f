//! Tests for the mapping table model.

use cde_map::{
    CharBagEmbedder, MappingError, MappingTable, MatchingEngine, SynthesisWarning,
    TransformSynthesizer, build_initial, validate,
};
use cde_model::{
    CdeEntry, CdeType, CellValue, Column, Dataset, MappingRow, MatchingOptions, Schema,
    SimilarityMethod, TransformType, ValueDomain, Violation,
};

fn schema() -> Schema {
    Schema::new(vec![
        CdeEntry::numeric("age", CdeType::Integer),
        CdeEntry::categorical(
            "sex",
            CdeType::Multinomial,
            ValueDomain::from_pairs([("0", "Male"), ("1", "Female")]),
        ),
        CdeEntry::numeric("mmse", CdeType::Real),
    ])
    .expect("schema")
}

fn dataset() -> Dataset {
    Dataset::new(vec![
        Column::new(
            "age",
            vec![CellValue::Integer(34), CellValue::Missing, CellValue::Integer(61)],
        ),
        Column::new("sex", vec!["M".into(), "F".into(), "M".into()]),
        Column::new("notes", vec![CellValue::Missing; 3]),
    ])
    .expect("dataset")
}

#[test]
fn build_initial_seeds_one_row_per_column() {
    let dataset = dataset();
    let schema = schema();
    let engine = MatchingEngine::new(MatchingOptions::default().with_top_k(3));
    let outcome = engine
        .match_columns(&dataset.column_names(), &schema.codes())
        .expect("match");
    let initial = build_initial(&outcome, &dataset, &schema, &TransformSynthesizer::default())
        .expect("initial mapping");

    let rows = initial.table.rows();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].dataset_column, "age");
    assert_eq!(rows[0].cde_code, "age");
    assert_eq!(rows[0].transform_type, TransformType::Scale);
    assert_eq!(rows[0].transform, "1.0");
    assert_eq!(rows[1].cde_code, "sex");
    assert_eq!(rows[1].transform_type, TransformType::Map);
    assert!(initial.skipped.is_empty());
    assert!(
        initial
            .warnings
            .iter()
            .all(|w| !matches!(w, SynthesisWarning::MustBeFixed { .. }))
    );
}

#[test]
fn build_initial_skips_unmatched_columns() {
    let dataset = Dataset::new(vec![
        Column::new("age", vec![CellValue::Integer(1)]),
        Column::new("__", vec![CellValue::Integer(2)]),
    ])
    .expect("dataset");
    let schema = schema();
    let engine = MatchingEngine::new(
        MatchingOptions::default().with_method(SimilarityMethod::CharEmbedding),
    )
    .with_embedder(CharBagEmbedder);
    let outcome = engine
        .match_columns(&dataset.column_names(), &schema.codes())
        .expect("match");
    let initial = build_initial(&outcome, &dataset, &schema, &TransformSynthesizer::default())
        .expect("initial mapping");
    assert_eq!(initial.table.len(), 1);
    assert_eq!(initial.skipped, vec!["__"]);
}

#[test]
fn validate_lists_every_violation() {
    let rows = vec![
        MappingRow::new("a", "age", CdeType::Integer, "two"),
        MappingRow::new("b", "age", CdeType::Integer, "1.0"),
        MappingRow::new("c", "bmi", CdeType::Real, "1.0"),
        MappingRow {
            dataset_column: "d".into(),
            cde_code: "sex".into(),
            cde_type: CdeType::Multinomial,
            transform_type: TransformType::Scale,
            transform: "nan".into(),
        },
        MappingRow::new("e", "mmse", CdeType::Integer, "{'a': 'b'}"),
    ];
    let violations = validate(&rows, &schema());
    assert!(matches!(
        &violations[0],
        Violation::DuplicateCdeCode { cde_code, rows } if cde_code == "age" && rows == &vec![0, 1]
    ));
    assert!(violations.contains(&Violation::UnknownCdeCode {
        row: 2,
        cde_code: "bmi".into()
    }));
    assert!(violations.contains(&Violation::TransformTypeMismatch {
        row: 3,
        cde_type: CdeType::Multinomial,
        transform_type: TransformType::Scale,
    }));
    assert!(violations.contains(&Violation::CdeTypeMismatch {
        row: 4,
        cde_code: "mmse".into(),
        declared: CdeType::Real,
        found: CdeType::Integer,
    }));
    let invalid: Vec<usize> = violations
        .iter()
        .filter_map(|v| match v {
            Violation::InvalidTransform { row, .. } => Some(*row),
            _ => None,
        })
        .collect();
    assert_eq!(invalid, vec![0, 4]);
    assert_eq!(violations.len(), 6);
}

#[test]
fn clean_table_has_no_violations() {
    let table = MappingTable::from_rows(vec![
        MappingRow::new("years", "age", CdeType::Integer, "1.0"),
        MappingRow::new("gender", "sex", CdeType::Multinomial, "{'M': '0', 'F': '1'}"),
        MappingRow::new("score", "mmse", CdeType::Real, "nan"),
    ]);
    assert!(table.validate(&schema()).is_empty());
}

#[test]
fn editing_rows_by_code() {
    let schema = schema();
    let synthesizer = TransformSynthesizer::default();
    let mut table = MappingTable::from_rows(vec![MappingRow::new(
        "gender",
        "age",
        CdeType::Integer,
        "1.0",
    )]);
    let values = vec![CellValue::from("M"), CellValue::from("F")];
    table
        .set_cde_code(0, "sex", &schema, Some(&values), &synthesizer)
        .expect("cascade");
    let (idx, row) = table.find_by_code("sex").expect("row for sex");
    assert_eq!(idx, 0);
    assert_eq!(row.transform, r#"{"M": "0", "F": "1"}"#);
    assert!(table.find_by_code("age").is_none());
    assert!(matches!(
        table.set_cde_code(4, "sex", &schema, None, &synthesizer),
        Err(MappingError::RowOutOfRange { index: 4, len: 1 })
    ));
}
