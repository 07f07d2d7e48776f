//! End-to-end tests for applying mapping tables.

use cde_model::{
    CdeEntry, CdeType, CellValue, Column, Dataset, MappingRow, OutputOrder, Schema, ValueDomain,
    Violation,
};
use cde_transform::{ApplyError, TransformWarning, apply, apply_checked};
use proptest::prelude::*;

fn schema() -> Schema {
    Schema::new(vec![
        CdeEntry::categorical(
            "sex",
            CdeType::Binomial,
            ValueDomain::from_pairs([("Male", "Male"), ("Female", "Female")]),
        ),
        CdeEntry::numeric("age", CdeType::Integer),
        CdeEntry::numeric("bmi", CdeType::Real),
    ])
    .expect("valid schema")
}

fn dataset() -> Dataset {
    Dataset::new(vec![
        Column::new(
            "Age",
            vec![
                CellValue::Integer(34),
                CellValue::Real(f64::NAN),
                CellValue::Integer(61),
            ],
        ),
        Column::new("gender", vec!["m".into(), "F".into(), "x".into()]),
    ])
    .expect("valid dataset")
}

#[test]
fn integer_scale_keeps_missing_cells() {
    let rows = vec![MappingRow::new("Age", "age", CdeType::Integer, "1.0")];
    let outcome = apply(&dataset(), &rows, None);

    assert!(!outcome.has_warnings());
    assert_eq!(outcome.dataset.column_names(), vec!["age"]);
    assert_eq!(
        outcome.dataset.column("age").expect("age column").values,
        vec![
            CellValue::Integer(34),
            CellValue::Missing,
            CellValue::Integer(61)
        ]
    );
}

#[test]
fn integer_scale_truncates_fractional_factor() {
    let scaled = |factor: &str| {
        let rows = vec![MappingRow::new("Age", "age", CdeType::Integer, factor)];
        let outcome = apply(&dataset(), &rows, None);
        assert!(!outcome.has_warnings());
        outcome.dataset.column("age").expect("age column").values.clone()
    };

    assert_eq!(
        scaled("2.5"),
        vec![
            CellValue::Integer(68),
            CellValue::Missing,
            CellValue::Integer(122)
        ]
    );
    assert_eq!(
        scaled("0.5"),
        vec![
            CellValue::Integer(0),
            CellValue::Missing,
            CellValue::Integer(0)
        ]
    );
}

#[test]
fn relabel_ignores_case_and_passes_unmatched_values() {
    let rows = vec![MappingRow::new(
        "gender",
        "sex",
        CdeType::Binomial,
        r#"{"M": "Male", "F": "Female"}"#,
    )];
    let outcome = apply(&dataset(), &rows, None);

    assert_eq!(
        outcome.dataset.column("sex").expect("sex column").values,
        vec!["Male".into(), "Female".into(), "x".into()]
    );
}

#[test]
fn no_transform_sentinel_only_renames() {
    let rows = vec![MappingRow::new("gender", "sex", CdeType::Binomial, "nan")];
    let outcome = apply(&dataset(), &rows, None);

    assert_eq!(
        outcome.dataset.column("sex").expect("sex column").values,
        dataset().column("gender").expect("gender column").values
    );
    assert_eq!(
        outcome.warnings,
        vec![TransformWarning::NoTransform {
            cde_code: "sex".into()
        }]
    );
}

#[test]
fn cast_failure_leaves_column_unscaled() {
    let rows = vec![MappingRow::new("gender", "bmi", CdeType::Real, "2.0")];
    let outcome = apply(&dataset(), &rows, None);

    assert_eq!(
        outcome.dataset.column("bmi").expect("bmi column").values,
        dataset().column("gender").expect("gender column").values
    );
    assert_eq!(
        outcome.warnings,
        vec![TransformWarning::CastFailed {
            dataset_column: "gender".into(),
            cde_code: "bmi".into(),
            cde_type: CdeType::Real,
            value: "m".into(),
        }]
    );
}

#[test]
fn unparseable_transform_is_reported_not_fatal() {
    let rows = vec![
        MappingRow::new("Age", "age", CdeType::Integer, "double"),
        MappingRow::new("gender", "sex", CdeType::Binomial, r#"{"M": "Male"}"#),
    ];
    let outcome = apply(&dataset(), &rows, None);

    assert_eq!(outcome.dataset.column_names(), vec!["age", "sex"]);
    assert!(matches!(
        outcome.warnings.as_slice(),
        [TransformWarning::InvalidTransform { cde_code, .. }] if cde_code == "age"
    ));
}

#[test]
fn checked_apply_lists_every_violation() {
    let rows = vec![
        MappingRow::new("Age", "age", CdeType::Integer, "1.0"),
        MappingRow::new("gender", "age", CdeType::Integer, "1.0"),
        MappingRow::new("weight", "height", CdeType::Real, "1.0"),
    ];
    let err = apply_checked(&dataset(), &rows, &schema(), OutputOrder::Unordered)
        .expect_err("table is invalid");

    let ApplyError::InvalidMapping { violations } = &err;
    assert_eq!(violations.len(), 2);
    assert!(matches!(
        &violations[0],
        Violation::DuplicateCdeCode { cde_code, rows } if cde_code == "age" && rows == &[0, 1]
    ));
    assert!(matches!(
        &violations[1],
        Violation::UnknownCdeCode { row: 2, cde_code } if cde_code == "height"
    ));
    assert_eq!(err.violations().len(), 2);
}

#[test]
fn schema_ordered_output_covers_every_code() {
    let rows = vec![
        MappingRow::new("Age", "age", CdeType::Integer, "1.0"),
        MappingRow::new("gender", "sex", CdeType::Binomial, r#"{"m": "Male", "f": "Female"}"#),
    ];
    let outcome = apply_checked(&dataset(), &rows, &schema(), OutputOrder::SchemaOrdered)
        .expect("valid table");

    assert_eq!(outcome.dataset.column_names(), vec!["sex", "age", "bmi"]);
    assert_eq!(outcome.dataset.row_count(), 3);
    assert!(
        outcome
            .dataset
            .column("bmi")
            .expect("bmi column")
            .values
            .iter()
            .all(CellValue::is_missing)
    );
    assert_eq!(
        outcome.warnings,
        vec![TransformWarning::Unmapped {
            cde_code: "bmi".into()
        }]
    );
}

fn cell() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        Just(CellValue::Missing),
        (-10_000i64..10_000).prop_map(CellValue::Integer),
        (-1.0e4f64..1.0e4).prop_map(CellValue::Real),
    ]
}

proptest! {
    #[test]
    fn scaling_preserves_missing_positions(
        values in prop::collection::vec(cell(), 0..40),
        factor in -100.0f64..100.0,
        integer in any::<bool>(),
    ) {
        let cde_type = if integer { CdeType::Integer } else { CdeType::Real };
        let source = Dataset::new(vec![Column::new("x", values.clone())]).unwrap();
        let rows = vec![MappingRow::new("x", "y", cde_type, format!("{factor:?}"))];
        let outcome = apply(&source, &rows, None);

        prop_assert!(outcome.warnings.is_empty());
        let out = &outcome.dataset.column("y").unwrap().values;
        prop_assert_eq!(out.len(), values.len());
        for (before, after) in values.iter().zip(out) {
            prop_assert_eq!(before.is_missing(), after.is_missing());
        }
    }

    #[test]
    fn relabeling_never_fills_missing_cells(
        keys in prop::collection::vec("[a-c]{1,2}", 0..20),
    ) {
        let mut values: Vec<CellValue> = keys.iter().map(|k| CellValue::from(k.as_str())).collect();
        values.push(CellValue::Missing);
        let source = Dataset::new(vec![Column::new("x", values.clone())]).unwrap();
        let rows = vec![MappingRow::new(
            "x",
            "y",
            CdeType::Multinomial,
            r#"{"a": "alpha", "nan": "filled"}"#,
        )];
        let outcome = apply(&source, &rows, None);
        let out = &outcome.dataset.column("y").unwrap().values;
        for (before, after) in values.iter().zip(out) {
            prop_assert_eq!(before.is_missing(), after.is_missing());
        }
    }
}

#[test]
fn warning_messages_name_column_and_value() {
    let rows = vec![
        MappingRow::new("gender", "age", CdeType::Integer, "1.0"),
        MappingRow::new("Age", "bmi", CdeType::Real, "nan"),
    ];
    let outcome = apply(&dataset(), &rows, None);
    let messages: Vec<String> = outcome.warnings.iter().map(ToString::to_string).collect();
    insta::assert_snapshot!(messages.join("\n"), @r#"
    cannot cast "m" in gender to integer; age left unscaled
    no transformation applied for output column bmi
    "#);
}
