use chrono::{NaiveTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use strata_columnar::{
    CategoricalRow, ColumnError, DateTimeBuffer, MixedRow, MixedRowWriter, NumericBuffer,
    NumericRow, ObjectRow, ObjectValue, TypeId,
};
use strata_transform::{RowTransformer, SequentialContext, TransformError};

fn numeric_column(values: Vec<f64>) -> Arc<strata_columnar::Column> {
    Arc::new(NumericBuffer::from_values(TypeId::Real, values).to_column())
}

#[test]
fn construction_requires_equal_lengths() {
    assert_eq!(
        RowTransformer::new(Vec::new()).unwrap_err(),
        TransformError::EmptyColumns
    );
    let error = RowTransformer::new(vec![
        numeric_column(vec![1.0, 2.0]),
        numeric_column(vec![1.0]),
    ])
    .unwrap_err();
    assert_eq!(
        error,
        TransformError::MismatchedLengths {
            expected: 2,
            actual: 1
        }
    );
}

#[test]
fn numeric_apply_rejects_object_columns() {
    let mut buffer = DateTimeBuffer::new(3, false, true);
    buffer.set_epoch_seconds(0, 1_000);
    let transformer = RowTransformer::new(vec![Arc::new(buffer.to_column())]).unwrap();
    let error = transformer
        .apply_numeric_to_real(&SequentialContext, |row: &dyn NumericRow| row.get(0))
        .unwrap_err();
    assert_eq!(
        error,
        TransformError::Column(ColumnError::NotNumericReadable(TypeId::DateTime))
    );
}

#[test]
fn numeric_to_integer_rounds_results() {
    let transformer =
        RowTransformer::new(vec![numeric_column(vec![1.2, 2.7, f64::NAN])]).unwrap();
    let column = transformer
        .apply_numeric_to_integer(&SequentialContext, |row: &dyn NumericRow| row.get(0))
        .unwrap();
    assert_eq!(column.type_id(), TypeId::Integer);
    assert_eq!(column.get_numeric(0), 1.0);
    assert_eq!(column.get_numeric(1), 3.0);
    assert!(column.get_numeric(2).is_nan());
}

#[test]
fn numeric_to_nominal_builds_a_dictionary() {
    let transformer =
        RowTransformer::new(vec![numeric_column(vec![-2.0, 3.0, f64::NAN, 0.5])]).unwrap();
    let column = transformer
        .apply_numeric_to_nominal(&SequentialContext, |row: &dyn NumericRow| {
            let value = row.get(0);
            if value.is_nan() {
                None
            } else if value >= 0.0 {
                Some("positive".into())
            } else {
                Some("negative".into())
            }
        })
        .unwrap();
    assert_eq!(column.type_id(), TypeId::Nominal);
    let dictionary = column.dictionary().unwrap();
    assert_eq!(dictionary.cardinality(), 2);
    assert_eq!(
        column.get_object(0),
        Some(ObjectValue::Text("negative".into()))
    );
    assert_eq!(column.get_object(2), None);
    assert_eq!(
        column.get_object(3),
        Some(ObjectValue::Text("positive".into()))
    );
}

#[test]
fn object_to_time_extracts_time_of_day() {
    let mut buffer = DateTimeBuffer::new(3, false, true);
    buffer.set(
        0,
        Some(Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 15).unwrap()),
    );
    buffer.set(
        2,
        Some(Utc.with_ymd_and_hms(2024, 1, 3, 23, 0, 0).unwrap()),
    );
    let transformer = RowTransformer::new(vec![Arc::new(buffer.to_column())]).unwrap();
    let column = transformer
        .apply_object_to_time(
            &SequentialContext,
            |row: &dyn ObjectRow<chrono::DateTime<Utc>>| row.get(0).map(|instant| instant.time()),
        )
        .unwrap();
    assert_eq!(column.type_id(), TypeId::Time);
    assert_eq!(
        column.get_object(0),
        Some(ObjectValue::Time(NaiveTime::from_hms_opt(9, 30, 15).unwrap()))
    );
    assert_eq!(column.get_object(1), None);
    assert_eq!(
        column.get_object(2),
        Some(ObjectValue::Time(NaiveTime::from_hms_opt(23, 0, 0).unwrap()))
    );
}

#[test]
fn mixed_to_text_formats_rows() {
    let mut writer = MixedRowWriter::new(
        vec!["value".into(), "label".into()],
        &[TypeId::Real, TypeId::Nominal],
        true,
    )
    .unwrap();
    for (value, label) in [(1.5, Some("a")), (2.5, None), (3.5, Some("b"))] {
        writer.move_next();
        writer.set(0, value);
        writer
            .set_object(1, label.map(|l| ObjectValue::Text(l.into())))
            .unwrap();
    }
    let table = writer.create().unwrap();

    let transformer = RowTransformer::new(table.columns().to_vec()).unwrap();
    let column = transformer
        .apply_mixed_to_text(&SequentialContext, |row: &dyn MixedRow| {
            let label = row.get_object(1)?;
            let label = label.as_text()?.clone();
            Some(format!("{}={}", label, row.get_numeric(0)).into())
        })
        .unwrap();
    assert_eq!(column.type_id(), TypeId::Text);
    assert_eq!(column.get_object(0), Some(ObjectValue::Text("a=1.5".into())));
    assert_eq!(column.get_object(1), None);
    assert_eq!(column.get_object(2), Some(ObjectValue::Text("b=3.5".into())));
}

#[test]
fn categorical_reduce_counts_occurrences() {
    let mut writer =
        MixedRowWriter::new(vec!["label".into()], &[TypeId::Nominal], true).unwrap();
    for label in ["x", "y", "x", "x", "y", "x"] {
        writer.move_next();
        writer
            .set_object(0, Some(ObjectValue::Text(label.into())))
            .unwrap();
    }
    writer.move_next(); // one missing row
    let table = writer.create().unwrap();

    let transformer = RowTransformer::new(table.columns().to_vec()).unwrap();
    let counts = transformer
        .reduce_categorical(
            &SequentialContext,
            || vec![0usize; 3],
            |counts: &mut Vec<usize>, row: &dyn CategoricalRow| {
                counts[row.get_index(0) as usize] += 1;
            },
            |mut left, right| {
                for (l, r) in left.iter_mut().zip(right) {
                    *l += r;
                }
                left
            },
        )
        .unwrap();
    // index 0 is the missing slot
    assert_eq!(counts, vec![1, 4, 2]);
}
