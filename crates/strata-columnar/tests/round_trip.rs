use chrono::{NaiveTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use strata_columnar::{
    CategoricalRow, CategoricalRowReader, MixedRow, MixedRowReader, MixedRowWriter, NumericRow,
    NumericRowReader, ObjectRow, ObjectRowReader, ObjectValue, Order, TypeId,
};

fn sample_table() -> strata_columnar::Table {
    let mut writer = MixedRowWriter::new(
        vec![
            "score".into(),
            "count".into(),
            "color".into(),
            "created".into(),
            "alarm".into(),
            "comment".into(),
        ],
        &[
            TypeId::Real,
            TypeId::Integer,
            TypeId::Nominal,
            TypeId::DateTime,
            TypeId::Time,
            TypeId::Text,
        ],
        true,
    )
    .unwrap();

    let colors = ["red", "green", "blue"];
    for i in 0..2000usize {
        writer.move_next();
        if i % 7 != 0 {
            writer.set(0, i as f64 / 3.0);
            writer.set(1, i as f64 + 0.4);
            writer
                .set_object(2, Some(ObjectValue::Text(colors[i % 3].into())))
                .unwrap();
            writer
                .set_object(
                    3,
                    Some(ObjectValue::Instant(
                        Utc.timestamp_opt(1_600_000_000 + i as i64, 0).unwrap(),
                    )),
                )
                .unwrap();
            writer
                .set_object(
                    4,
                    Some(ObjectValue::Time(
                        NaiveTime::from_num_seconds_from_midnight_opt((i % 86_400) as u32, 0)
                            .unwrap(),
                    )),
                )
                .unwrap();
            writer
                .set_object(5, Some(ObjectValue::Text(format!("row {i}").into())))
                .unwrap();
        }
    }
    writer.create().unwrap()
}

#[test]
fn written_rows_read_back() {
    let table = sample_table();
    assert_eq!(table.height(), 2000);

    let numeric_columns = [table.column(0).clone(), table.column(1).clone()];
    let mut numeric = NumericRowReader::new(&numeric_columns).unwrap();
    let nominal_columns = [table.column(2).clone()];
    let mut nominal = CategoricalRowReader::new(&nominal_columns).unwrap();
    let text_columns = [table.column(5).clone()];
    let mut text = ObjectRowReader::<Arc<str>>::new(&text_columns).unwrap();

    for i in 0..2000usize {
        numeric.move_next();
        nominal.move_next();
        text.move_next();
        if i % 7 == 0 {
            assert!(numeric.get(0).is_nan());
            assert!(numeric.get(1).is_nan());
            assert_eq!(nominal.get_index(0), 0);
            assert_eq!(text.get(0), None);
        } else {
            assert_eq!(numeric.get(0), i as f64 / 3.0);
            // integer columns round on flush
            assert_eq!(numeric.get(1), i as f64);
            assert!(nominal.get_index(0) > 0);
            assert_eq!(text.get(0).as_deref(), Some(format!("row {i}").as_str()));
        }
    }
    assert!(!numeric.has_remaining());
}

#[test]
fn mixed_reader_agrees_with_columns() {
    let table = sample_table();
    let mut reader = MixedRowReader::new(table.columns());
    while reader.has_remaining() {
        reader.move_next();
        let row = reader.position() as usize;
        for c in 0..table.width() {
            let column = table.column(c);
            let direct = column.get_numeric(row);
            let via_row = reader.get_numeric(c);
            assert!(direct == via_row || (direct.is_nan() && via_row.is_nan()));
            assert_eq!(column.get_object(row), reader.get_object(c));
            assert_eq!(column.get_index(row), reader.get_index(c));
        }
    }
}

#[test]
fn sort_then_map_orders_rows() {
    let table = sample_table();
    let column = table.column(0);

    let permutation = column.sort(Order::Ascending).unwrap();
    let sorted = column.map(permutation, false);
    assert_eq!(sorted.size(), column.size());

    let mut previous = f64::NEG_INFINITY;
    let mut seen_missing = false;
    for row in 0..sorted.size() {
        let value = sorted.get_numeric(row);
        if value.is_nan() {
            seen_missing = true;
        } else {
            // missing rows sort after every real value
            assert!(!seen_missing);
            assert!(value >= previous);
            previous = value;
        }
    }
    assert!(seen_missing);
}

#[test]
fn dictionary_survives_mapping() {
    let table = sample_table();
    let column = table.column(2);
    let dictionary = column.dictionary().unwrap().clone();

    let view = column.map(vec![3, 1, -1, 5], true);
    assert!(view.is_view());
    assert_eq!(view.size(), 4);
    assert_eq!(view.dictionary().unwrap(), &dictionary);
    assert_eq!(view.get_object(2), None);
    assert_eq!(
        view.get_object(1),
        Some(ObjectValue::Text("green".into()))
    );
}
