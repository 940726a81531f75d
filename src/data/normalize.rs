use super::model::{CellValue, Column, Record, Table};

/// Clean a freshly fetched table.
///
/// * Cells of the numeric columns (graduation / publication year) become
///   `Number` when they parse, `Null` otherwise.
/// * Records whose every field is missing are dropped. Blankness is judged
///   after coercion, so a row holding nothing but an unparseable year goes
///   too; any row with other content is kept whatever its years say.
///
/// The pass is deterministic and idempotent.
pub fn normalize(table: Table) -> Table {
    let Table { columns, records } = table;
    let before = records.len();

    let numeric: Vec<&'static str> = Column::NUMERIC
        .into_iter()
        .map(Column::header)
        .filter(|h| columns.iter().any(|c| c == h))
        .collect();

    let records: Vec<Record> = records
        .into_iter()
        .map(|mut r| {
            for col in &numeric {
                if let Some(cell) = r.fields.get_mut(*col) {
                    *cell = coerce_numeric(cell);
                }
            }
            r
        })
        .filter(|r| !r.is_blank())
        .collect();

    if records.len() != before {
        log::debug!("Dropped {} blank rows", before - records.len());
    }

    Table { columns, records }
}

/// Numeric coercion of a single cell; anything unparseable or non-finite
/// becomes `Null`.
pub fn coerce_numeric(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::Number(v) if v.is_finite() => CellValue::Number(*v),
        CellValue::Text(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => CellValue::Number(v),
            _ => CellValue::Null,
        },
        CellValue::Number(_) | CellValue::Bool(_) | CellValue::Null => CellValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn raw(rows: Vec<Vec<(&str, CellValue)>>) -> Table {
        let columns = vec!["論文名稱".to_string(), "畢業年度".to_string(), "論文出版年".to_string()];
        let records = rows
            .into_iter()
            .map(|pairs| {
                Record::new(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
            })
            .collect();
        Table::new(columns, records)
    }

    #[test]
    fn drops_fully_blank_rows_only() {
        let table = raw(vec![
            vec![("論文名稱", CellValue::Null), ("畢業年度", CellValue::Text(" ".into()))],
            vec![("論文名稱", CellValue::Text("Ship Routing".into())), ("畢業年度", CellValue::Null)],
        ]);
        let out = normalize(table);
        assert_eq!(out.len(), 1);
        assert_eq!(out.records[0].get("論文名稱"), &CellValue::Text("Ship Routing".into()));
    }

    #[test]
    fn coerces_year_columns_and_keeps_bad_rows() {
        let table = raw(vec![
            vec![
                ("論文名稱", CellValue::Text("A".into())),
                ("畢業年度", CellValue::Text(" 108 ".into())),
                ("論文出版年", CellValue::Text("2019".into())),
            ],
            vec![
                ("論文名稱", CellValue::Text("B".into())),
                ("畢業年度", CellValue::Text("n/a".into())),
                ("論文出版年", CellValue::Text("NaN".into())),
            ],
        ]);
        let out = normalize(table);
        assert_eq!(out.len(), 2);
        assert_eq!(out.records[0].get("畢業年度"), &CellValue::Number(108.0));
        assert_eq!(out.records[0].get("論文出版年"), &CellValue::Number(2019.0));
        assert_eq!(out.records[1].get("畢業年度"), &CellValue::Null);
        assert_eq!(out.records[1].get("論文出版年"), &CellValue::Null);
    }

    #[test]
    fn row_with_only_garbage_years_is_dropped() {
        let table = raw(vec![vec![("畢業年度", CellValue::Text("unknown".into()))]]);
        assert!(normalize(table).is_empty());
    }

    #[test]
    fn non_finite_years_become_null() {
        for text in ["inf", "-Infinity", "1e400", "NaN"] {
            assert_eq!(coerce_numeric(&CellValue::Text(text.into())), CellValue::Null, "{text}");
        }
        assert_eq!(coerce_numeric(&CellValue::Number(f64::INFINITY)), CellValue::Null);
        assert_eq!(
            coerce_numeric(&CellValue::Text(" 2021 ".into())),
            CellValue::Number(2021.0)
        );
    }

    #[test]
    fn leaves_other_columns_as_text() {
        let table = raw(vec![vec![("論文名稱", CellValue::Text("2020".into()))]]);
        let out = normalize(table);
        assert_eq!(out.records[0].get("論文名稱"), &CellValue::Text("2020".into()));
    }

    #[test]
    fn preserves_columns_and_order() {
        let table = raw(vec![
            vec![("論文名稱", CellValue::Text("first".into()))],
            vec![("論文名稱", CellValue::Text("second".into()))],
        ]);
        let out = normalize(table.clone());
        assert_eq!(out.columns, table.columns);
        assert_eq!(out.records[1].get("論文名稱"), &CellValue::Text("second".into()));
    }

    fn arb_cell() -> impl Strategy<Value = CellValue> {
        prop_oneof![
            Just(CellValue::Null),
            Just(CellValue::Text(String::new())),
            "[0-9]{1,4}".prop_map(CellValue::Text),
            "[a-z ]{0,6}".prop_map(CellValue::Text),
            (1900.0f64..2100.0).prop_map(CellValue::Number),
            any::<bool>().prop_map(CellValue::Bool),
        ]
    }

    fn arb_table() -> impl Strategy<Value = Table> {
        prop::collection::vec((arb_cell(), arb_cell(), arb_cell()), 0..20).prop_map(|rows| {
            let records = rows
                .into_iter()
                .map(|(a, b, c)| {
                    Record::new(
                        [("論文名稱", a), ("畢業年度", b), ("論文出版年", c)]
                            .into_iter()
                            .map(|(k, v)| (k.to_string(), v))
                            .collect(),
                    )
                })
                .collect();
            Table::new(
                vec!["論文名稱".into(), "畢業年度".into(), "論文出版年".into()],
                records,
            )
        })
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(table in arb_table()) {
            let once = normalize(table);
            let twice = normalize(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn normalized_tables_have_no_blank_rows(table in arb_table()) {
            let out = normalize(table);
            prop_assert!(out.records.iter().all(|r| !r.is_blank()));
        }
    }
}
