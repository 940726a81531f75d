use std::collections::{BTreeMap, BTreeSet};

use super::model::{Capabilities, CellValue, Column, Record};

// ---------------------------------------------------------------------------
// Grouped counts for the overview charts
// ---------------------------------------------------------------------------

/// Count records per category value, ascending by category.
/// Missing cells are left out rather than bucketed.
pub fn counts_by_category<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    column: &str,
) -> Vec<(CellValue, usize)> {
    let mut counts: BTreeMap<CellValue, usize> = BTreeMap::new();
    for cell in records.into_iter().map(|r| r.get(column)) {
        if !cell.is_missing() {
            *counts.entry(cell.clone()).or_default() += 1;
        }
    }
    counts.into_iter().collect()
}

/// Count records per numeric value (year), ascending by year.
/// Cells that are not numbers are left out.
pub fn counts_by_year<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    column: &str,
) -> Vec<(f64, usize)> {
    let mut counts: BTreeMap<CellValue, usize> = BTreeMap::new();
    for record in records {
        if let Some(v) = record.get(column).as_f64() {
            *counts.entry(CellValue::Number(v)).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .filter_map(|(k, n)| k.as_f64().map(|v| (v, n)))
        .collect()
}

/// Sorted distinct non-missing values of a column, for selection widgets.
pub fn distinct_values<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    column: &str,
) -> BTreeSet<CellValue> {
    records
        .into_iter()
        .map(|r| r.get(column))
        .filter(|c| !c.is_missing())
        .cloned()
        .collect()
}

/// Smallest and largest number in a column, or `None` when it has none.
pub fn numeric_bounds<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    column: &str,
) -> Option<(f64, f64)> {
    records
        .into_iter()
        .filter_map(|r| r.get(column).as_f64())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

// ---------------------------------------------------------------------------
// Summary – both charts at once
// ---------------------------------------------------------------------------

/// Data behind the two overview charts. A chart whose column is missing from
/// the sheet is `None` and simply not drawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub by_department: Option<Vec<(CellValue, usize)>>,
    pub by_pub_year: Option<Vec<(f64, usize)>>,
}

impl Summary {
    pub fn compute<'a>(
        records: impl IntoIterator<Item = &'a Record> + Clone,
        caps: &Capabilities,
    ) -> Self {
        let by_department = caps
            .has(Column::Department)
            .then(|| counts_by_category(records.clone(), Column::Department.header()));
        let by_pub_year = caps
            .has(Column::PubYear)
            .then(|| counts_by_year(records, Column::PubYear.header()));
        Summary {
            by_department,
            by_pub_year,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Table;

    fn table(rows: &[(Option<&str>, Option<f64>)]) -> Table {
        let records = rows
            .iter()
            .map(|(dept, year)| {
                let mut fields = BTreeMap::new();
                fields.insert(
                    "系所名稱".to_string(),
                    dept.map(CellValue::text).unwrap_or(CellValue::Null),
                );
                fields.insert(
                    "論文出版年".to_string(),
                    year.map(CellValue::Number).unwrap_or(CellValue::Null),
                );
                Record::new(fields)
            })
            .collect();
        Table::new(vec!["系所名稱".into(), "論文出版年".into()], records)
    }

    #[test]
    fn category_counts_are_sorted_and_skip_missing() {
        let t = table(&[
            (Some("航運管理學系"), None),
            (Some("商船學系"), None),
            (None, None),
            (Some("航運管理學系"), None),
        ]);
        let counts = counts_by_category(&t.records, "系所名稱");
        assert_eq!(
            counts,
            vec![
                (CellValue::text("商船學系"), 1),
                (CellValue::text("航運管理學系"), 2),
            ]
        );
    }

    #[test]
    fn year_counts_ascend_and_skip_missing() {
        let t = table(&[
            (None, Some(2021.0)),
            (None, Some(2019.0)),
            (None, None),
            (None, Some(2021.0)),
        ]);
        assert_eq!(
            counts_by_year(&t.records, "論文出版年"),
            vec![(2019.0, 1), (2021.0, 2)]
        );
    }

    #[test]
    fn absent_columns_skip_their_chart() {
        let t = Table::new(
            vec!["系所名稱".into()],
            vec![Record::new(
                [("系所名稱".to_string(), CellValue::text("輪機工程學系"))]
                    .into_iter()
                    .collect(),
            )],
        );
        let summary = Summary::compute(&t.records, &Capabilities::detect(&t));
        assert_eq!(
            summary.by_department,
            Some(vec![(CellValue::text("輪機工程學系"), 1)])
        );
        assert_eq!(summary.by_pub_year, None);
    }

    #[test]
    fn bounds_and_distinct_values() {
        let t = table(&[
            (Some("b"), Some(2015.0)),
            (Some("a"), None),
            (Some("b"), Some(2003.0)),
        ]);
        assert_eq!(numeric_bounds(&t.records, "論文出版年"), Some((2003.0, 2015.0)));
        assert_eq!(numeric_bounds(&Table::empty().records, "論文出版年"), None);
        let values: Vec<_> = distinct_values(&t.records, "系所名稱").into_iter().collect();
        assert_eq!(values, vec![CellValue::text("a"), CellValue::text("b")]);
    }
}
