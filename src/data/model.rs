use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// Column – the sheet columns the pipeline knows about
// ---------------------------------------------------------------------------

/// A column the search pipeline depends on, bound to its verbatim sheet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Title,
    Researcher,
    Advisor,
    School,
    Department,
    Degree,
    GradYear,
    PubYear,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::Title,
        Column::Researcher,
        Column::Advisor,
        Column::School,
        Column::Department,
        Column::Degree,
        Column::GradYear,
        Column::PubYear,
    ];

    /// Columns coerced to numbers during normalization.
    pub const NUMERIC: [Column; 2] = [Column::GradYear, Column::PubYear];

    /// Header text exactly as it appears in the spreadsheet.
    pub fn header(self) -> &'static str {
        match self {
            Column::Title => "論文名稱",
            Column::Researcher => "研究生",
            Column::Advisor => "指導教授",
            Column::School => "校院名稱",
            Column::Department => "系所名稱",
            Column::Degree => "學位類別",
            Column::GradYear => "畢業年度",
            Column::PubYear => "論文出版年",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

// ---------------------------------------------------------------------------
// CellValue – a single cell of the sheet
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
///
/// Ordering is total so values can be used as `BTreeSet` / `BTreeMap` keys:
/// `Null < Bool < Number < Text`, numbers compared with `f64::total_cmp`.
#[derive(Debug, Clone)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl CellValue {
    /// Build a text cell, mapping empty strings to `Null`.
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            CellValue::Null
        } else {
            CellValue::Text(s)
        }
    }

    /// `Null`, or text that is empty after trimming.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Textual view used for substring search; `None` for missing cells.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        if self.is_missing() {
            return None;
        }
        match self {
            CellValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            other => Some(Cow::Owned(other.to_string())),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CellValue::Null => 0,
            CellValue::Bool(_) => 1,
            CellValue::Number(_) => 2,
            CellValue::Text(_) => 3,
        }
    }
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Number(a), Number(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Number(v) => v.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            // Years and counts come back as floats; print them without ".0".
            CellValue::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{}", *v as i64)
            }
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the sheet
// ---------------------------------------------------------------------------

static NULL: CellValue = CellValue::Null;

/// A single thesis record (one sheet row). Columns the pipeline does not
/// know about are carried along untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub fields: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn new(fields: BTreeMap<String, CellValue>) -> Self {
        Record { fields }
    }

    /// Cell for `column`, `Null` when the record has no such field.
    pub fn get(&self, column: &str) -> &CellValue {
        self.fields.get(column).unwrap_or(&NULL)
    }

    /// Whether every field of the record is missing.
    pub fn is_blank(&self) -> bool {
        self.fields.values().all(CellValue::is_missing)
    }
}

// ---------------------------------------------------------------------------
// Table – the full sheet
// ---------------------------------------------------------------------------

/// An ordered sequence of records sharing one column schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Column names in sheet order.
    pub columns: Vec<String>,
    /// Records in sheet order.
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Table { columns, records }
    }

    pub fn empty() -> Self {
        Table::default()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Capabilities – which known columns the current sheet carries
// ---------------------------------------------------------------------------

/// Result of the one-off schema introspection done when a table is loaded.
/// Filters, search modes and charts whose column is absent are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    present: BTreeSet<Column>,
}

impl Capabilities {
    pub fn detect(table: &Table) -> Self {
        let present = Column::ALL
            .into_iter()
            .filter(|c| table.has_column(c.header()))
            .collect();
        Capabilities { present }
    }

    pub fn has(&self, column: Column) -> bool {
        self.present.contains(&column)
    }

    pub fn missing(&self) -> Vec<Column> {
        Column::ALL
            .into_iter()
            .filter(|c| !self.present.contains(c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, CellValue)]) -> Record {
        Record::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn text_constructor_maps_empty_to_null() {
        assert_eq!(CellValue::text(""), CellValue::Null);
        assert_eq!(CellValue::text("港口"), CellValue::Text("港口".into()));
    }

    #[test]
    fn whitespace_text_counts_as_missing() {
        assert!(CellValue::Text("   ".into()).is_missing());
        assert!(CellValue::Null.is_missing());
        assert!(!CellValue::Number(0.0).is_missing());
    }

    #[test]
    fn ordering_groups_by_kind_then_value() {
        let mut v = vec![
            CellValue::Text("b".into()),
            CellValue::Number(2021.0),
            CellValue::Null,
            CellValue::Text("a".into()),
            CellValue::Number(2019.0),
        ];
        v.sort();
        assert_eq!(
            v,
            vec![
                CellValue::Null,
                CellValue::Number(2019.0),
                CellValue::Number(2021.0),
                CellValue::Text("a".into()),
                CellValue::Text("b".into()),
            ]
        );
    }

    #[test]
    fn integral_numbers_display_without_fraction() {
        assert_eq!(CellValue::Number(2019.0).to_string(), "2019");
        assert_eq!(CellValue::Number(1.5).to_string(), "1.5");
        assert_eq!(CellValue::Null.to_string(), "");
    }

    #[test]
    fn absent_field_reads_as_null() {
        let r = record(&[("研究生", CellValue::Text("Chen".into()))]);
        assert_eq!(r.get("論文名稱"), &CellValue::Null);
        assert!(!r.is_blank());
        assert!(record(&[("研究生", CellValue::Null)]).is_blank());
    }

    #[test]
    fn capabilities_reflect_present_headers() {
        let table = Table::new(
            vec!["論文名稱".into(), "系所名稱".into(), "備註".into()],
            Vec::new(),
        );
        let caps = Capabilities::detect(&table);
        assert!(caps.has(Column::Title));
        assert!(caps.has(Column::Department));
        assert!(!caps.has(Column::PubYear));
        assert_eq!(caps.missing().len(), 6);
    }
}
