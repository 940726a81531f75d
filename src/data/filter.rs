use std::collections::BTreeSet;

use super::model::{CellValue, Record, Table};

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// The kind of test a predicate performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateKind {
    Substring,
    Membership,
    Range,
}

/// A boolean test over one record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive containment of `needle` in the column's text.
    /// Missing cells never match.
    Contains { column: String, needle: String },
    /// The cell must be one of `allowed`. An empty set excludes nothing.
    OneOf {
        column: String,
        allowed: BTreeSet<CellValue>,
    },
    /// The cell must be a number in `[low, high]`. Missing cells never match.
    InRange { column: String, low: f64, high: f64 },
}

impl Predicate {
    pub fn column(&self) -> &str {
        match self {
            Predicate::Contains { column, .. }
            | Predicate::OneOf { column, .. }
            | Predicate::InRange { column, .. } => column,
        }
    }

    pub fn kind(&self) -> PredicateKind {
        match self {
            Predicate::Contains { .. } => PredicateKind::Substring,
            Predicate::OneOf { .. } => PredicateKind::Membership,
            Predicate::InRange { .. } => PredicateKind::Range,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        let cell = record.get(self.column());
        match self {
            Predicate::Contains { needle, .. } => match cell.as_text() {
                Some(text) => text.to_lowercase().contains(&needle.to_lowercase()),
                None => false,
            },
            Predicate::OneOf { allowed, .. } => allowed.is_empty() || allowed.contains(cell),
            Predicate::InRange { low, high, .. } => match cell.as_f64() {
                Some(v) => *low <= v && v <= *high,
                None => false,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// FilterSet – the AND-composition of the active predicates
// ---------------------------------------------------------------------------

/// Ordered list of active predicates, combined by logical AND.
///
/// The builder methods drop "unset" inputs instead of turning them into
/// predicates: an empty search string or an empty selection means no filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    predicates: Vec<Predicate>,
}

impl FilterSet {
    pub fn new() -> Self {
        FilterSet::default()
    }

    pub fn contains(mut self, column: &str, query: &str) -> Self {
        let query = query.trim();
        if !query.is_empty() {
            self.predicates.push(Predicate::Contains {
                column: column.to_string(),
                needle: query.to_string(),
            });
        }
        self
    }

    pub fn one_of(mut self, column: &str, allowed: &BTreeSet<CellValue>) -> Self {
        if !allowed.is_empty() {
            self.predicates.push(Predicate::OneOf {
                column: column.to_string(),
                allowed: allowed.clone(),
            });
        }
        self
    }

    pub fn in_range(mut self, column: &str, low: f64, high: f64) -> Self {
        self.predicates.push(Predicate::InRange {
            column: column.to_string(),
            low,
            high,
        });
        self
    }

    /// Append the predicates of `other` after this set's own.
    pub fn and(mut self, other: FilterSet) -> Self {
        self.predicates.extend(other.predicates);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Applying filters
// ---------------------------------------------------------------------------

/// Records of a table that passed a [`FilterSet`], by index into the table.
#[derive(Debug, Clone)]
pub struct Filtered<'a> {
    table: &'a Table,
    indices: Vec<usize>,
}

impl<'a> Filtered<'a> {
    /// Every record of the table, nothing filtered yet.
    pub fn all(table: &'a Table) -> Self {
        Filtered {
            table,
            indices: (0..table.len()).collect(),
        }
    }

    /// Keep only the survivors that pass every predicate of `filters`.
    pub fn narrow(mut self, filters: &FilterSet) -> Self {
        for predicate in filters.predicates() {
            let records = &self.table.records;
            self.indices.retain(|&i| predicate.matches(&records[i]));
            log::trace!(
                "{:?} on {} leaves {} records",
                predicate.kind(),
                predicate.column(),
                self.indices.len()
            );
        }
        self
    }

    pub fn count(&self) -> usize {
        self.indices.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let table = self.table;
        self.indices.iter().map(move |&i| &table.records[i])
    }

    /// Materialise the matches as a table with the source schema.
    pub fn to_table(&self) -> Table {
        Table::new(self.table.columns.clone(), self.records().cloned().collect())
    }

    pub fn into_indices(self) -> Vec<usize> {
        self.indices
    }
}

/// Apply the filter set to the table.
///
/// Each predicate narrows the survivors of the previous ones, so the result
/// is the AND of all predicates and does not depend on their order. Source
/// order of the records is preserved.
pub fn apply<'a>(table: &'a Table, filters: &FilterSet) -> Filtered<'a> {
    Filtered::all(table).narrow(filters)
}
