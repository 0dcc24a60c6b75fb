use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::schema::Schema;

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A scalar cell value. Empty cells load as [`Value::Null`].
/// Used as a `BTreeSet` key downstream, so `Value` must be `Ord`.
///
/// `Integer` and `Float` are one numeric domain: `Integer(2)` equals
/// `Float(2.0)` and they sort by magnitude.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Null,
}

/// Cell texts read as missing, on top of the empty cell.
const MISSING_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>",
    "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a raw cell text stands for a missing value.
pub fn is_missing(raw: &str) -> bool {
    let t = raw.trim();
    t.is_empty() || MISSING_TOKENS.contains(&t)
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Integer(_) | Float(_) => 1,
                String(_) => 2,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Integer(a), Integer(b)) => a.cmp(b),
            (Integer(a), Float(b)) => (*a as f64).total_cmp(b),
            (Float(a), Integer(b)) => a.total_cmp(&(*b as f64)),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl Value {
    /// A float cell; NaN and infinities read as missing.
    pub fn number(v: f64) -> Self {
        if v.is_finite() {
            Value::Float(v)
        } else {
            Value::Null
        }
    }

    /// Interpret the value as an `f64` for numeric charts.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

// ---------------------------------------------------------------------------
// Record – one row
// ---------------------------------------------------------------------------

/// One row of the dataset. Values are stored in schema column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Record { values }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed distinct values per column.
///
/// Loaded once and never mutated; selections borrow it through a
/// [`View`](super::filter::View).
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Schema,
    records: Vec<Record>,
    /// For each column the sorted set of distinct values.
    unique_values: BTreeMap<String, BTreeSet<Value>>,
}

impl Dataset {
    /// Build the dataset and its column indices.
    ///
    /// Every record must carry exactly one value per schema column.
    pub fn new(schema: Schema, records: Vec<Record>) -> Self {
        let mut unique_values: BTreeMap<String, BTreeSet<Value>> = schema
            .columns()
            .iter()
            .map(|c| (c.name.clone(), BTreeSet::new()))
            .collect();

        for record in &records {
            debug_assert_eq!(record.values.len(), schema.len());
            for (column, value) in schema.columns().iter().zip(&record.values) {
                if let Some(set) = unique_values.get_mut(&column.name) {
                    set.insert(value.clone());
                }
            }
        }

        Dataset {
            schema,
            records,
            unique_values,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Distinct values of a column, sorted.
    pub fn unique_values(&self, column: &str) -> Option<&BTreeSet<Value>> {
        self.unique_values.get(column)
    }

    /// Value of `column` in row `row`.
    #[cfg(test)]
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.schema.index_of(column)?;
        self.records.get(row)?.values.get(idx)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{ColumnDef, ColumnKind};

    #[test]
    fn value_ordering_groups_by_kind() {
        let mut set = BTreeSet::new();
        set.insert(Value::from("b"));
        set.insert(Value::Integer(3));
        set.insert(Value::Null);
        set.insert(Value::Float(1.5));
        set.insert(Value::from("a"));
        let ordered: Vec<_> = set.into_iter().collect();
        assert_eq!(
            ordered,
            vec![
                Value::Null,
                Value::Float(1.5),
                Value::Integer(3),
                Value::from("a"),
                Value::from("b"),
            ]
        );
    }

    #[test]
    fn integer_and_float_of_same_number_are_one_value() {
        assert_eq!(Value::Integer(2), Value::Float(2.0));
        assert!(Value::Integer(2) < Value::Float(2.5));
        assert!(Value::Float(-0.5) < Value::Integer(0));

        let set: BTreeSet<Value> = [Value::Integer(2), Value::Float(2.0), Value::Float(3.0)].into();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn non_finite_numbers_are_missing() {
        assert_eq!(Value::number(f64::NAN), Value::Null);
        assert_eq!(Value::number(f64::INFINITY), Value::Null);
        assert_eq!(Value::number(1.5), Value::Float(1.5));
        assert!(is_missing("  NaN "));
        assert!(is_missing("NA"));
        assert!(is_missing(""));
        assert!(!is_missing("0"));
    }

    #[test]
    fn dataset_indexes_unique_values() {
        let schema = Schema::new(vec![
            ColumnDef::required("gender", ColumnKind::Categorical),
            ColumnDef::required("score", ColumnKind::Numeric),
        ]);
        let ds = Dataset::new(
            schema,
            vec![
                Record::new(vec![Value::from("female"), Value::Integer(70)]),
                Record::new(vec![Value::from("male"), Value::Integer(65)]),
                Record::new(vec![Value::from("female"), Value::Null]),
            ],
        );
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.unique_values("gender").map(|s| s.len()), Some(2));
        assert_eq!(ds.unique_values("score").map(|s| s.len()), Some(3));
        assert_eq!(ds.value(1, "score"), Some(&Value::Integer(65)));
        assert_eq!(ds.value(0, "missing"), None);
    }
}
