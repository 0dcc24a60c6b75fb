use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::model::{self, Dataset, Record, Value};
use super::schema::{ColumnKind, Schema};

// ---------------------------------------------------------------------------
// Filter spec: which values are allowed per column
// ---------------------------------------------------------------------------

/// Per-column allow-lists: maps column_name → set of allowed values.
/// A column absent from the map is unconstrained; an empty set matches nothing.
pub type FilterSpec = BTreeMap<String, BTreeSet<Value>>;

/// Initialise a [`FilterSpec`] for the given columns with every distinct
/// value selected (i.e., show everything).
pub fn init_filter_state(dataset: &Dataset, columns: &[&str]) -> FilterSpec {
    columns
        .iter()
        .filter_map(|col| {
            dataset
                .unique_values(col)
                .map(|vals| (col.to_string(), vals.clone()))
        })
        .collect()
}

/// One resolved constraint: schema index (None when the column is unknown)
/// plus the allowed values.
struct Constraint<'f> {
    index: Option<usize>,
    allowed: &'f BTreeSet<Value>,
}

/// Resolve a filter spec against a dataset, dropping constraints that every value
/// of the column already satisfies.
///
/// Returns `None` when some constraint can never pass, so callers can skip
/// the scan altogether.
fn resolve<'f>(dataset: &Dataset, filters: &'f FilterSpec) -> Option<Vec<Constraint<'f>>> {
    let mut constraints = Vec::new();
    for (col, allowed) in filters {
        if allowed.is_empty() {
            return None;
        }
        let index = dataset.schema().index_of(col);
        match index {
            Some(_) => {
                // Everything selected → no effective filter
                if let Some(all_vals) = dataset.unique_values(col) {
                    if all_vals.is_subset(allowed) {
                        continue;
                    }
                }
            }
            None => {
                // Unknown column reads as null everywhere
                if allowed.contains(&Value::Null) {
                    continue;
                }
                return None;
            }
        }
        constraints.push(Constraint { index, allowed });
    }
    Some(constraints)
}

fn passes(record: &Record, constraints: &[Constraint<'_>]) -> bool {
    constraints.iter().all(|c| {
        let value = c
            .index
            .and_then(|i| record.values.get(i))
            .unwrap_or(&Value::Null);
        c.allowed.contains(value)
    })
}

/// Return indices of records, among `candidates`, that pass all filters.
///
/// A record passes a column filter when:
/// * The column is not present in `filters` → passes (no constraint)
/// * The filter set for that column is empty → nothing selected → fails
/// * The record's value for that column is in the selected set → passes
///
/// Columns the schema does not declare read as [`Value::Null`].
fn filter_candidates(
    dataset: &Dataset,
    candidates: impl Iterator<Item = usize>,
    filters: &FilterSpec,
) -> Vec<usize> {
    let Some(constraints) = resolve(dataset, filters) else {
        return Vec::new();
    };
    let records = dataset.records();
    candidates
        .filter(|&i| records.get(i).is_some_and(|r| passes(r, &constraints)))
        .collect()
}

/// Select the records of `dataset` that satisfy every constraint in `filters`.
pub fn select<'a>(dataset: &'a Dataset, filters: &FilterSpec) -> View<'a> {
    View {
        dataset,
        indices: Cow::Owned(filter_candidates(dataset, 0..dataset.len(), filters)),
    }
}

// ---------------------------------------------------------------------------
// View – an ordered selection over an immutable dataset
// ---------------------------------------------------------------------------

/// Borrowed dataset plus the ordered indices of the selected rows.
#[derive(Debug, Clone)]
pub struct View<'a> {
    dataset: &'a Dataset,
    indices: Cow<'a, [usize]>,
}

impl<'a> View<'a> {
    /// Every record of the dataset.
    #[cfg(test)]
    pub fn all(dataset: &'a Dataset) -> Self {
        View {
            dataset,
            indices: Cow::Owned((0..dataset.len()).collect()),
        }
    }

    /// View over precomputed indices, e.g. the cached selection in app state.
    pub fn from_indices(dataset: &'a Dataset, indices: &'a [usize]) -> Self {
        View {
            dataset,
            indices: Cow::Borrowed(indices),
        }
    }

    /// Narrow this view further.
    pub fn select(&self, filters: &FilterSpec) -> View<'a> {
        View {
            dataset: self.dataset,
            indices: Cow::Owned(filter_candidates(
                self.dataset,
                self.indices.iter().copied(),
                filters,
            )),
        }
    }

    pub fn schema(&self) -> &'a Schema {
        self.dataset.schema()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn into_indices(self) -> Vec<usize> {
        self.indices.into_owned()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Selected records in order.
    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let records = self.dataset.records();
        self.indices.iter().filter_map(move |&i| records.get(i))
    }

    /// Values of one column over the selected records. Empty if the column
    /// is unknown.
    pub fn column(&self, name: &str) -> impl Iterator<Item = &'a Value> + '_ {
        let idx = self.dataset.schema().index_of(name);
        self.records()
            .filter_map(move |r| idx.and_then(|i| r.values.get(i)))
    }
}

// ---------------------------------------------------------------------------
// Command-line filters: `COL=V1,V2`
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("filter '{0}' must look like COLUMN=VALUE[,VALUE...]")]
    Syntax(String),
    #[error("filter column '{0}' is not in the dataset schema")]
    UnknownColumn(String),
    #[error("filter value '{value}' for numeric column '{column}' is not a number")]
    NotNumeric { column: String, value: String },
}

/// A parsed but not yet typed `COL=V1,V2` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterArg {
    pub column: String,
    pub values: Vec<String>,
}

impl std::str::FromStr for FilterArg {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (column, values) = s
            .split_once('=')
            .ok_or_else(|| FilterError::Syntax(s.to_string()))?;
        let column = column.trim();
        if column.is_empty() {
            return Err(FilterError::Syntax(s.to_string()));
        }
        let values = if values.is_empty() {
            Vec::new()
        } else {
            values.split(',').map(|v| v.to_string()).collect()
        };
        Ok(FilterArg {
            column: column.to_string(),
            values,
        })
    }
}

/// Type the arguments against `schema`, failing on unknown columns.
/// Repeated columns intersect.
pub fn filter_spec_from_args(schema: &Schema, args: &[FilterArg]) -> Result<FilterSpec, FilterError> {
    let mut spec = FilterSpec::new();
    for arg in args {
        let kind = schema
            .kind_of(&arg.column)
            .ok_or_else(|| FilterError::UnknownColumn(arg.column.clone()))?;
        let mut allowed = BTreeSet::new();
        for raw in &arg.values {
            allowed.insert(typed_value(kind, &arg.column, raw)?);
        }
        match spec.get_mut(&arg.column) {
            Some(existing) => existing.retain(|v| allowed.contains(v)),
            None => {
                spec.insert(arg.column.clone(), allowed);
            }
        }
    }
    Ok(spec)
}

fn typed_value(kind: ColumnKind, column: &str, raw: &str) -> Result<Value, FilterError> {
    if model::is_missing(raw) {
        return Ok(Value::Null);
    }
    match kind {
        ColumnKind::Numeric => {
            let t = raw.trim();
            if let Ok(i) = t.parse::<i64>() {
                Ok(Value::Integer(i))
            } else if let Ok(f) = t.parse::<f64>() {
                Ok(Value::number(f))
            } else {
                Err(FilterError::NotNumeric {
                    column: column.to_string(),
                    value: raw.to_string(),
                })
            }
        }
        ColumnKind::Categorical | ColumnKind::Text => Ok(Value::String(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::ColumnDef;
    use proptest::prelude::*;

    fn stream_year(rows: &[(&str, &str)]) -> Dataset {
        let schema = Schema::new(vec![
            ColumnDef::required("Stream", ColumnKind::Categorical),
            ColumnDef::required("Year", ColumnKind::Categorical),
        ]);
        let records = rows
            .iter()
            .map(|(s, y)| Record::new(vec![Value::from(*s), Value::from(*y)]))
            .collect();
        Dataset::new(schema, records)
    }

    fn spec(col: &str, values: &[&str]) -> FilterSpec {
        let mut f = FilterSpec::new();
        f.insert(col.to_string(), values.iter().map(|v| Value::from(*v)).collect());
        f
    }

    #[test]
    fn selects_matching_stream() {
        let ds = stream_year(&[("CS", "1"), ("EE", "2")]);
        let view = select(&ds, &spec("Stream", &["CS"]));
        let rows: Vec<_> = view.records().cloned().collect();
        assert_eq!(rows, vec![Record::new(vec![Value::from("CS"), Value::from("1")])]);
    }

    #[test]
    fn no_matching_rows_gives_empty() {
        let ds = stream_year(&[("CS", "1"), ("EE", "2")]);
        assert!(select(&ds, &spec("Stream", &["ME"])).is_empty());
    }

    #[test]
    fn empty_allow_list_is_not_unconstrained() {
        let ds = stream_year(&[("CS", "1"), ("EE", "2")]);
        assert!(select(&ds, &spec("Stream", &[])).is_empty());
        assert!(select(&ds, &spec("Nope", &[])).is_empty());
    }

    #[test]
    fn unknown_column_reads_as_null() {
        let ds = stream_year(&[("CS", "1"), ("EE", "2")]);
        assert!(select(&ds, &spec("Nope", &["CS"])).is_empty());

        let mut with_null = FilterSpec::new();
        with_null.insert("Nope".into(), BTreeSet::from([Value::Null]));
        assert_eq!(select(&ds, &with_null).len(), 2);
    }

    #[test]
    fn multiple_columns_intersect() {
        let ds = stream_year(&[("CS", "1"), ("CS", "2"), ("EE", "1")]);
        let mut f = spec("Stream", &["CS"]);
        f.insert("Year".into(), BTreeSet::from([Value::from("1")]));
        assert_eq!(select(&ds, &f).indices(), &[0]);
    }

    #[test]
    fn init_state_selects_everything() {
        let ds = stream_year(&[("CS", "1"), ("EE", "2"), ("CS", "3")]);
        let state = init_filter_state(&ds, &["Stream", "Missing"]);
        assert_eq!(state.len(), 1);
        assert_eq!(state["Stream"].len(), 2);
        assert_eq!(select(&ds, &state).len(), 3);
    }

    #[test]
    fn view_from_cached_indices_refines() {
        let ds = stream_year(&[("CS", "1"), ("EE", "2"), ("CS", "3")]);
        let cached = vec![1, 2];
        let view = View::from_indices(&ds, &cached);
        assert_eq!(view.select(&spec("Stream", &["CS"])).indices(), &[2]);
        let years: Vec<_> = view.column("Year").cloned().collect();
        assert_eq!(years, vec![Value::from("2"), Value::from("3")]);
    }

    #[test]
    fn parses_and_types_cli_filters() {
        let schema = Schema::new(vec![
            ColumnDef::required("Stream", ColumnKind::Categorical),
            ColumnDef::required("Hours", ColumnKind::Numeric),
        ]);
        let args: Vec<FilterArg> = ["Stream=CS,EE", "Hours=2,2.5", "Stream=EE"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let spec = filter_spec_from_args(&schema, &args).unwrap();
        assert_eq!(spec["Stream"], BTreeSet::from([Value::from("EE")]));
        assert_eq!(
            spec["Hours"],
            BTreeSet::from([Value::Integer(2), Value::Float(2.5)])
        );
    }

    #[test]
    fn numeric_filters_match_across_integer_and_float() {
        let schema = Schema::new(vec![ColumnDef::required("Hours", ColumnKind::Numeric)]);
        let ds = Dataset::new(
            schema.clone(),
            vec![
                Record::new(vec![Value::Integer(2)]),
                Record::new(vec![Value::Float(2.0)]),
                Record::new(vec![Value::Float(2.5)]),
            ],
        );
        assert_eq!(ds.unique_values("Hours").map(|u| u.len()), Some(2));

        for arg in ["Hours=2.0", "Hours=2"] {
            let filters = filter_spec_from_args(&schema, &[arg.parse().unwrap()]).unwrap();
            assert_eq!(select(&ds, &filters).indices(), &[0, 1], "{arg}");
        }
        let missing = filter_spec_from_args(&schema, &["Hours=NaN".parse().unwrap()]).unwrap();
        assert_eq!(missing["Hours"], BTreeSet::from([Value::Null]));
    }

    #[test]
    fn cli_filters_fail_fast() {
        let schema = Schema::ai_usage();
        assert_eq!("Stream".parse::<FilterArg>(), Err(FilterError::Syntax("Stream".into())));
        let unknown = filter_spec_from_args(&schema, &["Major=CS".parse().unwrap()]);
        assert_eq!(unknown, Err(FilterError::UnknownColumn("Major".into())));
        let bad = filter_spec_from_args(&schema, &["Daily_Usage_Hours=lots".parse().unwrap()]);
        assert!(matches!(bad, Err(FilterError::NotNumeric { .. })));
    }

    fn arb_dataset() -> impl Strategy<Value = Dataset> {
        prop::collection::vec(("[A-D]", "[1-4]"), 0..40).prop_map(|rows| {
            let rows: Vec<(&str, &str)> = rows.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
            stream_year(&rows)
        })
    }

    fn arb_spec() -> impl Strategy<Value = FilterSpec> {
        prop::collection::btree_map(
            prop_oneof![Just("Stream".to_string()), Just("Year".to_string())],
            prop::collection::btree_set("[A-D1-4]".prop_map(Value::String), 0..4),
            0..3,
        )
    }

    proptest! {
        /// Every selected record comes from the dataset, in order.
        #[test]
        fn selection_is_ordered_subset(ds in arb_dataset(), f in arb_spec()) {
            let view = select(&ds, &f);
            prop_assert!(view.indices().windows(2).all(|w| w[0] < w[1]));
            prop_assert!(view.indices().iter().all(|&i| i < ds.len()));
            for (&i, rec) in view.indices().iter().zip(view.records()) {
                prop_assert_eq!(&ds.records()[i], rec);
            }
        }

        /// Each selected record satisfies every constraint; each rejected one
        /// violates at least one.
        #[test]
        fn selection_matches_definition(ds in arb_dataset(), f in arb_spec()) {
            let view = select(&ds, &f);
            for (i, rec) in ds.records().iter().enumerate() {
                let expected = f.iter().all(|(col, allowed)| {
                    let idx = ds.schema().index_of(col).unwrap();
                    allowed.contains(&rec.values[idx])
                });
                prop_assert_eq!(view.indices().contains(&i), expected);
            }
        }

        #[test]
        fn empty_spec_is_identity(ds in arb_dataset()) {
            let view = select(&ds, &FilterSpec::new());
            prop_assert_eq!(view.indices().to_vec(), (0..ds.len()).collect::<Vec<_>>());
        }

        #[test]
        fn empty_allow_list_selects_nothing(ds in arb_dataset()) {
            prop_assert!(select(&ds, &spec("Year", &[])).is_empty());
        }

        #[test]
        fn selection_is_idempotent(ds in arb_dataset(), f in arb_spec()) {
            let once = select(&ds, &f);
            let twice = once.select(&f);
            prop_assert_eq!(once.indices(), twice.indices());
        }
    }
}
