//! Aggregations feeding the charts: counts, summaries, binning, density,
//! correlation and least-squares fits.
//!
//! Everything here is a pure function over a [`View`] or a slice of numbers.

use crate::data::filter::View;
use crate::data::model::Value;

// ---------------------------------------------------------------------------
// Column extraction
// ---------------------------------------------------------------------------

/// `(value, count)` pairs ordered by count descending, then by value.
/// Nulls are excluded.
pub fn value_counts(view: &View<'_>, column: &str) -> Vec<(Value, usize)> {
    let mut counts: std::collections::BTreeMap<&Value, usize> = std::collections::BTreeMap::new();
    for value in view.column(column).filter(|v| !v.is_null()) {
        *counts.entry(value).or_default() += 1;
    }
    let mut out: Vec<(Value, usize)> = counts.into_iter().map(|(v, n)| (v.clone(), n)).collect();
    // Stable sort keeps the value order for ties.
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

/// Non-null numeric values of a column.
pub fn numeric_values(view: &View<'_>, column: &str) -> Vec<f64> {
    view.column(column)
        .filter_map(Value::as_f64)
        .filter(|v| v.is_finite())
        .collect()
}

/// Numeric values of `value_column` grouped by the distinct values of
/// `group_column`, groups in value order. Rows with a null group or value
/// are skipped.
pub fn grouped_values(view: &View<'_>, group_column: &str, value_column: &str) -> Vec<(Value, Vec<f64>)> {
    let schema = view.schema();
    let (Some(gi), Some(vi)) = (schema.index_of(group_column), schema.index_of(value_column)) else {
        return Vec::new();
    };
    let mut groups: std::collections::BTreeMap<Value, Vec<f64>> = std::collections::BTreeMap::new();
    for record in view.records() {
        let group = &record.values[gi];
        if group.is_null() {
            continue;
        }
        if let Some(v) = record.values[vi].as_f64().filter(|v| v.is_finite()) {
            groups.entry(group.clone()).or_default().push(v);
        }
    }
    groups.into_iter().collect()
}

/// `(x, y)` pairs of two numeric columns, grouped by `group_column` when
/// given (one unnamed group otherwise). Rows where either side is null are
/// skipped.
pub fn paired_values(
    view: &View<'_>,
    x_column: &str,
    y_column: &str,
    group_column: Option<&str>,
) -> Vec<(Value, Vec<(f64, f64)>)> {
    let schema = view.schema();
    let (Some(xi), Some(yi)) = (schema.index_of(x_column), schema.index_of(y_column)) else {
        return Vec::new();
    };
    let gi = group_column.and_then(|g| schema.index_of(g));
    let mut groups: std::collections::BTreeMap<Value, Vec<(f64, f64)>> = std::collections::BTreeMap::new();
    for record in view.records() {
        let (Some(x), Some(y)) = (record.values[xi].as_f64(), record.values[yi].as_f64()) else {
            continue;
        };
        let group = gi.map(|i| record.values[i].clone()).unwrap_or(Value::Null);
        groups.entry(group).or_default().push((x, y));
    }
    groups.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

/// Quantile of already sorted data, linear interpolation between ranks.
fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
fn quantile(values: &[f64], q: f64) -> Option<f64> {
    quantile_sorted(&sorted(values), q)
}

/// Per-column summary shown in the overview table.
#[derive(Debug, Clone, PartialEq)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

pub fn describe(values: &[f64]) -> Option<Describe> {
    let s = sorted(values);
    Some(Describe {
        count: s.len(),
        mean: mean(&s)?,
        std: std_dev(&s),
        min: *s.first()?,
        q1: quantile_sorted(&s, 0.25)?,
        median: quantile_sorted(&s, 0.5)?,
        q3: quantile_sorted(&s, 0.75)?,
        max: *s.last()?,
    })
}

/// Five-number summary for a box plot, whiskers at the furthest data point
/// within 1.5 IQR of the box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let s = sorted(values);
    let q1 = quantile_sorted(&s, 0.25)?;
    let median = quantile_sorted(&s, 0.5)?;
    let q3 = quantile_sorted(&s, 0.75)?;
    let iqr = q3 - q1;
    let lo_fence = q1 - 1.5 * iqr;
    let hi_fence = q3 + 1.5 * iqr;

    let inside = || s.iter().copied().filter(move |v| (lo_fence..=hi_fence).contains(v));
    let lower_whisker = inside().next().unwrap_or(q1);
    let upper_whisker = inside().last().unwrap_or(q3);
    let outliers = s
        .iter()
        .copied()
        .filter(|v| !(lo_fence..=hi_fence).contains(v))
        .collect();

    Some(BoxStats {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        outliers,
    })
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// Equal-width bin edges: `bins + 1` edges spanning `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinEdges {
    pub edges: Vec<f64>,
}

impl BinEdges {
    /// Edges covering `values`. A constant column gets a unit-wide range
    /// centred on its value.
    pub fn covering(values: &[f64], bins: usize) -> Option<Self> {
        let bins = bins.max(1);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        let (lo, hi) = if (max - min).abs() < f64::EPSILON {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };
        let width = (hi - lo) / bins as f64;
        let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
        Some(BinEdges { edges })
    }

    pub fn bins(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    pub fn width(&self) -> f64 {
        match (self.edges.first(), self.edges.last()) {
            (Some(lo), Some(hi)) if self.bins() > 0 => (hi - lo) / self.bins() as f64,
            _ => 0.0,
        }
    }

    pub fn center(&self, bin: usize) -> f64 {
        self.edges[bin] + self.width() / 2.0
    }

    /// Count values per bin. The last bin is closed on the right; values
    /// outside the edges and non-finite values are not counted.
    pub fn count(&self, values: &[f64]) -> Vec<usize> {
        let bins = self.bins();
        let mut counts = vec![0; bins];
        let (Some(&lo), Some(&hi)) = (self.edges.first(), self.edges.last()) else {
            return counts;
        };
        let width = self.width();
        for &v in values {
            if !v.is_finite() || v < lo || v > hi || width <= 0.0 {
                continue;
            }
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Kernel density (violin outlines)
// ---------------------------------------------------------------------------

/// Gaussian KDE with Scott's bandwidth, evaluated at `points` evenly spaced
/// positions over the data range. Returns `(position, density)` pairs.
pub fn kde(values: &[f64], points: usize) -> Vec<(f64, f64)> {
    let n = values.len();
    if n == 0 || points < 2 {
        return Vec::new();
    }
    let sigma = std_dev(values).unwrap_or(0.0);
    let bandwidth = if sigma > 0.0 {
        sigma * (n as f64).powf(-0.2)
    } else {
        1.0
    };
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let step = (max - min) / (points - 1) as f64;
    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());

    (0..points)
        .map(|i| {
            let x = min + step * i as f64;
            let density: f64 = values
                .iter()
                .map(|v| {
                    let u = (x - v) / bandwidth;
                    (-0.5 * u * u).exp()
                })
                .sum();
            (x, density * norm)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Correlation and regression
// ---------------------------------------------------------------------------

/// Pearson correlation of paired samples. `None` when fewer than two pairs or
/// either side is constant.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let mx = mean(&xs[..n])?;
    let my = mean(&ys[..n])?;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Square matrix of pairwise Pearson correlations over rows where both
/// columns are non-null.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

pub fn correlation_matrix(view: &View<'_>, columns: &[&str]) -> CorrelationMatrix {
    let schema = view.schema();
    let idx: Vec<Option<usize>> = columns.iter().map(|c| schema.index_of(c)).collect();
    let rows: Vec<Vec<Option<f64>>> = view
        .records()
        .map(|r| {
            idx.iter()
                .map(|i| i.and_then(|i| r.values[i].as_f64()))
                .collect()
        })
        .collect();

    let k = columns.len();
    let mut values = vec![vec![None; k]; k];
    for a in 0..k {
        for b in a..k {
            let (xs, ys): (Vec<f64>, Vec<f64>) = rows
                .iter()
                .filter_map(|r| Some((r[a]?, r[b]?)))
                .unzip();
            let r = pearson(&xs, &ys);
            values[a][b] = r;
            values[b][a] = r;
        }
    }

    CorrelationMatrix {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        values,
    }
}

/// Ordinary least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let mx = mean(&xs[..n])?;
    let my = mean(&ys[..n])?;
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
    }
    if sxx <= 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: my - slope * mx,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Dataset, Record};
    use crate::data::schema::{ColumnDef, ColumnKind, Schema};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn students() -> Dataset {
        let schema = Schema::new(vec![
            ColumnDef::required("gender", ColumnKind::Categorical),
            ColumnDef::required("math", ColumnKind::Numeric),
            ColumnDef::required("score", ColumnKind::Numeric),
            ColumnDef::required("noise", ColumnKind::Numeric),
        ]);
        let rows = [
            ("female", 50, 100.0, 1),
            ("male", 60, 120.0, 1),
            ("female", 70, 140.0, 1),
            ("male", 80, 160.0, 1),
        ];
        let records = rows
            .iter()
            .map(|(g, m, s, n)| {
                Record::new(vec![
                    Value::from(*g),
                    Value::Integer(*m),
                    Value::Float(*s),
                    Value::Integer(*n),
                ])
            })
            .collect();
        Dataset::new(schema, records)
    }

    #[test]
    fn value_counts_orders_by_count_then_value() {
        let ds = Dataset::new(
            Schema::new(vec![ColumnDef::required("c", ColumnKind::Categorical)]),
            ["b", "a", "c", "c", "b"]
                .iter()
                .map(|v| Record::new(vec![Value::from(*v)]))
                .chain(std::iter::once(Record::new(vec![Value::Null])))
                .collect(),
        );
        let counts = value_counts(&View::all(&ds), "c");
        assert_eq!(
            counts,
            vec![(Value::from("b"), 2), (Value::from("c"), 2), (Value::from("a"), 1)]
        );
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert!(close(quantile(&v, 0.5).unwrap(), 2.5));
        assert!(close(quantile(&v, 0.25).unwrap(), 1.75));
        assert!(close(quantile(&v, 1.0).unwrap(), 4.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn describe_matches_hand_computation() {
        let d = describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(d.count, 8);
        assert!(close(d.mean, 5.0));
        assert!(close(d.std.unwrap(), (32.0f64 / 7.0).sqrt()));
        assert!(close(d.min, 2.0));
        assert!(close(d.max, 9.0));
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn box_whiskers_stop_at_last_point_inside_fences() {
        let stats = box_stats(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        assert!(close(stats.q1, 2.25));
        assert!(close(stats.q3, 4.75));
        assert!(close(stats.upper_whisker, 5.0));
        assert!(close(stats.lower_whisker, 1.0));
        assert_eq!(stats.outliers, vec![100.0]);
    }

    #[test]
    fn histogram_closes_last_bin() {
        let edges = BinEdges::covering(&[0.0, 10.0], 5).unwrap();
        assert_eq!(edges.bins(), 5);
        assert!(close(edges.width(), 2.0));
        assert_eq!(edges.count(&[0.0, 1.9, 2.0, 10.0, 11.0]), vec![2, 1, 0, 0, 1]);
        let constant = BinEdges::covering(&[3.0, 3.0], 4).unwrap();
        assert_eq!(constant.count(&[3.0, 3.0]).iter().sum::<usize>(), 2);
        assert!(BinEdges::covering(&[], 4).is_none());
    }

    #[test]
    fn histogram_skips_non_finite_values() {
        let edges = BinEdges::covering(&[10.0, 20.0], 2).unwrap();
        let counts = edges.count(&[10.0, f64::NAN, 20.0, f64::INFINITY]);
        assert_eq!(counts, vec![1, 1]);
    }

    #[test]
    fn kde_integrates_to_about_one() {
        let values: Vec<f64> = (0..200).map(|i| (i % 20) as f64).collect();
        let curve = kde(&values, 400);
        let step = curve[1].0 - curve[0].0;
        let area: f64 = curve.iter().map(|(_, d)| d * step).sum();
        // Tails beyond the data range are cut off.
        assert!(area > 0.8 && area <= 1.0, "area = {area}");
    }

    #[test]
    fn correlation_detects_perfect_and_undefined() {
        let ds = students();
        let m = correlation_matrix(&View::all(&ds), &["math", "score", "noise"]);
        assert!(close(m.values[0][1].unwrap(), 1.0));
        assert!(close(m.values[1][0].unwrap(), 1.0));
        assert!(close(m.values[0][0].unwrap(), 1.0));
        assert_eq!(m.values[2][0], None, "constant column has no correlation");
        assert!(close(pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap(), -1.0));
    }

    #[test]
    fn linear_fit_recovers_exact_line() {
        let fit = linear_fit(&[50.0, 60.0, 70.0, 80.0], &[100.0, 120.0, 140.0, 160.0]).unwrap();
        assert!(close(fit.slope, 2.0));
        assert!(close(fit.intercept, 0.0));
        assert!(close(fit.at(65.0), 130.0));
        assert!(linear_fit(&[1.0, 1.0], &[2.0, 3.0]).is_none());
    }

    #[test]
    fn paired_values_skip_nulls_and_group() {
        let ds = students();
        let pairs = paired_values(&View::all(&ds), "math", "score", Some("gender"));
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1], (Value::from("male"), vec![(60.0, 120.0), (80.0, 160.0)]));
        let ungrouped = paired_values(&View::all(&ds), "math", "score", None);
        assert_eq!(ungrouped[0].1.len(), 4);
    }

    #[test]
    fn grouped_values_split_by_category() {
        let ds = students();
        let groups = grouped_values(&View::all(&ds), "gender", "math");
        assert_eq!(
            groups,
            vec![
                (Value::from("female"), vec![50.0, 70.0]),
                (Value::from("male"), vec![60.0, 80.0]),
            ]
        );
    }
}
