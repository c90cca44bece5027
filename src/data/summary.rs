//! Aggregations over a (filtered) dataset.
//!
//! Every function here is total: empty datasets and absent columns produce
//! documented neutral results (0, empty vectors, [`Extreme::placeholder`])
//! instead of errors, so the dashboard can always render something.

use std::collections::BTreeMap;

use super::model::{columns, ColumnType, Dataset, Field, Record, Value};

/// Age bands used by the dashboard: `(0,22]`, `(22,25]`, `(25,28]`,
/// `(28,32]`, `(32,50]`.
pub const AGE_BOUNDARIES: [f64; 6] = [0.0, 22.0, 25.0, 28.0, 32.0, 50.0];
pub const AGE_LABELS: [&str; 5] = ["18-22", "23-25", "26-28", "29-32", "33+"];
pub const AGE_GROUP_COLUMN: &str = "age_group";

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

pub fn count(dataset: &Dataset) -> usize {
    dataset.len()
}

/// Sum of the non-null cells; 0 when the column is absent.
pub fn sum_column(dataset: &Dataset, column: &str) -> f64 {
    dataset.numbers(column).iter().sum()
}

/// Mean of the non-null cells; 0 when there are none.
pub fn mean_column(dataset: &Dataset, column: &str) -> f64 {
    mean(&dataset.numbers(column))
}

pub fn median_column(dataset: &Dataset, column: &str) -> f64 {
    let mut values = dataset.numbers(column);
    values.sort_by(f64::total_cmp);
    quantile(&values, 0.5)
}

/// Largest value of the column; 0 when there are none.
pub fn max_column(dataset: &Dataset, column: &str) -> f64 {
    dataset
        .numbers(column)
        .into_iter()
        .reduce(f64::max)
        .unwrap_or(0.0)
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Linear-interpolated quantile of sorted values; 0 for an empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        }
    }
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Sorted distinct non-null values of a column, as display strings.
pub fn distinct_values(dataset: &Dataset, column: &str) -> Vec<String> {
    let Some(cells) = dataset.column(column) else {
        return Vec::new();
    };
    let mut unique: Vec<&Value> = cells.filter(|v| !v.is_null()).collect();
    unique.sort();
    unique.dedup();
    unique.into_iter().map(Value::to_string).collect()
}

/// Row count per distinct value, most frequent first (ties by value).
pub fn value_counts(dataset: &Dataset, column: &str) -> Vec<(String, usize)> {
    let Some(cells) = dataset.column(column) else {
        return Vec::new();
    };
    let mut counts: BTreeMap<&Value, usize> = BTreeMap::new();
    for v in cells.filter(|v| !v.is_null()) {
        *counts.entry(v).or_default() += 1;
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(v, n)| (v.to_string(), n))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    out
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// How [`group_mean`] / [`group_sum`] order their groups.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupOrder {
    /// Natural order of the group key.
    Key,
    /// The given labels first, in that order; any other key after them.
    Labels(Vec<String>),
    /// Descending by the aggregate of the value column at this position,
    /// ties in key order.
    Descending(usize),
}

/// One group of an aggregation. `values` follows the order of the value
/// columns that were asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub key: String,
    pub rows: usize,
    pub values: Vec<f64>,
}

/// Per-group mean of each value column. Rows with a null key are left out;
/// a value column that is absent or all-null in a group averages to 0.
pub fn group_mean(
    dataset: &Dataset,
    group_column: &str,
    value_columns: &[&str],
    order: GroupOrder,
) -> Vec<Group> {
    aggregate(dataset, group_column, value_columns, order, mean)
}

/// Per-group sum of each value column.
pub fn group_sum(
    dataset: &Dataset,
    group_column: &str,
    value_columns: &[&str],
    order: GroupOrder,
) -> Vec<Group> {
    aggregate(dataset, group_column, value_columns, order, |v| v.iter().sum())
}

/// Collected cells of one group: row count and non-null values per column.
type Bucket = (usize, Vec<Vec<f64>>);

fn partition<'a>(
    dataset: &'a Dataset,
    group_column: &str,
    value_columns: &[&str],
) -> BTreeMap<&'a Value, Bucket> {
    let mut buckets: BTreeMap<&Value, Bucket> = BTreeMap::new();
    let Some(key_idx) = dataset.schema().index_of(group_column) else {
        return buckets;
    };
    let value_idx: Vec<Option<usize>> = value_columns
        .iter()
        .map(|c| dataset.schema().index_of(c))
        .collect();

    for record in dataset.records() {
        let key = record.get(key_idx);
        if key.is_null() {
            continue;
        }
        let (rows, cols) = buckets
            .entry(key)
            .or_insert_with(|| (0, vec![Vec::new(); value_columns.len()]));
        *rows += 1;
        for (slot, idx) in cols.iter_mut().zip(&value_idx) {
            if let Some(v) = idx.and_then(|i| record.get(i).as_f64()) {
                slot.push(v);
            }
        }
    }
    buckets
}

fn aggregate(
    dataset: &Dataset,
    group_column: &str,
    value_columns: &[&str],
    order: GroupOrder,
    reduce: impl Fn(&[f64]) -> f64,
) -> Vec<Group> {
    let groups: Vec<Group> = partition(dataset, group_column, value_columns)
        .into_iter()
        .map(|(key, (rows, cols))| Group {
            key: key.to_string(),
            rows,
            values: cols.iter().map(|c| reduce(c.as_slice())).collect(),
        })
        .collect();
    order_groups(groups, &order)
}

fn order_groups(mut groups: Vec<Group>, order: &GroupOrder) -> Vec<Group> {
    match order {
        GroupOrder::Key => {}
        GroupOrder::Labels(labels) => {
            let rank = |g: &Group| {
                labels
                    .iter()
                    .position(|l| *l == g.key)
                    .unwrap_or(labels.len())
            };
            groups.sort_by_key(rank);
        }
        GroupOrder::Descending(i) => {
            let at = |g: &Group| g.values.get(*i).copied().unwrap_or(0.0);
            groups.sort_by(|a, b| at(b).total_cmp(&at(a)));
        }
    }
    groups
}

// ---------------------------------------------------------------------------
// Distributions
// ---------------------------------------------------------------------------

/// Five-number summary with whiskers at 1.5 × IQR, as in a standard box
/// plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub count: usize,
}

impl BoxStats {
    /// `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<BoxStats> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let reach = 1.5 * (q3 - q1);
        let lower_whisker = sorted
            .iter()
            .copied()
            .find(|v| *v >= q1 - reach)
            .unwrap_or(q1);
        let upper_whisker = sorted
            .iter()
            .rev()
            .copied()
            .find(|v| *v <= q3 + reach)
            .unwrap_or(q3);
        Some(BoxStats {
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
            count: sorted.len(),
        })
    }
}

/// Distribution of one group, with the raw values for jittered overlays.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBox {
    pub key: String,
    pub stats: BoxStats,
    pub values: Vec<f64>,
}

/// Box statistics of `value_column` per group, highest median first.
/// With `upper_cutoff`, values at or above it are dropped as outliers.
pub fn group_box_stats(
    dataset: &Dataset,
    group_column: &str,
    value_column: &str,
    upper_cutoff: Option<f64>,
) -> Vec<GroupBox> {
    let mut boxes: Vec<GroupBox> = partition(dataset, group_column, &[value_column])
        .into_iter()
        .filter_map(|(key, (_, mut cols))| {
            let mut values = cols.pop().unwrap_or_default();
            if let Some(cutoff) = upper_cutoff {
                values.retain(|v| *v < cutoff);
            }
            let stats = BoxStats::from_values(&values)?;
            Some(GroupBox {
                key: key.to_string(),
                stats,
                values,
            })
        })
        .collect();
    boxes.sort_by(|a, b| b.stats.median.total_cmp(&a.stats.median));
    boxes
}

// ---------------------------------------------------------------------------
// Rankings
// ---------------------------------------------------------------------------

/// The `n` rows with the largest `value_column`, descending. Ties keep input
/// order and nulls come last. Without the column, the first `n` rows.
pub fn top_n(dataset: &Dataset, value_column: &str, n: usize) -> Dataset {
    let Some(idx) = dataset.schema().index_of(value_column) else {
        return head(dataset, n);
    };
    let mut ranked: Vec<&Record> = dataset.records().iter().collect();
    // stable: equal keys keep their relative order
    ranked.sort_by(|a, b| match (a.get(idx).as_f64(), b.get(idx).as_f64()) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    dataset.with_records(ranked.into_iter().take(n).cloned().collect())
}

/// First `n` rows.
pub fn head(dataset: &Dataset, n: usize) -> Dataset {
    dataset.with_records(dataset.records().iter().take(n).cloned().collect())
}

/// Rows with a value in every listed column. An absent column drops every
/// row.
pub fn complete_rows(dataset: &Dataset, required: &[&str]) -> Dataset {
    let Some(indices) = required
        .iter()
        .map(|c| dataset.schema().index_of(c))
        .collect::<Option<Vec<usize>>>()
    else {
        return dataset.with_records(Vec::new());
    };
    let kept = dataset
        .records()
        .iter()
        .filter(|r| {
            indices.iter().all(|i| match r.get(*i) {
                Value::Null => false,
                Value::Float(v) => !v.is_nan(),
                _ => true,
            })
        })
        .cloned()
        .collect();
    dataset.with_records(kept)
}

/// The row holding the maximum of a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Extreme {
    pub player: String,
    pub value: f64,
    /// Position in the input; `None` for the placeholder.
    pub index: Option<usize>,
}

impl Extreme {
    /// Returned when no row has a value: `("N/A", 0)`.
    pub fn placeholder() -> Self {
        Extreme {
            player: "N/A".to_string(),
            value: 0.0,
            index: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.index.is_none()
    }
}

/// Row with the largest `value_column`; the first one wins a tie.
pub fn extreme_row(dataset: &Dataset, value_column: &str) -> Extreme {
    let Some(idx) = dataset.schema().index_of(value_column) else {
        return Extreme::placeholder();
    };
    let mut best: Option<(usize, f64)> = None;
    for (i, record) in dataset.records().iter().enumerate() {
        let Some(v) = record.get(idx).as_f64() else {
            continue;
        };
        if best.map_or(true, |(_, b)| v > b) {
            best = Some((i, v));
        }
    }
    match best {
        Some((i, value)) => Extreme {
            player: dataset.player_name(&dataset.records()[i]),
            value,
            index: Some(i),
        },
        None => Extreme::placeholder(),
    }
}

// ---------------------------------------------------------------------------
// Binning
// ---------------------------------------------------------------------------

/// Add a text column `target` labelling each row with the half-open
/// interval `(boundaries[i], boundaries[i + 1]]` its `numeric_column` falls
/// in. Rows outside every interval, or whose interval has no label, get
/// null.
pub fn bin(
    dataset: &Dataset,
    numeric_column: &str,
    boundaries: &[f64],
    labels: &[&str],
    target: &str,
) -> Dataset {
    if boundaries.len().saturating_sub(1) != labels.len() {
        log::warn!(
            "binning '{numeric_column}' with {} boundaries but {} labels",
            boundaries.len(),
            labels.len()
        );
    }
    let values = dataset
        .records()
        .iter()
        .map(|r| {
            dataset
                .value(r, numeric_column)
                .as_f64()
                .and_then(|v| bin_index(boundaries, v))
                .and_then(|i| labels.get(i))
                .map(|l| Value::Text(l.to_string()))
                .unwrap_or(Value::Null)
        })
        .collect();
    dataset.with_column(Field::new(target, ColumnType::Text), values)
}

fn bin_index(boundaries: &[f64], value: f64) -> Option<usize> {
    boundaries
        .windows(2)
        .position(|w| value > w[0] && value <= w[1])
}

/// Convenience for the dashboard's age bands, stored in [`AGE_GROUP_COLUMN`].
pub fn age_groups(dataset: &Dataset) -> Dataset {
    bin(
        dataset,
        columns::AGE,
        &AGE_BOUNDARIES,
        &AGE_LABELS,
        AGE_GROUP_COLUMN,
    )
}

// ---------------------------------------------------------------------------
// Regression
// ---------------------------------------------------------------------------

/// `y = slope * x + intercept`, fitted by ordinary least squares.
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

/// Least-squares line through the rows where both columns are numeric.
/// `None` with fewer than two such rows or when `x` is constant.
pub fn linear_fit(dataset: &Dataset, x_column: &str, y_column: &str) -> Option<LinearFit> {
    let x_idx = dataset.schema().index_of(x_column)?;
    let y_idx = dataset.schema().index_of(y_column)?;
    let points: Vec<(f64, f64)> = dataset
        .records()
        .iter()
        .filter_map(|r| Some((r.get(x_idx).as_f64()?, r.get(y_idx).as_f64()?)))
        .collect();
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|p| (p.0 - mean_x).powi(2)).sum();
    let sxy: f64 = points
        .iter()
        .map(|p| (p.0 - mean_x) * (p.1 - mean_y))
        .sum();
    if sxx <= f64::EPSILON {
        return None;
    }
    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::data::loader::load_csv_reader;

    fn parse(csv: &str) -> Dataset {
        load_csv_reader(csv.as_bytes(), Path::new("<test>")).unwrap()
    }

    fn players() -> Dataset {
        parse(
            "Player,Comp,Pos,MP,Gls,Ast,Min,Age\n\
             A,L1,FW,10,5,2,900,22\n\
             B,L1,MF,0,0,0,0,23\n\
             C,L2,FW,8,3,4,700,50\n\
             D,L2,DF,12,5,1,1000,0\n\
             E,L3,GK,30,,0,2700,\n",
        )
    }

    fn empty() -> Dataset {
        let ds = players();
        ds.with_records(Vec::new())
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn scalars_skip_nulls() {
        let ds = players();
        assert_eq!(count(&ds), 5);
        assert!(close(sum_column(&ds, "Gls"), 13.0));
        assert!(close(mean_column(&ds, "Gls"), 3.25));
        assert!(close(median_column(&ds, "Gls"), 4.0));
        assert!(close(max_column(&ds, "MP"), 30.0));
    }

    #[test]
    fn scalars_on_empty_or_absent_are_zero() {
        let ds = empty();
        assert_eq!(count(&ds), 0);
        assert_eq!(sum_column(&ds, "Gls"), 0.0);
        assert_eq!(mean_column(&ds, "Gls"), 0.0);
        assert_eq!(median_column(&ds, "Gls"), 0.0);
        assert_eq!(max_column(&ds, "Gls"), 0.0);
        assert_eq!(mean_column(&players(), "xG"), 0.0);
    }

    #[test]
    fn group_mean_orders_by_key_or_value() {
        let ds = players();
        let by_key = group_mean(&ds, "Comp", &["Gls", "Ast"], GroupOrder::Key);
        let keys: Vec<&str> = by_key.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, ["L1", "L2", "L3"]);
        assert!(close(by_key[0].values[0], 2.5));
        assert!(close(by_key[1].values[1], 2.5));
        // L3 has no goal values at all
        assert_eq!(by_key[2].values[0], 0.0);
        assert_eq!(by_key[2].rows, 1);

        let by_goals = group_sum(&ds, "Comp", &["Gls"], GroupOrder::Descending(0));
        let keys: Vec<&str> = by_goals.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, ["L2", "L1", "L3"]);
        assert!(close(by_goals[0].values[0], 8.0));
    }

    #[test]
    fn group_mean_on_empty_is_empty() {
        assert!(group_mean(&empty(), "Comp", &["Gls"], GroupOrder::Key).is_empty());
        assert!(group_mean(&players(), "Team", &["Gls"], GroupOrder::Key).is_empty());
    }

    #[test]
    fn labelled_order_is_not_alphabetical() {
        let ds = parse("Age,Gls\n33,1\n20,2\n27,3\n");
        let labels = ["young", "prime", "veteran"];
        let binned = bin(&ds, "Age", &[0.0, 25.0, 30.0, 50.0], &labels, "band");
        let order = GroupOrder::Labels(labels.iter().map(|s| s.to_string()).collect());
        let groups = group_mean(&binned, "band", &["Gls"], order);
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, ["young", "prime", "veteran"]);
        assert!(close(groups[1].values[0], 3.0));
    }

    #[test]
    fn top_n_is_stable_and_bounded() {
        let ds = players();
        let top = top_n(&ds, "Gls", 3);
        let names: Vec<String> = top.records().iter().map(|r| top.player_name(r)).collect();
        assert_eq!(names, ["A", "D", "C"]);

        let all = top_n(&ds, "Gls", 10);
        assert_eq!(all.len(), 5);
        // null goals rank last
        assert_eq!(all.player_name(&all.records()[4]), "E");

        assert!(top_n(&empty(), "Gls", 10).is_empty());
    }

    #[test]
    fn nan_cells_rank_like_nulls() {
        use crate::data::model::Schema;

        let schema = Schema::new(vec![
            Field::new("Player", ColumnType::Text),
            Field::new("Gls", ColumnType::Float),
        ]);
        let row = |name: &str, gls: f64| {
            Record::new(vec![Value::Text(name.into()), Value::Float(gls)])
        };
        let ds = Dataset::new(schema, vec![row("X", f64::NAN), row("A", 5.0), row("B", 3.0)]);

        assert_eq!(extreme_row(&ds, "Gls").player, "A");
        let ranked = top_n(&ds, "Gls", 3);
        let names: Vec<String> = ranked.records().iter().map(|r| ranked.player_name(r)).collect();
        assert_eq!(names, ["A", "B", "X"]);
        assert!(close(mean_column(&ds, "Gls"), 4.0));
    }

    #[test]
    fn complete_rows_drop_missing_cells() {
        let ds = players();
        let kept = complete_rows(&ds, &["Gls", "Age"]);
        let names: Vec<String> = kept.records().iter().map(|r| kept.player_name(r)).collect();
        assert_eq!(names, ["A", "B", "C", "D"]);
        assert!(complete_rows(&ds, &["Gls", "Nation"]).is_empty());
    }

    #[test]
    fn extreme_row_takes_first_of_ties() {
        let ds = players();
        let best = extreme_row(&ds, "Gls");
        assert_eq!(best.player, "A");
        assert_eq!(best.index, Some(0));
        assert!(close(best.value, 5.0));

        let none = extreme_row(&empty(), "Gls");
        assert!(none.is_placeholder());
        assert_eq!(none.player, "N/A");
        assert_eq!(none.value, 0.0);
    }

    #[test]
    fn binning_uses_half_open_intervals() {
        let binned = age_groups(&players());
        let labels: Vec<Value> = binned
            .column(AGE_GROUP_COLUMN)
            .unwrap()
            .cloned()
            .collect();
        assert_eq!(
            labels,
            vec![
                Value::Text("18-22".into()),
                Value::Text("23-25".into()),
                Value::Text("33+".into()),
                Value::Null,
                Value::Null,
            ]
        );
        assert!(!players().has_column(AGE_GROUP_COLUMN));
    }

    #[test]
    fn binning_tolerates_short_label_lists() {
        let ds = parse("Age\n10\n30\n");
        let binned = bin(&ds, "Age", &[0.0, 20.0, 40.0], &["young"], "band");
        let labels: Vec<Value> = binned.column("band").unwrap().cloned().collect();
        assert_eq!(labels, vec![Value::Text("young".into()), Value::Null]);
    }

    #[test]
    fn box_stats_interpolate_quartiles() {
        let stats = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert!(close(stats.q1, 2.0));
        assert!(close(stats.median, 3.0));
        assert!(close(stats.q3, 4.0));
        assert!(close(stats.lower_whisker, 1.0));
        // 100 lies beyond q3 + 1.5 * IQR
        assert!(close(stats.upper_whisker, 4.0));
        assert!(BoxStats::from_values(&[]).is_none());
    }

    #[test]
    fn group_boxes_sorted_by_median_with_cutoff() {
        let ds = parse(
            "Comp,goals\nL1,0.1\nL1,0.2\nL2,0.5\nL2,0.7\nL2,6.0\nL3,9.0\n",
        );
        let boxes = group_box_stats(&ds, "Comp", "goals", Some(5.0));
        let keys: Vec<&str> = boxes.iter().map(|b| b.key.as_str()).collect();
        // L3 has nothing left under the cut-off
        assert_eq!(keys, ["L2", "L1"]);
        assert_eq!(boxes[0].values, vec![0.5, 0.7]);
    }

    #[test]
    fn categories() {
        let ds = players();
        assert_eq!(distinct_values(&ds, "Pos"), ["DF", "FW", "GK", "MF"]);
        assert_eq!(value_counts(&ds, "Comp")[0], ("L1".to_string(), 2));
        assert!(distinct_values(&ds, "Team").is_empty());
    }

    #[test]
    fn least_squares_line() {
        let ds = parse("x,y\n1,3\n2,5\n3,7\n");
        let fit = linear_fit(&ds, "x", "y").unwrap();
        assert!(close(fit.slope, 2.0));
        assert!(close(fit.intercept, 1.0));
        assert!(close(fit.at(10.0), 21.0));

        let flat = parse("x,y\n2,3\n2,5\n");
        assert!(linear_fit(&flat, "x", "y").is_none());
        assert!(linear_fit(&empty(), "Gls", "Ast").is_none());
    }
}
