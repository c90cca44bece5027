use std::collections::BTreeSet;

use super::model::{columns, Dataset, Record, Value};

// ---------------------------------------------------------------------------
// Filter criteria: the user's current selections
// ---------------------------------------------------------------------------

/// Selections collected from the filter panel on every interaction.
///
/// Empty league / position sets mean "no restriction". Thresholds are
/// inclusive minimums; 0 lets everything through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub leagues: BTreeSet<String>,
    pub positions: BTreeSet<String>,
    pub min_matches: u32,
    pub min_goals: u32,
    pub min_assists: u32,
}

impl FilterCriteria {
    /// Whether these criteria keep every row of any dataset.
    pub fn is_unrestricted(&self) -> bool {
        self.leagues.is_empty()
            && self.positions.is_empty()
            && self.min_matches == 0
            && self.min_goals == 0
            && self.min_assists == 0
    }
}

// ---------------------------------------------------------------------------
// Predicate compiled against one schema
// ---------------------------------------------------------------------------

/// Criteria resolved to column positions. Criteria naming a column the
/// dataset lacks are dropped here, which makes them vacuously true.
struct Predicate<'a> {
    sets: Vec<(usize, &'a BTreeSet<String>)>,
    minimums: Vec<(usize, f64)>,
}

impl<'a> Predicate<'a> {
    fn compile(dataset: &Dataset, criteria: &'a FilterCriteria) -> Self {
        let schema = dataset.schema();
        let sets = [
            (columns::COMP, &criteria.leagues),
            (columns::POS, &criteria.positions),
        ]
        .into_iter()
        .filter(|(_, set)| !set.is_empty())
        .filter_map(|(col, set)| schema.index_of(col).map(|i| (i, set)))
        .collect();

        let minimums = [
            (columns::MP, criteria.min_matches),
            (columns::GLS, criteria.min_goals),
            (columns::AST, criteria.min_assists),
        ]
        .into_iter()
        .filter(|(_, min)| *min > 0)
        .filter_map(|(col, min)| schema.index_of(col).map(|i| (i, f64::from(min))))
        .collect();

        Predicate { sets, minimums }
    }

    /// A null category never matches a non-empty selection; a null count
    /// is read as 0.
    fn matches(&self, record: &Record) -> bool {
        let in_sets = self.sets.iter().all(|(i, selected)| match record.get(*i) {
            Value::Null => false,
            Value::Text(s) => selected.contains(s),
            other => selected.contains(&other.to_string()),
        });
        in_sets
            && self
                .minimums
                .iter()
                .all(|(i, min)| record.get(*i).as_f64().unwrap_or(0.0) >= *min)
    }
}

/// Return the rows of `dataset` satisfying every criterion, in their
/// original order. The input is left untouched.
pub fn filter(dataset: &Dataset, criteria: &FilterCriteria) -> Dataset {
    let predicate = Predicate::compile(dataset, criteria);
    let kept: Vec<Record> = dataset
        .records()
        .iter()
        .filter(|r| predicate.matches(r))
        .cloned()
        .collect();
    log::debug!("filter kept {} of {} rows", kept.len(), dataset.len());
    dataset.with_records(kept)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::data::loader::load_csv_reader;

    fn players() -> Dataset {
        let csv = "Player,Comp,Pos,MP,Gls,Ast,Min\n\
                   A,L1,FW,10,5,2,900\n\
                   B,L1,MF,0,0,0,0\n\
                   C,L2,FW,8,3,4,700\n\
                   D,,DF,,1,0,300\n";
        load_csv_reader(csv.as_bytes(), Path::new("<test>")).unwrap()
    }

    fn names(ds: &Dataset) -> Vec<String> {
        ds.records().iter().map(|r| ds.player_name(r)).collect()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unrestricted_criteria_keep_everything() {
        let ds = players();
        let criteria = FilterCriteria::default();
        assert!(criteria.is_unrestricted());
        assert_eq!(filter(&ds, &criteria), ds);
    }

    #[test]
    fn league_selection_is_or_within_and_across() {
        let ds = players();
        let criteria = FilterCriteria {
            leagues: set(&["L1", "L2"]),
            positions: set(&["FW"]),
            ..Default::default()
        };
        assert_eq!(names(&filter(&ds, &criteria)), ["A", "C"]);
    }

    #[test]
    fn null_league_is_excluded_by_selection() {
        let ds = players();
        let criteria = FilterCriteria {
            leagues: set(&["L1"]),
            ..Default::default()
        };
        assert_eq!(names(&filter(&ds, &criteria)), ["A", "B"]);
    }

    #[test]
    fn thresholds_are_inclusive() {
        let ds = players();
        let criteria = FilterCriteria {
            min_matches: 8,
            min_assists: 2,
            ..Default::default()
        };
        assert_eq!(names(&filter(&ds, &criteria)), ["A", "C"]);

        let criteria = FilterCriteria {
            min_goals: 1,
            ..Default::default()
        };
        assert_eq!(names(&filter(&ds, &criteria)), ["A", "C", "D"]);
    }

    #[test]
    fn criteria_on_absent_columns_are_skipped() {
        let csv = "Player,Gls\nA,1\nB,3\n";
        let ds = load_csv_reader(csv.as_bytes(), Path::new("<test>")).unwrap();
        let criteria = FilterCriteria {
            leagues: set(&["L1"]),
            positions: set(&["GK"]),
            min_matches: 30,
            min_assists: 9,
            min_goals: 2,
        };
        assert_eq!(names(&filter(&ds, &criteria)), ["B"]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let ds = players();
        let criteria = FilterCriteria {
            positions: set(&["FW", "MF"]),
            min_goals: 3,
            ..Default::default()
        };
        let once = filter(&ds, &criteria);
        let twice = filter(&once, &criteria);
        assert_eq!(once, twice);
        assert!(once.len() <= ds.len());
    }

    #[test]
    fn impossible_criteria_give_empty_dataset_with_schema() {
        let ds = players();
        let criteria = FilterCriteria {
            min_goals: 100,
            ..Default::default()
        };
        let out = filter(&ds, &criteria);
        assert!(out.is_empty());
        assert_eq!(out.schema(), ds.schema());
        assert_eq!(out.metrics(), ds.metrics());
    }
}
