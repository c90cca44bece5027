use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use soccerstat::config::DashboardConfig;
use soccerstat::data::summary::{self, Extreme};
use soccerstat::data::{cache, columns, filter, Dataset, DerivedMetric, Diagnostic, FilterCriteria};

use crate::color::CategoryColors;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which multi-select a toggle applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    League,
    Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    GoalsVsAssists,
    GoalsPerMatch,
    AgeGroups,
    Data,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Overview,
        Tab::GoalsVsAssists,
        Tab::GoalsPerMatch,
        Tab::AgeGroups,
        Tab::Data,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::GoalsVsAssists => "Goals vs Assists",
            Tab::GoalsPerMatch => "Goals per match by league",
            Tab::AgeGroups => "Age groups",
            Tab::Data => "Data",
        }
    }
}

/// Choices offered by the filter panel, taken from the full dataset.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    pub leagues: Vec<String>,
    pub positions: Vec<String>,
    pub max_matches: u32,
    pub max_goals: u32,
    pub max_assists: u32,
}

/// Headline numbers of the filtered view.
#[derive(Debug, Clone)]
pub struct Badges {
    pub players: usize,
    pub goals: f64,
    pub assists: f64,
    /// `None` when goals per match could not be derived.
    pub mean_goals_per_match: Option<f64>,
    pub top_scorer: Extreme,
}

impl Default for Badges {
    fn default() -> Self {
        Self {
            players: 0,
            goals: 0.0,
            assists: 0.0,
            mean_goals_per_match: None,
            top_scorer: Extreme::placeholder(),
        }
    }
}

impl Badges {
    fn compute(view: &Dataset) -> Self {
        let gpm = DerivedMetric::GoalsPerMatch;
        Self {
            players: summary::count(view),
            goals: summary::sum_column(view, columns::GLS),
            assists: summary::sum_column(view, columns::AST),
            mean_goals_per_match: view
                .has_metric(gpm)
                .then(|| summary::mean_column(view, gpm.column())),
            top_scorer: summary::extreme_row(view, columns::GLS),
        }
    }

    pub fn mean_goals_per_match_text(&self) -> String {
        format!("{:.2}", self.mean_goals_per_match.unwrap_or(0.0))
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Path of the loaded dataset.
    pub source: Option<PathBuf>,

    /// Loaded dataset, shared with the process-wide cache.
    pub dataset: Option<Arc<Dataset>>,

    /// Current filter selections.
    pub criteria: FilterCriteria,

    /// Rows passing the current filters (recomputed on every change).
    pub filtered: Dataset,

    pub options: FilterOptions,
    pub badges: Badges,
    pub position_colors: CategoryColors,
    pub league_colors: CategoryColors,

    pub tab: Tab,

    /// Drop goals-per-match outliers from the box plot.
    pub remove_outliers: bool,

    /// Blocking error shown instead of the dashboard.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            source: None,
            dataset: None,
            criteria: FilterCriteria::default(),
            filtered: Dataset::default(),
            options: FilterOptions::default(),
            badges: Badges::default(),
            position_colors: CategoryColors::default(),
            league_colors: CategoryColors::default(),
            tab: Tab::Overview,
            remove_outliers: true,
            status_message: None,
        }
    }

    /// Load `path` through the dataset cache. A failure clears the dashboard
    /// and leaves only the error message.
    pub fn open(&mut self, path: PathBuf) {
        match cache::load(&path) {
            Ok(dataset) => self.set_dataset(path, dataset),
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.dataset = None;
                self.filtered = Dataset::default();
                self.badges = Badges::default();
                self.source = Some(path);
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Drop the cached copy of the current file and read it again.
    pub fn reload(&mut self) {
        if let Some(path) = self.source.clone() {
            cache::invalidate(&path);
            self.open(path);
        }
    }

    /// Ingest a newly loaded dataset and reset colours. Filters are reset
    /// for a new file and kept when the same file is loaded again.
    pub fn set_dataset(&mut self, path: PathBuf, dataset: Arc<Dataset>) {
        let options = FilterOptions {
            leagues: summary::distinct_values(&dataset, columns::COMP),
            positions: summary::distinct_values(&dataset, columns::POS),
            max_matches: summary::max_column(&dataset, columns::MP) as u32,
            max_goals: summary::max_column(&dataset, columns::GLS) as u32,
            max_assists: summary::max_column(&dataset, columns::AST) as u32,
        };
        for diagnostic in dataset.diagnostics() {
            log::warn!("{}: {diagnostic}", path.display());
        }

        if self.source.as_deref() == Some(path.as_path()) {
            // same file again: keep the selections that still make sense
            let criteria = &mut self.criteria;
            criteria.leagues.retain(|l| options.leagues.contains(l));
            criteria.positions.retain(|p| options.positions.contains(p));
            criteria.min_matches = criteria.min_matches.min(options.max_matches);
            criteria.min_goals = criteria.min_goals.min(options.max_goals);
            criteria.min_assists = criteria.min_assists.min(options.max_assists);
        } else {
            self.criteria = FilterCriteria {
                min_matches: self.config.min_matches.min(options.max_matches),
                ..FilterCriteria::default()
            };
        }
        self.position_colors = CategoryColors::new(&options.positions);
        self.league_colors = CategoryColors::new(&options.leagues);
        self.options = options;
        self.dataset = Some(dataset);
        self.source = Some(path);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute the filtered view and badges after a filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.filtered = filter(ds, &self.criteria);
            self.badges = Badges::compute(&self.filtered);
        }
    }

    fn selection(&self, which: Selection) -> (&BTreeSet<String>, &[String]) {
        match which {
            Selection::League => (&self.criteria.leagues, &self.options.leagues),
            Selection::Position => (&self.criteria.positions, &self.options.positions),
        }
    }

    fn selection_mut(&mut self, which: Selection) -> (&mut BTreeSet<String>, &[String]) {
        match which {
            Selection::League => (&mut self.criteria.leagues, &self.options.leagues),
            Selection::Position => (&mut self.criteria.positions, &self.options.positions),
        }
    }

    /// An empty selection means "everything", so every box shows checked.
    pub fn is_selected(&self, which: Selection, value: &str) -> bool {
        let (selected, _) = self.selection(which);
        selected.is_empty() || selected.contains(value)
    }

    /// Toggle one value. Unchecking from the implicit "everything" state
    /// selects all the others; re-selecting every value collapses back to
    /// the empty set.
    pub fn toggle(&mut self, which: Selection, value: &str) {
        let (selected, all) = self.selection_mut(which);
        if selected.is_empty() {
            selected.extend(all.iter().cloned());
        }
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        if selected.len() == all.len() {
            selected.clear();
        }
        self.refilter();
    }

    /// Clear a selection, i.e. no restriction.
    pub fn select_all(&mut self, which: Selection) {
        self.selection_mut(which).0.clear();
        self.refilter();
    }

    /// Load-time schema warnings plus the empty-result warning.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let Some(ds) = &self.dataset else {
            return Vec::new();
        };
        let mut out = ds.diagnostics().to_vec();
        if self.filtered.is_empty() {
            out.push(Diagnostic::EmptyResult);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use soccerstat::data::loader::load_csv_reader;

    use super::*;

    fn state() -> AppState {
        let csv = "Player,Comp,Pos,Nation,MP,Min,Gls,Ast\n\
                   A,L1,FW,FR,10,900,5,2\n\
                   B,L1,MF,ES,0,0,0,0\n\
                   C,L2,FW,DE,8,700,3,4\n";
        let ds = load_csv_reader(csv.as_bytes(), Path::new("<test>")).unwrap();
        let mut state = AppState::new(DashboardConfig::default());
        state.set_dataset(PathBuf::from("<test>"), Arc::new(ds));
        state
    }

    #[test]
    fn starts_unfiltered() {
        let s = state();
        assert_eq!(s.filtered.len(), 3);
        assert_eq!(s.badges.players, 3);
        assert_eq!(s.badges.goals, 8.0);
        assert_eq!(s.badges.top_scorer.player, "A");
        assert_eq!(s.options.leagues, ["L1", "L2"]);
        assert_eq!(s.options.max_goals, 5);
        assert!(s.diagnostics().is_empty());
    }

    #[test]
    fn unchecking_from_everything_keeps_the_rest() {
        let mut s = state();
        s.toggle(Selection::League, "L2");
        assert_eq!(s.criteria.leagues.len(), 1);
        assert!(s.is_selected(Selection::League, "L1"));
        assert!(!s.is_selected(Selection::League, "L2"));
        assert_eq!(s.badges.players, 2);
        assert_eq!(s.badges.goals, 5.0);

        s.toggle(Selection::League, "L2");
        assert!(s.criteria.leagues.is_empty());
        assert_eq!(s.filtered.len(), 3);
    }

    #[test]
    fn empty_result_is_reported() {
        let mut s = state();
        s.criteria.min_goals = 50;
        s.refilter();
        assert_eq!(s.badges.players, 0);
        assert_eq!(s.badges.mean_goals_per_match_text(), "0.00");
        assert!(s.badges.top_scorer.is_placeholder());
        assert_eq!(s.diagnostics(), vec![Diagnostic::EmptyResult]);
    }

    #[test]
    fn failed_open_blocks_the_dashboard() {
        let mut s = state();
        s.open(PathBuf::from("/no/such/players.csv"));
        assert!(s.dataset.is_none());
        assert!(s.status_message.is_some());
        assert!(s.filtered.is_empty());
    }

    #[test]
    fn reload_keeps_the_current_filters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("players.csv");
        std::fs::write(
            &path,
            "Player,Comp,Pos,Nation,MP,Min,Gls,Ast
             A,L1,FW,FR,10,900,5,2
             C,L2,FW,DE,8,700,3,4
",
        )
        .unwrap();

        let mut s = AppState::new(DashboardConfig::default());
        s.open(path.clone());
        s.toggle(Selection::League, "L2");
        s.criteria.min_goals = 4;
        s.refilter();
        assert_eq!(s.filtered.len(), 1);

        s.reload();
        assert_eq!(s.criteria.leagues, BTreeSet::from(["L1".to_string()]));
        assert_eq!(s.criteria.min_goals, 4);
        assert_eq!(s.filtered.len(), 1);

        let other = dir.path().join("other.csv");
        std::fs::copy(&path, &other).unwrap();
        s.open(other);
        assert_eq!(s.criteria, FilterCriteria::default());
        assert_eq!(s.filtered.len(), 2);
    }
}
