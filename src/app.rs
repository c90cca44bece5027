use eframe::egui::{self, Ui};
use soccerstat::config::DashboardConfig;
use soccerstat::data::columns;
use soccerstat::data::summary;

use crate::state::{AppState, Tab};
use crate::ui::{charts, panels, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SoccerStatApp {
    pub state: AppState,
}

impl SoccerStatApp {
    /// Build the app and load the configured dataset.
    pub fn new(config: DashboardConfig) -> Self {
        let mut state = AppState::new(config);
        let path = state.config.data_path.clone();
        state.open(path);
        Self { state }
    }
}

impl eframe::App for SoccerStatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar + badges ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // A load failure blocks everything below the menu bar.
        if self.state.dataset.is_none() {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.centered_and_justified(|ui: &mut Ui| {
                    let text = self
                        .state
                        .status_message
                        .as_deref()
                        .unwrap_or("Open a player table to start  (File → Open…)");
                    ui.heading(text);
                });
            });
            return;
        }

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: tabs ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui: &mut Ui| {
                for tab in Tab::ALL {
                    ui.selectable_value(&mut self.state.tab, tab, tab.title());
                }
            });
            ui.separator();
            central(ui, &mut self.state);
        });
    }
}

fn central(ui: &mut Ui, state: &mut AppState) {
    match state.tab {
        Tab::Overview => overview(ui, state),
        Tab::GoalsVsAssists => charts::goals_vs_assists(ui, state),
        Tab::GoalsPerMatch => charts::goals_per_match_by_league(ui, state),
        Tab::AgeGroups => charts::age_groups(ui, state),
        Tab::Data => {
            let preview = summary::head(&state.filtered, 100);
            ui.label(format!(
                "First {} of {} filtered rows",
                preview.len(),
                state.filtered.len()
            ));
            table::data_preview(ui, &preview);
        }
    }
}

fn overview(ui: &mut Ui, state: &AppState) {
    let best = &state.badges.top_scorer;
    if best.is_placeholder() {
        ui.label("Top scorer: N/A");
    } else {
        ui.label(format!("Top scorer: {} ({:.0} goals)", best.player, best.value));
    }
    ui.separator();

    let n = state.config.top_n;
    ui.columns(2, |cols| {
        cols[0].strong(format!("Top {n} scorers"));
        let scorers = summary::top_n(&state.filtered, columns::GLS, n);
        table::records_table(
            &mut cols[0],
            "top_scorers",
            &scorers,
            &[columns::PLAYER, columns::COMP, columns::POS, columns::GLS, "goals_per_90"],
        );

        cols[1].strong(format!("Top {n} assisters"));
        let assisters = summary::top_n(&state.filtered, columns::AST, n);
        table::records_table(
            &mut cols[1],
            "top_assisters",
            &assisters,
            &[columns::PLAYER, columns::COMP, columns::POS, columns::AST, "assists_per_90"],
        );
    });
    ui.separator();

    ui.strong("Goals by league");
    charts::goals_by_league(ui, state);
}
