use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::{AppState, Selection};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    // Clone what we need so we can mutate state inside the loop.
    let leagues = state.options.leagues.clone();
    let positions = state.options.positions.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            multi_select(ui, state, Selection::League, "Leagues", &leagues);
            multi_select(ui, state, Selection::Position, "Positions", &positions);
            ui.separator();

            let mut changed = false;
            let max_matches = state.options.max_matches;
            let max_goals = state.options.max_goals;
            let max_assists = state.options.max_assists;

            ui.strong("Minimum matches played");
            changed |= ui
                .add(egui::Slider::new(&mut state.criteria.min_matches, 0..=max_matches))
                .changed();
            ui.strong("Minimum goals");
            changed |= ui
                .add(egui::Slider::new(&mut state.criteria.min_goals, 0..=max_goals))
                .changed();
            ui.strong("Minimum assists");
            changed |= ui
                .add(egui::Slider::new(&mut state.criteria.min_assists, 0..=max_assists))
                .changed();

            if changed {
                state.refilter();
            }
        });
}

/// Collapsible checkbox list for one categorical column.
fn multi_select(
    ui: &mut Ui,
    state: &mut AppState,
    which: Selection,
    title: &str,
    values: &[String],
) {
    if values.is_empty() {
        return;
    }
    let n_selected = values
        .iter()
        .filter(|v| state.is_selected(which, v))
        .count();
    let header_text = format!("{title}  ({n_selected}/{})", values.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(title)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            if ui.small_button("All").clicked() {
                state.select_all(which);
            }

            for val in values {
                let mut text = RichText::new(val);
                if which == Selection::Position {
                    text = text.color(state.position_colors.color_for(val));
                }

                let mut checked = state.is_selected(which, val);
                if ui.checkbox(&mut checked, text).changed() {
                    state.toggle(which, val);
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu, the metric badges and any notices.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.source.is_some(), egui::Button::new("Reload"))
                .clicked()
            {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
            return;
        }

        if let Some(ds) = &state.dataset {
            ui.label(format!("{} rows loaded", ds.len()));
            ui.separator();
            badge(ui, "Players", &state.badges.players.to_string());
            badge(ui, "Total goals", &format!("{:.0}", state.badges.goals));
            badge(ui, "Total assists", &format!("{:.0}", state.badges.assists));
            badge(
                ui,
                "Mean goals / match",
                &state.badges.mean_goals_per_match_text(),
            );
        }
    });

    for diagnostic in state.diagnostics() {
        ui.label(RichText::new(diagnostic.to_string()).color(Color32::from_rgb(200, 140, 0)));
    }
}

fn badge(ui: &mut Ui, label: &str, value: &str) {
    ui.label(RichText::new(label).small());
    ui.label(RichText::new(value).strong().size(16.0));
    ui.separator();
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open player statistics")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(path);
        if let Some(ds) = &state.dataset {
            log::info!(
                "Opened {} players with columns {:?}",
                ds.len(),
                ds.schema().names().collect::<Vec<_>>()
            );
        }
    }
}
