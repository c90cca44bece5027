use std::collections::BTreeMap;

use eframe::egui::{Align2, Color32, RichText, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, LineStyle, Plot, PlotPoint,
    PlotPoints, Points, Text,
};
use soccerstat::data::summary::{self, GroupOrder, AGE_GROUP_COLUMN, AGE_LABELS};
use soccerstat::data::{columns, DerivedMetric};

use crate::color::generate_palette;
use crate::state::AppState;

/// Inline notice shown in place of a chart that cannot be drawn.
pub fn notice(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).italics().color(Color32::from_rgb(200, 140, 0)));
}

/// Category labels under each bar / box, since the x axis is positional.
fn category_labels<'a>(plot_ui: &mut egui_plot::PlotUi, labels: impl Iterator<Item = &'a str>) {
    for (i, label) in labels.enumerate() {
        plot_ui.text(
            Text::new(PlotPoint::new(i as f64, 0.0), RichText::new(label).small())
                .anchor(Align2::CENTER_TOP),
        );
    }
}

/// Deterministic horizontal offset in `[-0.12, 0.12)` for jittered points.
fn jitter(seed: usize) -> f64 {
    let h = (seed as u64 ^ 0x5DEE_CE66D).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    ((h >> 11) as f64 / (1u64 << 53) as f64 - 0.5) * 0.24
}

// ---------------------------------------------------------------------------
// Goals by league (bar)
// ---------------------------------------------------------------------------

pub fn goals_by_league(ui: &mut Ui, state: &AppState) {
    let view = &state.filtered;
    let groups = summary::group_sum(
        view,
        columns::COMP,
        &[columns::GLS],
        GroupOrder::Descending(0),
    );
    if groups.is_empty() {
        notice(ui, "No league totals for the current filters.");
        return;
    }

    Plot::new("goals_by_league")
        .legend(Legend::default())
        .y_axis_label("Goals")
        .height(280.0)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, g) in groups.iter().enumerate() {
                let total = g.values.first().copied().unwrap_or(0.0);
                let bar = Bar::new(i as f64, total).width(0.7).name(&g.key);
                plot_ui.bar_chart(
                    BarChart::new(vec![bar])
                        .name(&g.key)
                        .color(state.league_colors.color_for(&g.key)),
                );
            }
            category_labels(plot_ui, groups.iter().map(|g| g.key.as_str()));
        });
}

// ---------------------------------------------------------------------------
// Goals vs assists (scatter + regression)
// ---------------------------------------------------------------------------

/// Scatter of goals against assists, coloured by position, point size by
/// minutes played, with the least-squares line and the top scorers named.
pub fn goals_vs_assists(ui: &mut Ui, state: &AppState) {
    let needed = [columns::PLAYER, columns::POS, columns::GLS, columns::AST, columns::MIN];
    if let Some(missing) = needed.iter().find(|c| !state.filtered.has_column(c)) {
        notice(ui, &format!("Column '{missing}' is missing; scatter unavailable."));
        return;
    }
    // points, fit and labels all come from the same rows
    let view = &summary::complete_rows(&state.filtered, &needed);
    if view.is_empty() {
        notice(ui, "No players match the current filters.");
        return;
    }

    let minutes = view.numbers(columns::MIN);
    let lo = minutes.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = minutes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = if hi > lo { hi - lo } else { 1.0 };

    // (position, size bucket) → points
    let mut series: BTreeMap<(String, usize), Vec<[f64; 2]>> = BTreeMap::new();
    let mut x_range = (f64::INFINITY, f64::NEG_INFINITY);
    for r in view.records() {
        let (Some(x), Some(y)) = (
            view.value(r, columns::GLS).as_f64(),
            view.value(r, columns::AST).as_f64(),
        ) else {
            continue;
        };
        let pos = view.value(r, columns::POS);
        let m = view.value(r, columns::MIN).as_f64().unwrap_or(lo);
        let bucket = (((m - lo) / span) * 3.0).round().clamp(0.0, 3.0) as usize;
        series.entry((pos.to_string(), bucket)).or_default().push([x, y]);
        x_range = (x_range.0.min(x), x_range.1.max(x));
    }

    let fit = summary::linear_fit(view, columns::GLS, columns::AST);
    let top = summary::top_n(view, columns::GLS, state.config.top_n);
    let line_color = ui.visuals().text_color();

    match fit {
        Some(f) => ui.label(format!(
            "Assists ≈ {:.3} × goals + {:.3}  (size = minutes played)",
            f.slope, f.intercept
        )),
        None => ui.label("Not enough spread in goals for a regression line."),
    };

    Plot::new("goals_vs_assists")
        .legend(Legend::default())
        .x_axis_label("Goals (Gls)")
        .y_axis_label("Assists (Ast)")
        .show(ui, |plot_ui| {
            for ((pos, bucket), pts) in &series {
                let points: PlotPoints = pts.iter().copied().collect();
                plot_ui.points(
                    Points::new(points)
                        .radius(2.0 + *bucket as f32 * 1.5)
                        .color(state.position_colors.color_for(pos).gamma_multiply(0.8))
                        .name(pos),
                );
            }

            if let Some(f) = fit {
                let (x0, x1) = x_range;
                if x0.is_finite() && x1.is_finite() {
                    let points: PlotPoints = [[x0, f.at(x0)], [x1, f.at(x1)]].into_iter().collect();
                    plot_ui.line(
                        Line::new(points)
                            .style(LineStyle::dashed_loose())
                            .color(line_color)
                            .width(1.4)
                            .name("Regression"),
                    );
                }
            }

            for r in top.records() {
                let (Some(x), Some(y)) = (
                    top.value(r, columns::GLS).as_f64(),
                    top.value(r, columns::AST).as_f64(),
                ) else {
                    continue;
                };
                plot_ui.text(
                    Text::new(PlotPoint::new(x, y), RichText::new(top.player_name(r)).small())
                        .anchor(Align2::LEFT_BOTTOM),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Goals per match by league (box plot + jitter)
// ---------------------------------------------------------------------------

pub fn goals_per_match_by_league(ui: &mut Ui, state: &mut AppState) {
    let metric = DerivedMetric::GoalsPerMatch;
    if !state.filtered.has_metric(metric) || !state.filtered.has_column(columns::COMP) {
        notice(ui, "Goals per match or league column unavailable.");
        return;
    }

    let cutoff = state.config.outlier_goals_per_match;
    ui.checkbox(
        &mut state.remove_outliers,
        format!("Remove outliers (goals per match ≥ {cutoff})"),
    );

    let boxes = summary::group_box_stats(
        &state.filtered,
        columns::COMP,
        metric.column(),
        state.remove_outliers.then_some(cutoff),
    );
    if boxes.is_empty() {
        notice(ui, "Not enough data for the box plot.");
        return;
    }

    let fill = Color32::from_rgb(0x89, 0xC2, 0xD9);
    let edge = Color32::from_rgb(0x2C, 0x7D, 0xA0);

    Plot::new("goals_per_match_box")
        .y_axis_label("Goals per match")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, b) in boxes.iter().enumerate() {
                let s = b.stats;
                let elem = BoxElem::new(
                    i as f64,
                    BoxSpread::new(s.lower_whisker, s.q1, s.median, s.q3, s.upper_whisker),
                )
                .name(format!("{} (n = {})", b.key, s.count))
                .box_width(0.5)
                .fill(fill.gamma_multiply(0.6))
                .stroke(Stroke::new(1.5, edge));
                plot_ui.box_plot(BoxPlot::new(vec![elem]).name(&b.key));

                let points: PlotPoints = b
                    .values
                    .iter()
                    .enumerate()
                    .map(|(j, v)| [i as f64 + jitter(i * 7919 + j), *v])
                    .collect();
                plot_ui.points(
                    Points::new(points)
                        .radius(1.5)
                        .color(Color32::GRAY.gamma_multiply(0.5)),
                );
            }
            category_labels(plot_ui, boxes.iter().map(|b| b.key.as_str()));
        });
}

// ---------------------------------------------------------------------------
// Per-90 output by age group (grouped bars)
// ---------------------------------------------------------------------------

pub fn age_groups(ui: &mut Ui, state: &AppState) {
    let view = &state.filtered;
    if !view.has_column(columns::AGE) {
        notice(ui, "No 'Age' column; age groups unavailable.");
        return;
    }
    let metrics: Vec<DerivedMetric> = [DerivedMetric::GoalsPer90, DerivedMetric::AssistsPer90]
        .into_iter()
        .filter(|m| view.has_metric(*m))
        .collect();
    if metrics.is_empty() {
        notice(ui, "Per-90 metrics unavailable (missing Gls, Ast or Min).");
        return;
    }

    let binned = summary::age_groups(view);
    let value_columns: Vec<&str> = metrics.iter().map(|m| m.column()).collect();
    let order = GroupOrder::Labels(AGE_LABELS.iter().map(|l| l.to_string()).collect());
    let groups = summary::group_mean(&binned, AGE_GROUP_COLUMN, &value_columns, order);
    if groups.is_empty() {
        notice(ui, "No players with an age inside the age bands.");
        return;
    }

    ui.label(
        groups
            .iter()
            .map(|g| format!("{}: {} players", g.key, g.rows))
            .collect::<Vec<_>>()
            .join("   "),
    );

    let colors = generate_palette(metrics.len());
    let width = 0.8 / metrics.len() as f64;
    Plot::new("age_groups")
        .legend(Legend::default())
        .y_axis_label("Mean per 90")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (m, metric) in metrics.iter().enumerate() {
                let offset = (m as f64 - (metrics.len() as f64 - 1.0) / 2.0) * width;
                let bars: Vec<Bar> = groups
                    .iter()
                    .enumerate()
                    .map(|(i, g)| {
                        let v = g.values.get(m).copied().unwrap_or(0.0);
                        Bar::new(i as f64 + offset, v).width(width * 0.9).name(&g.key)
                    })
                    .collect();
                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .name(metric.label())
                        .color(colors.get(m).copied().unwrap_or(Color32::GRAY)),
                );
            }
            category_labels(plot_ui, groups.iter().map(|g| g.key.as_str()));
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_in_band() {
        for seed in 0..1000 {
            let j = jitter(seed);
            assert!((-0.12..0.12).contains(&j), "{seed}: {j}");
        }
        assert_eq!(jitter(42), jitter(42));
    }
}
