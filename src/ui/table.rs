use eframe::egui::{ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use soccerstat::data::{Dataset, Value};

const ROW_HEIGHT: f32 = 18.0;

fn format_cell(value: &Value) -> String {
    match value {
        Value::Float(v) => format!("{v:.3}"),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Striped table of `dataset` restricted to the listed columns that exist.
pub fn records_table(ui: &mut Ui, id: &str, dataset: &Dataset, wanted: &[&str]) {
    let cols: Vec<&str> = wanted
        .iter()
        .copied()
        .filter(|c| dataset.has_column(c))
        .collect();
    if cols.is_empty() {
        return;
    }

    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .columns(Column::auto().at_least(48.0), cols.len())
            .header(20.0, |mut header| {
                for c in &cols {
                    header.col(|ui| {
                        ui.strong(*c);
                    });
                }
            })
            .body(|mut body| {
                for record in dataset.records() {
                    body.row(ROW_HEIGHT, |mut row| {
                        for c in &cols {
                            row.col(|ui| {
                                ui.label(format_cell(dataset.value(record, c)));
                            });
                        }
                    });
                }
            });
    });
}

/// Every column of the first rows, scrollable sideways.
pub fn data_preview(ui: &mut Ui, dataset: &Dataset) {
    let names: Vec<&str> = dataset.schema().names().collect();
    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        records_table(ui, "data_preview", dataset, &names);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_render_compactly() {
        assert_eq!(format_cell(&Value::Float(0.5)), "0.500");
        assert_eq!(format_cell(&Value::Integer(12)), "12");
        assert_eq!(format_cell(&Value::Null), "");
        assert_eq!(format_cell(&Value::Text("FW".into())), "FW");
    }
}
