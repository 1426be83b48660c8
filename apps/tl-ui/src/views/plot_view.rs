use egui_plot::{Legend, Line, Plot, PlotPoints, Points};
use tl_app::{OutputTable, ProfileId, ProfileStore, ProfileSummary, read_output_table};

#[derive(Default)]
pub struct PlotView {
    selected_profile: Option<ProfileId>,
    x_column: Option<String>,
    y_column: Option<String>,
    show_points: bool,
    cached: Option<(ProfileId, Result<OutputTable, String>)>,
}

impl PlotView {
    /// Drop the cached table so the next frame rereads it.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        store: &ProfileStore,
        profiles: &Result<Vec<ProfileSummary>, String>,
    ) {
        ui.heading("Plot View");
        ui.separator();

        let simulated: Vec<ProfileId> = match profiles {
            Ok(profiles) => profiles
                .iter()
                .filter(|p| p.simulated)
                .map(|p| p.id)
                .collect(),
            Err(_) => Vec::new(),
        };

        if simulated.is_empty() {
            ui.label("Generate a profile to plot its output");
            return;
        }

        if self.selected_profile.is_none_or(|id| !simulated.contains(&id)) {
            self.selected_profile = simulated.last().copied();
        }

        ui.horizontal(|ui| {
            ui.label("Profile:");
            egui::ComboBox::from_id_salt("plot_profile")
                .selected_text(
                    self.selected_profile
                        .map(|id| format!("profile_{}", id))
                        .unwrap_or_default(),
                )
                .show_ui(ui, |ui| {
                    for id in &simulated {
                        ui.selectable_value(
                            &mut self.selected_profile,
                            Some(*id),
                            format!("profile_{}", id),
                        );
                    }
                });
        });

        let Some(id) = self.selected_profile else {
            return;
        };
        if self.cached.as_ref().map(|(cached_id, _)| *cached_id) != Some(id) {
            let table = read_output_table(store, id).map_err(|e| e.to_string());
            self.cached = Some((id, table));
        }

        let table = match self.cached.as_ref().map(|(_, t)| t) {
            Some(Ok(table)) => table.clone(),
            Some(Err(e)) => {
                ui.colored_label(egui::Color32::RED, format!("Error loading output: {}", e));
                return;
            }
            None => return,
        };

        let numeric = table.numeric_column_names();
        if numeric.is_empty() {
            ui.label("No numeric columns in this output");
            return;
        }

        // Default to the first two numeric columns.
        if self.x_column.as_ref().is_none_or(|c| !numeric.contains(c)) {
            self.x_column = numeric.first().cloned();
        }
        if self.y_column.as_ref().is_none_or(|c| !numeric.contains(c)) {
            self.y_column = numeric.get(1).or(numeric.first()).cloned();
        }

        ui.horizontal(|ui| {
            column_picker(ui, "plot_x", "X:", &mut self.x_column, &numeric);
            column_picker(ui, "plot_y", "Y:", &mut self.y_column, &numeric);
            ui.checkbox(&mut self.show_points, "Points");
        });
        ui.separator();

        let (Some(x), Some(y)) = (self.x_column.as_deref(), self.y_column.as_deref()) else {
            return;
        };
        let points = table.numeric_pairs(x, y).unwrap_or_default();
        if points.is_empty() {
            ui.label("No rows with values in both columns");
            return;
        }

        let name = format!("profile_{}", id);
        Plot::new("output_plot")
            .legend(Legend::default())
            .x_axis_label(x)
            .y_axis_label(y)
            .show(ui, |plot_ui| {
                if self.show_points {
                    plot_ui.points(Points::new(PlotPoints::from(points)).radius(2.0).name(&name));
                } else {
                    plot_ui.line(Line::new(PlotPoints::from(points)).name(&name));
                }
            });
    }
}

fn column_picker(
    ui: &mut egui::Ui,
    id: &str,
    label: &str,
    selected: &mut Option<String>,
    columns: &[String],
) {
    ui.label(label);
    egui::ComboBox::from_id_salt(id)
        .selected_text(selected.clone().unwrap_or_default())
        .show_ui(ui, |ui| {
            for column in columns {
                ui.selectable_value(selected, Some(column.clone()), column);
            }
        });
}
