use egui_extras::{Column, TableBuilder};
use tl_app::{AppResult, OutputTable, ProfileId};

use crate::panel::{Panel, PanelAction, PanelContext};

pub struct CsvTablePanel {
    id: ProfileId,
    table: Result<OutputTable, String>,
    confirm_delete: bool,
}

impl CsvTablePanel {
    pub fn new(id: ProfileId, loaded: AppResult<OutputTable>) -> Self {
        Self {
            id,
            table: loaded.map_err(|e| e.to_string()),
            confirm_delete: false,
        }
    }

    fn show_table(ui: &mut egui::Ui, table: &OutputTable) {
        let columns = table.headers.len().max(1);

        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::auto().at_least(40.0)) // Row number
            .columns(Column::initial(100.0).at_least(50.0), columns)
            .header(22.0, |mut header| {
                header.col(|ui| {
                    ui.strong("#");
                });
                for name in &table.headers {
                    header.col(|ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(20.0, table.rows.len(), |mut row| {
                    let index = row.index();
                    row.col(|ui| {
                        ui.weak((index + 1).to_string());
                    });
                    let cells = &table.rows[index];
                    for col in 0..columns {
                        row.col(|ui| {
                            if let Some(cell) = cells.get(col) {
                                ui.label(cell);
                            }
                        });
                    }
                });
            });
    }
}

impl Panel for CsvTablePanel {
    fn title(&self) -> String {
        format!("profile_{}/output.csv", self.id)
    }

    fn profile_id(&self) -> ProfileId {
        self.id
    }

    fn show(&mut self, ui: &mut egui::Ui, ctx: &PanelContext) -> Option<PanelAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            if self.confirm_delete {
                ui.label(format!("Delete profile {} and all its files?", self.id));
                if ui.button("Yes, delete").clicked() {
                    action = Some(PanelAction::DeleteProfile(self.id));
                    self.confirm_delete = false;
                }
                if ui.button("No").clicked() {
                    self.confirm_delete = false;
                }
            } else if ui
                .add_enabled(!ctx.run_active, egui::Button::new("Delete Profile"))
                .clicked()
            {
                self.confirm_delete = true;
            }

            if let Ok(table) = &self.table {
                ui.separator();
                ui.label(format!("{} rows", table.row_count()));
            }
        });
        ui.separator();

        match &self.table {
            Ok(table) if table.is_empty() => {
                ui.label("The output file is empty");
            }
            Ok(table) => {
                egui::ScrollArea::horizontal().show(ui, |ui| {
                    Self::show_table(ui, table);
                });
            }
            Err(e) => {
                ui.colored_label(egui::Color32::RED, format!("Error loading output: {}", e));
            }
        }

        action
    }
}
