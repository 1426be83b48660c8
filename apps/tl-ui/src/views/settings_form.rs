use std::collections::BTreeMap;
use tl_app::{CATALOG, SetOutcome, SettingsDocument};

/// Catalog-driven form. Text is kept as typed; empty fields stay out of the
/// document so the simulation uses its own default.
#[derive(Default)]
pub struct SettingsForm {
    texts: BTreeMap<&'static str, String>,
    show_advanced: bool,
}

pub enum FormAction {
    Generate(SettingsDocument),
}

impl SettingsForm {
    pub fn show(&mut self, ui: &mut egui::Ui, can_generate: bool) -> Option<FormAction> {
        let mut action = None;
        ui.heading("Simulation Settings");
        ui.separator();

        egui::ScrollArea::vertical()
            .auto_shrink([false, true])
            .max_height((ui.available_height() - 90.0).max(120.0))
            .show(ui, |ui| {
                for category in CATALOG {
                    let advanced = category.name == "Advanced";
                    if advanced {
                        ui.checkbox(&mut self.show_advanced, "Show advanced settings");
                        if !self.show_advanced {
                            continue;
                        }
                    }

                    ui.group(|ui| {
                        ui.strong(category.name);
                        egui::Grid::new(category.name)
                            .num_columns(2)
                            .spacing([12.0, 4.0])
                            .show(ui, |ui| {
                                for field in category.fields {
                                    ui.label(field.label);
                                    let text = self.texts.entry(field.key).or_default();
                                    let valid = is_valid(text);
                                    let mut edit = egui::TextEdit::singleline(text)
                                        .hint_text(field.default.to_string())
                                        .desired_width(120.0);
                                    if !valid {
                                        edit = edit.text_color(egui::Color32::RED);
                                    }
                                    ui.add(edit)
                                        .on_hover_text(format!("JSON key: {}", field.key));
                                    ui.end_row();
                                }
                            });
                    });
                    ui.add_space(4.0);
                }
            });

        ui.separator();
        let invalid = self.invalid_fields();
        ui.horizontal(|ui| {
            let enabled = can_generate && invalid.is_empty();
            if ui
                .add_enabled(enabled, egui::Button::new("Generate CSV"))
                .clicked()
            {
                action = Some(FormAction::Generate(self.document()));
            }
            if ui.button("Clear").clicked() {
                self.texts.clear();
            }
        });
        if !invalid.is_empty() {
            ui.colored_label(
                egui::Color32::RED,
                format!("Not a number: {}", invalid.join(", ")),
            );
        }

        action
    }

    /// Settings built from every field that holds a valid number.
    pub fn document(&self) -> SettingsDocument {
        let mut doc = SettingsDocument::new();
        for (key, text) in &self.texts {
            doc.set(key, text);
        }
        doc
    }

    fn invalid_fields(&self) -> Vec<&'static str> {
        tl_app::catalog::fields()
            .filter(|f| self.texts.get(f.key).is_some_and(|t| !is_valid(t)))
            .map(|f| f.label)
            .collect()
    }
}

fn is_valid(text: &str) -> bool {
    SettingsDocument::new().set("value", text) != SetOutcome::Rejected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_stay_out_of_document() {
        let mut form = SettingsForm::default();
        form.texts.insert("maxangle", "60".to_string());
        form.texts.insert("minangle", "  ".to_string());

        let doc = form.document();
        assert_eq!(doc.get("maxangle"), Some(60.0));
        assert!(!doc.contains("minangle"));
        assert!(form.invalid_fields().is_empty());
    }

    #[test]
    fn non_numeric_text_is_reported_by_label() {
        let mut form = SettingsForm::default();
        form.texts.insert("targetheight", "tall".to_string());
        form.texts.insert("maxspeed", "inf".to_string());

        assert_eq!(form.invalid_fields(), vec!["Target Height", "Max Shooter Speed"]);
        assert!(form.document().is_empty());
    }
}
