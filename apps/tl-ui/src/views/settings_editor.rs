use tl_app::{AppResult, ProfileId, SettingsDocument};

use crate::panel::{Panel, PanelAction, PanelContext};

/// JSON text editor for one profile's settings. Edits never touch the
/// original file; saving creates a new profile.
pub struct SettingsEditorPanel {
    id: ProfileId,
    text: String,
    load_error: Option<String>,
}

impl SettingsEditorPanel {
    /// `raw` is the file content, used as the starting text when it does not
    /// parse so the user can repair it.
    pub fn new(id: ProfileId, loaded: AppResult<SettingsDocument>, raw: Option<String>) -> Self {
        match loaded {
            Ok(settings) => Self {
                id,
                text: settings.to_json_string_pretty(),
                load_error: None,
            },
            Err(e) => Self {
                id,
                text: raw.unwrap_or_else(|| "{}".to_string()),
                load_error: Some(e.to_string()),
            },
        }
    }
}

impl Panel for SettingsEditorPanel {
    fn title(&self) -> String {
        format!("profile_{}/settings.json", self.id)
    }

    fn profile_id(&self) -> ProfileId {
        self.id
    }

    fn show(&mut self, ui: &mut egui::Ui, ctx: &PanelContext) -> Option<PanelAction> {
        let mut action = None;

        if let Some(err) = &self.load_error {
            ui.colored_label(egui::Color32::RED, err);
        }

        let parse_error = SettingsDocument::from_json_str(&self.text).err();

        ui.horizontal(|ui| {
            let enabled = !ctx.run_active && parse_error.is_none();
            if ui
                .add_enabled(enabled, egui::Button::new("Save as New Profile"))
                .on_disabled_hover_text("Needs a valid settings object and no active run")
                .clicked()
            {
                action = Some(PanelAction::SaveAsNewProfile(self.text.clone()));
            }
            if let Some(e) = &parse_error {
                ui.colored_label(egui::Color32::RED, e.to_string());
            }
        });
        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.add(
                egui::TextEdit::multiline(&mut self.text)
                    .code_editor()
                    .desired_width(f32::INFINITY)
                    .desired_rows(20),
            );
        });

        action
    }
}
