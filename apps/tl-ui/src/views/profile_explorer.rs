use tl_app::{ProfileId, ProfileSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Settings,
    Output,
}

pub enum ExplorerAction {
    Open(ProfileId, Artifact),
    Refresh,
}

/// Sidebar tree of profiles and their files.
#[derive(Default)]
pub struct ProfileExplorer;

impl ProfileExplorer {
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        profiles: &Result<Vec<ProfileSummary>, String>,
    ) -> Option<ExplorerAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.heading("Profiles");
            if ui.small_button("⟳").on_hover_text("Rescan").clicked() {
                action = Some(ExplorerAction::Refresh);
            }
        });

        let profiles = match profiles {
            Ok(profiles) => profiles,
            Err(e) => {
                ui.colored_label(egui::Color32::RED, format!("Error loading profiles: {}", e));
                return action;
            }
        };

        if profiles.is_empty() {
            ui.label("No profiles yet");
            return action;
        }

        egui::ScrollArea::vertical().show(ui, |ui| {
            for profile in profiles {
                egui::CollapsingHeader::new(format!("profile_{}", profile.id))
                    .id_salt(profile.id.get())
                    .show(ui, |ui| {
                        if ui.selectable_label(false, "settings.json").clicked() {
                            action = Some(ExplorerAction::Open(profile.id, Artifact::Settings));
                        }
                        if profile.simulated {
                            if ui.selectable_label(false, "output.csv").clicked() {
                                action = Some(ExplorerAction::Open(profile.id, Artifact::Output));
                            }
                        } else {
                            ui.weak("not simulated");
                        }
                        if let Some(modified) = profile.modified {
                            ui.weak(modified.format("%Y-%m-%d %H:%M").to_string());
                        }
                    });
            }
        });

        action
    }
}
