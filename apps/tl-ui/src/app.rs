use crate::panel::{Panel, PanelAction, PanelContext};
use crate::views::{
    Artifact, CsvTablePanel, ExplorerAction, FormAction, PlotView, ProfileExplorer,
    SettingsEditorPanel, SettingsForm,
};
use egui_file_dialog::FileDialog;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tl_app::config::CONFIG_FILE;
use tl_app::{
    AppConfig, AppError, GenerateHandle, Notify, ProfileId, ProfileStore, ProfileSummary,
    RunEvent, SettingsDocument,
};
use tracing::{info, warn};

pub struct TrajectoryLabApp {
    egui_ctx: egui::Context,
    config: AppConfig,
    store: ProfileStore,
    profiles: Result<Vec<ProfileSummary>, String>,
    mode: Mode,
    settings_form: SettingsForm,
    explorer: ProfileExplorer,
    plot_view: PlotView,
    tabs: Vec<Box<dyn Panel>>,
    active_tab: usize,
    active_run: Option<GenerateHandle>,
    latest_progress: Option<f64>,
    last_message: Option<String>,
    file_dialog: FileDialog,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Settings,
    Profiles,
    Plot,
}

impl TrajectoryLabApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let (config, last_message) = match AppConfig::resolve(None) {
            Ok(config) => (config, None),
            Err(e) => (
                AppConfig::default(),
                Some(format!("Failed to load config, using defaults: {}", e)),
            ),
        };
        let store = config.store();

        let mut app = Self {
            egui_ctx: cc.egui_ctx.clone(),
            config,
            store,
            profiles: Ok(Vec::new()),
            mode: Mode::Settings,
            settings_form: SettingsForm::default(),
            explorer: ProfileExplorer,
            plot_view: PlotView::default(),
            tabs: Vec::new(),
            active_tab: 0,
            active_run: None,
            latest_progress: None,
            last_message,
            file_dialog: FileDialog::new(),
        };
        app.refresh_profiles();
        app
    }

    fn refresh_profiles(&mut self) {
        self.profiles = tl_app::list_profiles(&self.store).map_err(|e| e.to_string());
        self.plot_view.invalidate();
    }

    fn run_active(&self) -> bool {
        self.active_run.is_some()
    }

    fn notifier(&self) -> Notify {
        let ctx = self.egui_ctx.clone();
        Arc::new(move || ctx.request_repaint())
    }

    fn generate(&mut self, settings: SettingsDocument) {
        if self.run_active() {
            return;
        }
        let result = tl_app::generate(&self.config, &self.store, &settings, Some(self.notifier()));
        self.refresh_profiles();
        match result {
            Ok(handle) => self.begin_run(handle),
            Err(e) => self.last_message = Some(format!("Generate failed: {}", e)),
        }
    }

    fn save_as_new_profile(&mut self, text: &str) {
        if self.run_active() {
            return;
        }
        let profile = match tl_app::save_settings_text(&self.store, text) {
            Ok(profile) => profile,
            Err(e) => {
                self.last_message = Some(format!("Failed to save settings: {}", e));
                return;
            }
        };
        self.refresh_profiles();

        match tl_app::start_simulation(&self.config, &profile, Some(self.notifier())) {
            Ok(runner) => self.begin_run(GenerateHandle { profile, runner }),
            Err(e) => {
                self.last_message = Some(format!(
                    "Saved profile {} but the simulation did not start: {}",
                    profile.id, e
                ))
            }
        }
    }

    fn begin_run(&mut self, handle: GenerateHandle) {
        self.latest_progress = Some(0.0);
        self.last_message = Some(format!("Simulating profile {}", handle.profile.id));
        self.active_run = Some(handle);
    }

    fn poll_run(&mut self) {
        let Some(handle) = self.active_run.as_mut() else {
            return;
        };

        let mut finished = None;
        for event in handle.runner.poll_events() {
            match event {
                RunEvent::Progress { percent } => self.latest_progress = Some(percent),
                RunEvent::Succeeded { .. } => finished = Some(Ok(handle.profile.id)),
                RunEvent::Failed { reason } => finished = Some(Err((handle.profile.id, reason))),
            }
        }

        let Some(result) = finished else {
            return;
        };
        self.active_run = None;
        self.latest_progress = None;
        self.refresh_profiles();

        match result {
            Ok(id) => {
                self.last_message = Some(format!("Profile {} simulated", id));
                self.close_tabs_for(id);
                self.open_artifact(id, Artifact::Output);
            }
            Err((id, reason)) => {
                self.last_message = Some(format!("Simulation of profile {} failed: {}", id, reason));
            }
        }
    }

    fn open_artifact(&mut self, id: ProfileId, artifact: Artifact) {
        let panel: Box<dyn Panel> = match artifact {
            Artifact::Settings => {
                let raw = self
                    .store
                    .get(id)
                    .ok()
                    .and_then(|p| std::fs::read_to_string(p.settings_path).ok());
                Box::new(SettingsEditorPanel::new(
                    id,
                    tl_app::load_settings(&self.store, id),
                    raw,
                ))
            }
            Artifact::Output => Box::new(CsvTablePanel::new(
                id,
                tl_app::read_output_table(&self.store, id),
            )),
        };

        let title = panel.title();
        if let Some(existing) = self.tabs.iter().position(|t| t.title() == title) {
            self.tabs[existing] = panel;
            self.active_tab = existing;
        } else {
            self.tabs.push(panel);
            self.active_tab = self.tabs.len() - 1;
        }
        self.mode = Mode::Profiles;
    }

    fn close_tabs_for(&mut self, id: ProfileId) {
        self.tabs.retain(|t| t.profile_id() != id);
        self.active_tab = self.active_tab.min(self.tabs.len().saturating_sub(1));
    }

    fn delete_profile(&mut self, id: ProfileId) {
        match tl_app::delete_profile(&self.store, id) {
            Ok(()) => {
                info!(%id, "profile deleted");
                self.last_message = Some(format!("Deleted profile {}", id));
            }
            Err(AppError::NotFound(_)) => {
                self.last_message = Some(format!("Profile {} was already removed", id));
            }
            Err(e) => {
                self.last_message = Some(format!("Failed to delete profile {}: {}", id, e));
                return;
            }
        }
        self.close_tabs_for(id);
        self.refresh_profiles();
    }

    fn apply_panel_action(&mut self, action: PanelAction) {
        match action {
            PanelAction::SaveAsNewProfile(text) => self.save_as_new_profile(&text),
            PanelAction::DeleteProfile(id) => self.delete_profile(id),
        }
    }

    fn set_executable(&mut self, path: PathBuf) {
        self.config.executable = path;
        let config_path = Path::new(CONFIG_FILE);
        match self.config.save(config_path) {
            Ok(()) => {
                self.last_message = Some(format!(
                    "Simulation executable set to {}",
                    self.config.executable.display()
                ))
            }
            Err(e) => {
                warn!(error = %e, "failed to save config");
                self.last_message = Some(format!("Executable set but config not saved: {}", e));
            }
        }
    }

    fn show_tabs(&mut self, ui: &mut egui::Ui) {
        if self.tabs.is_empty() {
            ui.label("Open a settings.json or output.csv from the profile explorer");
            return;
        }

        let mut close = None;
        ui.horizontal_wrapped(|ui| {
            for (index, tab) in self.tabs.iter().enumerate() {
                if ui
                    .selectable_label(index == self.active_tab, tab.title())
                    .clicked()
                {
                    self.active_tab = index;
                }
                if ui.small_button("✖").clicked() {
                    close = Some(index);
                }
                ui.separator();
            }
        });
        if let Some(index) = close {
            self.tabs.remove(index);
            self.active_tab = self.active_tab.min(self.tabs.len().saturating_sub(1));
        }
        ui.separator();

        let ctx = PanelContext {
            run_active: self.run_active(),
        };
        let action = self
            .tabs
            .get_mut(self.active_tab)
            .and_then(|tab| tab.show(ui, &ctx));
        if let Some(action) = action {
            self.apply_panel_action(action);
        }
    }

    fn show_run_status(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(handle) = &self.active_run {
                let percent = self.latest_progress.unwrap_or(0.0);
                ui.add(
                    egui::ProgressBar::new((percent / 100.0) as f32)
                        .desired_width(300.0)
                        .text(format!("profile_{} {:.1}%", handle.profile.id, percent)),
                );
                if ui.button("Cancel").clicked() {
                    handle.runner.cancel();
                }
                ui.separator();
            }
            if let Some(message) = &self.last_message {
                ui.label(message);
            }
        });
    }
}

impl eframe::App for TrajectoryLabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_run();

        let run_active = self.run_active();
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("Executable: {}", self.config.executable.display()));
                if ui
                    .add_enabled(!run_active, egui::Button::new("Choose…"))
                    .clicked()
                {
                    self.file_dialog.select_file();
                }
                ui.separator();
                ui.label(format!("Profiles: {}", self.store.root().display()));
            });
        });

        self.file_dialog.update(ctx);
        if let Some(path) = self.file_dialog.take_selected() {
            self.set_executable(path.to_path_buf());
        }

        egui::TopBottomPanel::bottom("run_status").show(ctx, |ui| {
            self.show_run_status(ui);
        });

        let mut explorer_action = None;
        egui::SidePanel::left("navigation")
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.selectable_value(&mut self.mode, Mode::Settings, "⚙ Settings");
                ui.selectable_value(&mut self.mode, Mode::Profiles, "🗁 Profiles");
                ui.selectable_value(&mut self.mode, Mode::Plot, "📈 Plot");
                ui.separator();
                explorer_action = self.explorer.show(ui, &self.profiles);
            });

        match explorer_action {
            Some(ExplorerAction::Open(id, artifact)) => self.open_artifact(id, artifact),
            Some(ExplorerAction::Refresh) => self.refresh_profiles(),
            None => {}
        }

        egui::CentralPanel::default().show(ctx, |ui| match self.mode {
            Mode::Settings => {
                if let Some(FormAction::Generate(settings)) =
                    self.settings_form.show(ui, !run_active)
                {
                    self.generate(settings);
                }
            }
            Mode::Profiles => self.show_tabs(ui),
            Mode::Plot => self.plot_view.show(ui, &self.store, &self.profiles),
        });
    }
}
