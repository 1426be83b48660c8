use tl_app::ProfileId;

/// What the app state needs to know while drawing a tab.
pub struct PanelContext {
    pub run_active: bool,
}

/// Requests a tab hands back to the app; the app owns the store and runner.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    SaveAsNewProfile(String),
    DeleteProfile(ProfileId),
}

/// An artifact tab in Profiles mode.
pub trait Panel {
    fn title(&self) -> String;

    /// Profile whose files this tab shows; closed when the profile goes away.
    fn profile_id(&self) -> ProfileId;

    fn show(&mut self, ui: &mut egui::Ui, ctx: &PanelContext) -> Option<PanelAction>;
}
