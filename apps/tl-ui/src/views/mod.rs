pub mod csv_table;
pub mod plot_view;
pub mod profile_explorer;
pub mod settings_editor;
pub mod settings_form;

pub use csv_table::CsvTablePanel;
pub use plot_view::PlotView;
pub use profile_explorer::{Artifact, ExplorerAction, ProfileExplorer};
pub use settings_editor::SettingsEditorPanel;
pub use settings_form::{FormAction, SettingsForm};
