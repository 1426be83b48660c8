use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;
use tl_app::profile_service::ProfileSummary;
use tl_app::{
    AppConfig, AppError, AppResult, CATALOG, GenerateHandle, OutputTable, ProfileId,
    ProfileStore, RunEvent, RunOutcome, SetOutcome, SettingsDocument, find_field,
    profile_service, resolve_key, run_service,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "trajlab")]
#[command(about = "Trajectory Lab CLI - configure and run shooting simulations", long_about = None)]
struct Cli {
    /// Config file (defaults to ./trajlab.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding profile_<id> directories
    #[arg(long, global = true)]
    profiles_root: Option<PathBuf>,
    /// Simulation executable
    #[arg(long, global = true)]
    executable: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List profiles
    Profiles,
    /// List the known settings fields and their defaults
    Fields,
    /// Print a profile's output table
    Show {
        /// Profile id (`3` or `profile_3`)
        id: ProfileId,
        /// Print per-column statistics instead of rows
        #[arg(long)]
        summary: bool,
        /// Maximum number of data rows to print
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print a profile's settings.json
    Settings {
        /// Profile id
        id: ProfileId,
    },
    /// Create a profile without running the simulation
    Create {
        /// Setting as `name=value`; the name may be a key or a field label
        #[arg(long = "set", value_parser = parse_assignment)]
        sets: Vec<(String, String)>,
    },
    /// Create a profile and run the simulation for it
    Generate {
        /// Setting as `name=value`; the name may be a key or a field label
        #[arg(long = "set", value_parser = parse_assignment)]
        sets: Vec<(String, String)>,
    },
    /// Run the simulation again for an existing profile
    Rerun {
        /// Profile id
        id: ProfileId,
    },
    /// Delete a profile directory
    Delete {
        /// Profile id
        id: ProfileId,
    },
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = AppConfig::resolve(cli.config.as_deref())?;
    if let Some(root) = cli.profiles_root {
        config.profiles_root = root;
    }
    if let Some(exe) = cli.executable {
        config.executable = exe;
    }
    debug!(
        source = %cli.config.as_deref().map_or_else(|| "discovered".to_string(), |p| p.display().to_string()),
        profiles_root = %config.profiles_root.display(),
        executable = %config.executable.display(),
        "resolved config"
    );

    match cli.command {
        Commands::Profiles => cmd_profiles(&config),
        Commands::Fields => cmd_fields(),
        Commands::Show { id, summary, limit } => cmd_show(&config, id, summary, limit),
        Commands::Settings { id } => cmd_settings(&config, id),
        Commands::Create { sets } => cmd_create(&config, &sets),
        Commands::Generate { sets } => cmd_generate(&config, &sets),
        Commands::Rerun { id } => cmd_rerun(&config, id),
        Commands::Delete { id } => cmd_delete(&config, id),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;
    if name.trim().is_empty() {
        return Err(format!("missing setting name in '{}'", raw));
    }
    Ok((resolve_key(name), value.to_string()))
}

fn build_settings(sets: &[(String, String)]) -> AppResult<SettingsDocument> {
    let mut settings = SettingsDocument::new();
    for (key, value) in sets {
        if settings.set(key, value) == SetOutcome::Rejected {
            return Err(AppError::InvalidInput(format!(
                "'{}' is not a number (setting {})",
                value, key
            )));
        }
        if find_field(key).is_none() {
            warn!(key = %key, "unknown setting, storing it anyway");
        }
    }
    Ok(settings)
}

fn cmd_profiles(config: &AppConfig) -> AppResult<()> {
    let store = config.store();
    let profiles = profile_service::list_profiles(&store)?;

    if profiles.is_empty() {
        println!("No profiles in {}", store.root().display());
        return Ok(());
    }

    println!("Profiles in {}:", store.root().display());
    for p in profiles {
        print_profile_line(&p);
    }
    Ok(())
}

fn print_profile_line(p: &ProfileSummary) {
    let modified = p
        .modified
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let state = if p.simulated {
        "simulated"
    } else {
        "not simulated"
    };
    println!("  {:>4}  {:<13}  {}", p.id, state, modified);
}

fn cmd_fields() -> AppResult<()> {
    for category in CATALOG {
        println!("{}:", category.name);
        for field in category.fields {
            println!(
                "  {:<28} {:<28} default {}",
                field.label, field.key, field.default
            );
        }
    }
    Ok(())
}

fn cmd_show(
    config: &AppConfig,
    id: ProfileId,
    summary: bool,
    limit: Option<usize>,
) -> AppResult<()> {
    let store = config.store();
    let table = match profile_service::read_output_table(&store, id) {
        Ok(table) => table,
        Err(AppError::NotFound(_)) if store.get(id).is_ok() => {
            println!("Profile {} has not been simulated yet", id);
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    if table.is_empty() {
        println!("Output of profile {} is empty", id);
    } else if summary {
        print_summary(&table);
    } else {
        print_table(&table, limit);
    }
    Ok(())
}

fn print_summary(table: &OutputTable) {
    println!("{} rows", table.row_count());
    for col in table.summarize() {
        println!(
            "  {:<16} n={:<6} min={:<12.4} max={:<12.4} mean={:.4}",
            col.name, col.count, col.min, col.max, col.mean
        );
    }
}

fn print_table(table: &OutputTable, limit: Option<usize>) {
    let shown = limit.unwrap_or(usize::MAX).min(table.rows.len());
    let rows = &table.rows[..shown];

    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.len());
            }
        }
    }

    let render = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:>width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", render(&table.headers));
    println!(
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  ")
    );
    for row in rows {
        println!("{}", render(row));
    }
    if shown < table.rows.len() {
        println!("... {} more rows", table.rows.len() - shown);
    }
}

fn cmd_settings(config: &AppConfig, id: ProfileId) -> AppResult<()> {
    let settings = profile_service::load_settings(&config.store(), id)?;
    println!("{}", settings.to_json_string_pretty());
    Ok(())
}

fn cmd_create(config: &AppConfig, sets: &[(String, String)]) -> AppResult<()> {
    let settings = build_settings(sets)?;
    let profile = profile_service::create_profile(&config.store(), &settings)?;
    println!("✓ Created profile {} at {}", profile.id, profile.dir.display());
    Ok(())
}

fn cmd_generate(config: &AppConfig, sets: &[(String, String)]) -> AppResult<()> {
    let settings = build_settings(sets)?;
    let store = config.store();
    let handle = run_service::generate(config, &store, &settings, None)?;
    println!(
        "Created profile {}; running {}",
        handle.profile.id,
        config.executable.display()
    );
    finish_run(&store, handle)
}

fn cmd_rerun(config: &AppConfig, id: ProfileId) -> AppResult<()> {
    let store = config.store();
    let handle = run_service::rerun(config, &store, id, None)?;
    println!("Re-running profile {} with {}", id, config.executable.display());
    finish_run(&store, handle)
}

fn finish_run(store: &ProfileStore, mut handle: GenerateHandle) -> AppResult<()> {
    let started = Instant::now();
    info!(profile = %handle.profile.id, "waiting for simulation");
    let outcome = handle.runner.wait(|event| {
        if let RunEvent::Progress { percent } = event {
            render_cli_progress(*percent, started);
        }
    })?;
    clear_progress_line();
    info!(
        profile = %handle.profile.id,
        success = outcome.is_success(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "simulation finished"
    );

    match outcome {
        RunOutcome::Succeeded { output_path } => {
            println!(
                "✓ Simulation completed in {:.1}s: {}",
                started.elapsed().as_secs_f64(),
                output_path.display()
            );
            if let Ok(table) = profile_service::read_output_table(store, handle.profile.id) {
                println!("  Rows: {}", table.row_count());
                println!("  Columns: {}", table.column_names().join(", "));
            }
            Ok(())
        }
        RunOutcome::Failed { reason } => Err(AppError::Runner(format!(
            "simulation for profile {} failed: {}",
            handle.profile.id, reason
        ))),
    }
}

fn render_cli_progress(percent: f64, started: Instant) {
    let width = 28usize;
    let filled = ((percent / 100.0 * width as f64).round() as usize).min(width);
    print!(
        "\r[{}{}] {:>6.2}%  elapsed={:.1}s",
        "#".repeat(filled),
        "-".repeat(width - filled),
        percent,
        started.elapsed().as_secs_f64()
    );
    let _ = io::stdout().flush();
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(60));
    let _ = io::stdout().flush();
}

fn cmd_delete(config: &AppConfig, id: ProfileId) -> AppResult<()> {
    profile_service::delete_profile(&config.store(), id)?;
    println!("✓ Deleted profile {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_resolves_labels_to_keys() {
        assert_eq!(
            parse_assignment("Max Angle=60").unwrap(),
            ("maxangle".to_string(), "60".to_string())
        );
        assert_eq!(
            parse_assignment("deltaspeed=0.05").unwrap(),
            ("deltaspeed".to_string(), "0.05".to_string())
        );
    }

    #[test]
    fn assignment_needs_name_and_equals() {
        assert!(parse_assignment("maxangle").is_err());
        assert!(parse_assignment("=4").is_err());
    }

    #[test]
    fn empty_value_leaves_key_unset() {
        let sets = vec![
            ("maxangle".to_string(), "60".to_string()),
            ("minangle".to_string(), " ".to_string()),
        ];
        let settings = build_settings(&sets).unwrap();
        assert_eq!(settings.get("maxangle"), Some(60.0));
        assert!(!settings.contains("minangle"));
    }

    #[test]
    fn unknown_setting_is_kept() {
        let sets = vec![("windspeed".to_string(), "3".to_string())];
        let settings = build_settings(&sets).unwrap();
        assert_eq!(settings.get("windspeed"), Some(3.0));
    }

    #[test]
    fn non_numeric_value_is_rejected() {
        let sets = vec![("maxangle".to_string(), "steep".to_string())];
        assert!(matches!(
            build_settings(&sets),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn cli_parses_generate_sets() {
        let cli = Cli::try_parse_from([
            "trajlab",
            "-vv",
            "generate",
            "--set",
            "maxangle=60",
            "--set",
            "Target Height=2.5",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Generate { sets } => {
                assert_eq!(sets[1], ("targetheight".to_string(), "2.5".to_string()));
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn profile_ids_accept_dir_names() {
        let cli = Cli::try_parse_from(["trajlab", "show", "profile_3", "--limit", "5"]).unwrap();
        match cli.command {
            Commands::Show { id, limit, .. } => {
                assert_eq!(id, ProfileId::new(3));
                assert_eq!(limit, Some(5));
            }
            _ => panic!("expected show"),
        }
    }
}
