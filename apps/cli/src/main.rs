use std::env;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use replaycore_catalog::{display_label, CatalogRow};
use replaycore_config::{detect_executable, Settings};
use replaycore_store::IdStore;
use replayd::{Engine, EngineEvent, LaunchOutcome};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Default)]
struct CliArgs {
    executable: Option<PathBuf>,
    extra_root: Option<PathBuf>,
    query: Option<String>,
    play: Option<String>,
    help: bool,
}

fn main() -> Result<()> {
    let args = parse_args()?;
    if args.help {
        print_usage();
        return Ok(());
    }

    let settings_path = Settings::default_path().context("could not locate a home directory")?;
    let store_path = IdStore::default_path().context("could not locate a home directory")?;
    let mut settings = Settings::load(&settings_path);
    let mut settings_changed = false;

    if let Some(exe) = args.executable {
        if !exe.is_file() {
            bail!("executable not found: {}", exe.display());
        }
        println!("Selected executable: {}", exe.display());
        settings.executable_path = Some(exe);
        settings_changed = true;
    }

    if let Some(root) = args.extra_root {
        if !settings.extra_roots.contains(&root) {
            println!("Added replay folder: {}", root.display());
            settings.extra_roots.push(root);
            settings_changed = true;
        }
    }

    if settings.executable_path.is_none() {
        if let Some(found) = detect_executable() {
            println!("Detected executable: {}", found.display());
            settings.executable_path = Some(found);
            settings_changed = true;
        } else {
            eprintln!("No executable selected. Pass --exe=<path> to pick one.");
        }
    }

    if settings_changed {
        settings
            .save(&settings_path)
            .with_context(|| format!("saving settings to {}", settings_path.display()))?;
    }

    let mut engine = Engine::new(settings, store_path);
    engine.request_rescan();
    let rows = wait_for_catalog(&mut engine);

    match args.play {
        Some(target) => play(&mut engine, &rows, &target),
        None => {
            list(&engine, args.query.as_deref());
            Ok(())
        }
    }
}

fn parse_args() -> Result<CliArgs> {
    let mut args = CliArgs::default();

    for arg in env::args().skip(1) {
        if arg == "--help" || arg == "-h" {
            args.help = true;
        } else if let Some(value) = arg.strip_prefix("--exe=") {
            args.executable = Some(PathBuf::from(value));
        } else if let Some(value) = arg.strip_prefix("--root=") {
            args.extra_root = Some(PathBuf::from(value));
        } else if let Some(value) = arg.strip_prefix("--find=") {
            args.query = Some(value.to_string());
        } else if let Some(value) = arg.strip_prefix("--play=") {
            args.play = Some(value.to_string());
        } else {
            bail!("unknown argument `{arg}` (try --help)");
        }
    }

    Ok(args)
}

fn print_usage() {
    println!("replaydeck - list and launch World of Tanks replays");
    println!();
    println!("  replaydeck                 scan and list all replays");
    println!("  replaydeck --find=QUERY    list replays matching QUERY");
    println!("  replaydeck --play=NNN      launch a replay by its number");
    println!("  replaydeck --play=PATH     launch a replay file directly");
    println!("  replaydeck --exe=PATH      select the game executable");
    println!("  replaydeck --root=DIR      add an extra replay folder");
}

fn wait_for_catalog(engine: &mut Engine) -> Vec<CatalogRow> {
    loop {
        for event in engine.tick() {
            match event {
                EngineEvent::CatalogUpdated(rows) => return rows,
                EngineEvent::LogHint(hint) => eprintln!("{hint}"),
                EngineEvent::LaunchOutcome { .. } => {}
            }
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn list(engine: &Engine, query: Option<&str>) {
    let rows = engine.filter(query.unwrap_or(""));

    if rows.is_empty() {
        if let Some(query) = query {
            println!("No replays match \"{query}\".");
        }
        return;
    }

    for row in &rows {
        println!("{}", format_row(row));
    }
}

fn format_row(row: &CatalogRow) -> String {
    let mut line = format!("{}  {}", display_label(row.id), row.file.display_name);
    for field in row.file.meta.present_fields() {
        line.push_str("  ");
        line.push_str(field);
    }
    line
}

fn play(engine: &mut Engine, rows: &[CatalogRow], target: &str) -> Result<()> {
    match target.trim().trim_start_matches('#').parse::<u32>() {
        Ok(id) => {
            if let Some(row) = rows.iter().find(|row| row.id == id) {
                println!("Playing replay: {}", row.file.path.display());
            }
            engine.launch_id(id);
        }
        Err(_) => {
            let path = Path::new(target);
            println!("Playing replay: {}", path.display());
            engine.launch(path);
        }
    }

    for event in engine.tick() {
        match event {
            EngineEvent::LaunchOutcome { outcome, .. } => match outcome {
                LaunchOutcome::Started => return Ok(()),
                LaunchOutcome::Failed { reason } => bail!("launch failed: {reason}"),
            },
            EngineEvent::LogHint(hint) => bail!("{hint}"),
            EngineEvent::CatalogUpdated(_) => {}
        }
    }

    Ok(())
}
