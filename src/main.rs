use std::path::PathBuf;

use anyhow::{bail, Context};
use diagramkit::replay::ReplayScript;
use diagramkit::{init_logging, BUILD_DATE, VERSION};
use diagramkit_settings::{EditorConfig, SettingsPersistence};

const USAGE: &str = "usage: diagramkit <replay.json> [--config <config.toml|json>]";

fn main() -> anyhow::Result<()> {
    // Initialize logging
    init_logging()?;
    tracing::info!("DiagramKit {} (built {})", VERSION, BUILD_DATE);

    let mut args = std::env::args().skip(1);
    let mut script_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                config_path = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("{}", USAGE);
                return Ok(());
            }
            _ if script_path.is_none() => script_path = Some(PathBuf::from(arg)),
            _ => bail!("unexpected argument '{}'\n{}", arg, USAGE),
        }
    }
    let Some(script_path) = script_path else {
        bail!(USAGE);
    };

    let config = match config_path {
        Some(path) => SettingsPersistence::load_or_default(&path)?.config().clone(),
        None => EditorConfig::default(),
    };

    let script = ReplayScript::load_from_file(&script_path)?;
    let report = script.run(config)?;
    tracing::info!(
        "Replayed {} steps ({} rejected): {} objects, undo depth {}",
        report.steps,
        report.rejected,
        report.objects,
        report.undo_depth
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
